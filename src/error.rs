use reqwest::StatusCode;
use thiserror::Error;

/// Errors returned by calls to the LinkedIn Ads API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(
        "authentication failed (HTTP 401): the access token is invalid or has expired \
         (tokens last 60 days); generate a new one at https://www.linkedin.com/developers/apps"
    )]
    Auth,

    #[error(
        "permission denied (HTTP 403): the token needs the r_ads and r_ads_reporting scopes, \
         and the member needs a role on the ad account"
    )]
    Permission,

    #[error("not found (HTTP 404) at {url}: check that the ad account id is correct")]
    NotFound { url: String },

    #[error("rate limited (HTTP 429) at {url}")]
    RateLimited { url: String },

    #[error("server error (HTTP {status}) at {url}: {body}")]
    Server {
        status: u16,
        url: String,
        body: String,
    },

    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected response (HTTP {status}) at {url}: {body}")]
    Unexpected {
        status: u16,
        url: String,
        body: String,
    },

    #[error("could not parse response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("access token contains characters not allowed in an HTTP header")]
    InvalidToken,
}

impl ApiError {
    /// Reports whether retrying the same request later might succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Server { .. } | Self::Network(_) | Self::RateLimited { .. }
        )
    }

    /// Maps a non-success HTTP status to the matching error.
    ///
    /// Returns `Ok(())` for any 2xx status.
    ///
    /// # Errors
    ///
    /// Returns the error corresponding to `status` for anything else.
    pub fn check_status(status: StatusCode, url: &str, body: &str) -> Result<(), Self> {
        if status.is_success() {
            return Ok(());
        }
        let url = url.to_string();
        let body: String = body.chars().take(200).collect();
        Err(match status {
            StatusCode::UNAUTHORIZED => Self::Auth,
            StatusCode::FORBIDDEN => Self::Permission,
            StatusCode::NOT_FOUND => Self::NotFound { url },
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited { url },
            s if s.is_server_error() => Self::Server {
                status: s.as_u16(),
                url,
                body,
            },
            s => Self::Unexpected {
                status: s.as_u16(),
                url,
                body,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_status_fn_accepts_success() {
        assert!(ApiError::check_status(StatusCode::OK, "u", "").is_ok());
        assert!(ApiError::check_status(StatusCode::NO_CONTENT, "u", "").is_ok());
    }

    #[test]
    fn check_status_fn_maps_statuses_to_taxonomy() {
        let err = |s: u16| ApiError::check_status(StatusCode::from_u16(s).unwrap(), "u", "b");
        assert!(matches!(err(401), Err(ApiError::Auth)));
        assert!(matches!(err(403), Err(ApiError::Permission)));
        assert!(matches!(err(404), Err(ApiError::NotFound { .. })));
        assert!(matches!(err(429), Err(ApiError::RateLimited { .. })));
        assert!(matches!(err(502), Err(ApiError::Server { status: 502, .. })));
        assert!(matches!(err(400), Err(ApiError::Unexpected { status: 400, .. })));
    }

    #[test]
    fn is_transient_fn_is_true_only_for_retryable_failures() {
        let err = |s: u16| {
            ApiError::check_status(StatusCode::from_u16(s).unwrap(), "u", "b").unwrap_err()
        };
        assert!(err(500).is_transient());
        assert!(err(503).is_transient());
        assert!(err(429).is_transient());
        assert!(!err(401).is_transient());
        assert!(!err(403).is_transient());
        assert!(!err(404).is_transient());
        assert!(!err(400).is_transient());
    }

    #[test]
    fn check_status_fn_truncates_long_bodies() {
        let body = "x".repeat(1000);
        let Err(ApiError::Server { body, .. }) =
            ApiError::check_status(StatusCode::INTERNAL_SERVER_ERROR, "u", &body)
        else {
            panic!("expected server error");
        };
        assert_eq!(body.len(), 200);
    }

    #[test]
    fn fatal_errors_carry_guidance() {
        assert!(ApiError::Auth.to_string().contains("generate a new one"));
        assert!(ApiError::Permission.to_string().contains("r_ads_reporting"));
    }
}
