use reqwest::{
    blocking::Client,
    header::{self, HeaderMap, HeaderValue},
};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, warn};

use crate::{
    error::ApiError,
    model::{AnalyticsElement, AnalyticsRecord, Campaign, Creative, DateRange, Urn},
};

pub const DEFAULT_BASE_URL: &str = "https://api.linkedin.com";

const API_VERSION: &str = "202411";
const RESTLI_PROTOCOL_VERSION: &str = "2.0.0";
const PAGE_SIZE: usize = 100;
const ANALYTICS_FIELDS: &str = "clicks,impressions,landingPageClicks,pivotValues,dateRange";

/// Read access to the three endpoint families a report is built from.
///
/// [`LinkedInClient`] is the real implementation; anything else (a fixture,
/// a cache) can stand in for it when building a report with
/// [`crate::fetch_report`].
pub trait AdsApi {
    /// Returns every campaign in the ad account.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if any request fails.
    fn fetch_campaigns(&self, account_id: u64) -> Result<Vec<Campaign>, ApiError>;

    /// Returns every creative in the given campaign.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if any request fails.
    fn fetch_creatives(&self, account_id: u64, campaign_id: u64)
        -> Result<Vec<Creative>, ApiError>;

    /// Returns per-creative metrics for the ad account over `range`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    fn fetch_analytics(
        &self,
        account_id: u64,
        range: &DateRange,
    ) -> Result<Vec<AnalyticsRecord>, ApiError>;
}

/// A page of results from a Rest.li finder.
#[derive(Debug, Deserialize)]
pub(crate) struct Page<T> {
    #[serde(default = "Vec::new")]
    pub(crate) elements: Vec<T>,
    #[serde(default)]
    metadata: Option<PageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageMetadata {
    #[serde(default)]
    next_page_token: Option<String>,
}

/// The authenticated member, as returned by `/v2/me`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub localized_first_name: String,
    #[serde(default)]
    pub localized_last_name: String,
}

impl Profile {
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.localized_first_name, self.localized_last_name)
            .trim()
            .to_string()
    }
}

/// Blocking client for the LinkedIn Marketing REST API.
///
/// Every request carries the bearer token and the Rest.li and API version
/// headers. Requests are made one at a time; there is no retry, and the
/// only timeout is the HTTP client's default.
#[derive(Debug)]
pub struct LinkedInClient {
    http: Client,
    base_url: String,
}

impl LinkedInClient {
    /// Creates a client for the public API.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidToken`] if `access_token` can't be sent as
    /// a header, or [`ApiError::Network`] if the HTTP client can't be built.
    pub fn new(access_token: &str) -> Result<Self, ApiError> {
        Self::with_base_url(access_token, DEFAULT_BASE_URL)
    }

    /// Creates a client that sends its requests to `base_url` instead.
    ///
    /// # Errors
    ///
    /// As for [`LinkedInClient::new`].
    pub fn with_base_url(access_token: &str, base_url: &str) -> Result<Self, ApiError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {access_token}"))
            .map_err(|_| ApiError::InvalidToken)?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-restli-protocol-version",
            HeaderValue::from_static(RESTLI_PROTOCOL_VERSION),
        );
        headers.insert("linkedin-version", HeaderValue::from_static(API_VERSION));
        let http = Client::builder()
            .default_headers(headers)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Checks the token by fetching the profile of the member it belongs to.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails; typically
    /// [`ApiError::Auth`] for an expired token.
    pub fn verify_token(&self) -> Result<Profile, ApiError> {
        self.get_json(&format!("{}/v2/me", self.base_url), &[])
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        debug!(url, ?query, "GET");
        let response = self.http.get(url).query(query).send()?;
        let status = response.status();
        let body = response.text()?;
        debug!(url, %status, bytes = body.len(), "response");
        ApiError::check_status(status, url, &body)?;
        serde_json::from_str(&body).map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }

    /// Fetches every page of a finder, following `nextPageToken`.
    fn get_all<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>, ApiError> {
        let mut elements = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let query: Vec<(&str, &str)> = token
                .as_deref()
                .map(|t| vec![("pageToken", t)])
                .unwrap_or_default();
            let page: Page<T> = self.get_json(url, &query)?;
            elements.extend(page.elements);
            token = page
                .metadata
                .and_then(|m| m.next_page_token)
                .filter(|t| !t.is_empty());
            if token.is_none() {
                return Ok(elements);
            }
            debug!(url, fetched = elements.len(), "following next page");
        }
    }
}

impl AdsApi for LinkedInClient {
    fn fetch_campaigns(&self, account_id: u64) -> Result<Vec<Campaign>, ApiError> {
        let url = format!(
            "{}/rest/adAccounts/{account_id}/adCampaigns?q=search&pageSize={PAGE_SIZE}",
            self.base_url
        );
        self.get_all(&url)
    }

    fn fetch_creatives(
        &self,
        account_id: u64,
        campaign_id: u64,
    ) -> Result<Vec<Creative>, ApiError> {
        let url = format!(
            "{}/rest/adAccounts/{account_id}/creatives?q=criteria&campaigns=List({})&pageSize={PAGE_SIZE}",
            self.base_url,
            Urn::campaign(campaign_id).encoded(),
        );
        self.get_all(&url)
    }

    fn fetch_analytics(
        &self,
        account_id: u64,
        range: &DateRange,
    ) -> Result<Vec<AnalyticsRecord>, ApiError> {
        let url = format!(
            "{}/rest/adAnalytics?q=analytics&pivot=CREATIVE&timeGranularity=ALL\
             &dateRange={}&accounts=List({})&fields={ANALYTICS_FIELDS}",
            self.base_url,
            range.to_restli(),
            Urn::account(account_id).encoded(),
        );
        let page: Page<AnalyticsElement> = self.get_json(&url, &[])?;
        let total = page.elements.len();
        let records: Vec<_> = page
            .elements
            .into_iter()
            .filter_map(|e| e.into_record(range))
            .collect();
        if records.len() < total {
            warn!(
                skipped = total - records.len(),
                "analytics elements without a creative pivot were skipped"
            );
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CampaignStatus;

    use chrono::NaiveDate;
    use mockito::{Matcher, Server};

    fn client(server: &Server) -> LinkedInClient {
        LinkedInClient::with_base_url("tok", &server.url()).unwrap()
    }

    fn range() -> DateRange {
        DateRange::last_days(7, NaiveDate::from_ymd_opt(2024, 3, 3).unwrap())
    }

    #[test]
    fn fetch_campaigns_fn_sends_auth_headers_and_follows_pages() {
        let mut server = Server::new();
        let first = server
            .mock("GET", "/rest/adAccounts/42/adCampaigns")
            .match_query(Matcher::Regex("^q=search&pageSize=100$".into()))
            .match_header("authorization", "Bearer tok")
            .match_header("x-restli-protocol-version", "2.0.0")
            .match_header("linkedin-version", "202411")
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"elements": [{"id": 1, "name": "One", "status": "ACTIVE"}],
                    "metadata": {"nextPageToken": "p2"}}"#,
            )
            .create();
        let second = server
            .mock("GET", "/rest/adAccounts/42/adCampaigns")
            .match_query(Matcher::Regex("pageToken=p2".into()))
            .with_header("content-type", "application/json")
            .with_body(r#"{"elements": [{"id": 2, "name": "Two", "status": "DRAFT"}], "metadata": {}}"#)
            .create();

        let campaigns = client(&server).fetch_campaigns(42).unwrap();
        first.assert();
        second.assert();
        assert_eq!(campaigns.len(), 2);
        assert_eq!(campaigns[0].name, "One");
        assert_eq!(campaigns[1].status, CampaignStatus::Draft);
    }

    #[test]
    fn fetch_creatives_fn_filters_by_campaign() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/rest/adAccounts/42/creatives")
            .match_query(Matcher::AllOf(vec![
                Matcher::Regex("q=criteria".into()),
                Matcher::Regex("sponsoredCampaign(%3A|:)7".into()),
            ]))
            .with_body(
                r#"{"elements": [{
                    "id": "urn:li:sponsoredCreative:70",
                    "campaign": "urn:li:sponsoredCampaign:7",
                    "name": "Hero image",
                    "content": {"sponsoredContent": {"landingPage": "https://a.com"}}
                }]}"#,
            )
            .create();

        let creatives = client(&server).fetch_creatives(42, 7).unwrap();
        mock.assert();
        assert_eq!(creatives.len(), 1);
        assert_eq!(creatives[0].id, Urn::creative(70));
        assert_eq!(creatives[0].content.landing_page(), Some("https://a.com"));
    }

    #[test]
    fn fetch_analytics_fn_requests_creative_pivot_and_skips_other_elements() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/rest/adAnalytics")
            .match_query(Matcher::AllOf(vec![
                Matcher::Regex("q=analytics".into()),
                Matcher::Regex("pivot=CREATIVE".into()),
                Matcher::Regex("timeGranularity=ALL".into()),
                Matcher::Regex("landingPageClicks".into()),
            ]))
            .with_body(
                r#"{"elements": [
                    {"pivotValues": ["urn:li:sponsoredCreative:70"],
                     "clicks": 10, "impressions": 100, "landingPageClicks": 8},
                    {"pivotValues": [], "clicks": 1}
                ]}"#,
            )
            .create();

        let records = client(&server).fetch_analytics(42, &range()).unwrap();
        mock.assert();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].creative, Urn::creative(70));
        assert_eq!(records[0].landing_page_clicks, 8);
        assert_eq!(records[0].date_range, range());
    }

    #[test]
    fn fetch_fns_map_http_failures_to_api_errors() {
        let mut server = Server::new();
        let _campaigns = server
            .mock("GET", "/rest/adAccounts/1/adCampaigns")
            .match_query(Matcher::Any)
            .with_status(401)
            .create();
        let _creatives = server
            .mock("GET", "/rest/adAccounts/2/creatives")
            .match_query(Matcher::Any)
            .with_status(403)
            .create();
        let _missing = server
            .mock("GET", "/rest/adAccounts/3/adCampaigns")
            .match_query(Matcher::Any)
            .with_status(404)
            .create();
        let _analytics = server
            .mock("GET", "/rest/adAnalytics")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("upstream unavailable")
            .create();

        let client = client(&server);
        assert!(matches!(client.fetch_campaigns(1), Err(ApiError::Auth)));
        assert!(matches!(client.fetch_creatives(2, 9), Err(ApiError::Permission)));
        assert!(matches!(client.fetch_campaigns(3), Err(ApiError::NotFound { .. })));
        let err = client.fetch_analytics(4, &range()).unwrap_err();
        assert!(err.is_transient());
        assert!(err.to_string().contains("upstream unavailable"), "{err}");
    }

    #[test]
    fn get_json_fn_reports_undecodable_bodies() {
        let mut server = Server::new();
        let _mock = server
            .mock("GET", "/rest/adAccounts/42/adCampaigns")
            .match_query(Matcher::Any)
            .with_body("<html>not json</html>")
            .create();
        let err = client(&server).fetch_campaigns(42).unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }), "{err}");
        assert!(!err.is_transient());
    }

    #[test]
    fn unreachable_server_is_a_transient_error() {
        let client = LinkedInClient::with_base_url("tok", "http://127.0.0.1:1").unwrap();
        let err = client.fetch_campaigns(42).unwrap_err();
        assert!(matches!(err, ApiError::Network(_)), "{err}");
        assert!(err.is_transient());
    }

    #[test]
    fn verify_token_fn_returns_member_profile() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/v2/me")
            .match_header("authorization", "Bearer tok")
            .with_body(r#"{"localizedFirstName": "Ada", "localizedLastName": "Lovelace"}"#)
            .create();
        let profile = client(&server).verify_token().unwrap();
        mock.assert();
        assert_eq!(profile.display_name(), "Ada Lovelace");
    }

    #[test]
    fn with_base_url_fn_rejects_tokens_that_are_not_header_safe() {
        assert!(matches!(
            LinkedInClient::with_base_url("bad\ntoken", DEFAULT_BASE_URL),
            Err(ApiError::InvalidToken)
        ));
    }
}
