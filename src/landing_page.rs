use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::model::Creative;

/// Reported in place of a landing page when none can be found.
pub const NO_LANDING_PAGE: &str = "none";

/// Content payload whose landing page is a direct field.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DirectLink {
    #[serde(default)]
    pub landing_page: Option<String>,
}

/// Video payload: the landing page sits under the content reference.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoContent {
    #[serde(default)]
    pub content_reference: Option<DirectLink>,
}

/// Carousel payload: an ordered list of cards, each with its own landing page.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct CarouselContent {
    #[serde(default)]
    pub cards: Vec<DirectLink>,
}

/// The ad format of a creative, together with its format-specific content.
///
/// A creative's `content` object is keyed by a format tag
/// (`sponsoredContent`, `textAd`, `spotlight`, `sponsoredVideo` or
/// `carousel`). Any other tag, or no tag at all, gives
/// [`AdFormat::Unrecognized`] holding the keys that were present; so does a
/// `content` that isn't an object at all. A payload that doesn't have the
/// expected shape is treated as having no landing page.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(from = "Value")]
pub enum AdFormat {
    SingleImage(DirectLink),
    Text(DirectLink),
    Spotlight(DirectLink),
    Video(VideoContent),
    Carousel(CarouselContent),
    Unrecognized(Vec<String>),
}

const TAGS: [&str; 5] = [
    "sponsoredContent",
    "textAd",
    "spotlight",
    "sponsoredVideo",
    "carousel",
];

impl Default for AdFormat {
    fn default() -> Self {
        Self::Unrecognized(Vec::new())
    }
}

impl From<Map<String, Value>> for AdFormat {
    fn from(content: Map<String, Value>) -> Self {
        for tag in TAGS {
            let Some(payload) = content.get(tag) else {
                continue;
            };
            return match tag {
                "sponsoredContent" => Self::SingleImage(payload_of(payload)),
                "textAd" => Self::Text(payload_of(payload)),
                "spotlight" => Self::Spotlight(payload_of(payload)),
                "sponsoredVideo" => Self::Video(payload_of(payload)),
                _ => Self::Carousel(payload_of(payload)),
            };
        }
        Self::Unrecognized(content.keys().cloned().collect())
    }
}

impl From<Value> for AdFormat {
    fn from(content: Value) -> Self {
        match content {
            Value::Object(map) => map.into(),
            _ => Self::default(),
        }
    }
}

fn payload_of<T: DeserializeOwned + Default>(value: &Value) -> T {
    T::deserialize(value).unwrap_or_default()
}

impl AdFormat {
    /// Returns the destination URL for this creative, if it has one.
    ///
    /// For carousels, this is the landing page of the first card.
    ///
    /// # Examples
    ///
    /// ```
    /// # use linkedin_ads_report::AdFormat;
    /// let content: AdFormat = serde_json::from_str(
    ///     r#"{"sponsoredVideo": {"contentReference": {"landingPage": "https://v.com"}}}"#,
    /// ).unwrap();
    /// assert_eq!(content.landing_page(), Some("https://v.com"));
    /// ```
    #[must_use]
    pub fn landing_page(&self) -> Option<&str> {
        let url = match self {
            Self::SingleImage(link) | Self::Text(link) | Self::Spotlight(link) => {
                link.landing_page.as_deref()
            }
            Self::Video(video) => video
                .content_reference
                .as_ref()
                .and_then(|r| r.landing_page.as_deref()),
            Self::Carousel(carousel) => carousel
                .cards
                .first()
                .and_then(|card| card.landing_page.as_deref()),
            Self::Unrecognized(_) => None,
        };
        url.filter(|u| !u.is_empty())
    }

    /// Returns a short name for the format, for log messages.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SingleImage(_) => "single-image",
            Self::Text(_) => "text",
            Self::Spotlight(_) => "spotlight",
            Self::Video(_) => "video",
            Self::Carousel(_) => "carousel",
            Self::Unrecognized(_) => "unrecognized",
        }
    }
}

/// Returns the landing page of `creative`, or [`NO_LANDING_PAGE`].
///
/// Never fails: an unrecognized format or a missing URL is logged as a
/// warning so that one malformed creative doesn't spoil the whole report.
#[must_use]
pub fn extract_landing_page(creative: &Creative) -> String {
    if let Some(url) = creative.content.landing_page() {
        return url.to_string();
    }
    match &creative.content {
        AdFormat::Unrecognized(keys) => warn!(
            creative = %creative.id,
            content_keys = ?keys,
            "unrecognized ad format; landing page reported as {NO_LANDING_PAGE:?}"
        ),
        format => warn!(
            creative = %creative.id,
            format = format.name(),
            "no landing page in creative content; reported as {NO_LANDING_PAGE:?}"
        ),
    }
    NO_LANDING_PAGE.to_string()
}
