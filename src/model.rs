use anyhow::{bail, Context};
use chrono::{Datelike, Days, NaiveDate};
use regex::Regex;
use serde::Deserialize;
use serde_with::{DeserializeFromStr, SerializeDisplay};

use std::{
    convert::Infallible,
    fmt::{self, Display},
    str::FromStr,
    sync::LazyLock,
};

use crate::landing_page::AdFormat;

static URN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^urn:li:([A-Za-z]+):(\d+)$").expect("URN pattern is valid")
});

/// A LinkedIn entity reference of the form `urn:li:<entity>:<id>`.
///
/// # Examples
///
/// ```
/// # use linkedin_ads_report::Urn;
/// let urn: Urn = "urn:li:sponsoredCreative:1234".parse().unwrap();
/// assert_eq!(urn.entity(), "sponsoredCreative");
/// assert_eq!(urn.id(), 1234);
/// assert_eq!(urn, Urn::creative(1234));
/// ```
#[derive(Clone, Debug, DeserializeFromStr, Eq, Hash, PartialEq)]
pub struct Urn {
    entity: String,
    id: u64,
}

impl Urn {
    pub const ACCOUNT: &'static str = "sponsoredAccount";
    pub const CAMPAIGN: &'static str = "sponsoredCampaign";
    pub const CREATIVE: &'static str = "sponsoredCreative";

    #[must_use]
    pub fn new(entity: &str, id: u64) -> Self {
        Self {
            entity: entity.to_string(),
            id,
        }
    }

    #[must_use]
    pub fn account(id: u64) -> Self {
        Self::new(Self::ACCOUNT, id)
    }

    #[must_use]
    pub fn campaign(id: u64) -> Self {
        Self::new(Self::CAMPAIGN, id)
    }

    #[must_use]
    pub fn creative(id: u64) -> Self {
        Self::new(Self::CREATIVE, id)
    }

    #[must_use]
    pub fn entity(&self) -> &str {
        &self.entity
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn is(&self, entity: &str) -> bool {
        self.entity == entity
    }

    /// Returns the URN with its colons percent-encoded, as Rest.li expects
    /// inside `List(...)` query values.
    #[must_use]
    pub fn encoded(&self) -> String {
        self.to_string().replace(':', "%3A")
    }
}

impl Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "urn:li:{}:{}", self.entity, self.id)
    }
}

impl FromStr for Urn {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some(caps) = URN.captures(s) else {
            bail!("bad URN format (want urn:li:<entity>:<id>): {s:?}");
        };
        Ok(Self {
            entity: caps[1].to_string(),
            id: caps[2].parse().with_context(|| format!("URN id out of range: {s:?}"))?,
        })
    }
}

/// Parses an ad account id given either as a bare number or as a
/// `urn:li:sponsoredAccount:<id>` URN.
///
/// # Errors
///
/// Returns an error if `s` is neither form.
pub fn parse_account_id(s: &str) -> anyhow::Result<u64> {
    let s = s.trim();
    if let Ok(id) = s.parse() {
        return Ok(id);
    }
    let urn: Urn = s.parse()?;
    if !urn.is(Urn::ACCOUNT) {
        bail!("expected a {} URN, got {urn}", Urn::ACCOUNT);
    }
    Ok(urn.id())
}

/// Lifecycle status of a campaign.
///
/// Values the API adds in future are kept verbatim in [`CampaignStatus::Other`].
#[derive(Clone, Debug, DeserializeFromStr, Eq, PartialEq, SerializeDisplay)]
pub enum CampaignStatus {
    Active,
    Paused,
    Archived,
    Completed,
    Canceled,
    Draft,
    PendingDeletion,
    Removed,
    Other(String),
}

impl Default for CampaignStatus {
    fn default() -> Self {
        Self::Other("UNKNOWN".to_string())
    }
}

impl FromStr for CampaignStatus {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "ACTIVE" => Self::Active,
            "PAUSED" => Self::Paused,
            "ARCHIVED" => Self::Archived,
            "COMPLETED" => Self::Completed,
            "CANCELED" => Self::Canceled,
            "DRAFT" => Self::Draft,
            "PENDING_DELETION" => Self::PendingDeletion,
            "REMOVED" => Self::Removed,
            other => Self::Other(other.to_string()),
        })
    }
}

impl Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s: &str = match self {
            Self::Active => "ACTIVE",
            Self::Paused => "PAUSED",
            Self::Archived => "ARCHIVED",
            Self::Completed => "COMPLETED",
            Self::Canceled => "CANCELED",
            Self::Draft => "DRAFT",
            Self::PendingDeletion => "PENDING_DELETION",
            Self::Removed => "REMOVED",
            Self::Other(s) => s,
        };
        f.pad(s)
    }
}

/// An ad campaign, as returned by the campaigns endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct Campaign {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: CampaignStatus,
    #[serde(default)]
    pub account: Option<Urn>,
}

/// A single ad unit belonging to a campaign.
#[derive(Clone, Debug, Deserialize)]
pub struct Creative {
    pub id: Urn,
    pub campaign: Urn,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub content: AdFormat,
}

/// An inclusive range of calendar days.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(try_from = "ApiDateRange")]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Returns the range covering the `days` days before `today`, plus
    /// `today` itself.
    #[must_use]
    pub fn last_days(days: u32, today: NaiveDate) -> Self {
        let start = today
            .checked_sub_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end: today }
    }

    /// Formats the range in Rest.li tuple syntax, for the `dateRange` query
    /// parameter.
    #[must_use]
    pub fn to_restli(&self) -> String {
        let part = |d: NaiveDate| format!("(year:{},month:{},day:{})", d.year(), d.month(), d.day());
        format!("(start:{},end:{})", part(self.start), part(self.end))
    }
}

impl Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

#[derive(Deserialize)]
struct ApiDate {
    year: i32,
    month: u32,
    day: u32,
}

impl ApiDate {
    fn to_date(&self) -> Result<NaiveDate, String> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
            .ok_or_else(|| format!("invalid date {}-{}-{}", self.year, self.month, self.day))
    }
}

#[derive(Deserialize)]
struct ApiDateRange {
    start: ApiDate,
    end: ApiDate,
}

impl TryFrom<ApiDateRange> for DateRange {
    type Error = String;

    fn try_from(r: ApiDateRange) -> Result<Self, Self::Error> {
        Ok(Self {
            start: r.start.to_date()?,
            end: r.end.to_date()?,
        })
    }
}

/// Metrics for one creative over a date range.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AnalyticsRecord {
    pub creative: Urn,
    pub date_range: DateRange,
    pub clicks: u64,
    pub impressions: u64,
    pub landing_page_clicks: u64,
}

/// One element of an analytics response, before it is tied to a creative.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AnalyticsElement {
    #[serde(default)]
    pivot_values: Vec<String>,
    #[serde(default)]
    clicks: u64,
    #[serde(default)]
    impressions: u64,
    #[serde(default)]
    landing_page_clicks: u64,
    #[serde(default)]
    date_range: Option<DateRange>,
}

impl AnalyticsElement {
    /// Converts the element into a record, using `requested` when the
    /// response carries no date range of its own.
    ///
    /// Returns `None` if no pivot value is a creative URN.
    pub(crate) fn into_record(self, requested: &DateRange) -> Option<AnalyticsRecord> {
        let creative = self
            .pivot_values
            .iter()
            .filter_map(|v| v.parse::<Urn>().ok())
            .find(|urn| urn.is(Urn::CREATIVE))?;
        Some(AnalyticsRecord {
            creative,
            date_range: self.date_range.unwrap_or(*requested),
            clicks: self.clicks,
            impressions: self.impressions,
            landing_page_clicks: self.landing_page_clicks,
        })
    }
}
