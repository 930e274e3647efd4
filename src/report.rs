use clap::ValueEnum;
use tracing::{debug, warn};

use std::{
    collections::{HashMap, HashSet},
    fmt::{self, Display},
};

use crate::{
    ctr::Ctr,
    landing_page::extract_landing_page,
    model::{AnalyticsRecord, Campaign, CampaignStatus, Creative},
};

/// Number of rows shown in the console table unless told otherwise.
pub const DEFAULT_TOP: usize = 10;

const RULE_WIDTH: usize = 80;

/// The metric that report rows are ranked by, descending.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum SortKey {
    #[default]
    Clicks,
    Impressions,
    LandingPageClicks,
    Ctr,
}

impl Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Clicks => "clicks",
            Self::Impressions => "impressions",
            Self::LandingPageClicks => "landing page clicks",
            Self::Ctr => "CTR",
        })
    }
}

/// One line of the report: a creative, its campaign, and its metrics.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportRow {
    pub campaign_id: u64,
    pub campaign_name: String,
    pub campaign_status: CampaignStatus,
    pub creative_id: u64,
    pub creative_name: String,
    pub landing_page: String,
    pub clicks: u64,
    pub impressions: u64,
    pub landing_page_clicks: u64,
    pub ctr: Ctr,
}

/// Totals across the whole report.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Summary {
    pub total_campaigns: usize,
    pub total_creatives: usize,
    pub total_clicks: u64,
    pub total_impressions: u64,
    pub average_ctr: Ctr,
}

impl Summary {
    fn new(total_campaigns: usize, rows: &[ReportRow]) -> Self {
        let mut summary = Self {
            total_campaigns,
            total_creatives: rows.len(),
            ..Self::default()
        };
        for row in rows {
            summary.total_clicks += row.clicks;
            summary.total_impressions += row.impressions;
            summary.average_ctr += row.ctr;
        }
        summary
    }
}

impl Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:=<RULE_WIDTH$}", "")?;
        writeln!(f, "SUMMARY")?;
        writeln!(f, "{:=<RULE_WIDTH$}", "")?;
        writeln!(f, "{:<20}{}", "Total Campaigns:", self.total_campaigns)?;
        writeln!(f, "{:<20}{}", "Total Creatives:", self.total_creatives)?;
        writeln!(f, "{:<20}{}", "Total Clicks:", self.total_clicks)?;
        writeln!(f, "{:<20}{}", "Total Impressions:", self.total_impressions)?;
        writeln!(f, "{:<20}{}", "Average CTR:", self.average_ctr)?;
        Ok(())
    }
}

#[derive(Clone, Copy, Default)]
struct Metrics {
    clicks: u64,
    impressions: u64,
    landing_page_clicks: u64,
}

/// Holds the aggregated report.
///
/// To build a `Report`, use [`aggregate`] or [`aggregate_by`].
///
/// To get a printable summary with the top rows, use its [`Display`]
/// implementation; [`Report::top`] sets how many rows it shows.
#[derive(Debug, Default)]
pub struct Report {
    rows: Vec<ReportRow>,
    summary: Summary,
    sort_key: SortKey,
    pub top: usize,
}

impl Report {
    /// Returns the rows in ranked order.
    #[must_use]
    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    #[must_use]
    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    #[must_use]
    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }
}

/// Joins campaigns, creatives, and analytics into a report ranked by clicks.
///
/// Same as [`aggregate_by`] with [`SortKey::Clicks`].
#[must_use]
pub fn aggregate(
    campaigns: &[Campaign],
    creatives: &[Creative],
    analytics: &[AnalyticsRecord],
) -> Report {
    aggregate_by(campaigns, creatives, analytics, SortKey::Clicks)
}

/// Joins campaigns, creatives, and analytics into a report ranked by `key`.
///
/// There is one row per distinct creative id, in descending order of `key`;
/// rows that tie keep the order their creatives were given in.
///
/// * A creative with no analytics gets a row with all metrics zero.
/// * Several analytics records for the same creative are summed.
/// * A creative whose campaign isn't in `campaigns` is left out, with a
///   warning.
/// * If a creative id appears more than once, only the first is used.
#[must_use]
pub fn aggregate_by(
    campaigns: &[Campaign],
    creatives: &[Creative],
    analytics: &[AnalyticsRecord],
    key: SortKey,
) -> Report {
    let mut campaigns_by_id: HashMap<u64, &Campaign> = HashMap::new();
    for campaign in campaigns {
        campaigns_by_id.entry(campaign.id).or_insert(campaign);
    }
    let mut metrics: HashMap<u64, Metrics> = HashMap::new();
    for record in analytics {
        let m = metrics.entry(record.creative.id()).or_default();
        m.clicks += record.clicks;
        m.impressions += record.impressions;
        m.landing_page_clicks += record.landing_page_clicks;
    }

    let mut seen = HashSet::new();
    let mut rows = Vec::with_capacity(creatives.len());
    for creative in creatives {
        let creative_id = creative.id.id();
        if !seen.insert(creative_id) {
            debug!(creative = creative_id, "duplicate creative ignored");
            continue;
        }
        let Some(campaign) = campaigns_by_id.get(&creative.campaign.id()) else {
            warn!(
                creative = creative_id,
                campaign = %creative.campaign,
                "creative belongs to an unknown campaign; left out of report"
            );
            continue;
        };
        let m = metrics.get(&creative_id).copied().unwrap_or_default();
        rows.push(ReportRow {
            campaign_id: campaign.id,
            campaign_name: campaign.name.clone(),
            campaign_status: campaign.status.clone(),
            creative_id,
            creative_name: creative.name.clone(),
            landing_page: extract_landing_page(creative),
            clicks: m.clicks,
            impressions: m.impressions,
            landing_page_clicks: m.landing_page_clicks,
            ctr: Ctr::new(m.clicks, m.impressions),
        });
    }
    let unmatched = metrics.keys().filter(|id| !seen.contains(*id)).count();
    if unmatched > 0 {
        debug!(unmatched, "analytics records for creatives not fetched were ignored");
    }

    sort_rows(&mut rows, key);
    let summary = Summary::new(campaigns.len(), &rows);
    Report {
        rows,
        summary,
        sort_key: key,
        top: DEFAULT_TOP,
    }
}

fn sort_rows(rows: &mut [ReportRow], key: SortKey) {
    rows.sort_by(|a, b| match key {
        SortKey::Clicks => b.clicks.cmp(&a.clicks),
        SortKey::Impressions => b.impressions.cmp(&a.impressions),
        SortKey::LandingPageClicks => b.landing_page_clicks.cmp(&a.landing_page_clicks),
        SortKey::Ctr => b.ctr.cmp_rate(&a.ctr),
    });
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

impl Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary)?;
        writeln!(f)?;
        writeln!(f, "{:=<RULE_WIDTH$}", "")?;
        writeln!(f, "TOP {} PERFORMING ADS (by {})", self.top, self.sort_key())?;
        writeln!(f, "{:=<RULE_WIDTH$}", "")?;
        if self.rows.is_empty() {
            writeln!(f, "No data available")?;
            return Ok(());
        }
        writeln!(
            f,
            "{:<30} {:<15} {:>8} {:>8}  {}",
            "Campaign", "Creative ID", "Clicks", "CTR", "Landing Page"
        )?;
        writeln!(f, "{:-<RULE_WIDTH$}", "")?;
        for row in self.rows.iter().take(self.top) {
            writeln!(
                f,
                "{:<30} {:<15} {:>8} {:>8}  {}",
                truncate(&row.campaign_name, 28),
                truncate(&row.creative_id.to_string(), 13),
                row.clicks,
                row.ctr,
                truncate(&row.landing_page, 40),
            )?;
        }
        Ok(())
    }
}
