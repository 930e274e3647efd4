#![doc = include_str!("../README.md")]
use anyhow::{Context, Result};
use tracing::{debug, info};

pub mod client;
pub mod ctr;
pub mod error;
pub mod landing_page;
pub mod model;
pub mod output;
pub mod report;

pub use client::{AdsApi, LinkedInClient, Profile, DEFAULT_BASE_URL};
pub use ctr::Ctr;
pub use error::ApiError;
pub use landing_page::{extract_landing_page, AdFormat, NO_LANDING_PAGE};
pub use model::{
    parse_account_id, AnalyticsRecord, Campaign, CampaignStatus, Creative, DateRange, Urn,
};
pub use output::{write_csv, write_csv_to, CSV_HEADER, DEFAULT_OUTPUT};
pub use report::{aggregate, aggregate_by, Report, ReportRow, SortKey, Summary, DEFAULT_TOP};

/// Fetches everything needed for a report on `account_id` over `range`, and
/// aggregates it into rows ranked by `key`.
///
/// Campaigns are fetched first, then the creatives of each campaign in turn,
/// then the account's analytics for the whole range.
///
/// # Errors
///
/// If any fetch fails, no report is produced: the error names the stage
/// that failed, with the [`ApiError`] as its cause.
pub fn fetch_report(
    api: &impl AdsApi,
    account_id: u64,
    range: &DateRange,
    key: SortKey,
) -> Result<Report> {
    info!(account_id, "fetching campaigns");
    let campaigns = api
        .fetch_campaigns(account_id)
        .with_context(|| format!("fetching campaigns for account {account_id}"))?;
    info!(count = campaigns.len(), "fetched campaigns");

    info!("fetching creatives");
    let mut creatives = Vec::new();
    for campaign in &campaigns {
        let batch = api
            .fetch_creatives(account_id, campaign.id)
            .with_context(|| format!("fetching creatives for campaign {}", campaign.id))?;
        debug!(campaign = campaign.id, count = batch.len(), "fetched creatives");
        creatives.extend(batch);
    }
    info!(count = creatives.len(), "fetched creatives");

    info!(%range, "fetching analytics");
    let analytics = api
        .fetch_analytics(account_id, range)
        .with_context(|| format!("fetching analytics for account {account_id} ({range})"))?;
    info!(count = analytics.len(), "fetched analytics records");

    Ok(aggregate_by(&campaigns, &creatives, &analytics, key))
}
