use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use std::path::PathBuf;

use linkedin_ads_report::{
    fetch_report, parse_account_id, write_csv, DateRange, LinkedInClient, SortKey,
    DEFAULT_BASE_URL, DEFAULT_OUTPUT, DEFAULT_TOP,
};

/// Reports LinkedIn Ads performance per creative: campaign, landing page,
/// clicks, and impressions, ranked by clicks.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// OAuth access token with the r_ads and r_ads_reporting scopes
    access_token: String,

    /// Ad account id, as a number or urn:li:sponsoredAccount:<id>
    #[arg(value_parser = parse_account_id)]
    account_id: u64,

    /// Number of days to look back
    #[arg(default_value_t = 7, value_parser = clap::value_parser!(u32).range(1..))]
    days: u32,

    /// CSV file to write the report to
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Metric to rank creatives by
    #[arg(short, long, value_enum, default_value_t = SortKey::Clicks)]
    sort_by: SortKey,

    /// Number of top rows to print
    #[arg(short = 'n', long, default_value_t = DEFAULT_TOP)]
    top: usize,

    /// API base URL
    #[arg(long, value_name = "URL", env = "LINKEDIN_API_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Don't check the token against /v2/me before fetching
    #[arg(long)]
    skip_verify: bool,

    /// Only log warnings and errors (overridden by RUST_LOG)
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.quiet);

    let client = LinkedInClient::with_base_url(&args.access_token, &args.base_url)
        .context("creating API client")?;
    if !args.skip_verify {
        let profile = client.verify_token().context("verifying access token")?;
        info!(member = %profile.display_name(), "connected");
    }

    let range = DateRange::last_days(args.days, Local::now().date_naive());
    info!(account = args.account_id, days = args.days, %range, "building report");
    let mut report = fetch_report(&client, args.account_id, &range, args.sort_by)?;
    report.top = args.top;
    print!("{report}");

    write_csv(report.rows(), &args.output)
        .with_context(|| format!("writing report to {}", args.output.display()))?;
    println!("\nReport saved to: {}", args.output.display());
    Ok(())
}

fn init_tracing(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}
