use anyhow::{Context, Result};
use serde::Serialize;

use std::{fs::File, io::Write, path::Path};

use crate::{model::CampaignStatus, report::ReportRow};

/// Where the CLI writes the report unless told otherwise.
pub const DEFAULT_OUTPUT: &str = "linkedin_ads_report.csv";

/// Column names of the CSV report, in order.
pub const CSV_HEADER: [&str; 9] = [
    "campaign_id",
    "campaign_name",
    "creative_id",
    "creative_name",
    "landing_page",
    "clicks",
    "impressions",
    "landing_page_clicks",
    "campaign_status",
];

#[derive(Serialize)]
struct CsvRecord<'a> {
    campaign_id: u64,
    campaign_name: &'a str,
    creative_id: u64,
    creative_name: &'a str,
    landing_page: &'a str,
    clicks: u64,
    impressions: u64,
    landing_page_clicks: u64,
    campaign_status: &'a CampaignStatus,
}

impl<'a> From<&'a ReportRow> for CsvRecord<'a> {
    fn from(row: &'a ReportRow) -> Self {
        Self {
            campaign_id: row.campaign_id,
            campaign_name: &row.campaign_name,
            creative_id: row.creative_id,
            creative_name: &row.creative_name,
            landing_page: &row.landing_page,
            clicks: row.clicks,
            impressions: row.impressions,
            landing_page_clicks: row.landing_page_clicks,
            campaign_status: &row.campaign_status,
        }
    }
}

/// Writes `rows` as CSV to the file at `path`, replacing any existing file.
///
/// # Errors
///
/// Returns any errors from creating or writing the file.
pub fn write_csv(rows: &[ReportRow], path: impl AsRef<Path>) -> Result<()> {
    let file = File::create(&path)
        .with_context(|| format!("creating {}", path.as_ref().display()))?;
    write_csv_to(rows, file)
}

/// Writes `rows` as CSV to `writer`: a header line, then one line per row.
///
/// The header is written even if there are no rows.
///
/// # Errors
///
/// Returns any errors from writing.
pub fn write_csv_to<W: Write>(rows: &[ReportRow], writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(CSV_HEADER)?;
    for row in rows {
        wtr.serialize(CsvRecord::from(row))?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ctr::Ctr;

    fn row(creative_id: u64, campaign_name: &str, clicks: u64) -> ReportRow {
        ReportRow {
            campaign_id: 1,
            campaign_name: campaign_name.into(),
            campaign_status: CampaignStatus::Active,
            creative_id,
            creative_name: format!("creative {creative_id}"),
            landing_page: "https://a.com".into(),
            clicks,
            impressions: clicks * 10,
            landing_page_clicks: clicks / 2,
            ctr: Ctr::new(clicks, clicks * 10),
        }
    }

    fn to_string(rows: &[ReportRow]) -> String {
        let mut buf = Vec::new();
        write_csv_to(rows, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn write_csv_to_fn_writes_header_then_rows() {
        let text = to_string(&[row(7, "Spring", 10)]);
        assert_eq!(
            text,
            "campaign_id,campaign_name,creative_id,creative_name,landing_page,\
             clicks,impressions,landing_page_clicks,campaign_status\n\
             1,Spring,7,creative 7,https://a.com,10,100,5,ACTIVE\n"
        );
    }

    #[test]
    fn write_csv_to_fn_quotes_embedded_delimiters() {
        let text = to_string(&[row(7, "Spring, \"big\" launch", 1)]);
        assert!(
            text.contains(r#"1,"Spring, ""big"" launch",7,"#),
            "{text}"
        );
    }

    #[test]
    fn write_csv_to_fn_writes_header_for_empty_report() {
        assert_eq!(to_string(&[]).lines().count(), 1);
    }

    #[test]
    fn write_csv_fn_creates_readable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        write_csv(&[row(1, "a", 9), row(2, "b", 3)], &path).unwrap();

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        assert_eq!(rdr.headers().unwrap(), &csv::StringRecord::from(CSV_HEADER.to_vec()));
        let records: Vec<_> = rdr.records().map(Result::unwrap).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(&records[0][2], "1");
        assert_eq!(&records[1][5], "3");
        assert_eq!(&records[1][8], "ACTIVE");
    }

    #[test]
    fn write_csv_fn_reports_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_csv(&[], dir.path().join("missing/report.csv")).unwrap_err();
        assert!(err.to_string().contains("creating"), "{err}");
    }
}
