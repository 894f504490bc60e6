use chrono::NaiveDate;
use clap::Parser;
use csv::{ReaderBuilder, Trim};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::error::ScoutError;
use crate::models::{parse_loose_date, ListingRef, Source};
use crate::reconcile::DateWindow;
use crate::scrapers::{BrowserOptions, RetryPolicy};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Track daily availability and nightly rates of vacation rentals"
)]
pub struct Args {
    /// First rental date to record (e.g. "2024-06-01")
    #[arg(long, value_parser = parse_date)]
    pub begin_date: NaiveDate,

    /// Last rental date to record, inclusive
    #[arg(long, value_parser = parse_date)]
    pub end_date: NaiveDate,

    /// CSV with a `codes` column and, optionally, a `source` column (vrbo / vacasa)
    #[arg(long)]
    pub csv_input_file: PathBuf,

    /// Dataset the observations are appended to
    #[arg(long, default_value = "data.csv")]
    pub csv_output_file: PathBuf,

    /// List of holiday dates, one per line
    #[arg(long)]
    pub holidays_file: Option<PathBuf>,

    /// Times a page that hasn't rendered is read again before the listing is skipped
    #[arg(long, default_value = "3")]
    pub max_retries: u32,

    #[arg(long, default_value = "1000")]
    pub retry_delay_ms: u64,

    /// Wait after loading a page before reading it
    #[arg(long, default_value = "2000")]
    pub page_settle_ms: u64,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    parse_loose_date(raw).ok_or_else(|| format!("invalid date '{}', expected YYYY-MM-DD", raw))
}

/// Validated settings of one run
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub range: DateWindow,
    pub input: PathBuf,
    pub output: PathBuf,
    pub holidays: Option<PathBuf>,
    pub retry: RetryPolicy,
    pub browser: BrowserOptions,
}

impl Args {
    pub fn into_config(self) -> Result<RunConfig, ScoutError> {
        if self.begin_date > self.end_date {
            return Err(ScoutError::Argument(format!(
                "invalid range of dates: {} is after {}",
                self.begin_date, self.end_date
            )));
        }

        Ok(RunConfig {
            range: DateWindow::new(self.begin_date, self.end_date),
            input: self.csv_input_file,
            output: self.csv_output_file,
            holidays: self.holidays_file,
            retry: RetryPolicy {
                max_retries: self.max_retries,
                delay: Duration::from_millis(self.retry_delay_ms),
            },
            browser: BrowserOptions {
                headless: !self.headed,
                settle: Duration::from_millis(self.page_settle_ms),
            },
        })
    }
}

/// Read the listings to scrape. Rows with an unknown source are skipped.
pub fn load_listings(path: &Path) -> Result<Vec<ListingRef>, ScoutError> {
    let file = std::fs::File::open(path).map_err(|e| {
        ScoutError::Argument(format!("can't read input file {}: {}", path.display(), e))
    })?;
    let listings = read_listings(file)?;
    info!("Read {} listings from {}", listings.len(), path.display());
    Ok(listings)
}

pub fn read_listings<R: Read>(reader: R) -> Result<Vec<ListingRef>, ScoutError> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);

    let headers = reader.headers()?.clone();
    let codes_idx = headers
        .iter()
        .position(|h| h == "codes")
        .ok_or_else(|| ScoutError::Argument("input file has no \"codes\" column".to_string()))?;
    let source_idx = headers.iter().position(|h| h == "source");

    let mut listings = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = row?;
        let Some(code) = row.get(codes_idx).filter(|c| !c.is_empty()) else {
            continue;
        };

        let source = match source_idx.and_then(|idx| row.get(idx)) {
            None => Source::Vrbo,
            Some(tag) => match tag.parse::<Source>() {
                Ok(source) => source,
                Err(e) => {
                    warn!("Skipping listing {} on line {}: {}", code, line + 2, e);
                    continue;
                }
            },
        };

        listings.push(ListingRef {
            source,
            code: code.to_string(),
        });
    }

    Ok(listings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Result<Args, clap::Error> {
        let mut argv = vec!["rental-scout"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv)
    }

    /// Arguments for a run over `begin..=end` reading `codes.csv`
    fn range_args(begin: &str, end: &str) -> Result<Args, clap::Error> {
        args(&[
            "--begin-date",
            begin,
            "--end-date",
            end,
            "--csv-input-file",
            "codes.csv",
        ])
    }

    fn listing(source: Source, code: &str) -> ListingRef {
        ListingRef {
            source,
            code: code.to_string(),
        }
    }

    #[test]
    fn defaults_fill_optional_flags() {
        let config = range_args("2024-06-01", "2024-06-30")
            .unwrap()
            .into_config()
            .unwrap();

        assert_eq!(config.output, PathBuf::from("data.csv"));
        assert_eq!(config.retry, RetryPolicy::default());
        assert!(config.browser.headless);
        assert_eq!(config.range.days().count(), 30);
    }

    #[test]
    fn missing_required_flags_fail_to_parse() {
        assert!(args(&["--begin-date", "2024-06-01"]).is_err());
    }

    #[test]
    fn unparseable_date_fails() {
        assert!(range_args("someday", "2024-06-30").is_err());
    }

    #[test]
    fn reversed_range_is_an_argument_error() {
        let err = range_args("2024-07-01", "2024-06-30")
            .unwrap()
            .into_config()
            .unwrap_err();

        assert!(matches!(err, ScoutError::Argument(_)));
    }

    #[test]
    fn codes_without_source_column_are_vrbo() {
        let listings = read_listings("codes\n123\n456\n".as_bytes()).unwrap();
        assert_eq!(
            listings,
            vec![
                listing(Source::Vrbo, "123"),
                listing(Source::Vrbo, "456"),
            ]
        );
    }

    #[test]
    fn unknown_sources_and_blank_codes_are_skipped() {
        let input = "source,codes\nvrbo,123\nairbnb,999\nVacasa,77\nvrbo,\n";
        let listings = read_listings(input.as_bytes()).unwrap();
        assert_eq!(
            listings,
            vec![
                listing(Source::Vrbo, "123"),
                listing(Source::Vacasa, "77"),
            ]
        );
    }

    #[test]
    fn input_without_codes_column_is_rejected() {
        let err = read_listings("id\n123\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ScoutError::Argument(_)));
    }
}
