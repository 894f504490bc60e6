use csv::StringRecord;
use std::collections::BTreeSet;

use crate::error::ScoutError;

/// Columns of the persisted dataset, in write order
pub const COLUMNS: [&str; 14] = [
    "source",
    "listing_id",
    "rental_date",
    "scrape_date",
    "availability_updated_at",
    "name",
    "cleaning_fee",
    "average_rent_per_night",
    "rent_per_night",
    "min_stay",
    "availability",
    "status",
    "day_of_week",
    "weblink",
];

/// Check that a header row carries exactly the dataset's columns, in any order.
pub fn check_headers(headers: &StringRecord) -> Result<(), ScoutError> {
    let found: BTreeSet<&str> = headers.iter().map(str::trim).collect();
    let expected: BTreeSet<&str> = COLUMNS.iter().copied().collect();

    if found == expected && headers.len() == COLUMNS.len() {
        return Ok(());
    }

    let missing: Vec<&str> = expected.difference(&found).copied().collect();
    let unexpected: Vec<&str> = found.difference(&expected).copied().collect();

    let mut problems = Vec::new();
    if !missing.is_empty() {
        problems.push(format!("missing columns [{}]", missing.join(", ")));
    }
    if !unexpected.is_empty() {
        problems.push(format!("unexpected columns [{}]", unexpected.join(", ")));
    }
    if problems.is_empty() {
        problems.push("duplicate columns".to_string());
    }

    Err(ScoutError::Schema(problems.join("; ")))
}
