use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ScoutError;

/// Source of the rental listing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Vrbo,
    Vacasa,
}

impl Source {
    /// Public page of a listing on this source
    pub fn weblink(&self, listing_id: &str) -> String {
        match self {
            Source::Vrbo => format!("https://www.vrbo.com/{}", listing_id),
            Source::Vacasa => format!("https://www.vacasa.com/unit/{}", listing_id),
        }
    }

    /// Whether the source reports when its availability data was last refreshed.
    /// Only then does that timestamp take part in an observation's identity.
    pub fn exposes_availability_timestamp(&self) -> bool {
        matches!(self, Source::Vrbo)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Vrbo => "vrbo",
            Source::Vacasa => "vacasa",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = ScoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vrbo" => Ok(Source::Vrbo),
            "vacasa" => Ok(Source::Vacasa),
            other => Err(ScoutError::UnknownSource(other.to_string())),
        }
    }
}

/// Availability of a date as reported by the source
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Available,
    Unavailable,
    Unknown,
}

impl Availability {
    /// Decode a per-day calendar flag (`Y` / `N`)
    pub fn from_flag(flag: char) -> Self {
        match flag {
            'Y' => Availability::Available,
            'N' => Availability::Unavailable,
            _ => Availability::Unknown,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }
}

impl From<bool> for Availability {
    fn from(available: bool) -> Self {
        if available {
            Availability::Available
        } else {
            Availability::Unavailable
        }
    }
}

/// Derived state of a rental date at the time it was observed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Available,
    LikelyRented,
    NotListed,
}

/// One calendar date of one listing, merged from availability and pricing data
#[derive(Debug, Clone, PartialEq)]
pub struct DateRecord {
    pub rental_date: NaiveDate,
    pub availability: Availability,
    pub min_stay: Option<u32>,
    pub rent_per_night: Option<f64>,
}

/// A listing to scrape, as read from the input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRef {
    pub source: Source,
    pub code: String,
}

impl ListingRef {
    pub fn url(&self) -> String {
        self.source.weblink(&self.code)
    }
}

/// Listing-wide values read from the page alongside the daily series
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingSnapshot {
    pub name: Option<String>,
    pub cleaning_fee: Option<f64>,
    pub average_rent_per_night: Option<f64>,
    pub availability_updated_at: Option<NaiveDate>,
}

/// An observation before the store has derived its status, day type and link
#[derive(Debug, Clone, PartialEq)]
pub struct NewObservation {
    pub source: Source,
    pub listing_id: String,
    pub scrape_date: NaiveDate,
    pub snapshot: ListingSnapshot,
    pub record: DateRecord,
}

/// Persisted row of the dataset
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Observation {
    pub source: Source,
    pub listing_id: String,
    pub rental_date: NaiveDate,
    pub scrape_date: NaiveDate,
    pub availability_updated_at: Option<NaiveDate>,
    pub name: Option<String>,
    pub cleaning_fee: Option<f64>,
    pub average_rent_per_night: Option<f64>,
    pub rent_per_night: Option<f64>,
    pub min_stay: Option<u32>,
    pub availability: Availability,
    pub status: Status,
    pub day_of_week: String,
    pub weblink: String,
}

/// Parse the date part of the assorted date and timestamp formats found on
/// listing pages and in input files.
pub fn parse_loose_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(ts.date());
        }
    }
    for fmt in ["%m/%d/%Y", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(date);
        }
    }

    None
}
