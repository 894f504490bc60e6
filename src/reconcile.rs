use chrono::{Days, NaiveDate};
use std::collections::BTreeMap;

use crate::models::{Availability, DateRecord};

/// Inclusive range of calendar dates covered by a series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub begin: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(begin: NaiveDate, end: NaiveDate) -> Self {
        Self { begin, end }
    }

    /// Dates of the window in ascending order. Empty when `end < begin`.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        std::iter::successors(Some(self.begin), |d| d.checked_add_days(Days::new(1)))
            .take_while(move |d| *d <= end)
    }
}

/// Per-day availability flags and minimum stays, anchored at `window.begin`
#[derive(Debug, Clone, PartialEq)]
pub struct AvailabilitySeries {
    pub window: DateWindow,
    pub flags: Vec<Availability>,
    pub min_stays: Vec<u32>,
}

/// Per-day nightly rates, anchored at `window.begin`
#[derive(Debug, Clone, PartialEq)]
pub struct PricingSeries {
    pub window: DateWindow,
    pub nightly: Vec<f64>,
}

/// Merged per-date records of one page
#[derive(Debug, Clone, Default)]
pub struct Reconciled {
    pub records: BTreeMap<NaiveDate, DateRecord>,
    /// The page had no pricing series; rents are unknown for every date.
    pub pricing_missing: bool,
}

impl Reconciled {
    pub fn get(&self, date: &NaiveDate) -> Option<&DateRecord> {
        self.records.get(date)
    }
}

/// Merge an availability series and an optional pricing series into one
/// record per covered date.
///
/// Availability dates are laid down first. Pricing then fills in the rent of
/// dates already present and creates rent-only records for dates the
/// availability series never reached. Dates covered by neither series get no
/// record. Sequences shorter than their window stop early; entries past the
/// window end are ignored.
pub fn reconcile(
    availability: &AvailabilitySeries,
    pricing: Option<&PricingSeries>,
) -> Reconciled {
    let mut records = BTreeMap::new();

    let days = availability.window.days();
    let entries = availability.flags.iter().zip(&availability.min_stays);
    for (date, (flag, min_stay)) in days.zip(entries) {
        records.insert(
            date,
            DateRecord {
                rental_date: date,
                availability: *flag,
                min_stay: Some(*min_stay).filter(|n| *n > 0),
                rent_per_night: None,
            },
        );
    }

    let Some(pricing) = pricing else {
        return Reconciled {
            records,
            pricing_missing: true,
        };
    };

    for (date, rent) in pricing.window.days().zip(&pricing.nightly) {
        records
            .entry(date)
            .and_modify(|record: &mut DateRecord| record.rent_per_night = Some(*rent))
            .or_insert(DateRecord {
                rental_date: date,
                availability: Availability::Unknown,
                min_stay: None,
                rent_per_night: Some(*rent),
            });
    }

    Reconciled {
        records,
        pricing_missing: false,
    }
}
