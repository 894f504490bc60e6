use chrono::NaiveDate;
use csv::ReaderBuilder;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use tracing::info;

use crate::error::ScoutError;
use crate::models::parse_loose_date;

/// Set of public holidays, consulted when labelling a rental date's day type
#[derive(Debug, Clone, Default)]
pub struct HolidayCalendar {
    dates: HashSet<NaiveDate>,
}

impl HolidayCalendar {
    #[cfg(test)]
    pub fn new(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            dates: dates.into_iter().collect(),
        }
    }

    /// Read a single-column list of dates. A first row that isn't a date is
    /// taken as a header.
    pub fn load(path: &Path) -> Result<Self, ScoutError> {
        let file = std::fs::File::open(path)?;
        let calendar = Self::from_reader(file)?;
        info!("Loaded {} holidays from {}", calendar.len(), path.display());
        Ok(calendar)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ScoutError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut dates = HashSet::new();
        for (idx, row) in reader.records().enumerate() {
            let row = row?;
            let Some(cell) = row.get(0).map(str::trim).filter(|c| !c.is_empty()) else {
                continue;
            };
            match parse_loose_date(cell) {
                Some(date) => {
                    dates.insert(date);
                }
                None if idx == 0 => continue,
                None => {
                    return Err(ScoutError::Argument(format!(
                        "invalid holiday date '{}' on line {}",
                        cell,
                        idx + 1
                    )))
                }
            }
        }

        Ok(Self { dates })
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }
}
