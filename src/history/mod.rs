pub mod schema;

use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim, WriterBuilder};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::calendar::HolidayCalendar;
use crate::error::ScoutError;
use crate::models::{NewObservation, Observation, Source};
use crate::status::{self, AvailabilityHistory};

/// Identity of an observation. The availability timestamp only takes part for
/// sources that expose one; for the others it is always `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct IdentityKey {
    source: Source,
    listing_id: String,
    rental_date: NaiveDate,
    scrape_date: NaiveDate,
    availability_updated_at: Option<NaiveDate>,
}

impl IdentityKey {
    fn new(
        source: Source,
        listing_id: &str,
        rental_date: NaiveDate,
        scrape_date: NaiveDate,
        availability_updated_at: Option<NaiveDate>,
    ) -> Self {
        Self {
            source,
            listing_id: listing_id.to_string(),
            rental_date,
            scrape_date,
            availability_updated_at: availability_updated_at
                .filter(|_| source.exposes_availability_timestamp()),
        }
    }

    fn of(row: &Observation) -> Self {
        Self::new(
            row.source,
            &row.listing_id,
            row.rental_date,
            row.scrape_date,
            row.availability_updated_at,
        )
    }
}

type RentalDateKey = (Source, String, NaiveDate);

/// Append-only table of every observation recorded so far
#[derive(Debug, Default)]
pub struct HistoryStore {
    rows: Vec<Observation>,
    identities: HashSet<IdentityKey>,
    /// Scrape dates on which each rental date was seen available
    available_on: HashMap<RentalDateKey, HashSet<NaiveDate>>,
    holidays: HolidayCalendar,
}

impl HistoryStore {
    pub fn new(holidays: HolidayCalendar) -> Self {
        Self {
            holidays,
            ..Self::default()
        }
    }

    /// Load the dataset at `path`. A missing or empty file yields an empty
    /// store; a file with the wrong columns is rejected without loading
    /// anything.
    pub fn load(path: &Path, holidays: HolidayCalendar) -> Result<Self, ScoutError> {
        let mut store = Self::new(holidays);

        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("{} doesn't exist yet, starting an empty dataset", path.display());
                return Ok(store);
            }
            Err(e) => return Err(e.into()),
        };
        if metadata.len() == 0 {
            info!("{} is empty, starting an empty dataset", path.display());
            return Ok(store);
        }

        let mut reader = ReaderBuilder::new().trim(Trim::Headers).from_path(path)?;
        schema::check_headers(reader.headers()?)?;

        let rows = reader
            .deserialize::<Observation>()
            .collect::<Result<Vec<_>, _>>()?;

        let mut duplicates = 0;
        for row in rows {
            if !store.insert(row) {
                duplicates += 1;
            }
        }
        if duplicates > 0 {
            warn!("{} dropped {} duplicate rows while loading", path.display(), duplicates);
        }

        info!("Loaded {} observations from {}", store.size(), path.display());
        Ok(store)
    }

    /// Whether an observation with this identity has already been recorded
    pub fn contains(
        &self,
        source: Source,
        listing_id: &str,
        rental_date: NaiveDate,
        scrape_date: NaiveDate,
        availability_updated_at: Option<NaiveDate>,
    ) -> bool {
        let key = IdentityKey::new(
            source,
            listing_id,
            rental_date,
            scrape_date,
            availability_updated_at,
        );
        self.identities.contains(&key)
    }

    /// Record `observation` unless its identity is already present.
    ///
    /// Status, day type and link are derived here, against the history as it
    /// stands before this row is added.
    pub fn append(&mut self, observation: NewObservation) -> bool {
        let NewObservation {
            source,
            listing_id,
            scrape_date,
            snapshot,
            record,
        } = observation;

        if self.contains(
            source,
            &listing_id,
            record.rental_date,
            scrape_date,
            snapshot.availability_updated_at,
        ) {
            debug!("{} {} {} already recorded", source, listing_id, record.rental_date);
            return false;
        }

        let status = status::classify(
            record.availability,
            source,
            &listing_id,
            record.rental_date,
            scrape_date,
            &*self,
        );

        let row = Observation {
            source,
            weblink: source.weblink(&listing_id),
            day_of_week: status::day_of_week(record.rental_date, &self.holidays),
            listing_id,
            rental_date: record.rental_date,
            scrape_date,
            availability_updated_at: snapshot.availability_updated_at,
            name: snapshot.name,
            cleaning_fee: snapshot.cleaning_fee,
            average_rent_per_night: snapshot.average_rent_per_night,
            rent_per_night: record.rent_per_night,
            min_stay: record.min_stay,
            availability: record.availability,
            status,
        };

        self.insert(row)
    }

    /// Write the whole table to `path`, replacing its previous contents.
    pub fn flush(&self, path: &Path) -> Result<(), ScoutError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp = temp_path(path);
        let written = self
            .write_rows(&tmp)
            .and_then(|()| fs::rename(&tmp, path).map_err(ScoutError::from));
        if let Err(e) = written {
            if tmp.is_file() {
                if let Err(cleanup) = fs::remove_file(&tmp) {
                    warn!("Failed to remove {}: {}", tmp.display(), cleanup);
                }
            }
            return Err(e);
        }

        debug!("Flushed {} observations to {}", self.rows.len(), path.display());
        Ok(())
    }

    fn write_rows(&self, path: &Path) -> Result<(), ScoutError> {
        let mut writer = WriterBuilder::new().has_headers(false).from_path(path)?;
        writer.write_record(schema::COLUMNS)?;
        for row in &self.rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn size(&self) -> usize {
        self.rows.len()
    }

    #[cfg(test)]
    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    fn insert(&mut self, row: Observation) -> bool {
        if !self.identities.insert(IdentityKey::of(&row)) {
            return false;
        }

        if row.availability.is_available() {
            self.available_on
                .entry((row.source, row.listing_id.clone(), row.rental_date))
                .or_default()
                .insert(row.scrape_date);
        }
        self.rows.push(row);
        true
    }
}

impl AvailabilityHistory for HistoryStore {
    fn seen_available_elsewhere(
        &self,
        source: Source,
        listing_id: &str,
        rental_date: NaiveDate,
        scrape_date: NaiveDate,
    ) -> bool {
        self.available_on
            .get(&(source, listing_id.to_string(), rental_date))
            .is_some_and(|dates| dates.iter().any(|d| *d != scrape_date))
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "data.csv".into());
    name.push(".tmp");
    path.with_file_name(name)
}
