use chrono::{Days, NaiveDate};
use serde_json::Value;
use tracing::debug;

use super::page::{self, as_date, as_f64_list, as_opt_f64, as_opt_string};
use super::traits::Driver;
use super::types::RawListing;
use crate::error::ExtractError;
use crate::models::{Availability, ListingSnapshot};
use crate::reconcile::{AvailabilitySeries, DateWindow, PricingSeries};

const CALENDAR: &str = "window.__VACASA_UNIT__?.availability";
const RATES: &str = "window.__VACASA_UNIT__?.rates";
const NAME: &str = "window.__VACASA_UNIT__?.name";
const CLEANING_FEE: &str = "window.__VACASA_UNIT__?.fees?.cleaning";
const AVERAGE_NIGHTLY: &str = "window.__VACASA_UNIT__?.rates?.averageNightly";

/// Read a Vacasa unit page. Vacasa publishes no availability timestamp.
pub async fn extract(driver: &dyn Driver) -> Result<RawListing, ExtractError> {
    let calendar = page::read_required(driver, CALENDAR).await?;
    let availability = availability_series(&calendar)?;

    let pricing = match page::read(driver, RATES).await? {
        Value::Null => None,
        rates => pricing_series(&rates)?,
    };

    let name = as_opt_string(&page::read(driver, NAME).await?);
    let cleaning_fee = as_opt_f64(&page::read(driver, CLEANING_FEE).await?, "cleaning fee")?;
    let average_rent_per_night =
        as_opt_f64(&page::read(driver, AVERAGE_NIGHTLY).await?, "average nightly rate")?;

    debug!(
        "Vacasa page: {} availability days from {}",
        availability.flags.len(),
        availability.window.begin
    );

    Ok(RawListing {
        availability,
        pricing,
        snapshot: ListingSnapshot {
            name,
            cleaning_fee,
            average_rent_per_night,
            availability_updated_at: None,
        },
    })
}

/// The calendar is a list of `{date, isAvailable, minNights}` entries, one per
/// consecutive day.
fn availability_series(calendar: &Value) -> Result<AvailabilitySeries, ExtractError> {
    let days = calendar.as_array().ok_or_else(|| {
        ExtractError::Malformed(format!("availability has unexpected value {}", calendar))
    })?;
    if days.is_empty() {
        return Err(ExtractError::NotReady("availability calendar is empty".to_string()));
    }

    let mut entries = days
        .iter()
        .map(|day| {
            let date = as_date(&day["date"], "calendar date")?;
            let flag = match &day["isAvailable"] {
                Value::Bool(available) => Availability::from(*available),
                _ => Availability::Unknown,
            };
            let min_nights = day["minNights"].as_u64().unwrap_or(0) as u32;
            Ok((date, flag, min_nights))
        })
        .collect::<Result<Vec<_>, ExtractError>>()?;
    entries.sort_by_key(|(date, _, _)| *date);

    let begin = entries[0].0;
    let end = entries[entries.len() - 1].0;
    for (offset, (date, _, _)) in entries.iter().enumerate() {
        if Some(*date) != begin.checked_add_days(Days::new(offset as u64)) {
            return Err(ExtractError::Malformed(format!(
                "availability calendar is not contiguous at {}",
                date
            )));
        }
    }

    Ok(AvailabilitySeries {
        window: DateWindow::new(begin, end),
        flags: entries.iter().map(|(_, flag, _)| *flag).collect(),
        min_stays: entries.iter().map(|(_, _, nights)| *nights).collect(),
    })
}

/// `{startDate, endDate, nightly}`; a null `nightly` means no published rates.
fn pricing_series(rates: &Value) -> Result<Option<PricingSeries>, ExtractError> {
    if rates["nightly"].is_null() {
        return Ok(None);
    }

    let begin: NaiveDate = as_date(&rates["startDate"], "rates startDate")?;
    let end: NaiveDate = as_date(&rates["endDate"], "rates endDate")?;
    Ok(Some(PricingSeries {
        window: DateWindow::new(begin, end),
        nightly: as_f64_list(&rates["nightly"], "nightly rates")?,
    }))
}
