use serde_json::Value;
use tracing::debug;

use super::page::{self, as_date, as_f64_list, as_opt_f64, as_opt_string, as_str};
use super::traits::Driver;
use super::types::RawListing;
use crate::error::ExtractError;
use crate::models::{Availability, ListingSnapshot};
use crate::reconcile::{AvailabilitySeries, DateWindow, PricingSeries};

const AVAILABILITY: &str = "window.__INITIAL_STATE__.listingReducer.availabilityCalendar.availability.unitAvailabilityConfiguration.availability";
const MIN_STAY: &str = "window.__INITIAL_STATE__.listingReducer.availabilityCalendar.availability.unitAvailabilityConfiguration.minStay";
const AVAILABILITY_BEGIN: &str = "window.__INITIAL_STATE__.listingReducer.availabilityCalendar.availability.dateRange.beginDate";
const AVAILABILITY_END: &str = "window.__INITIAL_STATE__.listingReducer.availabilityCalendar.availability.dateRange.endDate";
const AVAILABILITY_UPDATED: &str = "window.__INITIAL_STATE__.listingReducer.availabilityUpdated";
const HEADLINE: &str = "window.__INITIAL_STATE__.listingReducer.headline";
const RENT_NIGHTS: &str = "window.__INITIAL_STATE__.listingReducer.rateSummary.rentNights";
const RENT_BEGIN: &str = "window.__INITIAL_STATE__.listingReducer.rateSummary.beginDate";
const RENT_END: &str = "window.__INITIAL_STATE__.listingReducer.rateSummary.endDate";
const FLAT_FEES: &str = "window.__INITIAL_STATE__.listingReducer.rateSummary.flatFees";
const AVERAGE_RENT: &str = ".rental-price__amount";

/// Read a VRBO listing page from its initial redux state
pub async fn extract(driver: &dyn Driver) -> Result<RawListing, ExtractError> {
    let flags = page::read_required(driver, AVAILABILITY).await?;
    let flags = as_str(&flags, "availability")?;
    if flags.is_empty() {
        return Err(ExtractError::NotReady("availability calendar is empty".to_string()));
    }

    let min_stays = page::read_required(driver, MIN_STAY).await?;
    let min_stays = parse_min_stays(as_str(&min_stays, "minStay")?)?;

    let window = DateWindow::new(
        as_date(&page::read_required(driver, AVAILABILITY_BEGIN).await?, "availability beginDate")?,
        as_date(&page::read_required(driver, AVAILABILITY_END).await?, "availability endDate")?,
    );
    let updated = as_date(
        &page::read_required(driver, AVAILABILITY_UPDATED).await?,
        "availabilityUpdated",
    )?;
    let name = as_opt_string(&page::read(driver, HEADLINE).await?);

    let pricing = match page::read(driver, RENT_NIGHTS).await? {
        Value::Null => None,
        rents => Some(PricingSeries {
            nightly: as_f64_list(&rents, "rentNights")?,
            window: DateWindow::new(
                as_date(&page::read_required(driver, RENT_BEGIN).await?, "rateSummary beginDate")?,
                as_date(&page::read_required(driver, RENT_END).await?, "rateSummary endDate")?,
            ),
        }),
    };

    let average_text = page::read_text(driver, AVERAGE_RENT).await?;
    let average_rent_per_night = page::parse_amount(&average_text).ok_or_else(|| {
        ExtractError::Malformed(format!("average rent '{}' is not an amount", average_text))
    })?;

    let cleaning_fee = cleaning_fee(&page::read(driver, FLAT_FEES).await?)?;

    debug!(
        "VRBO page: {} availability days from {}, pricing {}",
        flags.len(),
        window.begin,
        if pricing.is_some() { "present" } else { "missing" }
    );

    Ok(RawListing {
        availability: AvailabilitySeries {
            window,
            flags: flags.chars().map(Availability::from_flag).collect(),
            min_stays,
        },
        pricing,
        snapshot: ListingSnapshot {
            name,
            cleaning_fee,
            average_rent_per_night: Some(average_rent_per_night),
            availability_updated_at: Some(updated),
        },
    })
}

/// `minStay` is a comma-separated list of nights, one per calendar day. An
/// empty entry still takes its day's slot and reads as 0 (unknown).
fn parse_min_stays(raw: &str) -> Result<Vec<u32>, ExtractError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    let raw = raw.strip_suffix(',').unwrap_or(raw);

    raw.split(',')
        .map(str::trim)
        .map(|s| match s {
            "" => Ok(0),
            s => s.parse().map_err(|_| {
                ExtractError::Malformed(format!("minStay entry '{}' is not a number", s))
            }),
        })
        .collect()
}

/// Minimum amount of the cleaning fee among the listing's flat fees
fn cleaning_fee(flat_fees: &Value) -> Result<Option<f64>, ExtractError> {
    let Some(fees) = flat_fees.as_array() else {
        return Ok(None);
    };

    let mut found = None;
    for fee in fees.iter().filter(|f| f["type"] == "CLEANING_FEE") {
        found = as_opt_f64(&fee["minAmount"], "cleaning fee minAmount")?;
    }
    Ok(found)
}
