use chrono::{Datelike, NaiveDate, Weekday};

use crate::calendar::HolidayCalendar;
use crate::models::{Availability, Source, Status};

/// Read access to past observations needed to classify a date
pub trait AvailabilityHistory {
    /// Whether `(source, listing_id, rental_date)` was recorded as available on
    /// any scrape date other than `scrape_date`.
    fn seen_available_elsewhere(
        &self,
        source: Source,
        listing_id: &str,
        rental_date: NaiveDate,
        scrape_date: NaiveDate,
    ) -> bool;
}

/// Classify a rental date from its current availability and what was seen on
/// earlier scrapes.
///
/// Must run before the current observation is stored, so that the history
/// only holds other scrapes.
pub fn classify<H: AvailabilityHistory + ?Sized>(
    availability: Availability,
    source: Source,
    listing_id: &str,
    rental_date: NaiveDate,
    scrape_date: NaiveDate,
    history: &H,
) -> Status {
    if availability.is_available() {
        return Status::Available;
    }

    if history.seen_available_elsewhere(source, listing_id, rental_date, scrape_date) {
        Status::LikelyRented
    } else {
        Status::NotListed
    }
}

/// Weekday name of `date`, or `holiday` when the calendar lists it
pub fn day_of_week(date: NaiveDate, holidays: &HolidayCalendar) -> String {
    if holidays.is_holiday(date) {
        return "holiday".to_string();
    }

    let name = match date.weekday() {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    };
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[derive(Default)]
    struct SeenAvailable(HashSet<(String, NaiveDate, NaiveDate)>);

    impl AvailabilityHistory for SeenAvailable {
        fn seen_available_elsewhere(
            &self,
            _source: Source,
            listing_id: &str,
            rental_date: NaiveDate,
            scrape_date: NaiveDate,
        ) -> bool {
            self.0
                .iter()
                .any(|(id, rd, sd)| id == listing_id && *rd == rental_date && *sd != scrape_date)
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn available_dates_ignore_history() {
        let history = SeenAvailable::default();
        let status = classify(
            Availability::Available,
            Source::Vrbo,
            "X1",
            ymd(2024, 6, 1),
            ymd(2024, 5, 1),
            &history,
        );
        assert_eq!(status, Status::Available);
    }

    #[test]
    fn previously_available_date_is_likely_rented() {
        let mut history = SeenAvailable::default();
        history.0.insert(("X1".into(), ymd(2024, 6, 1), ymd(2024, 5, 1)));

        let status = classify(
            Availability::Unavailable,
            Source::Vrbo,
            "X1",
            ymd(2024, 6, 1),
            ymd(2024, 5, 8),
            &history,
        );
        assert_eq!(status, Status::LikelyRented);
    }

    #[test]
    fn same_day_availability_does_not_count() {
        let mut history = SeenAvailable::default();
        history.0.insert(("X1".into(), ymd(2024, 6, 1), ymd(2024, 5, 8)));

        let status = classify(
            Availability::Unavailable,
            Source::Vrbo,
            "X1",
            ymd(2024, 6, 1),
            ymd(2024, 5, 8),
            &history,
        );
        assert_eq!(status, Status::NotListed);
    }

    #[test]
    fn unknown_availability_without_history_is_not_listed() {
        let status = classify(
            Availability::Unknown,
            Source::Vacasa,
            "77",
            ymd(2024, 6, 1),
            ymd(2024, 5, 8),
            &SeenAvailable::default(),
        );
        assert_eq!(status, Status::NotListed);
    }

    #[test]
    fn holidays_override_weekday_names() {
        let holidays = HolidayCalendar::new([ymd(2024, 7, 4)]);
        assert_eq!(day_of_week(ymd(2024, 7, 4), &holidays), "holiday");
        assert_eq!(day_of_week(ymd(2024, 7, 5), &holidays), "Friday");
        assert_eq!(day_of_week(ymd(2024, 6, 2), &holidays), "Sunday");
    }
}
