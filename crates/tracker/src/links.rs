//! Booking deep links.

use chrono::NaiveDate;

/// Search page base on the booking site.
pub const BOOKING_SEARCH_URL: &str = "https://www.aviasales.ru/search";

/// Deep link to a one-way search: `{ORIGIN}{DDMM}{DEST}{PASSENGERS}`.
pub fn booking_link(origin: &str, date: NaiveDate, destination: &str, passengers: u32) -> String {
    format!(
        "{}/{}{}{}{}",
        BOOKING_SEARCH_URL,
        origin.to_ascii_uppercase(),
        date.format("%d%m"),
        destination.to_ascii_uppercase(),
        passengers
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_link() {
        let date = NaiveDate::from_ymd_opt(2030, 6, 5).unwrap();
        assert_eq!(
            booking_link("mow", date, "AER", 2),
            "https://www.aviasales.ru/search/MOW0506AER2"
        );
    }
}
