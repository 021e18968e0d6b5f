//! Date and text helpers shared by the renderers.

use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Date format users type and tracked routes store.
pub const TRACK_DATE_FORMAT: &str = "%d-%m-%Y";

/// Date format the fare API and search history use.
pub const API_DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `DD-MM-YYYY` date.
pub fn parse_track_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), TRACK_DATE_FORMAT).ok()
}

/// Format a date as `DD-MM-YYYY`.
pub fn track_date(date: NaiveDate) -> String {
    date.format(TRACK_DATE_FORMAT).to_string()
}

/// Format a date as `YYYY-MM-DD`.
pub fn api_date(date: NaiveDate) -> String {
    date.format(API_DATE_FORMAT).to_string()
}

/// Capitalize the first letter of every word: `санкт петербург` becomes
/// `Санкт Петербург`.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

/// Shift a stored UTC timestamp (`YYYY-MM-DD HH:MM:SS`) and format it as
/// `DD.MM.YYYY HH:MM`. Unparseable input is returned unchanged.
pub fn local_timestamp(stored: &str, utc_offset_hours: i32) -> String {
    match NaiveDateTime::parse_from_str(stored, "%Y-%m-%d %H:%M:%S") {
        Ok(time) => (time + Duration::hours(i64::from(utc_offset_hours)))
            .format("%d.%m.%Y %H:%M")
            .to_string(),
        Err(_) => stored.to_string(),
    }
}

/// Reformat a `YYYY-MM-DD` date as `DD.MM.YYYY`.
pub fn dotted_date(api: &str) -> String {
    NaiveDate::parse_from_str(api, API_DATE_FORMAT)
        .map(|date| date.format("%d.%m.%Y").to_string())
        .unwrap_or_else(|_| api.to_string())
}
