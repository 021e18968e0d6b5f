//! Button callback data.
//!
//! Every button the bot renders carries one of these actions encoded as a
//! short string; parsing and formatting live side by side so the two can
//! not drift apart.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::error::TrackerError;
use crate::format::TRACK_DATE_FORMAT;
use crate::i18n::Lang;

/// A decoded button press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    /// Decorative button (calendar header, passenger counter).
    Noop,
    CalendarDay(NaiveDate),
    PrevMonth,
    NextMonth,
    CalendarDone,
    CalendarClear,
    PassengerPlus,
    PassengerMinus,
    ToggleDirect,
    FiltersReset,
    FiltersDone,
    Language(Lang),
    Currency(String),
    TrackPrice,
    TrackPercent,
    TrackConfirm,
    TrackCancel,
    Untrack(i64),
}

impl CallbackAction {
    /// Encoded form placed in the button.
    pub fn data(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackAction::Noop => f.write_str("noop"),
            CallbackAction::CalendarDay(date) => {
                write!(f, "cal:{}", date.format(TRACK_DATE_FORMAT))
            }
            CallbackAction::PrevMonth => f.write_str("prev_month"),
            CallbackAction::NextMonth => f.write_str("next_month"),
            CallbackAction::CalendarDone => f.write_str("calendar_done"),
            CallbackAction::CalendarClear => f.write_str("calendar_clear"),
            CallbackAction::PassengerPlus => f.write_str("passenger_plus"),
            CallbackAction::PassengerMinus => f.write_str("passenger_minus"),
            CallbackAction::ToggleDirect => f.write_str("toggle_direct"),
            CallbackAction::FiltersReset => f.write_str("filters_reset"),
            CallbackAction::FiltersDone => f.write_str("filters_done"),
            CallbackAction::Language(lang) => write!(f, "lang:{}", lang.code()),
            CallbackAction::Currency(code) => write!(f, "currency:{}", code),
            CallbackAction::TrackPrice => f.write_str("track_price"),
            CallbackAction::TrackPercent => f.write_str("track_percent"),
            CallbackAction::TrackConfirm => f.write_str("track_confirm"),
            CallbackAction::TrackCancel => f.write_str("track_cancel"),
            CallbackAction::Untrack(id) => write!(f, "untrack_{}", id),
        }
    }
}

impl FromStr for CallbackAction {
    type Err = TrackerError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let invalid = || TrackerError::InvalidCallback(data.to_string());

        let action = match data {
            "noop" => CallbackAction::Noop,
            "prev_month" => CallbackAction::PrevMonth,
            "next_month" => CallbackAction::NextMonth,
            "calendar_done" => CallbackAction::CalendarDone,
            "calendar_clear" => CallbackAction::CalendarClear,
            "passenger_plus" => CallbackAction::PassengerPlus,
            "passenger_minus" => CallbackAction::PassengerMinus,
            "toggle_direct" => CallbackAction::ToggleDirect,
            "filters_reset" => CallbackAction::FiltersReset,
            "filters_done" => CallbackAction::FiltersDone,
            "track_price" => CallbackAction::TrackPrice,
            "track_percent" => CallbackAction::TrackPercent,
            "track_confirm" => CallbackAction::TrackConfirm,
            "track_cancel" => CallbackAction::TrackCancel,
            _ => {
                if let Some(date) = data.strip_prefix("cal:") {
                    let date = NaiveDate::parse_from_str(date, TRACK_DATE_FORMAT)
                        .map_err(|_| invalid())?;
                    CallbackAction::CalendarDay(date)
                } else if let Some(code) = data.strip_prefix("lang:") {
                    CallbackAction::Language(Lang::from_code(code).ok_or_else(invalid)?)
                } else if let Some(code) = data.strip_prefix("currency:") {
                    if code.is_empty() {
                        return Err(invalid());
                    }
                    CallbackAction::Currency(code.to_ascii_uppercase())
                } else if let Some(id) = data.strip_prefix("untrack_") {
                    CallbackAction::Untrack(id.parse().map_err(|_| invalid())?)
                } else {
                    return Err(invalid());
                }
            }
        };

        Ok(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_actions() {
        assert_eq!("noop".parse::<CallbackAction>().unwrap(), CallbackAction::Noop);
        assert_eq!(
            "track_confirm".parse::<CallbackAction>().unwrap(),
            CallbackAction::TrackConfirm
        );
    }

    #[test]
    fn test_parse_calendar_day() {
        let action: CallbackAction = "cal:05-03-2030".parse().unwrap();
        assert_eq!(
            action,
            CallbackAction::CalendarDay(NaiveDate::from_ymd_opt(2030, 3, 5).unwrap())
        );
        assert_eq!(action.data(), "cal:05-03-2030");
        assert!("cal:31-02-2030".parse::<CallbackAction>().is_err());
    }

    #[test]
    fn test_parse_parameterized() {
        assert_eq!(
            "lang:en".parse::<CallbackAction>().unwrap(),
            CallbackAction::Language(Lang::En)
        );
        assert_eq!(
            "currency:eur".parse::<CallbackAction>().unwrap(),
            CallbackAction::Currency("EUR".to_string())
        );
        assert_eq!(
            "untrack_42".parse::<CallbackAction>().unwrap(),
            CallbackAction::Untrack(42)
        );
    }

    #[test]
    fn test_rejects_unknown_data() {
        assert!("lang:de".parse::<CallbackAction>().is_err());
        assert!("untrack_abc".parse::<CallbackAction>().is_err());
        assert!("currency:".parse::<CallbackAction>().is_err());
        assert!("launch_rockets".parse::<CallbackAction>().is_err());
    }
}
