//! Input validation for tracked route thresholds and date formats.

use std::fmt;

use chrono::NaiveDate;

/// Largest accepted percent-drop threshold.
pub const MAX_DROP_PERCENT: i64 = 100;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Neither a price ceiling nor a percent drop was supplied.
    MissingThreshold,
    /// A threshold was zero or negative.
    NonPositive { field: &'static str, value: i64 },
    /// A percent threshold above 100.
    PercentOutOfRange(i64),
    /// A track request without any departure dates.
    NoDates,
    /// A date not in `DD-MM-YYYY` form.
    InvalidDate(String),
    /// Empty value where one is required.
    Empty(&'static str),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingThreshold => {
                write!(f, "at least one of price or percent threshold is required")
            }
            ValidationError::NonPositive { field, value } => {
                write!(f, "{} must be positive, got {}", field, value)
            }
            ValidationError::PercentOutOfRange(value) => {
                write!(f, "price_drop_percent must be at most {}, got {}", MAX_DROP_PERCENT, value)
            }
            ValidationError::NoDates => write!(f, "at least one departure date is required"),
            ValidationError::InvalidDate(date) => {
                write!(f, "invalid date '{}', expected DD-MM-YYYY", date)
            }
            ValidationError::Empty(field) => write!(f, "{} cannot be empty", field),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate the threshold pair of a track request.
///
/// At least one threshold must be present and every present threshold must
/// be strictly positive. A percent threshold is at most [`MAX_DROP_PERCENT`].
pub fn validate_thresholds(
    notify_below_price: Option<i64>,
    price_drop_percent: Option<i64>,
) -> Result<(), ValidationError> {
    if notify_below_price.is_none() && price_drop_percent.is_none() {
        return Err(ValidationError::MissingThreshold);
    }

    if let Some(value) = notify_below_price {
        if value <= 0 {
            return Err(ValidationError::NonPositive {
                field: "notify_below_price",
                value,
            });
        }
    }

    if let Some(value) = price_drop_percent {
        if value <= 0 {
            return Err(ValidationError::NonPositive {
                field: "price_drop_percent",
                value,
            });
        }
        if value > MAX_DROP_PERCENT {
            return Err(ValidationError::PercentOutOfRange(value));
        }
    }

    Ok(())
}

/// Validate a `DD-MM-YYYY` date string.
///
/// The date must be zero-padded and exist in the calendar.
pub fn validate_track_date(date: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::InvalidDate(date.to_string());

    let parts: Vec<&str> = date.split('-').collect();
    if parts.len() != 3
        || parts[0].len() != 2
        || parts[1].len() != 2
        || parts[2].len() != 4
        || !parts.iter().all(|p| p.chars().all(|c| c.is_ascii_digit()))
    {
        return Err(invalid());
    }

    NaiveDate::parse_from_str(date, "%d-%m-%Y")
        .map(|_| ())
        .map_err(|_| invalid())
}

/// Validate a city name as typed by the user.
pub fn validate_city(field: &'static str, city: &str) -> Result<(), ValidationError> {
    if city.trim().is_empty() {
        return Err(ValidationError::Empty(field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_require_one() {
        assert_eq!(
            validate_thresholds(None, None),
            Err(ValidationError::MissingThreshold)
        );
        assert!(validate_thresholds(Some(5000), None).is_ok());
        assert!(validate_thresholds(None, Some(10)).is_ok());
        assert!(validate_thresholds(Some(5000), Some(10)).is_ok());
    }

    #[test]
    fn test_thresholds_must_be_positive() {
        assert!(matches!(
            validate_thresholds(Some(0), None),
            Err(ValidationError::NonPositive { field: "notify_below_price", .. })
        ));
        assert!(matches!(
            validate_thresholds(Some(100), Some(-5)),
            Err(ValidationError::NonPositive { field: "price_drop_percent", .. })
        ));
    }

    #[test]
    fn test_percent_threshold_capped() {
        assert!(validate_thresholds(None, Some(MAX_DROP_PERCENT)).is_ok());
        assert_eq!(
            validate_thresholds(None, Some(101)),
            Err(ValidationError::PercentOutOfRange(101))
        );
        assert_eq!(
            validate_thresholds(Some(5000), Some(100_000_000_000_000_000)),
            Err(ValidationError::PercentOutOfRange(100_000_000_000_000_000))
        );
    }

    #[test]
    fn test_track_date_format() {
        assert!(validate_track_date("17-05-2026").is_ok());
        assert!(validate_track_date("01-12-2030").is_ok());

        assert!(validate_track_date("2026-05-17").is_err());
        assert!(validate_track_date("17-5-2026").is_err());
        assert!(validate_track_date("32-01-2026").is_err());
        assert!(validate_track_date("10-13-2026").is_err());
        assert!(validate_track_date("aa-bb-cccc").is_err());
        assert!(validate_track_date("31-02-2030").is_err());
        assert!(validate_track_date("29-02-2031").is_err());
        assert!(validate_track_date("29-02-2032").is_ok());
        assert!(validate_track_date("").is_err());
    }

    #[test]
    fn test_city_not_empty() {
        assert!(validate_city("origin_city", "moscow").is_ok());
        assert_eq!(
            validate_city("origin_city", "   "),
            Err(ValidationError::Empty("origin_city"))
        );
    }
}
