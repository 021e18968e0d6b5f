//! Configuration for the tracking engine.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Result, TrackerError};

/// Default interval between price-check cycles (30 minutes).
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 1800;

/// Default number of routes checked at once.
pub const DEFAULT_CHECK_CONCURRENCY: usize = 1;

/// Default number of months the date selector can page through.
pub const DEFAULT_CALENDAR_HORIZON_MONTHS: u32 = 12;

/// Default UTC offset used when showing history timestamps (Moscow).
pub const DEFAULT_DISPLAY_UTC_OFFSET_HOURS: i32 = 3;

/// Tracking engine configuration.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Interval between price-check cycles.
    pub check_interval: Duration,
    /// Routes evaluated concurrently within one cycle. 1 means sequential.
    pub check_concurrency: usize,
    /// Months reachable with the calendar arrows, counting the current one.
    pub calendar_horizon_months: u32,
    /// Deactivate routes whose departure day has passed.
    pub deactivate_past_routes: bool,
    /// Offset applied to stored UTC timestamps before display.
    pub display_utc_offset_hours: i32,
    /// Entries shown by `/history`.
    pub history_limit: i64,
    /// Routes shown by `/alltracks`.
    pub recent_tracks_limit: i64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(DEFAULT_CHECK_INTERVAL_SECS),
            check_concurrency: DEFAULT_CHECK_CONCURRENCY,
            calendar_horizon_months: DEFAULT_CALENDAR_HORIZON_MONTHS,
            deactivate_past_routes: true,
            display_utc_offset_hours: DEFAULT_DISPLAY_UTC_OFFSET_HOURS,
            history_limit: 5,
            recent_tracks_limit: 5,
        }
    }
}

impl TrackerConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional env vars:
    /// - `PRICE_CHECK_INTERVAL_SECS` (default: 1800)
    /// - `PRICE_CHECK_CONCURRENCY` (default: 1)
    /// - `CALENDAR_HORIZON_MONTHS` (default: 12)
    /// - `DEACTIVATE_PAST_ROUTES` (default: true)
    /// - `DISPLAY_UTC_OFFSET_HOURS` (default: 3)
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let interval_secs: u64 =
            parse_env("PRICE_CHECK_INTERVAL_SECS", DEFAULT_CHECK_INTERVAL_SECS)?;
        if interval_secs == 0 {
            return Err(TrackerError::Config(
                "PRICE_CHECK_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }

        let check_concurrency: usize =
            parse_env("PRICE_CHECK_CONCURRENCY", DEFAULT_CHECK_CONCURRENCY)?;
        let calendar_horizon_months: u32 =
            parse_env("CALENDAR_HORIZON_MONTHS", DEFAULT_CALENDAR_HORIZON_MONTHS)?;
        if calendar_horizon_months == 0 {
            return Err(TrackerError::Config(
                "CALENDAR_HORIZON_MONTHS must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            check_interval: Duration::from_secs(interval_secs),
            check_concurrency: check_concurrency.max(1),
            calendar_horizon_months,
            deactivate_past_routes: parse_env("DEACTIVATE_PAST_ROUTES", true)?,
            display_utc_offset_hours: parse_env(
                "DISPLAY_UTC_OFFSET_HOURS",
                DEFAULT_DISPLAY_UTC_OFFSET_HOURS,
            )?,
            ..defaults
        })
    }
}

fn parse_env<T: FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| TrackerError::Config(format!("{} has an invalid value: {}", name, raw))),
        _ => Ok(default),
    }
}
