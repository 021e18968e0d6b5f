//! Decides whether a fresh price observation warrants a notification.
//!
//! [`evaluate`] is pure: it takes the observed price, the route's thresholds
//! and its bookkeeping, and returns the next bookkeeping together with the
//! decision. The scheduler does all I/O.

use database::{CheckState, TrackedRoute};

/// Notification conditions of a tracked route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Thresholds {
    /// Notify when the price is at or below this value.
    pub below_price: Option<i64>,
    /// Notify when the price fell by at least this many percent since the
    /// previous check.
    pub drop_percent: Option<i64>,
}

impl Thresholds {
    pub fn of(route: &TrackedRoute) -> Self {
        Self {
            below_price: route.notify_below_price,
            drop_percent: route.price_drop_percent,
        }
    }
}

/// A condition that fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The price is at or below `limit`.
    Price { limit: i64 },
    /// The price fell by `drop` percent (truncated).
    Percent { drop: i64 },
}

/// Outcome of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    /// The lookup returned nothing; leave the route untouched.
    NoOffers,
    /// A condition fired but the user was already told about this exact
    /// price. Only the checked price moves.
    Skip(CheckState),
    /// Tell the user.
    Notify {
        triggers: Vec<Trigger>,
        state: CheckState,
    },
    /// Nothing fired.
    NoChange(CheckState),
}

impl Evaluation {
    /// Bookkeeping to persist, if any.
    pub fn state(&self) -> Option<&CheckState> {
        match self {
            Evaluation::NoOffers => None,
            Evaluation::Skip(state)
            | Evaluation::NoChange(state)
            | Evaluation::Notify { state, .. } => Some(state),
        }
    }
}

/// Evaluate an observed price against a route.
///
/// The drop is measured against the previous checked price; on the first
/// observation that is the current price itself, so a percent condition
/// can not fire. A percent condition only fires again when the drop is
/// strictly larger than the one last notified.
pub fn evaluate(current: Option<i64>, thresholds: &Thresholds, state: &CheckState) -> Evaluation {
    let Some(current) = current else {
        return Evaluation::NoOffers;
    };

    let checked = CheckState {
        last_checked_price: Some(current),
        ..*state
    };

    let mut triggers = Vec::new();

    if let Some(limit) = thresholds.below_price {
        if current <= limit {
            triggers.push(Trigger::Price { limit });
        }
    }

    let previous = state.last_checked_price.unwrap_or(current);
    if let Some(threshold) = thresholds.drop_percent {
        if previous > 0 && current < previous {
            // Exact comparisons in i128: drop% = (previous - current) * 100 / previous.
            let previous_wide = i128::from(previous);
            let scaled_drop = (previous_wide - i128::from(current)) * 100;
            let reaches_threshold = scaled_drop >= i128::from(threshold) * previous_wide;
            let exceeds_last = state
                .last_notified_percent
                .map_or(true, |last| scaled_drop > i128::from(last) * previous_wide);

            if reaches_threshold && exceeds_last {
                // A drop never exceeds 100% of a positive price.
                let drop = i64::try_from(scaled_drop / previous_wide).unwrap_or(i64::MAX);
                triggers.push(Trigger::Percent { drop });
            }
        }
    }

    if triggers.is_empty() {
        return Evaluation::NoChange(checked);
    }

    if state.last_notified_price == Some(current) {
        return Evaluation::Skip(checked);
    }

    let percent = triggers.iter().find_map(|trigger| match trigger {
        Trigger::Percent { drop } => Some(*drop),
        Trigger::Price { .. } => None,
    });

    Evaluation::Notify {
        state: CheckState {
            last_notified_price: Some(current),
            last_notified_percent: percent.or(state.last_notified_percent),
            ..checked
        },
        triggers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price_only(limit: i64) -> Thresholds {
        Thresholds {
            below_price: Some(limit),
            drop_percent: None,
        }
    }

    fn percent_only(percent: i64) -> Thresholds {
        Thresholds {
            below_price: None,
            drop_percent: Some(percent),
        }
    }

    #[test]
    fn test_no_offers() {
        let state = CheckState::default();
        assert_eq!(evaluate(None, &price_only(5000), &state), Evaluation::NoOffers);
        assert_eq!(Evaluation::NoOffers.state(), None);
    }

    #[test]
    fn test_price_threshold_then_repeat_price() {
        let thresholds = price_only(5000);

        let first = evaluate(Some(4800), &thresholds, &CheckState::default());
        let state = match first {
            Evaluation::Notify { triggers, state } => {
                assert_eq!(triggers, vec![Trigger::Price { limit: 5000 }]);
                assert_eq!(state.last_notified_price, Some(4800));
                assert_eq!(state.last_checked_price, Some(4800));
                state
            }
            other => panic!("expected notify, got {:?}", other),
        };

        let second = evaluate(Some(4800), &thresholds, &state);
        assert_eq!(second, Evaluation::Skip(state));
    }

    #[test]
    fn test_price_above_threshold() {
        let state = CheckState::default();
        let result = evaluate(Some(5200), &price_only(5000), &state);
        assert_eq!(
            result,
            Evaluation::NoChange(CheckState {
                last_checked_price: Some(5200),
                ..state
            })
        );
    }

    #[test]
    fn test_price_at_threshold_notifies() {
        let result = evaluate(Some(5000), &price_only(5000), &CheckState::default());
        assert!(matches!(result, Evaluation::Notify { .. }));
    }

    #[test]
    fn test_new_lower_price_notifies_again() {
        let state = CheckState {
            last_checked_price: Some(4800),
            last_notified_price: Some(4800),
            last_notified_percent: None,
        };
        let result = evaluate(Some(4700), &price_only(5000), &state);
        assert!(matches!(result, Evaluation::Notify { .. }));
    }

    #[test]
    fn test_percent_drop_then_smaller_drop() {
        let thresholds = percent_only(10);
        let state = CheckState {
            last_checked_price: Some(1000),
            ..Default::default()
        };

        let state = match evaluate(Some(880), &thresholds, &state) {
            Evaluation::Notify { triggers, state } => {
                assert_eq!(triggers, vec![Trigger::Percent { drop: 12 }]);
                assert_eq!(state.last_notified_percent, Some(12));
                assert_eq!(state.last_notified_price, Some(880));
                assert_eq!(state.last_checked_price, Some(880));
                state
            }
            other => panic!("expected notify, got {:?}", other),
        };

        let next = evaluate(Some(870), &thresholds, &state);
        assert!(matches!(next, Evaluation::NoChange(s) if s.last_checked_price == Some(870)));
    }

    #[test]
    fn test_first_observation_never_fires_percent() {
        let result = evaluate(Some(100), &percent_only(1), &CheckState::default());
        assert!(matches!(result, Evaluation::NoChange(_)));
    }

    #[test]
    fn test_percent_must_exceed_last_notified() {
        let thresholds = percent_only(10);
        let state = CheckState {
            last_checked_price: Some(1000),
            last_notified_price: Some(700),
            last_notified_percent: Some(15),
        };

        // 15% again is not larger than the last notified drop.
        assert!(matches!(
            evaluate(Some(850), &thresholds, &state),
            Evaluation::NoChange(_)
        ));

        // 20% is.
        assert!(matches!(
            evaluate(Some(800), &thresholds, &state),
            Evaluation::Notify { .. }
        ));
    }

    #[test]
    fn test_price_increase_never_fires_percent() {
        let state = CheckState {
            last_checked_price: Some(1000),
            ..Default::default()
        };
        assert!(matches!(
            evaluate(Some(1500), &percent_only(10), &state),
            Evaluation::NoChange(_)
        ));
    }

    #[test]
    fn test_both_triggers() {
        let thresholds = Thresholds {
            below_price: Some(900),
            drop_percent: Some(10),
        };
        let state = CheckState {
            last_checked_price: Some(1000),
            ..Default::default()
        };
        match evaluate(Some(850), &thresholds, &state) {
            Evaluation::Notify { triggers, state } => {
                assert_eq!(
                    triggers,
                    vec![Trigger::Price { limit: 900 }, Trigger::Percent { drop: 15 }]
                );
                assert_eq!(state.last_notified_percent, Some(15));
            }
            other => panic!("expected notify, got {:?}", other),
        }
    }

    #[test]
    fn test_price_trigger_keeps_last_percent() {
        let state = CheckState {
            last_checked_price: Some(4900),
            last_notified_price: Some(4500),
            last_notified_percent: Some(12),
        };
        match evaluate(Some(4800), &price_only(5000), &state) {
            Evaluation::Notify { state, .. } => {
                assert_eq!(state.last_notified_percent, Some(12));
            }
            other => panic!("expected notify, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_previous_price_skips_percent() {
        let state = CheckState {
            last_checked_price: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            evaluate(Some(0), &percent_only(10), &state),
            Evaluation::NoChange(_)
        ));
    }

    #[test]
    fn test_huge_values_do_not_overflow() {
        let state = CheckState {
            last_checked_price: Some(5000),
            ..Default::default()
        };
        assert!(matches!(
            evaluate(Some(4000), &percent_only(100_000_000_000_000_000), &state),
            Evaluation::NoChange(_)
        ));

        let state = CheckState {
            last_checked_price: Some(i64::MAX),
            last_notified_price: None,
            last_notified_percent: Some(i64::MAX),
        };
        assert!(matches!(
            evaluate(Some(1), &percent_only(i64::MAX), &state),
            Evaluation::NoChange(_)
        ));

        let state = CheckState {
            last_checked_price: Some(i64::MAX),
            ..Default::default()
        };
        match evaluate(Some(1), &percent_only(99), &state) {
            Evaluation::Notify { triggers, .. } => {
                assert_eq!(triggers, vec![Trigger::Percent { drop: 99 }]);
            }
            other => panic!("expected notify, got {:?}", other),
        }
    }
}
