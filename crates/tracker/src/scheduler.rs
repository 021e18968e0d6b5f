//! Periodic price checks over every active tracked route.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use database::{tracked_route, user, Database, DatabaseError, TrackedRoute};
use futures::stream::{self, StreamExt};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::TrackerConfig;
use crate::dispatcher::{DispatchOutcome, NotificationDispatcher};
use crate::error::Result;
use crate::evaluator::{evaluate, Evaluation, Thresholds};
use crate::fares::FareLookup;
use crate::format::parse_track_date;

/// What happened to one route during a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Departure day has passed; the route was deactivated.
    Expired,
    /// Stored date could not be parsed; left alone.
    InvalidDate,
    /// City names no longer resolve.
    Unresolved,
    /// The fare lookup returned nothing.
    NoOffers,
    NoChange,
    /// A condition fired for an already-notified price.
    Skipped,
    Notified,
    /// The notification was recorded but not delivered.
    DeliveryFailed,
    /// The route was cancelled after the cycle listed it.
    Cancelled,
    /// Storage failed for this route.
    Failed,
}

/// Tally of one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub checked: usize,
    pub notified: usize,
    pub expired: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl CycleReport {
    fn add(&mut self, outcome: RouteOutcome) {
        self.checked += 1;
        match outcome {
            RouteOutcome::Notified | RouteOutcome::DeliveryFailed => self.notified += 1,
            RouteOutcome::Expired => self.expired += 1,
            RouteOutcome::Skipped => self.skipped += 1,
            RouteOutcome::Failed => self.failed += 1,
            RouteOutcome::InvalidDate
            | RouteOutcome::Cancelled
            | RouteOutcome::Unresolved
            | RouteOutcome::NoOffers
            | RouteOutcome::NoChange => {}
        }
    }
}

/// Re-queries fares for tracked routes and notifies owners.
pub struct PriceChecker {
    db: Database,
    lookup: FareLookup,
    dispatcher: NotificationDispatcher,
    config: TrackerConfig,
}

impl PriceChecker {
    pub fn new(
        db: Database,
        lookup: FareLookup,
        dispatcher: NotificationDispatcher,
        config: TrackerConfig,
    ) -> Self {
        Self {
            db,
            lookup,
            dispatcher,
            config,
        }
    }

    /// Start checking on a fixed interval.
    ///
    /// The first cycle runs one interval after the call. The task runs until
    /// the runtime shuts down.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    /// Check forever on the configured interval.
    pub async fn run(&self) {
        let period = self.config.check_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Price checker started (every {:?})", period);
        loop {
            ticker.tick().await;
            let today = Local::now().date_naive();
            match self.run_cycle(today).await {
                Ok(report) => info!(
                    checked = report.checked,
                    notified = report.notified,
                    expired = report.expired,
                    skipped = report.skipped,
                    failed = report.failed,
                    "Price check cycle finished"
                ),
                Err(e) => error!("Price check cycle failed: {}", e),
            }
        }
    }

    /// Check every active route once, in ascending id order.
    pub async fn run_cycle(&self, today: NaiveDate) -> Result<CycleReport> {
        let routes = tracked_route::list_active(self.db.pool()).await?;
        debug!("Checking {} active routes", routes.len());

        let outcomes: Vec<RouteOutcome> = stream::iter(routes)
            .map(|route| async move { self.check_route(&route, today).await })
            .buffered(self.config.check_concurrency.max(1))
            .collect()
            .await;

        let mut report = CycleReport::default();
        for outcome in outcomes {
            report.add(outcome);
        }
        Ok(report)
    }

    /// Check a single route and persist the result.
    pub async fn check_route(&self, route: &TrackedRoute, today: NaiveDate) -> RouteOutcome {
        let Some(depart) = parse_track_date(&route.depart_date) else {
            warn!(route_id = route.id, "Unparseable departure date '{}'", route.depart_date);
            return RouteOutcome::InvalidDate;
        };

        if self.config.deactivate_past_routes && depart < today {
            return match tracked_route::deactivate(self.db.pool(), route.id).await {
                Ok(()) => {
                    info!(route_id = route.id, "Deactivated route departing {}", route.depart_date);
                    RouteOutcome::Expired
                }
                Err(e) => {
                    error!(route_id = route.id, "Failed to deactivate route: {}", e);
                    RouteOutcome::Failed
                }
            };
        }

        let owner = match user::get_user(self.db.pool(), route.user_id).await {
            Ok(owner) => owner,
            Err(e) => {
                error!(route_id = route.id, "Failed to load route owner: {}", e);
                return RouteOutcome::Failed;
            }
        };

        let Some(resolved) = self
            .lookup
            .resolve_route(&route.origin_city, &route.destination_city)
            .await
        else {
            warn!(
                route_id = route.id,
                "Could not resolve {} -> {}", route.origin_city, route.destination_city
            );
            return RouteOutcome::Unresolved;
        };

        let current = self.lookup.cheapest(&resolved, depart, &route.currency).await;
        let evaluation = evaluate(current, &Thresholds::of(route), &route.check_state());

        let (state, outcome) = match evaluation {
            Evaluation::NoOffers => {
                debug!(route_id = route.id, "No offers");
                return RouteOutcome::NoOffers;
            }
            Evaluation::NoChange(state) => (state, RouteOutcome::NoChange),
            Evaluation::Skip(state) => {
                debug!(route_id = route.id, "Price already notified");
                (state, RouteOutcome::Skipped)
            }
            Evaluation::Notify { triggers, state } => {
                // The cycle works from a snapshot; the owner may have
                // cancelled while earlier lookups were awaited.
                match tracked_route::get_route(self.db.pool(), route.id).await {
                    Ok(current_row) if current_row.active => {}
                    Ok(_) | Err(DatabaseError::NotFound { .. }) => {
                        debug!(route_id = route.id, "Route cancelled during the cycle");
                        return RouteOutcome::Cancelled;
                    }
                    Err(e) => {
                        error!(route_id = route.id, "Failed to reload route: {}", e);
                        return RouteOutcome::Failed;
                    }
                }

                let price = state.last_checked_price.unwrap_or_default();
                match self
                    .dispatcher
                    .dispatch(&owner, route, &resolved, depart, price, &triggers)
                    .await
                {
                    Ok(DispatchOutcome::Delivered) => (state, RouteOutcome::Notified),
                    Ok(DispatchOutcome::DeliveryFailed) => (state, RouteOutcome::DeliveryFailed),
                    Err(e) => {
                        // Nothing was recorded or sent. Leave the row as it
                        // was so the next cycle evaluates the same change.
                        error!(route_id = route.id, "Failed to record notification: {}", e);
                        return RouteOutcome::Failed;
                    }
                }
            }
        };

        if let Err(e) = tracked_route::record_check(self.db.pool(), route.id, &state).await {
            error!(route_id = route.id, "Failed to store check result: {}", e);
            return RouteOutcome::Failed;
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_report_tally() {
        let mut report = CycleReport::default();
        for outcome in [
            RouteOutcome::Notified,
            RouteOutcome::DeliveryFailed,
            RouteOutcome::Expired,
            RouteOutcome::Skipped,
            RouteOutcome::NoOffers,
            RouteOutcome::Failed,
        ] {
            report.add(outcome);
        }
        assert_eq!(
            report,
            CycleReport {
                checked: 6,
                notified: 2,
                expired: 1,
                skipped: 1,
                failed: 1,
            }
        );
    }
}
