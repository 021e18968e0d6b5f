//! Long-polling update stream.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::stream::{self, Stream};
use tracing::{debug, error, info, warn};

use crate::client::BotClient;
use crate::error::BotError;
use crate::types::Update;

/// Backoff applied when `getUpdates` fails.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Maximum number of consecutive retries (None = infinite).
    pub max_retries: Option<u32>,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Growth factor per consecutive failure.
    pub backoff_multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_retries: None,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
        }
    }
}

impl ReconnectConfig {
    /// Delay to wait after `attempt` consecutive failures.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay_ms = self.initial_delay.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_millis(delay_ms as u64).min(self.max_delay)
    }

    /// Whether another retry is allowed after `attempts` failures.
    pub fn should_retry(&self, attempts: u32) -> bool {
        self.max_retries.map_or(true, |max| attempts < max)
    }
}

struct PollState {
    client: BotClient,
    reconnect: ReconnectConfig,
    offset: Option<i64>,
    buffer: VecDeque<Update>,
    attempts: u32,
    finished: bool,
}

impl PollState {
    async fn next(mut self) -> Option<(Result<Update, BotError>, Self)> {
        loop {
            if let Some(update) = self.buffer.pop_front() {
                return Some((Ok(update), self));
            }
            if self.finished {
                return None;
            }

            match self.client.get_updates(self.offset).await {
                Ok(updates) => {
                    if self.attempts > 0 {
                        info!("Update polling restored after {} failures", self.attempts);
                    }
                    self.attempts = 0;
                    if let Some(last) = updates.last() {
                        // Acknowledges everything up to `last` on the next call
                        self.offset = Some(last.update_id + 1);
                    }
                    if !updates.is_empty() {
                        debug!(count = updates.len(), "Received updates");
                    }
                    self.buffer.extend(updates);
                }
                Err(e) if self.reconnect.should_retry(self.attempts) => {
                    let delay = self.reconnect.delay_for_attempt(self.attempts);
                    self.attempts += 1;
                    warn!(
                        "getUpdates failed: {} (failures: {}, retrying in {:?})",
                        e, self.attempts, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    error!("getUpdates failed, giving up: {}", e);
                    self.finished = true;
                    return Some((Err(e), self));
                }
            }
        }
    }
}

/// A stream of incoming updates.
///
/// Transient failures are retried with backoff; the stream only yields an
/// error once retries are exhausted, and ends right after it.
pub struct UpdateStream {
    inner: Pin<Box<dyn Stream<Item = Result<Update, BotError>> + Send>>,
}

impl UpdateStream {
    /// Create an update stream with the default backoff.
    pub fn new(client: &BotClient) -> Self {
        Self::with_reconnect(client, ReconnectConfig::default())
    }

    /// Create an update stream with custom backoff.
    pub fn with_reconnect(client: &BotClient, reconnect: ReconnectConfig) -> Self {
        info!("Starting long polling against {}", client.config().api_base);

        let state = PollState {
            client: client.clone(),
            reconnect,
            offset: None,
            buffer: VecDeque::new(),
            attempts: 0,
            finished: false,
        };

        Self {
            inner: Box::pin(stream::unfold(state, PollState::next)),
        }
    }
}

impl Stream for UpdateStream {
    type Item = Result<Update, BotError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

/// Create an update stream from a client.
pub fn poll_updates(client: &BotClient) -> UpdateStream {
    UpdateStream::new(client)
}

/// Create an update stream with custom backoff.
pub fn poll_updates_with_reconnect(client: &BotClient, reconnect: ReconnectConfig) -> UpdateStream {
    UpdateStream::with_reconnect(client, reconnect)
}
