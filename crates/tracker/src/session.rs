//! Per-chat conversation state.
//!
//! Sessions live in memory only. Language and currency are read from the
//! users table the first time a chat is seen after a restart; everything
//! else starts fresh.

use std::collections::HashMap;

use database::{user, Database, DatabaseError};
use tokio::sync::RwLock;
use tracing::warn;

use crate::calendar::DateSelector;
use crate::filters::FilterSettings;
use crate::i18n::Lang;
use crate::tracking::{ThresholdKind, TrackDraft};

/// What the calendar is collecting dates for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarPurpose {
    Search,
    Track,
}

/// Open calendar for a pending route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarFlow {
    pub origin: String,
    pub destination: String,
    pub purpose: CalendarPurpose,
    pub selector: DateSelector,
}

/// Stage of the track-setup flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackSetup {
    /// Waiting for `<origin> <destination> [date]`.
    AwaitingRoute,
    /// Route and dates known; thresholds being chosen on the keyboard.
    Configuring(TrackDraft),
}

/// The single active flow of a chat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Idle,
    Calendar(CalendarFlow),
    /// Filter keyboard open; edits apply to this draft until "done".
    Filters(FilterSettings),
    TrackSetup(TrackSetup),
    AwaitingThreshold {
        draft: TrackDraft,
        kind: ThresholdKind,
    },
    AwaitingFeedback,
}

impl Mode {
    /// Take the track draft out of a configuring or awaiting-threshold
    /// mode, leaving `Idle` behind. Other modes are left untouched.
    pub fn take_track_draft(&mut self) -> Option<TrackDraft> {
        match std::mem::take(self) {
            Mode::TrackSetup(TrackSetup::Configuring(draft)) | Mode::AwaitingThreshold { draft, .. } => {
                Some(draft)
            }
            other => {
                *self = other;
                None
            }
        }
    }
}

/// Everything the bot remembers about a chat between updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub lang: Lang,
    pub currency: String,
    /// Ambient filters for every lookup.
    pub filters: FilterSettings,
    pub mode: Mode,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            lang: Lang::default(),
            currency: Lang::default().default_currency().to_string(),
            filters: FilterSettings::default(),
            mode: Mode::Idle,
        }
    }
}

/// In-memory session storage keyed by chat ID.
pub struct SessionStore {
    sessions: RwLock<HashMap<i64, Session>>,
    database: Option<Database>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// A store that never consults the database.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            database: None,
        }
    }

    /// A store that seeds new sessions from the users table.
    pub fn with_database(database: Database) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            database: Some(database),
        }
    }

    /// Current session for a chat, or a fresh one.
    pub async fn get(&self, chat_id: i64) -> Session {
        if let Some(session) = self.sessions.read().await.get(&chat_id) {
            return session.clone();
        }

        let mut session = Session::default();
        if let Some(database) = &self.database {
            match user::get_by_chat_id(database.pool(), chat_id).await {
                Ok(stored) => {
                    session.lang = Lang::from_code(&stored.language).unwrap_or_default();
                    session.currency = stored.currency;
                }
                Err(DatabaseError::NotFound { .. }) => {}
                Err(err) => warn!("Failed to load user {}: {}", chat_id, err),
            }
        }

        self.sessions.write().await.insert(chat_id, session.clone());
        session
    }

    /// Replace the session for a chat.
    pub async fn put(&self, chat_id: i64, session: Session) {
        self.sessions.write().await.insert(chat_id, session);
    }

    /// Forget a chat.
    pub async fn remove(&self, chat_id: i64) {
        self.sessions.write().await.remove(&chat_id);
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
