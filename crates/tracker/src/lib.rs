//! Conversation flows and the price tracking engine for the fare bot.
//!
//! This crate is transport-agnostic. Chat updates come in as
//! [`InboundEvent`]s and replies leave through a [`ChatSender`]
//! implementation supplied by the caller.
//!
//! # Architecture
//!
//! ```text
//! chat update ──► Conversation ──► SessionStore (per-chat mode)
//!                     │
//!                     ├── FareLookup ──► CityResolver / FareSource
//!                     ├── HistoryRecorder, TrackingService ──► database
//!                     └── ChatSender
//!
//! interval ──► PriceChecker ──► evaluate() ──► NotificationDispatcher ──► ChatSender
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tracker::{Catalog, Conversation, FareLookup, InboundEvent, LoggingSender, Translator, TrackerConfig};
//!
//! let translator = Arc::new(Translator::load(&db).await?);
//! let catalog = Arc::new(Catalog::load(&db).await?);
//! let lookup = FareLookup::new(client.clone(), client);
//! let conversation = Conversation::new(
//!     db,
//!     Arc::new(LoggingSender),
//!     lookup,
//!     translator,
//!     catalog,
//!     TrackerConfig::from_env()?,
//! );
//!
//! conversation.handle(InboundEvent::text(42, "москва сочи")).await?;
//! ```

pub mod calendar;
pub mod callback;
pub mod catalog;
pub mod command;
pub mod config;
pub mod conversation;
pub mod dispatcher;
pub mod error;
pub mod evaluator;
pub mod fares;
pub mod filters;
pub mod format;
pub mod history;
pub mod i18n;
pub mod keyboard;
pub mod links;
pub mod scheduler;
pub mod sender;
pub mod session;
pub mod tracking;

pub use callback::CallbackAction;
pub use catalog::{seed_reference_data, Catalog};
pub use command::{bot_commands, Command};
pub use config::TrackerConfig;
pub use conversation::{Conversation, EventKind, InboundEvent};
pub use dispatcher::{DispatchOutcome, NotificationDispatcher};
pub use error::{Result, TrackerError};
pub use evaluator::{evaluate, Evaluation, Thresholds, Trigger};
pub use fares::{FareLookup, FareQuery, LookupResult, ResolvedRoute};
pub use i18n::{Lang, Translator};
pub use keyboard::{Button, ButtonAction, Keyboard};
pub use scheduler::{CycleReport, PriceChecker, RouteOutcome};
pub use sender::{ChatSender, LoggingSender, NoOpSender, OutgoingMessage, RecordingSender, SentItem};
pub use session::{Mode, Session, SessionStore};
