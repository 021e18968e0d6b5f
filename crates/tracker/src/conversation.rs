//! Conversation handler: turns chat updates into replies.
//!
//! Each update runs to completion against the chat's [`Session`]. Commands
//! always win; other text is interpreted according to the session's
//! [`Mode`]; button presses are decoded into [`CallbackAction`]s.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use database::{feedback, user, Database, DatabaseError, User, MAX_DROP_PERCENT};
use tracing::{debug, error, info, warn};

use crate::calendar::{DateSelector, DoneOutcome};
use crate::callback::CallbackAction;
use crate::catalog::Catalog;
use crate::command::Command;
use crate::config::TrackerConfig;
use crate::error::{Result, TrackerError};
use crate::fares::{render_offers, FareLookup, FareQuery};
use crate::filters::FilterSettings;
use crate::format::{parse_track_date, track_date};
use crate::history::{render_entry, HistoryRecorder};
use crate::i18n::{Lang, Translator};
use crate::keyboard::{Button, Keyboard};
use crate::sender::{ChatSender, OutgoingMessage};
use crate::session::{CalendarFlow, CalendarPurpose, Mode, Session, SessionStore, TrackSetup};
use crate::tracking::{
    render_active_route, render_recent_route, untrack_keyboard, CancelOutcome, ThresholdKind,
    TrackDraft, TrackingService,
};

/// An update from the chat platform, reduced to what the bot reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub chat_id: i64,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// A text message.
    Text(String),
    /// A press on one of the bot's inline buttons.
    Callback {
        callback_id: String,
        /// Message the button belongs to.
        message_id: i64,
        data: String,
    },
}

impl InboundEvent {
    pub fn text(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            kind: EventKind::Text(text.into()),
        }
    }

    pub fn callback(
        chat_id: i64,
        callback_id: impl Into<String>,
        message_id: i64,
        data: impl Into<String>,
    ) -> Self {
        Self {
            chat_id,
            kind: EventKind::Callback {
                callback_id: callback_id.into(),
                message_id,
                data: data.into(),
            },
        }
    }
}

/// Parsed `<origin> <destination> [DD-MM-YYYY]` input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteInput {
    /// Wrong number of words.
    Invalid,
    /// Third word is not a date.
    BadDate,
    /// No date given.
    Open { origin: String, destination: String },
    /// A date before today.
    Past {
        origin: String,
        destination: String,
        date: NaiveDate,
    },
    Dated {
        origin: String,
        destination: String,
        date: NaiveDate,
    },
}

/// Parse route text. City names are lowercased.
pub fn parse_route_input(text: &str, today: NaiveDate) -> RouteInput {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered.split_whitespace().collect();

    match words.as_slice() {
        [origin, destination] => RouteInput::Open {
            origin: origin.to_string(),
            destination: destination.to_string(),
        },
        [origin, destination, raw_date] => match parse_track_date(raw_date) {
            None => RouteInput::BadDate,
            Some(date) if date < today => RouteInput::Past {
                origin: origin.to_string(),
                destination: destination.to_string(),
                date,
            },
            Some(date) => RouteInput::Dated {
                origin: origin.to_string(),
                destination: destination.to_string(),
                date,
            },
        },
        _ => RouteInput::Invalid,
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Handles every chat update.
pub struct Conversation {
    db: Database,
    sessions: SessionStore,
    translator: Arc<Translator>,
    catalog: Arc<Catalog>,
    lookup: FareLookup,
    history: HistoryRecorder,
    tracking: TrackingService,
    sender: Arc<dyn ChatSender>,
    config: TrackerConfig,
}

impl Conversation {
    pub fn new(
        db: Database,
        sender: Arc<dyn ChatSender>,
        lookup: FareLookup,
        translator: Arc<Translator>,
        catalog: Arc<Catalog>,
        config: TrackerConfig,
    ) -> Self {
        Self {
            sessions: SessionStore::with_database(db.clone()),
            history: HistoryRecorder::new(db.clone()),
            tracking: TrackingService::new(db.clone()),
            db,
            translator,
            catalog,
            lookup,
            sender,
            config,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Handle one update.
    ///
    /// Unexpected failures are logged, answered with a generic message and
    /// returned.
    pub async fn handle(&self, event: InboundEvent) -> Result<()> {
        let chat_id = event.chat_id;
        let mut session = self.sessions.get(chat_id).await;

        let result = match event.kind {
            EventKind::Text(text) => self.on_text(chat_id, &mut session, text.trim()).await,
            EventKind::Callback {
                callback_id,
                message_id,
                data,
            } => {
                self.on_callback(chat_id, &mut session, &callback_id, message_id, &data)
                    .await
            }
        };

        let lang = session.lang;
        self.sessions.put(chat_id, session).await;

        if let Err(e) = &result {
            error!("Failed to handle update for chat {}: {}", chat_id, e);
            let notice = OutgoingMessage::text(self.tr("internal_error", lang));
            if let Err(send_err) = self.sender.send_message(chat_id, &notice).await {
                warn!("Failed to report error to chat {}: {}", chat_id, send_err);
            }
        }

        result
    }

    fn tr(&self, key: &str, lang: Lang) -> String {
        self.translator.t(key, lang)
    }

    async fn reply(&self, chat_id: i64, message: OutgoingMessage) -> Result<()> {
        self.sender.send_message(chat_id, &message).await
    }

    async fn reply_text(&self, chat_id: i64, key: &str, lang: Lang) -> Result<()> {
        self.reply(chat_id, OutgoingMessage::text(self.tr(key, lang)))
            .await
    }

    async fn stored_user(&self, chat_id: i64) -> Result<Option<User>> {
        match user::get_by_chat_id(self.db.pool(), chat_id).await {
            Ok(user) => Ok(Some(user)),
            Err(DatabaseError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    // ---- text -------------------------------------------------------------

    async fn on_text(&self, chat_id: i64, session: &mut Session, text: &str) -> Result<()> {
        if text.starts_with('/') {
            return match Command::parse(text) {
                Some(command) => self.on_command(chat_id, session, command).await,
                None => {
                    debug!("Unknown command from {}: {}", chat_id, text);
                    self.send_help(chat_id, session.lang).await
                }
            };
        }

        match &session.mode {
            Mode::TrackSetup(TrackSetup::AwaitingRoute) => {
                self.on_track_route(chat_id, session, text).await
            }
            Mode::AwaitingThreshold { .. } => self.on_threshold_value(chat_id, session, text).await,
            Mode::AwaitingFeedback => self.on_feedback(chat_id, session, text).await,
            _ => self.on_search_text(chat_id, session, text).await,
        }
    }

    async fn on_command(&self, chat_id: i64, session: &mut Session, command: Command) -> Result<()> {
        let lang = session.lang;
        info!("Command /{} from {}", command.name(), chat_id);

        match command {
            Command::Start | Command::Lang => {
                session.mode = Mode::Idle;
                self.reply(
                    chat_id,
                    OutgoingMessage::text(self.tr("choose_language", lang))
                        .with_keyboard(language_keyboard()),
                )
                .await
            }
            Command::Currency => {
                session.mode = Mode::Idle;
                self.send_currency_prompt(chat_id, lang).await
            }
            Command::Filters => {
                session.mode = Mode::Filters(session.filters);
                self.send_filters(chat_id, "filters_title", session.filters, lang)
                    .await
            }
            Command::ResetFilters => {
                session.filters = FilterSettings::default();
                session.mode = Mode::Filters(session.filters);
                self.send_filters(chat_id, "filters_cleared", session.filters, lang)
                    .await
            }
            Command::History => self.send_history(chat_id, lang).await,
            Command::Track => {
                session.mode = Mode::TrackSetup(TrackSetup::AwaitingRoute);
                self.reply(
                    chat_id,
                    OutgoingMessage::text(self.tr("track_start_prompt", lang)).markdown(),
                )
                .await
            }
            Command::MyTracks => self.send_active_tracks(chat_id, lang).await,
            Command::AllTracks => self.send_recent_tracks(chat_id, lang).await,
            Command::Feedback => {
                session.mode = Mode::AwaitingFeedback;
                self.reply_text(chat_id, "feedback_prompt", lang).await
            }
            Command::Help => self.send_help(chat_id, lang).await,
        }
    }

    async fn on_search_text(&self, chat_id: i64, session: &mut Session, text: &str) -> Result<()> {
        let lang = session.lang;
        let today = today();

        match parse_route_input(text, today) {
            RouteInput::Invalid => self.reply_text(chat_id, "invalid_format", lang).await,
            RouteInput::BadDate => self.reply_text(chat_id, "date_error", lang).await,
            RouteInput::Open {
                origin,
                destination,
            } => {
                self.open_calendar(chat_id, session, origin, destination, CalendarPurpose::Search)
                    .await
            }
            RouteInput::Past {
                origin,
                destination,
                date,
            } => {
                self.send_past_date(chat_id, date, lang).await?;
                self.open_calendar(chat_id, session, origin, destination, CalendarPurpose::Search)
                    .await
            }
            RouteInput::Dated {
                origin,
                destination,
                date,
            } => {
                session.mode = Mode::Idle;
                self.search_dates(chat_id, session, &origin, &destination, vec![date])
                    .await
            }
        }
    }

    async fn on_track_route(&self, chat_id: i64, session: &mut Session, text: &str) -> Result<()> {
        let lang = session.lang;

        match parse_route_input(text, today()) {
            RouteInput::Invalid => self.reply_text(chat_id, "invalid_format", lang).await,
            RouteInput::BadDate => self.reply_text(chat_id, "date_error", lang).await,
            RouteInput::Past {
                origin,
                destination,
                date,
            } => {
                if self.lookup.resolve_route(&origin, &destination).await.is_none() {
                    return self.reply_text(chat_id, "city_error", lang).await;
                }
                self.send_past_date(chat_id, date, lang).await?;
                self.open_calendar(chat_id, session, origin, destination, CalendarPurpose::Track)
                    .await
            }
            RouteInput::Open {
                origin,
                destination,
            } => {
                if self.lookup.resolve_route(&origin, &destination).await.is_none() {
                    return self.reply_text(chat_id, "city_error", lang).await;
                }
                self.open_calendar(chat_id, session, origin, destination, CalendarPurpose::Track)
                    .await
            }
            RouteInput::Dated {
                origin,
                destination,
                date,
            } => {
                if self.lookup.resolve_route(&origin, &destination).await.is_none() {
                    return self.reply_text(chat_id, "city_error", lang).await;
                }
                let draft = TrackDraft::new(origin, destination, vec![date]);
                let keyboard = draft.keyboard(&self.translator, lang);
                session.mode = Mode::TrackSetup(TrackSetup::Configuring(draft));
                self.reply(
                    chat_id,
                    OutgoingMessage::text(self.tr("tracking_parameters_prompt", lang))
                        .with_keyboard(keyboard),
                )
                .await
            }
        }
    }

    async fn on_threshold_value(&self, chat_id: i64, session: &mut Session, text: &str) -> Result<()> {
        let lang = session.lang;
        let Some(value) = text.parse::<i64>().ok().filter(|value| *value > 0) else {
            return self.reply_text(chat_id, "positive_number_only", lang).await;
        };
        let percent = matches!(
            session.mode,
            Mode::AwaitingThreshold { kind: ThresholdKind::Percent, .. }
        );
        if percent && value > MAX_DROP_PERCENT {
            return self.reply_text(chat_id, "percent_out_of_range", lang).await;
        }

        match std::mem::take(&mut session.mode) {
            Mode::AwaitingThreshold { mut draft, kind } => {
                draft.set(kind, value);
                let summary = draft.summary(&session.currency, &self.translator, lang);
                let keyboard = draft.keyboard(&self.translator, lang);
                session.mode = Mode::TrackSetup(TrackSetup::Configuring(draft));
                self.reply(chat_id, OutgoingMessage::text(summary).with_keyboard(keyboard))
                    .await
            }
            other => {
                session.mode = other;
                Ok(())
            }
        }
    }

    async fn on_feedback(&self, chat_id: i64, session: &mut Session, text: &str) -> Result<()> {
        let lang = session.lang;
        session.mode = Mode::Idle;

        match self.stored_user(chat_id).await? {
            Some(user) => {
                feedback::record(self.db.pool(), user.id, text).await?;
                info!("Stored feedback from user {}", user.id);
                self.reply_text(chat_id, "feedback_thanks", lang).await
            }
            None => self.reply_text(chat_id, "user_not_found", lang).await,
        }
    }

    // ---- buttons ----------------------------------------------------------

    async fn on_callback(
        &self,
        chat_id: i64,
        session: &mut Session,
        callback_id: &str,
        message_id: i64,
        data: &str,
    ) -> Result<()> {
        let lang = session.lang;

        let action = match data.parse::<CallbackAction>() {
            Ok(action) => action,
            Err(e) => {
                warn!("Ignoring button from {}: {}", chat_id, e);
                self.acknowledge(callback_id, None).await;
                return Ok(());
            }
        };
        debug!("Callback {:?} from {}", action, chat_id);

        let toast = match action {
            CallbackAction::FiltersReset => Some(self.tr("filters_cleared", lang)),
            _ => None,
        };
        self.acknowledge(callback_id, toast.as_deref()).await;

        match action {
            CallbackAction::Noop => Ok(()),
            CallbackAction::Language(selected) => {
                self.on_language(chat_id, session, message_id, selected).await
            }
            CallbackAction::Currency(code) => {
                self.on_currency(chat_id, session, message_id, &code).await
            }
            CallbackAction::PassengerPlus
            | CallbackAction::PassengerMinus
            | CallbackAction::ToggleDirect
            | CallbackAction::FiltersReset => {
                self.on_filter_edit(chat_id, session, message_id, &action)
                    .await
            }
            CallbackAction::FiltersDone => self.on_filters_done(chat_id, session, message_id).await,
            CallbackAction::CalendarDay(_)
            | CallbackAction::PrevMonth
            | CallbackAction::NextMonth
            | CallbackAction::CalendarClear
            | CallbackAction::CalendarDone => {
                self.on_calendar(chat_id, session, message_id, action).await
            }
            CallbackAction::TrackPrice => {
                self.on_threshold_button(chat_id, session, message_id, ThresholdKind::Price)
                    .await
            }
            CallbackAction::TrackPercent => {
                self.on_threshold_button(chat_id, session, message_id, ThresholdKind::Percent)
                    .await
            }
            CallbackAction::TrackConfirm => self.on_track_confirm(chat_id, session, message_id).await,
            CallbackAction::TrackCancel => {
                session.mode = Mode::Idle;
                self.sender.edit_keyboard(chat_id, message_id, None).await?;
                self.reply_text(chat_id, "track_cancelled", lang).await
            }
            CallbackAction::Untrack(route_id) => {
                self.on_untrack(chat_id, session, message_id, route_id).await
            }
        }
    }

    async fn acknowledge(&self, callback_id: &str, text: Option<&str>) {
        if let Err(e) = self.sender.answer_callback(callback_id, text).await {
            debug!("Failed to answer callback {}: {}", callback_id, e);
        }
    }

    async fn on_language(
        &self,
        chat_id: i64,
        session: &mut Session,
        message_id: i64,
        lang: Lang,
    ) -> Result<()> {
        session.lang = lang;
        session.mode = Mode::Idle;

        let stored = user::upsert_language(self.db.pool(), chat_id, lang.code(), lang.default_currency())
            .await?;
        session.currency = stored.currency;
        info!("Chat {} switched language to {}", chat_id, lang);

        self.sender
            .edit_message(
                chat_id,
                message_id,
                &OutgoingMessage::text(self.tr("language_set", lang)),
            )
            .await?;
        self.send_currency_prompt(chat_id, lang).await
    }

    async fn on_currency(
        &self,
        chat_id: i64,
        session: &mut Session,
        message_id: i64,
        code: &str,
    ) -> Result<()> {
        let lang = session.lang;
        let Some(currency) = self.catalog.currency(code).cloned() else {
            return self.reply_text(chat_id, "unknown_currency", lang).await;
        };

        let stored = user::upsert_currency(self.db.pool(), chat_id, &currency.code, lang.code()).await?;
        session.currency = stored.currency;
        session.mode = Mode::Filters(session.filters);

        let label = format!("{} {} ({})", currency.code, currency.flag, currency.symbol);
        self.sender
            .edit_message(
                chat_id,
                message_id,
                &OutgoingMessage::text(self.translator.tf(
                    "currency_set",
                    lang,
                    &[("currency", &label)],
                )),
            )
            .await?;
        self.send_filters(chat_id, "filters_title", session.filters, lang)
            .await
    }

    async fn on_filter_edit(
        &self,
        chat_id: i64,
        session: &mut Session,
        message_id: i64,
        action: &CallbackAction,
    ) -> Result<()> {
        let mut draft = match session.mode {
            Mode::Filters(draft) => draft,
            _ => session.filters,
        };

        match action {
            CallbackAction::PassengerPlus => draft.increment(),
            CallbackAction::PassengerMinus => draft.decrement(),
            CallbackAction::ToggleDirect => draft.toggle_direct(),
            CallbackAction::FiltersReset => draft.reset(),
            _ => {}
        }

        session.mode = Mode::Filters(draft);
        let keyboard = draft.keyboard(&self.translator, session.lang);
        self.sender
            .edit_keyboard(chat_id, message_id, Some(&keyboard))
            .await
    }

    async fn on_filters_done(&self, chat_id: i64, session: &mut Session, message_id: i64) -> Result<()> {
        let lang = session.lang;
        if let Mode::Filters(draft) = session.mode {
            session.filters = draft;
        }
        session.mode = Mode::Idle;

        let summary = session.filters.summary(&self.translator, lang);
        self.sender
            .edit_message(chat_id, message_id, &OutgoingMessage::text(summary))
            .await?;
        self.reply(
            chat_id,
            OutgoingMessage::text(self.tr("welcome", lang)).markdown(),
        )
        .await
    }

    async fn on_calendar(
        &self,
        chat_id: i64,
        session: &mut Session,
        message_id: i64,
        action: CallbackAction,
    ) -> Result<()> {
        let lang = session.lang;
        let today = today();

        let mut flow = match std::mem::take(&mut session.mode) {
            Mode::Calendar(flow) => flow,
            other => {
                session.mode = other;
                return self
                    .sender
                    .edit_message(
                        chat_id,
                        message_id,
                        &OutgoingMessage::text(self.tr("calendar_no_route", lang)),
                    )
                    .await;
            }
        };

        let redraw = match action {
            CallbackAction::CalendarDay(date) => {
                flow.selector.toggle(date);
                true
            }
            CallbackAction::PrevMonth => flow.selector.prev_month(),
            CallbackAction::NextMonth => flow.selector.next_month(),
            CallbackAction::CalendarClear => {
                flow.selector.clear();
                true
            }
            CallbackAction::CalendarDone => {
                return self
                    .on_calendar_done(chat_id, session, message_id, flow, today)
                    .await;
            }
            _ => false,
        };

        let keyboard = flow.selector.render(today, &self.translator, lang);
        session.mode = Mode::Calendar(flow);
        if redraw {
            self.sender
                .edit_keyboard(chat_id, message_id, Some(&keyboard))
                .await?;
        }
        Ok(())
    }

    async fn on_calendar_done(
        &self,
        chat_id: i64,
        session: &mut Session,
        message_id: i64,
        mut flow: CalendarFlow,
        today: NaiveDate,
    ) -> Result<()> {
        let lang = session.lang;

        let notice = match flow.selector.done(today) {
            DoneOutcome::Empty => self.tr("calendar_no_dates", lang),
            DoneOutcome::PastDatesRemoved(past) => {
                let listed: Vec<String> = past.into_iter().map(track_date).collect();
                format!("{}: {}", self.tr("past_date", lang), listed.join(", "))
            }
            DoneOutcome::Ready(dates) => {
                return match flow.purpose {
                    CalendarPurpose::Track => {
                        let draft = TrackDraft::new(flow.origin, flow.destination, dates);
                        let keyboard = draft.keyboard(&self.translator, lang);
                        session.mode = Mode::TrackSetup(TrackSetup::Configuring(draft));
                        self.sender
                            .edit_message(
                                chat_id,
                                message_id,
                                &OutgoingMessage::text(self.tr("track_prompt_dates", lang))
                                    .with_keyboard(keyboard),
                            )
                            .await
                    }
                    CalendarPurpose::Search => {
                        session.mode = Mode::Idle;
                        self.sender
                            .edit_message(
                                chat_id,
                                message_id,
                                &OutgoingMessage::text(self.tr("searching_selected_dates", lang)),
                            )
                            .await?;
                        self.search_dates(chat_id, session, &flow.origin, &flow.destination, dates)
                            .await
                    }
                };
            }
        };

        // Not finished: show why and keep the calendar open.
        let keyboard = flow.selector.render(today, &self.translator, lang);
        session.mode = Mode::Calendar(flow);
        self.sender
            .edit_message(
                chat_id,
                message_id,
                &OutgoingMessage::text(format!("{}\n\n{}", notice, self.tr("choose_dates", lang)))
                    .with_keyboard(keyboard),
            )
            .await
    }

    async fn on_threshold_button(
        &self,
        chat_id: i64,
        session: &mut Session,
        message_id: i64,
        kind: ThresholdKind,
    ) -> Result<()> {
        let lang = session.lang;
        let Some(draft) = session.mode.take_track_draft() else {
            return self.restart_track_setup(chat_id, session, message_id).await;
        };

        session.mode = Mode::AwaitingThreshold { draft, kind };
        self.sender.edit_keyboard(chat_id, message_id, None).await?;
        let prompt = match kind {
            ThresholdKind::Price => "track_enter_price",
            ThresholdKind::Percent => "track_enter_percent",
        };
        self.reply_text(chat_id, prompt, lang).await
    }

    async fn on_track_confirm(&self, chat_id: i64, session: &mut Session, message_id: i64) -> Result<()> {
        let lang = session.lang;
        let Some(draft) = session.mode.take_track_draft() else {
            return self.restart_track_setup(chat_id, session, message_id).await;
        };

        if !draft.has_threshold() {
            let keyboard = draft.keyboard(&self.translator, lang);
            session.mode = Mode::TrackSetup(TrackSetup::Configuring(draft));
            return self
                .reply(
                    chat_id,
                    OutgoingMessage::text(self.tr("track_confirm_missing", lang))
                        .with_keyboard(keyboard),
                )
                .await;
        }

        let Some(owner) = self.stored_user(chat_id).await? else {
            session.mode = Mode::TrackSetup(TrackSetup::Configuring(draft));
            return self.reply_text(chat_id, "user_not_found", lang).await;
        };

        match self.tracking.create(&owner, &draft).await {
            Ok(routes) => {
                self.sender.edit_keyboard(chat_id, message_id, None).await?;
                self.reply(
                    chat_id,
                    OutgoingMessage::text(self.translator.tf(
                        "track_saved",
                        lang,
                        &[("n", &routes.len())],
                    )),
                )
                .await
            }
            Err(TrackerError::Database(DatabaseError::Validation(e))) => {
                warn!("Rejected track request from {}: {}", chat_id, e);
                let keyboard = draft.keyboard(&self.translator, lang);
                session.mode = Mode::TrackSetup(TrackSetup::Configuring(draft));
                self.reply(
                    chat_id,
                    OutgoingMessage::text(self.tr("track_confirm_missing", lang))
                        .with_keyboard(keyboard),
                )
                .await
            }
            Err(e) => Err(e),
        }
    }

    /// A track button was pressed without a draft (stale keyboard or
    /// restart): ask for the route again.
    async fn restart_track_setup(&self, chat_id: i64, session: &mut Session, message_id: i64) -> Result<()> {
        session.mode = Mode::TrackSetup(TrackSetup::AwaitingRoute);
        self.sender.edit_keyboard(chat_id, message_id, None).await?;
        self.reply(
            chat_id,
            OutgoingMessage::text(self.tr("track_start_prompt", session.lang)).markdown(),
        )
        .await
    }

    async fn on_untrack(
        &self,
        chat_id: i64,
        session: &mut Session,
        message_id: i64,
        route_id: i64,
    ) -> Result<()> {
        let outcome = match self.stored_user(chat_id).await? {
            Some(owner) => self.tracking.cancel(owner.id, route_id).await?,
            None => CancelOutcome::NotFound,
        };
        let key = match outcome {
            CancelOutcome::Cancelled => "untrack_cancelled",
            CancelOutcome::NotFound => "untrack_not_found",
        };
        self.sender
            .edit_message(
                chat_id,
                message_id,
                &OutgoingMessage::text(self.tr(key, session.lang)),
            )
            .await
    }

    // ---- shared steps -----------------------------------------------------

    async fn open_calendar(
        &self,
        chat_id: i64,
        session: &mut Session,
        origin: String,
        destination: String,
        purpose: CalendarPurpose,
    ) -> Result<()> {
        let lang = session.lang;
        let selector = DateSelector::new(self.config.calendar_horizon_months);
        let keyboard = selector.render(today(), &self.translator, lang);
        session.mode = Mode::Calendar(CalendarFlow {
            origin,
            destination,
            purpose,
            selector,
        });
        self.reply(
            chat_id,
            OutgoingMessage::text(self.tr("choose_dates", lang)).with_keyboard(keyboard),
        )
        .await
    }

    /// Look up every date, reply once with all results, then record history.
    async fn search_dates(
        &self,
        chat_id: i64,
        session: &Session,
        origin: &str,
        destination: &str,
        dates: Vec<NaiveDate>,
    ) -> Result<()> {
        let lang = session.lang;
        if dates.is_empty() {
            return self.reply_text(chat_id, "calendar_no_dates", lang).await;
        }

        let Some(route) = self.lookup.resolve_route(origin, destination).await else {
            return self.reply_text(chat_id, "city_error", lang).await;
        };

        let mut blocks = Vec::new();
        let mut completed = Vec::new();
        for date in dates {
            let query = FareQuery {
                date,
                currency: session.currency.clone(),
                passengers: session.filters.passengers(),
                direct: session.filters.direct,
            };
            if let Some(result) = self.lookup.lookup(&route, &query).await {
                blocks.push(render_offers(
                    &route,
                    &query,
                    &result,
                    &self.translator,
                    &self.catalog,
                    lang,
                ));
                completed.push((query, result));
            }
        }

        if blocks.is_empty() {
            return self.reply_text(chat_id, "not_found", lang).await;
        }

        let mut text = blocks.join("\n");
        if session.filters.passengers() > 1 {
            text.push('\n');
            text.push_str(&self.tr("multi_passenger_warning", lang));
        }
        self.reply(chat_id, OutgoingMessage::text(text).markdown().without_preview())
            .await?;

        match self.stored_user(chat_id).await {
            Ok(Some(owner)) => {
                for (query, result) in &completed {
                    self.history.record(owner.id, &route, query, result).await;
                }
            }
            Ok(None) => debug!("Chat {} has no user row; search not recorded", chat_id),
            Err(e) => warn!("Skipping search history for {}: {}", chat_id, e),
        }
        Ok(())
    }

    async fn send_past_date(&self, chat_id: i64, date: NaiveDate, lang: Lang) -> Result<()> {
        self.reply(
            chat_id,
            OutgoingMessage::text(format!(
                "{}: {}",
                self.tr("past_date", lang),
                track_date(date)
            )),
        )
        .await
    }

    async fn send_help(&self, chat_id: i64, lang: Lang) -> Result<()> {
        self.reply(
            chat_id,
            OutgoingMessage::text(self.tr("help_text", lang)).markdown(),
        )
        .await
    }

    async fn send_currency_prompt(&self, chat_id: i64, lang: Lang) -> Result<()> {
        self.reply(
            chat_id,
            OutgoingMessage::text(self.tr("choose_currency", lang))
                .with_keyboard(currency_keyboard(&self.catalog)),
        )
        .await
    }

    async fn send_filters(
        &self,
        chat_id: i64,
        key: &str,
        filters: FilterSettings,
        lang: Lang,
    ) -> Result<()> {
        self.reply(
            chat_id,
            OutgoingMessage::text(self.tr(key, lang))
                .with_keyboard(filters.keyboard(&self.translator, lang)),
        )
        .await
    }

    async fn send_history(&self, chat_id: i64, lang: Lang) -> Result<()> {
        let Some(owner) = self.stored_user(chat_id).await? else {
            return self.reply_text(chat_id, "history_user_not_found", lang).await;
        };

        let entries = self.history.recent(owner.id, self.config.history_limit).await?;
        if entries.is_empty() {
            return self.reply_text(chat_id, "no_history", lang).await;
        }

        let text = entries
            .iter()
            .map(|(search, results)| {
                render_entry(
                    search,
                    results,
                    self.config.display_utc_offset_hours,
                    &self.translator,
                    &self.catalog,
                    lang,
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");
        self.reply(chat_id, OutgoingMessage::text(text)).await
    }

    async fn send_active_tracks(&self, chat_id: i64, lang: Lang) -> Result<()> {
        let Some(owner) = self.stored_user(chat_id).await? else {
            return self.reply_text(chat_id, "user_not_found", lang).await;
        };

        let routes = self.tracking.active(owner.id).await?;
        if routes.is_empty() {
            return self.reply_text(chat_id, "no_active_tracks", lang).await;
        }

        for route in routes {
            self.reply(
                chat_id,
                OutgoingMessage::text(render_active_route(&route, &self.translator, lang))
                    .markdown()
                    .with_keyboard(untrack_keyboard(route.id, &self.translator, lang)),
            )
            .await?;
        }
        Ok(())
    }

    async fn send_recent_tracks(&self, chat_id: i64, lang: Lang) -> Result<()> {
        let Some(owner) = self.stored_user(chat_id).await? else {
            return self.reply_text(chat_id, "user_not_found", lang).await;
        };

        let routes = self
            .tracking
            .recent(owner.id, self.config.recent_tracks_limit)
            .await?;
        if routes.is_empty() {
            return self.reply_text(chat_id, "no_all_tracks", lang).await;
        }

        let text = routes
            .iter()
            .map(|route| render_recent_route(route, &self.translator, lang))
            .collect::<Vec<_>>()
            .join("\n\n");
        self.reply(chat_id, OutgoingMessage::text(text).markdown())
            .await
    }
}

/// Language picker shown by `/start` and `/lang`.
pub fn language_keyboard() -> Keyboard {
    Keyboard::new(vec![vec![
        Button::callback("Русский 🇷🇺", CallbackAction::Language(Lang::Ru).data()),
        Button::callback("English 🇬🇧", CallbackAction::Language(Lang::En).data()),
    ]])
}

/// Currency picker, two per row.
pub fn currency_keyboard(catalog: &Catalog) -> Keyboard {
    Keyboard::new(
        catalog
            .currencies()
            .chunks(2)
            .map(|pair| {
                pair.iter()
                    .map(|currency| {
                        Button::callback(
                            format!(
                                "{} {} — {} ({})",
                                currency.flag, currency.code, currency.name, currency.symbol
                            ),
                            CallbackAction::Currency(currency.code.clone()).data(),
                        )
                    })
                    .collect()
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_route_input() {
        let today = date(2030, 5, 10);

        assert_eq!(
            parse_route_input("Москва  Сочи", today),
            RouteInput::Open {
                origin: "москва".to_string(),
                destination: "сочи".to_string(),
            }
        );
        assert_eq!(
            parse_route_input("москва сочи 20-05-2030", today),
            RouteInput::Dated {
                origin: "москва".to_string(),
                destination: "сочи".to_string(),
                date: date(2030, 5, 20),
            }
        );
        assert_eq!(
            parse_route_input("москва сочи 10-05-2030", today),
            RouteInput::Dated {
                origin: "москва".to_string(),
                destination: "сочи".to_string(),
                date: today,
            }
        );
        assert!(matches!(
            parse_route_input("москва сочи 01-05-2030", today),
            RouteInput::Past { .. }
        ));
        assert_eq!(parse_route_input("москва сочи завтра", today), RouteInput::BadDate);
        assert_eq!(parse_route_input("москва", today), RouteInput::Invalid);
        assert_eq!(parse_route_input("a b c d", today), RouteInput::Invalid);
    }

    #[test]
    fn test_currency_keyboard_pairs() {
        let keyboard = currency_keyboard(&Catalog::builtin());
        assert_eq!(keyboard.rows.len(), 3);
        assert!(keyboard.rows.iter().all(|row| row.len() == 2));
        assert_eq!(keyboard.rows[0][0].text, "🇷🇺 RUB — Russian Ruble (₽)");
        assert_eq!(keyboard.rows[0][0].callback_data(), Some("currency:RUB"));
    }

    #[test]
    fn test_language_keyboard() {
        let keyboard = language_keyboard();
        assert_eq!(keyboard.rows[0][0].callback_data(), Some("lang:ru"));
        assert_eq!(keyboard.rows[0][1].callback_data(), Some("lang:en"));
    }
}
