//! Slash commands.

/// A recognized slash command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Lang,
    Currency,
    Filters,
    ResetFilters,
    History,
    Track,
    MyTracks,
    AllTracks,
    Feedback,
    Help,
}

impl Command {
    pub const ALL: [Command; 11] = [
        Command::Start,
        Command::Lang,
        Command::Currency,
        Command::Filters,
        Command::ResetFilters,
        Command::History,
        Command::Track,
        Command::MyTracks,
        Command::AllTracks,
        Command::Feedback,
        Command::Help,
    ];

    /// Name without the leading slash.
    pub fn name(self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Lang => "lang",
            Command::Currency => "currency",
            Command::Filters => "filters",
            Command::ResetFilters => "reset_filters",
            Command::History => "history",
            Command::Track => "track",
            Command::MyTracks => "mytracks",
            Command::AllTracks => "alltracks",
            Command::Feedback => "feedback",
            Command::Help => "help",
        }
    }

    /// Bilingual description for the platform's command menu.
    pub fn description(self) -> &'static str {
        match self {
            Command::Start => "🔄 Начать заново / Restart",
            Command::Lang => "🌐 Сменить язык / Change language",
            Command::Currency => "💱 Выбрать валюту / Choose currency",
            Command::Filters => "⚙️ Фильтры / Filters",
            Command::ResetFilters => "♻️ Сбросить фильтры / Reset filters",
            Command::History => "🕓 История поиска / Search history",
            Command::Track => "📈 Отслеживать маршрут / Track a route",
            Command::MyTracks => "📌 Мои отслеживания / My tracks",
            Command::AllTracks => "📋 Все отслеживания / All tracks",
            Command::Feedback => "✍️ Оставить отзыв / Leave feedback",
            Command::Help => "ℹ️ Помощь / Help",
        }
    }

    /// Parse a message starting with `/`.
    ///
    /// Arguments and a `@botname` suffix are ignored. Returns `None` for text
    /// that is not a command or names an unknown one.
    pub fn parse(text: &str) -> Option<Command> {
        let word = text.trim().split_whitespace().next()?.strip_prefix('/')?;
        let name = word.split('@').next().unwrap_or(word);
        Command::ALL
            .into_iter()
            .find(|command| command.name().eq_ignore_ascii_case(name))
    }
}

/// `(name, description)` pairs to register with the chat platform.
pub fn bot_commands() -> Vec<(&'static str, &'static str)> {
    Command::ALL
        .into_iter()
        .map(|command| (command.name(), command.description()))
        .collect()
}
