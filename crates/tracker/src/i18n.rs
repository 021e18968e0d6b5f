//! Layered translation lookup.
//!
//! Resolution order for `(key, lang)`:
//!
//! 1. overrides loaded from the `translations` table,
//! 2. the built-in table compiled into the binary,
//! 3. the key itself.
//!
//! Lookups are synchronous. Overrides live in memory and are refreshed with
//! [`Translator::reload`]; a [`Translator::new`] instance never touches the
//! database, which is what tests use.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use database::{catalog, Database, Translation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;

/// Supported interface languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    Ru,
    En,
}

impl Lang {
    pub const ALL: [Lang; 2] = [Lang::Ru, Lang::En];

    /// Two-letter code stored in the database.
    pub fn code(self) -> &'static str {
        match self {
            Lang::Ru => "ru",
            Lang::En => "en",
        }
    }

    /// Parse a stored language code.
    pub fn from_code(code: &str) -> Option<Lang> {
        match code.trim().to_ascii_lowercase().as_str() {
            "ru" => Some(Lang::Ru),
            "en" => Some(Lang::En),
            _ => None,
        }
    }

    /// Currency a new user gets when they pick this language.
    pub fn default_currency(self) -> &'static str {
        match self {
            Lang::Ru => "RUB",
            Lang::En => "USD",
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Translation resolver with in-memory overrides.
#[derive(Debug, Default)]
pub struct Translator {
    overrides: RwLock<HashMap<(String, Lang), String>>,
}

impl Translator {
    /// A translator that only knows the built-in table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a translator and load overrides from storage.
    pub async fn load(db: &Database) -> Result<Self> {
        let translator = Self::new();
        translator.reload(db).await?;
        Ok(translator)
    }

    /// Replace the in-memory overrides with the current table contents.
    ///
    /// Rows with an unknown language code are ignored.
    pub async fn reload(&self, db: &Database) -> Result<usize> {
        let rows = catalog::list_translations(db.pool()).await?;
        let mut fresh = HashMap::with_capacity(rows.len());
        for row in rows {
            match Lang::from_code(&row.lang) {
                Some(lang) => {
                    fresh.insert((row.key, lang), row.value);
                }
                None => debug!("Ignoring translation {} for unknown language {}", row.key, row.lang),
            }
        }

        let count = fresh.len();
        match self.overrides.write() {
            Ok(mut guard) => *guard = fresh,
            Err(poisoned) => {
                warn!("Translation overrides lock was poisoned; replacing contents");
                *poisoned.into_inner() = fresh;
            }
        }
        debug!("Loaded {} translation overrides", count);
        Ok(count)
    }

    /// Set a single override in memory.
    pub fn set_override(&self, key: impl Into<String>, lang: Lang, value: impl Into<String>) {
        let mut guard = match self.overrides.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.insert((key.into(), lang), value.into());
    }

    /// Translate a key without parameters.
    pub fn t(&self, key: &str, lang: Lang) -> String {
        let guard = match self.overrides.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(value) = guard.get(&(key.to_string(), lang)) {
            return value.clone();
        }
        builtin(key, lang).unwrap_or(key).to_string()
    }

    /// Translate a key and substitute `{name}` placeholders.
    pub fn tf(&self, key: &str, lang: Lang, params: &[(&str, &dyn fmt::Display)]) -> String {
        let mut text = self.t(key, lang);
        for (name, value) in params {
            text = text.replace(&format!("{{{}}}", name), &value.to_string());
        }
        text
    }

    /// Short weekday name, Monday first (`0` = Monday).
    pub fn weekday(&self, index: u32, lang: Lang) -> String {
        self.t(&format!("weekday_{}", index), lang)
    }

    /// Month name, `1` = January.
    pub fn month(&self, month: u32, lang: Lang) -> String {
        self.t(&format!("month_{}", month), lang)
    }

    /// Every built-in string as storage rows, for seeding.
    pub fn seed_rows() -> Vec<Translation> {
        BUILTIN
            .iter()
            .flat_map(|(key, ru, en)| {
                [(Lang::Ru, *ru), (Lang::En, *en)].map(|(lang, value)| Translation {
                    key: key.to_string(),
                    lang: lang.code().to_string(),
                    value: value.to_string(),
                })
            })
            .collect()
    }
}

/// Look up a key in the built-in table.
pub fn builtin(key: &str, lang: Lang) -> Option<&'static str> {
    BUILTIN
        .iter()
        .find(|(k, _, _)| *k == key)
        .map(|(_, ru, en)| match lang {
            Lang::Ru => *ru,
            Lang::En => *en,
        })
}

/// Noun form for a passenger count.
pub fn plural_passenger(count: u32, lang: Lang) -> &'static str {
    match lang {
        Lang::Ru => {
            let (last, last_two) = (count % 10, count % 100);
            if last == 1 && last_two != 11 {
                "пассажир"
            } else if (2..=4).contains(&last) && !(12..=14).contains(&last_two) {
                "пассажира"
            } else {
                "пассажиров"
            }
        }
        Lang::En => {
            if count == 1 {
                "passenger"
            } else {
                "passengers"
            }
        }
    }
}

/// `(key, ru, en)`.
const BUILTIN: &[(&str, &str, &str)] = &[
    ("choose_language", "Выберите язык / Choose your language:", "Выберите язык / Choose your language:"),
    ("choose_currency", "Выберите валюту:", "Choose a currency:"),
    (
        "welcome",
        "👋 Введите маршрут, например:\n`москва сочи`\nили с датой: `москва сочи 17-05-2027`",
        "👋 Enter a route like:\n`moscow sochi`\nor with date: `moscow sochi 17-05-2027`",
    ),
    (
        "invalid_format",
        "Введите маршрут в формате: город1 город2 [дата, например 12-05-2027]",
        "Enter route in format: city1 city2 [date, e.g. 12-05-2027]",
    ),
    ("city_error", "😕 Не удалось распознать один из городов.", "😕 One of the cities was not recognized."),
    ("date_error", "❌ Неверный формат даты. Используйте дд-мм-гггг.", "❌ Invalid date format. Use dd-mm-yyyy."),
    ("past_date", "❗ Дата в прошлом. Укажите будущую дату", "❗ The date is in the past. Choose a future one"),
    ("not_found", "😕 Не удалось найти билеты по этому маршруту.", "😕 No tickets found on this route."),
    ("language_set", "Язык установлен: Русский 🇷🇺", "Language set: English 🇬🇧"),
    ("currency_set", "Валюта установлена: {currency}", "Currency set to: {currency}"),
    ("calendar_title", "📅 {month} {year}", "📅 {month} {year}"),
    ("calendar_done", "✔️ Готово", "✔️ Done"),
    ("calendar_clear", "❌ Очистить", "❌ Clear"),
    ("calendar_no_dates", "❗ Вы не выбрали ни одной даты.", "❗ You haven't selected any dates."),
    ("calendar_no_route", "Ошибка: нет активного маршрута.", "Error: no active route selected."),
    ("choose_dates", "Выберите даты:", "Select dates:"),
    ("searching_selected_dates", "🔍 Поиск по выбранным датам...", "🔍 Searching selected dates..."),
    ("filters_title", "Выберите фильтры:", "Choose filters:"),
    ("filter_set", "Фильтр установлен: {passengers} {word}", "Filter set: {passengers} {word}"),
    ("filter_done", "✔️ Готово", "✔️ Done"),
    ("filter_reset", "❌ Сбросить", "❌ Reset"),
    ("filters_cleared", "Фильтры сброшены ✅", "Filters have been reset ✅"),
    ("direct_flights_only", "Только прямые рейсы", "Direct flights only"),
    ("include_transfers", "Разрешить пересадки", "Include transfers"),
    ("transfers_selected", "Пересадки", "Transfers"),
    ("direct", "Прямой рейс", "Direct flight"),
    ("with_transfers", "С пересадками", "With transfers"),
    ("route_header", "Билеты по маршруту:", "Tickets for route:"),
    ("buy_button", "Купить билет", "Buy ticket"),
    (
        "no_direct_but_with_transfers",
        "✈️ Билеты без пересадок не найдены, но есть с пересадками:",
        "✈️ No direct flights found, but some options with transfers are available:",
    ),
    (
        "multi_passenger_warning",
        "⚠️ Итоговая цена за нескольких пассажиров может незначительно отличаться при бронировании — зависит от доступных мест.",
        "⚠️ The total price for multiple passengers is approximate and may slightly vary depending on seat availability.",
    ),
    ("unknown_currency", "❌ Неизвестная валюта.", "❌ Unknown currency."),
    ("moscow_time", "МСК", "MSK"),
    ("no_history", "История поиска пуста.", "Search history is empty."),
    ("history_user_not_found", "❌ Пользователь не найден.", "❌ User not found."),
    ("user_not_found", "Ошибка: пользователь не найден.", "❌ User not found."),
    (
        "track_start_prompt",
        "👋 Введите маршрут отслеживания, например:\n`москва сочи`\nили с датой: `москва сочи 17-05-2027`",
        "👋 Enter a tracking route, e.g.:\n`moscow sochi`\nor with date: `moscow sochi 17-05-2027`",
    ),
    (
        "tracking_parameters_prompt",
        "✅ Принято! Сейчас уточним параметры уведомлений...",
        "✅ Got it! Now let's configure notification settings...",
    ),
    (
        "track_prompt_dates",
        "✅ Даты выбраны! Сейчас уточним параметры уведомлений...",
        "✅ Dates selected! Now let's configure notification settings...",
    ),
    ("track_enter_price", "Введите максимальную цену (например: 7000):", "Enter max price (e.g. 7000):"),
    ("track_enter_percent", "Введите процент снижения цены (например: 15):", "Enter price drop percent (e.g. 15):"),
    ("track_price_set", "💰 Максимальная цена установлена: {value} {currency}", "💰 Max price set: {value} {currency}"),
    ("track_percent_set", "📉 Уведомление при снижении на {value}%", "📉 Will notify if price drops by {value}%"),
    ("track_price_label", "Цена:", "Price:"),
    ("track_percent_label", "Снижение:", "Drop:"),
    ("track_set_price", "💰 Указать цену", "💰 Set price"),
    ("track_set_price_val", "💰 Указать цену ({value})", "💰 Set price ({value})"),
    ("track_set_percent", "📉 Указать %", "📉 Set % drop"),
    ("track_set_percent_val", "📉 Указать % ({value}%)", "📉 Set % drop ({value}%)"),
    ("track_save", "✅ Сохранить", "✅ Save"),
    ("track_cancel", "❌ Отмена", "❌ Cancel"),
    (
        "track_confirm_missing",
        "❗ Укажите хотя бы цену или процент снижения.",
        "❗ Please set at least a price or a percentage drop.",
    ),
    ("track_saved", "✅ Отслеживание сохранено для {n} даты(дат).", "✅ Tracking saved for {n} date(s)."),
    ("track_cancelled", "❌ Отслеживание отменено.", "❌ Tracking cancelled."),
    ("positive_number_only", "Введите положительное число.", "Please enter a positive number."),
    ("percent_out_of_range", "Процент снижения должен быть от 1 до 100.", "The drop percent must be between 1 and 100."),
    ("no_active_tracks", "У вас нет активных отслеживаний.", "You have no active tracking routes."),
    ("no_all_tracks", "У вас пока не было маршрутов отслеживания.", "You haven't tracked any routes yet."),
    ("untrack_button", "❌ Отменить", "❌ Cancel"),
    ("untrack_cancelled", "❌ Отслеживание отменено.", "❌ Tracking cancelled."),
    ("untrack_not_found", "⚠️ Уже отменено или не найдено.", "⚠️ Already cancelled or not found."),
    ("status_active", "✅ Активно", "✅ Active"),
    ("status_cancelled", "❌ Отменено", "❌ Cancelled"),
    ("stop_tracking", "Удалить отслеживание", "Stop tracking"),
    ("notification_price_condition", "цена ≤ {price}", "price ≤ {price}"),
    ("notification_percent_condition", "снижение на {percent}%", "{percent}% drop"),
    ("notification_condition_joiner", " и ", ", "),
    (
        "notification_text",
        "🔔 Билет *{origin} → {destination}* на {date}\n💰 Цена: {price} {currency}{condition}",
        "🔔 Ticket *{origin} → {destination}* on {date}\n💰 Price: {price} {currency}{condition}",
    ),
    ("feedback_prompt", "✍️ Пожалуйста, напишите свой отзыв одним сообщением:", "✍️ Please type your feedback in one message:"),
    ("feedback_thanks", "✅ Спасибо за ваш отзыв!", "✅ Thank you for your feedback!"),
    (
        "internal_error",
        "⚠️ Что-то пошло не так. Попробуйте ещё раз позже.",
        "⚠️ Something went wrong. Please try again later.",
    ),
    (
        "help_text",
        "ℹ️ *Команды бота:*\n\
/start — начать заново и выбрать язык\n\
/lang — сменить язык\n\
/currency — выбрать валюту\n\
/filters — настроить фильтры\n\
/reset\\_filters — сбросить фильтры к значениям по умолчанию\n\
/history — история поиска\n\
/track — отслеживать маршрут\n\
/mytracks — мои активные маршруты\n\
/alltracks — все отслеживания\n\
/feedback — оставить отзыв\n\
/help — показать это сообщение\n\n\
*Введите маршрут в формате:*\n\
`город1 город2 \\[дата\\]`\n\
Например:\n\
`москва сочи` — появится календарь для выбора дат\n\
`москва сочи 12-06-2027` — будет найдено на указанную дату.",
        "ℹ️ *Bot commands:*\n\
/start — restart and select language\n\
/lang — change language\n\
/currency — choose currency\n\
/filters — configure filters\n\
/reset\\_filters — reset filters to default values\n\
/history — search history\n\
/track — track a route\n\
/mytracks — my tracked routes\n\
/alltracks — all tracked routes\n\
/feedback — leave feedback\n\
/help — show this message\n\n\
*Enter the route in the format:*\n\
`city1 city2 \\[date\\]`\n\
For example:\n\
`moscow sochi` — calendar will appear for selecting dates\n\
`moscow sochi 12-06-2027` — search will run for that date.",
    ),
    ("weekday_0", "Пн", "Mon"),
    ("weekday_1", "Вт", "Tue"),
    ("weekday_2", "Ср", "Wed"),
    ("weekday_3", "Чт", "Thu"),
    ("weekday_4", "Пт", "Fri"),
    ("weekday_5", "Сб", "Sat"),
    ("weekday_6", "Вс", "Sun"),
    ("month_1", "Январь", "January"),
    ("month_2", "Февраль", "February"),
    ("month_3", "Март", "March"),
    ("month_4", "Апрель", "April"),
    ("month_5", "Май", "May"),
    ("month_6", "Июнь", "June"),
    ("month_7", "Июль", "July"),
    ("month_8", "Август", "August"),
    ("month_9", "Сентябрь", "September"),
    ("month_10", "Октябрь", "October"),
    ("month_11", "Ноябрь", "November"),
    ("month_12", "Декабрь", "December"),
];
