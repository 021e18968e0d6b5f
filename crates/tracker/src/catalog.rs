//! Reference data: selectable currencies and airline display names.

use std::collections::HashMap;

use database::{catalog as store, Airline, Currency, Database};
use tracing::info;

use crate::error::Result;
use crate::i18n::{Lang, Translator};

/// In-memory snapshot of the currency and airline tables.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    currencies: Vec<Currency>,
    airlines: HashMap<String, Airline>,
}

impl Catalog {
    /// Build a catalog from explicit rows.
    pub fn new(currencies: Vec<Currency>, airlines: Vec<Airline>) -> Self {
        Self {
            currencies,
            airlines: airlines
                .into_iter()
                .map(|airline| (airline.code.clone(), airline))
                .collect(),
        }
    }

    /// The catalog compiled into the binary, without touching storage.
    pub fn builtin() -> Self {
        Self::new(default_currencies(), default_airlines())
    }

    /// Load the catalog from storage.
    pub async fn load(db: &Database) -> Result<Self> {
        let currencies = store::list_currencies(db.pool()).await?;
        let airlines = store::list_airlines(db.pool()).await?;
        Ok(Self::new(currencies, airlines))
    }

    /// Currencies in display order.
    pub fn currencies(&self) -> &[Currency] {
        &self.currencies
    }

    /// Look up a currency by code, ignoring case.
    pub fn currency(&self, code: &str) -> Option<&Currency> {
        self.currencies
            .iter()
            .find(|currency| currency.code.eq_ignore_ascii_case(code))
    }

    /// Flag emoji for a currency, empty when unknown.
    pub fn flag(&self, code: &str) -> &str {
        self.currency(code).map(|c| c.flag.as_str()).unwrap_or("")
    }

    /// Airline name as shown to the user.
    ///
    /// Russian speakers get the Russian name of a known airline; everyone
    /// else sees the IATA code.
    pub fn airline_name(&self, code: &str, lang: Lang) -> String {
        match (lang, self.airlines.get(code)) {
            (Lang::Ru, Some(airline)) => airline.name_ru.clone(),
            _ => code.to_string(),
        }
    }
}

/// Insert currencies, airlines and translations that are not stored yet.
///
/// Existing rows are left untouched, so edited values survive restarts.
pub async fn seed_reference_data(db: &Database) -> Result<()> {
    let currencies = store::seed_currencies(db.pool(), &default_currencies()).await?;
    let airlines = store::seed_airlines(db.pool(), &default_airlines()).await?;
    let translations = store::seed_translations(db.pool(), &Translator::seed_rows()).await?;

    info!(
        "Seeded reference data: {} currencies, {} airlines, {} translations",
        currencies, airlines, translations
    );
    Ok(())
}

/// Currencies offered on the currency keyboard.
pub fn default_currencies() -> Vec<Currency> {
    [
        ("RUB", "Russian Ruble", "₽", "🇷🇺"),
        ("USD", "US Dollar", "$", "🇺🇸"),
        ("EUR", "Euro", "€", "🇪🇺"),
        ("GBP", "British Pound", "£", "🇬🇧"),
        ("KZT", "Kazakh Tenge", "₸", "🇰🇿"),
        ("CNY", "Chinese Yuan", "¥", "🇨🇳"),
    ]
    .into_iter()
    .map(|(code, name, symbol, flag)| Currency {
        code: code.to_string(),
        name: name.to_string(),
        symbol: symbol.to_string(),
        flag: flag.to_string(),
    })
    .collect()
}

/// Airlines with localized names.
pub fn default_airlines() -> Vec<Airline> {
    [
        ("DP", "Победа", "Pobeda"),
        ("SU", "Аэрофлот", "Aeroflot"),
        ("S7", "S7 Airlines", "S7 Airlines"),
        ("UT", "ЮТэйр", "UTair"),
        ("U6", "Уральские авиалинии", "Ural Airlines"),
    ]
    .into_iter()
    .map(|(code, name_ru, name_en)| Airline {
        code: code.to_string(),
        name_ru: name_ru.to_string(),
        name_en: name_en.to_string(),
    })
    .collect()
}
