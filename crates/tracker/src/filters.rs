//! Search filters: passenger count and the direct-only toggle.

use serde::{Deserialize, Serialize};

use crate::callback::CallbackAction;
use crate::i18n::{plural_passenger, Lang, Translator};
use crate::keyboard::{Button, Keyboard};

pub const MIN_PASSENGERS: u32 = 1;
pub const MAX_PASSENGERS: u32 = 9;

/// Filters applied to every fare lookup in a chat session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSettings {
    /// Always within `MIN_PASSENGERS..=MAX_PASSENGERS`.
    passengers: u32,
    pub direct: bool,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            passengers: MIN_PASSENGERS,
            direct: false,
        }
    }
}

impl FilterSettings {
    /// Build settings, clamping the passenger count into range.
    pub fn new(passengers: u32, direct: bool) -> Self {
        Self {
            passengers: passengers.clamp(MIN_PASSENGERS, MAX_PASSENGERS),
            direct,
        }
    }

    pub fn passengers(&self) -> u32 {
        self.passengers
    }

    /// Add a passenger; stays at the maximum.
    pub fn increment(&mut self) {
        self.passengers = (self.passengers + 1).min(MAX_PASSENGERS);
    }

    /// Remove a passenger; stays at the minimum.
    pub fn decrement(&mut self) {
        self.passengers = self.passengers.saturating_sub(1).max(MIN_PASSENGERS);
    }

    pub fn toggle_direct(&mut self) {
        self.direct = !self.direct;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// The filter keyboard for these settings.
    pub fn keyboard(&self, tr: &Translator, lang: Lang) -> Keyboard {
        let counter = format!(
            "👥 {} {}",
            self.passengers,
            plural_passenger(self.passengers, lang)
        );
        let direct_label = if self.direct {
            format!("✈️ {}", tr.t("direct_flights_only", lang))
        } else {
            format!("✈️ ✅ {}", tr.t("include_transfers", lang))
        };

        Keyboard::new(vec![
            vec![
                Button::callback("➖", CallbackAction::PassengerMinus.data()),
                Button::callback(counter, CallbackAction::Noop.data()),
                Button::callback("➕", CallbackAction::PassengerPlus.data()),
            ],
            vec![Button::callback(direct_label, CallbackAction::ToggleDirect.data())],
            vec![
                Button::callback(tr.t("filter_done", lang), CallbackAction::FiltersDone.data()),
                Button::callback(tr.t("filter_reset", lang), CallbackAction::FiltersReset.data()),
            ],
        ])
    }

    /// Confirmation shown when the filters are committed.
    pub fn summary(&self, tr: &Translator, lang: Lang) -> String {
        let word = plural_passenger(self.passengers, lang);
        let direct_text = if self.direct {
            tr.t("direct_flights_only", lang)
        } else {
            tr.t("include_transfers", lang)
        };
        format!(
            "{}\n{}: {}",
            tr.tf(
                "filter_set",
                lang,
                &[("passengers", &self.passengers), ("word", &word)]
            ),
            tr.t("transfers_selected", lang),
            direct_text
        )
    }
}
