//! Multi-month, multi-date calendar picker.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};

use crate::callback::CallbackAction;
use crate::i18n::{Lang, Translator};
use crate::keyboard::{Button, Keyboard};

/// Result of pressing "done" on the calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DoneOutcome {
    /// Nothing selected; the calendar stays open.
    Empty,
    /// These past dates were removed from the selection; the calendar stays
    /// open with whatever remains.
    PastDatesRemoved(Vec<NaiveDate>),
    /// The selection is final, in ascending order.
    Ready(Vec<NaiveDate>),
}

/// Calendar state for one pending route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateSelector {
    month_offset: u32,
    horizon_months: u32,
    selected: BTreeSet<NaiveDate>,
}

impl DateSelector {
    /// A calendar showing the current month with nothing selected.
    pub fn new(horizon_months: u32) -> Self {
        Self {
            month_offset: 0,
            horizon_months: horizon_months.max(1),
            selected: BTreeSet::new(),
        }
    }

    pub fn month_offset(&self) -> u32 {
        self.month_offset
    }

    /// Selected dates in ascending order.
    pub fn selected(&self) -> Vec<NaiveDate> {
        self.selected.iter().copied().collect()
    }

    pub fn is_selected(&self, date: NaiveDate) -> bool {
        self.selected.contains(&date)
    }

    /// Add the date if absent, remove it if present. Returns whether the
    /// date is selected afterwards.
    pub fn toggle(&mut self, date: NaiveDate) -> bool {
        if self.selected.remove(&date) {
            false
        } else {
            self.selected.insert(date);
            true
        }
    }

    /// Page forward. Returns `false` at the last month of the horizon.
    pub fn next_month(&mut self) -> bool {
        if self.has_next() {
            self.month_offset += 1;
            true
        } else {
            false
        }
    }

    /// Page back. Returns `false` on the current month.
    pub fn prev_month(&mut self) -> bool {
        if self.has_prev() {
            self.month_offset -= 1;
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Finish selecting relative to `today`.
    pub fn done(&mut self, today: NaiveDate) -> DoneOutcome {
        if self.selected.is_empty() {
            return DoneOutcome::Empty;
        }

        let past: Vec<NaiveDate> = self.selected.range(..today).copied().collect();
        if !past.is_empty() {
            for date in &past {
                self.selected.remove(date);
            }
            return DoneOutcome::PastDatesRemoved(past);
        }

        DoneOutcome::Ready(self.selected())
    }

    fn has_prev(&self) -> bool {
        self.month_offset > 0
    }

    fn has_next(&self) -> bool {
        self.month_offset + 1 < self.horizon_months
    }

    /// Year and month currently shown.
    pub fn shown_month(&self, today: NaiveDate) -> (i32, u32) {
        let index = today.year() * 12 + today.month0() as i32 + self.month_offset as i32;
        (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
    }

    /// Render the calendar keyboard.
    ///
    /// Rows: title, weekday header, one row per week, navigation (omitted
    /// when neither arrow applies), done/clear.
    pub fn render(&self, today: NaiveDate, tr: &Translator, lang: Lang) -> Keyboard {
        let (year, month) = self.shown_month(today);
        let noop = CallbackAction::Noop.data();
        let mut rows = Vec::new();

        rows.push(vec![Button::callback(
            tr.tf(
                "calendar_title",
                lang,
                &[("month", &tr.month(month, lang)), ("year", &year)],
            ),
            noop.clone(),
        )]);

        rows.push(
            (0..7)
                .map(|day| Button::callback(tr.weekday(day, lang), noop.clone()))
                .collect(),
        );

        if let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) {
            let blank = || Button::callback(" ", CallbackAction::Noop.data());
            let mut week: Vec<Button> = (0..first.weekday().num_days_from_monday())
                .map(|_| blank())
                .collect();

            for day in 1..=days_in_month(year, month) {
                let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
                    continue;
                };
                let label = if self.is_selected(date) {
                    format!("[{}]", day)
                } else {
                    day.to_string()
                };
                week.push(Button::callback(label, CallbackAction::CalendarDay(date).data()));

                if week.len() == 7 {
                    rows.push(std::mem::take(&mut week));
                }
            }

            if !week.is_empty() {
                while week.len() < 7 {
                    week.push(blank());
                }
                rows.push(week);
            }
        }

        let mut nav = Vec::new();
        if self.has_prev() {
            nav.push(Button::callback("⬅️", CallbackAction::PrevMonth.data()));
        }
        if self.has_next() {
            nav.push(Button::callback("➡️", CallbackAction::NextMonth.data()));
        }
        if !nav.is_empty() {
            rows.push(nav);
        }

        rows.push(vec![
            Button::callback(tr.t("calendar_done", lang), CallbackAction::CalendarDone.data()),
            Button::callback(tr.t("calendar_clear", lang), CallbackAction::CalendarClear.data()),
        ]);

        Keyboard::new(rows)
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    (28..=31)
        .rev()
        .find(|day| NaiveDate::from_ymd_opt(year, month, *day).is_some())
        .unwrap_or(28)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_toggle_is_involution() {
        let mut selector = DateSelector::new(12);
        let day = date(2030, 5, 10);
        assert!(selector.toggle(day));
        assert!(!selector.toggle(day));
        assert!(selector.selected().is_empty());
    }

    #[test]
    fn test_toggle_sequence_matches_symmetric_difference() {
        let mut selector = DateSelector::new(12);
        let presses = [
            date(2030, 5, 1),
            date(2030, 5, 2),
            date(2030, 5, 1),
            date(2030, 5, 3),
            date(2030, 5, 2),
            date(2030, 5, 2),
        ];
        for day in presses {
            selector.toggle(day);
        }
        assert_eq!(selector.selected(), vec![date(2030, 5, 2), date(2030, 5, 3)]);
    }

    #[test]
    fn test_navigation_clamps() {
        let mut selector = DateSelector::new(3);
        assert!(!selector.prev_month());
        assert!(selector.next_month());
        assert!(selector.next_month());
        assert!(!selector.next_month());
        assert_eq!(selector.month_offset(), 2);
        assert!(selector.prev_month());
        assert_eq!(selector.month_offset(), 1);
    }

    #[test]
    fn test_shown_month_wraps_year() {
        let mut selector = DateSelector::new(12);
        let today = date(2030, 11, 20);
        selector.next_month();
        selector.next_month();
        assert_eq!(selector.shown_month(today), (2031, 1));
    }

    #[test]
    fn test_done_empty() {
        let mut selector = DateSelector::new(12);
        assert_eq!(selector.done(date(2030, 5, 1)), DoneOutcome::Empty);
    }

    #[test]
    fn test_done_strips_past_dates_and_does_not_advance() {
        let today = date(2030, 5, 10);
        let mut selector = DateSelector::new(12);
        selector.toggle(date(2030, 5, 1));
        selector.toggle(date(2030, 5, 10));
        selector.toggle(date(2030, 5, 20));

        assert_eq!(
            selector.done(today),
            DoneOutcome::PastDatesRemoved(vec![date(2030, 5, 1)])
        );
        assert_eq!(selector.selected(), vec![date(2030, 5, 10), date(2030, 5, 20)]);

        assert_eq!(
            selector.done(today),
            DoneOutcome::Ready(vec![date(2030, 5, 10), date(2030, 5, 20)])
        );
    }

    #[test]
    fn test_clear() {
        let mut selector = DateSelector::new(12);
        selector.toggle(date(2030, 5, 1));
        selector.clear();
        assert!(selector.selected().is_empty());
    }

    #[test]
    fn test_render_grid() {
        let tr = Translator::new();
        // May 2030 starts on a Wednesday and has 31 days.
        let today = date(2030, 5, 15);
        let mut selector = DateSelector::new(12);
        selector.toggle(date(2030, 5, 17));

        let keyboard = selector.render(today, &tr, Lang::En);
        assert_eq!(keyboard.rows[0][0].text, "📅 May 2030");
        assert_eq!(keyboard.rows[1][0].text, "Mon");

        let first_week = &keyboard.rows[2];
        assert_eq!(first_week.len(), 7);
        assert_eq!(first_week[0].text, " ");
        assert_eq!(first_week[1].text, " ");
        assert_eq!(first_week[2].text, "1");
        assert_eq!(first_week[2].callback_data(), Some("cal:01-05-2030"));

        let selected = keyboard.find_callback("cal:17-05-2030").unwrap();
        assert_eq!(selected.text, "[17]");

        // Five week rows, all padded to seven cells.
        let weeks: Vec<_> = keyboard.rows[2..7].iter().collect();
        assert!(weeks.iter().all(|row| row.len() == 7));
        assert_eq!(keyboard.rows[6][4].text, "31");
        assert_eq!(keyboard.rows[6][5].text, " ");

        // Only the forward arrow on the first month.
        let nav = &keyboard.rows[7];
        assert_eq!(nav.len(), 1);
        assert_eq!(nav[0].callback_data(), Some("next_month"));

        let last = keyboard.rows.last().unwrap();
        assert_eq!(last[0].callback_data(), Some("calendar_done"));
        assert_eq!(last[1].callback_data(), Some("calendar_clear"));
    }

    #[test]
    fn test_render_arrows_at_bounds() {
        let tr = Translator::new();
        let today = date(2030, 5, 15);
        let mut selector = DateSelector::new(2);
        selector.next_month();

        let keyboard = selector.render(today, &tr, Lang::Ru);
        assert_eq!(keyboard.rows[0][0].text, "📅 Июнь 2030");
        assert!(keyboard.find_callback("prev_month").is_some());
        assert!(keyboard.find_callback("next_month").is_none());
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2030, 2), 28);
        assert_eq!(days_in_month(2032, 2), 29);
        assert_eq!(days_in_month(2030, 4), 30);
        assert_eq!(days_in_month(2030, 12), 31);
    }
}
