//! Transport-neutral inline keyboards.

use serde::{Deserialize, Serialize};

/// What pressing a button does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ButtonAction {
    /// Sends the data back to the bot.
    Callback(String),
    /// Opens a URL.
    Url(String),
}

/// One inline button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub text: String,
    pub action: ButtonAction,
}

impl Button {
    /// A button that sends callback data.
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action: ButtonAction::Callback(data.into()),
        }
    }

    /// A button that opens a link.
    pub fn url(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action: ButtonAction::Url(url.into()),
        }
    }

    /// Callback data, if this is a callback button.
    pub fn callback_data(&self) -> Option<&str> {
        match &self.action {
            ButtonAction::Callback(data) => Some(data),
            ButtonAction::Url(_) => None,
        }
    }
}

/// Rows of inline buttons attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn new(rows: Vec<Vec<Button>>) -> Self {
        Self { rows }
    }

    /// A keyboard with one button per row.
    pub fn column(buttons: Vec<Button>) -> Self {
        Self {
            rows: buttons.into_iter().map(|b| vec![b]).collect(),
        }
    }

    /// Every button, row by row.
    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }

    /// Find the first button carrying the given callback data.
    pub fn find_callback(&self, data: &str) -> Option<&Button> {
        self.buttons().find(|b| b.callback_data() == Some(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_callback() {
        let keyboard = Keyboard::new(vec![
            vec![Button::callback("A", "a"), Button::url("Site", "https://example.com")],
            vec![Button::callback("B", "b")],
        ]);
        assert_eq!(keyboard.buttons().count(), 3);
        assert_eq!(keyboard.find_callback("b").map(|b| b.text.as_str()), Some("B"));
        assert!(keyboard.find_callback("c").is_none());
    }

    #[test]
    fn test_column() {
        let keyboard = Keyboard::column(vec![Button::callback("A", "a"), Button::callback("B", "b")]);
        assert_eq!(keyboard.rows.len(), 2);
    }
}
