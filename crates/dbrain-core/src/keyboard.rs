//! The bot's fixed reply keyboard.

use crate::messaging::types::ReplyKeyboard;

/// (button label, command it triggers)
const BUTTONS: [[(&str, &str); 2]; 2] = [
    [("📊 Process", "process"), ("📅 Weekly", "weekly")],
    [("📈 Status", "status"), ("❓ Help", "help")],
];

/// Main keyboard. Persistent so it does not collapse after a press.
pub fn main_keyboard() -> ReplyKeyboard {
    ReplyKeyboard {
        rows: BUTTONS
            .iter()
            .map(|row| row.iter().map(|(label, _)| label.to_string()).collect())
            .collect(),
        persistent: true,
        resize: true,
        one_time: false,
        placeholder: Some("Send a voice note or text".to_string()),
    }
}

/// Command name for a keyboard button label, if `text` is one.
pub fn command_for_label(text: &str) -> Option<&'static str> {
    let text = text.trim();
    BUTTONS
        .iter()
        .flatten()
        .find(|(label, _)| *label == text)
        .map(|(_, cmd)| *cmd)
}
