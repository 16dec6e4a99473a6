use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::types::{ChatAction, MessagingCapabilities, ReplyKeyboard},
    Result,
};

/// Outbound side of the messenger, implemented by the Telegram adapter.
///
/// Implementations map upstream flood control (HTTP 429) to
/// [`Error::RateLimited`](crate::Error::RateLimited).
#[async_trait]
pub trait MessagingPort: Send + Sync {
    fn capabilities(&self) -> MessagingCapabilities;

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef>;
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef>;
    async fn edit_html(&self, msg: MessageRef, html: &str) -> Result<()>;
    /// Plain-text edit, used when Telegram rejects the HTML of an edit.
    async fn edit_text(&self, msg: MessageRef, text: &str) -> Result<()>;

    async fn send_chat_action(&self, chat_id: ChatId, action: ChatAction) -> Result<()>;

    async fn send_keyboard(
        &self,
        chat_id: ChatId,
        html: &str,
        keyboard: ReplyKeyboard,
    ) -> Result<MessageRef>;

    /// Download a file (voice note) by its messenger file id.
    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>>;
}
