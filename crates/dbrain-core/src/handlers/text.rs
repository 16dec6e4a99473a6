use tracing::info;

use crate::messaging::types::TextMessage;

use super::{process, App};

pub(super) async fn handle_text(app: &App, msg: TextMessage) {
    let text = msg.text.trim();
    if text.is_empty() {
        return;
    }
    info!(
        "Text from {} ({}): {} chars",
        msg.username.as_deref().unwrap_or("unknown"),
        msg.user_id.0,
        text.chars().count()
    );

    if let Err(e) = app.capture(
        msg.user_id,
        "text",
        text,
        None,
        msg.message_id,
        msg.sent_at,
    ) {
        let reply = app.failure_text("saving text", &e);
        app.notify(msg.chat_id, &reply).await;
        return;
    }

    process::answer(app, msg.chat_id, msg.user_id, text).await;
}
