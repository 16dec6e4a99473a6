use std::sync::Arc;

use chrono::{DateTime, Local};
use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use tracing::{debug, info, warn};

use dbrain_core::{
    domain::{ChatId, MessageId, UserId},
    handlers::App,
    messaging::types::{parse_command, Command, IncomingUpdate, TextMessage, VoiceMessage},
};

/// Message text → command update when it starts with `/`, plain text otherwise.
pub fn text_update(
    chat_id: ChatId,
    user_id: UserId,
    username: Option<String>,
    message_id: MessageId,
    sent_at: DateTime<Local>,
    text: &str,
) -> IncomingUpdate {
    if text.starts_with('/') {
        let (name, args) = parse_command(text);
        return IncomingUpdate::Command(Command {
            chat_id,
            user_id,
            username,
            name,
            args,
        });
    }
    IncomingUpdate::Text(TextMessage {
        chat_id,
        user_id,
        username,
        message_id,
        sent_at,
        text: text.to_string(),
    })
}

/// Telegram message → core update; `None` for messages the bot ignores.
pub fn to_update(msg: &Message) -> Option<IncomingUpdate> {
    let user = msg.from.as_ref()?;
    let chat_id = ChatId(msg.chat.id.0);
    let user_id = UserId(user.id.0 as i64);
    let username = user.username.clone();
    let message_id = MessageId(msg.id.0);
    let sent_at = msg.date.with_timezone(&Local);

    if let Some(text) = msg.text() {
        return Some(text_update(chat_id, user_id, username, message_id, sent_at, text));
    }

    if let Some(voice) = msg.voice() {
        return Some(IncomingUpdate::Voice(VoiceMessage {
            chat_id,
            user_id,
            username,
            message_id,
            sent_at,
            file_id: voice.file.id.0.clone(),
            duration_seconds: Some(voice.duration.seconds()),
        }));
    }

    None
}

async fn handle_message(msg: Message, app: Arc<App>) -> ResponseResult<()> {
    let Some(update) = to_update(&msg) else {
        debug!("ignoring unsupported message in chat {}", msg.chat.id.0);
        return Ok(());
    };

    app.dispatch(update).await;
    Ok(())
}

pub async fn run_polling(bot: Bot, app: Arc<App>) -> anyhow::Result<()> {
    match bot.get_me().await {
        Ok(me) => info!("d-brain started: @{}", me.username()),
        Err(e) => warn!("get_me failed: {e}"),
    }
    info!("Vault: {}", app.storage.root().display());
    if app.allowed_user_ids.is_empty() {
        warn!("ALLOWED_USER_IDS is empty, the bot answers everyone");
    } else {
        info!("Allowed users: {}", app.allowed_user_ids.len());
    }

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![app])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
