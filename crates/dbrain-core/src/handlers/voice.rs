use tracing::{debug, error, info};

use crate::{
    formatting::{escape_html, truncate_text},
    messaging::types::{ChatAction, VoiceMessage},
    retry::handle_rate_limit,
};

use super::{process, App, RATE_LIMIT_MESSAGE};

pub(super) async fn handle_voice(app: &App, msg: VoiceMessage) {
    let chat_id = msg.chat_id;
    let Some(transcriber) = app.transcriber.as_ref() else {
        app.notify(
            chat_id,
            "Voice transcription is not configured (set DEEPGRAM_API_KEY).",
        )
        .await;
        return;
    };

    if let Err(e) = app
        .messenger
        .send_chat_action(chat_id, ChatAction::Typing)
        .await
    {
        debug!("chat action failed: {e}");
    }

    let audio = match app.messenger.download_file(&msg.file_id).await {
        Ok(bytes) => bytes,
        Err(e) if e.is_rate_limit() => {
            app.notify(chat_id, RATE_LIMIT_MESSAGE).await;
            return;
        }
        Err(e) => {
            error!("voice download failed: {e}");
            app.notify(chat_id, "❌ Failed to download voice message").await;
            return;
        }
    };
    info!(
        "Voice from {} ({}): {} bytes, {}s",
        msg.username.as_deref().unwrap_or("unknown"),
        msg.user_id.0,
        audio.len(),
        msg.duration_seconds.unwrap_or(0)
    );

    let transcript = match handle_rate_limit(&app.retry, transcriber.name(), || {
        transcriber.transcribe(&audio)
    })
    .await
    {
        Ok(t) => t.trim().to_string(),
        Err(e) => {
            let reply = app.failure_text("transcription", &e);
            app.notify(chat_id, &reply).await;
            return;
        }
    };

    if transcript.is_empty() {
        app.notify(chat_id, "🎤 Could not transcribe audio").await;
        return;
    }

    if let Err(e) = app.capture(
        msg.user_id,
        "voice",
        &transcript,
        msg.duration_seconds,
        msg.message_id,
        msg.sent_at,
    ) {
        let reply = app.failure_text("saving transcript", &e);
        app.notify(chat_id, &reply).await;
        return;
    }

    let preview = truncate_text(&transcript, app.reply_limit().saturating_sub(32));
    app.notify(chat_id, &format!("🎤 {}\n\n✓ Saved", escape_html(&preview)))
        .await;

    process::answer(app, chat_id, msg.user_id, &transcript).await;
}
