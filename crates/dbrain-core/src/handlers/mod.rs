//! Update handlers.
//!
//! Each handler is a straight line: read the update, call one or two
//! services through [`handle_rate_limit`], reply. Handlers never return
//! errors to the dispatcher: rate limits become [`RATE_LIMIT_MESSAGE`],
//! anything else is logged and shown to the user as a short error line.

use std::{future::Future, sync::Arc};

use chrono::{DateTime, Local};
use tracing::{error, info, warn};

use crate::{
    domain::{ChatId, MessageId, MessageRef, UserId},
    formatting::{escape_html, format_report, truncate_text},
    git::VaultGit,
    keyboard::command_for_label,
    messaging::{
        port::MessagingPort,
        types::{Command, IncomingUpdate},
    },
    ports::{TaskSink, Transcriber},
    processor::{ClaudeProcessor, Report},
    retry::{handle_rate_limit, BackoffPolicy},
    session::{SessionEntry, SessionStore},
    storage::VaultStorage,
    Error, Result,
};

mod commands;
mod process;
mod text;
mod voice;


/// Fixed reply for an upstream rate limit that outlasted the retries.
pub const RATE_LIMIT_MESSAGE: &str = "⚠️ Too many requests. Please try again a little later.";
pub const ACCESS_DENIED_MESSAGE: &str = "Access denied.";

const ERROR_PREVIEW_CHARS: usize = 200;

/// Everything a handler needs, shared across updates.
pub struct App {
    pub messenger: Arc<dyn MessagingPort>,
    pub transcriber: Option<Arc<dyn Transcriber>>,
    pub processor: Option<Arc<ClaudeProcessor>>,
    pub tasks: Option<Arc<dyn TaskSink>>,
    pub storage: VaultStorage,
    pub sessions: SessionStore,
    /// Present when the vault is synced with a remote.
    pub git: Option<VaultGit>,
    pub retry: BackoffPolicy,
    /// Empty means everyone is allowed.
    pub allowed_user_ids: Vec<i64>,
    pub message_limit: usize,
}

impl App {
    /// Front door: authorize and route one update.
    pub async fn dispatch(&self, update: IncomingUpdate) {
        let chat_id = update.chat_id();
        let user_id = update.user_id();

        if !self.is_allowed(user_id) {
            info!("Rejected update from user {}", user_id.0);
            self.notify(chat_id, ACCESS_DENIED_MESSAGE).await;
            return;
        }

        match update {
            IncomingUpdate::Command(cmd) => commands::handle_command(self, cmd).await,
            IncomingUpdate::Text(msg) => match command_for_label(&msg.text) {
                Some(name) => {
                    let cmd = Command {
                        chat_id: msg.chat_id,
                        user_id: msg.user_id,
                        username: msg.username,
                        name: name.to_string(),
                        args: String::new(),
                    };
                    commands::handle_command(self, cmd).await
                }
                None => text::handle_text(self, msg).await,
            },
            IncomingUpdate::Voice(msg) => voice::handle_voice(self, msg).await,
        }
    }

    pub fn is_allowed(&self, user_id: UserId) -> bool {
        self.allowed_user_ids.is_empty() || self.allowed_user_ids.contains(&user_id.0)
    }

    /// Longest reply the messenger accepts.
    fn reply_limit(&self) -> usize {
        self.message_limit
            .min(self.messenger.capabilities().max_message_len)
    }

    /// Send HTML (plain text on messengers without HTML), logging delivery failures.
    async fn notify(&self, chat_id: ChatId, html: &str) -> Option<MessageRef> {
        let sent = if self.messenger.capabilities().supports_html {
            self.messenger.send_html(chat_id, html).await
        } else {
            self.messenger.send_text(chat_id, html).await
        };
        match sent {
            Ok(m) => Some(m),
            Err(e) => {
                log_delivery_failure("sending reply", &e);
                None
            }
        }
    }

    /// Replace a placeholder; falls back to plain text when the HTML is rejected.
    async fn replace(&self, msg: MessageRef, html: &str) {
        let Err(e) = self.messenger.edit_html(msg, html).await else {
            return;
        };
        if e.is_rate_limit() {
            log_delivery_failure("editing reply", &e);
            return;
        }
        warn!("HTML edit rejected, retrying as plain text: {e}");
        if let Err(e) = self.messenger.edit_text(msg, html).await {
            log_delivery_failure("editing reply", &e);
        }
    }

    /// Append a captured entry to the daily note and the user's session log.
    fn capture(
        &self,
        user_id: UserId,
        kind: &str,
        text: &str,
        duration: Option<u32>,
        message_id: MessageId,
        sent_at: DateTime<Local>,
    ) -> Result<()> {
        self.storage
            .append_to_daily(text, sent_at.naive_local(), &format!("[{kind}]"))?;

        let mut entry = SessionEntry::new(kind, text, sent_at);
        entry.duration = duration;
        entry.msg_id = Some(message_id.0);
        if let Err(e) = self.sessions.append(user_id, &entry) {
            warn!("cannot append session entry for {}: {e}", user_id.0);
        }
        Ok(())
    }

    /// User-facing text for a failed operation.
    fn failure_text(&self, what: &str, e: &Error) -> String {
        if e.is_rate_limit() {
            warn!("{what}: {e}");
            return RATE_LIMIT_MESSAGE.to_string();
        }
        error!("{what} failed: {e}");
        format!(
            "❌ Error: {}",
            escape_html(&truncate_text(&e.to_string(), ERROR_PREVIEW_CHARS))
        )
    }

    /// Placeholder → processor call (with backoff) → exactly one edit of the placeholder.
    async fn run_process<F, Fut>(
        &self,
        chat_id: ChatId,
        placeholder: &str,
        processor: &ClaudeProcessor,
        op: F,
    ) -> Option<Report>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Report>>,
    {
        let status = if self.messenger.capabilities().supports_edit {
            self.notify(chat_id, placeholder).await
        } else {
            None
        };
        let outcome = handle_rate_limit(&self.retry, processor.llm_name(), op).await;

        let html = match &outcome {
            Err(Error::NoEntries(reason)) => {
                info!("Nothing to process: {reason}");
                format!("📭 {}", escape_html(reason))
            }
            Err(e) => self.failure_text("processing", e),
            Ok(_) => format_report(&outcome, self.reply_limit()),
        };

        match status {
            Some(msg) => self.replace(msg, &html).await,
            None => {
                self.notify(chat_id, &html).await;
            }
        }
        outcome.ok()
    }
}

fn log_delivery_failure(what: &str, e: &Error) {
    if e.is_rate_limit() {
        warn!("Rate limit hit when {what}: {e}");
    } else {
        error!("Error {what}: {e}");
    }
}
