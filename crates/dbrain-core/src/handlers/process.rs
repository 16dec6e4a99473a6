use chrono::Local;
use tracing::info;

use crate::domain::{ChatId, UserId};

use super::App;

const NO_LLM_MESSAGE: &str = "LLM is not configured (set ANTHROPIC_API_KEY or GROQ_API_KEY).";

pub(super) async fn handle_process(app: &App, chat_id: ChatId) {
    let Some(processor) = app.processor.as_deref() else {
        app.notify(chat_id, NO_LLM_MESSAGE).await;
        return;
    };
    let today = Local::now().date_naive();

    let report = app
        .run_process(chat_id, "⏳ Processing today's entries...", processor, || {
            processor.process_daily(today)
        })
        .await;

    if let (Some(report), Some(git)) = (report, app.git.as_ref()) {
        info!("Processed {} entries, syncing vault", report.processed_entries);
        git.commit_and_push(&format!("chore: process daily {today}"))
            .await;
    }
}

pub(super) async fn handle_weekly(app: &App, chat_id: ChatId) {
    let Some(processor) = app.processor.as_deref() else {
        app.notify(chat_id, NO_LLM_MESSAGE).await;
        return;
    };
    let today = Local::now().date_naive();

    let report = app
        .run_process(chat_id, "⏳ Generating weekly digest...", processor, || {
            processor.generate_weekly(today)
        })
        .await;

    if let (Some(_), Some(git)) = (report, app.git.as_ref()) {
        git.commit_and_push("chore: weekly digest").await;
    }
}

/// Answer a captured text or transcript. Without an LLM the entry is only saved.
pub(super) async fn answer(app: &App, chat_id: ChatId, user_id: UserId, text: &str) {
    let Some(processor) = app.processor.as_deref() else {
        app.notify(chat_id, "✓ Saved").await;
        return;
    };
    let today = Local::now().date_naive();

    app.run_process(chat_id, "⏳ Processing...", processor, || {
        processor.execute_prompt(text, Some(user_id), today)
    })
    .await;
}
