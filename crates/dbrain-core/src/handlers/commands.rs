use chrono::Local;
use tracing::{info, warn};

use crate::{
    domain::ChatId,
    formatting::escape_html,
    keyboard::main_keyboard,
    messaging::types::Command,
    ports::NewTask,
    retry::handle_rate_limit,
};

use super::{process, App};

fn welcome_text() -> String {
    "🧠 <b>d-brain</b>\n\n\
Send a voice note or a text message: it is saved to today's note \
and answered right away.\n\n\
<b>📋 Commands:</b>\n\
/process - Process today's entries\n\
/weekly - Weekly digest\n\
/status - Today's entries and services\n\
/task &lt;text&gt; [| due] - Create a Todoist task\n\
/help - Show this message"
        .to_string()
}

/// `buy milk | tomorrow` → content + due string.
fn parse_task_args(args: &str) -> Option<NewTask> {
    let (content, due) = match args.split_once('|') {
        Some((c, d)) => (c.trim(), Some(d.trim())),
        None => (args.trim(), None),
    };
    if content.is_empty() {
        return None;
    }
    Some(NewTask {
        content: content.to_string(),
        due_string: due.filter(|d| !d.is_empty()).map(str::to_string),
    })
}

pub(super) async fn handle_command(app: &App, cmd: Command) {
    let chat_id = cmd.chat_id;
    info!(
        "/{} from {} ({})",
        cmd.name,
        cmd.username.as_deref().unwrap_or("unknown"),
        cmd.user_id.0
    );

    match cmd.name.as_str() {
        "start" | "help" => {
            if let Err(e) = app
                .messenger
                .send_keyboard(chat_id, &welcome_text(), main_keyboard())
                .await
            {
                super::log_delivery_failure("sending welcome", &e);
            }
        }
        "status" => handle_status(app, chat_id).await,
        "process" => process::handle_process(app, chat_id).await,
        "weekly" => process::handle_weekly(app, chat_id).await,
        "task" => handle_task(app, chat_id, &cmd.args).await,
        other => {
            app.notify(
                chat_id,
                &format!(
                    "Unknown command /{}. Send /help for the list.",
                    escape_html(other)
                ),
            )
            .await;
        }
    }
}

async fn handle_status(app: &App, chat_id: ChatId) {
    let today = Local::now().date_naive();
    let entries = match app.storage.count_entries(today) {
        Ok(n) => n.to_string(),
        Err(e) => {
            warn!("cannot count entries: {e}");
            "?".to_string()
        }
    };

    let mut lines: Vec<String> = vec!["📈 <b>Status</b>\n".to_string()];
    lines.push(format!("📅 Today: {today}"));
    lines.push(format!("📝 Entries: {entries}"));
    lines.push(format!(
        "📁 Vault: <code>{}</code>\n",
        escape_html(&app.storage.root().display().to_string())
    ));

    lines.push(match &app.transcriber {
        Some(t) => format!("🎤 Transcription: ✅ {}", t.name()),
        None => "🎤 Transcription: ❌".to_string(),
    });
    lines.push(match &app.processor {
        Some(p) => format!("🤖 LLM: ✅ {}", p.llm_name()),
        None => "🤖 LLM: ❌".to_string(),
    });
    lines.push(match &app.tasks {
        Some(t) => format!("✅ Tasks: {}", t.name()),
        None => "⚪ Tasks: not configured".to_string(),
    });
    lines.push(if app.git.is_some() {
        "🔄 Git sync: on".to_string()
    } else {
        "⚪ Git sync: off".to_string()
    });

    app.notify(chat_id, &lines.join("\n")).await;
}

async fn handle_task(app: &App, chat_id: ChatId, args: &str) {
    let Some(task) = parse_task_args(args) else {
        app.notify(
            chat_id,
            "Usage: <code>/task buy milk | tomorrow</code>",
        )
        .await;
        return;
    };
    let Some(sink) = app.tasks.as_ref() else {
        app.notify(chat_id, "Todoist is not configured (set TODOIST_API_KEY).")
            .await;
        return;
    };

    let outcome = handle_rate_limit(&app.retry, sink.name(), || sink.create_task(&task)).await;
    let reply = match outcome {
        Ok(created) => {
            info!("Created task {}", created.id);
            let mut text = format!("✅ Task created: {}", escape_html(&created.content));
            if let Some(due) = &task.due_string {
                text.push_str(&format!("\n📅 Due: {}", escape_html(due)));
            }
            if let Some(url) = &created.url {
                text.push_str(&format!("\n<a href=\"{}\">Open in Todoist</a>", escape_html(url)));
            }
            text
        }
        Err(e) => app.failure_text("creating task", &e),
    };
    app.notify(chat_id, &reply).await;
}
