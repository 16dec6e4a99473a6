//! LLM processing of captured notes ("Claude Processor").

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use tracing::{info, warn};

use crate::{
    domain::UserId,
    errors::Error,
    ports::LlmClient,
    session::{SessionEntry, SessionStore},
    storage::VaultStorage,
    Result,
};

const SESSION_CONTEXT_ENTRIES: usize = 10;
const SESSION_CONTEXT_CHARS: usize = 80;

/// Result of a processor run, rendered as Telegram HTML.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    pub html: String,
    pub processed_entries: usize,
}

pub struct ClaudeProcessor {
    llm: Arc<dyn LlmClient>,
    storage: VaultStorage,
    sessions: SessionStore,
    response_language: String,
}

impl ClaudeProcessor {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        storage: VaultStorage,
        sessions: SessionStore,
        response_language: impl Into<String>,
    ) -> Self {
        Self {
            llm,
            storage,
            sessions,
            response_language: response_language.into(),
        }
    }

    pub fn llm_name(&self) -> &str {
        self.llm.name()
    }

    fn format_rules(&self, heading: &str) -> String {
        format!(
            "FORMAT:\n\
- Use ONLY Telegram HTML tags: <b>, <i>, <code>\n\
- Do NOT use markdown (**, ##, ```)\n\
- Start with: {heading}\n\
- Be brief: Telegram messages are limited to 4096 characters\n\
- Answer in {}",
            self.response_language
        )
    }

    /// Today's capture log for `user_id`, formatted for the system prompt.
    fn session_context(&self, user_id: UserId, today: NaiveDate) -> String {
        let entries = match self.sessions.get_day(user_id, today) {
            Ok(e) => e,
            Err(e) => {
                warn!("cannot read session log for {}: {e}", user_id.0);
                return String::new();
            }
        };
        render_session_context(&entries)
    }

    /// Free-form request about the user's notes.
    pub async fn execute_prompt(
        &self,
        user_prompt: &str,
        user_id: Option<UserId>,
        today: NaiveDate,
    ) -> Result<Report> {
        let context = user_id
            .map(|u| self.session_context(u, today))
            .unwrap_or_default();

        let system_prompt = format!(
            "You are d-brain, a personal assistant.\n\n\
CONTEXT:\n\
- Date: {today}\n\
- Vault: {}\n\n\
{context}\n\
RULES:\n\
- Answer briefly and to the point\n\
- Extract tasks and action items when the message implies them\n\
{}",
            self.storage.root().display(),
            self.format_rules("an emoji and a <b>title</b>")
        );

        let html = self.llm.complete(&system_prompt, user_prompt).await?;
        Ok(Report {
            html,
            processed_entries: 1,
        })
    }

    /// Summarize the daily note for `day`.
    pub async fn process_daily(&self, day: NaiveDate) -> Result<Report> {
        let Some(content) = self.storage.read_daily(day)? else {
            let path = self.storage.daily_file(day);
            warn!("No daily content for {day} ({})", path.display());
            return Err(Error::NoEntries(format!("No entries for {day}")));
        };
        let entries = content.lines().filter(|l| l.starts_with("## ")).count().max(1);

        let system_prompt = format!(
            "You are d-brain, a personal assistant. Process the user's notes for the day.\n\n\
RULES:\n\
1. Analyze all entries of the day\n\
2. Pull out key thoughts and ideas\n\
3. Find tasks (explicit and implicit)\n\
4. Describe the emotional background\n\
5. Suggest next actions\n\n\
{}",
            self.format_rules(&format!("📊 <b>Processing for {day}</b>"))
        );
        let user_prompt = format!("Today is {day}. Process the entries of the day:\n\n{content}");

        let html = self.llm.complete(&system_prompt, &user_prompt).await?;
        info!("Processed {entries} entries for {day}");
        Ok(Report {
            html,
            processed_entries: entries,
        })
    }

    /// Digest of the last seven daily notes; the result is also saved to `summaries/`.
    pub async fn generate_weekly(&self, today: NaiveDate) -> Result<Report> {
        let mut days = Vec::new();
        for offset in 0..7 {
            let day = today - Duration::days(offset);
            if let Some(content) = self.storage.read_daily(day)? {
                days.push(format!("--- {day} ---\n{content}"));
            }
        }
        if days.is_empty() {
            return Err(Error::NoEntries("No entries for the last week".to_string()));
        }

        let system_prompt = format!(
            "You are d-brain, a personal assistant. Write a weekly digest.\n\n\
RULES:\n\
1. Analyze the week's entries\n\
2. Identify the main themes and trends\n\
3. Note wins and achievements\n\
4. Identify challenges and problems\n\
5. Suggest a focus for next week\n\n\
{}",
            self.format_rules("📅 <b>Weekly digest</b>")
        );
        let user_prompt = format!(
            "Today is {today}. Here are the entries for the week:\n\n{}",
            days.join("\n\n")
        );

        let html = self.llm.complete(&system_prompt, &user_prompt).await?;
        if let Err(e) = self.storage.save_weekly_summary(&html, today) {
            warn!("Failed to save weekly summary: {e}");
        }

        Ok(Report {
            html,
            processed_entries: days.len(),
        })
    }
}

fn render_session_context(entries: &[SessionEntry]) -> String {
    let start = entries.len().saturating_sub(SESSION_CONTEXT_ENTRIES);
    let lines: Vec<String> = entries[start..]
        .iter()
        .filter(|e| !e.text.trim().is_empty())
        .map(|e| {
            let text: String = e.text.chars().take(SESSION_CONTEXT_CHARS).collect();
            format!("{} [{}] {text}", e.time_of_day(), e.kind)
        })
        .collect();
    if lines.is_empty() {
        return String::new();
    }
    format!(
        "=== TODAY'S ENTRIES ===\n{}\n=== END OF ENTRIES ===\n",
        lines.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Local, NaiveDateTime, TimeZone};
    use std::sync::Mutex;

    #[derive(Default)]
    struct EchoLlm {
        calls: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl LlmClient for EchoLlm {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push((system_prompt.to_string(), user_prompt.to_string()));
            Ok("<b>ok</b>".to_string())
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, d).unwrap()
    }

    fn at(d: u32, h: u32) -> NaiveDateTime {
        day(d).and_hms_opt(h, 0, 0).unwrap()
    }

    fn setup() -> (tempfile::TempDir, Arc<EchoLlm>, ClaudeProcessor) {
        let dir = tempfile::tempdir().unwrap();
        let llm = Arc::new(EchoLlm::default());
        let processor = ClaudeProcessor::new(
            llm.clone(),
            VaultStorage::new(dir.path()),
            SessionStore::new(dir.path()),
            "English",
        );
        (dir, llm, processor)
    }

    #[tokio::test]
    async fn daily_without_notes_is_no_entries() {
        let (_dir, llm, processor) = setup();
        let err = processor.process_daily(day(3)).await.unwrap_err();
        assert!(matches!(err, Error::NoEntries(_)));
        assert!(llm.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn daily_sends_the_note_to_the_model() {
        let (dir, llm, processor) = setup();
        let vault = VaultStorage::new(dir.path());
        vault.append_to_daily("ship the release", at(3, 9), "[text]").unwrap();
        vault.append_to_daily("gym", at(3, 18), "[voice]").unwrap();

        let report = processor.process_daily(day(3)).await.unwrap();
        assert_eq!(report.html, "<b>ok</b>");
        assert_eq!(report.processed_entries, 2);

        let calls = llm.calls.lock().unwrap();
        assert!(calls[0].0.contains("Processing for 2026-02-03"));
        assert!(calls[0].0.contains("Answer in English"));
        assert!(calls[0].1.contains("ship the release"));
    }

    #[tokio::test]
    async fn weekly_collects_seven_days_and_saves_summary() {
        let (dir, llm, processor) = setup();
        let vault = VaultStorage::new(dir.path());
        vault.append_to_daily("monday", at(2, 9), "[text]").unwrap();
        vault.append_to_daily("sunday", at(8, 9), "[text]").unwrap();
        // Eight days back: outside the window.
        vault.append_to_daily("too old", at(1, 9), "[text]").unwrap();

        let report = processor.generate_weekly(day(8)).await.unwrap();
        assert_eq!(report.processed_entries, 2);

        let calls = llm.calls.lock().unwrap();
        let user_prompt = &calls[0].1;
        assert!(user_prompt.contains("--- 2026-02-08 ---"));
        assert!(user_prompt.contains("--- 2026-02-02 ---"));
        assert!(!user_prompt.contains("too old"));

        assert!(dir.path().join("summaries/2026-W06-summary.md").exists());
    }

    #[tokio::test]
    async fn weekly_without_notes_is_no_entries() {
        let (_dir, _llm, processor) = setup();
        let err = processor.generate_weekly(day(8)).await.unwrap_err();
        assert!(matches!(err, Error::NoEntries(_)));
    }

    #[tokio::test]
    async fn prompt_includes_todays_session_context() {
        let (dir, llm, processor) = setup();
        let sessions = SessionStore::new(dir.path());
        let when = Local.with_ymd_and_hms(2026, 2, 3, 10, 30, 0).unwrap();
        sessions
            .append(UserId(5), &SessionEntry::new("voice", "remember the keys", when))
            .unwrap();

        processor
            .execute_prompt("what did I say?", Some(UserId(5)), day(3))
            .await
            .unwrap();
        processor
            .execute_prompt("anonymous", None, day(3))
            .await
            .unwrap();

        let calls = llm.calls.lock().unwrap();
        assert!(calls[0].0.contains("10:30 [voice] remember the keys"));
        assert_eq!(calls[0].1, "what did I say?");
        assert!(!calls[1].0.contains("TODAY'S ENTRIES"));
    }

    #[test]
    fn session_context_keeps_last_ten_and_truncates() {
        let when = Local::now();
        let entries: Vec<SessionEntry> = (0..12)
            .map(|i| SessionEntry::new("text", &format!("{i}{}", "x".repeat(100)), when))
            .collect();
        let ctx = render_session_context(&entries);
        assert!(!ctx.contains("] 0x"));
        assert!(!ctx.contains("] 1x"));
        assert!(ctx.contains("] 2x"));
        assert!(ctx.contains("] 11x"));
        assert!(ctx.lines().all(|l| l.chars().count() < 100));
        assert_eq!(render_session_context(&[]), "");
    }
}
