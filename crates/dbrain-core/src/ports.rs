//! Ports implemented by the adapter crates.
//!
//! Every implementation reports HTTP 429 as
//! [`Error::RateLimited`](crate::Error::RateLimited) so the retry helper can react to it.

use async_trait::async_trait;

use crate::Result;

/// Speech-to-text backend (Deepgram).
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Short service name used in logs and rate-limit errors.
    fn name(&self) -> &str;

    /// Transcribe an audio blob (Telegram voice notes are OGG/Opus).
    /// An empty string means nothing intelligible was heard.
    async fn transcribe(&self, audio: &[u8]) -> Result<String>;
}

/// Chat-completion backend behind the processor.
#[async_trait]
pub trait LlmClient: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTask {
    pub content: String,
    /// Natural-language due date ("tomorrow", "every monday").
    pub due_string: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreatedTask {
    pub id: String,
    pub content: String,
    pub url: Option<String>,
}

/// To-do service (Todoist).
#[async_trait]
pub trait TaskSink: Send + Sync {
    fn name(&self) -> &str;

    async fn create_task(&self, task: &NewTask) -> Result<CreatedTask>;
}
