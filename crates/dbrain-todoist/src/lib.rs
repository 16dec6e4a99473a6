//! Todoist adapter (REST v2 task creation).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use dbrain_core::{
    errors::Error,
    http,
    ports::{CreatedTask, NewTask, TaskSink},
    Result,
};

pub const DEFAULT_BASE_URL: &str = "https://api.todoist.com";
const SERVICE: &str = "todoist";

#[derive(Clone, Debug)]
pub struct TodoistClient {
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

#[derive(Serialize)]
struct CreateTaskBody<'a> {
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_string: Option<&'a str>,
}

#[derive(Deserialize)]
struct TaskResponse {
    id: String,
    content: String,
    #[serde(default)]
    url: Option<String>,
}

impl TodoistClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            http: http::client(SERVICE, timeout)?,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl TaskSink for TodoistClient {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn create_task(&self, task: &NewTask) -> Result<CreatedTask> {
        let body = CreateTaskBody {
            content: &task.content,
            due_string: task.due_string.as_deref(),
        };

        let resp = self
            .http
            .post(format!("{}/rest/v2/tasks", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::External(format!("todoist request error: {e}")))?;

        let resp = http::check_status(SERVICE, resp).await?;
        let created: TaskResponse = resp
            .json()
            .await
            .map_err(|e| Error::External(format!("todoist json error: {e}")))?;
        info!("todoist task {} created", created.id);

        Ok(CreatedTask {
            id: created.id,
            content: created.content,
            url: created.url,
        })
    }
}
