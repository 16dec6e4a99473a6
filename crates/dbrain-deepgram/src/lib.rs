//! Deepgram adapter (voice transcription).
//!
//! Uses the pre-recorded `v1/listen` endpoint with the raw OGG/Opus bytes
//! Telegram hands out for voice notes.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use dbrain_core::{errors::Error, http, ports::Transcriber, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.deepgram.com";
const SERVICE: &str = "deepgram";

#[derive(Clone, Debug)]
pub struct DeepgramClient {
    api_key: String,
    model: String,
    language: String,
    base_url: String,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ListenResponse {
    results: Option<ListenResults>,
}

#[derive(Debug, Deserialize)]
struct ListenResults {
    #[serde(default)]
    channels: Vec<Channel>,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    #[serde(default)]
    transcript: String,
}

impl DeepgramClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        language: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            api_key: api_key.into(),
            model: model.into(),
            language: language.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            http: http::client(SERVICE, timeout)?,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub async fn transcribe_bytes(&self, audio: &[u8]) -> Result<String> {
        let resp = self
            .http
            .post(format!("{}/v1/listen", self.base_url))
            .query(&[
                ("model", self.model.as_str()),
                ("language", self.language.as_str()),
                ("punctuate", "true"),
                ("smart_format", "true"),
            ])
            .header("Authorization", format!("Token {}", self.api_key))
            .header("Content-Type", "audio/ogg")
            .body(audio.to_vec())
            .send()
            .await
            .map_err(|e| Error::External(format!("deepgram request error: {e}")))?;

        let resp = http::check_status(SERVICE, resp).await?;
        let parsed: ListenResponse = resp
            .json()
            .await
            .map_err(|e| Error::External(format!("deepgram json error: {e}")))?;

        let transcript = parsed
            .results
            .and_then(|r| r.channels.into_iter().next())
            .and_then(|c| c.alternatives.into_iter().next())
            .map(|a| a.transcript)
            .unwrap_or_default();

        debug!("deepgram returned {} chars", transcript.len());
        Ok(transcript)
    }
}

#[async_trait]
impl Transcriber for DeepgramClient {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        self.transcribe_bytes(audio).await
    }
}
