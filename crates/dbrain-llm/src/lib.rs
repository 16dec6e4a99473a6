//! LLM adapters behind [`LlmClient`]: Anthropic Messages API and Groq
//! (OpenAI-compatible chat completions).

use std::sync::Arc;

use dbrain_core::{
    config::{Config, LlmProvider},
    ports::LlmClient,
    Result,
};

mod anthropic;
mod groq;

pub use anthropic::AnthropicClient;
pub use groq::GroqClient;

/// Client for the configured provider, or `None` when its key is missing.
pub fn from_config(cfg: &Config) -> Result<Option<Arc<dyn LlmClient>>> {
    let Some(key) = cfg.llm_api_key() else {
        return Ok(None);
    };
    let client: Arc<dyn LlmClient> = match cfg.llm_provider {
        LlmProvider::Anthropic => {
            let mut c = AnthropicClient::new(key, cfg.http_timeout)?;
            if let Some(model) = &cfg.llm_model {
                c = c.with_model(model);
            }
            Arc::new(c)
        }
        LlmProvider::Groq => {
            let mut c = GroqClient::new(key, cfg.http_timeout)?;
            if let Some(model) = &cfg.llm_model {
                c = c.with_model(model);
            }
            Arc::new(c)
        }
    };
    Ok(Some(client))
}
