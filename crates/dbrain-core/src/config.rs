use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};

use tracing::{debug, warn};

use crate::{errors::Error, retry::BackoffPolicy, Result};

/// Which LLM backend drives the processor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LlmProvider {
    Anthropic,
    Groq,
}

impl LlmProvider {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "anthropic" | "claude" => Some(LlmProvider::Anthropic),
            "groq" => Some(LlmProvider::Groq),
            _ => None,
        }
    }
}

/// Remote the vault is synced with on startup and after processing.
#[derive(Clone, Debug)]
pub struct GitRemote {
    pub url: String,
    pub branch: String,
    pub token: Option<String>,
    pub user_name: String,
    pub user_email: String,
}

/// Typed configuration, read from the environment (and an optional `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub telegram_bot_token: String,
    /// Empty means every user may talk to the bot.
    pub allowed_user_ids: Vec<i64>,
    pub vault_path: PathBuf,

    // Transcription
    pub deepgram_api_key: Option<String>,
    pub deepgram_model: String,
    pub transcription_language: String,

    // LLM
    pub llm_provider: LlmProvider,
    pub anthropic_api_key: Option<String>,
    pub groq_api_key: Option<String>,
    pub llm_model: Option<String>,
    pub response_language: String,

    // Tasks
    pub todoist_api_key: Option<String>,

    // Vault sync
    pub git_remote: Option<GitRemote>,

    // Rate limiting / HTTP
    pub retry: BackoffPolicy,
    pub http_timeout: Duration,
    pub telegram_message_limit: usize,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup (the process environment in `load`).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);

        let telegram_bot_token = get("TELEGRAM_BOT_TOKEN").ok_or_else(|| {
            Error::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
        })?;
        let allowed_user_ids = parse_csv_i64(get("ALLOWED_USER_IDS"))?;
        let vault_path = get("VAULT_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./vault"));

        let deepgram_api_key = get("DEEPGRAM_API_KEY");
        let deepgram_model = get("DEEPGRAM_MODEL").unwrap_or_else(|| "nova-3".to_string());
        let transcription_language =
            get("TRANSCRIPTION_LANGUAGE").unwrap_or_else(|| "ru".to_string());

        let anthropic_api_key = get("ANTHROPIC_API_KEY");
        let groq_api_key = get("GROQ_API_KEY");
        let llm_provider = match get("LLM_PROVIDER") {
            Some(raw) => LlmProvider::parse(&raw).ok_or_else(|| {
                Error::Config(format!(
                    "LLM_PROVIDER must be 'anthropic' or 'groq', got '{raw}'"
                ))
            })?,
            None if anthropic_api_key.is_some() => LlmProvider::Anthropic,
            None => LlmProvider::Groq,
        };
        let llm_model = get("LLM_MODEL");
        let response_language = get("RESPONSE_LANGUAGE").unwrap_or_else(|| "Russian".to_string());

        let todoist_api_key = get("TODOIST_API_KEY");

        let git_remote = get("VAULT_GIT_URL").map(|url| GitRemote {
            url,
            branch: get("VAULT_GIT_BRANCH").unwrap_or_else(|| "main".to_string()),
            token: get("GITHUB_TOKEN"),
            user_name: get("GIT_USER_NAME").unwrap_or_else(|| "d-brain-bot".to_string()),
            user_email: get("GIT_USER_EMAIL").unwrap_or_else(|| "bot@d-brain.local".to_string()),
        });

        let defaults = BackoffPolicy::default();
        let retry = BackoffPolicy {
            max_retries: parse_num(get("RATE_LIMIT_MAX_RETRIES"), "RATE_LIMIT_MAX_RETRIES")?
                .unwrap_or(defaults.max_retries),
            base_delay: parse_num(get("RATE_LIMIT_BASE_DELAY_MS"), "RATE_LIMIT_BASE_DELAY_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.base_delay),
            max_delay: parse_num(get("RATE_LIMIT_MAX_DELAY_MS"), "RATE_LIMIT_MAX_DELAY_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.max_delay),
        };
        if retry.max_delay < retry.base_delay {
            return Err(Error::Config(
                "RATE_LIMIT_MAX_DELAY_MS must not be smaller than RATE_LIMIT_BASE_DELAY_MS"
                    .to_string(),
            ));
        }

        let http_timeout = Duration::from_secs(
            parse_num(get("HTTP_TIMEOUT_SECS"), "HTTP_TIMEOUT_SECS")?.unwrap_or(120),
        );
        let telegram_message_limit =
            parse_num(get("TELEGRAM_MESSAGE_LIMIT"), "TELEGRAM_MESSAGE_LIMIT")?.unwrap_or(4096);

        Ok(Self {
            telegram_bot_token,
            allowed_user_ids,
            vault_path,
            deepgram_api_key,
            deepgram_model,
            transcription_language,
            llm_provider,
            anthropic_api_key,
            groq_api_key,
            llm_model,
            response_language,
            todoist_api_key,
            git_remote,
            retry,
            http_timeout,
            telegram_message_limit,
        })
    }

    pub fn llm_api_key(&self) -> Option<&str> {
        match self.llm_provider {
            LlmProvider::Anthropic => self.anthropic_api_key.as_deref(),
            LlmProvider::Groq => self.groq_api_key.as_deref(),
        }
    }
}

/// Fill missing environment variables from a `.env` file; set variables win.
fn load_dotenv(path: &Path) {
    match dotenvy::from_path(path) {
        Ok(()) => debug!("loaded {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("ignoring {}: {e}", path.display()),
    }
}

fn parse_num<T: std::str::FromStr>(v: Option<String>, key: &str) -> Result<Option<T>> {
    match v {
        None => Ok(None),
        Some(s) => s
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::Config(format!("{key} must be a number, got '{s}'"))),
    }
}

fn parse_csv_i64(v: Option<String>) -> Result<Vec<i64>> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| Error::Config(format!("invalid user id in ALLOWED_USER_IDS: '{s}'")))
        })
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn requires_bot_token() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("TELEGRAM_BOT_TOKEN"));

        let err = load(&[("TELEGRAM_BOT_TOKEN", "   ")]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn defaults_apply() {
        let cfg = load(&[("TELEGRAM_BOT_TOKEN", "123:abc")]).unwrap();
        assert!(cfg.allowed_user_ids.is_empty());
        assert_eq!(cfg.vault_path, PathBuf::from("./vault"));
        assert_eq!(cfg.deepgram_model, "nova-3");
        assert_eq!(cfg.transcription_language, "ru");
        assert_eq!(cfg.llm_provider, LlmProvider::Groq);
        assert_eq!(cfg.retry.max_retries, 3);
        assert_eq!(cfg.retry.base_delay, Duration::from_secs(1));
        assert!(cfg.git_remote.is_none());
        assert!(cfg.todoist_api_key.is_none());
    }

    #[test]
    fn parses_allow_list_and_retry_settings() {
        let cfg = load(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("ALLOWED_USER_IDS", " 1, 2 ,,3"),
            ("RATE_LIMIT_MAX_RETRIES", "5"),
            ("RATE_LIMIT_BASE_DELAY_MS", "250"),
            ("RATE_LIMIT_MAX_DELAY_MS", "4000"),
        ])
        .unwrap();
        assert_eq!(cfg.allowed_user_ids, vec![1, 2, 3]);
        assert_eq!(cfg.retry.max_retries, 5);
        assert_eq!(cfg.retry.base_delay, Duration::from_millis(250));
        assert_eq!(cfg.retry.max_delay, Duration::from_millis(4000));
    }

    #[test]
    fn rejects_garbage_numbers_and_ids() {
        let err = load(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("RATE_LIMIT_MAX_RETRIES", "many"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("RATE_LIMIT_MAX_RETRIES"));

        let err = load(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("ALLOWED_USER_IDS", "1,bob"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("bob"));
    }

    #[test]
    fn provider_follows_available_key() {
        let cfg = load(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("ANTHROPIC_API_KEY", "sk-ant"),
        ])
        .unwrap();
        assert_eq!(cfg.llm_provider, LlmProvider::Anthropic);
        assert_eq!(cfg.llm_api_key(), Some("sk-ant"));

        let cfg = load(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("ANTHROPIC_API_KEY", "sk-ant"),
            ("LLM_PROVIDER", "groq"),
        ])
        .unwrap();
        assert_eq!(cfg.llm_provider, LlmProvider::Groq);
        assert_eq!(cfg.llm_api_key(), None);

        assert!(load(&[("TELEGRAM_BOT_TOKEN", "1:a"), ("LLM_PROVIDER", "gpt")]).is_err());
    }

    #[test]
    fn git_remote_uses_defaults() {
        let cfg = load(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("VAULT_GIT_URL", "https://github.com/me/vault.git"),
        ])
        .unwrap();
        let remote = cfg.git_remote.unwrap();
        assert_eq!(remote.branch, "main");
        assert_eq!(remote.user_name, "d-brain-bot");
        assert_eq!(remote.user_email, "bot@d-brain.local");
        assert!(remote.token.is_none());
    }

    #[test]
    fn dotenv_fills_missing_keys_without_overriding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "# vault settings\nDBRAIN_DOTENV_NEW=\"from file\"\nDBRAIN_DOTENV_SET=from-file\n",
        )
        .unwrap();
        env::set_var("DBRAIN_DOTENV_SET", "from-env");

        load_dotenv(&path);
        load_dotenv(&dir.path().join("missing.env"));

        assert_eq!(env::var("DBRAIN_DOTENV_NEW").unwrap(), "from file");
        assert_eq!(env::var("DBRAIN_DOTENV_SET").unwrap(), "from-env");
    }
}
