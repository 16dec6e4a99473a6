use std::time::Duration;

/// Core error type for the bot.
///
/// Adapter crates map their specific errors into this type so the handlers
/// can treat failures consistently (fixed rate-limit warning vs error reply).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("external error: {0}")]
    External(String),

    #[error("{0}")]
    NoEntries(String),

    /// Upstream answered HTTP 429 (or an equivalent flood-control signal).
    #[error("{service} rate limit exceeded")]
    RateLimited {
        service: String,
        retry_after: Option<Duration>,
    },

    /// Raised by the retry helper once its attempt budget is spent.
    #[error("{service} rate limit exceeded after {attempts} retries")]
    RateLimitExceeded { service: String, attempts: u32 },
}

impl Error {
    pub fn rate_limited(service: impl Into<String>, retry_after: Option<Duration>) -> Self {
        Error::RateLimited {
            service: service.into(),
            retry_after,
        }
    }

    /// True for both the raw 429 signal and the exhausted-retries error.
    pub fn is_rate_limit(&self) -> bool {
        matches!(
            self,
            Error::RateLimited { .. } | Error::RateLimitExceeded { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_variants_are_flagged() {
        assert!(Error::rate_limited("deepgram", None).is_rate_limit());
        assert!(Error::RateLimitExceeded {
            service: "groq".to_string(),
            attempts: 3
        }
        .is_rate_limit());
        assert!(!Error::External("boom".to_string()).is_rate_limit());
        assert!(!Error::NoEntries("nothing".to_string()).is_rate_limit());
    }

    #[test]
    fn exceeded_message_names_service_and_attempts() {
        let e = Error::RateLimitExceeded {
            service: "deepgram".to_string(),
            attempts: 3,
        };
        assert_eq!(e.to_string(), "deepgram rate limit exceeded after 3 retries");
    }
}
