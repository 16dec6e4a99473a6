use std::sync::Arc;

use tracing::{info, warn};

use dbrain_core::{
    config::Config,
    git::VaultGit,
    handlers::App,
    messaging::port::MessagingPort,
    ports::{TaskSink, Transcriber},
    processor::ClaudeProcessor,
    session::SessionStore,
    storage::VaultStorage,
};
use dbrain_deepgram::DeepgramClient;
use dbrain_telegram::TelegramMessenger;
use dbrain_todoist::TodoistClient;

#[tokio::main]
async fn main() -> Result<(), dbrain_core::Error> {
    dbrain_core::logging::init("dbrain")?;

    let cfg = Config::load()?;

    let git = match &cfg.git_remote {
        Some(remote) => {
            let git = VaultGit::new(&cfg.vault_path);
            if !git.ensure_vault(remote).await {
                warn!("Vault sync failed, continuing with the local copy");
            }
            Some(git)
        }
        None => {
            info!("VAULT_GIT_URL not set, git sync disabled");
            None
        }
    };

    let storage = VaultStorage::new(&cfg.vault_path);
    let sessions = SessionStore::new(&cfg.vault_path);

    let transcriber: Option<Arc<dyn Transcriber>> = match &cfg.deepgram_api_key {
        Some(key) => Some(Arc::new(DeepgramClient::new(
            key.as_str(),
            cfg.deepgram_model.as_str(),
            cfg.transcription_language.as_str(),
            cfg.http_timeout,
        )?)),
        None => {
            warn!("DEEPGRAM_API_KEY not set, voice messages are disabled");
            None
        }
    };

    let processor = match dbrain_llm::from_config(&cfg)? {
        Some(llm) => {
            info!("LLM provider: {}", llm.name());
            Some(Arc::new(ClaudeProcessor::new(
                llm,
                storage.clone(),
                sessions.clone(),
                cfg.response_language.as_str(),
            )))
        }
        None => {
            warn!("No API key for {:?}, entries are saved without processing", cfg.llm_provider);
            None
        }
    };

    let tasks: Option<Arc<dyn TaskSink>> = match &cfg.todoist_api_key {
        Some(key) => Some(Arc::new(TodoistClient::new(key.as_str(), cfg.http_timeout)?)),
        None => None,
    };

    let messenger = TelegramMessenger::from_token(&cfg.telegram_bot_token);
    let bot = messenger.bot();
    let messenger: Arc<dyn MessagingPort> = Arc::new(messenger);

    let app = Arc::new(App {
        messenger,
        transcriber,
        processor,
        tasks,
        storage,
        sessions,
        git,
        retry: cfg.retry,
        allowed_user_ids: cfg.allowed_user_ids.clone(),
        message_limit: cfg.telegram_message_limit,
    });

    dbrain_telegram::router::run_polling(bot, app)
        .await
        .map_err(|e| dbrain_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
