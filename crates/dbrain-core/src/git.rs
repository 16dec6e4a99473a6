//! Git automation for the vault.
//!
//! Sync failures are logged and reported as `false`; they never stop the bot.

use std::{
    path::{Path, PathBuf},
    process::{Output, Stdio},
};

use tokio::process::Command;
use tracing::{error, info, warn};

use crate::{config::GitRemote, Result};

#[derive(Clone, Debug)]
pub struct VaultGit {
    vault_path: PathBuf,
}

impl VaultGit {
    pub fn new(vault_path: impl Into<PathBuf>) -> Self {
        Self {
            vault_path: vault_path.into(),
        }
    }

    async fn run_in(dir: &Path, args: &[&str]) -> Result<Output> {
        let out = Command::new("git")
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .output()
            .await?;
        Ok(out)
    }

    async fn run(&self, args: &[&str]) -> Result<Output> {
        Self::run_in(&self.vault_path, args).await
    }

    pub async fn status(&self) -> Result<String> {
        let out = self.run(&["status", "--porcelain"]).await?;
        Ok(String::from_utf8_lossy(&out.stdout).to_string())
    }

    pub async fn has_changes(&self) -> bool {
        match self.status().await {
            Ok(s) => !s.trim().is_empty(),
            Err(e) => {
                warn!("git status failed: {e}");
                false
            }
        }
    }

    /// Stage everything and commit. `true` when a commit was made.
    pub async fn commit_changes(&self, message: &str) -> bool {
        if !self.has_changes().await {
            info!("No changes to commit");
            return false;
        }

        if !self.step(&["add", "-A"], "add").await {
            return false;
        }
        if !self.step(&["commit", "-m", message], "commit").await {
            return false;
        }

        info!("Committed: {message}");
        true
    }

    pub async fn push(&self) -> bool {
        if !self.step(&["push"], "push").await {
            return false;
        }
        info!("Pushed to remote");
        true
    }

    /// Commit and push. Having nothing to commit counts as success.
    pub async fn commit_and_push(&self, message: &str) -> bool {
        if self.commit_changes(message).await {
            return self.push().await;
        }
        true
    }

    async fn step(&self, args: &[&str], what: &str) -> bool {
        match self.run(args).await {
            Ok(out) if out.status.success() => true,
            Ok(out) => {
                error!("git {what} failed: {}", String::from_utf8_lossy(&out.stderr).trim());
                false
            }
            Err(e) => {
                error!("git {what} failed to start: {e}");
                false
            }
        }
    }

    /// Clone the vault when missing, otherwise pull; then set the commit identity.
    pub async fn ensure_vault(&self, remote: &GitRemote) -> bool {
        if remote.url.trim().is_empty() {
            warn!("No git URL provided, skipping vault sync");
            return false;
        }
        let auth_url = auth_url(&remote.url, remote.token.as_deref());

        if !self.vault_path.join(".git").exists() {
            info!("Cloning vault from {}...", remote.url);
            if let Err(e) = tokio::fs::create_dir_all(&self.vault_path).await {
                error!("cannot create vault dir {}: {e}", self.vault_path.display());
                return false;
            }
            let cloned = Self::run_in(
                &self.vault_path,
                &["clone", "--branch", remote.branch.as_str(), auth_url.as_str(), "."],
            )
            .await;
            match cloned {
                Ok(out) if out.status.success() => info!("Vault cloned successfully"),
                Ok(out) => {
                    error!("git clone failed: {}", String::from_utf8_lossy(&out.stderr).trim());
                    return false;
                }
                Err(e) => {
                    error!("git clone failed to start: {e}");
                    return false;
                }
            }
        } else {
            info!("Vault already exists, pulling changes...");
            self.step(&["remote", "set-url", "origin", auth_url.as_str()], "remote set-url")
                .await;
            if !self.step(&["pull", "origin", remote.branch.as_str()], "pull").await {
                return false;
            }
            info!("Vault updated");
        }

        self.step(&["config", "user.name", remote.user_name.as_str()], "config user.name")
            .await;
        self.step(&["config", "user.email", remote.user_email.as_str()], "config user.email")
            .await;
        true
    }
}

/// Inject `token` into `scheme://host/...` unless the URL already carries credentials.
pub fn auth_url(url: &str, token: Option<&str>) -> String {
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return url.to_string();
    };
    if url.contains('@') {
        return url.to_string();
    }
    match url.split_once("://") {
        Some((scheme, rest)) => format!("{scheme}://{token}@{rest}"),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injects_token_into_https_urls() {
        assert_eq!(
            auth_url("https://github.com/me/vault.git", Some("ghp_x")),
            "https://ghp_x@github.com/me/vault.git"
        );
    }

    #[test]
    fn leaves_urls_alone_without_token_or_with_credentials() {
        let url = "https://github.com/me/vault.git";
        assert_eq!(auth_url(url, None), url);
        assert_eq!(auth_url(url, Some("")), url);
        assert_eq!(
            auth_url("git@github.com:me/vault.git", Some("t")),
            "git@github.com:me/vault.git"
        );
        assert_eq!(auth_url("https://u:p@host/r.git", Some("t")), "https://u:p@host/r.git");
    }

    #[tokio::test]
    async fn empty_remote_url_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let git = VaultGit::new(dir.path());
        let remote = GitRemote {
            url: " ".to_string(),
            branch: "main".to_string(),
            token: None,
            user_name: "bot".to_string(),
            user_email: "bot@example.com".to_string(),
        };
        assert!(!git.ensure_vault(&remote).await);
        assert!(!dir.path().join(".git").exists());
    }
}
