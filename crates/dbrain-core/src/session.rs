//! Per-user capture log (`.sessions/<user_id>.jsonl` inside the vault).
//!
//! The processor reads today's entries back to give the LLM short-term context.

use std::{
    fs::{self, OpenOptions},
    io::{BufRead, BufReader, Write},
    path::PathBuf,
};

use chrono::{DateTime, FixedOffset, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{domain::UserId, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionEntry {
    /// RFC3339 timestamp with the local offset.
    pub ts: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub msg_id: Option<i32>,
}

impl SessionEntry {
    pub fn new(kind: &str, text: &str, at: DateTime<Local>) -> Self {
        Self {
            ts: at.to_rfc3339(),
            kind: kind.to_string(),
            text: text.to_string(),
            duration: None,
            msg_id: None,
        }
    }

    pub fn timestamp(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.ts).ok()
    }

    /// `HH:MM` of the entry, empty when the timestamp does not parse.
    pub fn time_of_day(&self) -> String {
        self.timestamp()
            .map(|t| t.format("%H:%M").to_string())
            .unwrap_or_default()
    }
}

#[derive(Clone, Debug)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(vault_path: impl Into<PathBuf>) -> Self {
        Self {
            dir: vault_path.into().join(".sessions"),
        }
    }

    fn file_for(&self, user_id: UserId) -> PathBuf {
        self.dir.join(format!("{}.jsonl", user_id.0))
    }

    pub fn append(&self, user_id: UserId, entry: &SessionEntry) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.file_for(user_id))?;
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    /// Entries whose timestamp falls on `day` (local date), oldest first.
    pub fn get_day(&self, user_id: UserId, day: NaiveDate) -> Result<Vec<SessionEntry>> {
        let file = match fs::File::open(self.file_for(user_id)) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut out = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<SessionEntry>(&line) {
                Ok(entry) if entry.timestamp().map(|t| t.date_naive()) == Some(day) => {
                    out.push(entry)
                }
                Ok(_) => {}
                Err(e) => warn!("skipping malformed session line for {}: {e}", user_id.0),
            }
        }
        Ok(out)
    }

    pub fn get_today(&self, user_id: UserId) -> Result<Vec<SessionEntry>> {
        self.get_day(user_id, Local::now().date_naive())
    }
}
