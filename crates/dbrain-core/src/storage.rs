//! Markdown vault: one daily note per day plus weekly summaries.

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use tracing::{debug, info};

use crate::{formatting::html_to_markdown, Result};

#[derive(Clone, Debug)]
pub struct VaultStorage {
    root: PathBuf,
}

impl VaultStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn daily_dir(&self) -> PathBuf {
        self.root.join("daily")
    }

    pub fn daily_file(&self, day: NaiveDate) -> PathBuf {
        self.daily_dir().join(format!("{}.md", day.format("%Y-%m-%d")))
    }

    /// Append an entry as `## HH:MM <tag>` followed by the text.
    pub fn append_to_daily(&self, text: &str, at: NaiveDateTime, tag: &str) -> Result<PathBuf> {
        fs::create_dir_all(self.daily_dir())?;
        let path = self.daily_file(at.date());

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        let entry = format!("## {} {tag}\n\n{}\n\n", at.format("%H:%M"), text.trim());
        file.write_all(entry.as_bytes())?;

        debug!("appended {} chars to {}", text.len(), path.display());
        Ok(path)
    }

    /// Contents of the daily note, `None` when missing or blank.
    pub fn read_daily(&self, day: NaiveDate) -> Result<Option<String>> {
        let path = self.daily_file(day);
        match fs::read_to_string(&path) {
            Ok(s) if s.trim().is_empty() => Ok(None),
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Number of `## ` entries in the daily note.
    pub fn count_entries(&self, day: NaiveDate) -> Result<usize> {
        Ok(self
            .read_daily(day)?
            .map(|s| s.lines().filter(|l| l.starts_with("## ")).count())
            .unwrap_or(0))
    }

    /// Write `summaries/YYYY-Www-summary.md` with front matter.
    pub fn save_weekly_summary(&self, report_html: &str, week_date: NaiveDate) -> Result<PathBuf> {
        let iso = week_date.iso_week();
        let week = format!("{}-W{:02}", iso.year(), iso.week());
        let dir = self.root.join("summaries");
        fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{week}-summary.md"));

        let content = format!(
            "---\ndate: {}\ntype: weekly-summary\nweek: {week}\n---\n\n{}",
            week_date.format("%Y-%m-%d"),
            html_to_markdown(report_html)
        );
        fs::write(&path, content)?;

        info!("Weekly summary saved to {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn appends_entries_to_the_daily_note() {
        let dir = tempfile::tempdir().unwrap();
        let vault = VaultStorage::new(dir.path());

        let path = vault
            .append_to_daily("first thought\n", at(2026, 3, 9, 8, 5), "[voice]")
            .unwrap();
        vault
            .append_to_daily("second", at(2026, 3, 9, 21, 40), "[text]")
            .unwrap();

        assert!(path.ends_with("daily/2026-03-09.md"));
        let day = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        let content = vault.read_daily(day).unwrap().unwrap();
        assert_eq!(
            content,
            "## 08:05 [voice]\n\nfirst thought\n\n## 21:40 [text]\n\nsecond\n\n"
        );
        assert_eq!(vault.count_entries(day).unwrap(), 2);
    }

    #[test]
    fn missing_or_blank_daily_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let vault = VaultStorage::new(dir.path());
        let day = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert!(vault.read_daily(day).unwrap().is_none());
        assert_eq!(vault.count_entries(day).unwrap(), 0);

        fs::create_dir_all(vault.daily_dir()).unwrap();
        fs::write(vault.daily_file(day), "  \n").unwrap();
        assert!(vault.read_daily(day).unwrap().is_none());
    }

    #[test]
    fn weekly_summary_has_front_matter_and_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let vault = VaultStorage::new(dir.path());
        let day = NaiveDate::from_ymd_opt(2026, 1, 7).unwrap();

        let path = vault
            .save_weekly_summary("📅 <b>Weekly digest</b>", day)
            .unwrap();
        assert!(path.ends_with("summaries/2026-W02-summary.md"));

        let content = fs::read_to_string(path).unwrap();
        assert!(content.starts_with(
            "---\ndate: 2026-01-07\ntype: weekly-summary\nweek: 2026-W02\n---\n\n"
        ));
        assert!(content.ends_with("📅 **Weekly digest**"));
    }
}
