//! Append-only run journal.
//!
//! Each pipeline step appends one `step|attempt|status|timestamp` line under
//! the workspace, so an operator can see how far a run got even after a
//! crash. Complements the commit history, which checkpoints the artifacts
//! themselves.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    pub step: String,
    pub attempt: u32,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

pub struct RunJournal {
    journal_file: PathBuf,
}

impl RunJournal {
    pub fn new(journal_file: PathBuf) -> Self {
        Self { journal_file }
    }

    pub fn record(&self, step: &str, attempt: u32, status: &str) -> Result<()> {
        let entry = format!("{step}|{attempt}|{status}|{}\n", Utc::now().to_rfc3339());

        if let Some(parent) = self.journal_file.parent() {
            fs::create_dir_all(parent).context("Failed to create journal directory")?;
        }
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.journal_file)
            .context("Failed to open journal file")?
            .write_all(entry.as_bytes())
            .context("Failed to write journal entry")?;

        Ok(())
    }

    pub fn entries(&self) -> Result<Vec<JournalEntry>> {
        if !self.journal_file.exists() {
            return Ok(Vec::new());
        }

        let content =
            fs::read_to_string(&self.journal_file).context("Failed to read journal file")?;

        let entries = content
            .lines()
            .filter_map(|line| {
                let parts: Vec<&str> = line.split('|').collect();
                if parts.len() < 4 {
                    return None;
                }
                Some(JournalEntry {
                    step: parts[0].to_string(),
                    attempt: parts[1].parse().unwrap_or(0),
                    status: parts[2].to_string(),
                    timestamp: DateTime::parse_from_rfc3339(parts[3])
                        .ok()?
                        .with_timezone(&Utc),
                })
            })
            .collect();

        Ok(entries)
    }

    /// The most recent entry, if any. Handy for "where did the run stop".
    pub fn last(&self) -> Result<Option<JournalEntry>> {
        Ok(self.entries()?.into_iter().next_back())
    }
}
