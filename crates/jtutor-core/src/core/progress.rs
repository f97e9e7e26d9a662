//! Completed-topic tracking.
//!
//! The set is loaded once at startup and written back after every toggle to
//! `$JTUTOR_HOME/progress.json` as a sorted JSON list, so toggling a topic
//! twice leaves the file byte-for-byte as it was.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

#[derive(Debug, Clone, Default)]
pub struct Progress {
    completed: BTreeSet<String>,
    path: Option<PathBuf>,
}

impl Progress {
    /// Progress that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads the completion set from `path`.
    ///
    /// A missing file is an empty set. So is an unreadable or corrupt one;
    /// that case is logged and the file is replaced on the next toggle.
    pub fn load(path: &Path) -> Self {
        let completed = match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<BTreeSet<String>>(&contents) {
                Ok(set) => set,
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "ignoring corrupt progress file");
                    BTreeSet::new()
                }
            },
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => BTreeSet::new(),
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "ignoring unreadable progress file");
                BTreeSet::new()
            }
        };

        tracing::debug!(count = completed.len(), "progress loaded");
        Self {
            completed,
            path: Some(path.to_path_buf()),
        }
    }

    pub fn is_complete(&self, topic_id: &str) -> bool {
        self.completed.contains(topic_id)
    }

    /// Flips a topic's completion flag and persists the set.
    ///
    /// Returns the new flag. The in-memory flag is flipped even when the write
    /// fails.
    ///
    /// # Errors
    /// Returns an error if the progress file cannot be written.
    pub fn toggle(&mut self, topic_id: &str) -> Result<bool> {
        let now_complete = if self.completed.remove(topic_id) {
            false
        } else {
            self.completed.insert(topic_id.to_string());
            true
        };
        self.save()?;
        Ok(now_complete)
    }

    /// Completed topic ids in sorted order.
    pub fn completed(&self) -> impl Iterator<Item = &str> {
        self.completed.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.completed.is_empty()
    }

    /// Percentage of `total` topics done, rounded to the nearest integer.
    pub fn percent(completed: usize, total: usize) -> u32 {
        if total == 0 {
            return 0;
        }
        let ratio = completed.min(total) as f64 / total as f64;
        (ratio * 100.0).round() as u32
    }

    /// JSON list form written to disk.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.completed).unwrap_or_else(|_| "[]".to_string())
    }

    fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, self.to_json())
            .with_context(|| format!("Failed to write progress to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;
        Ok(())
    }
}
