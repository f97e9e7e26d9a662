//! Per-call transcripts of model traffic, for debugging prompts.
//!
//! Enabled with `JTUTOR_DEBUG_TRACE=1` (temp dir) or `JTUTOR_DEBUG_TRACE=<dir>`.
//! Every model call gets its own `<call>_<uuid>.jsonl` file: one `request`
//! line, then either `fragment` lines (streamed calls) or a single `reply`
//! line, and a closing `finish`, `error` or `abandoned` line.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::providers::{ProviderError, ProviderResult};

const TRACE_ENV: &str = "JTUTOR_DEBUG_TRACE";

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Entry<'a> {
    Request { model: &'a str, body: &'a Value },
    Fragment { text: &'a str },
    Reply { text: &'a str },
    Finish {
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<&'a str>,
        fragments: usize,
    },
    Error { kind: String, message: &'a str },
    /// The reader dropped a streamed call before it ended.
    Abandoned { fragments: usize },
}

#[derive(Debug)]
pub struct Transcript {
    path: PathBuf,
    sink: Option<BufWriter<File>>,
    fragments: usize,
    closed: bool,
}

impl Transcript {
    /// Opens a transcript for `call` when tracing is enabled.
    pub fn from_env(call: &str) -> Option<Self> {
        let raw = std::env::var(TRACE_ENV).ok()?;
        let dir = match raw.trim() {
            "" => return None,
            "1" | "true" => std::env::temp_dir().join("jtutor-trace"),
            dir => PathBuf::from(dir),
        };

        match Self::create(&dir, call) {
            Ok(transcript) => Some(transcript),
            Err(err) => {
                tracing::warn!(dir = %dir.display(), %err, "debug trace disabled");
                None
            }
        }
    }

    /// Creates a fresh transcript file for `call` in `dir`.
    ///
    /// # Errors
    /// Returns an error if the directory or file cannot be created.
    pub fn create(dir: &Path, call: &str) -> std::io::Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{call}_{}.jsonl", uuid::Uuid::new_v4().simple()));
        let file = File::create(&path)?;
        tracing::debug!(path = %path.display(), "model transcript opened");
        Ok(Self {
            path,
            sink: Some(BufWriter::new(file)),
            fragments: 0,
            closed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn request(&mut self, model: &str, body: &Value) {
        self.write(&Entry::Request { model, body });
    }

    pub fn fragment(&mut self, text: &str) {
        self.fragments += 1;
        self.write(&Entry::Fragment { text });
    }

    /// Records the outcome of a one-shot call.
    pub fn outcome(&mut self, result: &ProviderResult<String>) {
        match result {
            Ok(text) => {
                self.write(&Entry::Reply { text });
                self.finish(None);
            }
            Err(error) => self.error(error),
        }
    }

    pub fn finish(&mut self, reason: Option<&str>) {
        let fragments = self.fragments;
        self.write(&Entry::Finish { reason, fragments });
        self.close();
    }

    pub fn error(&mut self, error: &ProviderError) {
        self.write(&Entry::Error {
            kind: error.kind.to_string(),
            message: &error.message,
        });
        self.close();
    }

    fn close(&mut self) {
        self.closed = true;
        if let Some(sink) = &mut self.sink {
            let _ = sink.flush();
        }
    }

    fn write(&mut self, entry: &Entry<'_>) {
        let Some(sink) = &mut self.sink else {
            return;
        };
        let written = serde_json::to_writer(&mut *sink, entry)
            .map_err(std::io::Error::from)
            .and_then(|()| sink.write_all(b"\n"));
        if let Err(err) = written {
            tracing::warn!(path = %self.path.display(), %err, "model transcript write failed");
            self.sink = None;
        }
    }
}

impl Drop for Transcript {
    fn drop(&mut self) {
        if std::thread::panicking() || self.closed {
            return;
        }
        let fragments = self.fragments;
        self.write(&Entry::Abandoned { fragments });
        self.close();
    }
}
