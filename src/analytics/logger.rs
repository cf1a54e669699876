//! Ask log: one JSON line per dispatched question (`~/.mallscope/ask-log.jsonl`).
//!
//! Records timing and outcome only. The question and answer text are not
//! stored, just their lengths.

use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Log entry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskLogEntry {
    pub timestamp: String,
    pub model: String,
    pub question_chars: usize,
    pub answer_chars: usize,
    pub latency_ms: u64,
    /// Whether the backend returned an answer (as opposed to an error string).
    #[serde(default = "default_true")]
    pub success: bool,
}

fn default_true() -> bool {
    true
}

impl AskLogEntry {
    /// Entry stamped with the current time.
    pub fn new(
        model: &str,
        question_chars: usize,
        answer_chars: usize,
        latency_ms: u64,
        success: bool,
    ) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            model: model.to_string(),
            question_chars,
            answer_chars,
            latency_ms,
            success,
        }
    }
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Append an entry to the log at `path`.
///
/// Best-effort: a failed write is logged at debug level and otherwise ignored.
pub fn log_ask(path: &Path, entry: &AskLogEntry) {
    if let Err(e) = append_log_entry(path, entry) {
        tracing::debug!(path = %path.display(), error = %e, "failed to write ask log");
    }
}

fn append_log_entry(path: &Path, entry: &AskLogEntry) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(entry)?;
    writeln!(file, "{json}")?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Read every entry from the log at `path`.
///
/// Silently skips malformed lines. Returns an empty vec if the file does not
/// exist or cannot be read.
pub fn read_all_entries(path: &Path) -> Vec<AskLogEntry> {
    let Ok(file) = fs::File::open(path) else {
        return Vec::new();
    };

    BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| serde_json::from_str::<AskLogEntry>(&line).ok())
        .collect()
}

/// The last `limit` entries, oldest first.
pub fn read_recent(path: &Path, limit: usize) -> Vec<AskLogEntry> {
    let mut entries = read_all_entries(path);
    let skip = entries.len().saturating_sub(limit);
    entries.drain(..skip);
    entries
}

/// Default location of the ask log.
pub fn ask_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".mallscope").join("ask-log.jsonl"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
