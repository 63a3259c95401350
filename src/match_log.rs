// Match logging module for per-move decision records
//
// Each emitted move is appended to a JSONL file together with everything
// needed to rebuild the position it was chosen in. Write failures are
// reported through the log facade and never interrupt the game.

use log::error;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};

use crate::types::Side;

/// A move as it appeared on the wire, tagged with who played it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedMove {
    pub side: Side,
    pub text: String,
}

/// Represents a single match log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchLogEntry {
    pub move_index: usize,
    pub side: Side,
    pub chosen_move: String,
    /// Configuration name of the policy that was asked
    pub strategy: String,
    /// Neutral cells in preamble order
    pub neutral: Vec<String>,
    /// Every move played before this one
    pub history: Vec<LoggedMove>,
    pub timestamp: String,
}

/// Appends entries to a JSONL file when enabled; a no-op otherwise
pub struct MatchLogger {
    writer: Option<BufWriter<File>>,
}

impl MatchLogger {
    /// Creates a new match logger
    /// If enabled is true, initializes the log file (truncating if it exists)
    pub fn new(enabled: bool, log_file_path: &str) -> Self {
        if !enabled {
            return Self::disabled();
        }

        match OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_file_path)
        {
            Ok(file) => {
                log::info!("Match logging enabled: {}", log_file_path);
                MatchLogger {
                    writer: Some(BufWriter::new(file)),
                }
            }
            Err(e) => {
                error!("Failed to create match log file '{}': {}", log_file_path, e);
                Self::disabled()
            }
        }
    }

    /// Creates a disabled match logger (no-op)
    pub fn disabled() -> Self {
        MatchLogger { writer: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    /// Writes one entry and flushes so a crash keeps every earlier move
    pub fn log_move(&mut self, entry: &MatchLogEntry) {
        let Some(writer) = self.writer.as_mut() else {
            return;
        };

        match serde_json::to_string(entry) {
            Ok(json_line) => {
                if let Err(e) = writeln!(writer, "{}", json_line) {
                    error!("Failed to write match log entry: {}", e);
                } else if let Err(e) = writer.flush() {
                    error!("Failed to flush match log: {}", e);
                }
            }
            Err(e) => {
                error!("Failed to serialize match log entry: {}", e);
            }
        }
    }
}

impl std::fmt::Debug for MatchLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchLogger")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// Current time in RFC 3339 form for log entries
pub fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
