// Line transport between the turn controller and the referee
//
// The contest referee talks over stdin/stdout; the local referee and the
// tests use in-memory queues.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use crate::error::EngineError;

/// Blocking source of protocol lines
pub trait LineSource {
    /// Returns the next line without its terminator
    fn read_line(&mut self) -> Result<String, EngineError>;
}

/// Destination for protocol lines
pub trait LineSink {
    fn write_line(&mut self, line: &str) -> Result<(), EngineError>;
}

/// Process stdin/stdout. Every written line is flushed immediately so the
/// referee sees the move before we block on the next read.
pub struct StdioTransport {
    stdin: io::StdinLock<'static>,
    stdout: io::StdoutLock<'static>,
}

impl StdioTransport {
    pub fn new() -> Self {
        StdioTransport {
            stdin: io::stdin().lock(),
            stdout: io::stdout().lock(),
        }
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl LineSource for StdioTransport {
    fn read_line(&mut self) -> Result<String, EngineError> {
        let mut line = String::new();
        if self.stdin.read_line(&mut line)? == 0 {
            return Err(EngineError::UnexpectedEndOfExchange(
                "stdin closed".to_string(),
            ));
        }
        Ok(line.trim().to_string())
    }
}

impl LineSink for StdioTransport {
    fn write_line(&mut self, line: &str) -> Result<(), EngineError> {
        writeln!(self.stdout, "{}", line)?;
        self.stdout.flush()?;
        Ok(())
    }
}

/// In-memory inbox/outbox pair
#[derive(Debug, Default, Clone)]
pub struct QueueTransport {
    inbox: VecDeque<String>,
    outbox: VecDeque<String>,
}

impl QueueTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport with `lines` already waiting to be read
    pub fn with_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        QueueTransport {
            inbox: lines.into_iter().map(Into::into).collect(),
            outbox: VecDeque::new(),
        }
    }

    pub fn push_line(&mut self, line: impl Into<String>) {
        self.inbox.push_back(line.into());
    }

    /// Number of lines not yet read
    pub fn pending_input(&self) -> usize {
        self.inbox.len()
    }

    /// Drops the oldest unread line
    pub fn discard_line(&mut self) -> Option<String> {
        self.inbox.pop_front()
    }

    /// Oldest written line not yet collected
    pub fn take_output(&mut self) -> Option<String> {
        self.outbox.pop_front()
    }

    pub fn outputs(&self) -> impl Iterator<Item = &String> {
        self.outbox.iter()
    }
}

impl LineSource for QueueTransport {
    fn read_line(&mut self) -> Result<String, EngineError> {
        self.inbox.pop_front().ok_or_else(|| {
            EngineError::UnexpectedEndOfExchange("no line left to read".to_string())
        })
    }
}

impl LineSink for QueueTransport {
    fn write_line(&mut self, line: &str) -> Result<(), EngineError> {
        self.outbox.push_back(line.to_string());
        Ok(())
    }
}
