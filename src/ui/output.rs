//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Output is formatted consistently and respects the quiet flag. Engine
//! operations never print directly; they report through a [`StatusSink`]
//! carried in their context, so tests can capture exactly what an operator
//! would have seen.

use std::fmt::Display;
use std::sync::{Arc, Mutex};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print a debug message (only in debug mode).
pub fn debug(message: impl Display, verbosity: Verbosity) {
    if verbosity == Verbosity::Debug {
        eprintln!("[debug] {}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (always shown).
///
/// Warnings carry rejection reasons, so quiet mode does not hide them.
pub fn warn(message: impl Display) {
    eprintln!("warning: {}", message);
}

/// Operator-facing status channel.
pub trait StatusSink: Send + Sync {
    /// Progress and result messages.
    fn status(&self, message: &str);
    /// Rejections and other conditions the operator must see.
    fn warn(&self, message: &str);
    /// Protocol tracing.
    fn debug(&self, message: &str);
}

/// Sink that writes to the terminal.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleSink {
    verbosity: Verbosity,
}

impl ConsoleSink {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }
}

impl StatusSink for ConsoleSink {
    fn status(&self, message: &str) {
        print(message, self.verbosity);
    }

    fn warn(&self, message: &str) {
        warn(message);
    }

    fn debug(&self, message: &str) {
        debug(message, self.verbosity);
    }
}

/// A message captured by [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Status(String),
    Warn(String),
    Debug(String),
}

impl Message {
    pub fn text(&self) -> &str {
        match self {
            Message::Status(s) | Message::Warn(s) | Message::Debug(s) => s,
        }
    }
}

/// Sink that records every message, for tests.
///
/// Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    messages: Arc<Mutex<Vec<Message>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far, in order.
    pub fn messages(&self) -> Vec<Message> {
        self.lock().clone()
    }

    /// Recorded status lines.
    pub fn statuses(&self) -> Vec<String> {
        self.filtered(|m| matches!(m, Message::Status(_)))
    }

    /// Recorded warnings.
    pub fn warnings(&self) -> Vec<String> {
        self.filtered(|m| matches!(m, Message::Warn(_)))
    }

    fn filtered(&self, keep: impl Fn(&Message) -> bool) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|m| keep(m))
            .map(|m| m.text().to_string())
            .collect()
    }

    fn record(&self, message: Message) {
        self.lock().push(message);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Message>> {
        // A poisoned record is still a valid record
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StatusSink for MemorySink {
    fn status(&self, message: &str) {
        self.record(Message::Status(message.to_string()));
    }

    fn warn(&self, message: &str) {
        self.record(Message::Warn(message.to_string()));
    }

    fn debug(&self, message: &str) {
        self.record(Message::Debug(message.to_string()));
    }
}
