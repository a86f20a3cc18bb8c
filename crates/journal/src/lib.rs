//! arenalog Journal
//!
//! Persistence for session logs.
//!
//! # Architecture
//!
//! - [`LineCipher`]: per-session key material, one AEAD ciphertext per line
//! - [`AsyncLogWriter`]: bounded queue drained by a single background worker
//!   that encrypts and appends; the producer never touches the file
//! - [`BufferedLogSection`]: ordered in-memory buffer that spills to a private
//!   temporary file and later replays into a [`LineSink`]
//! - [`read_log`] / [`verify_log`]: decrypt a finished log and check its seal
//!
//! # File Layout
//!
//! The first line is the armored key blob, every following line is one
//! encrypted log line, and the last line is the armored seal (see
//! `arenalog-wire`).

#![deny(unsafe_code)]

use std::io;

use arenalog_wire::WireError;
use thiserror::Error;

pub mod cipher;
pub mod reader;
pub mod section;
pub mod writer;

pub use cipher::LineCipher;
pub use reader::{DecodedLog, VerifyError, read_log, verify_log};
pub use section::{BufferedLogSection, DEFAULT_SPILL_THRESHOLD};
pub use writer::{AsyncLogWriter, WriterConfig, WriterStats};

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("encryption failed for line {seq}")]
    Encrypt { seq: u64 },

    #[error("decryption failed for line {seq}")]
    Decrypt { seq: u64 },

    #[error("line {seq} is not valid UTF-8")]
    Utf8 { seq: u64 },

    #[error("writer is closed")]
    Closed,

    #[error("writer worker panicked")]
    WorkerPanicked,
}

pub type Result<T> = std::result::Result<T, JournalError>;

// ============================================================================
// Line Sink
// ============================================================================

/// Destination for log lines.
///
/// Returns `false` when the line was not accepted. Callers on the frame loop
/// treat that as a counted loss, never as an error.
pub trait LineSink {
    fn write_line(&self, line: &str) -> bool;

    fn write_lines<I, S>(&self, lines: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        Self: Sized,
    {
        lines
            .into_iter()
            .filter(|line| self.write_line(line.as_ref()))
            .count()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;

    use super::LineSink;

    /// Collects lines in memory.
    #[derive(Default)]
    pub struct MemorySink {
        pub lines: RefCell<Vec<String>>,
    }

    impl LineSink for MemorySink {
        fn write_line(&self, line: &str) -> bool {
            self.lines.borrow_mut().push(line.to_string());
            true
        }
    }
}
