//! Recorder configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use arenalog_journal::{DEFAULT_SPILL_THRESHOLD, WriterConfig};
use arenalog_journal::writer::{DEFAULT_ENQUEUE_TIMEOUT, DEFAULT_QUEUE_CAPACITY};
use arenalog_track::roster::{ROSTER_SCAN_INTERVAL, ROSTER_SCAN_RADIUS};
use serde::Deserialize;
use thiserror::Error;

/// Key log flush interval.
pub const DEFAULT_KEY_FLUSH_INTERVAL_MS: i64 = 200;

/// Key log entries that force a flush.
pub const DEFAULT_KEY_FLUSH_BATCH: usize = 50;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// What to do when a start gate fires while a session is recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrentStartPolicy {
    /// Finalize the running session, then start the new one.
    #[default]
    ForceClose,
    /// Keep the running session and ignore the gate.
    Reject,
}

/// Recorder configuration. Every field is optional in TOML.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecorderConfig {
    /// Root of the final bucket tree.
    pub output_dir: PathBuf,
    /// Where in-progress logs and section spills live.
    pub temp_dir: PathBuf,
    pub queue_capacity: usize,
    pub enqueue_timeout_ms: u64,
    pub section_threshold: usize,
    pub roster_scan_interval: u32,
    pub roster_radius: f32,
    pub key_flush_interval_ms: i64,
    pub key_flush_batch: usize,
    pub concurrent_start: ConcurrentStartPolicy,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("logs"),
            temp_dir: std::env::temp_dir(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            enqueue_timeout_ms: DEFAULT_ENQUEUE_TIMEOUT.as_millis() as u64,
            section_threshold: DEFAULT_SPILL_THRESHOLD,
            roster_scan_interval: ROSTER_SCAN_INTERVAL,
            roster_radius: ROSTER_SCAN_RADIUS,
            key_flush_interval_ms: DEFAULT_KEY_FLUSH_INTERVAL_MS,
            key_flush_batch: DEFAULT_KEY_FLUSH_BATCH,
            concurrent_start: ConcurrentStartPolicy::default(),
        }
    }
}

impl RecorderConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn writer_config(&self) -> WriterConfig {
        WriterConfig {
            queue_capacity: self.queue_capacity,
            enqueue_timeout: Duration::from_millis(self.enqueue_timeout_ms),
        }
    }
}
