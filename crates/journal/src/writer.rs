//! Encrypting append writer.
//!
//! The producer (the frame loop) only ever enqueues. A bounded
//! `crossbeam-channel` queue feeds one worker thread that owns the file,
//! the cipher and the running digest.
//!
//! Backpressure policy: an enqueue waits at most `enqueue_timeout` for room,
//! then the line is dropped and counted. The count is written as an encrypted
//! `LostLines: n` record and into the seal when the writer closes.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use arenalog_wire::{SessionSeal, armor_key_blob, armor_seal};
use crossbeam_channel::{Receiver, Sender, bounded};
use sha2::{Digest, Sha256};

use crate::cipher::LineCipher;
use crate::{JournalError, LineSink, Result};

/// Default queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 20_000;

/// Default maximum wait for room in a full queue.
pub const DEFAULT_ENQUEUE_TIMEOUT: Duration = Duration::from_millis(2);

#[derive(Debug, Clone, Copy)]
pub struct WriterConfig {
    pub queue_capacity: usize,
    pub enqueue_timeout: Duration,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            enqueue_timeout: DEFAULT_ENQUEUE_TIMEOUT,
        }
    }
}

/// Counters reported by [`AsyncLogWriter::close`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    pub lines_written: u64,
    pub dropped_lines: u64,
    pub failed_lines: u64,
}

enum Command {
    Line(String),
    Raw(String),
    Flush(Sender<io::Result<()>>),
    Close { dropped: u64 },
}

// ============================================================================
// Producer Handle
// ============================================================================

pub struct AsyncLogWriter {
    path: PathBuf,
    tx: Option<Sender<Command>>,
    worker: Option<JoinHandle<Result<WriterStats>>>,
    dropped: AtomicU64,
    enqueue_timeout: Duration,
}

impl AsyncLogWriter {
    /// Create (truncating) `path` and start the worker. The key blob is the
    /// first line the worker writes.
    pub fn create(path: impl AsRef<Path>, cipher: LineCipher, config: WriterConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        let (tx, rx) = bounded(config.queue_capacity.max(1));

        let worker = Worker {
            out: BufWriter::new(file),
            cipher,
            seq: 0,
            digest: Sha256::new(),
            failed: 0,
        };
        let handle = thread::Builder::new()
            .name("arenalog-writer".to_string())
            .spawn(move || worker.run(rx))?;

        tracing::debug!(path = %path.display(), "log writer started");
        Ok(Self {
            path,
            tx: Some(tx),
            worker: Some(handle),
            dropped: AtomicU64::new(0),
            enqueue_timeout: config.enqueue_timeout,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lines dropped so far.
    pub fn dropped_lines(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn enqueue(&self, command: Command) -> bool {
        let sent = self
            .tx
            .as_ref()
            .is_some_and(|tx| tx.send_timeout(command, self.enqueue_timeout).is_ok());
        if !sent {
            let previous = self.dropped.fetch_add(1, Ordering::Relaxed);
            if previous == 0 {
                tracing::warn!(path = %self.path.display(), "log queue full, dropping lines");
            }
        }
        sent
    }

    /// Enqueue a plaintext line for encryption.
    pub fn write_line(&self, line: &str) -> bool {
        self.enqueue(Command::Line(line.to_string()))
    }

    /// Enqueue a line written as-is.
    pub fn write_raw(&self, line: &str) -> bool {
        self.enqueue(Command::Raw(line.to_string()))
    }

    /// Wait until everything enqueued so far is handed to the OS.
    pub fn flush(&self) -> Result<()> {
        let tx = self.tx.as_ref().ok_or(JournalError::Closed)?;
        let (ack_tx, ack_rx) = bounded(1);
        tx.send(Command::Flush(ack_tx))
            .map_err(|_| JournalError::Closed)?;
        ack_rx.recv().map_err(|_| JournalError::Closed)??;
        Ok(())
    }

    /// Drain the queue, write the seal, sync and stop the worker.
    pub fn close(mut self) -> Result<WriterStats> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<WriterStats> {
        let tx = self.tx.take().ok_or(JournalError::Closed)?;
        let dropped = self.dropped.load(Ordering::Relaxed);
        let sent = tx.send(Command::Close { dropped });
        drop(tx);

        let handle = self.worker.take().ok_or(JournalError::Closed)?;
        let stats = handle.join().map_err(|_| JournalError::WorkerPanicked)??;
        sent.map_err(|_| JournalError::Closed)?;
        tracing::debug!(
            path = %self.path.display(),
            lines = stats.lines_written,
            dropped = stats.dropped_lines,
            failed = stats.failed_lines,
            "log writer closed"
        );
        Ok(stats)
    }
}

impl std::fmt::Debug for AsyncLogWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncLogWriter")
            .field("path", &self.path)
            .field("open", &self.tx.is_some())
            .field("dropped", &self.dropped_lines())
            .finish()
    }
}

impl LineSink for AsyncLogWriter {
    fn write_line(&self, line: &str) -> bool {
        AsyncLogWriter::write_line(self, line)
    }
}

impl Drop for AsyncLogWriter {
    fn drop(&mut self) {
        if self.tx.is_some()
            && let Err(err) = self.shutdown()
        {
            tracing::warn!(path = %self.path.display(), error = %err, "log writer dropped without clean close");
        }
    }
}

// ============================================================================
// Worker
// ============================================================================

struct Worker {
    out: BufWriter<File>,
    cipher: LineCipher,
    seq: u64,
    digest: Sha256,
    failed: u64,
}

impl Worker {
    fn run(mut self, rx: Receiver<Command>) -> Result<WriterStats> {
        let head = armor_key_blob(self.cipher.key_blob());
        self.write_physical(&head)?;

        for command in rx.iter() {
            match command {
                Command::Line(line) => self.encrypted(&line),
                Command::Raw(line) => {
                    if let Err(err) = self.write_physical(&line) {
                        self.failed += 1;
                        tracing::warn!(error = %err, "failed to write raw log line");
                    }
                }
                Command::Flush(ack) => {
                    let _ = ack.send(self.out.flush());
                }
                Command::Close { dropped } => return self.finish(dropped),
            }
        }

        // Producer went away without closing: keep what was written.
        self.out.flush()?;
        Ok(self.stats(0))
    }

    fn encrypted(&mut self, line: &str) {
        let seq = self.seq;
        let result = self
            .cipher
            .encrypt_line(seq, line)
            .and_then(|encoded| self.write_physical(&encoded).map_err(JournalError::from));
        match result {
            Ok(()) => {
                self.digest.update(line.as_bytes());
                self.digest.update(b"\n");
                self.seq += 1;
            }
            Err(err) => {
                self.failed += 1;
                tracing::warn!(seq, error = %err, "failed to write encrypted log line");
            }
        }
    }

    fn write_physical(&mut self, line: &str) -> io::Result<()> {
        self.out.write_all(line.as_bytes())?;
        self.out.write_all(b"\n")
    }

    fn stats(&self, dropped: u64) -> WriterStats {
        WriterStats {
            lines_written: self.seq,
            dropped_lines: dropped,
            failed_lines: self.failed,
        }
    }

    fn finish(mut self, dropped: u64) -> Result<WriterStats> {
        if dropped > 0 {
            self.encrypted(&format!("LostLines: {dropped}"));
        }
        let stats = self.stats(dropped);
        let seal = SessionSeal {
            key: Some(self.cipher.key_blob().clone()),
            line_count: stats.lines_written,
            dropped_lines: stats.dropped_lines,
            failed_lines: stats.failed_lines,
            plaintext_sha256: self.digest.clone().finalize().to_vec(),
        };
        self.write_physical(&armor_seal(&seal))?;
        self.out.flush()?;
        self.out.get_ref().sync_all()?;
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::verify_log;

    fn open(dir: &Path, config: WriterConfig) -> AsyncLogWriter {
        AsyncLogWriter::create(dir.join("session.log"), LineCipher::generate(0), config).unwrap()
    }

    #[test]
    fn test_close_makes_lines_durable_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let writer = open(dir.path(), WriterConfig::default());
        let expected: Vec<String> = (0..500).map(|i| format!("line {i}")).collect();
        for line in &expected {
            assert!(writer.write_line(line));
        }
        let path = writer.path().to_path_buf();
        let stats = writer.close().unwrap();
        assert_eq!(stats.lines_written, 500);
        assert_eq!(stats.dropped_lines, 0);

        let log = verify_log(&path).unwrap();
        assert_eq!(log.lines, expected);
    }

    #[test]
    fn test_flush_is_a_barrier() {
        let dir = tempfile::tempdir().unwrap();
        let writer = open(dir.path(), WriterConfig::default());
        writer.write_line("before flush");
        writer.flush().unwrap();

        let text = std::fs::read_to_string(writer.path()).unwrap();
        assert_eq!(text.lines().count(), 2);
        writer.close().unwrap();
    }

    #[test]
    fn test_raw_lines_are_not_encrypted() {
        let dir = tempfile::tempdir().unwrap();
        let writer = open(dir.path(), WriterConfig::default());
        writer.write_raw("~NOTE~plain");
        writer.flush().unwrap();
        let text = std::fs::read_to_string(writer.path()).unwrap();
        assert!(text.lines().any(|l| l == "~NOTE~plain"));
        writer.close().unwrap();
    }

    #[test]
    fn test_drop_closes_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let writer = open(dir.path(), WriterConfig::default());
            writer.write_line("kept");
            writer.path().to_path_buf()
        };
        let log = verify_log(&path).unwrap();
        assert_eq!(log.lines, vec!["kept".to_string()]);
    }

    #[test]
    fn test_dropped_lines_recorded_in_seal() {
        let dir = tempfile::tempdir().unwrap();
        let config = WriterConfig {
            queue_capacity: 1,
            enqueue_timeout: Duration::ZERO,
        };
        let writer = open(dir.path(), config);
        let mut accepted = Vec::new();
        for i in 0..5_000 {
            let line = format!("burst {i}");
            if writer.write_line(&line) {
                accepted.push(line);
            }
        }
        let dropped = writer.dropped_lines();
        let path = writer.path().to_path_buf();
        let stats = writer.close().unwrap();
        assert_eq!(stats.dropped_lines, dropped);

        let log = verify_log(&path).unwrap();
        let seal = log.seal.unwrap();
        assert_eq!(seal.dropped_lines, dropped);
        if dropped > 0 {
            assert_eq!(log.lines.last().unwrap(), &format!("LostLines: {dropped}"));
            accepted.push(format!("LostLines: {dropped}"));
        }
        assert_eq!(log.lines, accepted);
    }
}
