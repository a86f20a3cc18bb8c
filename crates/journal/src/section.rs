//! Buffered log sections.
//!
//! Sections collect report entries during a session and are replayed into the
//! writer at finalize. Once more than `threshold` entries are pending in
//! memory they move to an anonymous temporary file, so a long session keeps
//! bounded memory. Read-back order always equals append order.
//!
//! Spill format: one entry per physical line with `\`, `\n` and `\r` escaped.

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use crate::{LineSink, Result};

/// Pending in-memory entries allowed before a spill.
pub const DEFAULT_SPILL_THRESHOLD: usize = 200;

#[derive(Debug)]
pub struct BufferedLogSection {
    threshold: usize,
    spill_dir: PathBuf,
    memory: Vec<String>,
    spill: Option<File>,
    /// Bytes of the spill file known to be fully written.
    committed: u64,
    spilled: usize,
    spill_disabled: bool,
}

impl BufferedLogSection {
    pub fn new(spill_dir: impl Into<PathBuf>, threshold: usize) -> Self {
        Self {
            threshold: threshold.max(1),
            spill_dir: spill_dir.into(),
            memory: Vec::new(),
            spill: None,
            committed: 0,
            spilled: 0,
            spill_disabled: false,
        }
    }

    pub fn len(&self) -> usize {
        self.spilled + self.memory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries currently held on disk.
    pub fn spilled(&self) -> usize {
        self.spilled
    }

    pub fn add(&mut self, line: impl Into<String>) {
        self.memory.push(line.into());
        if self.memory.len() > self.threshold {
            self.spill_memory();
        }
    }

    pub fn add_range<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for line in lines {
            self.add(line);
        }
    }

    pub fn clear(&mut self) {
        self.memory.clear();
        self.spill = None;
        self.committed = 0;
        self.spilled = 0;
    }

    fn spill_memory(&mut self) {
        if self.spill_disabled {
            return;
        }
        if self.spill.is_none() {
            match tempfile::tempfile_in(&self.spill_dir) {
                Ok(file) => self.spill = Some(file),
                Err(err) => {
                    tracing::warn!(
                        dir = %self.spill_dir.display(),
                        error = %err,
                        "cannot create section spill file, keeping entries in memory"
                    );
                    self.spill_disabled = true;
                    return;
                }
            }
        }
        let Some(file) = self.spill.as_mut() else {
            return;
        };

        let mut batch = String::new();
        for entry in &self.memory {
            escape_into(entry, &mut batch);
            batch.push('\n');
        }
        match file.write_all(batch.as_bytes()) {
            Ok(()) => {
                self.committed += batch.len() as u64;
                self.spilled += self.memory.len();
                self.memory.clear();
            }
            Err(err) => {
                // Entries stay in memory; cut off any partial batch.
                let _ = file.set_len(self.committed);
                let _ = file.seek(SeekFrom::Start(self.committed));
                self.spill_disabled = true;
                tracing::warn!(error = %err, "section spill failed, keeping entries in memory");
            }
        }
    }

    /// Replay every entry in append order into `sink`, then empty the section.
    ///
    /// Returns the number of entries the sink accepted.
    pub fn write_encrypted_lines<W: LineSink + ?Sized>(&mut self, sink: &W) -> Result<usize> {
        let result = self.replay(sink);
        self.clear();
        self.spill_disabled = false;
        result
    }

    fn replay<W: LineSink + ?Sized>(&mut self, sink: &W) -> Result<usize> {
        let mut count = 0;
        if let Some(file) = self.spill.as_mut() {
            file.flush()?;
            file.seek(SeekFrom::Start(0))?;
            let reader = BufReader::new(Read::by_ref(file).take(self.committed));
            for line in reader.lines() {
                if sink.write_line(&unescape(&line?)) {
                    count += 1;
                }
            }
        }
        for entry in &self.memory {
            if sink.write_line(entry) {
                count += 1;
            }
        }
        Ok(count)
    }
}

fn escape_into(entry: &str, out: &mut String) {
    for ch in entry.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
}

fn unescape(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
