//! Input timeline buffer.
//!
//! Key transitions are batched and written every `interval_ms` or every
//! `batch` entries, whichever comes first. Markers and finalize force a flush
//! so the timeline stays ordered relative to them.

use arenalog_journal::LineSink;

use crate::host::{KeyTransition, Watermark};

/// `+1532|Space|+|0|#FFFFFFFF|60|`
pub fn key_line(delta_ms: i64, key: &KeyTransition, watermark: Watermark, fps: f32) -> String {
    let fps = if fps.is_finite() { fps.max(0.0) } else { 0.0 };
    format!(
        "+{}|{}|{}|{}|#{}|{:.0}|",
        delta_ms,
        key.key,
        if key.pressed { '+' } else { '-' },
        watermark.number,
        watermark.hex(),
        fps
    )
}

#[derive(Debug, Clone)]
pub struct KeyLog {
    entries: Vec<String>,
    interval_ms: i64,
    batch: usize,
    last_flush_ms: i64,
}

impl KeyLog {
    pub fn new(interval_ms: i64, batch: usize, now_ms: i64) -> Self {
        Self {
            entries: Vec::new(),
            interval_ms: interval_ms.max(0),
            batch: batch.max(1),
            last_flush_ms: now_ms,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, line: String) {
        self.entries.push(line);
    }

    /// Flush when due. Returns the number of lines handed to `sink`.
    pub fn flush_if_due<W: LineSink + ?Sized>(&mut self, now_ms: i64, sink: &W) -> usize {
        let due = self.entries.len() >= self.batch || now_ms - self.last_flush_ms >= self.interval_ms;
        if due { self.flush(now_ms, sink) } else { 0 }
    }

    pub fn flush<W: LineSink + ?Sized>(&mut self, now_ms: i64, sink: &W) -> usize {
        self.last_flush_ms = now_ms;
        let count = self.entries.len();
        for line in self.entries.drain(..) {
            sink.write_line(&line);
        }
        count
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[derive(Default)]
    struct Lines(RefCell<Vec<String>>);

    impl LineSink for Lines {
        fn write_line(&self, line: &str) -> bool {
            self.0.borrow_mut().push(line.to_string());
            true
        }
    }

    fn key(name: &str, pressed: bool) -> KeyTransition {
        KeyTransition {
            key: name.to_string(),
            pressed,
        }
    }

    #[test]
    fn test_key_line_format() {
        let line = key_line(1532, &key("Space", true), Watermark::default(), 59.7);
        assert_eq!(line, "+1532|Space|+|0|#FFFFFFFF|60|");
        let line = key_line(7, &key("Z", false), Watermark::default(), f32::INFINITY);
        assert_eq!(line, "+7|Z|-|0|#FFFFFFFF|0|");
    }

    #[test]
    fn test_flush_by_interval() {
        let sink = Lines::default();
        let mut log = KeyLog::new(200, 50, 0);
        log.push("a".to_string());
        assert_eq!(log.flush_if_due(199, &sink), 0);
        assert_eq!(log.flush_if_due(200, &sink), 1);
        assert!(log.is_empty());

        log.push("b".to_string());
        assert_eq!(log.flush_if_due(300, &sink), 0);
        assert_eq!(*sink.0.borrow(), vec!["a"]);
    }

    #[test]
    fn test_flush_by_batch() {
        let sink = Lines::default();
        let mut log = KeyLog::new(200, 3, 0);
        for i in 0..3 {
            log.push(i.to_string());
        }
        assert_eq!(log.flush_if_due(10, &sink), 3);
        assert_eq!(*sink.0.borrow(), vec!["0", "1", "2"]);
    }
}
