//! Unique damage and multiplier dedup per attacker.

use std::collections::{HashMap, HashSet};

use crate::{SEPARATOR, Stamp, arena_or_unknown};

/// A value not previously seen for its key.
#[derive(Debug, Clone, PartialEq)]
pub enum DamageChange {
    Damage {
        key: String,
        arena: String,
        delta_ms: i64,
        value: i32,
    },
    Multiplier {
        key: String,
        arena: String,
        delta_ms: i64,
        value: f32,
    },
}

impl DamageChange {
    pub fn key(&self) -> &str {
        match self {
            Self::Damage { key, .. } | Self::Multiplier { key, .. } => key,
        }
    }

    pub fn line(&self) -> String {
        match self {
            Self::Damage {
                key,
                arena,
                delta_ms,
                value,
            } => format!(
                "Add NEW unique damage: {}-{}/{} #{}",
                key,
                arena_or_unknown(arena),
                delta_ms,
                value
            ),
            Self::Multiplier {
                key,
                arena,
                delta_ms,
                value,
            } => format!(
                "Add NEW unique multiplier: {}-{}/{} #{}",
                key,
                arena_or_unknown(arena),
                delta_ms,
                value
            ),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct KeyRecord {
    damages: HashSet<i32>,
    /// Multipliers compared by bit pattern.
    multipliers: HashSet<u32>,
    lines: Vec<String>,
}

/// Keeps per-key sets of distinct damage and multiplier values.
#[derive(Debug, Clone, Default)]
pub struct DamageChangeTracker {
    order: Vec<String>,
    records: HashMap<String, KeyRecord>,
}

impl DamageChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.order.clear();
        self.records.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Record one hit. Returns the events for values new to `key`.
    pub fn track(
        &mut self,
        key: &str,
        arena: &str,
        stamp: Stamp,
        damage: i32,
        multiplier: f32,
    ) -> Vec<DamageChange> {
        if !self.records.contains_key(key) {
            self.order.push(key.to_string());
        }
        let record = self.records.entry(key.to_string()).or_default();

        let mut changes = Vec::new();
        if record.damages.insert(damage) {
            changes.push(DamageChange::Damage {
                key: key.to_string(),
                arena: arena.to_string(),
                delta_ms: stamp.delta_ms,
                value: damage,
            });
        }
        if record.multipliers.insert(multiplier.to_bits()) {
            changes.push(DamageChange::Multiplier {
                key: key.to_string(),
                arena: arena.to_string(),
                delta_ms: stamp.delta_ms,
                value: multiplier,
            });
        }
        record.lines.extend(changes.iter().map(DamageChange::line));
        changes
    }

    /// The `DamageChange:` report section, grouped by key in first-seen order.
    pub fn section_lines(&self) -> Vec<String> {
        let mut lines = vec!["DamageChange:".to_string()];
        if self.order.is_empty() {
            lines.push("  (none)".to_string());
        }
        for key in &self.order {
            let Some(record) = self.records.get(key) else {
                continue;
            };
            lines.push(format!("{key}:"));
            lines.extend(record.lines.iter().map(|l| format!("  {l}")));
        }
        lines.push(String::new());
        lines.push(SEPARATOR.to_string());
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAMP: Stamp = Stamp {
        now_ms: 0,
        delta_ms: 640,
    };

    #[test]
    fn test_same_pair_emits_once() {
        let mut tracker = DamageChangeTracker::new();
        let first = tracker.track("Knight/Slash", "GG_Sly", STAMP, 21, 1.0);
        assert_eq!(first.len(), 2);
        let second = tracker.track("Knight/Slash", "GG_Sly", STAMP, 21, 1.0);
        assert!(second.is_empty());
    }

    #[test]
    fn test_new_multiplier_emits_one_more() {
        let mut tracker = DamageChangeTracker::new();
        tracker.track("Knight/Slash", "GG_Sly", STAMP, 21, 1.0);
        let changes = tracker.track("Knight/Slash", "GG_Sly", STAMP, 21, 1.5);
        assert_eq!(changes.len(), 1);
        assert!(matches!(
            changes[0],
            DamageChange::Multiplier { value, .. } if value == 1.5
        ));
    }

    #[test]
    fn test_keys_are_independent() {
        let mut tracker = DamageChangeTracker::new();
        tracker.track("A", "GG_Sly", STAMP, 21, 1.0);
        assert_eq!(tracker.track("B", "GG_Sly", STAMP, 21, 1.0).len(), 2);
    }

    #[test]
    fn test_line_format() {
        let mut tracker = DamageChangeTracker::new();
        let changes = tracker.track("Knight/Slash", "GG_Sly", STAMP, 21, 1.0);
        assert_eq!(
            changes[0].line(),
            "Add NEW unique damage: Knight/Slash-GG_Sly/640 #21"
        );
        assert_eq!(
            changes[1].line(),
            "Add NEW unique multiplier: Knight/Slash-GG_Sly/640 #1"
        );
    }

    #[test]
    fn test_section_groups_by_key_in_order() {
        let mut tracker = DamageChangeTracker::new();
        tracker.track("B", "X", STAMP, 1, 1.0);
        tracker.track("A", "X", STAMP, 2, 1.0);
        tracker.track("B", "X", STAMP, 3, 1.0);

        let lines = tracker.section_lines();
        assert_eq!(lines[0], "DamageChange:");
        assert_eq!(lines[1], "B:");
        assert_eq!(lines[2], "  Add NEW unique damage: B-X/640 #1");
        assert_eq!(lines[3], "  Add NEW unique multiplier: B-X/640 #1");
        assert_eq!(lines[4], "  Add NEW unique damage: B-X/640 #3");
        assert_eq!(lines[5], "A:");
        assert_eq!(lines.last().map(String::as_str), Some(SEPARATOR));
    }

    #[test]
    fn test_empty_section() {
        let tracker = DamageChangeTracker::new();
        assert_eq!(tracker.section_lines()[1], "  (none)");
    }
}
