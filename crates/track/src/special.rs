//! Special-attack (Flukenest) damage log.

use crate::{SEPARATOR, Stamp, arena_or_unknown};

/// Logs the special attack's damage whenever it changes.
#[derive(Debug, Clone, Default)]
pub struct SpecialAttackTracker {
    last_damage: Option<i32>,
    entries: Vec<String>,
}

impl SpecialAttackTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Record one damage instance. Returns the new entry when the value changed.
    pub fn track(&mut self, target: &str, arena: &str, stamp: Stamp, damage: i32) -> Option<String> {
        if self.last_damage == Some(damage) {
            return None;
        }
        self.last_damage = Some(damage);
        let entry = format!(
            "Flukenest: {}-{}/{} #{}",
            target,
            arena_or_unknown(arena),
            stamp.delta_ms,
            damage
        );
        self.entries.push(entry.clone());
        Some(entry)
    }

    pub fn section_lines(&self) -> Vec<String> {
        let mut lines = vec!["Flukenest:".to_string()];
        if self.entries.is_empty() {
            lines.push("  (none)".to_string());
        } else {
            lines.extend(self.entries.iter().map(|e| format!("  {e}")));
        }
        lines.push(String::new());
        lines.push(SEPARATOR.to_string());
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logs_only_on_change() {
        let mut tracker = SpecialAttackTracker::new();
        let stamp = Stamp::new(0, 15);
        assert_eq!(
            tracker.track("Mawlek Body", "GG_Brooding_Mawlek", stamp, 4).as_deref(),
            Some("Flukenest: Mawlek Body-GG_Brooding_Mawlek/15 #4")
        );
        assert!(tracker.track("Mawlek Body", "GG_Brooding_Mawlek", stamp, 4).is_none());
        assert!(tracker.track("Mawlek Body", "GG_Brooding_Mawlek", stamp, 5).is_some());
        assert_eq!(tracker.entries().len(), 2);
    }

    #[test]
    fn test_section_lines() {
        let mut tracker = SpecialAttackTracker::new();
        assert_eq!(tracker.section_lines()[1], "  (none)");
        tracker.track("T", "", Stamp::new(0, 1), 9);
        let lines = tracker.section_lines();
        assert_eq!(lines[1], "  Flukenest: T-UnknownArena/1 #9");
        assert_eq!(lines[3], SEPARATOR);
    }
}
