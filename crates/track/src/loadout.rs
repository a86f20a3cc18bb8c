//! Equipped-charm loadout: session header line and mid-session change log.

use std::collections::HashSet;

use crate::{SEPARATOR, Stamp, arena_or_unknown};

/// An equipped charm. `cost` is negative when unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Charm {
    pub id: i32,
    pub name: String,
    pub cost: i32,
}

impl Charm {
    fn display(&self) -> String {
        if self.name.trim().is_empty() {
            format!("Charm {}", self.id)
        } else {
            self.name.clone()
        }
    }
}

/// Header line listing the loadout, e.g.
/// `\nEquipped charms => Quick Slash (3), Unbreakable Strength (3) | Total Cost: 6\n`.
///
/// Names are listed once each. Bound-charm runs replace the cost summary.
pub fn equipped_line(charms: &[Charm], bound: bool) -> String {
    let mut seen = HashSet::new();
    let mut parts = Vec::new();
    let mut total = 0;
    for charm in charms {
        let name = charm.display();
        if !seen.insert(name.clone()) {
            continue;
        }
        if charm.cost >= 0 {
            total += charm.cost;
            parts.push(format!("{} ({})", name, charm.cost));
        } else {
            parts.push(name);
        }
    }

    let mut line = String::from("\nEquipped charms => ");
    line.push_str(&parts.join(", "));
    if bound {
        if !parts.is_empty() {
            line.push_str(", ");
        }
        line.push_str(" => BOUND CHARMS");
    } else if !parts.is_empty() {
        line.push_str(&format!(" | Total Cost: {total}"));
    }
    line.push('\n');
    line
}

/// Diffs the equipped set on every poll.
#[derive(Debug, Clone, Default)]
pub struct LoadoutTracker {
    equipped: Option<Vec<Charm>>,
    changes: Vec<String>,
}

impl LoadoutTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget changes and seed with the current loadout.
    pub fn reset(&mut self, current: Option<&[Charm]>) {
        self.changes.clear();
        self.equipped = current.map(<[Charm]>::to_vec);
    }

    pub fn changes(&self) -> &[String] {
        &self.changes
    }

    /// Returns the inline timeline lines for this poll.
    pub fn update(&mut self, current: Option<&[Charm]>, arena: &str, stamp: Stamp) -> Vec<String> {
        let Some(current) = current else {
            return Vec::new();
        };
        let Some(previous) = self.equipped.replace(current.to_vec()) else {
            return Vec::new();
        };

        let arena = arena_or_unknown(arena);
        let was: HashSet<i32> = previous.iter().map(|c| c.id).collect();
        let now: HashSet<i32> = current.iter().map(|c| c.id).collect();

        let mut actions = Vec::new();
        for charm in current.iter().filter(|c| !was.contains(&c.id)) {
            actions.push(format!("Equipped {}", charm.display()));
        }
        for charm in previous.iter().filter(|c| !now.contains(&c.id)) {
            actions.push(format!("Unequipped {}", charm.display()));
        }

        let mut inline = Vec::with_capacity(actions.len());
        for action in actions {
            self.changes
                .push(format!("|{}|+{}|{}", arena, stamp.delta_ms, action));
            inline.push(format!("Charms|{}|+{}|{}", arena, stamp.delta_ms, action));
        }
        inline
    }

    pub fn section_lines(&self) -> Vec<String> {
        let mut lines = vec!["Charms:".to_string()];
        if self.changes.is_empty() {
            lines.push("  (no changes)".to_string());
        } else {
            lines.extend(self.changes.iter().cloned());
        }
        lines.push(String::new());
        lines.push(SEPARATOR.to_string());
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn charm(id: i32, name: &str, cost: i32) -> Charm {
        Charm {
            id,
            name: name.to_string(),
            cost,
        }
    }

    #[test]
    fn test_equipped_line_with_costs() {
        let charms = [
            charm(32, "Quick Slash", 3),
            charm(25, "Unbreakable Strength", 3),
            charm(25, "Unbreakable Strength", 3),
            charm(99, "Custom", -1),
        ];
        assert_eq!(
            equipped_line(&charms, false),
            "\nEquipped charms => Quick Slash (3), Unbreakable Strength (3), Custom | Total Cost: 6\n"
        );
    }

    #[test]
    fn test_equipped_line_bound() {
        assert_eq!(
            equipped_line(&[], true),
            "\nEquipped charms =>  => BOUND CHARMS\n"
        );
    }

    #[test]
    fn test_first_poll_seeds() {
        let mut tracker = LoadoutTracker::new();
        let current = [charm(1, "A", 1)];
        assert!(tracker.update(Some(&current), "X", Stamp::new(0, 0)).is_empty());
        assert!(tracker.changes().is_empty());
    }

    #[test]
    fn test_equip_and_unequip() {
        let mut tracker = LoadoutTracker::new();
        tracker.reset(Some(&[charm(1, "Grubsong", 1)]));

        let inline = tracker.update(Some(&[charm(2, "Dashmaster", 2)]), "GG_Sly", Stamp::new(0, 300));
        assert_eq!(
            inline,
            vec![
                "Charms|GG_Sly|+300|Equipped Dashmaster".to_string(),
                "Charms|GG_Sly|+300|Unequipped Grubsong".to_string(),
            ]
        );
        assert_eq!(tracker.changes()[0], "|GG_Sly|+300|Equipped Dashmaster");
    }

    #[test]
    fn test_section_lines() {
        let tracker = LoadoutTracker::new();
        assert_eq!(
            tracker.section_lines(),
            vec![
                "Charms:".to_string(),
                "  (no changes)".to_string(),
                String::new(),
                SEPARATOR.to_string()
            ]
        );
    }
}
