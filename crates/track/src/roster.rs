//! Boss roster: nearby health-bearing entities and their HP.
//!
//! Entities are addressed by stable integer handles issued by the host. The
//! roster never owns them; every poll asks the [`EntityProbe`] whether each
//! handle is still alive. Several handles can point at one underlying object,
//! so entries are unique by [`ObjectId`].

use crate::Stamp;

/// Host-issued handle to a health component.
pub type EntityHandle = u64;

/// Identity of the object a health component belongs to.
pub type ObjectId = u64;

/// Default number of updates between scans.
pub const ROSTER_SCAN_INTERVAL: u32 = 3;

/// Default scan radius in world units.
pub const ROSTER_SCAN_RADIUS: f32 = 50.0;

/// Live state of one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityState {
    pub object: ObjectId,
    pub hp: i32,
    pub dead: bool,
}

/// Liveness and lookup callbacks into the host.
pub trait EntityProbe {
    /// Handles of health-bearing entities within `radius` of the player.
    fn scan(&self, radius: f32) -> Vec<EntityHandle>;

    /// Current state, or `None` when the referent no longer exists.
    fn probe(&self, handle: EntityHandle) -> Option<EntityState>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RosterEntry {
    pub handle: EntityHandle,
    pub object: ObjectId,
    pub max_hp: i32,
    pub last_hp: i32,
}

#[derive(Debug, Clone)]
pub struct Roster {
    entries: Vec<RosterEntry>,
    scan_interval: u32,
    radius: f32,
    ticks: u32,
}

impl Default for Roster {
    fn default() -> Self {
        Self::new(ROSTER_SCAN_INTERVAL, ROSTER_SCAN_RADIUS)
    }
}

impl Roster {
    pub fn new(scan_interval: u32, radius: f32) -> Self {
        Self {
            entries: Vec::new(),
            scan_interval: scan_interval.max(1),
            radius,
            ticks: 0,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.ticks = 0;
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One boss-update poll. Returns a snapshot line when any HP changed.
    pub fn update(&mut self, probe: &dyn EntityProbe, stamp: Stamp) -> Option<String> {
        self.ticks += 1;
        if self.ticks >= self.scan_interval {
            self.ticks = 0;
            self.scan(probe);
        }

        let mut changed = false;
        let mut gone = Vec::new();
        for entry in &mut self.entries {
            match probe.probe(entry.handle) {
                Some(state) => {
                    if state.hp != entry.last_hp {
                        entry.last_hp = state.hp;
                        entry.max_hp = entry.max_hp.max(state.hp);
                        changed = true;
                    }
                    if state.dead || state.hp <= 0 {
                        gone.push(entry.handle);
                    }
                }
                None => gone.push(entry.handle),
            }
        }

        let line = changed.then(|| format!("\u{a0}+{}{}|", stamp.delta_ms, self.snapshot()));
        self.entries.retain(|e| !gone.contains(&e.handle));
        line
    }

    fn scan(&mut self, probe: &dyn EntityProbe) {
        for handle in probe.scan(self.radius) {
            if self.entries.iter().any(|e| e.handle == handle) {
                continue;
            }
            let Some(state) = probe.probe(handle) else {
                continue;
            };
            if state.dead || state.hp <= 0 {
                continue;
            }
            if self.entries.iter().any(|e| e.object == state.object) {
                continue;
            }
            // last_hp 0 so the first poll reports the newcomer.
            self.entries.push(RosterEntry {
                handle,
                object: state.object,
                max_hp: state.hp,
                last_hp: 0,
            });
        }
    }

    /// `|900/1200|40/40`, empty when no entries.
    pub fn snapshot(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("|{}/{}", e.last_hp, e.max_hp))
            .collect()
    }

    /// Combined max HP, saturating at `i32::MAX`.
    pub fn summed_max_hp(&self) -> Option<i32> {
        if self.entries.is_empty() {
            return None;
        }
        Some(self.entries.iter().fold(0i32, |sum, e| sum.saturating_add(e.max_hp)))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::*;

    #[derive(Default)]
    struct FakeProbe {
        nearby: Vec<EntityHandle>,
        states: RefCell<HashMap<EntityHandle, EntityState>>,
    }

    impl FakeProbe {
        fn with(entities: &[(EntityHandle, ObjectId, i32)]) -> Self {
            let probe = Self {
                nearby: entities.iter().map(|e| e.0).collect(),
                ..Default::default()
            };
            for &(handle, object, hp) in entities {
                probe.states.borrow_mut().insert(
                    handle,
                    EntityState {
                        object,
                        hp,
                        dead: false,
                    },
                );
            }
            probe
        }

        fn set_hp(&self, handle: EntityHandle, hp: i32) {
            if let Some(state) = self.states.borrow_mut().get_mut(&handle) {
                state.hp = hp;
            }
        }

        fn destroy(&self, handle: EntityHandle) {
            self.states.borrow_mut().remove(&handle);
        }
    }

    impl EntityProbe for FakeProbe {
        fn scan(&self, _radius: f32) -> Vec<EntityHandle> {
            self.nearby.clone()
        }

        fn probe(&self, handle: EntityHandle) -> Option<EntityState> {
            self.states.borrow().get(&handle).copied()
        }
    }

    fn stamp() -> Stamp {
        Stamp::new(0, 77)
    }

    #[test]
    fn test_scan_is_throttled() {
        let probe = FakeProbe::with(&[(1, 10, 500)]);
        let mut roster = Roster::new(3, 50.0);
        assert!(roster.update(&probe, stamp()).is_none());
        assert!(roster.update(&probe, stamp()).is_none());
        assert!(roster.is_empty());

        let line = roster.update(&probe, stamp());
        assert_eq!(line.as_deref(), Some("\u{a0}+77|500/500|"));
        assert_eq!(roster.entries().len(), 1);
    }

    #[test]
    fn test_dedup_by_object() {
        let probe = FakeProbe::with(&[(1, 10, 500), (2, 10, 500), (3, 11, 80)]);
        let mut roster = Roster::new(1, 50.0);
        roster.update(&probe, stamp());
        assert_eq!(roster.entries().len(), 2);
        assert_eq!(roster.snapshot(), "|500/500|80/80");
    }

    #[test]
    fn test_hp_change_checked_every_poll() {
        let probe = FakeProbe::with(&[(1, 10, 500)]);
        let mut roster = Roster::new(3, 50.0);
        for _ in 0..3 {
            roster.update(&probe, stamp());
        }
        probe.set_hp(1, 430);
        assert_eq!(
            roster.update(&probe, stamp()).as_deref(),
            Some("\u{a0}+77|430/500|")
        );
        assert!(roster.update(&probe, stamp()).is_none());
    }

    #[test]
    fn test_dead_entries_pruned_after_snapshot() {
        let probe = FakeProbe::with(&[(1, 10, 500), (2, 11, 80)]);
        let mut roster = Roster::new(1, 50.0);
        roster.update(&probe, stamp());

        probe.set_hp(2, 0);
        let line = roster.update(&probe, stamp());
        assert_eq!(line.as_deref(), Some("\u{a0}+77|500/500|0/80|"));
        assert_eq!(roster.entries().len(), 1);

        probe.destroy(1);
        roster.update(&probe, stamp());
        assert!(roster.is_empty());
    }

    #[test]
    fn test_non_positive_not_added() {
        let probe = FakeProbe::with(&[(1, 10, 0)]);
        let mut roster = Roster::new(1, 50.0);
        roster.update(&probe, stamp());
        assert!(roster.is_empty());
    }

    #[test]
    fn test_hp_metrics() {
        let probe = FakeProbe::with(&[(1, 10, 900), (2, 11, 650)]);
        let mut roster = Roster::new(1, 50.0);
        assert_eq!(roster.summed_max_hp(), None);
        roster.update(&probe, stamp());
        assert_eq!(roster.summed_max_hp(), Some(1550));
    }

    #[test]
    fn test_summed_hp_saturates() {
        let probe = FakeProbe::with(&[(1, 10, i32::MAX - 5), (2, 11, 400)]);
        let mut roster = Roster::new(1, 50.0);
        roster.update(&probe, stamp());
        assert_eq!(roster.entries().len(), 2);
        assert_eq!(roster.summed_max_hp(), Some(i32::MAX));
    }
}
