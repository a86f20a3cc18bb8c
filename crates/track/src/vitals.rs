//! Hit and heal tracking for health and lifeblood.

use crate::{Stamp, arena_or_unknown};

/// Which resource changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Health,
    Lifeblood,
}

impl Resource {
    fn tag(self) -> &'static str {
        match self {
            Self::Health => "",
            Self::Lifeblood => "Lifeblood|",
        }
    }
}

/// A health or lifeblood transition.
#[derive(Debug, Clone, PartialEq)]
pub struct VitalsEvent {
    pub resource: Resource,
    pub arena: String,
    pub delta_ms: i64,
    pub previous: i32,
    pub current: i32,
}

impl VitalsEvent {
    pub fn is_hit(&self) -> bool {
        self.current < self.previous
    }

    fn kind(&self) -> &'static str {
        if self.is_hit() { "HitWarn" } else { "Heal" }
    }

    fn body(&self) -> String {
        let change = self.current - self.previous;
        format!(
            "{}->{}|{:+} mask(s)",
            self.previous, self.current, change
        )
    }

    /// `HitWarn|+120|5->4|-1 mask(s)`
    pub fn inline_line(&self) -> String {
        format!(
            "{}|{}+{}|{}",
            self.kind(),
            self.resource.tag(),
            self.delta_ms,
            self.body()
        )
    }

    /// `|GG_Hornet_1|+120|HitWarn|5->4|-1 mask(s)`
    pub fn warning_entry(&self) -> String {
        format!(
            "|{}|+{}|{}|{}{}",
            arena_or_unknown(&self.arena),
            self.delta_ms,
            self.kind(),
            self.resource.tag(),
            self.body()
        )
    }
}

/// Tracks the last seen health and lifeblood values.
#[derive(Debug, Clone, Default)]
pub struct VitalsTracker {
    health: Option<i32>,
    lifeblood: Option<i32>,
    warnings: Vec<String>,
}

impl VitalsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Poll both resources. The first observation of each only seeds state.
    pub fn update(
        &mut self,
        health: Option<i32>,
        lifeblood: Option<i32>,
        arena: &str,
        stamp: Stamp,
    ) -> Vec<VitalsEvent> {
        let mut events = Vec::new();
        for (resource, value) in [(Resource::Health, health), (Resource::Lifeblood, lifeblood)] {
            let Some(current) = value else {
                continue;
            };
            let slot = match resource {
                Resource::Health => &mut self.health,
                Resource::Lifeblood => &mut self.lifeblood,
            };
            let previous = slot.replace(current);
            if let Some(previous) = previous
                && previous != current
            {
                let event = VitalsEvent {
                    resource,
                    arena: arena.to_string(),
                    delta_ms: stamp.delta_ms,
                    previous,
                    current,
                };
                self.warnings.push(event.warning_entry());
                events.push(event);
            }
        }
        events
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }
}
