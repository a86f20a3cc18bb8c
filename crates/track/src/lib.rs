//! arenalog Event Trackers
//!
//! This crate turns polled or hooked game state into discrete log events.
//! Each tracker is a small state machine holding only what it needs to detect
//! a transition.
//!
//! # Architecture Constraints
//!
//! Trackers MUST NOT:
//! - Perform I/O (they return events and lines, the caller writes them)
//! - Read wall-clock time (every call receives a [`Stamp`])
//! - Read host state directly (values arrive as `Option`, `None` is a no-op)
//!
//! This keeps every tracker deterministic and testable with synthetic time.

#![deny(unsafe_code)]

pub mod damage;
pub mod invincibility;
pub mod loadout;
pub mod roster;
pub mod sequence;
pub mod special;
pub mod speed;
pub mod vitals;

pub use damage::{DamageChange, DamageChangeTracker};
pub use invincibility::{DamageMode, HeroFlags, InvEdge, InvEvent, InvincibilityTracker};
pub use loadout::{Charm, LoadoutTracker};
pub use roster::{EntityHandle, EntityProbe, EntityState, ObjectId, Roster, RosterEntry};
pub use sequence::{Advance, ArenaSequence, Pantheon, SequenceError};
pub use special::SpecialAttackTracker;
pub use speed::{SpeedEvent, SpeedTracker, SpeedWarning};
pub use vitals::{Resource, VitalsEvent, VitalsTracker};

// ============================================================================
// Shared Types
// ============================================================================

/// Milliseconds since the last scene transition.
pub type DeltaMs = i64;

/// Unix time in milliseconds.
pub type UnixMs = i64;

/// Time context handed to every tracker call.
///
/// `now_ms` measures durations inside a tracker. `delta_ms` is what gets
/// printed as `+{delta}` in log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stamp {
    pub now_ms: UnixMs,
    pub delta_ms: DeltaMs,
}

impl Stamp {
    pub fn new(now_ms: UnixMs, delta_ms: DeltaMs) -> Self {
        Self { now_ms, delta_ms }
    }
}

/// Section separator used throughout the log body.
pub const SEPARATOR: &str = "---------------------------------------------------";

/// Arena name substituted when none is known.
pub const UNKNOWN_ARENA: &str = "UnknownArena";

/// Return `arena`, or [`UNKNOWN_ARENA`] when empty.
pub fn arena_or_unknown(arena: &str) -> &str {
    if arena.is_empty() { UNKNOWN_ARENA } else { arena }
}
