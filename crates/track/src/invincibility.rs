//! Invincibility window timing.
//!
//! The derived predicate is the OR of every flag that prevents the hero from
//! taking damage. Time accumulates from the fixed-tick delta only while the
//! predicate holds, including the tick on which it turned on.

use crate::{Stamp, arena_or_unknown};

/// Windows longer than this get a standalone warning.
pub const INV_WARN_SECONDS: f64 = 2.6;

/// Hero damage handling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DamageMode {
    #[default]
    Full,
    NoDamage,
    IgnoreInvulnerable,
}

/// Hero state flags read from the host each fixed tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeroFlags {
    pub invulnerable: bool,
    pub global_invincible: bool,
    pub shadow_dashing: bool,
    pub damage_mode: DamageMode,
}

impl HeroFlags {
    pub fn should_be_invincible(&self) -> bool {
        self.invulnerable
            || self.global_invincible
            || self.shadow_dashing
            || matches!(
                self.damage_mode,
                DamageMode::NoDamage | DamageMode::IgnoreInvulnerable
            )
    }
}

/// Which edge was crossed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InvEdge {
    On,
    Off { seconds: f64 },
}

/// A crossed edge with its timeline line and, for long windows, a warning.
#[derive(Debug, Clone, PartialEq)]
pub struct InvEvent {
    pub edge: InvEdge,
    pub line: String,
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct InvincibilityTracker {
    invincible: bool,
    timer: f64,
}

impl InvincibilityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_invincible(&self) -> bool {
        self.invincible
    }

    /// Seconds accumulated in the current (or last) window.
    pub fn elapsed(&self) -> f64 {
        self.timer
    }

    /// Fixed-tick update. `roster` is the boss HP snapshot, e.g. `|900/1200`.
    pub fn update(
        &mut self,
        flags: Option<HeroFlags>,
        fixed_delta: f64,
        arena: &str,
        stamp: Stamp,
        roster: &str,
    ) -> Option<InvEvent> {
        let should = flags?.should_be_invincible();
        let mut event = None;

        if should && !self.invincible {
            self.timer = 0.0;
            event = Some(InvEvent {
                edge: InvEdge::On,
                line: format!("\u{a0}+{}{}|(INV ON)|", stamp.delta_ms, roster),
                warning: None,
            });
        } else if !should && self.invincible {
            let seconds = self.timer;
            let warning = (seconds > INV_WARN_SECONDS).then(|| {
                format!(
                    "|{}|+{}{}|(INV OFF, {:.3})",
                    arena_or_unknown(arena),
                    stamp.delta_ms,
                    roster,
                    seconds
                )
            });
            event = Some(InvEvent {
                edge: InvEdge::Off { seconds },
                line: format!(
                    "\u{a0}+{}{}|(INV OFF, {:.3})|",
                    stamp.delta_ms, roster, seconds
                ),
                warning,
            });
        }

        self.invincible = should;
        if self.invincible && fixed_delta.is_finite() && fixed_delta > 0.0 {
            self.timer += fixed_delta;
        }
        event
    }
}
