//! Game-speed deviation tracking.
//!
//! A deviation window opens when the time scale leaves the default by at least
//! [`SPEED_TOLERANCE`]. A window held unchanged for [`SPEED_WARN_AFTER_MS`]
//! raises exactly one warning. Returning to the default closes the window.

use crate::{Stamp, UnixMs, arena_or_unknown};

/// Minimum scale difference that counts as a change.
pub const SPEED_TOLERANCE: f32 = 0.001;

/// Duration a deviation must persist before it is reported.
pub const SPEED_WARN_AFTER_MS: i64 = 3000;

/// A sustained speed deviation.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedWarning {
    pub arena: String,
    pub delta_ms: i64,
    pub default_scale: f32,
    pub current_scale: f32,
    pub duration_ms: i64,
}

impl SpeedWarning {
    fn transition(&self) -> String {
        format!(
            "Default {} -> {}|Duration {:.2}s",
            describe_scale(self.default_scale),
            describe_scale(self.current_scale),
            self.duration_ms as f64 / 1000.0
        )
    }

    /// Line written straight into the log timeline.
    pub fn inline_line(&self) -> String {
        format!("SpeedWarn|+{}|{}", self.delta_ms, self.transition())
    }

    /// Entry collected for the `SpeedWarn:` section.
    pub fn warning_entry(&self) -> String {
        format!(
            "|{}|+{}|{}",
            arena_or_unknown(&self.arena),
            self.delta_ms,
            self.transition()
        )
    }
}

/// Output of [`SpeedTracker::update`].
#[derive(Debug, Clone, PartialEq)]
pub enum SpeedEvent {
    /// Scale moved away from the last logged value.
    Changed { delta_ms: i64, scale: f32 },
    /// Deviation persisted past the threshold.
    Warn(SpeedWarning),
}

impl SpeedEvent {
    pub fn line(&self) -> String {
        match self {
            Self::Changed { delta_ms, scale } => {
                format!("GameSpeed|+{}|{}", delta_ms, describe_scale(*scale))
            }
            Self::Warn(warning) => warning.inline_line(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Deviation {
    started_ms: UnixMs,
    reference: f32,
    warned: bool,
}

/// Tracks time-scale deviation from a session default.
#[derive(Debug, Clone)]
pub struct SpeedTracker {
    default_scale: f32,
    last_logged: f32,
    deviation: Option<Deviation>,
    warnings: Vec<String>,
}

impl Default for SpeedTracker {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl SpeedTracker {
    pub fn new(default_scale: f32) -> Self {
        let default_scale = default_scale.max(0.0);
        Self {
            default_scale,
            last_logged: default_scale,
            deviation: None,
            warnings: Vec::new(),
        }
    }

    /// Re-seed with a new default, discarding the open window and pending warnings.
    pub fn reset(&mut self, default_scale: f32) {
        *self = Self::new(default_scale);
    }

    pub fn default_scale(&self) -> f32 {
        self.default_scale
    }

    /// Session-start baseline line.
    pub fn initial_line(&self, delta_ms: i64) -> String {
        format!(
            "GameSpeedStart|+{}|{}",
            delta_ms,
            describe_scale(self.default_scale)
        )
    }

    /// Poll the current time scale. `None` leaves all state untouched.
    pub fn update(&mut self, scale: Option<f32>, arena: &str, stamp: Stamp) -> Vec<SpeedEvent> {
        let Some(scale) = scale else {
            return Vec::new();
        };
        let scale = if scale.is_finite() { scale.max(0.0) } else { 0.0 };
        let mut events = Vec::new();

        if (scale - self.last_logged).abs() >= SPEED_TOLERANCE {
            self.last_logged = scale;
            events.push(SpeedEvent::Changed {
                delta_ms: stamp.delta_ms,
                scale,
            });
        }

        if (scale - self.default_scale).abs() < SPEED_TOLERANCE {
            self.deviation = None;
            return events;
        }

        let mut window = match self.deviation {
            Some(d) if (scale - d.reference).abs() < SPEED_TOLERANCE => d,
            _ => Deviation {
                started_ms: stamp.now_ms,
                reference: scale,
                warned: false,
            },
        };

        let held_ms = stamp.now_ms - window.started_ms;
        if !window.warned && held_ms >= SPEED_WARN_AFTER_MS {
            window.warned = true;
            let warning = SpeedWarning {
                arena: arena.to_string(),
                delta_ms: stamp.delta_ms,
                default_scale: self.default_scale,
                current_scale: scale,
                duration_ms: held_ms,
            };
            self.warnings.push(warning.warning_entry());
            events.push(SpeedEvent::Warn(warning));
        }
        self.deviation = Some(window);

        events
    }

    /// Pending warning entries not yet moved into a section.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }
}

/// `150% (1.500)`
pub fn describe_scale(scale: f32) -> String {
    format!("{:.0}% ({:.3})", scale * 100.0, scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warns(events: &[SpeedEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, SpeedEvent::Warn(_)))
            .count()
    }

    #[test]
    fn test_no_warning_before_threshold() {
        let mut tracker = SpeedTracker::new(1.0);
        let start = 10_000;
        assert_eq!(warns(&tracker.update(Some(1.5), "A", Stamp::new(start, 0))), 0);
        let events = tracker.update(Some(1.5), "A", Stamp::new(start + 2_999, 2_999));
        assert_eq!(warns(&events), 0);
        assert!(tracker.warnings().is_empty());
    }

    #[test]
    fn test_single_warning_at_threshold() {
        let mut tracker = SpeedTracker::new(1.0);
        let start = 10_000;
        tracker.update(Some(1.5), "GG_Hornet_2", Stamp::new(start, 0));
        let events = tracker.update(Some(1.5), "GG_Hornet_2", Stamp::new(start + 3_000, 3_000));
        assert_eq!(warns(&events), 1);

        let again = tracker.update(Some(1.5), "GG_Hornet_2", Stamp::new(start + 5_000, 5_000));
        assert_eq!(warns(&again), 0);
        assert_eq!(tracker.warnings().len(), 1);
        assert_eq!(
            tracker.warnings()[0],
            "|GG_Hornet_2|+3000|Default 100% (1.000) -> 150% (1.500)|Duration 3.00s"
        );
    }

    #[test]
    fn test_inline_warning_format() {
        let warning = SpeedWarning {
            arena: String::new(),
            delta_ms: 4200,
            default_scale: 1.0,
            current_scale: 0.5,
            duration_ms: 3250,
        };
        assert_eq!(
            warning.inline_line(),
            "SpeedWarn|+4200|Default 100% (1.000) -> 50% (0.500)|Duration 3.25s"
        );
        assert!(warning.warning_entry().starts_with("|UnknownArena|+4200|"));
    }

    #[test]
    fn test_change_in_scale_restarts_window() {
        let mut tracker = SpeedTracker::new(1.0);
        tracker.update(Some(1.5), "A", Stamp::new(0, 0));
        tracker.update(Some(2.0), "A", Stamp::new(2_000, 0));
        let events = tracker.update(Some(2.0), "A", Stamp::new(3_500, 0));
        assert_eq!(warns(&events), 0);
        let events = tracker.update(Some(2.0), "A", Stamp::new(5_000, 0));
        assert_eq!(warns(&events), 1);
    }

    #[test]
    fn test_return_to_default_resets() {
        let mut tracker = SpeedTracker::new(1.0);
        tracker.update(Some(1.5), "A", Stamp::new(0, 0));
        tracker.update(Some(1.5), "A", Stamp::new(3_000, 0));
        tracker.update(Some(1.0005), "A", Stamp::new(3_100, 0));

        // New window after reset warns again.
        tracker.update(Some(1.5), "A", Stamp::new(4_000, 0));
        let events = tracker.update(Some(1.5), "A", Stamp::new(7_000, 0));
        assert_eq!(warns(&events), 1);
        assert_eq!(tracker.warnings().len(), 2);
    }

    #[test]
    fn test_change_events_follow_last_logged() {
        let mut tracker = SpeedTracker::new(1.0);
        let events = tracker.update(Some(1.0), "A", Stamp::new(0, 0));
        assert!(events.is_empty());

        let events = tracker.update(Some(0.8), "A", Stamp::new(10, 10));
        assert_eq!(
            events,
            vec![SpeedEvent::Changed {
                delta_ms: 10,
                scale: 0.8
            }]
        );
        assert_eq!(events[0].line(), "GameSpeed|+10|80% (0.800)");

        // Within tolerance of the last logged value: no change event.
        let events = tracker.update(Some(0.8005), "A", Stamp::new(20, 20));
        assert!(events.is_empty());

        // Back to default is a change too.
        let events = tracker.update(Some(1.0), "A", Stamp::new(30, 30));
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_unknown_scale_is_noop() {
        let mut tracker = SpeedTracker::new(1.0);
        tracker.update(Some(1.5), "A", Stamp::new(0, 0));
        assert!(tracker.update(None, "A", Stamp::new(3_000, 0)).is_empty());
        assert_eq!(warns(&tracker.update(Some(1.5), "A", Stamp::new(3_001, 0))), 1);
    }

    #[test]
    fn test_initial_line() {
        let tracker = SpeedTracker::new(1.0);
        assert_eq!(tracker.initial_line(0), "GameSpeedStart|+0|100% (1.000)");
    }

    #[test]
    fn test_take_warnings_drains() {
        let mut tracker = SpeedTracker::new(1.0);
        tracker.update(Some(3.0), "A", Stamp::new(0, 0));
        tracker.update(Some(3.0), "A", Stamp::new(3_000, 0));
        assert_eq!(tracker.take_warnings().len(), 1);
        assert!(tracker.warnings().is_empty());
    }
}
