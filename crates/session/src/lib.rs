//! arenalog Session Recorder
//!
//! The recorder turns host callbacks into one encrypted log per boss
//! gauntlet attempt. It owns:
//! - The process-wide session state machine (`Idle` / `Recording`)
//! - Start and stop gates, arena sequence validation and attempt counting
//! - Tracker dispatch and section buffering
//! - Report assembly, storage planning and the final file move
//!
//! # Architecture
//!
//! Host-facing entry points never return errors and never panic into the
//! host: failures are logged with `tracing` and the session either continues
//! or is finalized. Every finalize, including forced ones, takes the session
//! out of the recorder first, so the recorder is `Idle` afterwards no matter
//! how far the report got.

#![deny(unsafe_code)]

pub mod config;
pub mod gate;
pub mod host;
pub mod keylog;
pub mod planner;
pub mod report;
pub mod session;
pub mod timefmt;

use std::fs;
use std::io;
use std::path::Path;

use arenalog_journal::{AsyncLogWriter, JournalError, LineCipher};
use arenalog_track::sequence::{BOSS_DOOR_SCENE, RADIANCE_SCENE, door_pantheon_starting_with, is_skip_scene};
use arenalog_track::ArenaSequence;
use thiserror::Error;

pub use config::{ConcurrentStartPolicy, ConfigError, RecorderConfig};
pub use gate::{Gate, start_gate};
pub use host::{
    Clock, EventSource, HostEvent, HostStateReader, KeyTransition, ModInventory, Notifier,
    QuitReason, SavedLog, SettingsSource, SystemClock,
};
pub use planner::{Bucket, HpLedger, PlanInput, PlanTracker, SettingsSnapshot, StoragePlan, plan};
pub use session::{Session, SessionMode};

use keylog::key_line;
use report::ReportContext;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("journal error: {0}")]
    Journal(#[from] JournalError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, SessionError>;

// ============================================================================
// Stop Reason
// ============================================================================

/// Why a session was finalized. Written as the report's `EndReason`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Hall of Gods arena left.
    LeftArena,
    /// Pantheon end scene reached.
    EndSequence,
    /// Final Radiance cutscene began.
    RadianceCutscene,
    /// Transition rejected by the bound sequence.
    InvalidTransition,
    /// Replaced by a new session.
    Superseded,
    Quit(QuitReason),
    /// Event source torn down.
    Detached,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LeftArena => "LeftArena",
            Self::EndSequence => "EndSequence",
            Self::RadianceCutscene => "RadianceCutscene",
            Self::InvalidTransition => "InvalidTransition",
            Self::Superseded => "Superseded",
            Self::Quit(reason) => reason.as_str(),
            Self::Detached => "Detached",
        }
    }
}

enum Step {
    Continue,
    Stop(StopReason),
}

// ============================================================================
// Recorder
// ============================================================================

/// Host collaborators handed to [`Recorder::new`].
pub struct Collaborators {
    pub host: Box<dyn HostStateReader>,
    pub settings: Box<dyn SettingsSource>,
    pub mods: Box<dyn ModInventory>,
    pub notifier: Box<dyn Notifier>,
    pub clock: Box<dyn Clock>,
}

pub struct Recorder {
    config: RecorderConfig,
    host: Box<dyn HostStateReader>,
    settings: Box<dyn SettingsSource>,
    mods: Box<dyn ModInventory>,
    notifier: Box<dyn Notifier>,
    clock: Box<dyn Clock>,
    session: Option<Session>,
    hp: HpLedger,
    /// Target of the last transition, used when the host omits `previous`.
    last_scene: String,
}

impl Recorder {
    pub fn new(config: RecorderConfig, collaborators: Collaborators) -> Self {
        Self {
            config,
            host: collaborators.host,
            settings: collaborators.settings,
            mods: collaborators.mods,
            notifier: collaborators.notifier,
            clock: collaborators.clock,
            session: None,
            hp: HpLedger::new(),
            last_scene: String::new(),
        }
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    pub fn is_recording(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn hp_ledger(&self) -> &HpLedger {
        &self.hp
    }

    /// Dispatch one host event.
    pub fn handle(&mut self, event: HostEvent) {
        match event {
            HostEvent::SceneTransition { previous, target } => {
                self.on_scene_transition(&previous, &target)
            }
            HostEvent::SceneLoaded => self.on_scene_loaded(),
            HostEvent::Frame { keys } => self.on_frame(&keys),
            HostEvent::FixedTick { delta } => self.on_fixed_tick(delta),
            HostEvent::BossUpdate => self.on_boss_update(),
            HostEvent::Hit {
                owner,
                damage,
                multiplier,
            } => self.on_hit(&owner, damage, multiplier),
            HostEvent::SpecialAttack { target, damage } => self.on_special_attack(&target, damage),
            HostEvent::BossHpDetected { scene, hp } => self.on_boss_hp_detected(&scene, hp),
            HostEvent::SequenceCompleted => self.on_sequence_completed(),
            HostEvent::Quit(reason) => self.on_quit(reason),
        }
    }

    /// Dispatch every pending event. Returns how many were handled.
    pub fn drain(&mut self, source: &mut dyn EventSource) -> usize {
        let mut handled = 0;
        while let Some(event) = source.poll_event() {
            self.handle(event);
            handled += 1;
        }
        handled
    }

    /// Drain, finalize any running session and unsubscribe.
    pub fn detach(&mut self, source: &mut dyn EventSource) {
        self.drain(source);
        self.finalize(StopReason::Detached);
        source.unsubscribe();
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    pub fn on_scene_transition(&mut self, previous: &str, target: &str) {
        let previous = if previous.is_empty() {
            std::mem::take(&mut self.last_scene)
        } else {
            previous.to_string()
        };
        self.last_scene = target.to_string();
        let now = self.clock.now_unix_ms();
        let gate = start_gate(&previous, target);

        if self.session.is_none() {
            if let Some(gate) = gate {
                self.start(gate, &previous, target, now);
            }
            return;
        }

        match self.advance(&previous, target, now) {
            Step::Stop(reason) => {
                self.finalize(reason);
                if let Some(gate) = gate {
                    self.start(gate, &previous, target, now);
                }
            }
            Step::Continue => {
                let Some(gate) = gate else {
                    return;
                };
                if self.is_same_lobby(gate) {
                    return;
                }
                match self.config.concurrent_start {
                    ConcurrentStartPolicy::ForceClose => {
                        tracing::info!(target_scene = target, "new session supersedes running one");
                        self.finalize(StopReason::Superseded);
                        self.start(gate, &previous, target, now);
                    }
                    ConcurrentStartPolicy::Reject => {
                        tracing::info!(target_scene = target, "session already recording, start rejected");
                    }
                }
            }
        }
    }

    /// An unbound pantheon session re-entering the boss door.
    fn is_same_lobby(&self, gate: Gate) -> bool {
        matches!(
            (gate, self.session.as_ref()),
            (Gate::Pantheon { bound: None }, Some(s)) if s.mode == SessionMode::Pantheon && s.sequence.is_none()
        )
    }

    /// Apply a transition to the running session.
    fn advance(&mut self, previous: &str, target: &str, now: i64) -> Step {
        let play_time = self.host.play_time();
        let Some(session) = self.session.as_mut() else {
            return Step::Continue;
        };
        session.last_transition_ms = now;

        match session.mode {
            SessionMode::HallOfGods => {
                if target != session.active_arena {
                    return Step::Stop(StopReason::LeftArena);
                }
                Step::Continue
            }
            SessionMode::Pantheon => {
                if gate::is_pantheon_terminal(target) {
                    return Step::Stop(StopReason::EndSequence);
                }
                let accepted = match session.sequence.as_mut() {
                    Some(sequence) => match sequence.advance(target) {
                        Ok(_) => true,
                        Err(err) => {
                            tracing::warn!(
                                sequence = sequence.name(),
                                error = %err,
                                "invalid pantheon transition"
                            );
                            return Step::Stop(StopReason::InvalidTransition);
                        }
                    },
                    None => {
                        if previous.contains(BOSS_DOOR_SCENE)
                            && let Some(pantheon) = door_pantheon_starting_with(target)
                        {
                            tracing::debug!(pantheon = pantheon.name, "pantheon bound");
                            session.sequence = Some(ArenaSequence::from_pantheon(pantheon));
                        }
                        // Unbound runs count every arena; the lobby itself never counts.
                        !target.contains(BOSS_DOOR_SCENE)
                    }
                };
                if accepted {
                    session.active_arena = target.to_string();
                    if !is_skip_scene(target) {
                        session.start_marker(now, play_time);
                    }
                }
                Step::Continue
            }
        }
    }

    // ------------------------------------------------------------------------
    // Start
    // ------------------------------------------------------------------------

    fn start(&mut self, gate: Gate, previous: &str, target: &str, now: i64) {
        match self.open_session(gate, previous, target, now) {
            Ok(session) => {
                tracing::info!(
                    mode = session.mode.as_str(),
                    arena = target,
                    path = %session.temp_path.display(),
                    "session started"
                );
                self.session = Some(session);
                self.replan();
            }
            Err(err) => {
                tracing::error!(arena = target, error = %err, reason = "InitFailed", "session start failed");
            }
        }
    }

    fn open_session(&self, gate: Gate, previous: &str, target: &str, now: i64) -> Result<Session> {
        fs::create_dir_all(&self.config.temp_dir)?;
        let cipher = LineCipher::generate(now);
        let temp_path = self
            .config
            .temp_dir
            .join(format!("arenalog-{}.log", cipher.session_id()));
        let writer = AsyncLogWriter::create(&temp_path, cipher, self.config.writer_config())?;

        let (mode, sequence) = match gate {
            Gate::Pantheon { bound } => (SessionMode::Pantheon, bound.map(ArenaSequence::from_pantheon)),
            Gate::HallOfGods => (SessionMode::HallOfGods, None),
        };
        let host = self.host.as_ref();
        let mut session = Session::new(mode, previous, target, sequence, writer, host, &self.config, now);
        session.write_header(host, &self.settings.snapshot(), &self.mods.snapshot_lines());
        if mode == SessionMode::HallOfGods || session.sequence.is_some() {
            session.start_marker(now, host.play_time());
        }
        session.write_speed_baseline();
        Ok(session)
    }

    // ------------------------------------------------------------------------
    // Per-Frame Hooks
    // ------------------------------------------------------------------------

    pub fn on_scene_loaded(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.trackers.roster.clear();
        }
    }

    pub fn on_frame(&mut self, keys: &[KeyTransition]) {
        let radiance_ended = self.session.as_ref().is_some_and(|s| {
            s.mode == SessionMode::Pantheon && s.active_arena == RADIANCE_SCENE
        }) && self.host.in_cutscene();
        if radiance_ended {
            self.finalize(StopReason::RadianceCutscene);
            return;
        }

        let now = self.clock.now_unix_ms();
        let host = self.host.as_ref();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let stamp = session.stamp(now);
        if session.mode == SessionMode::HallOfGods && session.observe_delta(stamp.delta_ms) {
            session.begin_attempt(now, host.play_time());
        }
        let arena = session.active_arena.clone();

        let speed = session.trackers.speed.update(host.time_scale(), &arena, stamp);
        for event in &speed {
            session.emit(&event.line());
        }
        let vitals = session
            .trackers
            .vitals
            .update(host.health(), host.lifeblood(), &arena, stamp);
        for event in &vitals {
            session.emit(&event.inline_line());
        }
        let charms = host.equipped_charms();
        for line in session.trackers.loadout.update(charms.as_deref(), &arena, stamp) {
            session.emit(&line);
        }
        session.collect_warnings();

        if !keys.is_empty() {
            if let Some(dt) = host.unscaled_delta().filter(|dt| *dt > 0.0) {
                session.fps = 1.0 / dt;
            }
            let watermark = host.watermark().unwrap_or_default();
            for key in keys {
                session
                    .key_log
                    .push(key_line(stamp.delta_ms, key, watermark, session.fps));
            }
        }
        session.flush_keys(now, false);
    }

    pub fn on_fixed_tick(&mut self, delta: f64) {
        let now = self.clock.now_unix_ms();
        let host = self.host.as_ref();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let stamp = session.stamp(now);
        let roster = session.trackers.roster.snapshot();
        let event = session.trackers.invincibility.update(
            host.hero_flags(),
            delta,
            &session.active_arena,
            stamp,
            &roster,
        );
        if let Some(event) = event {
            session.sections.damage_inv.add(event.line);
            if let Some(warning) = event.warning {
                session.sections.inv_warnings.add(warning);
            }
        }
    }

    pub fn on_boss_update(&mut self) {
        let now = self.clock.now_unix_ms();
        let host = self.host.as_ref();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.boss_level.is_none() {
            session.boss_level = host.boss_level();
        }
        let stamp = session.stamp(now);
        if let Some(line) = session.trackers.roster.update(host, stamp) {
            session.sections.damage_inv.add(line);
        }
        if session.mode != SessionMode::HallOfGods {
            return;
        }
        let arena = session.active_arena.clone();
        for entry in session.trackers.roster.entries() {
            self.hp.observe(&arena, entry.max_hp);
        }
        if let Some(sum) = session.trackers.roster.summed_max_hp() {
            self.hp.observe_sum(&arena, sum);
        }
        if self.hp.is_waiting(&arena) {
            self.replan();
        }
    }

    pub fn on_hit(&mut self, owner: &str, damage: i32, multiplier: f32) {
        let now = self.clock.now_unix_ms();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let stamp = session.stamp(now);
        session
            .trackers
            .damage
            .track(owner, &session.active_arena, stamp, damage, multiplier);
    }

    pub fn on_special_attack(&mut self, target: &str, damage: i32) {
        let now = self.clock.now_unix_ms();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let stamp = session.stamp(now);
        let line = session
            .trackers
            .special
            .track(target, &session.active_arena, stamp, damage);
        if let Some(line) = line {
            session.emit(&line);
        }
    }

    pub fn on_boss_hp_detected(&mut self, scene: &str, hp: i32) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if session.mode != SessionMode::HallOfGods {
            return;
        }
        let current = session.active_arena == scene;
        self.hp.observe(scene, hp);
        if current {
            self.replan();
        }
    }

    pub fn on_sequence_completed(&mut self) {
        if let Some(session) = self.session.as_mut()
            && session.mode == SessionMode::Pantheon
        {
            session.completed = true;
        }
    }

    pub fn on_quit(&mut self, reason: QuitReason) {
        self.finalize(StopReason::Quit(reason));
    }

    // ------------------------------------------------------------------------
    // Planning
    // ------------------------------------------------------------------------

    /// Recompute the Hall of Gods plan from current settings and HP.
    fn replan(&mut self) {
        let settings = self.settings.snapshot();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.mode != SessionMode::HallOfGods {
            return;
        }
        let arena = session.active_arena.as_str();
        let plan = planner::plan(&PlanInput {
            arena,
            previous_scene: &session.lobby_scene,
            settings: &settings,
            hp: self.hp.best_for(arena),
            boss_level: session.boss_level,
        });
        self.hp.set_waiting(arena, plan.needs_hp);
        if session.plan.update(plan) {
            tracing::debug!(arena, is_final = session.plan.is_final(), "storage plan updated");
        }
    }

    fn final_plan(&self, session: &Session) -> StoragePlan {
        match session.mode {
            SessionMode::Pantheon => planner::plan_pantheon(session.sequence_name(), session.completed),
            SessionMode::HallOfGods => match session.plan.current() {
                Some(plan) => plan.clone(),
                None => planner::plan(&PlanInput {
                    arena: &session.active_arena,
                    previous_scene: &session.lobby_scene,
                    settings: &self.settings.snapshot(),
                    hp: self.hp.best_for(&session.active_arena),
                    boss_level: session.boss_level,
                }),
            },
        }
    }

    // ------------------------------------------------------------------------
    // Finalize
    // ------------------------------------------------------------------------

    /// Finalize the running session, if any. The recorder is `Idle`
    /// afterwards even when a step fails.
    pub fn finalize(&mut self, reason: StopReason) {
        self.replan();
        let Some(mut session) = self.session.take() else {
            return;
        };
        let now = self.clock.now_unix_ms();
        let settings = self.settings.snapshot();
        let mods = self.mods.snapshot_lines();
        let plan = self.final_plan(&session);

        report::write_report(
            &mut session,
            &ReportContext {
                end_unix_ms: now,
                end_realtime: self.host.realtime_since_startup(),
                reason: reason.as_str(),
                settings: &settings,
                mods: &mods,
                plan: &plan,
            },
        );

        match session.close() {
            Ok(stats) => match self.place(&session, &plan) {
                Ok(saved) => {
                    tracing::info!(
                        reason = reason.as_str(),
                        lines = stats.lines_written,
                        dropped = stats.dropped_lines,
                        path = %saved.path.display(),
                        "session saved"
                    );
                    self.notifier.log_saved(&saved);
                }
                Err(err) => tracing::error!(
                    path = %session.temp_path.display(),
                    error = %err,
                    "failed to move session log"
                ),
            },
            Err(err) => tracing::error!(
                path = %session.temp_path.display(),
                error = %err,
                "session log did not close cleanly, leaving it in place"
            ),
        }

        self.hp.reset(&session.active_arena);
    }

    fn place(&self, session: &Session, plan: &StoragePlan) -> Result<SavedLog> {
        let file_name = plan.bucket.file_name(session.start_unix_ms);
        let path = plan.bucket.file_path(&self.config.output_dir, session.start_unix_ms);
        move_file(&session.temp_path, &path)?;
        Ok(SavedLog {
            bucket_label: plan.bucket.bucket_label.clone(),
            file_name,
            path,
        })
    }
}

/// Move `from` to `to`, replacing any existing file. Falls back to copy and
/// delete across filesystems.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    if to.exists() {
        fs::remove_file(to)?;
    }
    if fs::rename(from, to).is_err() {
        fs::copy(from, to)?;
        fs::remove_file(from)?;
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
