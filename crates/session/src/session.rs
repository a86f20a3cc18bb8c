//! State of one recording session.

use std::path::{Path, PathBuf};

use arenalog_journal::{AsyncLogWriter, BufferedLogSection, JournalError, LineSink, WriterStats};
use arenalog_track::loadout::equipped_line;
use arenalog_track::{
    ArenaSequence, DamageChangeTracker, InvincibilityTracker, LoadoutTracker, Roster, SEPARATOR,
    SpecialAttackTracker, SpeedTracker, Stamp, VitalsTracker,
};

use crate::config::RecorderConfig;
use crate::host::HostStateReader;
use crate::keylog::KeyLog;
use crate::planner::{PlanTracker, SettingsSnapshot};
use crate::timefmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    Pantheon,
    HallOfGods,
}

impl SessionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pantheon => "Pantheon",
            Self::HallOfGods => "HallOfGods",
        }
    }
}

/// Report sections buffered during a session.
#[derive(Debug)]
pub struct Sections {
    /// Invincibility edges and roster HP timeline.
    pub damage_inv: BufferedLogSection,
    pub inv_warnings: BufferedLogSection,
    pub speed_warnings: BufferedLogSection,
    pub hit_warnings: BufferedLogSection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    DamageInv,
    InvWarnings,
    SpeedWarnings,
    HitWarnings,
}

impl Sections {
    pub fn get_mut(&mut self, kind: SectionKind) -> &mut BufferedLogSection {
        match kind {
            SectionKind::DamageInv => &mut self.damage_inv,
            SectionKind::InvWarnings => &mut self.inv_warnings,
            SectionKind::SpeedWarnings => &mut self.speed_warnings,
            SectionKind::HitWarnings => &mut self.hit_warnings,
        }
    }

    fn new(dir: &Path, threshold: usize) -> Self {
        Self {
            damage_inv: BufferedLogSection::new(dir, threshold),
            inv_warnings: BufferedLogSection::new(dir, threshold),
            speed_warnings: BufferedLogSection::new(dir, threshold),
            hit_warnings: BufferedLogSection::new(dir, threshold),
        }
    }
}

#[derive(Debug)]
pub struct Trackers {
    pub speed: SpeedTracker,
    pub vitals: VitalsTracker,
    pub damage: DamageChangeTracker,
    pub invincibility: InvincibilityTracker,
    pub roster: Roster,
    pub special: SpecialAttackTracker,
    pub loadout: LoadoutTracker,
}

/// Everything owned by a running session. Dropping it releases the writer
/// and the section spill files.
#[derive(Debug)]
pub struct Session {
    pub(crate) mode: SessionMode,
    pub(crate) start_unix_ms: i64,
    pub(crate) start_realtime: Option<f64>,
    pub(crate) active_arena: String,
    /// Scene the session was entered from.
    pub(crate) lobby_scene: String,
    pub(crate) last_transition_ms: i64,
    pub(crate) attempt: u32,
    pub(crate) boss_counter: u32,
    pub(crate) last_logged_delta: Option<i64>,
    pub(crate) sequence: Option<ArenaSequence>,
    pub(crate) completed: bool,
    pub(crate) boss_level: Option<i32>,
    pub(crate) fps: f32,
    pub(crate) writer: Option<AsyncLogWriter>,
    pub(crate) temp_path: PathBuf,
    pub(crate) sections: Sections,
    pub(crate) trackers: Trackers,
    pub(crate) key_log: KeyLog,
    pub(crate) plan: PlanTracker,
}

impl Session {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        mode: SessionMode,
        lobby_scene: &str,
        arena: &str,
        sequence: Option<ArenaSequence>,
        writer: AsyncLogWriter,
        host: &dyn HostStateReader,
        config: &RecorderConfig,
        now_ms: i64,
    ) -> Self {
        let charms = host.equipped_charms();
        let mut loadout = LoadoutTracker::new();
        loadout.reset(charms.as_deref());

        Self {
            mode,
            start_unix_ms: now_ms,
            start_realtime: host.realtime_since_startup(),
            active_arena: arena.to_string(),
            lobby_scene: lobby_scene.to_string(),
            last_transition_ms: now_ms,
            attempt: 1,
            boss_counter: 0,
            last_logged_delta: None,
            sequence,
            completed: false,
            boss_level: None,
            fps: 0.0,
            temp_path: writer.path().to_path_buf(),
            writer: Some(writer),
            sections: Sections::new(&config.temp_dir, config.section_threshold),
            trackers: Trackers {
                speed: SpeedTracker::new(host.time_scale().unwrap_or(1.0)),
                vitals: VitalsTracker::new(),
                damage: DamageChangeTracker::new(),
                invincibility: InvincibilityTracker::new(),
                roster: Roster::new(config.roster_scan_interval, config.roster_radius),
                special: SpecialAttackTracker::new(),
                loadout,
            },
            key_log: KeyLog::new(config.key_flush_interval_ms, config.key_flush_batch, now_ms),
            plan: PlanTracker::new(),
        }
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn active_arena(&self) -> &str {
        &self.active_arena
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn boss_counter(&self) -> u32 {
        self.boss_counter
    }

    /// Name of the bound sequence, if any.
    pub fn sequence_name(&self) -> Option<&str> {
        self.sequence.as_ref().map(ArenaSequence::name)
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    pub fn plan(&self) -> &PlanTracker {
        &self.plan
    }

    pub fn start_unix_ms(&self) -> i64 {
        self.start_unix_ms
    }

    pub(crate) fn stamp(&self, now_ms: i64) -> Stamp {
        Stamp::new(now_ms, now_ms - self.last_transition_ms)
    }

    /// Write one timeline line to the log.
    pub(crate) fn emit(&self, line: &str) {
        if let Some(writer) = &self.writer {
            writer.write_line(line);
        }
    }

    pub(crate) fn emit_all<I, S>(&self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if let Some(writer) = &self.writer {
            writer.write_lines(lines);
        }
    }

    pub(crate) fn flush_keys(&mut self, now_ms: i64, force: bool) {
        let Some(writer) = &self.writer else {
            return;
        };
        if force {
            self.key_log.flush(now_ms, writer);
        } else {
            self.key_log.flush_if_due(now_ms, writer);
        }
    }

    /// Session header: mods, settings, loadout and abilities.
    pub(crate) fn write_header(
        &self,
        host: &dyn HostStateReader,
        settings: &SettingsSnapshot,
        mods: &[String],
    ) {
        self.emit_all(mods);
        self.emit(SEPARATOR);
        self.emit_all(settings.lines());
        self.emit(SEPARATOR);
        if let Some(charms) = host.equipped_charms() {
            self.emit(&equipped_line(&charms, host.charms_bound()));
        }
        if let Some(abilities) = host.abilities() {
            self.emit_all(abilities.lines());
        }
        self.emit(SEPARATOR);
    }

    pub(crate) fn write_speed_baseline(&self) {
        self.emit(&self.trackers.speed.initial_line(0));
    }

    /// Count a new boss and write its start marker to the log and timeline.
    pub(crate) fn start_marker(&mut self, now_ms: i64, play_time: Option<f32>) {
        self.flush_keys(now_ms, true);
        self.boss_counter += 1;
        let timestamp = timefmt::log_timestamp(now_ms);
        let play_time = play_time.map_or_else(|| "?".to_string(), |t| format!("{t:.2}"));
        self.emit(&format!(
            "{}|{}|{}|{}| {}*",
            timestamp, now_ms, play_time, self.active_arena, self.boss_counter
        ));
        self.sections.damage_inv.add(format!(
            "{}|{}|{}| {}*",
            timestamp, now_ms, self.active_arena, self.boss_counter
        ));
    }

    /// Track the delta of a stamped event. Returns true when time went
    /// backwards, which means the fight restarted.
    pub(crate) fn observe_delta(&mut self, delta_ms: i64) -> bool {
        let rewound = self.last_logged_delta.is_some_and(|last| delta_ms < last);
        self.last_logged_delta = Some(delta_ms);
        rewound
    }

    /// Attempt boundary followed by a fresh start marker.
    pub(crate) fn begin_attempt(&mut self, now_ms: i64, play_time: Option<f32>) {
        self.flush_keys(now_ms, true);
        self.attempt += 1;
        let marker = format!(
            "-----ATTEMPT #{}----- {}",
            self.attempt,
            timefmt::log_timestamp(now_ms)
        );
        self.emit(&marker);
        self.sections.damage_inv.add(marker);
        self.trackers.roster.clear();
        self.trackers.invincibility.reset();
        self.start_marker(now_ms, play_time);
    }

    /// Move pending tracker warnings into their sections.
    pub(crate) fn collect_warnings(&mut self) {
        if !self.trackers.speed.warnings().is_empty() {
            self.sections
                .speed_warnings
                .add_range(self.trackers.speed.take_warnings());
        }
        if !self.trackers.vitals.warnings().is_empty() {
            self.sections
                .hit_warnings
                .add_range(self.trackers.vitals.take_warnings());
        }
    }

    /// Replay a section into the writer.
    pub(crate) fn replay(&mut self, kind: SectionKind) -> Result<usize, JournalError> {
        let writer = self.writer.as_ref().ok_or(JournalError::Closed)?;
        self.sections.get_mut(kind).write_encrypted_lines(writer)
    }

    /// Close the writer: drain, seal and sync.
    pub(crate) fn close(&mut self) -> Result<WriterStats, JournalError> {
        self.writer.take().ok_or(JournalError::Closed)?.close()
    }
}

#[cfg(test)]
mod tests {
    use arenalog_journal::{LineCipher, WriterConfig, verify_log};
    use arenalog_track::{EntityHandle, EntityProbe, EntityState};

    use super::*;

    struct NoHost;

    impl EntityProbe for NoHost {
        fn scan(&self, _radius: f32) -> Vec<EntityHandle> {
            Vec::new()
        }

        fn probe(&self, _handle: EntityHandle) -> Option<EntityState> {
            None
        }
    }

    impl HostStateReader for NoHost {}

    fn open(dir: &Path) -> Session {
        let config = RecorderConfig {
            temp_dir: dir.to_path_buf(),
            ..Default::default()
        };
        let writer = AsyncLogWriter::create(
            dir.join("s.log"),
            LineCipher::generate(1_000),
            WriterConfig::default(),
        )
        .unwrap();
        Session::new(
            SessionMode::HallOfGods,
            "GG_Workshop",
            "GG_Sly",
            None,
            writer,
            &NoHost,
            &config,
            1_000,
        )
    }

    #[test]
    fn test_rewind_detection() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = open(dir.path());
        assert!(!session.observe_delta(100));
        assert!(!session.observe_delta(100));
        assert!(!session.observe_delta(250));
        assert!(session.observe_delta(12));
        assert!(!session.observe_delta(40));
    }

    #[test]
    fn test_markers_in_log() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = open(dir.path());
        session.start_marker(1_000, Some(12.5));
        session.begin_attempt(5_000, None);
        assert_eq!(session.attempt(), 2);
        assert_eq!(session.boss_counter(), 2);

        let path = session.temp_path().to_path_buf();
        session.close().unwrap();
        let lines = verify_log(&path).unwrap().lines;
        assert!(lines[0].ends_with("|1000|12.50|GG_Sly| 1*"));
        assert!(lines[1].starts_with("-----ATTEMPT #2----- "));
        assert!(lines[2].ends_with("|5000|?|GG_Sly| 2*"));
    }

    #[test]
    fn test_close_twice_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = open(dir.path());
        session.close().unwrap();
        assert!(matches!(session.close(), Err(JournalError::Closed)));
        // Writes after close are ignored.
        session.emit("late");
    }
}
