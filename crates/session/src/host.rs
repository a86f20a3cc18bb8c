//! Host collaborator interfaces.
//!
//! Everything the recorder learns about the running game arrives through
//! these traits. Accessors return `Option`; `None` means "unknown right now"
//! and callers treat it as a no-op.

use arenalog_track::{Charm, EntityProbe, HeroFlags};

use crate::planner::SettingsSnapshot;

// ============================================================================
// Host State
// ============================================================================

/// Dash upgrade level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DashLevel {
    #[default]
    None,
    Dash,
    Shade,
}

/// Dream nail upgrade level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DreamNailLevel {
    #[default]
    None,
    Normal,
    Awoken,
}

/// Ability levels written into the session header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Abilities {
    pub scream: i32,
    pub fireball: i32,
    pub quake: i32,
    pub dash: DashLevel,
    pub mantis_claw: bool,
    pub monarch_wings: bool,
    pub crystal_heart: bool,
    pub ismas_tear: bool,
    pub dream_nail: DreamNailLevel,
    pub dream_gate: bool,
    pub great_slash: bool,
    pub dash_slash: bool,
    pub cyclone_slash: bool,
}

impl Abilities {
    pub fn lines(&self) -> Vec<String> {
        fn on_off(value: bool) -> &'static str {
            if value { "On" } else { "Off" }
        }
        let dash = match self.dash {
            DashLevel::Shade => "Shade",
            DashLevel::Dash => "Dash",
            DashLevel::None => "None",
        };
        let dream_nail = match self.dream_nail {
            DreamNailLevel::Awoken => "Awoken",
            DreamNailLevel::Normal => "Normal",
            DreamNailLevel::None => "None",
        };
        vec![
            "Skills:".to_string(),
            format!("  Scream: {}", self.scream),
            format!("  Fireball: {}", self.fireball),
            format!("  Quake: {}", self.quake),
            format!("  Dash: {dash}"),
            format!("  Mantis Claw: {}", on_off(self.mantis_claw)),
            format!("  Monarch Wings: {}", on_off(self.monarch_wings)),
            format!("  Crystal Heart: {}", on_off(self.crystal_heart)),
            format!("  Isma's Tear: {}", on_off(self.ismas_tear)),
            format!("  Dream Nail: {dream_nail}"),
            format!("  Dream Gate: {}", on_off(self.dream_gate)),
            format!("  Great Slash: {}", on_off(self.great_slash)),
            format!("  Dash Slash: {}", on_off(self.dash_slash)),
            format!("  Cyclone Slash: {}", on_off(self.cyclone_slash)),
        ]
    }
}

/// Overlay watermark state at the time of a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watermark {
    pub number: i32,
    pub rgba: [u8; 4],
}

impl Default for Watermark {
    fn default() -> Self {
        Self {
            number: 0,
            rgba: [255, 255, 255, 255],
        }
    }
}

impl Watermark {
    /// `FFFFFFFF`
    pub fn hex(&self) -> String {
        self.rgba.iter().map(|b| format!("{b:02X}")).collect()
    }
}

/// Typed, best-effort view of host game state.
///
/// The roster reads entities through the [`EntityProbe`] supertrait.
pub trait HostStateReader: EntityProbe {
    fn time_scale(&self) -> Option<f32> {
        None
    }

    fn health(&self) -> Option<i32> {
        None
    }

    fn lifeblood(&self) -> Option<i32> {
        None
    }

    fn hero_flags(&self) -> Option<HeroFlags> {
        None
    }

    fn equipped_charms(&self) -> Option<Vec<Charm>> {
        None
    }

    fn charms_bound(&self) -> bool {
        false
    }

    fn abilities(&self) -> Option<Abilities> {
        None
    }

    /// In-game play time in seconds.
    fn play_time(&self) -> Option<f32> {
        None
    }

    /// Statue difficulty level of the current boss scene.
    fn boss_level(&self) -> Option<i32> {
        None
    }

    fn in_cutscene(&self) -> bool {
        false
    }

    /// Seconds since the game process started.
    fn realtime_since_startup(&self) -> Option<f64> {
        None
    }

    /// Unscaled frame delta in seconds, used for the fps column.
    fn unscaled_delta(&self) -> Option<f32> {
        None
    }

    fn watermark(&self) -> Option<Watermark> {
        None
    }
}

// ============================================================================
// Other Collaborators
// ============================================================================

/// Read-only settings accessor, refreshed on every call.
pub trait SettingsSource {
    fn snapshot(&self) -> SettingsSnapshot;
}

/// Installed modification inventory.
pub trait ModInventory {
    fn snapshot_lines(&self) -> Vec<String>;
}

/// Payload of the "log saved" notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedLog {
    pub bucket_label: String,
    pub file_name: String,
    pub path: std::path::PathBuf,
}

impl SavedLog {
    /// `HoG AHE+: Sisters of Battle (14-10-2026 18-03-11).log`
    pub fn message(&self) -> String {
        format!("{}: {}", self.bucket_label, self.file_name)
    }
}

pub trait Notifier {
    fn log_saved(&self, saved: &SavedLog);
}

/// Wall clock in unix milliseconds.
pub trait Clock {
    fn now_unix_ms(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Settings source for hosts without toggle packs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSettings;

impl SettingsSource for DefaultSettings {
    fn snapshot(&self) -> SettingsSnapshot {
        SettingsSnapshot::default()
    }
}

/// Notifier that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn log_saved(&self, saved: &SavedLog) {
        tracing::info!(path = %saved.path.display(), "{}", saved.message());
    }
}

// ============================================================================
// Events
// ============================================================================

/// A key press or release observed this frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyTransition {
    pub key: String,
    pub pressed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitReason {
    QuitToMenu,
    ApplicationQuit,
}

impl QuitReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::QuitToMenu => "QuitToMenu",
            Self::ApplicationQuit => "ApplicationQuit",
        }
    }
}

/// Host lifecycle callbacks, in delivery order.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// Scene load began.
    SceneTransition { previous: String, target: String },
    /// Scene finished loading.
    SceneLoaded,
    /// Per-frame update.
    Frame { keys: Vec<KeyTransition> },
    /// Fixed-timestep update.
    FixedTick { delta: f64 },
    /// Boss scene controller update.
    BossUpdate,
    /// A hit instance was dealt.
    Hit {
        owner: String,
        damage: i32,
        multiplier: f32,
    },
    /// Special attack damage instance.
    SpecialAttack { target: String, damage: i32 },
    /// A boss health pool was discovered for `scene`.
    BossHpDetected { scene: String, hp: i32 },
    /// The final boss of the bound sequence was defeated.
    SequenceCompleted,
    Quit(QuitReason),
}

/// Subscription to host callbacks.
pub trait EventSource {
    fn poll_event(&mut self) -> Option<HostEvent>;

    /// Called once on teardown.
    fn unsubscribe(&mut self);
}
