//! Storage bucket planner.
//!
//! [`plan`] is a pure function of the arena, the settings snapshot, the best
//! known boss HP metric, the previous scene and the captured boss level. Some
//! arenas host near-duplicate boss variants and can only be placed once a
//! positive HP sample is known; until then the plan reports `needs_hp`.
//! [`PlanTracker`] keeps the latest plan and never lets a waiting plan
//! replace a finalized one.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use arenalog_track::sequence::RADIANCE_SCENE;

use crate::timefmt;

/// Hall of Gods lobby. Statue difficulty only exists for arenas entered from it.
pub const WORKSHOP_SCENE: &str = "GG_Workshop";

pub const HOG_ROOT: &str = "HoG";
pub const HOG_ENHANCED_ROOT: &str = "HoG AHE+";
pub const HOG_ORIGINAL_HP_ROOT: &str = "HoG AHE";
pub const P5_HEALTH_ROOT: &str = "P5 HEALTH";
pub const P5_HEALTH_PREFIX: &str = "P5 HP ";
pub const PANTHEON_ROOT: &str = "Pantheons";

/// `any_radiance` variant that also renames the file.
pub const ANY_RADIANCE_3: &str = "AnyRadiance 3.0";

// ============================================================================
// Settings Snapshot
// ============================================================================

/// Enhanced-difficulty toggle pack values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnhancedSettings {
    pub available: bool,
    pub main_switch: bool,
    pub strengthen_all_bosses: bool,
    pub strengthen_all_monsters: bool,
    pub original_hp: bool,
    pub more_radiance: bool,
}

impl EnhancedSettings {
    /// Every core toggle set.
    pub fn is_buffed(&self) -> bool {
        self.available && self.main_switch && self.strengthen_all_bosses && self.strengthen_all_monsters
    }
}

/// Read-only settings consumed by the planner and written into the report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SettingsSnapshot {
    pub enhanced: EnhancedSettings,
    /// Resolved expanded Radiance variant, e.g. `AnyRadiance 2.0`.
    pub any_radiance: Option<String>,
    /// P5 health mode.
    pub p5_health: bool,
}

impl SettingsSnapshot {
    pub fn lines(&self) -> Vec<String> {
        fn on_off(value: bool) -> &'static str {
            if value { "On" } else { "Off" }
        }
        let e = &self.enhanced;
        let mut lines = vec!["AllHallownestEnhanced:".to_string()];
        if e.available {
            lines.push(format!("  Main Switch: {}", on_off(e.main_switch)));
            lines.push(format!("  Strengthen All Bosses: {}", on_off(e.strengthen_all_bosses)));
            lines.push(format!("  Strengthen All Monsters: {}", on_off(e.strengthen_all_monsters)));
            lines.push(format!("  Original HP: {}", on_off(e.original_hp)));
            lines.push(format!("  More Radiance: {}", on_off(e.more_radiance)));
        } else {
            lines.push("  (not installed)".to_string());
        }
        lines.push(format!(
            "AnyRadiance: {}",
            self.any_radiance.as_deref().unwrap_or("(none)")
        ));
        lines.push(format!("P5 Health: {}", on_off(self.p5_health)));
        lines
    }
}

// ============================================================================
// Boss HP
// ============================================================================

/// Which HP figure disambiguates an arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HpMetric {
    /// Highest single max HP.
    Highest,
    /// Sum of the max HP of every tracked boss.
    Summed,
    /// Lowest single max HP.
    Lowest,
}

struct HpRule {
    arena: &'static str,
    metric: HpMetric,
    /// Largest metric value of the unmodded fight.
    vanilla_max: i32,
}

const HP_RULES: &[HpRule] = &[
    HpRule {
        arena: "GG_Nailmasters",
        metric: HpMetric::Lowest,
        vanilla_max: 1200,
    },
    HpRule {
        arena: "GG_White_Defender",
        metric: HpMetric::Summed,
        vanilla_max: 1800,
    },
    HpRule {
        arena: "GG_Grey_Prince_Zote",
        metric: HpMetric::Highest,
        vanilla_max: 1750,
    },
];

fn hp_rule(arena: &str) -> Option<&'static HpRule> {
    HP_RULES.iter().find(|r| r.arena == arena)
}

/// The metric `arena` is placed by, if it needs one.
pub fn hp_metric_for(arena: &str) -> Option<HpMetric> {
    hp_rule(arena).map(|r| r.metric)
}

/// Per-scene boss HP observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BossHpState {
    pub waiting: bool,
    pub cached: Option<i32>,
    pub highest: Option<i32>,
    pub lowest: Option<i32>,
    pub summed: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct HpLedger {
    scenes: HashMap<String, BossHpState>,
}

impl HpLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, scene: &str) -> Option<&BossHpState> {
        self.scenes.get(scene)
    }

    pub fn set_waiting(&mut self, scene: &str, waiting: bool) {
        self.scenes.entry(scene.to_string()).or_default().waiting = waiting;
    }

    pub fn is_waiting(&self, scene: &str) -> bool {
        self.scenes.get(scene).is_some_and(|s| s.waiting)
    }

    /// One boss health pool. Non-positive samples are ignored.
    pub fn observe(&mut self, scene: &str, hp: i32) {
        if hp <= 0 {
            return;
        }
        let state = self.scenes.entry(scene.to_string()).or_default();
        state.cached = Some(hp);
        state.highest = Some(state.highest.map_or(hp, |h| h.max(hp)));
        state.lowest = Some(state.lowest.map_or(hp, |l| l.min(hp)));
    }

    /// Combined max HP of the current roster.
    pub fn observe_sum(&mut self, scene: &str, sum: i32) {
        if sum <= 0 {
            return;
        }
        let state = self.scenes.entry(scene.to_string()).or_default();
        state.summed = Some(state.summed.map_or(sum, |s| s.max(sum)));
    }

    /// Best known value of the metric `scene` is placed by.
    pub fn best_for(&self, scene: &str) -> Option<i32> {
        let state = self.scenes.get(scene)?;
        let value = match hp_metric_for(scene)? {
            HpMetric::Highest => state.highest,
            // A single reported pool stands in until the roster has been summed.
            HpMetric::Summed => state.summed.or(state.highest),
            HpMetric::Lowest => state.lowest,
        };
        value.filter(|hp| *hp > 0)
    }

    pub fn reset(&mut self, scene: &str) {
        self.scenes.remove(scene);
    }
}

// ============================================================================
// Buckets
// ============================================================================

const DISPLAY_NAMES: &[(&str, &str)] = &[
    ("GG_Vengefly", "Vengefly King"),
    ("GG_Gruz_Mother", "Gruz Mother"),
    ("GG_False_Knight", "False Knight"),
    ("GG_Mega_Moss_Charger", "Massive Moss Charger"),
    ("GG_Hornet_1", "Hornet Protector"),
    ("GG_Ghost_Gorb", "Gorb"),
    ("GG_Dung_Defender", "Dung Defender"),
    ("GG_Mage_Knight", "Soul Warrior"),
    ("GG_Brooding_Mawlek", "Brooding Mawlek"),
    ("GG_Nailmasters", "Oro & Mato"),
    ("GG_Ghost_Xero", "Xero"),
    ("GG_Crystal_Guardian", "Crystal Guardian"),
    ("GG_Soul_Master", "Soul Master"),
    ("GG_Oblobbles", "Oblobbles"),
    ("GG_Mantis_Lords", "Mantis Lords"),
    ("GG_Mantis_Lords_V", "Sisters of Battle"),
    ("GG_Ghost_Marmu", "Marmu"),
    ("GG_Nosk", "Nosk"),
    ("GG_Flukemarm", "Flukemarm"),
    ("GG_Broken_Vessel", "Broken Vessel"),
    ("GG_Ghost_Galien", "Galien"),
    ("GG_Painter", "Paintmaster Sheo"),
    ("GG_Hive_Knight", "Hive Knight"),
    ("GG_Ghost_Hu", "Elder Hu"),
    ("GG_Collector", "The Collector"),
    ("GG_God_Tamer", "God Tamer"),
    ("GG_Grimm", "Troupe Master Grimm"),
    ("GG_Watcher_Knights", "Watcher Knights"),
    ("GG_Uumuu", "Uumuu"),
    ("GG_Nosk_Hornet", "Winged Nosk"),
    ("GG_Sly", "Great Nailsage Sly"),
    ("GG_Hornet_2", "Hornet Sentinel"),
    ("GG_Crystal_Guardian_2", "Enraged Guardian"),
    ("GG_Lost_Kin", "Lost Kin"),
    ("GG_Ghost_No_Eyes", "No Eyes"),
    ("GG_Traitor_Lord", "Traitor Lord"),
    ("GG_White_Defender", "White Defender"),
    ("GG_Soul_Tyrant", "Soul Tyrant"),
    ("GG_Ghost_Markoth", "Markoth"),
    ("GG_Grey_Prince_Zote", "Grey Prince Zote"),
    ("GG_Failed_Champion", "Failed Champion"),
    ("GG_Grimm_Nightmare", "Nightmare King Grimm"),
    ("GG_Hollow_Knight", "Pure Vessel"),
    ("GG_Radiance", "Absolute Radiance"),
];

/// Human folder name for an arena. `_V` arenas share their base name unless
/// listed themselves; unknown arenas drop `GG_` and use spaces.
pub fn display_name(arena: &str) -> String {
    let lookup = |id: &str| DISPLAY_NAMES.iter().find(|(a, _)| *a == id).map(|(_, n)| *n);
    if let Some(name) = lookup(arena) {
        return name.to_string();
    }
    if let Some(base) = arena.strip_suffix("_V")
        && let Some(name) = lookup(base)
    {
        return name.to_string();
    }
    arena.strip_prefix("GG_").unwrap_or(arena).replace('_', " ")
}

/// Statue difficulty folder for a boss level.
pub fn difficulty_folder(arena: &str, boss_level: Option<i32>) -> Option<&'static str> {
    let level = boss_level?;
    if !arena.starts_with("GG_") {
        return None;
    }
    if level == 0 && arena.ends_with("_V") && arena != "GG_Mantis_Lords_V" {
        return None;
    }
    match level {
        0 => Some("Attuned"),
        1 => Some("Ascended"),
        2 | 3 => Some("Radiant"),
        _ => None,
    }
}

/// Replace characters that cannot appear in a path component.
fn sanitize(component: &str) -> String {
    let cleaned: String = component
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = cleaned.trim().trim_end_matches('.');
    if trimmed.is_empty() {
        "_".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Resolved placement of a finished log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub root_folder: String,
    pub display_folder: String,
    pub difficulty_folder: Option<String>,
    pub file_prefix: String,
    pub file_label: String,
    /// Shown in the saved notification.
    pub bucket_label: String,
}

impl Bucket {
    /// `[Radiant] Gorb (14-10-2026 18-03-11).log`
    pub fn file_name(&self, start_unix_ms: i64) -> String {
        sanitize(&format!(
            "{}{} ({}).log",
            self.file_prefix,
            self.file_label,
            timefmt::file_timestamp(start_unix_ms)
        ))
    }

    pub fn directory(&self, output_dir: &Path) -> PathBuf {
        let mut dir = output_dir
            .join(sanitize(&self.root_folder))
            .join(sanitize(&self.display_folder));
        if let Some(difficulty) = &self.difficulty_folder {
            dir.push(sanitize(difficulty));
        }
        dir
    }

    pub fn file_path(&self, output_dir: &Path, start_unix_ms: i64) -> PathBuf {
        self.directory(output_dir).join(self.file_name(start_unix_ms))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePlan {
    pub bucket: Bucket,
    /// Placement is provisional until a positive HP metric arrives.
    pub needs_hp: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct PlanInput<'a> {
    pub arena: &'a str,
    pub previous_scene: &'a str,
    pub settings: &'a SettingsSnapshot,
    pub hp: Option<i32>,
    pub boss_level: Option<i32>,
}

/// Place a Hall of Gods session.
pub fn plan(input: &PlanInput<'_>) -> StoragePlan {
    let settings = input.settings;
    let enhanced = &settings.enhanced;

    let mut root = if enhanced.is_buffed() {
        if enhanced.original_hp { HOG_ORIGINAL_HP_ROOT } else { HOG_ENHANCED_ROOT }
    } else {
        HOG_ROOT
    }
    .to_string();

    let mut display = display_name(input.arena);
    let mut label = None;

    if input.arena == RADIANCE_SCENE {
        match settings.any_radiance.as_deref().filter(|v| !v.trim().is_empty()) {
            Some(variant) => {
                root = variant.to_string();
                if variant == ANY_RADIANCE_3 {
                    label = Some(variant.to_string());
                }
            }
            None if enhanced.is_buffed() && enhanced.more_radiance => {
                root = HOG_ENHANCED_ROOT.to_string();
            }
            None => {}
        }
    }

    let hp = input.hp.filter(|hp| *hp > 0);
    let mut needs_hp = false;
    if let Some(rule) = hp_rule(input.arena) {
        match hp {
            Some(hp) if hp > rule.vanilla_max => display = format!("{display} (Modded HP)"),
            Some(_) => {}
            None => needs_hp = true,
        }
    }

    let mut prefix = String::new();
    if settings.p5_health {
        root = P5_HEALTH_ROOT.to_string();
        prefix.push_str(P5_HEALTH_PREFIX);
    }

    let difficulty = if input.previous_scene == WORKSHOP_SCENE {
        difficulty_folder(input.arena, input.boss_level)
    } else {
        None
    };
    if let Some(difficulty) = difficulty {
        prefix.push_str(&format!("[{difficulty}] "));
    }

    StoragePlan {
        bucket: Bucket {
            bucket_label: root.clone(),
            root_folder: root,
            file_label: label.unwrap_or_else(|| display.clone()),
            display_folder: display,
            difficulty_folder: difficulty.map(str::to_string),
            file_prefix: prefix,
        },
        needs_hp,
    }
}

/// Place a pantheon session. The prefix is the completion marker.
pub fn plan_pantheon(pantheon: Option<&str>, completed: bool) -> StoragePlan {
    let name = pantheon.unwrap_or("Unknown").to_string();
    StoragePlan {
        bucket: Bucket {
            root_folder: PANTHEON_ROOT.to_string(),
            display_folder: name.clone(),
            difficulty_folder: None,
            file_prefix: if completed { "+" } else { "-" }.to_string(),
            file_label: name,
            bucket_label: PANTHEON_ROOT.to_string(),
        },
        needs_hp: false,
    }
}

// ============================================================================
// Plan Tracker
// ============================================================================

/// Latest plan of a running session, narrowed monotonically.
#[derive(Debug, Clone, Default)]
pub struct PlanTracker {
    current: Option<StoragePlan>,
}

impl PlanTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the stored plan changed.
    pub fn update(&mut self, plan: StoragePlan) -> bool {
        if let Some(current) = &self.current {
            if !current.needs_hp && plan.needs_hp {
                return false;
            }
            if *current == plan {
                return false;
            }
        }
        self.current = Some(plan);
        true
    }

    pub fn current(&self) -> Option<&StoragePlan> {
        self.current.as_ref()
    }

    pub fn is_final(&self) -> bool {
        self.current.as_ref().is_some_and(|p| !p.needs_hp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input<'a>(arena: &'a str, settings: &'a SettingsSnapshot) -> PlanInput<'a> {
        PlanInput {
            arena,
            previous_scene: WORKSHOP_SCENE,
            settings,
            hp: None,
            boss_level: None,
        }
    }

    fn buffed() -> SettingsSnapshot {
        SettingsSnapshot {
            enhanced: EnhancedSettings {
                available: true,
                main_switch: true,
                strengthen_all_bosses: true,
                strengthen_all_monsters: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_plain_hog_bucket() {
        let settings = SettingsSnapshot::default();
        let plan = plan(&input("GG_Mantis_Lords_V", &settings));
        assert!(!plan.needs_hp);
        assert_eq!(plan.bucket.root_folder, "HoG");
        assert_eq!(plan.bucket.display_folder, "Sisters of Battle");
        assert_eq!(plan.bucket.file_label, "Sisters of Battle");
        assert_eq!(plan.bucket.file_prefix, "");
        assert_eq!(plan.bucket.difficulty_folder, None);
    }

    #[test]
    fn test_display_name_fallbacks() {
        assert_eq!(display_name("GG_Ghost_Gorb_V"), "Gorb");
        assert_eq!(display_name("GG_Some_New_Boss"), "Some New Boss");
        assert_eq!(display_name("Custom"), "Custom");
    }

    #[test]
    fn test_buffed_roots() {
        let mut settings = buffed();
        assert_eq!(plan(&input("GG_Sly", &settings)).bucket.root_folder, "HoG AHE+");
        settings.enhanced.original_hp = true;
        assert_eq!(plan(&input("GG_Sly", &settings)).bucket.root_folder, "HoG AHE");
        settings.enhanced.strengthen_all_monsters = false;
        assert_eq!(plan(&input("GG_Sly", &settings)).bucket.root_folder, "HoG");
    }

    #[test]
    fn test_radiance_variants() {
        let mut settings = SettingsSnapshot {
            any_radiance: Some("AnyRadiance 2.0".to_string()),
            ..Default::default()
        };
        let plan_2 = plan(&input("GG_Radiance", &settings));
        assert_eq!(plan_2.bucket.root_folder, "AnyRadiance 2.0");
        assert_eq!(plan_2.bucket.file_label, "Absolute Radiance");

        settings.any_radiance = Some(ANY_RADIANCE_3.to_string());
        let plan_3 = plan(&input("GG_Radiance", &settings));
        assert_eq!(plan_3.bucket.root_folder, ANY_RADIANCE_3);
        assert_eq!(plan_3.bucket.file_label, ANY_RADIANCE_3);

        let mut more = buffed();
        more.enhanced.original_hp = true;
        more.enhanced.more_radiance = true;
        assert_eq!(plan(&input("GG_Radiance", &more)).bucket.root_folder, "HoG AHE+");
        assert_eq!(plan(&input("GG_Sly", &more)).bucket.root_folder, "HoG AHE");
    }

    #[test]
    fn test_p5_health_override() {
        let settings = SettingsSnapshot {
            p5_health: true,
            ..buffed()
        };
        let plan = plan(&input("GG_Hornet_2", &settings));
        assert_eq!(plan.bucket.root_folder, "P5 HEALTH");
        assert_eq!(plan.bucket.bucket_label, "P5 HEALTH");
        assert_eq!(plan.bucket.file_prefix, "P5 HP ");
    }

    #[test]
    fn test_difficulty_rules() {
        assert_eq!(difficulty_folder("GG_Sly", Some(0)), Some("Attuned"));
        assert_eq!(difficulty_folder("GG_Sly", Some(1)), Some("Ascended"));
        assert_eq!(difficulty_folder("GG_Sly", Some(3)), Some("Radiant"));
        assert_eq!(difficulty_folder("GG_Sly", Some(4)), None);
        assert_eq!(difficulty_folder("GG_Sly", None), None);
        assert_eq!(difficulty_folder("GG_Gruz_Mother_V", Some(0)), None);
        assert_eq!(difficulty_folder("GG_Gruz_Mother_V", Some(2)), Some("Radiant"));
        assert_eq!(difficulty_folder("GG_Mantis_Lords_V", Some(0)), Some("Attuned"));
    }

    #[test]
    fn test_difficulty_requires_workshop_entry() {
        let settings = SettingsSnapshot::default();
        let mut from_workshop = input("GG_Sly", &settings);
        from_workshop.boss_level = Some(2);
        let plan_a = plan(&from_workshop);
        assert_eq!(plan_a.bucket.difficulty_folder.as_deref(), Some("Radiant"));
        assert_eq!(plan_a.bucket.file_prefix, "[Radiant] ");

        let mut elsewhere = from_workshop;
        elsewhere.previous_scene = "GG_Atrium";
        assert_eq!(plan(&elsewhere).bucket.difficulty_folder, None);
    }

    #[test]
    fn test_hp_replan_narrows() {
        let settings = SettingsSnapshot::default();
        let mut tracker = PlanTracker::new();

        let waiting = plan(&input("GG_White_Defender", &settings));
        assert!(waiting.needs_hp);
        assert!(tracker.update(waiting.clone()));
        assert!(!tracker.is_final());

        let mut with_hp = input("GG_White_Defender", &settings);
        with_hp.hp = Some(2400);
        let finalized = plan(&with_hp);
        assert!(!finalized.needs_hp);
        assert_eq!(finalized.bucket.display_folder, "White Defender (Modded HP)");
        assert!(tracker.update(finalized.clone()));

        // A later waiting plan never widens a finalized one.
        assert!(!tracker.update(waiting));
        assert_eq!(tracker.current(), Some(&finalized));
    }

    #[test]
    fn test_zero_hp_keeps_waiting() {
        let settings = SettingsSnapshot::default();
        let mut zero = input("GG_Nailmasters", &settings);
        zero.hp = Some(0);
        assert!(plan(&zero).needs_hp);
        zero.hp = Some(900);
        let plan = plan(&zero);
        assert!(!plan.needs_hp);
        assert_eq!(plan.bucket.display_folder, "Oro & Mato");
    }

    #[test]
    fn test_ledger_metrics() {
        let mut ledger = HpLedger::new();
        ledger.set_waiting("GG_Nailmasters", true);
        assert!(ledger.is_waiting("GG_Nailmasters"));
        assert_eq!(ledger.best_for("GG_Nailmasters"), None);

        ledger.observe("GG_Nailmasters", 1500);
        ledger.observe("GG_Nailmasters", 1100);
        ledger.observe("GG_Nailmasters", -3);
        assert_eq!(ledger.best_for("GG_Nailmasters"), Some(1100));

        ledger.observe("GG_Grey_Prince_Zote", 1400);
        ledger.observe("GG_Grey_Prince_Zote", 2000);
        assert_eq!(ledger.best_for("GG_Grey_Prince_Zote"), Some(2000));

        ledger.observe_sum("GG_White_Defender", 1600);
        ledger.observe_sum("GG_White_Defender", 900);
        assert_eq!(ledger.best_for("GG_White_Defender"), Some(1600));

        assert_eq!(ledger.best_for("GG_Sly"), None);
        ledger.reset("GG_Nailmasters");
        assert!(ledger.state("GG_Nailmasters").is_none());
    }

    #[test]
    fn test_summed_metric_falls_back_to_reported_pool() {
        let mut ledger = HpLedger::new();
        ledger.observe("GG_White_Defender", 1600);
        assert_eq!(ledger.best_for("GG_White_Defender"), Some(1600));

        ledger.observe_sum("GG_White_Defender", 1900);
        assert_eq!(ledger.best_for("GG_White_Defender"), Some(1900));

        ledger.reset("GG_Nailmasters");
        assert!(ledger.state("GG_Nailmasters").is_none());
    }

    #[test]
    fn test_pantheon_bucket() {
        let done = plan_pantheon(Some("P5"), true);
        assert_eq!(done.bucket.root_folder, "Pantheons");
        assert_eq!(done.bucket.display_folder, "P5");
        assert_eq!(done.bucket.file_prefix, "+");
        assert!(done.bucket.file_name(0).starts_with("+P5 ("));

        let unknown = plan_pantheon(None, false);
        assert_eq!(unknown.bucket.display_folder, "Unknown");
        assert_eq!(unknown.bucket.file_prefix, "-");
    }

    #[test]
    fn test_file_path_layout() {
        let settings = SettingsSnapshot::default();
        let mut with_level = input("GG_Sly", &settings);
        with_level.boss_level = Some(1);
        let bucket = plan(&with_level).bucket;
        let path = bucket.file_path(Path::new("/out"), 0);
        let parent = path.parent().unwrap();
        assert_eq!(parent, Path::new("/out/HoG/Great Nailsage Sly/Ascended"));
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("[Ascended] Great Nailsage Sly ("));
        assert!(name.ends_with(").log"));
    }

    #[test]
    fn test_sanitize_components() {
        assert_eq!(sanitize("Any/Radiance: 2"), "Any_Radiance_ 2");
        assert_eq!(sanitize("  "), "_");
        assert_eq!(sanitize("name."), "name");
    }
}
