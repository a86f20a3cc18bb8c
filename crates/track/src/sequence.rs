//! Pantheon arena sequences and transition validation.
//!
//! A bound sequence accepts a transition only to the next scene, or to the one
//! after it when the next scene is skippable. Skippable scenes are consumed
//! once passed, whether visited or skipped.

use std::fmt;

/// Boss door lobby. Entering it opens a pantheon session.
pub const BOSS_DOOR_SCENE: &str = "GG_Boss_Door";

/// Lobby preceding the Pantheon of Hallownest.
pub const ATRIUM_ROOF_SCENE: &str = "GG_Atrium_Roof";

/// Scene that ends a completed pantheon.
pub const END_SEQUENCE_SCENE: &str = "GG_End_Seq";

/// Final boss scene of the Pantheon of Hallownest.
pub const RADIANCE_SCENE: &str = "GG_Radiance";

/// Rest-stop and hub scenes. They never advance the boss counter.
pub const SKIP_SCENES: [&str; 8] = [
    "GG_Spa",
    "GG_Engine",
    "GG_Unn",
    "GG_Engine_Root",
    "GG_Wyrm",
    "GG_Engine_Prime",
    "GG_Atrium",
    "GG_Atrium_Roof",
];

pub fn is_skip_scene(scene: &str) -> bool {
    SKIP_SCENES.contains(&scene)
}

// ============================================================================
// Pantheons
// ============================================================================

/// A fixed gauntlet definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pantheon {
    pub name: &'static str,
    pub scenes: &'static [&'static str],
}

impl Pantheon {
    pub fn first_scene(&self) -> &'static str {
        self.scenes.first().copied().unwrap_or_default()
    }
}

pub const PANTHEON_OF_THE_MASTER: Pantheon = Pantheon {
    name: "P1",
    scenes: &[
        "GG_Vengefly",
        "GG_Gruz_Mother",
        "GG_False_Knight",
        "GG_Mega_Moss_Charger",
        "GG_Hornet_1",
        "GG_Spa",
        "GG_Ghost_Gorb",
        "GG_Dung_Defender",
        "GG_Mage_Knight",
        "GG_Brooding_Mawlek",
        "GG_Nailmasters",
    ],
};

pub const PANTHEON_OF_THE_ARTIST: Pantheon = Pantheon {
    name: "P2",
    scenes: &[
        "GG_Ghost_Xero",
        "GG_Crystal_Guardian",
        "GG_Soul_Master",
        "GG_Oblobbles",
        "GG_Mantis_Lords",
        "GG_Spa",
        "GG_Ghost_Marmu",
        "GG_Nosk",
        "GG_Flukemarm",
        "GG_Broken_Vessel",
        "GG_Painter",
    ],
};

pub const PANTHEON_OF_THE_SAGE: Pantheon = Pantheon {
    name: "P3",
    scenes: &[
        "GG_Hive_Knight",
        "GG_Ghost_Hu",
        "GG_Collector",
        "GG_God_Tamer",
        "GG_Grimm",
        "GG_Spa",
        "GG_Ghost_Galien",
        "GG_Grey_Prince_Zote",
        "GG_Uumuu",
        "GG_Hornet_2",
        "GG_Sly",
    ],
};

pub const PANTHEON_OF_THE_KNIGHT: Pantheon = Pantheon {
    name: "P4",
    scenes: &[
        "GG_Crystal_Guardian_2",
        "GG_Lost_Kin",
        "GG_Ghost_No_Eyes",
        "GG_Traitor_Lord",
        "GG_White_Defender",
        "GG_Spa",
        "GG_Failed_Champion",
        "GG_Ghost_Markoth",
        "GG_Watcher_Knights",
        "GG_Soul_Tyrant",
        "GG_Hollow_Knight",
    ],
};

pub const PANTHEON_OF_HALLOWNEST: Pantheon = Pantheon {
    name: "P5",
    scenes: &[
        "GG_Vengefly_V",
        "GG_Gruz_Mother_V",
        "GG_False_Knight",
        "GG_Mega_Moss_Charger",
        "GG_Hornet_1",
        "GG_Engine",
        "GG_Ghost_Gorb_V",
        "GG_Dung_Defender",
        "GG_Mage_Knight_V",
        "GG_Brooding_Mawlek_V",
        "GG_Nailmasters",
        "GG_Spa",
        "GG_Ghost_Xero_V",
        "GG_Crystal_Guardian",
        "GG_Soul_Master",
        "GG_Oblobbles",
        "GG_Mantis_Lords_V",
        "GG_Spa",
        "GG_Ghost_Marmu_V",
        "GG_Flukemarm",
        "GG_Broken_Vessel",
        "GG_Ghost_Galien",
        "GG_Painter",
        "GG_Spa",
        "GG_Hive_Knight",
        "GG_Ghost_Hu",
        "GG_Collector_V",
        "GG_God_Tamer",
        "GG_Grimm",
        "GG_Spa",
        "GG_Unn",
        "GG_Watcher_Knights",
        "GG_Uumuu_V",
        "GG_Nosk_Hornet",
        "GG_Sly",
        "GG_Hornet_2",
        "GG_Spa",
        "GG_Crystal_Guardian_2",
        "GG_Lost_Kin",
        "GG_Ghost_No_Eyes_V",
        "GG_Traitor_Lord",
        "GG_White_Defender",
        "GG_Spa",
        "GG_Engine_Root",
        "GG_Soul_Tyrant",
        "GG_Ghost_Markoth_V",
        "GG_Grey_Prince_Zote",
        "GG_Failed_Champion",
        "GG_Grimm_Nightmare",
        "GG_Spa",
        "GG_Wyrm",
        "GG_Hollow_Knight",
        "GG_Radiance",
    ],
};

/// Pantheons 1 to 4, bound from the boss door by their first scene.
pub const DOOR_PANTHEONS: [Pantheon; 4] = [
    PANTHEON_OF_THE_MASTER,
    PANTHEON_OF_THE_ARTIST,
    PANTHEON_OF_THE_SAGE,
    PANTHEON_OF_THE_KNIGHT,
];

/// The door pantheon whose first scene is `scene`.
pub fn door_pantheon_starting_with(scene: &str) -> Option<&'static Pantheon> {
    DOOR_PANTHEONS.iter().find(|p| p.first_scene() == scene)
}

// ============================================================================
// Arena Sequence
// ============================================================================

/// Why a transition was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceError {
    /// The target does not appear in the remaining sequence.
    NotInSequence { target: String },
    /// The target appears later, out of order.
    OutOfOrder { expected: String, found: String },
    /// The sequence has no scene left.
    Exhausted { target: String },
}

impl fmt::Display for SequenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInSequence { target } => write!(f, "{target} is not part of the sequence"),
            Self::OutOfOrder { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            Self::Exhausted { target } => write!(f, "sequence exhausted before {target}"),
        }
    }
}

impl std::error::Error for SequenceError {}

/// An accepted transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// Moved to the immediate next scene.
    Next,
    /// Jumped over a skippable scene.
    Skipped { skipped: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    scene: String,
    skippable: bool,
}

/// A bound, ordered scene list with a cursor on the current scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArenaSequence {
    name: String,
    steps: Vec<Step>,
    cursor: usize,
}

impl ArenaSequence {
    /// Build a sequence positioned on its first scene.
    pub fn new<I, S>(name: &str, scenes: I, skippable: impl Fn(&str) -> bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let steps = scenes
            .into_iter()
            .map(|s| {
                let scene = s.into();
                let skippable = skippable(&scene);
                Step { scene, skippable }
            })
            .collect();
        Self {
            name: name.to_string(),
            steps,
            cursor: 0,
        }
    }

    /// A pantheon sequence with the standard skip scenes.
    pub fn from_pantheon(pantheon: &Pantheon) -> Self {
        Self::new(pantheon.name, pantheon.scenes.iter().copied(), is_skip_scene)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn current(&self) -> Option<&str> {
        self.steps.get(self.cursor).map(|s| s.scene.as_str())
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// True when the cursor sits on the last scene.
    pub fn is_at_end(&self) -> bool {
        self.cursor + 1 >= self.steps.len()
    }

    /// Check `target` against the next-or-next-after-skippable rule without moving.
    pub fn check(&self, target: &str) -> Result<Advance, SequenceError> {
        let next = self.cursor + 1;
        let Some(step) = self.steps.get(next) else {
            return Err(SequenceError::Exhausted {
                target: target.to_string(),
            });
        };
        if step.scene == target {
            return Ok(Advance::Next);
        }
        if step.skippable
            && let Some(after) = self.steps.get(next + 1)
            && after.scene == target
        {
            return Ok(Advance::Skipped {
                skipped: step.scene.clone(),
            });
        }
        if self.steps[next..].iter().any(|s| s.scene == target) {
            Err(SequenceError::OutOfOrder {
                expected: step.scene.clone(),
                found: target.to_string(),
            })
        } else {
            Err(SequenceError::NotInSequence {
                target: target.to_string(),
            })
        }
    }

    /// Validate and move the cursor onto `target`.
    pub fn advance(&mut self, target: &str) -> Result<Advance, SequenceError> {
        let advance = self.check(target)?;
        self.cursor += match advance {
            Advance::Next => 1,
            Advance::Skipped { .. } => 2,
        };
        Ok(advance)
    }
}
