//! Scene predicates deciding when sessions start and stop.

use arenalog_track::sequence::{
    ATRIUM_ROOF_SCENE, BOSS_DOOR_SCENE, END_SEQUENCE_SCENE, PANTHEON_OF_HALLOWNEST, Pantheon,
    is_skip_scene,
};

use crate::planner::WORKSHOP_SCENE;

/// Godhome scenes that are never a boss arena.
pub const HUB_SCENES: [&str; 7] = [
    WORKSHOP_SCENE,
    BOSS_DOOR_SCENE,
    END_SEQUENCE_SCENE,
    "GG_Blue_Room",
    "GG_Waterways",
    "GG_Lurker",
    "GG_Entrance_Cutscene",
];

/// A `GG_` scene that is neither a rest stop nor a hub.
pub fn is_boss_arena(scene: &str) -> bool {
    scene.starts_with("GG_")
        && !is_skip_scene(scene)
        && !HUB_SCENES.iter().any(|hub| scene.starts_with(hub))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Pantheon run, bound immediately when the lobby identifies it.
    Pantheon { bound: Option<&'static Pantheon> },
    /// Single Hall of Gods statue fight.
    HallOfGods,
}

/// The start gate `previous -> target` opens, if any.
pub fn start_gate(previous: &str, target: &str) -> Option<Gate> {
    if target.contains(BOSS_DOOR_SCENE) {
        return Some(Gate::Pantheon { bound: None });
    }
    if previous == ATRIUM_ROOF_SCENE && target.contains(PANTHEON_OF_HALLOWNEST.first_scene()) {
        return Some(Gate::Pantheon {
            bound: Some(&PANTHEON_OF_HALLOWNEST),
        });
    }
    if previous == WORKSHOP_SCENE && is_boss_arena(target) {
        return Some(Gate::HallOfGods);
    }
    None
}

/// Pantheon end scene.
pub fn is_pantheon_terminal(target: &str) -> bool {
    target.contains(END_SEQUENCE_SCENE)
}
