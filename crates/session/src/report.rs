//! Finalize-time report assembly.
//!
//! Section order is fixed. Only section replays can fail; each failure is
//! logged and the next section still gets written.

use arenalog_journal::JournalError;
use arenalog_track::SEPARATOR;

use crate::planner::{SettingsSnapshot, StoragePlan};
use crate::session::{SectionKind, Session, SessionMode};
use crate::timefmt;

pub const DAMAGE_INV_HEADER: &str = "\n------------------------DAMAGE INV------------------------\n";

pub(crate) struct ReportContext<'a> {
    pub end_unix_ms: i64,
    pub end_realtime: Option<f64>,
    pub reason: &'a str,
    pub settings: &'a SettingsSnapshot,
    pub mods: &'a [String],
    pub plan: &'a StoragePlan,
}

fn step(name: &'static str, result: Result<usize, JournalError>) {
    match result {
        Ok(count) => tracing::trace!(step = name, count, "report section written"),
        Err(err) => tracing::error!(step = name, error = %err, "report section failed"),
    }
}

fn footer_lines(session: &Session, ctx: &ReportContext<'_>) -> Vec<String> {
    let mut lines = vec![
        format!("StartTime: {}", timefmt::log_timestamp(session.start_unix_ms)),
        format!("EndTime: {}", timefmt::log_timestamp(ctx.end_unix_ms)),
        format!(
            "TimeInPlay: {}",
            timefmt::duration(ctx.end_unix_ms - session.start_unix_ms)
        ),
    ];
    if let (Some(start), Some(end)) = (session.start_realtime, ctx.end_realtime) {
        let ms = ((end - start) * 1000.0).round() as i64;
        lines.push(format!("SessionTime: {}", timefmt::duration(ms)));
    }
    lines.push(format!("EndReason: {}", ctx.reason));
    lines
}

fn derived_lines(session: &Session, ctx: &ReportContext<'_>) -> Vec<String> {
    let bucket = &ctx.plan.bucket;
    let mut folder = format!("{}/{}", bucket.root_folder, bucket.display_folder);
    if let Some(difficulty) = &bucket.difficulty_folder {
        folder.push('/');
        folder.push_str(difficulty);
    }

    let mut lines = vec![
        format!("Mode: {}", session.mode.as_str()),
        format!("Bucket: {}", bucket.bucket_label),
        format!("Folder: {folder}"),
    ];
    match session.mode {
        SessionMode::Pantheon => {
            lines.push(format!(
                "Pantheon: {}",
                session.sequence_name().unwrap_or("Unknown")
            ));
            lines.push(format!(
                "Completion: {}",
                if session.completed { '+' } else { '-' }
            ));
            lines.push(format!("Bosses: {}", session.boss_counter));
        }
        SessionMode::HallOfGods => {
            lines.push(format!("Attempts: {}", session.attempt));
            if let Some(level) = session.boss_level {
                lines.push(format!("BossLevel: {level}"));
            }
            if ctx.plan.needs_hp {
                lines.push("BossHP: unresolved".to_string());
            }
        }
    }
    lines.push(String::new());
    lines
}

/// Write every report section after the timeline. The writer stays open.
pub(crate) fn write_report(session: &mut Session, ctx: &ReportContext<'_>) {
    session.flush_keys(ctx.end_unix_ms, true);
    session.collect_warnings();

    let footer = footer_lines(session, ctx);
    session.emit_all(&footer);
    session.emit(DAMAGE_INV_HEADER);
    step("damage_inv", session.replay(SectionKind::DamageInv));
    session.emit_all(&footer);
    session.emit(SEPARATOR);

    session.emit("\n\nWarnings:");
    step("inv_warnings", session.replay(SectionKind::InvWarnings));
    session.emit(SEPARATOR);

    session.emit("\n\nSpeedWarn:");
    step("speed_warnings", session.replay(SectionKind::SpeedWarnings));
    session.emit(SEPARATOR);

    session.emit("\n\nHitWarn:");
    step("hit_warnings", session.replay(SectionKind::HitWarnings));
    session.emit("\n");
    session.emit(SEPARATOR);

    session.emit_all(session.trackers.damage.section_lines());
    session.emit_all(session.trackers.special.section_lines());
    session.emit_all(session.trackers.loadout.section_lines());

    session.emit_all(ctx.settings.lines());
    session.emit(SEPARATOR);
    session.emit_all(derived_lines(session, ctx));
    session.emit(SEPARATOR);
    session.emit_all(ctx.mods);
    session.emit(SEPARATOR);
}
