use serde::{Deserialize, Serialize};
use crate::types::RegionId;

/// All player-issued commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum PlayerCommand {
    // ── Clock control ─────────────────────────────
    Pause,
    Resume,
    SetSpeed { speed: crate::clock::SimSpeed },

    // ── Economy ───────────────────────────────────
    HireOfficer,

    // ── Input collaborator ────────────────────────
    Click   { region_id: RegionId },
    Release { region_id: RegionId },
}
