//! Position and role resolution.

use crate::types::Innings;

pub const STARTING_PITCHER: &str = "SP";
pub const RELIEF_PITCHER: &str = "RP";
pub const PITCHER: &str = "P";

/// Four full innings separate a spot start from a relief outing.
const START_WORKLOAD_OUTS: u32 = 12;

/// Pitching signals from one game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PitchingAppearance {
    pub games_played: u32,
    pub games_started: u32,
    pub saves: u32,
    pub holds: Option<u32>,
    pub innings: Innings,
}

/// Resolve the role a player filled in one game.
///
/// First match wins: no pitching appearance keeps the nominal position;
/// a start is "SP"; a save or any reported hold (zero included) is "RP";
/// otherwise four or more innings is "SP", anything shorter "RP".
pub fn classify(nominal_position: &str, pitching: Option<&PitchingAppearance>) -> String {
    let Some(p) = pitching.filter(|p| p.games_played > 0) else {
        return nominal_position.to_string();
    };

    let role = if p.games_started > 0 {
        STARTING_PITCHER
    } else if p.saves > 0 || p.holds.is_some() {
        RELIEF_PITCHER
    } else if p.innings.outs() >= START_WORKLOAD_OUTS {
        STARTING_PITCHER
    } else {
        RELIEF_PITCHER
    };
    role.to_string()
}

pub fn is_pitcher_role(role: &str) -> bool {
    matches!(role, STARTING_PITCHER | RELIEF_PITCHER | PITCHER)
}

/// A non-pitcher who recorded at least one out on the mound.
pub fn is_position_player_pitching(role: &str, innings: Innings) -> bool {
    !is_pitcher_role(role) && !innings.is_zero()
}

/// Group name for a position abbreviation. Outfield spots collapse into
/// "Outfield"; unknown codes pass through.
pub fn full_position_name(code: &str) -> &str {
    match code {
        "C" => "Catcher",
        "1B" => "First Base",
        "2B" => "Second Base",
        "3B" => "Third Base",
        "SS" => "Shortstop",
        "LF" | "CF" | "RF" | "OF" => "Outfield",
        "DH" => "Designated Hitter",
        "UTIL" => "Utility",
        STARTING_PITCHER => "Starting Pitcher",
        RELIEF_PITCHER => "Relief Pitcher",
        PITCHER => "Pitcher",
        "TWP" => "Two-Way Player",
        other => other,
    }
}
