//! Fantasy-point scoring.
//!
//! Pure functions over raw stat lines. The constant table lives in
//! `PointsSystem`; the pitching-innings convention is chosen explicitly
//! (`PerOut` is canonical, `PerInning` is the legacy table).

pub mod position;

use serde::Deserialize;

use crate::types::Innings;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// How pitching innings turn into points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InningsConvention {
    /// One point per recorded out ("6.2" → 20).
    #[default]
    PerOut,
    /// Three points per decimal inning ("6.2" → 18.6).
    PerInning,
}

/// Point values per counting stat.
#[derive(Debug, Clone, PartialEq)]
pub struct PointsSystem {
    pub total_base: f64,
    pub walk: f64,
    pub run: f64,
    pub rbi: f64,
    pub stolen_base: f64,
    pub strikeout: f64,

    pub out_recorded: f64,
    pub inning_pitched: f64,
    pub earned_run: f64,
    pub win: f64,
    pub loss: f64,
    pub save: f64,
    pub pitching_strikeout: f64,
    pub hit_allowed: f64,
    pub walk_issued: f64,
    pub hold: f64,

    pub innings: InningsConvention,
}

impl Default for PointsSystem {
    fn default() -> Self {
        Self {
            total_base: 1.0,
            walk: 1.0,
            run: 1.0,
            rbi: 1.0,
            stolen_base: 1.0,
            strikeout: -1.0,

            out_recorded: 1.0,
            inning_pitched: 3.0,
            earned_run: -2.0,
            win: 2.0,
            loss: -2.0,
            save: 5.0,
            pitching_strikeout: 1.0,
            hit_allowed: -1.0,
            walk_issued: -1.0,
            hold: 2.0,

            innings: InningsConvention::PerOut,
        }
    }
}

impl PointsSystem {
    pub fn with_convention(innings: InningsConvention) -> Self {
        Self {
            innings,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Stat lines
// ---------------------------------------------------------------------------

/// Batting counts that feed the score. Unset fields are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BattingLine {
    pub hits: u32,
    pub doubles: u32,
    pub triples: u32,
    pub home_runs: u32,
    pub rbi: u32,
    pub runs: u32,
    pub stolen_bases: u32,
    pub walks: u32,
    pub strikeouts: u32,
}

/// Pitching counts that feed the score. `innings_pitched` is the raw
/// upstream notation; `holds` may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PitchingLine {
    pub innings_pitched: Option<String>,
    pub earned_runs: u32,
    pub wins: u32,
    pub losses: u32,
    pub saves: u32,
    pub strikeouts: u32,
    pub hits_allowed: u32,
    pub walks_issued: u32,
    pub holds: Option<u32>,
}

/// Singles are inferred and never negative. Counts come straight from
/// upstream, so the sum saturates rather than wrapping.
pub fn total_bases(line: &BattingLine) -> u32 {
    let extra = line
        .doubles
        .saturating_add(line.triples)
        .saturating_add(line.home_runs);
    let singles = line.hits.saturating_sub(extra);
    singles
        .saturating_add(line.doubles.saturating_mul(2))
        .saturating_add(line.triples.saturating_mul(3))
        .saturating_add(line.home_runs.saturating_mul(4))
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    system: PointsSystem,
}

impl ScoringEngine {
    pub fn new(system: PointsSystem) -> Self {
        Self { system }
    }

    pub fn system(&self) -> &PointsSystem {
        &self.system
    }

    pub fn score_batting(&self, line: &BattingLine) -> f64 {
        let s = &self.system;
        f64::from(total_bases(line)) * s.total_base
            + f64::from(line.walks) * s.walk
            + f64::from(line.runs) * s.run
            + f64::from(line.rbi) * s.rbi
            + f64::from(line.stolen_bases) * s.stolen_base
            + f64::from(line.strikeouts) * s.strikeout
    }

    pub fn score_pitching(&self, line: &PitchingLine) -> f64 {
        let s = &self.system;
        self.innings_points(line.innings_pitched.as_deref())
            + f64::from(line.earned_runs) * s.earned_run
            + f64::from(line.wins) * s.win
            + f64::from(line.losses) * s.loss
            + f64::from(line.saves) * s.save
            + f64::from(line.strikeouts) * s.pitching_strikeout
            + f64::from(line.hits_allowed) * s.hit_allowed
            + f64::from(line.walks_issued) * s.walk_issued
            + f64::from(line.holds.unwrap_or(0)) * s.hold
    }

    /// Malformed or missing notation contributes nothing.
    fn innings_points(&self, raw: Option<&str>) -> f64 {
        let Some(innings) = raw.and_then(Innings::parse) else {
            return 0.0;
        };
        match self.system.innings {
            InningsConvention::PerOut => f64::from(innings.outs()) * self.system.out_recorded,
            InningsConvention::PerInning => innings.as_decimal() * self.system.inning_pitched,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn worked_pitching() -> PitchingLine {
        PitchingLine {
            innings_pitched: Some("6.2".into()),
            earned_runs: 2,
            wins: 1,
            strikeouts: 7,
            hits_allowed: 4,
            walks_issued: 1,
            saves: 0,
            holds: Some(0),
            ..PitchingLine::default()
        }
    }

    #[test]
    fn test_batting_worked_example() {
        let line = BattingLine {
            hits: 3,
            doubles: 1,
            triples: 0,
            home_runs: 1,
            rbi: 2,
            runs: 1,
            stolen_bases: 1,
            walks: 1,
            strikeouts: 2,
        };
        assert_eq!(total_bases(&line), 7);
        assert!(close(ScoringEngine::default().score_batting(&line), 10.0));
    }

    #[test]
    fn test_total_bases_never_negative_singles() {
        // Inconsistent upstream line: more extra-base hits than hits.
        let line = BattingLine {
            hits: 1,
            doubles: 1,
            home_runs: 1,
            ..BattingLine::default()
        };
        assert_eq!(total_bases(&line), 6);
    }

    #[test]
    fn test_total_bases_saturates_on_absurd_counts() {
        let line = BattingLine {
            hits: u32::MAX,
            doubles: u32::MAX / 2,
            home_runs: u32::MAX,
            ..BattingLine::default()
        };
        assert_eq!(total_bases(&line), u32::MAX);

        let points = ScoringEngine::default().score_batting(&line);
        assert!(points.is_finite());
        assert_eq!(points, f64::from(u32::MAX));
    }

    #[test]
    fn test_batting_strikeouts_only_is_negative() {
        let line = BattingLine {
            strikeouts: 3,
            ..BattingLine::default()
        };
        assert!(close(ScoringEngine::default().score_batting(&line), -3.0));
    }

    #[test]
    fn test_pitching_worked_example() {
        let engine = ScoringEngine::default();
        assert!(close(engine.score_pitching(&worked_pitching()), 20.0));
    }

    #[test]
    fn test_pitching_legacy_convention() {
        let engine = ScoringEngine::new(PointsSystem::with_convention(
            InningsConvention::PerInning,
        ));
        // 6.2 × 3 = 18.6, then the same −4 +2 +7 −4 −1.
        assert!(close(engine.score_pitching(&worked_pitching()), 18.6));
    }

    #[test]
    fn test_pitching_malformed_innings_contributes_zero() {
        let engine = ScoringEngine::default();
        for raw in [None, Some("6.3"), Some("n/a"), Some("")] {
            let line = PitchingLine {
                innings_pitched: raw.map(String::from),
                strikeouts: 2,
                ..PitchingLine::default()
            };
            assert!(close(engine.score_pitching(&line), 2.0), "raw = {raw:?}");
        }
    }

    #[test]
    fn test_pitching_null_and_zero_holds_score_alike() {
        let engine = ScoringEngine::default();
        let with_zero = worked_pitching();
        let with_none = PitchingLine {
            holds: None,
            ..worked_pitching()
        };
        assert!(close(
            engine.score_pitching(&with_zero),
            engine.score_pitching(&with_none)
        ));

        let with_hold = PitchingLine {
            holds: Some(1),
            ..worked_pitching()
        };
        assert!(close(engine.score_pitching(&with_hold), 22.0));
    }

    #[test]
    fn test_save_worth_five() {
        let line = PitchingLine {
            innings_pitched: Some("1.0".into()),
            saves: 1,
            strikeouts: 2,
            ..PitchingLine::default()
        };
        assert!(close(ScoringEngine::default().score_pitching(&line), 10.0));
    }

    #[test]
    fn test_scoring_is_pure() {
        let engine = ScoringEngine::default();
        let line = worked_pitching();
        assert_eq!(
            engine.score_pitching(&line).to_bits(),
            engine.score_pitching(&line).to_bits()
        );
    }

    #[test]
    fn test_convention_deserializes_snake_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            innings: InningsConvention,
        }
        let w: Wrapper = toml::from_str("innings = \"per_inning\"").unwrap();
        assert_eq!(w.innings, InningsConvention::PerInning);
    }
}
