//! Playoff Bracket Builder
//!
//! Single-elimination bracket seeded from regular-season standings, one
//! scoring week per round. The whole bracket is a pure function of
//! (seed order, per-week team totals, completed weeks, config): nothing
//! here mutates league state, so a preview is just a rebuild against
//! the current standings.
//!
//! Options:
//! - `reseed`: winners are re-ranked by their original seed before each
//!   later round instead of keeping fixed bracket slots.
//! - `consolation`: losers of every round drop into a parallel bracket
//!   that plays out the remaining weeks, producing a full ordered
//!   placement list instead of just a champion.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::engine::error::{EngineError, EngineResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayoffConfig {
    /// Bracket size; must be a power of two.
    pub teams: usize,
    /// Week numbers hosting each round, ascending, one per round.
    pub weeks: Vec<u32>,
    #[serde(default)]
    pub reseed: bool,
    #[serde(default)]
    pub consolation: bool,
}

impl PlayoffConfig {
    /// Number of rounds a bracket of this size needs.
    pub fn rounds(&self) -> usize {
        self.teams.trailing_zeros() as usize
    }

    pub fn start_week(&self) -> Option<u32> {
        self.weeks.first().copied()
    }

    pub fn validate(&self, league_teams: usize, season_weeks: &[u32]) -> EngineResult<()> {
        if self.teams < 2 || !self.teams.is_power_of_two() {
            return Err(EngineError::validation(
                "playoff team count must be a power of two and at least 2",
            ));
        }
        if self.teams > league_teams {
            return Err(EngineError::validation(format!(
                "bracket of {} teams exceeds the league's {} teams",
                self.teams, league_teams
            )));
        }
        if self.weeks.len() != self.rounds() {
            return Err(EngineError::validation(format!(
                "a {}-team bracket needs exactly {} round weeks",
                self.teams,
                self.rounds()
            )));
        }
        if self.weeks.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(EngineError::validation(
                "playoff round weeks must be strictly ascending",
            ));
        }
        for week in &self.weeks {
            if !season_weeks.contains(week) {
                return Err(EngineError::validation(format!(
                    "week {} is not part of the season schedule",
                    week
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundKind {
    Standard,
    Reseeded,
    Consolation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketStatus {
    Preview,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayoffSeed {
    /// 1-based standings rank at seeding time.
    pub seed: usize,
    pub team: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayoffMatchup {
    pub week: u32,
    pub high: PlayoffSeed,
    pub low: PlayoffSeed,
    pub high_points: f64,
    pub low_points: f64,
    pub completed: bool,
}

impl PlayoffMatchup {
    /// The advancing side. While a week is live this is a projection;
    /// an exact tie goes to the better seed.
    pub fn winner(&self) -> &PlayoffSeed {
        if self.low_points > self.high_points {
            &self.low
        } else {
            &self.high
        }
    }

    pub fn loser(&self) -> &PlayoffSeed {
        if self.low_points > self.high_points {
            &self.high
        } else {
            &self.low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayoffRound {
    pub week: u32,
    pub kind: RoundKind,
    pub matchups: Vec<PlayoffMatchup>,
}

/// Read-only scoring context the bracket is computed against.
pub struct BracketInputs<'a> {
    /// Team fantasy total per (week number, team name).
    pub week_totals: &'a BTreeMap<(u32, String), f64>,
    /// Week numbers whose every game date has been simulated.
    pub completed_weeks: &'a BTreeSet<u32>,
}

impl BracketInputs<'_> {
    fn points(&self, week: u32, team: &str) -> f64 {
        self.week_totals
            .get(&(week, team.to_string()))
            .copied()
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayoffBracket {
    pub config: PlayoffConfig,
    pub status: BracketStatus,
    pub rounds: Vec<PlayoffRound>,
    /// Champion first, then runner-up and so on; empty until the
    /// bracket completes.
    pub placements: Vec<String>,
}

impl PlayoffBracket {
    /// Build the bracket state from scratch.
    ///
    /// `seed_order` is the full standings order (best first); the top
    /// `config.teams` enter the bracket and the rest trail the
    /// placement list. `started` marks whether the first playoff week
    /// has begun, which is what freezes the preview.
    pub fn build(
        config: &PlayoffConfig,
        seed_order: &[String],
        inputs: &BracketInputs<'_>,
        started: bool,
    ) -> Self {
        let seeds: Vec<PlayoffSeed> = seed_order
            .iter()
            .take(config.teams)
            .enumerate()
            .map(|(i, team)| PlayoffSeed {
                seed: i + 1,
                team: team.clone(),
            })
            .collect();

        let mut rounds = Vec::new();
        let placements = build_group(
            seeds,
            &config.weeks,
            RoundKind::Standard,
            config,
            inputs,
            &mut rounds,
        );
        rounds.sort_by(|a, b| {
            a.week
                .cmp(&b.week)
                .then(kind_order(a.kind).cmp(&kind_order(b.kind)))
        });

        let status = if !started {
            BracketStatus::Preview
        } else if placements.is_some() {
            BracketStatus::Completed
        } else {
            BracketStatus::InProgress
        };

        let mut final_placements = Vec::new();
        if status == BracketStatus::Completed {
            if let Some(order) = placements {
                final_placements = order;
            }
            // Teams that missed the bracket rank below it, in
            // standings order.
            final_placements.extend(seed_order.iter().skip(config.teams).cloned());
        }

        Self {
            config: config.clone(),
            status,
            rounds,
            placements: final_placements,
        }
    }
}

fn kind_order(kind: RoundKind) -> u8 {
    match kind {
        RoundKind::Standard | RoundKind::Reseeded => 0,
        RoundKind::Consolation => 1,
    }
}

/// Recursively play out one group of seeds over the remaining weeks,
/// pairing best against worst each round. Returns the group's ordered
/// placements once every relevant week has completed, `None` while any
/// round is still undecided.
fn build_group(
    mut seeds: Vec<PlayoffSeed>,
    weeks: &[u32],
    kind: RoundKind,
    config: &PlayoffConfig,
    inputs: &BracketInputs<'_>,
    rounds: &mut Vec<PlayoffRound>,
) -> Option<Vec<String>> {
    if seeds.len() == 1 {
        return Some(vec![seeds.remove(0).team]);
    }
    let (&week, remaining) = weeks.split_first()?;
    let n = seeds.len();

    let mut matchups = Vec::with_capacity(n / 2);
    for i in 0..n / 2 {
        let high = seeds[i].clone();
        let low = seeds[n - 1 - i].clone();
        matchups.push(PlayoffMatchup {
            week,
            high_points: inputs.points(week, &high.team),
            low_points: inputs.points(week, &low.team),
            completed: inputs.completed_weeks.contains(&week),
            high,
            low,
        });
    }
    let decided = matchups.iter().all(|m| m.completed);
    let mut winners: Vec<PlayoffSeed> = matchups.iter().map(|m| m.winner().clone()).collect();
    let mut losers: Vec<PlayoffSeed> = matchups.iter().map(|m| m.loser().clone()).collect();
    rounds.push(PlayoffRound {
        week,
        kind,
        matchups,
    });
    if !decided {
        return None;
    }

    let next_kind = match kind {
        RoundKind::Consolation => RoundKind::Consolation,
        _ if config.reseed => RoundKind::Reseeded,
        _ => RoundKind::Standard,
    };
    if config.reseed || kind == RoundKind::Consolation {
        winners.sort_by_key(|s| s.seed);
    }
    let top = build_group(winners, remaining, next_kind, config, inputs, rounds)?;

    losers.sort_by_key(|s| s.seed);
    let bottom = if config.consolation && losers.len() > 1 {
        build_group(
            losers,
            remaining,
            RoundKind::Consolation,
            config,
            inputs,
            rounds,
        )?
    } else {
        losers.into_iter().map(|s| s.team).collect()
    };

    let mut placements = top;
    placements.extend(bottom);
    Some(placements)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_order(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn inputs_from(
        entries: &[(u32, &str, f64)],
        done: &[u32],
    ) -> (BTreeMap<(u32, String), f64>, BTreeSet<u32>) {
        let totals = entries
            .iter()
            .map(|(w, t, p)| ((*w, t.to_string()), *p))
            .collect();
        let completed = done.iter().copied().collect();
        (totals, completed)
    }

    fn config(teams: usize, weeks: Vec<u32>) -> PlayoffConfig {
        PlayoffConfig {
            teams,
            weeks,
            reseed: false,
            consolation: false,
        }
    }

    #[test]
    fn test_config_validation() {
        let season = vec![1, 2, 3, 4, 5];
        assert!(config(4, vec![4, 5]).validate(6, &season).is_ok());
        // Not a power of two.
        assert!(config(3, vec![4, 5]).validate(6, &season).is_err());
        // Wrong round count for the bracket size.
        assert!(config(4, vec![5]).validate(6, &season).is_err());
        // Weeks out of order.
        assert!(config(4, vec![5, 4]).validate(6, &season).is_err());
        // More bracket slots than teams.
        assert!(config(8, vec![3, 4, 5]).validate(6, &season).is_err());
        // Unknown week.
        assert!(config(4, vec![5, 9]).validate(6, &season).is_err());
    }

    #[test]
    fn test_preview_before_start() {
        let cfg = config(4, vec![4, 5]);
        let order = seed_order(&["A", "B", "C", "D"]);
        let (totals, done) = inputs_from(&[], &[]);
        let bracket = PlayoffBracket::build(
            &cfg,
            &order,
            &BracketInputs {
                week_totals: &totals,
                completed_weeks: &done,
            },
            false,
        );
        assert_eq!(bracket.status, BracketStatus::Preview);
        // 1 vs 4 and 2 vs 3 in the opening round.
        let first = &bracket.rounds[0];
        assert_eq!(first.matchups[0].high.team, "A");
        assert_eq!(first.matchups[0].low.team, "D");
        assert_eq!(first.matchups[1].high.team, "B");
        assert_eq!(first.matchups[1].low.team, "C");
        assert!(bracket.placements.is_empty());
    }

    #[test]
    fn test_full_bracket_with_consolation() {
        let cfg = PlayoffConfig {
            teams: 4,
            weeks: vec![4, 5],
            reseed: false,
            consolation: true,
        };
        let order = seed_order(&["A", "B", "C", "D", "E"]);
        let (totals, done) = inputs_from(
            &[
                // Week 4: D upsets A; B beats C.
                (4, "A", 80.0),
                (4, "D", 90.0),
                (4, "B", 85.0),
                (4, "C", 70.0),
                // Week 5 final: B beats D. Consolation: A beats C.
                (5, "D", 60.0),
                (5, "B", 75.0),
                (5, "A", 95.0),
                (5, "C", 50.0),
            ],
            &[4, 5],
        );
        let bracket = PlayoffBracket::build(
            &cfg,
            &order,
            &BracketInputs {
                week_totals: &totals,
                completed_weeks: &done,
            },
            true,
        );
        assert_eq!(bracket.status, BracketStatus::Completed);
        assert_eq!(bracket.placements, vec!["B", "D", "A", "C", "E"]);
        // Week 5 hosts both the final and the consolation game.
        let week5: Vec<&PlayoffRound> =
            bracket.rounds.iter().filter(|r| r.week == 5).collect();
        assert_eq!(week5.len(), 2);
        assert_eq!(week5[1].kind, RoundKind::Consolation);
    }

    #[test]
    fn test_in_progress_builds_only_decided_rounds() {
        let cfg = config(4, vec![4, 5]);
        let order = seed_order(&["A", "B", "C", "D"]);
        let (totals, done) = inputs_from(&[(4, "A", 10.0), (4, "D", 5.0)], &[]);
        let bracket = PlayoffBracket::build(
            &cfg,
            &order,
            &BracketInputs {
                week_totals: &totals,
                completed_weeks: &done,
            },
            true,
        );
        assert_eq!(bracket.status, BracketStatus::InProgress);
        assert_eq!(bracket.rounds.len(), 1);
        assert!(!bracket.rounds[0].matchups[0].completed);
    }

    #[test]
    fn test_tie_advances_better_seed() {
        let cfg = config(2, vec![5]);
        let order = seed_order(&["A", "B"]);
        let (totals, done) = inputs_from(&[(5, "A", 50.0), (5, "B", 50.0)], &[5]);
        let bracket = PlayoffBracket::build(
            &cfg,
            &order,
            &BracketInputs {
                week_totals: &totals,
                completed_weeks: &done,
            },
            true,
        );
        assert_eq!(bracket.status, BracketStatus::Completed);
        assert_eq!(bracket.placements, vec!["A", "B"]);
    }

    #[test]
    fn test_reseeding_reorders_semifinal_winners() {
        let cfg = PlayoffConfig {
            teams: 8,
            weeks: vec![3, 4, 5],
            reseed: true,
            consolation: false,
        };
        let order = seed_order(&["S1", "S2", "S3", "S4", "S5", "S6", "S7", "S8"]);
        // Quarterfinals: seeds 1, 4, 6, 7 advance.
        let (totals, done) = inputs_from(
            &[
                (3, "S1", 90.0),
                (3, "S8", 10.0),
                (3, "S2", 10.0),
                (3, "S7", 90.0),
                (3, "S3", 10.0),
                (3, "S6", 90.0),
                (3, "S4", 90.0),
                (3, "S5", 10.0),
            ],
            &[3],
        );
        let bracket = PlayoffBracket::build(
            &cfg,
            &order,
            &BracketInputs {
                week_totals: &totals,
                completed_weeks: &done,
            },
            true,
        );
        let semis = bracket
            .rounds
            .iter()
            .find(|r| r.week == 4)
            .expect("semifinal round");
        assert_eq!(semis.kind, RoundKind::Reseeded);
        // Reseeded: best remaining (1) hosts worst remaining (7).
        assert_eq!(semis.matchups[0].high.team, "S1");
        assert_eq!(semis.matchups[0].low.team, "S7");
        assert_eq!(semis.matchups[1].high.team, "S4");
        assert_eq!(semis.matchups[1].low.team, "S6");
    }
}
