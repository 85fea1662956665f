//! Fantasy Scoring
//!
//! Converts raw box-score lines into fantasy point totals under a
//! configurable weight profile, and aggregates per-player season
//! averages. Stat keys form a closed, enumerated set: an unrecognized
//! key is a deserialization error rather than a silently ignored typo,
//! and every key defaults to a 0.0 weight when unset.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::engine::boxscore::{BoxScoreLine, PlayerId};
use crate::engine::error::{EngineError, EngineResult};

/// The closed set of stat keys a scoring profile may weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StatKey {
    #[serde(rename = "PTS")]
    Pts,
    #[serde(rename = "OREB")]
    Oreb,
    #[serde(rename = "DREB")]
    Dreb,
    #[serde(rename = "REB")]
    Reb,
    #[serde(rename = "AST")]
    Ast,
    #[serde(rename = "STL")]
    Stl,
    #[serde(rename = "BLK")]
    Blk,
    #[serde(rename = "FG3M")]
    Fg3m,
    #[serde(rename = "FG3A")]
    Fg3a,
    #[serde(rename = "FGM")]
    Fgm,
    #[serde(rename = "FGA")]
    Fga,
    #[serde(rename = "FG_MISS")]
    FgMiss,
    #[serde(rename = "FTM")]
    Ftm,
    #[serde(rename = "FTA")]
    Fta,
    #[serde(rename = "FT_MISS")]
    FtMiss,
    #[serde(rename = "TOV")]
    Tov,
    #[serde(rename = "PF")]
    Pf,
    #[serde(rename = "MIN")]
    Min,
    /// Double-double bonus flag (0 or 1 per game).
    #[serde(rename = "DD")]
    Dd,
    /// Triple-double bonus flag (0 or 1 per game).
    #[serde(rename = "TD")]
    Td,
}

impl StatKey {
    pub const ALL: [StatKey; 20] = [
        StatKey::Pts,
        StatKey::Oreb,
        StatKey::Dreb,
        StatKey::Reb,
        StatKey::Ast,
        StatKey::Stl,
        StatKey::Blk,
        StatKey::Fg3m,
        StatKey::Fg3a,
        StatKey::Fgm,
        StatKey::Fga,
        StatKey::FgMiss,
        StatKey::Ftm,
        StatKey::Fta,
        StatKey::FtMiss,
        StatKey::Tov,
        StatKey::Pf,
        StatKey::Min,
        StatKey::Dd,
        StatKey::Td,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatKey::Pts => "PTS",
            StatKey::Oreb => "OREB",
            StatKey::Dreb => "DREB",
            StatKey::Reb => "REB",
            StatKey::Ast => "AST",
            StatKey::Stl => "STL",
            StatKey::Blk => "BLK",
            StatKey::Fg3m => "FG3M",
            StatKey::Fg3a => "FG3A",
            StatKey::Fgm => "FGM",
            StatKey::Fga => "FGA",
            StatKey::FgMiss => "FG_MISS",
            StatKey::Ftm => "FTM",
            StatKey::Fta => "FTA",
            StatKey::FtMiss => "FT_MISS",
            StatKey::Tov => "TOV",
            StatKey::Pf => "PF",
            StatKey::Min => "MIN",
            StatKey::Dd => "DD",
            StatKey::Td => "TD",
        }
    }
}

/// A named mapping from stat key to weight. Keys absent from the map
/// score with weight 0.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringProfile {
    pub name: String,
    pub weights: BTreeMap<StatKey, f64>,
}

impl ScoringProfile {
    pub fn new(name: impl Into<String>, weights: BTreeMap<StatKey, f64>) -> Self {
        Self {
            name: name.into(),
            weights,
        }
    }

    /// Weight for a stat key, defaulting to 0.0 when unset.
    #[inline]
    pub fn weight(&self, key: StatKey) -> f64 {
        self.weights.get(&key).copied().unwrap_or(0.0)
    }

    /// Fantasy points for one box-score line. A DNP line scores 0.
    pub fn fantasy_points(&self, line: &BoxScoreLine) -> f64 {
        if !line.played() {
            return 0.0;
        }
        self.weights
            .iter()
            .map(|(key, weight)| line.stat(*key) * weight)
            .sum()
    }

    /// Balanced points-league defaults.
    pub fn points_league() -> Self {
        let weights = BTreeMap::from([
            (StatKey::Pts, 1.0),
            (StatKey::Oreb, 1.2),
            (StatKey::Dreb, 1.0),
            (StatKey::Ast, 1.5),
            (StatKey::Stl, 3.0),
            (StatKey::Blk, 3.0),
            (StatKey::Fg3m, 1.0),
            (StatKey::Fgm, 1.0),
            (StatKey::Fga, -0.45),
            (StatKey::Ftm, 1.0),
            (StatKey::Fta, -0.75),
            (StatKey::Tov, -1.0),
            (StatKey::Dd, 3.0),
            (StatKey::Td, 5.0),
        ]);
        Self::new("Points league (balanced)", weights)
    }

    /// Flat nine-category weighting.
    pub fn nine_cat() -> Self {
        let weights = BTreeMap::from([
            (StatKey::Fg3m, 1.0),
            (StatKey::Pts, 1.0),
            (StatKey::Reb, 1.0),
            (StatKey::Ast, 1.0),
            (StatKey::Stl, 1.0),
            (StatKey::Blk, 1.0),
            (StatKey::Tov, -1.0),
        ]);
        Self::new("Nine category rotisserie", weights)
    }
}

/// Registry of scoring profiles keyed by slug, with a default pointer.
/// User-defined profiles live alongside the built-ins; the store
/// persists the whole catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileCatalog {
    pub profiles: BTreeMap<String, ScoringProfile>,
    pub default_key: String,
}

impl ProfileCatalog {
    pub const BUILTIN_POINTS: &'static str = "points_league";
    pub const BUILTIN_NINE_CAT: &'static str = "nine_cat";

    pub fn builtin() -> Self {
        let profiles = BTreeMap::from([
            (
                Self::BUILTIN_POINTS.to_string(),
                ScoringProfile::points_league(),
            ),
            (Self::BUILTIN_NINE_CAT.to_string(), ScoringProfile::nine_cat()),
        ]);
        Self {
            profiles,
            default_key: Self::BUILTIN_POINTS.to_string(),
        }
    }

    /// Resolve a profile by key, falling back to the catalog default.
    pub fn resolve(&self, key: Option<&str>) -> EngineResult<&ScoringProfile> {
        let key = key.unwrap_or(&self.default_key);
        self.profiles.get(key).ok_or_else(|| {
            let known = self
                .profiles
                .keys()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ");
            EngineError::not_found(format!(
                "unknown scoring profile '{}' (known: {})",
                key, known
            ))
        })
    }

    /// Insert or replace a profile; optionally promote it to default.
    pub fn upsert(
        &mut self,
        key: impl Into<String>,
        profile: ScoringProfile,
        make_default: bool,
    ) -> EngineResult<()> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(EngineError::validation("profile key cannot be empty"));
        }
        self.profiles.insert(key.clone(), profile);
        if make_default {
            self.default_key = key;
        }
        Ok(())
    }

    /// Remove a user profile. Built-ins and the current default stay.
    pub fn remove(&mut self, key: &str) -> EngineResult<()> {
        if key == Self::BUILTIN_POINTS || key == Self::BUILTIN_NINE_CAT {
            return Err(EngineError::validation(format!(
                "built-in profile '{}' cannot be deleted",
                key
            )));
        }
        if key == self.default_key {
            return Err(EngineError::validation(
                "cannot delete the default scoring profile; change the default first",
            ));
        }
        if self.profiles.remove(key).is_none() {
            return Err(EngineError::not_found(format!(
                "unknown scoring profile '{}'",
                key
            )));
        }
        Ok(())
    }
}

impl Default for ProfileCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Per-player aggregate over the games actually played.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSeasonAverages {
    pub player_id: PlayerId,
    pub player_name: String,
    pub team: String,
    pub games_played: u32,
    pub fantasy_avg: f64,
    /// Per-game averages for every stat key.
    pub stats: BTreeMap<StatKey, f64>,
}

/// Aggregate per-game logs into season averages per player, ignoring DNPs.
///
/// Output is sorted by fantasy average descending, then player id for a
/// deterministic order (draft rankings are derived from this ordering).
pub fn player_season_averages(
    lines: &[BoxScoreLine],
    profile: &ScoringProfile,
) -> Vec<PlayerSeasonAverages> {
    struct Accum {
        name: String,
        team: String,
        games: u32,
        fantasy_total: f64,
        totals: BTreeMap<StatKey, f64>,
    }

    let mut by_player: BTreeMap<PlayerId, Accum> = BTreeMap::new();
    for line in lines {
        let entry = by_player.entry(line.player_id).or_insert_with(|| Accum {
            name: line.player_name.clone(),
            team: line.team.clone(),
            games: 0,
            fantasy_total: 0.0,
            totals: BTreeMap::new(),
        });
        // Most recent team abbreviation wins.
        entry.team = line.team.clone();
        if !line.played() {
            continue;
        }
        entry.games += 1;
        entry.fantasy_total += profile.fantasy_points(line);
        for key in StatKey::ALL {
            *entry.totals.entry(key).or_insert(0.0) += line.stat(key);
        }
    }

    let mut rows: Vec<PlayerSeasonAverages> = by_player
        .into_iter()
        .map(|(player_id, accum)| {
            let games = accum.games;
            let divisor = games.max(1) as f64;
            let stats = StatKey::ALL
                .iter()
                .map(|key| {
                    let total = accum.totals.get(key).copied().unwrap_or(0.0);
                    (*key, if games > 0 { total / divisor } else { 0.0 })
                })
                .collect();
            PlayerSeasonAverages {
                player_id,
                player_name: accum.name,
                team: accum.team,
                games_played: games,
                fantasy_avg: if games > 0 {
                    accum.fantasy_total / divisor
                } else {
                    0.0
                },
                stats,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.fantasy_avg
            .partial_cmp(&a.fantasy_avg)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.player_id.cmp(&b.player_id))
    });
    rows
}
