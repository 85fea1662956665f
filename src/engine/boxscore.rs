//! Box Score Records
//!
//! Immutable, externally supplied per-game records: one [`GameSummary`]
//! per scheduled game and one [`BoxScoreLine`] per player per game. The
//! engine never mutates these; they are the read-only ground truth that
//! both fantasy scoring and wager settlement replay against.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::engine::scoring::StatKey;

/// Unique identifier for a scheduled game.
pub type GameId = i64;

/// Unique identifier for a player.
pub type PlayerId = i64;

/// Final score and metadata for one scheduled game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    pub game_id: GameId,
    pub date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    pub home_score: i32,
    pub away_score: i32,
    /// False for games whose result has not been recorded in the dataset.
    #[serde(default = "default_final")]
    pub is_final: bool,
}

fn default_final() -> bool {
    true
}

impl GameSummary {
    /// Winning team abbreviation, or `None` for a tie or a non-final game.
    pub fn winner(&self) -> Option<&str> {
        if !self.is_final {
            return None;
        }
        if self.home_score > self.away_score {
            Some(&self.home_team)
        } else if self.away_score > self.home_score {
            Some(&self.away_team)
        } else {
            None
        }
    }

    pub fn total_points(&self) -> i32 {
        self.home_score + self.away_score
    }
}

/// One player's raw stat line for one game.
///
/// `minutes == 0.0` marks a DNP: the line scores 0 fantasy points and is
/// excluded from games-played counts and rolling averages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxScoreLine {
    pub player_id: PlayerId,
    pub player_name: String,
    pub team: String,
    pub game_id: GameId,
    pub date: NaiveDate,
    pub minutes: f64,
    pub pts: f64,
    pub oreb: f64,
    pub dreb: f64,
    pub ast: f64,
    pub stl: f64,
    pub blk: f64,
    pub fgm: f64,
    pub fga: f64,
    pub fg3m: f64,
    pub fg3a: f64,
    pub ftm: f64,
    pub fta: f64,
    pub tov: f64,
    pub pf: f64,
}

impl BoxScoreLine {
    /// Total rebounds (offensive + defensive).
    #[inline]
    pub fn reb(&self) -> f64 {
        self.oreb + self.dreb
    }

    #[inline]
    pub fn fg_miss(&self) -> f64 {
        (self.fga - self.fgm).max(0.0)
    }

    #[inline]
    pub fn ft_miss(&self) -> f64 {
        (self.fta - self.ftm).max(0.0)
    }

    /// Whether the player actually took the floor.
    #[inline]
    pub fn played(&self) -> bool {
        self.minutes > 0.0
    }

    /// Count of the five counting categories at double-digit values.
    fn double_digit_categories(&self) -> usize {
        [self.pts, self.reb(), self.ast, self.stl, self.blk]
            .iter()
            .filter(|v| **v >= 10.0)
            .count()
    }

    /// Double-double: at least two of {PTS, REB, AST, STL, BLK} >= 10.
    pub fn is_double_double(&self) -> bool {
        self.double_digit_categories() >= 2
    }

    /// Triple-double: at least three of {PTS, REB, AST, STL, BLK} >= 10.
    pub fn is_triple_double(&self) -> bool {
        self.double_digit_categories() >= 3
    }

    /// Resolve a stat key against this line, including derived values.
    pub fn stat(&self, key: StatKey) -> f64 {
        match key {
            StatKey::Pts => self.pts,
            StatKey::Oreb => self.oreb,
            StatKey::Dreb => self.dreb,
            StatKey::Reb => self.reb(),
            StatKey::Ast => self.ast,
            StatKey::Stl => self.stl,
            StatKey::Blk => self.blk,
            StatKey::Fg3m => self.fg3m,
            StatKey::Fg3a => self.fg3a,
            StatKey::Fgm => self.fgm,
            StatKey::Fga => self.fga,
            StatKey::FgMiss => self.fg_miss(),
            StatKey::Ftm => self.ftm,
            StatKey::Fta => self.fta,
            StatKey::FtMiss => self.ft_miss(),
            StatKey::Tov => self.tov,
            StatKey::Pf => self.pf,
            StatKey::Min => self.minutes,
            StatKey::Dd => {
                if self.is_double_double() {
                    1.0
                } else {
                    0.0
                }
            }
            StatKey::Td => {
                if self.is_triple_double() {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}
