//! Historical season dataset
//!
//! Read-only provider of final scores, player box-score lines, and
//! bookmaker odds for one completed season. Loaded once from a JSON
//! document at startup and indexed in memory; the engine treats it as
//! already-resident input and never touches the disk itself.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::Path;

use crate::engine::boxscore::{BoxScoreLine, GameId, GameSummary, PlayerId};
use crate::engine::odds::AmericanPrice;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub enum DataError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::Io(e) => write!(f, "dataset io error: {}", e),
            DataError::Parse(e) => write!(f, "dataset parse error: {}", e),
            DataError::Invalid(msg) => write!(f, "invalid dataset: {}", msg),
        }
    }
}

impl std::error::Error for DataError {}

impl From<std::io::Error> for DataError {
    fn from(e: std::io::Error) -> Self {
        DataError::Io(e)
    }
}

impl From<serde_json::Error> for DataError {
    fn from(e: serde_json::Error) -> Self {
        DataError::Parse(e)
    }
}

// ============================================================================
// Types
// ============================================================================

/// Pre-recorded bookmaker lines for one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameOdds {
    pub game_id: GameId,
    #[serde(default)]
    pub bookmaker: String,
    pub home_moneyline: AmericanPrice,
    pub away_moneyline: AmericanPrice,
    /// Home-team spread line; the away line is its negation.
    pub spread_point: f64,
    pub home_spread_price: AmericanPrice,
    pub away_spread_price: AmericanPrice,
    pub total_point: f64,
    pub over_price: AmericanPrice,
    pub under_price: AmericanPrice,
}

/// On-disk document shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonDataFile {
    pub games: Vec<GameSummary>,
    pub player_logs: Vec<BoxScoreLine>,
    #[serde(default)]
    pub odds: Vec<GameOdds>,
}

/// The loaded, indexed season.
#[derive(Debug, Clone)]
pub struct SeasonDataset {
    games: Vec<GameSummary>,
    logs: Vec<BoxScoreLine>,
    odds: Vec<GameOdds>,
    games_by_date: HashMap<NaiveDate, Vec<usize>>,
    games_by_id: HashMap<GameId, usize>,
    logs_by_date: HashMap<NaiveDate, Vec<usize>>,
    logs_by_player: HashMap<PlayerId, Vec<usize>>,
    odds_by_game: HashMap<GameId, usize>,
}

impl SeasonDataset {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let file: SeasonDataFile = serde_json::from_str(&raw)?;
        let dataset = Self::from_parts(file.games, file.player_logs, file.odds)?;
        tracing::info!(
            games = dataset.games.len(),
            player_logs = dataset.logs.len(),
            odds = dataset.odds.len(),
            dates = dataset.season_dates().len(),
            "season dataset loaded"
        );
        Ok(dataset)
    }

    pub fn from_parts(
        games: Vec<GameSummary>,
        logs: Vec<BoxScoreLine>,
        odds: Vec<GameOdds>,
    ) -> Result<Self, DataError> {
        if games.is_empty() {
            return Err(DataError::Invalid("season has no games".to_string()));
        }

        let mut games_by_date: HashMap<NaiveDate, Vec<usize>> = HashMap::new();
        let mut games_by_id = HashMap::new();
        for (i, game) in games.iter().enumerate() {
            if games_by_id.insert(game.game_id, i).is_some() {
                return Err(DataError::Invalid(format!(
                    "duplicate game id {}",
                    game.game_id
                )));
            }
            games_by_date.entry(game.date).or_default().push(i);
        }

        let mut logs_by_date: HashMap<NaiveDate, Vec<usize>> = HashMap::new();
        let mut logs_by_player: HashMap<PlayerId, Vec<usize>> = HashMap::new();
        for (i, line) in logs.iter().enumerate() {
            if !games_by_id.contains_key(&line.game_id) {
                return Err(DataError::Invalid(format!(
                    "box score for player {} references unknown game {}",
                    line.player_id, line.game_id
                )));
            }
            logs_by_date.entry(line.date).or_default().push(i);
            logs_by_player.entry(line.player_id).or_default().push(i);
        }

        let mut odds_by_game = HashMap::new();
        for (i, line) in odds.iter().enumerate() {
            if !games_by_id.contains_key(&line.game_id) {
                tracing::warn!(game_id = line.game_id, "odds for unknown game, skipping");
                continue;
            }
            odds_by_game.entry(line.game_id).or_insert(i);
        }

        Ok(Self {
            games,
            logs,
            odds,
            games_by_date,
            games_by_id,
            logs_by_date,
            logs_by_player,
            odds_by_game,
        })
    }

    /// Every date with at least one scheduled game, ascending.
    pub fn season_dates(&self) -> Vec<NaiveDate> {
        let dates: BTreeSet<NaiveDate> = self.games_by_date.keys().copied().collect();
        dates.into_iter().collect()
    }

    pub fn games_on(&self, date: NaiveDate) -> Vec<&GameSummary> {
        self.games_by_date
            .get(&date)
            .map(|idx| idx.iter().map(|&i| &self.games[i]).collect())
            .unwrap_or_default()
    }

    pub fn box_scores_on(&self, date: NaiveDate) -> Vec<&BoxScoreLine> {
        self.logs_by_date
            .get(&date)
            .map(|idx| idx.iter().map(|&i| &self.logs[i]).collect())
            .unwrap_or_default()
    }

    pub fn logs_for_player(&self, player_id: PlayerId) -> Vec<&BoxScoreLine> {
        self.logs_by_player
            .get(&player_id)
            .map(|idx| idx.iter().map(|&i| &self.logs[i]).collect())
            .unwrap_or_default()
    }

    pub fn all_logs(&self) -> &[BoxScoreLine] {
        &self.logs
    }

    pub fn player_exists(&self, player_id: PlayerId) -> bool {
        self.logs_by_player.contains_key(&player_id)
    }

    pub fn player_ids(&self) -> Vec<PlayerId> {
        let ids: BTreeSet<PlayerId> = self.logs_by_player.keys().copied().collect();
        ids.into_iter().collect()
    }

    pub fn game(&self, game_id: GameId) -> Option<&GameSummary> {
        self.games_by_id.get(&game_id).map(|&i| &self.games[i])
    }

    pub fn odds_for(&self, game_id: GameId) -> Option<&GameOdds> {
        self.odds_by_game.get(&game_id).map(|&i| &self.odds[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, day).unwrap()
    }

    fn game(id: GameId, date: NaiveDate) -> GameSummary {
        GameSummary {
            game_id: id,
            date,
            home_team: "BOS".to_string(),
            away_team: "NYK".to_string(),
            home_score: 110,
            away_score: 100,
            is_final: true,
        }
    }

    fn log(player: PlayerId, game_id: GameId, date: NaiveDate) -> BoxScoreLine {
        BoxScoreLine {
            player_id: player,
            player_name: format!("Player {}", player),
            team: "BOS".to_string(),
            game_id,
            date,
            minutes: 30.0,
            pts: 20.0,
            oreb: 1.0,
            dreb: 4.0,
            ast: 5.0,
            stl: 1.0,
            blk: 0.0,
            fgm: 8.0,
            fga: 15.0,
            fg3m: 2.0,
            fg3a: 5.0,
            ftm: 2.0,
            fta: 2.0,
            tov: 2.0,
            pf: 3.0,
        }
    }

    #[test]
    fn test_indexes_and_lookups() {
        let dataset = SeasonDataset::from_parts(
            vec![game(1, d(22)), game(2, d(23))],
            vec![log(100, 1, d(22)), log(100, 2, d(23)), log(101, 1, d(22))],
            vec![],
        )
        .unwrap();

        assert_eq!(dataset.season_dates(), vec![d(22), d(23)]);
        assert_eq!(dataset.games_on(d(22)).len(), 1);
        assert_eq!(dataset.box_scores_on(d(22)).len(), 2);
        assert_eq!(dataset.logs_for_player(100).len(), 2);
        assert!(dataset.player_exists(101));
        assert!(!dataset.player_exists(999));
        assert!(dataset.game(2).is_some());
        assert!(dataset.odds_for(1).is_none());
    }

    #[test]
    fn test_duplicate_game_rejected() {
        let result = SeasonDataset::from_parts(vec![game(1, d(22)), game(1, d(23))], vec![], vec![]);
        assert!(result.is_err());
    }

    #[test]
    fn test_orphan_log_rejected() {
        let result =
            SeasonDataset::from_parts(vec![game(1, d(22))], vec![log(100, 9, d(22))], vec![]);
        assert!(result.is_err());
    }
}
