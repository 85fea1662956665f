//! Player Profile & Rolling Windows
//!
//! Per-player summary card: today / last 7 / last 14 / last 30 days and
//! season-to-date averages, all clamped to the league's latest simulated
//! date so a replay never leaks future games. Averages count only games
//! actually played (minutes > 0).

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::engine::boxscore::{BoxScoreLine, GameId, PlayerId};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::scoring::{player_season_averages, ScoringProfile, StatKey};

/// Raw per-game stat averages surfaced on a summary row.
const SUMMARY_KEYS: [StatKey; 16] = [
    StatKey::Min,
    StatKey::Pts,
    StatKey::Fgm,
    StatKey::Fga,
    StatKey::Fg3m,
    StatKey::Fg3a,
    StatKey::Ftm,
    StatKey::Fta,
    StatKey::Oreb,
    StatKey::Dreb,
    StatKey::Reb,
    StatKey::Ast,
    StatKey::Stl,
    StatKey::Blk,
    StatKey::Tov,
    StatKey::Pf,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSummary {
    pub label: String,
    pub games_played: usize,
    pub fantasy_avg: f64,
    pub fantasy_total: f64,
    pub stats: BTreeMap<StatKey, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameLogEntry {
    pub game_id: GameId,
    pub date: NaiveDate,
    pub played: bool,
    pub fantasy_points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub player_id: PlayerId,
    pub player_name: String,
    pub team: String,
    pub scoring_profile: String,
    pub season_rank: Option<usize>,
    pub season_fantasy_avg: Option<f64>,
    pub summary: Vec<WindowSummary>,
    /// Most recent first, clamped to the profile's `through` date.
    pub game_log: Vec<GameLogEntry>,
}

fn summarize(label: &str, lines: &[&BoxScoreLine], profile: &ScoringProfile) -> WindowSummary {
    let played: Vec<&&BoxScoreLine> = lines.iter().filter(|l| l.played()).collect();
    let games = played.len();
    let fantasy_total: f64 = played.iter().map(|l| profile.fantasy_points(l)).sum();
    let mut stats = BTreeMap::new();
    for key in SUMMARY_KEYS {
        let total: f64 = played.iter().map(|l| l.stat(key)).sum();
        stats.insert(key, if games == 0 { 0.0 } else { total / games as f64 });
    }
    WindowSummary {
        label: label.to_string(),
        games_played: games,
        fantasy_avg: if games == 0 {
            0.0
        } else {
            fantasy_total / games as f64
        },
        fantasy_total,
        stats,
    }
}

/// Build a player's profile card against the full set of season logs.
///
/// `through` is the latest simulated date; games after it are invisible
/// and the Today/7/14/30-day windows are anchored on it. With `None`
/// there is no anchor, so every window (including "Today") covers the
/// whole season; callers wanting rolling windows must pass the league's
/// latest simulated date, as [`LeagueState::player_profile`] does.
///
/// [`LeagueState::player_profile`]: crate::engine::league::LeagueState::player_profile
pub fn build_player_profile(
    player_id: PlayerId,
    all_logs: &[BoxScoreLine],
    profile: &ScoringProfile,
    through: Option<NaiveDate>,
) -> EngineResult<PlayerProfile> {
    let mut past: Vec<&BoxScoreLine> = all_logs
        .iter()
        .filter(|l| l.player_id == player_id)
        .filter(|l| through.map_or(true, |d| l.date <= d))
        .collect();
    if past.is_empty() {
        return Err(EngineError::not_found(format!(
            "no game logs for player id {}",
            player_id
        )));
    }
    past.sort_by_key(|l| l.date);

    let player_name = past[0].player_name.clone();
    let team = past[past.len() - 1].team.clone();

    let in_window = |days_back: i64| -> Vec<&BoxScoreLine> {
        match through {
            Some(end) => {
                let start = end - Duration::days(days_back - 1);
                past.iter()
                    .copied()
                    .filter(|l| l.date >= start)
                    .collect()
            }
            None => past.clone(),
        }
    };
    let today: Vec<&BoxScoreLine> = match through {
        Some(end) => past.iter().copied().filter(|l| l.date == end).collect(),
        None => past.clone(),
    };

    let summary = vec![
        summarize("Today", &today, profile),
        summarize("Last 7 Days (avg)", &in_window(7), profile),
        summarize("Last 14 Days (avg)", &in_window(14), profile),
        summarize("Last 30 Days (avg)", &in_window(30), profile),
        summarize("Season (avg)", &past, profile),
    ];

    // League-wide rank by season fantasy average through the same date.
    let visible: Vec<BoxScoreLine> = all_logs
        .iter()
        .filter(|l| through.map_or(true, |d| l.date <= d))
        .cloned()
        .collect();
    let ranked = player_season_averages(&visible, profile);
    let (season_rank, season_fantasy_avg) = ranked
        .iter()
        .position(|avg| avg.player_id == player_id)
        .map(|i| (Some(i + 1), Some(ranked[i].fantasy_avg)))
        .unwrap_or((None, None));

    let mut game_log: Vec<GameLogEntry> = past
        .iter()
        .map(|l| GameLogEntry {
            game_id: l.game_id,
            date: l.date,
            played: l.played(),
            fantasy_points: if l.played() {
                profile.fantasy_points(l)
            } else {
                0.0
            },
        })
        .collect();
    game_log.reverse();

    Ok(PlayerProfile {
        player_id,
        player_name,
        team,
        scoring_profile: profile.name.clone(),
        season_rank,
        season_fantasy_avg,
        summary,
        game_log,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 11, day).unwrap()
    }

    fn line(player_id: PlayerId, game_id: GameId, date: NaiveDate, pts: f64, min: f64) -> BoxScoreLine {
        BoxScoreLine {
            player_id,
            player_name: format!("Player {}", player_id),
            team: "BOS".to_string(),
            game_id,
            date,
            minutes: min,
            pts,
            oreb: 0.0,
            dreb: 0.0,
            ast: 0.0,
            stl: 0.0,
            blk: 0.0,
            fgm: 0.0,
            fga: 0.0,
            fg3m: 0.0,
            fg3a: 0.0,
            ftm: 0.0,
            fta: 0.0,
            tov: 0.0,
            pf: 0.0,
        }
    }

    fn pts_profile() -> ScoringProfile {
        let mut weights = BTreeMap::new();
        weights.insert(StatKey::Pts, 1.0);
        ScoringProfile {
            name: "pts".to_string(),
            weights,
        }
    }

    #[test]
    fn test_windows_clamp_to_through_date() {
        let logs = vec![
            line(1, 10, d(1), 10.0, 30.0),
            line(1, 11, d(10), 20.0, 30.0),
            line(1, 12, d(16), 30.0, 30.0),
            // Future relative to the clamp; must not appear anywhere.
            line(1, 13, d(20), 99.0, 30.0),
        ];
        let profile = build_player_profile(1, &logs, &pts_profile(), Some(d(16))).unwrap();

        let by_label = |label: &str| {
            profile
                .summary
                .iter()
                .find(|s| s.label == label)
                .unwrap()
                .clone()
        };
        assert_eq!(by_label("Today").fantasy_total, 30.0);
        // Last 7 days = Nov 10 through Nov 16.
        assert_eq!(by_label("Last 7 Days (avg)").games_played, 2);
        assert_eq!(by_label("Last 7 Days (avg)").fantasy_avg, 25.0);
        assert_eq!(by_label("Season (avg)").games_played, 3);
        assert_eq!(profile.game_log.len(), 3);
        assert_eq!(profile.game_log[0].date, d(16));
    }

    #[test]
    fn test_dnp_games_excluded_from_averages() {
        let logs = vec![
            line(1, 10, d(1), 20.0, 30.0),
            line(1, 11, d(2), 0.0, 0.0),
        ];
        let profile = build_player_profile(1, &logs, &pts_profile(), Some(d(2))).unwrap();
        let season = profile.summary.last().unwrap();
        assert_eq!(season.games_played, 1);
        assert_eq!(season.fantasy_avg, 20.0);
        // The DNP still shows in the log, flagged as not played.
        assert_eq!(profile.game_log.len(), 2);
        assert!(!profile.game_log[0].played);
    }

    #[test]
    fn test_rank_orders_by_season_average() {
        let logs = vec![
            line(1, 10, d(1), 20.0, 30.0),
            line(2, 10, d(1), 35.0, 30.0),
        ];
        let profile = build_player_profile(1, &logs, &pts_profile(), Some(d(1))).unwrap();
        assert_eq!(profile.season_rank, Some(2));
        assert_eq!(profile.season_fantasy_avg, Some(20.0));
    }

    #[test]
    fn test_unknown_player_not_found() {
        let err = build_player_profile(42, &[], &pts_profile(), None).unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }
}
