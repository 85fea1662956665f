//! Integration test for the full replay stack
//!
//! Exercises the crate the way the server does: a season data file on
//! disk, a league store directory, and a league driven from draft to
//! season completion with a wager settling along the way. Reopening
//! the store afterwards must recover the finished league intact.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fs;

use hoopsight_backend::data::{GameOdds, SeasonDataFile, SeasonDataset};
use hoopsight_backend::engine::betting::{BetLeg, LegResult, Market, Selection, SlipKind, SlipStatus};
use hoopsight_backend::engine::boxscore::{BoxScoreLine, GameId, GameSummary, PlayerId};
use hoopsight_backend::engine::league::{LeagueConfig, LeagueState};
use hoopsight_backend::engine::scoring::{ProfileCatalog, ScoringProfile, StatKey};
use hoopsight_backend::engine::weekly::WeekStatus;
use hoopsight_backend::store::LeagueStore;

fn d(m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, day).unwrap()
}

fn log(player: PlayerId, name: &str, game_id: GameId, date: NaiveDate, pts: f64) -> BoxScoreLine {
    BoxScoreLine {
        player_id: player,
        player_name: name.to_string(),
        team: "BOS".to_string(),
        game_id,
        date,
        minutes: 30.0,
        pts,
        oreb: 1.0,
        dreb: 3.0,
        ast: 4.0,
        stl: 1.0,
        blk: 0.0,
        fgm: 9.0,
        fga: 18.0,
        fg3m: 2.0,
        fg3a: 6.0,
        ftm: 2.0,
        fta: 2.0,
        tov: 2.0,
        pf: 1.0,
    }
}

/// Four game dates across two scoring weeks, with moneyline and spread
/// lines attached to the opening game.
fn season_file() -> SeasonDataFile {
    let dates = [d(10, 22), d(10, 24), d(10, 28), d(10, 30)];
    let mut games = Vec::new();
    let mut player_logs = Vec::new();
    for (i, &date) in dates.iter().enumerate() {
        let id = (i + 1) as GameId;
        games.push(GameSummary {
            game_id: id,
            date,
            home_team: "BOS".to_string(),
            away_team: "NYK".to_string(),
            home_score: 112,
            away_score: 104,
            is_final: true,
        });
        player_logs.push(log(1, "Player X", id, date, 30.0));
        player_logs.push(log(2, "Player Y", id, date, 20.0));
    }
    let odds = vec![GameOdds {
        game_id: 1,
        bookmaker: "consensus".to_string(),
        home_moneyline: -150,
        away_moneyline: 130,
        spread_point: -4.5,
        home_spread_price: -110,
        away_spread_price: -110,
        total_point: 215.5,
        over_price: -110,
        under_price: -110,
    }];
    SeasonDataFile {
        games,
        player_logs,
        odds,
    }
}

fn catalog() -> ProfileCatalog {
    let mut catalog = ProfileCatalog::builtin();
    let mut weights = BTreeMap::new();
    weights.insert(StatKey::Pts, 1.0);
    catalog
        .upsert("pts_only", ScoringProfile::new("Points Only", weights), false)
        .unwrap();
    catalog
}

#[test]
fn test_full_replay_through_store() {
    let dir = tempfile::tempdir().unwrap();
    let season_path = dir.path().join("season.json");
    fs::write(
        &season_path,
        serde_json::to_string_pretty(&season_file()).unwrap(),
    )
    .unwrap();
    let dataset = SeasonDataset::from_file(&season_path).unwrap();
    assert_eq!(dataset.season_dates().len(), 4);

    let store_dir = dir.path().join("leagues");
    let store = LeagueStore::open(&store_dir).unwrap();

    let config = LeagueConfig {
        league_id: "replay-2024".to_string(),
        name: "Replay League".to_string(),
        team_count: 2,
        team_names: vec!["Alpha".to_string(), "Beta".to_string()],
        roster_size: 1,
        scoring_profile: Some("pts_only".to_string()),
        initial_bankroll: 1000.0,
        seed: 42,
    };
    let handle = store
        .create(LeagueState::new(config, &catalog(), &dataset).unwrap())
        .unwrap();

    {
        let mut league = handle.lock();
        league.draft_pick(1).unwrap();
        league.draft_pick(2).unwrap();
        league.draft_complete().unwrap();

        // Home side covers -4.5 at -110; settles on the first day.
        league
            .place_bet(
                &dataset,
                "slip-1".to_string(),
                SlipKind::Single,
                100.0,
                vec![BetLeg {
                    game_id: 1,
                    market: Market::Spread,
                    selection: Selection::Home,
                    price: -110,
                    point: Some(-4.5),
                    label: "BOS -4.5".to_string(),
                    result: LegResult::Pending,
                }],
            )
            .unwrap();
        assert!((league.bankroll().available - 900.0).abs() < 1e-9);

        let days = league.autoplay(&dataset).unwrap();
        assert_eq!(days.len(), 4);
        assert_eq!(days[0].settled_slips.len(), 1);
        assert_eq!(days[0].settled_slips[0].status, SlipStatus::Won);
        // 100 at -110 returns 190.91 gross.
        assert!((league.bankroll().available - 1090.9090).abs() < 1e-3);

        let weeks = league.weeks_view();
        assert!(weeks.weeks.iter().all(|w| w.status == WeekStatus::Completed));
        assert_eq!(weeks.standings[0].row.team, "Alpha");
        assert_eq!(weeks.standings[0].row.wins, 2);

        assert!(league.calendar_state().season_complete);
        store.persist(&league).unwrap();
    }

    // A fresh store over the same directory sees the finished league.
    drop(store);
    let reopened = LeagueStore::open(&store_dir).unwrap();
    let listed = reopened.list();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].league_id, "replay-2024");
    assert!(listed[0].season_complete);

    let handle = reopened.league("replay-2024").unwrap();
    let league = handle.lock();
    assert_eq!(league.history().len(), 4);
    assert!((league.bankroll().available - 1090.9090).abs() < 1e-3);
    assert_eq!(league.bets_view().settled.len(), 1);
}

#[test]
fn test_dataset_rejects_orphan_logs() {
    let mut file = season_file();
    file.player_logs.push(log(3, "Ghost", 99, d(10, 22), 10.0));
    let err = SeasonDataset::from_parts(file.games, file.player_logs, file.odds).unwrap_err();
    assert!(err.to_string().contains("unknown game"));
}
