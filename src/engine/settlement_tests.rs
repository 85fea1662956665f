//! Settlement Boundary and Edge Case Tests
//!
//! Exact contract semantics for wager grading and payout:
//! 1. American/decimal odds conversion round trips
//! 2. Push handling on exact spread/total lines
//! 3. Parlay payout with void legs collapsing to multiplier 1
//! 4. Settlement idempotence and the bankroll identity

use chrono::{NaiveDate, TimeZone, Utc};
use std::collections::HashMap;

use crate::engine::bankroll::BetLedger;
use crate::engine::betting::{BetLeg, LegResult, Market, Selection, SlipKind, SlipStatus};
use crate::engine::boxscore::{GameId, GameSummary};
use crate::engine::odds::{american_to_decimal, decimal_to_american, potential_payout};

fn game(id: GameId, home: i32, away: i32) -> GameSummary {
    GameSummary {
        game_id: id,
        date: NaiveDate::from_ymd_opt(2024, 10, 22).unwrap(),
        home_team: "BOS".to_string(),
        away_team: "NYK".to_string(),
        home_score: home,
        away_score: away,
        is_final: true,
    }
}

fn leg(game_id: GameId, market: Market, selection: Selection, price: i32, point: Option<f64>) -> BetLeg {
    BetLeg {
        game_id,
        market,
        selection,
        price,
        point,
        label: String::new(),
        result: LegResult::Pending,
    }
}

fn finals(games: &[GameSummary]) -> HashMap<GameId, GameSummary> {
    games.iter().map(|g| (g.game_id, g.clone())).collect()
}

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 10, 22, 12, 0, 0).unwrap()
}

// =============================================================================
// ODDS CONVERSION
// =============================================================================

#[test]
fn test_odds_round_trip_minus_150() {
    let decimal = american_to_decimal(-150);
    assert!((decimal - (1.0 + 100.0 / 150.0)).abs() < 1e-12);
    assert_eq!(decimal_to_american(decimal), -150);
}

#[test]
fn test_moneyline_minus_110_payout() {
    // Stake 50 at -110: 50 * (1 + 100/110) = 95.45 gross.
    let payout = potential_payout(50.0, [-110]);
    assert!((payout - 95.4545).abs() < 1e-3);
}

// =============================================================================
// PUSH HANDLING
// =============================================================================

#[test]
fn test_spread_exact_line_is_void() {
    // Home -5.5 laid as point -5.5; home wins by exactly 5.5 is
    // impossible with integer scores, so use a -5 line landing exactly.
    let g = game(1, 105, 100);
    let exact = leg(1, Market::Spread, Selection::Home, -110, Some(-5.0));
    assert_eq!(exact.grade(Some(&g)), LegResult::Void);

    let covers = leg(1, Market::Spread, Selection::Home, -110, Some(-4.5));
    assert_eq!(covers.grade(Some(&g)), LegResult::Won);

    let misses = leg(1, Market::Spread, Selection::Home, -110, Some(-5.5));
    assert_eq!(misses.grade(Some(&g)), LegResult::Lost);
}

#[test]
fn test_total_exact_line_is_void() {
    let g = game(1, 112, 108);
    let exact_over = leg(1, Market::Total, Selection::Over, -110, Some(220.0));
    assert_eq!(exact_over.grade(Some(&g)), LegResult::Void);
    let exact_under = leg(1, Market::Total, Selection::Under, -110, Some(220.0));
    assert_eq!(exact_under.grade(Some(&g)), LegResult::Void);

    let over = leg(1, Market::Total, Selection::Over, -110, Some(219.5));
    assert_eq!(over.grade(Some(&g)), LegResult::Won);
    let under = leg(1, Market::Total, Selection::Under, -110, Some(219.5));
    assert_eq!(under.grade(Some(&g)), LegResult::Lost);
}

#[test]
fn test_moneyline_tie_stays_pending() {
    let g = game(1, 100, 100);
    let pick = leg(1, Market::Moneyline, Selection::Home, -110, None);
    assert_eq!(pick.grade(Some(&g)), LegResult::Pending);
}

#[test]
fn test_non_final_game_stays_pending() {
    let mut g = game(1, 100, 90);
    g.is_final = false;
    let pick = leg(1, Market::Moneyline, Selection::Home, -110, None);
    assert_eq!(pick.grade(Some(&g)), LegResult::Pending);
    assert_eq!(pick.grade(None), LegResult::Pending);
}

// =============================================================================
// PARLAY PAYOUT
// =============================================================================

#[test]
fn test_parlay_void_plus_won_pays_single_leg() {
    // Leg A pushes (total lands exactly); leg B wins at +150.
    // Stake 10 pays 10 * 2.5 = 25.00.
    let games = [game(1, 110, 110), game(2, 120, 100)];
    let mut ledger = BetLedger::new(1000.0);
    ledger
        .place(
            "slip-1",
            SlipKind::Parlay,
            10.0,
            vec![
                leg(1, Market::Total, Selection::Over, -110, Some(220.0)),
                leg(2, Market::Moneyline, Selection::Home, 150, None),
            ],
            now(),
        )
        .unwrap();

    let settled = ledger.settle_pending(&finals(&games), now());
    assert_eq!(settled.len(), 1);
    assert_eq!(settled[0].status, SlipStatus::Won);
    assert!((settled[0].payout - 25.0).abs() < 1e-9);
    assert!(ledger.verify_balance());
}

#[test]
fn test_parlay_all_void_returns_stake() {
    let games = [game(1, 110, 110), game(2, 105, 100)];
    let mut ledger = BetLedger::new(500.0);
    ledger
        .place(
            "slip-1",
            SlipKind::Parlay,
            40.0,
            vec![
                leg(1, Market::Total, Selection::Over, -110, Some(220.0)),
                leg(2, Market::Spread, Selection::Home, -110, Some(-5.0)),
            ],
            now(),
        )
        .unwrap();

    let settled = ledger.settle_pending(&finals(&games), now());
    assert_eq!(settled[0].status, SlipStatus::Void);
    assert_eq!(settled[0].payout, 40.0);
    assert!((ledger.available - 500.0).abs() < 1e-9);
    assert!(ledger.verify_balance());
}

#[test]
fn test_parlay_any_lost_loses_slip() {
    let games = [game(1, 110, 100), game(2, 90, 100)];
    let mut ledger = BetLedger::new(500.0);
    ledger
        .place(
            "slip-1",
            SlipKind::Parlay,
            25.0,
            vec![
                leg(1, Market::Moneyline, Selection::Home, -120, None),
                leg(2, Market::Moneyline, Selection::Home, 130, None),
            ],
            now(),
        )
        .unwrap();

    let settled = ledger.settle_pending(&finals(&games), now());
    assert_eq!(settled[0].status, SlipStatus::Lost);
    assert_eq!(settled[0].payout, 0.0);
    assert!((ledger.available - 475.0).abs() < 1e-9);
    assert!(ledger.verify_balance());
}

// =============================================================================
// IDEMPOTENCE AND PARTIAL RESOLUTION
// =============================================================================

#[test]
fn test_settlement_is_idempotent() {
    let games = [game(1, 110, 100)];
    let mut ledger = BetLedger::new(200.0);
    ledger
        .place(
            "slip-1",
            SlipKind::Single,
            50.0,
            vec![leg(1, Market::Moneyline, Selection::Home, -110, None)],
            now(),
        )
        .unwrap();

    let f = finals(&games);
    let first = ledger.settle_pending(&f, now());
    assert_eq!(first.len(), 1);
    let after_first = ledger.available;

    // Re-settling must not credit anything again.
    let second = ledger.settle_pending(&f, now());
    assert!(second.is_empty());
    assert_eq!(ledger.available, after_first);
    assert!(ledger.verify_balance());
}

#[test]
fn test_slip_with_unresolved_leg_stays_pending() {
    // Only game 1 has a final; the parlay waits for game 2.
    let games = [game(1, 110, 100)];
    let mut ledger = BetLedger::new(200.0);
    ledger
        .place(
            "slip-1",
            SlipKind::Parlay,
            20.0,
            vec![
                leg(1, Market::Moneyline, Selection::Home, -110, None),
                leg(2, Market::Moneyline, Selection::Away, 120, None),
            ],
            now(),
        )
        .unwrap();

    let settled = ledger.settle_pending(&finals(&games), now());
    assert!(settled.is_empty());
    assert_eq!(ledger.pending.len(), 1);
    assert_eq!(ledger.pending[0].status, SlipStatus::Pending);
    // Stake stays committed while pending.
    assert!((ledger.available - 180.0).abs() < 1e-9);
    assert!(ledger.verify_balance());
}

// =============================================================================
// PLACEMENT VALIDATION
// =============================================================================

#[test]
fn test_stake_validation() {
    let mut ledger = BetLedger::new(100.0);
    let ml = vec![leg(1, Market::Moneyline, Selection::Home, -110, None)];

    let err = ledger
        .place("s1", SlipKind::Single, 0.0, ml.clone(), now())
        .unwrap_err();
    assert_eq!(err.kind(), "validation");

    let err = ledger
        .place("s2", SlipKind::Single, 150.0, ml.clone(), now())
        .unwrap_err();
    assert_eq!(err.kind(), "validation");

    ledger.place("s3", SlipKind::Single, 100.0, ml, now()).unwrap();
    assert!(ledger.available.abs() < 1e-9);
}

#[test]
fn test_parlay_requires_distinct_games() {
    let mut ledger = BetLedger::new(100.0);
    let err = ledger
        .place(
            "s1",
            SlipKind::Parlay,
            10.0,
            vec![
                leg(1, Market::Moneyline, Selection::Home, -110, None),
                leg(1, Market::Total, Selection::Over, -110, Some(220.0)),
            ],
            now(),
        )
        .unwrap_err();
    assert_eq!(err.kind(), "validation");
    // Rejected before any debit.
    assert_eq!(ledger.available, 100.0);
}
