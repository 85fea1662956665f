//! Season Replay Engine
//!
//! Deterministic replay of a completed basketball season: fantasy
//! scoring, head-to-head matchups, playoff brackets, and simulated
//! sportsbook wagering against pre-recorded finals.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        LeagueState                              │
//! │  (single aggregate per league, atomic operations)               │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//!        ┌───────────────────────┼───────────────────────┐
//!        ▼                       ▼                       ▼
//! ┌─────────────┐        ┌─────────────┐        ┌─────────────┐
//! │ SeasonCal-  │        │   Draft     │        │  Weekly     │
//! │ endar       │        │  (rosters)  │        │  Schedule   │
//! └──────┬──────┘        └─────────────┘        └──────┬──────┘
//!        │ advance/simulate                            │ standings
//!        ▼                                             ▼
//! ┌─────────────┐        ┌─────────────┐        ┌─────────────┐
//! │ Scoring     │───────▶│  BetLedger  │        │  Playoff    │
//! │ (fantasy)   │ totals │ (settlement)│        │  Bracket    │
//! └─────────────┘        └─────────────┘        └─────────────┘
//! ```
//!
//! # Determinism Guarantees
//!
//! - **Calendar**: the index only moves forward; one authoritative
//!   current date per league.
//! - **RNG**: autopick uses a `ChaCha8Rng` seeded from the league seed
//!   and pick count, so identical configs draft identically.
//! - **Settlement**: slips settle exactly once; replaying a settled
//!   slip is a no-op.

pub mod bankroll;
pub mod betting;
pub mod boxscore;
pub mod calendar;
pub mod draft;
pub mod error;
pub mod league;
pub mod odds;
pub mod playoffs;
pub mod profile;
pub mod scoring;
pub mod weekly;

#[cfg(test)]
mod settlement_tests;

// Re-exports for convenience
pub use bankroll::{BankrollSummary, BetLedger};
pub use betting::{
    BetLeg, BetSlip, LegResult, Market, Selection, SlipKind, SlipStatus, PUSH_EPSILON,
};
pub use boxscore::{BoxScoreLine, GameId, GameSummary, PlayerId};
pub use calendar::SeasonCalendar;
pub use draft::{Draft, DraftPick, DraftStatus, Rosters};
pub use error::{EngineError, EngineResult};
pub use league::{
    BetsView, CalendarState, DayResult, DraftSummary, GameBoxScore, LeagueConfig, LeagueState,
    PlayerContribution, RosterSummary, StandingsEntry, TeamDayResult, WeekView, WeeksView,
};
pub use odds::{
    american_to_decimal, decimal_to_american, implied_probability, parlay_american_odds,
    parlay_decimal_odds, potential_payout, AmericanPrice,
};
pub use playoffs::{
    BracketInputs, BracketStatus, PlayoffBracket, PlayoffConfig, PlayoffMatchup, PlayoffRound,
    PlayoffSeed, RoundKind,
};
pub use profile::{build_player_profile, GameLogEntry, PlayerProfile, WindowSummary};
pub use scoring::{
    player_season_averages, PlayerSeasonAverages, ProfileCatalog, ScoringProfile, StatKey,
};
pub use weekly::{
    round_robin_pairings, week_status, week_windows, Matchup, StandingRow, WeekStatus, WeekWindow,
    WeeklySchedule,
};
