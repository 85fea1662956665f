//! Leg/Slip Settlement
//!
//! Grades a single wager leg (moneyline / spread / total) against a
//! final box score and combines legs into a slip outcome with payout.
//!
//! # Settlement Contract
//!
//! - A leg grades `Pending` until its game has a final score.
//! - Spread/total lines matched exactly (within [`PUSH_EPSILON`]) grade
//!   `Void`: stake is returned for that leg, and a void parlay leg
//!   contributes a multiplier of 1 instead of invalidating the slip.
//! - A moneyline tie never auto-resolves: malformed data cannot invent a
//!   payout rule, so the leg stays `Pending`.
//! - Settlement is idempotent: re-settling a settled slip is a no-op.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::engine::boxscore::{GameId, GameSummary};
use crate::engine::odds::{self, AmericanPrice};

/// Float tolerance for exact-push comparison on spread/total lines.
pub const PUSH_EPSILON: f64 = 1e-9;

/// Wager market type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    Moneyline,
    Spread,
    Total,
}

/// Side of the market a leg backs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Selection {
    Home,
    Away,
    Over,
    Under,
}

/// Per-leg settlement result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LegResult {
    #[default]
    Pending,
    Won,
    Lost,
    Void,
}

/// Slip composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlipKind {
    Single,
    Parlay,
}

/// Slip-level status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SlipStatus {
    #[default]
    Pending,
    Won,
    Lost,
    Void,
}

/// One leg of a wager. Immutable after placement except for the
/// settlement result tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetLeg {
    pub game_id: GameId,
    pub market: Market,
    pub selection: Selection,
    pub price: AmericanPrice,
    /// Spread or total line. Ignored for moneyline legs.
    pub point: Option<f64>,
    /// Display label carried through from placement (e.g. "BOS -5.5").
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub result: LegResult,
}

impl BetLeg {
    /// Grade this leg against a game's final score without mutating it.
    pub fn grade(&self, game: Option<&GameSummary>) -> LegResult {
        let Some(game) = game else {
            return LegResult::Pending;
        };
        if !game.is_final {
            return LegResult::Pending;
        }
        let home = game.home_score as f64;
        let away = game.away_score as f64;

        match self.market {
            Market::Moneyline => {
                // A tie cannot occur in basketball finals, but malformed
                // data must not crash or invent a payout: stay pending.
                if (home - away).abs() < PUSH_EPSILON {
                    return LegResult::Pending;
                }
                let home_won = home > away;
                let picked_home = matches!(self.selection, Selection::Home);
                if !matches!(self.selection, Selection::Home | Selection::Away) {
                    return LegResult::Lost;
                }
                if picked_home == home_won {
                    LegResult::Won
                } else {
                    LegResult::Lost
                }
            }
            Market::Spread => {
                let point = self.point.unwrap_or(0.0);
                let (selected, opponent) = match self.selection {
                    Selection::Home => (home, away),
                    Selection::Away => (away, home),
                    _ => return LegResult::Lost,
                };
                let adjusted = selected + point;
                if (adjusted - opponent).abs() < PUSH_EPSILON {
                    LegResult::Void
                } else if adjusted > opponent {
                    LegResult::Won
                } else {
                    LegResult::Lost
                }
            }
            Market::Total => {
                let point = self.point.unwrap_or(0.0);
                let total = home + away;
                if (total - point).abs() < PUSH_EPSILON {
                    return LegResult::Void;
                }
                match self.selection {
                    Selection::Over => {
                        if total > point {
                            LegResult::Won
                        } else {
                            LegResult::Lost
                        }
                    }
                    Selection::Under => {
                        if total < point {
                            LegResult::Won
                        } else {
                            LegResult::Lost
                        }
                    }
                    _ => LegResult::Lost,
                }
            }
        }
    }
}

/// A placed wager: one leg (single) or two-plus legs (parlay).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetSlip {
    pub slip_id: String,
    pub kind: SlipKind,
    pub stake: f64,
    pub legs: Vec<BetLeg>,
    pub status: SlipStatus,
    pub placed_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
    /// Gross payout if every leg wins, fixed at placement time.
    pub potential_payout: f64,
    /// Gross payout once settled (stake included); 0 until then.
    pub payout: f64,
}

impl BetSlip {
    pub fn new(
        slip_id: impl Into<String>,
        kind: SlipKind,
        stake: f64,
        legs: Vec<BetLeg>,
        placed_at: DateTime<Utc>,
    ) -> Self {
        let potential = odds::potential_payout(stake, legs.iter().map(|leg| leg.price));
        Self {
            slip_id: slip_id.into(),
            kind,
            stake,
            legs,
            status: SlipStatus::Pending,
            placed_at,
            settled_at: None,
            potential_payout: potential,
            payout: 0.0,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.status != SlipStatus::Pending
    }

    /// Attempt settlement against the supplied final scores.
    ///
    /// Returns `true` only when the slip transitions out of `Pending`
    /// during this call. Already-settled slips are untouched, and a slip
    /// with any unresolved leg stays pending with a zero payout.
    pub fn settle(
        &mut self,
        finals: &HashMap<GameId, GameSummary>,
        now: DateTime<Utc>,
    ) -> bool {
        if self.is_settled() {
            return false;
        }

        let mut all_resolved = true;
        for leg in &mut self.legs {
            let result = leg.grade(finals.get(&leg.game_id));
            leg.result = result;
            if result == LegResult::Pending {
                all_resolved = false;
            }
        }
        if !all_resolved {
            self.payout = 0.0;
            return false;
        }

        if self.legs.iter().any(|leg| leg.result == LegResult::Lost) {
            self.status = SlipStatus::Lost;
            self.payout = 0.0;
            self.settled_at = Some(now);
            return true;
        }

        let winning_prices: Vec<AmericanPrice> = self
            .legs
            .iter()
            .filter(|leg| leg.result == LegResult::Won)
            .map(|leg| leg.price)
            .collect();

        if winning_prices.is_empty() {
            // Every leg pushed: stake returned, no profit or loss.
            self.status = SlipStatus::Void;
            self.payout = self.stake;
        } else {
            // Void legs drop out of the multiplier product.
            self.status = SlipStatus::Won;
            self.payout = odds::potential_payout(self.stake, winning_prices);
        }
        self.settled_at = Some(now);
        true
    }

    /// Net winnings relative to the stake; 0 until settled.
    pub fn winnings(&self) -> f64 {
        if self.is_settled() {
            self.payout - self.stake
        } else {
            0.0
        }
    }
}
