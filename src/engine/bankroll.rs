//! Bankroll & Bet Ledger
//!
//! Tracks the available balance and the pending/settled slip
//! collections. Stake is debited at placement; payout is credited
//! exactly once at settlement.
//!
//! # Invariant
//!
//! `available = initial + Σ(settled payout − stake) − pending stake`
//! holds after every operation, and [`BetLedger::verify_balance`]
//! checks it directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::engine::betting::{BetLeg, BetSlip, SlipKind};
use crate::engine::boxscore::{GameId, GameSummary};
use crate::engine::error::{EngineError, EngineResult};

const MONEY_EPSILON: f64 = 1e-9;

/// Snapshot of bankroll health, derived from the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankrollSummary {
    pub initial: f64,
    pub available: f64,
    pub pending_stake: f64,
    pub pending_potential: f64,
    pub pending_count: usize,
    pub settled_count: usize,
}

/// Bankroll plus the full wager history for one league.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetLedger {
    pub initial: f64,
    pub available: f64,
    pub pending: Vec<BetSlip>,
    pub settled: Vec<BetSlip>,
}

impl BetLedger {
    pub fn new(initial: f64) -> Self {
        Self {
            initial,
            available: initial,
            pending: Vec::new(),
            settled: Vec::new(),
        }
    }

    /// Validate and place a slip, debiting the stake.
    pub fn place(
        &mut self,
        slip_id: impl Into<String>,
        kind: SlipKind,
        stake: f64,
        legs: Vec<BetLeg>,
        now: DateTime<Utc>,
    ) -> EngineResult<&BetSlip> {
        if !stake.is_finite() || stake <= MONEY_EPSILON {
            return Err(EngineError::validation("stake must be positive"));
        }
        if stake > self.available + MONEY_EPSILON {
            return Err(EngineError::validation(format!(
                "stake {:.2} exceeds available bankroll {:.2}",
                stake, self.available
            )));
        }
        match kind {
            SlipKind::Single => {
                if legs.len() != 1 {
                    return Err(EngineError::validation(
                        "a single slip must have exactly one leg",
                    ));
                }
            }
            SlipKind::Parlay => {
                if legs.len() < 2 {
                    return Err(EngineError::validation(
                        "a parlay slip must have at least two legs",
                    ));
                }
                let mut game_ids: Vec<GameId> = legs.iter().map(|leg| leg.game_id).collect();
                game_ids.sort_unstable();
                game_ids.dedup();
                if game_ids.len() != legs.len() {
                    return Err(EngineError::validation(
                        "parlay legs must reference distinct games",
                    ));
                }
            }
        }

        self.available -= stake;
        self.pending
            .push(BetSlip::new(slip_id, kind, stake, legs, now));
        Ok(self.pending.last().expect("slip just pushed"))
    }

    /// Settle every pending slip that can be fully resolved against the
    /// supplied final scores, crediting payouts. Returns the slips that
    /// settled during this call.
    ///
    /// Safe to invoke repeatedly with a growing set of finals: slips with
    /// unresolved legs stay pending and already-settled slips are never
    /// re-credited.
    pub fn settle_pending(
        &mut self,
        finals: &HashMap<GameId, GameSummary>,
        now: DateTime<Utc>,
    ) -> Vec<BetSlip> {
        let mut newly_settled = Vec::new();
        let mut still_pending = Vec::new();

        for mut slip in self.pending.drain(..) {
            if slip.settle(finals, now) {
                self.available += slip.payout;
                newly_settled.push(slip.clone());
                self.settled.push(slip);
            } else {
                still_pending.push(slip);
            }
        }
        self.pending = still_pending;
        newly_settled
    }

    pub fn pending_stake(&self) -> f64 {
        self.pending.iter().map(|slip| slip.stake).sum()
    }

    pub fn pending_potential(&self) -> f64 {
        self.pending.iter().map(|slip| slip.potential_payout).sum()
    }

    pub fn summary(&self) -> BankrollSummary {
        BankrollSummary {
            initial: self.initial,
            available: self.available,
            pending_stake: self.pending_stake(),
            pending_potential: self.pending_potential(),
            pending_count: self.pending.len(),
            settled_count: self.settled.len(),
        }
    }

    /// Check the bankroll identity against the slip history.
    pub fn verify_balance(&self) -> bool {
        let settled_net: f64 = self
            .settled
            .iter()
            .map(|slip| slip.payout - slip.stake)
            .sum();
        let expected = self.initial + settled_net - self.pending_stake();
        (self.available - expected).abs() < 1e-6
    }

    pub fn find_slip(&self, slip_id: &str) -> Option<&BetSlip> {
        self.pending
            .iter()
            .chain(self.settled.iter())
            .find(|slip| slip.slip_id == slip_id)
    }
}
