//! Draft/Roster Engine
//!
//! Assigns every available player to at most one team before the season
//! starts. Turn order is round-robin across teams; the draft transitions
//! `in_progress -> completed` exactly once, and completion is the gate
//! that unlocks simulation.
//!
//! Autopick draws from the top five remaining players by fantasy ranking
//! with harmonically decaying weights, using a ChaCha8 RNG seeded per
//! league so replays of the same league are reproducible.

use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::engine::boxscore::PlayerId;
use crate::engine::error::{EngineError, EngineResult};

/// How many top-ranked candidates autopick samples from.
const AUTOPICK_POOL: usize = 5;

pub type Rosters = BTreeMap<String, Vec<PlayerId>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    InProgress,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftPick {
    pub overall: u32,
    pub team: String,
    pub player_id: PlayerId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Draft {
    pub status: DraftStatus,
    pub roster_size: usize,
    /// Teams in pick order; the cursor rotates round-robin through them.
    order: Vec<String>,
    cursor: usize,
    /// Player ids ranked best-first under the league's scoring profile.
    ranked: Vec<PlayerId>,
    seed: u64,
    picks: Vec<DraftPick>,
}

impl Draft {
    pub fn new(order: Vec<String>, roster_size: usize, ranked: Vec<PlayerId>, seed: u64) -> Self {
        Self {
            status: DraftStatus::InProgress,
            roster_size,
            order,
            cursor: 0,
            ranked,
            seed,
            picks: Vec::new(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == DraftStatus::Completed
    }

    pub fn picks(&self) -> &[DraftPick] {
        &self.picks
    }

    fn taken_ids(rosters: &Rosters) -> HashSet<PlayerId> {
        rosters
            .values()
            .flat_map(|roster| roster.iter().copied())
            .collect()
    }

    /// Remaining draftable players, best-ranked first.
    pub fn available(&self, rosters: &Rosters) -> Vec<PlayerId> {
        let taken = Self::taken_ids(rosters);
        self.ranked
            .iter()
            .copied()
            .filter(|pid| !taken.contains(pid))
            .collect()
    }

    /// The team whose turn it is, skipping teams with full rosters.
    /// `None` once every roster is full.
    pub fn team_on_clock(&self, rosters: &Rosters) -> Option<&str> {
        if self.order.is_empty() {
            return None;
        }
        for offset in 0..self.order.len() {
            let index = (self.cursor + offset) % self.order.len();
            let team = &self.order[index];
            let filled = rosters.get(team).map(|r| r.len()).unwrap_or(0);
            if filled < self.roster_size {
                return Some(team);
            }
        }
        None
    }

    /// Assign `player_id` to the team on the clock.
    pub fn pick(&mut self, rosters: &mut Rosters, player_id: PlayerId) -> EngineResult<String> {
        if self.is_completed() {
            return Err(EngineError::invalid_state("the draft is already complete"));
        }
        let team = self
            .team_on_clock(rosters)
            .ok_or_else(|| EngineError::invalid_state("every roster is already full"))?
            .to_string();
        if !self.ranked.contains(&player_id) {
            return Err(EngineError::not_found(format!(
                "unknown player id {}",
                player_id
            )));
        }
        if Self::taken_ids(rosters).contains(&player_id) {
            return Err(EngineError::validation(format!(
                "player {} has already been drafted",
                player_id
            )));
        }

        let team_index = self
            .order
            .iter()
            .position(|name| name == &team)
            .expect("team on clock comes from the order");
        rosters.entry(team.clone()).or_default().push(player_id);
        self.picks.push(DraftPick {
            overall: self.picks.len() as u32 + 1,
            team: team.clone(),
            player_id,
        });
        self.cursor = (team_index + 1) % self.order.len();
        Ok(team)
    }

    /// Draft the next player for the team on the clock: a weighted
    /// random choice over the top remaining candidates.
    pub fn autopick(&mut self, rosters: &mut Rosters) -> EngineResult<(String, PlayerId)> {
        if self.is_completed() {
            return Err(EngineError::invalid_state("the draft is already complete"));
        }
        let available = self.available(rosters);
        if available.is_empty() {
            return Err(EngineError::validation("no players available to draft"));
        }
        let pool = &available[..available.len().min(AUTOPICK_POOL)];
        let weights: Vec<f64> = (0..pool.len()).map(|i| 1.0 / (i as f64 + 1.0)).collect();
        let dist = WeightedIndex::new(&weights)
            .map_err(|_| EngineError::validation("autopick weights are degenerate"))?;
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed.wrapping_add(self.picks.len() as u64));
        let player_id = pool[dist.sample(&mut rng)];
        let team = self.pick(rosters, player_id)?;
        Ok((team, player_id))
    }

    /// Autopick every remaining slot on every team.
    pub fn autopick_rest(&mut self, rosters: &mut Rosters) -> EngineResult<Vec<DraftPick>> {
        if self.is_completed() {
            return Err(EngineError::invalid_state("the draft is already complete"));
        }
        let start = self.picks.len();
        while self.team_on_clock(rosters).is_some() {
            self.autopick(rosters)?;
        }
        Ok(self.picks[start..].to_vec())
    }

    /// Transition to `completed`. Requires every roster to be full;
    /// terminal — there is no reopening.
    pub fn complete(&mut self, rosters: &Rosters) -> EngineResult<()> {
        if self.is_completed() {
            return Err(EngineError::invalid_state("the draft is already complete"));
        }
        for team in &self.order {
            let filled = rosters.get(team).map(|r| r.len()).unwrap_or(0);
            if filled < self.roster_size {
                return Err(EngineError::invalid_state(format!(
                    "roster for '{}' has {} of {} slots filled",
                    team, filled, self.roster_size
                )));
            }
        }
        self.status = DraftStatus::Completed;
        Ok(())
    }
}
