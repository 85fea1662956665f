//! Season Calendar & Simulation Clock
//!
//! The ordered, immutable sequence of season game dates and the cursor
//! that advances through them one day at a time. The current index is
//! the single authoritative "where are we" for a league: the date whose
//! games are visible is always `current_date()`, and "awaiting
//! simulation" is a flag on that date, never a second date that can
//! drift.
//!
//! # Determinism Contract
//!
//! - `current_index` only moves forward; there is no rewind short of a
//!   full league reset.
//! - `advance()` refuses to skip a day whose games have not been
//!   simulated.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::engine::error::{EngineError, EngineResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonCalendar {
    dates: Vec<NaiveDate>,
    current_index: usize,
    awaiting_simulation: bool,
}

impl SeasonCalendar {
    /// Build a calendar from the season's game dates. Input is sorted
    /// and deduplicated; an empty input yields an already-complete season.
    pub fn new(mut dates: Vec<NaiveDate>) -> Self {
        dates.sort_unstable();
        dates.dedup();
        let awaiting = !dates.is_empty();
        Self {
            dates,
            current_index: 0,
            awaiting_simulation: awaiting,
        }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// The date whose games are currently visible/playable, or `None`
    /// once the season is complete.
    pub fn current_date(&self) -> Option<NaiveDate> {
        self.dates.get(self.current_index).copied()
    }

    pub fn is_complete(&self) -> bool {
        self.current_index >= self.dates.len()
    }

    /// Whether the current day still needs `simulate` before `advance`.
    pub fn awaiting_simulation(&self) -> bool {
        !self.is_complete() && self.awaiting_simulation
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// The latest game date whose games have been simulated, or `None`
    /// before the first simulation.
    pub fn last_simulated_date(&self) -> Option<NaiveDate> {
        if self.is_complete() {
            return self.dates.last().copied();
        }
        if self.awaiting_simulation {
            self.current_index
                .checked_sub(1)
                .and_then(|i| self.dates.get(i))
                .copied()
        } else {
            self.dates.get(self.current_index).copied()
        }
    }

    /// The earliest game date still waiting for simulation, or `None`
    /// once every date has been played.
    pub fn first_unsimulated_date(&self) -> Option<NaiveDate> {
        if self.is_complete() {
            return None;
        }
        if self.awaiting_simulation {
            self.dates.get(self.current_index).copied()
        } else {
            self.dates.get(self.current_index + 1).copied()
        }
    }

    /// Record that the current day has been simulated.
    pub fn mark_simulated(&mut self, date: NaiveDate) -> EngineResult<()> {
        let current = self
            .current_date()
            .ok_or_else(|| EngineError::invalid_state("the season is already complete"))?;
        if date != current {
            return Err(EngineError::invalid_state(format!(
                "cannot simulate {}; the current day is {}",
                date, current
            )));
        }
        if !self.awaiting_simulation {
            return Err(EngineError::invalid_state(format!(
                "{} has already been simulated",
                date
            )));
        }
        self.awaiting_simulation = false;
        Ok(())
    }

    /// Move to the next calendar day. The current day must be simulated
    /// first; at the end of the calendar the season becomes complete.
    pub fn advance(&mut self) -> EngineResult<()> {
        if self.is_complete() {
            return Err(EngineError::invalid_state("the season is already complete"));
        }
        if self.awaiting_simulation {
            return Err(EngineError::invalid_state(
                "play the current day's games before advancing",
            ));
        }
        self.current_index += 1;
        self.awaiting_simulation = !self.is_complete();
        Ok(())
    }
}
