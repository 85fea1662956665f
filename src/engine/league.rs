//! League / SeasonState aggregate
//!
//! The single mutable aggregate for one replay: calendar, draft,
//! rosters, weekly matchups, day history, bet ledger, and the optional
//! playoff bracket all hang off `LeagueState`, and every component is
//! mutated only through its operations.
//!
//! Every mutating operation is atomic: validation happens before any
//! field changes, so a failed call leaves the aggregate exactly as it
//! was.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::data::SeasonDataset;
use crate::engine::bankroll::{BankrollSummary, BetLedger};
use crate::engine::betting::{BetLeg, BetSlip, SlipKind};
use crate::engine::boxscore::{BoxScoreLine, GameId, GameSummary, PlayerId};
use crate::engine::calendar::SeasonCalendar;
use crate::engine::draft::{Draft, DraftPick, DraftStatus, Rosters};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::playoffs::{BracketInputs, PlayoffBracket, PlayoffConfig};
use crate::engine::profile::{build_player_profile, PlayerProfile};
use crate::engine::scoring::{
    player_season_averages, ProfileCatalog, ScoringProfile,
};
use crate::engine::weekly::{
    week_status, Matchup, StandingRow, WeekStatus, WeekWindow, WeeklySchedule,
};

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueConfig {
    pub league_id: String,
    pub name: String,
    pub team_count: usize,
    /// Supplied names; padded with "Team N" up to `team_count`.
    #[serde(default)]
    pub team_names: Vec<String>,
    pub roster_size: usize,
    /// Scoring profile key in the catalog; `None` uses the default.
    #[serde(default)]
    pub scoring_profile: Option<String>,
    pub initial_bankroll: f64,
    pub seed: u64,
}

impl LeagueConfig {
    pub fn resolved_team_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .team_names
            .iter()
            .filter(|n| !n.trim().is_empty())
            .take(self.team_count)
            .map(|n| n.trim().to_string())
            .collect();
        while names.len() < self.team_count {
            names.push(format!("Team {}", names.len() + 1));
        }
        names
    }

    fn validate(&self, dataset: &SeasonDataset) -> EngineResult<()> {
        if self.team_count < 2 {
            return Err(EngineError::validation("a league needs at least 2 teams"));
        }
        if self.roster_size == 0 {
            return Err(EngineError::validation("roster size must be positive"));
        }
        if !self.initial_bankroll.is_finite() || self.initial_bankroll <= 0.0 {
            return Err(EngineError::validation("initial bankroll must be positive"));
        }
        let needed = self.team_count * self.roster_size;
        let pool = dataset.player_ids().len();
        if pool < needed {
            return Err(EngineError::validation(format!(
                "draft needs {} players but the dataset has {}",
                needed, pool
            )));
        }
        let names = self.resolved_team_names();
        let distinct: BTreeSet<&String> = names.iter().collect();
        if distinct.len() != names.len() {
            return Err(EngineError::validation("team names must be distinct"));
        }
        Ok(())
    }
}

// ============================================================================
// View / result types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerContribution {
    pub player_id: PlayerId,
    pub player_name: String,
    pub played: bool,
    pub fantasy_points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamDayResult {
    pub team: String,
    pub total: f64,
    pub players: Vec<PlayerContribution>,
}

/// One simulated day: fantasy results, the day's scoreboard, and any
/// slips that settled because of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayResult {
    pub date: NaiveDate,
    pub teams: Vec<TeamDayResult>,
    pub scoreboard: Vec<GameSummary>,
    pub settled_slips: Vec<BetSlip>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarState {
    pub current_date: Option<NaiveDate>,
    pub current_index: usize,
    pub total_days: usize,
    pub awaiting_simulation: bool,
    pub season_complete: bool,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftSummary {
    pub status: DraftStatus,
    pub roster_size: usize,
    pub on_clock: Option<String>,
    pub picks: Vec<DraftPick>,
    pub rosters: Rosters,
    pub available: Vec<PlayerId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterSummary {
    pub team: String,
    pub roster_size: usize,
    pub players: Vec<PlayerId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingsEntry {
    pub rank: usize,
    #[serde(flatten)]
    pub row: StandingRow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekView {
    pub window: WeekWindow,
    pub status: WeekStatus,
    pub matchups: Vec<Matchup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeksView {
    pub weeks: Vec<WeekView>,
    pub standings: Vec<StandingsEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetsView {
    pub pending: Vec<BetSlip>,
    pub settled: Vec<BetSlip>,
    pub bankroll: BankrollSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameBoxScore {
    pub game: GameSummary,
    pub lines: Vec<BoxScoreLine>,
}

// ============================================================================
// Aggregate
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeagueState {
    pub config: LeagueConfig,
    pub teams: Vec<String>,
    pub scoring: ScoringProfile,
    pub draft: Draft,
    pub rosters: Rosters,
    pub calendar: SeasonCalendar,
    pub schedule: WeeklySchedule,
    pub history: Vec<DayResult>,
    pub ledger: BetLedger,
    pub playoff_config: Option<PlayoffConfig>,
    /// Final scores of every simulated game, for slip settlement.
    finals: HashMap<GameId, GameSummary>,
}

impl LeagueState {
    pub fn new(
        config: LeagueConfig,
        catalog: &ProfileCatalog,
        dataset: &SeasonDataset,
    ) -> EngineResult<Self> {
        config.validate(dataset)?;
        let scoring = catalog.resolve(config.scoring_profile.as_deref())?.clone();

        let teams = config.resolved_team_names();
        let rosters: Rosters = teams.iter().map(|t| (t.clone(), Vec::new())).collect();

        let ranked: Vec<PlayerId> = player_season_averages(dataset.all_logs(), &scoring)
            .into_iter()
            .map(|avg| avg.player_id)
            .collect();
        let draft = Draft::new(teams.clone(), config.roster_size, ranked, config.seed);

        let dates = dataset.season_dates();
        let calendar = SeasonCalendar::new(dates.clone());
        let (first, last) = match (dates.first(), dates.last()) {
            (Some(&f), Some(&l)) => (f, l),
            _ => return Err(EngineError::data_unavailable("season has no game dates")),
        };
        let schedule = WeeklySchedule::build(&teams, first, last);

        let ledger = BetLedger::new(config.initial_bankroll);
        tracing::info!(
            league_id = %config.league_id,
            teams = teams.len(),
            roster_size = config.roster_size,
            profile = %scoring.name,
            "league created"
        );

        Ok(Self {
            config,
            teams,
            scoring,
            draft,
            rosters,
            calendar,
            schedule,
            history: Vec::new(),
            ledger,
            playoff_config: None,
            finals: HashMap::new(),
        })
    }

    /// Rebuild from the original configuration: fresh draft, calendar at
    /// day one, empty history and ledger.
    pub fn reset(&mut self, catalog: &ProfileCatalog, dataset: &SeasonDataset) -> EngineResult<()> {
        let rebuilt = LeagueState::new(self.config.clone(), catalog, dataset)?;
        tracing::info!(league_id = %self.config.league_id, "league reset");
        *self = rebuilt;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Calendar / simulation
    // ------------------------------------------------------------------

    pub fn calendar_state(&self) -> CalendarState {
        CalendarState {
            current_date: self.calendar.current_date(),
            current_index: self.calendar.current_index(),
            total_days: self.calendar.dates().len(),
            awaiting_simulation: self.calendar.awaiting_simulation(),
            season_complete: self.calendar.is_complete(),
            first_date: self.calendar.first_date(),
            last_date: self.calendar.last_date(),
        }
    }

    /// Latest date whose games have been simulated.
    pub fn latest_simulated_date(&self) -> Option<NaiveDate> {
        self.history.last().map(|entry| entry.date)
    }

    fn is_simulated(&self, date: NaiveDate) -> bool {
        self.latest_simulated_date()
            .map_or(false, |latest| date <= latest)
    }

    /// Play out the current day: score every roster, record history,
    /// and settle any slips whose games all have finals now.
    pub fn simulate_day(&mut self, dataset: &SeasonDataset) -> EngineResult<DayResult> {
        if !self.draft.is_completed() {
            return Err(EngineError::invalid_state(
                "complete the draft before simulating",
            ));
        }
        let date = self
            .calendar
            .current_date()
            .ok_or_else(|| EngineError::invalid_state("the season is already complete"))?;
        if !self.calendar.awaiting_simulation() {
            return Err(EngineError::invalid_state(format!(
                "{} has already been simulated",
                date
            )));
        }

        let games: Vec<GameSummary> = dataset.games_on(date).into_iter().cloned().collect();
        let lines = dataset.box_scores_on(date);
        if !games.is_empty() && lines.is_empty() {
            return Err(EngineError::data_unavailable(format!(
                "no box scores cached for {}",
                date
            )));
        }

        let by_player: HashMap<PlayerId, &BoxScoreLine> =
            lines.iter().map(|l| (l.player_id, *l)).collect();
        let mut teams_out = Vec::with_capacity(self.teams.len());
        let mut totals = BTreeMap::new();
        for team in &self.teams {
            let mut players = Vec::new();
            let mut total = 0.0;
            if let Some(roster) = self.rosters.get(team) {
                for &pid in roster {
                    let Some(line) = by_player.get(&pid) else {
                        continue;
                    };
                    let points = self.scoring.fantasy_points(line);
                    total += points;
                    players.push(PlayerContribution {
                        player_id: pid,
                        player_name: line.player_name.clone(),
                        played: line.played(),
                        fantasy_points: points,
                    });
                }
            }
            totals.insert(team.clone(), total);
            teams_out.push(TeamDayResult {
                team: team.clone(),
                total,
                players,
            });
        }

        // Commit phase: nothing below can fail except the state check
        // already performed above.
        self.calendar.mark_simulated(date)?;
        for game in &games {
            if game.is_final {
                self.finals.insert(game.game_id, game.clone());
            }
        }
        let settled = self.ledger.settle_pending(&self.finals, Utc::now());
        self.schedule.apply_day_totals(date, &totals);
        self.schedule.refresh_completion(&self.calendar);

        let result = DayResult {
            date,
            teams: teams_out,
            scoreboard: games,
            settled_slips: settled,
        };
        self.history.push(result.clone());
        tracing::debug!(
            league_id = %self.config.league_id,
            %date,
            games = result.scoreboard.len(),
            settled = result.settled_slips.len(),
            "day simulated"
        );
        Ok(result)
    }

    /// Move the clock to the next game date.
    pub fn advance(&mut self, dataset: &SeasonDataset) -> EngineResult<CalendarState> {
        // A date with no scheduled games counts as simulated.
        if self.calendar.awaiting_simulation() {
            if let Some(date) = self.calendar.current_date() {
                if dataset.games_on(date).is_empty() {
                    self.calendar.mark_simulated(date)?;
                }
            }
        }
        self.calendar.advance()?;
        self.schedule.refresh_completion(&self.calendar);
        Ok(self.calendar_state())
    }

    /// Simulate-and-advance until the season ends or the configured
    /// playoff start week is reached. Fails fast on the first bad day.
    pub fn autoplay(&mut self, dataset: &SeasonDataset) -> EngineResult<Vec<DayResult>> {
        let halt_week = self.playoff_config.as_ref().and_then(|c| c.start_week());
        let mut days = Vec::new();
        loop {
            let Some(date) = self.calendar.current_date() else {
                break;
            };
            if let (Some(halt), Some(window)) = (halt_week, self.schedule.window_for(date)) {
                if window.number >= halt && self.calendar.awaiting_simulation() {
                    break;
                }
            }
            if self.calendar.awaiting_simulation() {
                days.push(self.simulate_day(dataset)?);
            }
            if self.calendar.is_complete() {
                break;
            }
            self.advance(dataset)?;
        }
        Ok(days)
    }

    // ------------------------------------------------------------------
    // Draft & rosters
    // ------------------------------------------------------------------

    pub fn draft_summary(&self) -> DraftSummary {
        DraftSummary {
            status: self.draft.status,
            roster_size: self.draft.roster_size,
            on_clock: self
                .draft
                .team_on_clock(&self.rosters)
                .map(str::to_string),
            picks: self.draft.picks().to_vec(),
            rosters: self.rosters.clone(),
            available: self.draft.available(&self.rosters),
        }
    }

    pub fn draft_pick(&mut self, player_id: PlayerId) -> EngineResult<DraftSummary> {
        self.draft.pick(&mut self.rosters, player_id)?;
        Ok(self.draft_summary())
    }

    pub fn draft_autopick(&mut self) -> EngineResult<DraftSummary> {
        self.draft.autopick(&mut self.rosters)?;
        Ok(self.draft_summary())
    }

    pub fn draft_autopick_rest(&mut self) -> EngineResult<DraftSummary> {
        self.draft.autopick_rest(&mut self.rosters)?;
        Ok(self.draft_summary())
    }

    pub fn draft_complete(&mut self) -> EngineResult<DraftSummary> {
        self.draft.complete(&self.rosters)?;
        tracing::info!(league_id = %self.config.league_id, "draft completed");
        Ok(self.draft_summary())
    }

    fn team_roster_mut(&mut self, team: &str) -> EngineResult<&mut Vec<PlayerId>> {
        self.rosters
            .get_mut(team)
            .ok_or_else(|| EngineError::not_found(format!("unknown team '{}'", team)))
    }

    /// Post-draft roster move; the draft state itself never reopens.
    pub fn add_player(
        &mut self,
        dataset: &SeasonDataset,
        team: &str,
        player_id: PlayerId,
    ) -> EngineResult<RosterSummary> {
        if !self.draft.is_completed() {
            return Err(EngineError::invalid_state(
                "roster moves open once the draft is complete",
            ));
        }
        if !dataset.player_exists(player_id) {
            return Err(EngineError::not_found(format!(
                "unknown player id {}",
                player_id
            )));
        }
        if self.rosters.values().any(|r| r.contains(&player_id)) {
            return Err(EngineError::validation(format!(
                "player {} is already rostered",
                player_id
            )));
        }
        let size = self.config.roster_size;
        let roster = self.team_roster_mut(team)?;
        if roster.len() >= size {
            return Err(EngineError::validation(format!(
                "roster for '{}' is full",
                team
            )));
        }
        roster.push(player_id);
        Ok(self.roster_summary(team)?)
    }

    pub fn drop_player(&mut self, team: &str, player_id: PlayerId) -> EngineResult<RosterSummary> {
        if !self.draft.is_completed() {
            return Err(EngineError::invalid_state(
                "roster moves open once the draft is complete",
            ));
        }
        let roster = self.team_roster_mut(team)?;
        let Some(pos) = roster.iter().position(|&pid| pid == player_id) else {
            return Err(EngineError::validation(format!(
                "player {} is not on '{}'",
                player_id, team
            )));
        };
        roster.remove(pos);
        Ok(self.roster_summary(team)?)
    }

    pub fn roster_summary(&self, team: &str) -> EngineResult<RosterSummary> {
        let players = self
            .rosters
            .get(team)
            .ok_or_else(|| EngineError::not_found(format!("unknown team '{}'", team)))?;
        Ok(RosterSummary {
            team: team.to_string(),
            roster_size: self.config.roster_size,
            players: players.clone(),
        })
    }

    // ------------------------------------------------------------------
    // Betting
    // ------------------------------------------------------------------

    /// Validate and place a slip against upcoming games. Every leg
    /// must reference a game with recorded betting lines; a game the
    /// book never priced cannot be wagered on.
    pub fn place_bet(
        &mut self,
        dataset: &SeasonDataset,
        slip_id: String,
        kind: SlipKind,
        stake: f64,
        legs: Vec<BetLeg>,
    ) -> EngineResult<BetSlip> {
        if legs.is_empty() {
            return Err(EngineError::validation("a slip needs at least one leg"));
        }
        for leg in &legs {
            let game = dataset
                .game(leg.game_id)
                .ok_or_else(|| EngineError::not_found(format!("unknown game {}", leg.game_id)))?;
            if dataset.odds_for(leg.game_id).is_none() {
                return Err(EngineError::data_unavailable(format!(
                    "no betting lines recorded for game {}",
                    leg.game_id
                )));
            }
            if self.is_simulated(game.date) {
                return Err(EngineError::validation(format!(
                    "game {} has already been played",
                    leg.game_id
                )));
            }
        }
        let slip = self
            .ledger
            .place(slip_id, kind, stake, legs, Utc::now())?
            .clone();
        tracing::debug!(
            league_id = %self.config.league_id,
            slip_id = %slip.slip_id,
            stake = slip.stake,
            legs = slip.legs.len(),
            "bet placed"
        );
        Ok(slip)
    }

    pub fn bets_view(&self) -> BetsView {
        BetsView {
            pending: self.ledger.pending.clone(),
            settled: self.ledger.settled.clone(),
            bankroll: self.ledger.summary(),
        }
    }

    pub fn bankroll(&self) -> BankrollSummary {
        self.ledger.summary()
    }

    // ------------------------------------------------------------------
    // Weeks, standings, playoffs
    // ------------------------------------------------------------------

    pub fn weeks_view(&self) -> WeeksView {
        let weeks = self
            .schedule
            .windows
            .iter()
            .map(|window| WeekView {
                window: *window,
                status: week_status(window, &self.calendar),
                matchups: self
                    .schedule
                    .matchups_for_week(window.number)
                    .into_iter()
                    .cloned()
                    .collect(),
            })
            .collect();
        let standings = self
            .regular_season_standings()
            .into_iter()
            .enumerate()
            .map(|(i, row)| StandingsEntry { rank: i + 1, row })
            .collect();
        WeeksView { weeks, standings }
    }

    fn regular_season_standings(&self) -> Vec<StandingRow> {
        match self.playoff_config.as_ref().and_then(|c| c.start_week()) {
            Some(start) => self.schedule.standings_before(&self.teams, start),
            None => self.schedule.standings(&self.teams),
        }
    }

    pub fn configure_playoffs(&mut self, config: PlayoffConfig) -> EngineResult<PlayoffBracket> {
        let season_weeks: Vec<u32> = self.schedule.windows.iter().map(|w| w.number).collect();
        config.validate(self.teams.len(), &season_weeks)?;
        if let Some(start) = config.start_week() {
            if self.playoffs_started(start) {
                return Err(EngineError::invalid_state(
                    "playoff weeks have already begun",
                ));
            }
        }
        self.playoff_config = Some(config);
        tracing::info!(league_id = %self.config.league_id, "playoffs configured");
        Ok(self.playoff_bracket()?)
    }

    /// Playoff weeks have begun once any date in the start week (or
    /// later) has been simulated.
    fn playoffs_started(&self, start_week: u32) -> bool {
        if self.calendar.is_complete() {
            return true;
        }
        self.latest_simulated_date()
            .and_then(|date| self.schedule.window_for(date))
            .map_or(false, |window| window.number >= start_week)
    }

    /// Current bracket: a preview until the first playoff week begins.
    pub fn playoff_bracket(&self) -> EngineResult<PlayoffBracket> {
        let config = self
            .playoff_config
            .as_ref()
            .ok_or_else(|| EngineError::invalid_state("playoffs are not configured"))?;
        let start = config
            .start_week()
            .ok_or_else(|| EngineError::invalid_state("playoff config has no weeks"))?;

        let seed_order: Vec<String> = self
            .schedule
            .standings_before(&self.teams, start)
            .into_iter()
            .map(|row| row.team)
            .collect();

        let mut week_totals: BTreeMap<(u32, String), f64> = BTreeMap::new();
        for entry in &self.history {
            let Some(window) = self.schedule.window_for(entry.date) else {
                continue;
            };
            for team in &entry.teams {
                *week_totals
                    .entry((window.number, team.team.clone()))
                    .or_insert(0.0) += team.total;
            }
        }
        let completed_weeks: BTreeSet<u32> = self
            .schedule
            .windows
            .iter()
            .filter(|w| week_status(w, &self.calendar) == WeekStatus::Completed)
            .map(|w| w.number)
            .collect();

        let inputs = BracketInputs {
            week_totals: &week_totals,
            completed_weeks: &completed_weeks,
        };
        Ok(PlayoffBracket::build(
            config,
            &seed_order,
            &inputs,
            self.playoffs_started(start),
        ))
    }

    /// Autoplay the regular season, halting at the playoff start week.
    pub fn simulate_to_playoffs(
        &mut self,
        dataset: &SeasonDataset,
    ) -> EngineResult<Vec<DayResult>> {
        if self.playoff_config.is_none() {
            return Err(EngineError::invalid_state("playoffs are not configured"));
        }
        self.autoplay(dataset)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn history(&self) -> &[DayResult] {
        &self.history
    }

    pub fn day_result(&self, date: NaiveDate) -> EngineResult<&DayResult> {
        self.history
            .iter()
            .find(|entry| entry.date == date)
            .ok_or_else(|| EngineError::not_found(format!("{} has not been simulated", date)))
    }

    /// Full box score for one simulated game.
    pub fn game_boxscore(
        &self,
        dataset: &SeasonDataset,
        game_id: GameId,
    ) -> EngineResult<GameBoxScore> {
        let game = dataset
            .game(game_id)
            .ok_or_else(|| EngineError::not_found(format!("unknown game {}", game_id)))?;
        if !self.is_simulated(game.date) {
            return Err(EngineError::data_unavailable(format!(
                "game {} has not been simulated yet",
                game_id
            )));
        }
        let lines = dataset
            .box_scores_on(game.date)
            .into_iter()
            .filter(|l| l.game_id == game_id)
            .cloned()
            .collect();
        Ok(GameBoxScore {
            game: game.clone(),
            lines,
        })
    }

    /// Player profile clamped to the latest simulated date.
    pub fn player_profile(
        &self,
        dataset: &SeasonDataset,
        player_id: PlayerId,
    ) -> EngineResult<PlayerProfile> {
        build_player_profile(
            player_id,
            dataset.all_logs(),
            &self.scoring,
            self.latest_simulated_date(),
        )
    }

    /// Fantasy team owning a player, if any.
    pub fn fantasy_team_of(&self, player_id: PlayerId) -> Option<&str> {
        self.rosters
            .iter()
            .find(|(_, roster)| roster.contains(&player_id))
            .map(|(team, _)| team.as_str())
    }
}
