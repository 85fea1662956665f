//! Weekly Matchups & Standings
//!
//! Partitions the season into head-to-head scoring weeks, generates a
//! round-robin matchup schedule, accumulates daily fantasy totals into
//! matchup scores, and ranks teams into a standings table.
//!
//! Week 1 runs from the season's first game date through the following
//! Sunday; every later week is Monday through Sunday. A window keeps
//! its nominal Sunday end but completes as soon as every game date
//! inside it has been simulated, even before the clock moves on.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::engine::calendar::SeasonCalendar;

/// Placeholder opponent used to even out an odd team count. Pairings
/// against it are dropped, giving one team an off week.
const BYE: &str = "__BYE__";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekWindow {
    pub number: u32,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl WeekWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekStatus {
    Upcoming,
    InProgress,
    Completed,
}

/// One head-to-head pairing for one week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matchup {
    pub week: u32,
    pub home: String,
    pub away: String,
    pub home_points: f64,
    pub away_points: f64,
    pub completed: bool,
}

impl Matchup {
    fn new(week: u32, home: String, away: String) -> Self {
        Self {
            week,
            home,
            away,
            home_points: 0.0,
            away_points: 0.0,
            completed: false,
        }
    }

    /// Winning team once the week is complete; `None` while live or on
    /// an exact tie.
    pub fn winner(&self) -> Option<&str> {
        if !self.completed || (self.home_points - self.away_points).abs() < f64::EPSILON {
            return None;
        }
        if self.home_points > self.away_points {
            Some(&self.home)
        } else {
            Some(&self.away)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingRow {
    pub team: String,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub win_pct: f64,
    pub points_for: f64,
    pub points_against: f64,
    pub point_diff: f64,
}

/// Split `[first, last]` into scoring weeks. Week 1 ends on the first
/// Sunday on or after `first`; later weeks are full Monday-Sunday spans.
pub fn week_windows(first: NaiveDate, last: NaiveDate) -> Vec<WeekWindow> {
    let mut windows = Vec::new();
    if first > last {
        return windows;
    }
    let days_to_sunday = 6 - first.weekday().num_days_from_monday() as i64;
    let mut start = first;
    let mut end = first + Duration::days(days_to_sunday);
    let mut number = 1u32;
    loop {
        windows.push(WeekWindow { number, start, end });
        if end >= last {
            break;
        }
        start = end + Duration::days(1);
        end = start + Duration::days(6);
        number += 1;
    }
    windows
}

/// Pairings for one week via the circle method: one team stays fixed
/// while the rest rotate, and home/away flips on every full cycle so a
/// double round-robin alternates venues.
pub fn round_robin_pairings(teams: &[String], week_index: usize) -> Vec<(String, String)> {
    let mut field: Vec<&str> = teams.iter().map(String::as_str).collect();
    if field.len() % 2 != 0 {
        field.push(BYE);
    }
    let n = field.len();
    if n < 2 {
        return Vec::new();
    }
    let rounds_per_cycle = n - 1;
    let round = week_index % rounds_per_cycle;
    let flip = (week_index / rounds_per_cycle) % 2 == 1;

    // Rotate everything except the anchor at position 0.
    let rest = &field[1..];
    let mut arrangement = Vec::with_capacity(n);
    arrangement.push(field[0]);
    for i in 0..rest.len() {
        arrangement.push(rest[(i + rest.len() - round % rest.len()) % rest.len()]);
    }

    let mut pairings = Vec::with_capacity(n / 2);
    for i in 0..n / 2 {
        let (mut home, mut away) = (arrangement[i], arrangement[n - 1 - i]);
        if flip {
            std::mem::swap(&mut home, &mut away);
        }
        if home == BYE || away == BYE {
            continue;
        }
        pairings.push((home.to_string(), away.to_string()));
    }
    pairings
}

/// Status of a week relative to the league's simulation frontier. A
/// week is complete once no unsimulated game date remains inside it,
/// even before the clock advances past the window's Sunday; it stays
/// upcoming until one of its game dates has actually been played.
pub fn week_status(window: &WeekWindow, calendar: &SeasonCalendar) -> WeekStatus {
    let complete = match calendar.first_unsimulated_date() {
        None => true,
        Some(next) => next > window.end,
    };
    if complete {
        return WeekStatus::Completed;
    }
    match calendar.last_simulated_date() {
        Some(played) if played >= window.start => WeekStatus::InProgress,
        _ => WeekStatus::Upcoming,
    }
}

/// The full season's matchup grid plus the week windows it hangs off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySchedule {
    pub windows: Vec<WeekWindow>,
    pub matchups: Vec<Matchup>,
}

impl WeeklySchedule {
    /// Generate every week's pairings up front from the team list and
    /// the season's date span.
    pub fn build(teams: &[String], first: NaiveDate, last: NaiveDate) -> Self {
        let windows = week_windows(first, last);
        let mut matchups = Vec::new();
        for window in &windows {
            for (home, away) in round_robin_pairings(teams, (window.number - 1) as usize) {
                matchups.push(Matchup::new(window.number, home, away));
            }
        }
        Self { windows, matchups }
    }

    pub fn window_for(&self, date: NaiveDate) -> Option<&WeekWindow> {
        self.windows.iter().find(|w| w.contains(date))
    }

    pub fn window_by_number(&self, number: u32) -> Option<&WeekWindow> {
        self.windows.iter().find(|w| w.number == number)
    }

    pub fn matchups_for_week(&self, number: u32) -> Vec<&Matchup> {
        self.matchups.iter().filter(|m| m.week == number).collect()
    }

    /// Fold one simulated day's team fantasy totals into the matchups of
    /// the week containing `date`. Teams on a bye accrue nothing.
    pub fn apply_day_totals(&mut self, date: NaiveDate, totals: &BTreeMap<String, f64>) {
        let Some(week) = self.window_for(date).map(|w| w.number) else {
            return;
        };
        for matchup in self.matchups.iter_mut().filter(|m| m.week == week) {
            if let Some(points) = totals.get(&matchup.home) {
                matchup.home_points += points;
            }
            if let Some(points) = totals.get(&matchup.away) {
                matchup.away_points += points;
            }
        }
    }

    /// Re-derive each matchup's completion flag from the calendar.
    pub fn refresh_completion(&mut self, calendar: &SeasonCalendar) {
        let statuses: BTreeMap<u32, WeekStatus> = self
            .windows
            .iter()
            .map(|w| (w.number, week_status(w, calendar)))
            .collect();
        for matchup in &mut self.matchups {
            matchup.completed = statuses.get(&matchup.week) == Some(&WeekStatus::Completed);
        }
    }

    /// Standings over completed matchups, best record first.
    pub fn standings(&self, teams: &[String]) -> Vec<StandingRow> {
        self.standings_filtered(teams, |_| true)
    }

    /// Standings counting only completed matchups before `week`; the
    /// regular-season table once playoff weeks begin.
    pub fn standings_before(&self, teams: &[String], week: u32) -> Vec<StandingRow> {
        self.standings_filtered(teams, |m| m.week < week)
    }

    fn standings_filtered(
        &self,
        teams: &[String],
        keep: impl Fn(&Matchup) -> bool,
    ) -> Vec<StandingRow> {
        let mut rows: BTreeMap<&str, StandingRow> = teams
            .iter()
            .map(|team| {
                (
                    team.as_str(),
                    StandingRow {
                        team: team.clone(),
                        wins: 0,
                        losses: 0,
                        ties: 0,
                        win_pct: 0.0,
                        points_for: 0.0,
                        points_against: 0.0,
                        point_diff: 0.0,
                    },
                )
            })
            .collect();

        for matchup in self.matchups.iter().filter(|m| m.completed && keep(m)) {
            let winner = matchup.winner().map(str::to_string);
            for (team, scored, allowed) in [
                (&matchup.home, matchup.home_points, matchup.away_points),
                (&matchup.away, matchup.away_points, matchup.home_points),
            ] {
                let Some(row) = rows.get_mut(team.as_str()) else {
                    continue;
                };
                row.points_for += scored;
                row.points_against += allowed;
                match winner.as_deref() {
                    Some(name) if name == team => row.wins += 1,
                    Some(_) => row.losses += 1,
                    None => row.ties += 1,
                }
            }
        }

        let mut table: Vec<StandingRow> = rows.into_values().collect();
        for row in &mut table {
            let games = row.wins + row.losses + row.ties;
            row.win_pct = if games == 0 {
                0.0
            } else {
                (row.wins as f64 + 0.5 * row.ties as f64) / games as f64
            };
            row.point_diff = row.points_for - row.points_against;
        }
        table.sort_by(|a, b| {
            b.win_pct
                .partial_cmp(&a.win_pct)
                .unwrap_or(Ordering::Equal)
                .then(b.wins.cmp(&a.wins))
                .then(
                    b.point_diff
                        .partial_cmp(&a.point_diff)
                        .unwrap_or(Ordering::Equal),
                )
                .then(
                    b.points_for
                        .partial_cmp(&a.points_for)
                        .unwrap_or(Ordering::Equal),
                )
                .then(a.team.cmp(&b.team))
        });
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn teams(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_week_one_ends_on_first_sunday() {
        // 2024-10-22 is a Tuesday; the first Sunday after it is 10-27.
        let windows = week_windows(d(2024, 10, 22), d(2024, 11, 10));
        assert_eq!(windows[0].start, d(2024, 10, 22));
        assert_eq!(windows[0].end, d(2024, 10, 27));
        assert_eq!(windows[1].start, d(2024, 10, 28));
        assert_eq!(windows[1].end, d(2024, 11, 3));
        assert_eq!(windows.last().unwrap().end, d(2024, 11, 10));
        assert_eq!(windows.len(), 3);
    }

    #[test]
    fn test_round_robin_covers_every_opponent() {
        let field = teams(&["A", "B", "C", "D"]);
        let mut seen = Vec::new();
        for week in 0..3 {
            let pairings = round_robin_pairings(&field, week);
            assert_eq!(pairings.len(), 2);
            for (h, a) in pairings {
                let mut key = [h, a];
                key.sort();
                seen.push(key);
            }
        }
        seen.sort();
        seen.dedup();
        // 4 teams, 3 rounds: every unordered pair exactly once.
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn test_odd_team_count_gets_a_bye() {
        let field = teams(&["A", "B", "C"]);
        for week in 0..3 {
            let pairings = round_robin_pairings(&field, week);
            assert_eq!(pairings.len(), 1);
        }
    }

    #[test]
    fn test_second_cycle_flips_home_and_away() {
        let field = teams(&["A", "B", "C", "D"]);
        let first = round_robin_pairings(&field, 0);
        let second = round_robin_pairings(&field, 3);
        for ((h1, a1), (h2, a2)) in first.iter().zip(second.iter()) {
            assert_eq!(h1, a2);
            assert_eq!(a1, h2);
        }
    }

    #[test]
    fn test_day_totals_accumulate_into_matchups() {
        let field = teams(&["A", "B"]);
        let mut schedule = WeeklySchedule::build(&field, d(2024, 10, 22), d(2024, 10, 27));
        let mut totals = BTreeMap::new();
        totals.insert("A".to_string(), 30.0);
        totals.insert("B".to_string(), 20.0);
        schedule.apply_day_totals(d(2024, 10, 22), &totals);
        schedule.apply_day_totals(d(2024, 10, 23), &totals);

        let matchup = &schedule.matchups_for_week(1)[0];
        let (a_pts, b_pts) = if matchup.home == "A" {
            (matchup.home_points, matchup.away_points)
        } else {
            (matchup.away_points, matchup.home_points)
        };
        assert_eq!(a_pts, 60.0);
        assert_eq!(b_pts, 40.0);
    }

    #[test]
    fn test_week_status_progression() {
        let mut cal = SeasonCalendar::new(vec![d(2024, 10, 22), d(2024, 10, 23)]);
        let window = WeekWindow {
            number: 1,
            start: d(2024, 10, 22),
            end: d(2024, 10, 27),
        };
        assert_eq!(week_status(&window, &cal), WeekStatus::Upcoming);
        cal.mark_simulated(d(2024, 10, 22)).unwrap();
        assert_eq!(week_status(&window, &cal), WeekStatus::InProgress);
        cal.advance().unwrap();
        cal.mark_simulated(d(2024, 10, 23)).unwrap();
        // Final game date of the window played, so the week is done even
        // though the nominal Sunday has not arrived.
        assert_eq!(week_status(&window, &cal), WeekStatus::Completed);
    }

    #[test]
    fn test_week_completes_once_its_last_game_day_is_simulated() {
        // Window 1 covers 10-22..10-27; a later game date exists on
        // 10-28, so the season is far from over.
        let mut cal = SeasonCalendar::new(vec![
            d(2024, 10, 22),
            d(2024, 10, 23),
            d(2024, 10, 28),
        ]);
        let window = WeekWindow {
            number: 1,
            start: d(2024, 10, 22),
            end: d(2024, 10, 27),
        };
        cal.mark_simulated(d(2024, 10, 22)).unwrap();
        cal.advance().unwrap();
        cal.mark_simulated(d(2024, 10, 23)).unwrap();
        // Both of the window's game dates are played; the week is done
        // even though the clock has not advanced to 10-28 yet.
        assert_eq!(week_status(&window, &cal), WeekStatus::Completed);

        let next = WeekWindow {
            number: 2,
            start: d(2024, 10, 28),
            end: d(2024, 11, 3),
        };
        // Nothing inside the next window has been played yet, whether
        // or not the clock is parked on its first game date.
        assert_eq!(week_status(&next, &cal), WeekStatus::Upcoming);
        cal.advance().unwrap();
        assert_eq!(week_status(&next, &cal), WeekStatus::Upcoming);
    }

    #[test]
    fn test_standings_order() {
        let field = teams(&["A", "B", "C", "D"]);
        let mut schedule = WeeklySchedule::build(&field, d(2024, 10, 21), d(2024, 10, 27));
        for matchup in &mut schedule.matchups {
            matchup.completed = true;
            matchup.home_points = 100.0;
            matchup.away_points = 90.0;
        }
        let table = schedule.standings(&field);
        assert_eq!(table.len(), 4);
        assert!(table[0].win_pct >= table[1].win_pct);
        // Ties in every key fall back to alphabetical team order.
        let names: Vec<&str> = table.iter().map(|r| r.team.as_str()).collect();
        let mut grouped = names.clone();
        grouped.sort();
        assert_eq!(names.len(), grouped.len());
    }
}
