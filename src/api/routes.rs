//! HTTP API
//!
//! JSON API over the replay engine. Every mutating endpoint runs under
//! the league's lock, persists the new state, and returns the complete
//! post-state slice relevant to the caller, never a partial delta.
//!
//! # Endpoints
//!
//! - `GET  /api/health`
//! - `GET  /api/leagues`, `POST /api/leagues`
//! - `GET  /api/leagues/:id`, `DELETE /api/leagues/:id`
//! - `POST /api/leagues/:id/simulate | advance | autoplay | reset`
//! - `GET  /api/leagues/:id/draft`,
//!   `POST /api/leagues/:id/draft/pick | autopick | autopick-rest | complete`
//! - `POST /api/leagues/:id/roster/:team/add | drop`
//! - `GET/POST /api/leagues/:id/bets`, `GET /api/leagues/:id/bankroll`
//! - `GET  /api/leagues/:id/weeks`
//! - `GET/POST /api/leagues/:id/playoffs`,
//!   `POST /api/leagues/:id/playoffs/simulate-to-start`
//! - `GET  /api/leagues/:id/history`, `GET /api/leagues/:id/days/:date`
//! - `GET  /api/leagues/:id/games/:game_id/boxscore | odds`
//! - `GET  /api/leagues/:id/players/:player_id/profile`
//! - `GET/POST /api/profiles`, `DELETE /api/profiles/:key`

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::data::{GameOdds, SeasonDataset};
use crate::engine::bankroll::BankrollSummary;
use crate::engine::betting::{BetLeg, BetSlip, SlipKind};
use crate::engine::boxscore::{GameId, PlayerId};
use crate::engine::error::EngineError;
use crate::engine::league::{
    BetsView, CalendarState, DayResult, DraftSummary, GameBoxScore, LeagueConfig, LeagueState,
    RosterSummary, WeeksView,
};
use crate::engine::playoffs::{PlayoffBracket, PlayoffConfig};
use crate::engine::profile::PlayerProfile;
use crate::engine::scoring::{ProfileCatalog, ScoringProfile, StatKey};
use crate::store::{LeagueStore, LeagueSummary, StoreError};

/// Shared state handed to every handler.
pub struct AppState {
    pub store: Arc<LeagueStore>,
    pub dataset: Arc<SeasonDataset>,
}

// ===== Error Handling =====

#[derive(Debug)]
enum ApiError {
    Engine(EngineError),
    Store(StoreError),
    BadRequest(String),
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        ApiError::Engine(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match &self {
            ApiError::Engine(err) => {
                let status = match err {
                    EngineError::InvalidState(_) => StatusCode::CONFLICT,
                    EngineError::Validation(_) => StatusCode::BAD_REQUEST,
                    EngineError::DataUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                    EngineError::NotFound(_) => StatusCode::NOT_FOUND,
                };
                (status, err.kind(), err.to_string())
            }
            ApiError::Store(err) => {
                let status = match err {
                    StoreError::NotFound(_) => StatusCode::NOT_FOUND,
                    StoreError::AlreadyExists(_) => StatusCode::CONFLICT,
                    _ => {
                        tracing::error!("store error: {}", err);
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, "store", err.to_string())
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "validation", msg.clone()),
        };

        let body = Json(json!({
            "error": message,
            "kind": kind,
        }));
        (status, body).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// ===== Request/Response Types =====

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Deserialize)]
struct CreateLeagueRequest {
    name: String,
    team_count: usize,
    #[serde(default)]
    team_names: Vec<String>,
    roster_size: usize,
    #[serde(default)]
    scoring_profile: Option<String>,
    #[serde(default)]
    initial_bankroll: Option<f64>,
    #[serde(default)]
    seed: Option<u64>,
}

/// The complete league slice returned by state-changing calls.
#[derive(Serialize)]
struct LeagueView {
    config: LeagueConfig,
    calendar: CalendarState,
    draft: DraftSummary,
    weeks: WeeksView,
    bankroll: BankrollSummary,
    playoffs: Option<PlayoffBracket>,
}

impl LeagueView {
    fn from_state(state: &LeagueState) -> Self {
        Self {
            config: state.config.clone(),
            calendar: state.calendar_state(),
            draft: state.draft_summary(),
            weeks: state.weeks_view(),
            bankroll: state.bankroll(),
            playoffs: state.playoff_bracket().ok(),
        }
    }
}

#[derive(Deserialize)]
struct PickRequest {
    player_id: PlayerId,
}

#[derive(Deserialize)]
struct PlaceBetRequest {
    kind: SlipKind,
    stake: f64,
    legs: Vec<BetLeg>,
}

#[derive(Deserialize)]
struct UpsertProfileRequest {
    key: String,
    name: String,
    weights: BTreeMap<StatKey, f64>,
    #[serde(default)]
    make_default: bool,
}

const DEFAULT_BANKROLL: f64 = 1000.0;

// ===== Helpers =====

fn with_league<T>(
    state: &AppState,
    league_id: &str,
    op: impl FnOnce(&mut LeagueState) -> Result<T, ApiError>,
) -> Result<T, ApiError> {
    let handle = state.store.league(league_id)?;
    let mut league = handle.lock();
    let out = op(&mut league)?;
    state.store.persist(&league)?;
    Ok(out)
}

fn read_league<T>(
    state: &AppState,
    league_id: &str,
    op: impl FnOnce(&LeagueState) -> Result<T, ApiError>,
) -> Result<T, ApiError> {
    let handle = state.store.league(league_id)?;
    let league = handle.lock();
    op(&league)
}

// ===== Handlers =====

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn list_leagues(State(state): State<Arc<AppState>>) -> Json<Vec<LeagueSummary>> {
    Json(state.store.list())
}

async fn create_league(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateLeagueRequest>,
) -> ApiResult<LeagueView> {
    let config = LeagueConfig {
        league_id: Uuid::new_v4().to_string(),
        name: req.name,
        team_count: req.team_count,
        team_names: req.team_names,
        roster_size: req.roster_size,
        scoring_profile: req.scoring_profile,
        initial_bankroll: req.initial_bankroll.unwrap_or(DEFAULT_BANKROLL),
        seed: req.seed.unwrap_or_else(rand::random),
    };
    let catalog = state.store.catalog();
    let league = LeagueState::new(config, &catalog, &state.dataset)?;
    let handle = state.store.create(league)?;
    let league = handle.lock();
    Ok(Json(LeagueView::from_state(&league)))
}

async fn get_league(
    State(state): State<Arc<AppState>>,
    Path(league_id): Path<String>,
) -> ApiResult<LeagueView> {
    let view = read_league(&state, &league_id, |league| {
        Ok(LeagueView::from_state(league))
    })?;
    Ok(Json(view))
}

async fn delete_league(
    State(state): State<Arc<AppState>>,
    Path(league_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.delete(&league_id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ----- Calendar -----

async fn simulate(
    State(state): State<Arc<AppState>>,
    Path(league_id): Path<String>,
) -> ApiResult<DayResult> {
    let day = with_league(&state, &league_id, |league| {
        Ok(league.simulate_day(&state.dataset)?)
    })?;
    Ok(Json(day))
}

async fn advance(
    State(state): State<Arc<AppState>>,
    Path(league_id): Path<String>,
) -> ApiResult<CalendarState> {
    let cal = with_league(&state, &league_id, |league| {
        Ok(league.advance(&state.dataset)?)
    })?;
    Ok(Json(cal))
}

async fn autoplay(
    State(state): State<Arc<AppState>>,
    Path(league_id): Path<String>,
) -> ApiResult<Vec<DayResult>> {
    let days = with_league(&state, &league_id, |league| {
        Ok(league.autoplay(&state.dataset)?)
    })?;
    Ok(Json(days))
}

async fn reset(
    State(state): State<Arc<AppState>>,
    Path(league_id): Path<String>,
) -> ApiResult<LeagueView> {
    let catalog = state.store.catalog();
    let view = with_league(&state, &league_id, |league| {
        league.reset(&catalog, &state.dataset)?;
        Ok(LeagueView::from_state(league))
    })?;
    Ok(Json(view))
}

// ----- Draft & rosters -----

async fn get_draft(
    State(state): State<Arc<AppState>>,
    Path(league_id): Path<String>,
) -> ApiResult<DraftSummary> {
    let summary = read_league(&state, &league_id, |league| Ok(league.draft_summary()))?;
    Ok(Json(summary))
}

async fn draft_pick(
    State(state): State<Arc<AppState>>,
    Path(league_id): Path<String>,
    Json(req): Json<PickRequest>,
) -> ApiResult<DraftSummary> {
    let summary = with_league(&state, &league_id, |league| {
        Ok(league.draft_pick(req.player_id)?)
    })?;
    Ok(Json(summary))
}

async fn draft_autopick(
    State(state): State<Arc<AppState>>,
    Path(league_id): Path<String>,
) -> ApiResult<DraftSummary> {
    let summary = with_league(&state, &league_id, |league| Ok(league.draft_autopick()?))?;
    Ok(Json(summary))
}

async fn draft_autopick_rest(
    State(state): State<Arc<AppState>>,
    Path(league_id): Path<String>,
) -> ApiResult<DraftSummary> {
    let summary = with_league(&state, &league_id, |league| {
        Ok(league.draft_autopick_rest()?)
    })?;
    Ok(Json(summary))
}

async fn draft_complete(
    State(state): State<Arc<AppState>>,
    Path(league_id): Path<String>,
) -> ApiResult<DraftSummary> {
    let summary = with_league(&state, &league_id, |league| Ok(league.draft_complete()?))?;
    Ok(Json(summary))
}

async fn roster_add(
    State(state): State<Arc<AppState>>,
    Path((league_id, team)): Path<(String, String)>,
    Json(req): Json<PickRequest>,
) -> ApiResult<RosterSummary> {
    let summary = with_league(&state, &league_id, |league| {
        Ok(league.add_player(&state.dataset, &team, req.player_id)?)
    })?;
    Ok(Json(summary))
}

async fn roster_drop(
    State(state): State<Arc<AppState>>,
    Path((league_id, team)): Path<(String, String)>,
    Json(req): Json<PickRequest>,
) -> ApiResult<RosterSummary> {
    let summary = with_league(&state, &league_id, |league| {
        Ok(league.drop_player(&team, req.player_id)?)
    })?;
    Ok(Json(summary))
}

// ----- Betting -----

async fn place_bet(
    State(state): State<Arc<AppState>>,
    Path(league_id): Path<String>,
    Json(req): Json<PlaceBetRequest>,
) -> ApiResult<BetSlip> {
    let slip_id = Uuid::new_v4().to_string();
    let slip = with_league(&state, &league_id, |league| {
        Ok(league.place_bet(&state.dataset, slip_id, req.kind, req.stake, req.legs)?)
    })?;
    Ok(Json(slip))
}

async fn list_bets(
    State(state): State<Arc<AppState>>,
    Path(league_id): Path<String>,
) -> ApiResult<BetsView> {
    let view = read_league(&state, &league_id, |league| Ok(league.bets_view()))?;
    Ok(Json(view))
}

async fn get_bankroll(
    State(state): State<Arc<AppState>>,
    Path(league_id): Path<String>,
) -> ApiResult<BankrollSummary> {
    let summary = read_league(&state, &league_id, |league| Ok(league.bankroll()))?;
    Ok(Json(summary))
}

// ----- Weeks & playoffs -----

async fn get_weeks(
    State(state): State<Arc<AppState>>,
    Path(league_id): Path<String>,
) -> ApiResult<WeeksView> {
    let view = read_league(&state, &league_id, |league| Ok(league.weeks_view()))?;
    Ok(Json(view))
}

async fn configure_playoffs(
    State(state): State<Arc<AppState>>,
    Path(league_id): Path<String>,
    Json(config): Json<PlayoffConfig>,
) -> ApiResult<PlayoffBracket> {
    let bracket = with_league(&state, &league_id, |league| {
        Ok(league.configure_playoffs(config)?)
    })?;
    Ok(Json(bracket))
}

async fn get_playoffs(
    State(state): State<Arc<AppState>>,
    Path(league_id): Path<String>,
) -> ApiResult<PlayoffBracket> {
    let bracket = read_league(&state, &league_id, |league| Ok(league.playoff_bracket()?))?;
    Ok(Json(bracket))
}

async fn simulate_to_playoffs(
    State(state): State<Arc<AppState>>,
    Path(league_id): Path<String>,
) -> ApiResult<Vec<DayResult>> {
    let days = with_league(&state, &league_id, |league| {
        Ok(league.simulate_to_playoffs(&state.dataset)?)
    })?;
    Ok(Json(days))
}

// ----- Queries -----

async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(league_id): Path<String>,
) -> ApiResult<Vec<DayResult>> {
    let history = read_league(&state, &league_id, |league| Ok(league.history().to_vec()))?;
    Ok(Json(history))
}

async fn get_day(
    State(state): State<Arc<AppState>>,
    Path((league_id, date)): Path<(String, NaiveDate)>,
) -> ApiResult<DayResult> {
    let day = read_league(&state, &league_id, |league| {
        Ok(league.day_result(date)?.clone())
    })?;
    Ok(Json(day))
}

async fn get_boxscore(
    State(state): State<Arc<AppState>>,
    Path((league_id, game_id)): Path<(String, GameId)>,
) -> ApiResult<GameBoxScore> {
    let boxscore = read_league(&state, &league_id, |league| {
        Ok(league.game_boxscore(&state.dataset, game_id)?)
    })?;
    Ok(Json(boxscore))
}

async fn get_odds(
    State(state): State<Arc<AppState>>,
    Path((league_id, game_id)): Path<(String, GameId)>,
) -> ApiResult<GameOdds> {
    // The league lookup validates the id even though odds are global.
    state.store.league(&league_id)?;
    if state.dataset.game(game_id).is_none() {
        return Err(ApiError::Engine(EngineError::not_found(format!(
            "unknown game {}",
            game_id
        ))));
    }
    let odds = state.dataset.odds_for(game_id).ok_or_else(|| {
        ApiError::Engine(EngineError::data_unavailable(format!(
            "no odds recorded for game {}",
            game_id
        )))
    })?;
    Ok(Json(odds.clone()))
}

async fn get_player_profile(
    State(state): State<Arc<AppState>>,
    Path((league_id, player_id)): Path<(String, PlayerId)>,
) -> ApiResult<PlayerProfile> {
    let profile = read_league(&state, &league_id, |league| {
        Ok(league.player_profile(&state.dataset, player_id)?)
    })?;
    Ok(Json(profile))
}

// ----- Scoring profiles -----

async fn get_profiles(State(state): State<Arc<AppState>>) -> Json<ProfileCatalog> {
    Json(state.store.catalog())
}

async fn upsert_profile(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpsertProfileRequest>,
) -> ApiResult<ProfileCatalog> {
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "profile name cannot be empty".to_string(),
        ));
    }
    let profile = ScoringProfile::new(req.name, req.weights);
    state
        .store
        .update_catalog(|catalog| catalog.upsert(&req.key, profile, req.make_default))??;
    Ok(Json(state.store.catalog()))
}

async fn delete_profile(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> ApiResult<ProfileCatalog> {
    state.store.update_catalog(|catalog| catalog.remove(&key))??;
    Ok(Json(state.store.catalog()))
}

// ===== Router =====

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/leagues", get(list_leagues).post(create_league))
        .route("/api/leagues/:id", get(get_league).delete(delete_league))
        .route("/api/leagues/:id/simulate", post(simulate))
        .route("/api/leagues/:id/advance", post(advance))
        .route("/api/leagues/:id/autoplay", post(autoplay))
        .route("/api/leagues/:id/reset", post(reset))
        .route("/api/leagues/:id/draft", get(get_draft))
        .route("/api/leagues/:id/draft/pick", post(draft_pick))
        .route("/api/leagues/:id/draft/autopick", post(draft_autopick))
        .route(
            "/api/leagues/:id/draft/autopick-rest",
            post(draft_autopick_rest),
        )
        .route("/api/leagues/:id/draft/complete", post(draft_complete))
        .route("/api/leagues/:id/roster/:team/add", post(roster_add))
        .route("/api/leagues/:id/roster/:team/drop", post(roster_drop))
        .route("/api/leagues/:id/bets", get(list_bets).post(place_bet))
        .route("/api/leagues/:id/bankroll", get(get_bankroll))
        .route("/api/leagues/:id/weeks", get(get_weeks))
        .route(
            "/api/leagues/:id/playoffs",
            get(get_playoffs).post(configure_playoffs),
        )
        .route(
            "/api/leagues/:id/playoffs/simulate-to-start",
            post(simulate_to_playoffs),
        )
        .route("/api/leagues/:id/history", get(get_history))
        .route("/api/leagues/:id/games/:game_id/boxscore", get(get_boxscore))
        .route("/api/leagues/:id/games/:game_id/odds", get(get_odds))
        .route("/api/leagues/:id/days/:date", get(get_day))
        .route(
            "/api/leagues/:id/players/:player_id/profile",
            get(get_player_profile),
        )
        .route("/api/profiles", get(get_profiles).post(upsert_profile))
        .route("/api/profiles/:key", delete(delete_profile))
}
