//! League Persistence
//!
//! JSON-file storage for league aggregates plus the scoring profile
//! catalog. One file per league under the data directory; writes go
//! through a temp file and rename so a crash never leaves a torn
//! document.
//!
//! The store is also the per-league serialization point: every league
//! id maps to one `Mutex<LeagueState>`, and callers run each mutating
//! operation under that lock so operations never interleave against
//! the same league.

use chrono::NaiveDate;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::engine::draft::DraftStatus;
use crate::engine::league::LeagueState;
use crate::engine::scoring::ProfileCatalog;

const CATALOG_FILE: &str = "profiles.json";
const LEAGUE_SUFFIX: &str = ".league.json";

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Serialization(serde_json::Error),
    AlreadyExists(String),
    NotFound(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "store io error: {}", e),
            StoreError::Serialization(e) => write!(f, "store serialization error: {}", e),
            StoreError::AlreadyExists(id) => write!(f, "league '{}' already exists", id),
            StoreError::NotFound(id) => write!(f, "league '{}' not found", id),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e)
    }
}

// ============================================================================
// Store
// ============================================================================

/// Listing row for the league index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeagueSummary {
    pub league_id: String,
    pub name: String,
    pub team_count: usize,
    pub draft_status: DraftStatus,
    pub current_date: Option<NaiveDate>,
    pub season_complete: bool,
}

pub struct LeagueStore {
    dir: PathBuf,
    leagues: RwLock<HashMap<String, Arc<Mutex<LeagueState>>>>,
    catalog: Mutex<ProfileCatalog>,
}

impl LeagueStore {
    /// Open (or initialize) a store rooted at `dir`, loading every
    /// persisted league and the profile catalog.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let catalog_path = dir.join(CATALOG_FILE);
        let catalog = if catalog_path.exists() {
            serde_json::from_str(&fs::read_to_string(&catalog_path)?)?
        } else {
            ProfileCatalog::builtin()
        };

        let mut leagues = HashMap::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.ends_with(LEAGUE_SUFFIX) {
                continue;
            }
            match serde_json::from_str::<LeagueState>(&fs::read_to_string(&path)?) {
                Ok(state) => {
                    leagues.insert(
                        state.config.league_id.clone(),
                        Arc::new(Mutex::new(state)),
                    );
                }
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "skipping unreadable league file");
                }
            }
        }
        info!(dir = %dir.display(), leagues = leagues.len(), "league store opened");

        Ok(Self {
            dir,
            leagues: RwLock::new(leagues),
            catalog: Mutex::new(catalog),
        })
    }

    fn league_path(&self, league_id: &str) -> PathBuf {
        self.dir.join(format!("{}{}", league_id, LEAGUE_SUFFIX))
    }

    fn write_atomic(path: &Path, contents: &str) -> Result<(), StoreError> {
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Register and persist a freshly created league.
    pub fn create(&self, state: LeagueState) -> Result<Arc<Mutex<LeagueState>>, StoreError> {
        let league_id = state.config.league_id.clone();
        {
            let leagues = self.leagues.read();
            if leagues.contains_key(&league_id) {
                return Err(StoreError::AlreadyExists(league_id));
            }
        }
        self.persist(&state)?;
        let handle = Arc::new(Mutex::new(state));
        self.leagues.write().insert(league_id, handle.clone());
        Ok(handle)
    }

    /// Per-league lock handle; mutating callers hold it across the
    /// whole operation-plus-persist sequence.
    pub fn league(&self, league_id: &str) -> Result<Arc<Mutex<LeagueState>>, StoreError> {
        self.leagues
            .read()
            .get(league_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(league_id.to_string()))
    }

    /// Write a league's current state to disk.
    pub fn persist(&self, state: &LeagueState) -> Result<(), StoreError> {
        let path = self.league_path(&state.config.league_id);
        let json = serde_json::to_string_pretty(state)?;
        Self::write_atomic(&path, &json)?;
        debug!(league_id = %state.config.league_id, "league persisted");
        Ok(())
    }

    pub fn delete(&self, league_id: &str) -> Result<(), StoreError> {
        let removed = self.leagues.write().remove(league_id);
        if removed.is_none() {
            return Err(StoreError::NotFound(league_id.to_string()));
        }
        let path = self.league_path(league_id);
        if path.exists() {
            fs::remove_file(path)?;
        }
        info!(league_id, "league deleted");
        Ok(())
    }

    pub fn list(&self) -> Vec<LeagueSummary> {
        let mut rows: Vec<LeagueSummary> = self
            .leagues
            .read()
            .values()
            .map(|handle| {
                let state = handle.lock();
                LeagueSummary {
                    league_id: state.config.league_id.clone(),
                    name: state.config.name.clone(),
                    team_count: state.teams.len(),
                    draft_status: state.draft.status,
                    current_date: state.calendar.current_date(),
                    season_complete: state.calendar.is_complete(),
                }
            })
            .collect();
        rows.sort_by(|a, b| a.league_id.cmp(&b.league_id));
        rows
    }

    pub fn catalog(&self) -> ProfileCatalog {
        self.catalog.lock().clone()
    }

    /// Mutate the profile catalog and persist it in one step.
    pub fn update_catalog<T>(
        &self,
        apply: impl FnOnce(&mut ProfileCatalog) -> T,
    ) -> Result<T, StoreError> {
        let mut catalog = self.catalog.lock();
        let out = apply(&mut catalog);
        let json = serde_json::to_string_pretty(&*catalog)?;
        Self::write_atomic(&self.dir.join(CATALOG_FILE), &json)?;
        Ok(out)
    }
}
