//! HoopSight Backend
//!
//! Season replay server: loads a finished season's box scores and
//! betting lines, opens the league store, and serves the replay API.

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use hoopsight_backend::api::{self, AppState};
use hoopsight_backend::data::SeasonDataset;
use hoopsight_backend::store::LeagueStore;

#[derive(Parser, Debug)]
#[command(name = "hoopsight", about = "Fantasy season replay and wager settlement server")]
struct Args {
    /// Optional TOML config file; flags and env vars override it.
    #[arg(long, env = "HOOPSIGHT_CONFIG")]
    config: Option<PathBuf>,

    /// Season data file (games, player logs, odds).
    #[arg(long, env = "HOOPSIGHT_SEASON_FILE")]
    season_file: Option<PathBuf>,

    /// Directory for persisted leagues and the profile catalog.
    #[arg(long, env = "HOOPSIGHT_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Listen address, e.g. 0.0.0.0:3000.
    #[arg(long, env = "HOOPSIGHT_LISTEN")]
    listen: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    season_file: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    listen: Option<String>,
}

struct Config {
    season_file: PathBuf,
    data_dir: PathBuf,
    listen: String,
}

impl Config {
    fn resolve(args: Args) -> Result<Self> {
        let file = match &args.config {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("reading config file {}", path.display()))?;
                toml::from_str::<FileConfig>(&raw)
                    .with_context(|| format!("parsing config file {}", path.display()))?
            }
            None => FileConfig::default(),
        };

        Ok(Config {
            season_file: args
                .season_file
                .or(file.season_file)
                .unwrap_or_else(|| PathBuf::from("data/season.json")),
            data_dir: args
                .data_dir
                .or(file.data_dir)
                .unwrap_or_else(|| PathBuf::from("data/leagues")),
            listen: args
                .listen
                .or(file.listen)
                .unwrap_or_else(|| "0.0.0.0:3000".to_string()),
        })
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hoopsight_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let config = Config::resolve(Args::parse())?;

    let dataset = SeasonDataset::from_file(&config.season_file)
        .with_context(|| format!("loading season data from {}", config.season_file.display()))?;
    info!(
        dates = dataset.season_dates().len(),
        players = dataset.player_ids().len(),
        "season dataset loaded"
    );

    let store = LeagueStore::open(&config.data_dir)
        .with_context(|| format!("opening league store at {}", config.data_dir.display()))?;

    let state = Arc::new(AppState {
        store: Arc::new(store),
        dataset: Arc::new(dataset),
    });

    let app = api::router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = TcpListener::bind(&config.listen).await?;
    info!("API server listening on {}", config.listen);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
