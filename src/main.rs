use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use play_stats::calculate::{
    best_players, dimension_statistics, field_statistics, game_player_statistics, game_statistics,
    starting_order_correlation,
};
use play_stats::config::AppConfig;
use play_stats::models::{FieldId, Game, Play, PlayRecord};
use play_stats::storage::{read_json, JsonlReader};

#[derive(Parser)]
#[command(name = "play-stats")]
#[command(about = "Rankings, skill ratings and statistics for board game plays")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Game definition (JSON)
    #[arg(long)]
    game: PathBuf,

    /// Play export (JSONL, one play per line)
    #[arg(long)]
    plays: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Game statistics, overall and by player count
    Game,

    /// One player's statistics for the game
    Player {
        /// Player ID
        #[arg(long)]
        id: String,
    },

    /// Usage of the values of a misc field
    Dimension {
        /// Misc field ID
        #[arg(long)]
        field: String,

        /// Only count entries of this player
        #[arg(long)]
        player: Option<String>,
    },

    /// Skill ratings of the best players
    Ratings {
        /// Minimum rated plays (default from config)
        #[arg(long)]
        min_plays: Option<u32>,
    },

    /// Correlation between seat order and finishing position
    StartingOrder,

    /// Statistics per scoring field
    Fields,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;

    // Initialize tracing
    let log_level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    info!("Starting play-stats v{}", env!("CARGO_PKG_VERSION"));

    let game: Game = read_json(&cli.game)
        .with_context(|| format!("Failed to read game from {:?}", cli.game))?;
    let plays = load_plays(&cli.plays, &game)?;
    info!("Loaded {} plays of {}", plays.len(), game.name);

    match cli.command {
        Commands::Game => {
            let dimensions = numeric_dimensions(&game, &config);
            print_json(&game_statistics(&game, &plays, &dimensions))
        }

        Commands::Player { id } => {
            if !plays.iter().any(|p| p.has_player(&id)) {
                warn!("Player {} does not appear in any play", id);
            }
            let dimensions = numeric_dimensions(&game, &config);
            print_json(&game_player_statistics(&game, &plays, &id, &dimensions))
        }

        Commands::Dimension { field, player } => {
            let Some(dimension) = game.misc_field(&field) else {
                bail!("Game {} has no misc field {}", game.id, field);
            };
            print_json(&dimension_statistics(&plays, dimension, player.as_deref()))
        }

        Commands::Ratings { min_plays } => {
            let min_plays = min_plays.unwrap_or(config.report.min_plays);
            print_json(&best_players(&plays, min_plays, &config.rating))
        }

        Commands::StartingOrder => match starting_order_correlation(&game, &plays) {
            Some(correlation) => print_json(&correlation),
            None => {
                info!("{} is played with simultaneous turns", game.name);
                print_json(&serde_json::Value::Null)
            }
        },

        Commands::Fields => print_json(&field_statistics(&game, &plays)),
    }
}

/// Read the play export, keeping only plays of `game`.
fn load_plays(path: &Path, game: &Game) -> Result<Vec<Play>> {
    let reader: JsonlReader<PlayRecord> = JsonlReader::new(path);
    if !reader.exists() {
        bail!("Play export not found: {:?}", path);
    }

    let records = reader
        .read_where(|record| {
            let matches = record.game_id == game.id;
            if !matches {
                warn!(
                    "Skipping play {} of game {}, expected {}",
                    record.id, record.game_id, game.id
                );
            }
            matches
        })
        .with_context(|| format!("Failed to read plays from {:?}", path))?;

    Ok(records.into_iter().map(Play::new).collect())
}

/// Numeric misc fields of the game marked as report dimensions, plus the
/// configured ones.
fn numeric_dimensions(game: &Game, config: &AppConfig) -> Vec<FieldId> {
    let mut dimensions: Vec<FieldId> = game
        .report_dimensions()
        .filter(|field| field.is_numeric())
        .map(|field| field.id.clone())
        .collect();

    for id in &config.report.numeric_dimensions {
        if game.misc_field(id).is_none() {
            warn!("Configured dimension {} is not a misc field of {}", id, game.id);
        }
        let id = FieldId::from(id.as_str());
        if !dimensions.contains(&id) {
            dimensions.push(id);
        }
    }
    dimensions
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
