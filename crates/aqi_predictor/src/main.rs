//! AQI prediction service
//!
//! Serves live and manual AQI predictions over HTTP, and provides the
//! offline ingestion, training and prediction tools that feed it.

use std::path::PathBuf;

use air_quality_structs::PollutantReading;
use anyhow::Result;
use aqi_predictor::commands;
use clap::{Parser, Subcommand};
use config::{Config, DEFAULT_MODEL_PATH};
use database::{create_pool, run_migrations};
use feature_extractor::NormalizationOptions;
use ml_model::{ForestConfig, TrainingConfig, TreeConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// AQI prediction service
#[derive(Parser)]
#[command(name = "aqi")]
#[command(about = "Air quality prediction service and model tooling")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve,

    /// Train the model on ingested history and save the artifact
    Train {
        /// Where to write the artifact (defaults to `MODEL_PATH`)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of trees in the forest
        #[arg(long, default_value = "100")]
        trees: usize,

        /// Maximum tree depth
        #[arg(long, default_value = "12")]
        max_depth: usize,

        /// Seed for the split and the bootstrap samples
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Fraction of rows held out for evaluation
        #[arg(long, default_value = "0.2")]
        test_ratio: f64,
    },

    /// Load the historical CSV dataset into the database
    Ingest {
        /// Path to the CSV file
        #[arg(short, long, default_value = commands::ingest::DEFAULT_DATA_FILE)]
        file: PathBuf,

        /// Rows per insert
        #[arg(short, long, default_value_t = commands::ingest::DEFAULT_BATCH_SIZE)]
        batch_size: usize,
    },

    /// Predict the AQI for one set of readings (CO in µg/m³)
    Predict {
        #[arg(long)]
        pm25: f64,
        #[arg(long)]
        pm10: f64,
        #[arg(long)]
        no2: f64,
        #[arg(long)]
        so2: f64,
        #[arg(long)]
        co: f64,
        #[arg(long)]
        o3: f64,

        /// Path to the model artifact
        #[arg(short, long, env = "MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
        model: PathBuf,

        /// Floor negative readings at zero (also on when FLOOR_NEGATIVE_READINGS is truthy)
        #[arg(long)]
        floor_negative: bool,
    },

    /// Run database migrations
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Serve => {
            let config = Config::from_env()?;
            commands::serve::run(&config).await?;
        }
        Commands::Train {
            output,
            trees,
            max_depth,
            seed,
            test_ratio,
        } => {
            let config = Config::from_env()?;
            let pool = create_pool(&config.database).await?;
            let training = TrainingConfig {
                test_ratio,
                seed,
                forest: ForestConfig {
                    n_trees: trees,
                    tree: TreeConfig {
                        max_depth,
                        ..TreeConfig::default()
                    },
                    seed,
                },
            };
            let output = output.unwrap_or_else(|| config.model_path.clone());
            commands::train::run(&pool, &config.model_name, &output, &training).await?;
        }
        Commands::Ingest { file, batch_size } => {
            let config = Config::from_env()?;
            let pool = create_pool(&config.database).await?;
            commands::ingest::run(&pool, &file, batch_size).await?;
        }
        Commands::Predict {
            pm25,
            pm10,
            no2,
            so2,
            co,
            o3,
            model,
            floor_negative,
        } => {
            let floor_negative = floor_negative || config::env_flag("FLOOR_NEGATIVE_READINGS")?;
            let reading = PollutantReading::new(pm25, pm10, no2, so2, co, o3);
            commands::predict::run(&model, &reading, NormalizationOptions { floor_negative })?;
        }
        Commands::Migrate => {
            let config = Config::from_env()?;
            let pool = create_pool(&config.database).await?;
            run_migrations(&pool).await?;
            info!("Migrations completed successfully");
        }
    }

    Ok(())
}
