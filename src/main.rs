use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use stockcast::application::prediction_service::PredictionService;
use stockcast::config::Config;
use stockcast::domain::market::HistoryPeriod;
use stockcast::infrastructure::market_data::CsvPriceSource;
use stockcast::infrastructure::persistence::FileArtifactStore;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory for model artifacts (overrides STOCKCAST_MODELS_DIR)
    #[arg(long, global = true)]
    models_dir: Option<PathBuf>,

    /// Directory with <TICKER>.csv price files (overrides STOCKCAST_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict the next close, training first if no usable model exists
    Predict {
        /// Ticker symbol
        #[arg(short, long)]
        ticker: String,

        /// History period (e.g. 6mo, 2y, 5y, ytd, max)
        #[arg(short, long, default_value = "5y")]
        period: String,

        /// Retrain even when a stored model exists
        #[arg(long)]
        retrain: bool,
    },
    /// Train and store a model without predicting
    Train {
        /// Ticker symbol
        #[arg(short, long)]
        ticker: String,

        /// History period (e.g. 6mo, 2y, 5y, ytd, max)
        #[arg(short, long, default_value = "5y")]
        period: String,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout carries only JSON
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let models_dir = cli.models_dir.unwrap_or(config.storage.models_dir);
    let data_dir = cli.data_dir.unwrap_or(config.storage.data_dir);
    info!(
        "Stockcast starting (models: {:?}, data: {:?})",
        models_dir, data_dir
    );

    let store = FileArtifactStore::new(&models_dir)
        .with_context(|| format!("Failed to open models directory {:?}", models_dir))?;
    let service = PredictionService::new(
        Arc::new(CsvPriceSource::new(data_dir)),
        Arc::new(store),
        config.pipeline,
    );

    let output = match cli.command {
        Commands::Predict {
            ticker,
            period,
            retrain,
        } => {
            let period: HistoryPeriod = period.parse()?;
            let report = service
                .run(&ticker, period, retrain)
                .with_context(|| format!("Prediction failed for {}", ticker))?;
            serde_json::to_string_pretty(&report)?
        }
        Commands::Train { ticker, period } => {
            let period: HistoryPeriod = period.parse()?;
            let summary = service
                .train(&ticker, period)
                .with_context(|| format!("Training failed for {}", ticker))?;
            serde_json::to_string_pretty(&summary)?
        }
    };

    println!("{}", output);
    Ok(())
}
