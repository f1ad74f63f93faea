//! Pulse simulator: drives the kernel with synthetic history and audiences.

use chrono::Utc;
use clap::{Parser, Subcommand};
use pulse_core::{ContentMetadata, KernelConfig, Scope};
use pulse_predictor::PredictionTarget;
use pulse_sim::simulate::{run_bandit, run_training};
use pulse_sim::synthetic::{SyntheticFollowerHistory, SyntheticTrainingData};
use pulse_sim::Kernel;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "pulse-sim")]
#[command(about = "Synthetic driver for the Pulse decision-and-learning kernel")]
#[command(version)]
struct Cli {
    /// Optional TOML config file
    #[arg(long, env = "PULSE__CONFIG_FILE")]
    config: Option<String>,

    /// RNG seed for reproducible runs
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Days of synthetic follower history
    #[arg(long, default_value_t = 60)]
    history_days: usize,

    /// Number of synthetic training posts
    #[arg(long, default_value_t = 300)]
    samples: usize,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a bandit simulation for one scope
    Bandit {
        #[arg(long, default_value = "content")]
        scope: Scope,
        #[arg(long, default_value_t = 1000)]
        rounds: usize,
    },
    /// Train both predictors on synthetic history
    Train {
        #[arg(long, default_value_t = 5)]
        top: usize,
    },
    /// Extract features from a post and predict its outcomes
    Features {
        text: String,
        #[arg(long)]
        hook_type: Option<String>,
        #[arg(long)]
        topic: Option<String>,
        #[arg(long)]
        hour: Option<u32>,
    },
    /// Bandit simulations for every scope, then training
    All {
        #[arg(long, default_value_t = 1000)]
        rounds: usize,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pulse_sim=info,pulse_rl_engine=info,pulse_predictor=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    let config = KernelConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        KernelConfig::default()
    });

    let mut rng = StdRng::seed_from_u64(cli.seed);
    let history = Arc::new(SyntheticFollowerHistory::generate(&mut rng, cli.history_days));
    let training = Arc::new(SyntheticTrainingData::generate(&mut rng, cli.samples, Utc::now()));
    info!(
        seed = cli.seed,
        history_days = cli.history_days,
        samples = training.len(),
        "Synthetic history generated"
    );

    let kernel = Kernel::new(config, history, training);
    info!(baseline = kernel.baseline.current(), "Follower baseline");

    match cli.command.unwrap_or(Command::All { rounds: 1000 }) {
        Command::Bandit { scope, rounds } => {
            let report = run_bandit(&kernel, scope, rounds, &mut rng)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Train { top } => {
            let reports = run_training(&kernel, top);
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
        Command::Features {
            text,
            hook_type,
            topic,
            hour,
        } => {
            run_training(&kernel, 0);
            let metadata = ContentMetadata {
                hook_type,
                topic,
                hour_posted: hour,
                ..Default::default()
            };
            let features = pulse_features::extract(&text, &metadata);
            println!("{}", serde_json::to_string_pretty(&features)?);
            for target in PredictionTarget::ALL {
                let prediction = kernel.predictor.predict_features(target, &features)?;
                info!(
                    target = target.as_str(),
                    value = prediction.value,
                    confidence = prediction.confidence,
                    "prediction"
                );
            }
        }
        Command::All { rounds } => {
            for scope in Scope::ALL {
                let report = run_bandit(&kernel, scope, rounds, &mut rng)?;
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            let reports = run_training(&kernel, 5);
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
    }

    info!("Pulse simulation complete");
    Ok(())
}
