use anyhow::Context;
use clap::{Parser, Subcommand};
use hr_churn::{
    analytics::{AnalyticsService, MetricsResponse},
    config::Config,
    ml::{self, InferenceService, ModelArtifact},
    models::EmployeeRecord,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "hr-churn-cli")]
#[command(about = "HR churn model training and offline tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a model from the dataset and save the artifact
    Train {
        /// Dataset CSV (defaults to data.dataset_path)
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Artifact destination (defaults to model.artifact_path)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of trees in the ensemble
        #[arg(short = 'n', long)]
        trees: Option<usize>,

        /// Maximum tree depth
        #[arg(long)]
        max_depth: Option<usize>,

        /// Fraction of rows held out for evaluation
        #[arg(long)]
        test_size: Option<f64>,

        /// Seed for the split and bootstrap sampling
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print dataset metrics as JSON
    Metrics {
        /// Dataset CSV (defaults to data.dataset_path)
        #[arg(short, long)]
        data: Option<PathBuf>,
    },

    /// Score one employee record given as JSON
    Predict {
        /// Employee record, e.g. '{"satisfaction_level":0.1,...}'
        #[arg(value_name = "RECORD_JSON")]
        record: String,

        /// Artifact to load (defaults to model.artifact_path)
        #[arg(short, long)]
        model: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load().context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("hr_churn={}", config.observability.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Train {
            data,
            output,
            trees,
            max_depth,
            test_size,
            seed,
        } => {
            if let Some(trees) = trees {
                config.training.n_trees = trees;
            }
            if max_depth.is_some() {
                config.training.max_depth = max_depth;
            }
            if let Some(test_size) = test_size {
                config.training.test_size = test_size;
            }
            if let Some(seed) = seed {
                config.training.seed = seed;
            }
            config.validate()?;

            let data = data.unwrap_or(config.data.dataset_path);
            let output = output.unwrap_or(config.model.artifact_path);

            let report = ml::train_from_file(&data, &output, &config.training)
                .with_context(|| format!("Training on {} failed", data.display()))?;

            println!(
                "Holdout accuracy: {:.3} ({} train rows, {} holdout rows, {} dropped)",
                report.holdout_metrics.accuracy,
                report.train_rows,
                report.holdout_rows,
                report.rows_dropped
            );
            println!("Model saved to {}", output.display());
        }

        Commands::Metrics { data } => {
            if let Some(data) = data {
                config.data.dataset_path = data;
            }
            let metrics = AnalyticsService::new(&config.data)
                .metrics()
                .with_context(|| {
                    format!("Cannot compute metrics for {}", config.data.dataset_path.display())
                })?;
            println!(
                "{}",
                serde_json::to_string_pretty(&MetricsResponse::from(metrics))?
            );
        }

        Commands::Predict { record, model } => {
            let record: EmployeeRecord =
                serde_json::from_str(&record).context("Record is not valid JSON")?;
            let path = model.unwrap_or(config.model.artifact_path);
            let artifact = ModelArtifact::load(&path)?;

            let service = InferenceService::new(Arc::new(artifact), config.model.decision_threshold)?;
            let outcome = service.predict(record)?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }

    Ok(())
}
