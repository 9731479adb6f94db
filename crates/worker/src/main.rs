use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use pricecast_core::dataset::HistoricalSeries;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod train;

#[derive(Debug, Parser)]
#[command(name = "pricecast_worker", about = "Train the price model and write its artifact")]
struct Args {
    /// `;`-delimited daily dataset. Defaults to DATASET_PATH.
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Where to write the model artifact. Defaults to MODEL_PATH.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Share of the most recent rows held out for RMSE/MAE.
    #[arg(long)]
    test_fraction: Option<f64>,

    /// L2 penalty on standardized coefficients.
    #[arg(long)]
    ridge: Option<f64>,

    /// Train and report metrics without writing the artifact.
    #[arg(long)]
    dry_run: bool,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = pricecast_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    if let Err(err) = run(&settings, args) {
        sentry_anyhow::capture_anyhow(&err);
        tracing::error!(error = %format!("{err:#}"), "training run failed");
        return Err(err);
    }
    Ok(())
}

fn run(settings: &pricecast_core::config::Settings, args: Args) -> anyhow::Result<()> {
    let dataset = match args.dataset {
        Some(p) => p,
        None => settings.require_dataset_path()?.to_path_buf(),
    };

    let mut opts = train::TrainOptions::from_env();
    if let Some(f) = args.test_fraction {
        opts.test_fraction = f;
    }
    if let Some(r) = args.ridge {
        opts.ridge = r;
    }

    let series = HistoricalSeries::load(&dataset)?;
    let outcome = train::train(&series, &opts)?;
    let artifact = &outcome.artifact;

    tracing::info!(
        model_id = %artifact.model_id,
        train_rows = outcome.train_rows,
        test_rows = outcome.test_rows,
        "Model Metrics - RMSE: {:.2}, MAE: {:.2}",
        artifact.metrics.rmse,
        artifact.metrics.mae
    );

    if args.dry_run {
        tracing::info!(dry_run = true, "artifact not written");
        return Ok(());
    }

    let output = match args.output {
        Some(p) => p,
        None => settings.require_model_path()?.to_path_buf(),
    };
    artifact
        .save(&output)
        .with_context(|| format!("failed to persist model to {}", output.display()))?;

    tracing::info!(path = %output.display(), model_id = %artifact.model_id, "model artifact written");
    Ok(())
}

fn init_sentry(settings: &pricecast_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
