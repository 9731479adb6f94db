use std::sync::Arc;

use anyhow::Context;
use pricecast_core::dataset::HistoricalSeries;
use pricecast_core::model::ModelArtifact;
use pricecast_core::service::PredictionService;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod error;
mod routes;

use routes::{AppState, ModelInfo};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = pricecast_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let port = settings.require_port()?;

    // Both must be in memory before the listener is bound.
    let state = match load_state(&settings) {
        Ok(state) => state,
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %format!("{e:#}"), "startup failed; refusing to serve");
            return Err(e);
        }
    };

    let app = routes::router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn load_state(settings: &pricecast_core::config::Settings) -> anyhow::Result<AppState> {
    let series = HistoricalSeries::load(settings.require_dataset_path()?)?;
    let artifact = ModelArtifact::load(settings.require_model_path()?)?;

    let info = ModelInfo::from(&artifact);
    let service = PredictionService::from_artifact(Arc::new(series), artifact);
    Ok(AppState::new(service, info))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
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
