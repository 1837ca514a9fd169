mod api;
mod middleware;

use std::sync::Arc;

use revdash_sentiment::ReviewService;
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = revdash_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(env = %config.env, data_path = %config.data_path.display(), "starting review dashboard server");

    let service = Arc::new(ReviewService::from_config(&config)?);

    // A failed startup load leaves the server up; data routes answer 503
    // until a reload succeeds.
    match service.reload(config.initial_load_count, None).await {
        Ok(report) => tracing::info!(
            loaded_count = report.loaded_count,
            duplicates_removed = report.duplicates_removed,
            "initial load complete"
        ),
        Err(e) => tracing::error!(error = %e, "initial load failed; serving without data"),
    }

    if config.build_embeddings_on_start {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            match service.build_embeddings().await {
                Ok(report) => tracing::info!(
                    source = ?report.source,
                    entries = report.entries,
                    skipped = report.skipped,
                    "embedding index ready"
                ),
                Err(e) => tracing::warn!(error = %e, "embedding index not built"),
            }
        });
    }

    let app = build_app(AppState { service });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
