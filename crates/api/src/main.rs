use std::sync::{Arc, Mutex};

use anyhow::Context;

use bridge_api::app::{build_app, ApiConflictSink, AppServices};
use bridge_infra::{build_engine, BridgeConfig, ConflictAlertRunner, JsonFileDedupStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    bridge_observability::init();

    let cfg = BridgeConfig::from_env().context("invalid configuration")?;
    tracing::info!(
        threshold = cfg.risk_threshold.value(),
        scale = ?cfg.score_scale,
        window = ?cfg.dedup_window,
        dedup_file = %cfg.dedup_path.display(),
        "configuration loaded"
    );

    let store = Arc::new(Mutex::new(
        JsonFileDedupStore::open(&cfg.dedup_path).context("failed to open dedup store")?,
    ));
    let sink = Arc::new(ApiConflictSink::new());

    let runner = ConflictAlertRunner::from_config(&cfg)
        .spawn("bridge.conflict_alerts", build_engine(&cfg), store.clone(), sink.clone())
        .context("failed to spawn conflict alert runner")?;

    let services = Arc::new(AppServices::new(&cfg, store, sink));
    let app = build_app(services);

    let listener = tokio::net::TcpListener::bind(cfg.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "failed to listen for shutdown signal");
            }
        })
        .await?;

    tracing::info!("shutting down");
    tokio::task::spawn_blocking(move || runner.shutdown()).await?;
    Ok(())
}
