use anyhow::Context;
use carbon_api::{router, AppState, ServiceConfig, MIN_HISTORY};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = ServiceConfig::from_env()?;
    let state = AppState::load(&cfg)?;

    let history = state.history();
    tracing::info!(
        "loaded carbon history: {} samples (skipped {}), latest {:?}",
        history.len(),
        history.skipped(),
        history.latest_timestamp()
    );
    tracing::info!(
        "loaded carbon model: {}; cluster model: k={}",
        state.carbon_model().describe(),
        state.clusterer().n_clusters()
    );

    // Warmup against the latest sample so a bad artifact shows up at boot
    match history.latest_timestamp() {
        Some(latest) if history.len() >= MIN_HISTORY => {
            let p = state.predict_carbon(latest)?;
            tracing::info!("warmup prediction ok ({})", p);
        }
        _ => tracing::warn!(
            "carbon history has {} samples; /predict_carbon needs at least {} and will fail",
            history.len(),
            MIN_HISTORY
        ),
    }

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.bind_addr))?;
    tracing::info!("listening on {}", cfg.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
