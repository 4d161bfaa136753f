use anyhow::Context;
use trainstats_realtime::app;
use trainstats_realtime::config::AppConfig;
use trainstats_realtime::feed::WebSocketFeedClient;
use trainstats_realtime::observability::metrics::register_metrics;
use trainstats_realtime::observability::tracing::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = std::env::var("TRAINSTATS_ENV").unwrap_or_else(|_| "default".to_string());
    let config = AppConfig::load(&env).context("failed to load configuration")?;

    init_logging(&config.logging);
    register_metrics().context("failed to register metrics")?;

    tracing::info!(
        "Starting trainstats-realtime ({} env, {} catalogued operators)",
        env,
        config.operators.len()
    );

    let feed = WebSocketFeedClient::new(&config.feed);
    app::run(config, &feed).await.context("service failed")?;

    tracing::info!("Shutdown complete");
    Ok(())
}
