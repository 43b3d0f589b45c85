use tracing_subscriber::EnvFilter;

use elevate_vision::{app, app_config::AppConfig, build_state};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG=info by default
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = AppConfig::load()?;
    tracing::info!(models = %config.models.dir.display(), "🔧 configuration loaded");

    // Detectors load lazily on the first request for each tier.
    let state = build_state(&config);
    let router = app(state, &config);

    let addr = config.addr();
    tracing::info!("🚀 Elevate Vision listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
