use anyhow::Context;

use dashgate_api::app::{AppState, build_app};
use dashgate_api::config::AppConfig;
use dashgate_observability::LogFormat;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Missing secrets or backend URL must stop the process before it serves traffic.
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            dashgate_observability::init(LogFormat::default());
            tracing::error!(%error, "refusing to start: invalid configuration");
            return Err(error.into());
        }
    };
    dashgate_observability::init(config.log_format);

    let state = AppState::from_config(&config).context("failed to wire application state")?;
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        identity_backend = %config.identity_backend_url,
        session_ttl_secs = config.session_ttl.num_seconds(),
        "listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
