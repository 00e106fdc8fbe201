use civic_proxy::{AppState, ProxyConfig, router};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ProxyConfig::from_env()?;
    let listener = TcpListener::bind(config.bind).await?;
    tracing::info!(
        addr = %config.bind,
        upstream = %config.upstream_url,
        "civic.proxy.listening"
    );

    axum::serve(listener, router(AppState::new(&config)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("civic.proxy.stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "civic.proxy.signal_handler_failed");
        std::future::pending::<()>().await;
    }
}
