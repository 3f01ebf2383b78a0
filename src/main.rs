use std::sync::Arc;

use tokio::io::BufReader;
use tracing::info;

use carreserve::clock::SystemClock;
use carreserve::config::Config;
use carreserve::console;
use carreserve::engine::Engine;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(carreserve::observability::log_filter(
            std::env::var("RUST_LOG").ok().as_deref(),
        ))
        .init();

    let config = Config::from_env()?;
    carreserve::observability::init(config.metrics_port)?;

    let engine = Engine::new(Arc::new(SystemClock), config.boundary);
    info!("carreserve ready");
    info!("  boundary: {}", config.boundary);
    info!(
        "  metrics: {}",
        config
            .metrics_port
            .map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics"))
    );

    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();

    tokio::select! {
        result = console::run(&engine, stdin, stdout) => {
            result?;
            info!("input closed");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    info!("carreserve stopped");
    Ok(())
}
