use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

use crate::sql::Command;

/// Log directives used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_LOG_FILTER: &str = "info";

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: total commands executed. Labels: command, status.
pub const COMMANDS_TOTAL: &str = "carreserve_commands_total";

/// Histogram: command latency in seconds. Labels: command.
pub const COMMAND_DURATION_SECONDS: &str = "carreserve_command_duration_seconds";

// ── Domain metrics ──────────────────────────────────────────────

/// Counter: reservation attempts. Labels: outcome (accepted, invalid, unavailable).
pub const RESERVATIONS_TOTAL: &str = "carreserve_reservations_total";

/// Gauge: cars currently in the registry.
pub const CARS_REGISTERED: &str = "carreserve_cars_registered";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

/// Filter from `RUST_LOG`-style directives, falling back to [`DEFAULT_LOG_FILTER`].
pub fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Map a Command variant to a short label for metrics.
pub fn command_label(cmd: &Command) -> &'static str {
    match cmd {
        Command::InsertCar { .. } => "insert_car",
        Command::UpdateCar { .. } => "update_car",
        Command::DeleteCar { .. } => "delete_car",
        Command::SelectCars { .. } => "select_cars",
        Command::InsertReservation { .. } => "insert_reservation",
        Command::SelectReservations { .. } => "select_reservations",
        Command::SelectAvailability { .. } => "select_availability",
    }
}
