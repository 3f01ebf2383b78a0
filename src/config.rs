use crate::model::BoundaryPolicy;

/// Runtime settings read from `CARRESERVE_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Config {
    pub boundary: BoundaryPolicy,
    pub metrics_port: Option<u16>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct ConfigError {
    pub var: &'static str,
    pub reason: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.var, self.reason)
    }
}

impl std::error::Error for ConfigError {}

pub const BOUNDARY_VAR: &str = "CARRESERVE_BOUNDARY";
pub const METRICS_PORT_VAR: &str = "CARRESERVE_METRICS_PORT";

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source. Unset or blank variables keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(raw) = lookup(BOUNDARY_VAR).filter(|s| !s.trim().is_empty()) {
            config.boundary = raw.parse().map_err(|reason| ConfigError {
                var: BOUNDARY_VAR,
                reason,
            })?;
        }

        if let Some(raw) = lookup(METRICS_PORT_VAR).filter(|s| !s.trim().is_empty()) {
            let port = raw.trim().parse::<u16>().map_err(|e| ConfigError {
                var: METRICS_PORT_VAR,
                reason: format!("{raw:?}: {e}"),
            })?;
            config.metrics_port = Some(port);
        }

        Ok(config)
    }
}
