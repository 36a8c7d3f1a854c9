use thiserror::Error;

use crate::config::ConfigError;
use crate::network::NetworkError;

/// Reasons a simulation cannot be constructed.
///
/// Once built, a simulation never fails: every per-tick outcome (no path,
/// no station, stranding) is expressed as vehicle state.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid scenario: {}", join(.0))]
    InvalidConfig(Vec<ConfigError>),

    #[error("road network: {0}")]
    Network(#[from] NetworkError),
}

impl From<ConfigError> for SimError {
    fn from(e: ConfigError) -> Self {
        SimError::InvalidConfig(vec![e])
    }
}

fn join(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}
