//! Error types for the riverflow engine.

use thiserror::Error;

/// Errors surfaced by configuration, ingestion and fetching.
///
/// Field reconstruction misses and discarded streamline attempts are not
/// errors; they are reported through `Option` and `ProcessReport` instead.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid month {0}: expected 1-12")]
    InvalidMonth(u8),

    #[error("Invalid record {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "toml")]
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[cfg(feature = "geojson")]
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),
}

pub type Result<T> = std::result::Result<T, FlowError>;
