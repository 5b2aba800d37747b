//! Crate-level error types.

use thiserror::Error;

/// Errors produced outside the geometry code: loading and validating configuration.
///
/// Geometry queries never fail; a ray that misses everything is `None`.
#[derive(Debug, Error)]
pub enum ArcviewError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
