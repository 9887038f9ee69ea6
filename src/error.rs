//! Error types for terrain loading, saving and configuration

use thiserror::Error;

/// Errors surfaced at the crate boundary. Generation, path search and tool
/// application never fail; only I/O and configuration do.
#[derive(Debug, Error)]
pub enum TerrainError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid map: {0}")]
    InvalidMap(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, TerrainError>;
