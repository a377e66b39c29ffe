//! Errors for the layers that accept outside input. The packing engine
//! itself never fails.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("invalid piece '{input}', expected WxL (e.g. 11-6x13-6)")]
    InvalidPiece { input: String },

    #[error("invalid dimension '{input}', expected feet or feet-inches")]
    InvalidDimension { input: String },

    #[error("dimensions must be non-zero in '{input}'")]
    ZeroDimension { input: String },

    #[error("piece {id} has a zero width or length")]
    EmptyPiece { id: u32 },

    #[error("piece {id} is longer than {max}in on one side")]
    OversizedPiece { id: u32, max: u32 },

    #[error("{count} pieces given, at most {max} are accepted")]
    TooManyPieces { count: usize, max: usize },

    #[error("{count} steps requested, at most {max} are accepted")]
    TooManySteps { count: u32, max: u32 },

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, InputError>;
