//! Error types for Horton

use thiserror::Error;

/// Main error type for Horton operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Invalid flow code {value} at ({row}, {col})")]
    InvalidFlowCode { row: usize, col: usize, value: f64 },

    #[error("Flow direction cycle: path starting at ({row}, {col}) never reaches an outlet")]
    DirectionCycle { row: usize, col: usize },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for Horton operations
pub type Result<T> = std::result::Result<T, Error>;
