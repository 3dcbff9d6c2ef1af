//! Input validation errors.

use thiserror::Error;

/// Raised when a grid, threshold, or auxiliary input is malformed.
///
/// Classification is all-or-nothing: any of these aborts the call before a
/// result is built.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidInputError {
    #[error("population grid is empty")]
    EmptyGrid,

    #[error("grid data length {actual} does not match {width}x{height}")]
    SizeMismatch {
        width: usize,
        height: usize,
        actual: usize,
    },

    #[error("row {row} has {actual} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// Valid cells must be finite and non-negative; use NaN for no data.
    #[error("cell ({row}, {col}) holds invalid population {value}")]
    InvalidCell { row: usize, col: usize, value: f32 },

    #[error("threshold `{name}` must be finite and non-negative, got {value}")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("aggregation factor must be at least 1")]
    InvalidFactor,

    #[error("zone grid is {zone_width}x{zone_height}, population grid is {width}x{height}")]
    ZoneSizeMismatch {
        width: usize,
        height: usize,
        zone_width: usize,
        zone_height: usize,
    },

    #[error("point ({row}, {col}) lies outside the {width}x{height} grid")]
    PointOutOfBounds {
        row: usize,
        col: usize,
        width: usize,
        height: usize,
    },
}

pub type Result<T> = std::result::Result<T, InvalidInputError>;
