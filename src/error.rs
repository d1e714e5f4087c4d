use std::io;

/// Errors produced while building grids, decoding directions or loading inputs.
///
/// The search itself never fails; everything here is raised at the edges where
/// caller-supplied data enters the engine.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("invalid direction index {0} (expected 0..=3)")]
    InvalidDirection(u8),
    #[error("grid dimension mismatch: expected {expected}x{expected}, found {found}")]
    GridDimensionMismatch { expected: usize, found: String },
    #[error("grid size must be positive")]
    InvalidSize,
    #[error("invalid tile value {value} (must be a power of two >= 2)")]
    InvalidTileValue { value: u32 },
    #[error("position ({x}, {y}) is outside a {size}x{size} grid")]
    OutOfBounds { x: i32, y: i32, size: usize },
    #[error("cell ({x}, {y}) is already occupied")]
    CellOccupied { x: i32, y: i32 },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
