//! Error types for tetray.

use thiserror::Error;

/// The main error type for tetray operations.
#[derive(Error, Debug)]
pub enum TetrayError {
    /// The mesh has no points or no cells.
    #[error("mesh is empty: {points} points, {cells} cells")]
    EmptyMesh { points: usize, cells: usize },

    /// No scalar field was supplied for the mesh.
    #[error("no scalar field supplied for the mesh")]
    MissingScalars,

    /// Data size mismatch.
    #[error("data size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// A component index or component count is out of range.
    #[error("invalid component: {0}")]
    InvalidComponent(String),

    /// The image geometry cannot be rendered into.
    #[error("invalid image geometry: {0}")]
    InvalidImage(String),

    /// A numeric render parameter is out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A triangular face is shared by more than two tetrahedra.
    #[error("face {face:?} is shared by {owners} tetrahedra")]
    DegenerateTopology { face: [u32; 3], owners: usize },

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for tetray operations.
pub type Result<T> = std::result::Result<T, TetrayError>;
