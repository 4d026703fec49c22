//! Error types for the VLM solver

use thiserror::Error;

/// Main error type for lattice operations
#[derive(Error, Debug)]
pub enum VlmError {
    #[error("Invalid spacing distribution: {0}")]
    InvalidSpacing(String),

    #[error("Invalid section: {0}")]
    InvalidSection(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid control '{0}': {1}")]
    InvalidControl(String, String),

    #[error("Control '{0}' not found in system")]
    ControlNotFound(String),

    #[error("Surface '{0}' not found in model")]
    SurfaceNotFound(String),

    #[error("Record '{0}' not found")]
    RecordNotFound(String),

    #[error("Duplicate name '{0}' already exists")]
    DuplicateName(String),

    #[error("Model has no surfaces to mesh")]
    EmptyModel,

    #[error("Singular influence matrix - geometry may be degenerate or self-overlapping")]
    SingularMatrix,

    #[error("Ill-conditioned influence matrix (pivot ratio {0:e})")]
    IllConditioned(f64),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Result type for lattice operations
pub type VlmResult<T> = Result<T, VlmError>;
