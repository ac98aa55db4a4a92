//! Render errors.

use thiserror::Error;

/// Render and export errors.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid export scale: {0}")]
    InvalidScale(f64),
    #[error("Could not allocate a {width}x{height} surface")]
    SurfaceAllocation { width: u32, height: u32 },
    #[error("Font error: {0}")]
    Font(String),
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;
