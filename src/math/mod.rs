mod quaternion;
mod vector;

pub use quaternion::Quaternion;
pub use vector::Vector3;

use thiserror::Error;

/// Tolerance used when checking that a quaternion is unit length.
pub const UNIT_TOLERANCE: f32 = 1e-6;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Degenerate input: {0}")]
    DegenerateInput(&'static str),

    #[error("Buffer length mismatch: expected {expected} values, got {actual}")]
    BufferLength { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, MathError>;
