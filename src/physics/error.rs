use super::handle::BodyHandle;
use crate::math::MathError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhysicsError {
    #[error("Invalid shape parameters: {0}")]
    InvalidShapeParameters(String),

    #[error("Invalid mass: {0}")]
    InvalidMass(String),

    #[error("Unknown body handle: {0}")]
    UnknownHandle(BodyHandle),

    #[error("Stale body handle (body was removed): {0}")]
    StaleHandle(BodyHandle),

    #[error(transparent)]
    Math(#[from] MathError),

    #[error("Simulation fault on body {handle} during sub-step {sub_step}: {reason}")]
    SimulationFault {
        handle: BodyHandle,
        sub_step: u32,
        reason: &'static str,
    },

    #[error("Invalid time step: {0}")]
    InvalidTimeStep(f32),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Step cancelled after {completed} of {requested} sub-steps")]
    Cancelled { completed: u32, requested: u32 },

    #[error("Simulation runner disconnected")]
    RunnerDisconnected,
}

impl PhysicsError {
    /// True for the degenerate-input math failure (zero-length normalize).
    pub fn is_degenerate_input(&self) -> bool {
        matches!(self, PhysicsError::Math(MathError::DegenerateInput(_)))
    }
}

pub type Result<T> = std::result::Result<T, PhysicsError>;
