pub mod config;
pub mod math;
pub mod physics;
pub mod plugins;
pub mod scenes;
pub mod utils;

pub use config::{ConfigError, PhysicsConfig};
pub use math::{MathError, Quaternion, Vector3};
pub use physics::{
    BodyHandle, MotionCategory, PhysicsError, PhysicsWorld, Pose, RigidBody, ShapeDescriptor,
    SimulationRunner, StepReport, WorldSnapshot,
};
pub use scenes::{BodyRequest, Scene};
