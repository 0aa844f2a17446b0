pub mod body;
pub mod collision;
pub mod error;
pub mod handle;
pub mod integrator;
pub mod runner;
pub mod shape;
pub mod snapshot;
pub mod world;

pub use body::{Material, MotionCategory, Pose, RigidBody};
pub use error::{PhysicsError, Result};
pub use handle::{BodyHandle, WorldId};
pub use runner::{SimulationRunner, WorldCommand};
pub use shape::{Aabb, ShapeDescriptor, ShapeKind};
pub use snapshot::{BodySnapshot, WorldSnapshot};
pub use world::{plan_sub_steps, CancelToken, PhysicsWorld, StepReport, DEFAULT_MAX_SUB_STEPS};
