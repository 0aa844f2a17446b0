pub mod physics;

pub use physics::{ConfigError, PhysicsConfig};
