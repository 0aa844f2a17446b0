mod physics;

pub use physics::{
    physics_step_system, LatestSnapshot, PhysicsFaultEvent, PhysicsPlugin, PhysicsSet,
    SimulationControl,
};
