use physim::{
    physics::{BodyHandle, PhysicsWorld, RigidBody},
    PhysicsConfig, Vector3,
};

/// Default sub-step, 60 Hz
pub const H: f32 = 1.0 / 60.0;

/// Creates a test physics configuration
pub fn create_test_physics_config() -> PhysicsConfig {
    PhysicsConfig {
        gravity: Vector3::new(0.0, -9.81, 0.0),
        sub_step: H,
        max_sub_steps: 10,
        ..Default::default()
    }
}

/// Creates an initialized world using the test configuration
pub fn create_test_world() -> PhysicsWorld {
    PhysicsWorld::with_config(create_test_physics_config()).unwrap()
}

/// Creates a world with a ground plane at y = 0; returns it with the plane handle
pub fn create_ground_world() -> (PhysicsWorld, BodyHandle) {
    let mut world = create_test_world();
    let ground = world.add_rigid_body(RigidBody::create_plane(Vector3::Y, 0.0).unwrap());
    (world, ground)
}

/// Adds a mass-1 sphere of radius 0.5 at `position`
pub fn add_test_sphere(world: &mut PhysicsWorld, position: Vector3) -> BodyHandle {
    world.add_rigid_body(RigidBody::create_sphere(1.0, position, 0.5).unwrap())
}

/// Adds a mass-1 unit cube (half extents 0.5) at `position`
pub fn add_test_box(world: &mut PhysicsWorld, position: Vector3) -> BodyHandle {
    world.add_rigid_body(RigidBody::create_box(1.0, position, Vector3::splat(0.5)).unwrap())
}

/// Steps the world `steps` times by one sub-step each
pub fn run_steps(world: &mut PhysicsWorld, steps: usize) {
    for _ in 0..steps {
        world.step(H).unwrap();
    }
}
