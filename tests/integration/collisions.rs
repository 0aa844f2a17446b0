use approx::assert_relative_eq;
use physim::{
    physics::{MotionCategory, PhysicsError, RigidBody},
    PhysicsWorld, Scene, Vector3,
};

use crate::common::{
    add_test_box, add_test_sphere, assert_body_valid, assert_vec_eq, create_ground_world,
    create_test_world, run_steps,
};

#[test]
fn test_sphere_comes_to_rest_on_ground() {
    let (mut world, ground) = create_ground_world();
    let sphere = add_test_sphere(&mut world, Vector3::new(0.0, 2.0, 0.0));

    run_steps(&mut world, 240);

    let body = world.body(sphere).unwrap();
    assert_body_valid(body);
    assert_relative_eq!(body.position().y, 0.5, epsilon = 0.01);
    assert!(body.linear_velocity().length() < 0.2);
    assert_eq!(world.get_pose(ground).unwrap().position, Vector3::ZERO);
}

#[test]
fn test_box_rests_at_half_height() {
    let (mut world, _) = create_ground_world();
    let handle = add_test_box(&mut world, Vector3::new(3.0, 1.5, -1.0));

    run_steps(&mut world, 240);

    let pose = world.get_pose(handle).unwrap();
    assert_vec_eq(pose.position, Vector3::new(3.0, 0.5, -1.0), 0.01);
}

#[test]
fn test_kinematic_body_pushes_dynamic_body() {
    let mut world = create_test_world();
    world.initialize(Vector3::ZERO).unwrap();

    let pusher = add_test_box(&mut world, Vector3::ZERO);
    world
        .set_motion_category(pusher, MotionCategory::Kinematic)
        .unwrap();
    world.set_linear_velocity(pusher, Vector3::X).unwrap();
    let ball = add_test_sphere(&mut world, Vector3::new(1.5, 0.0, 0.0));

    run_steps(&mut world, 120);

    // The kinematic body follows its velocity regardless of contacts
    let pusher_pose = world.get_pose(pusher).unwrap();
    assert_relative_eq!(pusher_pose.position.x, 2.0, epsilon = 1e-3);
    assert_eq!(world.linear_velocity(pusher).unwrap(), Vector3::X);

    let ball_pose = world.get_pose(ball).unwrap();
    assert!(ball_pose.position.x >= pusher_pose.position.x + 0.99);
    assert!(world.linear_velocity(ball).unwrap().x >= 1.0 - 1e-4);
}

#[test]
fn test_head_on_collision_conserves_momentum() {
    let mut world = create_test_world();
    world.initialize(Vector3::ZERO).unwrap();

    let light = world.add_rigid_body(
        RigidBody::create_sphere(1.0, Vector3::new(-2.0, 0.0, 0.0), 0.5)
            .unwrap()
            .with_linear_velocity(Vector3::new(2.0, 0.0, 0.0)),
    );
    let heavy = world.add_rigid_body(
        RigidBody::create_sphere(2.0, Vector3::new(2.0, 0.0, 0.0), 0.5)
            .unwrap()
            .with_linear_velocity(Vector3::new(-1.0, 0.0, 0.0)),
    );

    run_steps(&mut world, 180);

    let v_light = world.linear_velocity(light).unwrap();
    let v_heavy = world.linear_velocity(heavy).unwrap();
    assert_relative_eq!(v_light.x + 2.0 * v_heavy.x, 0.0, epsilon = 1e-4);
    // They bounced apart
    assert!(v_light.x < 0.0 && v_heavy.x > 0.0);
}

#[test]
fn test_material_changes_are_validated() {
    let (mut world, ground) = create_ground_world();
    let handle = add_test_sphere(&mut world, Vector3::new(0.0, 1.0, 0.0));

    world.set_friction(handle, 0.0).unwrap();
    world.set_restitution(ground, 1.0).unwrap();
    assert_eq!(world.body(handle).unwrap().material().friction, 0.0);

    assert!(matches!(
        world.set_friction(handle, -0.1),
        Err(PhysicsError::InvalidParameter(_))
    ));
    assert!(matches!(
        world.set_restitution(handle, 1.5),
        Err(PhysicsError::InvalidParameter(_))
    ));
    assert_eq!(world.body(handle).unwrap().material().restitution, 0.2);
}

#[test]
fn test_pendulum_anchor_stays_fixed() {
    let mut world = PhysicsWorld::new();
    let handles = Scene::Pendulum.populate(&mut world).unwrap();
    let (anchor, bob) = (handles[1], handles[2]);

    run_steps(&mut world, 300);

    assert_eq!(
        world.get_pose(anchor).unwrap().position,
        Vector3::new(0.0, 10.0, 0.0)
    );
    assert_relative_eq!(world.get_pose(bob).unwrap().position.y, 1.0, epsilon = 0.02);
}

#[test]
fn test_domino_scene_stays_finite() {
    let mut world = PhysicsWorld::new();
    let handles = Scene::Domino.populate(&mut world).unwrap();

    run_steps(&mut world, 300);

    for handle in handles {
        let body = world.body(handle).unwrap();
        assert_body_valid(body);
        assert!(
            body.position().y > -0.5,
            "{handle} sank below the ground: {:?}",
            body.position()
        );
    }
}
