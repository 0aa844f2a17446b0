use approx::assert_relative_eq;
use physim::{
    physics::{MotionCategory, PhysicsError, PhysicsWorld, Pose, RigidBody, ShapeDescriptor},
    Quaternion, Vector3, WorldSnapshot,
};
use pretty_assertions::assert_eq;

use crate::common::{add_test_box, add_test_sphere, create_ground_world, create_test_world, run_steps};

#[test]
fn test_pose_is_returned_exactly() {
    let mut world = create_test_world();
    let position = Vector3::new(0.123_456_7, -98.765_43, 1e-7);
    let orientation = Quaternion::new(0.1, 0.2, 0.3, 0.4);
    let body = RigidBody::create_cylinder(2.0, position, Vector3::new(0.5, 1.0, 0.5))
        .unwrap()
        .with_orientation(orientation)
        .unwrap();
    let handle = world.add_rigid_body(body);

    let pose = world.get_pose(handle).unwrap();
    assert_eq!(pose.position, position);
    assert_relative_eq!(pose.orientation.length(), 1.0, epsilon = 1e-6);
}

#[test]
fn test_every_shape_factory() {
    let mut world = create_test_world();
    let bodies = vec![
        RigidBody::create_box(1.0, Vector3::ZERO, Vector3::splat(0.5)),
        RigidBody::create_sphere(1.0, Vector3::ZERO, 0.5),
        RigidBody::create_capsule(1.0, Vector3::ZERO, 0.3, 0.6),
        RigidBody::create_cylinder(1.0, Vector3::ZERO, Vector3::new(0.4, 0.8, 0.4)),
        RigidBody::create_cone(1.0, Vector3::ZERO, 0.5, 1.5),
        RigidBody::create_plane(Vector3::Y, -10.0),
    ];
    for body in bodies {
        world.add_rigid_body(body.unwrap());
    }

    let kinds: Vec<String> = world
        .bodies()
        .map(|(_, body)| body.shape().kind().to_string())
        .collect();
    assert_eq!(
        kinds,
        vec!["box", "sphere", "capsule", "cylinder", "cone", "plane"]
    );
}

#[test]
fn test_invalid_creation_is_rejected_before_any_body_exists() {
    assert!(matches!(
        RigidBody::create_capsule(1.0, Vector3::ZERO, 0.0, 1.0),
        Err(PhysicsError::InvalidShapeParameters(_))
    ));
    assert!(matches!(
        RigidBody::create_cone(1.0, Vector3::ZERO, 1.0, -2.0),
        Err(PhysicsError::InvalidShapeParameters(_))
    ));
    assert!(matches!(
        RigidBody::create_box(-3.0, Vector3::ZERO, Vector3::splat(1.0)),
        Err(PhysicsError::InvalidMass(_))
    ));
    assert!(matches!(
        RigidBody::create_plane(Vector3::ZERO, 0.0),
        Err(PhysicsError::InvalidShapeParameters(_))
    ));
}

#[test]
fn test_remove_twice() {
    let mut world = create_test_world();
    let handle = add_test_sphere(&mut world, Vector3::ZERO);

    let removed = world.remove_rigid_body(handle).unwrap();
    assert_eq!(removed.mass(), 1.0);
    assert_eq!(
        world.remove_rigid_body(handle).unwrap_err(),
        PhysicsError::UnknownHandle(handle)
    );
}

#[test]
fn test_removed_handle_is_stale() {
    let mut world = create_test_world();
    let handle = add_test_sphere(&mut world, Vector3::ZERO);
    world.remove_rigid_body(handle).unwrap();
    // Reuses the freed slot
    let replacement = add_test_box(&mut world, Vector3::Y);

    assert_eq!(replacement.index(), handle.index());
    assert_eq!(world.get_pose(handle), Err(PhysicsError::StaleHandle(handle)));
    assert_eq!(
        world.apply_force(handle, Vector3::X, None),
        Err(PhysicsError::StaleHandle(handle))
    );
    assert_eq!(world.get_pose(replacement).unwrap().position, Vector3::Y);
}

#[test]
fn test_foreign_handle_is_unknown() {
    let mut first = create_test_world();
    let mut second = create_test_world();
    let foreign = add_test_sphere(&mut first, Vector3::ZERO);
    add_test_sphere(&mut second, Vector3::ZERO);

    assert_eq!(
        second.get_pose(foreign),
        Err(PhysicsError::UnknownHandle(foreign))
    );
    assert!(!second.contains(foreign));
}

#[test]
fn test_removed_body_can_move_to_another_world() {
    let mut first = create_test_world();
    let mut second = PhysicsWorld::new();
    let handle = add_test_sphere(&mut first, Vector3::new(0.0, 3.0, 0.0));
    first
        .set_linear_velocity(handle, Vector3::new(1.0, 0.0, 0.0))
        .unwrap();

    let body = first.remove_rigid_body(handle).unwrap();
    let moved = second.add_rigid_body(body);

    assert_ne!(moved.world(), handle.world());
    assert_eq!(second.linear_velocity(moved).unwrap(), Vector3::X);
    assert_eq!(first.body_count(), 0);
}

#[test]
fn test_rigid_bodies_in_insertion_order() {
    let mut world = create_test_world();
    let a = add_test_sphere(&mut world, Vector3::ZERO);
    let b = add_test_sphere(&mut world, Vector3::X);
    let c = add_test_sphere(&mut world, Vector3::Y);
    world.remove_rigid_body(a).unwrap();
    let d = add_test_sphere(&mut world, Vector3::Z);

    assert_eq!(world.rigid_bodies(), vec![b, c, d]);
}

#[test]
fn test_set_pose_overrides_without_velocity() {
    let (mut world, ground) = create_ground_world();
    let handle = add_test_box(&mut world, Vector3::new(0.0, 5.0, 0.0));
    let target = Pose::new(
        Vector3::new(2.0, 8.0, 0.0),
        Quaternion::from_axis_angle(Vector3::Y, 0.5).unwrap(),
    );

    world.set_pose(handle, target).unwrap();
    assert_eq!(world.get_pose(handle).unwrap().position, target.position);
    assert_eq!(world.linear_velocity(handle).unwrap(), Vector3::ZERO);

    // Static bodies accept a pose override too
    world.set_pose(ground, Pose::at(Vector3::new(0.0, -1.0, 0.0))).unwrap();
    assert_eq!(world.get_pose(ground).unwrap().position.y, -1.0);

    assert!(matches!(
        world.set_pose(handle, Pose::new(Vector3::ZERO, Quaternion::new(0.0, 0.0, 0.0, 0.0))),
        Err(e) if e.is_degenerate_input()
    ));
}

#[test]
fn test_motion_category_changes() {
    let (mut world, ground) = create_ground_world();
    let handle = add_test_box(&mut world, Vector3::new(0.0, 5.0, 0.0));

    world
        .set_motion_category(handle, MotionCategory::Kinematic)
        .unwrap();
    world.set_linear_velocity(handle, Vector3::X).unwrap();
    run_steps(&mut world, 60);

    let pose = world.get_pose(handle).unwrap();
    assert_relative_eq!(pose.position.x, 1.0, epsilon = 1e-4);
    assert_eq!(pose.position.y, 5.0);

    assert_eq!(
        world.set_motion_category(ground, MotionCategory::Dynamic),
        Err(PhysicsError::InvalidMass(
            "plane bodies are always static, cannot switch to Dynamic".to_string()
        ))
    );
}

#[test]
fn test_snapshot_is_isolated() {
    let mut world = create_test_world();
    let handle = add_test_sphere(&mut world, Vector3::new(0.0, 10.0, 0.0));

    let before = world.snapshot();
    run_steps(&mut world, 30);
    world.remove_rigid_body(handle).unwrap();

    let body = before.body(handle).expect("snapshot keeps removed body");
    assert_eq!(body.pose.position.y, 10.0);
    assert_eq!(before.step_count, 0);
    assert!(world.snapshot().is_empty());
}

#[test]
fn test_snapshot_json_round_trip() {
    let mut world = create_test_world();
    add_test_box(&mut world, Vector3::new(1.0, 2.0, 3.0));
    world.add_rigid_body(
        RigidBody::create(
            ShapeDescriptor::cone(0.5, 1.0).unwrap(),
            2.0,
            Pose::at(Vector3::new(0.0, 4.0, 0.0)),
            MotionCategory::Kinematic,
        )
        .unwrap(),
    );
    run_steps(&mut world, 3);

    let snapshot = world.snapshot();
    let json = snapshot.to_json_pretty().unwrap();
    assert!(json.contains("\"kind\": \"cone\""));

    let parsed = WorldSnapshot::from_json(&json).unwrap();
    assert_eq!(parsed, snapshot);
}

#[test]
fn test_vector_buffer_round_trip_is_exact() {
    let values = [0.1_f32, -1.0e-30, 3.402_823_5e38];
    let v = Vector3::from_slice(&values).unwrap();

    let mut buffer = Vec::new();
    v.write_to(&mut buffer);
    assert_eq!(buffer, values.to_vec());
    assert_eq!(Vector3::from_slice(&buffer).unwrap(), v);
}
