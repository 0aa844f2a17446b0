use approx::assert_relative_eq;
use physim::{
    physics::{PhysicsError, RigidBody, SimulationRunner},
    Vector3,
};
use pretty_assertions::assert_eq;

use crate::common::{assert_snapshot_valid, create_test_world, H};

fn spawn_with_sphere() -> (SimulationRunner, physim::BodyHandle) {
    let runner = SimulationRunner::spawn(create_test_world());
    let handle = runner
        .add_rigid_body(RigidBody::create_sphere(1.0, Vector3::new(0.0, 10.0, 0.0), 0.5).unwrap())
        .unwrap();
    (runner, handle)
}

#[test]
fn test_runner_steps_and_publishes() {
    let (runner, handle) = spawn_with_sphere();

    let report = runner.step_simulation(1.0, 60).unwrap();
    assert_eq!(report.sub_steps, 60);

    let latest = runner.latest_snapshot().expect("a snapshot after a step");
    assert_snapshot_valid(&latest);
    assert_eq!(latest.step_count, 1);
    assert!(latest.body(handle).unwrap().pose.position.y < 10.0);

    // Already drained
    assert!(runner.latest_snapshot().is_none());
}

#[test]
fn test_latest_snapshot_keeps_newest() {
    let (runner, _) = spawn_with_sphere();
    for _ in 0..5 {
        runner.step_simulation(H, 1).unwrap();
    }

    let latest = runner.latest_snapshot().unwrap();
    assert_eq!(latest.step_count, 5);
    assert!(runner.latest_snapshot().is_none());
}

#[test]
fn test_paused_runner_does_not_advance() {
    let (runner, handle) = spawn_with_sphere();
    runner.set_paused(true).unwrap();

    let report = runner.step_simulation(1.0, 60).unwrap();
    assert_eq!(report.sub_steps, 0);
    assert!(runner.latest_snapshot().is_none());

    let snapshot = runner.snapshot().unwrap();
    assert_eq!(snapshot.step_count, 0);
    assert_eq!(snapshot.body(handle).unwrap().pose.position.y, 10.0);

    runner.set_paused(false).unwrap();
    assert_eq!(runner.step_simulation(H, 1).unwrap().sub_steps, 1);
}

#[test]
fn test_runner_forwards_errors() {
    let (runner, handle) = spawn_with_sphere();

    runner.remove_rigid_body(handle).unwrap();
    assert_eq!(
        runner.remove_rigid_body(handle).unwrap_err(),
        PhysicsError::UnknownHandle(handle)
    );
    assert_eq!(
        runner.step_simulation(-1.0, 10).unwrap_err(),
        PhysicsError::InvalidTimeStep(-1.0)
    );
}

#[test]
fn test_runner_applies_impulse() {
    let runner = SimulationRunner::spawn(create_test_world());
    runner.initialize(Vector3::ZERO).unwrap();
    let handle = runner
        .add_rigid_body(RigidBody::create_sphere(1.0, Vector3::ZERO, 0.5).unwrap())
        .unwrap();

    runner.apply_impulse(handle, Vector3::new(0.0, 0.0, 3.0), None).unwrap();
    runner.step_simulation(1.0, 60).unwrap();

    let z = runner
        .with_world(move |world| world.get_pose(handle).map(|pose| pose.position.z))
        .unwrap()
        .unwrap();
    assert_relative_eq!(z, 3.0, epsilon = 1e-3);
}

#[test]
fn test_cancel_interrupts_next_step() {
    let (runner, handle) = spawn_with_sphere();

    runner.cancel();
    assert_eq!(
        runner.step_simulation(10.0 * H, 10).unwrap_err(),
        PhysicsError::Cancelled {
            completed: 0,
            requested: 10
        }
    );
    let snapshot = runner.snapshot().unwrap();
    assert_eq!(snapshot.body(handle).unwrap().pose.position.y, 10.0);

    // The flag is consumed by the cancelled step
    assert_eq!(runner.step_simulation(H, 1).unwrap().sub_steps, 1);
}

#[test]
fn test_shutdown_returns_world() {
    let (runner, handle) = spawn_with_sphere();
    runner.step_simulation(0.5, 60).unwrap();

    let world = runner.shutdown().unwrap();
    assert_eq!(world.step_count(), 1);
    assert!(world.contains(handle));
    assert_relative_eq!(world.elapsed_time(), 0.5, epsilon = 1e-4);
}
