use bevy::prelude::Events;
use physim::{
    plugins::{PhysicsFaultEvent, PhysicsPlugin, SimulationControl},
    ConfigError, PhysicsConfig, PhysicsError, Scene, Vector3,
};

use crate::common::{create_test_physics_config, TestApp, TestAppBuilder};

fn basic_app() -> TestApp {
    TestAppBuilder::new().with_scene(Scene::Basic).build()
}

#[test]
fn test_plugin_steps_world_every_frame() {
    let mut app = basic_app();
    let cube = app.world().rigid_bodies()[1];
    let start = app.world().step_count();

    app.run_steps(30);

    let world = app.world();
    assert_eq!(world.step_count(), start + 30);
    assert!(world.get_pose(cube).unwrap().position.y < 10.0);
}

#[test]
fn test_plugin_publishes_latest_snapshot() {
    let mut app = TestAppBuilder::new().with_scene(Scene::Pendulum).build();
    app.run_steps(10);

    let latest = app.latest();
    let report = latest.report.expect("a step ran this frame");
    assert_eq!(report.sub_steps, 1);
    assert_eq!(latest.snapshot.step_count, app.world().step_count());
    assert_eq!(latest.snapshot.len(), 3);
}

#[test]
fn test_paused_plugin_leaves_world_untouched() {
    let mut app = basic_app();
    app.run_steps(5);

    app.set_paused(true);
    let before = app.world().snapshot();
    app.run_steps(20);

    assert_eq!(app.world().snapshot(), before);
    assert!(app.latest().report.is_none());
    assert!(app.get_state::<SimulationControl>().unwrap().paused);
}

#[test]
fn test_plugin_uses_configured_gravity() {
    let config = PhysicsConfig {
        gravity: Vector3::new(0.0, 0.0, -2.0),
        ..create_test_physics_config()
    };
    let mut app = TestAppBuilder::new()
        .with_physics(config)
        .with_scene(Scene::Empty)
        .build();
    assert_eq!(app.world().gravity(), Vector3::new(0.0, 0.0, -2.0));

    app.run_steps(1);
    assert_eq!(app.world().config().gravity.z, -2.0);
}

#[test]
fn test_fault_is_reported_as_event() {
    let mut app = basic_app();
    let cube = app.world().rigid_bodies()[1];
    app.run_steps(2);
    let steps = app.world().step_count();

    app.world_mut()
        .apply_force(cube, Vector3::new(f32::NAN, 0.0, 0.0), None)
        .unwrap();
    app.run_steps(1);

    let events = app.get_state::<Events<PhysicsFaultEvent>>().unwrap();
    assert!(!events.is_empty());
    let mut reader = events.get_cursor();
    let fault = reader.read(events).next().unwrap();
    assert!(matches!(
        fault.0,
        PhysicsError::SimulationFault { handle, .. } if handle == cube
    ));
    assert_eq!(app.world().step_count(), steps);
}

#[test]
fn test_invalid_config_never_reaches_the_app() {
    let config = PhysicsConfig {
        sub_step: -1.0,
        ..create_test_physics_config()
    };
    let err = PhysicsPlugin::new(config).err().expect("negative sub_step rejected");
    assert!(matches!(err, ConfigError::Invalid(_)));
    assert!(err.to_string().contains("sub_step"));
}
