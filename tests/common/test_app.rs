use bevy::{prelude::*, time::TimeUpdateStrategy};
use physim::{
    physics::PhysicsWorld,
    plugins::{LatestSnapshot, PhysicsPlugin, SimulationControl},
    PhysicsConfig, Scene,
};
use std::time::Duration;

// Builder for creating a test application with customizable configuration
pub struct TestAppBuilder {
    physics_config: Option<PhysicsConfig>,
    scene: Option<Scene>,
    frame_time: f32,
}

impl Default for TestAppBuilder {
    fn default() -> Self {
        Self {
            physics_config: None,
            scene: None,
            frame_time: 1.0 / 60.0,
        }
    }
}

impl TestAppBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_physics(mut self, config: PhysicsConfig) -> Self {
        self.physics_config = Some(config);
        self
    }

    pub fn with_scene(mut self, scene: Scene) -> Self {
        self.scene = Some(scene);
        self
    }

    pub fn with_frame_time(mut self, seconds: f32) -> Self {
        self.frame_time = seconds;
        self
    }

    pub fn build(self) -> TestApp {
        let mut app = App::new();

        let physics = PhysicsPlugin::new(self.physics_config.unwrap_or_default())
            .expect("test physics config must be valid");

        app.add_plugins(MinimalPlugins)
            .add_plugins(physics)
            .insert_resource(TimeUpdateStrategy::ManualDuration(
                Duration::from_secs_f32(self.frame_time),
            ));
        app.finish();
        app.cleanup();

        if let Some(scene) = self.scene {
            let mut world = app.world_mut().resource_mut::<PhysicsWorld>();
            scene.populate(&mut world).unwrap();
        }

        // The first update only starts the clock
        app.update();

        TestApp { app }
    }
}

/// Main test application wrapper
pub struct TestApp {
    pub app: App,
}

impl TestApp {
    pub fn run_steps(&mut self, steps: usize) {
        for _ in 0..steps {
            self.app.update();
        }
    }

    pub fn world(&self) -> &PhysicsWorld {
        self.app.world().resource::<PhysicsWorld>()
    }

    pub fn world_mut(&mut self) -> Mut<PhysicsWorld> {
        self.app.world_mut().resource_mut::<PhysicsWorld>()
    }

    pub fn latest(&self) -> &LatestSnapshot {
        self.app.world().resource::<LatestSnapshot>()
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.app
            .world_mut()
            .resource_mut::<SimulationControl>()
            .paused = paused;
    }

    pub fn get_state<T: Resource>(&self) -> Option<&T> {
        self.app.world().get_resource::<T>()
    }
}
