use crate::config::{ConfigError, PhysicsConfig};
use crate::physics::{PhysicsError, PhysicsWorld, StepReport, WorldSnapshot};
use bevy::prelude::*;
use std::sync::Arc;

/// Physics simulation stages
#[derive(Debug, Hash, PartialEq, Eq, Clone, SystemSet)]
pub enum PhysicsSet {
    Step,
    Publish,
}

/// Pauses stepping without touching the world.
#[derive(Resource, Debug, Default)]
pub struct SimulationControl {
    pub paused: bool,
}

/// Snapshot published after the most recent successful step.
#[derive(Resource, Debug, Default, Clone)]
pub struct LatestSnapshot {
    pub snapshot: Arc<WorldSnapshot>,
    pub report: Option<StepReport>,
}

/// Sent when a frame's step fails and is rolled back.
#[derive(Event, Debug, Clone)]
pub struct PhysicsFaultEvent(pub PhysicsError);

/// Owns a [`PhysicsWorld`] as a resource and steps it once per frame with
/// the frame's delta time. The world's own sub-stepping keeps the
/// integration rate fixed.
///
/// The config is validated when the plugin is created, so an invalid one
/// never reaches the app.
#[derive(Default)]
pub struct PhysicsPlugin {
    config: PhysicsConfig,
}

impl PhysicsPlugin {
    pub fn new(config: PhysicsConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }
}

impl Plugin for PhysicsPlugin {
    fn build(&self, app: &mut App) {
        let world = match PhysicsWorld::with_config(self.config.clone()) {
            Ok(world) => world,
            // Unreachable through `new`, which validates
            Err(e) => panic!("PhysicsPlugin built with an invalid config: {e}"),
        };

        app.insert_resource(world)
            .init_resource::<SimulationControl>()
            .init_resource::<LatestSnapshot>()
            .add_event::<PhysicsFaultEvent>();

        app.configure_sets(Update, (PhysicsSet::Step, PhysicsSet::Publish).chain());

        app.add_systems(
            Update,
            (
                physics_step_system.in_set(PhysicsSet::Step),
                publish_snapshot_system.in_set(PhysicsSet::Publish),
            ),
        );
    }
}

/// Steps the world by the frame delta; failures roll back and are reported
/// as [`PhysicsFaultEvent`]s.
pub fn physics_step_system(
    time: Res<Time>,
    control: Res<SimulationControl>,
    mut world: ResMut<PhysicsWorld>,
    mut latest: ResMut<LatestSnapshot>,
    mut faults: EventWriter<PhysicsFaultEvent>,
) {
    if control.paused {
        latest.report = None;
        return;
    }

    match world.step(time.delta_secs()) {
        Ok(report) => latest.report = Some(report),
        Err(e) => {
            error!("Physics step failed: {}", e);
            latest.report = None;
            faults.send(PhysicsFaultEvent(e));
        }
    }
}

fn publish_snapshot_system(world: Res<PhysicsWorld>, mut latest: ResMut<LatestSnapshot>) {
    if latest.report.is_some() {
        latest.snapshot = Arc::new(world.snapshot());
    }
}
