use bevy::{log::LogPlugin, prelude::*, time::TimeUpdateStrategy};
use std::{env, time::Duration};

use physim::{
    physics::{MotionCategory, PhysicsWorld},
    plugins::{LatestSnapshot, PhysicsPlugin},
    PhysicsConfig, Scene,
};

const FRAMES: u32 = 600;
const REPORT_EVERY: u32 = 60;

fn parse_scene(name: Option<&str>) -> Result<Scene, Box<dyn std::error::Error>> {
    match name {
        None | Some("basic") => Ok(Scene::Basic),
        Some("domino") => Ok(Scene::Domino),
        Some("pendulum") => Ok(Scene::Pendulum),
        Some("scatter") => Ok(Scene::Scatter { count: 50, seed: 42 }),
        Some(other) => Err(format!(
            "unknown scene '{other}', expected basic, domino, pendulum or scatter"
        )
        .into()),
    }
}

/// Usage: `physim [scene] [config.yaml]`
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().skip(1).collect();
    let scene = parse_scene(args.first().map(String::as_str))?;
    let config = match args.get(1) {
        Some(path) => PhysicsConfig::load(path)?,
        None => PhysicsConfig::default(),
    };
    let frame_time = Duration::from_secs_f32(config.sub_step);

    let mut app = App::new();
    app.add_plugins((MinimalPlugins, LogPlugin::default()))
        .add_plugins(PhysicsPlugin::new(config)?)
        .insert_resource(TimeUpdateStrategy::ManualDuration(frame_time));
    app.finish();
    app.cleanup();

    {
        let mut world = app.world_mut().resource_mut::<PhysicsWorld>();
        scene.populate(&mut world)?;
    }

    for frame in 1..=FRAMES {
        app.update();

        if frame % REPORT_EVERY == 0 {
            let latest = app.world().resource::<LatestSnapshot>();
            let snapshot = &latest.snapshot;
            info!(
                "t = {:.2}s, step {}",
                snapshot.elapsed_time, snapshot.step_count
            );
            for body in snapshot
                .bodies
                .iter()
                .filter(|b| b.motion != MotionCategory::Static)
            {
                let p = body.pose.position;
                info!(
                    "  {} {} at ({:.3}, {:.3}, {:.3})",
                    body.shape.kind(),
                    body.handle,
                    p.x,
                    p.y,
                    p.z
                );
            }
        }
    }

    Ok(())
}
