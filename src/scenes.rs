use crate::config::PhysicsConfig;
use crate::math::{Quaternion, Vector3};
use crate::physics::{
    BodyHandle, Material, MotionCategory, PhysicsWorld, Pose, Result, RigidBody, ShapeDescriptor,
};
use crate::utils::{random_point, RngManager};
use bevy::log::info;
use rand::Rng;
use serde::{Deserialize, Serialize};

fn default_mass() -> f32 {
    1.0
}

/// Description of a body to create, as sent by a control panel.
///
/// Only `shape` is required. Planes ignore `mass` and are always static.
///
/// ```json
/// { "shape": { "kind": "sphere", "radius": 0.5 }, "mass": 2.0,
///   "position": { "x": 0.0, "y": 5.0, "z": 0.0 } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyRequest {
    pub shape: ShapeDescriptor,
    #[serde(default = "default_mass")]
    pub mass: f32,
    #[serde(default)]
    pub position: Vector3,
    #[serde(default)]
    pub orientation: Quaternion,
    /// Defaults to dynamic for positive mass, static otherwise.
    #[serde(default)]
    pub motion: Option<MotionCategory>,
    /// Defaults to the configured default material.
    #[serde(default)]
    pub material: Option<Material>,
    #[serde(default)]
    pub linear_velocity: Vector3,
}

impl BodyRequest {
    pub fn new(shape: ShapeDescriptor, mass: f32, position: Vector3) -> Self {
        Self {
            shape,
            mass,
            position,
            orientation: Quaternion::IDENTITY,
            motion: None,
            material: None,
            linear_velocity: Vector3::ZERO,
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Validates the request and creates the body.
    pub fn build(&self, config: &PhysicsConfig) -> Result<RigidBody> {
        let mass = if self.shape.is_plane() { 0.0 } else { self.mass };
        let motion = self.motion.unwrap_or(if mass > 0.0 {
            MotionCategory::Dynamic
        } else {
            MotionCategory::Static
        });

        let body = RigidBody::create(
            self.shape,
            mass,
            Pose::new(self.position, self.orientation),
            motion,
        )?
        .with_material(self.material.unwrap_or(config.default_material))?
        .with_linear_velocity(self.linear_velocity);
        Ok(body)
    }
}

/// Preset worlds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scene", rename_all = "snake_case")]
pub enum Scene {
    Empty,
    /// Ground plane and a box dropped from 10 m.
    Basic,
    /// Row of ten dominoes with a heavy ball thrown at the first one.
    Domino,
    /// Static anchor above a free sphere.
    Pendulum,
    /// `count` random boxes and spheres above a ground plane.
    Scatter { count: usize, seed: u64 },
}

impl Scene {
    pub fn requests(&self) -> Result<Vec<BodyRequest>> {
        let ground = BodyRequest::new(ShapeDescriptor::plane(Vector3::Y, 0.0)?, 0.0, Vector3::ZERO);

        let requests = match *self {
            Scene::Empty => Vec::new(),
            Scene::Basic => vec![
                ground,
                BodyRequest::new(
                    ShapeDescriptor::cuboid(Vector3::splat(1.0))?,
                    1.0,
                    Vector3::new(0.0, 10.0, 0.0),
                ),
            ],
            Scene::Domino => {
                let mut requests = vec![ground];
                let domino = ShapeDescriptor::cuboid(Vector3::new(0.1, 1.0, 0.5))?;
                for i in 0..10 {
                    requests.push(BodyRequest::new(
                        domino,
                        1.0,
                        Vector3::new(i as f32 * 2.0, 2.0, 0.0),
                    ));
                }
                requests.push(BodyRequest {
                    linear_velocity: Vector3::new(6.0, 0.0, 0.0),
                    ..BodyRequest::new(
                        ShapeDescriptor::sphere(0.5)?,
                        5.0,
                        Vector3::new(-3.0, 5.0, 0.0),
                    )
                });
                requests
            }
            Scene::Pendulum => vec![
                ground,
                BodyRequest::new(ShapeDescriptor::sphere(0.5)?, 0.0, Vector3::new(0.0, 10.0, 0.0)),
                BodyRequest::new(ShapeDescriptor::sphere(1.0)?, 1.0, Vector3::new(0.0, 5.0, 0.0)),
            ],
            Scene::Scatter { count, seed } => {
                let rngs = RngManager::new(seed);
                let mut positions = rngs.get_rng("scatter_positions");
                let mut sizes = rngs.get_rng("scatter_sizes");

                let mut requests = vec![ground];
                for _ in 0..count {
                    let position = random_point(
                        &mut positions,
                        Vector3::new(-10.0, 2.0, -10.0),
                        Vector3::new(10.0, 20.0, 10.0),
                    );
                    let size: f32 = sizes.gen_range(0.2..1.0);
                    let shape = if sizes.gen_bool(0.5) {
                        ShapeDescriptor::sphere(size)?
                    } else {
                        ShapeDescriptor::cuboid(Vector3::splat(size))?
                    };
                    requests.push(BodyRequest::new(shape, size * 2.0, position));
                }
                requests
            }
        };
        Ok(requests)
    }

    /// Resets `world` (keeping its gravity) and fills it with this scene.
    pub fn populate(&self, world: &mut PhysicsWorld) -> Result<Vec<BodyHandle>> {
        let requests = self.requests()?;
        world.initialize(world.gravity())?;

        let mut handles = Vec::with_capacity(requests.len());
        for request in &requests {
            let body = request.build(world.config())?;
            handles.push(world.add_rigid_body(body));
        }
        info!("Loaded scene {:?} with {} bodies", self, handles.len());
        Ok(handles)
    }
}
