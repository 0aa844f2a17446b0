use super::error::{PhysicsError, Result};
use super::shape::ShapeDescriptor;
use crate::math::{Quaternion, Vector3};
use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

/// How a body participates in the simulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionCategory {
    /// Integrated under gravity, forces and contacts.
    #[default]
    Dynamic,
    /// Never moves on its own; infinite mass in contacts.
    Static,
    /// Driven by its pose and explicitly set velocities; ignores forces.
    Kinematic,
}

/// Position and orientation of a body's centre in world space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vector3,
    pub orientation: Quaternion,
}

impl Pose {
    pub const fn new(position: Vector3, orientation: Quaternion) -> Self {
        Self {
            position,
            orientation,
        }
    }

    pub const fn at(position: Vector3) -> Self {
        Self::new(position, Quaternion::IDENTITY)
    }

    /// Maps a point from the body frame to world space.
    pub fn transform_point(&self, local: Vector3) -> Vector3 {
        self.position + self.orientation.rotate(local)
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.orientation.is_finite()
    }

    /// Canonical form: finite components and a unit orientation.
    fn validated(self) -> Result<Self> {
        if !self.is_finite() {
            return Err(PhysicsError::InvalidParameter(format!(
                "pose must be finite, got {self:?}"
            )));
        }
        Ok(Self::new(self.position, self.orientation.normalize()?))
    }
}

/// Surface response coefficients used by contact resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Coulomb friction coefficient, combined per contact as `sqrt(mu_a * mu_b)`.
    pub friction: f32,
    /// Bounciness in `[0, 1]`, combined per contact with `min`.
    pub restitution: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            friction: 0.5,
            restitution: 0.2,
        }
    }
}

impl Material {
    pub fn validated(self) -> Result<Self> {
        if !(self.friction >= 0.0 && self.friction.is_finite()) {
            return Err(PhysicsError::InvalidParameter(format!(
                "friction must be finite and >= 0, got {}",
                self.friction
            )));
        }
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(PhysicsError::InvalidParameter(format!(
                "restitution must be within [0, 1], got {}",
                self.restitution
            )));
        }
        Ok(self)
    }
}

/// Mutable simulation state of a body, captured for step rollback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BodyState {
    pose: Pose,
    linear_velocity: Vector3,
    angular_velocity: Vector3,
    force: Vector3,
    torque: Vector3,
}

/// A rigid body. Created through the shape factories, then handed to a
/// [`PhysicsWorld`](super::PhysicsWorld), which owns it until removal.
///
/// Bodies have identity: they are neither `Clone` nor `PartialEq`. Once
/// inside a world they are mutated only through world operations.
#[derive(Debug)]
pub struct RigidBody {
    pub(crate) shape: ShapeDescriptor,
    pub(crate) mass: f32,
    pub(crate) inv_mass: f32,
    pub(crate) motion: MotionCategory,
    pub(crate) pose: Pose,
    pub(crate) linear_velocity: Vector3,
    pub(crate) angular_velocity: Vector3,
    pub(crate) force: Vector3,
    pub(crate) torque: Vector3,
    pub(crate) inertia_local: Matrix3<f32>,
    pub(crate) inv_inertia_local: Matrix3<f32>,
    pub(crate) material: Material,
    // False until a material is chosen; the world then applies its default
    pub(crate) material_explicit: bool,
}

impl RigidBody {
    /// Generic factory.
    ///
    /// # Errors
    /// - `InvalidShapeParameters` if the shape violates its positivity rules.
    /// - `InvalidMass` if `mass` is negative or not finite, or positive on a plane.
    /// - `DegenerateInput` if the orientation cannot be normalized.
    ///
    /// Planes are always static: a plane requested with another motion
    /// category is created static.
    pub fn create(
        shape: ShapeDescriptor,
        mass: f32,
        initial_pose: Pose,
        motion: MotionCategory,
    ) -> Result<Self> {
        let shape = shape.validated()?;

        if !(mass >= 0.0 && mass.is_finite()) {
            return Err(PhysicsError::InvalidMass(format!(
                "mass must be finite and >= 0, got {mass}"
            )));
        }
        if shape.is_plane() && mass > 0.0 {
            return Err(PhysicsError::InvalidMass(format!(
                "plane bodies are static and must have zero mass, got {mass}"
            )));
        }

        let pose = initial_pose.validated()?;
        let motion = if shape.is_plane() {
            MotionCategory::Static
        } else {
            motion
        };

        let inertia_local = shape.inertia(mass);
        let (inv_mass, inv_inertia_local) = if mass > 0.0 {
            (
                1.0 / mass,
                inertia_local.try_inverse().unwrap_or_else(Matrix3::zeros),
            )
        } else {
            (0.0, Matrix3::zeros())
        };

        Ok(Self {
            shape,
            mass,
            inv_mass,
            motion,
            pose,
            linear_velocity: Vector3::ZERO,
            angular_velocity: Vector3::ZERO,
            force: Vector3::ZERO,
            torque: Vector3::ZERO,
            inertia_local,
            inv_inertia_local,
            material: Material::default(),
            material_explicit: false,
        })
    }

    fn default_motion(mass: f32) -> MotionCategory {
        if mass > 0.0 {
            MotionCategory::Dynamic
        } else {
            MotionCategory::Static
        }
    }

    /// Box with the given half extents. Zero mass creates a static box.
    pub fn create_box(mass: f32, position: Vector3, half_extents: Vector3) -> Result<Self> {
        Self::create(
            ShapeDescriptor::Box { half_extents },
            mass,
            Pose::at(position),
            Self::default_motion(mass),
        )
    }

    pub fn create_sphere(mass: f32, position: Vector3, radius: f32) -> Result<Self> {
        Self::create(
            ShapeDescriptor::Sphere { radius },
            mass,
            Pose::at(position),
            Self::default_motion(mass),
        )
    }

    pub fn create_capsule(
        mass: f32,
        position: Vector3,
        radius: f32,
        half_height: f32,
    ) -> Result<Self> {
        Self::create(
            ShapeDescriptor::Capsule {
                radius,
                half_height,
            },
            mass,
            Pose::at(position),
            Self::default_motion(mass),
        )
    }

    pub fn create_cylinder(mass: f32, position: Vector3, half_extents: Vector3) -> Result<Self> {
        Self::create(
            ShapeDescriptor::Cylinder { half_extents },
            mass,
            Pose::at(position),
            Self::default_motion(mass),
        )
    }

    pub fn create_cone(mass: f32, position: Vector3, radius: f32, height: f32) -> Result<Self> {
        Self::create(
            ShapeDescriptor::Cone { radius, height },
            mass,
            Pose::at(position),
            Self::default_motion(mass),
        )
    }

    /// Static plane `normal · p = offset`.
    pub fn create_plane(normal: Vector3, offset: f32) -> Result<Self> {
        Self::create(
            ShapeDescriptor::Plane { normal, offset },
            0.0,
            Pose::default(),
            MotionCategory::Static,
        )
    }

    // Builders, usable before the body is added to a world

    pub fn with_orientation(mut self, orientation: Quaternion) -> Result<Self> {
        self.pose = Pose::new(self.pose.position, orientation).validated()?;
        Ok(self)
    }

    pub fn with_material(mut self, material: Material) -> Result<Self> {
        self.set_material(material)?;
        Ok(self)
    }

    pub fn with_linear_velocity(mut self, velocity: Vector3) -> Self {
        self.set_linear_velocity(velocity);
        self
    }

    pub fn with_angular_velocity(mut self, velocity: Vector3) -> Self {
        self.set_angular_velocity(velocity);
        self
    }

    pub fn with_motion(mut self, motion: MotionCategory) -> Result<Self> {
        self.set_motion(motion)?;
        Ok(self)
    }

    // Accessors

    pub fn shape(&self) -> &ShapeDescriptor {
        &self.shape
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn inverse_mass(&self) -> f32 {
        self.inv_mass
    }

    pub fn motion(&self) -> MotionCategory {
        self.motion
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn position(&self) -> Vector3 {
        self.pose.position
    }

    pub fn orientation(&self) -> Quaternion {
        self.pose.orientation
    }

    pub fn linear_velocity(&self) -> Vector3 {
        self.linear_velocity
    }

    pub fn angular_velocity(&self) -> Vector3 {
        self.angular_velocity
    }

    pub fn accumulated_force(&self) -> Vector3 {
        self.force
    }

    pub fn accumulated_torque(&self) -> Vector3 {
        self.torque
    }

    /// Surface material. A body that never had one set takes the
    /// `default_material` of the world it is added to.
    pub fn material(&self) -> Material {
        self.material
    }

    pub fn local_inertia(&self) -> Matrix3<f32> {
        self.inertia_local
    }

    /// True when forces, impulses and gravity move this body.
    #[inline]
    pub fn is_dynamic(&self) -> bool {
        self.motion == MotionCategory::Dynamic && self.mass > 0.0
    }

    /// True when the body never moves: static, or dynamic with zero mass.
    #[inline]
    pub fn is_immovable(&self) -> bool {
        match self.motion {
            MotionCategory::Static => true,
            MotionCategory::Dynamic => self.mass == 0.0,
            MotionCategory::Kinematic => false,
        }
    }

    /// Translational plus rotational kinetic energy.
    pub fn kinetic_energy(&self) -> f32 {
        let translational = 0.5 * self.mass * self.linear_velocity.length_squared();
        let omega: nalgebra::Vector3<f32> = self.angular_velocity.into();
        let rotational = 0.5 * omega.dot(&(self.inertia_world() * omega));
        translational + rotational
    }

    /// World-space inertia tensor, `R * I * Rᵀ`.
    pub fn inertia_world(&self) -> Matrix3<f32> {
        let r = self.pose.orientation.to_rotation_matrix();
        r * self.inertia_local * r.transpose()
    }

    /// World-space inverse inertia tensor, `R * I⁻¹ * Rᵀ`.
    pub fn inv_inertia_world(&self) -> Matrix3<f32> {
        let r = self.pose.orientation.to_rotation_matrix();
        r * self.inv_inertia_local * r.transpose()
    }

    /// Velocity of a point at world-space `offset` from the centre.
    pub fn velocity_at(&self, offset: Vector3) -> Vector3 {
        self.linear_velocity + self.angular_velocity.cross(offset)
    }

    // Mutators, reached through the owning world

    pub(crate) fn set_pose(&mut self, pose: Pose) -> Result<()> {
        self.pose = pose.validated()?;
        Ok(())
    }

    /// Accumulates `force` at world-space `offset` from the centre.
    pub(crate) fn apply_force(&mut self, force: Vector3, offset: Vector3) {
        if !self.is_dynamic() {
            return;
        }
        self.force += force;
        self.torque += offset.cross(force);
    }

    pub(crate) fn apply_torque(&mut self, torque: Vector3) {
        if !self.is_dynamic() {
            return;
        }
        self.torque += torque;
    }

    /// Instantaneous velocity change from `impulse` at world-space `offset`.
    pub(crate) fn apply_impulse(&mut self, impulse: Vector3, offset: Vector3) {
        if !self.is_dynamic() {
            return;
        }
        self.linear_velocity += impulse * self.inv_mass;
        self.apply_angular_impulse(offset.cross(impulse));
    }

    pub(crate) fn apply_angular_impulse(&mut self, angular_impulse: Vector3) {
        if !self.is_dynamic() {
            return;
        }
        self.angular_velocity += angular_impulse.transformed_by(&self.inv_inertia_world());
    }

    pub(crate) fn set_linear_velocity(&mut self, velocity: Vector3) {
        if !self.is_immovable() {
            self.linear_velocity = velocity;
        }
    }

    pub(crate) fn set_angular_velocity(&mut self, velocity: Vector3) {
        if !self.is_immovable() {
            self.angular_velocity = velocity;
        }
    }

    pub(crate) fn set_material(&mut self, material: Material) -> Result<()> {
        self.material = material.validated()?;
        self.material_explicit = true;
        Ok(())
    }

    pub(crate) fn set_motion(&mut self, motion: MotionCategory) -> Result<()> {
        if self.shape.is_plane() && motion != MotionCategory::Static {
            return Err(PhysicsError::InvalidMass(format!(
                "plane bodies are always static, cannot switch to {motion:?}"
            )));
        }
        self.motion = motion;
        if self.is_immovable() {
            self.linear_velocity = Vector3::ZERO;
            self.angular_velocity = Vector3::ZERO;
        }
        if !self.is_dynamic() {
            self.clear_accumulators();
        }
        Ok(())
    }

    pub(crate) fn clear_accumulators(&mut self) {
        self.force = Vector3::ZERO;
        self.torque = Vector3::ZERO;
    }

    /// Names the first integrated quantity that is not finite, if any.
    pub(crate) fn non_finite_reason(&self) -> Option<&'static str> {
        if !self.pose.position.is_finite() {
            Some("non-finite position")
        } else if !self.pose.orientation.is_finite() {
            Some("non-finite orientation")
        } else if !self.linear_velocity.is_finite() || !self.angular_velocity.is_finite() {
            Some("non-finite velocity")
        } else {
            None
        }
    }

    pub(crate) fn state(&self) -> BodyState {
        BodyState {
            pose: self.pose,
            linear_velocity: self.linear_velocity,
            angular_velocity: self.angular_velocity,
            force: self.force,
            torque: self.torque,
        }
    }

    pub(crate) fn restore(&mut self, state: &BodyState) {
        self.pose = state.pose;
        self.linear_velocity = state.linear_velocity;
        self.angular_velocity = state.angular_velocity;
        self.force = state.force;
        self.torque = state.torque;
    }
}
