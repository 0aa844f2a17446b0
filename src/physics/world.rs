use super::body::{BodyState, Material, MotionCategory, Pose, RigidBody};
use super::collision::{detect_contacts, resolve_contacts};
use super::error::{PhysicsError, Result};
use super::handle::{Arena, BodyHandle, WorldId};
use super::integrator::{integrate_body, IntegrationParams};
use super::snapshot::{BodySnapshot, WorldSnapshot};
use crate::config::PhysicsConfig;
use crate::math::Vector3;
use bevy::log::{debug, info, warn};
use bevy::prelude::Resource;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const DEFAULT_MAX_SUB_STEPS: u32 = 10;

// Lets a delta of exactly `k * h` count as `k` sub-steps despite rounding
const SUB_STEP_TOLERANCE: f32 = 1e-3;

/// Cooperative cancellation flag, checked between sub-steps.
///
/// Clones share the flag, so a token handed to another thread can cancel a
/// step in progress. The flag is consumed by the step it cancels.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

/// Outcome of a successful [`PhysicsWorld::step_simulation`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    pub sub_steps: u32,
    pub sub_step_size: f32,
    /// Contacts resolved, summed over all sub-steps.
    pub contacts: usize,
}

/// Splits `delta_time` into `(count, size)` sub-steps.
///
/// `count = min(max_sub_steps, floor(delta_time / h))`; a delta shorter than
/// one sub-step (or `max_sub_steps == 0`) runs as a single sub-step of
/// `delta_time`.
pub fn plan_sub_steps(delta_time: f32, h: f32, max_sub_steps: u32) -> (u32, f32) {
    let whole = (delta_time / h + SUB_STEP_TOLERANCE).floor();
    let n = (whole as u32).min(max_sub_steps);
    if n == 0 {
        (1, delta_time)
    } else {
        (n, h)
    }
}

/// Owns a set of rigid bodies and advances them in fixed sub-steps.
///
/// Every mutator takes `&mut self`; share a world across threads through
/// [`SimulationRunner`](super::SimulationRunner) or an ECS resource.
#[derive(Resource, Debug)]
pub struct PhysicsWorld {
    id: WorldId,
    bodies: Arena<RigidBody>,
    config: PhysicsConfig,
    step_count: u64,
    elapsed_time: f64,
    cancel: CancelToken,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    pub fn new() -> Self {
        let id = WorldId::new();
        Self {
            id,
            bodies: Arena::new(id),
            config: PhysicsConfig::default(),
            step_count: 0,
            elapsed_time: 0.0,
            cancel: CancelToken::new(),
        }
    }

    /// Creates an empty world using `config`, which must validate.
    pub fn with_config(config: PhysicsConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| PhysicsError::InvalidParameter(e.to_string()))?;
        Ok(Self {
            config,
            ..Self::new()
        })
    }

    /// Sets gravity and removes every body. Calling it again simply resets
    /// the world; handles issued before become stale.
    pub fn initialize(&mut self, gravity: Vector3) -> Result<()> {
        self.set_gravity(gravity)?;
        let removed = self.bodies.len();
        self.bodies.clear();
        self.step_count = 0;
        self.elapsed_time = 0.0;
        info!(
            "Physics world initialized: gravity {:?}, {} bodies cleared",
            gravity, removed
        );
        Ok(())
    }

    pub fn id(&self) -> WorldId {
        self.id
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn gravity(&self) -> Vector3 {
        self.config.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vector3) -> Result<()> {
        if !gravity.is_finite() {
            return Err(PhysicsError::InvalidParameter(format!(
                "gravity must be finite, got {gravity:?}"
            )));
        }
        self.config.gravity = gravity;
        Ok(())
    }

    /// Fixed internal sub-step size in seconds.
    pub fn sub_step(&self) -> f32 {
        self.config.sub_step
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Simulated seconds, summed over all successful steps.
    pub fn elapsed_time(&self) -> f64 {
        self.elapsed_time
    }

    /// A token that cancels the next sub-step boundary of a running step.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    // Body lifecycle

    /// Takes ownership of `body`. Bodies without an explicitly chosen
    /// material get the configured `default_material`.
    pub fn add_rigid_body(&mut self, mut body: RigidBody) -> BodyHandle {
        if !body.material_explicit {
            body.material = self.config.default_material;
        }
        let kind = body.shape.kind();
        let handle = self.bodies.insert(body);
        debug!("Added {} body {}", kind, handle);
        handle
    }

    /// Removes the body and hands it back to the caller.
    ///
    /// Removing a handle that is not live in this world fails with
    /// `UnknownHandle`, including a second removal of the same handle.
    pub fn remove_rigid_body(&mut self, handle: BodyHandle) -> Result<RigidBody> {
        let body = self.bodies.remove(handle)?;
        debug!("Removed {} body {}", body.shape.kind(), handle);
        Ok(body)
    }

    /// Live handles in insertion order.
    pub fn rigid_bodies(&self) -> Vec<BodyHandle> {
        self.bodies.handles()
    }

    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &RigidBody)> + '_ {
        self.bodies.iter()
    }

    pub fn body(&self, handle: BodyHandle) -> Result<&RigidBody> {
        self.bodies.get(handle)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.bodies.contains(handle)
    }

    // Per-body queries and mutations

    pub fn get_pose(&self, handle: BodyHandle) -> Result<Pose> {
        Ok(self.body(handle)?.pose())
    }

    /// Overrides the pose directly. No velocity is induced.
    pub fn set_pose(&mut self, handle: BodyHandle, pose: Pose) -> Result<()> {
        self.bodies.get_mut(handle)?.set_pose(pose)
    }

    /// Accumulates a force for the next step. `offset` is the world-space
    /// application point relative to the body centre; `None` means the centre.
    pub fn apply_force(
        &mut self,
        handle: BodyHandle,
        force: Vector3,
        offset: Option<Vector3>,
    ) -> Result<()> {
        let body = self.bodies.get_mut(handle)?;
        body.apply_force(force, offset.unwrap_or(Vector3::ZERO));
        Ok(())
    }

    pub fn apply_torque(&mut self, handle: BodyHandle, torque: Vector3) -> Result<()> {
        self.bodies.get_mut(handle)?.apply_torque(torque);
        Ok(())
    }

    /// Changes velocity immediately; `offset` as for [`Self::apply_force`].
    pub fn apply_impulse(
        &mut self,
        handle: BodyHandle,
        impulse: Vector3,
        offset: Option<Vector3>,
    ) -> Result<()> {
        let body = self.bodies.get_mut(handle)?;
        body.apply_impulse(impulse, offset.unwrap_or(Vector3::ZERO));
        Ok(())
    }

    /// Discards any force and torque accumulated since the last step.
    pub fn clear_forces(&mut self, handle: BodyHandle) -> Result<()> {
        self.bodies.get_mut(handle)?.clear_accumulators();
        Ok(())
    }

    pub fn linear_velocity(&self, handle: BodyHandle) -> Result<Vector3> {
        Ok(self.body(handle)?.linear_velocity())
    }

    pub fn angular_velocity(&self, handle: BodyHandle) -> Result<Vector3> {
        Ok(self.body(handle)?.angular_velocity())
    }

    pub fn set_linear_velocity(&mut self, handle: BodyHandle, velocity: Vector3) -> Result<()> {
        self.bodies.get_mut(handle)?.set_linear_velocity(velocity);
        Ok(())
    }

    pub fn set_angular_velocity(&mut self, handle: BodyHandle, velocity: Vector3) -> Result<()> {
        self.bodies.get_mut(handle)?.set_angular_velocity(velocity);
        Ok(())
    }

    pub fn set_friction(&mut self, handle: BodyHandle, friction: f32) -> Result<()> {
        let body = self.bodies.get_mut(handle)?;
        let material = Material {
            friction,
            ..body.material()
        };
        body.set_material(material)
    }

    pub fn set_restitution(&mut self, handle: BodyHandle, restitution: f32) -> Result<()> {
        let body = self.bodies.get_mut(handle)?;
        let material = Material {
            restitution,
            ..body.material()
        };
        body.set_material(material)
    }

    pub fn set_motion_category(
        &mut self,
        handle: BodyHandle,
        motion: MotionCategory,
    ) -> Result<()> {
        self.bodies.get_mut(handle)?.set_motion(motion)
    }

    /// Owned, isolated copy of the current state.
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            step_count: self.step_count,
            elapsed_time: self.elapsed_time,
            gravity: self.config.gravity,
            bodies: self
                .bodies
                .iter()
                .map(|(handle, body)| BodySnapshot::capture(handle, body))
                .collect(),
        }
    }

    // Stepping

    /// Steps with the configured sub-step cap.
    pub fn step(&mut self, delta_time: f32) -> Result<StepReport> {
        self.step_simulation(delta_time, self.config.max_sub_steps)
    }

    /// Advances the world by `delta_time` seconds in fixed sub-steps.
    ///
    /// The step is atomic: on a simulation fault or cancellation every body
    /// is restored to its state before the call, and accumulated forces are
    /// kept. On success the force and torque accumulators are cleared.
    ///
    /// # Errors
    /// - `InvalidTimeStep` if `delta_time` is negative or not finite.
    /// - `SimulationFault` if any body becomes non-finite.
    /// - `Cancelled` if the cancel token was set.
    pub fn step_simulation(&mut self, delta_time: f32, max_sub_steps: u32) -> Result<StepReport> {
        if !delta_time.is_finite() || delta_time < 0.0 {
            return Err(PhysicsError::InvalidTimeStep(delta_time));
        }
        if delta_time == 0.0 {
            return Ok(StepReport {
                sub_steps: 0,
                sub_step_size: self.config.sub_step,
                contacts: 0,
            });
        }

        let (sub_steps, sub_step_size) =
            plan_sub_steps(delta_time, self.config.sub_step, max_sub_steps);
        let saved = self.save_states();

        match self.run_sub_steps(sub_steps, sub_step_size) {
            Ok(contacts) => {
                self.bodies
                    .values_mut()
                    .for_each(RigidBody::clear_accumulators);
                self.step_count += 1;
                self.elapsed_time += f64::from(sub_steps) * f64::from(sub_step_size);
                Ok(StepReport {
                    sub_steps,
                    sub_step_size,
                    contacts,
                })
            }
            Err(err) => {
                self.restore_states(&saved);
                warn!("Step {} rolled back: {}", self.step_count + 1, err);
                Err(err)
            }
        }
    }

    fn run_sub_steps(&mut self, sub_steps: u32, dt: f32) -> Result<usize> {
        let params = IntegrationParams {
            gravity: self.config.gravity,
            dt,
            max_velocity: self.config.max_velocity,
            max_angular_velocity: self.config.max_angular_velocity,
        };
        let iterations = self.config.solver_iterations;
        let mut total_contacts = 0;

        for sub_step in 0..sub_steps {
            if self.cancel.take() {
                return Err(PhysicsError::Cancelled {
                    completed: sub_step,
                    requested: sub_steps,
                });
            }

            // Bodies integrate independently of each other
            self.bodies
                .par_values_mut()
                .for_each(|body| integrate_body(body, &params));

            let contacts = detect_contacts(&self.bodies);
            resolve_contacts(&mut self.bodies, &contacts, iterations);
            total_contacts += contacts.len();

            self.check_finite(sub_step)?;
        }
        Ok(total_contacts)
    }

    /// Reports the first non-finite body, in insertion order.
    fn check_finite(&self, sub_step: u32) -> Result<()> {
        for (handle, body) in self.bodies.iter() {
            if let Some(reason) = body.non_finite_reason() {
                return Err(PhysicsError::SimulationFault {
                    handle,
                    sub_step,
                    reason,
                });
            }
        }
        Ok(())
    }

    fn save_states(&self) -> Vec<(usize, BodyState)> {
        self.bodies
            .order()
            .iter()
            .filter_map(|&i| {
                let index = i as usize;
                self.bodies.by_index(index).map(|body| (index, body.state()))
            })
            .collect()
    }

    fn restore_states(&mut self, saved: &[(usize, BodyState)]) {
        for (index, state) in saved {
            if let Some(body) = self.bodies.by_index_mut(*index) {
                body.restore(state);
            }
        }
    }
}
