use super::body::{MotionCategory, Pose, RigidBody};
use super::handle::BodyHandle;
use super::shape::ShapeDescriptor;
use crate::math::Vector3;
use serde::{Deserialize, Serialize};

/// Owned copy of one body's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodySnapshot {
    pub handle: BodyHandle,
    pub shape: ShapeDescriptor,
    pub pose: Pose,
    pub motion: MotionCategory,
    pub mass: f32,
    pub linear_velocity: Vector3,
    pub angular_velocity: Vector3,
}

impl BodySnapshot {
    pub(crate) fn capture(handle: BodyHandle, body: &RigidBody) -> Self {
        Self {
            handle,
            shape: body.shape,
            pose: body.pose,
            motion: body.motion,
            mass: body.mass,
            linear_velocity: body.linear_velocity,
            angular_velocity: body.angular_velocity,
        }
    }
}

/// Read-only view of a world, isolated from later steps.
///
/// Bodies appear in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub step_count: u64,
    pub elapsed_time: f64,
    pub gravity: Vector3,
    pub bodies: Vec<BodySnapshot>,
}

impl WorldSnapshot {
    pub fn body(&self, handle: BodyHandle) -> Option<&BodySnapshot> {
        self.bodies.iter().find(|b| b.handle == handle)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
