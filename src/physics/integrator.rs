use super::body::{MotionCategory, RigidBody};
use crate::math::{Quaternion, Vector3};
use nalgebra::{self as na, UnitQuaternion};

/// Per-sub-step integration parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegrationParams {
    pub gravity: Vector3,
    pub dt: f32,
    pub max_velocity: f32,
    pub max_angular_velocity: f32,
}

/// Advances one body by a single sub-step.
///
/// Dynamic bodies use semi-implicit Euler: velocities are updated from
/// gravity and the accumulated force/torque first, then the new velocities
/// move the pose. Kinematic bodies are moved by their current velocities
/// only. Static bodies are left untouched.
///
/// # Arguments
/// - `body`: The body to advance.
/// - `params`: Gravity, sub-step size and velocity limits.
pub fn integrate_body(body: &mut RigidBody, params: &IntegrationParams) {
    let dt = params.dt;

    let dynamic = match body.motion {
        MotionCategory::Static => return,
        MotionCategory::Dynamic if body.mass == 0.0 => return,
        MotionCategory::Dynamic => true,
        MotionCategory::Kinematic => false,
    };

    if dynamic {
        let acceleration = body.force * body.inv_mass + params.gravity;
        let angular_acceleration = body.torque.transformed_by(&body.inv_inertia_world());

        body.linear_velocity += acceleration * dt;
        body.angular_velocity += angular_acceleration * dt;
    }

    body.pose.position += body.linear_velocity * dt;
    body.pose.orientation = integrate_orientation(
        body.pose.orientation,
        body.angular_velocity,
        dt,
    );

    // Apply velocity limits *after* integration
    if dynamic {
        apply_velocity_limits(body, params.max_velocity, params.max_angular_velocity);
    }
}

/// Rotates `q` by the scaled axis `ω·dt` and re-normalizes.
///
/// A non-finite angular velocity yields a non-finite result, which the
/// caller's finiteness check reports.
///
/// # Arguments
/// - `q`: Current orientation.
/// - `omega`: World-frame angular velocity in rad/s.
/// - `dt`: Sub-step size in seconds.
pub fn integrate_orientation(q: Quaternion, omega: Vector3, dt: f32) -> Quaternion {
    if omega == Vector3::ZERO {
        return q;
    }
    let rotation = UnitQuaternion::from_scaled_axis(na::Vector3::from(omega) * dt);
    let attitude = rotation * UnitQuaternion::from(q);

    // Ensure quaternion normalization
    UnitQuaternion::from_quaternion(attitude.into_inner().normalize()).into()
}

/// Clamps linear and angular speed magnitudes to the configured limits.
///
/// # Arguments
/// - `body`: The body whose velocities are limited.
/// - `max_velocity`: Maximum linear speed in m/s.
/// - `max_angular_velocity`: Maximum angular speed in rad/s.
pub fn apply_velocity_limits(body: &mut RigidBody, max_velocity: f32, max_angular_velocity: f32) {
    body.linear_velocity = body.linear_velocity.clamp_length(max_velocity);
    body.angular_velocity = body.angular_velocity.clamp_length(max_angular_velocity);
}
