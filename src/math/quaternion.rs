use super::{MathError, Result, Vector3, UNIT_TOLERANCE};
use nalgebra as na;
use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// Rotation quaternion with components `(x, y, z, w)`.
///
/// Flat buffers use the same `[x, y, z, w]` order as the struct layout.
/// The default value is the identity rotation.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quaternion {
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Raw constructor; no normalization is performed.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Rotation of `angle` radians about `axis`. The axis does not need to be
    /// unit length but must not be zero.
    pub fn from_axis_angle(axis: Vector3, angle: f32) -> Result<Self> {
        let axis = na::Unit::new_unchecked(na::Vector3::from(axis.normalize()?));
        Ok(na::UnitQuaternion::from_axis_angle(&axis, angle).into())
    }

    /// Builds a rotation from Euler angles in radians: roll about X, pitch
    /// about Y, yaw about Z, applied in that order (`q = yaw * pitch * roll`).
    pub fn from_euler(euler: Vector3) -> Self {
        na::UnitQuaternion::from_euler_angles(euler.x, euler.y, euler.z).into()
    }

    /// Inverse of [`Quaternion::from_euler`]. Pitch saturates at ±π/2.
    pub fn to_euler(self) -> Vector3 {
        let (roll, pitch, yaw) = na::UnitQuaternion::from(self).euler_angles();
        Vector3::new(roll, pitch, yaw)
    }

    /// Returns `(axis, angle)`. The identity maps to `(X, 0)`.
    pub fn to_axis_angle(self) -> (Vector3, f32) {
        match na::UnitQuaternion::from(self).axis_angle() {
            Some((axis, angle)) => (axis.into_inner().into(), angle),
            None => (Vector3::X, 0.0),
        }
    }

    #[inline]
    pub fn dot(self, other: Self) -> f32 {
        self.raw().dot(&other.raw())
    }

    #[inline]
    pub fn length_squared(self) -> f32 {
        self.raw().norm_squared()
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.raw().norm()
    }

    pub fn normalize(self) -> Result<Self> {
        let len = self.length();
        if len == 0.0 || !len.is_finite() {
            return Err(MathError::DegenerateInput(
                "cannot normalize a zero-length or non-finite quaternion",
            ));
        }
        Ok(self.raw().normalize().into())
    }

    #[inline]
    pub fn is_unit(self) -> bool {
        (self.length() - 1.0).abs() <= UNIT_TOLERANCE
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && self.w.is_finite()
    }

    #[inline]
    pub fn conjugate(self) -> Self {
        self.raw().conjugate().into()
    }

    /// Multiplicative inverse, `conjugate / |q|²`. Fails for the zero
    /// quaternion.
    pub fn inverse(self) -> Result<Self> {
        self.raw()
            .try_inverse()
            .map(Self::from)
            .ok_or(MathError::DegenerateInput("cannot invert a zero quaternion"))
    }

    /// Rotates `v` by the normalized quaternion.
    pub fn rotate(self, v: Vector3) -> Vector3 {
        na::UnitQuaternion::from(self)
            .transform_vector(&na::Vector3::from(v))
            .into()
    }

    /// Rotation matrix of the (normalized) quaternion.
    pub fn to_rotation_matrix(self) -> na::Matrix3<f32> {
        na::UnitQuaternion::from(self).to_rotation_matrix().into_inner()
    }

    // Unnormalized nalgebra view of the same components
    #[inline]
    fn raw(self) -> na::Quaternion<f32> {
        na::Quaternion::new(self.w, self.x, self.y, self.z)
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.x, self.y, self.z, self.w]
    }

    #[inline]
    pub const fn from_array(a: [f32; 4]) -> Self {
        Self::new(a[0], a[1], a[2], a[3])
    }

    /// Reads a quaternion from a flat `[x, y, z, w]` buffer.
    pub fn from_slice(buf: &[f32]) -> Result<Self> {
        match buf {
            [x, y, z, w] => Ok(Self::new(*x, *y, *z, *w)),
            _ => Err(MathError::BufferLength {
                expected: 4,
                actual: buf.len(),
            }),
        }
    }
}

impl Mul for Quaternion {
    type Output = Self;

    /// Hamilton product; `a * b` applies `b` first, then `a`.
    fn mul(self, o: Self) -> Self {
        (self.raw() * o.raw()).into()
    }
}

impl Mul<Vector3> for Quaternion {
    type Output = Vector3;

    fn mul(self, v: Vector3) -> Vector3 {
        self.rotate(v)
    }
}

impl From<[f32; 4]> for Quaternion {
    fn from(a: [f32; 4]) -> Self {
        Self::from_array(a)
    }
}

impl From<Quaternion> for [f32; 4] {
    fn from(q: Quaternion) -> Self {
        q.to_array()
    }
}

impl From<na::UnitQuaternion<f32>> for Quaternion {
    fn from(q: na::UnitQuaternion<f32>) -> Self {
        Self::new(q.i, q.j, q.k, q.w)
    }
}

impl From<na::Quaternion<f32>> for Quaternion {
    fn from(q: na::Quaternion<f32>) -> Self {
        Self::new(q.i, q.j, q.k, q.w)
    }
}

impl From<Quaternion> for na::UnitQuaternion<f32> {
    fn from(q: Quaternion) -> Self {
        na::UnitQuaternion::new_normalize(q.raw())
    }
}

impl From<bevy::math::Quat> for Quaternion {
    fn from(q: bevy::math::Quat) -> Self {
        Self::new(q.x, q.y, q.z, q.w)
    }
}

impl From<Quaternion> for bevy::math::Quat {
    fn from(q: Quaternion) -> Self {
        bevy::math::Quat::from_xyzw(q.x, q.y, q.z, q.w)
    }
}
