use super::{MathError, Result};
use nalgebra as na;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

/// Single-precision 3D vector.
///
/// The memory layout is `[x, y, z]`, which is also the layout of the flat
/// buffers produced by [`Vector3::to_array`] and accepted by
/// [`Vector3::from_slice`].
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const X: Self = Self::new(1.0, 0.0, 0.0);
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub const fn splat(v: f32) -> Self {
        Self::new(v, v, v)
    }

    #[inline]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[inline]
    pub fn cross(self, other: Self) -> Self {
        na::Vector3::from(self)
            .cross(&na::Vector3::from(other))
            .into()
    }

    #[inline]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    #[inline]
    pub fn length(self) -> f32 {
        na::Vector3::from(self).norm()
    }

    #[inline]
    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    /// Returns the unit vector pointing in the same direction.
    ///
    /// Fails with [`MathError::DegenerateInput`] when the length is zero or
    /// not finite; there is no silent fallback value.
    pub fn normalize(self) -> Result<Self> {
        let len = self.length();
        if len == 0.0 || !len.is_finite() {
            return Err(MathError::DegenerateInput(
                "cannot normalize a zero-length or non-finite vector",
            ));
        }
        Ok(na::Vector3::from(self).normalize().into())
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Component-wise absolute value.
    #[inline]
    pub fn abs(self) -> Self {
        Self::new(self.x.abs(), self.y.abs(), self.z.abs())
    }

    #[inline]
    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    #[inline]
    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }

    #[inline]
    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    #[inline]
    pub const fn from_array(a: [f32; 3]) -> Self {
        Self::new(a[0], a[1], a[2])
    }

    /// Reads a vector from a flat `[x, y, z]` buffer.
    pub fn from_slice(buf: &[f32]) -> Result<Self> {
        match buf {
            [x, y, z] => Ok(Self::new(*x, *y, *z)),
            _ => Err(MathError::BufferLength {
                expected: 3,
                actual: buf.len(),
            }),
        }
    }

    /// Appends `[x, y, z]` to a flat buffer, e.g. a vertex stream.
    pub fn write_to(self, buf: &mut Vec<f32>) {
        buf.extend_from_slice(&self.to_array());
    }

    /// Matrix-vector product `m * self`.
    #[inline]
    pub fn transformed_by(self, m: &na::Matrix3<f32>) -> Self {
        (m * na::Vector3::from(self)).into()
    }

    /// Rescales the vector so its length does not exceed `max`.
    pub fn clamp_length(self, max: f32) -> Self {
        let len_sq = self.length_squared();
        if len_sq > max * max {
            self * (max / len_sq.sqrt())
        } else {
            self
        }
    }
}

impl Add for Vector3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vector3 {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vector3 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for Vector3 {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for Vector3 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<f32> for Vector3 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Mul<Vector3> for f32 {
    type Output = Vector3;

    #[inline]
    fn mul(self, rhs: Vector3) -> Vector3 {
        rhs * self
    }
}

impl MulAssign<f32> for Vector3 {
    #[inline]
    fn mul_assign(&mut self, rhs: f32) {
        *self = *self * rhs;
    }
}

impl Div<f32> for Vector3 {
    type Output = Self;

    // No guard: dividing by zero yields inf/NaN like any other f32 division.
    #[inline]
    fn div(self, rhs: f32) -> Self {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl From<[f32; 3]> for Vector3 {
    fn from(a: [f32; 3]) -> Self {
        Self::from_array(a)
    }
}

impl From<Vector3> for [f32; 3] {
    fn from(v: Vector3) -> Self {
        v.to_array()
    }
}

impl From<na::Vector3<f32>> for Vector3 {
    fn from(v: na::Vector3<f32>) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<Vector3> for na::Vector3<f32> {
    fn from(v: Vector3) -> Self {
        na::Vector3::new(v.x, v.y, v.z)
    }
}

impl From<bevy::math::Vec3> for Vector3 {
    fn from(v: bevy::math::Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<Vector3> for bevy::math::Vec3 {
    fn from(v: Vector3) -> Self {
        bevy::math::Vec3::new(v.x, v.y, v.z)
    }
}
