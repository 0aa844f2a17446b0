use super::error::{PhysicsError, Result};
use crate::math::{Quaternion, Vector3};
use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Collision geometry attached to a body.
///
/// Capsules, cylinders and cones are aligned with the local Y axis. A
/// cylinder's radius is `half_extents.x` and its half height
/// `half_extents.y`. A cone is centred halfway between base and apex, with
/// the apex on +Y. Planes are infinite, static, and store a unit normal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeDescriptor {
    Box { half_extents: Vector3 },
    Sphere { radius: f32 },
    Capsule { radius: f32, half_height: f32 },
    Cylinder { half_extents: Vector3 },
    Cone { radius: f32, height: f32 },
    Plane { normal: Vector3, offset: f32 },
}

/// Parameter-free shape tag, used by the control panel and in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Box,
    Sphere,
    Capsule,
    Cylinder,
    Cone,
    Plane,
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShapeKind::Box => "box",
            ShapeKind::Sphere => "sphere",
            ShapeKind::Capsule => "capsule",
            ShapeKind::Cylinder => "cylinder",
            ShapeKind::Cone => "cone",
            ShapeKind::Plane => "plane",
        };
        f.write_str(name)
    }
}

fn positive(name: &str, value: f32) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(PhysicsError::InvalidShapeParameters(format!(
            "{name} must be positive and finite, got {value}"
        )))
    }
}

fn positive_extents(name: &str, v: Vector3) -> Result<()> {
    positive(&format!("{name}.x"), v.x)?;
    positive(&format!("{name}.y"), v.y)?;
    positive(&format!("{name}.z"), v.z)
}

impl ShapeDescriptor {
    pub fn cuboid(half_extents: Vector3) -> Result<Self> {
        Self::validated(ShapeDescriptor::Box { half_extents })
    }

    pub fn sphere(radius: f32) -> Result<Self> {
        Self::validated(ShapeDescriptor::Sphere { radius })
    }

    pub fn capsule(radius: f32, half_height: f32) -> Result<Self> {
        Self::validated(ShapeDescriptor::Capsule {
            radius,
            half_height,
        })
    }

    pub fn cylinder(half_extents: Vector3) -> Result<Self> {
        Self::validated(ShapeDescriptor::Cylinder { half_extents })
    }

    pub fn cone(radius: f32, height: f32) -> Result<Self> {
        Self::validated(ShapeDescriptor::Cone { radius, height })
    }

    /// Plane `normal · p = offset`. The normal is normalized on creation.
    pub fn plane(normal: Vector3, offset: f32) -> Result<Self> {
        Self::validated(ShapeDescriptor::Plane { normal, offset })
    }

    /// Checks the positivity rules and returns the canonical form (unit plane
    /// normal). Deserialized descriptors go through here too.
    pub fn validated(self) -> Result<Self> {
        match self {
            ShapeDescriptor::Box { half_extents } => {
                positive_extents("half_extents", half_extents)?;
            }
            ShapeDescriptor::Sphere { radius } => positive("radius", radius)?,
            ShapeDescriptor::Capsule {
                radius,
                half_height,
            } => {
                positive("radius", radius)?;
                positive("half_height", half_height)?;
            }
            ShapeDescriptor::Cylinder { half_extents } => {
                positive_extents("half_extents", half_extents)?;
            }
            ShapeDescriptor::Cone { radius, height } => {
                positive("radius", radius)?;
                positive("height", height)?;
            }
            ShapeDescriptor::Plane { normal, offset } => {
                if !offset.is_finite() {
                    return Err(PhysicsError::InvalidShapeParameters(format!(
                        "plane offset must be finite, got {offset}"
                    )));
                }
                let normal = normal.normalize().map_err(|_| {
                    PhysicsError::InvalidShapeParameters(format!(
                        "plane normal must be non-zero and finite, got {normal:?}"
                    ))
                })?;
                return Ok(ShapeDescriptor::Plane { normal, offset });
            }
        }
        Ok(self)
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            ShapeDescriptor::Box { .. } => ShapeKind::Box,
            ShapeDescriptor::Sphere { .. } => ShapeKind::Sphere,
            ShapeDescriptor::Capsule { .. } => ShapeKind::Capsule,
            ShapeDescriptor::Cylinder { .. } => ShapeKind::Cylinder,
            ShapeDescriptor::Cone { .. } => ShapeKind::Cone,
            ShapeDescriptor::Plane { .. } => ShapeKind::Plane,
        }
    }

    #[inline]
    pub fn is_plane(&self) -> bool {
        matches!(self, ShapeDescriptor::Plane { .. })
    }

    /// Solid-body inertia tensor about the centre of mass, in the local frame.
    pub fn inertia(&self, mass: f32) -> Matrix3<f32> {
        let diag = match *self {
            ShapeDescriptor::Box { half_extents: h } => {
                let k = mass / 3.0;
                Vector3::new(
                    k * (h.y * h.y + h.z * h.z),
                    k * (h.x * h.x + h.z * h.z),
                    k * (h.x * h.x + h.y * h.y),
                )
            }
            ShapeDescriptor::Sphere { radius } => Vector3::splat(0.4 * mass * radius * radius),
            ShapeDescriptor::Capsule {
                radius: r,
                half_height,
            } => {
                // Cylinder body plus two hemispherical caps, mass split by volume.
                let h = 2.0 * half_height;
                let v_cyl = std::f32::consts::PI * r * r * h;
                let v_caps = 4.0 / 3.0 * std::f32::consts::PI * r * r * r;
                let m_cyl = mass * v_cyl / (v_cyl + v_caps);
                let m_caps = mass - m_cyl;

                let axial = m_cyl * r * r / 2.0 + m_caps * 0.4 * r * r;
                let lateral = m_cyl * (h * h / 12.0 + r * r / 4.0)
                    + m_caps * (0.4 * r * r + h * h / 4.0 + 3.0 * h * r / 8.0);
                Vector3::new(lateral, axial, lateral)
            }
            ShapeDescriptor::Cylinder { half_extents } => {
                let r = half_extents.x;
                let h = 2.0 * half_extents.y;
                let lateral = mass * (3.0 * r * r + h * h) / 12.0;
                Vector3::new(lateral, 0.5 * mass * r * r, lateral)
            }
            ShapeDescriptor::Cone { radius: r, height: h } => {
                let lateral = mass * (3.0 / 20.0 * r * r + 3.0 / 80.0 * h * h);
                Vector3::new(lateral, 0.3 * mass * r * r, lateral)
            }
            ShapeDescriptor::Plane { .. } => Vector3::ZERO,
        };
        let diag: nalgebra::Vector3<f32> = diag.into();
        Matrix3::from_diagonal(&diag)
    }

    /// Distance from the shape's centre to its farthest point along the
    /// unit world direction `dir`, for the given orientation.
    pub fn support_extent(&self, orientation: Quaternion, dir: Vector3) -> f32 {
        let local = orientation.conjugate().rotate(dir);
        let radial = (local.x * local.x + local.z * local.z).sqrt();

        match *self {
            ShapeDescriptor::Box { half_extents } => half_extents.dot(local.abs()),
            ShapeDescriptor::Sphere { radius } => radius,
            ShapeDescriptor::Capsule {
                radius,
                half_height,
            } => radius + half_height * local.y.abs(),
            ShapeDescriptor::Cylinder { half_extents } => {
                half_extents.y * local.y.abs() + half_extents.x * radial
            }
            // Centred on the centroid: base at -h/4, apex at +3h/4
            ShapeDescriptor::Cone { radius, height } => {
                let apex = 0.75 * height * local.y;
                let rim = -0.25 * height * local.y + radius * radial;
                apex.max(rim)
            }
            ShapeDescriptor::Plane { .. } => f32::INFINITY,
        }
    }

    /// World-space bounds for the given pose. Planes are unbounded.
    pub fn aabb(&self, position: Vector3, orientation: Quaternion) -> Option<Aabb> {
        if self.is_plane() {
            return None;
        }
        let extent = |axis: Vector3| self.support_extent(orientation, axis);
        let max = Vector3::new(extent(Vector3::X), extent(Vector3::Y), extent(Vector3::Z));
        let min = Vector3::new(
            extent(-Vector3::X),
            extent(-Vector3::Y),
            extent(-Vector3::Z),
        );
        Some(Aabb {
            min: position - min,
            max: position + max,
        })
    }

    pub fn bounding_radius(&self) -> f32 {
        match *self {
            ShapeDescriptor::Box { half_extents } => half_extents.length(),
            ShapeDescriptor::Sphere { radius } => radius,
            ShapeDescriptor::Capsule {
                radius,
                half_height,
            } => radius + half_height,
            ShapeDescriptor::Cylinder { half_extents } => {
                (half_extents.x * half_extents.x + half_extents.y * half_extents.y).sqrt()
            }
            ShapeDescriptor::Cone { radius, height } => {
                let rim = (radius * radius + 0.0625 * height * height).sqrt();
                rim.max(0.75 * height)
            }
            ShapeDescriptor::Plane { .. } => f32::INFINITY,
        }
    }
}

/// Axis-aligned bounding box in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vector3,
    pub max: Vector3,
}

impl Aabb {
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    #[inline]
    pub fn center(&self) -> Vector3 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn half_extents(&self) -> Vector3 {
        (self.max - self.min) * 0.5
    }
}
