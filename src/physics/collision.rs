use super::body::RigidBody;
use super::handle::Arena;
use super::shape::{Aabb, ShapeDescriptor};
use crate::math::Vector3;
use nalgebra::Matrix3;

/// Below this approach speed contacts are treated as inelastic, which lets
/// resting bodies settle instead of micro-bouncing.
pub const RESTITUTION_THRESHOLD: f32 = 0.5;

const EPSILON: f32 = 1e-6;

/// A detected overlap between two bodies.
///
/// `a` and `b` are arena slot indices; `normal` points from `a` toward `b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub a: usize,
    pub b: usize,
    pub normal: Vector3,
    pub depth: f32,
    pub point: Vector3,
}

impl Contact {
    fn is_finite(&self) -> bool {
        self.normal.is_finite() && self.depth.is_finite() && self.point.is_finite()
    }
}

/// Result of a single narrow-phase test: normal (A toward B), depth, point.
type Manifold = (Vector3, f32, Vector3);

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Finds all overlapping pairs, visiting bodies in insertion order so the
/// contact list is deterministic.
///
/// Pairs where neither body is dynamic are skipped; so are contacts whose
/// geometry is not finite.
pub fn detect_contacts(bodies: &Arena<RigidBody>) -> Vec<Contact> {
    let order = bodies.order();
    let entries: Vec<(usize, &RigidBody, Option<Aabb>)> = order
        .iter()
        .filter_map(|&i| {
            let index = i as usize;
            bodies.by_index(index).map(|body| {
                let bounds = body.shape.aabb(body.pose.position, body.pose.orientation);
                (index, body, bounds)
            })
        })
        .collect();

    let mut contacts = Vec::new();
    for (n, &(ia, body_a, bounds_a)) in entries.iter().enumerate() {
        for &(ib, body_b, bounds_b) in &entries[n + 1..] {
            if !body_a.is_dynamic() && !body_b.is_dynamic() {
                continue;
            }

            // Broad phase: planes have no bounds and always reach the narrow phase
            if let (Some(ba), Some(bb)) = (bounds_a, bounds_b) {
                if !ba.overlaps(&bb) {
                    continue;
                }
            }

            let manifold = match collide(body_a, bounds_a, body_b, bounds_b) {
                Some(manifold) => manifold,
                None => continue,
            };

            let (normal, depth, point) = manifold;
            let contact = Contact {
                a: ia,
                b: ib,
                normal,
                depth,
                point,
            };
            if contact.is_finite() {
                contacts.push(contact);
            }
        }
    }
    contacts
}

/// Narrow phase dispatch.
///
/// Sphere pairs and sphere/box pairs are exact; planes use the shape's
/// support extent; every other pair falls back to world-space bounds.
fn collide(
    a: &RigidBody,
    bounds_a: Option<Aabb>,
    b: &RigidBody,
    bounds_b: Option<Aabb>,
) -> Option<Manifold> {
    let (pa, pb) = (a.pose.position, b.pose.position);

    match (&a.shape, &b.shape) {
        (ShapeDescriptor::Plane { .. }, ShapeDescriptor::Plane { .. }) => None,
        (ShapeDescriptor::Plane { normal, offset }, _) => collide_plane(*normal, *offset, b),
        (_, ShapeDescriptor::Plane { normal, offset }) => {
            flip(collide_plane(*normal, *offset, a))
        }
        (ShapeDescriptor::Sphere { radius: ra }, ShapeDescriptor::Sphere { radius: rb }) => {
            collide_sphere_sphere(pa, *ra, pb, *rb)
        }
        (ShapeDescriptor::Sphere { radius }, ShapeDescriptor::Box { half_extents }) => {
            collide_sphere_box(pa, *radius, b, *half_extents)
        }
        (ShapeDescriptor::Box { half_extents }, ShapeDescriptor::Sphere { radius }) => {
            flip(collide_sphere_box(pb, *radius, a, *half_extents))
        }
        (ShapeDescriptor::Sphere { radius }, _) => {
            let bb = bounds_b?;
            collide_sphere_aabb(pa, *radius, bb.center(), bb.half_extents())
        }
        (_, ShapeDescriptor::Sphere { radius }) => {
            let ba = bounds_a?;
            flip(collide_sphere_aabb(pb, *radius, ba.center(), ba.half_extents()))
        }
        _ => {
            let (ba, bb) = (bounds_a?, bounds_b?);
            collide_aabb_aabb(&ba, &bb)
        }
    }
}

fn flip(manifold: Option<Manifold>) -> Option<Manifold> {
    manifold.map(|(normal, depth, point)| (-normal, depth, point))
}

/// Infinite plane `n · p = offset` against any bounded shape. The normal
/// points from the plane toward the body.
fn collide_plane(normal: Vector3, offset: f32, body: &RigidBody) -> Option<Manifold> {
    let position = body.pose.position;
    let reach = body.shape.support_extent(body.pose.orientation, -normal);
    let lowest = normal.dot(position) - reach;
    let depth = offset - lowest;
    if depth <= 0.0 {
        return None;
    }
    let point = position - normal * reach;
    Some((normal, depth, point))
}

/// Sphere vs sphere.
fn collide_sphere_sphere(
    pos_a: Vector3,
    radius_a: f32,
    pos_b: Vector3,
    radius_b: f32,
) -> Option<Manifold> {
    let diff = pos_b - pos_a;
    let dist_sq = diff.length_squared();
    let sum_r = radius_a + radius_b;

    if dist_sq >= sum_r * sum_r {
        return None;
    }

    let dist = dist_sq.sqrt();
    let depth = sum_r - dist;
    let normal = if dist > EPSILON {
        diff / dist
    } else {
        // Coincident centres: pick an arbitrary separation axis
        Vector3::Y
    };
    let point = pos_a + normal * (radius_a - 0.5 * depth);
    Some((normal, depth, point))
}

/// Sphere vs oriented box, solved in the box's local frame.
/// The normal points from the sphere toward the box.
fn collide_sphere_box(
    sphere_pos: Vector3,
    radius: f32,
    box_body: &RigidBody,
    half_extents: Vector3,
) -> Option<Manifold> {
    let q = box_body.pose.orientation;
    let local = q.conjugate().rotate(sphere_pos - box_body.pose.position);

    let (normal, depth, point) = collide_sphere_aabb(local, radius, Vector3::ZERO, half_extents)?;
    Some((
        q.rotate(normal),
        depth,
        box_body.pose.position + q.rotate(point),
    ))
}

/// Sphere vs axis-aligned box. Finds the closest point on the box to the
/// sphere centre; a centre inside the box exits through the nearest face.
fn collide_sphere_aabb(
    sphere_pos: Vector3,
    radius: f32,
    box_center: Vector3,
    half: Vector3,
) -> Option<Manifold> {
    let min = box_center - half;
    let max = box_center + half;
    let closest = Vector3::new(
        sphere_pos.x.clamp(min.x, max.x),
        sphere_pos.y.clamp(min.y, max.y),
        sphere_pos.z.clamp(min.z, max.z),
    );

    let diff = sphere_pos - closest;
    let dist_sq = diff.length_squared();
    if dist_sq >= radius * radius {
        return None;
    }

    let dist = dist_sq.sqrt();
    if dist > EPSILON {
        // Closest point to sphere centre, negated so it runs sphere -> box
        return Some((-diff / dist, radius - dist, closest));
    }

    // Centre inside the box: least-penetration face
    let faces = [
        (max.x - sphere_pos.x, Vector3::X),
        (sphere_pos.x - min.x, -Vector3::X),
        (max.y - sphere_pos.y, Vector3::Y),
        (sphere_pos.y - min.y, -Vector3::Y),
        (max.z - sphere_pos.z, Vector3::Z),
        (sphere_pos.z - min.z, -Vector3::Z),
    ];
    let (distance, outward) = faces
        .iter()
        .copied()
        .fold((f32::INFINITY, Vector3::Y), |best, face| {
            if face.0 < best.0 {
                face
            } else {
                best
            }
        });

    // Sphere leaves along `outward`, so the box lies along `-outward`
    Some((-outward, radius + distance, sphere_pos))
}

/// Bounds vs bounds using the separating axis of least overlap.
fn collide_aabb_aabb(a: &Aabb, b: &Aabb) -> Option<Manifold> {
    let diff = b.center() - a.center();
    let (ha, hb) = (a.half_extents(), b.half_extents());

    let overlap = Vector3::new(
        ha.x + hb.x - diff.x.abs(),
        ha.y + hb.y - diff.y.abs(),
        ha.z + hb.z - diff.z.abs(),
    );
    if overlap.x <= 0.0 || overlap.y <= 0.0 || overlap.z <= 0.0 {
        return None;
    }

    let sign = |d: f32| if d >= 0.0 { 1.0 } else { -1.0 };
    let (normal, depth) = if overlap.x <= overlap.y && overlap.x <= overlap.z {
        (Vector3::new(sign(diff.x), 0.0, 0.0), overlap.x)
    } else if overlap.y <= overlap.z {
        (Vector3::new(0.0, sign(diff.y), 0.0), overlap.y)
    } else {
        (Vector3::new(0.0, 0.0, sign(diff.z)), overlap.z)
    };

    // Centre of the overlap region
    let lo = a.min.max(b.min);
    let hi = a.max.min(b.max);
    Some((normal, depth, (lo + hi) * 0.5))
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Inverse mass and world inverse inertia as seen by the solver. Only
/// dynamic bodies respond; static and kinematic bodies act as infinite mass.
fn response(body: &RigidBody) -> (f32, Matrix3<f32>) {
    if body.is_dynamic() {
        (body.inv_mass, body.inv_inertia_world())
    } else {
        (0.0, Matrix3::zeros())
    }
}

/// Resolves contacts with positional correction, a restitution impulse and
/// Coulomb friction.
///
/// Positional correction runs once per contact. The velocity pass runs
/// `iterations` times over the whole list, in list order.
pub fn resolve_contacts(bodies: &mut Arena<RigidBody>, contacts: &[Contact], iterations: u32) {
    for contact in contacts {
        correct_position(bodies, contact);
    }
    for _ in 0..iterations.max(1) {
        for contact in contacts {
            apply_contact_impulse(bodies, contact);
        }
    }
}

fn correct_position(bodies: &mut Arena<RigidBody>, contact: &Contact) {
    let Some((a, b)) = bodies.pair_mut(contact.a, contact.b) else {
        return;
    };
    let (inv_mass_a, _) = response(a);
    let (inv_mass_b, _) = response(b);

    let inv_mass_sum = inv_mass_a + inv_mass_b;
    if inv_mass_sum == 0.0 {
        return;
    }
    let correction = contact.normal * (contact.depth / inv_mass_sum);
    a.pose.position -= correction * inv_mass_a;
    b.pose.position += correction * inv_mass_b;
}

fn apply_contact_impulse(bodies: &mut Arena<RigidBody>, contact: &Contact) {
    let Some((a, b)) = bodies.pair_mut(contact.a, contact.b) else {
        return;
    };
    let (inv_mass_a, inv_inertia_a) = response(a);
    let (inv_mass_b, inv_inertia_b) = response(b);
    if inv_mass_a + inv_mass_b == 0.0 {
        return;
    }

    let n = contact.normal;
    let ra = contact.point - a.pose.position;
    let rb = contact.point - b.pose.position;

    let relative_vel = b.velocity_at(rb) - a.velocity_at(ra);
    let vel_along_normal = relative_vel.dot(n);

    // Separating already
    if vel_along_normal >= 0.0 {
        return;
    }

    let restitution = if -vel_along_normal > RESTITUTION_THRESHOLD {
        a.material.restitution.min(b.material.restitution)
    } else {
        0.0
    };

    // 1/m_eff = 1/m_a + 1/m_b + (I_a⁻¹(ra×n))×ra·n + (I_b⁻¹(rb×n))×rb·n
    let eff_mass_inv = effective_mass_inv(
        n,
        ra,
        rb,
        (inv_mass_a, &inv_inertia_a),
        (inv_mass_b, &inv_inertia_b),
    );
    if eff_mass_inv <= 0.0 {
        return;
    }

    let j = -(1.0 + restitution) * vel_along_normal / eff_mass_inv;
    let impulse = n * j;
    apply_pair_impulse(a, b, impulse, ra, rb, &inv_inertia_a, &inv_inertia_b);

    // --- Friction impulse (Coulomb model) ---
    let mu = (a.material.friction * b.material.friction).sqrt();
    if mu <= EPSILON {
        return;
    }

    let relative_vel = b.velocity_at(rb) - a.velocity_at(ra);
    let tangent_vel = relative_vel - n * relative_vel.dot(n);
    let tangent_speed = tangent_vel.length();
    if tangent_speed <= EPSILON {
        return;
    }
    let tangent = tangent_vel / tangent_speed;

    let eff_mass_t_inv = effective_mass_inv(
        tangent,
        ra,
        rb,
        (inv_mass_a, &inv_inertia_a),
        (inv_mass_b, &inv_inertia_b),
    );
    if eff_mass_t_inv <= 0.0 {
        return;
    }

    // Clamp by the Coulomb cone: |jt| <= mu * jn
    let jt = (-tangent_speed / eff_mass_t_inv).max(-mu * j);
    apply_pair_impulse(a, b, tangent * jt, ra, rb, &inv_inertia_a, &inv_inertia_b);
}

fn effective_mass_inv(
    dir: Vector3,
    ra: Vector3,
    rb: Vector3,
    (inv_mass_a, inv_inertia_a): (f32, &Matrix3<f32>),
    (inv_mass_b, inv_inertia_b): (f32, &Matrix3<f32>),
) -> f32 {
    let angular_a = ra.cross(dir).transformed_by(inv_inertia_a).cross(ra).dot(dir);
    let angular_b = rb.cross(dir).transformed_by(inv_inertia_b).cross(rb).dot(dir);
    inv_mass_a + inv_mass_b + angular_a + angular_b
}

/// Applies `-impulse` to `a` and `+impulse` to `b` at their contact offsets.
fn apply_pair_impulse(
    a: &mut RigidBody,
    b: &mut RigidBody,
    impulse: Vector3,
    ra: Vector3,
    rb: Vector3,
    inv_inertia_a: &Matrix3<f32>,
    inv_inertia_b: &Matrix3<f32>,
) {
    if a.is_dynamic() {
        a.linear_velocity -= impulse * a.inv_mass;
        a.angular_velocity -= ra.cross(impulse).transformed_by(inv_inertia_a);
    }
    if b.is_dynamic() {
        b.linear_velocity += impulse * b.inv_mass;
        b.angular_velocity += rb.cross(impulse).transformed_by(inv_inertia_b);
    }
}
