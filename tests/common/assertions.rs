use approx::assert_relative_eq;
use physim::{
    physics::{BodySnapshot, RigidBody},
    Vector3, WorldSnapshot,
};

/// Assert that two vectors match component-wise within `epsilon`
#[track_caller]
pub fn assert_vec_eq(actual: Vector3, expected: Vector3, epsilon: f32) {
    assert_relative_eq!(actual.x, expected.x, epsilon = epsilon);
    assert_relative_eq!(actual.y, expected.y, epsilon = epsilon);
    assert_relative_eq!(actual.z, expected.z, epsilon = epsilon);
}

/// Assert that a body's integrated state is finite and its orientation unit
#[track_caller]
pub fn assert_body_valid(body: &RigidBody) {
    assert!(body.position().is_finite(), "Position is not finite");
    assert!(
        body.orientation().is_finite(),
        "Orientation is not finite"
    );
    assert!(
        body.orientation().is_unit(),
        "Orientation is not unit length: {:?}",
        body.orientation()
    );
    assert!(
        body.linear_velocity().is_finite(),
        "Linear velocity is not finite"
    );
    assert!(
        body.angular_velocity().is_finite(),
        "Angular velocity is not finite"
    );
}

#[track_caller]
fn assert_body_snapshot_valid(body: &BodySnapshot) {
    assert!(
        body.pose.position.is_finite(),
        "Body {} position is not finite",
        body.handle
    );
    assert!(
        body.pose.orientation.is_unit(),
        "Body {} orientation is not unit length",
        body.handle
    );
    assert!(
        body.linear_velocity.is_finite() && body.angular_velocity.is_finite(),
        "Body {} velocity is not finite",
        body.handle
    );
}

/// Assert that every body in a snapshot is in a valid state
#[track_caller]
pub fn assert_snapshot_valid(snapshot: &WorldSnapshot) {
    for body in &snapshot.bodies {
        assert_body_snapshot_valid(body);
    }
}
