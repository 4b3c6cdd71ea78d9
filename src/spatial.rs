//! Pose primitives. Poses are [Isometry3](nalgebra::Isometry3) in millimeters, so most
//! operations are thin wrappers; they exist to fix the composition order and the wire form
//! in one place.

use nalgebra::{Point3, Translation3, Unit, UnitQuaternion, Vector3};
use crate::kinematic_traits::{Pose, WORLD};
use crate::proto::PoseProto;

/// Below this the axis of the wire orientation is considered zero (no rotation).
const AXIS_EPSILON: f64 = 1e-12;

/// Applies `b` in the frame of `a`.
pub fn compose(a: &Pose, b: &Pose) -> Pose {
    a * b
}

pub fn invert(pose: &Pose) -> Pose {
    pose.inverse()
}

pub fn transform_point(pose: &Pose, point: &Point3<f64>) -> Point3<f64> {
    pose.transform_point(point)
}

/// Pose from position (millimeters) and orientation as axis and angle (radians).
/// The axis does not need to be normalized; zero axis means no rotation.
pub fn pose_from_axis_angle(x: f64, y: f64, z: f64, axis: Vector3<f64>, theta: f64) -> Pose {
    let rotation = match Unit::try_new(axis, AXIS_EPSILON) {
        Some(axis) if theta.is_finite() => UnitQuaternion::from_axis_angle(&axis, theta),
        _ => UnitQuaternion::identity(),
    };
    Pose::from_parts(Translation3::new(x, y, z), rotation)
}

/// Orientation as unit axis and angle in [0, pi]. Zero rotation gives the z axis and 0.
pub fn axis_angle(pose: &Pose) -> (Vector3<f64>, f64) {
    match pose.rotation.axis_angle() {
        Some((axis, angle)) => (axis.into_inner(), angle),
        None => (Vector3::z(), 0.0),
    }
}

pub fn pose_to_protobuf(pose: &Pose) -> PoseProto {
    let (axis, theta) = axis_angle(pose);
    let position = pose.translation.vector;
    PoseProto {
        x: position.x,
        y: position.y,
        z: position.z,
        theta,
        rx: axis.x,
        ry: axis.y,
        rz: axis.z,
    }
}

pub fn pose_from_protobuf(proto: &PoseProto) -> Pose {
    pose_from_axis_angle(proto.x, proto.y, proto.z, Vector3::new(proto.rx, proto.ry, proto.rz), proto.theta)
}

/// True if positions differ by at most `distance_tolerance` (mm) and orientations
/// by at most `angular_tolerance` (radians).
pub fn poses_approx_eq(a: &Pose, b: &Pose, distance_tolerance: f64, angular_tolerance: f64) -> bool {
    (a.translation.vector - b.translation.vector).norm() <= distance_tolerance
        && a.rotation.angle_to(&b.rotation) <= angular_tolerance
}

/// Pose expressed in the named frame. Named poses are used as supplemental frames.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseInFrame {
    /// Reference frame of the pose, for supplemental frames also their parent.
    pub frame: String,
    pub pose: Pose,
    /// Empty unless the pose defines a supplemental frame.
    pub name: String,
}

impl PoseInFrame {
    pub fn new(frame: impl Into<String>, pose: Pose) -> Self {
        PoseInFrame { frame: frame.into(), pose, name: String::new() }
    }

    /// Pose that defines the frame `name` placed under `parent`.
    pub fn named(name: impl Into<String>, parent: impl Into<String>, pose: Pose) -> Self {
        PoseInFrame { frame: parent.into(), pose, name: name.into() }
    }

    pub fn in_world(pose: Pose) -> Self {
        PoseInFrame::new(WORLD, pose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};
    use nalgebra::Isometry3;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_pose(rng: &mut StdRng) -> Pose {
        let axis = Vector3::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));
        pose_from_axis_angle(rng.gen_range(-500.0..500.0), rng.gen_range(-500.0..500.0),
                             rng.gen_range(-500.0..500.0), axis, rng.gen_range(-PI..PI))
    }

    #[test]
    fn test_compose_is_associative() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let (a, b, c) = (random_pose(&mut rng), random_pose(&mut rng), random_pose(&mut rng));
            let left = compose(&compose(&a, &b), &c);
            let right = compose(&a, &compose(&b, &c));
            assert!(poses_approx_eq(&left, &right, 1e-9, 1e-6));
        }
    }

    #[test]
    fn test_compose_is_not_commutative() {
        let a = Isometry3::translation(100.0, 0.0, 0.0);
        let b = pose_from_axis_angle(0.0, 0.0, 0.0, Vector3::z(), FRAC_PI_2);
        let ab = compose(&a, &b);
        let ba = compose(&b, &a);
        assert!(!poses_approx_eq(&ab, &ba, 1e-6, 1e-6));
        assert!((ba.translation.vector - Vector3::new(0.0, 100.0, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn test_invert_cancels() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let pose = random_pose(&mut rng);
            let identity = compose(&pose, &invert(&pose));
            assert!(poses_approx_eq(&identity, &Pose::identity(), 1e-9, 1e-6));
        }
    }

    #[test]
    fn test_transform_point() {
        let pose = pose_from_axis_angle(0.0, 0.0, 300.0, Vector3::y(), FRAC_PI_2);
        let point = transform_point(&pose, &Point3::new(0.0, 0.0, 100.0));
        assert!((point - Point3::new(100.0, 0.0, 300.0)).norm() < 1e-9);
    }

    #[test]
    fn test_zero_rotation_on_wire() {
        let proto = pose_to_protobuf(&Isometry3::translation(1.0, 2.0, 3.0));
        assert_eq!(proto, PoseProto { x: 1.0, y: 2.0, z: 3.0, theta: 0.0, rx: 0.0, ry: 0.0, rz: 1.0 });

        // Zero axis decodes as identity rather than failing
        let pose = pose_from_protobuf(&PoseProto { theta: 1.0, ..PoseProto::default() });
        assert_eq!(pose, Pose::identity());
    }

    #[test]
    fn test_wire_form_is_lossless() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let pose = random_pose(&mut rng);
            let back = pose_from_protobuf(&pose_to_protobuf(&pose));
            assert!(poses_approx_eq(&pose, &back, 1e-9, 1e-6));
        }
    }
}
