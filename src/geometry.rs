use nalgebra::{Isometry3, Vector3};
use parry3d::shape::SharedShape;
use crate::kinematic_traits::Pose;

/// Radius of the ball standing for a point geometry, parry3d needs some volume.
const POINT_RADIUS: f32 = 1e-3;

/// Shape of the geometry. All dimensions are millimeters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Rectangular prism, full edge lengths along x, y and z.
    Box { dims: Vector3<f64> },
    Sphere { radius: f64 },
    /// Capsule along z; the length includes both end caps.
    Capsule { radius: f64, length: f64 },
    Point,
}

/// Struct representing a labelled shape placed relative to some frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub label: String,
    /// Pose of the shape center, relative to the frame the geometry belongs to.
    pub center: Pose,
    pub shape: Shape,
}

impl Geometry {
    pub fn new(label: impl Into<String>, center: Pose, shape: Shape) -> Self {
        Geometry { label: label.into(), center, shape }
    }

    /// Box centered at the given pose.
    pub fn new_box(label: impl Into<String>, center: Pose, dims: Vector3<f64>) -> Self {
        Geometry::new(label, center, Shape::Box { dims })
    }

    pub fn new_sphere(label: impl Into<String>, center: Pose, radius: f64) -> Self {
        Geometry::new(label, center, Shape::Sphere { radius })
    }

    /// Same geometry, expressed in the frame where the owning frame has the given pose.
    pub fn transformed(&self, frame_pose: &Pose) -> Geometry {
        Geometry {
            label: self.label.clone(),
            center: frame_pose * self.center,
            shape: self.shape,
        }
    }

    /// Collision shape for parry3d (single precision, centered at the origin).
    pub(crate) fn shared_shape(&self) -> SharedShape {
        match self.shape {
            Shape::Box { dims } => {
                let half = (dims / 2.0).cast::<f32>();
                SharedShape::cuboid(half.x, half.y, half.z)
            }
            Shape::Sphere { radius } => SharedShape::ball(radius as f32),
            Shape::Capsule { radius, length } => {
                let half_height = (length / 2.0 - radius).max(0.0);
                SharedShape::capsule_z(half_height as f32, radius as f32)
            }
            Shape::Point => SharedShape::ball(POINT_RADIUS),
        }
    }

    /// Pose of the shape center in single precision, as parry3d needs it.
    pub(crate) fn center_f32(&self) -> Isometry3<f32> {
        self.center.cast::<f32>()
    }
}
