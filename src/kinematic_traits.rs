extern crate nalgebra as na;

use std::collections::HashMap;
use na::Isometry3;
use crate::frame::Frame;
use crate::frame_system::FrameSystemError;

/// Pose is used for the pose of every frame, relative to some other frame. It contains both
/// Cartesian position (millimeters) and rotation quaternion.
/// ```
/// extern crate nalgebra as na;
/// use na::{Isometry3, Translation3, UnitQuaternion, Vector3};
///
/// type Pose = Isometry3<f64>;
///
/// let translation = Translation3::new(500.0, 0.0, 300.0);
/// let rotation = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.5);
/// let transform = Pose::from_parts(translation, rotation);
/// ```
pub type Pose = Isometry3<f64>;

/// Input values of the articulated frame or of the whole kinematic chain. Revolute joints
/// take radians, prismatic joints take millimeters.
pub type Inputs = Vec<f64>;

/// Inputs for every articulated frame of the frame system, keyed by frame name.
/// Static frames do not need an entry.
pub type InputsByFrame = HashMap<String, Inputs>;

/// Name of the root frame of every frame system.
pub const WORLD: &str = "world";

/// Forward kinematics of an ordered chain of frames. Inverse kinematics is built on top
/// of this trait (see [crate::ik]) so anything that can be composed frame by frame can
/// also be solved.
pub trait Kinematics: Send + Sync {
    /// The frames of the chain, from the one attached to the solving frame to the tip.
    fn frames(&self) -> &[Frame];

    /// Total number of inputs, sum of per-frame degrees of freedom.
    fn dof(&self) -> usize {
        self.frames().iter().map(|frame| frame.dof()).sum()
    }

    /// Pose of the chain tip relative to the frame the chain is attached to.
    fn forward(&self, inputs: &[f64]) -> Result<Pose, FrameSystemError> {
        let poses = self.forward_with_frame_poses(inputs)?;
        Ok(poses.last().copied().unwrap_or_else(Pose::identity))
    }

    /// Poses of every frame of the chain, in chain order, relative to the frame the
    /// chain is attached to.
    fn forward_with_frame_poses(&self, inputs: &[f64]) -> Result<Vec<Pose>, FrameSystemError>;
}
