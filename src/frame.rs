//! Supports concept of the frame that is common in robotics.
//! A frame is a named coordinate system that knows its pose relative to its parent frame.
//! Static frames (mounting offsets, perceived objects, grippers) always have the same pose,
//! articulated frames (joints of arms and gantries) take input values, one per degree of
//! freedom, and only then produce the pose.
//!
//! The pose of the frame relative to its parent is `offset * motion(inputs)`: the offset
//! places the joint, the motion is the rotation (revolute) or translation (prismatic)
//! along the joint axis.

use nalgebra::{Isometry3, Translation3, Unit, UnitQuaternion, Vector3};
use crate::frame_system::FrameSystemError;
use crate::geometry::Geometry;
use crate::kinematic_traits::Pose;

/// Tolerance when checking inputs against limits. Conversions between wire units
/// (degrees) and radians may move the value that was exactly at the limit very slightly.
const LIMIT_TOLERANCE: f64 = 1e-9;

/// Range of the single degree of freedom, radians for revolute and millimeters for
/// prismatic joints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limit {
    pub min: f64,
    pub max: f64,
}

impl Limit {
    pub fn new(min: f64, max: f64) -> Self {
        Limit { min, max }
    }

    /// Full turn in both directions, used for revolute joints declared without limits.
    pub fn full_turn() -> Self {
        Limit::new(-2.0 * std::f64::consts::PI, 2.0 * std::f64::consts::PI)
    }

    pub fn is_valid(&self) -> bool {
        !self.min.is_nan() && !self.max.is_nan() && self.min <= self.max
    }

    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min - LIMIT_TOLERANCE && value <= self.max + LIMIT_TOLERANCE
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    /// Finite range to sample from. Unbounded sides are replaced by a full turn.
    pub(crate) fn sampling_range(&self) -> (f64, f64) {
        let turn = 2.0 * std::f64::consts::PI;
        let min = if self.min.is_finite() { self.min } else { -turn };
        let max = if self.max.is_finite() { self.max } else { turn };
        (min, max.max(min))
    }
}

/// How the frame moves relative to the offset from its parent.
#[derive(Debug, Clone, PartialEq)]
pub enum Joint {
    Fixed,
    /// Rotation around the axis, input in radians
    Revolute { axis: Unit<Vector3<f64>> },
    /// Translation along the axis, input in millimeters
    Prismatic { axis: Unit<Vector3<f64>> },
}

/// Named node of the frame system.
#[derive(Debug, Clone)]
pub struct Frame {
    name: String,
    parent: String,
    offset: Pose,
    joint: Joint,
    limits: Vec<Limit>,
    geometry: Option<Geometry>,
}

impl Frame {
    /// Frame that does not move relative to its parent.
    pub fn new_static(name: impl Into<String>, parent: impl Into<String>, offset: Pose) -> Self {
        Frame {
            name: name.into(),
            parent: parent.into(),
            offset,
            joint: Joint::Fixed,
            limits: Vec::new(),
            geometry: None,
        }
    }

    /// Frame rotating around the given axis (expressed in the offset frame).
    pub fn revolute(name: impl Into<String>, parent: impl Into<String>, offset: Pose,
                    axis: Unit<Vector3<f64>>, limit: Limit) -> Self {
        Frame {
            joint: Joint::Revolute { axis },
            limits: vec![limit],
            ..Frame::new_static(name, parent, offset)
        }
    }

    /// Frame sliding along the given axis (expressed in the offset frame).
    pub fn prismatic(name: impl Into<String>, parent: impl Into<String>, offset: Pose,
                     axis: Unit<Vector3<f64>>, limit: Limit) -> Self {
        Frame {
            joint: Joint::Prismatic { axis },
            limits: vec![limit],
            ..Frame::new_static(name, parent, offset)
        }
    }

    /// Attach geometry (expressed in this frame) that is checked for collisions.
    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> &str {
        &self.parent
    }

    pub fn offset(&self) -> &Pose {
        &self.offset
    }

    pub fn joint(&self) -> &Joint {
        &self.joint
    }

    pub fn limits(&self) -> &[Limit] {
        &self.limits
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }

    /// Number of inputs this frame takes.
    pub fn dof(&self) -> usize {
        self.limits.len()
    }

    pub fn is_static(&self) -> bool {
        self.dof() == 0
    }

    /// Checks the frame definition itself (limits are well formed and match the joint).
    pub(crate) fn validate(&self) -> Result<(), FrameSystemError> {
        let expected = match self.joint {
            Joint::Fixed => 0,
            Joint::Revolute { .. } | Joint::Prismatic { .. } => 1,
        };
        if self.limits.len() != expected {
            return Err(FrameSystemError::InvalidLimits {
                frame: self.name.clone(),
                reason: format!("{} limits given for a joint with {} degrees of freedom",
                                self.limits.len(), expected),
            });
        }
        if let Some(bad) = self.limits.iter().find(|limit| !limit.is_valid()) {
            return Err(FrameSystemError::InvalidLimits {
                frame: self.name.clone(),
                reason: format!("min {} is not below max {}", bad.min, bad.max),
            });
        }
        Ok(())
    }

    /// Checks that exactly `dof` inputs are given and all are within limits.
    pub fn validate_inputs(&self, inputs: &[f64]) -> Result<(), FrameSystemError> {
        if inputs.len() != self.dof() {
            return Err(FrameSystemError::MissingInputs {
                frame: self.name.clone(),
                expected: self.dof(),
                found: inputs.len(),
            });
        }
        for (index, (value, limit)) in inputs.iter().zip(self.limits.iter()).enumerate() {
            if !limit.contains(*value) {
                return Err(FrameSystemError::InputOutOfBounds {
                    frame: self.name.clone(),
                    index,
                    value: *value,
                    min: limit.min,
                    max: limit.max,
                });
            }
        }
        Ok(())
    }

    /// Pose of this frame relative to its parent for the given inputs.
    pub fn transform(&self, inputs: &[f64]) -> Result<Pose, FrameSystemError> {
        self.validate_inputs(inputs)?;
        Ok(self.transform_unchecked(inputs))
    }

    /// Same as transform but the inputs are assumed to be already validated.
    pub(crate) fn transform_unchecked(&self, inputs: &[f64]) -> Pose {
        match &self.joint {
            Joint::Fixed => self.offset,
            Joint::Revolute { axis } => {
                self.offset * Isometry3::from_parts(
                    Translation3::identity(), UnitQuaternion::from_axis_angle(axis, inputs[0]))
            }
            Joint::Prismatic { axis } => {
                self.offset * Isometry3::from_parts(
                    Translation3::from(axis.into_inner() * inputs[0]), UnitQuaternion::identity())
            }
        }
    }

    /// Static copy of this frame, frozen at the given inputs. Used when the frame is
    /// part of the chain being solved but its own inputs must not change.
    pub fn fixed_at(&self, inputs: &[f64]) -> Result<Frame, FrameSystemError> {
        let offset = self.transform(inputs)?;
        Ok(Frame {
            offset,
            joint: Joint::Fixed,
            limits: Vec::new(),
            ..self.clone()
        })
    }
}
