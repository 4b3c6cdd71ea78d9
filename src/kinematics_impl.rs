use std::collections::HashMap;
use crate::constraints::Constraints;
use crate::context::CallContext;
use crate::frame::{Frame, Joint};
use crate::frame_system::{FrameSystem, FrameSystemError};
use crate::ik::{self, IkError, SolverConfig};
use crate::kinematic_traits::{Inputs, InputsByFrame, Kinematics, Pose};
use crate::proto::JointPositions;

/// Kinematic chain of one component: the ordered frames from the one attached to the base
/// frame up to the component frame. Keeps its own copies of the frame definitions.
#[derive(Debug, Clone)]
pub struct KinematicModel {
    component: String,
    /// Frame the chain is attached to, the parent of the first chain frame.
    base: String,
    frames: Vec<Frame>,
}

impl KinematicModel {
    /// Creates the model from frames in chain order. Every frame must be the child of
    /// the previous one, the first one the child of `base`.
    pub fn new(component: impl Into<String>, base: impl Into<String>, frames: Vec<Frame>)
               -> Result<Self, FrameSystemError> {
        let model = KinematicModel { component: component.into(), base: base.into(), frames };
        let mut parent = model.base.as_str();
        for frame in &model.frames {
            if frame.parent() != parent {
                return Err(FrameSystemError::UnknownParent {
                    frame: frame.name().to_string(),
                    parent: frame.parent().to_string(),
                });
            }
            frame.validate()?;
            parent = frame.name();
        }
        Ok(model)
    }

    /// Extracts the chain between `base` (exclusive) and `tip` (inclusive) from the
    /// frame system. `base` must be an ancestor of `tip`.
    pub fn from_frame_system(frame_system: &FrameSystem, component: &str, base: &str, tip: &str)
                             -> Result<Self, FrameSystemError> {
        let ancestors = frame_system.ancestors(tip)?;
        let position = ancestors.iter().position(|name| *name == base)
            .ok_or_else(|| FrameSystemError::FrameNotFound(base.to_string()))?;
        let mut frames = Vec::with_capacity(position);
        for name in ancestors[..position].iter().rev() {
            let frame = frame_system.frame(name)
                .ok_or_else(|| FrameSystemError::FrameNotFound(name.to_string()))?;
            frames.push(frame.clone());
        }
        KinematicModel::new(component, base, frames)
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Last frame of the chain, the base if the chain is empty.
    pub fn tip(&self) -> &str {
        self.frames.last().map(|frame| frame.name()).unwrap_or(self.base.as_str())
    }

    /// Same chain, continued with further frames. The tail is appended as is, so
    /// articulated frames that must not move should be frozen first (see [Frame::fixed_at]).
    pub fn with_tail(&self, tail: Vec<Frame>) -> Result<Self, FrameSystemError> {
        let mut frames = self.frames.clone();
        frames.extend(tail);
        KinematicModel::new(self.component.clone(), self.base.clone(), frames)
    }

    /// Splits the flat input vector into inputs of each articulated frame.
    pub fn inputs_by_frame(&self, inputs: &[f64]) -> Result<InputsByFrame, FrameSystemError> {
        self.check_length(inputs.len())?;
        let mut by_frame = HashMap::new();
        let mut offset = 0;
        for frame in self.frames.iter().filter(|frame| !frame.is_static()) {
            by_frame.insert(frame.name().to_string(), inputs[offset..offset + frame.dof()].to_vec());
            offset += frame.dof();
        }
        Ok(by_frame)
    }

    /// Collects the flat input vector from per-frame inputs.
    pub fn flatten_inputs(&self, by_frame: &InputsByFrame) -> Result<Inputs, FrameSystemError> {
        let mut inputs = Vec::with_capacity(self.dof());
        for frame in self.frames.iter().filter(|frame| !frame.is_static()) {
            let values = by_frame.get(frame.name()).map(|v| v.as_slice()).unwrap_or(&[]);
            if values.len() != frame.dof() {
                return Err(FrameSystemError::MissingInputs {
                    frame: frame.name().to_string(),
                    expected: frame.dof(),
                    found: values.len(),
                });
            }
            inputs.extend_from_slice(values);
        }
        Ok(inputs)
    }

    /// Converts wire joint positions into inputs: degrees to radians for revolute joints,
    /// millimeters are taken as they are.
    pub fn input_from_protobuf(&self, positions: &JointPositions) -> Result<Inputs, FrameSystemError> {
        self.check_length(positions.values.len())?;
        Ok(self.joints().zip(positions.values.iter())
            .map(|(joint, value)| match joint {
                Joint::Revolute { .. } => value.to_radians(),
                _ => *value,
            })
            .collect())
    }

    /// Converts inputs into wire joint positions, see [KinematicModel::input_from_protobuf].
    pub fn protobuf_from_input(&self, inputs: &[f64]) -> Result<JointPositions, FrameSystemError> {
        self.check_length(inputs.len())?;
        let values = self.joints().zip(inputs.iter())
            .map(|(joint, value)| match joint {
                Joint::Revolute { .. } => value.to_degrees(),
                _ => *value,
            })
            .collect();
        Ok(JointPositions { values })
    }

    /// Solves inverse kinematics for the target pose of the tip, expressed in the base frame.
    pub fn inverse(&self, target: &Pose, seed: &[f64], constraints: &Constraints,
                   config: &SolverConfig, ctx: &CallContext) -> Result<Inputs, IkError> {
        ik::inverse(self, target, seed, constraints, config, ctx)
    }

    /// Joint of every input, in input order.
    fn joints(&self) -> impl Iterator<Item = &Joint> {
        self.frames.iter().flat_map(|frame| std::iter::repeat(frame.joint()).take(frame.dof()))
    }

    fn check_length(&self, found: usize) -> Result<(), FrameSystemError> {
        if found != self.dof() {
            return Err(FrameSystemError::MissingInputs {
                frame: self.component.clone(),
                expected: self.dof(),
                found,
            });
        }
        Ok(())
    }
}

impl Kinematics for KinematicModel {
    fn frames(&self) -> &[Frame] {
        &self.frames
    }

    fn forward_with_frame_poses(&self, inputs: &[f64]) -> Result<Vec<Pose>, FrameSystemError> {
        self.check_length(inputs.len())?;
        let mut poses = Vec::with_capacity(self.frames.len());
        let mut pose = Pose::identity();
        let mut offset = 0;
        for frame in &self.frames {
            pose *= frame.transform(&inputs[offset..offset + frame.dof()])?;
            offset += frame.dof();
            poses.push(pose);
        }
        Ok(poses)
    }
}
