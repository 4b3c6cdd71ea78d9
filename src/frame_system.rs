//! The frame system is a tree of frames rooted at the `world` frame. Every frame knows
//! only its parent and its pose relative to that parent; the frame system composes these
//! poses to express a pose given in any frame in any other frame.
//!
//! Frames must be added parents first. The tree is not modified afterwards: per-call
//! additions (perceived objects and the like, see [crate::world_state]) go into a clone.

use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt;
use nalgebra::Point3;
use crate::frame::Frame;
use crate::kinematic_traits::{InputsByFrame, Pose, WORLD};

/// Errors of building the frame system or resolving poses in it.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameSystemError {
    /// The frame was added before its parent.
    UnknownParent { frame: String, parent: String },
    DuplicateFrame(String),
    /// Frame without a name, placed under the given parent.
    UnnamedFrame { parent: String },
    InvalidLimits { frame: String, reason: String },
    FrameNotFound(String),
    /// Supplemental frame whose parent cannot be resolved (unknown, self reference or cycle).
    MissingParent { frame: String, missing_parent: String },
    /// Articulated frame on the path received no inputs or a wrong number of them.
    MissingInputs { frame: String, expected: usize, found: usize },
    InputOutOfBounds { frame: String, index: usize, value: f64, min: f64, max: f64 },
}

impl fmt::Display for FrameSystemError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FrameSystemError::UnknownParent { frame, parent } =>
                write!(f, "frame '{}' refers to parent '{}' that is not in the frame system", frame, parent),
            FrameSystemError::DuplicateFrame(name) =>
                write!(f, "frame '{}' already exists", name),
            FrameSystemError::UnnamedFrame { parent } =>
                write!(f, "frame under '{}' has no name", parent),
            FrameSystemError::InvalidLimits { frame, reason } =>
                write!(f, "invalid limits of frame '{}': {}", frame, reason),
            FrameSystemError::FrameNotFound(name) =>
                write!(f, "frame '{}' not found", name),
            FrameSystemError::MissingParent { frame, missing_parent } =>
                write!(f, "parent frame '{}' for frame '{}' is missing", missing_parent, frame),
            FrameSystemError::MissingInputs { frame, expected, found } =>
                write!(f, "frame '{}' needs {} inputs but {} were given", frame, expected, found),
            FrameSystemError::InputOutOfBounds { frame, index, value, min, max } =>
                write!(f, "input {} of frame '{}' is {:.6}, outside of [{:.6}, {:.6}]",
                       index, frame, value, min, max),
        }
    }
}

impl Error for FrameSystemError {}

#[derive(Debug, Clone)]
pub struct FrameSystem {
    name: String,
    /// Frames in insertion order, so parents always come before children.
    frames: Vec<Frame>,
    index: HashMap<String, usize>,
}

impl FrameSystem {
    pub fn new(name: impl Into<String>) -> Self {
        FrameSystem {
            name: name.into(),
            frames: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds the frame under its declared parent that must already be present.
    pub fn add_frame(&mut self, frame: Frame) -> Result<(), FrameSystemError> {
        if frame.name().is_empty() {
            return Err(FrameSystemError::UnnamedFrame { parent: frame.parent().to_string() });
        }
        if frame.name() == WORLD || self.index.contains_key(frame.name()) {
            return Err(FrameSystemError::DuplicateFrame(frame.name().to_string()));
        }
        if !self.contains(frame.parent()) {
            return Err(FrameSystemError::UnknownParent {
                frame: frame.name().to_string(),
                parent: frame.parent().to_string(),
            });
        }
        frame.validate()?;
        self.index.insert(frame.name().to_string(), self.frames.len());
        self.frames.push(frame);
        Ok(())
    }

    /// True for the world frame and every added frame.
    pub fn contains(&self, name: &str) -> bool {
        name == WORLD || self.index.contains_key(name)
    }

    /// The frame with this name. The world frame has no definition and is not returned.
    pub fn frame(&self, name: &str) -> Option<&Frame> {
        self.index.get(name).map(|&i| &self.frames[i])
    }

    /// Names of all frames except world, in insertion order.
    pub fn frame_names(&self) -> Vec<&str> {
        self.frames.iter().map(|frame| frame.name()).collect()
    }

    /// Parent of the frame, None for the world frame.
    pub fn parent(&self, name: &str) -> Result<Option<&str>, FrameSystemError> {
        if name == WORLD {
            return Ok(None);
        }
        self.frame(name)
            .map(|frame| Some(frame.parent()))
            .ok_or_else(|| FrameSystemError::FrameNotFound(name.to_string()))
    }

    /// The frame itself followed by all its ancestors, ending with world.
    pub fn ancestors(&self, name: &str) -> Result<Vec<&str>, FrameSystemError> {
        let mut chain = Vec::new();
        let mut current = match self.index.get_key_value(name) {
            Some((key, _)) => key.as_str(),
            None if name == WORLD => WORLD,
            None => return Err(FrameSystemError::FrameNotFound(name.to_string())),
        };
        loop {
            chain.push(current);
            match self.parent(current)? {
                Some(parent) => current = parent,
                None => return Ok(chain),
            }
        }
    }

    /// Expresses the pose, given in the source frame, in the destination frame.
    ///
    /// The path goes up from the source to the lowest common ancestor, then down to
    /// the destination. Every articulated frame on that path must have inputs.
    pub fn transform_frame(&self, inputs: &InputsByFrame, pose: &Pose,
                           source: &str, destination: &str) -> Result<Pose, FrameSystemError> {
        let source_path = self.ancestors(source)?;
        let destination_path = self.ancestors(destination)?;
        let common = lowest_common_ancestor(&source_path, &destination_path);

        // Upward leg first, then the downward one. Do not reorder, poses do not commute.
        let source_in_common = self.compose_down_to(inputs, &source_path, common)?;
        let destination_in_common = self.compose_down_to(inputs, &destination_path, common)?;
        Ok(destination_in_common.inverse() * source_in_common * pose)
    }

    /// Expresses the point, given in the source frame, in the destination frame.
    pub fn transform_point(&self, inputs: &InputsByFrame, point: &Point3<f64>,
                           source: &str, destination: &str) -> Result<Point3<f64>, FrameSystemError> {
        let pose = self.transform_frame(inputs, &Pose::identity(), source, destination)?;
        Ok(pose.transform_point(point))
    }

    /// Pose of the frame (its origin) in world.
    pub fn pose_in_world(&self, inputs: &InputsByFrame, name: &str) -> Result<Pose, FrameSystemError> {
        self.transform_frame(inputs, &Pose::identity(), name, WORLD)
    }

    /// Composes frames of the path (starting frame first, ancestors following) until
    /// the common ancestor, giving the pose of the starting frame in the ancestor.
    fn compose_down_to(&self, inputs: &InputsByFrame, path: &[&str], common: &str)
                       -> Result<Pose, FrameSystemError> {
        let mut pose = Pose::identity();
        for name in path.iter().take_while(|name| **name != common) {
            let frame = self.frame(name)
                .ok_or_else(|| FrameSystemError::FrameNotFound(name.to_string()))?;
            pose = frame_transform(frame, inputs)? * pose;
        }
        Ok(pose)
    }
}

/// Pose of the frame relative to its parent, taking its inputs from the map.
pub(crate) fn frame_transform(frame: &Frame, inputs: &InputsByFrame) -> Result<Pose, FrameSystemError> {
    if frame.is_static() {
        return frame.transform(&[]);
    }
    match inputs.get(frame.name()) {
        Some(values) => frame.transform(values),
        None => Err(FrameSystemError::MissingInputs {
            frame: frame.name().to_string(),
            expected: frame.dof(),
            found: 0,
        }),
    }
}

/// Both paths end with world so there is always a common ancestor.
fn lowest_common_ancestor<'a>(a: &[&'a str], b: &[&'a str]) -> &'a str {
    let in_b: HashSet<&str> = b.iter().copied().collect();
    a.iter().copied().find(|name| in_b.contains(name)).unwrap_or(WORLD)
}

/// Orders items so that every item comes after its parent. Parents are either already
/// known (`known`) or other items. Input order is kept wherever possible. If some item can
/// never be placed, the first such item in input order is reported as (name, parent).
pub(crate) fn sort_parents_first<T>(
    items: Vec<T>,
    name: impl Fn(&T) -> &str,
    parent: impl Fn(&T) -> &str,
    known: impl Fn(&str) -> bool,
) -> Result<Vec<T>, (String, String)> {
    let mut placed_names: HashSet<String> = HashSet::new();
    let mut remaining: Vec<T> = items;
    let mut sorted: Vec<T> = Vec::with_capacity(remaining.len());

    while !remaining.is_empty() {
        let before = remaining.len();
        let mut still_waiting = Vec::with_capacity(before);
        for item in remaining {
            let parent_name = parent(&item);
            if parent_name != name(&item) && (known(parent_name) || placed_names.contains(parent_name)) {
                placed_names.insert(name(&item).to_string());
                sorted.push(item);
            } else {
                still_waiting.push(item);
            }
        }
        remaining = still_waiting;
        if remaining.len() == before {
            let orphan = &remaining[0];
            return Err((name(orphan).to_string(), parent(orphan).to_string()));
        }
    }
    Ok(sorted)
}
