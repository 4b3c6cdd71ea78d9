//! Per-request additions to the frame system: obstacles the motion must avoid and
//! supplemental frames (perceived objects and the like) the request may refer to.

use tracing::debug;
use crate::frame::Frame;
use crate::frame_system::{sort_parents_first, FrameSystem, FrameSystemError};
use crate::geometry::Geometry;
use crate::kinematic_traits::{InputsByFrame, Pose};
use crate::spatial::PoseInFrame;

/// Geometries expressed in the same reference frame.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometriesInFrame {
    pub frame: String,
    pub geometries: Vec<Geometry>,
}

impl GeometriesInFrame {
    pub fn new(frame: impl Into<String>, geometries: Vec<Geometry>) -> Self {
        GeometriesInFrame { frame: frame.into(), geometries }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorldState {
    pub obstacles: Vec<GeometriesInFrame>,
    /// Named poses, each defines a static frame under its reference frame.
    pub transforms: Vec<PoseInFrame>,
}

impl WorldState {
    pub fn new(obstacles: Vec<GeometriesInFrame>, transforms: Vec<PoseInFrame>) -> Self {
        WorldState { obstacles, transforms }
    }

    pub fn from_transforms(transforms: Vec<PoseInFrame>) -> Self {
        WorldState { obstacles: Vec::new(), transforms }
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.iter().all(|group| group.geometries.is_empty()) && self.transforms.is_empty()
    }

    /// Copy of the frame system extended with the supplemental frames. Transforms may come
    /// in any order as long as every parent resolves; if some parent never does, nothing
    /// is merged and the first such transform (in the given order) is reported.
    pub fn merge_into(&self, frame_system: &FrameSystem) -> Result<FrameSystem, FrameSystemError> {
        let ordered = sort_parents_first(
            self.transforms.iter().collect(),
            |transform| transform.name.as_str(),
            |transform| transform.frame.as_str(),
            |name| frame_system.contains(name),
        ).map_err(|(frame, missing_parent)| FrameSystemError::MissingParent { frame, missing_parent })?;

        let mut merged = frame_system.clone();
        for transform in ordered {
            merged.add_frame(Frame::new_static(&transform.name, &transform.frame, transform.pose))?;
        }
        debug!("Merged {} supplemental frames into '{}'", self.transforms.len(), frame_system.name());
        Ok(merged)
    }

    /// All obstacles with centers expressed in the given frame. The frame system must
    /// already contain the supplemental frames (see [WorldState::merge_into]).
    pub fn obstacles_in_frame(&self, frame_system: &FrameSystem, inputs: &InputsByFrame,
                              frame: &str) -> Result<Vec<Geometry>, FrameSystemError> {
        let mut obstacles = Vec::new();
        for group in &self.obstacles {
            if group.geometries.is_empty() {
                continue;
            }
            let group_pose = frame_system.transform_frame(inputs, &Pose::identity(), &group.frame, frame)?;
            obstacles.extend(group.geometries.iter().map(|geometry| geometry.transformed(&group_pose)));
        }
        Ok(obstacles)
    }
}
