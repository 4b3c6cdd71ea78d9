//! Supports reading the robot description from YAML file (optional)
//!
//! The robot is a list of parts. Every part is mounted to its parent part (or to the world)
//! and may have a kinematic chain made of links. See [RobotConfig::from_yaml_file] for
//! the format.

use std::path::Path;
use nalgebra::{Translation3, Unit, UnitQuaternion, Vector3};
use serde::Deserialize;
use serde_saphyr::Options;
use tracing::info;

use crate::components::component;
use crate::config_error::ConfigError;
use crate::fake::{FakeArm, FakeGantry, FakeGripper};
use crate::frame::{Frame, Limit};
use crate::frame_system::{sort_parents_first, FrameSystem, FrameSystemError};
use crate::geometry::Geometry;
use crate::kinematic_traits::{Kinematics, Pose, WORLD};
use crate::kinematics_impl::KinematicModel;
use crate::proto::{GeometryProto, JointPositions};
use crate::registry::ResourceRegistry;
use crate::robot::{link_frame_name, origin_frame_name, Robot};

fn default_name() -> String { "robot".to_string() }
fn default_parent() -> String { WORLD.to_string() }
fn default_axis() -> [f64; 3] { [0.0, 0.0, 1.0] }

/// Orientation as axis and angle (radians, `deg(...)` accepted).
#[derive(Debug, Clone, Deserialize)]
pub struct OrientationConfig {
    #[serde(default = "default_axis")]
    pub axis: [f64; 3],
    pub angle: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointKind {
    #[default]
    Fixed,
    Revolute,
    Prismatic,
}

/// Which simulated component stands for the part.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartKind {
    Arm,
    Gantry,
    Gripper,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkConfig {
    pub name: String,
    #[serde(default)]
    pub joint: JointKind,
    /// Joint axis, in the frame placed by the translation and orientation of this link.
    #[serde(default = "default_axis")]
    pub axis: [f64; 3],
    /// Radians for revolute, millimeters for prismatic joints.
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    /// Offset from the previous link (millimeters).
    #[serde(default)]
    pub translation: [f64; 3],
    #[serde(default)]
    pub orientation: Option<OrientationConfig>,
    #[serde(default)]
    pub geometry: Option<GeometryProto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PartConfig {
    pub name: String,
    #[serde(default = "default_parent")]
    pub parent: String,
    /// Mount position relative to the parent part frame (millimeters).
    #[serde(default)]
    pub translation: [f64; 3],
    #[serde(default)]
    pub orientation: Option<OrientationConfig>,
    #[serde(default)]
    pub links: Vec<LinkConfig>,
    #[serde(default)]
    pub kind: Option<PartKind>,
    /// Initial joint positions of the simulated component (degrees, millimeters).
    #[serde(default)]
    pub initial: Vec<f64>,
    #[serde(default)]
    pub geometry: Option<GeometryProto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RobotConfig {
    #[serde(default = "default_name")]
    pub name: String,
    pub parts: Vec<PartConfig>,
}

impl RobotConfig {
    /// Read the robot description from YAML file. YAML file like this is supported:
    /// ```yaml
    /// name: arm_on_gantry
    /// parts:
    ///   - name: gantry1
    ///     kind: gantry
    ///     links:
    ///       - { name: x, joint: prismatic, axis: [1, 0, 0], min: 0, max: 1000 }
    ///     initial: [1.2]
    ///   - name: arm1
    ///     parent: gantry1
    ///     translation: [500, 0, 300]
    ///     links:
    ///       - { name: base, joint: revolute, min: deg(-180), max: deg(180) }
    ///       - { name: upper, translation: [0, 0, 300] }
    ///   - name: gripper1
    ///     parent: arm1
    ///     orientation: { axis: [0, 1, 0], angle: deg(90) }
    /// ```
    /// Parts may be listed in any order. The kind is optional: parts with revolute joints
    /// are arms, with prismatic joints only gantries, and without joints grippers.
    ///
    /// YAML extension to parse the deg(angle) function is supported (serde_saphyr).
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        RobotConfig::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        serde_saphyr::from_str_with_options(
            contents,
            Options { angle_conversions: true, ..Default::default() }
        ).map_err(|e| ConfigError::ParseError(format!("{}", e)))
    }

    /// Builds the static frame system. Parts are added parents first; a part whose parent
    /// is neither the world nor another part is an error.
    pub fn build_frame_system(&self) -> Result<FrameSystem, ConfigError> {
        let parts = sort_parents_first(
            self.parts.iter().collect(),
            |part| part.name.as_str(),
            |part| part.parent.as_str(),
            |name| name == WORLD,
        ).map_err(|(frame, parent)| FrameSystemError::UnknownParent { frame, parent })?;

        let mut frame_system = FrameSystem::new(&self.name);
        for part in parts {
            part.add_frames(&mut frame_system)?;
        }
        info!("Frame system '{}' built with {} frames", self.name, frame_system.frame_names().len());
        Ok(frame_system)
    }

    /// Robot with a simulated component for every part.
    pub fn build_simulated_robot(&self) -> Result<Robot, ConfigError> {
        let frame_system = self.build_frame_system()?;
        let mut registry = ResourceRegistry::new();
        for part in &self.parts {
            let kind = part.kind.unwrap_or_else(|| part.derived_kind());
            let simulated = match kind {
                PartKind::Gripper => component(FakeGripper::new()),
                PartKind::Arm | PartKind::Gantry => {
                    let model = KinematicModel::from_frame_system(
                        &frame_system, &part.name, &origin_frame_name(&part.name), &part.name)?;
                    let inputs = if part.initial.is_empty() {
                        vec![0.0; model.dof()]
                    } else {
                        model.input_from_protobuf(&JointPositions { values: part.initial.clone() })?
                    };
                    if kind == PartKind::Arm {
                        component(FakeArm::at(model, &inputs))
                    } else {
                        component(FakeGantry::at(model, &inputs))
                    }
                }
            };
            registry.register(part.name.clone(), simulated);
        }
        Ok(Robot::new(frame_system, registry))
    }
}

impl PartConfig {
    fn invalid(&self, reason: impl Into<String>) -> ConfigError {
        ConfigError::InvalidPart { part: self.name.clone(), reason: reason.into() }
    }

    fn derived_kind(&self) -> PartKind {
        if self.links.iter().any(|link| link.joint == JointKind::Revolute) {
            PartKind::Arm
        } else if self.links.iter().any(|link| link.joint == JointKind::Prismatic) {
            PartKind::Gantry
        } else {
            PartKind::Gripper
        }
    }

    /// Adds `<name>_origin`, one frame per link and the part frame itself.
    fn add_frames(&self, frame_system: &mut FrameSystem) -> Result<(), ConfigError> {
        if self.name.is_empty() || self.name.contains(':') {
            return Err(self.invalid("part name must be non-empty and must not contain ':'"));
        }
        let origin = origin_frame_name(&self.name);
        frame_system.add_frame(Frame::new_static(
            &origin, &self.parent, pose(self.translation, self.orientation.as_ref())))?;

        let mut previous = origin;
        for link in &self.links {
            let name = link_frame_name(&self.name, &link.name);
            let mut frame = self.link_frame(link, &name, &previous)?;
            if let Some(geometry) = &link.geometry {
                frame = frame.with_geometry(Geometry::from(geometry));
            }
            frame_system.add_frame(frame)?;
            previous = name;
        }

        let mut frame = Frame::new_static(&self.name, &previous, Pose::identity());
        if let Some(geometry) = &self.geometry {
            frame = frame.with_geometry(Geometry::from(geometry));
        }
        frame_system.add_frame(frame)?;
        Ok(())
    }

    fn link_frame(&self, link: &LinkConfig, name: &str, parent: &str) -> Result<Frame, ConfigError> {
        let offset = pose(link.translation, link.orientation.as_ref());
        let axis = || Unit::try_new(Vector3::from(link.axis), 1e-9)
            .ok_or_else(|| self.invalid(format!("link '{}' has zero axis", link.name)));
        Ok(match link.joint {
            JointKind::Fixed => Frame::new_static(name, parent, offset),
            JointKind::Revolute => {
                let full = Limit::full_turn();
                let limit = Limit::new(link.min.unwrap_or(full.min), link.max.unwrap_or(full.max));
                Frame::revolute(name, parent, offset, axis()?, limit)
            }
            JointKind::Prismatic => match (link.min, link.max) {
                (Some(min), Some(max)) => Frame::prismatic(name, parent, offset, axis()?, Limit::new(min, max)),
                _ => return Err(self.invalid(format!("prismatic link '{}' needs min and max", link.name))),
            },
        })
    }
}

fn pose(translation: [f64; 3], orientation: Option<&OrientationConfig>) -> Pose {
    let rotation = orientation
        .and_then(|o| Unit::try_new(Vector3::from(o.axis), 1e-9).map(|axis| (axis, o.angle)))
        .map(|(axis, angle)| UnitQuaternion::from_axis_angle(&axis, angle))
        .unwrap_or_else(UnitQuaternion::identity);
    Pose::from_parts(Translation3::from(Vector3::from(translation)), rotation)
}
