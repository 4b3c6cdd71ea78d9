//! Wire form of poses, world state and joint positions, as exchanged with the RPC layer.
//! Positions are millimeters, orientation is axis and angle (radians).

use serde::{Deserialize, Serialize};
use nalgebra::Vector3;
use crate::geometry::{Geometry, Shape};
use crate::spatial::{pose_from_protobuf, pose_to_protobuf, PoseInFrame};
use crate::world_state::{GeometriesInFrame, WorldState};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseProto {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub theta: f64,
    pub rx: f64,
    pub ry: f64,
    pub rz: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseInFrameProto {
    pub reference_frame: String,
    pub pose: PoseProto,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeProto {
    Box { dims_mm: [f64; 3] },
    Sphere { radius_mm: f64 },
    Capsule { radius_mm: f64, length_mm: f64 },
    Point,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryProto {
    #[serde(default)]
    pub center: PoseProto,
    #[serde(default)]
    pub label: String,
    #[serde(flatten)]
    pub shape: ShapeProto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometriesInFrameProto {
    pub reference_frame: String,
    pub geometries: Vec<GeometryProto>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldStateProto {
    #[serde(default)]
    pub obstacles: Vec<GeometriesInFrameProto>,
    #[serde(default)]
    pub transforms: Vec<PoseInFrameProto>,
}

/// Joint values of one component: degrees for revolute joints, millimeters for
/// prismatic ones. See [crate::kinematics_impl::KinematicModel::input_from_protobuf].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JointPositions {
    pub values: Vec<f64>,
}

impl From<&PoseInFrame> for PoseInFrameProto {
    fn from(pose: &PoseInFrame) -> Self {
        PoseInFrameProto {
            reference_frame: pose.frame.clone(),
            pose: pose_to_protobuf(&pose.pose),
            name: pose.name.clone(),
        }
    }
}

impl From<&PoseInFrameProto> for PoseInFrame {
    fn from(proto: &PoseInFrameProto) -> Self {
        PoseInFrame {
            frame: proto.reference_frame.clone(),
            pose: pose_from_protobuf(&proto.pose),
            name: proto.name.clone(),
        }
    }
}

impl From<&Geometry> for GeometryProto {
    fn from(geometry: &Geometry) -> Self {
        let shape = match geometry.shape {
            Shape::Box { dims } => ShapeProto::Box { dims_mm: [dims.x, dims.y, dims.z] },
            Shape::Sphere { radius } => ShapeProto::Sphere { radius_mm: radius },
            Shape::Capsule { radius, length } => ShapeProto::Capsule { radius_mm: radius, length_mm: length },
            Shape::Point => ShapeProto::Point,
        };
        GeometryProto {
            center: pose_to_protobuf(&geometry.center),
            label: geometry.label.clone(),
            shape,
        }
    }
}

impl From<&GeometryProto> for Geometry {
    fn from(proto: &GeometryProto) -> Self {
        let shape = match proto.shape {
            ShapeProto::Box { dims_mm } => Shape::Box { dims: Vector3::from(dims_mm) },
            ShapeProto::Sphere { radius_mm } => Shape::Sphere { radius: radius_mm },
            ShapeProto::Capsule { radius_mm, length_mm } => Shape::Capsule { radius: radius_mm, length: length_mm },
            ShapeProto::Point => Shape::Point,
        };
        Geometry::new(proto.label.clone(), pose_from_protobuf(&proto.center), shape)
    }
}

impl From<&GeometriesInFrame> for GeometriesInFrameProto {
    fn from(group: &GeometriesInFrame) -> Self {
        GeometriesInFrameProto {
            reference_frame: group.frame.clone(),
            geometries: group.geometries.iter().map(GeometryProto::from).collect(),
        }
    }
}

impl From<&GeometriesInFrameProto> for GeometriesInFrame {
    fn from(proto: &GeometriesInFrameProto) -> Self {
        GeometriesInFrame::new(proto.reference_frame.clone(),
                               proto.geometries.iter().map(Geometry::from).collect())
    }
}

impl From<&WorldState> for WorldStateProto {
    fn from(state: &WorldState) -> Self {
        WorldStateProto {
            obstacles: state.obstacles.iter().map(GeometriesInFrameProto::from).collect(),
            transforms: state.transforms.iter().map(PoseInFrameProto::from).collect(),
        }
    }
}

impl From<&WorldStateProto> for WorldState {
    fn from(proto: &WorldStateProto) -> Self {
        WorldState::new(
            proto.obstacles.iter().map(GeometriesInFrame::from).collect(),
            proto.transforms.iter().map(PoseInFrame::from).collect(),
        )
    }
}
