//! Reference frame system, kinematic models and collision-aware motion resolution for
//! robots assembled from components (arms, gantries, grippers, cameras).
//!
//! Every component is mounted somewhere in a tree of named frames rooted at `world`.
//! Articulated frames (joints) take inputs, so the pose of any frame depends on the current
//! joint positions of the components above it. On top of this frame system the crate offers:
//!
//! - Pose algebra and conversions to the wire form (millimeters, axis and angle).
//! - Merging of the caller-supplied world state (extra frames and obstacles) into a
//!   per-call copy of the frame system.
//! - Forward kinematics of any chain of frames, Jacobian, and numerical inverse kinematics
//!   with joint limits and collision constraints.
//! - The motion service that moves a component (or the chain that carries it) to the pose
//!   expressed in any frame, and reports the pose of any component in any frame.
//!
//! # Units
//!
//! Positions are millimeters. Revolute inputs are radians internally and degrees on
//! the wire ([proto::JointPositions]); prismatic inputs are millimeters everywhere.
//!
//! # Example
//!
//! ```
//! use nalgebra::{Isometry3, Vector3};
//! use rs_frame_motion::frame::{Frame, Limit};
//! use rs_frame_motion::frame_system::FrameSystem;
//! use rs_frame_motion::kinematic_traits::{InputsByFrame, Pose, WORLD};
//!
//! let mut frame_system = FrameSystem::new("demo");
//! frame_system.add_frame(Frame::prismatic("rail", WORLD, Pose::identity(),
//!                                         Vector3::x_axis(), Limit::new(0.0, 1000.0))).unwrap();
//! frame_system.add_frame(Frame::new_static("camera", "rail",
//!                                          Isometry3::translation(0.0, 0.0, 200.0))).unwrap();
//!
//! let mut inputs = InputsByFrame::new();
//! inputs.insert("rail".to_string(), vec![300.0]);
//! let camera = frame_system.pose_in_world(&inputs, "camera").unwrap();
//! assert_eq!(camera.translation.vector, Vector3::new(300.0, 0.0, 200.0));
//! ```

pub mod kinematic_traits;
pub mod frame;
pub mod geometry;
pub mod frame_system;
pub mod spatial;
pub mod proto;
pub mod world_state;

pub mod kinematics_impl;
pub mod constraints;
pub mod collisions;
pub mod jakobian;
pub mod ik;

pub mod context;
pub mod components;
pub mod registry;
pub mod fake;
pub mod robot;
pub mod motion;

#[path = "utils/utils.rs"]
pub mod utils;

#[cfg(feature = "allow_filesystem")]
pub mod config;
#[cfg(feature = "allow_filesystem")]
pub mod config_error;

#[cfg(test)]
#[cfg(feature = "allow_filesystem")]
mod tests;
