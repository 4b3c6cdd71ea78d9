//! Implements collision detection between a kinematic chain and static obstacles

use std::fmt;
use nalgebra::{Isometry3, Point3};
use parry3d::shape::SharedShape;
use rayon::prelude::{IntoParallelRefIterator, ParallelIterator};
use crate::frame_system::FrameSystemError;
use crate::geometry::Geometry;
use crate::kinematic_traits::{Kinematics, Pose};

/// Segments shorter than this (mm) do not produce a link capsule.
const MIN_LINK_LENGTH: f64 = 1e-6;

/// Chain part intersecting an obstacle.
#[derive(Debug, Clone, PartialEq)]
pub struct Collision {
    /// Frame of the chain: the link ending at its origin, or geometry attached to it.
    pub link: String,
    /// Label of the obstacle
    pub obstacle: String,
}

impl fmt::Display for Collision {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "'{}' collides with '{}'", self.link, self.obstacle)
    }
}

/// Shape placed in the chain base frame.
#[derive(Clone)]
struct Body {
    label: String,
    pose: Isometry3<f32>,
    shape: SharedShape,
}

/// Struct representing a collision task for detecting collisions
/// between the chain part and the obstacle.
struct CollisionTask<'a> {
    link: &'a Body,
    obstacle: &'a Body,
}

/// Obstacles the chain must not touch, all expressed in the frame the chain is attached to.
#[derive(Clone)]
pub struct CollisionEnvironment {
    obstacles: Vec<Body>,
    /// Radius of the capsules representing links between consecutive frames.
    link_radius: f64,
}

impl CollisionEnvironment {
    pub fn empty() -> Self {
        CollisionEnvironment { obstacles: Vec::new(), link_radius: 0.0 }
    }

    pub fn new(obstacles: &[Geometry], link_radius: f64) -> Self {
        let obstacles = obstacles.iter().map(|geometry| Body {
            label: geometry.label.clone(),
            pose: geometry.center_f32(),
            shape: geometry.shared_shape(),
        }).collect();
        CollisionEnvironment { obstacles, link_radius }
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    /// All collisions of the chain at the given inputs.
    pub fn collision_details(&self, kinematics: &dyn Kinematics, inputs: &[f64])
                             -> Result<Vec<Collision>, FrameSystemError> {
        self.detect(kinematics, inputs, false)
    }

    /// Returns true if any part of the chain intersects any obstacle.
    pub fn collides(&self, kinematics: &dyn Kinematics, inputs: &[f64]) -> Result<bool, FrameSystemError> {
        Ok(!self.detect(kinematics, inputs, true)?.is_empty())
    }
}

impl CollisionEnvironment {
    fn detect(&self, kinematics: &dyn Kinematics, inputs: &[f64], first_collision_only: bool)
              -> Result<Vec<Collision>, FrameSystemError> {
        if self.obstacles.is_empty() {
            return Ok(Vec::new());
        }
        let frame_poses = kinematics.forward_with_frame_poses(inputs)?;
        let links = self.chain_bodies(kinematics, &frame_poses);

        let tasks: Vec<CollisionTask> = links.iter()
            .flat_map(|link| self.obstacles.iter().map(move |obstacle| CollisionTask { link, obstacle }))
            .collect();
        Ok(process_collision_tasks(tasks, first_collision_only))
    }

    /// Capsules between consecutive frame origins (starting at the chain base origin),
    /// plus the geometry attached to chain frames.
    fn chain_bodies(&self, kinematics: &dyn Kinematics, frame_poses: &[Pose]) -> Vec<Body> {
        let mut bodies = Vec::new();
        let mut previous = Point3::origin();
        for (frame, pose) in kinematics.frames().iter().zip(frame_poses) {
            let origin = Point3::from(pose.translation.vector);
            if (origin - previous).norm() > MIN_LINK_LENGTH && self.link_radius > 0.0 {
                bodies.push(Body {
                    label: frame.name().to_string(),
                    pose: Isometry3::identity(),
                    shape: SharedShape::capsule(previous.cast::<f32>(), origin.cast::<f32>(),
                                                self.link_radius as f32),
                });
            }
            if let Some(geometry) = frame.geometry() {
                let placed = geometry.transformed(pose);
                bodies.push(Body {
                    label: frame.name().to_string(),
                    pose: placed.center_f32(),
                    shape: placed.shared_shape(),
                });
            }
            previous = origin;
        }
        bodies
    }
}

/// Parallel version with Rayon. Shape pairs parry3d cannot test are reported as collisions.
fn process_collision_tasks(tasks: Vec<CollisionTask>, first_collision_only: bool) -> Vec<Collision> {
    let check = |task: &CollisionTask| -> Option<Collision> {
        let collides = parry3d::query::intersection_test(
            &task.link.pose, task.link.shape.as_ref(),
            &task.obstacle.pose, task.obstacle.shape.as_ref())
            .unwrap_or(true);
        collides.then(|| Collision {
            link: task.link.label.clone(),
            obstacle: task.obstacle.label.clone(),
        })
    };

    if first_collision_only {
        // Exit as soon as any collision is found
        tasks.par_iter().find_map_any(check).into_iter().collect()
    } else {
        tasks.par_iter().filter_map(check).collect()
    }
}
