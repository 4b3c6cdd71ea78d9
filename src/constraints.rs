use rand::Rng;
use crate::collisions::CollisionEnvironment;
use crate::frame::Limit;
use crate::geometry::Geometry;
use crate::kinematic_traits::{Inputs, Kinematics};

/// Constraints the inverse kinematics solution must satisfy: joint limits and
/// no intersection of the chain with obstacles.
#[derive(Clone)]
pub struct Constraints {
    /// One limit per input of the chain, in chain order.
    pub limits: Vec<Limit>,

    /// Obstacles in the frame the chain is attached to.
    pub environment: CollisionEnvironment,
}

impl Constraints {
    pub fn new(limits: Vec<Limit>, environment: CollisionEnvironment) -> Self {
        Constraints { limits, environment }
    }

    /// Joint limits of the chain, no obstacles.
    pub fn from_kinematics(kinematics: &dyn Kinematics) -> Self {
        Constraints::new(joint_limits(kinematics), CollisionEnvironment::empty())
    }

    /// Adds obstacles (expressed in the chain base frame). Links are capsules of the given radius.
    pub fn with_obstacles(mut self, obstacles: &[Geometry], link_radius: f64) -> Self {
        self.environment = CollisionEnvironment::new(obstacles, link_radius);
        self
    }

    pub fn compliant(&self, inputs: &[f64]) -> bool {
        inputs.len() == self.limits.len()
            && inputs.iter().zip(self.limits.iter()).all(|(value, limit)| limit.contains(*value))
    }

    /// Moves every input into its range. Missing inputs are taken from the middle of the range.
    pub fn clamp(&self, inputs: &[f64]) -> Inputs {
        self.limits.iter().enumerate().map(|(i, limit)| {
            match inputs.get(i) {
                Some(value) if value.is_finite() => limit.clamp(*value),
                _ => {
                    let (min, max) = limit.sampling_range();
                    (min + max) / 2.0
                }
            }
        }).collect()
    }

    /// Uniformly distributed inputs within limits.
    pub fn sample(&self, rng: &mut impl Rng) -> Inputs {
        self.limits.iter().map(|limit| {
            let (min, max) = limit.sampling_range();
            if max > min { rng.gen_range(min..=max) } else { min }
        }).collect()
    }
}

/// Limits of all inputs of the chain, in chain order.
pub fn joint_limits(kinematics: &dyn Kinematics) -> Vec<Limit> {
    kinematics.frames().iter().flat_map(|frame| frame.limits().iter().copied()).collect()
}
