//! Numerical inverse kinematics for any [Kinematics] chain.
//!
//! The solver is Levenberg-Marquardt damped least squares on the numerical pose Jacobian.
//! The pose error is the 6D vector of the position difference (mm) and the orientation
//! difference as scaled axis (radians), the latter multiplied by
//! [SolverConfig::orientation_weight] so that both parts are comparable. Every step is
//! clamped to the joint limits and is only taken if it decreases the error; otherwise
//! the damping grows and the step is retried.
//!
//! The first attempt starts from the seed (clamped to limits), further attempts from
//! random inputs within limits, drawn from the generator seeded with [SolverConfig::seed].
//! Attempts run in order, and the first converged candidate that does not collide is
//! returned, so identical calls always give identical results. Collisions are only checked
//! for converged candidates, the obstacles do not change which candidates converge.

use std::error::Error;
use std::fmt;
use nalgebra::{DMatrix, DVector};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;
use crate::collisions::Collision;
use crate::constraints::Constraints;
use crate::context::{CallContext, Interrupted};
use crate::frame_system::FrameSystemError;
use crate::jakobian::compute_jacobian;
use crate::kinematic_traits::{Inputs, Kinematics, Pose};

/// Damping never drops below this, nor grows above MAX_DAMPING (then the attempt gives up).
const MIN_DAMPING: f64 = 1e-9;
const MAX_DAMPING: f64 = 1e10;

/// Settings of the numerical solver.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Number of attempts, the first from the seed and the rest from random inputs.
    pub attempts: usize,
    /// Iteration budget of every attempt.
    pub max_iterations: usize,
    /// Converged when the position is this close (mm)
    pub position_tolerance: f64,
    /// and the orientation this close (radians).
    pub orientation_tolerance: f64,
    /// Millimeters the orientation error of 1 radian is worth.
    pub orientation_weight: f64,
    pub initial_damping: f64,
    pub jacobian_epsilon: f64,
    /// Radius (mm) of the capsules representing chain links in collision checks.
    pub link_radius: f64,
    /// Seed of the generator of random restarts.
    pub seed: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            attempts: 32,
            max_iterations: 300,
            position_tolerance: 1e-3,
            orientation_tolerance: 1e-5,
            orientation_weight: 100.0,
            initial_damping: 1.0,
            jacobian_epsilon: 1e-6,
            link_radius: 20.0,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IkError {
    /// No attempt converged, the closest one got this near.
    NoSolutionFound {
        attempts: usize,
        best_position_error: f64,
        best_orientation_error: f64,
    },
    /// Some attempts converged but all collide.
    Infeasible { collisions: Vec<Collision> },
    Interrupted(Interrupted),
    Frame(FrameSystemError),
}

impl fmt::Display for IkError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            IkError::NoSolutionFound { attempts, best_position_error, best_orientation_error } =>
                write!(f, "no solution found in {} attempts, closest was {:.4} mm and {:.6} rad away",
                       attempts, best_position_error, best_orientation_error),
            IkError::Infeasible { collisions } => {
                write!(f, "all solutions collide")?;
                for (i, collision) in collisions.iter().enumerate() {
                    write!(f, "{}{}", if i == 0 { ": " } else { ", " }, collision)?;
                }
                Ok(())
            }
            IkError::Interrupted(reason) => write!(f, "{}", reason),
            IkError::Frame(err) => write!(f, "{}", err),
        }
    }
}

impl Error for IkError {}

impl From<FrameSystemError> for IkError {
    fn from(err: FrameSystemError) -> Self {
        IkError::Frame(err)
    }
}

impl From<Interrupted> for IkError {
    fn from(reason: Interrupted) -> Self {
        IkError::Interrupted(reason)
    }
}

/// Outcome of a single attempt.
enum Descent {
    Converged(Inputs),
    Stalled { position_error: f64, orientation_error: f64 },
}

/// Pose error between the current and the target pose.
struct Residual {
    /// Position difference followed by the weighted orientation difference.
    error: DVector<f64>,
    position_error: f64,
    orientation_error: f64,
}

impl Residual {
    fn new(current: &Pose, target: &Pose, orientation_weight: f64) -> Self {
        let position = target.translation.vector - current.translation.vector;
        let orientation = (target.rotation * current.rotation.inverse()).scaled_axis();
        let weighted = orientation * orientation_weight;
        Residual {
            error: DVector::from_column_slice(&[
                position.x, position.y, position.z, weighted.x, weighted.y, weighted.z,
            ]),
            position_error: position.norm(),
            orientation_error: orientation.norm(),
        }
    }

    fn cost(&self) -> f64 {
        self.error.norm_squared()
    }

    fn converged(&self, config: &SolverConfig) -> bool {
        self.position_error <= config.position_tolerance
            && self.orientation_error <= config.orientation_tolerance
    }
}

/// Finds inputs that bring the chain tip to the target pose (expressed in the frame the
/// chain is attached to) while satisfying the constraints.
pub fn inverse(kinematics: &dyn Kinematics, target: &Pose, seed: &[f64], constraints: &Constraints,
               config: &SolverConfig, ctx: &CallContext) -> Result<Inputs, IkError> {
    let attempts = config.attempts.max(1);
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut best = (f64::INFINITY, f64::INFINITY);
    let mut converged = 0;
    let mut collisions: Vec<Collision> = Vec::new();

    for attempt in 0..attempts {
        let start = if attempt == 0 {
            constraints.clamp(seed)
        } else {
            constraints.sample(&mut rng)
        };
        match descend(kinematics, target, start, constraints, config, ctx)? {
            Descent::Converged(inputs) => {
                converged += 1;
                let found = constraints.environment.collision_details(kinematics, &inputs)?;
                if found.is_empty() {
                    debug!("Inverse kinematics converged in attempt {}", attempt);
                    return Ok(inputs);
                }
                debug!("Attempt {} converged but collides: {:?}", attempt, found);
                for collision in found {
                    if !collisions.contains(&collision) {
                        collisions.push(collision);
                    }
                }
            }
            Descent::Stalled { position_error, orientation_error } => {
                if position_error + config.orientation_weight * orientation_error
                    < best.0 + config.orientation_weight * best.1 {
                    best = (position_error, orientation_error);
                }
            }
        }
    }

    if converged > 0 {
        Err(IkError::Infeasible { collisions })
    } else {
        Err(IkError::NoSolutionFound {
            attempts,
            best_position_error: best.0,
            best_orientation_error: best.1,
        })
    }
}

/// Single damped least squares descent from the given start.
fn descend(kinematics: &dyn Kinematics, target: &Pose, start: Inputs, constraints: &Constraints,
           config: &SolverConfig, ctx: &CallContext) -> Result<Descent, IkError> {
    let dof = start.len();
    let mut inputs = start;
    let mut residual = Residual::new(&kinematics.forward(&inputs)?, target, config.orientation_weight);
    let mut damping = config.initial_damping;

    for _ in 0..config.max_iterations {
        ctx.check()?;
        if residual.converged(config) || dof == 0 {
            break;
        }

        let mut jacobian = compute_jacobian(kinematics, &inputs, config.jacobian_epsilon)?;
        jacobian.rows_mut(3, 3).scale_mut(config.orientation_weight);
        let transposed = jacobian.transpose();
        let normal: DMatrix<f64> = &transposed * &jacobian;
        let gradient: DVector<f64> = &transposed * &residual.error;

        let mut improved = false;
        while damping <= MAX_DAMPING {
            let mut system = normal.clone();
            for i in 0..dof {
                system[(i, i)] += damping * damping;
            }
            let Some(cholesky) = system.cholesky() else {
                damping *= 4.0;
                continue;
            };
            let step = cholesky.solve(&gradient);
            let moved: Inputs = inputs.iter().zip(step.iter()).map(|(q, dq)| q + dq).collect();
            let candidate = constraints.clamp(&moved);
            let candidate_residual = Residual::new(&kinematics.forward(&candidate)?, target,
                                                   config.orientation_weight);
            if candidate_residual.cost() < residual.cost() {
                inputs = candidate;
                residual = candidate_residual;
                damping = (damping * 0.5).max(MIN_DAMPING);
                improved = true;
                break;
            }
            damping *= 4.0;
        }
        if !improved {
            break;
        }
    }

    if residual.converged(config) {
        Ok(Descent::Converged(inputs))
    } else {
        Ok(Descent::Stalled {
            position_error: residual.position_error,
            orientation_error: residual.orientation_error,
        })
    }
}
