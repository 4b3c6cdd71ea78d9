//! Motion service: moves components to poses and reports where components are.
//!
//! Every call builds its own copy of the frame system extended with the caller's world
//! state, expresses the destination in the base frame of the chain that will move, solves
//! inverse kinematics with obstacles as constraints, and commands the joint positions.
//! Nothing is kept between calls.

use std::error::Error;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use crate::collisions::Collision;
use crate::components::{lock, Capabilities, Component, ComponentError, Extra};
use crate::constraints::Constraints;
use crate::context::{CallContext, Interrupted};
use crate::frame::Frame;
use crate::frame_system::{FrameSystem, FrameSystemError};
use crate::ik::{IkError, SolverConfig};
use crate::kinematic_traits::{InputsByFrame, Pose, WORLD};
use crate::kinematics_impl::KinematicModel;
use crate::robot::Robot;
use crate::spatial::PoseInFrame;
use crate::world_state::WorldState;

#[derive(Debug, Clone, PartialEq)]
pub enum MotionError {
    ComponentNotFound(String),
    /// Neither the component nor any of its ancestors has a kinematic chain that could move it.
    NotMovable(String),
    NoSolutionFound {
        component: String,
        attempts: usize,
        best_position_error: f64,
        best_orientation_error: f64,
    },
    Infeasible { component: String, collisions: Vec<Collision> },
    Frame(FrameSystemError),
    /// Error reported by the component itself, passed through as is.
    Component { component: String, source: ComponentError },
    Cancelled,
    DeadlineExceeded,
}

impl MotionError {
    pub fn component(name: &str, source: ComponentError) -> Self {
        MotionError::Component { component: name.to_string(), source }
    }

    /// Inverse kinematics failure of the chain of the given component.
    pub fn from_ik(component: &str, err: IkError) -> Self {
        match err {
            IkError::NoSolutionFound { attempts, best_position_error, best_orientation_error } =>
                MotionError::NoSolutionFound {
                    component: component.to_string(),
                    attempts,
                    best_position_error,
                    best_orientation_error,
                },
            IkError::Infeasible { collisions } =>
                MotionError::Infeasible { component: component.to_string(), collisions },
            IkError::Interrupted(reason) => reason.into(),
            IkError::Frame(err) => MotionError::Frame(err),
        }
    }
}

impl fmt::Display for MotionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MotionError::ComponentNotFound(name) => write!(f, "component '{}' not found", name),
            MotionError::NotMovable(name) => write!(f, "component '{}' cannot be moved", name),
            MotionError::NoSolutionFound { component, attempts, best_position_error, best_orientation_error } =>
                write!(f, "no solution found for '{}' in {} attempts, closest was {:.4} mm and {:.6} rad away",
                       component, attempts, best_position_error, best_orientation_error),
            MotionError::Infeasible { component, collisions } => {
                write!(f, "every solution for '{}' collides", component)?;
                for (i, collision) in collisions.iter().enumerate() {
                    write!(f, "{}{}", if i == 0 { ": " } else { ", " }, collision)?;
                }
                Ok(())
            }
            MotionError::Frame(err) => write!(f, "{}", err),
            MotionError::Component { component, source } => write!(f, "{}: {}", component, source),
            MotionError::Cancelled => write!(f, "motion cancelled"),
            MotionError::DeadlineExceeded => write!(f, "motion deadline exceeded"),
        }
    }
}

impl Error for MotionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MotionError::Frame(err) => Some(err),
            MotionError::Component { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<FrameSystemError> for MotionError {
    fn from(err: FrameSystemError) -> Self {
        MotionError::Frame(err)
    }
}

impl From<Interrupted> for MotionError {
    fn from(reason: Interrupted) -> Self {
        match reason {
            Interrupted::Cancelled => MotionError::Cancelled,
            Interrupted::DeadlineExceeded => MotionError::DeadlineExceeded,
        }
    }
}

/// Which chain moves and how it reaches the frame being positioned.
struct Plan {
    /// Component that receives the joint positions.
    solver: String,
    /// Chain of the solver, possibly extended down to the positioned frame.
    model: KinematicModel,
}

pub struct MotionService {
    robot: Arc<Robot>,
    config: SolverConfig,
}

impl MotionService {
    pub fn new(robot: Arc<Robot>) -> Self {
        MotionService { robot, config: SolverConfig::default() }
    }

    pub fn with_config(robot: Arc<Robot>, config: SolverConfig) -> Self {
        MotionService { robot, config }
    }

    pub fn robot(&self) -> &Arc<Robot> {
        &self.robot
    }

    /// Moves the frame of the named component to the destination. If the component has no
    /// kinematic chain, the nearest ancestor component that has one moves it instead.
    pub fn move_component(&self, name: &str, destination: &PoseInFrame, world_state: &WorldState,
                          extra: &Extra, ctx: &CallContext) -> Result<(), MotionError> {
        self.execute_move(name, destination, world_state, extra, ctx, false)
    }

    /// Like [MotionService::move_component] but only the named component itself may move,
    /// so it must have a kinematic chain.
    pub fn move_single_component(&self, name: &str, destination: &PoseInFrame, world_state: &WorldState,
                                 extra: &Extra, ctx: &CallContext) -> Result<(), MotionError> {
        self.execute_move(name, destination, world_state, extra, ctx, true)
    }

    /// Pose of the named component frame in the destination frame (world if empty).
    /// Supplemental transforms are added to the frame system for this call only.
    pub fn get_pose(&self, name: &str, destination_frame: &str, supplemental_transforms: &[PoseInFrame],
                    _extra: &Extra) -> Result<PoseInFrame, MotionError> {
        if self.robot.component(name).is_none() {
            return Err(MotionError::ComponentNotFound(name.to_string()));
        }
        let frame_system = WorldState::from_transforms(supplemental_transforms.to_vec())
            .merge_into(self.robot.frame_system())?;
        let inputs = self.robot.current_inputs()?;
        let destination = if destination_frame.is_empty() { WORLD } else { destination_frame };
        let pose = frame_system.transform_frame(&inputs, &Pose::identity(), name, destination)?;
        Ok(PoseInFrame::new(destination, pose))
    }
}

impl MotionService {
    fn execute_move(&self, name: &str, destination: &PoseInFrame, world_state: &WorldState,
                    extra: &Extra, ctx: &CallContext, single: bool) -> Result<(), MotionError> {
        info!("Moving {} to {:?} in '{}'", name, destination.pose.translation.vector, destination.frame);

        // Validate, capabilities only
        let component = self.robot.component(name)
            .ok_or_else(|| MotionError::ComponentNotFound(name.to_string()))?;
        let capabilities = lock(&component)
            .map_err(|source| MotionError::component(name, source))?
            .capabilities();

        // Dispatch
        let (solver, depth) = if capabilities.contains(Capabilities::KINEMATIC_CHAIN) {
            (name.to_string(), 0)
        } else if single {
            return Err(MotionError::NotMovable(name.to_string()));
        } else {
            self.nearest_chain_ancestor(name)?
        };

        // Merge
        let frame_system = world_state.merge_into(self.robot.frame_system())?;
        let inputs = self.robot.current_inputs()?;
        let plan = self.plan(&frame_system, &inputs, name, solver, depth)?;

        // Resolve target and obstacles in the frame the chain is attached to
        let base = plan.model.base();
        let target = frame_system.transform_frame(&inputs, &destination.pose, &destination.frame, base)?;
        let obstacles = world_state.obstacles_in_frame(&frame_system, &inputs, base)?;
        debug!("Solving {} (chain of {}) with {} obstacles", name, plan.solver, obstacles.len());

        let seed = plan.model.flatten_inputs(&inputs)?;
        let constraints = Constraints::from_kinematics(&plan.model)
            .with_obstacles(&obstacles, self.config.link_radius);
        let solution = plan.model.inverse(&target, &seed, &constraints, &self.config, ctx)
            .map_err(|err| MotionError::from_ik(&plan.solver, err))?;
        let positions = plan.model.protobuf_from_input(&solution)?;

        // Execute, holding the solver for the whole command
        ctx.check()?;
        let solver = self.robot.component(&plan.solver)
            .ok_or_else(|| MotionError::ComponentNotFound(plan.solver.clone()))?;
        let mut guard = lock(&solver).map_err(|source| MotionError::component(&plan.solver, source))?;
        if let Err(source) = guard.move_to_joint_positions(&positions, extra) {
            warn!("{} failed to move: {}", plan.solver, source);
            stop(&mut *guard, &plan.solver, extra);
            return Err(MotionError::component(&plan.solver, source));
        }
        if let Err(reason) = ctx.check() {
            warn!("{} interrupted after the command was issued", plan.solver);
            stop(&mut *guard, &plan.solver, extra);
            return Err(reason.into());
        }
        info!("{} accepted joint positions {:?}", plan.solver, positions.values);
        Ok(())
    }

    /// Nearest ancestor component with a kinematic chain and how many frames below it
    /// the frame of the named component is.
    fn nearest_chain_ancestor(&self, name: &str) -> Result<(String, usize), MotionError> {
        let ancestors = self.robot.frame_system().ancestors(name)?;
        for (depth, ancestor) in ancestors.iter().enumerate().skip(1) {
            let Some(component) = self.robot.component(ancestor) else {
                continue;
            };
            let capabilities = lock(&component)
                .map_err(|source| MotionError::component(ancestor, source))?
                .capabilities();
            if capabilities.contains(Capabilities::KINEMATIC_CHAIN) {
                debug!("{} is moved by the chain of {}", name, ancestor);
                return Ok((ancestor.to_string(), depth));
            }
        }
        Err(MotionError::NotMovable(name.to_string()))
    }

    /// Chain of the solver, extended down to the frame of the named component when that
    /// frame is `depth` levels below. Frames in between are frozen at their current inputs.
    fn plan(&self, frame_system: &FrameSystem, inputs: &InputsByFrame, name: &str, solver: String,
            depth: usize) -> Result<Plan, MotionError> {
        let model = self.robot.kinematic_model(&solver)?;
        if depth == 0 {
            return Ok(Plan { solver, model: (*model).clone() });
        }
        let ancestors = frame_system.ancestors(name)?;
        let mut tail = Vec::with_capacity(depth);
        for frame_name in ancestors[..depth].iter().rev() {
            let frame = frame_system.frame(frame_name)
                .ok_or_else(|| FrameSystemError::FrameNotFound(frame_name.to_string()))?;
            tail.push(freeze(frame, inputs)?);
        }
        let model = model.with_tail(tail)?;
        Ok(Plan { solver, model })
    }
}

/// Static copy of the frame at its current inputs.
fn freeze(frame: &Frame, inputs: &InputsByFrame) -> Result<Frame, FrameSystemError> {
    if frame.is_static() {
        return Ok(frame.clone());
    }
    let values = inputs.get(frame.name()).ok_or_else(|| FrameSystemError::MissingInputs {
        frame: frame.name().to_string(),
        expected: frame.dof(),
        found: 0,
    })?;
    frame.fixed_at(values)
}

/// Stops the component after a failed or interrupted command. Failure to stop is only logged.
fn stop(component: &mut dyn Component, name: &str, extra: &Extra) {
    if !component.capabilities().contains(Capabilities::STOPPABLE) {
        return;
    }
    if let Err(err) = component.stop(extra) {
        warn!("{} failed to stop: {}", name, err);
    }
}
