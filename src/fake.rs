//! Simulated components. They accept commands instantly and remember the state,
//! which is enough to drive the motion core without hardware.

use tracing::info;
use crate::components::{Capabilities, Component, ComponentError, Extra};
use crate::constraints::Constraints;
use crate::context::CallContext;
use crate::ik::SolverConfig;
use crate::kinematic_traits::{Inputs, Kinematics, Pose};
use crate::kinematics_impl::KinematicModel;
use crate::proto::JointPositions;
use crate::world_state::WorldState;

/// Joint state of a simulated kinematic chain.
struct SimulatedChain {
    model: KinematicModel,
    inputs: Inputs,
    stops: usize,
    /// Error the next move command fails with, if set.
    fail_next_move: Option<String>,
}

impl SimulatedChain {
    fn new(model: KinematicModel) -> Self {
        let inputs = Constraints::from_kinematics(&model).clamp(&vec![0.0; model.dof()]);
        SimulatedChain { model, inputs, stops: 0, fail_next_move: None }
    }

    fn joint_positions(&self) -> Result<JointPositions, ComponentError> {
        self.model.protobuf_from_input(&self.inputs).map_err(|e| ComponentError::Hardware(e.to_string()))
    }

    fn set_inputs(&mut self, inputs: Inputs) -> Result<(), ComponentError> {
        if let Some(reason) = self.fail_next_move.take() {
            return Err(ComponentError::Hardware(reason));
        }
        if !Constraints::from_kinematics(&self.model).compliant(&inputs) {
            return Err(ComponentError::Hardware(
                format!("{} joint positions {:?} out of limits", self.model.component(), inputs)));
        }
        info!("{} moves to {:?}", self.model.component(), inputs);
        self.inputs = inputs;
        Ok(())
    }

    fn move_to_joint_positions(&mut self, positions: &JointPositions) -> Result<(), ComponentError> {
        let inputs = self.model.input_from_protobuf(positions)
            .map_err(|e| ComponentError::Hardware(e.to_string()))?;
        self.set_inputs(inputs)
    }
}

/// Arm with its own kinematic model. Moves to poses through its own inverse kinematics.
pub struct FakeArm {
    chain: SimulatedChain,
    solver: SolverConfig,
}

impl FakeArm {
    pub fn new(model: KinematicModel) -> Self {
        FakeArm { chain: SimulatedChain::new(model), solver: SolverConfig::default() }
    }

    /// Arm placed at the given inputs (radians, millimeters). Inputs outside limits are clamped.
    pub fn at(model: KinematicModel, inputs: &[f64]) -> Self {
        let mut arm = FakeArm::new(model);
        arm.chain.inputs = Constraints::from_kinematics(&arm.chain.model).clamp(inputs);
        arm
    }

    /// Current inputs (radians, millimeters).
    pub fn inputs(&self) -> &[f64] {
        &self.chain.inputs
    }

    pub fn stop_count(&self) -> usize {
        self.chain.stops
    }

    /// Makes the next move command fail with a hardware error.
    pub fn fail_next_move(&mut self, reason: impl Into<String>) {
        self.chain.fail_next_move = Some(reason.into());
    }
}

impl Component for FakeArm {
    fn capabilities(&self) -> Capabilities {
        Capabilities::KINEMATIC_CHAIN | Capabilities::POSITIONABLE | Capabilities::STOPPABLE
    }

    fn end_position(&self, _extra: &Extra) -> Result<Pose, ComponentError> {
        self.chain.model.forward(&self.chain.inputs).map_err(|e| ComponentError::Hardware(e.to_string()))
    }

    /// Only obstacles given in the base frame of the arm are considered.
    fn move_to_position(&mut self, pose: &Pose, world_state: &WorldState, _extra: &Extra)
                        -> Result<(), ComponentError> {
        let obstacles: Vec<_> = world_state.obstacles.iter()
            .filter(|group| group.frame == self.chain.model.base())
            .flat_map(|group| group.geometries.iter().cloned())
            .collect();
        let constraints = Constraints::from_kinematics(&self.chain.model)
            .with_obstacles(&obstacles, self.solver.link_radius);
        let inputs = self.chain.model
            .inverse(pose, &self.chain.inputs, &constraints, &self.solver, &CallContext::new())
            .map_err(|e| ComponentError::Hardware(e.to_string()))?;
        self.chain.set_inputs(inputs)
    }

    fn joint_positions(&self, _extra: &Extra) -> Result<JointPositions, ComponentError> {
        self.chain.joint_positions()
    }

    fn move_to_joint_positions(&mut self, positions: &JointPositions, _extra: &Extra)
                               -> Result<(), ComponentError> {
        self.chain.move_to_joint_positions(positions)
    }

    fn stop(&mut self, _extra: &Extra) -> Result<(), ComponentError> {
        self.chain.stops += 1;
        Ok(())
    }
}

/// Gantry made of prismatic axes. Accepts joint positions (millimeters) only.
pub struct FakeGantry {
    chain: SimulatedChain,
}

impl FakeGantry {
    pub fn new(model: KinematicModel) -> Self {
        FakeGantry { chain: SimulatedChain::new(model) }
    }

    /// Gantry placed at the given axis positions. Positions outside limits are clamped.
    pub fn at(model: KinematicModel, positions: &[f64]) -> Self {
        let mut gantry = FakeGantry::new(model);
        gantry.chain.inputs = Constraints::from_kinematics(&gantry.chain.model).clamp(positions);
        gantry
    }

    pub fn inputs(&self) -> &[f64] {
        &self.chain.inputs
    }

    pub fn stop_count(&self) -> usize {
        self.chain.stops
    }
}

impl Component for FakeGantry {
    fn capabilities(&self) -> Capabilities {
        Capabilities::KINEMATIC_CHAIN | Capabilities::STOPPABLE
    }

    fn joint_positions(&self, _extra: &Extra) -> Result<JointPositions, ComponentError> {
        self.chain.joint_positions()
    }

    fn move_to_joint_positions(&mut self, positions: &JointPositions, _extra: &Extra)
                               -> Result<(), ComponentError> {
        self.chain.move_to_joint_positions(positions)
    }

    fn stop(&mut self, _extra: &Extra) -> Result<(), ComponentError> {
        self.chain.stops += 1;
        Ok(())
    }
}

/// Gripper has no degrees of freedom the motion core could use, it can only be stopped.
#[derive(Default)]
pub struct FakeGripper {
    stops: usize,
}

impl FakeGripper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop_count(&self) -> usize {
        self.stops
    }
}

impl Component for FakeGripper {
    fn capabilities(&self) -> Capabilities {
        Capabilities::STOPPABLE
    }

    fn stop(&mut self, _extra: &Extra) -> Result<(), ComponentError> {
        self.stops += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Isometry3, Vector3};
    use crate::frame::{Frame, Limit};
    use crate::kinematic_traits::WORLD;
    use crate::spatial::poses_approx_eq;

    fn planar_model() -> KinematicModel {
        let limit = Limit::new(-3.0, 3.0);
        KinematicModel::new("planar", WORLD, vec![
            Frame::revolute("planar:j1", WORLD, Pose::identity(), Vector3::z_axis(), limit),
            Frame::revolute("planar:j2", "planar:j1", Isometry3::translation(300.0, 0.0, 0.0),
                            Vector3::z_axis(), limit),
            Frame::new_static("planar", "planar:j2", Isometry3::translation(200.0, 0.0, 0.0)),
        ]).unwrap()
    }

    #[test]
    fn test_arm_joint_positions_in_degrees() {
        let mut arm = FakeArm::new(planar_model());
        arm.move_to_joint_positions(&JointPositions { values: vec![90.0, -45.0] }, &Extra::new()).unwrap();
        assert!((arm.inputs()[0] - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        let back = arm.joint_positions(&Extra::new()).unwrap();
        assert!((back.values[1] + 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_arm_rejects_out_of_limits() {
        let mut arm = FakeArm::new(planar_model());
        let err = arm.move_to_joint_positions(&JointPositions { values: vec![270.0, 0.0] }, &Extra::new());
        assert!(matches!(err, Err(ComponentError::Hardware(_))));
        assert_eq!(arm.inputs(), &[0.0, 0.0]);
    }

    #[test]
    fn test_arm_moves_to_position() {
        let mut arm = FakeArm::new(planar_model());
        let target = planar_model().forward(&[0.3, 1.1]).unwrap();
        arm.move_to_position(&target, &WorldState::default(), &Extra::new()).unwrap();
        let reached = arm.end_position(&Extra::new()).unwrap();
        assert!(poses_approx_eq(&reached, &target, 1e-3, 1e-5));
    }

    #[test]
    fn test_injected_failure() {
        let mut arm = FakeArm::new(planar_model());
        arm.fail_next_move("motor overheated");
        let err = arm.move_to_joint_positions(&JointPositions { values: vec![0.0, 0.0] }, &Extra::new());
        assert_eq!(err, Err(ComponentError::Hardware("motor overheated".into())));
        assert!(arm.move_to_joint_positions(&JointPositions { values: vec![0.0, 0.0] }, &Extra::new()).is_ok());
    }

    #[test]
    fn test_gripper_only_stops() {
        let mut gripper = FakeGripper::new();
        assert_eq!(gripper.capabilities(), Capabilities::STOPPABLE);
        gripper.stop(&Extra::new()).unwrap();
        assert_eq!(gripper.stop_count(), 1);
        assert!(gripper.end_position(&Extra::new()).is_err());
    }
}
