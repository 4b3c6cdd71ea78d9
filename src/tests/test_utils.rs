use std::sync::{Arc, Mutex};
use nalgebra::Vector3;

use crate::components::ComponentType;
use crate::config::RobotConfig;
use crate::fake::{FakeArm, FakeGripper};
use crate::frame_system::FrameSystem;
use crate::geometry::Geometry;
use crate::kinematic_traits::{Kinematics, Pose, WORLD};
use crate::kinematics_impl::KinematicModel;
use crate::registry::ResourceRegistry;
use crate::robot::{origin_frame_name, Robot};
use crate::world_state::{GeometriesInFrame, WorldState};

pub(crate) const ARM_GANTRY: &str = "src/tests/data/arm_gantry.yaml";
pub(crate) const WORKCELL: &str = "src/tests/data/workcell.yaml";

/// Joint values (radians) that put the workcell arm tool well above the plate.
pub(crate) const ABOVE_PLATE: [f64; 6] = [0.3, 0.4, 0.6, 0.2, 0.5, 0.1];

pub(crate) fn load(path: &str) -> RobotConfig {
    RobotConfig::from_yaml_file(path).expect("Failed to load robot from file")
}

pub(crate) fn simulated(path: &str) -> Arc<Robot> {
    Arc::new(load(path).build_simulated_robot().expect("Failed to build the robot"))
}

/// Workcell where the test keeps direct handles to the simulated components.
pub(crate) struct Workcell {
    pub robot: Arc<Robot>,
    pub arm: Arc<Mutex<FakeArm>>,
    pub gripper: Arc<Mutex<FakeGripper>>,
}

pub(crate) fn workcell() -> Workcell {
    let frame_system = load(WORKCELL).build_frame_system().expect("Invalid workcell");
    let model = arm_model(&frame_system);
    let arm = Arc::new(Mutex::new(FakeArm::new(model)));
    let gripper = Arc::new(Mutex::new(FakeGripper::new()));

    let mut registry = ResourceRegistry::new();
    registry.register("arm", arm.clone() as ComponentType);
    registry.register("gripper", gripper.clone() as ComponentType);
    Workcell { robot: Arc::new(Robot::new(frame_system, registry)), arm, gripper }
}

pub(crate) fn arm_model(frame_system: &FrameSystem) -> KinematicModel {
    KinematicModel::from_frame_system(frame_system, "arm", &origin_frame_name("arm"), "arm")
        .expect("Arm chain expected")
}

/// Pose of the arm frame (in the world, as the arm stands at the origin) for the joint values.
pub(crate) fn arm_pose(inputs: &[f64]) -> Pose {
    let frame_system = load(WORKCELL).build_frame_system().expect("Invalid workcell");
    let model = arm_model(&frame_system);
    assert_eq!(model.dof(), inputs.len());
    model.forward(inputs).expect("Inputs within limits")
}

/// Thin plate covering the floor at the height of the arm elbow. The arm base is below it,
/// so anything that reaches above the plate must pass through it.
pub(crate) fn plate() -> WorldState {
    let plate = Geometry::new_box("plate", Pose::translation(0.0, 0.0, 370.0),
                                  Vector3::new(2000.0, 2000.0, 20.0));
    WorldState::new(vec![GeometriesInFrame::new(WORLD, vec![plate])], vec![])
}
