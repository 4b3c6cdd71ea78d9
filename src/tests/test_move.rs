#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Instant;
    use nalgebra::Isometry3;
    use crate::components::{component, Capabilities, Component, ComponentError, Extra};
    use crate::context::{CallContext, CancelToken};
    use crate::fake::FakeGripper;
    use crate::frame::Frame;
    use crate::frame_system::{FrameSystem, FrameSystemError};
    use crate::kinematic_traits::{Pose, WORLD};
    use crate::motion::{MotionError, MotionService};
    use crate::proto::JointPositions;
    use crate::registry::ResourceRegistry;
    use crate::robot::Robot;
    use crate::spatial::{poses_approx_eq, PoseInFrame};
    use crate::tests::test_utils::{arm_pose, load, plate, workcell, ABOVE_PLATE, WORKCELL};
    use crate::world_state::WorldState;

    /// Looser than the solver tolerance, the pose goes through degrees on the wire.
    const DISTANCE: f64 = 1e-2;
    const ANGLE: f64 = 1e-4;

    fn gripper_offset() -> Pose {
        Isometry3::translation(0.0, 0.0, 50.0)
    }

    /// Arm that has lost its encoders, any read of joint positions fails.
    struct OfflineArm;

    impl Component for OfflineArm {
        fn capabilities(&self) -> Capabilities {
            Capabilities::KINEMATIC_CHAIN | Capabilities::STOPPABLE
        }

        fn joint_positions(&self, _extra: &Extra) -> Result<JointPositions, ComponentError> {
            Err(ComponentError::Hardware("encoder offline".into()))
        }
    }

    /// Positions itself but has no kinematic chain the motion service could solve for.
    struct PanTiltCamera;

    impl Component for PanTiltCamera {
        fn capabilities(&self) -> Capabilities {
            Capabilities::POSITIONABLE
        }

        fn end_position(&self, _extra: &Extra) -> Result<Pose, ComponentError> {
            Ok(Pose::identity())
        }
    }

    #[test]
    fn test_arm_reaches_target() {
        let cell = workcell();
        let service = MotionService::new(cell.robot.clone());
        let target = arm_pose(&ABOVE_PLATE);

        service.move_component("arm", &PoseInFrame::in_world(target), &WorldState::default(),
                               &Extra::new(), &CallContext::new())
            .expect("Target without obstacles must be reachable");

        let reached = service.get_pose("arm", WORLD, &[], &Extra::new()).unwrap();
        assert!(poses_approx_eq(&reached.pose, &target, DISTANCE, ANGLE),
                "Reached {:?}, expected {:?}", reached.pose, target);
        assert_eq!(cell.arm.lock().unwrap().stop_count(), 0);
    }

    #[test]
    fn test_plate_blocks_target_above_it() {
        let cell = workcell();
        let service = MotionService::new(cell.robot.clone());
        let target = arm_pose(&ABOVE_PLATE);
        assert!(target.translation.z > 380.0, "Target must be above the plate");

        let err = service.move_component("arm", &PoseInFrame::in_world(target), &plate(),
                                         &Extra::new(), &CallContext::new()).unwrap_err();
        match err {
            MotionError::Infeasible { component, collisions } => {
                assert_eq!(component, "arm");
                assert!(!collisions.is_empty());
                assert!(collisions.iter().all(|collision| collision.obstacle == "plate"));
            }
            other => panic!("Expected infeasible motion, got {:?}", other),
        }
        // Nothing was commanded
        assert_eq!(cell.arm.lock().unwrap().inputs(), &[0.0; 6]);
    }

    #[test]
    fn test_gripper_is_moved_by_arm() {
        let cell = workcell();
        let service = MotionService::new(cell.robot.clone());
        let target = arm_pose(&ABOVE_PLATE) * gripper_offset();

        service.move_component("gripper", &PoseInFrame::in_world(target), &WorldState::default(),
                               &Extra::new(), &CallContext::new())
            .expect("Gripper must be moved by the arm");

        let reached = service.get_pose("gripper", WORLD, &[], &Extra::new()).unwrap();
        assert!(poses_approx_eq(&reached.pose, &target, DISTANCE, ANGLE));
        assert_ne!(cell.arm.lock().unwrap().inputs(), &[0.0; 6]);
        assert_eq!(cell.gripper.lock().unwrap().stop_count(), 0);
    }

    #[test]
    fn test_single_component_must_have_chain() {
        let cell = workcell();
        let service = MotionService::new(cell.robot.clone());
        let target = arm_pose(&ABOVE_PLATE);

        let err = service.move_single_component(
            "gripper", &PoseInFrame::in_world(target * gripper_offset()), &WorldState::default(),
            &Extra::new(), &CallContext::new()).unwrap_err();
        assert_eq!(err, MotionError::NotMovable("gripper".into()));

        service.move_single_component("arm", &PoseInFrame::in_world(target), &WorldState::default(),
                                      &Extra::new(), &CallContext::new())
            .expect("Arm has its own chain");
    }

    #[test]
    fn test_not_movable_without_reading_joints() {
        let frame_system = load(WORKCELL).build_frame_system().expect("Invalid workcell");
        let mut registry = ResourceRegistry::new();
        registry.register("arm", component(OfflineArm));
        registry.register("gripper", component(FakeGripper::new()));
        let service = MotionService::new(Arc::new(Robot::new(frame_system, registry)));

        let err = service.move_single_component(
            "gripper", &PoseInFrame::in_world(Pose::identity()), &WorldState::default(),
            &Extra::new(), &CallContext::new()).unwrap_err();
        assert_eq!(err, MotionError::NotMovable("gripper".into()));
    }

    #[test]
    fn test_no_chain_among_ancestors() {
        let mut frame_system = FrameSystem::new("camera_stand");
        frame_system.add_frame(Frame::new_static("camera", WORLD, Isometry3::translation(0.0, 0.0, 1500.0)))
            .unwrap();
        let mut registry = ResourceRegistry::new();
        registry.register("camera", component(PanTiltCamera));
        let service = MotionService::new(Arc::new(Robot::new(frame_system, registry)));

        // Positionable alone does not make the camera movable by the motion service
        let err = service.move_component("camera", &PoseInFrame::in_world(Pose::identity()),
                                         &WorldState::default(), &Extra::new(), &CallContext::new())
            .unwrap_err();
        assert_eq!(err, MotionError::NotMovable("camera".into()));
    }

    #[test]
    fn test_destination_with_missing_parent() {
        let cell = workcell();
        let service = MotionService::new(cell.robot.clone());
        let world_state = WorldState::from_transforms(vec![
            PoseInFrame::named("frame2", "noParent", Isometry3::translation(1.0, 2.0, 3.0)),
        ]);

        let err = service.move_component("arm", &PoseInFrame::new("frame2", Pose::identity()), &world_state,
                                         &Extra::new(), &CallContext::new()).unwrap_err();
        assert_eq!(err, MotionError::Frame(FrameSystemError::MissingParent {
            frame: "frame2".into(),
            missing_parent: "noParent".into(),
        }));
        assert_eq!(cell.arm.lock().unwrap().inputs(), &[0.0; 6]);
    }

    #[test]
    fn test_destination_in_supplemental_frame() {
        let cell = workcell();
        let service = MotionService::new(cell.robot.clone());
        let target = arm_pose(&ABOVE_PLATE);
        let table = Isometry3::translation(200.0, -100.0, 50.0);
        let world_state = WorldState::from_transforms(vec![PoseInFrame::named("table", WORLD, table)]);

        let destination = PoseInFrame::new("table", table.inverse() * target);
        service.move_component("arm", &destination, &world_state, &Extra::new(), &CallContext::new())
            .unwrap();

        let reached = service.get_pose("arm", WORLD, &[], &Extra::new()).unwrap();
        assert!(poses_approx_eq(&reached.pose, &target, DISTANCE, ANGLE));
        let in_table = service.get_pose("arm", "table", &world_state.transforms, &Extra::new()).unwrap();
        assert!(poses_approx_eq(&in_table.pose, &destination.pose, DISTANCE, ANGLE));
    }

    #[test]
    fn test_unreachable_target() {
        let cell = workcell();
        let service = MotionService::new(cell.robot.clone());
        let far = PoseInFrame::in_world(Isometry3::translation(2000.0, 0.0, 0.0));

        let err = service.move_component("arm", &far, &WorldState::default(),
                                         &Extra::new(), &CallContext::new()).unwrap_err();
        match err {
            MotionError::NoSolutionFound { component, best_position_error, .. } => {
                assert_eq!(component, "arm");
                assert!(best_position_error > 1000.0);
            }
            other => panic!("Expected no solution, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_component() {
        let cell = workcell();
        let service = MotionService::new(cell.robot.clone());
        let err = service.move_component("camera", &PoseInFrame::in_world(Pose::identity()),
                                         &WorldState::default(), &Extra::new(), &CallContext::new())
            .unwrap_err();
        assert_eq!(err, MotionError::ComponentNotFound("camera".into()));
    }

    #[test]
    fn test_failed_command_stops_arm() {
        let cell = workcell();
        let service = MotionService::new(cell.robot.clone());
        cell.arm.lock().unwrap().fail_next_move("encoder fault");

        let err = service.move_component("arm", &PoseInFrame::in_world(arm_pose(&ABOVE_PLATE)),
                                         &WorldState::default(), &Extra::new(), &CallContext::new())
            .unwrap_err();
        assert_eq!(err, MotionError::Component {
            component: "arm".into(),
            source: ComponentError::Hardware("encoder fault".into()),
        });
        let arm = cell.arm.lock().unwrap();
        assert_eq!(arm.stop_count(), 1);
        assert_eq!(arm.inputs(), &[0.0; 6]);
    }

    #[test]
    fn test_cancelled_request_does_not_move() {
        let cell = workcell();
        let service = MotionService::new(cell.robot.clone());
        let token = CancelToken::new();
        token.cancel();

        let err = service.move_component("arm", &PoseInFrame::in_world(arm_pose(&ABOVE_PLATE)),
                                         &WorldState::default(), &Extra::new(),
                                         &CallContext::new().with_cancel(token))
            .unwrap_err();
        assert_eq!(err, MotionError::Cancelled);
        assert_eq!(cell.arm.lock().unwrap().inputs(), &[0.0; 6]);
    }

    #[test]
    fn test_expired_deadline() {
        let cell = workcell();
        let service = MotionService::new(cell.robot.clone());
        let err = service.move_component("gripper", &PoseInFrame::in_world(Pose::identity()),
                                         &WorldState::default(), &Extra::new(),
                                         &CallContext::new().with_deadline(Instant::now()))
            .unwrap_err();
        assert_eq!(err, MotionError::DeadlineExceeded);
    }
}
