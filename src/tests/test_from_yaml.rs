#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;
    use nalgebra::{Isometry3, Vector3};
    use crate::components::{lock, Capabilities, Extra};
    use crate::config::RobotConfig;
    use crate::config_error::ConfigError;
    use crate::frame::{Joint, Limit};
    use crate::frame_system::FrameSystemError;
    use crate::kinematic_traits::{InputsByFrame, Kinematics};
    use crate::tests::test_utils::{arm_model, load, simulated, ARM_GANTRY, WORKCELL};
    use crate::utils::assert_pose_eq;

    const READ_ERROR: &str = "Failed to load robot from YAML";

    #[test]
    fn test_frames_from_yaml() {
        let frame_system = load(ARM_GANTRY).build_frame_system().expect(READ_ERROR);
        assert_eq!(frame_system.name(), "arm_on_gantry");

        let mut names = frame_system.frame_names();
        names.sort();
        assert_eq!(names, vec![
            "arm1", "arm1:base", "arm1:shoulder", "arm1_origin",
            "gantry1", "gantry1:x", "gantry1_origin",
            "gripper1", "gripper1_origin",
        ]);
        assert_eq!(frame_system.parent("arm1_origin").unwrap(), Some("gantry1"));
        assert_eq!(frame_system.parent("gripper1_origin").unwrap(), Some("arm1"));

        let shoulder = frame_system.frame("arm1:shoulder").unwrap();
        assert_eq!(shoulder.joint(), &Joint::Revolute { axis: Vector3::y_axis() });
        assert!((shoulder.limits()[0].max - FRAC_PI_2).abs() < 1e-12);

        let rail = frame_system.frame("gantry1:x").unwrap();
        assert_eq!(rail.joint(), &Joint::Prismatic { axis: Vector3::x_axis() });
        assert_eq!(rail.limits(), &[Limit::new(0.0, 1000.0)]);
    }

    #[test]
    fn test_six_axis_arm_from_yaml() {
        let frame_system = load(WORKCELL).build_frame_system().expect(READ_ERROR);
        let model = arm_model(&frame_system);
        assert_eq!(model.dof(), 6);
        let stretched = model.forward(&[0.0; 6]).unwrap();
        assert_pose_eq(&stretched, &Isometry3::translation(0.0, 0.0, 730.0), 1e-9, 1e-6);

        let inputs = model.inputs_by_frame(&[0.0; 6]).unwrap();
        let gripper = frame_system.pose_in_world(&inputs, "gripper").unwrap();
        assert_pose_eq(&gripper, &Isometry3::translation(0.0, 0.0, 780.0), 1e-9, 1e-6);
    }

    #[test]
    fn test_simulated_components() {
        let robot = simulated(ARM_GANTRY);
        let names: Vec<&str> = robot.registry().names().collect();
        assert_eq!(names, vec!["arm1", "gantry1", "gripper1"]);

        let capabilities = |name: &str| {
            let component = robot.component(name).unwrap();
            let guard = lock(&component).unwrap();
            guard.capabilities()
        };
        assert!(capabilities("arm1").contains(Capabilities::POSITIONABLE));
        assert_eq!(capabilities("gantry1"), Capabilities::KINEMATIC_CHAIN | Capabilities::STOPPABLE);
        assert_eq!(capabilities("gripper1"), Capabilities::STOPPABLE);

        let gantry = robot.component("gantry1").unwrap();
        let positions = lock(&gantry).unwrap().joint_positions(&Extra::new()).unwrap();
        assert_eq!(positions.values, vec![1.2]);
    }

    #[test]
    fn test_orientation_in_degrees() {
        let config = RobotConfig::from_yaml_str(r#"
parts:
  - name: camera
    translation: [0, 0, 1000]
    orientation: { axis: [0, 1, 0], angle: deg(90) }
"#).expect(READ_ERROR);
        assert_eq!(config.name, "robot");
        let frame_system = config.build_frame_system().unwrap();
        let camera = frame_system.pose_in_world(&InputsByFrame::new(), "camera").unwrap();
        let expected = Isometry3::new(Vector3::new(0.0, 0.0, 1000.0), Vector3::new(0.0, FRAC_PI_2, 0.0));
        assert_pose_eq(&camera, &expected, 1e-9, 1e-6);
    }

    #[test]
    fn test_revolute_without_limits_turns_fully() {
        let config = RobotConfig::from_yaml_str(r#"
parts:
  - name: turntable
    links:
      - { name: plate, joint: revolute }
"#).expect(READ_ERROR);
        let frame_system = config.build_frame_system().unwrap();
        let plate = frame_system.frame("turntable:plate").unwrap();
        assert_eq!(plate.limits(), &[Limit::full_turn()]);
        assert_eq!(plate.joint(), &Joint::Revolute { axis: Vector3::z_axis() });
    }

    #[test]
    fn test_unknown_parent() {
        let config = RobotConfig::from_yaml_str(r#"
parts:
  - name: table
  - name: arm
    parent: nowhere
"#).expect(READ_ERROR);
        match config.build_frame_system() {
            Err(ConfigError::Frame(FrameSystemError::UnknownParent { frame, parent })) => {
                assert_eq!(frame, "arm");
                assert_eq!(parent, "nowhere");
            }
            other => panic!("Expected unknown parent, got {:?}", other.map(|fs| fs.name().to_string())),
        }
    }

    #[test]
    fn test_duplicate_part() {
        let config = RobotConfig::from_yaml_str(r#"
parts:
  - name: table
  - name: table
    translation: [1, 0, 0]
"#).expect(READ_ERROR);
        assert!(matches!(config.build_frame_system(),
                         Err(ConfigError::Frame(FrameSystemError::DuplicateFrame(name))) if name == "table_origin"));
    }

    #[test]
    fn test_prismatic_needs_limits() {
        let config = RobotConfig::from_yaml_str(r#"
parts:
  - name: rail
    links:
      - { name: x, joint: prismatic, axis: [1, 0, 0], max: 500 }
"#).expect(READ_ERROR);
        assert!(matches!(config.build_frame_system(),
                         Err(ConfigError::InvalidPart { part, .. }) if part == "rail"));
    }

    #[test]
    fn test_zero_axis() {
        let config = RobotConfig::from_yaml_str(r#"
parts:
  - name: arm
    links:
      - { name: base, joint: revolute, axis: [0, 0, 0] }
"#).expect(READ_ERROR);
        assert!(matches!(config.build_frame_system(), Err(ConfigError::InvalidPart { .. })));
    }

    #[test]
    fn test_not_yaml() {
        assert!(matches!(RobotConfig::from_yaml_str("parts: [ {name: "),
                         Err(ConfigError::ParseError(_))));
        assert!(matches!(RobotConfig::from_yaml_file("src/tests/data/missing.yaml"),
                         Err(ConfigError::IoError(_))));
    }
}
