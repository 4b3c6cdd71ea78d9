use std::path::PathBuf;
use std::sync::Arc;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nalgebra::Isometry3;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rs_frame_motion::components::Extra;
use rs_frame_motion::config::RobotConfig;
use rs_frame_motion::context::CallContext;
use rs_frame_motion::motion::MotionService;
use rs_frame_motion::proto::{PoseInFrameProto, WorldStateProto};
use rs_frame_motion::spatial::PoseInFrame;
use rs_frame_motion::utils::dump_pose;
use rs_frame_motion::world_state::WorldState;

/// Loads the robot from YAML, simulates its components and resolves poses and motions.
#[derive(Parser, Debug)]
#[clap(author, version, name = "rs-frame-motion")]
struct CommandLineArguments {
    /// Robot configuration (YAML)
    config: PathBuf,

    /// Timeout of the motion request, in milliseconds
    #[clap(long, default_value_t = 10_000)]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all frames of the robot
    Frames,
    /// Print the pose of the component in the given frame
    Pose {
        component: String,
        #[clap(long, default_value = "world")]
        frame: String,
    },
    /// Move the component to the position (millimeters) in the given frame, keeping
    /// the orientation the component currently has in that frame
    Move {
        component: String,
        x: f64,
        y: f64,
        z: f64,
        #[clap(long, default_value = "world")]
        frame: String,
        /// Obstacles and extra frames (JSON world state)
        #[clap(long)]
        world_state: Option<PathBuf>,
        /// Only the component itself may move
        #[clap(long)]
        single: bool,
    },
}

fn read_world_state(path: &Option<PathBuf>) -> Result<WorldState> {
    let Some(path) = path else {
        return Ok(WorldState::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading world state {}", path.display()))?;
    let proto: WorldStateProto = serde_json::from_str(&text)
        .with_context(|| format!("parsing world state {}", path.display()))?;
    Ok(WorldState::from(&proto))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = CommandLineArguments::parse();
    let config = RobotConfig::from_yaml_file(&args.config)
        .with_context(|| format!("loading robot {}", args.config.display()))?;
    let robot = Arc::new(config.build_simulated_robot()?);
    info!("Robot '{}' loaded with {} components", config.name, robot.registry().names().count());

    let service = MotionService::new(robot.clone());
    let extra = Extra::new();
    match args.command {
        Command::Frames => {
            for name in robot.frame_system().frame_names() {
                println!("{}", name);
            }
        }
        Command::Pose { component, frame } => {
            let pose = service.get_pose(&component, &frame, &[], &extra)?;
            println!("{} in {}:", component, pose.frame);
            dump_pose(&pose.pose);
            println!("{}", serde_json::to_string_pretty(&PoseInFrameProto::from(&pose))?);
        }
        Command::Move { component, x, y, z, frame, world_state, single } => {
            let world_state = read_world_state(&world_state)?;
            let current = service.get_pose(&component, &frame, &world_state.transforms, &extra)?;
            let destination = PoseInFrame::new(
                frame.as_str(), Isometry3::from_parts([x, y, z].into(), current.pose.rotation));
            let ctx = CallContext::new().with_timeout(std::time::Duration::from_millis(args.timeout_ms));
            if single {
                service.move_single_component(&component, &destination, &world_state, &extra, &ctx)?;
            } else {
                service.move_component(&component, &destination, &world_state, &extra, &ctx)?;
            }
            let reached = service.get_pose(&component, &frame, &world_state.transforms, &extra)?;
            println!("{} reached in {}:", component, reached.frame);
            dump_pose(&reached.pose);
        }
    }
    Ok(())
}
