//! Hardware components as seen by the motion core: a declared capability set plus the
//! operations behind it. Drivers live elsewhere; see [crate::fake] for simulated ones.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use bitflags::bitflags;
use crate::kinematic_traits::Pose;
use crate::proto::JointPositions;
use crate::world_state::WorldState;

bitflags! {
    /// What the component declares it can do. Motion requests are dispatched on this
    /// set, never on which operations happen to be implemented.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// Has own articulated frames and accepts joint positions.
        const KINEMATIC_CHAIN = 0b001;
        /// Reports and moves its end position by itself. Informational only: the motion
        /// service solves for kinematic chains and never commands a position directly.
        const POSITIONABLE = 0b010;
        const STOPPABLE = 0b100;
    }
}

/// Extra parameters passed through to the component.
pub type Extra = HashMap<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum ComponentError {
    /// The component does not implement the named operation.
    Unsupported(&'static str),
    Hardware(String),
    /// Earlier command panicked while holding the component.
    Poisoned,
}

impl fmt::Display for ComponentError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ComponentError::Unsupported(operation) => write!(f, "{} is not supported", operation),
            ComponentError::Hardware(msg) => write!(f, "hardware error: {}", msg),
            ComponentError::Poisoned => write!(f, "component lock poisoned"),
        }
    }
}

impl std::error::Error for ComponentError {}

/// Operations of a component. Each takes extra parameters; operations the component
/// does not support keep the default implementation.
pub trait Component: Send {
    fn capabilities(&self) -> Capabilities;

    /// Pose of the component end relative to its own base frame.
    fn end_position(&self, _extra: &Extra) -> Result<Pose, ComponentError> {
        Err(ComponentError::Unsupported("end_position"))
    }

    /// Moves the component end to the pose (relative to its own base frame).
    fn move_to_position(&mut self, _pose: &Pose, _world_state: &WorldState, _extra: &Extra)
                        -> Result<(), ComponentError> {
        Err(ComponentError::Unsupported("move_to_position"))
    }

    fn joint_positions(&self, _extra: &Extra) -> Result<JointPositions, ComponentError> {
        Err(ComponentError::Unsupported("joint_positions"))
    }

    fn move_to_joint_positions(&mut self, _positions: &JointPositions, _extra: &Extra)
                               -> Result<(), ComponentError> {
        Err(ComponentError::Unsupported("move_to_joint_positions"))
    }

    fn stop(&mut self, _extra: &Extra) -> Result<(), ComponentError> {
        Err(ComponentError::Unsupported("stop"))
    }
}

/// Shared component. Every command holds the mutex for its whole duration.
pub type ComponentType = Arc<Mutex<dyn Component>>;

pub fn component<C: Component + 'static>(component: C) -> ComponentType {
    Arc::new(Mutex::new(component))
}

pub fn lock(component: &ComponentType) -> Result<MutexGuard<'_, dyn Component + 'static>, ComponentError> {
    component.lock().map_err(|_| ComponentError::Poisoned)
}
