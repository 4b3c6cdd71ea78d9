//! The configured robot: static frame system, components, and kinematic models of the
//! components that have a kinematic chain.
//!
//! Frames of the part `p` are named `p_origin` (the mount under the parent part),
//! `p:<link>` for every link of its kinematic chain, and `p` itself for the component frame.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;
use crate::components::{lock, Capabilities, ComponentType, Extra};
use crate::frame_system::{FrameSystem, FrameSystemError};
use crate::kinematic_traits::{InputsByFrame, Kinematics};
use crate::kinematics_impl::KinematicModel;
use crate::motion::MotionError;
use crate::registry::ResourceRegistry;

/// Name of the frame where the part is mounted to its parent.
pub fn origin_frame_name(part: &str) -> String {
    format!("{}_origin", part)
}

/// Name of the frame of the given link of the part's kinematic chain.
pub fn link_frame_name(part: &str, link: &str) -> String {
    format!("{}:{}", part, link)
}

pub struct Robot {
    frame_system: Arc<FrameSystem>,
    registry: ResourceRegistry,
    /// Models are resolved when first needed and kept for the lifetime of the robot.
    models: RwLock<HashMap<String, Arc<KinematicModel>>>,
}

impl Robot {
    pub fn new(frame_system: FrameSystem, registry: ResourceRegistry) -> Self {
        Robot {
            frame_system: Arc::new(frame_system),
            registry,
            models: RwLock::new(HashMap::new()),
        }
    }

    pub fn frame_system(&self) -> &Arc<FrameSystem> {
        &self.frame_system
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    pub fn component(&self, name: &str) -> Option<ComponentType> {
        self.registry.get(name)
    }

    /// Kinematic chain of the component, from its origin frame (exclusive) to its frame.
    pub fn kinematic_model(&self, name: &str) -> Result<Arc<KinematicModel>, FrameSystemError> {
        if let Ok(models) = self.models.read() {
            if let Some(model) = models.get(name) {
                return Ok(model.clone());
            }
        }
        let model = Arc::new(KinematicModel::from_frame_system(
            &self.frame_system, name, &origin_frame_name(name), name)?);
        debug!("Resolved kinematic model of {} with {} inputs", name, model.dof());
        if let Ok(mut models) = self.models.write() {
            models.entry(name.to_string()).or_insert_with(|| model.clone());
        }
        Ok(model)
    }

    /// Current inputs of every component that has a kinematic chain, read from the components.
    pub fn current_inputs(&self) -> Result<InputsByFrame, MotionError> {
        let mut inputs = InputsByFrame::new();
        for (name, component) in self.registry.iter() {
            let positions = {
                let guard = lock(component).map_err(|source| MotionError::component(name, source))?;
                if !guard.capabilities().contains(Capabilities::KINEMATIC_CHAIN) {
                    continue;
                }
                guard.joint_positions(&Extra::new()).map_err(|source| MotionError::component(name, source))?
            };
            let model = self.kinematic_model(name)?;
            let values = model.input_from_protobuf(&positions)?;
            inputs.extend(model.inputs_by_frame(&values)?);
        }
        Ok(inputs)
    }
}
