extern crate nalgebra as na;
use na::{DMatrix, Vector3};
use rayon::prelude::*;
use crate::constraints::joint_limits;
use crate::frame_system::FrameSystemError;
use crate::kinematic_traits::Kinematics;

/// Function to compute the Jacobian matrix for the given chain and inputs
///
/// The column of each input is the pose change when this input is disturbed by `epsilon`.
/// Inputs at the upper limit are disturbed downwards so that the chain stays within limits.
/// An input locked by limits narrower than `epsilon` on both sides gets a zero column.
pub fn compute_jacobian(kinematics: &dyn Kinematics, inputs: &[f64], epsilon: f64)
                        -> Result<DMatrix<f64>, FrameSystemError> {
    let limits = joint_limits(kinematics);
    let current_pose = kinematics.forward(inputs)?;
    let current_position = current_pose.translation.vector;
    let current_orientation = current_pose.rotation;

    // Parallelize the loop using rayon
    let jacobian_columns: Vec<_> = (0..inputs.len()).into_par_iter().map(|i| -> Result<_, FrameSystemError> {
        let step = match limits.get(i) {
            Some(limit) if inputs[i] + epsilon > limit.max => {
                if inputs[i] - epsilon < limit.min {
                    return Ok((Vector3::<f64>::zeros(), Vector3::<f64>::zeros()));
                }
                -epsilon
            }
            _ => epsilon,
        };
        let mut perturbed = inputs.to_vec();
        perturbed[i] += step;
        let perturbed_pose = kinematics.forward(&perturbed)?;

        let delta_position = (perturbed_pose.translation.vector - current_position) / step;
        let delta_orientation = (perturbed_pose.rotation * current_orientation.inverse()).scaled_axis() / step;
        Ok((delta_position, delta_orientation))
    }).collect::<Result<_, FrameSystemError>>()?;

    let mut jacobian = DMatrix::zeros(6, inputs.len());
    for (i, (delta_position, delta_orientation)) in jacobian_columns.into_iter().enumerate() {
        jacobian.fixed_view_mut::<3, 1>(0, i).copy_from(&delta_position);
        jacobian.fixed_view_mut::<3, 1>(3, i).copy_from(&delta_orientation);
    }
    Ok(jacobian)
}
