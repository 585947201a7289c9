//! Outer / inner state selection for a fitted trajectory.

use crate::{
    det_id::DetId,
    trackout_errors::TrackoutError,
    trajectory::{PropagationDirection, Trajectory, TrajectoryState},
};

/// The two end states of a trajectory, oriented along the particle path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryStates<'a> {
    pub outer: &'a TrajectoryState,
    pub inner: &'a TrajectoryState,
    pub outer_det_id: DetId,
    pub inner_det_id: DetId,
}

/// Determine which end of `trajectory` is outer and which is inner.
///
/// For an `Along` chain the last measurement is the outermost one; for an `Opposite`
/// chain the assignment is reversed.
///
/// Return
/// ----------
/// * The oriented [`BoundaryStates`], borrowing from the trajectory.
/// * [`TrackoutError::MalformedTrajectory`] if the direction is `Undefined` or the chain
///   holds no measurement.
pub fn extract(trajectory: &Trajectory) -> Result<BoundaryStates<'_>, TrackoutError> {
    let (Some(first), Some(last)) = (trajectory.first_measurement(), trajectory.last_measurement())
    else {
        return Err(TrackoutError::MalformedTrajectory(
            "trajectory has no measurement".into(),
        ));
    };

    let (outer, inner) = match trajectory.direction() {
        PropagationDirection::Along => (last, first),
        PropagationDirection::Opposite => (first, last),
        PropagationDirection::Undefined => {
            return Err(TrackoutError::MalformedTrajectory(
                "undefined propagation direction".into(),
            ))
        }
    };

    Ok(BoundaryStates {
        outer: &outer.updated_state,
        inner: &inner.updated_state,
        outer_det_id: outer.det_id(),
        inner_det_id: inner.det_id(),
    })
}
