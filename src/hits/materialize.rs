//! Owned copies of the valid hits of a trajectory.
//!
//! The materialized sequence is the single source the assembler iterates to build both the
//! [`HitPattern`](crate::hit_pattern::HitPattern) of a track and the hit references of its
//! extra, so that the two stay aligned with the hit collection they are appended to.

use tracing::trace;

use crate::{hits::RecHit, trackout_errors::TrackoutError, trajectory::Trajectory};

/// An independent copy of a persistent hit, with the index of the measurement it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializedHit {
    pub hit: RecHit,
    pub measurement_index: usize,
}

/// Copy every persistent hit of `trajectory`, in measurement order.
///
/// Measurements without a persistent hit are skipped: no placeholder is emitted and the
/// walk continues.
pub fn materialize(trajectory: &Trajectory) -> Vec<MaterializedHit> {
    trajectory
        .measurements()
        .iter()
        .enumerate()
        .filter_map(|(measurement_index, m)| match m.rec_hit.hit() {
            Some(hit) => Some(MaterializedHit {
                hit: hit.clone(),
                measurement_index,
            }),
            None => {
                let error = TrackoutError::MissingHit(measurement_index);
                trace!(%error, "measurement skipped");
                None
            }
        })
        .collect()
}
