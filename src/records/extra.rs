//! Track extra records: boundary kinematics and hit references.

use nalgebra::{Point3, Vector3};
use smallvec::SmallVec;

use crate::{
    constants::CurvilinearError,
    det_id::DetId,
    hits::RecHit,
    records::Ref,
    trajectory::{boundary::BoundaryStates, PropagationDirection},
};

/// Hit references of one extra, in trajectory order.
pub type HitRefs = SmallVec<[Ref<RecHit>; 16]>;

/// Auxiliary per-track record.
///
/// # Fields
///
/// * `outer_*` / `inner_*` - Position, momentum, validity flag, curvilinear error and
///   module id at the outermost / innermost measurement
/// * `seed_direction` - Direction of the seed the track was fitted from
/// * `hits` - References into the published hit collection
#[derive(Debug, Clone, PartialEq)]
pub struct OutputExtra {
    pub outer_position: Point3<f64>,
    pub outer_momentum: Vector3<f64>,
    pub outer_ok: bool,
    pub inner_position: Point3<f64>,
    pub inner_momentum: Vector3<f64>,
    pub inner_ok: bool,
    pub outer_state_covariance: CurvilinearError,
    pub outer_det_id: DetId,
    pub inner_state_covariance: CurvilinearError,
    pub inner_det_id: DetId,
    pub seed_direction: PropagationDirection,
    hits: HitRefs,
}

impl OutputExtra {
    pub fn hits(&self) -> &[Ref<RecHit>] {
        &self.hits
    }

    pub fn outer_pt(&self) -> f64 {
        self.outer_momentum.x.hypot(self.outer_momentum.y)
    }

    pub fn inner_pt(&self) -> f64 {
        self.inner_momentum.x.hypot(self.inner_momentum.y)
    }
}

/// Build the extra record of one fit.
///
/// Both boundary states are flagged valid: the fit guarantees them by the time a trajectory
/// reaches finalization. `hit_refs` must already be in trajectory order and point at the
/// positions the materialized hits take in the hit collection.
pub fn build_extra(
    boundary: &BoundaryStates<'_>,
    seed_direction: PropagationDirection,
    hit_refs: impl IntoIterator<Item = Ref<RecHit>>,
) -> OutputExtra {
    OutputExtra {
        outer_position: boundary.outer.position,
        outer_momentum: boundary.outer.momentum,
        outer_ok: true,
        inner_position: boundary.inner.position,
        inner_momentum: boundary.inner.momentum,
        inner_ok: true,
        outer_state_covariance: boundary.outer.curvilinear_error,
        outer_det_id: boundary.outer_det_id,
        inner_state_covariance: boundary.inner.curvilinear_error,
        inner_det_id: boundary.inner_det_id,
        seed_direction,
        hits: hit_refs.into_iter().collect(),
    }
}

#[cfg(test)]
mod extra_test {
    use super::*;
    use crate::{
        records::ProductId, test_fixtures::trajectory_with, trajectory::boundary::extract,
    };

    #[test]
    fn test_copies_boundary_states() {
        let traj = trajectory_with(PropagationDirection::Opposite, &[true, true, false]);
        let boundary = extract(&traj).unwrap();
        let refs = (4..6).map(|k| Ref::new(ProductId(7), k));

        let extra = build_extra(&boundary, PropagationDirection::Along, refs);

        assert_eq!(extra.outer_position, traj.measurements()[0].updated_state.position);
        assert_eq!(extra.inner_momentum, traj.measurements()[2].updated_state.momentum);
        assert_eq!(extra.inner_det_id, traj.measurements()[2].det_id());
        assert!(extra.outer_ok && extra.inner_ok);
        assert_eq!(extra.seed_direction, PropagationDirection::Along);
        assert_eq!(
            extra.hits().iter().map(Ref::key).collect::<Vec<_>>(),
            vec![4, 5]
        );
    }
}
