//! Shared builders for unit tests.

use nalgebra::{Point2, Point3, Vector3};

use crate::{
    assembler::ProductIds,
    constants::{CurvilinearError, LocalError},
    det_id::{subdet, DetId, Detector},
    hits::{RecHit, TransientRecHit},
    records::{FitResult, ProductId, TrackSkeleton},
    trajectory::{
        Measurement, PropagationDirection, SeedState, Trajectory, TrajectorySeed,
        TrajectoryState,
    },
};

/// A TIB module on layer `i + 1`, so consecutive indices encode differently.
pub(crate) fn det(i: usize) -> DetId {
    DetId::new(Detector::Tracker, subdet::TIB, (i % 15 + 1) as u8, i as u16)
}

pub(crate) fn hit_at(i: usize) -> RecHit {
    let x = i as f64;
    RecHit::new(
        det(i),
        Point2::new(0.1 * x, -0.2 * x),
        LocalError::identity() * 1e-4,
        2,
    )
}

pub(crate) fn state_at(i: usize) -> TrajectoryState {
    let x = i as f64;
    TrajectoryState::new(
        Point3::new(10.0 + 5.0 * x, 0.5 * x, 2.0 * x),
        Vector3::new(1.0, 0.1, 0.5),
        1,
        CurvilinearError::identity() * (1.0 + x),
    )
}

fn seed() -> TrajectorySeed {
    TrajectorySeed {
        starting_state: SeedState {
            det_id: det(0),
            local_position: Point2::origin(),
            local_momentum: Vector3::new(0.0, 0.0, 1.0),
            charge: 1,
            error: CurvilinearError::identity(),
        },
        hits: Vec::new(),
        direction: PropagationDirection::Along,
    }
}

/// A trajectory whose measurement `i` holds `hit_at(i)` when `valid[i]`, an invalid hit on
/// `det(i)` otherwise, and `state_at(i)` as updated state.
pub(crate) fn trajectory_with(direction: PropagationDirection, valid: &[bool]) -> Trajectory {
    let mut traj = Trajectory::new(seed(), direction);
    for (i, &ok) in valid.iter().enumerate() {
        let state = state_at(i);
        let rec_hit = if ok {
            TransientRecHit::new(hit_at(i), state.position)
        } else {
            TransientRecHit::invalid(det(i))
        };
        traj.push(Measurement::new(rec_hit, state), 1.5);
    }
    traj
}

pub(crate) fn skeleton() -> TrackSkeleton {
    TrackSkeleton {
        chi2: 6.0,
        ndof: 3.0,
        vertex: Point3::new(0.01, -0.02, 0.3),
        momentum: Vector3::new(1.0, 0.1, 0.5),
        charge: 1,
        covariance: CurvilinearError::identity(),
    }
}

pub(crate) fn fit_result(direction: PropagationDirection, valid: &[bool]) -> FitResult {
    FitResult {
        trajectory: trajectory_with(direction, valid),
        track: skeleton(),
        seed_direction: PropagationDirection::Along,
    }
}

pub(crate) fn product_ids(retain: bool) -> ProductIds {
    ProductIds {
        hits: ProductId(1),
        tracks: ProductId(2),
        extras: ProductId(3),
        trajectories: retain.then_some(ProductId(4)),
        association: retain.then_some(ProductId(5)),
    }
}
