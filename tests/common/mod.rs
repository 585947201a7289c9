#![allow(dead_code)]

use std::sync::Arc;

use nalgebra::{Matrix3, Point2, Point3, Vector3};
use trackout::{
    constants::{CurvilinearError, LocalError},
    det_id::{subdet, DetId, Detector},
    event::TrackCandidate,
    hits::{RecHit, TransientRecHit},
    records::{FitResult, TrackSkeleton},
    services::{
        GeometricRecHitBuilder, MagneticField, Propagator, Surface, SurfaceMapGeometry,
        TrajectoryFitter, UniformMagneticField,
    },
    setup::EventSetup,
    trajectory::{
        Measurement, PropagationDirection, SeedState, Trajectory, TrajectorySeed,
        TrajectoryState,
    },
    TrackoutError,
};

pub const BZ: f64 = 3.8;
pub const LAYERS: usize = 8;

/// Barrel module on layer `i + 1`.
pub fn det(i: usize) -> DetId {
    DetId::new(Detector::Tracker, subdet::TOB, (i + 1) as u8, i as u16)
}

/// Plane at radius `4 + 4i` along x: local x → global y, local y → global z.
pub fn surface(i: usize) -> Surface {
    let rotation = Matrix3::new(0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0);
    Surface::new(Point3::new(4.0 + 4.0 * i as f64, 0.0, 0.0), rotation)
}

pub fn geometry() -> SurfaceMapGeometry {
    let mut g = SurfaceMapGeometry::new();
    for i in 0..LAYERS {
        g.insert(det(i), surface(i));
    }
    g
}

pub fn hit_on(i: usize, y: f64) -> RecHit {
    RecHit::new(det(i), Point2::new(y, 0.0), LocalError::identity() * 1e-4, 2)
}

pub fn state_on(i: usize) -> TrajectoryState {
    TrajectoryState::new(
        surface(i).to_global(&Point2::origin()),
        Vector3::new(1.0, 0.0, 0.5),
        1,
        CurvilinearError::identity(),
    )
}

pub fn seed(charge: i8) -> TrajectorySeed {
    let s = surface(0);
    TrajectorySeed {
        starting_state: SeedState {
            det_id: det(0),
            local_position: Point2::origin(),
            local_momentum: s.to_local_vector(&Vector3::new(1.0, 0.0, 0.5)),
            charge,
            error: CurvilinearError::identity(),
        },
        hits: Vec::new(),
        direction: PropagationDirection::Along,
    }
}

/// Candidate with one hit on each of layers `1..=n_hits`.
pub fn candidate(charge: i8, n_hits: usize) -> TrackCandidate {
    TrackCandidate {
        seed: seed(charge),
        hits: (1..=n_hits).map(|i| hit_on(i, 0.01 * i as f64)).collect(),
    }
}

/// Trajectory with measurement `i` on layer `i`, valid when `valid[i]`.
pub fn trajectory(direction: PropagationDirection, valid: &[bool]) -> Trajectory {
    let mut t = Trajectory::new(seed(1), direction);
    for (i, &ok) in valid.iter().enumerate() {
        let state = state_on(i);
        let rec_hit = if ok {
            TransientRecHit::new(hit_on(i, 0.0), state.position)
        } else {
            TransientRecHit::invalid(det(i))
        };
        t.push(Measurement::new(rec_hit, state), 1.0);
    }
    t
}

pub fn fit_result(direction: PropagationDirection, valid: &[bool]) -> FitResult {
    FitResult {
        trajectory: trajectory(direction, valid),
        track: TrackSkeleton {
            chi2: 4.0,
            ndof: 2.0,
            vertex: Point3::origin(),
            momentum: Vector3::new(1.0, 0.0, 0.5),
            charge: 1,
            covariance: CurvilinearError::identity(),
        },
        seed_direction: PropagationDirection::Along,
    }
}

/// Fitter placing one measurement on each input hit, with the initial momentum.
///
/// Declines when fewer than `min_hits` hits are valid and fails on neutral seeds.
pub struct EchoFitter {
    pub direction: PropagationDirection,
    pub min_hits: usize,
}

impl EchoFitter {
    pub fn along() -> Self {
        EchoFitter {
            direction: PropagationDirection::Along,
            min_hits: 3,
        }
    }
}

impl TrajectoryFitter for EchoFitter {
    fn fit(
        &self,
        seed: &TrajectorySeed,
        hits: &[TransientRecHit],
        initial_state: &TrajectoryState,
    ) -> Result<Option<Trajectory>, TrackoutError> {
        if initial_state.charge == 0 {
            return Err(TrackoutError::FitFailed("neutral seed".into()));
        }
        if hits.iter().filter(|h| h.is_valid()).count() < self.min_hits {
            return Ok(None);
        }

        let mut trajectory = Trajectory::new(seed.clone(), self.direction);
        let ordered: Vec<&TransientRecHit> = match self.direction {
            PropagationDirection::Opposite => hits.iter().rev().collect(),
            _ => hits.iter().collect(),
        };
        for hit in ordered {
            let position = hit
                .global_position()
                .copied()
                .unwrap_or(initial_state.position);
            let state = TrajectoryState::new(
                position,
                initial_state.momentum,
                initial_state.charge,
                initial_state.curvilinear_error,
            );
            trajectory.push(Measurement::new(hit.clone(), state), 0.5);
        }
        Ok(Some(trajectory))
    }
}

pub struct FieldPropagator {
    pub field: UniformMagneticField,
}

impl Propagator for FieldPropagator {
    fn name(&self) -> &str {
        "PropagatorWithMaterial"
    }

    fn direction(&self) -> PropagationDirection {
        PropagationDirection::Along
    }

    fn magnetic_field(&self) -> &dyn MagneticField {
        &self.field
    }
}

/// Event setup with every component registered under its default name.
pub fn setup(fitter: impl TrajectoryFitter + 'static) -> EventSetup {
    let field = UniformMagneticField::along_z(BZ);
    EventSetup::new(Arc::new(geometry()))
        .with_fitter("KFFittingSmoother", Arc::new(fitter))
        .with_propagator("PropagatorWithMaterial", Arc::new(FieldPropagator { field }))
        .with_builder("WithTrackAngle", Arc::new(GeometricRecHitBuilder))
}
