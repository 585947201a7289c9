//! # Fitted trajectories
//!
//! A [`Trajectory`] is the chain of [`Measurement`]s produced by an external
//! [`TrajectoryFitter`](crate::services::TrajectoryFitter) for one seed. Each measurement
//! pairs the [`TransientRecHit`] used at that point with the fitted (updated)
//! [`TrajectoryState`] on the module surface.
//!
//! The chain is stored in fit order. Its [`PropagationDirection`] says whether that order
//! follows the particle momentum (`Along`: first measurement is the innermost) or runs
//! against it (`Opposite`: first measurement is the outermost).
//!
//! ## See also
//! ------------
//! * [`extract`](crate::trajectory::boundary::extract) – Outer/inner state selection.
//! * [`TrajectorySeed`] – The seed a trajectory was fitted from.

pub mod boundary;

use nalgebra::{Point2, Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::{constants::CurvilinearError, det_id::DetId, hits::RecHit, hits::TransientRecHit};

/// Direction of a measurement chain relative to the particle momentum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropagationDirection {
    Along,
    Opposite,
    Undefined,
}

/// Global kinematic state of a charged particle.
///
/// # Fields
///
/// * `position` - Global position (cm)
/// * `momentum` - Global momentum (GeV)
/// * `charge` - Electric charge in units of e
/// * `curvilinear_error` - 5×5 error matrix in curvilinear frame
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryState {
    pub position: Point3<f64>,
    pub momentum: Vector3<f64>,
    pub charge: i8,
    pub curvilinear_error: CurvilinearError,
}

impl TrajectoryState {
    pub fn new(
        position: Point3<f64>,
        momentum: Vector3<f64>,
        charge: i8,
        curvilinear_error: CurvilinearError,
    ) -> Self {
        TrajectoryState {
            position,
            momentum,
            charge,
            curvilinear_error,
        }
    }

    /// Transverse momentum (GeV).
    pub fn pt(&self) -> f64 {
        self.momentum.x.hypot(self.momentum.y)
    }

    pub fn is_finite(&self) -> bool {
        self.position.iter().all(|v| v.is_finite())
            && self.momentum.iter().all(|v| v.is_finite())
            && self.curvilinear_error.iter().all(|v| v.is_finite())
    }
}

/// One point of a trajectory.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub rec_hit: TransientRecHit,
    pub updated_state: TrajectoryState,
}

impl Measurement {
    pub fn new(rec_hit: TransientRecHit, updated_state: TrajectoryState) -> Self {
        Measurement {
            rec_hit,
            updated_state,
        }
    }

    pub fn det_id(&self) -> DetId {
        self.rec_hit.det_id()
    }
}

/// Starting state of a seed, expressed on the surface of the module `det_id`.
///
/// # Fields
///
/// * `det_id` - The module whose surface the state lies on
/// * `local_position` - Position in the surface frame (cm)
/// * `local_momentum` - Momentum in the surface frame (GeV)
/// * `charge` - Electric charge in units of e
/// * `error` - Curvilinear error of the starting state
#[derive(Debug, Clone, PartialEq)]
pub struct SeedState {
    pub det_id: DetId,
    pub local_position: Point2<f64>,
    pub local_momentum: Vector3<f64>,
    pub charge: i8,
    pub error: CurvilinearError,
}

/// The pattern-recognition seed a fit starts from.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectorySeed {
    pub starting_state: SeedState,
    pub hits: Vec<RecHit>,
    pub direction: PropagationDirection,
}

/// An ordered chain of fitted measurements.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    seed: TrajectorySeed,
    direction: PropagationDirection,
    measurements: Vec<Measurement>,
    chi_squared: f64,
}

impl Trajectory {
    pub fn new(seed: TrajectorySeed, direction: PropagationDirection) -> Self {
        Trajectory {
            seed,
            direction,
            measurements: Vec::new(),
            chi_squared: 0.0,
        }
    }

    /// Append a measurement and its χ² increment.
    pub fn push(&mut self, measurement: Measurement, chi2_increment: f64) {
        self.measurements.push(measurement);
        self.chi_squared += chi2_increment;
    }

    pub fn seed(&self) -> &TrajectorySeed {
        &self.seed
    }

    pub fn direction(&self) -> PropagationDirection {
        self.direction
    }

    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    pub fn first_measurement(&self) -> Option<&Measurement> {
        self.measurements.first()
    }

    pub fn last_measurement(&self) -> Option<&Measurement> {
        self.measurements.last()
    }

    pub fn chi_squared(&self) -> f64 {
        self.chi_squared
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    /// Number of measurements whose hit is valid.
    pub fn found_hits(&self) -> usize {
        self.measurements
            .iter()
            .filter(|m| m.rec_hit.is_valid())
            .count()
    }
}
