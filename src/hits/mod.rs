//! # Reconstructed hits
//!
//! Two hit flavours flow through the pipeline:
//!
//! * [`RecHit`] – the **persistent** hit: detector id, local position and error on the
//!   module surface, measurement dimension and [`HitType`]. This is what the published
//!   hit collection stores.
//! * [`TransientRecHit`] – the view the fitter works with: the persistent hit (if any)
//!   plus its global position, resolved through the tracking geometry by a
//!   [`RecHitBuilder`](crate::services::RecHitBuilder). A transient hit without a
//!   persistent hit marks a crossed module that produced nothing usable.
//!
//! ## See also
//! ------------
//! * [`materialize`](crate::hits::materialize::materialize) – Owned copies of the valid hits of a trajectory.
//! * [`HitPattern`](crate::hit_pattern::HitPattern) – Per-layer summary built from materialized hits.

pub mod materialize;

use nalgebra::{Point2, Point3};

use crate::{constants::LocalError, det_id::DetId};

/// Quality flag of a hit, stored in the two low bits of its hit-pattern slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HitType {
    Valid = 0,
    Missing = 1,
    Inactive = 2,
    Bad = 3,
}

impl HitType {
    pub fn from_bits(bits: u32) -> Self {
        match bits & 0x3 {
            0 => HitType::Valid,
            1 => HitType::Missing,
            2 => HitType::Inactive,
            _ => HitType::Bad,
        }
    }
}

/// A persistent reconstructed hit.
///
/// # Fields
///
/// * `det_id` - The module the hit lies on
/// * `local_position` - Position in the module's local frame (cm)
/// * `local_error` - Local position error matrix (cm²)
/// * `dimension` - Number of measured coordinates (1 for strips, 2 for pixels)
/// * `hit_type` - Validity flag
#[derive(Debug, Clone, PartialEq)]
pub struct RecHit {
    pub det_id: DetId,
    pub local_position: Point2<f64>,
    pub local_error: LocalError,
    pub dimension: u8,
    pub hit_type: HitType,
}

impl RecHit {
    /// Create a valid hit.
    pub fn new(
        det_id: DetId,
        local_position: Point2<f64>,
        local_error: LocalError,
        dimension: u8,
    ) -> Self {
        RecHit {
            det_id,
            local_position,
            local_error,
            dimension,
            hit_type: HitType::Valid,
        }
    }

    /// Create a placeholder hit recording that `det_id` was crossed without a usable measurement.
    pub fn lost(det_id: DetId, hit_type: HitType) -> Self {
        RecHit {
            det_id,
            local_position: Point2::origin(),
            local_error: LocalError::zeros(),
            dimension: 0,
            hit_type,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.hit_type == HitType::Valid
    }
}

/// A hit as seen by the fitter.
#[derive(Debug, Clone, PartialEq)]
pub struct TransientRecHit {
    det_id: DetId,
    hit: Option<RecHit>,
    global_position: Option<Point3<f64>>,
}

impl TransientRecHit {
    pub fn new(hit: RecHit, global_position: Point3<f64>) -> Self {
        TransientRecHit {
            det_id: hit.det_id,
            hit: Some(hit),
            global_position: Some(global_position),
        }
    }

    /// A crossed module without any persistent hit.
    pub fn invalid(det_id: DetId) -> Self {
        TransientRecHit {
            det_id,
            hit: None,
            global_position: None,
        }
    }

    /// A crossed module recorded by a placeholder hit of a non-valid `hit_type`.
    ///
    /// The placeholder is stored like any other hit, so the module shows up in the track's
    /// hit pattern as lost.
    pub fn lost(det_id: DetId, hit_type: HitType) -> Self {
        TransientRecHit {
            det_id,
            hit: Some(RecHit::lost(det_id, hit_type)),
            global_position: None,
        }
    }

    pub fn det_id(&self) -> DetId {
        self.det_id
    }

    /// The persistent hit, `None` when the measurement carries none.
    pub fn hit(&self) -> Option<&RecHit> {
        self.hit.as_ref()
    }

    pub fn global_position(&self) -> Option<&Point3<f64>> {
        self.global_position.as_ref()
    }

    pub fn is_valid(&self) -> bool {
        self.hit.as_ref().is_some_and(RecHit::is_valid)
    }

    pub fn dimension(&self) -> u8 {
        self.hit.as_ref().map_or(0, |h| h.dimension)
    }
}
