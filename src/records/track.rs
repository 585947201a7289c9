//! Track summary records.

use std::fmt;

use nalgebra::{Point3, Vector3};

use crate::{
    constants::{CurvilinearError, ZERO_NDOF_CHI2_SCALE},
    hit_pattern::HitPattern,
    hits::materialize::MaterializedHit,
    records::{extra::OutputExtra, Ref, TrackSkeleton},
};

/// A published track: kinematics at the reference point, hit pattern and extra reference.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTrack {
    pub chi2: f64,
    pub ndof: f64,
    pub vertex: Point3<f64>,
    pub momentum: Vector3<f64>,
    pub charge: i8,
    pub covariance: CurvilinearError,
    hit_pattern: HitPattern,
    extra: Option<Ref<OutputExtra>>,
}

impl OutputTrack {
    pub fn hit_pattern(&self) -> &HitPattern {
        &self.hit_pattern
    }

    /// The extra of this track; always set on published tracks.
    pub fn extra(&self) -> Option<Ref<OutputExtra>> {
        self.extra
    }

    pub(crate) fn set_extra(&mut self, extra: Ref<OutputExtra>) {
        self.extra = Some(extra);
    }

    pub fn pt(&self) -> f64 {
        self.momentum.x.hypot(self.momentum.y)
    }

    pub fn p(&self) -> f64 {
        self.momentum.norm()
    }

    pub fn phi(&self) -> f64 {
        self.momentum.y.atan2(self.momentum.x)
    }

    pub fn eta(&self) -> f64 {
        let theta = self.pt().atan2(self.momentum.z);
        -(theta / 2.0).tan().ln()
    }

    /// Signed transverse impact parameter with respect to the origin.
    pub fn dxy(&self) -> f64 {
        (-self.vertex.x * self.momentum.y + self.vertex.y * self.momentum.x) / self.pt()
    }

    pub fn d0(&self) -> f64 {
        -self.dxy()
    }

    /// Longitudinal impact parameter with respect to the origin.
    pub fn dz(&self) -> f64 {
        let pt = self.pt();
        self.vertex.z
            - (self.vertex.x * self.momentum.x + self.vertex.y * self.momentum.y) / pt
                * (self.momentum.z / pt)
    }

    pub fn normalized_chi2(&self) -> f64 {
        if self.ndof != 0.0 {
            self.chi2 / self.ndof
        } else {
            self.chi2 * ZERO_NDOF_CHI2_SCALE
        }
    }

    /// Number of valid hits.
    pub fn found(&self) -> usize {
        self.hit_pattern.number_of_valid_hits()
    }

    /// Number of missing hits.
    pub fn lost(&self) -> usize {
        self.hit_pattern.number_of_lost_hits()
    }
}

impl fmt::Display for OutputTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "found={}, lost={}, chi2/ndof={:.3}, pt={:.3}",
            self.found(),
            self.lost(),
            self.normalized_chi2(),
            self.pt()
        )
    }
}

/// Build the track record of one fit.
///
/// Kinematics are copied from `skeleton`; the hit pattern is filled from `hits` strictly in
/// the given order, slot `i` holding the `i`-th materialized hit. The extra reference is
/// left unset for the assembler to wire.
pub fn build_track(skeleton: TrackSkeleton, hits: &[MaterializedHit]) -> OutputTrack {
    let mut hit_pattern = HitPattern::new();
    for (i, m) in hits.iter().enumerate() {
        if !hit_pattern.set(&m.hit, i) {
            tracing::trace!(dropped = hits.len() - i, "hit pattern full");
            break;
        }
    }

    let TrackSkeleton {
        chi2,
        ndof,
        vertex,
        momentum,
        charge,
        covariance,
    } = skeleton;

    OutputTrack {
        chi2,
        ndof,
        vertex,
        momentum,
        charge,
        covariance,
        hit_pattern,
        extra: None,
    }
}
