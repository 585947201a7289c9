//! # Track report
//!
//! Human-readable dump of the tracks published for one event, going through the extras to
//! the hits and placing each hit in the global frame with the tracking geometry. Useful to
//! eyeball the output of a producer:
//!
//! ```text
//! Event run 1 event 7: reconstructed 1 tracks
//! Track number 1
//!     momentum: (0.9950, 0.0998, 0.5000)
//!     pt: 1.0000
//!     ...
//!     From extra:
//!         outer pt: 1.0000
//!         number of hits: 3
//!             hit on det 369164288 local (0.1000, 0.0000) global (10.0000, 0.1000, 0.0000)
//! ```

use std::fmt;

use itertools::Itertools;
use nalgebra::{Point2, Point3, Vector3};

use crate::{
    assembler::TrackProducts, det_id::DetId, event::EventId, services::TrackingGeometry,
    trackout_errors::TrackoutError,
};

#[derive(Debug, Clone, PartialEq)]
pub struct HitEntry {
    pub det_id: DetId,
    pub local_position: Point2<f64>,
    /// `None` when the module is unknown to the geometry.
    pub global_position: Option<Point3<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackEntry {
    pub momentum: Vector3<f64>,
    pub pt: f64,
    pub vertex: Point3<f64>,
    pub d0: f64,
    pub charge: i8,
    pub normalized_chi2: f64,
    pub outer_pt: f64,
    pub hits: Vec<HitEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackReport {
    pub event: EventId,
    pub tracks: Vec<TrackEntry>,
}

impl TrackReport {
    /// Build the report of `products`.
    ///
    /// Return
    /// ----------
    /// * The report, tracks in collection order.
    /// * [`TrackoutError::DanglingReference`] if a track's extra or hits do not resolve.
    pub fn new(
        event: EventId,
        products: &TrackProducts,
        geometry: &dyn TrackingGeometry,
    ) -> Result<Self, TrackoutError> {
        let tracks = products
            .tracks
            .iter()
            .map(|track| {
                let extra = products.extra_of(track)?;
                let hits = products
                    .hits_of(extra)?
                    .into_iter()
                    .map(|hit| HitEntry {
                        det_id: hit.det_id,
                        local_position: hit.local_position,
                        global_position: geometry
                            .surface(hit.det_id)
                            .map(|s| s.to_global(&hit.local_position)),
                    })
                    .collect();

                Ok(TrackEntry {
                    momentum: track.momentum,
                    pt: track.pt(),
                    vertex: track.vertex,
                    d0: track.d0(),
                    charge: track.charge,
                    normalized_chi2: track.normalized_chi2(),
                    outer_pt: extra.outer_pt(),
                    hits,
                })
            })
            .collect::<Result<Vec<_>, TrackoutError>>()?;

        Ok(TrackReport { event, tracks })
    }
}

fn coords<'a>(it: impl IntoIterator<Item = &'a f64>) -> String {
    format!("({})", it.into_iter().map(|c| format!("{c:.4}")).join(", "))
}

impl fmt::Display for TrackReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Event {}: reconstructed {} tracks", self.event, self.tracks.len())?;
        for (i, t) in self.tracks.iter().enumerate() {
            writeln!(f, "Track number {}", i + 1)?;
            writeln!(f, "    momentum: {}", coords(t.momentum.iter()))?;
            writeln!(f, "    pt: {:.4}", t.pt)?;
            writeln!(f, "    vertex: {}", coords(t.vertex.iter()))?;
            writeln!(f, "    impact parameter: {:.4}", t.d0)?;
            writeln!(f, "    charge: {}", t.charge)?;
            writeln!(f, "    normalized chi2: {:.4}", t.normalized_chi2)?;
            writeln!(f, "    From extra:")?;
            writeln!(f, "        outer pt: {:.4}", t.outer_pt)?;
            writeln!(f, "        number of hits: {}", t.hits.len())?;
            for h in &t.hits {
                let global = h
                    .global_position
                    .as_ref()
                    .map_or_else(|| "unknown".to_string(), |g| coords(g.iter()));
                writeln!(
                    f,
                    "            hit on det {} local {} global {}",
                    h.det_id,
                    coords(h.local_position.iter()),
                    global
                )?;
            }
        }
        Ok(())
    }
}
