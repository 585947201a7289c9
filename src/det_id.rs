//! # Detector identifiers
//!
//! A [`DetId`] is the 32-bit raw identifier of a detector module surface. The layout is:
//!
//! ```text
//!  31    28 27   25 24    20 19   16 15             0
//! +--------+-------+--------+-------+----------------+
//! |  det   | subdet| unused | layer |  module number |
//! +--------+-------+--------+-------+----------------+
//! ```
//!
//! `det` distinguishes the tracker from the muon system, `subdet` the sub-detector inside
//! it, and `layer` the layer / disk index used by the [`HitPattern`](crate::hit_pattern::HitPattern).

use std::fmt;

use serde::{Deserialize, Serialize};

const DET_SHIFT: u32 = 28;
const SUBDET_SHIFT: u32 = 25;
const LAYER_SHIFT: u32 = 16;

/// Top-level detector of a [`DetId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Detector {
    Tracker,
    Muon,
    Other(u8),
}

impl Detector {
    fn code(self) -> u32 {
        match self {
            Detector::Tracker => 1,
            Detector::Muon => 2,
            Detector::Other(c) => u32::from(c & 0xF),
        }
    }
}

/// Tracker sub-detector codes.
pub mod subdet {
    pub const PIXEL_BARREL: u8 = 1;
    pub const PIXEL_ENDCAP: u8 = 2;
    pub const TIB: u8 = 3;
    pub const TID: u8 = 4;
    pub const TOB: u8 = 5;
    pub const TEC: u8 = 6;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DetId(pub u32);

impl DetId {
    /// Pack a detector identifier from its fields. Out-of-range fields are masked.
    pub fn new(det: Detector, subdet: u8, layer: u8, module: u16) -> Self {
        DetId(
            (det.code() << DET_SHIFT)
                | ((u32::from(subdet) & 0x7) << SUBDET_SHIFT)
                | ((u32::from(layer) & 0xF) << LAYER_SHIFT)
                | u32::from(module),
        )
    }

    pub fn raw_id(&self) -> u32 {
        self.0
    }

    pub fn det(&self) -> Detector {
        match self.0 >> DET_SHIFT {
            1 => Detector::Tracker,
            2 => Detector::Muon,
            c => Detector::Other(c as u8),
        }
    }

    pub fn subdet_id(&self) -> u8 {
        ((self.0 >> SUBDET_SHIFT) & 0x7) as u8
    }

    pub fn layer(&self) -> u8 {
        ((self.0 >> LAYER_SHIFT) & 0xF) as u8
    }

    pub fn module(&self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }
}

impl fmt::Display for DetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
