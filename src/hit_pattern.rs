//! # Hit pattern
//!
//! A [`HitPattern`] is a fixed-size, order-sensitive summary of the hits of a track. Each
//! hit occupies one 10-bit slot, written at the position given by its rank along the
//! trajectory:
//!
//! ```text
//!   bit  9      8..6      5..2     1..0
//!  +--------+---------+--------+---------+
//!  | tracker| subdet  | layer  | hit type|
//!  +--------+---------+--------+---------+
//! ```
//!
//! Slots are packed back to back across [`HIT_PATTERN_WORDS`] 32-bit words, so a slot may
//! straddle two words. The number of filled slots is kept next to the words, since a
//! non-tracker hit with sub-detector and layer 0 encodes to an all-zero slot.
//!
//! Hits beyond [`HIT_PATTERN_CAPACITY`] are not recorded.

use std::fmt;

use crate::{
    constants::{HIT_PATTERN_CAPACITY, HIT_PATTERN_HIT_BITS, HIT_PATTERN_WORDS},
    det_id::{subdet, Detector},
    hits::{HitType, RecHit},
};

const TYPE_MASK: u32 = 0x3;
const LAYER_SHIFT: u32 = 2;
const LAYER_MASK: u32 = 0xF;
const SUBDET_SHIFT: u32 = 6;
const SUBDET_MASK: u32 = 0x7;
const TRACKER_SHIFT: u32 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HitPattern {
    words: [u32; HIT_PATTERN_WORDS],
    len: u8,
}

impl HitPattern {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode one hit into its 10-bit slot value.
    pub fn encode(hit: &RecHit) -> u32 {
        let tracker = u32::from(hit.det_id.det() == Detector::Tracker);
        (tracker << TRACKER_SHIFT)
            | ((u32::from(hit.det_id.subdet_id()) & SUBDET_MASK) << SUBDET_SHIFT)
            | ((u32::from(hit.det_id.layer()) & LAYER_MASK) << LAYER_SHIFT)
            | (hit.hit_type as u32 & TYPE_MASK)
    }

    /// Record `hit` in slot `position`.
    ///
    /// Positions are expected to be consecutive ranks along the trajectory, starting at 0.
    /// Returns `false` when the position is beyond the pattern capacity.
    pub fn set(&mut self, hit: &RecHit, position: usize) -> bool {
        if position >= HIT_PATTERN_CAPACITY {
            return false;
        }
        let pattern = Self::encode(hit);
        let offset = position * HIT_PATTERN_HIT_BITS;
        for bit in 0..HIT_PATTERN_HIT_BITS {
            self.set_bit(offset + bit, (pattern >> bit) & 1 == 1);
        }
        // capacity is below u8::MAX
        self.len = self.len.max((position + 1) as u8);
        true
    }

    /// Raw 10-bit slot value at `position` (0 when empty or out of range).
    pub fn get_hit_pattern(&self, position: usize) -> u32 {
        if position >= HIT_PATTERN_CAPACITY {
            return 0;
        }
        let offset = position * HIT_PATTERN_HIT_BITS;
        (0..HIT_PATTERN_HIT_BITS).fold(0, |acc, bit| {
            acc | (u32::from(self.get_bit(offset + bit)) << bit)
        })
    }

    fn set_bit(&mut self, index: usize, value: bool) {
        let (word, bit) = (index / 32, index % 32);
        if value {
            self.words[word] |= 1 << bit;
        } else {
            self.words[word] &= !(1 << bit);
        }
    }

    fn get_bit(&self, index: usize) -> bool {
        (self.words[index / 32] >> (index % 32)) & 1 == 1
    }

    /// Filled slot values, in trajectory order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        (0..usize::from(self.len)).map(|i| self.get_hit_pattern(i))
    }

    pub fn number_of_hits(&self) -> usize {
        usize::from(self.len)
    }

    pub fn number_of_valid_hits(&self) -> usize {
        self.iter().filter(|&p| Self::hit_type(p) == HitType::Valid).count()
    }

    pub fn number_of_lost_hits(&self) -> usize {
        self.iter().filter(|&p| Self::hit_type(p) == HitType::Missing).count()
    }

    pub fn number_of_valid_pixel_hits(&self) -> usize {
        self.iter()
            .filter(|&p| Self::valid_tracker_hit(p) && Self::is_pixel(p))
            .count()
    }

    pub fn number_of_valid_strip_hits(&self) -> usize {
        self.iter()
            .filter(|&p| Self::valid_tracker_hit(p) && Self::is_strip(p))
            .count()
    }

    pub fn hit_type(pattern: u32) -> HitType {
        HitType::from_bits(pattern)
    }

    pub fn layer(pattern: u32) -> u8 {
        ((pattern >> LAYER_SHIFT) & LAYER_MASK) as u8
    }

    pub fn subdet(pattern: u32) -> u8 {
        ((pattern >> SUBDET_SHIFT) & SUBDET_MASK) as u8
    }

    pub fn is_tracker_hit(pattern: u32) -> bool {
        (pattern >> TRACKER_SHIFT) & 1 == 1
    }

    fn valid_tracker_hit(pattern: u32) -> bool {
        Self::is_tracker_hit(pattern) && Self::hit_type(pattern) == HitType::Valid
    }

    fn is_pixel(pattern: u32) -> bool {
        matches!(
            Self::subdet(pattern),
            subdet::PIXEL_BARREL | subdet::PIXEL_ENDCAP
        )
    }

    fn is_strip(pattern: u32) -> bool {
        (subdet::TIB..=subdet::TEC).contains(&Self::subdet(pattern))
    }
}

impl fmt::Display for HitPattern {
    /// One `subdet:layer:type` token per filled slot.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for p in self.iter() {
            if !first {
                write!(f, " ")?;
            }
            first = false;
            write!(
                f,
                "{}{}:{}:{}",
                if Self::is_tracker_hit(p) { "" } else { "mu" },
                Self::subdet(p),
                Self::layer(p),
                Self::hit_type(p) as u8
            )?;
        }
        Ok(())
    }
}
