//! # Constants and type definitions for trackout
//!
//! This module centralizes the **physical constants**, the **hit-pattern layout**, and the
//! **common type aliases** shared by the finalization pipeline.
//!
//! ## Overview
//!
//! - Charged-particle bending constant (GeV, Tesla, centimeter units)
//! - Fixed-size hit-pattern geometry (words, bits per hit, capacity)
//! - Default component names used by [`ProducerConfig`](crate::config::ProducerConfig)
//! - Core matrix/vector aliases built on `nalgebra`

use nalgebra::{Matrix2, Matrix5};

// -------------------------------------------------------------------------------------------------
// Physical constants and unit conversions
// -------------------------------------------------------------------------------------------------

/// Speed of light expressed as a bending constant: `pt [GeV] = C · |q| · B [T] · R [cm]`.
pub const C_GEV_PER_TESLA_CM: f64 = 0.002_997_924_58;

/// Field magnitude (Tesla) below which a state is transported as a straight line.
pub const MIN_BENDING_FIELD: f64 = 1e-9;

/// Number of track parameters; a fitted track loses this many degrees of freedom.
pub const TRACK_PARAMETERS: f64 = 5.0;

/// `normalized_chi2` scale applied when a track has zero degrees of freedom.
pub const ZERO_NDOF_CHI2_SCALE: f64 = 1e6;

// -------------------------------------------------------------------------------------------------
// Hit pattern layout
// -------------------------------------------------------------------------------------------------

/// Number of 32-bit words in a [`HitPattern`](crate::hit_pattern::HitPattern).
pub const HIT_PATTERN_WORDS: usize = 25;

/// Number of bits used to encode one hit.
pub const HIT_PATTERN_HIT_BITS: usize = 10;

/// Maximum number of hits a pattern can hold; further hits are dropped.
pub const HIT_PATTERN_CAPACITY: usize = HIT_PATTERN_WORDS * 32 / HIT_PATTERN_HIT_BITS;

// -------------------------------------------------------------------------------------------------
// Default component labels
// -------------------------------------------------------------------------------------------------

pub const DEFAULT_SRC: &str = "ckfTrackCandidates";
pub const DEFAULT_FITTER: &str = "KFFittingSmoother";
pub const DEFAULT_PROPAGATOR: &str = "PropagatorWithMaterial";
pub const DEFAULT_TTRH_BUILDER: &str = "WithTrackAngle";

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// 5×5 error matrix in curvilinear frame `(q/p, λ, φ, x⊥, y⊥)`.
pub type CurvilinearError = Matrix5<f64>;

/// 2×2 local measurement error on a detector surface.
pub type LocalError = Matrix2<f64>;

/// Sequential position inside one published collection.
pub type Key = usize;
