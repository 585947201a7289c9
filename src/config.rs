//! # Producer configuration
//!
//! [`ProducerConfig`] gathers the parameters shared by
//! [`TrackProducer`](crate::producer::TrackProducer) and
//! [`TrackRefitter`](crate::producer::TrackRefitter): where the input is read from, which
//! named components of the [`EventSetup`](crate::setup::EventSetup) are used, and how the
//! finalization pass treats problematic items.
//!
//! A configuration can be built in code through [`ProducerConfig::builder`] or loaded from
//! TOML; missing keys take their defaults:
//!
//! ```toml
//! src = "ckfTrackCandidates"
//! fitter = "KFFittingSmoother"
//! propagator = "PropagatorWithMaterial"
//! ttrh_builder = "WithTrackAngle"
//! trajectory_in_event = true
//! item_error_policy = "skip"      # or "abort"
//! keep_hitless_tracks = true
//! reference_point = [0.0, 0.0, 0.0]
//! ```
//!
//! Both paths go through the same validation.

use std::{fmt, fs, path::Path};

use nalgebra::Point3;
use serde::Deserialize;

use crate::{
    assembler::{FinalizeParams, ItemErrorPolicy},
    constants::{DEFAULT_FITTER, DEFAULT_PROPAGATOR, DEFAULT_SRC, DEFAULT_TTRH_BUILDER},
    event::InputTag,
    trackout_errors::TrackoutError,
};

/// Configuration of a track producer or refitter.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProducerConfig {
    /// Input collection: track candidates for the producer, tracks for the refitter.
    pub src: InputTag,
    /// Name of the [`TrajectoryFitter`](crate::services::TrajectoryFitter).
    pub fitter: String,
    /// Name of the [`Propagator`](crate::services::Propagator).
    pub propagator: String,
    /// Name of the [`RecHitBuilder`](crate::services::RecHitBuilder).
    pub ttrh_builder: String,
    /// Also publish the fitted trajectories and the trajectory → track association.
    pub trajectory_in_event: bool,
    pub item_error_policy: ItemErrorPolicy,
    pub keep_hitless_tracks: bool,
    /// Point the track parameters are expressed at (cm).
    pub reference_point: [f64; 3],
}

impl Default for ProducerConfig {
    fn default() -> Self {
        ProducerConfig {
            src: InputTag::new(DEFAULT_SRC),
            fitter: DEFAULT_FITTER.to_string(),
            propagator: DEFAULT_PROPAGATOR.to_string(),
            ttrh_builder: DEFAULT_TTRH_BUILDER.to_string(),
            trajectory_in_event: false,
            item_error_policy: ItemErrorPolicy::Skip,
            keep_hitless_tracks: true,
            reference_point: [0.0; 3],
        }
    }
}

impl ProducerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new [`ProducerConfigBuilder`] initialized with the defaults.
    ///
    /// # Example
    ///
    /// ```rust
    /// use trackout::config::ProducerConfig;
    ///
    /// let config = ProducerConfig::builder()
    ///     .src("ctfCandidates")
    ///     .fitter("RKFittingSmoother")
    ///     .trajectory_in_event(true)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.src.label, "ctfCandidates");
    /// ```
    pub fn builder() -> ProducerConfigBuilder {
        ProducerConfigBuilder::new()
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, TrackoutError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, TrackoutError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), TrackoutError> {
        if self.src.label.trim().is_empty() {
            return Err(TrackoutError::InvalidProducerParameter(
                "src must name an input collection".into(),
            ));
        }
        for (key, name) in [
            ("fitter", &self.fitter),
            ("propagator", &self.propagator),
            ("ttrh_builder", &self.ttrh_builder),
        ] {
            if name.trim().is_empty() {
                return Err(TrackoutError::InvalidProducerParameter(format!(
                    "{key} must not be empty"
                )));
            }
        }
        if !self.reference_point.iter().all(|v| v.is_finite()) {
            return Err(TrackoutError::InvalidProducerParameter(
                "reference_point must be finite".into(),
            ));
        }
        Ok(())
    }

    pub fn reference_point(&self) -> Point3<f64> {
        Point3::from(self.reference_point)
    }

    /// Options of the finalization pass derived from this configuration.
    pub fn finalize_params(&self) -> FinalizeParams {
        FinalizeParams {
            retain_trajectories: self.trajectory_in_event,
            item_error_policy: self.item_error_policy,
            keep_hitless_tracks: self.keep_hitless_tracks,
        }
    }
}

/// Builder for [`ProducerConfig`], with validation.
#[derive(Debug, Clone, Default)]
pub struct ProducerConfigBuilder {
    config: ProducerConfig,
}

impl ProducerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn src(mut self, v: impl Into<InputTag>) -> Self {
        self.config.src = v.into();
        self
    }
    pub fn fitter(mut self, v: impl Into<String>) -> Self {
        self.config.fitter = v.into();
        self
    }
    pub fn propagator(mut self, v: impl Into<String>) -> Self {
        self.config.propagator = v.into();
        self
    }
    pub fn ttrh_builder(mut self, v: impl Into<String>) -> Self {
        self.config.ttrh_builder = v.into();
        self
    }
    pub fn trajectory_in_event(mut self, v: bool) -> Self {
        self.config.trajectory_in_event = v;
        self
    }
    pub fn item_error_policy(mut self, v: ItemErrorPolicy) -> Self {
        self.config.item_error_policy = v;
        self
    }
    pub fn keep_hitless_tracks(mut self, v: bool) -> Self {
        self.config.keep_hitless_tracks = v;
        self
    }
    pub fn reference_point(mut self, v: Point3<f64>) -> Self {
        self.config.reference_point = [v.x, v.y, v.z];
        self
    }

    pub fn build(self) -> Result<ProducerConfig, TrackoutError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl fmt::Display for ProducerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            const PARAM_COL: usize = 48;
            writeln!(f, "Track Producer Parameters")?;
            writeln!(f, "-------------------------")?;

            macro_rules! line {
                ($fmt:expr, $val:expr, $comment:expr) => {{
                    let s = format!($fmt, $val);
                    let pad = if s.len() < PARAM_COL {
                        " ".repeat(PARAM_COL - s.len())
                    } else {
                        " ".to_string()
                    };
                    writeln!(f, "  {}{}# {}", s, pad, $comment)
                }};
            }

            writeln!(f, "[Input / components]")?;
            line!("src                 = {}", self.src, "Input collection")?;
            line!("fitter              = {}", self.fitter, "Trajectory fitter")?;
            line!("propagator          = {}", self.propagator, "Propagator")?;
            line!("ttrh_builder        = {}", self.ttrh_builder, "Transient hit builder")?;

            writeln!(f, "\n[Output]")?;
            line!(
                "trajectory_in_event = {}",
                self.trajectory_in_event,
                "Publish trajectories + association"
            )?;
            line!(
                "item_error_policy   = {:?}",
                self.item_error_policy,
                "Malformed fit result handling"
            )?;
            line!(
                "keep_hitless_tracks = {}",
                self.keep_hitless_tracks,
                "Publish tracks without valid hits"
            )?;
            let [x, y, z] = self.reference_point;
            line!(
                "reference_point     = {}",
                format!("({x:.3}, {y:.3}, {z:.3}) cm"),
                "Point of closest approach"
            )?;
            Ok(())
        } else {
            let [x, y, z] = self.reference_point;
            write!(
                f,
                "ProducerConfig(src={}, fitter={}, propagator={}, ttrh_builder={}, trajectory_in_event={}, policy={:?}, keep_hitless={}, ref=({:.2},{:.2},{:.2}))",
                self.src,
                self.fitter,
                self.propagator,
                self.ttrh_builder,
                self.trajectory_in_event,
                self.item_error_policy,
                self.keep_hitless_tracks,
                x,
                y,
                z,
            )
        }
    }
}
