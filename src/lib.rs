//! # trackout
//!
//! Final stage of track reconstruction: turn the trajectories produced by an external
//! fitter into the cross-referenced collections published for an event.
//!
//! ## Overview
//!
//! For each event a producer reads its inputs (track candidates, or tracks to refit), fits
//! them with the [`TrajectoryFitter`](services::TrajectoryFitter) resolved from the
//! [`EventSetup`](setup::EventSetup), and publishes in one step:
//!
//! * **hits** – owned copies of the valid hits used by the tracks,
//! * **tracks** – kinematics at the closest approach to a reference point and a hit pattern,
//! * **extras** – outer/inner states, module ids, seed direction and hit references,
//! * optionally **trajectories** with a trajectory → track association.
//!
//! Every reference resolves inside the same publication, track `k` pointing at extra `k`.
//!
//! ## Modules
//!
//! * [`producer`] – [`TrackProducer`](producer::TrackProducer) and
//!   [`TrackRefitter`](producer::TrackRefitter), plus the fit loop in
//!   [`producer::algorithm`].
//! * [`assembler`] – [`finalize`](assembler::finalize): fit results → [`TrackProducts`](assembler::TrackProducts).
//! * [`trajectory`], [`hits`], [`records`], [`hit_pattern`] – data model and record builders.
//! * [`event`], [`setup`], [`services`] – collaborators: event store, components, traits.
//! * [`config`] – [`ProducerConfig`](config::ProducerConfig), from code or TOML.
//! * [`report`] – printable per-event track report.
//!
//! ## Cargo features
//!
//! * `parallel`: fit the inputs of an event on the rayon thread pool.
//! * `progress`: render a progress bar while fitting (sequential mode).

pub mod assembler;
pub mod closest_approach;
pub mod config;
pub mod constants;
pub mod det_id;
pub mod event;
pub mod hit_pattern;
pub mod hits;
pub mod producer;
pub mod records;
pub mod report;
pub mod services;
pub mod setup;
pub mod trackout_errors;
pub mod trajectory;

pub use assembler::{
    finalize, finalize_with_cancel, FinalizeParams, ItemErrorPolicy, TrackProducts,
};
pub use config::ProducerConfig;
pub use producer::{TrackProducer, TrackRefitter};
pub use trackout_errors::TrackoutError;

#[cfg(test)]
pub(crate) mod test_fixtures;
