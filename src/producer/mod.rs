//! # Track producers
//!
//! Event-level modules running the whole chain for one event:
//!
//! ```text
//! EventSetup ──get_from_es──► components
//! Event ──src──► inputs ──algorithm──► Vec<FitResult> ──finalize──► TrackProducts ──put──► Event
//! ```
//!
//! | Module | Input under `src` | Algorithm |
//! |--------|-------------------|-----------|
//! | [`TrackProducer`] | track candidates | [`run_with_candidates`](algorithm::run_with_candidates) |
//! | [`TrackRefitter`] | published tracks | [`run_with_tracks`](algorithm::run_with_tracks) |
//!
//! Both share the publication step: product ids are reserved, the batch is finalized and
//! every collection is handed to the event in a single
//! [`put_products`](crate::event::EventStore::put_products) call. A `produce` call that
//! returns an error has published nothing.
//!
//! ## Example
//!
//! ```rust,no_run
//! use trackout::config::ProducerConfig;
//! use trackout::event::{EventId, InMemoryEvent};
//! use trackout::producer::TrackProducer;
//! use trackout::setup::EventSetup;
//!
//! # let setup: EventSetup = unimplemented!();
//! let producer = TrackProducer::new("ctfWithMaterialTracks", ProducerConfig::default());
//! let mut event = InMemoryEvent::new(EventId { run: 1, event: 1 });
//! let handles = producer.produce(&mut event, &setup).unwrap();
//! println!("tracks published as {}", handles.tracks);
//! ```

pub mod algorithm;
#[cfg(feature = "progress")]
pub(crate) mod progress_bar;

use tracing::{debug, info, trace};

use crate::{
    assembler::{finalize_with_cancel, TrackProducts},
    config::ProducerConfig,
    event::{EventStore, TrackHandles},
    records::FitResult,
    setup::EventSetup,
    trackout_errors::TrackoutError,
};

/// Fits track candidates into tracks.
#[derive(Debug, Clone)]
pub struct TrackProducer {
    label: String,
    config: ProducerConfig,
}

impl TrackProducer {
    /// Create a producer publishing under `label`.
    pub fn new(label: impl Into<String>, config: ProducerConfig) -> Self {
        TrackProducer {
            label: label.into(),
            config,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn config(&self) -> &ProducerConfig {
        &self.config
    }

    /// Fit the candidates found under `src` and publish the resulting collections.
    ///
    /// Return
    /// ----------
    /// * The handles of the published collections.
    /// * [`TrackoutError::ComponentNotFound`] / [`TrackoutError::EventStoreFailure`] when
    ///   the setup or the input is incomplete; nothing is published.
    pub fn produce<E>(
        &self,
        event: &mut E,
        setup: &EventSetup,
    ) -> Result<TrackHandles, TrackoutError>
    where
        E: EventStore + ?Sized,
    {
        self.produce_with_cancel(event, setup, || false)
    }

    /// Same as [`produce`](Self::produce), abandoning the event when `should_cancel`
    /// returns `true` before publication.
    pub fn produce_with_cancel<E, F>(
        &self,
        event: &mut E,
        setup: &EventSetup,
        should_cancel: F,
    ) -> Result<TrackHandles, TrackoutError>
    where
        E: EventStore + ?Sized,
        F: FnMut() -> bool,
    {
        info!(event = %event.id(), module = %self.label, "analyzing event");
        let es = setup.get_from_es(&self.config)?;
        let reference = self.config.reference_point();

        debug!(src = %self.config.src, "reading track candidates");
        let results = {
            let candidates = event.track_candidates(&self.config.src)?;
            algorithm::run_with_candidates(&es, candidates, &reference)
        };

        put_in_evt(event, &self.label, &self.config, results, should_cancel)
    }
}

/// Refits previously published tracks.
#[derive(Debug, Clone)]
pub struct TrackRefitter {
    label: String,
    config: ProducerConfig,
}

impl TrackRefitter {
    /// Create a refitter publishing under `label`.
    pub fn new(label: impl Into<String>, config: ProducerConfig) -> Self {
        TrackRefitter {
            label: label.into(),
            config,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn config(&self) -> &ProducerConfig {
        &self.config
    }

    /// Refit the tracks found under `src` and publish the resulting collections.
    ///
    /// A track whose extra or hits do not resolve fails the event with
    /// [`TrackoutError::DanglingReference`].
    pub fn produce<E>(
        &self,
        event: &mut E,
        setup: &EventSetup,
    ) -> Result<TrackHandles, TrackoutError>
    where
        E: EventStore + ?Sized,
    {
        self.produce_with_cancel(event, setup, || false)
    }

    pub fn produce_with_cancel<E, F>(
        &self,
        event: &mut E,
        setup: &EventSetup,
        should_cancel: F,
    ) -> Result<TrackHandles, TrackoutError>
    where
        E: EventStore + ?Sized,
        F: FnMut() -> bool,
    {
        info!(event = %event.id(), module = %self.label, "refitting event");
        let es = setup.get_from_es(&self.config)?;
        let reference = self.config.reference_point();

        debug!(src = %self.config.src, "reading tracks");
        let results = {
            let products = event.track_products(&self.config.src)?;
            algorithm::run_with_tracks(&es, products, &reference)?
        };

        put_in_evt(event, &self.label, &self.config, results, should_cancel)
    }
}

/// Reserve the output ids, finalize `results` and publish everything at once.
fn put_in_evt<E, F>(
    event: &mut E,
    label: &str,
    config: &ProducerConfig,
    results: Vec<FitResult>,
    should_cancel: F,
) -> Result<TrackHandles, TrackoutError>
where
    E: EventStore + ?Sized,
    F: FnMut() -> bool,
{
    let params = config.finalize_params();
    let ids = event.products_before_put(label, params.retain_trajectories);
    let products = finalize_with_cancel(results, &params, ids, should_cancel)?;

    log_summary(label, &products);
    event.put_products(label, products)
}

fn log_summary(label: &str, products: &TrackProducts) {
    info!(
        module = label,
        tracks = products.tracks.len(),
        hits = products.hits.len(),
        discarded = products.stats.discarded,
        "number of tracks found"
    );
    for (k, track) in products.tracks.iter().enumerate() {
        trace!(
            track = k,
            found = track.found(),
            lost = track.lost(),
            normalized_chi2 = track.normalized_chi2(),
            pt = track.pt(),
            "track summary"
        );
    }
}
