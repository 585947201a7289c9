//! # Event store
//!
//! The [`EventStore`] trait is the boundary between the producers and the event data they
//! read and write. A processing unit ("event") offers:
//!
//! * input lookup by [`InputTag`] (track candidates, or previously published tracks),
//! * product-id reservation before the output collections are filled
//!   ([`EventStore::products_before_put`]), so references can be wired ahead of time,
//! * one atomic publication call ([`EventStore::put_products`]) that either accepts every
//!   collection of a batch or none of them.
//!
//! [`InMemoryEvent`] is the in-process implementation used by the producers, the tests and
//! the benches.

use std::{collections::HashMap, fmt};

use ahash::RandomState;
use serde::Deserialize;
use tracing::debug;

use crate::{
    assembler::{ProductIds, TrackProducts},
    hits::RecHit,
    records::ProductId,
    trackout_errors::TrackoutError,
    trajectory::TrajectorySeed,
};

/// Identifier of one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId {
    pub run: u32,
    pub event: u64,
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run {} event {}", self.run, self.event)
    }
}

/// Label of a product in the event, with an optional instance name.
///
/// The textual form is `label` or `label:instance`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub struct InputTag {
    pub label: String,
    pub instance: Option<String>,
}

impl InputTag {
    pub fn new(label: impl Into<String>) -> Self {
        InputTag {
            label: label.into(),
            instance: None,
        }
    }

    pub fn with_instance(label: impl Into<String>, instance: impl Into<String>) -> Self {
        InputTag {
            label: label.into(),
            instance: Some(instance.into()),
        }
    }
}

impl From<String> for InputTag {
    fn from(s: String) -> Self {
        match s.split_once(':') {
            Some((label, instance)) if !instance.is_empty() => {
                InputTag::with_instance(label, instance)
            }
            Some((label, _)) => InputTag::new(label),
            None => InputTag::new(s),
        }
    }
}

impl From<&str> for InputTag {
    fn from(s: &str) -> Self {
        InputTag::from(s.to_string())
    }
}

impl fmt::Display for InputTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.instance {
            Some(instance) => write!(f, "{}:{}", self.label, instance),
            None => write!(f, "{}", self.label),
        }
    }
}

/// A seed with the hits pattern recognition collected for it.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackCandidate {
    pub seed: TrajectorySeed,
    pub hits: Vec<RecHit>,
}

/// Handles of the products published by one [`EventStore::put_products`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackHandles {
    pub hits: ProductId,
    pub tracks: ProductId,
    pub extras: ProductId,
    pub trajectories: Option<ProductId>,
    pub association: Option<ProductId>,
}

impl From<ProductIds> for TrackHandles {
    fn from(ids: ProductIds) -> Self {
        TrackHandles {
            hits: ids.hits,
            tracks: ids.tracks,
            extras: ids.extras,
            trajectories: ids.trajectories,
            association: ids.association,
        }
    }
}

pub trait EventStore {
    fn id(&self) -> EventId;

    /// Track candidates published under `tag`.
    fn track_candidates(&self, tag: &InputTag) -> Result<&[TrackCandidate], TrackoutError>;

    /// Track products published under `tag`.
    fn track_products(&self, tag: &InputTag) -> Result<&TrackProducts, TrackoutError>;

    /// Reserve the product ids `module_label` will publish under.
    fn products_before_put(&mut self, module_label: &str, with_trajectories: bool)
        -> ProductIds;

    /// Publish every collection of `products` at once.
    ///
    /// Nothing is published when an error is returned.
    fn put_products(
        &mut self,
        module_label: &str,
        products: TrackProducts,
    ) -> Result<TrackHandles, TrackoutError>;
}

/// An event held in memory.
#[derive(Debug, Clone)]
pub struct InMemoryEvent {
    id: EventId,
    candidates: HashMap<InputTag, Vec<TrackCandidate>, RandomState>,
    reserved: HashMap<String, ProductIds, RandomState>,
    products: HashMap<InputTag, TrackProducts, RandomState>,
    next_product: u32,
}

impl InMemoryEvent {
    pub fn new(id: EventId) -> Self {
        InMemoryEvent {
            id,
            candidates: HashMap::default(),
            reserved: HashMap::default(),
            products: HashMap::default(),
            next_product: 1,
        }
    }

    /// Store the output of pattern recognition under `tag`.
    pub fn insert_candidates(&mut self, tag: InputTag, candidates: Vec<TrackCandidate>) {
        self.candidates.insert(tag, candidates);
    }

    /// Number of track product sets published so far.
    pub fn published_count(&self) -> usize {
        self.products.len()
    }

    fn next_id(&mut self) -> ProductId {
        let id = ProductId(self.next_product);
        self.next_product += 1;
        id
    }
}

impl EventStore for InMemoryEvent {
    fn id(&self) -> EventId {
        self.id
    }

    fn track_candidates(&self, tag: &InputTag) -> Result<&[TrackCandidate], TrackoutError> {
        self.candidates
            .get(tag)
            .map(Vec::as_slice)
            .ok_or_else(|| TrackoutError::EventStoreFailure(format!("no candidates under '{tag}'")))
    }

    fn track_products(&self, tag: &InputTag) -> Result<&TrackProducts, TrackoutError> {
        self.products
            .get(tag)
            .ok_or_else(|| TrackoutError::EventStoreFailure(format!("no tracks under '{tag}'")))
    }

    fn products_before_put(
        &mut self,
        module_label: &str,
        with_trajectories: bool,
    ) -> ProductIds {
        if let Some(ids) = self.reserved.get(module_label) {
            if ids.trajectories.is_some() == with_trajectories {
                return *ids;
            }
        }
        let ids = ProductIds {
            hits: self.next_id(),
            tracks: self.next_id(),
            extras: self.next_id(),
            trajectories: with_trajectories.then(|| self.next_id()),
            association: with_trajectories.then(|| self.next_id()),
        };
        debug!(module_label, ?ids, "reserved product ids");
        self.reserved.insert(module_label.to_string(), ids);
        ids
    }

    fn put_products(
        &mut self,
        module_label: &str,
        products: TrackProducts,
    ) -> Result<TrackHandles, TrackoutError> {
        let tag = InputTag::new(module_label);
        if self.products.contains_key(&tag) {
            return Err(TrackoutError::EventStoreFailure(format!(
                "products of '{module_label}' already published"
            )));
        }
        match self.reserved.get(module_label) {
            Some(ids) if *ids == products.ids => {}
            _ => return Err(TrackoutError::UnreservedProduct("track products")),
        }
        products.validate_references()?;

        let handles = TrackHandles::from(products.ids);
        self.products.insert(tag, products);
        Ok(handles)
    }
}

#[cfg(test)]
mod event_test {
    use super::*;
    use crate::{
        assembler::{finalize, FinalizeParams},
        test_fixtures::fit_result,
        trajectory::PropagationDirection,
    };

    fn event() -> InMemoryEvent {
        InMemoryEvent::new(EventId { run: 1, event: 42 })
    }

    #[test]
    fn test_input_tag_parsing() {
        assert_eq!(InputTag::from("ctf"), InputTag::new("ctf"));
        assert_eq!(
            InputTag::from("ctf:refit"),
            InputTag::with_instance("ctf", "refit")
        );
        assert_eq!(InputTag::from("ctf:"), InputTag::new("ctf"));
        assert_eq!(InputTag::with_instance("a", "b").to_string(), "a:b");
    }

    #[test]
    fn test_reserved_ids_are_distinct() {
        let mut ev = event();
        let a = ev.products_before_put("a", true);
        let b = ev.products_before_put("b", false);
        let all = [
            Some(a.hits),
            Some(a.tracks),
            Some(a.extras),
            a.trajectories,
            a.association,
            Some(b.hits),
            Some(b.tracks),
            Some(b.extras),
        ];
        for (i, x) in all.iter().enumerate() {
            for y in &all[i + 1..] {
                assert_ne!(x, y);
            }
        }
        assert_eq!(ev.products_before_put("a", true), a);
    }

    #[test]
    fn test_put_requires_reservation() {
        let mut ev = event();
        let mut other = event();
        let ids = other.products_before_put("x", false);
        let products = finalize(vec![], &FinalizeParams::default(), ids).unwrap();
        assert_eq!(
            ev.put_products("x", products),
            Err(TrackoutError::UnreservedProduct("track products"))
        );
        assert_eq!(ev.published_count(), 0);
    }

    #[test]
    fn test_put_then_read_back() {
        let mut ev = event();
        let ids = ev.products_before_put("ctf", false);
        let batch = vec![fit_result(PropagationDirection::Along, &[true, true])];
        let products = finalize(batch, &FinalizeParams::default(), ids).unwrap();

        let handles = ev.put_products("ctf", products).unwrap();
        assert_eq!(handles.tracks, ids.tracks);

        let read = ev.track_products(&"ctf".into()).unwrap();
        assert_eq!(read.tracks.len(), 1);
        let extra = read.extra_of(&read.tracks[0]).unwrap();
        assert_eq!(read.hits_of(extra).unwrap().len(), 2);

        let again = finalize(vec![], &FinalizeParams::default(), ids).unwrap();
        assert!(matches!(
            ev.put_products("ctf", again),
            Err(TrackoutError::EventStoreFailure(_))
        ));
    }

    #[test]
    fn test_missing_input_is_store_failure() {
        let ev = event();
        assert!(matches!(
            ev.track_candidates(&"ckf".into()),
            Err(TrackoutError::EventStoreFailure(_))
        ));
    }
}
