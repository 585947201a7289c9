//! # Output records and cross-references
//!
//! The finalization pipeline publishes four parallel collections per event (hits, tracks,
//! extras, optional trajectories) plus an optional trajectory → track association. Records
//! point at each other through [`Ref`]s: a `(product id, key)` pair where the product id is
//! the handle of the target collection in the event and the key is the position inside it.
//!
//! Product ids are reserved from the [`EventStore`](crate::event::EventStore) **before**
//! the collections are filled, so references can be wired while records are built and
//! still resolve once everything is published in one step.

pub mod association;
pub mod extra;
pub mod track;

use std::{fmt, hash, marker::PhantomData};

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::{
    constants::{CurvilinearError, Key},
    trajectory::{PropagationDirection, Trajectory},
};

/// Handle of one product (collection) in an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(pub u32);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Typed reference to the element `key` of product `product`.
pub struct Ref<T> {
    product: ProductId,
    key: Key,
    _target: PhantomData<fn() -> T>,
}

impl<T> Ref<T> {
    pub fn new(product: ProductId, key: Key) -> Self {
        Ref {
            product,
            key,
            _target: PhantomData,
        }
    }

    pub fn product(&self) -> ProductId {
        self.product
    }

    pub fn key(&self) -> Key {
        self.key
    }

    /// Resolve the reference against `collection`, published under `id`.
    pub fn resolve<'a>(&self, id: ProductId, collection: &'a [T]) -> Option<&'a T> {
        if self.product != id {
            return None;
        }
        collection.get(self.key)
    }
}

// Manual impls: deriving would require the same bounds on `T`.
impl<T> Clone for Ref<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Ref<T> {}

impl<T> PartialEq for Ref<T> {
    fn eq(&self, other: &Self) -> bool {
        self.product == other.product && self.key == other.key
    }
}

impl<T> Eq for Ref<T> {}

impl<T> hash::Hash for Ref<T> {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.product.hash(state);
        self.key.hash(state);
    }
}

impl<T> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ref({}, {})", self.product, self.key)
    }
}

/// Kinematics of a fitted track at its reference point, not yet tied to hits or an extra.
///
/// # Fields
///
/// * `chi2` - χ² of the fit
/// * `ndof` - Number of degrees of freedom
/// * `vertex` - Point of closest approach to the reference point (cm)
/// * `momentum` - Momentum at `vertex` (GeV)
/// * `charge` - Electric charge
/// * `covariance` - Curvilinear error at `vertex`
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSkeleton {
    pub chi2: f64,
    pub ndof: f64,
    pub vertex: Point3<f64>,
    pub momentum: Vector3<f64>,
    pub charge: i8,
    pub covariance: CurvilinearError,
}

impl TrackSkeleton {
    pub fn is_finite(&self) -> bool {
        self.chi2.is_finite()
            && self.ndof.is_finite()
            && self.vertex.iter().all(|v| v.is_finite())
            && self.momentum.iter().all(|v| v.is_finite())
    }
}

/// One successful fit, handed over by value to the assembler.
#[derive(Debug, Clone, PartialEq)]
pub struct FitResult {
    pub trajectory: Trajectory,
    pub track: TrackSkeleton,
    pub seed_direction: PropagationDirection,
}
