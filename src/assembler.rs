//! # Cross-reference assembly of fit results
//!
//! Turn a batch of [`FitResult`]s into the collections published for one event:
//!
//! ```text
//! hits:          [h0 h1 h2 | h3 h4 | ...]        owned copies, trajectory order
//! extras:        [e0       | e1    | ...]        e_k.hits → its slice of `hits`
//! tracks:        [t0       | t1    | ...]        t_k.extra → e_k
//! trajectories:  [j0       | j1    | ...]        optional
//! association:   [(j0,t0)  | (j1,t1) | ...]      optional
//! ```
//!
//! ## Algorithm
//! -----------------
//! One sequential pass over the batch, in batch order. For every item:
//!
//! 1. **Stage** – validate the skeleton, orient the boundary states
//!    ([`extract`]), copy the valid hits ([`materialize`]), and build the extra and the
//!    track. The extra's hit references are computed from the current hit counter, i.e.
//!    the positions the hits are about to take.
//! 2. **Append** – push hits, extra, track (with its extra reference set to the extra just
//!    appended), and optionally the trajectory and its association entry.
//!
//! Every fallible step happens in the staging phase, before any append, so a discarded
//! item never leaves data or an index gap behind. The counters are local to one call:
//! separate batches share nothing and may be finalized on separate threads.
//!
//! ## Error Semantics
//! -----------------
//! * A malformed item (undefined direction, empty chain, non-finite skeleton) is handled
//!   according to [`ItemErrorPolicy`]: logged and skipped (`Skip`, default) or fatal for the
//!   whole batch (`Abort`).
//! * Items without any valid hit are kept or dropped according to
//!   [`FinalizeParams::keep_hitless_tracks`].
//! * A cancelled batch returns [`TrackoutError::Cancelled`]; the partially built
//!   collections are dropped and nothing is ever observable.
//!
//! ## See also
//! ------------
//! * [`build_track`] / [`build_extra`] – Record builders.
//! * [`EventStore::put_products`](crate::event::EventStore::put_products) – Atomic publication of the result.
use serde::Deserialize;
use tracing::{debug, trace, warn};

use crate::{
    constants::Key,
    hits::{
        materialize::{materialize, MaterializedHit},
        RecHit,
    },
    records::{
        association::TrajTrackAssociation,
        extra::{build_extra, OutputExtra},
        track::{build_track, OutputTrack},
        FitResult, ProductId, Ref, TrackSkeleton,
    },
    trackout_errors::TrackoutError,
    trajectory::{boundary::extract, PropagationDirection, Trajectory},
};

/// What to do with a fit result that cannot be finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemErrorPolicy {
    /// Log the item, exclude it from every collection and continue.
    #[default]
    Skip,
    /// Fail the whole batch.
    Abort,
}

/// Options of one finalization pass.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizeParams {
    /// Keep a copy of each trajectory and the trajectory → track association.
    pub retain_trajectories: bool,
    pub item_error_policy: ItemErrorPolicy,
    /// Publish tracks whose trajectory holds no valid hit (empty hit pattern).
    pub keep_hitless_tracks: bool,
}

impl Default for FinalizeParams {
    fn default() -> Self {
        FinalizeParams {
            retain_trajectories: false,
            item_error_policy: ItemErrorPolicy::Skip,
            keep_hitless_tracks: true,
        }
    }
}

/// Product handles reserved in the event before the collections are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductIds {
    pub hits: ProductId,
    pub tracks: ProductId,
    pub extras: ProductId,
    pub trajectories: Option<ProductId>,
    pub association: Option<ProductId>,
}

/// Lifecycle of one fit result inside a finalization pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    Pending,
    Materializing,
    Published,
    Discarded,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FinalizeStats {
    pub published: usize,
    pub discarded: usize,
    pub hitless_dropped: usize,
}

/// The collections of one finalized batch, published together.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackProducts {
    pub ids: ProductIds,
    pub hits: Vec<RecHit>,
    pub tracks: Vec<OutputTrack>,
    pub extras: Vec<OutputExtra>,
    pub trajectories: Option<Vec<Trajectory>>,
    pub association: Option<TrajTrackAssociation>,
    pub stats: FinalizeStats,
}

impl TrackProducts {
    fn empty(ids: ProductIds, retain_trajectories: bool) -> Self {
        TrackProducts {
            ids,
            hits: Vec::new(),
            tracks: Vec::new(),
            extras: Vec::new(),
            trajectories: retain_trajectories.then(Vec::new),
            association: retain_trajectories.then(TrajTrackAssociation::new),
            stats: FinalizeStats::default(),
        }
    }

    pub fn track(&self, r: &Ref<OutputTrack>) -> Result<&OutputTrack, TrackoutError> {
        r.resolve(self.ids.tracks, &self.tracks)
            .ok_or(TrackoutError::DanglingReference {
                collection: "tracks",
                key: r.key(),
            })
    }

    pub fn extra(&self, r: &Ref<OutputExtra>) -> Result<&OutputExtra, TrackoutError> {
        r.resolve(self.ids.extras, &self.extras)
            .ok_or(TrackoutError::DanglingReference {
                collection: "extras",
                key: r.key(),
            })
    }

    pub fn hit(&self, r: &Ref<RecHit>) -> Result<&RecHit, TrackoutError> {
        r.resolve(self.ids.hits, &self.hits)
            .ok_or(TrackoutError::DanglingReference {
                collection: "hits",
                key: r.key(),
            })
    }

    pub fn trajectory(&self, r: &Ref<Trajectory>) -> Result<&Trajectory, TrackoutError> {
        let dangling = TrackoutError::DanglingReference {
            collection: "trajectories",
            key: r.key(),
        };
        match (self.ids.trajectories, &self.trajectories) {
            (Some(id), Some(trajs)) => r.resolve(id, trajs).ok_or(dangling),
            _ => Err(dangling),
        }
    }

    /// The extra a track points to.
    pub fn extra_of(&self, track: &OutputTrack) -> Result<&OutputExtra, TrackoutError> {
        let r = track.extra().ok_or(TrackoutError::DanglingReference {
            collection: "extras",
            key: usize::MAX,
        })?;
        self.extra(&r)
    }

    /// The hits an extra points to, in trajectory order.
    pub fn hits_of(&self, extra: &OutputExtra) -> Result<Vec<&RecHit>, TrackoutError> {
        extra.hits().iter().map(|r| self.hit(r)).collect()
    }

    /// Check that every reference resolves inside this batch and that track `k` points to
    /// extra `k`.
    pub fn validate_references(&self) -> Result<(), TrackoutError> {
        if self.tracks.len() != self.extras.len() {
            return Err(TrackoutError::DanglingReference {
                collection: "extras",
                key: self.tracks.len().min(self.extras.len()),
            });
        }
        for (k, track) in self.tracks.iter().enumerate() {
            match track.extra() {
                Some(r) if r.product() == self.ids.extras && r.key() == k => {}
                _ => {
                    return Err(TrackoutError::DanglingReference {
                        collection: "extras",
                        key: k,
                    })
                }
            }
        }
        for extra in &self.extras {
            self.hits_of(extra)?;
        }
        if let Some(association) = &self.association {
            for (traj, track) in association.iter() {
                self.trajectory(traj)?;
                self.track(track)?;
            }
        }
        Ok(())
    }
}

/// Records of one item, built but not yet appended.
struct StagedItem {
    hits: Vec<MaterializedHit>,
    extra: OutputExtra,
    track: OutputTrack,
}

/// Build the records of one item; `Ok(None)` means a hitless track to drop.
fn stage(
    trajectory: &Trajectory,
    skeleton: TrackSkeleton,
    seed_direction: PropagationDirection,
    params: &FinalizeParams,
    hits_id: ProductId,
    hit_index: Key,
) -> Result<Option<StagedItem>, TrackoutError> {
    if !skeleton.is_finite() {
        return Err(TrackoutError::MalformedTrajectory(
            "track skeleton is not finite".into(),
        ));
    }
    let boundary = extract(trajectory)?;
    let hits = materialize(trajectory);
    if hits.is_empty() && !params.keep_hitless_tracks {
        return Ok(None);
    }

    let refs = (hit_index..hit_index + hits.len()).map(|key| Ref::new(hits_id, key));
    let extra = build_extra(&boundary, seed_direction, refs);
    let track = build_track(skeleton, &hits);

    Ok(Some(StagedItem { hits, extra, track }))
}

/// Finalize a batch of fit results into cross-referenced collections.
///
/// Arguments
/// -----------------
/// * `batch`: The fit results, consumed in order.
/// * `params`: Retention, error policy and hitless-track handling.
/// * `ids`: Product handles reserved in the event; `trajectories` and `association` must
///   be set when `params.retain_trajectories` is.
///
/// Return
/// ----------
/// * The [`TrackProducts`] of the batch, ready to publish.
/// * [`TrackoutError::UnreservedProduct`] if retention is requested without handles.
/// * The item error when `params.item_error_policy` is `Abort`.
pub fn finalize(
    batch: Vec<FitResult>,
    params: &FinalizeParams,
    ids: ProductIds,
) -> Result<TrackProducts, TrackoutError> {
    finalize_with_cancel(batch, params, ids, || false)
}

/// Same as [`finalize`], polling `should_cancel` before each item and once more before
/// returning. A cancelled batch yields [`TrackoutError::Cancelled`] and no collection.
pub fn finalize_with_cancel<F>(
    batch: Vec<FitResult>,
    params: &FinalizeParams,
    ids: ProductIds,
    mut should_cancel: F,
) -> Result<TrackProducts, TrackoutError>
where
    F: FnMut() -> bool,
{
    let retained_ids = if params.retain_trajectories {
        Some((
            ids.trajectories
                .ok_or(TrackoutError::UnreservedProduct("trajectories"))?,
            ids.association
                .ok_or(TrackoutError::UnreservedProduct("association"))?,
        ))
    } else {
        None
    };

    let mut out = TrackProducts::empty(ids, params.retain_trajectories);

    let mut hit_index: Key = 0;
    let mut extra_index: Key = 0;
    let mut track_index: Key = 0;
    let mut traj_index: Key = 0;

    for (item, fit) in batch.into_iter().enumerate() {
        if should_cancel() {
            debug!(item, "finalization cancelled");
            return Err(TrackoutError::Cancelled);
        }
        trace!(item, state = ?ItemState::Pending);

        let FitResult {
            trajectory,
            track,
            seed_direction,
        } = fit;

        trace!(item, state = ?ItemState::Materializing);
        let staged = match stage(
            &trajectory,
            track,
            seed_direction,
            params,
            ids.hits,
            hit_index,
        ) {
            Ok(Some(staged)) => staged,
            Ok(None) => {
                debug!(item, "no valid hit on trajectory, track dropped");
                out.stats.hitless_dropped += 1;
                trace!(item, state = ?ItemState::Discarded);
                continue;
            }
            Err(err) => match params.item_error_policy {
                ItemErrorPolicy::Skip => {
                    warn!(item, error = %err, "discarding fit result");
                    out.stats.discarded += 1;
                    trace!(item, state = ?ItemState::Discarded);
                    continue;
                }
                ItemErrorPolicy::Abort => return Err(err),
            },
        };

        let StagedItem {
            hits,
            extra,
            mut track,
        } = staged;

        hit_index += hits.len();
        out.hits.extend(hits.into_iter().map(|m| m.hit));

        track.set_extra(Ref::new(ids.extras, extra_index));
        out.extras.push(extra);
        extra_index += 1;

        out.tracks.push(track);
        let track_key = track_index;
        track_index += 1;

        if let (Some((traj_id, _)), Some(trajectories), Some(association)) = (
            retained_ids,
            out.trajectories.as_mut(),
            out.association.as_mut(),
        ) {
            trajectories.push(trajectory);
            association.insert(
                Ref::new(traj_id, traj_index),
                Ref::new(ids.tracks, track_key),
            );
            traj_index += 1;
        }

        out.stats.published += 1;
        trace!(item, state = ?ItemState::Published);
    }

    if should_cancel() {
        debug!("finalization cancelled before publication");
        return Err(TrackoutError::Cancelled);
    }

    debug!(
        published = out.stats.published,
        discarded = out.stats.discarded,
        hits = hit_index,
        "batch finalized"
    );
    Ok(out)
}
