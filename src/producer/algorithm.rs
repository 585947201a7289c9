//! # Track producer algorithm
//!
//! Turns the inputs of one event into [`FitResult`]s, ready for
//! [`finalize`](crate::assembler::finalize):
//!
//! * [`run_with_candidates`] – fit pattern-recognition candidates (seed + hits),
//! * [`run_with_tracks`] – refit tracks published earlier in the event.
//!
//! Both go through [`build_track`], which calls the external fitter and expresses the fitted
//! track at its closest approach to the reference point.
//!
//! ## Error Semantics
//! -----------------
//! A declined or failed fit only removes that input from the output; it is logged
//! (`debug!` for a decline, `warn!` for a failure) and the loop continues. In the refit path
//! a track whose extra or hits cannot be resolved is a broken input collection and fails
//! the whole event.
//!
//! ## Features
//! -----------------
//! * `parallel` – inputs are fitted on the rayon pool; results keep the input order.
//! * `progress` – a progress bar is rendered while inputs are fitted sequentially.

use nalgebra::Point3;
use tracing::{debug, warn};

use crate::{
    assembler::TrackProducts,
    closest_approach::closest_approach_to_point,
    constants::TRACK_PARAMETERS,
    event::TrackCandidate,
    hits::TransientRecHit,
    records::{FitResult, TrackSkeleton},
    setup::EsProducts,
    trackout_errors::TrackoutError,
    trajectory::{
        boundary::extract, PropagationDirection, SeedState, TrajectorySeed, TrajectoryState,
    },
};

/// Degrees of freedom of a fit over `hits`: measured coordinates minus the track parameters.
pub fn compute_ndof(hits: &[TransientRecHit]) -> f64 {
    let measured: f64 = hits
        .iter()
        .filter(|h| h.is_valid())
        .map(|h| f64::from(h.dimension()))
        .sum();
    measured - TRACK_PARAMETERS
}

/// Fit every track candidate.
///
/// Arguments
/// -----------------
/// * `es`: Components resolved from the event setup.
/// * `candidates`: Seeds with their hits, in event order.
/// * `reference`: Point the track parameters are expressed at.
///
/// Return
/// ----------
/// * One [`FitResult`] per candidate that was fitted, in candidate order.
pub fn run_with_candidates(
    es: &EsProducts<'_>,
    candidates: &[TrackCandidate],
    reference: &Point3<f64>,
) -> Vec<FitResult> {
    fit_all(candidates, |candidate| {
        let seed = &candidate.seed;
        let start = &seed.starting_state;
        let Some(surface) = es.geometry.surface(start.det_id) else {
            warn!(error = %TrackoutError::UnknownSurface(start.det_id), "candidate skipped");
            return None;
        };
        let initial = TrajectoryState::new(
            surface.to_global(&start.local_position),
            surface.to_global_vector(&start.local_momentum),
            start.charge,
            start.error,
        );

        let hits: Vec<TransientRecHit> = candidate
            .hits
            .iter()
            .map(|h| es.builder.build(h, es.geometry))
            .collect();
        let ndof = compute_ndof(&hits);

        build_track(es, seed, &hits, &initial, ndof, reference, seed.direction)
    })
}

struct RefitInput {
    seed: TrajectorySeed,
    hits: Vec<TransientRecHit>,
    initial: TrajectoryState,
    ndof: f64,
}

/// Refit every track of a published collection.
///
/// The fit starts from the innermost state stored in each track's extra, with an
/// `Along` seed on the innermost module, over the track's own hits.
///
/// Return
/// ----------
/// * One [`FitResult`] per track that was refitted, in track order.
/// * [`TrackoutError::DanglingReference`] if a track's extra or hits cannot be resolved.
pub fn run_with_tracks(
    es: &EsProducts<'_>,
    products: &TrackProducts,
    reference: &Point3<f64>,
) -> Result<Vec<FitResult>, TrackoutError> {
    let mut inputs = Vec::with_capacity(products.tracks.len());
    for (k, track) in products.tracks.iter().enumerate() {
        let extra = products.extra_of(track)?;
        let rec_hits = products.hits_of(extra)?;

        let Some(surface) = es.geometry.surface(extra.inner_det_id) else {
            warn!(
                track = k,
                error = %TrackoutError::UnknownSurface(extra.inner_det_id),
                "track not refitted"
            );
            continue;
        };
        let initial = TrajectoryState::new(
            extra.inner_position,
            extra.inner_momentum,
            track.charge,
            extra.inner_state_covariance,
        );
        let seed = TrajectorySeed {
            starting_state: SeedState {
                det_id: extra.inner_det_id,
                local_position: surface.to_local(&initial.position),
                local_momentum: surface.to_local_vector(&initial.momentum),
                charge: track.charge,
                error: initial.curvilinear_error,
            },
            hits: Vec::new(),
            direction: PropagationDirection::Along,
        };

        let hits: Vec<TransientRecHit> = rec_hits
            .into_iter()
            .map(|h| es.builder.build(h, es.geometry))
            .collect();
        let ndof = compute_ndof(&hits);

        inputs.push(RefitInput {
            seed,
            hits,
            initial,
            ndof,
        });
    }

    Ok(fit_all(&inputs, |input| {
        build_track(
            es,
            &input.seed,
            &input.hits,
            &input.initial,
            input.ndof,
            reference,
            PropagationDirection::Along,
        )
    }))
}

/// Fit one input and express the result at the closest approach to `reference`.
///
/// Return
/// ----------
/// * `Some(FitResult)` on success.
/// * `None` if the fitter declined or failed, or the fitted trajectory is unusable.
pub fn build_track(
    es: &EsProducts<'_>,
    seed: &TrajectorySeed,
    hits: &[TransientRecHit],
    initial: &TrajectoryState,
    ndof: f64,
    reference: &Point3<f64>,
    seed_direction: PropagationDirection,
) -> Option<FitResult> {
    let trajectory = match es.fitter.fit(seed, hits, initial) {
        Ok(Some(trajectory)) => trajectory,
        Ok(None) => {
            debug!(hits = hits.len(), "{}", TrackoutError::FitDeclined);
            return None;
        }
        Err(err) => {
            warn!(hits = hits.len(), error = %err, "fit failed");
            return None;
        }
    };

    let inner = match extract(&trajectory) {
        Ok(boundary) => boundary.inner.clone(),
        Err(err) => {
            warn!(error = %err, "fitted trajectory dropped");
            return None;
        }
    };

    let pca = match closest_approach_to_point(&inner, es.propagator.magnetic_field(), reference)
    {
        Ok(state) => state,
        Err(err) => {
            warn!(error = %err, "fitted trajectory dropped");
            return None;
        }
    };

    let track = TrackSkeleton {
        chi2: trajectory.chi_squared(),
        ndof,
        vertex: pca.position,
        momentum: pca.momentum,
        charge: pca.charge,
        covariance: pca.curvilinear_error,
    };

    Some(FitResult {
        trajectory,
        track,
        seed_direction,
    })
}

#[cfg(feature = "parallel")]
fn fit_all<I, F>(inputs: &[I], fit: F) -> Vec<FitResult>
where
    I: Sync,
    F: Fn(&I) -> Option<FitResult> + Sync + Send,
{
    use rayon::prelude::*;

    let results: Vec<Option<FitResult>> = inputs.par_iter().map(fit).collect();
    results.into_iter().flatten().collect()
}

#[cfg(all(feature = "progress", not(feature = "parallel")))]
fn fit_all<I, F>(inputs: &[I], fit: F) -> Vec<FitResult>
where
    F: Fn(&I) -> Option<FitResult>,
{
    use super::progress_bar::FitProgress;

    let mut progress = FitProgress::new(inputs.len());
    let results = inputs
        .iter()
        .filter_map(|input| progress.track(|| fit(input)))
        .collect();
    progress.finish();
    results
}

#[cfg(not(any(feature = "progress", feature = "parallel")))]
fn fit_all<I, F>(inputs: &[I], fit: F) -> Vec<FitResult>
where
    F: Fn(&I) -> Option<FitResult>,
{
    inputs.iter().filter_map(fit).collect()
}
