mod common;

use approx::assert_relative_eq;
use common::{candidate, det, setup, EchoFitter};
use nalgebra::Point3;
use trackout::{
    config::ProducerConfig,
    event::{EventId, EventStore, InMemoryEvent, InputTag},
    report::TrackReport,
    trajectory::PropagationDirection,
    ItemErrorPolicy, TrackProducer, TrackRefitter, TrackoutError,
};

fn event_with_candidates() -> InMemoryEvent {
    let mut ev = InMemoryEvent::new(EventId { run: 1, event: 3 });
    ev.insert_candidates(
        InputTag::new("ckfTrackCandidates"),
        vec![
            candidate(1, 5),  // fitted
            candidate(1, 2),  // declined: too few hits
            candidate(0, 4),  // fit fails: neutral
            candidate(-1, 3), // fitted
        ],
    );
    ev
}

#[test]
fn producer_publishes_fitted_candidates() {
    let mut ev = event_with_candidates();
    let setup = setup(EchoFitter::along());
    let config = ProducerConfig::builder()
        .trajectory_in_event(true)
        .build()
        .unwrap();
    let producer = TrackProducer::new("ctfWithMaterialTracks", config);

    let handles = producer.produce(&mut ev, &setup).unwrap();
    assert!(handles.trajectories.is_some());

    let out = ev.track_products(&"ctfWithMaterialTracks".into()).unwrap();
    assert_eq!(out.tracks.len(), 2);
    assert_eq!(out.hits.len(), 8);
    assert_eq!(out.trajectories.as_ref().unwrap().len(), 2);
    out.validate_references().unwrap();

    let first = &out.tracks[0];
    assert_eq!(first.found(), 5);
    assert_eq!(first.charge, 1);
    assert_relative_eq!(first.ndof, 5.0); // 5 hits × 2 − 5
    assert_relative_eq!(first.chi2, 2.5);
    assert_relative_eq!(first.pt(), 1.0, epsilon = 1e-9);
    assert_relative_eq!(first.momentum.z, 0.5);

    let extra = out.extra_of(first).unwrap();
    assert_eq!(extra.inner_det_id, det(1));
    assert_eq!(extra.outer_det_id, det(5));
    assert_eq!(extra.seed_direction, PropagationDirection::Along);

    assert_eq!(out.tracks[1].charge, -1);
    assert_eq!(out.tracks[1].found(), 3);
}

#[test]
fn track_parameters_are_at_closest_approach() {
    let mut ev = event_with_candidates();
    let setup = setup(EchoFitter::along());
    let reference = Point3::new(0.05, -0.03, 0.0);
    let config = ProducerConfig::builder()
        .reference_point(reference)
        .build()
        .unwrap();
    TrackProducer::new("ctf", config)
        .produce(&mut ev, &setup)
        .unwrap();

    let out = ev.track_products(&"ctf".into()).unwrap();
    for track in &out.tracks {
        // transverse momentum is perpendicular to the line to the reference point
        let dx = track.vertex.x - reference.x;
        let dy = track.vertex.y - reference.y;
        let dot = dx * track.momentum.x + dy * track.momentum.y;
        assert_relative_eq!(dot, 0.0, epsilon = 1e-9);
        assert!(dx.hypot(dy) < 4.0);
    }
}

#[test]
fn opposite_fits_take_outer_state_first() {
    let mut ev = event_with_candidates();
    let setup = setup(EchoFitter {
        direction: PropagationDirection::Opposite,
        min_hits: 3,
    });
    TrackProducer::new("ctf", ProducerConfig::default())
        .produce(&mut ev, &setup)
        .unwrap();

    let out = ev.track_products(&"ctf".into()).unwrap();
    let extra = out.extra_of(&out.tracks[0]).unwrap();
    assert_eq!(extra.outer_det_id, det(5));
    assert_eq!(extra.inner_det_id, det(1));

    // hits are stored in trajectory order: outermost first
    let hits = out.hits_of(extra).unwrap();
    assert_eq!(hits.first().unwrap().det_id, det(5));
    assert_eq!(hits.last().unwrap().det_id, det(1));
}

#[test]
fn missing_component_or_input_publishes_nothing() {
    let mut ev = event_with_candidates();
    let setup = setup(EchoFitter::along());

    let config = ProducerConfig::builder().fitter("RKFitter").build().unwrap();
    let err = TrackProducer::new("ctf", config)
        .produce(&mut ev, &setup)
        .unwrap_err();
    assert_eq!(
        err,
        TrackoutError::ComponentNotFound {
            kind: "fitter",
            name: "RKFitter".into()
        }
    );

    let config = ProducerConfig::builder().src("nothingHere").build().unwrap();
    let err = TrackProducer::new("ctf", config)
        .produce(&mut ev, &setup)
        .unwrap_err();
    assert!(matches!(err, TrackoutError::EventStoreFailure(_)));

    assert_eq!(ev.published_count(), 0);
}

#[test]
fn cancelled_event_publishes_nothing() {
    let mut ev = event_with_candidates();
    let setup = setup(EchoFitter::along());
    let producer = TrackProducer::new("ctf", ProducerConfig::default());

    let res = producer.produce_with_cancel(&mut ev, &setup, || true);
    assert_eq!(res, Err(TrackoutError::Cancelled));
    assert_eq!(ev.published_count(), 0);
}

#[test]
fn refitter_reproduces_tracks() {
    let mut ev = event_with_candidates();
    let setup = setup(EchoFitter::along());
    TrackProducer::new("ctfWithMaterialTracks", ProducerConfig::default())
        .produce(&mut ev, &setup)
        .unwrap();

    let config = ProducerConfig::builder()
        .src("ctfWithMaterialTracks")
        .item_error_policy(ItemErrorPolicy::Abort)
        .build()
        .unwrap();
    let refitter = TrackRefitter::new("refitted", config);
    refitter.produce(&mut ev, &setup).unwrap();
    assert_eq!(ev.published_count(), 2);

    let original = ev.track_products(&"ctfWithMaterialTracks".into()).unwrap();
    let refit = ev.track_products(&"refitted".into()).unwrap();
    assert_eq!(refit.tracks.len(), original.tracks.len());
    assert_eq!(refit.hits, original.hits);
    for (a, b) in original.tracks.iter().zip(&refit.tracks) {
        assert_eq!(a.hit_pattern(), b.hit_pattern());
        assert_eq!(a.charge, b.charge);
        assert_relative_eq!(a.ndof, b.ndof);
        assert_relative_eq!(a.pt(), b.pt(), epsilon = 1e-9);
    }
    for extra in &refit.extras {
        assert_eq!(extra.seed_direction, PropagationDirection::Along);
    }

    let report = TrackReport::new(ev.id(), refit, setup.geometry()).unwrap();
    assert_eq!(report.tracks.len(), 2);
    assert!(report.tracks[0].hits.iter().all(|h| h.global_position.is_some()));
}
