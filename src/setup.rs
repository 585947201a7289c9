//! # Event setup
//!
//! Per-run services used by the producers: the tracking geometry and named registries of
//! fitters, propagators and hit builders. The magnetic field is reached through the
//! propagator. A producer resolves the components named in its [`ProducerConfig`] once
//! per event with [`EventSetup::get_from_es`].

use std::{collections::HashMap, fmt, sync::Arc};

use ahash::RandomState;
use tracing::debug;

use crate::{
    config::ProducerConfig,
    services::{Propagator, RecHitBuilder, TrackingGeometry, TrajectoryFitter},
    trackout_errors::TrackoutError,
};

type Registry<T> = HashMap<String, Arc<T>, RandomState>;

pub struct EventSetup {
    geometry: Arc<dyn TrackingGeometry>,
    fitters: Registry<dyn TrajectoryFitter>,
    propagators: Registry<dyn Propagator>,
    builders: Registry<dyn RecHitBuilder>,
}

/// The components one event is processed with, borrowed from an [`EventSetup`].
#[derive(Clone, Copy)]
pub struct EsProducts<'a> {
    pub geometry: &'a dyn TrackingGeometry,
    pub fitter: &'a dyn TrajectoryFitter,
    pub propagator: &'a dyn Propagator,
    pub builder: &'a dyn RecHitBuilder,
}

impl EventSetup {
    pub fn new(geometry: Arc<dyn TrackingGeometry>) -> Self {
        EventSetup {
            geometry,
            fitters: HashMap::default(),
            propagators: HashMap::default(),
            builders: HashMap::default(),
        }
    }

    pub fn with_fitter(
        mut self,
        name: impl Into<String>,
        fitter: Arc<dyn TrajectoryFitter>,
    ) -> Self {
        self.fitters.insert(name.into(), fitter);
        self
    }

    pub fn with_propagator(
        mut self,
        name: impl Into<String>,
        propagator: Arc<dyn Propagator>,
    ) -> Self {
        self.propagators.insert(name.into(), propagator);
        self
    }

    pub fn with_builder(
        mut self,
        name: impl Into<String>,
        builder: Arc<dyn RecHitBuilder>,
    ) -> Self {
        self.builders.insert(name.into(), builder);
        self
    }

    pub fn geometry(&self) -> &dyn TrackingGeometry {
        self.geometry.as_ref()
    }

    /// Resolve the components named in `config`.
    ///
    /// Return
    /// ----------
    /// * The borrowed components.
    /// * [`TrackoutError::ComponentNotFound`] for the first name with no registration.
    pub fn get_from_es(&self, config: &ProducerConfig) -> Result<EsProducts<'_>, TrackoutError> {
        let fitter = lookup(&self.fitters, "fitter", &config.fitter)?;
        let propagator = lookup(&self.propagators, "propagator", &config.propagator)?;
        let builder = lookup(&self.builders, "hit builder", &config.ttrh_builder)?;

        Ok(EsProducts {
            geometry: self.geometry.as_ref(),
            fitter,
            propagator,
            builder,
        })
    }
}

fn lookup<'a, T: ?Sized>(
    registry: &'a Registry<T>,
    kind: &'static str,
    name: &str,
) -> Result<&'a T, TrackoutError> {
    debug!(kind, name, "event setup lookup");
    registry
        .get(name)
        .map(Arc::as_ref)
        .ok_or_else(|| TrackoutError::ComponentNotFound {
            kind,
            name: name.to_string(),
        })
}

impl fmt::Debug for EventSetup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn names(mut r: Vec<&String>) -> Vec<&String> {
            r.sort();
            r
        }
        f.debug_struct("EventSetup")
            .field("fitters", &names(self.fitters.keys().collect()))
            .field("propagators", &names(self.propagators.keys().collect()))
            .field("builders", &names(self.builders.keys().collect()))
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for EsProducts<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EsProducts")
            .field("propagator", &self.propagator.name())
            .field("direction", &self.propagator.direction())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod setup_test {
    use super::*;
    use crate::{
        hits::TransientRecHit,
        services::{GeometricRecHitBuilder, MagneticField, SurfaceMapGeometry, UniformMagneticField},
        trajectory::{PropagationDirection, Trajectory, TrajectorySeed, TrajectoryState},
    };
    use nalgebra::Point3;

    struct Straight(UniformMagneticField);

    impl Propagator for Straight {
        fn name(&self) -> &str {
            "Straight"
        }

        fn direction(&self) -> PropagationDirection {
            PropagationDirection::Opposite
        }

        fn magnetic_field(&self) -> &dyn MagneticField {
            &self.0
        }
    }

    struct NoFit;

    impl TrajectoryFitter for NoFit {
        fn fit(
            &self,
            _seed: &TrajectorySeed,
            _hits: &[TransientRecHit],
            _initial_state: &TrajectoryState,
        ) -> Result<Option<Trajectory>, TrackoutError> {
            Ok(None)
        }
    }

    fn partial_setup() -> EventSetup {
        EventSetup::new(Arc::new(SurfaceMapGeometry::new()))
            .with_builder("WithTrackAngle", Arc::new(GeometricRecHitBuilder))
    }

    #[test]
    fn test_missing_component_is_reported() {
        let setup = partial_setup();

        let err = setup.get_from_es(&ProducerConfig::default()).unwrap_err();
        assert_eq!(
            err,
            TrackoutError::ComponentNotFound {
                kind: "fitter",
                name: "KFFittingSmoother".into()
            }
        );
        assert!(format!("{setup:?}").contains("WithTrackAngle"));
    }

    #[test]
    fn test_components_resolved_by_name() {
        let setup = partial_setup()
            .with_fitter("KFFittingSmoother", Arc::new(NoFit))
            .with_propagator("Straight", Arc::new(Straight(UniformMagneticField::along_z(2.0))));
        let config = ProducerConfig::builder().propagator("Straight").build().unwrap();

        let es = setup.get_from_es(&config).unwrap();
        assert_eq!(es.propagator.name(), "Straight");
        assert_eq!(
            es.propagator.magnetic_field().in_tesla(&Point3::origin()).z,
            2.0
        );
        let shown = format!("{es:?}");
        assert!(shown.contains("Straight") && shown.contains("Opposite"));
    }
}
