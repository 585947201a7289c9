//! # External collaborators
//!
//! The pipeline does not fit, propagate or describe the detector itself. These traits are
//! the contracts it relies on:
//!
//! | Trait | Role |
//! |-------|------|
//! | [`TrajectoryFitter`] | Fit a seed + hits into a [`Trajectory`] (or decline) |
//! | [`Propagator`] | Direction-aware state transport; exposes the magnetic field |
//! | [`MagneticField`] | Field value at a global point |
//! | [`TrackingGeometry`] | Module surfaces by [`DetId`] |
//! | [`RecHitBuilder`] | Persistent hit → transient hit |
//!
//! All of them are `Send + Sync`: one instance is shared by every fit of an event and,
//! with the `parallel` feature, by several worker threads.
//!
//! Simple implementations are provided for the field ([`UniformMagneticField`]), the
//! geometry ([`SurfaceMapGeometry`]) and the hit builder ([`GeometricRecHitBuilder`]).

use std::collections::HashMap;

use ahash::RandomState;
use nalgebra::{Matrix3, Point2, Point3, Vector3};

use crate::{
    det_id::DetId,
    hits::{RecHit, TransientRecHit},
    trackout_errors::TrackoutError,
    trajectory::{PropagationDirection, Trajectory, TrajectorySeed, TrajectoryState},
};

pub trait TrajectoryFitter: Send + Sync {
    /// Fit `hits` starting from `initial_state`.
    ///
    /// Return
    /// ----------
    /// * `Ok(Some(trajectory))` – a fitted trajectory.
    /// * `Ok(None)` – the fitter declined (too few hits, divergence, ...). Not an error.
    /// * `Err(_)` – the fit failed unexpectedly; the input is skipped.
    fn fit(
        &self,
        seed: &TrajectorySeed,
        hits: &[TransientRecHit],
        initial_state: &TrajectoryState,
    ) -> Result<Option<Trajectory>, TrackoutError>;
}

pub trait MagneticField: Send + Sync {
    /// Field at `point`, in Tesla.
    fn in_tesla(&self, point: &Point3<f64>) -> Vector3<f64>;
}

pub trait Propagator: Send + Sync {
    fn name(&self) -> &str;
    fn direction(&self) -> PropagationDirection;
    fn magnetic_field(&self) -> &dyn MagneticField;
}

pub trait TrackingGeometry: Send + Sync {
    fn surface(&self, det_id: DetId) -> Option<&Surface>;
}

pub trait RecHitBuilder: Send + Sync {
    fn build(&self, hit: &RecHit, geometry: &dyn TrackingGeometry) -> TransientRecHit;
}

/// Constant field, e.g. a solenoid interior.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformMagneticField {
    pub field: Vector3<f64>,
}

impl UniformMagneticField {
    /// Field of `bz` Tesla along the z axis.
    pub fn along_z(bz: f64) -> Self {
        UniformMagneticField {
            field: Vector3::new(0.0, 0.0, bz),
        }
    }
}

impl MagneticField for UniformMagneticField {
    fn in_tesla(&self, _point: &Point3<f64>) -> Vector3<f64> {
        self.field
    }
}

/// Plane of a detector module: origin and local → global rotation.
///
/// Local `x`, `y` span the plane and local `z` is its normal.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub position: Point3<f64>,
    pub rotation: Matrix3<f64>,
}

impl Surface {
    pub fn new(position: Point3<f64>, rotation: Matrix3<f64>) -> Self {
        Surface { position, rotation }
    }

    pub fn to_global(&self, local: &Point2<f64>) -> Point3<f64> {
        self.position + self.rotation * Vector3::new(local.x, local.y, 0.0)
    }

    pub fn to_global_vector(&self, local: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * local
    }

    /// Project a global point onto the plane, in local coordinates.
    pub fn to_local(&self, global: &Point3<f64>) -> Point2<f64> {
        let v = self.rotation.transpose() * (global - self.position);
        Point2::new(v.x, v.y)
    }

    pub fn to_local_vector(&self, global: &Vector3<f64>) -> Vector3<f64> {
        self.rotation.transpose() * global
    }
}

/// Geometry backed by a map of module surfaces.
#[derive(Debug, Clone, Default)]
pub struct SurfaceMapGeometry {
    surfaces: HashMap<DetId, Surface, RandomState>,
}

impl SurfaceMapGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, det_id: DetId, surface: Surface) {
        self.surfaces.insert(det_id, surface);
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

impl TrackingGeometry for SurfaceMapGeometry {
    fn surface(&self, det_id: DetId) -> Option<&Surface> {
        self.surfaces.get(&det_id)
    }
}

/// Hit builder placing each hit on its module surface.
///
/// A hit whose module is unknown to the geometry becomes an invalid transient hit. Placeholder
/// hits of lost modules stay lost, without a global position.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeometricRecHitBuilder;

impl RecHitBuilder for GeometricRecHitBuilder {
    fn build(&self, hit: &RecHit, geometry: &dyn TrackingGeometry) -> TransientRecHit {
        if !hit.is_valid() {
            return TransientRecHit::lost(hit.det_id, hit.hit_type);
        }
        match geometry.surface(hit.det_id) {
            Some(surface) => {
                TransientRecHit::new(hit.clone(), surface.to_global(&hit.local_position))
            }
            None => TransientRecHit::invalid(hit.det_id),
        }
    }
}

#[cfg(test)]
mod services_test {
    use super::*;
    use crate::{constants::LocalError, det_id::Detector, hits::HitType};
    use approx::assert_relative_eq;

    fn rotated_surface() -> Surface {
        // local x → global y, local y → global z, normal → global x
        let rotation = Matrix3::new(0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0);
        Surface::new(Point3::new(10.0, 0.0, 0.0), rotation)
    }

    #[test]
    fn test_surface_round_trip() {
        let s = rotated_surface();
        let g = s.to_global(&Point2::new(1.0, 2.0));
        assert_relative_eq!(g, Point3::new(10.0, 1.0, 2.0));
        assert_relative_eq!(s.to_local(&g), Point2::new(1.0, 2.0));

        let v = Vector3::new(0.5, -1.0, 3.0);
        assert_relative_eq!(s.to_local_vector(&s.to_global_vector(&v)), v);
    }

    #[test]
    fn test_builder_unknown_module_gives_invalid_hit() {
        let known = DetId::new(Detector::Tracker, 3, 1, 1);
        let unknown = DetId::new(Detector::Tracker, 3, 1, 2);
        let mut geometry = SurfaceMapGeometry::new();
        geometry.insert(known, rotated_surface());

        let builder = GeometricRecHitBuilder;
        let ok = builder.build(
            &RecHit::new(known, Point2::new(1.0, 0.0), LocalError::identity(), 2),
            &geometry,
        );
        assert!(ok.is_valid());
        assert_relative_eq!(*ok.global_position().unwrap(), Point3::new(10.0, 1.0, 0.0));

        let lost = builder.build(
            &RecHit::new(unknown, Point2::origin(), LocalError::identity(), 2),
            &geometry,
        );
        assert!(lost.hit().is_none());
        assert_eq!(lost.det_id(), unknown);
    }

    #[test]
    fn test_builder_keeps_placeholder_hits() {
        let det_id = DetId::new(Detector::Tracker, 5, 2, 9);
        let mut geometry = SurfaceMapGeometry::new();
        geometry.insert(det_id, rotated_surface());

        let placeholder = RecHit::lost(det_id, HitType::Missing);
        let built = GeometricRecHitBuilder.build(&placeholder, &geometry);
        assert_eq!(built.hit(), Some(&placeholder));
        assert!(!built.is_valid());
        assert!(built.global_position().is_none());
        assert_eq!(built.dimension(), 0);
    }
}
