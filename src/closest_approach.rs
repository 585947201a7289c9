//! # Closest approach to a reference point
//!
//! Transport a fitted state along its helix, in the local magnetic field and without
//! material effects, to the point of closest approach (in the transverse plane) to a
//! reference point, typically the beam spot or the origin.
//!
//! ## Overview
//!
//! For a particle of charge `q` in a field `B` along z:
//!
//! * the transverse radius is `R = pt / (C · |q · B|)` (cm, with `C` the bending constant
//!   [`C_GEV_PER_TESLA_CM`]),
//! * the particle turns clockwise around the helix axis when `q · B > 0`,
//! * the closest point of the circle to the reference lies on the line joining the helix
//!   axis to the reference,
//! * `z` advances by `pz / pt` per unit of transverse path.
//!
//! Neutral states, and states in a field weaker than [`MIN_BENDING_FIELD`], are transported
//! along a straight line. Only the z component of the field at the starting position is
//! used.

use nalgebra::{Point3, Vector2, Vector3};

use crate::{
    constants::{C_GEV_PER_TESLA_CM, MIN_BENDING_FIELD},
    services::MagneticField,
    trackout_errors::TrackoutError,
    trajectory::TrajectoryState,
};

/// Transport `state` to its transverse point of closest approach to `reference`.
///
/// Arguments
/// -----------------
/// * `state`: Starting state (usually the innermost fitted state).
/// * `field`: Magnetic field, evaluated at the state position.
/// * `reference`: The point to approach.
///
/// Return
/// ----------
/// * The state at the closest approach; momentum magnitude and charge are preserved.
/// * [`TrackoutError::ClosestApproachFailed`] if the state has no transverse momentum or
///   the reference lies on the helix axis.
pub fn closest_approach_to_point(
    state: &TrajectoryState,
    field: &dyn MagneticField,
    reference: &Point3<f64>,
) -> Result<TrajectoryState, TrackoutError> {
    let pt = state.pt();
    if !state.is_finite() || pt <= 0.0 {
        return Err(TrackoutError::ClosestApproachFailed(
            "state has no transverse momentum".into(),
        ));
    }

    let bz = field.in_tesla(&state.position).z;
    let qb = f64::from(state.charge) * bz;

    // TODO: transport the curvilinear error with the helix Jacobian instead of copying it.
    let (position, momentum) = if qb.abs() < MIN_BENDING_FIELD {
        straight_line(state, pt, reference)
    } else {
        helix(state, pt, qb, reference)?
    };

    Ok(TrajectoryState::new(
        position,
        momentum,
        state.charge,
        state.curvilinear_error,
    ))
}

fn straight_line(
    state: &TrajectoryState,
    pt: f64,
    reference: &Point3<f64>,
) -> (Point3<f64>, Vector3<f64>) {
    let dir = Vector2::new(state.momentum.x, state.momentum.y) / pt;
    let to_ref = Vector2::new(
        reference.x - state.position.x,
        reference.y - state.position.y,
    );
    let s_t = to_ref.dot(&dir);

    let position = Point3::new(
        state.position.x + dir.x * s_t,
        state.position.y + dir.y * s_t,
        state.position.z + state.momentum.z / pt * s_t,
    );
    (position, state.momentum)
}

fn helix(
    state: &TrajectoryState,
    pt: f64,
    qb: f64,
    reference: &Point3<f64>,
) -> Result<(Point3<f64>, Vector3<f64>), TrackoutError> {
    let radius = pt / (C_GEV_PER_TESLA_CM * qb.abs());
    let sign = qb.signum();

    let pos = Vector2::new(state.position.x, state.position.y);
    let dir = Vector2::new(state.momentum.x, state.momentum.y) / pt;
    let center = pos + Vector2::new(dir.y, -dir.x) * (sign * radius);

    let to_ref = Vector2::new(reference.x, reference.y) - center;
    let dist = to_ref.norm();
    if dist < f64::EPSILON * radius.max(1.0) {
        return Err(TrackoutError::ClosestApproachFailed(
            "reference point on the helix axis".into(),
        ));
    }

    let u0 = (pos - center) / radius;
    let u = to_ref / dist;

    // signed turning angle from the start to the closest point
    let dphi = (u0.x * u.y - u0.y * u.x).atan2(u0.dot(&u));
    let s_t = -sign * radius * dphi;

    let pca = center + u * radius;
    let new_dir = Vector2::new(u.y, -u.x) * sign;

    let position = Point3::new(pca.x, pca.y, state.position.z + state.momentum.z / pt * s_t);
    let momentum = Vector3::new(new_dir.x * pt, new_dir.y * pt, state.momentum.z);
    Ok((position, momentum))
}
