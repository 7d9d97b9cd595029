//! Normal tilt for tubes with varying radius.
//!
//! Between two cross-sections of different size the surface is a cone, so
//! its normals lean towards the narrower end. The tilt angle at a point is
//! derived from the radius change and the segment length.

use nalgebra::Vector3;

use crate::frame::rotate_about;

/// Compute one tilt angle per point, in radians.
///
/// `directions` holds one entry per point as produced by the frame builder
/// (the last point repeats the last segment). Radii wrap modulo their
/// length. Interior points average the radius change of both adjacent
/// segments; the first point uses its outgoing segment and the last point
/// reuses the last segment's change without averaging.
///
/// # Example
///
/// ```
/// use mesh_tube::compute_steepness_angles;
/// use nalgebra::Vector3;
///
/// let directions = [Vector3::x(), Vector3::x()];
/// let mut angles = Vec::new();
/// compute_steepness_angles(&[1.0, 0.0], &directions, &mut angles);
/// assert!((angles[0] - std::f64::consts::FRAC_PI_4).abs() < 1e-12);
/// ```
pub fn compute_steepness_angles(radii: &[f64], directions: &[Vector3<f64>], out: &mut Vec<f64>) {
    let n = directions.len();
    if n < 2 || radii.is_empty() {
        out.clear();
        return;
    }
    out.resize(n, 0.0);

    let radius = |p: usize| radii[p % radii.len()];
    let delta = |p: usize| radius(p + 1) - radius(p);

    for p in 0..n - 1 {
        let average = if p == 0 {
            delta(0)
        } else {
            (delta(p) + delta(p - 1)) * 0.5
        };
        out[p] = -average.atan2(directions[p].norm());
    }
    out[n - 1] = -delta(n - 2).atan2(directions[n - 1].norm());
}

/// Tilt a local cross-section normal around its tangent by `angle`.
#[inline]
#[must_use]
pub fn tilt_normal(normal: &Vector3<f64>, tangent: &Vector3<f64>, angle: f64) -> Vector3<f64> {
    rotate_about(normal, tangent, angle)
}
