//! Orientation frames along the tube's center line.
//!
//! Frames are propagated point by point from a running up vector instead of
//! being derived independently, so the cross-sections do not twist along the
//! curve. The up vector used at the first point is remembered between
//! updates, which keeps an animated tube from flipping when its curve moves.

use nalgebra::{Point3, Rotation3, Unit, UnitQuaternion, Vector3};
use tracing::debug;

/// Squared length below which a direction counts as zero.
const DEGENERATE_EPSILON: f64 = 1e-24;

/// Tolerance for reusing the remembered up vector unchanged.
const CARRIED_UP_TOLERANCE: f64 = 1e-9;

/// How many segments to look ahead or behind when patching a zero direction.
pub const DIRECTION_PATCH_DISTANCE: usize = 1;

/// An orthonormal basis attached to a curve point.
///
/// Local cross-section coordinates map `x` to `right`, `y` to `up` and `z`
/// to `forward`. The basis is right-handed: `right x up = forward`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Direction along the curve.
    pub forward: Vector3<f64>,
    /// Up direction of the cross-section plane.
    pub up: Vector3<f64>,
    /// Right direction of the cross-section plane.
    pub right: Vector3<f64>,
}

impl Default for Frame {
    fn default() -> Self {
        Self::identity()
    }
}

impl Frame {
    /// The world axes: forward `+Z`, up `+Y`, right `+X`.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            forward: Vector3::z(),
            up: Vector3::y(),
            right: Vector3::x(),
        }
    }

    /// Build a frame looking along `forward` with `up` as a hint.
    ///
    /// `forward` must be unit length. The up vector is orthogonalized
    /// against it; when the two are parallel an arbitrary perpendicular is
    /// used instead.
    #[must_use]
    pub fn from_forward_up(forward: Vector3<f64>, up: Vector3<f64>) -> Self {
        let right = up
            .cross(&forward)
            .try_normalize(f64::EPSILON)
            .unwrap_or_else(|| find_perpendicular(forward));
        let up = forward.cross(&right);
        Self { forward, up, right }
    }

    /// Rotate a vector from local cross-section space into world space.
    #[inline]
    #[must_use]
    pub fn rotate(&self, local: &Vector3<f64>) -> Vector3<f64> {
        self.right * local.x + self.up * local.y + self.forward * local.z
    }

    /// Rotate the frame around its forward axis by `angle` radians.
    #[must_use]
    pub fn rotate_around_forward(&self, angle: f64) -> Self {
        let (sin_a, cos_a) = angle.sin_cos();
        Self {
            forward: self.forward,
            up: self.up * cos_a - self.right * sin_a,
            right: self.right * cos_a + self.up * sin_a,
        }
    }

    /// The frame as a rotation from local into world space.
    #[must_use]
    pub fn rotation(&self) -> UnitQuaternion<f64> {
        let basis = Rotation3::from_basis_unchecked(&[self.right, self.up, self.forward]);
        UnitQuaternion::from_rotation_matrix(&basis)
    }

    /// Whether the three axes are unit length and mutually perpendicular.
    #[must_use]
    pub fn is_orthonormal(&self, tolerance: f64) -> bool {
        (self.forward.norm() - 1.0).abs() < tolerance
            && (self.up.norm() - 1.0).abs() < tolerance
            && (self.right.norm() - 1.0).abs() < tolerance
            && self.forward.dot(&self.up).abs() < tolerance
            && self.forward.dot(&self.right).abs() < tolerance
            && self.up.dot(&self.right).abs() < tolerance
    }
}

/// Find a unit vector perpendicular to the given vector.
fn find_perpendicular(v: Vector3<f64>) -> Vector3<f64> {
    // Choose the axis most perpendicular to v
    let abs_x = v.x.abs();
    let abs_y = v.y.abs();
    let abs_z = v.z.abs();

    let perp = if abs_x <= abs_y && abs_x <= abs_z {
        Vector3::x()
    } else if abs_y <= abs_z {
        Vector3::y()
    } else {
        Vector3::z()
    };

    v.cross(&perp)
        .try_normalize(f64::EPSILON)
        .unwrap_or(Vector3::x())
}

#[inline]
fn is_zero(v: &Vector3<f64>) -> bool {
    v.norm_squared() < DEGENERATE_EPSILON
}

/// Computes per-point directions and frames, keeping frame continuity
/// across updates.
#[derive(Debug, Clone, Default)]
pub struct FrameBuilder {
    frames: Vec<Frame>,
    rotations: Vec<UnitQuaternion<f64>>,
    directions: Vec<Vector3<f64>>,
    past_up: Option<Vector3<f64>>,
}

impl FrameBuilder {
    /// Create a builder with no remembered up vector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the remembered up vector. The next update starts from world
    /// up again.
    pub fn reset(&mut self) {
        self.past_up = None;
    }

    /// Up vector remembered from the last update, before the angle offset.
    #[must_use]
    pub fn past_up(&self) -> Option<Vector3<f64>> {
        self.past_up
    }

    /// Frames from the last update, one per point.
    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Rotations from the last update, one per point.
    #[must_use]
    pub fn rotations(&self) -> &[UnitQuaternion<f64>] {
        &self.rotations
    }

    /// Segment directions with zero-length segments patched.
    ///
    /// The last point repeats the direction of the last segment.
    #[must_use]
    pub fn directions(&self) -> &[Vector3<f64>] {
        &self.directions
    }

    /// Rotation at a point, or identity when the index is out of range.
    #[must_use]
    pub fn rotation_at(&self, index: usize) -> UnitQuaternion<f64> {
        self.rotations
            .get(index)
            .copied()
            .unwrap_or_else(UnitQuaternion::identity)
    }

    /// Recompute directions and frames for `points`.
    ///
    /// `forward_angle_offset` is in degrees and twists the first frame
    /// around its forward axis; the twist carries over to the rest of the
    /// curve through propagation. Fewer than two points clears all frames.
    pub fn update(&mut self, points: &[Point3<f64>], forward_angle_offset: f64) {
        let n = points.len();
        if n < 2 {
            self.frames.clear();
            self.rotations.clear();
            self.directions.clear();
            return;
        }

        self.directions.resize(n, Vector3::zeros());
        for p in 0..n - 1 {
            self.directions[p] = points[p + 1] - points[p];
        }
        let patched = patch_zero_directions(&mut self.directions[..n - 1]);
        if patched > 0 {
            debug!("Patched {} zero-length tube segments", patched);
        }
        self.directions[n - 1] = self.directions[n - 2];

        let first = self.directions[0];
        let mut up = self.past_up.unwrap_or_else(|| {
            if first.x.abs() < f64::EPSILON && first.z.abs() < f64::EPSILON {
                Vector3::x()
            } else {
                Vector3::y()
            }
        });

        let closed = points[0] == points[n - 1];
        self.frames.resize(n, Frame::identity());
        self.rotations.resize(n, UnitQuaternion::identity());

        let mut degenerate = 0;
        for p in 0..n {
            let forward = if p != 0 && p != n - 1 {
                self.directions[p] + self.directions[p - 1]
            } else if closed {
                self.directions[n - 1] + self.directions[0]
            } else {
                self.directions[p]
            };

            let Some(forward) = forward.try_normalize(f64::EPSILON) else {
                self.frames[p] = Frame::identity();
                self.rotations[p] = UnitQuaternion::identity();
                degenerate += 1;
                continue;
            };

            let mut frame = Frame::from_forward_up(forward, up);
            if p == 0 {
                frame = self.carry_first_up(frame);
                if forward_angle_offset != 0.0 {
                    frame = frame.rotate_around_forward(forward_angle_offset.to_radians());
                }
            }
            up = frame.up;

            self.frames[p] = frame;
            self.rotations[p] = frame.rotation();
        }

        if degenerate > 0 {
            debug!(
                "{} of {} tube frames fell back to identity (zero forward direction)",
                degenerate, n
            );
        }
    }

    /// Remember the first point's up vector, reusing the previous one when
    /// it still fits so repeated updates of an unchanged curve reproduce the
    /// same frames exactly.
    fn carry_first_up(&mut self, frame: Frame) -> Frame {
        let up = match self.past_up {
            Some(past) if (past - frame.up).norm() < CARRIED_UP_TOLERANCE => past,
            _ => frame.up,
        };
        self.past_up = Some(up);
        Frame::from_forward_up(frame.forward, up)
    }
}

/// Replace zero-length directions with a neighbor, looking forward first
/// and then backward, up to [`DIRECTION_PATCH_DISTANCE`] segments away.
///
/// Patching runs in index order, so a run of zero segments after a valid
/// one is filled by chaining. Returns the number of patched segments.
fn patch_zero_directions(directions: &mut [Vector3<f64>]) -> usize {
    let len = directions.len();
    let mut patched = 0;
    for p in 0..len {
        if !is_zero(&directions[p]) {
            continue;
        }
        let ahead = (1..=DIRECTION_PATCH_DISTANCE)
            .map(|k| p + k)
            .take_while(|&i| i < len)
            .find(|&i| !is_zero(&directions[i]));
        let source = ahead.or_else(|| {
            (1..=DIRECTION_PATCH_DISTANCE)
                .filter_map(|k| p.checked_sub(k))
                .find(|&i| !is_zero(&directions[i]))
        });
        if let Some(i) = source {
            directions[p] = directions[i];
            patched += 1;
        }
    }
    patched
}

/// Rotate a local vector around `axis` by `angle` radians.
///
/// Returns the vector unchanged when the axis is degenerate.
#[must_use]
pub(crate) fn rotate_about(v: &Vector3<f64>, axis: &Vector3<f64>, angle: f64) -> Vector3<f64> {
    match Unit::try_new(*axis, f64::EPSILON) {
        Some(axis) => Rotation3::from_axis_angle(&axis, angle) * *v,
        None => *v,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn line_x() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ]
    }

    #[test]
    fn identity_is_right_handed() {
        let frame = Frame::identity();
        assert_relative_eq!(frame.right.cross(&frame.up), frame.forward, epsilon = 1e-12);
        assert_relative_eq!(
            frame.rotation().angle(),
            0.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn from_forward_up_orthonormal() {
        let frame = Frame::from_forward_up(Vector3::x(), Vector3::new(0.3, 1.0, 0.2));
        assert!(frame.is_orthonormal(1e-10));
        assert_relative_eq!(frame.right.cross(&frame.up), frame.forward, epsilon = 1e-10);
    }

    #[test]
    fn from_forward_up_parallel_falls_back() {
        let frame = Frame::from_forward_up(Vector3::y(), Vector3::y());
        assert!(frame.is_orthonormal(1e-10));
    }

    #[test]
    fn rotation_matches_rotate() {
        let frame = Frame::from_forward_up(
            Vector3::new(1.0, 1.0, 0.0).normalize(),
            Vector3::z(),
        );
        let local = Vector3::new(0.3, -0.7, 0.2);
        assert_relative_eq!(frame.rotation() * local, frame.rotate(&local), epsilon = 1e-10);
    }

    #[test]
    fn rotate_around_forward_quarter_turn() {
        let frame = Frame::identity().rotate_around_forward(FRAC_PI_2);
        // Right-hand rule around +Z takes +Y to -X
        assert_relative_eq!(frame.up, -Vector3::x(), epsilon = 1e-12);
        assert_relative_eq!(frame.right, Vector3::y(), epsilon = 1e-12);
        assert!(frame.is_orthonormal(1e-12));
    }

    #[test]
    fn straight_line_frames() {
        let mut builder = FrameBuilder::new();
        builder.update(&line_x(), 0.0);

        assert_eq!(builder.frames().len(), 3);
        for frame in builder.frames() {
            assert_relative_eq!(frame.forward, Vector3::x(), epsilon = 1e-12);
            assert_relative_eq!(frame.up, Vector3::y(), epsilon = 1e-12);
            assert!(frame.is_orthonormal(1e-12));
        }
        assert_eq!(builder.directions().len(), 3);
        assert_relative_eq!(builder.directions()[2], Vector3::x(), epsilon = 1e-12);
    }

    #[test]
    fn vertical_start_uses_world_right() {
        let points = vec![Point3::origin(), Point3::new(0.0, 1.0, 0.0)];
        let mut builder = FrameBuilder::new();
        builder.update(&points, 0.0);

        let frame = builder.frames()[0];
        assert_relative_eq!(frame.forward, Vector3::y(), epsilon = 1e-12);
        assert_relative_eq!(frame.up, Vector3::x(), epsilon = 1e-12);
        assert!(frame.is_orthonormal(1e-12));
    }

    #[test]
    fn quarter_turn_stays_orthonormal() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 1.0),
        ];
        let mut builder = FrameBuilder::new();
        builder.update(&points, 0.0);

        for frame in builder.frames() {
            assert!(frame.is_orthonormal(1e-10));
        }
        // Middle frame averages both segments
        let mid = builder.frames()[1].forward;
        assert_relative_eq!(mid, Vector3::new(1.0, 0.0, 1.0).normalize(), epsilon = 1e-12);
        // Bending within the XZ plane keeps up on +Y
        assert_relative_eq!(builder.frames()[2].up, Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn angle_offset_twists_whole_tube() {
        let mut builder = FrameBuilder::new();
        builder.update(&line_x(), 90.0);

        for frame in builder.frames() {
            assert_relative_eq!(frame.forward, Vector3::x(), epsilon = 1e-12);
            // +Y rotated a quarter turn around +X is +Z
            assert_relative_eq!(frame.up, Vector3::z(), epsilon = 1e-12);
        }
        // The remembered up is the untwisted one
        let past = builder.past_up().unwrap_or_else(Vector3::zeros);
        assert_relative_eq!(past, Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn offset_does_not_accumulate() {
        let mut builder = FrameBuilder::new();
        builder.update(&line_x(), 45.0);
        let first = builder.frames().to_vec();
        builder.update(&line_x(), 45.0);
        assert_eq!(builder.frames(), first.as_slice());
    }

    #[test]
    fn carried_up_keeps_continuity() {
        let mut builder = FrameBuilder::new();
        builder.update(&line_x(), 0.0);
        let before = builder.frames()[0].up;

        // Tilt the curve slightly; the new up should stay close to the old one
        let tilted = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.1),
            Point3::new(2.0, 0.0, 0.2),
        ];
        builder.update(&tilted, 0.0);
        assert!(builder.frames()[0].up.dot(&before) > 0.99);

        builder.reset();
        assert!(builder.past_up().is_none());
    }

    #[test]
    fn repeated_update_is_bit_identical() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 2.0, 0.5),
            Point3::new(2.0, 1.0, 3.0),
            Point3::new(4.0, 0.0, 1.0),
        ];
        let mut builder = FrameBuilder::new();
        builder.update(&points, 10.0);
        let first = builder.frames().to_vec();
        builder.update(&points, 10.0);
        assert_eq!(builder.frames(), first.as_slice());
    }

    #[test]
    fn duplicate_points_are_patched() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let mut builder = FrameBuilder::new();
        builder.update(&points, 0.0);

        assert_relative_eq!(builder.directions()[1], Vector3::x(), epsilon = 1e-12);
        for frame in builder.frames() {
            assert_relative_eq!(frame.forward, Vector3::x(), epsilon = 1e-12);
        }
    }

    #[test]
    fn all_duplicate_points_fall_back_to_identity() {
        let points = vec![Point3::new(1.0, 1.0, 1.0); 3];
        let mut builder = FrameBuilder::new();
        builder.update(&points, 0.0);

        assert_eq!(builder.frames().len(), 3);
        for frame in builder.frames() {
            assert_eq!(*frame, Frame::identity());
        }
    }

    #[test]
    fn closed_loop_seam_is_averaged() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, 0.0),
        ];
        let mut builder = FrameBuilder::new();
        builder.update(&points, 0.0);

        let frames = builder.frames();
        // Last segment runs -Z, first runs +X
        let expected = Vector3::new(1.0, 0.0, -1.0).normalize();
        assert_relative_eq!(frames[0].forward, expected, epsilon = 1e-12);
        assert_relative_eq!(frames[4].forward, expected, epsilon = 1e-12);
    }

    #[test]
    fn rotation_at_out_of_range_is_identity() {
        let mut builder = FrameBuilder::new();
        builder.update(&line_x(), 0.0);
        assert_eq!(builder.rotation_at(99), UnitQuaternion::identity());
        assert_eq!(builder.rotations().len(), 3);
    }

    #[test]
    fn too_few_points_clears() {
        let mut builder = FrameBuilder::new();
        builder.update(&line_x(), 0.0);
        builder.update(&[], 0.0);
        assert!(builder.frames().is_empty());
        assert!(builder.directions().is_empty());
    }

    #[test]
    fn patch_prefers_forward_neighbor() {
        let mut dirs = vec![Vector3::zeros(), Vector3::y(), Vector3::zeros(), Vector3::z()];
        let patched = patch_zero_directions(&mut dirs);
        assert_eq!(patched, 2);
        assert_eq!(dirs[0], Vector3::y());
        assert_eq!(dirs[2], Vector3::z());
    }

    #[test]
    fn patch_search_is_bounded() {
        let mut dirs = vec![Vector3::zeros(), Vector3::zeros(), Vector3::x()];
        patch_zero_directions(&mut dirs);
        // Index 0 is two segments away from the only valid direction
        assert_eq!(dirs[0], Vector3::zeros());
        assert_eq!(dirs[1], Vector3::x());
    }

    #[test]
    fn find_perpendicular_axes() {
        for axis in [Vector3::x(), Vector3::y(), Vector3::z()] {
            let perp = find_perpendicular(axis);
            assert_relative_eq!(axis.dot(&perp), 0.0, epsilon = 1e-10);
            assert_relative_eq!(perp.norm(), 1.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn rotate_about_degenerate_axis() {
        let v = Vector3::new(1.0, 2.0, 3.0);
        assert_eq!(rotate_about(&v, &Vector3::zeros(), 1.0), v);
    }
}
