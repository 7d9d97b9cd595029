//! Unit-circle lookup for the tube's cross-section.

#![allow(clippy::cast_precision_loss)]

use std::f64::consts::{PI, TAU};

use nalgebra::Vector3;

use crate::config::NormalMode;

/// Precomputed cross-section samples in local frame space.
///
/// Sample `e` sits at angle `2 * pi * e / edge_count` in the local XY plane;
/// local `+Z` is the curve's forward direction.
#[derive(Debug, Clone, Default)]
pub struct CrossSection {
    points: Vec<Vector3<f64>>,
    normals: Vec<Vector3<f64>>,
    tangents: Vec<Vector3<f64>>,
    normal_mode: NormalMode,
}

impl CrossSection {
    /// Build the lookup for `edge_count` samples.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_tube::{CrossSection, NormalMode};
    ///
    /// let section = CrossSection::new(4, NormalMode::Smooth);
    /// assert_eq!(section.edge_count(), 4);
    /// assert!((section.points()[1].y - 1.0).abs() < 1e-12);
    /// ```
    #[must_use]
    pub fn new(edge_count: usize, normal_mode: NormalMode) -> Self {
        let mut section = Self::default();
        section.rebuild(edge_count, normal_mode);
        section
    }

    /// Recompute the lookup, reusing the buffers when the count is unchanged.
    pub fn rebuild(&mut self, edge_count: usize, normal_mode: NormalMode) {
        self.points.resize(edge_count, Vector3::zeros());
        self.normals.resize(edge_count, Vector3::zeros());
        self.tangents.resize(edge_count, Vector3::zeros());
        self.normal_mode = normal_mode;
        if edge_count == 0 {
            return;
        }

        let step = TAU / edge_count as f64;
        // Hard edges take the normal of the face between two samples
        let normal_offset = match normal_mode {
            NormalMode::HardEdges => PI / edge_count as f64,
            NormalMode::Smooth | NormalMode::Hard => 0.0,
        };

        for e in 0..edge_count {
            let angle = step * e as f64;
            let (sin_a, cos_a) = angle.sin_cos();
            self.points[e] = Vector3::new(cos_a, sin_a, 0.0);

            let (sin_n, cos_n) = (angle + normal_offset).sin_cos();
            self.normals[e] = Vector3::new(cos_n, sin_n, 0.0);
            self.tangents[e] = self.normals[e].cross(&Vector3::z());
        }
    }

    /// Number of samples.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.points.len()
    }

    /// Normal mode the normals were built for.
    #[must_use]
    pub fn normal_mode(&self) -> NormalMode {
        self.normal_mode
    }

    /// Sample positions on the unit circle.
    #[must_use]
    pub fn points(&self) -> &[Vector3<f64>] {
        &self.points
    }

    /// Sample normals.
    #[must_use]
    pub fn normals(&self) -> &[Vector3<f64>] {
        &self.normals
    }

    /// Sample tangents (`normal x forward`), the tilt axis for steepness.
    #[must_use]
    pub fn tangents(&self) -> &[Vector3<f64>] {
        &self.tangents
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn samples_on_unit_circle() {
        let section = CrossSection::new(8, NormalMode::Smooth);
        assert_eq!(section.points().len(), 8);
        for p in section.points() {
            assert_relative_eq!(p.norm(), 1.0, epsilon = 1e-12);
            assert_relative_eq!(p.z, 0.0);
        }
        assert_relative_eq!(section.points()[0], Vector3::x(), epsilon = 1e-12);
        assert_relative_eq!(section.points()[2], Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn smooth_normals_match_points() {
        for mode in [NormalMode::Smooth, NormalMode::Hard] {
            let section = CrossSection::new(6, mode);
            for (p, n) in section.points().iter().zip(section.normals()) {
                assert_relative_eq!(*p, *n, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn hard_edge_normals_sit_between_samples() {
        let section = CrossSection::new(4, NormalMode::HardEdges);
        let expected = Vector3::new(1.0, 1.0, 0.0).normalize();
        assert_relative_eq!(section.normals()[0], expected, epsilon = 1e-12);

        let mid = (section.points()[1] + section.points()[2]).normalize();
        assert_relative_eq!(section.normals()[1], mid, epsilon = 1e-12);
    }

    #[test]
    fn tangents_perpendicular_to_normals() {
        let section = CrossSection::new(5, NormalMode::HardEdges);
        for (n, t) in section.normals().iter().zip(section.tangents()) {
            assert_relative_eq!(n.dot(t), 0.0, epsilon = 1e-12);
            assert_relative_eq!(t.z, 0.0);
            assert_relative_eq!(t.norm(), 1.0, epsilon = 1e-12);
        }
        // normal x forward at angle 0 is -Y
        let section = CrossSection::new(4, NormalMode::Smooth);
        assert_relative_eq!(section.tangents()[0], -Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn rebuild_resizes() {
        let mut section = CrossSection::new(4, NormalMode::Smooth);
        section.rebuild(12, NormalMode::HardEdges);
        assert_eq!(section.edge_count(), 12);
        assert_eq!(section.normals().len(), 12);
        assert_eq!(section.normal_mode(), NormalMode::HardEdges);
    }
}
