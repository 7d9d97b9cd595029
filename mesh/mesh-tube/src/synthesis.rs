//! Vertex, normal and tangent synthesis.
//!
//! The body is swept by placing a scaled cross-section at every point,
//! oriented by the point's frame. The rings are computed once into a scratch
//! buffer and then laid out according to the normal mode (see
//! [`crate::layout`]). Caps are appended after the body.

use nalgebra::{Point3, Vector3, Vector4};

use crate::config::NormalMode;
use crate::cross_section::CrossSection;
use crate::frame::Frame;
use crate::layout::TubeLayout;
use crate::mesh::{Aabb, TubeMesh};
use crate::steepness::tilt_normal;

/// Handedness stored in the `w` component of every tangent.
const TANGENT_HANDEDNESS: f64 = -1.0;

/// Everything the synthesizer reads for one pass.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SynthesisInput<'a> {
    pub layout: TubeLayout,
    pub points: &'a [Point3<f64>],
    pub frames: &'a [Frame],
    pub directions: &'a [Vector3<f64>],
    pub section: &'a CrossSection,
    /// Per-point radii, wrapped modulo. `None` uses `radius` everywhere.
    pub radii: Option<&'a [f64]>,
    pub radius: f64,
    /// Per-point tilt angles, present only with varying radii.
    pub steepness: Option<&'a [f64]>,
    pub invert: bool,
    pub calculate_tangents: bool,
}

impl SynthesisInput<'_> {
    fn radius_at(&self, point: usize) -> f64 {
        match self.radii {
            Some(radii) if !radii.is_empty() => radii[point % radii.len()],
            _ => self.radius,
        }
    }

    fn sign(&self) -> f64 {
        if self.invert { -1.0 } else { 1.0 }
    }

    /// World-space cross-section normal at `(point, edge)`, tilted for
    /// steepness when radii vary. Not yet multiplied by the invert sign.
    fn section_normal(&self, point: usize, edge: usize) -> Vector3<f64> {
        let section = self.section;
        let mut local = section.normals()[edge];
        if let Some(angle) = self.steepness.and_then(|s| s.get(point)) {
            local = tilt_normal(&local, &section.tangents()[edge], *angle);
        }
        self.frames[point].rotate(&local)
    }

    /// `frame.rotate(circle_tangent) x normal`, the tangent running along
    /// the curve.
    fn section_tangent(&self, point: usize, edge: usize, normal: &Vector3<f64>) -> Vector3<f64> {
        self.frames[point]
            .rotate(&self.section.tangents()[edge])
            .cross(normal)
    }

    fn direction(&self, point: usize) -> Vector3<f64> {
        self.directions[point]
            .try_normalize(f64::EPSILON)
            .unwrap_or(self.frames[point].forward)
    }
}

#[inline]
fn tangent4(t: Vector3<f64>) -> Vector4<f64> {
    Vector4::new(t.x, t.y, t.z, TANGENT_HANDEDNESS)
}

/// Sweeps cross-sections along the curve into a [`TubeMesh`].
///
/// Holds the ring scratch buffer between passes so steady-state updates do
/// not allocate.
#[derive(Debug, Clone, Default)]
pub(crate) struct Synthesizer {
    ring: Vec<Point3<f64>>,
}

impl Synthesizer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Fill positions, normals, tangents and bounds of `mesh`.
    ///
    /// Buffers are resized to the layout's vertex count; existing storage is
    /// reused when the count is unchanged.
    pub(crate) fn run(&mut self, input: &SynthesisInput<'_>, mesh: &mut TubeMesh) {
        let layout = input.layout;
        let vertex_count = layout.vertex_count();

        mesh.vertices.resize(vertex_count, Point3::origin());
        mesh.normals.resize(vertex_count, Vector3::zeros());
        if input.calculate_tangents {
            mesh.tangents
                .get_or_insert_with(Vec::new)
                .resize(vertex_count, Vector4::zeros());
        } else {
            mesh.tangents = None;
        }
        mesh.bounds = Aabb::empty();

        if !layout.has_geometry() {
            return;
        }

        self.build_rings(input, &mut mesh.bounds);

        match layout.normal_mode {
            NormalMode::Smooth => self.smooth(input, mesh),
            NormalMode::Hard => self.hard(input, mesh),
            NormalMode::HardEdges => self.hard_edges(input, mesh),
        }

        if let Some(start) = layout.begin_cap_start() {
            self.cap(input, mesh, start, 0);
        }
        if let Some(start) = layout.end_cap_start() {
            self.cap(input, mesh, start, layout.point_count - 1);
        }
    }

    fn build_rings(&mut self, input: &SynthesisInput<'_>, bounds: &mut Aabb) {
        let layout = input.layout;
        let edges = layout.edge_count;
        self.ring
            .resize(layout.point_count * layout.ring_len(), Point3::origin());

        for (p, point) in input.points.iter().enumerate() {
            let radius = input.radius_at(p);
            let frame = &input.frames[p];
            let base = layout.ring_index(p, 0);
            for (e, sample) in input.section.points().iter().enumerate() {
                self.ring[base + e] = point + frame.rotate(sample) * radius;
            }
            // Seam duplicate for texture wrapping
            self.ring[base + edges] = self.ring[base];
            bounds.expand_to_include_sphere(point, radius);
        }
    }

    fn smooth(&self, input: &SynthesisInput<'_>, mesh: &mut TubeMesh) {
        let layout = input.layout;
        let edges = layout.edge_count;
        let sign = input.sign();
        let mut tangents = mesh.tangents.as_deref_mut();

        for p in 0..layout.point_count {
            for e in 0..=edges {
                let v = layout.ring_index(p, e);
                let edge = e % edges;
                let normal = input.section_normal(p, edge) * sign;

                mesh.vertices[v] = self.ring[v];
                mesh.normals[v] = normal;
                if let Some(tangents) = tangents.as_deref_mut() {
                    tangents[v] = tangent4(input.section_tangent(p, edge, &normal));
                }
            }
        }
    }

    fn hard(&self, input: &SynthesisInput<'_>, mesh: &mut TubeMesh) {
        let layout = input.layout;
        let sign = input.sign();
        let varying = input.radii.is_some();
        let ring = |p: usize, e: usize| self.ring[layout.ring_index(p, e)];
        let mut tangents = mesh.tangents.as_deref_mut();
        let mut v = 0;

        for p in 0..layout.point_count - 1 {
            let direction = input.direction(p);
            for e in 0..layout.edge_count {
                let quad = [ring(p, e), ring(p + 1, e), ring(p + 1, e + 1), ring(p, e + 1)];

                // Diagonals stay valid when one of the two rings collapses
                let normal = (quad[2] - quad[0])
                    .cross(&(quad[1] - quad[3]))
                    .try_normalize(f64::EPSILON)
                    .unwrap_or_else(|| input.section_normal(p, e))
                    * sign;

                mesh.vertices[v..v + 4].copy_from_slice(&quad);
                mesh.normals[v..v + 4].fill(normal);

                if let Some(tangents) = tangents.as_deref_mut() {
                    if varying {
                        let lower = (quad[1] - quad[0])
                            .try_normalize(f64::EPSILON)
                            .unwrap_or(direction);
                        let upper = (quad[2] - quad[3])
                            .try_normalize(f64::EPSILON)
                            .unwrap_or(direction);
                        tangents[v] = tangent4(lower);
                        tangents[v + 1] = tangent4(lower);
                        tangents[v + 2] = tangent4(upper);
                        tangents[v + 3] = tangent4(upper);
                    } else {
                        tangents[v..v + 4].fill(tangent4(direction));
                    }
                }
                v += 4;
            }
        }
    }

    fn hard_edges(&self, input: &SynthesisInput<'_>, mesh: &mut TubeMesh) {
        let layout = input.layout;
        let sign = input.sign();
        let varying = input.radii.is_some();
        let mut tangents = mesh.tangents.as_deref_mut();
        let mut v = 0;

        for p in 0..layout.point_count {
            let direction = input.direction(p);
            for e in 0..layout.edge_count {
                let normal = input.section_normal(p, e) * sign;

                mesh.vertices[v] = self.ring[layout.ring_index(p, e)];
                mesh.vertices[v + 1] = self.ring[layout.ring_index(p, e + 1)];
                mesh.normals[v] = normal;
                mesh.normals[v + 1] = normal;

                if let Some(tangents) = tangents.as_deref_mut() {
                    let tangent = if varying {
                        input.section_tangent(p, e, &normal)
                    } else {
                        direction
                    };
                    tangents[v] = tangent4(tangent);
                    tangents[v + 1] = tangent4(tangent);
                }
                v += 2;
            }
        }
    }

    /// Write a cap fan at `point`: the ring copy, then the center.
    fn cap(&self, input: &SynthesisInput<'_>, mesh: &mut TubeMesh, start: usize, point: usize) {
        let layout = input.layout;
        let ring_len = layout.ring_len();
        let frame = &input.frames[point];
        let is_begin = point == 0;

        let outward = if is_begin { -frame.forward } else { frame.forward };
        let normal = outward * input.sign();
        let tangent = if is_begin { frame.right } else { -frame.right };

        let rim = layout.ring_index(point, 0);
        mesh.vertices[start..start + ring_len].copy_from_slice(&self.ring[rim..rim + ring_len]);
        mesh.vertices[start + ring_len] = input.points[point];
        mesh.normals[start..=start + ring_len].fill(normal);

        if let Some(tangents) = mesh.tangents.as_deref_mut() {
            tangents[start..=start + ring_len].fill(tangent4(tangent));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CapMode;
    use crate::frame::FrameBuilder;
    use crate::steepness::compute_steepness_angles;
    use approx::assert_relative_eq;

    struct Fixture {
        points: Vec<Point3<f64>>,
        frames: FrameBuilder,
        section: CrossSection,
        radii: Option<Vec<f64>>,
        steepness: Vec<f64>,
    }

    impl Fixture {
        fn new(points: Vec<Point3<f64>>, edges: usize, mode: NormalMode) -> Self {
            let mut frames = FrameBuilder::new();
            frames.update(&points, 0.0);
            Self {
                points,
                frames,
                section: CrossSection::new(edges, mode),
                radii: None,
                steepness: Vec::new(),
            }
        }

        fn with_radii(mut self, radii: Vec<f64>) -> Self {
            compute_steepness_angles(&radii, self.frames.directions(), &mut self.steepness);
            self.radii = Some(radii);
            self
        }

        fn input(&self, caps: CapMode, invert: bool, tangents: bool) -> SynthesisInput<'_> {
            SynthesisInput {
                layout: TubeLayout::new(
                    self.points.len(),
                    self.section.edge_count(),
                    self.section.normal_mode(),
                    caps,
                ),
                points: &self.points,
                frames: self.frames.frames(),
                directions: self.frames.directions(),
                section: &self.section,
                radii: self.radii.as_deref(),
                radius: 0.5,
                steepness: self.radii.as_ref().map(|_| self.steepness.as_slice()),
                invert,
                calculate_tangents: tangents,
            }
        }

        fn run(&self, caps: CapMode, invert: bool, tangents: bool) -> TubeMesh {
            let mut mesh = TubeMesh::default();
            Synthesizer::new().run(&self.input(caps, invert, tangents), &mut mesh);
            mesh
        }
    }

    fn line_y() -> Vec<Point3<f64>> {
        (0..3).map(|i| Point3::new(0.0, f64::from(i), 0.0)).collect()
    }

    #[test]
    fn smooth_ring_distance() {
        let fixture = Fixture::new(line_y(), 4, NormalMode::Smooth);
        let mesh = fixture.run(CapMode::None, false, false);

        assert_eq!(mesh.vertices.len(), 15);
        for (i, v) in mesh.vertices.iter().enumerate() {
            let center = fixture.points[i / 5];
            assert_relative_eq!((v - center).norm(), 0.5, epsilon = 1e-12);
            // Normals point away from the axis
            assert!((v - center).dot(&mesh.normals[i]) > 0.0);
        }
        assert!(mesh.tangents.is_none());
    }

    #[test]
    fn smooth_seam_duplicates_first_entry() {
        let fixture = Fixture::new(line_y(), 6, NormalMode::Smooth);
        let mesh = fixture.run(CapMode::None, false, true);
        for p in 0..3 {
            let base = p * 7;
            assert_eq!(mesh.vertices[base + 6], mesh.vertices[base]);
            assert_relative_eq!(mesh.normals[base + 6], mesh.normals[base], epsilon = 1e-12);
        }
    }

    #[test]
    fn smooth_tangents_follow_curve() {
        let fixture = Fixture::new(line_y(), 8, NormalMode::Smooth);
        let mesh = fixture.run(CapMode::None, false, true);
        let tangents = mesh.tangents.as_deref().unwrap_or_default();
        assert_eq!(tangents.len(), mesh.vertices.len());
        for t in tangents {
            assert_relative_eq!(t.xyz(), Vector3::y(), epsilon = 1e-12);
            assert_relative_eq!(t.w, -1.0);
        }
    }

    #[test]
    fn hard_normals_are_flat_and_outward() {
        let fixture = Fixture::new(line_y(), 5, NormalMode::Hard);
        let mesh = fixture.run(CapMode::None, false, false);

        assert_eq!(mesh.vertices.len(), 2 * 5 * 4);
        for (quad, normals) in mesh.vertices.chunks(4).zip(mesh.normals.chunks(4)) {
            assert!(normals.iter().all(|n| *n == normals[0]));
            assert_relative_eq!(normals[0].norm(), 1.0, epsilon = 1e-12);
            let center = quad.iter().fold(Vector3::zeros(), |acc, q| acc + q.coords) / 4.0;
            let radial = Vector3::new(center.x, 0.0, center.z);
            assert!(radial.dot(&normals[0]) > 0.0);
            // Flat: every corner lies in the face plane
            for q in quad {
                assert_relative_eq!((q - quad[0]).dot(&normals[0]), 0.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn hard_normals_survive_collapsed_ring() {
        let fixture =
            Fixture::new(line_y(), 4, NormalMode::Hard).with_radii(vec![1.0, 0.5, 0.0]);
        let mesh = fixture.run(CapMode::None, false, true);

        for n in &mesh.normals {
            assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-12);
            // A closing cone leans towards the tip
            assert!(n.y > 0.0);
        }
        let tangents = mesh.tangents.as_deref().unwrap_or_default();
        assert!(tangents.iter().all(|t| (t.xyz().norm() - 1.0).abs() < 1e-12));
    }

    #[test]
    fn hard_edge_pairs_share_normals() {
        let fixture = Fixture::new(line_y(), 4, NormalMode::HardEdges);
        let mesh = fixture.run(CapMode::None, false, true);

        assert_eq!(mesh.vertices.len(), 3 * 4 * 2);
        for pair in mesh.normals.chunks(2) {
            assert_eq!(pair[0], pair[1]);
        }
        // The normal sits halfway between the two vertices
        let mid = (mesh.vertices[0].coords + mesh.vertices[1].coords) / 2.0;
        let radial = Vector3::new(mid.x, 0.0, mid.z).normalize();
        assert_relative_eq!(mesh.normals[0], radial, epsilon = 1e-12);

        let tangents = mesh.tangents.as_deref().unwrap_or_default();
        assert_relative_eq!(tangents[0].xyz(), Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn invert_negates_normals() {
        for mode in [NormalMode::Smooth, NormalMode::Hard, NormalMode::HardEdges] {
            let fixture = Fixture::new(line_y(), 5, mode);
            let normal = fixture.run(CapMode::Both, false, false);
            let inverted = fixture.run(CapMode::Both, true, false);

            assert_eq!(normal.vertices, inverted.vertices);
            for (a, b) in normal.normals.iter().zip(&inverted.normals) {
                assert_relative_eq!(*a, -*b, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn caps_close_the_ends() {
        let fixture = Fixture::new(line_y(), 4, NormalMode::Smooth);
        let mesh = fixture.run(CapMode::Both, false, true);
        let layout = TubeLayout::new(3, 4, NormalMode::Smooth, CapMode::Both);
        assert_eq!(mesh.vertices.len(), layout.vertex_count());

        let begin = layout.begin_cap_start().unwrap_or_default();
        let end = layout.end_cap_start().unwrap_or_default();

        assert_eq!(mesh.vertices[begin + 5], fixture.points[0]);
        assert_eq!(mesh.vertices[end + 5], fixture.points[2]);
        assert_eq!(mesh.vertices[begin..begin + 5], mesh.vertices[0..5]);
        assert_eq!(mesh.vertices[end..end + 5], mesh.vertices[10..15]);

        assert_relative_eq!(mesh.normals[begin], -Vector3::y(), epsilon = 1e-12);
        assert_relative_eq!(mesh.normals[end + 5], Vector3::y(), epsilon = 1e-12);

        let tangents = mesh.tangents.as_deref().unwrap_or_default();
        let right = fixture.frames.frames()[0].right;
        assert_relative_eq!(tangents[begin].xyz(), right, epsilon = 1e-12);
        assert_relative_eq!(tangents[end].xyz(), -right, epsilon = 1e-12);
    }

    #[test]
    fn bounds_include_radius() {
        let fixture = Fixture::new(line_y(), 8, NormalMode::Smooth);
        let mesh = fixture.run(CapMode::Both, false, false);
        assert_relative_eq!(mesh.bounds.min, Point3::new(-0.5, -0.5, -0.5));
        assert_relative_eq!(mesh.bounds.max, Point3::new(0.5, 2.5, 0.5));
        assert!(mesh.vertices.iter().all(|v| mesh.bounds.contains(v)));
    }

    #[test]
    fn steady_state_reuses_buffers() {
        let fixture = Fixture::new(line_y(), 8, NormalMode::Smooth);
        let input = fixture.input(CapMode::Both, false, true);
        let mut synthesizer = Synthesizer::new();
        let mut mesh = TubeMesh::default();

        synthesizer.run(&input, &mut mesh);
        let vertices = mesh.vertices.as_ptr();
        let ring = synthesizer.ring.as_ptr();
        let first = mesh.clone();

        synthesizer.run(&input, &mut mesh);
        assert_eq!(mesh.vertices.as_ptr(), vertices);
        assert_eq!(synthesizer.ring.as_ptr(), ring);
        assert_eq!(mesh, first);
    }

    #[test]
    fn tangents_dropped_when_disabled() {
        let fixture = Fixture::new(line_y(), 4, NormalMode::Smooth);
        let mut synthesizer = Synthesizer::new();
        let mut mesh = TubeMesh::default();
        synthesizer.run(&fixture.input(CapMode::None, false, true), &mut mesh);
        assert!(mesh.tangents.is_some());
        synthesizer.run(&fixture.input(CapMode::None, false, false), &mut mesh);
        assert!(mesh.tangents.is_none());
    }
}
