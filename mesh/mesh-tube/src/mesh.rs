//! Generated mesh buffers and the host upload seam.

use nalgebra::{Point2, Point3, Vector3, Vector4};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::color::Color32;

/// An axis-aligned bounding box.
///
/// # Example
///
/// ```
/// use mesh_tube::Aabb;
/// use nalgebra::Point3;
///
/// let mut aabb = Aabb::empty();
/// assert!(aabb.is_empty());
///
/// aabb.expand_to_include_sphere(&Point3::origin(), 0.5);
/// assert!(!aabb.is_empty());
/// assert!((aabb.size().x - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Aabb {
    /// Minimum corner.
    pub min: Point3<f64>,
    /// Maximum corner.
    pub max: Point3<f64>,
}

impl Aabb {
    /// Create an empty (invalid) box with min > max, ready to be expanded.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Point3::new is not const in nalgebra
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Whether the box holds no volume (min > max on some axis).
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Grow the box to contain a point.
    #[inline]
    pub fn expand_to_include(&mut self, point: &Point3<f64>) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    /// Grow the box to contain a sphere around `center`.
    #[inline]
    pub fn expand_to_include_sphere(&mut self, center: &Point3<f64>, radius: f64) {
        let extent = Vector3::repeat(radius.abs());
        self.expand_to_include(&(center - extent));
        self.expand_to_include(&(center + extent));
    }

    /// Check if a point lies inside the box or on its surface.
    #[inline]
    #[must_use]
    pub fn contains(&self, point: &Point3<f64>) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Width, height and depth.
    #[inline]
    #[must_use]
    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }

    /// Center of the box.
    #[inline]
    #[must_use]
    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

/// Kind of debug line emitted by [`TubeMesh::gizmo_lines`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GizmoKind {
    /// Vertex normal.
    Normal,
    /// Vertex tangent, with the handedness stored in its `w` component.
    Tangent {
        /// Bitangent sign.
        handedness: f64,
    },
}

/// A line segment for visualizing per-vertex directions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GizmoLine {
    /// Vertex the line starts at.
    pub start: Point3<f64>,
    /// Line end point.
    pub end: Point3<f64>,
    /// What the line shows.
    pub kind: GizmoKind,
}

/// Buffers produced by the generator.
///
/// All per-vertex buffers share one length. The mesh is only consistent
/// after an update; reading it between a setter call and the next update
/// shows the previous pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TubeMesh {
    pub(crate) vertices: Vec<Point3<f64>>,
    pub(crate) normals: Vec<Vector3<f64>>,
    pub(crate) tangents: Option<Vec<Vector4<f64>>>,
    pub(crate) indices: Vec<u32>,
    pub(crate) uvs: Vec<Point2<f64>>,
    pub(crate) colors: Option<Vec<Color32>>,
    pub(crate) bounds: Aabb,
}

impl TubeMesh {
    /// Vertex positions.
    #[must_use]
    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    /// Vertex normals.
    #[must_use]
    pub fn normals(&self) -> &[Vector3<f64>] {
        &self.normals
    }

    /// Vertex tangents with handedness in `w`, when enabled.
    #[must_use]
    pub fn tangents(&self) -> Option<&[Vector4<f64>]> {
        self.tangents.as_deref()
    }

    /// Triangle indices, three per face.
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Texture coordinates.
    #[must_use]
    pub fn uvs(&self) -> &[Point2<f64>] {
        &self.uvs
    }

    /// Vertex colors, when colors are configured.
    #[must_use]
    pub fn colors(&self) -> Option<&[Color32]> {
        self.colors.as_deref()
    }

    /// Bounding box of the tube, including the radius around each point.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Whether the mesh holds no geometry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Iterate over the triangles as index triples.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Corner positions of a triangle.
    #[must_use]
    pub fn triangle(&self, index: usize) -> Option<[Point3<f64>; 3]> {
        let face = self.indices.get(index * 3..index * 3 + 3)?;
        let corner = |i: u32| self.vertices.get(i as usize).copied();
        Some([corner(face[0])?, corner(face[1])?, corner(face[2])?])
    }

    /// Unnormalized face normal `(v1 - v0) x (v2 - v0)`.
    #[must_use]
    pub fn face_normal(&self, index: usize) -> Option<Vector3<f64>> {
        let [v0, v1, v2] = self.triangle(index)?;
        Some((v1 - v0).cross(&(v2 - v0)))
    }

    /// Area of a triangle.
    #[must_use]
    pub fn triangle_area(&self, index: usize) -> Option<f64> {
        self.face_normal(index).map(|n| n.norm() * 0.5)
    }

    /// Drop all buffers.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.normals.clear();
        self.tangents = None;
        self.indices.clear();
        self.uvs.clear();
        self.colors = None;
        self.bounds = Aabb::empty();
    }

    /// Debug lines along every vertex normal and tangent, `length` long.
    ///
    /// Hosts draw these to inspect the generated directions.
    #[must_use]
    pub fn gizmo_lines(&self, length: f64) -> Vec<GizmoLine> {
        let tangent_count = self.tangents.as_ref().map_or(0, Vec::len);
        let mut lines = Vec::with_capacity(self.vertices.len() + tangent_count);

        for (v, n) in self.vertices.iter().zip(&self.normals) {
            lines.push(GizmoLine {
                start: *v,
                end: v + n * length,
                kind: GizmoKind::Normal,
            });
        }
        if let Some(tangents) = &self.tangents {
            for (v, t) in self.vertices.iter().zip(tangents) {
                lines.push(GizmoLine {
                    start: *v,
                    end: v + t.xyz() * length,
                    kind: GizmoKind::Tangent { handedness: t.w },
                });
            }
        }
        lines
    }
}

/// Host-side receiver of finished meshes.
///
/// After every update that changed the mesh the generator hands the full
/// buffer set to the sink, which replaces whatever it held before.
pub trait MeshSink {
    /// Replace all buffers with the ones in `mesh`.
    fn replace_buffers(&mut self, mesh: &TubeMesh);

    /// Drop all buffers. Called when the tube loses its points.
    fn clear(&mut self) {}
}
