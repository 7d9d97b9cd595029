//! Vertex and triangle counts for each normal topology.
//!
//! Every stage writes into buffers sized by [`TubeLayout`], so the formulas
//! below are the single source of truth for buffer lengths.
//!
//! With `N` points and `E` edges:
//!
//! | mode        | body vertices   | body vertex order                                  |
//! |-------------|-----------------|----------------------------------------------------|
//! | `Smooth`    | `N * (E + 1)`   | ring `p`, entries `0..=E` (entry `E` is the seam)  |
//! | `Hard`      | `(N - 1) * E * 4` | per segment/edge: `(p,e) (p+1,e) (p+1,e+1) (p,e+1)` |
//! | `HardEdges` | `N * E * 2`     | per point/edge: `(p,e) (p,e+1)`                    |
//!
//! Each cap appends `E + 1` rim vertices and one center vertex. The body
//! has `(N - 1) * E * 2` triangles and each cap has `E`.

use crate::config::{CapMode, NormalMode};

/// Minimum number of points that form a tube.
pub const MIN_POINTS: usize = 2;

/// Minimum cross-section resolution.
pub const MIN_EDGES: usize = 3;

/// Buffer layout derived from point count, edge count and modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TubeLayout {
    /// Number of curve points.
    pub point_count: usize,
    /// Number of cross-section samples.
    pub edge_count: usize,
    /// Normal topology.
    pub normal_mode: NormalMode,
    /// Cap configuration.
    pub caps: CapMode,
}

impl TubeLayout {
    /// Create a layout.
    #[must_use]
    pub const fn new(
        point_count: usize,
        edge_count: usize,
        normal_mode: NormalMode,
        caps: CapMode,
    ) -> Self {
        Self {
            point_count,
            edge_count,
            normal_mode,
            caps,
        }
    }

    /// Whether the layout describes any geometry at all.
    #[must_use]
    pub const fn has_geometry(&self) -> bool {
        self.point_count >= MIN_POINTS && self.edge_count >= MIN_EDGES
    }

    /// Ring length including the seam duplicate.
    #[must_use]
    pub const fn ring_len(&self) -> usize {
        self.edge_count + 1
    }

    /// Number of body vertices.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_tube::{CapMode, NormalMode, TubeLayout};
    ///
    /// let layout = TubeLayout::new(3, 4, NormalMode::Smooth, CapMode::None);
    /// assert_eq!(layout.body_vertex_count(), 15);
    /// ```
    #[must_use]
    pub const fn body_vertex_count(&self) -> usize {
        if !self.has_geometry() {
            return 0;
        }
        let n = self.point_count;
        let e = self.edge_count;
        match self.normal_mode {
            NormalMode::Smooth => n * (e + 1),
            NormalMode::Hard => (n - 1) * e * 4,
            NormalMode::HardEdges => n * e * 2,
        }
    }

    /// Number of vertices contributed by a single cap.
    #[must_use]
    pub const fn single_cap_vertex_count(&self) -> usize {
        self.edge_count + 2
    }

    /// Number of vertices contributed by all caps.
    #[must_use]
    pub const fn cap_vertex_count(&self) -> usize {
        if !self.has_geometry() {
            return 0;
        }
        self.caps.count() * self.single_cap_vertex_count()
    }

    /// Total vertex count every per-vertex buffer must match.
    #[must_use]
    pub const fn vertex_count(&self) -> usize {
        self.body_vertex_count() + self.cap_vertex_count()
    }

    /// Number of body triangles.
    #[must_use]
    pub const fn body_triangle_count(&self) -> usize {
        if !self.has_geometry() {
            return 0;
        }
        (self.point_count - 1) * self.edge_count * 2
    }

    /// Number of triangles contributed by all caps.
    #[must_use]
    pub const fn cap_triangle_count(&self) -> usize {
        if !self.has_geometry() {
            return 0;
        }
        self.caps.count() * self.edge_count
    }

    /// Total triangle count.
    #[must_use]
    pub const fn triangle_count(&self) -> usize {
        self.body_triangle_count() + self.cap_triangle_count()
    }

    /// Total index count.
    #[must_use]
    pub const fn index_count(&self) -> usize {
        self.triangle_count() * 3
    }

    /// First vertex of the begin cap, if there is one.
    #[must_use]
    pub const fn begin_cap_start(&self) -> Option<usize> {
        if self.has_geometry() && self.caps.has_begin() {
            Some(self.body_vertex_count())
        } else {
            None
        }
    }

    /// First vertex of the end cap, if there is one.
    #[must_use]
    pub const fn end_cap_start(&self) -> Option<usize> {
        if !self.has_geometry() || !self.caps.has_end() {
            return None;
        }
        if self.caps.has_begin() {
            Some(self.body_vertex_count() + self.single_cap_vertex_count())
        } else {
            Some(self.body_vertex_count())
        }
    }

    /// Index of ring entry `(point, edge)` in a ring-major scratch buffer.
    #[must_use]
    pub const fn ring_index(&self, point: usize, edge: usize) -> usize {
        point * self.ring_len() + edge
    }
}
