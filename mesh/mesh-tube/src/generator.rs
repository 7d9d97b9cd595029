//! The incremental tube generator.
//!
//! Setters record which stages their change invalidates; [`TubeGenerator::update`]
//! then runs only those stages, in dependency order:
//!
//! 1. cross-section lookup
//! 2. directions and frames
//! 3. index buffer
//! 4. steepness angles
//! 5. vertex synthesis, then postprocess callbacks
//! 6. texture coordinates
//! 7. vertex colors
//!
//! The finished mesh is handed to the attached [`MeshSink`], if any.

use std::fmt;

use nalgebra::{Point3, UnitQuaternion, Vector3};
use tracing::{debug, warn};

use crate::color::{Color32, build_colors};
use crate::config::{CapMode, NormalMode, TubeConfig, UvRect, check_radius};
use crate::cross_section::CrossSection;
use crate::dirty::DirtyFlags;
use crate::error::{TubeError, TubeResult};
use crate::frame::{Frame, FrameBuilder};
use crate::layout::{MIN_EDGES, MIN_POINTS, TubeLayout};
use crate::mesh::{MeshSink, TubeMesh};
use crate::postprocess::{PostprocessBuffers, PostprocessChain, PostprocessId};
use crate::steepness::compute_steepness_angles;
use crate::synthesis::{SynthesisInput, Synthesizer};
use crate::topology::build_indices;
use crate::uv::{UvRects, build_uvs};

/// Exact change check for setters; any bit difference counts.
#[allow(clippy::float_cmp)]
fn differs(a: f64, b: f64) -> bool {
    a != b
}

/// Generates and incrementally updates a tube mesh along a polyline.
///
/// # Example
///
/// ```
/// use mesh_tube::{CapMode, TubeConfig, TubeGenerator};
/// use nalgebra::Point3;
///
/// let config = TubeConfig::default()
///     .with_points(vec![
///         Point3::new(0.0, 0.0, 0.0),
///         Point3::new(0.0, 1.0, 0.0),
///         Point3::new(0.0, 2.0, 0.0),
///     ])
///     .with_radius(0.5)
///     .with_edge_count(4)
///     .with_caps(CapMode::None);
///
/// let mut tube = TubeGenerator::new(config).unwrap();
/// tube.update();
///
/// assert_eq!(tube.mesh().vertex_count(), 15);
/// assert_eq!(tube.mesh().indices().len(), 48);
/// ```
pub struct TubeGenerator {
    config: TubeConfig,
    dirty: DirtyFlags,
    section: CrossSection,
    frames: FrameBuilder,
    steepness: Vec<f64>,
    synthesizer: Synthesizer,
    postprocess: PostprocessChain,
    mesh: TubeMesh,
    sink: Option<Box<dyn MeshSink + Send>>,
}

impl fmt::Debug for TubeGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TubeGenerator")
            .field("config", &self.config)
            .field("dirty", &self.dirty)
            .field("postprocess", &self.postprocess)
            .field("vertex_count", &self.mesh.vertex_count())
            .field("has_sink", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for TubeGenerator {
    fn default() -> Self {
        Self::from_valid(TubeConfig::default())
    }
}

impl TubeGenerator {
    /// Create a generator. Nothing is computed until the first update.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails [`TubeConfig::validate`].
    pub fn new(config: TubeConfig) -> TubeResult<Self> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: TubeConfig) -> Self {
        Self {
            section: CrossSection::new(config.edge_count, config.normal_mode),
            config,
            dirty: DirtyFlags::all(),
            frames: FrameBuilder::new(),
            steepness: Vec::new(),
            synthesizer: Synthesizer::new(),
            postprocess: PostprocessChain::default(),
            mesh: TubeMesh::default(),
            sink: None,
        }
    }

    // ========================================================================
    // Pipeline
    // ========================================================================

    /// Run every stale stage and return the flags that were processed.
    ///
    /// Without points the mesh (and the sink) is cleared and the flags are
    /// kept, so the tube rebuilds fully once points arrive.
    pub fn update(&mut self) -> DirtyFlags {
        if self.config.points.is_empty() {
            if !self.mesh.is_empty() {
                self.mesh.clear();
                if let Some(sink) = self.sink.as_mut() {
                    sink.clear();
                }
                debug!("Tube has no points, cleared mesh");
            }
            return DirtyFlags::default();
        }

        if self.config.postprocess_continuously && !self.postprocess.is_empty() {
            self.dirty.redraw = true;
        }

        let dirty = self.dirty;
        if dirty.is_clean() {
            return dirty;
        }

        let layout = self.layout();
        let config = &self.config;

        if dirty.cross_section {
            self.section.rebuild(config.edge_count, config.normal_mode);
        }
        if dirty.rotations {
            self.frames.update(&config.points, config.forward_angle_offset);
        }
        if dirty.topology {
            build_indices(&layout, config.invert_mesh, &mut self.mesh.indices);
        }
        if dirty.steepness {
            match &config.radii {
                Some(radii) => {
                    compute_steepness_angles(radii, self.frames.directions(), &mut self.steepness);
                }
                None => self.steepness.clear(),
            }
        }
        if dirty.redraw {
            let input = SynthesisInput {
                layout,
                points: &config.points,
                frames: self.frames.frames(),
                directions: self.frames.directions(),
                section: &self.section,
                radii: config.radii.as_deref(),
                radius: config.radius,
                steepness: config.radii.as_ref().map(|_| self.steepness.as_slice()),
                invert: config.invert_mesh,
                calculate_tangents: config.calculate_tangents,
            };
            self.synthesizer.run(&input, &mut self.mesh);
            self.postprocess.run(&mut self.mesh);
        }
        if dirty.uvs {
            let rects = UvRects {
                body: config.uv_rect,
                cap: config.uv_rect_cap,
                cap_end_mirrored: config.uv_rect_cap_end_mirrored,
            };
            build_uvs(&layout, &self.section, &rects, &mut self.mesh.uvs);
        }
        if dirty.colors {
            match &config.colors {
                Some(colors) => {
                    let out = self.mesh.colors.get_or_insert_with(Vec::new);
                    build_colors(&layout, colors, out);
                }
                None => self.mesh.colors = None,
            }
        }

        if let Some(sink) = self.sink.as_mut() {
            sink.replace_buffers(&self.mesh);
        }

        debug!(
            vertices = self.mesh.vertex_count(),
            triangles = self.mesh.triangle_count(),
            redraw = dirty.redraw,
            topology = dirty.topology,
            "Tube updated"
        );

        self.dirty.clear();
        dirty
    }

    /// Mark every stage stale and update.
    pub fn force_update(&mut self) -> DirtyFlags {
        self.dirty = DirtyFlags::all();
        self.update()
    }

    /// Stages that will run on the next update.
    #[must_use]
    pub fn dirty_flags(&self) -> DirtyFlags {
        self.dirty
    }

    /// Forget frame continuity so the next update starts from world up.
    pub fn reset_frames(&mut self) {
        self.frames.reset();
        self.dirty.rotations = true;
        self.dirty.redraw = true;
    }

    // ========================================================================
    // Output
    // ========================================================================

    /// The generated buffers as of the last update.
    #[must_use]
    pub fn mesh(&self) -> &TubeMesh {
        &self.mesh
    }

    /// Buffer layout for the current configuration.
    #[must_use]
    pub fn layout(&self) -> TubeLayout {
        TubeLayout::new(
            self.config.points.len(),
            self.config.edge_count,
            self.config.normal_mode,
            self.config.caps,
        )
    }

    /// Vertex count the next update will produce.
    #[must_use]
    pub fn target_vertex_count(&self) -> usize {
        self.layout().vertex_count()
    }

    /// Rotation of the cross-section at a point, identity when out of range.
    #[must_use]
    pub fn rotation_at_point(&self, index: usize) -> UnitQuaternion<f64> {
        self.frames.rotation_at(index)
    }

    /// Frame at a point as of the last update.
    #[must_use]
    pub fn frame_at_point(&self, index: usize) -> Option<Frame> {
        self.frames.frames().get(index).copied()
    }

    /// Patched segment directions as of the last update.
    #[must_use]
    pub fn directions(&self) -> &[Vector3<f64>] {
        self.frames.directions()
    }

    /// Per-point tilt angles in radians. Empty without per-point radii.
    #[must_use]
    pub fn steepness_angles(&self) -> &[f64] {
        &self.steepness
    }

    /// Cross-section lookup as of the last update.
    #[must_use]
    pub fn cross_section(&self) -> &CrossSection {
        &self.section
    }

    /// Attach a sink. It receives the current mesh right away and every
    /// updated mesh afterwards.
    pub fn set_sink(&mut self, mut sink: Box<dyn MeshSink + Send>) {
        if !self.mesh.is_empty() {
            sink.replace_buffers(&self.mesh);
        }
        self.sink = Some(sink);
    }

    /// Detach the sink and return it.
    pub fn clear_sink(&mut self) -> Option<Box<dyn MeshSink + Send>> {
        self.sink.take()
    }

    // ========================================================================
    // Postprocessing
    // ========================================================================

    /// Register a callback that may displace vertices, normals and tangents
    /// after synthesis. Callbacks run in registration order.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_tube::{TubeConfig, TubeGenerator};
    /// use nalgebra::Point3;
    ///
    /// let config = TubeConfig::default()
    ///     .with_points(vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)]);
    /// let mut tube = TubeGenerator::new(config).unwrap();
    ///
    /// let id = tube.add_postprocess(|buffers| {
    ///     for v in buffers.vertices.iter_mut() {
    ///         v.y += 1.0;
    ///     }
    /// });
    /// tube.update();
    /// assert!(tube.mesh().vertices().iter().all(|v| v.y > 0.5));
    ///
    /// assert!(tube.remove_postprocess(id));
    /// ```
    pub fn add_postprocess<F>(&mut self, callback: F) -> PostprocessId
    where
        F: FnMut(&mut PostprocessBuffers<'_>) + Send + 'static,
    {
        self.dirty.redraw = true;
        self.postprocess.add(Box::new(callback))
    }

    /// Unregister a callback. Returns `false` if the id is unknown.
    pub fn remove_postprocess(&mut self, id: PostprocessId) -> bool {
        let removed = self.postprocess.remove(id);
        if removed {
            self.dirty.redraw = true;
        }
        removed
    }

    /// Number of registered callbacks.
    #[must_use]
    pub fn postprocess_count(&self) -> usize {
        self.postprocess.len()
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &TubeConfig {
        &self.config
    }

    /// Center points.
    #[must_use]
    pub fn points(&self) -> &[Point3<f64>] {
        &self.config.points
    }

    /// Replace the center points.
    ///
    /// An empty vector removes the mesh on the next update.
    ///
    /// # Errors
    ///
    /// Returns [`TubeError::TooFewPoints`] for a single point; the previous
    /// points are kept.
    pub fn set_points(&mut self, points: Vec<Point3<f64>>) -> TubeResult<()> {
        if points.len() == 1 {
            warn!(
                actual = 1,
                "Rejected tube points: a tube needs at least two points"
            );
            return Err(TubeError::TooFewPoints {
                min: MIN_POINTS,
                actual: 1,
            });
        }
        if points == self.config.points {
            return Ok(());
        }
        let length_changed = points.len() != self.config.points.len();
        self.config.points = points;
        self.mark_points_changed(length_changed);
        Ok(())
    }

    /// Edit the points in place, e.g. for animation.
    ///
    /// The point count cannot change this way, so no buffers are resized.
    pub fn modify_points<F>(&mut self, edit: F)
    where
        F: FnOnce(&mut [Point3<f64>]),
    {
        edit(&mut self.config.points);
        self.mark_points_changed(false);
    }

    fn mark_points_changed(&mut self, length_changed: bool) {
        if length_changed {
            self.dirty.topology = true;
            self.dirty.uvs = true;
            self.dirty.colors = true;
        }
        self.dirty.rotations = true;
        if self.config.radii.is_some() {
            self.dirty.steepness = true;
        }
        self.dirty.redraw = true;
    }

    /// Per-point radii, if set.
    #[must_use]
    pub fn radii(&self) -> Option<&[f64]> {
        self.config.radii.as_deref()
    }

    /// Set per-point radii, wrapped modulo the point count. An empty vector
    /// clears them.
    ///
    /// # Errors
    ///
    /// Returns [`TubeError::InvalidRadius`] for a negative or non-finite
    /// entry; the previous radii are kept.
    pub fn set_radii(&mut self, radii: Vec<f64>) -> TubeResult<()> {
        if radii.is_empty() {
            self.clear_radii();
            return Ok(());
        }
        if let Err(err) = radii.iter().copied().try_for_each(check_radius) {
            warn!(error = %err, "Rejected tube radii");
            return Err(err);
        }
        if self.config.radii.as_ref() == Some(&radii) {
            return Ok(());
        }
        self.config.radii = Some(radii);
        self.dirty.steepness = true;
        self.dirty.redraw = true;
        Ok(())
    }

    /// Drop per-point radii and fall back to the uniform radius.
    pub fn clear_radii(&mut self) {
        if self.config.radii.take().is_some() {
            self.dirty.steepness = true;
            self.dirty.redraw = true;
        }
    }

    /// Uniform radius.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.config.radius
    }

    /// Set a uniform radius. Clears per-point radii.
    ///
    /// # Errors
    ///
    /// Returns [`TubeError::InvalidRadius`] for a negative or non-finite
    /// value; nothing changes.
    pub fn set_radius(&mut self, radius: f64) -> TubeResult<()> {
        if let Err(err) = check_radius(radius) {
            warn!(error = %err, "Rejected tube radius");
            return Err(err);
        }
        let had_radii = self.config.radii.take().is_some();
        if had_radii || differs(radius, self.config.radius) {
            self.config.radius = radius;
            self.dirty.steepness |= had_radii;
            self.dirty.redraw = true;
        }
        Ok(())
    }

    /// Per-point colors, if set.
    #[must_use]
    pub fn colors(&self) -> Option<&[Color32]> {
        self.config.colors.as_deref()
    }

    /// Set per-point colors, wrapped modulo the point count. An empty
    /// vector clears them.
    pub fn set_colors(&mut self, colors: Vec<Color32>) {
        if colors.is_empty() {
            self.clear_colors();
            return;
        }
        if self.config.colors.as_ref() == Some(&colors) {
            return;
        }
        self.config.colors = Some(colors);
        self.dirty.colors = true;
    }

    /// Drop the color channel.
    pub fn clear_colors(&mut self) {
        if self.config.colors.take().is_some() {
            self.dirty.colors = true;
        }
    }

    /// Cross-section resolution.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.config.edge_count
    }

    /// Set the cross-section resolution.
    ///
    /// # Errors
    ///
    /// Returns [`TubeError::TooFewEdges`] below three edges; nothing
    /// changes.
    pub fn set_edge_count(&mut self, edge_count: usize) -> TubeResult<()> {
        if edge_count < MIN_EDGES {
            warn!(
                actual = edge_count,
                min = MIN_EDGES,
                "Rejected tube edge count"
            );
            return Err(TubeError::TooFewEdges {
                min: MIN_EDGES,
                actual: edge_count,
            });
        }
        if edge_count != self.config.edge_count {
            self.config.edge_count = edge_count;
            self.dirty.topology = true;
            self.dirty.uvs = true;
            self.dirty.cross_section = true;
            self.dirty.colors = true;
            self.dirty.redraw = true;
        }
        Ok(())
    }

    /// Normal topology.
    #[must_use]
    pub fn normal_mode(&self) -> NormalMode {
        self.config.normal_mode
    }

    /// Set the normal topology.
    pub fn set_normal_mode(&mut self, normal_mode: NormalMode) {
        if normal_mode != self.config.normal_mode {
            self.config.normal_mode = normal_mode;
            self.dirty.topology = true;
            self.dirty.uvs = true;
            self.dirty.colors = true;
            self.dirty.cross_section = true;
            self.dirty.redraw = true;
        }
    }

    /// Cap configuration.
    #[must_use]
    pub fn caps(&self) -> CapMode {
        self.config.caps
    }

    /// Set which ends are capped.
    pub fn set_caps(&mut self, caps: CapMode) {
        if caps != self.config.caps {
            self.config.caps = caps;
            self.dirty.topology = true;
            self.dirty.uvs = true;
            self.dirty.colors = true;
            self.dirty.redraw = true;
        }
    }

    /// Whether the tube is rendered inside out.
    #[must_use]
    pub fn invert_mesh(&self) -> bool {
        self.config.invert_mesh
    }

    /// Render the tube inside out.
    pub fn set_invert_mesh(&mut self, invert: bool) {
        if invert != self.config.invert_mesh {
            self.config.invert_mesh = invert;
            self.dirty.topology = true;
            self.dirty.redraw = true;
        }
    }

    /// Twist at the first point, in degrees.
    #[must_use]
    pub fn forward_angle_offset(&self) -> f64 {
        self.config.forward_angle_offset
    }

    /// Set the twist at the first point, in degrees.
    pub fn set_forward_angle_offset(&mut self, degrees: f64) {
        if differs(degrees, self.config.forward_angle_offset) {
            self.config.forward_angle_offset = degrees;
            self.dirty.rotations = true;
            self.dirty.redraw = true;
        }
    }

    /// Body texture region.
    #[must_use]
    pub fn uv_rect(&self) -> UvRect {
        self.config.uv_rect
    }

    /// Set the body texture region.
    pub fn set_uv_rect(&mut self, rect: UvRect) {
        if rect != self.config.uv_rect {
            self.config.uv_rect = rect;
            self.dirty.uvs = true;
        }
    }

    /// Cap texture region.
    #[must_use]
    pub fn uv_rect_cap(&self) -> UvRect {
        self.config.uv_rect_cap
    }

    /// Set the cap texture region.
    pub fn set_uv_rect_cap(&mut self, rect: UvRect) {
        if rect != self.config.uv_rect_cap {
            self.config.uv_rect_cap = rect;
            self.dirty.uvs = true;
        }
    }

    /// Whether the end cap mapping is mirrored.
    #[must_use]
    pub fn uv_rect_cap_end_mirrored(&self) -> bool {
        self.config.uv_rect_cap_end_mirrored
    }

    /// Mirror the cap mapping at the last point.
    pub fn set_uv_rect_cap_end_mirrored(&mut self, mirrored: bool) {
        if mirrored != self.config.uv_rect_cap_end_mirrored {
            self.config.uv_rect_cap_end_mirrored = mirrored;
            self.dirty.uvs = true;
        }
    }

    /// Whether tangents are generated.
    #[must_use]
    pub fn calculate_tangents(&self) -> bool {
        self.config.calculate_tangents
    }

    /// Enable or disable the tangent buffer.
    pub fn set_calculate_tangents(&mut self, enabled: bool) {
        if enabled != self.config.calculate_tangents {
            self.config.calculate_tangents = enabled;
            self.dirty.redraw = true;
        }
    }

    /// Whether callbacks force a redraw on every update.
    #[must_use]
    pub fn postprocess_continuously(&self) -> bool {
        self.config.postprocess_continuously
    }

    /// Run callbacks on every update, or only when something else changed.
    pub fn set_postprocess_continuously(&mut self, enabled: bool) {
        self.config.postprocess_continuously = enabled;
    }
}
