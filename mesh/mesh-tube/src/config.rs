//! Tube configuration.

use nalgebra::{Point2, Point3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::color::Color32;
use crate::error::{TubeError, TubeResult};
use crate::layout::{MIN_EDGES, MIN_POINTS};

/// How normals are rendered across the tube surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NormalMode {
    /// Shared vertices and smooth normals.
    #[default]
    Smooth,
    /// Independent quads with flat face normals.
    Hard,
    /// Flat around the circumference, smooth along the curve.
    HardEdges,
}

/// Which tube ends are closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CapMode {
    /// Both ends open.
    None,
    /// Only the first point is capped.
    Begin,
    /// Only the last point is capped.
    End,
    /// Both ends are capped.
    #[default]
    Both,
}

impl CapMode {
    /// Whether the first point gets a cap.
    #[must_use]
    pub const fn has_begin(self) -> bool {
        matches!(self, Self::Begin | Self::Both)
    }

    /// Whether the last point gets a cap.
    #[must_use]
    pub const fn has_end(self) -> bool {
        matches!(self, Self::End | Self::Both)
    }

    /// Number of caps.
    #[must_use]
    pub const fn count(self) -> usize {
        match self {
            Self::None => 0,
            Self::Begin | Self::End => 1,
            Self::Both => 2,
        }
    }
}

/// Rectangular region of texture space.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UvRect {
    /// Left edge.
    pub x: f64,
    /// Bottom edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl UvRect {
    /// The full `[0, 1] x [0, 1]` texture.
    pub const UNIT: Self = Self::new(0.0, 0.0, 1.0, 1.0);

    /// Create a rect from its corner and size.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Map normalized coordinates into the rect.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_tube::UvRect;
    ///
    /// let rect = UvRect::new(0.5, 0.0, 0.5, 1.0);
    /// let uv = rect.at(0.5, 0.25);
    /// assert!((uv.x - 0.75).abs() < 1e-12);
    /// assert!((uv.y - 0.25).abs() < 1e-12);
    /// ```
    #[must_use]
    pub fn at(&self, s: f64, t: f64) -> Point2<f64> {
        Point2::new(self.x + self.width * s, self.y + self.height * t)
    }

    /// Center of the rect.
    #[must_use]
    pub fn center(&self) -> Point2<f64> {
        self.at(0.5, 0.5)
    }
}

impl Default for UvRect {
    fn default() -> Self {
        Self::UNIT
    }
}

/// Configuration of a tube.
///
/// The generator takes ownership of the configuration and only allows
/// changes through setters, so every change is tracked by its dirty flags.
///
/// # Example
///
/// ```
/// use mesh_tube::{CapMode, NormalMode, TubeConfig};
/// use nalgebra::Point3;
///
/// let config = TubeConfig::default()
///     .with_points(vec![Point3::origin(), Point3::new(0.0, 1.0, 0.0)])
///     .with_radius(0.25)
///     .with_edge_count(8)
///     .with_normal_mode(NormalMode::Hard)
///     .with_caps(CapMode::None);
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TubeConfig {
    /// Center points. Frames are propagated from index 0 upwards.
    pub points: Vec<Point3<f64>>,
    /// Per-point radii, wrapped modulo the point count. Overrides `radius`.
    pub radii: Option<Vec<f64>>,
    /// Radius for the whole tube when `radii` is unset.
    pub radius: f64,
    /// Per-point vertex colors, wrapped modulo the point count.
    pub colors: Option<Vec<Color32>>,
    /// Cross-section resolution.
    pub edge_count: usize,
    /// Normal topology.
    pub normal_mode: NormalMode,
    /// Closed ends.
    pub caps: CapMode,
    /// Render the tube inside out.
    pub invert_mesh: bool,
    /// Twist around the forward direction at the first point, in degrees.
    pub forward_angle_offset: f64,
    /// Texture region wrapped around the body.
    pub uv_rect: UvRect,
    /// Texture region mapped onto each cap.
    pub uv_rect_cap: UvRect,
    /// Mirror the cap mapping at the last point.
    pub uv_rect_cap_end_mirrored: bool,
    /// Compute the tangent buffer.
    pub calculate_tangents: bool,
    /// Run postprocess callbacks on every update, not only after changes.
    pub postprocess_continuously: bool,
}

impl Default for TubeConfig {
    fn default() -> Self {
        Self {
            points: Vec::new(),
            radii: None,
            radius: 0.1,
            colors: None,
            edge_count: 12,
            normal_mode: NormalMode::Smooth,
            caps: CapMode::Both,
            invert_mesh: false,
            forward_angle_offset: 0.0,
            uv_rect: UvRect::UNIT,
            uv_rect_cap: UvRect::UNIT,
            uv_rect_cap_end_mirrored: false,
            calculate_tangents: false,
            postprocess_continuously: true,
        }
    }
}

impl TubeConfig {
    /// Low resolution open tube, useful for previews and wires.
    #[must_use]
    pub fn for_preview() -> Self {
        Self {
            edge_count: 6,
            caps: CapMode::None,
            ..Self::default()
        }
    }

    /// Faceted look with tangents for normal mapping.
    #[must_use]
    pub fn faceted() -> Self {
        Self {
            normal_mode: NormalMode::Hard,
            calculate_tangents: true,
            ..Self::default()
        }
    }

    /// Set the center points.
    #[must_use]
    pub fn with_points(mut self, points: Vec<Point3<f64>>) -> Self {
        self.points = points;
        self
    }

    /// Set a uniform radius and drop per-point radii.
    #[must_use]
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self.radii = None;
        self
    }

    /// Set per-point radii. An empty vector clears them.
    #[must_use]
    pub fn with_radii(mut self, radii: Vec<f64>) -> Self {
        self.radii = if radii.is_empty() { None } else { Some(radii) };
        self
    }

    /// Set per-point colors. An empty vector clears them.
    #[must_use]
    pub fn with_colors(mut self, colors: Vec<Color32>) -> Self {
        self.colors = if colors.is_empty() { None } else { Some(colors) };
        self
    }

    /// Set the cross-section resolution.
    #[must_use]
    pub const fn with_edge_count(mut self, edge_count: usize) -> Self {
        self.edge_count = edge_count;
        self
    }

    /// Set the normal topology.
    #[must_use]
    pub const fn with_normal_mode(mut self, normal_mode: NormalMode) -> Self {
        self.normal_mode = normal_mode;
        self
    }

    /// Set which ends are capped.
    #[must_use]
    pub const fn with_caps(mut self, caps: CapMode) -> Self {
        self.caps = caps;
        self
    }

    /// Render the tube inside out.
    #[must_use]
    pub const fn inverted(mut self) -> Self {
        self.invert_mesh = true;
        self
    }

    /// Set the twist at the first point, in degrees.
    #[must_use]
    pub const fn with_forward_angle_offset(mut self, degrees: f64) -> Self {
        self.forward_angle_offset = degrees;
        self
    }

    /// Set the body texture region.
    #[must_use]
    pub const fn with_uv_rect(mut self, rect: UvRect) -> Self {
        self.uv_rect = rect;
        self
    }

    /// Set the cap texture region.
    #[must_use]
    pub const fn with_uv_rect_cap(mut self, rect: UvRect, end_mirrored: bool) -> Self {
        self.uv_rect_cap = rect;
        self.uv_rect_cap_end_mirrored = end_mirrored;
        self
    }

    /// Enable or disable the tangent buffer.
    #[must_use]
    pub const fn with_tangents(mut self, enabled: bool) -> Self {
        self.calculate_tangents = enabled;
        self
    }

    /// Enable or disable continuous postprocessing.
    #[must_use]
    pub const fn with_postprocess_continuously(mut self, enabled: bool) -> Self {
        self.postprocess_continuously = enabled;
        self
    }

    /// Check the configuration against the rules the setters enforce.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - exactly one point is given
    /// - fewer than three edges are requested
    /// - a radius is negative or not finite
    pub fn validate(&self) -> TubeResult<()> {
        if self.points.len() == 1 {
            return Err(TubeError::TooFewPoints {
                min: MIN_POINTS,
                actual: 1,
            });
        }
        if self.edge_count < MIN_EDGES {
            return Err(TubeError::TooFewEdges {
                min: MIN_EDGES,
                actual: self.edge_count,
            });
        }
        check_radius(self.radius)?;
        if let Some(radii) = &self.radii {
            radii.iter().copied().try_for_each(check_radius)?;
        }
        Ok(())
    }
}

/// Reject negative and non-finite radii.
pub(crate) fn check_radius(radius: f64) -> TubeResult<()> {
    if radius.is_finite() && radius >= 0.0 {
        Ok(())
    } else {
        Err(TubeError::InvalidRadius(radius))
    }
}
