//! Vertex colors.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::NormalMode;
use crate::layout::TubeLayout;

/// RGBA color with 8-bit components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Color32 {
    /// Red component (0-255).
    pub r: u8,
    /// Green component (0-255).
    pub g: u8,
    /// Blue component (0-255).
    pub b: u8,
    /// Alpha component (0-255).
    pub a: u8,
}

impl Color32 {
    /// Create a color from RGBA components.
    #[inline]
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color from RGB components.
    #[inline]
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Create a color from floating point values in [0, 1] range.
    ///
    /// Values are clamped to the valid range.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_tube::Color32;
    ///
    /// let color = Color32::from_float(1.0, 0.5, 0.0, 1.0);
    /// assert_eq!(color, Color32::new(255, 127, 0, 255));
    /// ```
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    // Truncation and sign loss are safe: values are clamped to [0.0, 1.0] before * 255.0
    pub fn from_float(r: f32, g: f32, b: f32, a: f32) -> Self {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0) as u8;
        Self::new(channel(r), channel(g), channel(b), channel(a))
    }

    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);

    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Opaque red.
    pub const RED: Self = Self::rgb(255, 0, 0);

    /// Opaque green.
    pub const GREEN: Self = Self::rgb(0, 255, 0);

    /// Opaque blue.
    pub const BLUE: Self = Self::rgb(0, 0, 255);
}

impl Default for Color32 {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Expand per-point colors to per-vertex colors.
///
/// `colors` must not be empty; indices wrap modulo its length. The output
/// follows the vertex order of the layout's normal mode, caps last.
pub(crate) fn build_colors(layout: &TubeLayout, colors: &[Color32], out: &mut Vec<Color32>) {
    out.resize(layout.vertex_count(), Color32::WHITE);
    if !layout.has_geometry() || colors.is_empty() {
        return;
    }

    let n = layout.point_count;
    let edges = layout.edge_count;
    let at = |p: usize| colors[p % colors.len()];
    let mut v = 0;

    match layout.normal_mode {
        NormalMode::Smooth => {
            for p in 0..n {
                out[v..v + edges + 1].fill(at(p));
                v += edges + 1;
            }
        }
        NormalMode::Hard => {
            for p in 0..n - 1 {
                let (c0, c1) = (at(p), at(p + 1));
                for _ in 0..edges {
                    out[v..v + 4].copy_from_slice(&[c0, c1, c1, c0]);
                    v += 4;
                }
            }
        }
        NormalMode::HardEdges => {
            for p in 0..n {
                out[v..v + edges * 2].fill(at(p));
                v += edges * 2;
            }
        }
    }

    let cap_len = layout.single_cap_vertex_count();
    if let Some(start) = layout.begin_cap_start() {
        out[start..start + cap_len].fill(at(0));
    }
    if let Some(start) = layout.end_cap_start() {
        out[start..start + cap_len].fill(at(n - 1));
    }
}
