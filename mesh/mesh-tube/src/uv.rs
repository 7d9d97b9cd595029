//! Texture coordinates.
//!
//! The body rect is wrapped around the tube: `u` runs along the curve and
//! `v` around the circumference. Caps project the cross-section circle onto
//! the cap rect.

#![allow(clippy::cast_precision_loss)]

use nalgebra::Point2;

use crate::config::{NormalMode, UvRect};
use crate::cross_section::CrossSection;
use crate::layout::TubeLayout;

/// Texture regions for one pass.
#[derive(Debug, Clone, Copy)]
pub(crate) struct UvRects {
    pub body: UvRect,
    pub cap: UvRect,
    pub cap_end_mirrored: bool,
}

/// Rebuild the UV buffer in the vertex order of `layout`.
pub(crate) fn build_uvs(
    layout: &TubeLayout,
    section: &CrossSection,
    rects: &UvRects,
    out: &mut Vec<Point2<f64>>,
) {
    out.resize(layout.vertex_count(), Point2::origin());
    if !layout.has_geometry() {
        return;
    }

    let n = layout.point_count;
    let edges = layout.edge_count;
    let body = rects.body;
    let u = |p: usize| body.x + body.width * p as f64 / (n - 1) as f64;
    let v = |e: usize| body.y + body.height * e as f64 / edges as f64;
    let mut i = 0;

    match layout.normal_mode {
        NormalMode::Smooth => {
            for p in 0..n {
                for e in 0..=edges {
                    out[i] = Point2::new(u(p), v(e));
                    i += 1;
                }
            }
        }
        NormalMode::Hard => {
            for p in 0..n - 1 {
                for e in 0..edges {
                    let (u0, u1, v0, v1) = (u(p), u(p + 1), v(e), v(e + 1));
                    out[i..i + 4].copy_from_slice(&[
                        Point2::new(u0, v0),
                        Point2::new(u1, v0),
                        Point2::new(u1, v1),
                        Point2::new(u0, v1),
                    ]);
                    i += 4;
                }
            }
        }
        NormalMode::HardEdges => {
            for p in 0..n {
                for e in 0..edges {
                    out[i] = Point2::new(u(p), v(e));
                    out[i + 1] = Point2::new(u(p), v(e + 1));
                    i += 2;
                }
            }
        }
    }

    if let Some(start) = layout.begin_cap_start() {
        cap_uvs(layout, section, &rects.cap, false, &mut out[start..]);
    }
    if let Some(start) = layout.end_cap_start() {
        let flip = !rects.cap_end_mirrored;
        cap_uvs(layout, section, &rects.cap, flip, &mut out[start..]);
    }
}

/// Fill one cap: rim entries, seam duplicate, then the center.
fn cap_uvs(
    layout: &TubeLayout,
    section: &CrossSection,
    rect: &UvRect,
    flip_s: bool,
    out: &mut [Point2<f64>],
) {
    let edges = layout.edge_count;
    for (e, sample) in section.points().iter().enumerate() {
        let s = sample.y * 0.5 + 0.5;
        let s = if flip_s { 1.0 - s } else { s };
        let t = 1.0 - (sample.x * 0.5 + 0.5);
        out[e] = rect.at(s, t);
    }
    out[edges] = out[0];
    out[edges + 1] = rect.center();
}
