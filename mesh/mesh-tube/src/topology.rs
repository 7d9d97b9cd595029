//! Triangle index buffer.
//!
//! Each (segment, edge) pair emits two triangles from a local template that
//! is shifted by the mode's vertex stride. Faces wind counter-clockwise when
//! seen from outside the tube; inverting swaps two corners of every face.

#![allow(clippy::cast_possible_truncation)]

use crate::config::NormalMode;
use crate::layout::TubeLayout;

/// Two-triangle template for one (segment, edge) pair, as offsets from the
/// pair's first vertex.
fn body_template(layout: &TubeLayout, invert: bool) -> [usize; 6] {
    let e = layout.edge_count;
    match (layout.normal_mode, invert) {
        (NormalMode::Smooth, false) => [0, 1, e + 2, 0, e + 2, e + 1],
        (NormalMode::Smooth, true) => [0, e + 2, 1, 0, e + 1, e + 2],
        (NormalMode::Hard, false) => [0, 3, 1, 3, 2, 1],
        (NormalMode::Hard, true) => [0, 1, 3, 3, 1, 2],
        (NormalMode::HardEdges, false) => [0, 1, 2 * e, 2 * e, 1, 2 * e + 1],
        (NormalMode::HardEdges, true) => [0, 2 * e, 1, 1, 2 * e, 2 * e + 1],
    }
}

/// First vertex of the (segment `p`, edge `e`) pair.
fn pair_base(layout: &TubeLayout, p: usize, e: usize) -> usize {
    match layout.normal_mode {
        NormalMode::Smooth => layout.ring_index(p, e),
        NormalMode::Hard => (p * layout.edge_count + e) * 4,
        NormalMode::HardEdges => (p * layout.edge_count + e) * 2,
    }
}

/// Rebuild the index buffer for `layout`.
///
/// The buffer keeps its allocation; only its contents are replaced.
pub(crate) fn build_indices(layout: &TubeLayout, invert: bool, out: &mut Vec<u32>) {
    out.clear();
    if !layout.has_geometry() {
        return;
    }
    out.reserve(layout.index_count());

    let template = body_template(layout, invert);
    for p in 0..layout.point_count - 1 {
        for e in 0..layout.edge_count {
            let base = pair_base(layout, p, e);
            out.extend(template.iter().map(|offset| (base + offset) as u32));
        }
    }

    if let Some(start) = layout.begin_cap_start() {
        push_cap(layout, start, invert, false, out);
    }
    if let Some(start) = layout.end_cap_start() {
        push_cap(layout, start, invert, true, out);
    }
}

fn push_cap(layout: &TubeLayout, start: usize, invert: bool, is_end: bool, out: &mut Vec<u32>) {
    let center = (start + layout.ring_len()) as u32;
    // The begin cap faces backwards, so its fan runs the other way round
    let flip = invert != is_end;
    for e in 0..layout.edge_count {
        let a = (start + e) as u32;
        let b = a + 1;
        if flip {
            out.extend_from_slice(&[a, b, center]);
        } else {
            out.extend_from_slice(&[a, center, b]);
        }
    }
}
