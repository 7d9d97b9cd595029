//! Stale-stage tracking.

/// Which pipeline stages must run on the next update.
///
/// `redraw` is the aggregate flag for vertex synthesis and postprocessing;
/// the others name a single stage each.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct DirtyFlags {
    /// Cross-section lookup.
    pub cross_section: bool,
    /// Index buffer.
    pub topology: bool,
    /// Texture coordinates.
    pub uvs: bool,
    /// Directions and frames.
    pub rotations: bool,
    /// Tilt angles for varying radii.
    pub steepness: bool,
    /// Vertex colors.
    pub colors: bool,
    /// Vertex synthesis and postprocessing.
    pub redraw: bool,
}

impl DirtyFlags {
    /// Every stage stale.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            cross_section: true,
            topology: true,
            uvs: true,
            rotations: true,
            steepness: true,
            colors: true,
            redraw: true,
        }
    }

    /// Whether nothing needs to run.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        !(self.cross_section
            || self.topology
            || self.uvs
            || self.rotations
            || self.steepness
            || self.colors
            || self.redraw)
    }

    /// Mark every stage up to date.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
