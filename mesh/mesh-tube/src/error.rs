//! Error types for tube configuration.

use thiserror::Error;

/// Result type for tube configuration operations.
pub type TubeResult<T> = Result<T, TubeError>;

/// Rejected configuration changes.
///
/// A rejected change never touches the generator state: the previous value
/// is kept and the mesh stays valid.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TubeError {
    /// Point array has a length that cannot form a tube.
    #[error("tube needs at least {min} points, got {actual}")]
    TooFewPoints {
        /// Minimum required points.
        min: usize,
        /// Actual point count.
        actual: usize,
    },

    /// Cross-section resolution is too low.
    #[error("edge count must be at least {min}, got {actual}")]
    TooFewEdges {
        /// Minimum required edges.
        min: usize,
        /// Requested edge count.
        actual: usize,
    },

    /// Radius is negative or not finite.
    #[error("invalid radius: {0}")]
    InvalidRadius(f64),
}
