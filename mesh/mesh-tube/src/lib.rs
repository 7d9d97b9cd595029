//! Incremental tube mesh generation along polylines.
//!
//! This crate sweeps a circular cross-section along an ordered list of
//! points and produces a renderable triangle mesh: positions, normals,
//! optional tangents, UVs, optional vertex colors and end caps. The
//! [`TubeGenerator`] remembers which inputs changed and recomputes only the
//! affected stages, so animating a tube every frame stays cheap.
//!
//! # Features
//!
//! - **Continuous frames**: cross-sections are oriented by propagated frames
//!   that do not twist or flip between updates
//! - **Variable radius**: per-point radii with normals tilted along the cone
//! - **Three normal modes**: smooth, fully faceted quads, or facets around
//!   the circumference only
//! - **End caps**: optional fans at either end with their own texture region
//! - **Postprocessing**: callbacks that displace the buffers before upload
//!
//! # Quick Start
//!
//! ```
//! use mesh_tube::{NormalMode, TubeConfig, TubeGenerator};
//! use nalgebra::Point3;
//!
//! let points = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.5, 0.0),
//!     Point3::new(2.0, 0.0, 1.0),
//! ];
//!
//! let config = TubeConfig::default()
//!     .with_points(points)
//!     .with_radius(0.2)
//!     .with_edge_count(16);
//!
//! let mut tube = TubeGenerator::new(config).unwrap();
//! tube.update();
//! assert_eq!(tube.mesh().vertex_count(), tube.target_vertex_count());
//!
//! // Only the stages touched by a change run again
//! tube.set_normal_mode(NormalMode::Hard);
//! let processed = tube.update();
//! assert!(processed.topology);
//! assert!(!processed.rotations);
//! ```
//!
//! # Variable Radius Tubes
//!
//! ```
//! use mesh_tube::{TubeConfig, TubeGenerator};
//! use nalgebra::Point3;
//!
//! let config = TubeConfig::default()
//!     .with_points(vec![Point3::origin(), Point3::new(0.0, 0.0, 1.0)])
//!     .with_radii(vec![1.0, 0.0]);
//!
//! let mut tube = TubeGenerator::new(config).unwrap();
//! tube.update();
//!
//! // A cone closing over its own length leans its normals by 45 degrees
//! let angle = tube.steepness_angles()[0];
//! assert!((angle.to_degrees() - 45.0).abs() < 1e-9);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![allow(clippy::module_name_repetitions)]

mod color;
mod config;
mod cross_section;
mod dirty;
mod error;
mod frame;
mod generator;
pub mod layout;
mod mesh;
mod postprocess;
mod steepness;
mod synthesis;
mod topology;
mod uv;

pub use color::Color32;
pub use config::{CapMode, NormalMode, TubeConfig, UvRect};
pub use cross_section::CrossSection;
pub use dirty::DirtyFlags;
pub use error::{TubeError, TubeResult};
pub use frame::{DIRECTION_PATCH_DISTANCE, Frame, FrameBuilder};
pub use generator::TubeGenerator;
pub use layout::{MIN_EDGES, MIN_POINTS, TubeLayout};
pub use mesh::{Aabb, GizmoKind, GizmoLine, MeshSink, TubeMesh};
pub use postprocess::{PostprocessBuffers, PostprocessId};
pub use steepness::{compute_steepness_angles, tilt_normal};

// Re-export the nalgebra types used in the public API
pub use nalgebra::{Point2, Point3, UnitQuaternion, Vector3, Vector4};
