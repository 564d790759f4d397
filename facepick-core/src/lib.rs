//! Facepick Core - face selection and measurement on triangle meshes
//!
//! Given a triangle soup and a picked triangle, recovers the flat face the
//! triangle belongs to, extracts its outline and reports area, perimeter,
//! edge lengths, extents and a circle/rectangle/complex classification.
//!
//! The pipeline per pick is
//! [`VertexIndex`] -> [`RegionGrower`] -> [`boundary::extract`] ->
//! [`ShapeClassifier`] -> [`MeasurementResult`], driven by a
//! [`MeasureSession`] that owns the mesh and the current selection.

pub mod boundary;
pub mod classify;
pub mod config;
pub mod error;
pub mod geometry;
pub mod measurement;
pub mod pick;
pub mod projection;
pub mod region;
pub mod session;
pub mod stl;
pub mod transform;
pub mod vertex_index;

// Re-export commonly used types
pub use boundary::{Edge, FaceOutline};
pub use classify::{CircleData, RectangleData, ShapeClassifier, ShapeKind, ShapeMetrics};
pub use config::{EdgeColor, EdgePolicy, GrowthStrategy, MeasureConfig};
pub use error::{ConfigError, Error, Result, StlError};
pub use geometry::{Bounds, Mesh, Triangle};
pub use measurement::{FaceBounds, MeasureContext, MeasurementResult};
pub use pick::{raycast, Hit, Ray};
pub use projection::{Camera, ProjectionMode};
pub use region::{FaceRegion, NormalSimilarity, PlaneDistance, RegionCriterion, RegionGrower};
pub use session::{MeasureSession, PickEvent};
pub use transform::{RotationState, Transform};
pub use vertex_index::{VertexIndex, VertexKey};
