//! The measurement result handed to the presentation layer, and the
//! pipeline that produces it from one pick.
use nalgebra::{Point3, Vector3};
use serde::Serialize;

use crate::boundary::{self, Edge};
use crate::classify::{CircleData, RectangleData, ShapeClassifier, ShapeKind};
use crate::config::MeasureConfig;
use crate::geometry::Mesh;
use crate::region::RegionGrower;
use crate::vertex_index::VertexIndex;

/// Axis-aligned extents of the selected face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FaceBounds {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
    pub extents: Vector3<f32>,
}

/// Measurements of one selected face. Immutable once built; a newer pick
/// replaces it rather than updating it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementResult {
    /// Mesh generation the result was computed against.
    pub generation: u64,
    pub seed_triangle: usize,
    pub pick_point: Option<Point3<f32>>,
    /// Region triangles in ascending order.
    pub triangles: Vec<usize>,
    pub normal: Option<Vector3<f32>>,
    pub kind: ShapeKind,
    pub area: f32,
    pub perimeter: f32,
    /// Longest reported edge. Under
    /// [`EdgePolicy::Boundary`](crate::EdgePolicy::Boundary) that is the
    /// longest outline edge; under
    /// [`EdgePolicy::Pairwise`](crate::EdgePolicy::Pairwise) it is the
    /// largest distance between any two distinct vertices.
    pub max_edge_length: f32,
    /// Shortest reported edge, with the same meaning per policy as
    /// `max_edge_length`.
    pub min_edge_length: f32,
    /// Distinct vertices of the region, interior ones included.
    pub vertex_count: usize,
    /// Vertices of the outline polygon that was classified.
    pub corner_count: usize,
    pub bounds: Option<FaceBounds>,
    pub edges: Vec<Edge>,
    pub circle: Option<CircleData>,
    pub rectangle: Option<RectangleData>,
}

impl MeasurementResult {
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn contains(&self, triangle: usize) -> bool {
        self.triangles.binary_search(&triangle).is_ok()
    }
}

/// Everything one measurement run reads: the mesh, its index and the config.
#[derive(Clone, Copy)]
pub struct MeasureContext<'a> {
    pub mesh: &'a Mesh,
    pub index: &'a VertexIndex,
    pub config: &'a MeasureConfig,
    pub generation: u64,
}

impl MeasureContext<'_> {
    /// Grow, outline and classify the face containing `seed`. Returns
    /// `None` only when `seed` is not a triangle of the mesh.
    pub fn measure(&self, seed: usize, pick_point: Option<Point3<f32>>) -> Option<MeasurementResult> {
        let region = RegionGrower::from_config(self.mesh, self.index, self.config).grow(seed)?;
        let outline = boundary::extract(self.mesh, &region, self.config);
        let metrics = ShapeClassifier::new(self.config).measure(&outline);

        Some(MeasurementResult {
            generation: self.generation,
            seed_triangle: seed,
            pick_point,
            triangles: region.triangles().iter().copied().collect(),
            normal: self.mesh.get(seed).and_then(|t| t.face_normal()),
            kind: metrics.kind,
            area: metrics.area,
            perimeter: metrics.perimeter,
            max_edge_length: metrics.max_edge_length,
            min_edge_length: metrics.min_edge_length,
            vertex_count: outline.vertices.len(),
            corner_count: outline.polygon().len(),
            bounds: metrics.bounds.map(|b| FaceBounds {
                min: b.min,
                max: b.max,
                extents: b.extents(),
            }),
            edges: outline.edges,
            circle: metrics.circle,
            rectangle: metrics.rectangle,
        })
    }
}
