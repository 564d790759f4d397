//! Selection state: the loaded mesh and the most recent measurement.
use nalgebra::Point3;
use tracing::{debug, info, warn};

use crate::boundary::Edge;
use crate::config::MeasureConfig;
use crate::geometry::Mesh;
use crate::measurement::{MeasureContext, MeasurementResult};
use crate::pick::Hit;
use crate::vertex_index::VertexIndex;

/// A pick reported by the input layer: a world point and the triangle
/// under it, if any.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickEvent {
    pub point: Point3<f32>,
    pub triangle: Option<usize>,
}

impl PickEvent {
    pub fn new(point: Point3<f32>, triangle: usize) -> Self {
        Self {
            point,
            triangle: Some(triangle),
        }
    }

    pub fn miss(point: Point3<f32>) -> Self {
        Self {
            point,
            triangle: None,
        }
    }

    pub fn from_hit(hit: &Hit) -> Self {
        Self::new(hit.point, hit.triangle)
    }
}

struct LoadedMesh {
    mesh: Mesh,
    index: VertexIndex,
}

/// Owns the read-only mesh and publishes one selection at a time.
///
/// Every [`load_mesh`](Self::load_mesh) bumps the generation; results
/// computed against an older generation are refused by
/// [`publish`](Self::publish).
pub struct MeasureSession {
    config: MeasureConfig,
    loaded: Option<LoadedMesh>,
    generation: u64,
    selection: Option<MeasurementResult>,
}

impl MeasureSession {
    pub fn new(config: MeasureConfig) -> Self {
        Self {
            config,
            loaded: None,
            generation: 0,
            selection: None,
        }
    }

    pub fn with_mesh(config: MeasureConfig, mesh: Mesh) -> Self {
        let mut session = Self::new(config);
        session.load_mesh(mesh);
        session
    }

    pub fn load_mesh(&mut self, mesh: Mesh) {
        let index = VertexIndex::build(&mesh);
        self.generation += 1;
        self.selection = None;
        info!(
            generation = self.generation,
            triangles = mesh.len(),
            vertices = index.vertex_count(),
            "Loaded mesh"
        );
        self.loaded = Some(LoadedMesh { mesh, index });
    }

    pub fn config(&self) -> &MeasureConfig {
        &self.config
    }

    /// Replace the config. The current selection is kept until the next pick.
    pub fn set_config(&mut self, config: MeasureConfig) {
        self.config = config;
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        self.loaded.as_ref().map(|l| &l.mesh)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn selection(&self) -> Option<&MeasurementResult> {
        self.selection.as_ref()
    }

    /// Measure the face containing `triangle` without changing the selection.
    pub fn measure(&self, triangle: usize) -> Option<MeasurementResult> {
        self.measure_at(triangle, None)
    }

    fn measure_at(&self, triangle: usize, point: Option<Point3<f32>>) -> Option<MeasurementResult> {
        let loaded = self.loaded.as_ref()?;
        MeasureContext {
            mesh: &loaded.mesh,
            index: &loaded.index,
            config: &self.config,
            generation: self.generation,
        }
        .measure(triangle, point)
    }

    /// Select the face under a pick. A miss, an unknown triangle or a
    /// missing mesh leaves the previous selection untouched and returns `None`.
    pub fn pick(&mut self, event: &PickEvent) -> Option<&MeasurementResult> {
        let Some(triangle) = event.triangle else {
            debug!("Pick missed the mesh");
            return None;
        };
        let Some(result) = self.measure_at(triangle, Some(event.point)) else {
            debug!(triangle, "Pick did not resolve to a triangle");
            return None;
        };
        info!(
            triangle,
            kind = %result.kind,
            area = result.area,
            perimeter = result.perimeter,
            faces = result.triangle_count(),
            "Selected face"
        );
        self.selection = Some(result);
        self.selection.as_ref()
    }

    /// Publish a result computed elsewhere. Refused when it was computed
    /// against a mesh generation other than the current one.
    pub fn publish(&mut self, result: MeasurementResult) -> bool {
        if result.generation != self.generation || self.loaded.is_none() {
            warn!(
                stale = result.generation,
                current = self.generation,
                "Discarding measurement from another mesh generation"
            );
            return false;
        }
        self.selection = Some(result);
        true
    }

    pub fn clear(&mut self) {
        self.selection = None;
    }

    /// Outline edges of the current selection, for highlighting.
    pub fn highlight_edges(&self) -> &[Edge] {
        self.selection
            .as_ref()
            .map(|s| s.edges.as_slice())
            .unwrap_or(&[])
    }
}

impl Default for MeasureSession {
    fn default() -> Self {
        Self::new(MeasureConfig::default())
    }
}
