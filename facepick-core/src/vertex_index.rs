//! Spatial vertex index: canonical position keys and vertex-to-triangle lookup.
use std::collections::HashMap;

use nalgebra::Point3;
use tracing::debug;

use crate::geometry::Mesh;

/// Exact position key. Coordinates are compared bit for bit, with `-0.0`
/// folded onto `0.0` so mirrored exports still share vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexKey([u32; 3]);

impl VertexKey {
    pub fn new(position: &Point3<f32>) -> Self {
        let bits = |v: f32| if v == 0.0 { 0.0f32.to_bits() } else { v.to_bits() };
        Self([bits(position.x), bits(position.y), bits(position.z)])
    }

    pub fn position(&self) -> Point3<f32> {
        Point3::new(
            f32::from_bits(self.0[0]),
            f32::from_bits(self.0[1]),
            f32::from_bits(self.0[2]),
        )
    }
}

impl From<&Point3<f32>> for VertexKey {
    fn from(position: &Point3<f32>) -> Self {
        Self::new(position)
    }
}

/// Read-only map from vertex key to the triangles touching that vertex.
/// Built once per mesh load.
#[derive(Debug, Clone, Default)]
pub struct VertexIndex {
    triangles_by_vertex: HashMap<VertexKey, Vec<usize>>,
    triangle_keys: Vec<[VertexKey; 3]>,
}

impl VertexIndex {
    pub fn build(mesh: &Mesh) -> Self {
        let mut triangles_by_vertex: HashMap<VertexKey, Vec<usize>> = HashMap::new();
        let mut triangle_keys = Vec::with_capacity(mesh.len());

        for (index, triangle) in mesh.triangles.iter().enumerate() {
            let keys = triangle.vertices.map(|v| VertexKey::new(&v));
            for (slot, key) in keys.iter().enumerate() {
                // A degenerate triangle may repeat a position; list it once.
                if keys[..slot].contains(key) {
                    continue;
                }
                triangles_by_vertex.entry(*key).or_default().push(index);
            }
            triangle_keys.push(keys);
        }

        debug!(
            triangles = mesh.len(),
            vertices = triangles_by_vertex.len(),
            "Built vertex index"
        );

        Self {
            triangles_by_vertex,
            triangle_keys,
        }
    }

    /// Triangles touching `key`, in ascending index order.
    pub fn triangles_at(&self, key: &VertexKey) -> &[usize] {
        self.triangles_by_vertex
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Canonical keys of a triangle's three corners.
    pub fn keys(&self, triangle: usize) -> Option<&[VertexKey; 3]> {
        self.triangle_keys.get(triangle)
    }

    /// Triangles sharing at least one vertex with `triangle`, excluding itself.
    pub fn neighbors(&self, triangle: usize) -> impl Iterator<Item = usize> + '_ {
        self.keys(triangle)
            .into_iter()
            .flat_map(|keys| keys.iter())
            .flat_map(move |key| self.triangles_at(key).iter().copied())
            .filter(move |&other| other != triangle)
    }

    pub fn vertex_count(&self) -> usize {
        self.triangles_by_vertex.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangle_keys.len()
    }
}
