//! Face region growing: flood fill from a seed triangle over neighbours
//! that look like the same flat surface.
use std::collections::BTreeSet;

use nalgebra::{Point3, Vector3};
use tracing::{debug, trace};

use crate::config::{GrowthStrategy, MeasureConfig};
use crate::geometry::{Mesh, Triangle};
use crate::vertex_index::VertexIndex;

/// The seed triangle's plane, shared by all criteria.
#[derive(Debug, Clone, Copy)]
pub struct SeedPlane {
    pub point: Point3<f32>,
    pub normal: Vector3<f32>,
}

impl SeedPlane {
    pub fn distance(&self, p: &Point3<f32>) -> f32 {
        (p - self.point).dot(&self.normal).abs()
    }
}

/// Decides whether a neighbouring triangle belongs to the seed's face.
pub trait RegionCriterion {
    fn accepts(&self, seed: &SeedPlane, candidate: &Triangle) -> bool;
}

/// Normal dot product against the seed normal.
#[derive(Debug, Clone, Copy)]
pub struct NormalSimilarity {
    pub threshold: f32,
}

impl RegionCriterion for NormalSimilarity {
    fn accepts(&self, seed: &SeedPlane, candidate: &Triangle) -> bool {
        candidate
            .face_normal()
            .is_some_and(|n| n.dot(&seed.normal) > self.threshold)
    }
}

/// Distance of every corner from the seed plane.
#[derive(Debug, Clone, Copy)]
pub struct PlaneDistance {
    pub tolerance: f32,
}

impl RegionCriterion for PlaneDistance {
    fn accepts(&self, seed: &SeedPlane, candidate: &Triangle) -> bool {
        // Degenerate slivers carry no orientation; keep them out.
        candidate.face_normal().is_some()
            && candidate
                .vertices
                .iter()
                .all(|v| seed.distance(v) <= self.tolerance)
    }
}

/// Triangles recovered as one logical face. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceRegion {
    seed: usize,
    triangles: BTreeSet<usize>,
}

impl FaceRegion {
    pub fn seed(&self) -> usize {
        self.seed
    }

    pub fn triangles(&self) -> &BTreeSet<usize> {
        &self.triangles
    }

    pub fn contains(&self, triangle: usize) -> bool {
        self.triangles.contains(&triangle)
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

/// Grows face regions over a mesh using its vertex index.
pub struct RegionGrower<'a> {
    mesh: &'a Mesh,
    index: &'a VertexIndex,
    criterion: Box<dyn RegionCriterion + 'a>,
}

impl<'a> RegionGrower<'a> {
    pub fn new(mesh: &'a Mesh, index: &'a VertexIndex, criterion: impl RegionCriterion + 'a) -> Self {
        Self {
            mesh,
            index,
            criterion: Box::new(criterion),
        }
    }

    /// Grower using the strategy and thresholds from `config`.
    pub fn from_config(mesh: &'a Mesh, index: &'a VertexIndex, config: &MeasureConfig) -> Self {
        match config.strategy {
            GrowthStrategy::NormalSimilarity => Self::new(
                mesh,
                index,
                NormalSimilarity {
                    threshold: config.normal_threshold,
                },
            ),
            GrowthStrategy::PlaneDistance => Self::new(
                mesh,
                index,
                PlaneDistance {
                    tolerance: config.plane_tolerance,
                },
            ),
        }
    }

    /// Collect the face containing `seed`. Returns `None` if `seed` is not a
    /// triangle of the mesh. A degenerate seed yields a region of itself.
    pub fn grow(&self, seed: usize) -> Option<FaceRegion> {
        let seed_triangle = self.mesh.get(seed)?;
        let mut triangles = BTreeSet::from([seed]);

        let Some(normal) = seed_triangle.face_normal() else {
            debug!(seed, "Seed triangle is degenerate, region is the seed alone");
            return Some(FaceRegion { seed, triangles });
        };
        let plane = SeedPlane {
            point: seed_triangle.vertices[0],
            normal,
        };

        let mut visited = vec![false; self.mesh.len()];
        visited[seed] = true;
        let mut stack = vec![seed];

        while let Some(current) = stack.pop() {
            for neighbor in self.index.neighbors(current) {
                // An index built from another mesh may name triangles we lack.
                let (Some(seen), Some(candidate)) =
                    (visited.get_mut(neighbor), self.mesh.get(neighbor))
                else {
                    continue;
                };
                if *seen {
                    continue;
                }
                *seen = true;
                if self.criterion.accepts(&plane, candidate) {
                    trace!(neighbor, from = current, "Accepted into region");
                    triangles.insert(neighbor);
                    stack.push(neighbor);
                }
            }
        }

        debug!(seed, triangles = triangles.len(), "Grew face region");
        Some(FaceRegion { seed, triangles })
    }
}
