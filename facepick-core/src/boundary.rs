//! Boundary extraction: distinct vertices and outline edges of a face region.
use std::collections::HashMap;

use nalgebra::{Point3, Vector3};
use serde::Serialize;
use tracing::debug;

use crate::config::{EdgeColor, EdgePolicy, MeasureConfig};
use crate::geometry::Mesh;
use crate::region::FaceRegion;
use crate::vertex_index::VertexKey;

/// Sine of the largest turn still treated as a straight continuation.
const COLLINEAR_SIN: f32 = 1e-4;

/// An outline edge with a stable id and display colour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Edge {
    pub id: usize,
    pub start: Point3<f32>,
    pub end: Point3<f32>,
    pub length: f32,
    pub color: EdgeColor,
}

/// Vertices and edges describing one face region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaceOutline {
    /// Distinct region vertices, interior ones included, in first-seen order.
    pub vertices: Vec<Point3<f32>>,
    /// Closed boundary loops with straight runs collapsed to their corners,
    /// largest first. Outer loops and holes wind in opposite directions.
    /// Empty under [`EdgePolicy::Pairwise`].
    pub loops: Vec<Vec<Point3<f32>>>,
    pub edges: Vec<Edge>,
}

impl FaceOutline {
    /// The vertex polygon the classifier measures: the outer loop when
    /// boundaries were traced, otherwise every distinct vertex.
    pub fn polygon(&self) -> &[Point3<f32>] {
        self.loops.first().map_or(&self.vertices, |outer| outer)
    }

    /// Enclosed area. Loop area vectors are summed, so holes cancel and
    /// pieces touching at a single vertex add up.
    pub fn area(&self) -> f32 {
        if self.loops.is_empty() {
            return loop_area(&self.vertices);
        }
        self.loops
            .iter()
            .map(|ring| fan_area_vector(ring))
            .sum::<Vector3<f32>>()
            .norm()
    }
}

/// Reduce a region to its distinct vertices and outline edges.
pub fn extract(mesh: &Mesh, region: &FaceRegion, config: &MeasureConfig) -> FaceOutline {
    let vertices = distinct_vertices(mesh, region);
    let outline = match config.edge_policy {
        EdgePolicy::Pairwise => {
            let edges = pairwise_edges(&vertices, config);
            FaceOutline {
                vertices,
                loops: Vec::new(),
                edges,
            }
        }
        EdgePolicy::Boundary => {
            let up = mesh.get(region.seed()).and_then(|t| t.face_normal());
            let loops = trace_loops(mesh, region, up);
            let edges = loop_edges(&loops, config);
            FaceOutline {
                vertices,
                loops,
                edges,
            }
        }
    };

    debug!(
        vertices = outline.vertices.len(),
        loops = outline.loops.len(),
        edges = outline.edges.len(),
        "Extracted face outline"
    );
    outline
}

fn distinct_vertices(mesh: &Mesh, region: &FaceRegion) -> Vec<Point3<f32>> {
    let mut seen = HashMap::new();
    let mut vertices = Vec::new();
    for triangle in region.triangles().iter().filter_map(|&t| mesh.get(t)) {
        for v in &triangle.vertices {
            seen.entry(VertexKey::new(v)).or_insert_with(|| {
                vertices.push(*v);
            });
        }
    }
    vertices
}

fn make_edge(id: usize, start: Point3<f32>, end: Point3<f32>, config: &MeasureConfig) -> Edge {
    Edge {
        id,
        start,
        end,
        length: (end - start).norm(),
        color: config.edge_color(id),
    }
}

fn pairwise_edges(vertices: &[Point3<f32>], config: &MeasureConfig) -> Vec<Edge> {
    let mut edges = Vec::with_capacity(vertices.len() * vertices.len().saturating_sub(1) / 2);
    for (i, a) in vertices.iter().enumerate() {
        for b in &vertices[i + 1..] {
            edges.push(make_edge(edges.len(), *a, *b, config));
        }
    }
    edges
}

fn loop_edges(loops: &[Vec<Point3<f32>>], config: &MeasureConfig) -> Vec<Edge> {
    let mut edges = Vec::new();
    for ring in loops {
        if ring.len() < 2 {
            continue;
        }
        for (i, start) in ring.iter().enumerate() {
            let end = ring[(i + 1) % ring.len()];
            edges.push(make_edge(edges.len(), *start, end, config));
        }
    }
    edges
}

/// Walk the edges used by exactly one region triangle into closed loops.
///
/// Each boundary edge keeps the direction of its triangle, flipped where
/// the triangle winds against `up`, and is followed by the edge leaving its
/// end point. Outer loops then wind one way around `up` and holes the other.
fn trace_loops(mesh: &Mesh, region: &FaceRegion, up: Option<Vector3<f32>>) -> Vec<Vec<Point3<f32>>> {
    // Undirected edge -> slot holding (oriented ends, use count), in insertion order.
    let mut slots: HashMap<(VertexKey, VertexKey), usize> = HashMap::new();
    let mut edges: Vec<([Point3<f32>; 2], usize)> = Vec::new();

    for triangle in region.triangles().iter().filter_map(|&t| mesh.get(t)) {
        let flipped = match (up, triangle.calculate_normal()) {
            (Some(up), Some(normal)) => normal.dot(&up) < 0.0,
            _ => false,
        };
        for i in 0..3 {
            let (mut a, mut b) = (triangle.vertices[i], triangle.vertices[(i + 1) % 3]);
            if flipped {
                std::mem::swap(&mut a, &mut b);
            }
            let (ka, kb) = (VertexKey::new(&a), VertexKey::new(&b));
            if ka == kb {
                continue;
            }
            let key = if ka < kb { (ka, kb) } else { (kb, ka) };
            let slot = *slots.entry(key).or_insert_with(|| {
                edges.push(([a, b], 0));
                edges.len() - 1
            });
            edges[slot].1 += 1;
        }
    }

    let boundary: Vec<[Point3<f32>; 2]> = edges
        .into_iter()
        .filter(|(_, uses)| *uses == 1)
        .map(|(ends, _)| ends)
        .collect();

    let mut outgoing: HashMap<VertexKey, Vec<usize>> = HashMap::new();
    for (i, [a, _]) in boundary.iter().enumerate() {
        outgoing.entry(VertexKey::new(a)).or_default().push(i);
    }

    let mut used = vec![false; boundary.len()];
    let mut loops = Vec::new();

    for first in 0..boundary.len() {
        if used[first] {
            continue;
        }
        used[first] = true;
        let [start, mut current] = boundary[first];
        let start_key = VertexKey::new(&start);
        let mut ring = vec![start];

        while VertexKey::new(&current) != start_key {
            ring.push(current);
            let next = outgoing
                .get(&VertexKey::new(&current))
                .and_then(|list| list.iter().copied().find(|&e| !used[e]));
            let Some(next) = next else {
                // Open chain on a non-manifold region.
                break;
            };
            used[next] = true;
            current = boundary[next][1];
        }

        loops.push(collapse_straight_runs(ring));
    }

    loops.sort_by(|a, b| loop_area(b).total_cmp(&loop_area(a)));
    loops
}

/// Drop vertices where the outline continues straight on.
fn collapse_straight_runs(mut ring: Vec<Point3<f32>>) -> Vec<Point3<f32>> {
    let mut i = 0;
    while ring.len() > 3 && i < ring.len() {
        let n = ring.len();
        let prev = ring[(i + n - 1) % n];
        let next = ring[(i + 1) % n];
        let incoming = ring[i] - prev;
        let outgoing = next - ring[i];
        let scale = incoming.norm() * outgoing.norm();
        let straight = scale > 0.0
            && incoming.dot(&outgoing) > 0.0
            && incoming.cross(&outgoing).norm() <= COLLINEAR_SIN * scale;
        if straight {
            ring.remove(i);
        } else {
            i += 1;
        }
    }
    ring
}

/// Area vector of a polygon fanned from its first vertex; its norm is the
/// polygon's area when the vertices are in winding order.
pub fn fan_area_vector(polygon: &[Point3<f32>]) -> Vector3<f32> {
    let Some(v0) = polygon.first() else {
        return Vector3::zeros();
    };
    polygon
        .windows(2)
        .skip(1)
        .map(|w| (w[0] - v0).cross(&(w[1] - v0)))
        .sum::<Vector3<f32>>()
        * 0.5
}

pub fn loop_area(polygon: &[Point3<f32>]) -> f32 {
    fan_area_vector(polygon).norm()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Triangle;
    use crate::region::RegionGrower;
    use crate::vertex_index::VertexIndex;

    fn outline(mesh: &Mesh, seed: usize, config: &MeasureConfig) -> FaceOutline {
        let index = VertexIndex::build(mesh);
        let region = RegionGrower::from_config(mesh, &index, config)
            .grow(seed)
            .unwrap();
        extract(mesh, &region, config)
    }

    fn rectangle(w: f32, h: f32) -> Mesh {
        let mut mesh = Mesh::new();
        let (a, b, c, d) = (
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(w, 0.0, 0.0),
            Point3::new(w, h, 0.0),
            Point3::new(0.0, h, 0.0),
        );
        mesh.add_triangle(Triangle::new(a, b, c));
        mesh.add_triangle(Triangle::new(a, c, d));
        mesh
    }

    #[test]
    fn test_rectangle_boundary_drops_diagonal() {
        let mesh = rectangle(10.0, 20.0);
        let outline = outline(&mesh, 0, &MeasureConfig::default());
        assert_eq!(outline.vertices.len(), 4);
        assert_eq!(outline.loops.len(), 1);
        assert_eq!(outline.edges.len(), 4);
        let perimeter: f32 = outline.edges.iter().map(|e| e.length).sum();
        assert!((perimeter - 60.0).abs() < 1e-4);
        for (i, edge) in outline.edges.iter().enumerate() {
            assert_eq!(edge.id, i);
        }
        // Edges chain end to start around the loop.
        for pair in outline.edges.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn test_pairwise_policy_has_all_pairs() {
        let mesh = rectangle(10.0, 20.0);
        let config = MeasureConfig {
            edge_policy: EdgePolicy::Pairwise,
            ..MeasureConfig::default()
        };
        let outline = outline(&mesh, 0, &config);
        assert_eq!(outline.edges.len(), 6);
        assert!(outline.loops.is_empty());
        assert_eq!(outline.polygon().len(), 4);
    }

    #[test]
    fn test_tessellated_face_collapses_to_corners() {
        let mesh = Mesh::box_tessellated(3.0, 3.0, 3.0, 3);
        let outline = outline(&mesh, 0, &MeasureConfig::default());
        assert_eq!(outline.vertices.len(), 16);
        assert_eq!(outline.polygon().len(), 4);
        assert_eq!(outline.edges.len(), 4);
        assert!((loop_area(outline.polygon()) - 9.0).abs() < 1e-4);
    }

    #[test]
    fn test_cap_fan_centre_is_interior() {
        let mesh = Mesh::cylinder(2.0, 1.0, 12);
        let outline = outline(&mesh, 0, &MeasureConfig::default());
        assert_eq!(outline.vertices.len(), 13);
        assert_eq!(outline.polygon().len(), 12);
        assert_eq!(outline.edges.len(), 12);
    }

    #[test]
    fn test_palette_cycles_over_edges() {
        let mesh = Mesh::cylinder(2.0, 1.0, 12);
        let config = MeasureConfig::default();
        let outline = outline(&mesh, 0, &config);
        assert_eq!(outline.edges[0].color, outline.edges[8].color);
        assert_eq!(outline.edges[3].color, config.palette[3]);
    }

    #[test]
    fn test_face_with_hole_lists_outer_loop_first() {
        // 3x3 grid of unit quads with the centre quad removed.
        let mut mesh = Mesh::new();
        for i in 0..3 {
            for j in 0..3 {
                if i == 1 && j == 1 {
                    continue;
                }
                let (x, y) = (i as f32, j as f32);
                let a = Point3::new(x, y, 0.0);
                let b = Point3::new(x + 1.0, y, 0.0);
                let c = Point3::new(x + 1.0, y + 1.0, 0.0);
                let d = Point3::new(x, y + 1.0, 0.0);
                mesh.add_triangle(Triangle::new(a, b, c));
                mesh.add_triangle(Triangle::new(a, c, d));
            }
        }
        let outline = outline(&mesh, 0, &MeasureConfig::default());
        assert_eq!(outline.loops.len(), 2);
        assert!((loop_area(&outline.loops[0]) - 9.0).abs() < 1e-4);
        assert!((loop_area(&outline.loops[1]) - 1.0).abs() < 1e-4);
        assert_eq!(outline.edges.len(), 8);
        assert!((outline.area() - 8.0).abs() < 1e-4);

        // The hole winds against the outer loop.
        let outer = fan_area_vector(&outline.loops[0]);
        let hole = fan_area_vector(&outline.loops[1]);
        assert!(outer.dot(&hole) < 0.0);
    }

    #[test]
    fn test_pieces_joined_at_a_vertex_add_up() {
        let mut mesh = Mesh::new();
        mesh.add_triangle(Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 2.0, 0.0),
        ));
        mesh.add_triangle(Triangle::new(
            Point3::new(2.0, 2.0, 0.0),
            Point3::new(3.0, 2.0, 0.0),
            Point3::new(3.0, 3.0, 0.0),
        ));
        let outline = outline(&mesh, 0, &MeasureConfig::default());
        assert_eq!(outline.edges.len(), 6);
        assert!((outline.area() - 2.5).abs() < 1e-5);
    }

    #[test]
    fn test_inconsistent_winding_is_reoriented() {
        // Second triangle of the square wound backwards.
        let mut mesh = Mesh::new();
        let (a, b, c, d) = (
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        mesh.add_triangle(Triangle::new(a, b, c));
        mesh.add_triangle(Triangle::new(a, d, c).with_normal(Vector3::z()));
        let outline = outline(&mesh, 0, &MeasureConfig::default());
        assert_eq!(outline.loops.len(), 1);
        assert_eq!(outline.polygon().len(), 4);
        assert!((outline.area() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_degenerate_triangle_has_no_edges() {
        let mut mesh = Mesh::new();
        let p = Point3::new(1.0, 1.0, 1.0);
        mesh.add_triangle(Triangle::new(p, p, p));
        for policy in [EdgePolicy::Boundary, EdgePolicy::Pairwise] {
            let config = MeasureConfig {
                edge_policy: policy,
                ..MeasureConfig::default()
            };
            let outline = outline(&mesh, 0, &config);
            assert_eq!(outline.vertices.len(), 1);
            assert!(outline.edges.is_empty());
        }
    }

    #[test]
    fn test_fan_area_vector() {
        let square = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 2.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ];
        assert!((fan_area_vector(&square) - Vector3::new(0.0, 0.0, 4.0)).norm() < 1e-6);
        assert_eq!(loop_area(&square[..2]), 0.0);
        assert_eq!(loop_area(&[]), 0.0);
    }
}
