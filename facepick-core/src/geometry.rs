//! Geometry primitives: the triangle soup handed over by the mesh loader.
use nalgebra::{Point3, Vector3};
use serde::Serialize;

/// Squared cross-product norm below which a triangle has no usable normal.
const DEGENERATE_NORM_SQ: f32 = 1e-12;

/// A triangle in winding order with an optional stored face normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub vertices: [Point3<f32>; 3],
    pub normal: Option<Vector3<f32>>,
}

impl Triangle {
    pub fn new(v0: Point3<f32>, v1: Point3<f32>, v2: Point3<f32>) -> Self {
        Self {
            vertices: [v0, v1, v2],
            normal: None,
        }
    }

    /// Attach a precomputed normal. Zero-length or non-finite normals are
    /// treated as absent, which is what most exporters write when they
    /// leave the STL normal field blank.
    pub fn with_normal(mut self, normal: Vector3<f32>) -> Self {
        let norm = normal.norm();
        self.normal = if norm.is_finite() && norm > 1e-6 {
            Some(normal / norm)
        } else {
            None
        };
        self
    }

    fn cross(&self) -> Vector3<f32> {
        let [v0, v1, v2] = self.vertices;
        (v1 - v0).cross(&(v2 - v0))
    }

    /// Normal derived from the winding order, `None` for a degenerate triangle.
    pub fn calculate_normal(&self) -> Option<Vector3<f32>> {
        let cross = self.cross();
        let norm_sq = cross.norm_squared();
        if norm_sq.is_finite() && norm_sq > DEGENERATE_NORM_SQ {
            Some(cross / norm_sq.sqrt())
        } else {
            None
        }
    }

    /// Stored normal if present, otherwise the winding-derived one.
    pub fn face_normal(&self) -> Option<Vector3<f32>> {
        self.normal.or_else(|| self.calculate_normal())
    }

    pub fn area(&self) -> f32 {
        0.5 * self.cross().norm()
    }

    pub fn centroid(&self) -> Point3<f32> {
        let [v0, v1, v2] = self.vertices;
        Point3::from((v0.coords + v1.coords + v2.coords) / 3.0)
    }
}

/// Axis-aligned bounds of a point set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Bounds {
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<f32>>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bounds = Self {
            min: first,
            max: first,
        };
        for p in iter {
            bounds.min = bounds.min.inf(p);
            bounds.max = bounds.max.sup(p);
        }
        Some(bounds)
    }

    pub fn extents(&self) -> Vector3<f32> {
        self.max - self.min
    }

    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    /// Radius of the sphere through the box corners.
    pub fn radius(&self) -> f32 {
        self.extents().norm() * 0.5
    }
}

/// A triangle soup, indexed by position `0..len()`.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            triangles: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Triangle> {
        self.triangles.get(index)
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(self.triangles.iter().flat_map(|t| t.vertices.iter()))
    }

    /// Add a planar quad as two triangles (v0, v1, v2) and (v0, v2, v3).
    fn add_quad(&mut self, quad: [Point3<f32>; 4], normal: Vector3<f32>) {
        let [a, b, c, d] = quad;
        self.add_triangle(Triangle::new(a, b, c).with_normal(normal));
        self.add_triangle(Triangle::new(a, c, d).with_normal(normal));
    }

    /// Axis-aligned cube centred on the origin, two triangles per face.
    pub fn cube(size: f32) -> Self {
        Self::box_tessellated(size, size, size, 1)
    }

    /// Axis-aligned box centred on the origin whose faces are each split
    /// into a `divisions` x `divisions` grid of quads, so every flat face
    /// is made of many triangles sharing interior vertices.
    pub fn box_tessellated(width: f32, height: f32, depth: f32, divisions: usize) -> Self {
        let n = divisions.max(1);
        let half = Vector3::new(width, height, depth) / 2.0;
        let mut mesh = Self::with_capacity(12 * n * n);

        // (normal axis, sign, u axis, v axis) with u x v pointing along the normal
        let faces: [(usize, f32, usize, usize); 6] = [
            (2, 1.0, 0, 1),
            (2, -1.0, 1, 0),
            (1, 1.0, 2, 0),
            (1, -1.0, 0, 2),
            (0, 1.0, 1, 2),
            (0, -1.0, 2, 1),
        ];

        for (axis, sign, u_axis, v_axis) in faces {
            let mut normal = Vector3::zeros();
            normal[axis] = sign;

            let corner = |i: usize, j: usize| {
                let mut p = Point3::origin();
                p[axis] = sign * half[axis];
                p[u_axis] = -half[u_axis] + 2.0 * half[u_axis] * i as f32 / n as f32;
                p[v_axis] = -half[v_axis] + 2.0 * half[v_axis] * j as f32 / n as f32;
                p
            };

            for i in 0..n {
                for j in 0..n {
                    mesh.add_quad(
                        [corner(i, j), corner(i + 1, j), corner(i + 1, j + 1), corner(i, j + 1)],
                        normal,
                    );
                }
            }
        }

        mesh
    }

    /// Closed cylinder along Z centred on the origin. Caps are fanned
    /// around a centre vertex; the side is a band of quads.
    pub fn cylinder(radius: f32, height: f32, segments: usize) -> Self {
        let segments = segments.max(3);
        let half = height / 2.0;
        let mut mesh = Self::with_capacity(segments * 4);

        let rim = |i: usize, z: f32| {
            let angle = std::f32::consts::TAU * (i % segments) as f32 / segments as f32;
            Point3::new(radius * angle.cos(), radius * angle.sin(), z)
        };
        let top = Point3::new(0.0, 0.0, half);
        let bottom = Point3::new(0.0, 0.0, -half);

        for i in 0..segments {
            mesh.add_triangle(
                Triangle::new(top, rim(i, half), rim(i + 1, half)).with_normal(Vector3::z()),
            );
            mesh.add_triangle(
                Triangle::new(bottom, rim(i + 1, -half), rim(i, -half))
                    .with_normal(-Vector3::z()),
            );

            // Side normals are left to the winding so adjacent strips differ.
            let (a, b) = (rim(i, -half), rim(i + 1, -half));
            let (c, d) = (rim(i + 1, half), rim(i, half));
            mesh.add_triangle(Triangle::new(a, b, c));
            mesh.add_triangle(Triangle::new(a, c, d));
        }

        mesh
    }
}
