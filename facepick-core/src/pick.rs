//! Hit testing: resolve a ray to the nearest triangle under it.
use nalgebra::{Point3, Vector3};

use crate::geometry::{Mesh, Triangle};

const PARALLEL_EPSILON: f32 = 1e-8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Point3<f32>,
    pub direction: Vector3<f32>,
}

impl Ray {
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
        Self { origin, direction }
    }

    pub fn at(&self, t: f32) -> Point3<f32> {
        self.origin + self.direction * t
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub triangle: usize,
    pub point: Point3<f32>,
    /// Ray parameter of the hit, in units of the ray direction.
    pub distance: f32,
}

/// Möller-Trumbore intersection. Both faces of the triangle count.
pub fn intersect_triangle(ray: &Ray, triangle: &Triangle) -> Option<f32> {
    let [v0, v1, v2] = triangle.vertices;
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    let h = ray.direction.cross(&edge2);
    let a = edge1.dot(&h);
    if a.abs() < PARALLEL_EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = ray.origin - v0;
    let u = f * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = f * ray.direction.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(&q);
    (t > PARALLEL_EPSILON).then_some(t)
}

/// Nearest triangle along `ray`; ties go to the lower index.
pub fn raycast(mesh: &Mesh, ray: &Ray) -> Option<Hit> {
    mesh.triangles
        .iter()
        .enumerate()
        .filter_map(|(index, triangle)| intersect_triangle(ray, triangle).map(|t| (index, t)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(triangle, distance)| Hit {
            triangle,
            point: ray.at(distance),
            distance,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_hits_front_face_of_cube() {
        let mesh = Mesh::cube(2.0);
        let ray = Ray::new(Point3::new(0.2, 0.3, 10.0), -Vector3::z());
        let hit = raycast(&mesh, &ray).unwrap();
        assert!(hit.triangle < 2);
        assert!((hit.distance - 9.0).abs() < 1e-5);
        assert!((hit.point - Point3::new(0.2, 0.3, 1.0)).norm() < 1e-5);
    }

    #[test]
    fn test_ray_miss() {
        let mesh = Mesh::cube(2.0);
        let ray = Ray::new(Point3::new(5.0, 5.0, 10.0), -Vector3::z());
        assert!(raycast(&mesh, &ray).is_none());

        let away = Ray::new(Point3::new(0.0, 0.0, 10.0), Vector3::z());
        assert!(raycast(&mesh, &away).is_none());
    }

    #[test]
    fn test_parallel_ray_misses_triangle() {
        let tri = Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        let ray = Ray::new(Point3::new(-1.0, 0.2, 0.0), Vector3::x());
        assert!(intersect_triangle(&ray, &tri).is_none());
    }
}
