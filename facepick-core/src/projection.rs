//! Camera, projection to screen space, and screen rays for picking.
use nalgebra::{Matrix4, Point3, Vector3};

use crate::geometry::Bounds;
use crate::pick::Ray;

/// Projection mode for rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionMode {
    Orthographic,
    Perspective,
}

/// Camera configuration for 3D rendering
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub mode: ProjectionMode,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            position: Point3::new(0.0, 0.0, 5.0),
            target: Point3::new(0.0, 0.0, 0.0),
            up: Vector3::new(0.0, 1.0, 0.0),
            fov: std::f32::consts::PI / 4.0, // 45 degrees
            aspect: width as f32 / height.max(1) as f32,
            near: 0.1,
            far: 100.0,
            mode: ProjectionMode::Perspective,
        }
    }

    /// Back the camera off along +Z until a mesh with these bounds,
    /// recentred on the origin, fills the view.
    pub fn frame(&mut self, bounds: &Bounds) {
        let radius = bounds.radius().max(1e-3);
        let vertical = self.fov / 2.0;
        let horizontal = (vertical.tan() * self.aspect).atan();
        let distance = radius / vertical.min(horizontal).max(1e-3).sin();
        self.target = Point3::origin();
        self.position = Point3::new(0.0, 0.0, distance);
        self.near = (distance - radius).max(distance * 1e-3);
        self.far = distance + radius * 2.0;
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Create the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        match self.mode {
            ProjectionMode::Perspective => {
                Matrix4::new_perspective(self.aspect, self.fov, self.near, self.far)
            }
            ProjectionMode::Orthographic => {
                let height = (self.position - self.target).norm();
                let width = height * self.aspect;
                Matrix4::new_orthographic(
                    -width / 2.0,
                    width / 2.0,
                    -height / 2.0,
                    height / 2.0,
                    self.near,
                    self.far,
                )
            }
        }
    }

    fn mvp(&self, model: &Matrix4<f32>) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix() * model
    }

    /// Project a model-space point to screen space: `(x, y, depth)` with
    /// depth in normalised device units, smaller is nearer.
    pub fn project_to_screen(
        &self,
        point: &Point3<f32>,
        model_matrix: &Matrix4<f32>,
        width: u32,
        height: u32,
    ) -> Option<(f32, f32, f32)> {
        let ndc = self.mvp(model_matrix).transform_point(point);
        if !ndc.coords.iter().all(|c| c.is_finite()) {
            return None;
        }

        // Clip test
        if ndc.x < -1.0 || ndc.x > 1.0 || ndc.y < -1.0 || ndc.y > 1.0 || ndc.z < -1.0 || ndc.z > 1.0 {
            return None;
        }

        let screen_x = (ndc.x + 1.0) * 0.5 * width as f32;
        let screen_y = (1.0 - ndc.y) * 0.5 * height as f32;

        Some((screen_x, screen_y, ndc.z))
    }

    /// Ray through a screen position, expressed in model space so it can
    /// be tested directly against the mesh triangles.
    pub fn screen_ray(
        &self,
        screen_x: f32,
        screen_y: f32,
        model_matrix: &Matrix4<f32>,
        width: u32,
        height: u32,
    ) -> Option<Ray> {
        let inverse = self.mvp(model_matrix).try_inverse()?;
        let ndc_x = screen_x / width.max(1) as f32 * 2.0 - 1.0;
        let ndc_y = 1.0 - screen_y / height.max(1) as f32 * 2.0;

        let near = inverse.transform_point(&Point3::new(ndc_x, ndc_y, -1.0));
        let far = inverse.transform_point(&Point3::new(ndc_x, ndc_y, 1.0));
        let direction = far - near;
        let length = direction.norm();
        if !length.is_finite() || length <= 0.0 {
            return None;
        }
        Some(Ray::new(near, direction / length))
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Mesh;
    use crate::pick::raycast;

    #[test]
    fn test_camera_creation() {
        let camera = Camera::new(800, 600);
        assert_eq!(camera.mode, ProjectionMode::Perspective);
        assert!((camera.aspect - 800.0 / 600.0).abs() < 1e-6);
    }

    #[test]
    fn test_view_matrix() {
        let camera = Camera::new(800, 600);
        let view = camera.view_matrix();
        // View matrix should be non-zero
        assert!(view.norm() > 0.0);
    }

    #[test]
    fn test_origin_projects_to_centre() {
        let camera = Camera::new(800, 600);
        let (x, y, _) = camera
            .project_to_screen(&Point3::origin(), &Matrix4::identity(), 800, 600)
            .unwrap();
        assert!((x - 400.0).abs() < 1e-3);
        assert!((y - 300.0).abs() < 1e-3);
    }

    #[test]
    fn test_behind_camera_is_clipped() {
        let camera = Camera::new(800, 600);
        let behind = Point3::new(0.0, 0.0, 10.0);
        assert!(camera
            .project_to_screen(&behind, &Matrix4::identity(), 800, 600)
            .is_none());
    }

    #[test]
    fn test_screen_ray_round_trips_projection() {
        let camera = Camera::new(800, 600);
        let model = Matrix4::new_rotation(Vector3::new(0.3, 0.2, 0.0));
        let point = Point3::new(0.4, -0.3, 0.2);
        let (x, y, _) = camera.project_to_screen(&point, &model, 800, 600).unwrap();

        let ray = camera.screen_ray(x, y, &model, 800, 600).unwrap();
        let to_point = point - ray.origin;
        let off_axis = (to_point - ray.direction * to_point.dot(&ray.direction)).norm();
        assert!(off_axis < 1e-2);
    }

    #[test]
    fn test_framed_ray_hits_mesh() {
        let mesh = Mesh::box_tessellated(40.0, 30.0, 20.0, 2);
        let mut camera = Camera::new(120, 40);
        camera.frame(&mesh.bounds().unwrap());
        let ray = camera
            .screen_ray(62.0, 19.0, &Matrix4::identity(), 120, 40)
            .unwrap();
        let hit = raycast(&mesh, &ray).unwrap();
        assert!((hit.point.z - 10.0).abs() < 1e-3);
    }
}
