//! Model transform for the viewer: recentre, scale, rotate.
use nalgebra::{Matrix4, Point3, Vector3};

/// Rotation state around three axes (in radians)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RotationState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl RotationState {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Rotate by delta amounts (in radians)
    pub fn rotate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.x += dx;
        self.y += dy;
        self.z += dz;
    }

    /// Rotation matrix applying Z, then Y, then X.
    pub fn matrix(&self) -> Matrix4<f32> {
        let rx = Matrix4::new_rotation(Vector3::new(self.x, 0.0, 0.0));
        let ry = Matrix4::new_rotation(Vector3::new(0.0, self.y, 0.0));
        let rz = Matrix4::new_rotation(Vector3::new(0.0, 0.0, self.z));
        rz * ry * rx
    }
}

/// Model matrix builder.
pub struct Transform;

impl Transform {
    /// Move `center` to the origin, scale uniformly, then rotate.
    pub fn model_matrix(rotation: &RotationState, center: &Point3<f32>, scale: f32) -> Matrix4<f32> {
        rotation.matrix() * Matrix4::new_scaling(scale) * Matrix4::new_translation(&-center.coords)
    }
}
