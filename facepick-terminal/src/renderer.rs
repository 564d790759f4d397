//! ASCII rasterizer for terminal rendering.
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use facepick_core::{Camera, EdgeColor, MeasurementResult, Mesh, Triangle};
use nalgebra::{Matrix4, Vector3};
use std::io::Write;

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Depth bias so outline edges win against the face they lie on.
const EDGE_DEPTH_BIAS: f32 = 1e-3;

const SELECTION_COLOR: Color = Color::Yellow;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    depth: f32,
    character: char,
    color: Option<Color>,
}

impl Cell {
    const EMPTY: Cell = Cell {
        depth: f32::INFINITY,
        character: ' ',
        color: None,
    };
}

pub fn terminal_color(color: EdgeColor) -> Color {
    let (r, g, b) = color.rgb();
    Color::Rgb { r, g, b }
}

/// ASCII renderer that converts 3D meshes to terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::EMPTY; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.cells = vec![Cell::EMPTY; width * height];
    }

    pub fn clear(&mut self) {
        self.cells.fill(Cell::EMPTY);
    }

    /// Character at a cell, mainly for tests.
    pub fn char_at(&self, x: usize, y: usize) -> Option<char> {
        (x < self.width && y < self.height).then(|| self.cells[y * self.width + x].character)
    }

    fn color_at(&self, x: usize, y: usize) -> Option<Color> {
        self.cells.get(y * self.width + x).and_then(|c| c.color)
    }

    /// Shade every triangle, tint the selected face, then draw its outline
    /// edges in their palette colours.
    pub fn render_mesh(
        &mut self,
        mesh: &Mesh,
        model_matrix: &Matrix4<f32>,
        camera: &Camera,
        selection: Option<&MeasurementResult>,
    ) {
        for (index, triangle) in mesh.triangles.iter().enumerate() {
            let selected = selection.is_some_and(|s| s.contains(index));
            let tint = selected.then_some(SELECTION_COLOR);
            self.render_triangle(triangle, model_matrix, camera, tint);
        }

        if let Some(selection) = selection {
            for edge in &selection.edges {
                let start = self.project(camera, model_matrix, &edge.start);
                let end = self.project(camera, model_matrix, &edge.end);
                if let (Some(start), Some(end)) = (start, end) {
                    self.draw_line(start, end, terminal_color(edge.color));
                }
            }
        }
    }

    fn project(
        &self,
        camera: &Camera,
        model_matrix: &Matrix4<f32>,
        point: &nalgebra::Point3<f32>,
    ) -> Option<(f32, f32, f32)> {
        camera.project_to_screen(point, model_matrix, self.width as u32, self.height as u32)
    }

    fn render_triangle(
        &mut self,
        triangle: &Triangle,
        model_matrix: &Matrix4<f32>,
        camera: &Camera,
        tint: Option<Color>,
    ) {
        // Project vertices to screen space
        let mut screen_coords = [(0.0, 0.0, 0.0); 3];
        for (slot, vertex) in screen_coords.iter_mut().zip(&triangle.vertices) {
            match self.project(camera, model_matrix, vertex) {
                Some(coords) => *slot = coords,
                None => return, // Triangle is clipped
            }
        }

        // Shade by the rotated face normal against a light behind the viewer
        let Some(normal) = triangle.face_normal() else {
            return;
        };
        let world_normal = model_matrix.transform_vector(&normal).normalize();
        let light_dir = Vector3::new(0.3, 0.4, 1.0).normalize();
        let brightness = world_normal.dot(&light_dir).abs();

        // Map brightness to character
        let char_index = (brightness * (LUMINOSITY_RAMP.len() - 1) as f32) as usize;
        let char_index = char_index.clamp(1, LUMINOSITY_RAMP.len() - 1);
        let character = LUMINOSITY_RAMP[char_index];

        // Rasterize triangle using scanline algorithm
        self.rasterize_triangle(&screen_coords, character, tint);
    }

    fn rasterize_triangle(&mut self, coords: &[(f32, f32, f32); 3], character: char, tint: Option<Color>) {
        let [v0, v1, v2] = *coords;

        // Bounding box
        let min_x = v0.0.min(v1.0).min(v2.0).floor() as i32;
        let max_x = v0.0.max(v1.0).max(v2.0).ceil() as i32;
        let min_y = v0.1.min(v1.1).min(v2.1).floor() as i32;
        let max_y = v0.1.max(v1.1).max(v2.1).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                let Some((w0, w1, w2)) = barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), (px, py))
                else {
                    continue;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                let cell = &mut self.cells[y as usize * self.width + x as usize];
                if depth < cell.depth {
                    *cell = Cell {
                        depth,
                        character,
                        color: tint,
                    };
                }
            }
        }
    }

    /// Bresenham line with interpolated depth.
    fn draw_line(&mut self, start: (f32, f32, f32), end: (f32, f32, f32), color: Color) {
        let (mut x, mut y) = (start.0.floor() as i32, start.1.floor() as i32);
        let (x1, y1) = (end.0.floor() as i32, end.1.floor() as i32);
        let dx = (x1 - x).abs();
        let dy = -(y1 - y).abs();
        let sx = if x < x1 { 1 } else { -1 };
        let sy = if y < y1 { 1 } else { -1 };
        let steps = dx.max(-dy).max(1) as f32;
        let mut err = dx + dy;
        let mut step = 0.0;

        loop {
            let t = step / steps;
            let depth = start.2 + (end.2 - start.2) * t - EDGE_DEPTH_BIAS;
            if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
                let cell = &mut self.cells[y as usize * self.width + x as usize];
                if depth <= cell.depth {
                    *cell = Cell {
                        depth,
                        character: '#',
                        color: Some(color),
                    };
                }
            }
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
            step += 1.0;
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for y in 0..self.height {
            for x in 0..self.width {
                let c = self.cells[y * self.width + x].character;

                // Color based on character intensity unless tinted
                let color = self.color_at(x, y).unwrap_or(match c {
                    ' ' | '.' | ':' => Color::DarkGrey,
                    '-' | '=' => Color::Grey,
                    '+' | '*' => Color::White,
                    '#' | '%' | '@' => Color::Cyan,
                    _ => Color::White,
                });

                writer.queue(SetForegroundColor(color))?;
                writer.queue(Print(c))?;
            }
            if y + 1 < self.height {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}
