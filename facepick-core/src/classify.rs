//! Shape classification and face metrics.
//!
//! Rectangles are tested before circles. The two are exclusive anyway: a
//! rectangle has exactly four corners, a circle at least
//! [`MeasureConfig::circle_min_vertices`].
use std::f32::consts::{FRAC_PI_2, PI};

use nalgebra::Point3;
use serde::Serialize;
use tracing::debug;

use crate::boundary::{Edge, FaceOutline};
use crate::config::MeasureConfig;
use crate::geometry::Bounds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Circle,
    Rectangle,
    Complex,
}

impl std::fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ShapeKind::Circle => "circle",
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Complex => "complex",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CircleData {
    pub center: Point3<f32>,
    pub radius: f32,
    pub diameter: f32,
    pub circumference: f32,
}

/// Axis-aligned width and height of a rectangular face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RectangleData {
    pub width: f32,
    pub height: f32,
}

/// Everything the classifier derives from a face outline.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeMetrics {
    pub kind: ShapeKind,
    pub area: f32,
    pub perimeter: f32,
    pub max_edge_length: f32,
    pub min_edge_length: f32,
    /// Largest distance between two polygon vertices.
    pub max_span: f32,
    pub bounds: Option<Bounds>,
    pub circle: Option<CircleData>,
    pub rectangle: Option<RectangleData>,
}

pub struct ShapeClassifier<'a> {
    config: &'a MeasureConfig,
}

impl<'a> ShapeClassifier<'a> {
    pub fn new(config: &'a MeasureConfig) -> Self {
        Self { config }
    }

    pub fn measure(&self, outline: &FaceOutline) -> ShapeMetrics {
        let polygon = outline.polygon();

        let perimeter: f32 = outline.edges.iter().map(|e| e.length).sum();
        let (min_edge_length, max_edge_length) = edge_length_range(&outline.edges);
        let max_span = max_pairwise_distance(polygon);

        let mut area = outline.area();

        let mut kind = ShapeKind::Complex;
        let mut circle = None;
        let mut rectangle = None;

        if self.is_rectangle(polygon, &outline.edges) {
            kind = ShapeKind::Rectangle;
            rectangle = rectangle_dimensions(polygon);
        } else if let Some(center) = self.circle_center(polygon) {
            kind = ShapeKind::Circle;
            let radius = max_span / 2.0;
            area = PI * radius * radius;
            circle = Some(CircleData {
                center,
                radius,
                diameter: max_span,
                circumference: 2.0 * PI * radius,
            });
        }

        debug!(
            %kind,
            corners = polygon.len(),
            edges = outline.edges.len(),
            area,
            perimeter,
            "Classified face"
        );

        ShapeMetrics {
            kind,
            area,
            perimeter,
            max_edge_length,
            min_edge_length,
            max_span,
            bounds: Bounds::from_points(&outline.vertices),
            circle,
            rectangle,
        }
    }

    /// Four corners joined by four edges, each turn within tolerance of 90°.
    pub fn is_rectangle(&self, polygon: &[Point3<f32>], edges: &[Edge]) -> bool {
        if polygon.len() != 4 || edges.len() != 4 {
            return false;
        }
        (0..4).all(|i| {
            let a = polygon[(i + 1) % 4] - polygon[i];
            let b = polygon[(i + 2) % 4] - polygon[(i + 1) % 4];
            let scale = a.norm() * b.norm();
            if scale <= 0.0 {
                return false;
            }
            let angle = (a.dot(&b) / scale).clamp(-1.0, 1.0).acos();
            (angle - FRAC_PI_2).abs() < self.config.rectangle_angle_tolerance
        })
    }

    /// Centroid of the polygon if its vertices sit on a common circle
    /// around it, judged by the spread of their distances.
    pub fn circle_center(&self, polygon: &[Point3<f32>]) -> Option<Point3<f32>> {
        if polygon.len() < self.config.circle_min_vertices.max(1) {
            return None;
        }
        let n = polygon.len() as f32;
        let center = Point3::from(polygon.iter().map(|p| p.coords).sum::<nalgebra::Vector3<f32>>() / n);

        let distances: Vec<f32> = polygon.iter().map(|p| (p - center).norm()).collect();
        let mean = distances.iter().sum::<f32>() / n;
        if mean <= 0.0 {
            return None;
        }
        let variance = distances.iter().map(|d| (d - mean).powi(2)).sum::<f32>() / n;

        (variance.sqrt() / mean < self.config.circularity_tolerance).then_some(center)
    }
}

fn edge_length_range(edges: &[Edge]) -> (f32, f32) {
    if edges.is_empty() {
        return (0.0, 0.0);
    }
    edges.iter().fold((f32::INFINITY, 0.0f32), |(min, max), e| {
        (min.min(e.length), max.max(e.length))
    })
}

fn max_pairwise_distance(points: &[Point3<f32>]) -> f32 {
    let mut max = 0.0f32;
    for (i, a) in points.iter().enumerate() {
        for b in &points[i + 1..] {
            max = max.max((b - a).norm());
        }
    }
    max
}

/// Width and height from the bounding box, dropping its thinnest axis.
fn rectangle_dimensions(polygon: &[Point3<f32>]) -> Option<RectangleData> {
    let extents = Bounds::from_points(polygon)?.extents();
    let thinnest = extents.imin();
    let mut sides = (0..3).filter(|&axis| axis != thinnest).map(|axis| extents[axis]);
    Some(RectangleData {
        width: sides.next()?,
        height: sides.next()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EdgePolicy;

    fn ring(points: &[Point3<f32>], config: &MeasureConfig) -> FaceOutline {
        let edges = (0..points.len())
            .map(|i| {
                let (start, end) = (points[i], points[(i + 1) % points.len()]);
                Edge {
                    id: i,
                    start,
                    end,
                    length: (end - start).norm(),
                    color: config.edge_color(i),
                }
            })
            .collect();
        FaceOutline {
            vertices: points.to_vec(),
            loops: vec![points.to_vec()],
            edges,
        }
    }

    fn regular_polygon(n: usize, radius: f32) -> Vec<Point3<f32>> {
        (0..n)
            .map(|i| {
                let a = std::f32::consts::TAU * i as f32 / n as f32;
                Point3::new(radius * a.cos(), 0.0, radius * a.sin())
            })
            .collect()
    }

    #[test]
    fn test_rectangle_metrics() {
        let config = MeasureConfig::default();
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(10.0, 20.0, 0.0),
            Point3::new(0.0, 20.0, 0.0),
        ];
        let metrics = ShapeClassifier::new(&config).measure(&ring(&points, &config));
        assert_eq!(metrics.kind, ShapeKind::Rectangle);
        assert!((metrics.area - 200.0).abs() < 1e-3);
        assert!((metrics.perimeter - 60.0).abs() < 1e-4);
        assert_eq!(metrics.max_edge_length, 20.0);
        assert_eq!(metrics.min_edge_length, 10.0);
        let rect = metrics.rectangle.unwrap();
        assert_eq!((rect.width, rect.height), (10.0, 20.0));
        assert!(metrics.circle.is_none());
    }

    #[test]
    fn test_skewed_quad_is_complex() {
        let config = MeasureConfig::default();
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(13.0, 10.0, 0.0),
            Point3::new(3.0, 10.0, 0.0),
        ];
        let metrics = ShapeClassifier::new(&config).measure(&ring(&points, &config));
        assert_eq!(metrics.kind, ShapeKind::Complex);
        assert!((metrics.area - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_circle_from_regular_polygon() {
        let config = MeasureConfig::default();
        let points = regular_polygon(24, 5.0);
        let metrics = ShapeClassifier::new(&config).measure(&ring(&points, &config));
        assert_eq!(metrics.kind, ShapeKind::Circle);
        let circle = metrics.circle.unwrap();
        assert!((circle.radius - 5.0).abs() < 1e-4);
        assert!((circle.diameter - 10.0).abs() < 1e-4);
        assert!((circle.circumference - 10.0 * PI).abs() < 1e-3);
        assert!((metrics.area - 25.0 * PI).abs() < 1e-3);
        assert!(circle.center.coords.norm() < 1e-4);
    }

    #[test]
    fn test_too_few_vertices_for_circle() {
        let config = MeasureConfig::default();
        let points = regular_polygon(6, 5.0);
        let metrics = ShapeClassifier::new(&config).measure(&ring(&points, &config));
        assert_eq!(metrics.kind, ShapeKind::Complex);

        let relaxed = MeasureConfig {
            circle_min_vertices: 6,
            ..MeasureConfig::default()
        };
        let metrics = ShapeClassifier::new(&relaxed).measure(&ring(&points, &relaxed));
        assert_eq!(metrics.kind, ShapeKind::Circle);
    }

    #[test]
    fn test_ellipse_is_not_circle() {
        let config = MeasureConfig::default();
        let points: Vec<_> = regular_polygon(16, 5.0)
            .into_iter()
            .map(|p| Point3::new(p.x * 2.0, p.y, p.z))
            .collect();
        let metrics = ShapeClassifier::new(&config).measure(&ring(&points, &config));
        assert_eq!(metrics.kind, ShapeKind::Complex);
    }

    #[test]
    fn test_square_with_eight_vertices_is_not_circle() {
        // Corners and edge midpoints, but the outline keeps all eight.
        let config = MeasureConfig::default();
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
            Point3::new(2.0, 2.0, 0.0),
            Point3::new(1.0, 2.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let metrics = ShapeClassifier::new(&config).measure(&ring(&points, &config));
        assert_eq!(metrics.kind, ShapeKind::Complex);
        assert!((metrics.area - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_empty_outline() {
        let config = MeasureConfig::default();
        let outline = FaceOutline {
            vertices: vec![Point3::new(1.0, 2.0, 3.0)],
            ..FaceOutline::default()
        };
        let metrics = ShapeClassifier::new(&config).measure(&outline);
        assert_eq!(metrics.kind, ShapeKind::Complex);
        assert_eq!(metrics.area, 0.0);
        assert_eq!(metrics.perimeter, 0.0);
        assert_eq!(metrics.max_edge_length, 0.0);
        assert_eq!(metrics.min_edge_length, 0.0);
    }

    #[test]
    fn test_pairwise_square_never_rectangle() {
        let config = MeasureConfig {
            edge_policy: EdgePolicy::Pairwise,
            ..MeasureConfig::default()
        };
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mut outline = ring(&points, &config);
        outline.loops.clear();
        let extra = Edge {
            id: 4,
            start: points[0],
            end: points[2],
            length: 2.0f32.sqrt(),
            color: config.edge_color(4),
        };
        outline.edges.push(extra);
        let metrics = ShapeClassifier::new(&config).measure(&outline);
        assert_eq!(metrics.kind, ShapeKind::Complex);
        assert!((metrics.max_edge_length - 2.0f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ShapeKind::Circle.to_string(), "circle");
        assert_eq!(serde_json::to_string(&ShapeKind::Rectangle).unwrap(), "\"rectangle\"");
    }
}
