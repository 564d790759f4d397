//! Human-readable measurement report, shared by the viewer panel and `--pick`.
use facepick_core::{MeasurementResult, ShapeKind};

fn point(p: &nalgebra::Point3<f32>) -> String {
    format!("({:.3}, {:.3}, {:.3})", p.x, p.y, p.z)
}

/// One line per measurement, most important first.
pub fn format_report(result: &MeasurementResult) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Face: {} | triangle {} | {} triangles",
            result.kind,
            result.seed_triangle,
            result.triangle_count()
        ),
        format!("Area: {:.4}", result.area),
        format!("Perimeter: {:.4}", result.perimeter),
        format!(
            "Edges: {} (max {:.4}, min {:.4})",
            result.edges.len(),
            result.max_edge_length,
            result.min_edge_length
        ),
    ];

    if let Some(bounds) = &result.bounds {
        let e = bounds.extents;
        lines.push(format!("Extents: {:.4} x {:.4} x {:.4}", e.x, e.y, e.z));
    }

    match result.kind {
        ShapeKind::Circle => {
            if let Some(circle) = &result.circle {
                lines.push(format!(
                    "Radius: {:.4} | Diameter: {:.4} | Circumference: {:.4}",
                    circle.radius, circle.diameter, circle.circumference
                ));
                lines.push(format!("Center: {}", point(&circle.center)));
            }
        }
        ShapeKind::Rectangle => {
            if let Some(rect) = &result.rectangle {
                lines.push(format!("Width: {:.4} | Height: {:.4}", rect.width, rect.height));
            }
        }
        ShapeKind::Complex => {
            lines.push(format!("Vertices: {} ({} on outline)", result.vertex_count, result.corner_count));
        }
    }

    if let Some(p) = &result.pick_point {
        lines.push(format!("Picked at: {}", point(p)));
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use facepick_core::{MeasureSession, MeasureConfig, Mesh};

    #[test]
    fn test_rectangle_report() {
        let session = MeasureSession::with_mesh(MeasureConfig::default(), Mesh::cube(2.0));
        let lines = format_report(&session.measure(0).unwrap());
        assert!(lines[0].starts_with("Face: rectangle"));
        assert_eq!(lines[1], "Area: 4.0000");
        assert!(lines.iter().any(|l| l == "Width: 2.0000 | Height: 2.0000"));
    }

    #[test]
    fn test_circle_report() {
        let session = MeasureSession::with_mesh(MeasureConfig::default(), Mesh::cylinder(1.0, 1.0, 24));
        let lines = format_report(&session.measure(0).unwrap());
        assert!(lines[0].starts_with("Face: circle"));
        assert!(lines.iter().any(|l| l.starts_with("Radius: 1.0000")));
    }
}
