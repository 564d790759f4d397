/// Example: list every flat face of an STL file with its measurements
///
/// Usage: cargo run --example list_faces -- path/to/file.stl

use std::env;

use anyhow::{Context, Result};
use facepick_core::{stl, MeasureConfig, MeasureSession, Mesh};

fn main() -> Result<()> {
    let mesh = match env::args().nth(1) {
        Some(path) => {
            stl::load_stl(&path).with_context(|| format!("Failed to load STL file: {path}"))?
        }
        None => {
            eprintln!("No STL file provided, using demo cylinder...");
            Mesh::cylinder(1.0, 2.0, 32)
        }
    };

    let triangle_count = mesh.len();
    let session = MeasureSession::with_mesh(MeasureConfig::default(), mesh);
    let mut covered = vec![false; triangle_count];
    let mut faces = 0;

    for seed in 0..triangle_count {
        if covered[seed] {
            continue;
        }
        let Some(result) = session.measure(seed) else {
            continue;
        };
        for &t in &result.triangles {
            covered[t] = true;
        }
        faces += 1;

        println!(
            "#{faces:<3} {:<9} {:>4} triangles  area {:>10.4}  perimeter {:>10.4}  edges {}",
            result.kind.to_string(),
            result.triangle_count(),
            result.area,
            result.perimeter,
            result.edges.len()
        );
    }

    println!("{faces} faces over {triangle_count} triangles");
    Ok(())
}
