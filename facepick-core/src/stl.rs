//! STL loading for binary and ASCII files.
use std::path::Path;

use nalgebra::{Point3, Vector3};
use nom::{
    bytes::complete::tag,
    character::complete::{multispace0, multispace1, not_line_ending},
    combinator::opt,
    multi::many0,
    number::complete::float,
    sequence::preceded,
    IResult,
};
use tracing::{debug, info};

use crate::error::StlError;
use crate::geometry::{Mesh, Triangle};

const HEADER_LEN: usize = 80;
const RECORD_LEN: usize = 50;

fn read_vec3(record: &[u8]) -> Vector3<f32> {
    let component = |i: usize| {
        f32::from_le_bytes([record[i], record[i + 1], record[i + 2], record[i + 3]])
    };
    Vector3::new(component(0), component(4), component(8))
}

/// Parse a binary STL file
pub fn parse_binary_stl(data: &[u8]) -> Result<Mesh, StlError> {
    if data.len() < HEADER_LEN + 4 {
        return Err(StlError::TooSmall { len: data.len() });
    }

    let count = &data[HEADER_LEN..HEADER_LEN + 4];
    let triangle_count = u32::from_le_bytes([count[0], count[1], count[2], count[3]]) as usize;
    let body = &data[HEADER_LEN + 4..];

    let available = body.len() / RECORD_LEN;
    if available < triangle_count {
        return Err(StlError::Truncated {
            declared: triangle_count,
            available,
        });
    }

    let mut mesh = Mesh::with_capacity(triangle_count);
    for record in body.chunks_exact(RECORD_LEN).take(triangle_count) {
        // normal, three vertices, then a 2-byte attribute count we ignore
        let normal = read_vec3(&record[0..12]);
        let v0 = Point3::from(read_vec3(&record[12..24]));
        let v1 = Point3::from(read_vec3(&record[24..36]));
        let v2 = Point3::from(read_vec3(&record[36..48]));
        mesh.add_triangle(Triangle::new(v0, v1, v2).with_normal(normal));
    }

    Ok(mesh)
}

/// Parse an ASCII STL file
pub fn parse_ascii_stl(input: &str) -> Result<Mesh, StlError> {
    match parse_ascii_stl_impl(input) {
        Ok((_, mesh)) => Ok(mesh),
        Err(e) => {
            let rest = match &e {
                nom::Err::Error(err) | nom::Err::Failure(err) => err.input,
                nom::Err::Incomplete(_) => "",
            };
            Err(StlError::Syntax {
                context: rest.trim_start().chars().take(40).collect(),
            })
        }
    }
}

fn parse_ascii_stl_impl(input: &str) -> IResult<&str, Mesh> {
    let (input, _) = preceded(multispace0, tag("solid"))(input)?;
    let (input, _) = not_line_ending(input)?; // Optional name
    let (input, triangles) = many0(parse_facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;
    let (input, _) = opt(not_line_ending)(input)?;

    let mut mesh = Mesh::with_capacity(triangles.len());
    for triangle in triangles {
        mesh.add_triangle(triangle);
    }

    Ok((input, mesh))
}

fn parse_facet(input: &str) -> IResult<&str, Triangle> {
    let (input, _) = preceded(multispace0, tag("facet"))(input)?;
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    let (input, normal) = parse_vector3(input)?;
    let (input, _) = preceded(multispace0, tag("outer"))(input)?;
    let (input, _) = preceded(multispace1, tag("loop"))(input)?;
    let (input, v0) = parse_vertex(input)?;
    let (input, v1) = parse_vertex(input)?;
    let (input, v2) = parse_vertex(input)?;
    let (input, _) = preceded(multispace0, tag("endloop"))(input)?;
    let (input, _) = preceded(multispace0, tag("endfacet"))(input)?;

    Ok((input, Triangle::new(v0, v1, v2).with_normal(normal)))
}

fn parse_vertex(input: &str) -> IResult<&str, Point3<f32>> {
    let (input, _) = preceded(multispace0, tag("vertex"))(input)?;
    let (input, v) = parse_vector3(input)?;
    Ok((input, Point3::from(v)))
}

fn parse_vector3(input: &str) -> IResult<&str, Vector3<f32>> {
    let (input, _) = multispace0(input)?;
    let (input, x) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, y) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, z) = float(input)?;
    Ok((input, Vector3::new(x, y, z)))
}

/// Detect and parse STL file (binary or ASCII)
pub fn parse_stl(data: &[u8]) -> Result<Mesh, StlError> {
    // Binary files may also start with "solid", so fall back on failure.
    if data.starts_with(b"solid") {
        if let Ok(text) = std::str::from_utf8(data) {
            match parse_ascii_stl(text) {
                Ok(mesh) => return Ok(mesh),
                Err(e) => debug!(error = %e, "Not ASCII STL, trying binary"),
            }
        }
    }

    parse_binary_stl(data)
}

/// Read and parse an STL file from disk.
pub fn load_stl(path: impl AsRef<Path>) -> Result<Mesh, StlError> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|source| StlError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mesh = parse_stl(&data)?;
    info!(path = %path.display(), triangles = mesh.len(), "Loaded STL");
    Ok(mesh)
}

/// Serialize a mesh as binary STL. Missing normals are written derived
/// from the winding, or zero for degenerate triangles.
pub fn write_binary_stl(mesh: &Mesh) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + 4 + mesh.len() * RECORD_LEN);
    out.extend_from_slice(&[0u8; HEADER_LEN]);
    out.extend_from_slice(&(mesh.len() as u32).to_le_bytes());
    for triangle in &mesh.triangles {
        let normal = triangle.face_normal().unwrap_or_else(Vector3::zeros);
        let points = std::iter::once(normal).chain(triangle.vertices.iter().map(|v| v.coords));
        for v in points {
            for c in v.iter() {
                out.extend_from_slice(&c.to_le_bytes());
            }
        }
        out.extend_from_slice(&[0u8; 2]);
    }
    out
}
