use std::fs;
use std::path::Path;

use glam::Vec2;

use crate::error::{Result, SceneError};
use crate::structs::Vertex;

/// Number of floats on one `[points]` line: `x y r g b`.
pub const FLOATS_PER_POINT: usize = 5;
/// Number of indices on one `[indices]` line: one triangle.
pub const INDICES_PER_TRIANGLE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Points,
    Indices,
}

/// Vertex and index data read from a geometry file.
///
/// `point_data` is stored flat, five floats per point, exactly as it is uploaded to the gpu.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Geometry {
    pub point_data: Vec<f32>,
    pub index_data: Vec<u16>,
}

impl Geometry {
    pub fn vertex_count(&self) -> usize {
        self.point_data.len() / FLOATS_PER_POINT
    }

    pub fn index_count(&self) -> usize {
        self.index_data.len()
    }

    pub fn vertices(&self) -> Vec<Vertex> {
        self.point_data
            .chunks_exact(FLOATS_PER_POINT)
            .map(|p| Vertex::new([p[0], p[1]], [p[2], p[3], p[4]]))
            .collect()
    }

    /// Resolves the indices into a plain triangle list so it can be drawn without an index buffer.
    pub fn expanded_vertices(&self) -> Result<Vec<Vertex>> {
        self.validate()?;
        let vertices = self.vertices();
        Ok(self
            .index_data
            .iter()
            .map(|&index| vertices[index as usize])
            .collect())
    }

    /// Checks that there is something to draw and that every index refers to an existing point.
    pub fn validate(&self) -> Result<()> {
        let vertex_count = self.vertex_count();
        if vertex_count == 0 {
            return Err(SceneError::NoPoints);
        }
        match self.index_data.iter().find(|&&index| index as usize >= vertex_count) {
            Some(&index) => Err(SceneError::IndexOutOfRange { index, vertex_count }),
            None => Ok(()),
        }
    }

    /// Axis aligned bounds of all point positions as `(min, max)`.
    pub fn bounds(&self) -> Option<(Vec2, Vec2)> {
        let mut positions = self
            .point_data
            .chunks_exact(FLOATS_PER_POINT)
            .map(|p| Vec2::new(p[0], p[1]));
        let first = positions.next()?;
        Some(positions.fold((first, first), |(min, max), p| (min.min(p), max.max(p))))
    }
}

/// Loads a geometry file from disk. See [`parse_geometry`] for the format.
pub fn load_geometry<P: AsRef<Path>>(path: P) -> Result<Geometry> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|e| {
        log::error!("Was not able to open file `{}`", path.display());
        SceneError::io(path, e)
    })?;
    let geometry = parse_geometry(&source)?;
    log::info!(
        "Loaded `{}`: {} points, {} indices",
        path.display(),
        geometry.vertex_count(),
        geometry.index_count()
    );
    Ok(geometry)
}

/// Parses the two section geometry format.
///
/// ```text
/// [points]
/// # x    y    r   g   b
/// -0.5 -0.5  1.0 0.0 0.0
/// [indices]
/// 0 1 2
/// ```
///
/// Blank lines and `#` comments are skipped, as is anything before the first section header.
pub fn parse_geometry(source: &str) -> Result<Geometry> {
    let mut geometry = Geometry::default();
    let mut current_section = Section::None;

    for (number, line) in source.lines().enumerate() {
        log::trace!("Got line: {}", line);
        // also drops a stray `\r` that `lines()` leaves on a final CRLF-less line
        let line = line.trim();

        match line {
            "[points]" => current_section = Section::Points,
            "[indices]" => current_section = Section::Indices,
            _ if line.is_empty() || line.starts_with('#') => {}
            _ => match current_section {
                Section::None => {}
                Section::Points => {
                    let values = parse_values::<f32>(line, FLOATS_PER_POINT, "point", number + 1)?;
                    geometry.point_data.extend(values);
                }
                Section::Indices => {
                    let values = parse_values::<u16>(line, INDICES_PER_TRIANGLE, "index triple", number + 1)?;
                    geometry.index_data.extend(values);
                }
            },
        }
    }

    Ok(geometry)
}

fn parse_values<T: std::str::FromStr>(
    line: &str,
    expected: usize,
    section: &'static str,
    number: usize,
) -> Result<Vec<T>>
where
    T::Err: std::fmt::Display,
{
    let values = line
        .split_whitespace()
        .map(|word| {
            word.parse::<T>().map_err(|e| SceneError::MalformedLine {
                section,
                line: number,
                message: format!("`{}`: {}", word, e),
            })
        })
        .collect::<Result<Vec<T>>>()?;

    if values.len() != expected {
        return Err(SceneError::MalformedLine {
            section,
            line: number,
            message: format!("expected {} values, found {}", expected, values.len()),
        });
    }
    Ok(values)
}
