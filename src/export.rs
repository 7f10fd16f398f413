use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::{ImageBuffer, Rgb, RgbImage};
use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::grid::Grid;
use crate::mesh::Mesh;

/// Gray level for an elevation: `floor((value + 1) * 127)`, clamped to a byte.
fn gray_level(value: f32) -> u8 {
    ((value + 1.0) * 127.0).floor().clamp(0.0, 255.0) as u8
}

/// Render a height grid as a grayscale preview (-1 = black, +1 = near white).
pub fn render_heightmap(grid: &Grid<f32>) -> RgbImage {
    let mut img: RgbImage = ImageBuffer::new(grid.width() as u32, grid.height() as u32);
    for (x, y, &value) in grid.iter() {
        let p = gray_level(value);
        img.put_pixel(x as u32, y as u32, Rgb([p, p, p]));
    }
    img
}

pub fn export_heightmap_png(grid: &Grid<f32>, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    render_heightmap(grid).save(path)?;
    info!(path = %path.display(), "Wrote heightmap preview");
    Ok(())
}

#[derive(Serialize)]
struct TerrainDump<'a> {
    grid: &'a Grid<f32>,
    mesh: &'a Mesh,
}

/// Write the grid and its mesh as a single JSON document.
pub fn export_json(grid: &Grid<f32>, mesh: &Mesh, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(writer, &TerrainDump { grid, mesh })?;
    info!(path = %path.display(), "Wrote terrain JSON");
    Ok(())
}

/// Write `<prefix>.vertices.bin` (xyz `f32`) and `<prefix>.indices.bin`
/// (`u32`), both little-endian. Returns the two paths.
pub fn export_raw_buffers(mesh: &Mesh, prefix: impl AsRef<Path>) -> Result<(PathBuf, PathBuf)> {
    let prefix = prefix.as_ref().as_os_str().to_owned();

    let mut vertices_path = prefix.clone();
    vertices_path.push(".vertices.bin");
    let vertices_path = PathBuf::from(vertices_path);

    let mut indices_path = prefix;
    indices_path.push(".indices.bin");
    let indices_path = PathBuf::from(indices_path);

    let mut writer = BufWriter::new(File::create(&vertices_path)?);
    for v in mesh.positions_flat() {
        writer.write_all(&v.to_le_bytes())?;
    }
    writer.flush()?;

    let mut writer = BufWriter::new(File::create(&indices_path)?);
    for i in &mesh.indices {
        writer.write_all(&i.to_le_bytes())?;
    }
    writer.flush()?;

    info!(
        vertices = %vertices_path.display(),
        indices = %indices_path.display(),
        "Wrote raw mesh buffers"
    );
    Ok((vertices_path, indices_path))
}
