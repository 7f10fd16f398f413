use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

use fractal_terrain::config::TerrainConfig;
use fractal_terrain::heightmap::{self, CornerMode};
use fractal_terrain::mesh::{self, SmoothingMode};
use fractal_terrain::export;

#[derive(Parser, Debug)]
#[command(name = "fractal_terrain")]
#[command(about = "Generate diamond-square terrain and a triangle mesh from it")]
struct Args {
    /// Grid side length, must be 2^n + 1 (default: 257)
    #[arg(short = 'S', long, conflicts_with = "exponent")]
    size: Option<usize>,

    /// Grid side length as an exponent n, giving 2^n + 1
    #[arg(short = 'n', long)]
    exponent: Option<u32>,

    /// Random seed (uses random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Corner handling for the generator
    #[arg(long, value_enum)]
    corners: Option<CornerMode>,

    /// Smoothing divisor for the mesh vertex pass
    #[arg(long, value_enum)]
    smoothing: Option<SmoothingMode>,

    /// Load settings from a JSON config file (flags override it)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Export a grayscale heightmap preview PNG
    #[arg(long)]
    png: Option<PathBuf>,

    /// Export grid and mesh as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// Export raw vertex/index buffers to <PREFIX>.vertices.bin and <PREFIX>.indices.bin
    #[arg(long, value_name = "PREFIX")]
    raw: Option<PathBuf>,
}

fn resolve_config(args: &Args) -> Result<TerrainConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => TerrainConfig::load(path)?,
        None => TerrainConfig::default(),
    };

    if let Some(exponent) = args.exponent {
        config.size = heightmap::size_for_exponent(exponent)?;
    }
    if let Some(size) = args.size {
        config.size = size;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if let Some(corners) = args.corners {
        config.generator.corners = corners;
    }
    if let Some(smoothing) = args.smoothing {
        config.mesh.smoothing = smoothing;
    }

    config.validate()?;
    Ok(config)
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = resolve_config(&args)?;

    // Initialize RNG
    let seed = config.seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    println!("Generating terrain with seed: {}", seed);
    println!("Grid size: {}x{}", config.size, config.size);

    let grid = heightmap::generate_with(config.size, &config.generator, &mut rng)?;
    let stats = grid.stats();
    println!(
        "Elevation range: {:.3} to {:.3} (mean {:.3})",
        stats.min, stats.max, stats.mean
    );

    let mesh = mesh::build_with(&grid, &config.mesh);
    println!(
        "Mesh: {} vertices, {} triangles",
        mesh.vertices.len(),
        mesh.triangle_count()
    );

    if let Some(path) = &args.png {
        export::export_heightmap_png(&grid, path)?;
        println!("Saved heightmap preview to {}", path.display());
    }
    if let Some(path) = &args.json {
        export::export_json(&grid, &mesh, path)?;
        println!("Saved terrain JSON to {}", path.display());
    }
    if let Some(prefix) = &args.raw {
        let (vertices, indices) = export::export_raw_buffers(&mesh, prefix)?;
        println!("Saved buffers to {} and {}", vertices.display(), indices.display());
    }

    Ok(())
}
