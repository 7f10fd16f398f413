//! Profiling tool for generation and meshing across grid sizes

use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use fractal_terrain::{heightmap, mesh};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let seed = 1337u64;

    println!("=== Performance Profiling ===");
    println!("Seed: {}", seed);
    println!();
    println!("{:>4} {:>6} {:>14} {:>14} {:>10}", "n", "size", "generate", "mesh", "triangles");

    let mut total_generate = Duration::ZERO;
    let mut total_mesh = Duration::ZERO;

    for exponent in 4..=11 {
        let size = heightmap::size_for_exponent(exponent)?;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let start = Instant::now();
        let grid = heightmap::generate(size, &mut rng)?;
        let generate_time = start.elapsed();

        let start = Instant::now();
        let terrain = mesh::build(&grid);
        let mesh_time = start.elapsed();

        total_generate += generate_time;
        total_mesh += mesh_time;

        println!(
            "{:>4} {:>6} {:>14} {:>14} {:>10}",
            exponent,
            size,
            format!("{:?}", generate_time),
            format!("{:?}", mesh_time),
            terrain.triangle_count()
        );
    }

    // Summary
    let total = (total_generate + total_mesh).as_secs_f64();
    println!("\n=== Summary ===");
    println!(
        "Generation: {:>8.2}% ({:?})",
        100.0 * total_generate.as_secs_f64() / total,
        total_generate
    );
    println!(
        "Meshing:    {:>8.2}% ({:?})",
        100.0 * total_mesh.as_secs_f64() / total,
        total_mesh
    );
    println!("─────────────────────────────────");
    Ok(())
}
