//! Profiling tool for the generation and render passes

use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use tile_terrain::{
    generator::TerrainGrid,
    noise_sampler::{FractalParams, FractalSampler, NoiseSampler, PowerParams, PowerSampler},
    render::CommandBuffer,
    transitions::TransitionTable,
};

fn main() {
    let width = 512;
    let height = 512;
    let seed = 1337u64;

    println!("=== Performance Profiling ===");
    println!("Map size: {}x{} ({} cells)", width, height, width * height);
    println!();

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let table = TransitionTable::constant();

    let mut fractal = FractalSampler::new(FractalParams::default());
    fractal.reseed(&mut rng);
    let mut power = PowerSampler::new(PowerParams::default());
    power.reseed(&mut rng);

    let samplers: [(&str, &dyn NoiseSampler); 2] = [("Fractal", &fractal), ("Power", &power)];

    for (name, sampler) in samplers {
        let mut grid = match TerrainGrid::new(width, height) {
            Ok(grid) => grid,
            Err(e) => {
                eprintln!("{}", e);
                return;
            }
        };

        let start = Instant::now();
        grid.generate(sampler);
        let generate_time = start.elapsed();

        let mut buffer = CommandBuffer::with_capacity(width * height * 2);
        let start = Instant::now();
        let stats = grid.render_into(&table, &mut buffer);
        let render_time = start.elapsed();

        println!("{} noise:", name);
        println!("  Generate: {:?}", generate_time);
        println!("  Render:   {:?}", render_time);
        if let Ok(stats) = stats {
            println!("  Transitions: {} of {} cells", stats.transitions, stats.cells);
        }
    }
}
