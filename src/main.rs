use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use tile_terrain::ascii::{AsciiCanvas, AsciiMode};
use tile_terrain::config::{GeneratorConfig, TransitionSource};
use tile_terrain::noise_sampler::{SamplerKind, TimeDirection};
use tile_terrain::session::TerrainSession;
use tile_terrain::terrain::TerrainClass;
use tile_terrain::tileset::{TileCanvas, Tileset};
use tile_terrain::viewer;

/// Seconds of simulated time per `--time-steps` frame (60 fps)
const FRAME_TIME: f64 = 1.0 / 60.0;

#[derive(Parser, Debug)]
#[command(name = "tile_terrain")]
#[command(about = "Generate noise-based tile terrain with transition blending")]
struct Args {
    /// JSON config file (flags below override it)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Width of the map in tiles
    #[arg(short = 'W', long)]
    width: Option<usize>,

    /// Height of the map in tiles
    #[arg(short = 'H', long)]
    height: Option<usize>,

    /// Random seed for regeneration (uses random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Noise strategy
    #[arg(long, value_enum)]
    variant: Option<SamplerKind>,

    /// Transition rule file (defaults to the built-in rule file)
    #[arg(long, conflicts_with = "constant_table")]
    transitions: Option<PathBuf>,

    /// Use the built-in constant transition table
    #[arg(long)]
    constant_table: bool,

    /// Sprite sheet to draw tiles from (palette colors if not specified)
    #[arg(long)]
    tileset: Option<PathBuf>,

    /// Tile size in pixels for the sprite sheet
    #[arg(long)]
    tile_size: Option<u32>,

    /// Frames of time to advance before output
    #[arg(long, default_value = "0")]
    time_steps: u32,

    /// Move time backwards instead of forwards
    #[arg(long)]
    rewind: bool,

    /// Export the rendered map to a PNG
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the map as ASCII
    #[arg(long, value_enum)]
    ascii: Option<AsciiMode>,

    /// Write the ASCII map to a file instead of stdout
    #[arg(long, requires = "ascii")]
    ascii_output: Option<PathBuf>,

    /// Open the interactive viewer
    #[arg(long)]
    view: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let config = build_config(&args)?;

    // A missing or malformed rule file stops here, before any generation
    let table = config.transitions.load()?;
    info!("transition table: {:?} ({} rules)", config.transitions, table.len());

    let seed = args.seed.unwrap_or_else(rand::random);
    println!("Generating terrain with seed: {}", seed);
    println!("Map size: {}x{} ({:?} noise)", config.width, config.height, config.sampler);

    let mut session = TerrainSession::new(&config, table, seed)?;

    if args.time_steps > 0 {
        let direction = if args.rewind { TimeDirection::Backward } else { TimeDirection::Forward };
        for _ in 0..args.time_steps {
            session.advance(FRAME_TIME, direction);
        }
        println!("Advanced {} frames: {}", args.time_steps, session.sampler().describe());
    }

    print_class_summary(&session);

    let tileset = Tileset::from_config(&config.tileset)?;

    if let Some(path) = &args.output {
        let mut canvas = TileCanvas::new(&tileset, config.width, config.height, config.tileset.overlap);
        let stats = session.render_into(&mut canvas)?;
        canvas.compose().save(path)?;
        println!("Exported {} ({} transition tiles)", path.display(), stats.transitions);
    }

    if let Some(mode) = args.ascii {
        let mut canvas = AsciiCanvas::new(config.width, config.height, mode);
        session.render_into(&mut canvas)?;
        match &args.ascii_output {
            Some(path) => {
                canvas.export(path)?;
                println!("Exported ASCII map to {}", path.display());
            }
            None => canvas.write_to(&mut std::io::stdout().lock())?,
        }
    }

    if args.view {
        viewer::run_viewer(session, &tileset, config.tileset.overlap)?;
    }

    Ok(())
}

/// Defaults, then the config file, then command-line flags.
fn build_config(args: &Args) -> Result<GeneratorConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::default(),
    };

    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if let Some(variant) = args.variant {
        config.sampler = variant;
    }
    if let Some(path) = &args.transitions {
        config.transitions = TransitionSource::File(path.clone());
    }
    if args.constant_table {
        config.transitions = TransitionSource::Constant;
    }
    if let Some(path) = &args.tileset {
        config.tileset.path = Some(path.clone());
    }
    if let Some(size) = args.tile_size {
        config.tileset.tile_size = size;
    }

    config.validate()?;
    Ok(config)
}

fn print_class_summary(session: &TerrainSession) {
    let Some(classes) = session.grid().classes() else {
        return;
    };
    let total = (classes.width * classes.height) as f64;

    for class in TerrainClass::ALL {
        let count = classes.iter().filter(|(_, _, c)| **c == class).count();
        println!("  {:<14} {:>6} ({:.1}%)", class.name(), count, 100.0 * count as f64 / total);
    }
}
