use std::path::PathBuf;
use std::process;

use clap::Parser;

use terraform_descent::config::GameConfig;
use terraform_descent::generation::MapGenerator;
use terraform_descent::heightfield::HeightField;
use terraform_descent::persistence::{load_from_json, save_to_json};
use terraform_descent::session::GameSession;
use terraform_descent::skier::Skier;
use terraform_descent::{logging, Result, TerrainError, ToolKind};

/// Skier steps allowed before the simulation gives up
const MAX_SKIER_STEPS: usize = 10_000;

#[derive(Parser, Debug)]
#[command(name = "terraform_descent")]
#[command(about = "Generate a descent puzzle map and report the cost to beat")]
struct Args {
    /// Width of the map in cells (default from config)
    #[arg(short = 'W', long)]
    width: Option<usize>,

    /// Height of the map in cells (default from config)
    #[arg(short = 'H', long)]
    height: Option<usize>,

    /// Random seed (uses random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// JSON game config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where to save the map snapshot, generated or loaded
    /// (default: <saves_path>/terrain_map.json)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Load a saved snapshot instead of generating
    #[arg(long)]
    load: Option<PathBuf>,

    /// Path start as "X,Y" (default: first valid start cell)
    #[arg(long, value_parser = parse_cell)]
    start: Option<(usize, usize)>,

    /// Release a skier from the start cell
    #[arg(long)]
    simulate: bool,

    /// Write a grayscale PNG of the height field
    #[arg(long)]
    preview: Option<PathBuf>,
}

fn parse_cell(s: &str) -> std::result::Result<(usize, usize), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{}'", s))?;
    let x = x.trim().parse().map_err(|e| format!("bad X in '{}': {}", s, e))?;
    let y = y.trim().parse().map_err(|e| format!("bad Y in '{}': {}", s, e))?;
    Ok((x, y))
}

fn main() {
    logging::init();
    let args = Args::parse();

    if let Err(e) = run(args) {
        log::error!("{}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };

    let field = match &args.load {
        Some(path) => load_from_json(path)?,
        None => {
            let width = args.width.unwrap_or(config.map_width);
            let height = args.height.unwrap_or(config.map_height);
            let generator = MapGenerator::new(config.generation.clone());
            let (field, _) = generator.generate(width, height, args.seed);
            field
        }
    };

    let output = args.output.clone().unwrap_or_else(|| config.default_save_file());
    save_to_json(&field, &output)?;

    let (sx, sy) = field.shelter_coords();
    println!("Map size: {}x{}", field.width(), field.height());
    println!("Shelter: ({}, {})", sx, sy);
    println!("Start altitude threshold: {}", field.start_altitude_threshold());

    let start = match args.start {
        Some(cell) => cell,
        None => field
            .first_valid_start()
            .ok_or_else(|| TerrainError::InvalidMap("no cell is high enough to start from".into()))?,
    };

    if let Some(path) = &args.preview {
        field.to_image().save(path)?;
        println!("Preview written to {}", path.display());
    }

    if args.simulate {
        simulate(&field, start);
    }

    let session = GameSession::new(
        field,
        start,
        config.pathfinding.clone(),
        config.tool.clone(),
        config.tool_charges,
    );
    let baseline = session.baseline();
    if baseline.is_valid() {
        println!(
            "Cost to beat from ({}, {}): {:.2} over {} cells",
            start.0,
            start.1,
            baseline.total_cost,
            baseline.node_count()
        );
    } else {
        println!("No path from ({}, {}) to the shelter", start.0, start.1);
    }
    for line in tool_summary(&session) {
        println!("{}", line);
    }

    Ok(())
}

fn simulate(field: &HeightField, start: (usize, usize)) {
    let Some(mut skier) = Skier::launch(field, start.0 as i32, start.1 as i32) else {
        println!("Skier cannot start at ({}, {}): below the start threshold", start.0, start.1);
        return;
    };

    let outcome = skier.run(field, MAX_SKIER_STEPS);
    let (x, y) = skier.position();
    println!(
        "Skier {:?} after {} steps at ({:.1}, {:.1})",
        outcome.status, outcome.steps, x, y
    );
}

/// One line per tool: name, remaining charges, effect.
fn tool_summary(session: &GameSession) -> Vec<String> {
    ToolKind::all()
        .iter()
        .map(|&kind| format!("  {:<10} x{}  {}", kind, session.charges_left(kind), kind.description()))
        .collect()
}
