use clap::Parser;
use panel_optimizer::grid::OccupancyGrid;
use panel_optimizer::render;
use panel_optimizer::solver::Solver;
use panel_optimizer::surface::build_surface;
use panel_optimizer::types::{Offset, Shape, SolverOptions};
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "panel_optimizer",
    about = "Maximum number of rectangular panels that fit on a grid surface"
)]
struct Cli {
    /// Surface dimensions in cells (HxW, e.g. 3x5)
    #[arg(long)]
    surface: String,

    /// Offset of a second, identical rectangle (ROWS,COLS, e.g. 2,3)
    #[arg(long, allow_hyphen_values = true)]
    offset: Option<String>,

    /// Panel dimensions in cells (HxW, e.g. 1x2)
    #[arg(long)]
    panel: String,

    /// Only place panels in their given orientation
    #[arg(long)]
    no_rotate: bool,

    /// Give up after this many search steps
    #[arg(long)]
    max_steps: Option<u64>,

    /// Show ASCII layout of the best placement
    #[arg(long)]
    layout: bool,

    /// Log search progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn parse_dimensions(s: &str) -> Result<Shape, String> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 2 {
        return Err(format!("invalid dimensions '{}', expected HxW", s));
    }
    let height = parts[0]
        .parse::<u32>()
        .map_err(|_| format!("invalid height in '{}'", s))?;
    let width = parts[1]
        .parse::<u32>()
        .map_err(|_| format!("invalid width in '{}'", s))?;
    Ok(Shape::new(height, width))
}

fn parse_offset(s: &str) -> Result<Offset, String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 2 {
        return Err(format!("invalid offset '{}', expected ROWS,COLS", s));
    }
    let rows = parts[0]
        .trim()
        .parse::<i64>()
        .map_err(|_| format!("invalid row offset in '{}'", s))?;
    let cols = parts[1]
        .trim()
        .parse::<i64>()
        .map_err(|_| format!("invalid column offset in '{}'", s))?;
    Ok(Offset::new(rows, cols))
}

// Zero dimensions are left to the library so they surface as its errors.
fn prepare(cli: &Cli) -> Result<(OccupancyGrid, Solver), String> {
    let surface = parse_dimensions(&cli.surface)?;
    let offset = cli.offset.as_deref().map(parse_offset).transpose()?;
    let panel = parse_dimensions(&cli.panel)?;

    let grid = build_surface(surface, offset).map_err(|e| e.to_string())?;
    let options = SolverOptions {
        allow_rotate: !cli.no_rotate,
        step_budget: cli.max_steps,
    };
    let solver = Solver::with_options(panel, options).map_err(|e| e.to_string())?;
    Ok((grid, solver))
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let (mut grid, solver) = prepare(&cli).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let solution = solver.solve(&mut grid).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let free = grid.free_count();
    println!(
        "Surface: {}x{} ({} free cell{})",
        grid.rows(),
        grid.cols(),
        free,
        if free == 1 { "" } else { "s" },
    );
    for p in &solution.placements {
        let rot = if p.rotated { " [rotated]" } else { "" };
        println!("  {} @ ({}, {}){}", p.shape, p.row, p.col, rot);
    }
    if cli.layout {
        print!("{}", render::render_layout(&grid, &solution.placements));
    }
    println!();

    println!(
        "Summary: {} panel{} of {} ({} search steps)",
        solution.count,
        if solution.count == 1 { "" } else { "s" },
        solver.panel(),
        solution.steps,
    );
}
