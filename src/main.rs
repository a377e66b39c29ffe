use std::path::PathBuf;

use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use roll_optimizer::config::{AnnealConfig, PackingConfig};
use roll_optimizer::input::{load_pieces, parse_piece, validate_options, validate_pieces};
use roll_optimizer::render;
use roll_optimizer::solver::Solver;
use roll_optimizer::types::{FeetInches, PackOptions, Piece};
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "roll_optimizer",
    about = "Lay out floor-covering pieces on a fixed-width roll"
)]
struct Cli {
    /// Pieces as WxL, each side feet or feet-inches (e.g. 11-6x13-6 10x12)
    #[arg(long = "piece", num_args = 1..)]
    pieces: Vec<String>,

    /// JSON file with an array of pieces
    #[arg(long)]
    pieces_file: Option<PathBuf>,

    /// Number of stair steps to add (48x24in each)
    #[arg(long, default_value_t = 0)]
    steps: u32,

    /// Add the cutting margin to every piece
    #[arg(long)]
    slippage: bool,

    /// Roll width in inches
    #[arg(long, default_value_t = roll_optimizer::config::DEFAULT_ROLL_WIDTH)]
    roll_width: u32,

    /// Annealing iteration cap
    #[arg(long)]
    iterations: Option<u32>,

    /// Annealing time limit in milliseconds (at most 3000)
    #[arg(long)]
    time_limit_ms: Option<u64>,

    /// Seed for a reproducible layout
    #[arg(long)]
    seed: Option<u64>,

    /// Show ASCII layout of the needs area
    #[arg(long)]
    layout: bool,

    /// Print the full layout as JSON
    #[arg(long)]
    json: bool,

    /// Log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(level)
        .init();

    let mut pieces: Vec<Piece> = match &cli.pieces_file {
        Some(path) => load_pieces(path).unwrap_or_else(|e| fail(e)),
        None => Vec::new(),
    };
    let mut next_id = pieces.iter().map(|p| p.id.saturating_add(1)).max().unwrap_or(1);
    for s in &cli.pieces {
        pieces.push(parse_piece(s, next_id).unwrap_or_else(|e| fail(e)));
        next_id = next_id.saturating_add(1);
    }
    validate_pieces(&pieces).unwrap_or_else(|e| fail(e));
    if pieces.is_empty() && cli.steps == 0 {
        fail("no pieces given, use --piece or --pieces-file");
    }

    let mut anneal = AnnealConfig::default();
    if let Some(n) = cli.iterations {
        anneal = anneal.with_max_iterations(n);
    }
    if let Some(ms) = cli.time_limit_ms {
        anneal = anneal.with_time_limit(std::time::Duration::from_millis(ms));
    }
    let config = PackingConfig::new()
        .with_roll_width(cli.roll_width)
        .with_anneal(anneal)
        .sanitized()
        .unwrap_or_else(|e| fail(e));
    let options = PackOptions {
        add_slippage: cli.slippage,
        steps: cli.steps,
    };
    validate_options(&options).unwrap_or_else(|e| fail(e));

    let solver = Solver::new(config, options, pieces);
    let layout = match cli.seed {
        Some(seed) => solver.solve_with_rng(&mut StdRng::seed_from_u64(seed)),
        None => solver.solve(),
    };

    if cli.json {
        match serde_json::to_string_pretty(&layout) {
            Ok(json) => println!("{json}"),
            Err(e) => fail(e),
        }
        return;
    }

    if layout.is_flipped {
        println!("Roll the job 90 degrees: pieces run across the roll.\n");
    }

    println!("Full-width pieces:");
    for p in &layout.standard {
        println!("  #{} {}", p.id, p);
    }
    println!("\nPacked pieces ({}):", layout.method);
    for p in &layout.needs {
        println!("  #{} {} @ ({}, {})", p.piece.id, p.piece, p.x, p.y);
    }
    if cli.layout {
        print!(
            "{}",
            render::render_needs(layout.roll_width, layout.needs_length, &layout.needs)
        );
    }

    println!();
    println!(
        "Length: {} full-width + {} packed = {} ({} in)",
        FeetInches(layout.standard_length),
        FeetInches(layout.needs_length),
        FeetInches(layout.total_length),
        layout.total_length
    );
    println!(
        "Summary: {:.1} sq ft ({:.2} sq yd) used of {:.1} sq ft, {:.1} sq ft waste ({:.1}%)",
        layout.used_sq_ft,
        layout.total_sq_yd,
        layout.total_sq_ft,
        layout.waste_sq_ft,
        layout.waste_percent,
    );
}
