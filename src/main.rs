//! Virus Sandbox - Entry Point
//!
//! Compiles a gene selection from a catalog into an engine and either plays
//! it turn by turn from stdin or runs a headless batch of seeded runs.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;

use virus_sandbox::catalog::{EntityCatalog, GeneDatabase, BASE_ENTITY_NAME};
use virus_sandbox::core::config::SimulationConfig;
use virus_sandbox::core::error::Result;
use virus_sandbox::events::render_turn;
use virus_sandbox::genome::GeneSelection;
use virus_sandbox::progress::ProgressTracker;
use virus_sandbox::simulation::{run_batch, BatchStats, Engine, RunSummary};

#[derive(Parser, Debug)]
#[command(name = "virus-sandbox")]
#[command(about = "Design a virus from genes and watch it fight the cell's interferon response")]
struct Args {
    /// Gene database JSON (defaults to the built-in sample)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Gene to install, in order; repeat for more
    #[arg(long = "gene")]
    genes: Vec<String>,

    /// Starter entity the run begins with
    #[arg(long)]
    starter: Option<String>,

    /// Number of starter entities
    #[arg(long)]
    count: Option<u64>,

    /// Random seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Simulation config TOML
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run this many seeded runs headless and print a JSON summary
    #[arg(long)]
    batch: Option<usize>,

    /// Turn cap for batch runs
    #[arg(long, default_value_t = 200)]
    max_turns: u32,
}

#[derive(Serialize)]
struct BatchReport {
    genes: Vec<String>,
    stats: BatchStats,
    runs: Vec<RunSummary>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("virus_sandbox=info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let db = match &args.catalog {
        Some(path) => GeneDatabase::load(path)?,
        None => GeneDatabase::with_sample(),
    };
    let config = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };

    let selection = select_genes(&db, &args.genes)?;
    let starter = args
        .starter
        .clone()
        .unwrap_or_else(|| BASE_ENTITY_NAME.to_string());
    if db.get_entity(&starter).is_none() {
        tracing::warn!("Starter '{}' is not in the catalog; using defaults", starter);
    }
    let count = args.count.unwrap_or(config.default_starting_count);

    let blueprint = selection.compile(&starter, count, Some(&db))?;
    tracing::info!(
        "Compiled {} genes into {} rules",
        blueprint.gene_names.len(),
        blueprint.rules.len()
    );

    let mut engine = Engine::new(&blueprint, Some(&db)).with_config(config)?;
    if let Some(seed) = args.seed {
        engine = engine.with_seed(seed);
    }

    if let Some(runs) = args.batch {
        let base = engine.seed();
        let seeds: Vec<u64> = (0..runs as u64).map(|i| base.wrapping_add(i)).collect();
        let summaries = run_batch(&engine, &seeds, args.max_turns);
        let report = BatchReport {
            genes: selection.names(),
            stats: BatchStats::from_summaries(&summaries),
            runs: summaries,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    play(engine, &db, &selection)
}

/// Explicit genes in the given order, or every gene whose prerequisites
/// can be met, in catalog name order (first polymerase wins)
fn select_genes(db: &GeneDatabase, requested: &[String]) -> Result<GeneSelection> {
    let mut selection = GeneSelection::new();
    if !requested.is_empty() {
        for name in requested {
            selection.add(db, name)?;
        }
        return Ok(selection);
    }

    loop {
        let names: Vec<String> = db.genes().map(|g| g.name.clone()).collect();
        let before = selection.len();
        for name in names {
            if selection.can_add(db, &name).is_ok() {
                selection.add(db, &name)?;
            }
        }
        if selection.len() == before {
            break;
        }
    }
    Ok(selection)
}

fn play(mut engine: Engine, db: &GeneDatabase, selection: &GeneSelection) -> Result<()> {
    let mut tracker = ProgressTracker::new(db.milestones().cloned());

    println!("\n=== VIRUS SANDBOX ===");
    println!("Genes: {}", selection.names().join(", "));
    println!("Seed: {}", engine.seed());
    println!();
    println!("Commands:");
    println!("  turn / t        - Advance one turn");
    println!("  run <n>         - Advance up to n turns");
    println!("  status / s      - Show population and milestones");
    println!("  quit / q        - Exit");
    println!();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        match input {
            "" => continue,
            "quit" | "q" => break,
            "turn" | "t" => step(&mut engine, &mut tracker, db, true),
            "status" | "s" => display_status(&engine, &tracker),
            _ => match input.strip_prefix("run ").map(|n| n.trim().parse::<u32>()) {
                Some(Ok(n)) => {
                    println!("Running {} turns...", n);
                    for i in 0..n {
                        if engine.is_terminal() {
                            break;
                        }
                        step(&mut engine, &mut tracker, db, i + 1 == n);
                    }
                    println!("Now at turn {}.", engine.turn());
                }
                _ => println!("Unknown command: {}", input),
            },
        }

        if engine.is_terminal() {
            println!(
                "\nRun over: {} after {} turns. Milestone rewards this run: {} EP",
                engine.status().as_str(),
                engine.turn(),
                tracker.take_run_rewards()
            );
            break;
        }
    }

    Ok(())
}

fn step(engine: &mut Engine, tracker: &mut ProgressTracker, db: &GeneDatabase, report: bool) {
    let result = engine.advance_turn();
    let achieved = tracker.observe_turn(&result, db);
    if report || engine.is_terminal() {
        for line in render_turn(&result, engine.rules(), Some(db)) {
            println!("{}", line);
        }
    }
    for id in achieved {
        println!("  *** Milestone achieved: {} ***", id);
    }
}

fn display_status(engine: &Engine, tracker: &ProgressTracker) {
    println!(
        "Turn {} | {} | population {} | interferon {:.1} ({})",
        engine.turn(),
        engine.status().as_str(),
        engine.population().total(),
        engine.feedback_level(),
        engine.feedback_band().as_str()
    );
    for (entity, count) in engine.population().iter() {
        println!("  {:>5}x {}", count, entity);
    }

    let progress = tracker.progress();
    println!("Milestones ({} EP earned):", progress.total_reward);
    for id in &progress.achieved {
        println!("  [x] {}", id);
    }
    for open in &progress.open {
        println!("  [ ] {} - {}", open.name, open.description);
    }
}
