use std::path::PathBuf;

use clap::Parser;

use mascarpone_bench::config::{BenchmarkConfig, ResolvedOutputs};
use mascarpone_bench::logging::init_logging;
use mascarpone_bench::tournament::TournamentRunner;

/// Batch runner seating bots at Mascarpone tables.
#[derive(Debug, Parser)]
#[command(
    name = "mascarpone-bench",
    author,
    version,
    about = "Deterministic Mascarpone tournament harness"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "bench/bench.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the number of games to play.
    #[arg(long, value_name = "GAMES")]
    games: Option<usize>,

    /// Override the RNG seed that derives every game seed.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Override the number of seatings per game seed.
    #[arg(long, value_name = "COUNT")]
    permutations: Option<usize>,

    /// Exit after validating the configuration (no tournament is run).
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = BenchmarkConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(games) = cli.games {
        config.games.count = games;
    }

    if let Some(seed) = cli.seed {
        config.games.seed = Some(seed);
    }

    if let Some(permutations) = cli.permutations {
        config.games.permutations = permutations;
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let agent_count = config.agents.len();
    let run_id = config.run_id.clone();
    let games = config.games.count;
    let permutations = config.games.permutations;

    println!(
        "Loaded configuration '{run_id}' with {agent_count} agents ({games} games, {permutations} seatings each)"
    );

    let runner = TournamentRunner::new(config.clone(), outputs.clone())?;

    if cli.validate_only {
        println!("Validation-only mode: tournament execution skipped.");
        return Ok(());
    }

    let telemetry = init_logging(&config.logging, &outputs)?;
    let summary = runner.run()?;
    println!(
        "Tournament complete for '{run_id}': {} games × {} seatings → {} rows at {}",
        summary.games_played,
        summary.permutations,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    println!("Summary table: {}", summary.summary_path.display());
    if let Some(log) = telemetry.as_ref() {
        println!("Telemetry log: {}", log.path.display());
    }

    Ok(())
}
