//! CLI surface for the uncertain top-k closed-itemset miner: `mine` runs a
//! single configuration against a file, `experiment`/`benchmark` are thin
//! sweep harnesses over the same library entry point. See `SPEC_FULL.md`
//! §4.11. This binary is deliberately outside the mining core: none of its
//! subcommands duplicate `MiningEngine` logic, they only call it in a loop.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use uncertain_topk::config::{CalculatorKind, MiningConfig};
use uncertain_topk::ingest::parse_database;
use uncertain_topk::{mine, Pattern};

#[derive(Parser)]
#[command(name = "uncertain-topk", about = "Top-k closed frequent-itemset mining over uncertain transaction databases")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Mine a single file once and print the top-k closed patterns.
    Mine {
        file: PathBuf,
        #[arg(long, default_value_t = 2)]
        minsup: u32,
        #[arg(long, default_value_t = 0.7)]
        tau: f64,
        #[arg(long, default_value_t = 5)]
        k: usize,
        #[arg(long, value_enum, default_value = "poly-dp")]
        calculator: CalculatorKind,
        /// Print results as JSON instead of a human-readable table.
        #[arg(long)]
        json: bool,
    },
    /// Sweep a grid of (minsup, tau, k) configurations over one file,
    /// reporting wall-clock and pattern counts per run.
    Experiment {
        file: PathBuf,
        #[arg(long, value_delimiter = ',', default_value = "1,2,4")]
        minsup: Vec<u32>,
        #[arg(long, value_delimiter = ',', default_value = "0.5,0.7,0.9")]
        tau: Vec<f64>,
        #[arg(long, value_delimiter = ',', default_value = "5,10")]
        k: Vec<usize>,
    },
    /// Sweep every input file in a directory against a single configuration,
    /// reporting wall-clock per file.
    Benchmark {
        dir: PathBuf,
        #[arg(long, default_value_t = 2)]
        minsup: u32,
        #[arg(long, default_value_t = 0.7)]
        tau: f64,
        #[arg(long, default_value_t = 5)]
        k: usize,
        #[arg(long, value_enum, default_value = "poly-dp")]
        calculator: CalculatorKind,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "run failed");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Mine {
            file,
            minsup,
            tau,
            k,
            calculator,
            json,
        } => run_mine(&file, minsup, tau, k, calculator, json),
        Command::Experiment { file, minsup, tau, k } => run_experiment(&file, &minsup, &tau, &k),
        Command::Benchmark {
            dir,
            minsup,
            tau,
            k,
            calculator,
        } => run_benchmark(&dir, minsup, tau, k, calculator),
    }
}

fn run_mine(
    file: &PathBuf,
    minsup: u32,
    tau: f64,
    k: usize,
    calculator: CalculatorKind,
    json: bool,
) -> anyhow::Result<()> {
    let text = fs::read_to_string(file)?;
    let db = parse_database(&text)?;
    let config = MiningConfig::new(minsup, tau, k, calculator)?;
    let patterns = mine(&db, config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&patterns)?);
    } else {
        print_table(&db, &patterns);
    }
    Ok(())
}

fn print_table(db: &uncertain_topk::UncertainDatabase, patterns: &[Pattern]) {
    println!("{:<40} {:>8} {:>12}", "itemset", "support", "probability");
    for pattern in patterns {
        let names: Vec<&str> = pattern
            .itemset
            .iter()
            .map(|id| db.vocabulary().name(id))
            .collect();
        println!(
            "{:<40} {:>8} {:>12.6}",
            format!("{{{}}}", names.join(", ")),
            pattern.support,
            pattern.probability
        );
    }
}

fn run_experiment(file: &PathBuf, minsup_grid: &[u32], tau_grid: &[f64], k_grid: &[usize]) -> anyhow::Result<()> {
    let text = fs::read_to_string(file)?;
    let db = parse_database(&text)?;

    println!(
        "{:>8} {:>6} {:>4} {:>10} {:>10}",
        "minsup", "tau", "k", "patterns", "elapsed_ms"
    );
    for &minsup in minsup_grid {
        for &tau in tau_grid {
            for &k in k_grid {
                let config = MiningConfig::new(minsup, tau, k, CalculatorKind::PolyDp)?;
                let start = Instant::now();
                let patterns = mine(&db, config)?;
                let elapsed = start.elapsed();
                println!(
                    "{:>8} {:>6.2} {:>4} {:>10} {:>10}",
                    minsup,
                    tau,
                    k,
                    patterns.len(),
                    elapsed.as_millis()
                );
            }
        }
    }
    Ok(())
}

fn run_benchmark(
    dir: &PathBuf,
    minsup: u32,
    tau: f64,
    k: usize,
    calculator: CalculatorKind,
) -> anyhow::Result<()> {
    let config = MiningConfig::new(minsup, tau, k, calculator)?;
    println!("{:<32} {:>10} {:>10}", "file", "patterns", "elapsed_ms");
    let mut entries: Vec<_> = fs::read_dir(dir)?.collect::<Result<_, _>>()?;
    entries.sort_by_key(|e| e.path());
    for entry in entries {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let text = fs::read_to_string(&path)?;
        let db = parse_database(&text)?;
        let start = Instant::now();
        let patterns = mine(&db, config)?;
        let elapsed = start.elapsed();
        println!(
            "{:<32} {:>10} {:>10}",
            path.file_name().and_then(|n| n.to_str()).unwrap_or("?"),
            patterns.len(),
            elapsed.as_millis()
        );
    }
    Ok(())
}
