//! MOESI coherence simulator CLI.
//!
//! This binary drives the simulator from the command line. It performs:
//! 1. **Run:** Load a program, run it to a breakpoint, `HALT` or a step budget, and
//!    print registers, coherent memory, cache states and statistics.
//! 2. **Check:** Decode a program and print its canonical disassembly.
//!
//! Logging goes to stderr through `tracing-subscriber`; set `RUST_LOG=moesim_core=trace`
//! to see every bus transaction.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use moesim_core::common::constants::{NUM_REGS, WORDS_PER_LINE};
use moesim_core::config::Config;
use moesim_core::sim::{CacheStateTable, loader};
use moesim_core::stats::{BusTransaction, SimStats};
use moesim_core::Simulator;

#[derive(Parser, Debug)]
#[command(
    name = "moesim",
    author,
    version,
    about = "Multi-agent MOESI cache-coherence simulator",
    long_about = "Run a program on one or more agents sharing memory through MOESI caches.\n\nExamples:\n  moesim run demos/pingpong.s --agents 2 --trace\n  moesim run prog.s --break 4 --steps 100\n  moesim check prog.s"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load and run a program.
    Run(RunArgs),

    /// Decode a program and print its canonical form.
    Check {
        /// Program text file.
        program: PathBuf,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Program text file.
    program: PathBuf,

    /// JSON configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of agents (overrides the configuration).
    #[arg(short, long)]
    agents: Option<usize>,

    /// Breakpoint line (0-based); repeatable.
    #[arg(short, long = "break")]
    breakpoints: Vec<usize>,

    /// Maximum rounds to run; without it, run to a breakpoint or `HALT`.
    #[arg(short, long)]
    steps: Option<u32>,

    /// Print the coherence trace.
    #[arg(short, long)]
    trace: bool,

    /// Print the final state as JSON instead of text.
    #[arg(long)]
    json: bool,
}

/// Final machine state for `--json`.
#[derive(Debug, Serialize)]
struct Report<'a> {
    ok: bool,
    error: Option<String>,
    pcs: Vec<usize>,
    registers: Vec<[u32; NUM_REGS]>,
    memory: Vec<u32>,
    caches: CacheStateTable,
    stats: SimStats,
    trace: Vec<&'a BusTransaction>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run(args) => cmd_run(&args),
        Commands::Check { program } => cmd_check(&program),
    };
    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(msg) => {
            eprintln!("[!] {msg}");
            ExitCode::FAILURE
        }
    }
}

fn read(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("could not read '{}': {e}", path.display()))
}

fn load_config(path: Option<&Path>, agents: Option<usize>) -> Result<Config, String> {
    let mut config = match path {
        Some(p) => Config::from_json(&read(p)?).map_err(|e| e.to_string())?,
        None => Config::default(),
    };
    if let Some(n) = agents {
        config.system.agents = n;
        config.validate().map_err(|e| e.to_string())?;
    }
    Ok(config)
}

fn cmd_check(path: &Path) -> Result<bool, String> {
    let program = loader::load(&read(path)?).map_err(|e| e.to_string())?;
    print!("{}", program.listing());
    Ok(true)
}

fn cmd_run(args: &RunArgs) -> Result<bool, String> {
    let config = load_config(args.config.as_deref(), args.agents)?;
    let mut sim = Simulator::new(config);
    if !sim.set_code_text(&read(&args.program)?) {
        return Err(sim.error_message());
    }
    for &line in &args.breakpoints {
        let _ = sim.add_breakpoint(line);
    }

    let ok = match args.steps {
        Some(n) => sim.run_amount(n),
        None => sim.run_to_break(),
    };

    if args.json {
        let report = Report {
            ok,
            error: sim.last_error().map(ToString::to_string),
            pcs: (0..sim.agents()).filter_map(|a| sim.pc_of(a)).collect(),
            registers: (0..sim.agents()).filter_map(|a| sim.registers_of(a)).collect(),
            memory: sim.memory().to_vec(),
            caches: sim.cache_states(),
            stats: sim.stats(),
            trace: if args.trace { sim.trace().iter().collect() } else { Vec::new() },
        };
        let text = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
        println!("{text}");
        return Ok(ok);
    }

    if !ok {
        eprintln!("[!] {}", sim.error_message());
    }
    print_state(&sim);
    if args.trace {
        println!("COHERENCE TRACE");
        for record in sim.trace() {
            println!("  {record}");
        }
    }
    print!("{}", sim.stats());
    Ok(ok)
}

fn print_state(sim: &Simulator) {
    for agent in 0..sim.agents() {
        let halted = if sim.is_halted(agent) { " (halted)" } else { "" };
        println!(
            "agent{agent} pc={}{halted}",
            sim.pc_of(agent).unwrap_or_default()
        );
        for row in sim.register_dump(agent).unwrap_or_default().lines() {
            println!("  {row}");
        }
    }

    println!("MEMORY (coherent)");
    for (n, line) in sim.memory().chunks(WORDS_PER_LINE).enumerate() {
        let words: Vec<String> = line.iter().map(|w| format!("{w:08x}")).collect();
        println!("  {:#05x}: {}", n * WORDS_PER_LINE * 4, words.join(" "));
    }

    println!("CACHE STATES");
    for (agent, row) in sim.cache_states().0.iter().enumerate() {
        let letters: String = row.iter().map(|s| s.letter()).collect();
        println!("  agent{agent}: {letters}");
    }
}
