//! APEX cycle-accurate simulator CLI.
//!
//! This binary loads an APEX assembly program, runs it to completion (or for
//! a bounded number of cycles), and prints the final machine state. It
//! performs:
//! 1. **Run:** Execute a program file with the default or a JSON-supplied
//!    configuration.
//! 2. **Display:** Optional per-cycle stage trace (the classic `action == 2`
//!    mode).

use clap::{Parser, Subcommand};
use std::process;

use apex_core::SimConfig;
use apex_core::sim::loader;
use apex_core::sim::simulator::{DisplayMode, Simulator};

#[derive(Parser, Debug)]
#[command(
    name = "apex-sim",
    author,
    version,
    about = "APEX out-of-order cycle-accurate simulator",
    long_about = "Run an APEX assembly program on the out-of-order pipeline model.\n\n\
        Examples:\n  apex-sim run programs/input.asm\n  apex-sim run programs/input.asm --cycles 50 --display\n  apex-sim run programs/input.asm --config cfg.json"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run an assembly program until HALT retires.
    Run {
        /// Program file (APEX assembly text).
        file: String,

        /// Stop after this many cycles even without a HALT.
        #[arg(short, long)]
        cycles: Option<u64>,

        /// Print the cycle banner and stage contents every tick.
        #[arg(short, long)]
        display: bool,

        /// JSON configuration file overriding the default sizes.
        #[arg(long)]
        config: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            file,
            cycles,
            display,
            config,
        } => cmd_run(&file, cycles, display, config.as_deref()),
    }
}

fn cmd_run(file: &str, cycles: Option<u64>, display: bool, config_path: Option<&str>) {
    let config = match config_path {
        Some(path) => match load_config(path) {
            Ok(cfg) => cfg,
            Err(message) => {
                eprintln!("error: {message}");
                process::exit(1);
            }
        },
        None => SimConfig::default(),
    };

    let program = match loader::load_program(file) {
        Ok(program) => program,
        Err(err) => {
            eprintln!("error: {err}");
            process::exit(1);
        }
    };

    tracing::info!(file, "starting simulation");
    let mut sim = Simulator::new(program, &config);
    let mode = if display {
        DisplayMode::PerCycle
    } else {
        DisplayMode::Silent
    };

    match cycles {
        Some(n) => {
            let _ = sim.run_cycles(n, mode);
        }
        None if display => {
            // Unbounded display run: tick until HALT with the per-cycle view.
            while !sim.halted() {
                let _ = sim.run_cycles(1, DisplayMode::PerCycle);
            }
        }
        None => {
            let _ = sim.run();
        }
    }

    print!("{}", sim.state_dump());
    let stats = &sim.machine.stats;
    println!(
        "(apex) >> {} in {} cycles, {} retired, IPC {:.3}",
        if sim.halted() {
            "Simulation Complete"
        } else {
            "Cycle limit reached"
        },
        stats.cycles,
        stats.instructions_retired,
        stats.ipc()
    );

    process::exit(0);
}

fn load_config(path: &str) -> Result<SimConfig, String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("cannot read {path}: {e}"))?;
    serde_json::from_str(&text).map_err(|e| format!("bad configuration {path}: {e}"))
}
