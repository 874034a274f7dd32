use acc_core::error::AccResult;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use acc_manager::commands;
use acc_manager::commands::run::RunOptions;
use acc_manager::commands::sim::SimOptions;

#[derive(Parser)]
#[command(name = "acc")]
#[command(about = "Adaptive cruise control for an Arduino Uno DC motor rig")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Debug logging (RUST_LOG overrides)
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the control loop on the board over Firmata
    Run {
        /// Configuration file (defaults to the Uno wiring)
        #[arg(short = 'c', long = "config")]
        config: Option<PathBuf>,

        /// Serial port, overrides the config
        #[arg(short = 'p', long = "port")]
        port: Option<String>,

        /// Stop after this many seconds
        #[arg(short = 'd', long = "duration", value_name = "SECS")]
        duration: Option<u64>,

        /// Write one JSON line per iteration to FILE
        #[arg(short = 't', long = "trace", value_name = "FILE")]
        trace: Option<PathBuf>,

        /// Do not print the per-iteration status line
        #[arg(short = 'q', long = "quiet")]
        quiet: bool,
    },

    /// Run a scripted drive on the simulated board
    Sim {
        /// Configuration file (defaults to the Uno wiring)
        #[arg(short = 'c', long = "config")]
        config: Option<PathBuf>,

        /// Scenario file (defaults to the built-in demo)
        #[arg(short = 's', long = "scenario")]
        scenario: Option<PathBuf>,

        /// Sleep through the loop pauses instead of skipping them
        #[arg(short = 'r', long = "realtime")]
        realtime: bool,

        /// Write one JSON line per iteration to FILE
        #[arg(short = 't', long = "trace", value_name = "FILE")]
        trace: Option<PathBuf>,

        /// Do not print the per-iteration status line
        #[arg(short = 'q', long = "quiet")]
        quiet: bool,
    },

    /// List serial ports
    Ports,

    /// Print or write the default configuration
    Config {
        /// Write to FILE instead of stdout
        #[arg(short = 'o', long = "output", value_name = "FILE", conflicts_with = "check")]
        output: Option<PathBuf>,

        /// Validate an existing configuration file
        #[arg(long = "check", value_name = "FILE")]
        check: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run_command(cli.command) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run_command(command: Commands) -> AccResult<()> {
    match command {
        Commands::Run {
            config,
            port,
            duration,
            trace,
            quiet,
        } => commands::run::run_hardware(RunOptions {
            config,
            port,
            duration_secs: duration,
            trace,
            quiet,
        }),

        Commands::Sim {
            config,
            scenario,
            realtime,
            trace,
            quiet,
        } => commands::sim::run_scenario(SimOptions {
            config,
            scenario,
            realtime,
            trace,
            quiet,
        })
        .map(|_| ()),

        Commands::Ports => commands::ports::list_serial_ports(),

        Commands::Config { output, check } => match check {
            Some(path) => commands::config::check(&path),
            None => commands::config::write_default(output.as_deref()),
        },

        Commands::Version => {
            commands::version::print_version_info();
            Ok(())
        }
    }
}
