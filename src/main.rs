// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! QubitOS Analog Compiler CLI
//!
//! Compiles analog programs into hardware tasks and inspects configuration.
//!
//! # Usage
//!
//! ```bash
//! # Show the parameters of a program
//! qubit-os-analog params --program program.json
//!
//! # Compile a detuning sweep into discretized Aquila tasks
//! qubit-os-analog compile --program program.json \
//!     --assign omega=15 --batch-assign 'delta=[-10, 0, 10]' --shots 100
//!
//! # Compile for the local emulator
//! qubit-os-analog compile --program program.json --local --arg 3.5
//!
//! # Show the device capabilities used for discretization
//! qubit-os-analog capabilities
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use qubit_os_analog::params::RawValue;
use qubit_os_analog::routine::{compile_local_tasks, compile_tasks};
use qubit_os_analog::{Config, Result, Source, VERSION};

/// QubitOS analog program compiler
#[derive(Parser)]
#[command(name = "qubit-os-analog")]
#[command(author = "QubitOS Contributors")]
#[command(version = VERSION)]
#[command(about = "Parameter binding and code generation for analog quantum programs")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "QUBITOS_ANALOG_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a program into tasks
    Compile {
        /// Program tree as JSON
        #[arg(short, long)]
        program: PathBuf,

        /// Static assignment, NAME=JSON
        #[arg(long = "assign", value_parser = parse_assignment)]
        assignments: Vec<(String, serde_json::Value)>,

        /// Batch assignment, NAME=JSON array
        #[arg(long = "batch-assign", value_parser = parse_assignment)]
        batch_assignments: Vec<(String, serde_json::Value)>,

        /// Names bound by --arg, in order
        #[arg(long, value_delimiter = ',')]
        flatten: Option<Vec<String>>,

        /// Positional value for the next unbound name, as JSON
        #[arg(long = "arg", value_parser = parse_json)]
        args: Vec<serde_json::Value>,

        /// Shots per task
        #[arg(short, long, default_value_t = 100)]
        shots: u32,

        /// Emit emulator tasks instead of discretized hardware tasks
        #[arg(long)]
        local: bool,

        /// Write tasks to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the parameters of a program
    Params {
        /// Program tree as JSON
        #[arg(short, long)]
        program: PathBuf,
    },

    /// Show device capabilities
    Capabilities,

    /// Show effective configuration
    Config,

    /// Validate configuration file
    Validate,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    init_logging(level, &config.logging.format);

    match cli.command {
        Commands::Compile {
            program,
            assignments,
            batch_assignments,
            flatten,
            args,
            shots,
            local,
            output,
        } => {
            config.validate()?;

            let mut source = load_source(&program)?
                .assign(assignments.into_iter().map(|(k, v)| (k, RawValue::from(v))))?
                .batch_assign(batch_assignments.into_iter().map(|(k, v)| (k, RawValue::from(v))))?;
            if let Some(names) = flatten {
                source = source.flatten(names)?;
            }
            let args: Vec<RawValue> = args.into_iter().map(RawValue::from).collect();

            let json = if local {
                let tasks = compile_local_tasks(&source, shots, &args, &config.validation.limits)?;
                let tasks: Vec<_> = tasks.iter().map(|t| t.task_ir()).collect();
                serde_json::to_string_pretty(&tasks)?
            } else {
                let capabilities = config.capabilities()?;
                let tasks = compile_tasks(
                    &source,
                    shots,
                    &args,
                    Some(&capabilities),
                    &config.validation.limits,
                )?;
                serde_json::to_string_pretty(&tasks)?
            };

            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    info!(path = %path.display(), "Wrote compiled tasks");
                }
                None => println!("{}", json),
            }
        }

        Commands::Params { program } => {
            let source = load_source(&program)?;
            println!("Parameters:");
            for (name, kind) in source.spec().iter() {
                let marker = if source.spec().is_recorded(name) {
                    " (recorded)"
                } else {
                    ""
                };
                println!("  {} [{}]{}", name, kind, marker);
            }
            if source.spec().is_empty() {
                println!("  (none)");
            }
            println!("Positional args: {}", source.args().join(", "));
        }

        Commands::Capabilities => {
            println!("{}", serde_yaml::to_string(&config.capabilities()?)?);
        }

        Commands::Config => {
            println!("{}", serde_yaml::to_string(&config)?);
        }

        Commands::Validate => match config.validate() {
            Ok(()) => {
                println!("Configuration is valid");
            }
            Err(e) => {
                eprintln!("Configuration error: {}", e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

/// Initialize logging with tracing.
fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    if format == "json" {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

fn load_source(path: &std::path::Path) -> Result<Source> {
    let json = std::fs::read_to_string(path)?;
    let source = Source::from_json(&json)?;
    info!(
        program = %path.display(),
        params = source.spec().len(),
        parallel = source.circuit().register.is_parallel(),
        "Loaded program"
    );
    Ok(source)
}

fn parse_json(s: &str) -> std::result::Result<serde_json::Value, String> {
    serde_json::from_str(s).map_err(|e| format!("invalid JSON value '{}': {}", s, e))
}

fn parse_assignment(s: &str) -> std::result::Result<(String, serde_json::Value), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
    Ok((name.trim().to_string(), parse_json(value)?))
}
