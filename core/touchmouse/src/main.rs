//! touchmouse: turns TUIO cursor line streams into pointer events.
//!
//! ## Subcommands
//!
//! - `run`: replays lines from a file or stdin through the ring channel and
//!   prints pointer events as JSON lines
//! - `compose`: formats one OSC message into a protocol line
//! - `config`: prints the effective configuration

mod logging;
mod output;
mod run;
mod shutdown;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use touch_core::{load_config, GestureMode, TouchConfig};
use tracing::error;

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "touchmouse")]
#[command(about = "TUIO touch to pointer event translator")]
#[command(version)]
struct Cli {
    /// Write logs to a daily-rolled file in this directory instead of stderr
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a line stream and print pointer events
    Run(RunArgs),

    /// Format one OSC message as a protocol line
    Compose {
        /// OSC address, e.g. /tuio/2Dcur
        #[arg(value_name = "PATH")]
        path: String,

        /// OSC type string, one tag per argument (i h f d s S c)
        #[arg(value_name = "TYPES")]
        types: String,

        /// Argument values, in type-string order
        #[arg(value_name = "ARGS", allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Print the effective configuration as TOML
    Config {
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Input file with one protocol line per line; `-` for stdin
    #[arg(long, value_name = "PATH")]
    input: Option<PathBuf>,

    /// Config file (defaults to ~/.touchmouse/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Events)]
    format: OutputFormat,

    /// Overrides gesture.mode from the config file
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Overrides channel.depth from the config file
    #[arg(long, value_name = "N")]
    depth: Option<usize>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Timed,
    Tap,
}

impl From<ModeArg> for GestureMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Timed => GestureMode::Timed,
            ModeArg::Tap => GestureMode::Tap,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let _logging_guard = logging::init(cli.log_dir.as_deref());

    match cli.command {
        Commands::Run(args) => {
            let config = match effective_config(&args) {
                Ok(config) => config,
                Err(err) => {
                    error!(error = %err, "Invalid configuration");
                    std::process::exit(1);
                }
            };
            let options = run::RunOptions {
                input: args.input,
                format: args.format,
                config,
            };
            if let Err(err) = run::run(options) {
                error!(error = %err, "touchmouse run failed");
                std::process::exit(1);
            }
        }
        Commands::Compose { path, types, args } => {
            let values: Vec<&str> = args.iter().map(String::as_str).collect();
            let line = tuio_protocol::parse_args(&types, &values)
                .and_then(|args| tuio_protocol::compose_line(&path, &args));
            match line {
                Ok(line) => println!("{line}"),
                Err(err) => {
                    error!(error = %err, "touchmouse compose failed");
                    std::process::exit(1);
                }
            }
        }
        Commands::Config { config } => match load_config(config.as_deref()) {
            Ok(config) => print!("{}", config.to_toml()),
            Err(err) => {
                error!(error = %err, "Failed to load configuration");
                std::process::exit(1);
            }
        },
    }
}

fn effective_config(args: &RunArgs) -> touch_core::Result<TouchConfig> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(mode) = args.mode {
        config.gesture.mode = mode.into();
    }
    if let Some(depth) = args.depth {
        config.channel.depth = depth;
    }
    config.validate()?;
    Ok(config)
}
