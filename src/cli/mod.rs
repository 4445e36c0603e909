//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod catalog;
mod reveal;
mod simulate;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::config::{load_config, LoadedConfig};
use crate::models::SilhouetteStyle;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// rvl - Preview reward-tile reveal animations
#[derive(Parser)]
#[command(name = "rvl")]
#[command(about = "rvl - Chunked reward reveal renderer and grid showcase simulator")]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Backdrop style for a single-image reveal
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StyleArg {
    /// Flat silhouette of the opaque pixels
    Mask,
    /// Darkened greyscale copy of the image
    Image,
}

impl From<StyleArg> for SilhouetteStyle {
    fn from(style: StyleArg) -> Self {
        match style {
            StyleArg::Mask => SilhouetteStyle::Mask,
            StyleArg::Image => SilhouetteStyle::Image,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reveal a single image chunk by chunk and export the animation
    Reveal {
        /// Image to reveal (PNG, JPEG, ...)
        image: PathBuf,

        /// Output file. `.png` writes the fully revealed frame, anything else an animated GIF.
        /// If omitted: {image}_reveal.gif
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Surface side in pixels
        #[arg(long, default_value = "128")]
        size: u32,

        /// Seed for the chunk order (random when omitted)
        #[arg(long)]
        seed: Option<u64>,

        /// Capture a GIF frame every N painted chunks
        #[arg(long, default_value = "16", value_parser = clap::value_parser!(u32).range(1..))]
        every: u32,

        /// Scale output by integer factor (1-16, default: 1)
        #[arg(long, default_value = "1", value_parser = clap::value_parser!(u8).range(1..=16))]
        scale: u8,

        /// Backdrop under the reveal surface
        #[arg(long, value_enum, default_value = "mask")]
        style: StyleArg,
    },

    /// Run the grid showcase on a virtual clock and report each grid's state
    Simulate {
        /// Config file (default: nearest rvl.toml, else built-in defaults)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Container width in pixels
        #[arg(long, default_value = "1000")]
        width: u32,

        /// Virtual time to run, in milliseconds
        #[arg(long, default_value = "5000")]
        duration_ms: u64,

        /// Seed for every random decision (random when omitted)
        #[arg(long)]
        seed: Option<u64>,

        /// Only mount the collection with this id
        #[arg(long)]
        collection: Option<String>,

        /// Record the first mounted grid as an animated GIF
        #[arg(long)]
        gif: Option<PathBuf>,

        /// Virtual milliseconds between recorded frames
        #[arg(long, default_value = "50", value_parser = clap::value_parser!(u64).range(1..))]
        frame_ms: u64,

        /// Print summaries as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the collections that would be shown
    Catalog {
        /// Config file (default: nearest rvl.toml, else built-in defaults)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Load the explicit or discovered config, printing the failure.
pub(crate) fn load_config_or_report(path: Option<&std::path::Path>) -> Result<LoadedConfig, ExitCode> {
    load_config(path).map_err(|e| {
        eprintln!("Error: {}", e);
        ExitCode::from(EXIT_ERROR)
    })
}

/// Print a serializable value as pretty JSON on stdout.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(text) => {
            println!("{}", text);
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: Failed to serialize output: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = crate::logging::init_tracing(cli.verbose) {
        eprintln!("Warning: {}", e);
    }

    match cli.command {
        Commands::Reveal { image, output, size, seed, every, scale, style } => {
            reveal::run_reveal(&image, output.as_deref(), size, seed, every, scale, style.into())
        }
        Commands::Simulate { config, width, duration_ms, seed, collection, gif, frame_ms, json } => {
            simulate::run_simulate(
                config.as_deref(),
                width,
                duration_ms,
                seed,
                collection.as_deref(),
                gif.as_deref(),
                frame_ms,
                json,
            )
        }
        Commands::Catalog { config, json } => catalog::run_catalog(config.as_deref(), json),
    }
}
