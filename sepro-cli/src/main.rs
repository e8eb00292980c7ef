//! # sepro CLI
//!
//! Command-line front-end for the Sepro simulator: compile a model file,
//! initialize a world, run it, and inspect the result.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sepro")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a model for a number of steps
    Run {
        /// Path to the model source file
        model: PathBuf,

        /// Number of steps to run
        #[arg(default_value_t = 10)]
        steps: u64,

        /// World to initialize
        #[arg(long, default_value = "main")]
        world: String,

        /// Fix the shuffle seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,

        /// Print a dump of the final object graph
        #[arg(long)]
        dump: bool,
    },

    /// Parse and compile a model without running it
    Check {
        /// Path to the model source file
        model: PathBuf,

        /// Print a machine-readable summary
        #[arg(long)]
        json: bool,
    },

    /// Run a model and render the final object graph in DOT format
    Dot {
        /// Path to the model source file
        model: PathBuf,

        /// Number of steps to run
        #[arg(default_value_t = 10)]
        steps: u64,

        /// World to initialize
        #[arg(long, default_value = "main")]
        world: String,

        /// Fix the shuffle seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run {
            model,
            steps,
            world,
            seed,
            dump,
        } => commands::run_model(&model, steps, &world, seed, dump),
        Commands::Check { model, json } => commands::check_model(&model, json),
        Commands::Dot {
            model,
            steps,
            world,
            seed,
            output,
        } => commands::render_dot(&model, steps, &world, seed, output.as_deref()),
    }
}
