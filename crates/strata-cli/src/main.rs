//! strata CLI
//!
//! Command-line interface for the strata configuration composer

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use strata_core::init_tracing;
use tracing::error;

#[derive(Parser)]
#[command(name = "strata")]
#[command(about = "Compose layered lint configuration into per-path effective rule tables")]
#[command(version = strata_core::VERSION)]
#[command(
    long_about = "strata resolves an ordered list of configuration layers (static tables\n\
and factory-produced bundles) into one effective rule table per file path,\n\
with the compatibility layer always merged last.\n\
\n\
Examples:\n  \
strata check                       # Validate and compose strata.json\n  \
strata layers                      # Print the resolved layer order\n  \
strata show frontend/app.ts        # Effective rules for a path\n  \
strata bundle --release            # Entry/target record for the bundler"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the composition declaration file
    #[arg(
        short,
        long,
        global = true,
        default_value = "strata.json",
        help = "Declaration file (strata.json or strata.toml)"
    )]
    config: PathBuf,

    /// Verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the declaration file and run a full composition
    Check,

    /// Print the resolved layer list in merge order
    Layers,

    /// Print the effective rule table for one or more paths
    Show {
        /// File paths to query
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Print the entry/target record forwarded to the bundler
    Bundle {
        /// Build for release (minified) instead of watch mode
        #[arg(long)]
        release: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => "strata=error",
        1 => "strata=warn",
        2 => "strata=info",
        3 => "strata=debug",
        _ => "strata=trace",
    };
    unsafe {
        std::env::set_var("RUST_LOG", log_level);
    }
    init_tracing();

    match run_command(cli).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("strata failed: {e}");
            std::process::exit(1);
        }
    }
}

async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Check => commands::check(&cli.config).await,
        Commands::Layers => commands::layers(&cli.config).await,
        Commands::Show { paths } => commands::show(&cli.config, &paths).await,
        Commands::Bundle { release } => commands::bundle(&cli.config, release),
    }
}
