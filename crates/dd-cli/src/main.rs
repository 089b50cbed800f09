//! Command-line driver for the Deepdig mining game.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "deepdig",
    about = "Deepdig: dig for ore, meet the daily quota, keep the mine standing",
    version,
    propagate_version = true
)]
struct Cli {
    /// Log game internals to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct MineArgs {
    /// RNG seed for the generated mine (overrides the config file)
    #[arg(short, long)]
    seed: Option<u64>,

    /// JSON file with game constants
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a generated mine
    Generate {
        #[command(flatten)]
        mine: MineArgs,
    },

    /// Summarise what a generated mine contains
    Survey {
        #[command(flatten)]
        mine: MineArgs,
    },

    /// Play, reading one command per line from stdin
    Play {
        #[command(flatten)]
        mine: MineArgs,

        /// Pause between settle steps when the day advances, in milliseconds
        #[arg(long, default_value = "0")]
        delay_ms: u64,

        /// Do not redraw the mine after every command
        #[arg(short, long)]
        quiet: bool,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Generate { mine } => commands::load_config(mine.seed, mine.config.as_deref())
            .and_then(commands::generate::run),
        Commands::Survey { mine } => commands::load_config(mine.seed, mine.config.as_deref())
            .and_then(commands::survey::run),
        Commands::Play {
            mine,
            delay_ms,
            quiet,
        } => commands::load_config(mine.seed, mine.config.as_deref())
            .and_then(|config| commands::play::run(config, delay_ms, quiet)),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
