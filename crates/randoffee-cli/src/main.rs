use std::path::PathBuf;

use clap::{Parser, Subcommand};
use randoffee_core::{CoreError, GenerateError, ValidationError};

mod commands;
mod email;
mod logger;

use commands::Workspace;

#[derive(Parser)]
#[command(name = "randoffee", version, about = "Randomised coffee chat groups")]
struct Cli {
    /// Folder holding the roster, history and randoffee.toml
    #[arg(long, global = true, default_value = ".")]
    dir: PathBuf,

    /// Show debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the groups for a new round
    Generate(commands::generate::GenerateArgs),
    /// Accept the last generated grouping
    Accept(commands::accept::AcceptArgs),
    /// Compare two rounds
    Compare(commands::compare::CompareArgs),
    /// List stored rounds
    History,
    /// How often each person has led a group
    Leaders,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let dir = cli.dir;
    // config commands read randoffee.toml themselves; reset must not need a valid one
    let open = || Workspace::open(&dir);
    match cli.command {
        Commands::Generate(args) => commands::generate::run(args, &open()?),
        Commands::Accept(args) => commands::accept::run(args, &open()?),
        Commands::Compare(args) => commands::compare::run(args, &open()?),
        Commands::History => commands::history::run(&open()?),
        Commands::Leaders => commands::leaders::run(&open()?),
        Commands::Config { action } => commands::config::run(action, &dir),
    }
}

/// Validation problems exit with 2, an exhausted attempt budget with 3.
fn exit_code(err: &(dyn std::error::Error + 'static)) -> i32 {
    if let Some(err) = err.downcast_ref::<GenerateError>() {
        return match err {
            GenerateError::Validation(_) => 2,
            GenerateError::NoveltyExhausted { .. } => 3,
        };
    }
    if err.is::<ValidationError>() {
        return 2;
    }
    match err.downcast_ref::<CoreError>() {
        Some(CoreError::Validation(_)) => 2,
        Some(CoreError::Generate(GenerateError::Validation(_))) => 2,
        Some(CoreError::Generate(GenerateError::NoveltyExhausted { .. })) => 3,
        _ => 1,
    }
}

fn main() {
    let cli = Cli::parse();
    logger::init_cli_logger(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(exit_code(&*e));
    }
}
