//! Plexus CLI - schedule, size and check dataflow patches.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "plexus")]
#[command(author, version, about = "Plexus dataflow scheduler CLI", long_about = None)]
struct Cli {
    /// Log scheduler progress (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute execution order and register assignment for a patch
    Schedule(commands::schedule::ScheduleArgs),

    /// Report the smallest pool size per data type
    Plan(commands::plan::PlanArgs),

    /// Validate a patch and scheduler config
    Check(commands::check::CheckArgs),
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Schedule(args) => commands::schedule::run(args),
        Commands::Plan(args) => commands::plan::run(args),
        Commands::Check(args) => commands::check::run(args),
    }
}
