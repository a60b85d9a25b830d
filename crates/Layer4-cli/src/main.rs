//! Linesmith CLI - Main entry point

mod cli;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Linesmith - chained line-oriented text transformations
#[derive(Parser, Debug)]
#[command(name = "linesmith")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Data directory for the chain store (overrides config)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Fail on unknown tools instead of skipping them
    #[arg(long, global = true)]
    strict: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List available tools grouped by category
    Tools {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Evaluate a chain and print its output
    Run {
        /// Chain payload, link, JSON, or @file
        #[arg(short, long)]
        chain: String,

        /// Source text file ("-" for stdin); defaults to the chain's own source
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Print every stage's output and errors
        #[arg(long)]
        stages: bool,

        /// Print the full evaluation result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Convert an exported JSON chain into a link payload
    Encode {
        /// JSON file ("-" for stdin)
        file: PathBuf,
    },
    /// Convert a link payload into exported JSON
    Decode {
        /// Payload or share link
        payload: String,
    },
    /// Save a chain under a name
    Save {
        name: String,

        /// Chain payload, link, JSON, or @file
        #[arg(short, long)]
        chain: String,

        /// Fail if the name already exists
        #[arg(long)]
        create_only: bool,
    },
    /// List saved chains (most recent first)
    List,
    /// Print a saved chain as JSON
    Show { name: String },
    /// Rename a saved chain
    Rename { old: String, new: String },
    /// Delete a saved chain
    Delete { name: String },
    /// Print a share link for a saved chain
    Share { name: String },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let app = cli::App::new(args.data_dir, args.strict);

    match args.command {
        Command::Tools { json } => app.tools(json),
        Command::Run {
            chain,
            source,
            stages,
            json,
        } => app.run(&chain, source.as_deref(), stages, json),
        Command::Encode { file } => app.encode(&file),
        Command::Decode { payload } => app.decode(&payload),
        Command::Save {
            name,
            chain,
            create_only,
        } => app.save(&name, &chain, create_only),
        Command::List => app.list(),
        Command::Show { name } => app.show(&name),
        Command::Rename { old, new } => app.rename(&old, &new),
        Command::Delete { name } => app.delete(&name),
        Command::Share { name } => app.share(&name),
    }
}
