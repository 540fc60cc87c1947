//! Folio CLI - Mirror a remote folder of slides and documents into a searchable store

mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Folio - Searchable text from a remote folder of slides and documents
#[derive(Parser)]
#[command(name = "folio")]
#[command(author = "Lalo Morales <lalomorales22@github.com>")]
#[command(version)]
#[command(about = "Searchable text from a remote folder of slides and documents", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of the default one
    #[arg(short, long, global = true, env = "FOLIO_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize Folio (create config and database)
    Init,

    /// Poll the remote folder until interrupted
    Watch {
        /// Seconds between polls (default: from config)
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Run a single poll cycle and print what happened
    Poll {
        /// Print the cycle report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List stored files
    List {
        /// Show archived files instead of active ones
        #[arg(short, long)]
        archived: bool,
    },

    /// Show a stored file and all of its text
    Show {
        /// File ID
        id: String,
    },

    /// Search stored text
    Search {
        /// Search query
        query: String,
    },

    /// Hide a file from listings and search
    Archive {
        /// File ID
        id: String,
    },

    /// Make an archived file active again
    Restore {
        /// File ID
        id: String,
    },

    /// Delete a file and its text from the store
    Delete {
        /// File ID
        id: String,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Show store statistics
    Stats,

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Print the config file path
    Path,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("folio=debug,info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("folio=info,warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Init => commands::init::run(config),
        Commands::Watch { interval } => commands::watch::run(config, interval),
        Commands::Poll { json } => commands::poll::run(config, json),
        Commands::List { archived } => commands::list::run(config, archived),
        Commands::Show { id } => commands::show::run(config, &id),
        Commands::Search { query } => commands::search::run(config, &query),
        Commands::Archive { id } => commands::status::archive(config, &id),
        Commands::Restore { id } => commands::status::restore(config, &id),
        Commands::Delete { id, yes } => commands::status::delete(config, &id, yes),
        Commands::Stats => commands::stats::run(config),
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show => commands::config::show(config),
            ConfigCommands::Path => commands::config::path(config),
        },
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
