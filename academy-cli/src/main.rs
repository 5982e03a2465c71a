//! # academy CLI
//!
//! Serves a course with persistent progress tracking, or exports it as a
//! static site that needs no backend.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "academy")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, global = true, default_value = "academy.yml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new course project
    Init {
        /// Target directory (defaults to current directory)
        path: Option<PathBuf>,
    },

    /// Serve the course with progress tracking
    Serve {
        /// Server port (defaults to server.port from the config)
        #[arg(long)]
        port: Option<u16>,

        /// SQLite progress database (defaults to server.database)
        #[arg(long)]
        db: Option<PathBuf>,

        /// Do not reload content when files change
        #[arg(long)]
        no_watch: bool,
    },

    /// Export the whole site as static files
    Export {
        /// Output directory (defaults to paths.output)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
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
        Commands::Init { path } => {
            commands::init_project(path.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Serve { port, db, no_watch } => {
            commands::serve_course(&cli.config, port, db, !no_watch).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Export { out } => {
            let ok = commands::export_site(&cli.config, out).await?;
            Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
    }
}
