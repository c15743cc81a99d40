//! Point d'entrée CLI de riverain-pg

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{fmt, EnvFilter};

mod cli;
mod config;
mod error;
mod export;
mod postgres;

use cli::PipelineArgs;

#[derive(Parser)]
#[command(name = "riverain-pg")]
#[command(author, version)]
#[command(about = "Croise une couche d'occupation du sol avec les cours d'eau tamponnés")]
#[command(
    long_about = "Lit deux couches PostGIS (surfaces d'occupation du sol et cours d'eau), \
    applique un tampon aux cours d'eau, croise les deux couches et écrit le résultat \
    dans une table PostGIS et un fichier CSV."
)]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux (warnings et erreurs uniquement)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

/// Charge le fichier .env : répertoire courant, puis répertoire de l'exécutable
fn load_env() {
    if dotenvy::dotenv().is_err() {
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

/// Initialise le logging vers stderr et le fichier de log en mode append
fn init_logging(verbose: u8, quiet: bool, log_file: &Path) -> Result<()> {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Cannot open log file {}", log_file.display()))?;

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr.and(Arc::new(file)))
        .with_ansi(false)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env();

    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet, &cli.pipeline.log_file)?;

    if let Err(e) = cli::cmd_run(&cli.pipeline).await {
        tracing::error!("Pipeline aborted: {}", e);
        return Err(e.into());
    }

    Ok(())
}
