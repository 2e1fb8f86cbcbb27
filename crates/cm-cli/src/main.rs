//! CLI entry point for the cm-migration tool.
//!
//! This binary migrates a directory of JSON configuration documents to
//! the newest schema version known to the built-in registry.
//!
//! # Usage
//!
//! ```bash
//! # Migrate a directory in place (backup lands in the working directory)
//! cm-migrate ./configs
//!
//! # Keep backup archives somewhere else
//! cm-migrate ./configs --backup-dir ./backups
//! ```
//!
//! Exit status is 0 on success, including when the directory is already
//! up to date, and 1 on any failure.

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use cm_engine::{ChainEvent, ChainOutcome, MigrationChain, builtin_registry};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Migrates a directory of JSON configuration documents to the newest
/// known schema version.
///
/// The directory must contain a `root.json` document carrying the
/// current version; every other top-level file is migrated alongside it.
/// A zip backup of the pre-migration state is written before any file is
/// overwritten.
#[derive(Parser)]
#[command(name = "cm-migrate", version, about, long_about = None)]
struct Cli {
    /// Directory containing root.json and its sibling documents.
    root_dir: Utf8PathBuf,

    /// Directory backup archives are written into.
    #[arg(long, default_value = ".", env = "CM_MIGRATE_BACKUP_DIR")]
    backup_dir: Utf8PathBuf,

    /// Enable verbose logging (debug level).
    #[arg(short, long)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long)]
    no_color: bool,
}

/// Initializes the tracing subscriber for logging.
///
/// Respects the `RUST_LOG` environment variable if set. Otherwise, uses
/// `debug` level if `--verbose` is set, or `warn` level by default so
/// progress output stays readable.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "warn" };
        EnvFilter::new(level)
    });

    // Colors go away with the flag or the NO_COLOR convention.
    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_ansi(use_ansi))
        .with(filter)
        .init();
}

/// Prints one progress line per chain event.
fn print_event(event: ChainEvent<'_>) {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    match event {
        ChainEvent::Loaded { documents } => {
            let _ = writeln!(handle, "Loaded {documents} configuration documents");
        }
        ChainEvent::StepStarted { target } => {
            let _ = writeln!(handle, "Migrating to {target}");
        }
        ChainEvent::BackupCreated { path } => {
            let _ = writeln!(handle, "Backup created: {path}");
        }
    }
}

/// Application entry point.
fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.no_color);

    let chain = MigrationChain::new(builtin_registry()?).with_backup_dir(&cli.backup_dir);

    match chain.run(&cli.root_dir, print_event) {
        Ok(ChainOutcome::UpToDate { version }) => {
            info!(%version, "No pending migrations");
            println!("Already up to date");
            Ok(())
        }
        Ok(ChainOutcome::Migrated { from, to, steps, .. }) => {
            println!("Files updated ({steps} migration(s), {from} -> {to})");
            Ok(())
        }
        Err(error) => {
            if error.advises_restore() {
                eprintln!("Migration failed, consider restoring from the backup");
            }
            Err(error.into())
        }
    }
}
