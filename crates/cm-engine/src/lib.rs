//! Migration chain engine for JSON configuration directories.
//!
//! This crate is the core of the cm-migration tool. It walks a directory
//! holding one root document (`root.json`) and any number of sibling repo
//! documents, detects their shared schema version, and applies the
//! pending suffix of a fixed, ordered registry of migration steps before
//! committing the result with a backup-then-write sequence.
//!
//! # Overview
//!
//! The main entry point is [`MigrationChain`], which combines:
//!
//! - [`DocumentSet`]: the loaded root + repo documents
//! - [`VersionRegistry`]: the ordered table of [`MigrationStep`] values
//! - [`Snapshot`]: the pre-migration zip archive writer
//!
//! # Example
//!
//! ```ignore
//! use cm_engine::{ChainEvent, ChainOutcome, MigrationChain, builtin_registry};
//! use camino::Utf8Path;
//!
//! let chain = MigrationChain::new(builtin_registry()?);
//! match chain.run(Utf8Path::new("./configs"), |event| {
//!     if let ChainEvent::StepStarted { target } = event {
//!         println!("Migrating to {target}");
//!     }
//! })? {
//!     ChainOutcome::UpToDate { .. } => println!("Already up to date"),
//!     ChainOutcome::Migrated { to, .. } => println!("Now at {to}"),
//! }
//! ```
//!
//! # Failure model
//!
//! Every error aborts the run. Steps mutate documents in memory only;
//! the directory on disk is untouched until the commit phase, which
//! writes the backup archive first and only then rewrites the documents.
//! A write failure after the backup is the single mixed-state outcome,
//! and [`MigrateError::advises_restore`] marks it for the driver.

#![deny(clippy::all)]
#![warn(missing_docs)]

mod backup;
mod chain;
mod error;
mod loader;
mod registry;
mod steps;

pub use backup::{BACKUP_PREFIX, Snapshot};
pub use chain::{ChainEvent, ChainOutcome, MigrationChain, detect_version};
pub use error::{MigrateError, SnapshotError, StepError};
pub use loader::{DocumentSet, ROOT_FILE_NAME};
pub use registry::{MigrationStep, StepKind, Transform, VersionRegistry};
pub use steps::builtin_registry;
