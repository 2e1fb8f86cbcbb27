//! Error types for the cm-engine crate.
//!
//! Three enums cover the engine's failure surface:
//!
//! - [`StepError`]: a single migration step refusing to run or failing
//! - [`SnapshotError`]: the backup archive could not be created
//! - [`MigrateError`]: everything the chain can abort with, wrapping the
//!   two above plus load, detection, and persist failures
//!
//! Every error is fatal to the run. The only path where the directory may
//! be left in a mixed state is [`MigrateError::Persist`], which is the one
//! variant where [`MigrateError::advises_restore`] returns `true`.

use camino::Utf8PathBuf;
use cm_core::{DocumentError, ParseVersionError, Version};

/// Errors produced by a single migration step.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    /// A document's version field does not match the version this step
    /// migrates from.
    ///
    /// Guards against applying a step to a partially migrated directory;
    /// the step mutates nothing when this is returned.
    #[error("{path}: version is '{found}', expected '{expected}'")]
    VersionMismatch {
        /// The document whose version differed.
        path: Utf8PathBuf,
        /// The version value found in the document.
        found: String,
        /// The version the step expected to migrate from.
        expected: String,
    },

    /// A document is missing a field the step needs, or the field has the
    /// wrong shape.
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Errors produced while creating the backup archive.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// Failed to walk the target directory.
    #[error("failed to walk {path}: {source}")]
    Walk {
        /// The directory being archived.
        path: Utf8PathBuf,
        /// The underlying walker error.
        #[source]
        source: ignore::Error,
    },

    /// An I/O error while reading a file into the archive or creating the
    /// archive file itself.
    #[error("I/O error while archiving {path}: {source}")]
    Io {
        /// The file involved.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The zip writer rejected an entry or failed to finish the archive.
    #[error("failed to write archive {path}: {source}")]
    Zip {
        /// The archive being written.
        path: Utf8PathBuf,
        /// The underlying zip error.
        #[source]
        source: zip::result::ZipError,
    },

    /// A path inside the target directory is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", _0.display())]
    NonUtf8Path(std::path::PathBuf),
}

/// Errors that abort a migration run.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// The target directory is missing, not a directory, or otherwise
    /// unusable.
    #[error("invalid target directory: {0}")]
    Config(String),

    /// The target directory could not be listed.
    #[error("failed to scan directory {path}: {source}")]
    Scan {
        /// The directory being scanned.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A directory entry is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", _0.display())]
    NonUtf8Path(std::path::PathBuf),

    /// A document could not be read or parsed.
    #[error("failed to load configuration documents: {0}")]
    Load(#[source] DocumentError),

    /// The root document's version field is absent or not a string.
    #[error("failed to detect current version: {0}")]
    Detect(#[source] DocumentError),

    /// The root document's version field does not parse as a version.
    #[error("failed to detect current version: '{value}' in {path}: {source}")]
    VersionMalformed {
        /// The root document.
        path: Utf8PathBuf,
        /// The raw value of the version field.
        value: String,
        /// The underlying parse error.
        #[source]
        source: ParseVersionError,
    },

    /// A migration step failed; no documents have been written to disk.
    #[error("migration to {target} failed: {source}")]
    Step {
        /// The version the failing step was migrating to.
        target: Version,
        /// The underlying step error.
        #[source]
        source: StepError,
    },

    /// The backup archive could not be created; nothing has been written.
    #[error("failed to create backup: {0}")]
    Snapshot(#[source] SnapshotError),

    /// A document could not be written back after the backup was created.
    ///
    /// Some documents may already carry the new content; the backup
    /// archive is the recovery path.
    #[error("failed to write migrated documents: {0}")]
    Persist(#[source] DocumentError),
}

impl MigrateError {
    /// Returns `true` when the directory may hold a mix of migrated and
    /// unmigrated documents and the driver should advise restoring from
    /// the backup archive.
    #[inline]
    #[must_use]
    pub const fn advises_restore(&self) -> bool {
        matches!(self, Self::Persist(_))
    }
}
