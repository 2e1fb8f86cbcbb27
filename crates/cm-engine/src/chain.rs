//! The migration chain orchestrator.
//!
//! [`MigrationChain`] drives one run over a target directory: load the
//! document set, detect the current version from the root document,
//! select the pending suffix of the registry, apply it step by step, and
//! commit by backing the directory up and rewriting every document.
//!
//! Progress surfaces through [`ChainEvent`] values handed to a caller
//! callback, so the driver can print per-step lines without the engine
//! owning any console output.
//!
//! Failure semantics: every step applies in memory only; nothing touches
//! disk until the whole chain has succeeded and the backup archive
//! exists. The one partial-state outcome is a write failure after the
//! backup, reported as [`MigrateError::Persist`].

use camino::{Utf8Path, Utf8PathBuf};
use cm_core::{ConfigDocument, VERSION_FIELD, Version};
use tracing::{debug, info};

use crate::backup::Snapshot;
use crate::error::MigrateError;
use crate::loader::DocumentSet;
use crate::registry::VersionRegistry;

/// Progress notification emitted while the chain advances.
#[derive(Debug)]
pub enum ChainEvent<'a> {
    /// The document set has been loaded.
    Loaded {
        /// Number of documents, root included.
        documents: usize,
    },

    /// A migration step is about to run.
    StepStarted {
        /// The version the step migrates to.
        target: &'a Version,
    },

    /// The backup archive has been written; write-back follows.
    BackupCreated {
        /// Path of the archive.
        path: &'a Utf8Path,
    },
}

/// Terminal outcome of a successful chain run.
#[derive(Debug)]
pub enum ChainOutcome {
    /// No pending steps: the directory already sits at the newest known
    /// version. Nothing was backed up or written.
    UpToDate {
        /// The detected version.
        version: Version,
    },

    /// Every pending step applied and every document was rewritten.
    Migrated {
        /// The version detected before migrating.
        from: Version,
        /// The version the directory now sits at.
        to: Version,
        /// How many steps ran.
        steps: usize,
        /// Path of the backup archive written before the rewrite.
        backup: Utf8PathBuf,
    },
}

/// Reads the current schema version from the root document.
///
/// # Errors
///
/// Returns [`MigrateError::Detect`] if the `version` field is absent or
/// not a string — there is no implicit default version — and
/// [`MigrateError::VersionMalformed`] if it does not parse as
/// dot-separated integers.
pub fn detect_version(root: &ConfigDocument) -> Result<Version, MigrateError> {
    let raw = root
        .try_get_str(VERSION_FIELD)
        .map_err(MigrateError::Detect)?
        .ok_or_else(|| {
            MigrateError::Detect(cm_core::DocumentError::missing_field(
                root.path().to_owned(),
                VERSION_FIELD,
            ))
        })?;

    raw.parse().map_err(|source| MigrateError::VersionMalformed {
        path: root.path().to_owned(),
        value: raw.to_owned(),
        source,
    })
}

/// Orchestrates one migration run over a directory.
///
/// # Examples
///
/// ```ignore
/// use cm_engine::{MigrationChain, builtin_registry};
/// use camino::Utf8Path;
///
/// let chain = MigrationChain::new(builtin_registry()?);
/// let outcome = chain.run(Utf8Path::new("./configs"), |event| {
///     println!("{event:?}");
/// })?;
/// ```
#[derive(Debug)]
pub struct MigrationChain {
    registry: VersionRegistry,
    snapshot: Snapshot,
}

impl MigrationChain {
    /// Creates a chain over the given registry, writing backups to the
    /// invocation working directory.
    #[must_use]
    pub fn new(registry: VersionRegistry) -> Self {
        Self {
            registry,
            snapshot: Snapshot::new(),
        }
    }

    /// Overrides the directory backup archives are written into.
    #[must_use]
    pub fn with_backup_dir(mut self, dir: &Utf8Path) -> Self {
        self.snapshot = Snapshot::new().with_output_dir(dir);
        self
    }

    /// Runs the full chain against `dir`.
    ///
    /// Steps apply strictly in ascending target-version order, one at a
    /// time; no reordering and no skipping. The first failure aborts the
    /// run with nothing written to disk. Only after every step has
    /// succeeded does the commit phase create the backup archive and
    /// rewrite the documents.
    ///
    /// # Errors
    ///
    /// See [`MigrateError`]; only [`MigrateError::Persist`] can leave the
    /// directory in a mixed state.
    pub fn run(
        &self,
        dir: &Utf8Path,
        mut notify: impl FnMut(ChainEvent<'_>),
    ) -> Result<ChainOutcome, MigrateError> {
        let mut docs = DocumentSet::load(dir)?;
        notify(ChainEvent::Loaded {
            documents: docs.len(),
        });

        let current = detect_version(docs.root())?;
        debug!(version = %current, "Detected directory version");

        let pending = self.registry.pending_steps(&current);
        if pending.is_empty() {
            info!(version = %current, "Already up to date");
            return Ok(ChainOutcome::UpToDate { version: current });
        }

        let final_version = pending
            .last()
            .map_or_else(|| current.clone(), |step| step.target().clone());

        for step in pending {
            notify(ChainEvent::StepStarted {
                target: step.target(),
            });
            info!(from = %step.expects(), to = %step.target(), "Applying migration step");

            step.apply(&mut docs).map_err(|source| MigrateError::Step {
                target: step.target().clone(),
                source,
            })?;
        }

        // Commit: snapshot the pre-migration on-disk state, then rewrite.
        // Originals are never overwritten without a backup existing.
        let backup = self
            .snapshot
            .create(dir)
            .map_err(MigrateError::Snapshot)?;
        notify(ChainEvent::BackupCreated { path: &backup });
        info!(path = %backup, "Backup created");

        docs.persist()?;
        info!(from = %current, to = %final_version, documents = docs.len(), "Migration complete");

        Ok(ChainOutcome::Migrated {
            from: current,
            to: final_version,
            steps: pending.len(),
            backup,
        })
    }
}
