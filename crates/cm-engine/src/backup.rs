//! Pre-migration backup archives.
//!
//! Before any document is overwritten the chain zips the whole target
//! directory into a timestamped archive in the invocation working
//! directory. The archive holds every entry of the directory tree with
//! paths relative to the target directory, hidden files included: a
//! backup that honored ignore rules would not be a backup.

use std::fs::{self, File};
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::Local;
use ignore::WalkBuilder;
use tracing::debug;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::SnapshotError;

/// Filename prefix of every backup archive.
pub const BACKUP_PREFIX: &str = "migration_backup_";

/// Timestamp layout inside the archive name, second granularity.
const TIMESTAMP_FORMAT: &str = "%Y_%m_%d_%H_%M_%S";

/// Writes zip snapshots of a migration directory.
///
/// # Examples
///
/// ```ignore
/// use cm_engine::Snapshot;
/// use camino::Utf8Path;
///
/// let archive = Snapshot::new().create(Utf8Path::new("./configs"))?;
/// println!("Backup created: {archive}");
/// ```
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Directory the archive file is written into.
    output_dir: Utf8PathBuf,
}

impl Snapshot {
    /// Creates a snapshot writer targeting the invocation working
    /// directory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            output_dir: Utf8PathBuf::from("."),
        }
    }

    /// Overrides the directory the archive is written into.
    #[must_use]
    pub fn with_output_dir(mut self, dir: &Utf8Path) -> Self {
        self.output_dir = dir.to_owned();
        self
    }

    /// Archives the current on-disk state of `dir` and returns the path
    /// of the archive.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] if the directory cannot be walked, a
    /// file cannot be read, or the archive cannot be written. The caller
    /// must not overwrite any original file when this fails.
    pub fn create(&self, dir: &Utf8Path) -> Result<Utf8PathBuf, SnapshotError> {
        let stamp = Local::now().format(TIMESTAMP_FORMAT);
        let archive_path = self.output_dir.join(format!("{BACKUP_PREFIX}{stamp}.zip"));

        let file =
            File::create(archive_path.as_std_path()).map_err(|source| SnapshotError::Io {
                path: archive_path.clone(),
                source,
            })?;
        let mut writer = ZipWriter::new(file);
        let options = SimpleFileOptions::default();

        // standard_filters off: gitignore rules and hidden-file skipping
        // must not thin out a backup.
        let walk = WalkBuilder::new(dir.as_std_path())
            .standard_filters(false)
            .follow_links(false)
            .threads(1)
            .require_git(false)
            .build();

        for result in walk {
            let entry = result.map_err(|source| SnapshotError::Walk {
                path: dir.to_owned(),
                source,
            })?;

            let path = entry.path();
            let utf8 = Utf8Path::from_path(path)
                .ok_or_else(|| SnapshotError::NonUtf8Path(path.to_owned()))?;

            let Ok(relative) = utf8.strip_prefix(dir) else {
                continue;
            };
            if relative.as_str().is_empty() {
                // The walk yields the root directory itself first.
                continue;
            }

            let file_type = entry.file_type();
            if file_type.is_some_and(|ft| ft.is_dir()) {
                writer
                    .add_directory(relative.as_str(), options)
                    .map_err(|source| SnapshotError::Zip {
                        path: archive_path.clone(),
                        source,
                    })?;
                continue;
            }
            if !file_type.is_some_and(|ft| ft.is_file()) {
                continue;
            }

            writer
                .start_file(relative.as_str(), options)
                .map_err(|source| SnapshotError::Zip {
                    path: archive_path.clone(),
                    source,
                })?;

            let bytes = fs::read(utf8.as_std_path()).map_err(|source| SnapshotError::Io {
                path: utf8.to_owned(),
                source,
            })?;
            writer.write_all(&bytes).map_err(|source| SnapshotError::Io {
                path: archive_path.clone(),
                source,
            })?;

            debug!(file = %relative, "Archived");
        }

        writer.finish().map_err(|source| SnapshotError::Zip {
            path: archive_path.clone(),
            source,
        })?;

        debug!(path = %archive_path, "Backup archive written");
        Ok(archive_path)
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new()
    }
}
