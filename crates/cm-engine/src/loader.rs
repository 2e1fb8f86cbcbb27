//! Directory discovery and the loaded document set.
//!
//! A migration directory holds exactly one root document at the fixed
//! filename [`ROOT_FILE_NAME`] and any number of sibling repo documents.
//! Every non-root *file* in the top level is a repo document, regardless
//! of extension; subdirectories are never documents. The scan is not
//! recursive.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use cm_core::ConfigDocument;
use tracing::debug;

use crate::error::MigrateError;

/// Fixed filename of the root document inside a migration directory.
pub const ROOT_FILE_NAME: &str = "root.json";

/// The full set of documents a migration operates on: the root document
/// plus every repo document found next to it.
///
/// Repo documents are ordered by path so traversal, precondition checks,
/// and write-back are deterministic.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSet {
    root: ConfigDocument,
    repos: Vec<ConfigDocument>,
}

impl DocumentSet {
    /// Builds a set from already-loaded documents.
    #[must_use]
    pub fn new(root: ConfigDocument, repos: Vec<ConfigDocument>) -> Self {
        Self { root, repos }
    }

    /// Loads the root document and every repo document from `dir`.
    ///
    /// Any document failing to load aborts the whole operation: a
    /// directory with an unreadable or malformed file is not migrated at
    /// all.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Config`] if `dir` does not exist or is not
    /// a directory, [`MigrateError::Scan`] if it cannot be listed, and
    /// [`MigrateError::Load`] if any document fails to load.
    pub fn load(dir: &Utf8Path) -> Result<Self, MigrateError> {
        if !dir.exists() {
            return Err(MigrateError::Config(format!(
                "target directory does not exist: {dir}"
            )));
        }
        if !dir.is_dir() {
            return Err(MigrateError::Config(format!(
                "target path is not a directory: {dir}"
            )));
        }

        let root_path = dir.join(ROOT_FILE_NAME);
        let root = ConfigDocument::load(&root_path).map_err(MigrateError::Load)?;

        let entries = fs::read_dir(dir.as_std_path()).map_err(|source| MigrateError::Scan {
            path: dir.to_owned(),
            source,
        })?;

        let mut repos = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| MigrateError::Scan {
                path: dir.to_owned(),
                source,
            })?;

            let path = Utf8PathBuf::try_from(entry.path())
                .map_err(|e| MigrateError::NonUtf8Path(e.into_path_buf()))?;

            if path.file_name() == Some(ROOT_FILE_NAME) {
                continue;
            }

            let file_type = entry.file_type().map_err(|source| MigrateError::Scan {
                path: path.clone(),
                source,
            })?;
            if !file_type.is_file() {
                continue;
            }

            repos.push(ConfigDocument::load(&path).map_err(MigrateError::Load)?);
        }

        // read_dir order is platform-dependent
        repos.sort_by(|a, b| a.path().cmp(b.path()));

        debug!(dir = %dir, repos = repos.len(), "Loaded migration directory");
        Ok(Self { root, repos })
    }

    /// Returns the root document.
    #[inline]
    #[must_use]
    pub fn root(&self) -> &ConfigDocument {
        &self.root
    }

    /// Returns the root document for mutation.
    #[inline]
    #[must_use]
    pub fn root_mut(&mut self) -> &mut ConfigDocument {
        &mut self.root
    }

    /// Returns the repo documents.
    #[inline]
    #[must_use]
    pub fn repos(&self) -> &[ConfigDocument] {
        &self.repos
    }

    /// Returns the repo documents for mutation.
    #[inline]
    #[must_use]
    pub fn repos_mut(&mut self) -> &mut [ConfigDocument] {
        &mut self.repos
    }

    /// Iterates over every document, root first.
    pub fn iter(&self) -> impl Iterator<Item = &ConfigDocument> {
        std::iter::once(&self.root).chain(self.repos.iter())
    }

    /// Iterates mutably over every document, root first.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ConfigDocument> {
        std::iter::once(&mut self.root).chain(self.repos.iter_mut())
    }

    /// Returns the number of documents in the set, root included.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        1 + self.repos.len()
    }

    /// A set always holds at least the root document.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Writes every document back to disk, root first.
    ///
    /// Only called once the whole chain has succeeded and a backup
    /// exists. A failure partway through leaves a mixed directory; the
    /// backup archive is the recovery path in that case.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Persist`] on the first document that fails
    /// to write.
    pub fn persist(&self) -> Result<(), MigrateError> {
        for doc in self.iter() {
            doc.persist().map_err(MigrateError::Persist)?;
            debug!(path = %doc.path(), "Document written");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn utf8(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("temp path should be UTF-8")
    }

    #[test]
    fn test_load_root_and_repos() {
        let dir = TempDir::new().unwrap();
        let root = utf8(&dir);
        fs::write(root.join("root.json"), r#"{"version": "0.13"}"#).unwrap();
        fs::write(root.join("b.json"), r#"{"version": "0.13"}"#).unwrap();
        fs::write(root.join("a.json"), r#"{"version": "0.13"}"#).unwrap();

        let set = DocumentSet::load(&root).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.root().path().file_name(), Some("root.json"));

        // Repos come back ordered by path.
        let names: Vec<_> = set
            .repos()
            .iter()
            .map(|d| d.path().file_name().unwrap())
            .collect();
        assert_eq!(names, ["a.json", "b.json"]);
    }

    #[test]
    fn test_load_treats_any_file_as_repo_document() {
        let dir = TempDir::new().unwrap();
        let root = utf8(&dir);
        fs::write(root.join("root.json"), r#"{"version": "0.13"}"#).unwrap();
        // No extension filter: plain files and dotfiles are documents too.
        fs::write(root.join("notes.txt"), r#"{"version": "0.13"}"#).unwrap();
        fs::write(root.join(".hidden"), r#"{"version": "0.13"}"#).unwrap();

        let set = DocumentSet::load(&root).unwrap();
        assert_eq!(set.repos().len(), 2);
    }

    #[test]
    fn test_load_skips_subdirectories() {
        let dir = TempDir::new().unwrap();
        let root = utf8(&dir);
        fs::write(root.join("root.json"), r#"{"version": "0.13"}"#).unwrap();
        fs::create_dir(root.join("nested")).unwrap();
        fs::write(root.join("nested").join("inner.json"), "{}").unwrap();

        let set = DocumentSet::load(&root).unwrap();
        assert!(set.repos().is_empty());
    }

    #[test]
    fn test_load_missing_root_document() {
        let dir = TempDir::new().unwrap();
        let root = utf8(&dir);
        fs::write(root.join("repo.json"), r#"{"version": "0.13"}"#).unwrap();

        match DocumentSet::load(&root) {
            Err(MigrateError::Load(_)) => {}
            other => panic!("expected Load error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_malformed_repo_aborts() {
        let dir = TempDir::new().unwrap();
        let root = utf8(&dir);
        fs::write(root.join("root.json"), r#"{"version": "0.13"}"#).unwrap();
        fs::write(root.join("repo.json"), "{broken").unwrap();

        assert!(matches!(
            DocumentSet::load(&root),
            Err(MigrateError::Load(_))
        ));
    }

    #[test]
    fn test_load_missing_directory() {
        let dir = TempDir::new().unwrap();
        let missing = utf8(&dir).join("absent");

        assert!(matches!(
            DocumentSet::load(&missing),
            Err(MigrateError::Config(_))
        ));
    }

    #[test]
    fn test_iter_yields_root_first() {
        let dir = TempDir::new().unwrap();
        let root = utf8(&dir);
        fs::write(root.join("root.json"), r#"{"version": "0.13"}"#).unwrap();
        fs::write(root.join("repo.json"), r#"{"version": "0.13"}"#).unwrap();

        let set = DocumentSet::load(&root).unwrap();
        let first = set.iter().next().unwrap();
        assert_eq!(first.path().file_name(), Some("root.json"));
    }
}
