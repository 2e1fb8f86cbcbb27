//! Error types for the cm-core crate.
//!
//! This module provides the [`DocumentError`] type for failures while
//! loading, inspecting, or persisting a configuration document.

use camino::Utf8PathBuf;

/// Errors that can occur while handling a configuration document.
///
/// Every variant carries the path of the document involved so diagnostics
/// always name the offending file.
///
/// # Examples
///
/// ```
/// use cm_core::DocumentError;
/// use camino::Utf8PathBuf;
///
/// let error = DocumentError::MissingField {
///     path: Utf8PathBuf::from("root.json"),
///     field: "version".to_owned(),
/// };
/// assert!(error.to_string().contains("version"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// The path of the file that couldn't be read.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file contents are not valid JSON.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// The path of the file that couldn't be parsed.
        path: Utf8PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The top-level JSON value is not an object.
    #[error("{0}: top-level value is not a JSON object")]
    NotAnObject(Utf8PathBuf),

    /// A required field is absent from the document.
    #[error("{path}: missing required field '{field}'")]
    MissingField {
        /// The path of the document.
        path: Utf8PathBuf,
        /// The name of the absent field.
        field: String,
    },

    /// A field is present but has the wrong shape.
    #[error("{path}: field '{field}' is not {expected}")]
    ShapeMismatch {
        /// The path of the document.
        path: Utf8PathBuf,
        /// The name of the offending field.
        field: String,
        /// What the field was expected to be.
        expected: &'static str,
    },

    /// The in-memory tree could not be rendered as JSON.
    #[error("failed to serialize {path}: {source}")]
    Serialize {
        /// The path of the document.
        path: Utf8PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The file could not be written back.
    #[error("failed to write {path}: {source}")]
    Write {
        /// The path of the file that couldn't be written.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl DocumentError {
    /// Creates a new [`DocumentError::Read`] error.
    #[inline]
    pub fn read(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`DocumentError::Parse`] error.
    #[inline]
    pub fn parse(path: impl Into<Utf8PathBuf>, source: serde_json::Error) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`DocumentError::MissingField`] error.
    #[inline]
    pub fn missing_field(path: impl Into<Utf8PathBuf>, field: impl Into<String>) -> Self {
        Self::MissingField {
            path: path.into(),
            field: field.into(),
        }
    }

    /// Creates a new [`DocumentError::ShapeMismatch`] error.
    #[inline]
    pub fn shape_mismatch(
        path: impl Into<Utf8PathBuf>,
        field: impl Into<String>,
        expected: &'static str,
    ) -> Self {
        Self::ShapeMismatch {
            path: path.into(),
            field: field.into(),
            expected,
        }
    }

    /// Returns the path of the document this error refers to.
    #[must_use]
    pub fn path(&self) -> &Utf8PathBuf {
        match self {
            Self::Read { path, .. }
            | Self::Parse { path, .. }
            | Self::NotAnObject(path)
            | Self::MissingField { path, .. }
            | Self::ShapeMismatch { path, .. }
            | Self::Serialize { path, .. }
            | Self::Write { path, .. } => path,
        }
    }
}
