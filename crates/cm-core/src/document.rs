//! Loaded configuration documents.
//!
//! This module provides [`ConfigDocument`]: one JSON file held in memory as
//! a mutable top-level object, together with the path it was loaded from.
//! Migration steps edit the tree in place through the typed accessors; the
//! file on disk is only rewritten when [`ConfigDocument::persist`] runs.
//!
//! The accessors replace unchecked field lookups: a missing field or a
//! field of the wrong shape is reported as a [`DocumentError`] naming the
//! document and the field instead of panicking deep inside a step.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::{Map, Value};

use crate::error::DocumentError;

/// The well-known field every document versions itself with.
pub const VERSION_FIELD: &str = "version";

/// A single JSON configuration file: a path plus a mutable top-level object.
///
/// # Examples
///
/// ```ignore
/// use cm_core::ConfigDocument;
/// use camino::Utf8Path;
///
/// let mut doc = ConfigDocument::load(Utf8Path::new("root.json"))?;
/// let version = doc.get_str("version")?.to_owned();
/// doc.set_string("version", "0.14");
/// doc.persist()?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDocument {
    path: Utf8PathBuf,
    content: Map<String, Value>,
}

impl ConfigDocument {
    /// Creates a document from an already-built tree.
    ///
    /// Used by tests and by callers that synthesize documents; files on
    /// disk go through [`ConfigDocument::load`].
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>, content: Map<String, Value>) -> Self {
        Self {
            path: path.into(),
            content,
        }
    }

    /// Loads a document from disk.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Read`] if the file cannot be read,
    /// [`DocumentError::Parse`] if it is not valid JSON, and
    /// [`DocumentError::NotAnObject`] if the top-level value is anything
    /// other than a JSON object.
    pub fn load(path: &Utf8Path) -> Result<Self, DocumentError> {
        let raw = fs::read_to_string(path.as_std_path())
            .map_err(|source| DocumentError::read(path, source))?;

        let value: Value =
            serde_json::from_str(&raw).map_err(|source| DocumentError::parse(path, source))?;

        match value {
            Value::Object(content) => Ok(Self {
                path: path.to_owned(),
                content,
            }),
            _ => Err(DocumentError::NotAnObject(path.to_owned())),
        }
    }

    /// Writes the document back to its path as pretty-printed JSON,
    /// fully overwriting the previous contents.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Serialize`] if the tree cannot be rendered
    /// and [`DocumentError::Write`] if the file cannot be written.
    pub fn persist(&self) -> Result<(), DocumentError> {
        let rendered = serde_json::to_string_pretty(&self.content).map_err(|source| {
            DocumentError::Serialize {
                path: self.path.clone(),
                source,
            }
        })?;

        fs::write(self.path.as_std_path(), rendered).map_err(|source| DocumentError::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// Returns the path this document was loaded from.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Returns the top-level object.
    #[inline]
    #[must_use]
    pub fn content(&self) -> &Map<String, Value> {
        &self.content
    }

    /// Returns the top-level object for in-place mutation.
    #[inline]
    #[must_use]
    pub fn content_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.content
    }

    /// Returns the string value of a top-level field.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::MissingField`] if the field is absent and
    /// [`DocumentError::ShapeMismatch`] if it is not a string.
    pub fn get_str(&self, field: &str) -> Result<&str, DocumentError> {
        match self.content.get(field) {
            Some(Value::String(s)) => Ok(s),
            Some(_) => Err(DocumentError::shape_mismatch(
                self.path.clone(),
                field,
                "a string",
            )),
            None => Err(DocumentError::missing_field(self.path.clone(), field)),
        }
    }

    /// Returns the string value of a top-level field, or `None` if the
    /// field is absent.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::ShapeMismatch`] if the field is present
    /// but not a string.
    pub fn try_get_str(&self, field: &str) -> Result<Option<&str>, DocumentError> {
        match self.content.get(field) {
            Some(Value::String(s)) => Ok(Some(s)),
            Some(_) => Err(DocumentError::shape_mismatch(
                self.path.clone(),
                field,
                "a string",
            )),
            None => Ok(None),
        }
    }

    /// Returns a top-level array field for in-place mutation.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::MissingField`] if the field is absent and
    /// [`DocumentError::ShapeMismatch`] if it is not an array.
    pub fn get_array_mut(&mut self, field: &str) -> Result<&mut Vec<Value>, DocumentError> {
        match self.content.get_mut(field) {
            Some(Value::Array(items)) => Ok(items),
            Some(_) => Err(DocumentError::shape_mismatch(
                self.path.clone(),
                field,
                "an array",
            )),
            None => Err(DocumentError::missing_field(self.path.clone(), field)),
        }
    }

    /// Sets a top-level field to a string value, inserting or replacing it.
    pub fn set_string(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.content
            .insert(field.into(), Value::String(value.into()));
    }
}
