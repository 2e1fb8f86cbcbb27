//! Core document and version types for the cm-migration tool.
//!
//! This crate provides the foundational types used across the workspace:
//!
//! - [`ConfigDocument`]: one JSON configuration file held in memory, with
//!   typed accessors and load/persist operations
//! - [`Version`]: dot-delimited schema versions with component-wise ordering
//! - [`DocumentError`]: failures while reading, inspecting, or writing a
//!   document

#![deny(clippy::all)]
#![warn(missing_docs)]

mod document;
mod error;
mod version;

pub use document::{ConfigDocument, VERSION_FIELD};
pub use error::DocumentError;
pub use version::{ParseVersionError, Version};
