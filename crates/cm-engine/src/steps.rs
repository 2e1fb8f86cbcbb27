//! The built-in migration steps.
//!
//! One function per schema change, registered in ascending order by
//! [`builtin_registry`]. Each step assumes the directory sits at the
//! immediately preceding version; the bump precondition in
//! [`MigrationStep::apply`](crate::MigrationStep::apply) enforces that.

use cm_core::Version;
use serde_json::Value;
use tracing::debug;

use crate::error::{MigrateError, StepError};
use crate::loader::DocumentSet;
use crate::registry::{MigrationStep, VersionRegistry};

/// Field every repo document holds its series entries under.
const SERIES_FIELD: &str = "series";

/// Field added to each series entry by the 0.14 migration.
const CC_FIELD: &str = "cc";

/// Builds the registry of every known migration step, oldest first.
///
/// The registry is an explicit value handed to the chain at startup, not
/// process-wide state.
///
/// # Errors
///
/// Returns [`MigrateError::Config`] if the step table is out of order,
/// which would be a programming error in this module.
pub fn builtin_registry() -> Result<VersionRegistry, MigrateError> {
    VersionRegistry::new(vec![
        MigrationStep::structural(
            Version::new([0, 13]),
            Version::new([0, 14]),
            add_series_cc,
        ),
        MigrationStep::bump(Version::new([0, 14]), Version::new([0, 15])),
    ])
}

/// 0.13 → 0.14: every entry of each repo document's `series` array gains
/// an empty `cc` field.
fn add_series_cc(docs: &mut DocumentSet) -> Result<(), StepError> {
    for repo in docs.repos_mut() {
        let path = repo.path().to_owned();
        let series = repo.get_array_mut(SERIES_FIELD)?;

        for entry in series.iter_mut() {
            match entry {
                Value::Object(map) => {
                    map.insert(CC_FIELD.to_owned(), Value::String(String::new()));
                }
                _ => {
                    return Err(StepError::Document(cm_core::DocumentError::shape_mismatch(
                        path,
                        SERIES_FIELD,
                        "an array of objects",
                    )));
                }
            }
        }

        debug!(path = %path, "Added cc field to series entries");
    }
    Ok(())
}
