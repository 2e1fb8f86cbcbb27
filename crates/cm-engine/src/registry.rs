//! Migration steps and the ordered version registry.
//!
//! A [`MigrationStep`] carries the version it migrates from, the version
//! it produces, and one of two kinds: a bare version bump, or a bump plus
//! a content transformation over the whole document set. The
//! [`VersionRegistry`] holds the steps sorted ascending by target version
//! and answers the one question the chain asks: which steps are still
//! pending for a given current version.

use cm_core::{ConfigDocument, VERSION_FIELD, Version};
use tracing::debug;

use crate::error::{MigrateError, StepError};
use crate::loader::DocumentSet;

/// A content transformation applied by a structural step after its
/// version-bump precondition has passed.
pub type Transform = fn(&mut DocumentSet) -> Result<(), StepError>;

/// What a migration step does beyond rewriting the version field.
#[derive(Debug, Clone, Copy)]
pub enum StepKind {
    /// Rewrites the version field only.
    BumpOnly,

    /// Rewrites the version field, then transforms document content.
    Structural(Transform),
}

/// One migration step: an immutable (expected version, target version,
/// kind) triple.
///
/// Applying a step either fully succeeds or fails without exposing any
/// partial-success granularity to the orchestrator.
#[derive(Debug, Clone)]
pub struct MigrationStep {
    expects: Version,
    target: Version,
    kind: StepKind,
}

impl MigrationStep {
    /// Creates a version-bump-only step.
    #[must_use]
    pub fn bump(expects: Version, target: Version) -> Self {
        Self {
            expects,
            target,
            kind: StepKind::BumpOnly,
        }
    }

    /// Creates a structural step: version bump plus content transform.
    #[must_use]
    pub fn structural(expects: Version, target: Version, transform: Transform) -> Self {
        Self {
            expects,
            target,
            kind: StepKind::Structural(transform),
        }
    }

    /// The version this step migrates from.
    #[inline]
    #[must_use]
    pub fn expects(&self) -> &Version {
        &self.expects
    }

    /// The version this step produces.
    #[inline]
    #[must_use]
    pub fn target(&self) -> &Version {
        &self.target
    }

    /// Applies this step to the document set, mutating it in place.
    ///
    /// The version bump runs first: every document's `version` field must
    /// equal exactly the expected old value, checked across the whole set
    /// before anything is written, so a mismatch mutates nothing. Only
    /// after the bump succeeds does a structural step run its content
    /// transform.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::VersionMismatch`] if any document is not at
    /// the expected version, or whatever the content transform reports.
    pub fn apply(&self, docs: &mut DocumentSet) -> Result<(), StepError> {
        self.bump_versions(docs)?;

        if let StepKind::Structural(transform) = self.kind {
            transform(docs)?;
        }

        Ok(())
    }

    /// Checks every document is at the expected version, then rewrites
    /// the version field across the whole set.
    fn bump_versions(&self, docs: &mut DocumentSet) -> Result<(), StepError> {
        let expected = self.expects.to_string();
        for doc in docs.iter() {
            check_version(doc, &expected)?;
        }

        let next = self.target.to_string();
        for doc in docs.iter_mut() {
            doc.set_string(VERSION_FIELD, next.clone());
        }

        debug!(from = %self.expects, to = %self.target, "Version field rewritten");
        Ok(())
    }
}

/// Compares a document's raw version string against the expected value.
///
/// The comparison is string-exact: `"0.013"` does not satisfy an expected
/// `0.13`.
fn check_version(doc: &ConfigDocument, expected: &str) -> Result<(), StepError> {
    let found = doc.get_str(VERSION_FIELD)?;
    if found != expected {
        return Err(StepError::VersionMismatch {
            path: doc.path().to_owned(),
            found: found.to_owned(),
            expected: expected.to_owned(),
        });
    }
    Ok(())
}

/// The ordered table of migration steps, fixed at build time.
///
/// Constructed once and passed explicitly into the chain orchestrator;
/// there is no process-wide registry.
///
/// # Examples
///
/// ```
/// use cm_engine::{MigrationStep, VersionRegistry};
/// use cm_core::Version;
///
/// let registry = VersionRegistry::new(vec![
///     MigrationStep::bump(Version::new([0, 13]), Version::new([0, 14])),
///     MigrationStep::bump(Version::new([0, 14]), Version::new([0, 15])),
/// ])
/// .unwrap();
///
/// let pending = registry.pending_steps(&Version::new([0, 13]));
/// assert_eq!(pending.len(), 2);
///
/// let pending = registry.pending_steps(&Version::new([0, 15]));
/// assert!(pending.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct VersionRegistry {
    steps: Vec<MigrationStep>,
}

impl VersionRegistry {
    /// Builds a registry from steps sorted ascending by target version.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Config`] if the target versions are not
    /// strictly increasing; pending-step lookup relies on that order.
    pub fn new(steps: Vec<MigrationStep>) -> Result<Self, MigrateError> {
        for pair in steps.windows(2) {
            if pair[0].target() >= pair[1].target() {
                return Err(MigrateError::Config(format!(
                    "registry steps are not strictly ascending: {} then {}",
                    pair[0].target(),
                    pair[1].target()
                )));
            }
        }
        Ok(Self { steps })
    }

    /// Returns every step whose target version is strictly greater than
    /// `current`, in registry (ascending) order.
    ///
    /// Because the registry is sorted this is a suffix slice; it is
    /// correct even when `current` is not a version the registry knows.
    #[must_use]
    pub fn pending_steps(&self, current: &Version) -> &[MigrationStep] {
        match self.steps.iter().position(|step| step.target() > current) {
            Some(first_pending) => &self.steps[first_pending..],
            None => &[],
        }
    }

    /// The newest version this registry can produce, if it has any steps.
    #[must_use]
    pub fn latest(&self) -> Option<&Version> {
        self.steps.last().map(MigrationStep::target)
    }

    /// Returns the number of registered steps.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if the registry has no steps.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use serde_json::{Value, json};

    fn doc(name: &str, value: Value) -> ConfigDocument {
        match value {
            Value::Object(map) => ConfigDocument::new(Utf8PathBuf::from(name), map),
            other => panic!("expected an object, got {other}"),
        }
    }

    fn set_at(version: &str) -> DocumentSet {
        DocumentSet::new(
            doc("root.json", json!({ "version": version })),
            vec![
                doc("a.json", json!({ "version": version })),
                doc("b.json", json!({ "version": version })),
            ],
        )
    }

    fn two_step_registry() -> VersionRegistry {
        VersionRegistry::new(vec![
            MigrationStep::bump(Version::new([0, 13]), Version::new([0, 14])),
            MigrationStep::bump(Version::new([0, 14]), Version::new([0, 15])),
        ])
        .unwrap()
    }

    #[test]
    fn test_pending_steps_full_suffix() {
        let registry = two_step_registry();
        let pending = registry.pending_steps(&Version::new([0, 13]));
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].target(), &Version::new([0, 14]));
    }

    #[test]
    fn test_pending_steps_partial_suffix() {
        let registry = two_step_registry();
        let pending = registry.pending_steps(&Version::new([0, 14]));
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].target(), &Version::new([0, 15]));
    }

    #[test]
    fn test_pending_steps_empty_at_latest() {
        let registry = two_step_registry();
        assert!(registry.pending_steps(&Version::new([0, 15])).is_empty());
        assert!(registry.pending_steps(&Version::new([1, 0])).is_empty());
    }

    #[test]
    fn test_pending_steps_for_unknown_version() {
        // 0.12 is older than anything registered: everything is pending.
        let registry = two_step_registry();
        assert_eq!(registry.pending_steps(&Version::new([0, 12])).len(), 2);

        // A version between two targets selects the later suffix.
        let between = "0.14.5".parse::<Version>().unwrap();
        let pending = registry.pending_steps(&between);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].target(), &Version::new([0, 15]));
    }

    #[test]
    fn test_pending_steps_monotonic() {
        let registry = two_step_registry();
        let at_older = registry.pending_steps(&Version::new([0, 13]));
        let at_newer = registry.pending_steps(&Version::new([0, 14]));

        // pending(newer) is a strict suffix of pending(older).
        assert!(at_newer.len() < at_older.len());
        let suffix = &at_older[at_older.len() - at_newer.len()..];
        let suffix_targets: Vec<_> = suffix.iter().map(MigrationStep::target).collect();
        let newer_targets: Vec<_> = at_newer.iter().map(MigrationStep::target).collect();
        assert_eq!(suffix_targets, newer_targets);
    }

    #[test]
    fn test_registry_rejects_unordered_steps() {
        let result = VersionRegistry::new(vec![
            MigrationStep::bump(Version::new([0, 14]), Version::new([0, 15])),
            MigrationStep::bump(Version::new([0, 13]), Version::new([0, 14])),
        ]);
        assert!(matches!(result, Err(MigrateError::Config(_))));
    }

    #[test]
    fn test_registry_rejects_duplicate_targets() {
        let result = VersionRegistry::new(vec![
            MigrationStep::bump(Version::new([0, 13]), Version::new([0, 14])),
            MigrationStep::bump(Version::new([0, 13]), Version::new([0, 14])),
        ]);
        assert!(matches!(result, Err(MigrateError::Config(_))));
    }

    #[test]
    fn test_latest() {
        assert_eq!(two_step_registry().latest(), Some(&Version::new([0, 15])));
        assert_eq!(VersionRegistry::new(Vec::new()).unwrap().latest(), None);
    }

    #[test]
    fn test_bump_rewrites_every_document() {
        let mut docs = set_at("0.13");
        let step = MigrationStep::bump(Version::new([0, 13]), Version::new([0, 14]));

        step.apply(&mut docs).unwrap();

        for doc in docs.iter() {
            assert_eq!(doc.get_str(VERSION_FIELD).unwrap(), "0.14");
        }
    }

    #[test]
    fn test_bump_mismatch_mutates_nothing() {
        let mut docs = DocumentSet::new(
            doc("root.json", json!({ "version": "0.13" })),
            vec![
                doc("a.json", json!({ "version": "0.13" })),
                // One straggler at an older version fails the whole step.
                doc("b.json", json!({ "version": "0.12" })),
            ],
        );
        let before = docs.clone();
        let step = MigrationStep::bump(Version::new([0, 13]), Version::new([0, 14]));

        match step.apply(&mut docs) {
            Err(StepError::VersionMismatch { path, found, expected }) => {
                assert_eq!(path.as_str(), "b.json");
                assert_eq!(found, "0.12");
                assert_eq!(expected, "0.13");
            }
            other => panic!("expected VersionMismatch, got {other:?}"),
        }

        assert_eq!(docs, before);
    }

    #[test]
    fn test_bump_requires_exact_string_match() {
        let mut docs = DocumentSet::new(
            doc("root.json", json!({ "version": "0.013" })),
            Vec::new(),
        );
        let step = MigrationStep::bump(Version::new([0, 13]), Version::new([0, 14]));

        assert!(matches!(
            step.apply(&mut docs),
            Err(StepError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn test_bump_missing_version_field() {
        let mut docs = DocumentSet::new(doc("root.json", json!({})), Vec::new());
        let step = MigrationStep::bump(Version::new([0, 13]), Version::new([0, 14]));

        assert!(matches!(
            step.apply(&mut docs),
            Err(StepError::Document(_))
        ));
    }

    #[test]
    fn test_structural_transform_runs_after_bump() {
        fn mark(docs: &mut DocumentSet) -> Result<(), StepError> {
            docs.root_mut().set_string("marked", "yes");
            Ok(())
        }

        let mut docs = set_at("0.13");
        let step = MigrationStep::structural(Version::new([0, 13]), Version::new([0, 14]), mark);
        step.apply(&mut docs).unwrap();

        assert_eq!(docs.root().get_str("marked").unwrap(), "yes");
        assert_eq!(docs.root().get_str(VERSION_FIELD).unwrap(), "0.14");
    }

    #[test]
    fn test_structural_transform_skipped_on_mismatch() {
        fn mark(docs: &mut DocumentSet) -> Result<(), StepError> {
            docs.root_mut().set_string("marked", "yes");
            Ok(())
        }

        let mut docs = set_at("0.12");
        let step = MigrationStep::structural(Version::new([0, 13]), Version::new([0, 14]), mark);

        assert!(step.apply(&mut docs).is_err());
        assert!(docs.root().try_get_str("marked").unwrap().is_none());
    }
}
