//! Schema version numbers.
//!
//! This module provides the [`Version`] type: an ordered tuple of
//! non-negative integer components parsed from a dot-delimited string
//! (`"0.14"`, `"1.2.3"`). Ordering is lexicographic by component, so
//! `0.9 < 0.10` even though the strings compare the other way around.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;

/// A schema version: one or more non-negative integer components.
///
/// Parsed from and rendered as a dot-delimited string. Comparison is
/// component-wise, with a shorter version ordering before any longer
/// version it prefixes.
///
/// # Examples
///
/// ```
/// use cm_core::Version;
///
/// let v: Version = "0.14".parse().unwrap();
/// assert_eq!(v.components(), &[0, 14]);
/// assert_eq!(v.to_string(), "0.14");
///
/// let older: Version = "0.9".parse().unwrap();
/// let newer: Version = "0.10".parse().unwrap();
/// assert!(older < newer);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    components: SmallVec<[u32; 4]>,
}

impl Version {
    /// Creates a version from its integer components.
    ///
    /// # Examples
    ///
    /// ```
    /// use cm_core::Version;
    ///
    /// let v = Version::new([0, 14]);
    /// assert_eq!(v.to_string(), "0.14");
    /// ```
    #[must_use]
    pub fn new(components: impl IntoIterator<Item = u32>) -> Self {
        Self {
            components: components.into_iter().collect(),
        }
    }

    /// Returns the integer components of this version.
    #[inline]
    #[must_use]
    pub fn components(&self) -> &[u32] {
        &self.components
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for component in &self.components {
            if !first {
                write!(f, ".")?;
            }
            write!(f, "{component}")?;
            first = false;
        }
        Ok(())
    }
}

/// Errors produced when parsing a version string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseVersionError {
    /// The version string is empty.
    #[error("version string is empty")]
    Empty,

    /// A dot-delimited component is not a non-negative integer.
    #[error("invalid version component '{0}'")]
    InvalidComponent(String),
}

impl FromStr for Version {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseVersionError::Empty);
        }

        let mut components = SmallVec::new();
        for part in s.split('.') {
            let component = part
                .parse::<u32>()
                .map_err(|_| ParseVersionError::InvalidComponent(part.to_owned()))?;
            components.push(component);
        }

        Ok(Self { components })
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_two_components() {
        let v: Version = "0.14".parse().unwrap();
        assert_eq!(v.components(), &[0, 14]);
    }

    #[test]
    fn test_parse_single_component() {
        let v: Version = "7".parse().unwrap();
        assert_eq!(v.components(), &[7]);
    }

    #[test]
    fn test_parse_empty_is_error() {
        assert_eq!("".parse::<Version>(), Err(ParseVersionError::Empty));
    }

    #[test]
    fn test_parse_non_numeric_component_is_error() {
        assert_eq!(
            "0.x".parse::<Version>(),
            Err(ParseVersionError::InvalidComponent("x".to_owned()))
        );
        assert!("1..2".parse::<Version>().is_err());
        assert!("-1.2".parse::<Version>().is_err());
    }

    #[test]
    fn test_display_round_trips() {
        for raw in ["0.13", "0.14", "1.2.3", "10"] {
            let v: Version = raw.parse().unwrap();
            assert_eq!(v.to_string(), raw);
        }
    }

    #[test]
    fn test_ordering_is_component_wise() {
        let v9: Version = "0.9".parse().unwrap();
        let v10: Version = "0.10".parse().unwrap();
        // String comparison would put "0.10" first.
        assert!(v9 < v10);
        assert!("0.9" > "0.10");
    }

    #[test]
    fn test_ordering_prefix_is_smaller() {
        let short: Version = "1".parse().unwrap();
        let long: Version = "1.0".parse().unwrap();
        assert!(short < long);
    }

    #[test]
    fn test_equality() {
        let a: Version = "0.14".parse().unwrap();
        let b = Version::new([0, 14]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_serde_round_trip() {
        let v = Version::new([0, 15]);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, r#""0.15""#);

        let back: Version = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn test_deserialize_malformed_is_error() {
        assert!(serde_json::from_str::<Version>(r#""0.x""#).is_err());
    }
}
