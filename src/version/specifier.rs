// src/version/specifier.rs

//! Version specifiers and specifier sets
//!
//! A specifier is an operator plus a version (`>=1.2`, `==1.4.*`, `~=2.0`).
//! A specifier set is a comma-separated list of specifiers that must all
//! match; `*` (or an empty string) is the unconstrained set.

use super::Version;
use crate::error::{Error, Result};
use std::fmt;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter};

/// Comparison operators
///
/// Declared longest-first so prefix detection never reads `===` as `==`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter)]
pub enum Operator {
    #[strum(to_string = "===")]
    Arbitrary,
    #[strum(to_string = "~=")]
    Compatible,
    #[strum(to_string = "==")]
    Equal,
    #[strum(to_string = "!=")]
    NotEqual,
    #[strum(to_string = "<=")]
    LessEqual,
    #[strum(to_string = ">=")]
    GreaterEqual,
    #[strum(to_string = "<")]
    Less,
    #[strum(to_string = ">")]
    Greater,
}

impl Operator {
    /// Split a leading operator off `text`
    pub fn split_prefix(text: &str) -> Option<(Operator, &str)> {
        Operator::iter().find_map(|op| text.strip_prefix(op.as_ref()).map(|rest| (op, rest)))
    }
}

/// Normalize a raw version/specifier string
///
/// - "1.2.3" → "==1.2.3" (bare versions are exact pins)
/// - "*", "any", "" → "*"
/// - "====1.2.3" → "==1.2.3"
/// - anything already carrying an operator is returned trimmed
pub fn clean_specifier(spec: &str) -> String {
    let trimmed = spec.trim();
    if Operator::split_prefix(trimmed).is_none() {
        if trimmed.is_empty() || trimmed == "*" || trimmed.eq_ignore_ascii_case("any") {
            return "*".to_string();
        }
        return format!("=={}", trimmed);
    }
    if trimmed.starts_with("==") && trimmed.matches('=').count() > 2 {
        return format!("=={}", trimmed.trim_start_matches('='));
    }
    trimmed.to_string()
}

/// Strip every leading operator, leaving the bare version
pub fn strip_version(spec: &str) -> String {
    let mut rest = spec.trim();
    while let Some((_, tail)) = Operator::split_prefix(rest) {
        rest = tail.trim_start();
    }
    rest.to_string()
}

#[derive(Debug, Clone)]
enum Target {
    Exact(Version),
    Prefix(Version),
    Arbitrary,
}

/// A single operator + version specifier
#[derive(Debug, Clone)]
pub struct Specifier {
    pub operator: Operator,
    /// Version text as written, without the operator
    pub version: String,
    target: Target,
}

impl Specifier {
    /// Parse a single specifier such as `>=1.2` or `==2.*`
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let malformed = |reason: String| Error::MalformedSpecifier {
            spec: text.to_string(),
            reason,
        };

        let (operator, rest) = Operator::split_prefix(text)
            .ok_or_else(|| malformed("missing comparison operator".to_string()))?;
        let version = rest.trim();
        if version.is_empty() {
            return Err(malformed("missing version".to_string()));
        }

        let target = match operator {
            Operator::Arbitrary => Target::Arbitrary,
            Operator::Equal | Operator::NotEqual => match version.strip_suffix(".*") {
                Some(prefix) => {
                    let prefix = Version::parse(prefix).map_err(|e| malformed(e.to_string()))?;
                    if prefix.local.is_some() {
                        return Err(malformed("wildcard cannot carry a local label".to_string()));
                    }
                    Target::Prefix(prefix)
                }
                None => Target::Exact(Version::parse(version).map_err(|e| malformed(e.to_string()))?),
            },
            _ => {
                let parsed = Version::parse(version).map_err(|e| malformed(e.to_string()))?;
                if parsed.local.is_some() {
                    return Err(malformed(format!("'{}' does not allow a local label", operator)));
                }
                if operator == Operator::Compatible && parsed.release.len() < 2 {
                    return Err(malformed(
                        "compatible release needs at least two release segments".to_string(),
                    ));
                }
                Target::Exact(parsed)
            }
        };

        Ok(Self {
            operator,
            version: version.to_string(),
            target,
        })
    }

    /// Check whether `candidate` satisfies this specifier
    pub fn contains(&self, candidate: &Version) -> bool {
        match (&self.operator, &self.target) {
            (Operator::Arbitrary, _) | (_, Target::Arbitrary) => {
                candidate.to_string().eq_ignore_ascii_case(&self.version)
            }
            (Operator::Equal, Target::Prefix(prefix)) => prefix_matches(candidate, prefix),
            (Operator::NotEqual, Target::Prefix(prefix)) => !prefix_matches(candidate, prefix),
            (Operator::Equal, Target::Exact(v)) => exact_matches(candidate, v),
            (Operator::NotEqual, Target::Exact(v)) => !exact_matches(candidate, v),
            (Operator::Compatible, Target::Exact(v)) => {
                let mut prefix = v.public();
                prefix.release.truncate(v.release.len() - 1);
                prefix.pre = None;
                prefix.post = None;
                prefix.dev = None;
                candidate.public() >= *v && prefix_matches(candidate, &prefix)
            }
            (Operator::LessEqual, Target::Exact(v)) => candidate.public() <= *v,
            (Operator::GreaterEqual, Target::Exact(v)) => candidate.public() >= *v,
            (Operator::Less, Target::Exact(v)) => {
                // <V excludes pre-releases of V itself unless V is one
                candidate.public() < *v
                    && !(candidate.is_prerelease() && !v.is_prerelease() && candidate.same_release(v))
            }
            (Operator::Greater, Target::Exact(v)) => {
                // >V excludes post-releases of V itself unless V is one
                candidate.public() > *v
                    && !(candidate.is_postrelease()
                        && !v.is_postrelease()
                        && candidate.same_release(v))
            }
            (_, Target::Prefix(_)) => false,
        }
    }
}

fn exact_matches(candidate: &Version, target: &Version) -> bool {
    if target.local.is_some() {
        candidate == target
    } else {
        candidate.public() == *target
    }
}

fn prefix_matches(candidate: &Version, prefix: &Version) -> bool {
    candidate.epoch == prefix.epoch
        && (0..prefix.release.len()).all(|i| candidate.segment(i) == prefix.segment(i))
}

impl PartialEq for Specifier {
    fn eq(&self, other: &Self) -> bool {
        self.operator == other.operator && self.version == other.version
    }
}

impl Eq for Specifier {}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operator, self.version)
    }
}

/// A conjunction of specifiers; empty means any version
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecifierSet {
    specifiers: Vec<Specifier>,
}

impl SpecifierSet {
    /// The unconstrained set
    pub fn any() -> Self {
        Self::default()
    }

    /// Parse a comma-separated specifier set
    ///
    /// "*", "any" and "" are unconstrained. Every other clause must carry
    /// an operator; run the input through [`clean_specifier`] first to
    /// accept bare versions.
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed == "*" || trimmed.eq_ignore_ascii_case("any") {
            return Ok(Self::any());
        }
        let specifiers = trimmed
            .split(',')
            .map(Specifier::parse)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { specifiers })
    }

    pub fn is_any(&self) -> bool {
        self.specifiers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Specifier> {
        self.specifiers.iter()
    }

    /// Check whether a parsed version satisfies every specifier
    pub fn contains(&self, version: &Version) -> bool {
        self.specifiers.iter().all(|spec| spec.contains(version))
    }

    /// Check a version string against the set
    ///
    /// Pure `===` sets compare strings, so they accept versions that are
    /// not PEP 440 compliant.
    pub fn contains_str(&self, version: &str) -> Result<bool> {
        if self.is_any() {
            return Ok(true);
        }
        match Version::parse(version) {
            Ok(parsed) => Ok(self.contains(&parsed)),
            Err(_) if self.specifiers.iter().all(|s| s.operator == Operator::Arbitrary) => Ok(self
                .specifiers
                .iter()
                .all(|s| s.version.eq_ignore_ascii_case(version.trim()))),
            Err(e) => Err(e),
        }
    }
}

impl fmt::Display for SpecifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_any() {
            return write!(f, "*");
        }
        let parts: Vec<String> = self.specifiers.iter().map(Specifier::to_string).collect();
        write!(f, "{}", parts.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(s: &str) -> SpecifierSet {
        SpecifierSet::parse(s).unwrap()
    }

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_clean_specifier() {
        assert_eq!(clean_specifier("1.2.3"), "==1.2.3");
        assert_eq!(clean_specifier("*"), "*");
        assert_eq!(clean_specifier("Any"), "*");
        assert_eq!(clean_specifier(""), "*");
        assert_eq!(clean_specifier("==1.2.3"), "==1.2.3");
        assert_eq!(clean_specifier(clean_specifier("1.2.3").as_str()), "==1.2.3");
        assert_eq!(clean_specifier("====1.2.3"), "==1.2.3");
        assert_eq!(clean_specifier(">=2.0,<3"), ">=2.0,<3");
    }

    #[test]
    fn test_strip_version() {
        assert_eq!(strip_version("==1.2.3"), "1.2.3");
        assert_eq!(strip_version(">= 2.0"), "2.0");
        assert_eq!(strip_version("===1.0"), "1.0");
        assert_eq!(strip_version("1.0"), "1.0");
        assert_eq!(strip_version("*"), "*");
    }

    #[test]
    fn test_operator_prefix_is_longest_match() {
        let (op, rest) = Operator::split_prefix("===1.0").unwrap();
        assert_eq!(op, Operator::Arbitrary);
        assert_eq!(rest, "1.0");
        let (op, _) = Operator::split_prefix("<=1.0").unwrap();
        assert_eq!(op, Operator::LessEqual);
        assert!(Operator::split_prefix("1.0").is_none());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(
            SpecifierSet::parse("1.0"),
            Err(Error::MalformedSpecifier { .. })
        ));
        assert!(SpecifierSet::parse(">=").is_err());
        assert!(SpecifierSet::parse("~=1").is_err());
        assert!(SpecifierSet::parse(">=1.0+local").is_err());
        assert!(SpecifierSet::parse(">=1.0,").is_err());
    }

    #[test]
    fn test_any_contains_everything() {
        assert!(set("*").is_any());
        assert!(set("*").contains(&v("0.0.1a1")));
        assert!(set("").contains_str("99").unwrap());
    }

    #[test]
    fn test_exact_and_wildcard() {
        assert!(set("==1.2").contains(&v("1.2.0")));
        assert!(set("==1.2").contains(&v("1.2+local")));
        assert!(!set("==1.2+other").contains(&v("1.2+local")));
        assert!(set("==1.2.*").contains(&v("1.2.9")));
        assert!(set("==1.2.*").contains(&v("1.2")));
        assert!(!set("==1.2.*").contains(&v("1.3")));
        assert!(!set("!=1.2.*").contains(&v("1.2.5")));
        assert!(set("!=1.2").contains(&v("1.2.1")));
    }

    #[test]
    fn test_compatible_release() {
        let compat = set("~=2.2");
        assert!(compat.contains(&v("2.2")));
        assert!(compat.contains(&v("2.9")));
        assert!(!compat.contains(&v("3.0")));
        assert!(!compat.contains(&v("2.1")));

        let compat = set("~=1.4.5");
        assert!(compat.contains(&v("1.4.7")));
        assert!(!compat.contains(&v("1.5.0")));
    }

    #[test]
    fn test_ordered_comparisons() {
        let range = set(">=1.0, <2.0");
        assert!(range.contains(&v("1.0")));
        assert!(range.contains(&v("1.9.9")));
        assert!(!range.contains(&v("2.0")));
        assert!(!range.contains(&v("0.9")));
        assert!(set("<=2.0").contains(&v("2.0")));
    }

    #[test]
    fn test_exclusive_bounds_skip_own_pre_and_post_releases() {
        assert!(!set("<2.0").contains(&v("2.0rc1")));
        assert!(set("<2.0rc2").contains(&v("2.0rc1")));
        assert!(!set(">1.0").contains(&v("1.0.post1")));
        assert!(set(">1.0.post1").contains(&v("1.0.post2")));
        assert!(set(">1.0").contains(&v("1.1")));
    }

    #[test]
    fn test_arbitrary_equality() {
        let arbitrary = set("===foobar");
        assert!(arbitrary.contains_str("foobar").unwrap());
        assert!(!arbitrary.contains_str("1.0").unwrap());
        assert!(set(">=1.0").contains_str("not-a-version").is_err());
    }

    #[test]
    fn test_display_round_trips_normalized_text() {
        assert_eq!(set(">= 1.0 , < 2.0").to_string(), ">=1.0,<2.0");
        assert_eq!(set("*").to_string(), "*");
        assert_eq!(set("==1.2.*").to_string(), "==1.2.*");
    }
}
