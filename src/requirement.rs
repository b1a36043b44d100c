// src/requirement.rs

//! Structured view of a lock/resolution entry dict

use crate::error::{Error, Result};
use crate::project::LockEntry;
use crate::version::{Operator, SpecifierSet, clean_specifier, strip_version};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Normalize a package name (PEP 503)
///
/// Lowercases and collapses runs of `-`, `_` and `.` into a single `-`.
pub fn normalize_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut pending_separator = false;
    for c in name.trim().chars() {
        if matches!(c, '-' | '_' | '.') {
            pending_separator = true;
            continue;
        }
        if pending_separator && !normalized.is_empty() {
            normalized.push('-');
        }
        pending_separator = false;
        normalized.push(c.to_ascii_lowercase());
    }
    normalized
}

/// Look up `name` in a map keyed by package names, falling back to a
/// normalized comparison when the exact key is absent
pub(crate) fn lookup_by_name<'a, V>(
    map: &'a BTreeMap<String, V>,
    name: &str,
) -> Option<(&'a String, &'a V)> {
    map.get_key_value(name).or_else(|| {
        let wanted = normalize_name(name);
        map.iter().find(|(key, _)| normalize_name(key) == wanted)
    })
}

/// A parsed requirement: one package's name, specifier, extras, hashes,
/// markers and install mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub name: String,
    pub normalized_name: String,
    pub specifier: SpecifierSet,
    pub extras: BTreeSet<String>,
    pub hashes: BTreeSet<String>,
    pub markers: Option<String>,
    pub editable: bool,
}

impl Requirement {
    /// Build a requirement from an entry dict
    ///
    /// The version is normalized with [`clean_specifier`]; a missing version
    /// is unconstrained.
    pub fn from_entry(name: &str, entry: &LockEntry) -> Result<Self> {
        let spec = clean_specifier(entry.version.as_deref().unwrap_or("*"));
        Ok(Self {
            name: name.to_string(),
            normalized_name: normalize_name(name),
            specifier: SpecifierSet::parse(&spec)?,
            extras: entry.extras.iter().cloned().collect(),
            hashes: entry.hashes.iter().cloned().collect(),
            markers: entry
                .markers
                .as_ref()
                .filter(|m| !m.trim().is_empty())
                .cloned(),
            editable: entry.editable,
        })
    }

    /// Build a bare name + specifier requirement
    pub fn from_specifier(name: &str, spec: &str) -> Result<Self> {
        Ok(Self {
            name: name.to_string(),
            normalized_name: normalize_name(name),
            specifier: SpecifierSet::parse(&clean_specifier(spec))?,
            extras: BTreeSet::new(),
            hashes: BTreeSet::new(),
            markers: None,
            editable: false,
        })
    }

    /// Parse a requirement line: `name[extras]specifier; markers`
    ///
    /// A leading `-e` marks the requirement editable. The specifier may be
    /// wrapped in parentheses; a bare version means `==`.
    pub fn from_line(line: &str) -> Result<Self> {
        let malformed = |reason: &str| Error::MalformedSpecifier {
            spec: line.to_string(),
            reason: reason.to_string(),
        };

        let mut rest = line.trim();
        let editable = match rest.strip_prefix("-e ") {
            Some(tail) => {
                rest = tail.trim_start();
                true
            }
            None => false,
        };
        let (head, markers) = match rest.split_once(';') {
            Some((head, markers)) => (head.trim(), Some(markers.trim()).filter(|m| !m.is_empty())),
            None => (rest, None),
        };

        let name_end = head
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
            .unwrap_or(head.len());
        let name = &head[..name_end];
        if !name.starts_with(|c: char| c.is_ascii_alphanumeric()) {
            return Err(malformed("missing package name"));
        }

        let mut spec = head[name_end..].trim_start();
        let mut extras = BTreeSet::new();
        if let Some(tail) = spec.strip_prefix('[') {
            let (inner, after) = tail
                .split_once(']')
                .ok_or_else(|| malformed("unterminated extras"))?;
            extras = inner
                .split(',')
                .map(str::trim)
                .filter(|extra| !extra.is_empty())
                .map(str::to_string)
                .collect();
            spec = after.trim_start();
        }
        let spec = spec
            .strip_prefix('(')
            .and_then(|inner| inner.strip_suffix(')'))
            .unwrap_or(spec);

        Ok(Self {
            name: name.to_string(),
            normalized_name: normalize_name(name),
            specifier: SpecifierSet::parse(&clean_specifier(spec))?,
            extras,
            hashes: BTreeSet::new(),
            markers: markers.map(str::to_string),
            editable,
        })
    }

    /// The requirement as an entry dict, named and with `*` when
    /// unconstrained
    pub fn to_entry(&self) -> LockEntry {
        LockEntry {
            name: Some(self.name.clone()),
            version: Some(self.specifier.to_string()),
            extras: self.extras.iter().cloned().collect(),
            hashes: self.hashes.iter().cloned().collect(),
            markers: self.markers.clone(),
            editable: self.editable,
            ..LockEntry::default()
        }
    }

    /// The specifier without its operator
    pub fn version(&self) -> String {
        strip_version(&self.specifier.to_string())
    }

    /// The exact version this requirement pins, if it is a single `==`
    /// or `===` specifier without a wildcard
    pub fn pinned_version(&self) -> Option<String> {
        let mut specs = self.specifier.iter();
        match (specs.next(), specs.next()) {
            (Some(spec), None)
                if matches!(spec.operator, Operator::Equal | Operator::Arbitrary)
                    && !spec.version.ends_with(".*") =>
            {
                Some(spec.version.clone())
            }
            _ => None,
        }
    }

    pub fn has_markers(&self) -> bool {
        self.markers.is_some()
    }

    /// Check whether a version string satisfies this requirement
    pub fn contains(&self, version: &str) -> Result<bool> {
        self.specifier.contains_str(version)
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.extras.is_empty() {
            let extras: Vec<&str> = self.extras.iter().map(String::as_str).collect();
            write!(f, "[{}]", extras.join(","))?;
        }
        if !self.specifier.is_any() {
            write!(f, "{}", self.specifier)?;
        }
        if let Some(ref markers) = self.markers {
            write!(f, "; {}", markers)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Django"), "django");
        assert_eq!(normalize_name("zope.interface"), "zope-interface");
        assert_eq!(normalize_name("My__Package--Name"), "my-package-name");
        assert_eq!(normalize_name(" requests "), "requests");
    }

    #[test]
    fn test_from_entry_cleans_bare_version() {
        let entry = LockEntry::new("requests", "2.31.0");
        let req = Requirement::from_entry("Requests", &entry).unwrap();
        assert_eq!(req.normalized_name, "requests");
        assert_eq!(req.specifier.to_string(), "==2.31.0");
        assert_eq!(req.version(), "2.31.0");
        assert!(!req.has_markers());
    }

    #[test]
    fn test_from_entry_without_version_is_unconstrained() {
        let entry = LockEntry::default();
        let req = Requirement::from_entry("six", &entry).unwrap();
        assert!(req.specifier.is_any());
        assert!(req.contains("1.16.0").unwrap());
    }

    #[test]
    fn test_blank_markers_are_absent() {
        let mut entry = LockEntry::new("idna", "==3.6");
        entry.markers = Some("  ".to_string());
        let req = Requirement::from_entry("idna", &entry).unwrap();
        assert_eq!(req.markers, None);
    }

    #[test]
    fn test_pinned_version() {
        let pinned = Requirement::from_specifier("flask", "3.0.0").unwrap();
        assert_eq!(pinned.pinned_version().as_deref(), Some("3.0.0"));

        let range = Requirement::from_specifier("flask", ">=3.0,<4").unwrap();
        assert_eq!(range.pinned_version(), None);

        let wildcard = Requirement::from_specifier("flask", "==3.*").unwrap();
        assert_eq!(wildcard.pinned_version(), None);
        assert_eq!(Requirement::from_specifier("flask", "*").unwrap().pinned_version(), None);
    }

    #[test]
    fn test_malformed_version_is_rejected() {
        let entry = LockEntry::new("bad", ">=not.a.version");
        assert!(Requirement::from_entry("bad", &entry).is_err());
    }

    #[test]
    fn test_display() {
        let mut entry = LockEntry::new("requests", ">=2.0");
        entry.extras = vec!["socks".to_string(), "security".to_string()];
        entry.markers = Some("python_version >= '3.8'".to_string());
        let req = Requirement::from_entry("requests", &entry).unwrap();
        assert_eq!(
            req.to_string(),
            "requests[security,socks]>=2.0; python_version >= '3.8'"
        );
    }

    #[test]
    fn test_from_line() {
        let req = Requirement::from_line("Requests[socks, security] >=2.0,<3 ; python_version >= '3.8'")
            .unwrap();
        assert_eq!(req.name, "Requests");
        assert_eq!(req.normalized_name, "requests");
        assert_eq!(req.specifier.to_string(), ">=2.0,<3");
        assert_eq!(req.extras.len(), 2);
        assert_eq!(req.markers.as_deref(), Some("python_version >= '3.8'"));
        assert!(!req.editable);

        let bare = Requirement::from_line("six").unwrap();
        assert!(bare.specifier.is_any());
        assert_eq!(bare.to_entry().version.as_deref(), Some("*"));

        let pinned = Requirement::from_line("-e mylib (1.0)").unwrap();
        assert!(pinned.editable);
        assert_eq!(pinned.to_entry().version.as_deref(), Some("==1.0"));
    }

    #[test]
    fn test_from_line_rejects_malformed_input() {
        for line in ["", ">=1.0", "[extra]pkg", "pkg[extra", "pkg >=not.a.version"] {
            assert!(Requirement::from_line(line).is_err(), "accepted '{}'", line);
        }
    }

    #[test]
    fn test_lookup_by_name_falls_back_to_normalized() {
        let mut map = BTreeMap::new();
        map.insert("Zope.Interface".to_string(), 1);
        assert_eq!(lookup_by_name(&map, "zope-interface").map(|(_, v)| *v), Some(1));
        assert_eq!(lookup_by_name(&map, "Zope.Interface").map(|(_, v)| *v), Some(1));
        assert!(lookup_by_name(&map, "zope").is_none());
    }
}
