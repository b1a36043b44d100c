// src/project/manifest.rs

//! Hand-authored manifest of direct dependencies
//!
//! # Example
//!
//! ```toml
//! [[source]]
//! name = "pypi"
//! url = "https://pypi.org/simple"
//! verify_ssl = true
//!
//! [packages]
//! requests = "*"
//! flask = ">=2.0"
//! mylib = { path = ".", editable = true }
//! django = { version = "~=4.2", extras = ["argon2"] }
//!
//! [dev-packages]
//! pytest = "*"
//! ```

use super::{LockEntry, Section};
use crate::error::Result;
use crate::requirement::{lookup_by_name, normalize_name};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

fn default_verify_ssl() -> bool {
    true
}

/// A package index declared in the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub url: String,
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,
}

/// A declared requirement: either a bare version string or an inline table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeclaredRequirement {
    Version(String),
    Detailed(LockEntry),
}

impl DeclaredRequirement {
    /// The requirement as an entry dict
    pub fn to_entry(&self) -> LockEntry {
        match self {
            DeclaredRequirement::Version(version) => LockEntry {
                version: Some(version.clone()),
                ..LockEntry::default()
            },
            DeclaredRequirement::Detailed(entry) => entry.clone(),
        }
    }
}

/// Manifest root structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default, rename = "source", skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Source>,

    #[serde(default)]
    pub packages: BTreeMap<String, DeclaredRequirement>,

    #[serde(default, rename = "dev-packages")]
    pub dev_packages: BTreeMap<String, DeclaredRequirement>,
}

impl Manifest {
    /// Load manifest from a path
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse manifest from a TOML string
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn requirements(&self, section: Section) -> &BTreeMap<String, DeclaredRequirement> {
        match section {
            Section::Default => &self.packages,
            Section::Develop => &self.dev_packages,
        }
    }

    /// The declared requirement for a package, under the manifest's own key
    pub fn declared_requirement(&self, name: &str, section: Section) -> Option<(&str, LockEntry)> {
        lookup_by_name(self.requirements(section), name)
            .map(|(key, declared)| (key.as_str(), declared.to_entry()))
    }

    /// Normalized names of every package declared in a section
    pub fn declared_package_names(&self, section: Section) -> BTreeSet<String> {
        self.requirements(section)
            .keys()
            .map(|name| normalize_name(name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[[source]]
name = "pypi"
url = "https://pypi.org/simple"

[packages]
requests = "*"
Flask = ">=2.0"
mylib = { path = ".", editable = true }
django = { version = "~=4.2", extras = ["argon2"] }

[dev-packages]
pytest = "*"
"#;

    #[test]
    fn test_parse_manifest() {
        let manifest = Manifest::parse(SAMPLE).unwrap();
        assert_eq!(manifest.sources.len(), 1);
        assert!(manifest.sources[0].verify_ssl);
        assert_eq!(manifest.packages.len(), 4);
        assert_eq!(manifest.dev_packages.len(), 1);
    }

    #[test]
    fn test_declared_requirement_forms() {
        let manifest = Manifest::parse(SAMPLE).unwrap();

        let (name, flask) = manifest.declared_requirement("flask", Section::Default).unwrap();
        assert_eq!(name, "Flask");
        assert_eq!(flask.version.as_deref(), Some(">=2.0"));

        let (_, mylib) = manifest.declared_requirement("mylib", Section::Default).unwrap();
        assert!(mylib.editable);
        assert_eq!(mylib.version, None);
        assert_eq!(mylib.extra.get("path"), Some(&serde_json::json!(".")));

        let (_, django) = manifest.declared_requirement("Django", Section::Default).unwrap();
        assert_eq!(django.extras, vec!["argon2".to_string()]);
    }

    #[test]
    fn test_sections_are_separate() {
        let manifest = Manifest::parse(SAMPLE).unwrap();
        assert!(manifest.declared_requirement("pytest", Section::Default).is_none());
        let (key, _) = manifest.declared_requirement("PyTest", Section::Develop).unwrap();
        assert_eq!(key, "pytest");
    }

    #[test]
    fn test_declared_package_names_are_normalized() {
        let manifest = Manifest::parse(SAMPLE).unwrap();
        let names = manifest.declared_package_names(Section::Default);
        assert!(names.contains("flask"));
        assert!(!names.contains("Flask"));
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn test_empty_manifest() {
        let manifest = Manifest::parse("").unwrap();
        assert!(manifest.packages.is_empty());
        assert!(manifest.declared_package_names(Section::Develop).is_empty());
    }
}
