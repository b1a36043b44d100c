// src/project/lockfile.rs

//! Previously persisted lock state
//!
//! The lockfile captures the exact resolved state of every dependency,
//! split into a `default` and a `develop` section. Entries are keyed by
//! package name and carry the pinned version plus integrity hashes.
//!
//! # Format
//!
//! ```json
//! {
//!     "_meta": {"hash": {"sha256": "..."}},
//!     "default": {
//!         "requests": {
//!             "version": "==2.31.0",
//!             "hashes": ["sha256:58cd...", "sha256:942c..."],
//!             "markers": "python_version >= '3.7'",
//!             "index": "pypi"
//!         }
//!     },
//!     "develop": {}
//! }
//! ```
//!
//! Writing the lock back out is the caller's job; this module only reads it.

use super::Section;
use crate::error::Result;
use crate::requirement::lookup_by_name;
use crate::version::{clean_specifier, strip_version};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

fn is_false(value: &bool) -> bool {
    !*value
}

/// One package entry, as produced by the resolver or stored in the lock
///
/// Keys this crate does not interpret (`index`, `git`, `path`, ...) are kept
/// in `extra` and carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockEntry {
    /// Package name; lock sections key entries by name and omit it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Version or specifier (`"2.31.0"`, `"==2.31.0"`, `">=2"`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extras: Vec<String>,

    /// Integrity hashes (`sha256:...`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hashes: Vec<String>,

    /// Environment marker gating whether the dependency applies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markers: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub editable: bool,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl LockEntry {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            version: Some(version.to_string()),
            ..Self::default()
        }
    }

    pub fn with_hashes<I, S>(mut self, hashes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hashes = hashes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_markers(mut self, markers: &str) -> Self {
        self.markers = Some(markers.to_string());
        self
    }

    pub fn with_editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    /// Name of the entry, or empty when absent
    pub fn name_str(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// The entry with its version stripped of any operator
    pub fn into_bare(mut self) -> Self {
        self.version = self.version.map(|v| strip_version(&v));
        self
    }

    /// The entry with its version in specifier form (`==X`)
    pub fn into_pinned(mut self) -> Self {
        self.version = self.version.map(|v| clean_specifier(&v));
        self
    }
}

/// Lockfile root structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lockfile {
    /// Lock metadata (manifest hash, sources, ...); opaque to reconciliation
    #[serde(rename = "_meta", default)]
    pub meta: serde_json::Value,

    #[serde(default)]
    pub default: BTreeMap<String, LockEntry>,

    #[serde(default)]
    pub develop: BTreeMap<String, LockEntry>,
}

impl Lockfile {
    /// Load lockfile from a path
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse lockfile from a JSON string
    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Build a lockfile with one populated section
    ///
    /// Entries are keyed by their name; the name field itself is dropped.
    pub fn from_entries<I>(section: Section, entries: I) -> Self
    where
        I: IntoIterator<Item = LockEntry>,
    {
        let mut lockfile = Self::default();
        let target = lockfile.section_mut(section);
        for mut entry in entries {
            if let Some(name) = entry.name.take() {
                target.insert(name, entry);
            }
        }
        lockfile
    }

    pub fn section(&self, section: Section) -> &BTreeMap<String, LockEntry> {
        match section {
            Section::Default => &self.default,
            Section::Develop => &self.develop,
        }
    }

    pub fn section_mut(&mut self, section: Section) -> &mut BTreeMap<String, LockEntry> {
        match section {
            Section::Default => &mut self.default,
            Section::Develop => &mut self.develop,
        }
    }

    /// Get a locked entry by name, matching exactly first and then by
    /// normalized name
    pub fn locked_entry(&self, name: &str, section: Section) -> Option<&LockEntry> {
        lookup_by_name(self.section(section), name).map(|(_, entry)| entry)
    }

    pub fn contains(&self, name: &str, section: Section) -> bool {
        self.locked_entry(name, section).is_some()
    }
}
