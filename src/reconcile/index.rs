// src/reconcile/index.rs

//! Reverse-dependency index
//!
//! Maps a package to the parents that depend on it. Each parent is recorded
//! as a spec string: the parent's name, optionally followed by the
//! constraint it places on the child (`flask>=3.0`).

use crate::environment::DependencyTree;
use crate::requirement::{lookup_by_name, normalize_name};
use crate::version::clean_specifier;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Parents recorded for one package
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReverseDependencies {
    #[serde(default)]
    pub parents: BTreeSet<String>,
}

/// Normalized package name → parent specs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReverseDependencyIndex {
    entries: BTreeMap<String, ReverseDependencies>,
}

impl ReverseDependencyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `parent_spec` as a parent of `child`
    pub fn add_parent(&mut self, child: &str, parent_spec: impl Into<String>) {
        self.entries
            .entry(normalize_name(child))
            .or_default()
            .parents
            .insert(parent_spec.into());
    }

    pub fn with_parent(mut self, child: &str, parent_spec: impl Into<String>) -> Self {
        self.add_parent(child, parent_spec);
        self
    }

    /// Build the index by inverting every edge of a dependency tree
    pub fn from_tree(tree: &DependencyTree) -> Self {
        let mut index = Self::new();
        for (parent, requirements) in tree.iter() {
            for dep in &requirements.dependencies {
                let required = clean_specifier(&dep.required_version);
                let spec = if required == "*" {
                    parent.clone()
                } else {
                    format!("{}{}", parent, required)
                };
                index.add_parent(&dep.package_name, spec);
            }
        }
        index
    }

    /// Parent specs of a package, in sorted order
    pub fn parents_of<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + use<'a> {
        lookup_by_name(&self.entries, name)
            .into_iter()
            .flat_map(|(_, deps)| deps.parents.iter().map(String::as_str))
    }

    pub fn has_parents(&self, name: &str) -> bool {
        lookup_by_name(&self.entries, name).is_some_and(|(_, deps)| !deps.parents.is_empty())
    }
}

/// A parent spec split into name and imposed specifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentSpec {
    pub name: String,
    /// Cleaned specifier; `*` when the spec carries no constraint
    pub specifier: String,
}

impl ParentSpec {
    pub fn parse(spec: &str) -> Self {
        let spec = spec.trim();
        match spec.find(['~', '=', '!', '<', '>']) {
            Some(pos) => Self {
                name: spec[..pos].trim().to_string(),
                specifier: clean_specifier(&spec[pos..]),
            },
            None => Self {
                name: spec.to_string(),
                specifier: "*".to_string(),
            },
        }
    }
}
