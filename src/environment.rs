// src/environment.rs

//! Environment introspection: what is installed and what it requires
//!
//! Reconciliation only reads the environment. [`Environment`] is the seam a
//! host implements against its real interpreter; [`DependencyTree`] is the
//! serde-loadable snapshot that implements it in memory.

use crate::error::Result;
use crate::reconcile::ReverseDependencyIndex;
use crate::requirement::{Requirement, lookup_by_name, normalize_name};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn any_version() -> String {
    "*".to_string()
}

/// What a package requires of one of its dependencies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredDependency {
    pub package_name: String,
    #[serde(default = "any_version")]
    pub required_version: String,
}

impl RequiredDependency {
    pub fn new(package_name: &str, required_version: &str) -> Self {
        Self {
            package_name: package_name.to_string(),
            required_version: required_version.to_string(),
        }
    }
}

/// The version of a package currently installed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledVersion {
    pub version: String,
}

/// One package's node in the dependency tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRequirements {
    #[serde(default)]
    pub dependencies: Vec<RequiredDependency>,

    /// Installed version, when the package is present in the environment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub satisfied_by: Option<InstalledVersion>,
}

impl PackageRequirements {
    pub fn installed(version: &str) -> Self {
        Self {
            dependencies: Vec::new(),
            satisfied_by: Some(InstalledVersion {
                version: version.to_string(),
            }),
        }
    }

    pub fn requires(mut self, package_name: &str, required_version: &str) -> Self {
        self.dependencies
            .push(RequiredDependency::new(package_name, required_version));
        self
    }

    /// What this package requires of `name`, if it depends on it at all
    pub fn dependency(&self, name: &str) -> Option<&RequiredDependency> {
        let wanted = normalize_name(name);
        self.dependencies
            .iter()
            .find(|dep| normalize_name(&dep.package_name) == wanted)
    }
}

/// Package name → its requirements and installed version
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyTree {
    packages: BTreeMap<String, PackageRequirements>,
}

impl DependencyTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a tree from JSON
    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Add or replace a package node
    pub fn insert(&mut self, name: &str, requirements: PackageRequirements) {
        self.packages.insert(normalize_name(name), requirements);
    }

    pub fn with_package(mut self, name: &str, requirements: PackageRequirements) -> Self {
        self.insert(name, requirements);
        self
    }

    /// Requirements of a package by (normalized) name
    pub fn requirements_of(&self, name: &str) -> Option<&PackageRequirements> {
        lookup_by_name(&self.packages, name).map(|(_, reqs)| reqs)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PackageRequirements)> {
        self.packages.iter()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

/// Read-only view of the target environment
///
/// Calls are synchronous; failures propagate and abort the pass.
pub trait Environment {
    /// Snapshot of every package's requirements
    fn dependency_tree(&self) -> Result<DependencyTree>;

    /// Parent index for every package
    ///
    /// `tree` is the snapshot this pass already fetched; the default
    /// inverts its edges instead of asking for the tree again.
    fn reverse_dependencies(&self, tree: &DependencyTree) -> Result<ReverseDependencyIndex> {
        Ok(ReverseDependencyIndex::from_tree(tree))
    }

    /// The installed version satisfying `requirement`, if any
    fn satisfied_by(&self, requirement: &Requirement) -> Result<Option<String>>;
}

impl Environment for DependencyTree {
    fn dependency_tree(&self) -> Result<DependencyTree> {
        Ok(self.clone())
    }

    fn satisfied_by(&self, requirement: &Requirement) -> Result<Option<String>> {
        let Some(installed) = self
            .requirements_of(&requirement.name)
            .and_then(|reqs| reqs.satisfied_by.as_ref())
        else {
            return Ok(None);
        };
        if requirement.contains(&installed.version)? {
            Ok(Some(installed.version.clone()))
        } else {
            Ok(None)
        }
    }
}
