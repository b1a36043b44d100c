// src/project/mod.rs

//! Project snapshots: the manifest and the previous lock state
//!
//! Both are read-only inputs to a reconciliation pass. The manifest holds
//! the declared direct dependencies; the lockfile holds the fully resolved
//! set from the last lock, if one exists.

mod lockfile;
mod manifest;

pub use lockfile::{LockEntry, Lockfile};
pub use manifest::{DeclaredRequirement, Manifest, Source};

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use strum_macros::{AsRefStr, Display};

/// Which dependency group a pass operates on
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, AsRefStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Section {
    /// Runtime dependencies (`[packages]` / `"default"`)
    #[default]
    Default,
    /// Development dependencies (`[dev-packages]` / `"develop"`)
    Develop,
}

impl Section {
    pub fn from_dev(dev: bool) -> Self {
        if dev { Section::Develop } else { Section::Default }
    }
}

/// A manifest together with its previous lock state
#[derive(Debug, Clone, Default)]
pub struct Project {
    pub manifest: Manifest,
    pub lockfile: Option<Lockfile>,
}

impl Project {
    pub fn new(manifest: Manifest, lockfile: Option<Lockfile>) -> Self {
        Self { manifest, lockfile }
    }

    /// Load a project; a missing lock file means nothing was locked yet
    pub fn load(manifest_path: &Path, lock_path: &Path) -> Result<Self> {
        let manifest = Manifest::from_file(manifest_path)?;
        let lockfile = if lock_path.exists() {
            Some(Lockfile::from_file(lock_path)?)
        } else {
            None
        };
        Ok(Self { manifest, lockfile })
    }

    pub fn lock_exists(&self) -> bool {
        self.lockfile.is_some()
    }
}
