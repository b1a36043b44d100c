// src/config.rs
//! Lock session configuration
//!
//! Settings come from an optional TOML file and can be overridden through
//! environment variables:
//!
//! | Variable               | Field           |
//! |------------------------|-----------------|
//! | `RELOCK_DEV`           | `dev`           |
//! | `RELOCK_PRE`           | `pre`           |
//! | `RELOCK_CLEAR`         | `clear`         |
//! | `RELOCK_KEEP_OUTDATED` | `keep_outdated` |
//! | `RELOCK_PYPI_MIRROR`   | `pypi_mirror`   |
//! | `RELOCK_PACKAGES`      | `packages`      |
//!
//! `RELOCK_PACKAGES` holds one requirement line per line of its value.

use crate::error::{Error, Result};
use crate::project::Section;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use url::Url;

const ENV_DEV: &str = "RELOCK_DEV";
const ENV_PRE: &str = "RELOCK_PRE";
const ENV_CLEAR: &str = "RELOCK_CLEAR";
const ENV_KEEP_OUTDATED: &str = "RELOCK_KEEP_OUTDATED";
const ENV_PYPI_MIRROR: &str = "RELOCK_PYPI_MIRROR";
const ENV_PACKAGES: &str = "RELOCK_PACKAGES";

/// Options for one lock session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Lock the develop group instead of the default one
    pub dev: bool,
    /// Admit pre-release versions
    pub pre: bool,
    /// Ignore any resolver cache
    pub clear: bool,
    /// Reconcile against the previous lock instead of taking the fresh
    /// resolution as-is
    pub keep_outdated: bool,
    /// Mirror URL replacing the public package index
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pypi_mirror: Option<String>,
    /// Extra requirement lines resolved alongside the requested packages
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub packages: Vec<String>,
}

impl LockConfig {
    /// Parse configuration from TOML
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Default configuration with the process environment applied
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides(std::env::vars())
    }

    /// Apply overrides from `(variable, value)` pairs
    ///
    /// Unrelated variables are ignored. An empty mirror value clears the
    /// mirror; blank package lines are dropped.
    pub fn with_env_overrides<I, K, V>(mut self, vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let (key, value) = (key.as_ref(), value.as_ref());
            match key {
                ENV_DEV => self.dev = parse_flag(key, value)?,
                ENV_PRE => self.pre = parse_flag(key, value)?,
                ENV_CLEAR => self.clear = parse_flag(key, value)?,
                ENV_KEEP_OUTDATED => self.keep_outdated = parse_flag(key, value)?,
                ENV_PYPI_MIRROR => {
                    let value = value.trim();
                    self.pypi_mirror = (!value.is_empty()).then(|| value.to_string());
                }
                ENV_PACKAGES => {
                    self.packages = value
                        .lines()
                        .map(str::trim)
                        .filter(|line| !line.is_empty())
                        .map(str::to_string)
                        .collect();
                }
                _ => {}
            }
        }
        Ok(self)
    }

    pub fn section(&self) -> Section {
        Section::from_dev(self.dev)
    }

    /// The configured mirror, validated as a URL
    pub fn mirror(&self) -> Result<Option<Url>> {
        self.pypi_mirror
            .as_deref()
            .map(|raw| {
                Url::parse(raw)
                    .map_err(|e| Error::Config(format!("invalid mirror URL '{}': {}", raw, e)))
            })
            .transpose()
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!(
            "{} must be a boolean, got '{}'",
            key, other
        ))),
    }
}
