// src/resolver/mod.rs

//! Seam to the external dependency resolver
//!
//! The resolver itself lives outside this crate. [`Resolve`] runs it and
//! returns the resolved entries together with a [`ResolverHandle`], which
//! reconciliation queries for explicit constraints and artifact hashes.
//!
//! Package-index mirroring is handled here as well: when a mirror is
//! configured, it replaces the public index in the source list handed to
//! the resolver.

use crate::error::Result;
use crate::project::{LockEntry, Source};
use crate::requirement::Requirement;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;
use url::Url;

/// Host names of the public package index
const PYPI_HOSTS: &[&str] = &["pypi.org", "pypi.python.org"];

/// An explicit constraint the resolver was run with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub name: String,
    /// Specifier text, e.g. `>=2.0,<3`
    pub specifier: String,
}

impl Constraint {
    pub fn new(name: &str, specifier: &str) -> Self {
        Self {
            name: name.to_string(),
            specifier: specifier.to_string(),
        }
    }
}

/// Everything the resolver needs for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveRequest {
    /// Requirement lines to resolve (`requests>=2`)
    pub packages: Vec<String>,
    pub sources: Vec<Source>,
    /// Admit pre-release versions
    pub pre: bool,
    /// Ignore any resolver cache
    pub clear: bool,
    /// Resolving the develop group
    pub dev: bool,
}

/// Queries reconciliation makes against a finished resolver run
pub trait ResolverHandle {
    /// Explicit constraints the run was given
    fn parsed_constraints(&self) -> &[Constraint];

    /// Artifact hashes for a requirement
    fn get_hash(&self, requirement: &Requirement) -> Result<BTreeSet<String>>;
}

/// Runs the external resolver
pub trait Resolve {
    type Handle: ResolverHandle;

    fn resolve(&self, request: &ResolveRequest) -> Result<(Vec<LockEntry>, Self::Handle)>;
}

/// Check whether a URL points at the public index's simple API
pub fn is_pypi_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    matches!(parsed.scheme(), "http" | "https")
        && parsed.host_str().is_some_and(|host| PYPI_HOSTS.contains(&host))
        && matches!(parsed.path(), "/simple" | "/simple/")
}

/// Build a source entry for a mirror, named after its host
pub fn create_mirror_source(mirror: &Url) -> Source {
    Source {
        name: mirror.host_str().unwrap_or("mirror").to_string(),
        url: mirror.to_string(),
        verify_ssl: mirror.scheme() == "https",
    }
}

/// Put the mirror first and drop every public-index source
pub fn replace_pypi_sources(sources: &[Source], mirror: &Url) -> Vec<Source> {
    let mirror_source = create_mirror_source(mirror);
    debug!(mirror = %mirror_source.url, "Replacing public index sources with mirror");
    std::iter::once(mirror_source)
        .chain(sources.iter().filter(|s| !is_pypi_url(&s.url)).cloned())
        .collect()
}
