// src/session.rs

//! One lock session: resolve, then optionally reconcile with the old lock
//!
//! [`parse_packages`] covers the parse-only mode, turning requirement lines
//! into named entry dicts without resolving anything.

use crate::config::LockConfig;
use crate::environment::Environment;
use crate::error::Result;
use crate::project::{LockEntry, Project};
use crate::reconcile::Reconciler;
use crate::requirement::Requirement;
use crate::resolver::{Resolve, ResolveRequest, replace_pypi_sources};
use tracing::{info, warn};

/// Parse requirement lines into `(name, entry)` pairs
///
/// Lines that fail to parse are logged and skipped; the rest keep their
/// input order.
pub fn parse_packages(lines: &[String]) -> Vec<(String, LockEntry)> {
    lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match Requirement::from_line(line) {
            Ok(requirement) => Some((requirement.name.clone(), requirement.to_entry())),
            Err(e) => {
                warn!(line = %line, error = %e, "Skipping unparseable requirement");
                None
            }
        })
        .collect()
}

/// Resolve `packages` and produce the entries for the configured section
///
/// Lines from [`LockConfig::packages`] are appended to `packages`. With
/// `keep_outdated` set, the fresh resolution is reconciled with the
/// previous lock so that unchanged packages keep their locked state.
/// Otherwise the resolver's output is returned as-is.
pub fn lock_packages<R: Resolve>(
    resolver: &R,
    environment: &dyn Environment,
    project: &Project,
    packages: &[String],
    config: &LockConfig,
) -> Result<Vec<LockEntry>> {
    let sources = match config.mirror()? {
        Some(mirror) => replace_pypi_sources(&project.manifest.sources, &mirror),
        None => project.manifest.sources.clone(),
    };
    let request = ResolveRequest {
        packages: packages.iter().chain(&config.packages).cloned().collect(),
        sources,
        pre: config.pre,
        clear: config.clear,
        dev: config.dev,
    };

    info!(
        section = %config.section(),
        packages = request.packages.len(),
        "Resolving dependencies"
    );
    let (results, handle) = resolver.resolve(&request)?;

    if !config.keep_outdated {
        return Ok(results);
    }
    Reconciler::new(project, &handle, environment)
        .dev(config.dev)
        .reconcile(results)
}
