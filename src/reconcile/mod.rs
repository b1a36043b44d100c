// src/reconcile/mod.rs

//! Lock reconciliation
//!
//! After a fresh resolution, packages that were already locked are merged
//! with their previous lock entries so a re-lock does not needlessly move
//! them. A pass goes through three steps:
//!
//! 1. Split the results into new packages (not in the old lock) and
//!    overlapping ones
//! 2. Emit new packages unchanged, with their versions bare
//! 3. Build a [`ResolvedEntry`] for each overlapping package and emit its
//!    cleaned view, validating any version change against the manifest,
//!    the parents and the installed environment
//!
//! Any conflict aborts the whole pass.

mod conflict;
mod entry;
mod index;
mod validator;

pub use conflict::Conflict;
pub use entry::{EntrySources, ResolvedEntry};
pub use index::{ParentSpec, ReverseDependencies, ReverseDependencyIndex};
pub use validator::ConstraintValidator;

use crate::environment::{DependencyTree, Environment};
use crate::error::{Error, Result};
use crate::project::{LockEntry, Lockfile, Manifest, Project, Section};
use crate::requirement::normalize_name;
use crate::resolver::ResolverHandle;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Reconciles fresh resolver output with a project's previous lock
pub struct Reconciler<'a> {
    lock: Option<&'a Lockfile>,
    manifest: &'a Manifest,
    section: Section,
    resolver: &'a dyn ResolverHandle,
    environment: &'a dyn Environment,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        project: &'a Project,
        resolver: &'a dyn ResolverHandle,
        environment: &'a dyn Environment,
    ) -> Self {
        Self {
            lock: project.lockfile.as_ref(),
            manifest: &project.manifest,
            section: Section::Default,
            resolver,
            environment,
        }
    }

    /// Reconcile against the develop sections instead of the default ones
    pub fn dev(mut self, dev: bool) -> Self {
        self.section = Section::from_dev(dev);
        self
    }

    pub fn section(&self) -> Section {
        self.section
    }

    /// Reconcile resolver results with the previous lock
    ///
    /// Without a previous lock the results are returned unchanged and the
    /// environment is never consulted.
    pub fn reconcile(&self, results: Vec<LockEntry>) -> Result<Vec<LockEntry>> {
        if self.lock.is_none() {
            debug!("No previous lock; keeping resolution unchanged");
            return Ok(results);
        }
        let tree = self.environment.dependency_tree()?;
        let index = self.environment.reverse_dependencies(&tree)?;
        debug!(packages = tree.len(), "Loaded dependency tree");
        self.reconcile_with(results, &index, &tree)
    }

    /// Reconcile using an index and tree the caller already has
    ///
    /// New packages come first, in input order, followed by the overlapping
    /// ones in input order.
    pub fn reconcile_with(
        &self,
        results: Vec<LockEntry>,
        index: &ReverseDependencyIndex,
        tree: &DependencyTree,
    ) -> Result<Vec<LockEntry>> {
        let Some(mut pass) = self.begin_pass(index, tree, &results) else {
            debug!("No previous lock; keeping resolution unchanged");
            return Ok(results);
        };

        let mut reconciled = Vec::with_capacity(results.len());
        let mut overlapping = Vec::new();
        for result in results {
            if result.name.is_none() {
                return Err(Error::Resolver("resolved entry has no name".to_string()));
            }
            if pass.lock.contains(result.name_str(), self.section) {
                overlapping.push(result);
            } else {
                reconciled.push(result.into_bare());
            }
        }

        info!(
            section = %self.section,
            new = reconciled.len(),
            overlapping = overlapping.len(),
            "Reconciling resolution with previous lock"
        );

        for result in overlapping {
            let cleaned = pass.reconcile_entry(result)?;
            pass.record(&cleaned);
            reconciled.push(cleaned);
        }
        Ok(reconciled)
    }

    /// Start a pass over `results`, or `None` when nothing was locked yet
    pub fn begin_pass<'p>(
        &'p self,
        index: &'p ReverseDependencyIndex,
        tree: &'p DependencyTree,
        results: &[LockEntry],
    ) -> Option<Pass<'p>> {
        let lock = self.lock?;
        let arena = results
            .iter()
            .filter(|entry| entry.name.is_some())
            .map(|entry| (normalize_name(entry.name_str()), entry.clone().into_pinned()))
            .collect();
        Some(Pass {
            reconciler: self,
            lock,
            index,
            tree,
            arena,
        })
    }
}

/// State shared by every entry of one reconciliation pass
///
/// The arena holds the current entry dict of every package in this
/// resolution, keyed by normalized name. Each cleaned entry is written back
/// as soon as it is produced, so later parent lookups see prior edits.
pub struct Pass<'p> {
    reconciler: &'p Reconciler<'p>,
    lock: &'p Lockfile,
    index: &'p ReverseDependencyIndex,
    tree: &'p DependencyTree,
    arena: BTreeMap<String, LockEntry>,
}

impl<'p> Pass<'p> {
    pub fn section(&self) -> Section {
        self.reconciler.section
    }

    pub fn index(&self) -> &'p ReverseDependencyIndex {
        self.index
    }

    pub fn tree(&self) -> &'p DependencyTree {
        self.tree
    }

    pub fn resolver(&self) -> &'p dyn ResolverHandle {
        self.reconciler.resolver
    }

    pub fn environment(&self) -> &'p dyn Environment {
        self.reconciler.environment
    }

    /// Current dict of a package in this resolution
    pub fn current(&self, name: &str) -> Option<&LockEntry> {
        self.arena.get(&normalize_name(name))
    }

    /// Build an entry from a fresh dict plus the lock and manifest state
    pub fn entry(&self, name: &str, fresh: LockEntry) -> Result<ResolvedEntry> {
        let section = self.section();
        ResolvedEntry::new(
            name,
            EntrySources {
                fresh: Some(fresh),
                locked: self.lock.locked_entry(name, section).cloned(),
                declared: self
                    .reconciler
                    .manifest
                    .declared_requirement(name, section)
                    .map(|(key, entry)| (key.to_string(), entry)),
            },
        )
    }

    /// Build the entry for a parent spec from the reverse-dependency index
    ///
    /// A parent that is part of this resolution uses its current dict;
    /// otherwise the spec's own constraint stands in for the fresh dict.
    pub fn parent_entry(&self, spec: &str) -> Result<ResolvedEntry> {
        let spec = ParentSpec::parse(spec);
        let fresh = match self.current(&spec.name) {
            Some(current) => current.clone(),
            None => LockEntry::new(&spec.name, &spec.specifier),
        };
        self.entry(&spec.name, fresh)
    }

    fn reconcile_entry(&self, result: LockEntry) -> Result<LockEntry> {
        let name = result.name_str().to_string();
        let mut entry = self.entry(&name, result)?;

        // An editable install is never replaced by a non-editable one
        if entry.was_editable() && !entry.is_editable() {
            info!(package = %name, "Keeping editable lock entry");
            let mut kept = entry.locked_dict().clone().into_bare();
            kept.name = Some(name);
            return Ok(kept);
        }

        if entry.has_markers() && !entry.had_markers() && !entry.is_updated() {
            debug!(package = %name, "Dropping markers added without a version change");
            entry.drop_markers();
        }

        let validator = ConstraintValidator::new(self);
        entry.get_cleaned_view(&validator)
    }

    fn record(&mut self, cleaned: &LockEntry) {
        self.arena.insert(
            normalize_name(cleaned.name_str()),
            cleaned.clone().into_pinned(),
        );
    }
}
