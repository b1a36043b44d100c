// src/reconcile/validator.rs

//! Constraint validation for updated entries
//!
//! Decides whether a package's newly resolved version is acceptable. The
//! validator either accepts it, swaps it for an already-installed version
//! that satisfies the same constraint, or fails the pass with a conflict.

use super::Pass;
use super::conflict::Conflict;
use super::entry::ResolvedEntry;
use crate::error::Result;
use crate::requirement::{Requirement, normalize_name};
use crate::version::{SpecifierSet, clean_specifier, strip_version};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Validates entries against the manifest, their parents and the
/// installed environment
pub struct ConstraintValidator<'p> {
    pass: &'p Pass<'p>,
}

impl<'p> ConstraintValidator<'p> {
    pub fn new(pass: &'p Pass<'p>) -> Self {
        Self { pass }
    }

    /// Validate an updated entry, possibly rewriting its version and hashes
    ///
    /// When an installed artifact already satisfies the constraint, the
    /// installed version wins over the fresh one. Otherwise every
    /// manifest-declared ancestor must still accept its own resolved version.
    pub fn validate_constraint(&self, entry: &mut ResolvedEntry) -> Result<()> {
        let constraint = self.get_constraint(entry)?;
        match self.pass.environment().satisfied_by(&constraint)? {
            Some(installed) => self.prefer_installed(entry, &constraint, &installed),
            None => self.check_flattened_parents(entry),
        }
    }

    /// The constraint the entry must satisfy
    ///
    /// An explicit constraint from the resolver run takes precedence over
    /// the manifest and parent-derived constraints.
    pub fn get_constraint(&self, entry: &ResolvedEntry) -> Result<Requirement> {
        let explicit = self
            .pass
            .resolver()
            .parsed_constraints()
            .iter()
            .find(|c| normalize_name(&c.name) == entry.normalized_name());
        match explicit {
            Some(constraint) => Requirement::from_specifier(&constraint.name, &constraint.specifier),
            None => self.get_pipfile_constraint(entry),
        }
    }

    /// The manifest's requirement, or one derived from the parents when the
    /// package is only a transitive dependency
    pub fn get_pipfile_constraint(&self, entry: &ResolvedEntry) -> Result<Requirement> {
        match entry.declared_view() {
            Some(declared) => Ok(declared.clone()),
            None => self.constraint_from_parent_conflicts(entry),
        }
    }

    /// Check the new version against every direct parent that stays put
    ///
    /// Parents that are themselves updated in this pass, or that have no
    /// known requirements, are skipped. Any parent whose required range
    /// misses the new version fails the pass; the conflict lists every
    /// parent/child pair that was checked. An unparseable proposed version
    /// counts as a miss rather than an error.
    pub fn constraint_from_parent_conflicts(&self, entry: &ResolvedEntry) -> Result<Requirement> {
        let version = entry.updated_version();
        let mut checked = BTreeSet::new();
        let mut has_mismatch = false;

        for parent in entry.parent_entries(self.pass, false)? {
            if parent.is_updated() {
                continue;
            }
            let Some(requirements) = self.pass.tree().requirements_of(parent.name()) else {
                continue;
            };
            let required = clean_specifier(
                requirements
                    .dependency(entry.name())
                    .map_or("*", |dep| dep.required_version.as_str()),
            );
            checked.insert(format!("{} => {} ({})", parent.name(), entry.name(), required));
            // A proposed version that is not a concrete version (an unpinned
            // VCS or path result) never satisfies a real range
            let accepted = SpecifierSet::parse(&required)?
                .contains_str(&version)
                .unwrap_or(false);
            if !accepted {
                debug!(parent = parent.name(), package = entry.name(), %required, "Parent rejects new version");
                has_mismatch = true;
            }
        }

        if has_mismatch {
            let conflict = Conflict::ParentConstraints {
                package: entry.name().to_string(),
                version,
                constraints: checked.into_iter().collect(),
            };
            warn!(%conflict, "Dependency conflict");
            return Err(conflict.into());
        }
        Ok(entry.fresh_view().clone())
    }

    /// Every manifest-declared ancestor must accept its own resolved version
    ///
    /// Ancestors without an exact pin carry no resolved version and are
    /// skipped.
    pub fn check_flattened_parents(&self, entry: &ResolvedEntry) -> Result<()> {
        for parent in entry.parent_entries(self.pass, true)? {
            let Some(declared) = parent.declared_view() else {
                continue;
            };
            let Some(resolved) = parent.fresh_view().pinned_version() else {
                continue;
            };
            if !declared.contains(&resolved)? {
                let conflict = Conflict::IncompatibleAncestor {
                    package: entry.name().to_string(),
                    version: entry.updated_version(),
                    ancestor: parent.name().to_string(),
                    declared: declared.specifier.to_string(),
                    resolved: parent.updated_specifier(),
                };
                warn!(%conflict, "Dependency conflict");
                return Err(conflict.into());
            }
        }
        Ok(())
    }

    fn prefer_installed(
        &self,
        entry: &mut ResolvedEntry,
        constraint: &Requirement,
        installed: &str,
    ) -> Result<()> {
        let satisfied_by = clean_specifier(installed);
        let installed_version = strip_version(&satisfied_by);
        if installed_version == entry.updated_version() {
            return Ok(());
        }

        info!(
            package = entry.name(),
            installed = %installed_version,
            resolved = %entry.updated_version(),
            "Keeping installed version that satisfies the constraint"
        );
        entry.set_version(&satisfied_by)?;

        let locked = entry.locked_view();
        let hashes = if locked.version() == installed_version {
            if locked.hashes.is_empty() {
                self.pass.resolver().get_hash(locked)?
            } else {
                locked.hashes.clone()
            }
        } else {
            self.pass.resolver().get_hash(constraint)?
        };
        entry.set_hashes(hashes);
        Ok(())
    }
}
