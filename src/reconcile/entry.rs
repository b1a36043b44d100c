// src/reconcile/entry.rs

//! One package's state across the fresh resolution, the old lock and the
//! manifest
//!
//! An entry is assembled from up to three dicts. Every view is derived once
//! when the entry is built; the few mutations reconciliation needs (version
//! rewrite, hash replacement, marker removal) re-derive the fresh view so it
//! never goes stale.

use super::Pass;
use super::validator::ConstraintValidator;
use crate::error::{Error, Result};
use crate::project::LockEntry;
use crate::requirement::Requirement;
use crate::version::{clean_specifier, strip_version};
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

/// Raw dicts an entry is built from; at least one of `fresh`/`locked`
/// must be present
#[derive(Debug, Clone, Default)]
pub struct EntrySources {
    pub fresh: Option<LockEntry>,
    pub locked: Option<LockEntry>,
    /// Manifest key and declared requirement, when the package is declared
    pub declared: Option<(String, LockEntry)>,
}

/// A package as seen by one reconciliation pass
#[derive(Debug, Clone)]
pub struct ResolvedEntry {
    name: String,
    dict: LockEntry,
    locked_dict: LockEntry,
    fresh: Requirement,
    locked: Requirement,
    declared: Option<Requirement>,
}

impl ResolvedEntry {
    /// Build an entry, deriving all three views
    ///
    /// A missing locked dict defaults to the fresh one (and vice versa).
    pub fn new(name: &str, sources: EntrySources) -> Result<Self> {
        let (mut dict, locked_dict) = match (sources.fresh, sources.locked) {
            (Some(fresh), Some(locked)) => (fresh, locked),
            (Some(fresh), None) => (fresh.clone(), fresh),
            (None, Some(locked)) => (locked.clone(), locked),
            (None, None) => return Err(Error::MissingSource(name.to_string())),
        };
        dict.version = dict.version.map(|v| clean_specifier(&v));

        let fresh = Requirement::from_entry(name, &dict)?;
        let locked = Requirement::from_entry(name, &locked_dict)?;
        let declared = sources
            .declared
            .map(|(declared_name, entry)| Requirement::from_entry(&declared_name, &entry))
            .transpose()?;

        Ok(Self {
            name: name.to_string(),
            dict,
            locked_dict,
            fresh,
            locked,
            declared,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn normalized_name(&self) -> &str {
        &self.fresh.normalized_name
    }

    /// The freshly resolved requirement
    pub fn fresh_view(&self) -> &Requirement {
        &self.fresh
    }

    /// The requirement as previously locked
    pub fn locked_view(&self) -> &Requirement {
        &self.locked
    }

    /// The manifest's requirement, when the package is declared there
    pub fn declared_view(&self) -> Option<&Requirement> {
        self.declared.as_ref()
    }

    /// The working dict (fresh values plus any reconciliation edits)
    pub fn dict(&self) -> &LockEntry {
        &self.dict
    }

    /// The old lock dict, unchanged
    pub fn locked_dict(&self) -> &LockEntry {
        &self.locked_dict
    }

    pub fn is_declared(&self) -> bool {
        self.declared.is_some()
    }

    /// True when the resolution moved away from the locked specifier
    pub fn is_updated(&self) -> bool {
        self.fresh.specifier != self.locked.specifier
    }

    pub fn is_editable(&self) -> bool {
        self.fresh.editable
    }

    pub fn was_editable(&self) -> bool {
        self.locked.editable
    }

    pub fn has_markers(&self) -> bool {
        self.fresh.has_markers()
    }

    pub fn had_markers(&self) -> bool {
        self.locked.has_markers()
    }

    /// Fresh specifier, e.g. `==2.0.1`
    pub fn updated_specifier(&self) -> String {
        self.fresh.specifier.to_string()
    }

    /// Fresh version without its operator
    pub fn updated_version(&self) -> String {
        self.fresh.version()
    }

    /// Parent entries from the reverse-dependency index
    ///
    /// With `unnest`, each parent that is not declared in the manifest is
    /// followed by its own parents, up to the declared ancestors. Every
    /// package is visited at most once, so dependency cycles terminate.
    pub fn parent_entries(&self, pass: &Pass<'_>, unnest: bool) -> Result<Vec<ResolvedEntry>> {
        let mut visited = HashSet::from([self.normalized_name().to_string()]);
        collect_parents(pass, self.normalized_name(), unnest, &mut visited)
    }

    pub(crate) fn set_version(&mut self, specifier: &str) -> Result<()> {
        self.dict.version = Some(clean_specifier(specifier));
        self.fresh = Requirement::from_entry(&self.name, &self.dict)?;
        Ok(())
    }

    pub(crate) fn set_hashes(&mut self, hashes: BTreeSet<String>) {
        self.dict.hashes = hashes.iter().cloned().collect();
        self.fresh.hashes = hashes;
    }

    pub(crate) fn set_extras(&mut self, extras: BTreeSet<String>) {
        self.dict.extras = extras.iter().cloned().collect();
        self.fresh.extras = extras;
    }

    pub(crate) fn drop_markers(&mut self) {
        self.dict.markers = None;
        self.fresh.markers = None;
    }

    /// Produce the final lock entry
    ///
    /// Updated entries are validated first. Extras become the union of the
    /// fresh and locked sets. Hashes become the union only when the version
    /// did not move; an updated entry keeps the fresh hashes alone. The
    /// version is emitted bare, without its operator.
    pub fn get_cleaned_view(&mut self, validator: &ConstraintValidator<'_>) -> Result<LockEntry> {
        if self.is_updated() {
            debug!(
                package = %self.name,
                locked = %self.locked.specifier,
                resolved = %self.fresh.specifier,
                "Validating updated entry"
            );
            validator.validate_constraint(self)?;
        }

        if self.fresh.extras != self.locked.extras {
            let extras = self.fresh.extras.union(&self.locked.extras).cloned().collect();
            self.set_extras(extras);
        }

        if self.fresh.hashes != self.locked.hashes && !self.is_updated() {
            let hashes = self.fresh.hashes.union(&self.locked.hashes).cloned().collect();
            self.set_hashes(hashes);
        }

        let mut cleaned = self.dict.clone();
        cleaned.name = Some(self.name.clone());
        cleaned.version = cleaned.version.map(|v| strip_version(&v));
        Ok(cleaned)
    }
}

fn collect_parents(
    pass: &Pass<'_>,
    name: &str,
    unnest: bool,
    visited: &mut HashSet<String>,
) -> Result<Vec<ResolvedEntry>> {
    let mut parents = Vec::new();
    for spec in pass.index().parents_of(name) {
        let parent = pass.parent_entry(spec)?;
        let key = parent.normalized_name().to_string();
        if !visited.insert(key.clone()) {
            continue;
        }
        let recurse = unnest && !parent.is_declared() && pass.index().has_parents(&key);
        parents.push(parent);
        if recurse {
            parents.extend(collect_parents(pass, &key, unnest, visited)?);
        }
    }
    Ok(parents)
}
