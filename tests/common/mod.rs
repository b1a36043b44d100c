// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use relock::{
    Constraint, LockEntry, Lockfile, Manifest, Project, Requirement, Resolve, ResolveRequest,
    ResolverHandle, Result,
};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use tracing_subscriber::EnvFilter;

/// Route `tracing` output through the test harness; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Build a project from a TOML manifest and a JSON lock.
pub fn project(manifest: &str, lock: &str) -> Project {
    Project::new(
        Manifest::parse(manifest).unwrap(),
        Some(Lockfile::parse(lock).unwrap()),
    )
}

/// Resolver handle with canned constraints and hashes.
///
/// Hashes are keyed by the requirement's display form (`six==1.16.0`);
/// every lookup is recorded.
#[derive(Debug, Default)]
pub struct FakeHandle {
    pub constraints: Vec<Constraint>,
    pub hashes: BTreeMap<String, BTreeSet<String>>,
    pub hash_calls: RefCell<Vec<String>>,
}

impl FakeHandle {
    pub fn with_constraint(mut self, name: &str, specifier: &str) -> Self {
        self.constraints.push(Constraint::new(name, specifier));
        self
    }

    pub fn with_hashes(mut self, requirement: &str, hashes: &[&str]) -> Self {
        self.hashes.insert(
            requirement.to_string(),
            hashes.iter().map(|h| h.to_string()).collect(),
        );
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.hash_calls.borrow().clone()
    }
}

impl ResolverHandle for FakeHandle {
    fn parsed_constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    fn get_hash(&self, requirement: &Requirement) -> Result<BTreeSet<String>> {
        let key = requirement.to_string();
        self.hash_calls.borrow_mut().push(key.clone());
        Ok(self.hashes.get(&key).cloned().unwrap_or_default())
    }
}

/// Resolver returning a fixed result set and recording each request.
#[derive(Debug, Default)]
pub struct FakeResolver {
    pub results: Vec<LockEntry>,
    pub constraints: Vec<Constraint>,
    pub requests: RefCell<Vec<ResolveRequest>>,
}

impl FakeResolver {
    pub fn new(results: Vec<LockEntry>) -> Self {
        Self {
            results,
            ..Self::default()
        }
    }

    pub fn last_request(&self) -> ResolveRequest {
        self.requests.borrow().last().cloned().unwrap()
    }
}

impl Resolve for FakeResolver {
    type Handle = FakeHandle;

    fn resolve(&self, request: &ResolveRequest) -> Result<(Vec<LockEntry>, FakeHandle)> {
        self.requests.borrow_mut().push(request.clone());
        let handle = FakeHandle {
            constraints: self.constraints.clone(),
            ..FakeHandle::default()
        };
        Ok((self.results.clone(), handle))
    }
}

/// Find an output entry by name.
pub fn find<'a>(entries: &'a [LockEntry], name: &str) -> &'a LockEntry {
    entries
        .iter()
        .find(|e| e.name_str() == name)
        .unwrap_or_else(|| panic!("no entry named {}", name))
}
