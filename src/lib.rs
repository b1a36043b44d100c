// src/lib.rs

//! Relock: lockfile reconciliation
//!
//! Merges a fresh dependency resolution with a project's previous lock so
//! that re-locking keeps unchanged packages stable, and refuses version
//! changes that break the manifest or the packages depending on them.
//!
//! # Architecture
//!
//! - Snapshots: manifest, lockfile and dependency tree are plain serde data
//! - Seams: the resolver and the environment are traits the host implements
//! - Passes: each reconciliation owns its entry arena; nothing is global
//! - Conflicts: one typed error aborts the pass with full diagnostics

pub mod config;
pub mod environment;
mod error;
pub mod project;
pub mod reconcile;
pub mod requirement;
pub mod resolver;
pub mod session;
pub mod version;

pub use config::LockConfig;
pub use environment::{DependencyTree, Environment, PackageRequirements, RequiredDependency};
pub use error::{Error, Result};
pub use project::{DeclaredRequirement, LockEntry, Lockfile, Manifest, Project, Section, Source};
pub use reconcile::{
    Conflict, ConstraintValidator, EntrySources, ParentSpec, Reconciler, ResolvedEntry,
    ReverseDependencyIndex,
};
pub use requirement::{Requirement, normalize_name};
pub use resolver::{Constraint, Resolve, ResolveRequest, ResolverHandle};
pub use session::{lock_packages, parse_packages};
pub use version::{SpecifierSet, Version};
