// src/reconcile/conflict.rs

//! Conflict types for lock reconciliation
//!
//! A conflict aborts the whole pass; it carries enough detail to diagnose
//! the failure without re-running.

/// A proposed version that cannot be reconciled with its constraints
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    /// A parent that is staying put requires a range the new version misses
    ParentConstraints {
        package: String,
        version: String,
        /// Every `parent => child (range)` pair that was checked, sorted
        constraints: Vec<String>,
    },
    /// A manifest-declared ancestor no longer accepts its own resolved version
    IncompatibleAncestor {
        package: String,
        version: String,
        ancestor: String,
        declared: String,
        resolved: String,
    },
}

impl Conflict {
    /// Package whose proposed version triggered the conflict
    pub fn package(&self) -> &str {
        match self {
            Conflict::ParentConstraints { package, .. }
            | Conflict::IncompatibleAncestor { package, .. } => package,
        }
    }

    /// The proposed version that could not be accepted
    pub fn version(&self) -> &str {
        match self {
            Conflict::ParentConstraints { version, .. }
            | Conflict::IncompatibleAncestor { version, .. } => version,
        }
    }

    /// Parent → child constraint strings that could not all hold
    pub fn constraints(&self) -> Vec<String> {
        match self {
            Conflict::ParentConstraints { constraints, .. } => constraints.clone(),
            Conflict::IncompatibleAncestor {
                package,
                ancestor,
                declared,
                ..
            } => vec![format!("{} => {} ({})", ancestor, package, declared)],
        }
    }
}

impl std::fmt::Display for Conflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Conflict::ParentConstraints {
                package,
                version,
                constraints,
            } => {
                write!(
                    f,
                    "Cannot resolve {} ({}) due to conflicting parent dependencies:",
                    package, version
                )?;
                for constraint in constraints {
                    write!(f, "\n\t{}", constraint)?;
                }
                Ok(())
            }
            Conflict::IncompatibleAncestor {
                package,
                ancestor,
                declared,
                resolved,
                ..
            } => write!(
                f,
                "Cannot resolve conflicting versions: (Root: {}) {}{} (manifest) incompatible with {}{} (resolved)",
                package, ancestor, declared, ancestor, resolved
            ),
        }
    }
}

impl std::error::Error for Conflict {}
