// src/package.rs

//! Immutable package records
//!
//! A package is identified by its NEVRA tuple plus the repo it was
//! loaded from. Packages from the installed-system pseudo-repo are the
//! same type as available ones; "is this installed" is a question about
//! the repo of origin, and every filter that means installed-state asks
//! it that way.

use crate::checksum::Checksum;
use crate::reldep::ReldepId;
use crate::version::Evr;
use std::cmp::Ordering;
use std::fmt;

/// Handle to a package in the pool's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId(pub(crate) u32);

/// Handle to a repository registered with the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RepoId(pub(crate) u32);

/// One package as materialized from repository metadata
#[derive(Debug, Clone)]
pub struct Package {
    pub name: String,
    pub evr: Evr,
    pub arch: String,
    pub repo: RepoId,
    pub checksum: Option<Checksum>,
    pub provides: Vec<ReldepId>,
    pub requires: Vec<ReldepId>,
    pub conflicts: Vec<ReldepId>,
    pub obsoletes: Vec<ReldepId>,
}

impl Package {
    /// Render the full NEVRA, e.g. "penny-lib-4-1.x86_64"
    pub fn nevra(&self) -> String {
        format!("{}-{}.{}", self.name, self.evr, self.arch)
    }

    /// NEVRA ordering: name, then EVR, then arch
    pub fn cmp_nevra(&self, other: &Package) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.evr.compare(&other.evr))
            .then_with(|| self.arch.cmp(&other.arch))
    }

    /// Same identity: equal on every NEVRA component
    pub fn same_nevra(&self, other: &Package) -> bool {
        self.name == other.name
            && self.arch == other.arch
            && self.evr.epoch == other.evr.epoch
            && self.evr.version == other.evr.version
            && self.evr.release == other.evr.release
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.nevra())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkg(name: &str, evr: &str, arch: &str) -> Package {
        Package {
            name: name.to_string(),
            evr: Evr::parse(evr).unwrap(),
            arch: arch.to_string(),
            repo: RepoId(0),
            checksum: None,
            provides: Vec::new(),
            requires: Vec::new(),
            conflicts: Vec::new(),
            obsoletes: Vec::new(),
        }
    }

    #[test]
    fn test_nevra_rendering() {
        assert_eq!(pkg("penny-lib", "4-1", "x86_64").nevra(), "penny-lib-4-1.x86_64");
        assert_eq!(pkg("baby", "6:5.0-11", "x86_64").nevra(), "baby-6:5.0-11.x86_64");
    }

    #[test]
    fn test_cmp_nevra() {
        let older = pkg("fool", "1-3", "noarch");
        let newer = pkg("fool", "1-5", "noarch");
        assert_eq!(older.cmp_nevra(&newer), Ordering::Less);
        assert!(pkg("a", "1-1", "noarch").cmp_nevra(&pkg("b", "1-1", "noarch")) == Ordering::Less);
    }

    #[test]
    fn test_same_nevra() {
        assert!(pkg("penny", "4-1", "noarch").same_nevra(&pkg("penny", "4-1", "noarch")));
        assert!(!pkg("penny", "4-1", "noarch").same_nevra(&pkg("penny", "4-1", "x86_64")));
    }
}
