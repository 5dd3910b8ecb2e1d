// src/pool.rs

//! The package universe
//!
//! A `Pool` owns every package record drawn from the configured
//! repositories plus the two synthetic ones: the installed system
//! (`@System`) and the command line (`@commandline`). It carries the
//! reldep arena and the name/provides indexes the query and solve paths
//! rely on, and the installonly policy data the goal consumes.
//!
//! Loading mutates the pool through `&mut self`; queries and goals hold
//! `&Pool`, so the borrow checker enforces the snapshot stability that
//! `run()` and `go()` assume.

use crate::arch::detect_arch;
use crate::checksum::Checksum;
use crate::error::Result;
use crate::package::{Package, PackageId, RepoId};
use crate::reldep::{CmpSense, Reldep, ReldepArena, ReldepId};
use crate::version::Evr;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Repo name of the installed-system pseudo-repository
pub const SYSTEM_REPO_NAME: &str = "@System";

/// Repo name of the command-line pseudo-repository
pub const CMDLINE_REPO_NAME: &str = "@commandline";

/// Default number of coexisting versions kept for installonly packages
pub const DEFAULT_INSTALLONLY_LIMIT: usize = 3;

#[derive(Debug)]
struct Repo {
    name: String,
}

/// Everything a solve can see: repos, packages, reldeps, policy
#[derive(Debug)]
pub struct Pool {
    repos: Vec<Repo>,
    packages: Vec<Package>,
    reldeps: ReldepArena,
    name_index: HashMap<String, Vec<PackageId>>,
    provides_index: HashMap<String, Vec<PackageId>>,
    arch: String,
    installonly: HashSet<String>,
    installonly_limit: usize,
}

impl Pool {
    /// Create a pool for the detected host architecture
    pub fn new() -> Result<Self> {
        Ok(Self::with_arch(&detect_arch()?))
    }

    /// Create a pool for an explicit architecture
    pub fn with_arch(arch: &str) -> Self {
        Self {
            repos: Vec::new(),
            packages: Vec::new(),
            reldeps: ReldepArena::new(),
            name_index: HashMap::new(),
            provides_index: HashMap::new(),
            arch: arch.to_string(),
            installonly: HashSet::new(),
            installonly_limit: DEFAULT_INSTALLONLY_LIMIT,
        }
    }

    /// Register a repository by name, reusing an existing id on re-registration
    pub fn add_repo(&mut self, name: &str) -> RepoId {
        if let Some(id) = self.repo_id(name) {
            return id;
        }
        let id = RepoId(self.repos.len() as u32);
        self.repos.push(Repo {
            name: name.to_string(),
        });
        debug!("registered repo '{}'", name);
        id
    }

    pub fn repo_id(&self, name: &str) -> Option<RepoId> {
        self.repos
            .iter()
            .position(|r| r.name == name)
            .map(|i| RepoId(i as u32))
    }

    pub fn repo_name(&self, repo: RepoId) -> &str {
        &self.repos[repo.0 as usize].name
    }

    /// Whether this repo is the installed-system pseudo-repo
    pub fn is_system_repo(&self, repo: RepoId) -> bool {
        self.repo_name(repo) == SYSTEM_REPO_NAME
    }

    /// Materialize one package record into the pool
    ///
    /// Interns the dependency lists, adds the implicit `name = evr`
    /// self-provide, and updates the name and provides indexes.
    pub fn add_package(&mut self, repo: RepoId, spec: PackageSpec) -> Result<PackageId> {
        let evr = Evr::parse(&spec.evr)?;

        let mut provides = Vec::with_capacity(spec.provides.len() + 1);
        // Every package provides its own name at its own EVR.
        provides.push(
            self.reldeps
                .intern(Reldep::new(spec.name.clone(), CmpSense::Eq, evr.clone())),
        );
        for p in &spec.provides {
            provides.push(self.reldeps.intern_str(p)?);
        }
        let requires = self.intern_all(&spec.requires)?;
        let conflicts = self.intern_all(&spec.conflicts)?;
        let obsoletes = self.intern_all(&spec.obsoletes)?;

        let id = PackageId(self.packages.len() as u32);
        let package = Package {
            name: spec.name,
            evr,
            arch: spec.arch,
            repo,
            checksum: spec.checksum,
            provides,
            requires,
            conflicts,
            obsoletes,
        };

        self.name_index
            .entry(package.name.clone())
            .or_default()
            .push(id);
        for &dep in &package.provides {
            let provide_name = self.reldeps.get(dep).name.clone();
            let bucket = self.provides_index.entry(provide_name).or_default();
            if bucket.last() != Some(&id) {
                bucket.push(id);
            }
        }

        debug!("loaded {} from '{}'", package.nevra(), self.repo_name(repo));
        self.packages.push(package);
        Ok(id)
    }

    fn intern_all(&mut self, deps: &[String]) -> Result<Vec<ReldepId>> {
        deps.iter().map(|d| self.reldeps.intern_str(d)).collect()
    }

    pub fn get(&self, id: PackageId) -> &Package {
        &self.packages[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// All package ids in pool-internal (load) order
    pub fn package_ids(&self) -> impl Iterator<Item = PackageId> + '_ {
        (0..self.packages.len() as u32).map(PackageId)
    }

    /// Packages by exact name, via the name index
    pub fn by_name(&self, name: &str) -> &[PackageId] {
        self.name_index.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Packages providing the named capability, via the provides index
    ///
    /// Version restrictions are not applied here; callers check the
    /// candidate's provide reldeps against their requirement.
    pub fn whatprovides_name(&self, name: &str) -> &[PackageId] {
        self.provides_index
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn reldep(&self, id: ReldepId) -> &Reldep {
        self.reldeps.get(id)
    }

    pub fn reldeps(&self) -> &ReldepArena {
        &self.reldeps
    }

    /// Intern a reldep string, for loaders and callers composing filters
    pub fn intern_reldep(&mut self, s: &str) -> Result<ReldepId> {
        self.reldeps.intern_str(s)
    }

    /// Whether this package comes from the installed-system repo
    pub fn is_installed(&self, id: PackageId) -> bool {
        self.is_system_repo(self.get(id).repo)
    }

    /// Installed packages in pool order
    pub fn installed_ids(&self) -> impl Iterator<Item = PackageId> + '_ {
        self.package_ids().filter(|&id| self.is_installed(id))
    }

    pub fn arch(&self) -> &str {
        &self.arch
    }

    pub fn set_arch(&mut self, arch: &str) {
        self.arch = arch.to_string();
    }

    /// Mark package names whose versions install alongside each other
    pub fn set_installonly<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.installonly = names.into_iter().map(Into::into).collect();
    }

    pub fn set_installonly_limit(&mut self, limit: usize) {
        self.installonly_limit = limit;
    }

    pub fn is_installonly(&self, name: &str) -> bool {
        self.installonly.contains(name)
    }

    pub fn installonly_limit(&self) -> usize {
        self.installonly_limit
    }
}

/// Builder for one package record, used by repository loaders and tests
#[derive(Debug, Clone, Default)]
pub struct PackageSpec {
    name: String,
    evr: String,
    arch: String,
    checksum: Option<Checksum>,
    provides: Vec<String>,
    requires: Vec<String>,
    conflicts: Vec<String>,
    obsoletes: Vec<String>,
}

impl PackageSpec {
    pub fn new(name: &str, evr: &str, arch: &str) -> Self {
        Self {
            name: name.to_string(),
            evr: evr.to_string(),
            arch: arch.to_string(),
            ..Default::default()
        }
    }

    pub fn checksum(mut self, checksum: Checksum) -> Self {
        self.checksum = Some(checksum);
        self
    }

    pub fn provides<I: IntoIterator<Item = S>, S: Into<String>>(mut self, deps: I) -> Self {
        self.provides.extend(deps.into_iter().map(Into::into));
        self
    }

    pub fn requires<I: IntoIterator<Item = S>, S: Into<String>>(mut self, deps: I) -> Self {
        self.requires.extend(deps.into_iter().map(Into::into));
        self
    }

    pub fn conflicts<I: IntoIterator<Item = S>, S: Into<String>>(mut self, deps: I) -> Self {
        self.conflicts.extend(deps.into_iter().map(Into::into));
        self
    }

    pub fn obsoletes<I: IntoIterator<Item = S>, S: Into<String>>(mut self, deps: I) -> Self {
        self.obsoletes.extend(deps.into_iter().map(Into::into));
        self
    }
}
