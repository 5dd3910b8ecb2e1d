// src/query/mod.rs

//! Query selection sublanguage
//!
//! A query is an ordered conjunction of filter clauses over the pool.
//! Clauses AND together; a sequence match-value ORs within its clause.
//! Filters are validated eagerly at `filter()` time so that job
//! construction fails fast; evaluation is lazy and happens in `run()`,
//! which never mutates the pool.
//!
//! The `latest` reduction applies strictly after all other clauses,
//! negated ones included. It is a candidate-selection policy, not an
//! installed-state filter: installed-repo packages always pass through.

use crate::error::{Error, Result};
use crate::package::PackageId;
use crate::pool::Pool;
use crate::reldep::Reldep;
use crate::version::{rpmvercmp, Evr};
use glob::{MatchOptions, Pattern};
use std::cmp::Ordering;
use std::collections::HashMap;
use strum_macros::Display;
use tracing::debug;

/// Package attribute a clause matches against
///
/// The discriminants are part of the external enumeration contract;
/// callers persist them, so the values must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
#[repr(u32)]
pub enum QueryKey {
    Name = 0,
    Epoch = 1,
    Version = 2,
    Release = 3,
    Evr = 4,
    Arch = 5,
    Nevra = 6,
    Repo = 7,
    Checksum = 8,
    Provides = 9,
    Requires = 10,
    Conflicts = 11,
    Obsoletes = 12,
}

/// Core comparison operators
///
/// Discriminants are stable (external enumeration contract).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
#[repr(u32)]
pub enum CmpOp {
    Eq = 0,
    Neq = 1,
    Gt = 2,
    Lt = 3,
    Gte = 4,
    Lte = 5,
    Substr = 6,
    Glob = 7,
}

impl CmpOp {
    /// Negate the whole clause
    pub fn not(self) -> Cmp {
        Cmp::from(self).not()
    }

    /// Match strings case-insensitively
    pub fn icase(self) -> Cmp {
        Cmp::from(self).icase()
    }
}

/// A comparison operator with its clause modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cmp {
    pub op: CmpOp,
    pub negated: bool,
    pub case_insensitive: bool,
}

impl Cmp {
    pub fn not(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    pub fn icase(mut self) -> Self {
        self.case_insensitive = true;
        self
    }
}

impl From<CmpOp> for Cmp {
    fn from(op: CmpOp) -> Self {
        Self {
            op,
            negated: false,
            case_insensitive: false,
        }
    }
}

/// Clause match value; sequences OR within the clause
#[derive(Debug, Clone)]
pub enum MatchValue {
    Str(String),
    StrSeq(Vec<String>),
    Num(u64),
    Reldep(Reldep),
    ReldepSeq(Vec<Reldep>),
}

impl From<&str> for MatchValue {
    fn from(s: &str) -> Self {
        MatchValue::Str(s.to_string())
    }
}

impl From<String> for MatchValue {
    fn from(s: String) -> Self {
        MatchValue::Str(s)
    }
}

impl<const N: usize> From<[&str; N]> for MatchValue {
    fn from(vals: [&str; N]) -> Self {
        MatchValue::StrSeq(vals.iter().map(|s| s.to_string()).collect())
    }
}

impl From<Vec<String>> for MatchValue {
    fn from(vals: Vec<String>) -> Self {
        MatchValue::StrSeq(vals)
    }
}

impl From<u64> for MatchValue {
    fn from(n: u64) -> Self {
        MatchValue::Num(n)
    }
}

impl From<Reldep> for MatchValue {
    fn from(r: Reldep) -> Self {
        MatchValue::Reldep(r)
    }
}

impl From<Vec<Reldep>> for MatchValue {
    fn from(rs: Vec<Reldep>) -> Self {
        MatchValue::ReldepSeq(rs)
    }
}

/// One validated filter clause
#[derive(Debug, Clone)]
struct Clause {
    key: QueryKey,
    cmp: Cmp,
    value: MatchValue,
}

/// A lazily evaluated filter pipeline over one pool
#[derive(Clone)]
pub struct Query<'pool> {
    pool: &'pool Pool,
    clauses: Vec<Clause>,
    latest: bool,
    sorted: bool,
}

impl<'pool> Query<'pool> {
    /// An empty query matches every package in the pool
    pub fn new(pool: &'pool Pool) -> Self {
        Self {
            pool,
            clauses: Vec::new(),
            latest: false,
            sorted: false,
        }
    }

    pub fn pool(&self) -> &'pool Pool {
        self.pool
    }

    /// Append a filter clause
    ///
    /// Fails with `InvalidFilter` when the key, comparison, and value
    /// do not fit together; a failed call leaves the query unchanged.
    pub fn filter(
        &mut self,
        key: QueryKey,
        cmp: impl Into<Cmp>,
        value: impl Into<MatchValue>,
    ) -> Result<()> {
        let cmp = cmp.into();
        let value = value.into();
        let value = validate(key, cmp, value)?;
        self.clauses.push(Clause { key, cmp, value });
        Ok(())
    }

    /// Reduce the result to the highest-EVR package per name group
    /// (per name/arch group when an arch clause is present) among
    /// non-installed matches
    pub fn filter_latest(&mut self, enabled: bool) {
        self.latest = enabled;
    }

    /// Request deterministic NEVRA ordering of the result: descending
    /// when `latest` is set, ascending otherwise
    pub fn sort_results(&mut self, enabled: bool) {
        self.sorted = enabled;
    }

    /// Whether the goal layer can hand this query to the solver as a
    /// candidate selection (plain equality clauses on package identity
    /// attributes only)
    pub fn is_selection(&self) -> bool {
        !self.latest
            && self.clauses.iter().all(|c| {
                c.cmp.op == CmpOp::Eq
                    && !c.cmp.negated
                    && !c.cmp.case_insensitive
                    && matches!(
                        c.key,
                        QueryKey::Name
                            | QueryKey::Epoch
                            | QueryKey::Version
                            | QueryKey::Release
                            | QueryKey::Evr
                            | QueryKey::Arch
                            | QueryKey::Nevra
                    )
            })
    }

    /// Evaluate the query
    ///
    /// Infallible: every failure mode was rejected eagerly by `filter()`.
    /// Idempotent and restartable; results come back in pool-internal
    /// order unless sorting was requested.
    pub fn run(&self) -> Vec<PackageId> {
        let mut result: Vec<PackageId> = self
            .initial_candidates()
            .into_iter()
            .filter(|&id| self.clauses.iter().all(|c| clause_matches(self.pool, c, id)))
            .collect();

        if self.latest {
            self.reduce_latest(&mut result);
        }

        if self.sorted {
            let pool = self.pool;
            result.sort_by(|&a, &b| {
                let ord = pool.get(a).cmp_nevra(pool.get(b));
                if self.latest { ord.reverse() } else { ord }
            });
        }

        debug!("query matched {} of {} packages", result.len(), self.pool.len());
        result
    }

    pub fn count(&self) -> usize {
        self.run().len()
    }

    /// Seed the candidate set from an index when a hot-path clause allows it
    fn initial_candidates(&self) -> Vec<PackageId> {
        for clause in &self.clauses {
            if clause.cmp.negated || clause.cmp.case_insensitive || clause.cmp.op != CmpOp::Eq {
                continue;
            }
            match (clause.key, &clause.value) {
                (QueryKey::Name, MatchValue::Str(name)) => {
                    return self.pool.by_name(name).to_vec();
                }
                (QueryKey::Name, MatchValue::StrSeq(names)) => {
                    let mut ids: Vec<PackageId> =
                        names.iter().flat_map(|n| self.pool.by_name(n)).copied().collect();
                    ids.sort_unstable();
                    ids.dedup();
                    return ids;
                }
                (QueryKey::Provides, MatchValue::Reldep(dep)) => {
                    return self.pool.whatprovides_name(&dep.name).to_vec();
                }
                _ => {}
            }
        }
        self.pool.package_ids().collect()
    }

    /// Keep the single maximal-NEVRA package per group among
    /// non-installed matches
    fn reduce_latest(&self, result: &mut Vec<PackageId>) {
        let per_arch = self.clauses.iter().any(|c| c.key == QueryKey::Arch);
        let mut best: HashMap<(String, Option<String>), PackageId> = HashMap::new();

        for &id in result.iter() {
            if self.pool.is_installed(id) {
                continue;
            }
            let pkg = self.pool.get(id);
            let group = (pkg.name.clone(), per_arch.then(|| pkg.arch.clone()));
            match best.get_mut(&group) {
                Some(leader) if self.pool.get(*leader).cmp_nevra(pkg) != Ordering::Less => {}
                Some(leader) => *leader = id,
                None => {
                    best.insert(group, id);
                }
            }
        }

        result.retain(|&id| {
            if self.pool.is_installed(id) {
                return true;
            }
            let pkg = self.pool.get(id);
            let group = (pkg.name.clone(), per_arch.then(|| pkg.arch.clone()));
            best.get(&group) == Some(&id)
        });
    }
}

/// Eager clause validation; returns the (possibly normalized) value
fn validate(key: QueryKey, cmp: Cmp, value: MatchValue) -> Result<MatchValue> {
    use CmpOp::*;
    use QueryKey::*;

    let allowed = match key {
        Name | Arch | Nevra => matches!(cmp.op, Eq | Neq | Substr | Glob),
        Version | Release => matches!(cmp.op, Eq | Neq | Gt | Lt | Gte | Lte | Substr | Glob),
        Epoch | Evr => matches!(cmp.op, Eq | Neq | Gt | Lt | Gte | Lte),
        Repo | Checksum => matches!(cmp.op, Eq | Neq),
        Provides | Requires | Conflicts | Obsoletes => cmp.op == Eq,
    };
    if !allowed {
        return Err(Error::InvalidFilter(format!(
            "comparison '{}' is not valid for key '{}'",
            cmp.op, key
        )));
    }

    // Value domain checks, with normalization of dependency strings and
    // eager parse validation for version-typed values.
    match key {
        Epoch => match &value {
            MatchValue::Num(_) => Ok(value),
            MatchValue::Str(s) => {
                let n = s.parse::<u64>().map_err(|_| {
                    Error::InvalidFilter(format!("epoch value '{}' is not numeric", s))
                })?;
                Ok(MatchValue::Num(n))
            }
            _ => Err(Error::InvalidFilter(
                "epoch filters take a numeric value".to_string(),
            )),
        },
        Evr if matches!(cmp.op, Gt | Lt | Gte | Lte | Eq | Neq) => match &value {
            MatchValue::Str(s) => {
                crate::version::Evr::parse(s)
                    .map_err(|e| Error::InvalidFilter(format!("bad evr value: {}", e)))?;
                Ok(value)
            }
            MatchValue::StrSeq(seq) => {
                for s in seq {
                    crate::version::Evr::parse(s)
                        .map_err(|e| Error::InvalidFilter(format!("bad evr value: {}", e)))?;
                }
                Ok(value)
            }
            _ => Err(Error::InvalidFilter(
                "evr filters take a string value".to_string(),
            )),
        },
        Provides | Requires | Conflicts | Obsoletes => match value {
            MatchValue::Reldep(_) | MatchValue::ReldepSeq(_) => Ok(value),
            MatchValue::Str(s) => Ok(MatchValue::Reldep(
                Reldep::parse(&s)
                    .map_err(|e| Error::InvalidFilter(format!("bad reldep value: {}", e)))?,
            )),
            MatchValue::StrSeq(seq) => {
                let deps = seq
                    .iter()
                    .map(|s| {
                        Reldep::parse(s).map_err(|e| {
                            Error::InvalidFilter(format!("bad reldep value: {}", e))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(MatchValue::ReldepSeq(deps))
            }
            _ => Err(Error::InvalidFilter(format!(
                "'{}' filters take a reldep value",
                key
            ))),
        },
        _ => match &value {
            MatchValue::Str(_) | MatchValue::StrSeq(_) => {
                if cmp.op == Glob {
                    for s in value_strings(&value) {
                        Pattern::new(s).map_err(|e| {
                            Error::InvalidFilter(format!("bad glob '{}': {}", s, e))
                        })?;
                    }
                }
                Ok(value)
            }
            _ => Err(Error::InvalidFilter(format!(
                "'{}' filters take a string value",
                key
            ))),
        },
    }
}

fn value_strings(value: &MatchValue) -> impl Iterator<Item = &str> {
    let slice: &[String] = match value {
        MatchValue::Str(s) => std::slice::from_ref(s),
        MatchValue::StrSeq(seq) => seq.as_slice(),
        _ => &[],
    };
    slice.iter().map(String::as_str)
}

fn value_reldeps(value: &MatchValue) -> &[Reldep] {
    match value {
        MatchValue::Reldep(r) => std::slice::from_ref(r),
        MatchValue::ReldepSeq(rs) => rs.as_slice(),
        _ => &[],
    }
}

fn clause_matches(pool: &Pool, clause: &Clause, id: PackageId) -> bool {
    let pkg = pool.get(id);
    let hit = match clause.key {
        QueryKey::Name => match_strings(&clause.cmp, &pkg.name, &clause.value),
        QueryKey::Arch => match_strings(&clause.cmp, &pkg.arch, &clause.value),
        QueryKey::Nevra => match_strings(&clause.cmp, &pkg.nevra(), &clause.value),
        QueryKey::Repo => match_strings(&clause.cmp, pool.repo_name(pkg.repo), &clause.value),
        QueryKey::Checksum => pkg
            .checksum
            .as_ref()
            .is_some_and(|c| match_strings(&clause.cmp, &c.to_string(), &clause.value)),
        QueryKey::Version => match_versionlike(&clause.cmp, &pkg.evr.version, &clause.value),
        QueryKey::Release => pkg
            .evr
            .release
            .as_deref()
            .is_some_and(|r| match_versionlike(&clause.cmp, r, &clause.value)),
        QueryKey::Epoch => {
            let MatchValue::Num(n) = clause.value else {
                return false;
            };
            cmp_ordering(clause.cmp.op, pkg.evr.epoch.cmp(&n))
        }
        QueryKey::Evr => {
            // Parse validated at filter() time.
            let against = |s: &str| {
                Evr::parse(s)
                    .map(|evr| pkg.evr.compare(&evr))
                    .unwrap_or(Ordering::Less)
            };
            if clause.cmp.op == CmpOp::Neq {
                value_strings(&clause.value).all(|s| against(s) != Ordering::Equal)
            } else {
                value_strings(&clause.value)
                    .any(|s| cmp_ordering(clause.cmp.op, against(s)))
            }
        }
        QueryKey::Provides => match_reldeps(pool, &pkg.provides, &clause.value),
        QueryKey::Requires => match_reldeps(pool, &pkg.requires, &clause.value),
        QueryKey::Conflicts => match_reldeps(pool, &pkg.conflicts, &clause.value),
        QueryKey::Obsoletes => match_reldeps(pool, &pkg.obsoletes, &clause.value),
    };
    hit != clause.cmp.negated
}

fn match_reldeps(pool: &Pool, deps: &[crate::reldep::ReldepId], value: &MatchValue) -> bool {
    value_reldeps(value)
        .iter()
        .any(|wanted| deps.iter().any(|&d| pool.reldep(d).overlaps(wanted)))
}

/// Equality, substring, and glob matching on plain string attributes
///
/// Sequence values OR under positive operators; `Neq` instead requires
/// the attribute to differ from every listed value.
fn match_strings(cmp: &Cmp, actual: &str, value: &MatchValue) -> bool {
    let hit = |wanted: &str| match cmp.op {
        CmpOp::Eq | CmpOp::Neq => {
            if cmp.case_insensitive {
                actual.eq_ignore_ascii_case(wanted)
            } else {
                actual == wanted
            }
        }
        CmpOp::Substr => {
            if cmp.case_insensitive {
                actual.to_lowercase().contains(&wanted.to_lowercase())
            } else {
                actual.contains(wanted)
            }
        }
        CmpOp::Glob => {
            // Pattern validity was checked at filter() time.
            Pattern::new(wanted).is_ok_and(|p| {
                p.matches_with(
                    actual,
                    MatchOptions {
                        case_sensitive: !cmp.case_insensitive,
                        ..MatchOptions::new()
                    },
                )
            })
        }
        _ => false,
    };
    if cmp.op == CmpOp::Neq {
        value_strings(value).all(|wanted| !hit(wanted))
    } else {
        value_strings(value).any(hit)
    }
}

/// Version-component attributes: ordered comparison uses rpmvercmp,
/// substring and glob fall back to plain string matching
fn match_versionlike(cmp: &Cmp, actual: &str, value: &MatchValue) -> bool {
    match cmp.op {
        CmpOp::Substr | CmpOp::Glob => match_strings(cmp, actual, value),
        CmpOp::Neq => {
            value_strings(value).all(|wanted| rpmvercmp(actual, wanted) != Ordering::Equal)
        }
        op => value_strings(value).any(|wanted| cmp_ordering(op, rpmvercmp(actual, wanted))),
    }
}

fn cmp_ordering(op: CmpOp, ord: Ordering) -> bool {
    match op {
        CmpOp::Eq => ord == Ordering::Equal,
        CmpOp::Neq => ord != Ordering::Equal,
        CmpOp::Gt => ord == Ordering::Greater,
        CmpOp::Lt => ord == Ordering::Less,
        CmpOp::Gte => ord != Ordering::Less,
        CmpOp::Lte => ord != Ordering::Greater,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{PackageSpec, SYSTEM_REPO_NAME};

    fn sample_pool() -> Pool {
        let mut pool = Pool::with_arch("x86_64");
        let system = pool.add_repo(SYSTEM_REPO_NAME);
        let main = pool.add_repo("main");

        pool.add_package(system, PackageSpec::new("flying", "2-9", "noarch").requires(["penny-lib"]))
            .unwrap();
        pool.add_package(system, PackageSpec::new("penny", "4-1", "noarch")).unwrap();
        pool.add_package(
            system,
            PackageSpec::new("penny-lib", "4-1", "x86_64").provides(["libpenny.so.4"]),
        )
        .unwrap();
        pool.add_package(system, PackageSpec::new("baby", "6:5.0-11", "x86_64")).unwrap();

        pool.add_package(main, PackageSpec::new("pilchard", "1.2.3-1", "x86_64")).unwrap();
        pool.add_package(main, PackageSpec::new("pilchard", "1.2.4-1", "x86_64")).unwrap();
        pool.add_package(main, PackageSpec::new("pilchard", "1.2.4-1", "i686")).unwrap();
        pool.add_package(
            main,
            PackageSpec::new("walrus", "2-6", "noarch").requires(["semolina = 2"]),
        )
        .unwrap();
        pool
    }

    #[test]
    fn test_empty_query_matches_all() {
        let pool = sample_pool();
        let q = Query::new(&pool);
        assert_eq!(q.count(), pool.len());
    }

    #[test]
    fn test_name_eq() {
        let pool = sample_pool();
        let mut q = Query::new(&pool);
        q.filter(QueryKey::Name, CmpOp::Eq, "flying").unwrap();
        assert_eq!(q.count(), 1);
    }

    #[test]
    fn test_name_seq_or() {
        let pool = sample_pool();
        let mut q = Query::new(&pool);
        q.filter(QueryKey::Name, CmpOp::Eq, ["flying", "penny"]).unwrap();
        assert_eq!(q.count(), 2);
    }

    #[test]
    fn test_name_neq_seq_excludes_every_listed() {
        let pool = sample_pool();
        let mut q = Query::new(&pool);
        q.filter(QueryKey::Name, CmpOp::Neq, ["flying", "penny"]).unwrap();
        let names: Vec<_> = q.run().iter().map(|&id| pool.get(id).name.clone()).collect();
        assert!(!names.contains(&"flying".to_string()));
        assert!(!names.contains(&"penny".to_string()));
        assert!(names.contains(&"penny-lib".to_string()));
        assert_eq!(names.len(), 6);
    }

    #[test]
    fn test_evr_neq_seq_excludes_every_listed() {
        let pool = sample_pool();
        let mut q = Query::new(&pool);
        q.filter(QueryKey::Name, CmpOp::Eq, "pilchard").unwrap();
        q.filter(QueryKey::Evr, CmpOp::Neq, ["1.2.3-1", "1.2.4-1"]).unwrap();
        assert_eq!(q.count(), 0);
    }

    #[test]
    fn test_icase() {
        let pool = sample_pool();
        let mut q = Query::new(&pool);
        q.filter(QueryKey::Name, CmpOp::Eq, "FLYING").unwrap();
        assert_eq!(q.count(), 0);

        let mut q = Query::new(&pool);
        q.filter(QueryKey::Name, CmpOp::Eq.icase(), "FLYING").unwrap();
        assert_eq!(q.count(), 1);
    }

    #[test]
    fn test_substr_seq() {
        let pool = sample_pool();
        let mut q = Query::new(&pool);
        q.filter(QueryKey::Name, CmpOp::Substr, ["alru", "enny-li"]).unwrap();
        assert_eq!(q.count(), 2);
    }

    #[test]
    fn test_glob_negated() {
        let pool = sample_pool();
        let mut q = Query::new(&pool);
        q.filter(QueryKey::Name, CmpOp::Glob.not(), ["p*", "f*"]).unwrap();
        let names: Vec<_> = q.run().iter().map(|&id| pool.get(id).name.clone()).collect();
        assert_eq!(names, vec!["baby", "walrus"]);
    }

    #[test]
    fn test_epoch_gt() {
        let pool = sample_pool();
        let mut q = Query::new(&pool);
        q.filter(QueryKey::Epoch, CmpOp::Gt, 4u64).unwrap();
        let ids = q.run();
        assert_eq!(ids.len(), 1);
        assert_eq!(pool.get(ids[0]).evr.epoch, 6);
    }

    #[test]
    fn test_version_ordered_and_glob() {
        let pool = sample_pool();
        let mut q = Query::new(&pool);
        q.filter(QueryKey::Version, CmpOp::Gte, "2").unwrap();
        // flying 2-9, penny 4-1, penny-lib 4-1, baby 5.0, walrus 2-6
        assert_eq!(q.count(), 5);

        let mut q = Query::new(&pool);
        q.filter(QueryKey::Version, CmpOp::Glob, "1.2*").unwrap();
        assert_eq!(q.count(), 3);
    }

    #[test]
    fn test_evr_eq() {
        let pool = sample_pool();
        let mut q = Query::new(&pool);
        q.filter(QueryKey::Name, CmpOp::Eq, "pilchard").unwrap();
        q.filter(QueryKey::Evr, CmpOp::Eq, "1.2.4-1").unwrap();
        assert_eq!(q.count(), 2);
    }

    #[test]
    fn test_nevra_glob() {
        let pool = sample_pool();
        let mut q = Query::new(&pool);
        q.filter(QueryKey::Nevra, CmpOp::Glob, "*lib*64").unwrap();
        let ids = q.run();
        assert_eq!(ids.len(), 1);
        assert_eq!(pool.get(ids[0]).nevra(), "penny-lib-4-1.x86_64");
    }

    #[test]
    fn test_repo_neq_system() {
        let pool = sample_pool();
        let mut q = Query::new(&pool);
        q.filter(QueryKey::Repo, CmpOp::Neq, SYSTEM_REPO_NAME).unwrap();
        assert_eq!(q.count(), 4);
    }

    #[test]
    fn test_provides_reldep() {
        let pool = sample_pool();
        let mut q = Query::new(&pool);
        q.filter(QueryKey::Provides, CmpOp::Eq, "penny-lib").unwrap();
        let ids = q.run();
        assert_eq!(ids.len(), 1);
        assert_eq!(pool.get(ids[0]).name, "penny-lib");
    }

    #[test]
    fn test_requires_reldep_overlap() {
        let pool = sample_pool();
        for dep in ["semolina = 2", "semolina > 1.0"] {
            let mut q = Query::new(&pool);
            q.filter(QueryKey::Requires, CmpOp::Eq, dep).unwrap();
            let ids = q.run();
            assert_eq!(ids.len(), 1, "requires {}", dep);
            assert_eq!(pool.get(ids[0]).name, "walrus");
        }
    }

    #[test]
    fn test_latest_per_name_and_arch() {
        let pool = sample_pool();

        // No arch clause: one survivor per name.
        let mut q = Query::new(&pool);
        q.filter(QueryKey::Name, CmpOp::Eq, "pilchard").unwrap();
        q.filter_latest(true);
        assert_eq!(q.count(), 1);

        // With an arch clause the grouping is per name/arch.
        let mut q = Query::new(&pool);
        q.filter(QueryKey::Name, CmpOp::Eq, "pilchard").unwrap();
        q.filter(QueryKey::Arch, CmpOp::Glob, "*6*").unwrap();
        q.filter_latest(true);
        assert_eq!(q.count(), 2);
    }

    #[test]
    fn test_latest_passes_installed_through() {
        let pool = sample_pool();
        let mut q = Query::new(&pool);
        q.filter_latest(true);
        let ids = q.run();
        // All 4 installed packages survive; pilchard collapses to one,
        // walrus stays.
        assert_eq!(ids.len(), 6);
        for &id in &ids {
            if pool.get(id).name == "pilchard" {
                assert_eq!(pool.get(id).evr.to_string(), "1.2.4-1");
            }
        }
    }

    #[test]
    fn test_sorted_results() {
        let pool = sample_pool();
        let mut q = Query::new(&pool);
        q.filter(QueryKey::Name, CmpOp::Eq, "pilchard").unwrap();
        q.sort_results(true);
        let evrs: Vec<_> = q
            .run()
            .iter()
            .map(|&id| pool.get(id).evr.to_string())
            .collect();
        assert_eq!(evrs, vec!["1.2.3-1", "1.2.4-1", "1.2.4-1"]);

        q.filter_latest(true);
        let first = q.run()[0];
        assert_eq!(pool.get(first).evr.to_string(), "1.2.4-1");
    }

    #[test]
    fn test_invalid_filters_fail_fast() {
        let pool = sample_pool();
        let mut q = Query::new(&pool);
        // Ordered comparison on a discrete attribute
        assert!(q.filter(QueryKey::Name, CmpOp::Gt, "semolina").is_err());
        // Substring on a reldep attribute
        assert!(q.filter(QueryKey::Provides, CmpOp::Substr, "penny").is_err());
        // Ordered comparison on provides
        assert!(q.filter(QueryKey::Provides, CmpOp::Gt, "penny = 1").is_err());
        // Numeric value on a string attribute
        assert!(q.filter(QueryKey::Name, CmpOp::Eq, 3u64).is_err());
        // Non-numeric epoch
        assert!(q.filter(QueryKey::Epoch, CmpOp::Gt, "six").is_err());
        // Bad glob pattern
        assert!(q.filter(QueryKey::Name, CmpOp::Glob, "[").is_err());
        // A failed filter leaves the query unchanged
        assert_eq!(q.count(), pool.len());
    }

    #[test]
    fn test_run_is_idempotent() {
        let pool = sample_pool();
        let mut q = Query::new(&pool);
        q.filter(QueryKey::Name, CmpOp::Substr, "p").unwrap();
        assert_eq!(q.run(), q.run());
    }

    #[test]
    fn test_is_selection() {
        let pool = sample_pool();
        let mut q = Query::new(&pool);
        q.filter(QueryKey::Name, CmpOp::Eq, "walrus").unwrap();
        q.filter(QueryKey::Arch, CmpOp::Eq, "noarch").unwrap();
        assert!(q.is_selection());

        let mut q2 = q.clone();
        q2.filter(QueryKey::Repo, CmpOp::Neq, SYSTEM_REPO_NAME).unwrap();
        assert!(!q2.is_selection());

        let mut q3 = q.clone();
        q3.filter(QueryKey::Name, CmpOp::Gt.not(), "a").unwrap_err();
        assert!(q3.is_selection());
        q3.filter_latest(true);
        assert!(!q3.is_selection());
    }
}
