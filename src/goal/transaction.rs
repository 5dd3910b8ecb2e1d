// src/goal/transaction.rs

//! Transaction classification
//!
//! The solver hands back a flat decision list; classification turns it
//! into the four-way partition callers consume. An install paired with
//! an erase of the same name becomes an upgrade or downgrade and the
//! paired erase leaves the erasure list. Obsoletion links run from the
//! new side to every old side it displaced, same-name replacement
//! first, then obsoletes matches; obsoleted packages that were not
//! same-name replacements stay in the erasure list.

use crate::package::PackageId;
use crate::pool::Pool;
use crate::reldep::{CmpSense, Reldep};
use crate::solver::{Decision, DecisionKind};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use strum_macros::Display;

/// Why a package is on the system
///
/// Discriminants are stable (external enumeration contract).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
#[repr(u32)]
pub enum Reason {
    User = 0,
    Dependency = 1,
}

/// Classified result of one successful solve
///
/// Package identities are pool handles; a given identity appears in at
/// most one of the four partitions.
#[derive(Debug, Clone, Default)]
pub struct Transaction {
    installs: Vec<PackageId>,
    erasures: Vec<PackageId>,
    upgrades: Vec<PackageId>,
    downgrades: Vec<PackageId>,
    obsoletions: HashMap<PackageId, Vec<PackageId>>,
    reasons: HashMap<PackageId, Reason>,
}

impl Transaction {
    pub(crate) fn classify(
        pool: &Pool,
        decisions: &[Decision],
        user_names: &HashSet<String>,
    ) -> Self {
        let mut tx = Transaction::default();
        let mut incoming: Vec<(PackageId, Option<PackageId>)> = Vec::new();
        let mut erased: Vec<PackageId> = Vec::new();
        for d in decisions {
            match d.kind {
                DecisionKind::Install => incoming.push((d.pkg, d.required_by)),
                DecisionKind::Erase => erased.push(d.pkg),
            }
        }

        let mut consumed: HashSet<PackageId> = HashSet::new();
        for &(id, required_by) in &incoming {
            let pkg = pool.get(id);
            let reason = if required_by.is_none() || user_names.contains(&pkg.name) {
                Reason::User
            } else {
                Reason::Dependency
            };
            tx.reasons.insert(id, reason);

            // A package never replaces itself; an erase of the incoming
            // identity stays in the erasure list.
            let replaced = erased
                .iter()
                .copied()
                .find(|&e| e != id && !consumed.contains(&e) && pool.get(e).name == pkg.name);
            match replaced {
                Some(old) => {
                    consumed.insert(old);
                    tx.obsoletions.entry(id).or_default().push(old);
                    match pkg.evr.compare(&pool.get(old).evr) {
                        Ordering::Less => tx.downgrades.push(id),
                        // Equal EVR means an arch migration; count it
                        // with the upgrades.
                        _ => tx.upgrades.push(id),
                    }
                }
                None => tx.installs.push(id),
            }
        }

        // Obsoletes links, after same-name replacement links.
        for &(id, _) in &incoming {
            for &dep in &pool.get(id).obsoletes {
                let dep = pool.reldep(dep);
                for &e in &erased {
                    if e == id {
                        continue;
                    }
                    let old = pool.get(e);
                    let ident = Reldep::new(old.name.clone(), CmpSense::Eq, old.evr.clone());
                    if dep.overlaps(&ident) {
                        let links = tx.obsoletions.entry(id).or_default();
                        if !links.contains(&e) {
                            links.push(e);
                        }
                    }
                }
            }
        }

        tx.erasures = erased.into_iter().filter(|e| !consumed.contains(e)).collect();
        tx
    }

    pub fn installs(&self) -> &[PackageId] {
        &self.installs
    }

    pub fn erasures(&self) -> &[PackageId] {
        &self.erasures
    }

    pub fn upgrades(&self) -> &[PackageId] {
        &self.upgrades
    }

    pub fn downgrades(&self) -> &[PackageId] {
        &self.downgrades
    }

    /// Every old-side package the given new-side package displaced
    pub fn obsoleted_by(&self, new_side: PackageId) -> &[PackageId] {
        self.obsoletions
            .get(&new_side)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First displaced package, replacement link first
    pub fn package_obsoletes(&self, new_side: PackageId) -> Option<PackageId> {
        self.obsoleted_by(new_side).first().copied()
    }

    /// Packages with no recorded reason default to `User`
    pub fn reason(&self, pkg: PackageId) -> Reason {
        self.reasons.get(&pkg).copied().unwrap_or(Reason::User)
    }
}
