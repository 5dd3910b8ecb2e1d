// src/solver/engine.rs

//! Built-in greedy resolution engine
//!
//! A deterministic, single-pass engine behind the [`Solver`] trait.
//! Jobs are processed in submission order, each one transactionally:
//! a job mutates a scratch copy of the state and commits only when it
//! succeeds, so one failed job never leaves half its decisions behind.
//! Weak jobs fail silently; any other failed job contributes one
//! problem and the whole solve reports `Problems`.
//!
//! Candidate preference is native arch first, then noarch, then
//! highest EVR, then lowest pool id, which keeps repeated solves over
//! a fixed pool byte-for-byte identical.

use super::{
    Decision, DecisionKind, Problem, SolveFlags, SolveOutcome, Solver, SolverAction, SolverJob,
};
use crate::arch::arch_compatible;
use crate::package::PackageId;
use crate::pool::Pool;
use crate::reldep::{CmpSense, Reldep};
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

/// The default engine
#[derive(Debug, Default)]
pub struct GreedySolver;

impl Solver for GreedySolver {
    fn solve(&self, pool: &Pool, jobs: &[SolverJob], flags: SolveFlags) -> SolveOutcome {
        let mut state = State::from_pool(pool);

        // Userinstalled protection is scoped to the whole solve, not to
        // the jobs that happen to follow it.
        for job in jobs {
            if job.action == SolverAction::UserInstalled {
                for &id in &job.candidates {
                    state.userinstalled.insert(pool.get(id).name.clone());
                }
            }
        }

        let mut problems = Vec::new();
        for job in jobs {
            if job.action == SolverAction::UserInstalled {
                continue;
            }
            let mut scratch = state.clone();
            match run_job(pool, &mut scratch, job, flags) {
                Ok(()) => state = scratch,
                Err(problem) => {
                    if job.flags.weak {
                        debug!("skipping weak job: {}", problem);
                    } else {
                        problems.push(problem);
                    }
                }
            }
        }

        if problems.is_empty() {
            debug!("solved {} jobs with {} decisions", jobs.len(), state.decisions.len());
            SolveOutcome::Solution(state.decisions)
        } else {
            SolveOutcome::Problems(problems)
        }
    }
}

#[derive(Clone)]
struct State {
    installed: BTreeSet<PackageId>,
    decisions: Vec<Decision>,
    userinstalled: HashSet<String>,
}

impl State {
    fn from_pool(pool: &Pool) -> Self {
        Self {
            installed: pool.installed_ids().collect(),
            decisions: Vec::new(),
            userinstalled: HashSet::new(),
        }
    }

    fn erase(&mut self, id: PackageId) {
        if self.installed.remove(&id) {
            self.decisions.push(Decision {
                pkg: id,
                kind: DecisionKind::Erase,
                required_by: None,
            });
        }
    }
}

fn run_job(pool: &Pool, state: &mut State, job: &SolverJob, flags: SolveFlags) -> Result<(), Problem> {
    match job.action {
        SolverAction::Install | SolverAction::Downgrade | SolverAction::DistUpgrade => {
            let chosen = choose(pool, &job.candidates)
                .ok_or_else(|| Problem::new("no package matches the request"))?;
            install(pool, state, chosen, None)
        }
        SolverAction::Upgrade => {
            let chosen = choose(pool, &job.candidates)
                .ok_or_else(|| Problem::new("no package matches the request"))?;
            let name = &pool.get(chosen).name;
            if job.flags.check_installed
                && !state.installed.iter().any(|&i| &pool.get(i).name == name)
            {
                return Err(Problem::new(format!("package {} is not installed", name)));
            }
            install(pool, state, chosen, None)
        }
        SolverAction::Erase => run_erase(pool, state, job, flags),
        SolverAction::UpgradeAll => {
            run_sweep_upgrade(pool, state, false);
            Ok(())
        }
        SolverAction::DistUpgradeAll => {
            run_sweep_upgrade(pool, state, true);
            Ok(())
        }
        SolverAction::UserInstalled => Ok(()),
    }
}

/// Install one package and everything its requirements pull in
///
/// Inserting the package before walking its requirements makes
/// dependency cycles terminate: a revisited package is already present
/// and returns immediately.
fn install(
    pool: &Pool,
    state: &mut State,
    id: PackageId,
    required_by: Option<PackageId>,
) -> Result<(), Problem> {
    if state.installed.contains(&id) {
        return Ok(());
    }
    let pkg = pool.get(id);
    // An identical NEVRA already on the system is a no-op, not a
    // reinstall.
    if state.installed.iter().any(|&i| pool.get(i).same_nevra(pkg)) {
        return Ok(());
    }

    // Same-name replacement, unless the name is installonly.
    let mut displaced: Vec<PackageId> = Vec::new();
    if !pool.is_installonly(&pkg.name) {
        displaced.extend(
            state
                .installed
                .iter()
                .copied()
                .filter(|&i| pool.get(i).name == pkg.name),
        );
    }
    // Obsoletion matches the installed package's name/EVR identity.
    for &dep in &pkg.obsoletes {
        let dep = pool.reldep(dep);
        for &i in &state.installed {
            let other = pool.get(i);
            let ident = Reldep::new(other.name.clone(), CmpSense::Eq, other.evr.clone());
            if dep.overlaps(&ident) {
                displaced.push(i);
            }
        }
    }
    displaced.sort_unstable();
    displaced.dedup();
    for victim in displaced {
        state.erase(victim);
    }

    // Conflicts, both directions, against what remains.
    for &dep in &pkg.conflicts {
        let dep = pool.reldep(dep);
        if let Some(&holder) = state
            .installed
            .iter()
            .find(|&&i| provides_overlap(pool, i, dep))
        {
            return Err(Problem::new(format!(
                "package {} conflicts with {} provided by {}",
                pkg.nevra(),
                dep,
                pool.get(holder).nevra()
            )));
        }
    }
    for &i in &state.installed {
        for &cdep in &pool.get(i).conflicts {
            let cdep = pool.reldep(cdep);
            if provides_overlap(pool, id, cdep) {
                return Err(Problem::new(format!(
                    "package {} conflicts with {} provided by {}",
                    pool.get(i).nevra(),
                    cdep,
                    pkg.nevra()
                )));
            }
        }
    }

    state.installed.insert(id);
    state.decisions.push(Decision {
        pkg: id,
        kind: DecisionKind::Install,
        required_by,
    });

    for &dep in &pkg.requires {
        let dep = pool.reldep(dep).clone();
        if state
            .installed
            .iter()
            .any(|&i| provides_overlap(pool, i, &dep))
        {
            continue;
        }
        let providers: Vec<PackageId> = pool
            .whatprovides_name(&dep.name)
            .iter()
            .copied()
            .filter(|&c| {
                !pool.is_installed(c)
                    && arch_compatible(&pool.get(c).arch, pool.arch())
                    && provides_overlap(pool, c, &dep)
            })
            .collect();
        let Some(chosen) = choose(pool, &providers) else {
            return Err(Problem::new(format!(
                "nothing provides {} needed by {}",
                dep,
                pool.get(id).nevra()
            )));
        };
        install(pool, state, chosen, Some(id))?;
    }

    // Installonly retention: oldest kin beyond the limit go away.
    if pool.is_installonly(&pool.get(id).name) {
        let mut kin: Vec<PackageId> = state
            .installed
            .iter()
            .copied()
            .filter(|&i| pool.get(i).name == pool.get(id).name)
            .collect();
        kin.sort_by(|&a, &b| pool.get(a).cmp_nevra(pool.get(b)));
        // The package this job just installed always survives the
        // sweep, even when it sorts oldest.
        kin.retain(|&k| k != id);
        while !kin.is_empty() && kin.len() + 1 > pool.installonly_limit() {
            state.erase(kin.remove(0));
        }
    }
    Ok(())
}

fn run_erase(
    pool: &Pool,
    state: &mut State,
    job: &SolverJob,
    flags: SolveFlags,
) -> Result<(), Problem> {
    let mut doomed: BTreeSet<PackageId> = job
        .candidates
        .iter()
        .copied()
        .filter(|id| state.installed.contains(id))
        .collect();
    if doomed.is_empty() {
        return Ok(());
    }

    // Dependents either block the erase or cascade into it.
    loop {
        let mut broken: Vec<(PackageId, PackageId)> = Vec::new();
        for &p in state.installed.iter().filter(|p| !doomed.contains(*p)) {
            for &dep in &pool.get(p).requires {
                let dep = pool.reldep(dep);
                let doomed_provider = doomed
                    .iter()
                    .copied()
                    .find(|&d| provides_overlap(pool, d, dep));
                let Some(provider) = doomed_provider else { continue };
                let survivor_provides = state
                    .installed
                    .iter()
                    .any(|&i| !doomed.contains(&i) && provides_overlap(pool, i, dep));
                if !survivor_provides {
                    broken.push((provider, p));
                }
            }
        }
        if broken.is_empty() {
            break;
        }
        if !flags.allow_uninstall {
            let (provider, dependent) = broken[0];
            return Err(Problem::new(format!(
                "package {} is needed by {}",
                pool.get(provider).nevra(),
                pool.get(dependent).nevra()
            )));
        }
        for (_, dependent) in broken {
            doomed.insert(dependent);
        }
    }

    let erased: Vec<PackageId> = doomed.iter().copied().collect();
    for id in &erased {
        state.erase(*id);
    }

    if job.flags.clean_deps {
        sweep_orphans(pool, state, erased);
    }
    Ok(())
}

/// Transitively erase dependencies that only the erased packages
/// needed, unless userinstalled protection pins them
fn sweep_orphans(pool: &Pool, state: &mut State, mut erased: Vec<PackageId>) {
    loop {
        let mut orphans: Vec<PackageId> = Vec::new();
        for &q in &state.installed {
            if state.userinstalled.contains(&pool.get(q).name) {
                continue;
            }
            let was_needed = erased.iter().any(|&e| {
                pool.get(e)
                    .requires
                    .iter()
                    .any(|&dep| provides_overlap(pool, q, pool.reldep(dep)))
            });
            if !was_needed {
                continue;
            }
            let still_needed = state.installed.iter().any(|&i| {
                i != q
                    && pool
                        .get(i)
                        .requires
                        .iter()
                        .any(|&dep| provides_overlap(pool, q, pool.reldep(dep)))
            });
            if !still_needed {
                orphans.push(q);
            }
        }
        if orphans.is_empty() {
            return;
        }
        for &q in &orphans {
            state.erase(q);
        }
        erased.extend(orphans);
    }
}

/// Upgrade every installed name to its best available candidate
///
/// `sync` additionally allows moving down to the repo version when the
/// installed one is ahead (distupgrade semantics). Names without any
/// usable candidate are left alone; individual failures skip that name
/// rather than failing the job.
fn run_sweep_upgrade(pool: &Pool, state: &mut State, sync: bool) {
    let mut names: Vec<String> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for &i in &state.installed {
        let name = &pool.get(i).name;
        if seen.insert(name.as_str()) {
            names.push(name.clone());
        }
    }

    for name in names {
        let Some(current) = state
            .installed
            .iter()
            .copied()
            .filter(|&i| pool.get(i).name == name)
            .max_by(|&a, &b| pool.get(a).evr.compare(&pool.get(b).evr))
        else {
            continue;
        };
        let candidates: Vec<PackageId> = pool
            .by_name(&name)
            .iter()
            .copied()
            .filter(|&c| {
                !pool.is_installed(c) && arch_compatible(&pool.get(c).arch, pool.arch())
            })
            .filter(|&c| {
                let ord = pool.get(c).evr.compare(&pool.get(current).evr);
                if sync {
                    ord != std::cmp::Ordering::Equal
                } else {
                    ord == std::cmp::Ordering::Greater
                }
            })
            .collect();
        let Some(chosen) = choose(pool, &candidates) else {
            continue;
        };
        let mut scratch = state.clone();
        match install(pool, &mut scratch, chosen, None) {
            Ok(()) => *state = scratch,
            Err(problem) => debug!("keeping {}: {}", name, problem),
        }
    }
}

/// Deterministic candidate preference
fn choose(pool: &Pool, candidates: &[PackageId]) -> Option<PackageId> {
    fn arch_rank(pool: &Pool, id: PackageId) -> u8 {
        let arch = &pool.get(id).arch;
        if arch == pool.arch() {
            2
        } else if arch == "noarch" {
            1
        } else {
            0
        }
    }
    candidates.iter().copied().max_by(|&a, &b| {
        arch_rank(pool, a)
            .cmp(&arch_rank(pool, b))
            .then_with(|| pool.get(a).evr.compare(&pool.get(b).evr))
            .then_with(|| b.cmp(&a))
    })
}

fn provides_overlap(pool: &Pool, id: PackageId, dep: &Reldep) -> bool {
    pool.get(id)
        .provides
        .iter()
        .any(|&p| pool.reldep(p).overlaps(dep))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{PackageSpec, SYSTEM_REPO_NAME};

    fn pool() -> Pool {
        let mut pool = Pool::with_arch("x86_64");
        let system = pool.add_repo(SYSTEM_REPO_NAME);
        let main = pool.add_repo("main");

        pool.add_package(system, PackageSpec::new("flying", "2-9", "noarch").requires(["penny-lib"]))
            .unwrap();
        pool.add_package(system, PackageSpec::new("penny-lib", "4-1", "x86_64")).unwrap();
        pool.add_package(
            main,
            PackageSpec::new("walrus", "2-6", "noarch").requires(["semolina = 2"]),
        )
        .unwrap();
        pool.add_package(main, PackageSpec::new("semolina", "2-0", "x86_64")).unwrap();
        pool.add_package(main, PackageSpec::new("semolina", "2-0", "i686")).unwrap();
        pool.add_package(main, PackageSpec::new("hello", "1-0", "noarch").requires(["goodbye"]))
            .unwrap();
        pool
    }

    fn ids_by_name(pool: &Pool, name: &str) -> Vec<PackageId> {
        pool.by_name(name).to_vec()
    }

    #[test]
    fn test_install_pulls_dependency_with_native_arch() {
        let pool = pool();
        let job = SolverJob::new(SolverAction::Install, ids_by_name(&pool, "walrus"));
        let SolveOutcome::Solution(decisions) =
            GreedySolver.solve(&pool, &[job], SolveFlags::default())
        else {
            panic!("expected a solution");
        };
        assert_eq!(decisions.len(), 2);
        assert_eq!(pool.get(decisions[0].pkg).name, "walrus");
        assert_eq!(decisions[0].required_by, None);
        let dep = &decisions[1];
        assert_eq!(pool.get(dep.pkg).nevra(), "semolina-2-0.x86_64");
        assert_eq!(dep.required_by, Some(decisions[0].pkg));
    }

    #[test]
    fn test_missing_requirement_is_a_problem() {
        let pool = pool();
        let job = SolverJob::new(SolverAction::Install, ids_by_name(&pool, "hello"));
        let SolveOutcome::Problems(problems) =
            GreedySolver.solve(&pool, &[job], SolveFlags::default())
        else {
            panic!("expected problems");
        };
        assert_eq!(problems.len(), 1);
        assert_eq!(
            problems[0].to_string(),
            "nothing provides goodbye needed by hello-1-0.noarch"
        );
    }

    #[test]
    fn test_weak_job_failure_is_silent() {
        let pool = pool();
        let mut job = SolverJob::new(SolverAction::Install, ids_by_name(&pool, "hello"));
        job.flags.weak = true;
        let SolveOutcome::Solution(decisions) =
            GreedySolver.solve(&pool, &[job], SolveFlags::default())
        else {
            panic!("expected a solution");
        };
        assert!(decisions.is_empty());
    }

    #[test]
    fn test_failed_job_commits_nothing() {
        let pool = pool();
        let jobs = [
            SolverJob::new(SolverAction::Install, ids_by_name(&pool, "hello")),
            SolverJob::new(SolverAction::Install, ids_by_name(&pool, "walrus")),
        ];
        let SolveOutcome::Problems(problems) =
            GreedySolver.solve(&pool, &jobs, SolveFlags::default())
        else {
            panic!("expected problems");
        };
        // Only the hello job fails; its partial install of hello itself
        // must not leak into the problem count.
        assert_eq!(problems.len(), 1);
    }

    #[test]
    fn test_erase_blocked_by_dependent() {
        let pool = pool();
        let job = SolverJob::new(SolverAction::Erase, ids_by_name(&pool, "penny-lib"));
        let SolveOutcome::Problems(problems) =
            GreedySolver.solve(&pool, &[job], SolveFlags::default())
        else {
            panic!("expected problems");
        };
        assert_eq!(
            problems[0].to_string(),
            "package penny-lib-4-1.x86_64 is needed by flying-2-9.noarch"
        );
    }

    #[test]
    fn test_erase_cascades_with_allow_uninstall() {
        let pool = pool();
        let job = SolverJob::new(SolverAction::Erase, ids_by_name(&pool, "penny-lib"));
        let flags = SolveFlags {
            allow_uninstall: true,
        };
        let SolveOutcome::Solution(decisions) = GreedySolver.solve(&pool, &[job], flags) else {
            panic!("expected a solution");
        };
        let mut names: Vec<_> = decisions
            .iter()
            .map(|d| pool.get(d.pkg).name.clone())
            .collect();
        names.sort();
        assert_eq!(names, vec!["flying", "penny-lib"]);
        assert!(decisions.iter().all(|d| d.kind == DecisionKind::Erase));
    }

    #[test]
    fn test_conflict_blocks_install() {
        let mut pool = Pool::with_arch("x86_64");
        let system = pool.add_repo(SYSTEM_REPO_NAME);
        let main = pool.add_repo("main");
        pool.add_package(system, PackageSpec::new("old-tool", "1-1", "x86_64")).unwrap();
        pool.add_package(
            main,
            PackageSpec::new("new-tool", "2-1", "x86_64").conflicts(["old-tool < 2"]),
        )
        .unwrap();
        let job = SolverJob::new(SolverAction::Install, ids_by_name(&pool, "new-tool"));
        let SolveOutcome::Problems(problems) =
            GreedySolver.solve(&pool, &[job], SolveFlags::default())
        else {
            panic!("expected problems");
        };
        assert!(problems[0].to_string().contains("conflicts with old-tool < 2"));
    }
}
