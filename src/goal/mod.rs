// src/goal/mod.rs

//! Goal orchestration
//!
//! A goal accumulates resolution jobs against one pool, hands them to
//! the solver behind the [`Solver`] trait, and classifies the outcome.
//! An unsatisfiable job list is a normal terminal state, not an error:
//! `go()` returns `Ok(false)` and the problem set becomes readable.
//! `Err` from `go()` means the job list itself was malformed.
//!
//! Adding any job after a solve drops the previous result and returns
//! the goal to the accumulating state.

mod transaction;

pub use transaction::{Reason, Transaction};

use crate::error::{Error, Result};
use crate::package::{Package, PackageId};
use crate::pool::Pool;
use crate::query::Query;
use crate::solver::{
    DecisionRecord, DecisionSink, GreedySolver, JobFlags, Problem, SolveFlags, SolveOutcome,
    Solver, SolverAction, SolverJob, TracingSink,
};
use std::collections::HashSet;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GoalState {
    Accumulating,
    Solved,
    Unsatisfiable,
}

pub struct Goal<'pool> {
    pool: &'pool Pool,
    solver: Box<dyn Solver>,
    sink: Box<dyn DecisionSink>,
    jobs: Vec<SolverJob>,
    // Structural job complaints that go() reports before solving.
    deferred: Vec<String>,
    user_names: HashSet<String>,
    state: GoalState,
    transaction: Option<Transaction>,
    problems: Vec<Problem>,
    trace: Vec<DecisionRecord>,
}

impl<'pool> Goal<'pool> {
    /// Goal with the built-in engine and the tracing decision sink
    pub fn new(pool: &'pool Pool) -> Self {
        Self::with_solver(pool, Box::new(GreedySolver))
    }

    pub fn with_solver(pool: &'pool Pool, solver: Box<dyn Solver>) -> Self {
        Self {
            pool,
            solver,
            sink: Box::new(TracingSink),
            jobs: Vec::new(),
            deferred: Vec::new(),
            user_names: HashSet::new(),
            state: GoalState::Accumulating,
            transaction: None,
            problems: Vec::new(),
            trace: Vec::new(),
        }
    }

    /// Replace the decision sink `log_decisions` writes to
    pub fn set_decision_sink(&mut self, sink: Box<dyn DecisionSink>) {
        self.sink = sink;
    }

    pub fn pool(&self) -> &'pool Pool {
        self.pool
    }

    fn push_job(&mut self, job: SolverJob) {
        self.state = GoalState::Accumulating;
        self.transaction = None;
        self.problems.clear();
        self.trace.clear();
        self.jobs.push(job);
    }

    pub fn install(&mut self, pkg: PackageId) {
        self.push_job(SolverJob::new(SolverAction::Install, vec![pkg]));
    }

    /// Install from a query's candidate set; multilib and arch choice
    /// is the solver's call
    ///
    /// A query that is not expressible as a solver selection is
    /// accepted here and rejected by `go()`.
    pub fn install_query(&mut self, query: &Query) {
        if !query.is_selection() {
            self.deferred
                .push("install query is not a solver selection".to_string());
        }
        let candidates = query.run();
        self.push_job(SolverJob::new(SolverAction::Install, candidates));
    }

    pub fn erase(&mut self, pkg: PackageId) {
        self.erase_flags(pkg, JobFlags::default());
    }

    pub fn erase_flags(&mut self, pkg: PackageId, flags: JobFlags) {
        self.push_job(SolverJob::new(SolverAction::Erase, vec![pkg]).with_flags(flags));
    }

    pub fn erase_query(&mut self, query: &Query) -> Result<()> {
        self.erase_query_flags(query, JobFlags::default())
    }

    /// Erase everything the query selects; every target must already
    /// be installed
    pub fn erase_query_flags(&mut self, query: &Query, flags: JobFlags) -> Result<()> {
        let candidates = query.run();
        if let Some(&stray) = candidates.iter().find(|&&id| !self.pool.is_installed(id)) {
            return Err(Error::QueryTarget(format!(
                "cannot erase {}: not installed",
                self.pool.get(stray).nevra()
            )));
        }
        self.push_job(SolverJob::new(SolverAction::Erase, candidates).with_flags(flags));
        Ok(())
    }

    pub fn upgrade_to(&mut self, pkg: PackageId) {
        self.upgrade_to_flags(pkg, JobFlags::default());
    }

    pub fn upgrade_to_flags(&mut self, pkg: PackageId, flags: JobFlags) {
        self.push_job(SolverJob::new(SolverAction::Upgrade, vec![pkg]).with_flags(flags));
    }

    pub fn upgrade_all(&mut self) {
        self.push_job(SolverJob::new(SolverAction::UpgradeAll, Vec::new()));
    }

    pub fn downgrade_to(&mut self, pkg: PackageId) {
        self.push_job(SolverJob::new(SolverAction::Downgrade, vec![pkg]));
    }

    pub fn distupgrade(&mut self, pkg: PackageId) {
        self.push_job(SolverJob::new(SolverAction::DistUpgrade, vec![pkg]));
    }

    pub fn distupgrade_all(&mut self) {
        self.push_job(SolverJob::new(SolverAction::DistUpgradeAll, Vec::new()));
    }

    /// Assert that an installed package is wanted for its own sake,
    /// pinning it against clean-deps sweeps; idempotent
    pub fn userinstalled(&mut self, pkg: PackageId) {
        let name = self.pool.get(pkg).name.clone();
        if self.user_names.insert(name) {
            self.push_job(SolverJob::new(SolverAction::UserInstalled, vec![pkg]));
        }
    }

    /// Re-evaluate the whole job list
    ///
    /// `Ok(true)` means solved, `Ok(false)` unsatisfiable with a
    /// readable problem set. Any previous transaction or problem set
    /// is discarded either way.
    pub fn go(&mut self, flags: SolveFlags) -> Result<bool> {
        if let Some(complaint) = self.deferred.first() {
            return Err(Error::Query(complaint.clone()));
        }
        debug!("solving {} jobs", self.jobs.len());
        match self.solver.solve(self.pool, &self.jobs, flags) {
            SolveOutcome::Solution(decisions) => {
                self.trace = decisions
                    .iter()
                    .map(|d| DecisionRecord::new(self.pool, d))
                    .collect();
                self.transaction = Some(Transaction::classify(
                    self.pool,
                    &decisions,
                    &self.user_names,
                ));
                self.problems.clear();
                self.state = GoalState::Solved;
                info!("solved with {} decisions", decisions.len());
                Ok(true)
            }
            SolveOutcome::Problems(problems) => {
                info!("unsatisfiable with {} problems", problems.len());
                self.problems = problems;
                self.transaction = None;
                self.trace.clear();
                self.state = GoalState::Unsatisfiable;
                Ok(false)
            }
        }
    }

    fn solved(&self) -> Result<&Transaction> {
        self.transaction
            .as_ref()
            .ok_or_else(|| Error::State("goal has no solved transaction".to_string()))
    }

    pub fn list_installs(&self) -> Result<Vec<&'pool Package>> {
        Ok(self.borrow_all(self.solved()?.installs()))
    }

    pub fn list_erasures(&self) -> Result<Vec<&'pool Package>> {
        Ok(self.borrow_all(self.solved()?.erasures()))
    }

    pub fn list_upgrades(&self) -> Result<Vec<&'pool Package>> {
        Ok(self.borrow_all(self.solved()?.upgrades()))
    }

    pub fn list_downgrades(&self) -> Result<Vec<&'pool Package>> {
        Ok(self.borrow_all(self.solved()?.downgrades()))
    }

    fn borrow_all(&self, ids: &[PackageId]) -> Vec<&'pool Package> {
        ids.iter().map(|&id| self.pool.get(id)).collect()
    }

    /// The classified transaction, if the last solve succeeded
    pub fn transaction(&self) -> Option<&Transaction> {
        self.transaction.as_ref()
    }

    /// First package the given new-side package displaces
    pub fn package_obsoletes(&self, new_side: PackageId) -> Option<PackageId> {
        self.transaction.as_ref()?.package_obsoletes(new_side)
    }

    /// Why the package is part of the transaction; `User` when the
    /// solve never recorded it
    pub fn get_reason(&self, pkg: PackageId) -> Reason {
        match &self.transaction {
            Some(tx) => tx.reason(pkg),
            None => Reason::User,
        }
    }

    pub fn count_problems(&self) -> usize {
        self.problems.len()
    }

    pub fn describe_problem(&self, index: usize) -> Result<String> {
        self.problems
            .get(index)
            .map(Problem::to_string)
            .ok_or_else(|| Error::State(format!("no problem at index {}", index)))
    }

    /// Replay the decision trace of the last successful solve through
    /// the injected sink
    pub fn log_decisions(&mut self) -> Result<()> {
        if self.state != GoalState::Solved {
            return Err(Error::State(
                "goal must be solved before logging decisions".to_string(),
            ));
        }
        for record in &self.trace {
            self.sink.record(record);
        }
        Ok(())
    }
}
