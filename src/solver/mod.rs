// src/solver/mod.rs

//! Solver boundary
//!
//! The goal layer talks to dependency resolution through the [`Solver`]
//! trait so a mature external engine can be substituted without touching
//! goal or query logic. The trait consumes the pool plus an ordered job
//! list and returns either a decision set or a problem set; unsolvable
//! input is a normal outcome, not an error.
//!
//! Decision traces are reported through an injected [`DecisionSink`]
//! rather than any process-wide log.

mod engine;

pub use engine::GreedySolver;

use crate::package::PackageId;
use crate::pool::Pool;
use serde::Serialize;
use std::fmt;
use std::io::Write;
use tracing::debug;

/// What a single job asks the solver to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverAction {
    Install,
    Erase,
    Upgrade,
    UpgradeAll,
    Downgrade,
    DistUpgrade,
    DistUpgradeAll,
    UserInstalled,
}

/// Per-job behavior switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobFlags {
    /// Fail the job when no package of the target name is installed
    pub check_installed: bool,
    /// Sweep no-longer-needed dependencies after an erase
    pub clean_deps: bool,
    /// A failed weak job is skipped instead of reported as a problem
    pub weak: bool,
}

/// Goal-wide behavior switches for one solve
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolveFlags {
    /// Let erases cascade to dependent packages instead of failing
    pub allow_uninstall: bool,
}

/// One resolution request with its candidate set snapshotted by the goal
#[derive(Debug, Clone)]
pub struct SolverJob {
    pub action: SolverAction,
    pub candidates: Vec<PackageId>,
    pub flags: JobFlags,
}

impl SolverJob {
    pub fn new(action: SolverAction, candidates: Vec<PackageId>) -> Self {
        Self {
            action,
            candidates,
            flags: JobFlags::default(),
        }
    }

    pub fn with_flags(mut self, flags: JobFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// Why a package entered the decision set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionKind {
    Install,
    Erase,
}

/// One solver decision
///
/// `required_by` is set when the package was pulled in to satisfy a
/// requirement of another package rather than named by a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub pkg: PackageId,
    pub kind: DecisionKind,
    pub required_by: Option<PackageId>,
}

/// Serializable trace entry for one decision
#[derive(Debug, Clone, Serialize)]
pub struct DecisionRecord {
    pub action: &'static str,
    pub nevra: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_by: Option<String>,
}

impl DecisionRecord {
    pub(crate) fn new(pool: &Pool, decision: &Decision) -> Self {
        Self {
            action: match decision.kind {
                DecisionKind::Install => "install",
                DecisionKind::Erase => "erase",
            },
            nevra: pool.get(decision.pkg).nevra(),
            required_by: decision.required_by.map(|id| pool.get(id).nevra()),
        }
    }
}

/// Receives decision trace entries
///
/// Injected at goal construction; there is no ambient global trace.
pub trait DecisionSink {
    fn record(&mut self, record: &DecisionRecord);
}

/// Default sink: forwards each decision to the tracing subscriber
#[derive(Debug, Default)]
pub struct TracingSink;

impl DecisionSink for TracingSink {
    fn record(&mut self, record: &DecisionRecord) {
        match &record.required_by {
            Some(by) => debug!("{} {} (required by {})", record.action, record.nevra, by),
            None => debug!("{} {}", record.action, record.nevra),
        }
    }
}

/// Writes each decision as one JSON object per line
pub struct JsonSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> DecisionSink for JsonSink<W> {
    fn record(&mut self, record: &DecisionRecord) {
        if let Ok(line) = serde_json::to_string(record) {
            let _ = writeln!(self.writer, "{}", line);
        }
    }
}

/// Collects records in memory
#[derive(Debug, Default)]
pub struct VecSink {
    pub records: Vec<DecisionRecord>,
}

impl DecisionSink for VecSink {
    fn record(&mut self, record: &DecisionRecord) {
        self.records.push(record.clone());
    }
}

/// One unsatisfiable job, described as human-readable causal rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    rules: Vec<String>,
}

impl Problem {
    pub(crate) fn new(rule: impl Into<String>) -> Self {
        Self {
            rules: vec![rule.into()],
        }
    }

    pub(crate) fn push(&mut self, rule: impl Into<String>) {
        self.rules.push(rule.into());
    }

    pub fn rules(&self) -> &[String] {
        &self.rules
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rules.join(", "))
    }
}

/// What a solve produced
#[derive(Debug, Clone)]
pub enum SolveOutcome {
    /// All jobs satisfied; the decision list is in commit order
    Solution(Vec<Decision>),
    /// At least one non-weak job could not be satisfied
    Problems(Vec<Problem>),
}

/// Black-box resolution engine
pub trait Solver {
    fn solve(&self, pool: &Pool, jobs: &[SolverJob], flags: SolveFlags) -> SolveOutcome;
}
