// src/lib.rs

//! Resolvent
//!
//! Transaction planning for RPM-style package management: a package
//! pool with interned relational dependencies, a query selection
//! sublanguage, and a goal layer that turns resolution jobs into a
//! classified transaction through a pluggable solver boundary.
//!
//! # Architecture
//!
//! - Pool-first: packages, repos, and reldeps live in arenas addressed
//!   by small integer handles
//! - Queries are validated eagerly and evaluated lazily; `run()` never
//!   fails
//! - The solver is a trait; unsatisfiable input is a normal outcome,
//!   never an error
//! - Decision traces flow through an injected sink, not a global log

pub mod arch;
pub mod checksum;
mod error;
pub mod goal;
pub mod package;
pub mod pool;
pub mod query;
pub mod reldep;
pub mod solver;
pub mod version;

pub use arch::{arch_compatible, detect_arch};
pub use checksum::{Checksum, ChecksumKind};
pub use error::{Error, Result};
pub use goal::{Goal, Reason, Transaction};
pub use package::{Package, PackageId, RepoId};
pub use pool::{
    PackageSpec, Pool, CMDLINE_REPO_NAME, DEFAULT_INSTALLONLY_LIMIT, SYSTEM_REPO_NAME,
};
pub use query::{Cmp, CmpOp, MatchValue, Query, QueryKey};
pub use reldep::{CmpSense, Reldep, ReldepId};
pub use solver::{
    Decision, DecisionKind, DecisionRecord, DecisionSink, GreedySolver, JobFlags, JsonSink,
    Problem, SolveFlags, SolveOutcome, Solver, SolverAction, SolverJob, TracingSink, VecSink,
};
pub use version::{rpmvercmp, Evr};
