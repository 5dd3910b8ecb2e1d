// src/error.rs

//! Error types for the planning engine
//!
//! Unsatisfiability is deliberately absent here: a goal that cannot be
//! solved is a normal terminal state reported through the problem set,
//! not an `Err`.

use thiserror::Error;

/// Result type for resolvent operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building queries, jobs, or goals
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed query clause: bad key/comparison/value combination.
    /// Raised eagerly at `filter()` time.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// A query resolves to a selection unusable by the requested job type
    /// (e.g. erasing packages that are not installed)
    #[error("query not usable for this job: {0}")]
    QueryTarget(String),

    /// A job list contains a query-built job the solver cannot express;
    /// detected at `go()` time
    #[error("invalid query in goal: {0}")]
    Query(String),

    /// A transaction-reading operation was invoked in the wrong goal state
    #[error("goal state error: {0}")]
    State(String),

    /// The host architecture could not be determined
    #[error("failed to detect host architecture: {0}")]
    ArchDetection(String),

    /// Malformed EVR, NEVRA, or relational dependency text
    #[error("parse error: {0}")]
    Parse(String),
}
