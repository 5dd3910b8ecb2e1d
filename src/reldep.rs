// src/reldep.rs

//! Relational dependencies and their interning arena
//!
//! A reldep is the (name, comparison, EVR) triple appearing in
//! provides/requires/conflicts/obsoletes lists. Reldeps are interned:
//! two textually identical reldeps share one `ReldepId`, giving O(1)
//! equality and hashing during solving. The arena replaces the pointer
//! identity of the original design with explicit small-integer handles.

use crate::error::{Error, Result};
use crate::version::Evr;
use std::collections::HashMap;
use std::fmt;

/// Comparison sense of a relational dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpSense {
    /// No version restriction, any provider of the name matches
    Any,
    Eq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl fmt::Display for CmpSense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CmpSense::Any => "",
            CmpSense::Eq => "=",
            CmpSense::Lt => "<",
            CmpSense::Lte => "<=",
            CmpSense::Gt => ">",
            CmpSense::Gte => ">=",
        };
        write!(f, "{}", s)
    }
}

/// A relational dependency value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reldep {
    pub name: String,
    pub sense: CmpSense,
    pub evr: Option<Evr>,
}

impl Reldep {
    /// A bare name dependency, satisfied by any version
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sense: CmpSense::Any,
            evr: None,
        }
    }

    pub fn new(name: impl Into<String>, sense: CmpSense, evr: Evr) -> Self {
        Self {
            name: name.into(),
            sense,
            evr: Some(evr),
        }
    }

    /// Parse a reldep string like "semolina = 2" or "penny < 5-0"
    ///
    /// A bare name parses as an unversioned dependency.
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = s.split_whitespace();
        let name = parts
            .next()
            .ok_or_else(|| Error::Parse("empty reldep".to_string()))?;
        let Some(op) = parts.next() else {
            return Ok(Self::name(name));
        };
        let sense = match op {
            "=" | "==" => CmpSense::Eq,
            "<" => CmpSense::Lt,
            "<=" => CmpSense::Lte,
            ">" => CmpSense::Gt,
            ">=" => CmpSense::Gte,
            _ => return Err(Error::Parse(format!("bad reldep operator in '{}'", s))),
        };
        let evr_str = parts
            .next()
            .ok_or_else(|| Error::Parse(format!("reldep '{}' is missing a version", s)))?;
        if parts.next().is_some() {
            return Err(Error::Parse(format!("trailing junk in reldep '{}'", s)));
        }
        Ok(Self::new(name, sense, Evr::parse(evr_str)?))
    }

    /// Whether this reldep and another can be satisfied by the same
    /// version of the named capability
    ///
    /// Used both to match a provide against a require and to match an
    /// obsolete against an installed package identity.
    pub fn overlaps(&self, other: &Reldep) -> bool {
        if self.name != other.name {
            return false;
        }
        // Unversioned on either side matches any version.
        let (Some(evr_a), Some(evr_b)) = (&self.evr, &other.evr) else {
            return true;
        };
        if self.sense == CmpSense::Any || other.sense == CmpSense::Any {
            return true;
        }

        // Intersect the two version ranges. Each side contributes up to
        // one lower and one upper bound; Eq contributes both.
        let ok = |lower: Option<(&Evr, bool)>, upper: Option<(&Evr, bool)>| match (lower, upper) {
            (Some((lo, lo_incl)), Some((hi, hi_incl))) => match lo.compare(hi) {
                std::cmp::Ordering::Less => true,
                std::cmp::Ordering::Equal => lo_incl && hi_incl,
                std::cmp::Ordering::Greater => false,
            },
            _ => true,
        };

        ok(lower_bound(self.sense, evr_a), upper_bound(other.sense, evr_b))
            && ok(lower_bound(other.sense, evr_b), upper_bound(self.sense, evr_a))
    }
}

fn lower_bound(sense: CmpSense, evr: &Evr) -> Option<(&Evr, bool)> {
    match sense {
        CmpSense::Eq | CmpSense::Gte => Some((evr, true)),
        CmpSense::Gt => Some((evr, false)),
        _ => None,
    }
}

fn upper_bound(sense: CmpSense, evr: &Evr) -> Option<(&Evr, bool)> {
    match sense {
        CmpSense::Eq | CmpSense::Lte => Some((evr, true)),
        CmpSense::Lt => Some((evr, false)),
        _ => None,
    }
}

impl fmt::Display for Reldep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.evr {
            Some(evr) if self.sense != CmpSense::Any => {
                write!(f, "{} {} {}", self.name, self.sense, evr)
            }
            _ => write!(f, "{}", self.name),
        }
    }
}

/// Interned reldep handle; an index into the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReldepId(pub(crate) u32);

/// Arena of canonical reldep records
///
/// Interning is keyed on the reldep's canonical text, so "semolina = 2"
/// always resolves to the same handle no matter which package mentions it.
#[derive(Debug, Default)]
pub struct ReldepArena {
    entries: Vec<Reldep>,
    index: HashMap<String, ReldepId>,
}

impl ReldepArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a reldep, returning the canonical handle
    pub fn intern(&mut self, reldep: Reldep) -> ReldepId {
        let key = reldep.to_string();
        if let Some(&id) = self.index.get(&key) {
            return id;
        }
        let id = ReldepId(self.entries.len() as u32);
        self.entries.push(reldep);
        self.index.insert(key, id);
        id
    }

    /// Parse and intern in one step
    pub fn intern_str(&mut self, s: &str) -> Result<ReldepId> {
        Ok(self.intern(Reldep::parse(s)?))
    }

    /// Look up an already-interned reldep by its text
    pub fn find_str(&self, s: &str) -> Option<ReldepId> {
        let reldep = Reldep::parse(s).ok()?;
        self.index.get(&reldep.to_string()).copied()
    }

    pub fn get(&self, id: ReldepId) -> &Reldep {
        &self.entries[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
