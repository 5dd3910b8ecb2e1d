// src/version/mod.rs

//! EVR parsing and RPM-style version comparison
//!
//! This module provides parsing and ordering for the epoch:version-release
//! format. Comparison follows the rpmvercmp rules: strings are split into
//! runs of digits and runs of letters, digit runs compare numerically,
//! letter runs compare lexically, and a tilde segment sorts below
//! everything, including the end of the string.

use crate::error::{Error, Result};
use std::cmp::Ordering;
use std::fmt;

/// A parsed EVR with epoch, version, and release components
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Evr {
    pub epoch: u64,
    pub version: String,
    pub release: Option<String>,
}

impl Evr {
    /// Parse an EVR string
    ///
    /// Format: [epoch:]version[-release]
    /// Examples:
    /// - "1.2.3" → epoch=0, version="1.2.3", release=None
    /// - "2:1.2.3" → epoch=2, version="1.2.3", release=None
    /// - "1.2.3-4.el8" → epoch=0, version="1.2.3", release=Some("4.el8")
    /// - "1:2.3.4-5.el8" → epoch=1, version="2.3.4", release=Some("5.el8")
    pub fn parse(s: &str) -> Result<Self> {
        let (epoch_str, rest) = if let Some(colon_pos) = s.find(':') {
            let (e, r) = s.split_at(colon_pos);
            (e, &r[1..]) // Skip the colon
        } else {
            ("0", s)
        };

        let epoch = if epoch_str.is_empty() {
            0 // Empty epoch (e.g. ":1.0.0") defaults to 0
        } else {
            epoch_str
                .parse::<u64>()
                .map_err(|e| Error::Parse(format!("invalid epoch in '{}': {}", s, e)))?
        };

        let (version, release) = if let Some(dash_pos) = rest.find('-') {
            let (v, r) = rest.split_at(dash_pos);
            (v.to_string(), Some(r[1..].to_string()))
        } else {
            (rest.to_string(), None)
        };

        if version.is_empty() {
            return Err(Error::Parse(format!("empty version component in '{}'", s)));
        }

        Ok(Self {
            epoch,
            version,
            release,
        })
    }

    /// Compare two EVRs
    ///
    /// Epoch is decisive, then the version string, then the release.
    /// A missing release compares equal to any release, matching the
    /// promotion rule RPM uses when matching provides without a release.
    pub fn compare(&self, other: &Evr) -> Ordering {
        match self.epoch.cmp(&other.epoch) {
            Ordering::Equal => {}
            ord => return ord,
        }

        match rpmvercmp(&self.version, &other.version) {
            Ordering::Equal => {}
            ord => return ord,
        }

        match (&self.release, &other.release) {
            (Some(a), Some(b)) => rpmvercmp(a, b),
            _ => Ordering::Equal,
        }
    }
}

impl fmt::Display for Evr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch > 0 {
            write!(f, "{}:", self.epoch)?;
        }
        write!(f, "{}", self.version)?;
        if let Some(ref release) = self.release {
            write!(f, "-{}", release)?;
        }
        Ok(())
    }
}

/// Total order consistent with `Eq`: the semantic [`Evr::compare`]
/// first, then structural tie-breaks on the version and release text.
/// `compare` can report `Equal` for structurally different values
/// ("1.05" vs "1.5", a missing release vs any release); `cmp` must not.
impl Ord for Evr {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
            .then_with(|| self.version.cmp(&other.version))
            .then_with(|| self.release.cmp(&other.release))
    }
}

impl PartialOrd for Evr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One segment of an rpmvercmp split
enum Segment<'a> {
    Digits(&'a str),
    Letters(&'a str),
}

/// Compare two version strings with the rpmvercmp algorithm
pub fn rpmvercmp(a: &str, b: &str) -> Ordering {
    let mut a = a.as_bytes();
    let mut b = b.as_bytes();

    loop {
        // Drop separators: anything that is not alphanumeric or a tilde.
        while let Some(&c) = a.first() {
            if c.is_ascii_alphanumeric() || c == b'~' {
                break;
            }
            a = &a[1..];
        }
        while let Some(&c) = b.first() {
            if c.is_ascii_alphanumeric() || c == b'~' {
                break;
            }
            b = &b[1..];
        }

        // Tilde sorts before everything, including the end of the string.
        match (a.first() == Some(&b'~'), b.first() == Some(&b'~')) {
            (true, true) => {
                a = &a[1..];
                b = &b[1..];
                continue;
            }
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => {}
        }

        if a.is_empty() || b.is_empty() {
            return a.len().cmp(&b.len());
        }

        let (seg_a, rest_a) = take_segment(a);
        let (seg_b, rest_b) = take_segment(b);

        let ord = match (seg_a, seg_b) {
            (Segment::Digits(da), Segment::Digits(db)) => {
                let da = da.trim_start_matches('0');
                let db = db.trim_start_matches('0');
                // Longer numeric run wins; equal lengths compare as strings.
                da.len().cmp(&db.len()).then_with(|| da.cmp(db))
            }
            (Segment::Letters(la), Segment::Letters(lb)) => la.cmp(lb),
            // A numeric segment always beats an alphabetic one.
            (Segment::Digits(_), Segment::Letters(_)) => Ordering::Greater,
            (Segment::Letters(_), Segment::Digits(_)) => Ordering::Less,
        };

        if ord != Ordering::Equal {
            return ord;
        }

        a = rest_a;
        b = rest_b;
    }
}

/// Split off the leading run of digits or letters
fn take_segment(s: &[u8]) -> (Segment<'_>, &[u8]) {
    debug_assert!(!s.is_empty());
    if s[0].is_ascii_digit() {
        let end = s.iter().position(|c| !c.is_ascii_digit()).unwrap_or(s.len());
        (
            Segment::Digits(std::str::from_utf8(&s[..end]).unwrap_or("")),
            &s[end..],
        )
    } else {
        let end = s
            .iter()
            .position(|c| !c.is_ascii_alphabetic())
            .unwrap_or(s.len());
        (
            Segment::Letters(std::str::from_utf8(&s[..end]).unwrap_or("")),
            &s[end..],
        )
    }
}
