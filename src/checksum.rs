// src/checksum.rs

//! Checksum kinds and stored digests
//!
//! Digests are computed by the repository loader; this module only names
//! the algorithms and carries the bytes. The numeric codes are part of
//! the external enumeration contract and must never change: callers
//! persist them.

use std::fmt;
use strum_macros::{Display, EnumString};

/// Checksum algorithm selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ChecksumKind {
    Md5,
    Sha1,
    Sha256,
    Sha512,
}

impl ChecksumKind {
    /// Stable numeric code for this kind (external enumeration contract)
    pub const fn code(&self) -> u32 {
        match self {
            Self::Md5 => 1,
            Self::Sha1 => 2,
            Self::Sha256 => 3,
            Self::Sha512 => 4,
        }
    }

    /// Look a kind up by its stable numeric code
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::Md5),
            2 => Some(Self::Sha1),
            3 => Some(Self::Sha256),
            4 => Some(Self::Sha512),
            _ => None,
        }
    }

    /// Digest length in bytes
    pub const fn output_len(&self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha1 => 20,
            Self::Sha256 => 32,
            Self::Sha512 => 64,
        }
    }
}

/// A digest as materialized from repository metadata
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Checksum {
    pub kind: ChecksumKind,
    pub digest: Vec<u8>,
}

impl Checksum {
    pub fn new(kind: ChecksumKind, digest: Vec<u8>) -> Self {
        Self { kind, digest }
    }

    /// Parse from the "kind:hex" form repository loaders commonly emit
    pub fn parse(s: &str) -> crate::error::Result<Self> {
        let (kind_str, hex_str) = s
            .split_once(':')
            .ok_or_else(|| crate::error::Error::Parse(format!("malformed checksum '{}'", s)))?;
        let kind: ChecksumKind = kind_str
            .parse()
            .map_err(|_| crate::error::Error::Parse(format!("unknown checksum kind '{}'", kind_str)))?;
        let digest = hex::decode(hex_str)
            .map_err(|e| crate::error::Error::Parse(format!("bad checksum hex '{}': {}", s, e)))?;
        Ok(Self { kind, digest })
    }

    pub fn hex(&self) -> String {
        hex::encode(&self.digest)
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(ChecksumKind::Sha256.to_string(), "sha256");
        assert_eq!("md5".parse::<ChecksumKind>().unwrap(), ChecksumKind::Md5);
        assert!("crc32".parse::<ChecksumKind>().is_err());
    }

    #[test]
    fn test_kind_codes_stable() {
        for kind in [
            ChecksumKind::Md5,
            ChecksumKind::Sha1,
            ChecksumKind::Sha256,
            ChecksumKind::Sha512,
        ] {
            assert_eq!(ChecksumKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(ChecksumKind::from_code(99), None);
    }

    #[test]
    fn test_checksum_parse_roundtrip() {
        let c = Checksum::parse("sha256:00ff").unwrap();
        assert_eq!(c.kind, ChecksumKind::Sha256);
        assert_eq!(c.digest, vec![0x00, 0xff]);
        assert_eq!(c.to_string(), "sha256:00ff");
        assert!(Checksum::parse("nohex").is_err());
    }
}
