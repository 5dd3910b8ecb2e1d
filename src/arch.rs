// src/arch.rs

//! Host architecture detection and compatibility
//!
//! Default arch filters and candidate preference need to know what the
//! host is. Detection is best-effort; callers that target a foreign
//! architecture set it on the pool explicitly instead.

use crate::error::{Error, Result};
use std::env;

/// Detect the current system architecture
///
/// Common values: "x86_64", "aarch64", "x86", "arm".
pub fn detect_arch() -> Result<String> {
    let arch = env::consts::ARCH;
    if arch.is_empty() {
        return Err(Error::ArchDetection(
            "target architecture is unknown to the toolchain".to_string(),
        ));
    }
    Ok(arch.to_string())
}

/// Check if a package architecture is compatible with the system
///
/// "noarch" is compatible with everything; otherwise the names must match.
pub fn arch_compatible(pkg_arch: &str, system_arch: &str) -> bool {
    pkg_arch == "noarch" || pkg_arch == system_arch
}
