//! Version parsing and comparison

use crate::error::{Error, Result};
use semver::Version;

/// Parse a version, tolerating a leading `v` and missing minor/patch parts
pub fn parse_lenient(version: &str) -> Result<Version> {
    let trimmed = version.trim().trim_start_matches(['v', 'V']);
    if let Ok(v) = Version::parse(trimmed) {
        return Ok(v);
    }

    // "1.2" -> "1.2.0", "3" -> "3.0.0"
    let (core, rest) = match trimmed.find(['-', '+']) {
        Some(idx) => trimmed.split_at(idx),
        None => (trimmed, ""),
    };
    let parts = core.split('.').count();
    if parts == 0 || parts > 3 {
        return Err(Error::invalid_version(version));
    }
    let padded = format!("{}{}{}", core, ".0".repeat(3 - parts), rest);
    Version::parse(&padded).map_err(|_| Error::invalid_version(version))
}

/// Whether `candidate` is strictly newer than `current`.
///
/// Unparseable versions never count as newer.
pub fn is_newer(candidate: &str, current: &str) -> bool {
    match (parse_lenient(candidate), parse_lenient(current)) {
        (Ok(a), Ok(b)) => a > b,
        _ => false,
    }
}
