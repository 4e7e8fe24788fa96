//! Version parsing for tool probes

use semver::Version;

/// Parse a tool's `--version` output, tolerating a leading 'v' and whitespace
pub fn parse_version(version_str: &str) -> Option<Version> {
    let trimmed = version_str.trim();
    let cleaned = trimmed.strip_prefix('v').unwrap_or(trimmed);
    Version::parse(cleaned).ok()
}

/// True when `version_str` parses and is at least `minimum`
///
/// Unparsable output counts as "not new enough".
pub fn is_at_least(version_str: &str, minimum: &Version) -> bool {
    match parse_version(version_str) {
        Some(version) => version >= *minimum,
        None => false,
    }
}
