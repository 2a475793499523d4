//! Version derivation from source-control history
//!
//! A module's version is `{major}.{minor}.{commit count}-x{short hash}`,
//! where major/minor come from the currently declared version and the count
//! and hash come from the history of the module's file set. The declared
//! version is decomposed with a deliberately relaxed parser: components may
//! be absent, absent components render as empty tokens, and nothing is ever
//! rejected as malformed.

use crate::error::KilnResult;
use crate::scm::Scm;
use std::fmt;
use std::path::PathBuf;

/// Relaxed decomposition of a version string into up to three components.
///
/// Not semver: components are kept as raw strings, any of them may be
/// absent or empty, and anything past the second dot stays in the patch
/// slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionParts {
    pub major: Option<String>,
    pub minor: Option<String>,
    pub patch: Option<String>,
}

impl VersionParts {
    /// Split a declared version on the first two dots. The empty string
    /// parses as major "0"; a trailing dot leaves a present-but-empty
    /// component, not an absent one.
    pub fn parse(version: &str) -> Self {
        let version = if version.is_empty() { "0" } else { version };
        let mut components = version.splitn(3, '.');
        Self {
            major: components.next().map(|s| s.to_string()),
            minor: components.next().map(|s| s.to_string()),
            patch: components.next().map(|s| s.to_string()),
        }
    }
}

impl fmt::Display for VersionParts {
    /// Renders absent components as empty tokens ("1" parses and renders
    /// back as "1.."). Round-trips only when all three are present.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}",
            self.major.as_deref().unwrap_or(""),
            self.minor.as_deref().unwrap_or(""),
            self.patch.as_deref().unwrap_or("")
        )
    }
}

/// Derive the version for one module from the history of its file set.
///
/// The minor component defaults to "0" here (and only here) when the
/// declared version has none. A file set with no matching commits yields
/// count 0 and an empty hash suffix; that is a valid version, not an error.
pub async fn derive(
    scm: &dyn Scm,
    declared_version: &str,
    file_set: &[PathBuf],
) -> KilnResult<String> {
    let parts = VersionParts::parse(declared_version);
    let major = parts.major.as_deref().unwrap_or("");
    let minor = parts.minor.as_deref().unwrap_or("0");

    let count = scm.commit_count(file_set).await?;
    let head = scm.last_commit(file_set).await?;
    let short = head.get(..6).unwrap_or(head.as_str());

    Ok(format!("{major}.{minor}.{count}-x{short}"))
}

/// Pull-request override for the site module: `{major}.{minor}-PR{id}`,
/// taken from the declared (not derived) version. No minor default here.
pub fn pr_version(declared_version: &str, pull_request: &str) -> String {
    let parts = VersionParts::parse(declared_version);
    format!(
        "{}.{}-PR{}",
        parts.major.as_deref().unwrap_or(""),
        parts.minor.as_deref().unwrap_or(""),
        pull_request
    )
}

/// CI build-number suffix for the site module
pub fn with_build_number(version: &str, build_number: &str) -> String {
    format!("{version}+{build_number}")
}
