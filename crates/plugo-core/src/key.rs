//! Deterministic environment keys.
//!
//! A key is `"{sanitized plugin name}-{fingerprint}"`. The fingerprint is the first
//! [`FINGERPRINT_LEN`] hex chars of SHA-256 over a canonical JSON signature of the
//! version and the sorted requirement set, so the same plugin/version/requirements
//! always map to the same environment directory and any change maps to a new one.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fmt;

/// Hex characters kept from the digest.
pub const FINGERPRINT_LEN: usize = 12;

/// Prefix used when a plugin name sanitizes to nothing.
pub const PLACEHOLDER_NAME: &str = "plugin";

/// Normalized requirement specifiers: trimmed, non-empty, sorted, unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct RequirementSet(BTreeSet<String>);

impl RequirementSet {
    pub fn new<I, S>(requirements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        requirements.into_iter().collect()
    }

    /// Parse `requirements.txt` content: one specifier per line, `#` lines skipped.
    pub fn from_requirements_txt(content: &str) -> Self {
        content
            .lines()
            .map(str::trim)
            .filter(|l| !l.starts_with('#'))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Specifiers in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn extend<I, S>(&mut self, more: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for r in more {
            let r = r.as_ref().trim();
            if !r.is_empty() {
                self.0.insert(r.to_string());
            }
        }
    }
}

impl<S: AsRef<str>> FromIterator<S> for RequirementSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::default();
        set.extend(iter);
        set
    }
}

impl From<Vec<String>> for RequirementSet {
    fn from(v: Vec<String>) -> Self {
        v.into_iter().collect()
    }
}

impl From<RequirementSet> for Vec<String> {
    fn from(set: RequirementSet) -> Self {
        set.0.into_iter().collect()
    }
}

/// Stable, filesystem-safe environment identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvironmentKey(String);

impl EnvironmentKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Sanitized plugin-name part.
    pub fn prefix(&self) -> &str {
        self.0.rsplit_once('-').map_or(self.0.as_str(), |(p, _)| p)
    }

    /// Hex digest part.
    pub fn fingerprint(&self) -> &str {
        self.0.rsplit_once('-').map_or("", |(_, fp)| fp)
    }
}

impl fmt::Display for EnvironmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EnvironmentKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A plugin as the host loader sees it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginIdentity {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub requirements: RequirementSet,
}

impl PluginIdentity {
    pub fn key(&self) -> EnvironmentKey {
        build_key(&self.name, self.version.as_deref(), &self.requirements)
    }
}

/// Canonical signature; field order is lexicographic and fixed.
#[derive(Serialize)]
struct Signature<'a> {
    requirements: Vec<&'a str>,
    version: &'a str,
}

/// Derive the environment key for a plugin.
///
/// `None` and `Some("")` versions are equivalent.
pub fn build_key(
    plugin_name: &str,
    version: Option<&str>,
    requirements: &RequirementSet,
) -> EnvironmentKey {
    let sig = Signature {
        requirements: requirements.iter().collect(),
        version: version.unwrap_or(""),
    };
    // Serializing a struct of strings into memory cannot fail.
    let payload = serde_json::to_vec(&sig).unwrap_or_default();
    let digest = hex::encode(Sha256::digest(&payload));
    EnvironmentKey(format!(
        "{}-{}",
        sanitize_segment(plugin_name),
        &digest[..FINGERPRINT_LEN]
    ))
}

/// Make `raw` safe as a single path segment.
///
/// Separators, colons and spaces become `_`, surrounding `_` are stripped, and
/// an empty or dots-only result becomes [`PLACEHOLDER_NAME`].
pub fn sanitize_segment(raw: &str) -> String {
    let replaced: String = raw
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | ' ' => '_',
            other => other,
        })
        .collect();
    let trimmed = replaced.trim_matches('_');
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '.') {
        PLACEHOLDER_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}
