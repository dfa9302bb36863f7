//! Qualified identifiers for architecture elements.
//!
//! A qualified ID is the slash-joined path of normalized short IDs from the
//! owning system down to the element:
//!
//! - system: `<system>`
//! - container: `<system>/<container>`
//! - component: `<system>/<container>/<component>`
//!
//! External tools key off this exact format, so it must not change.

use crate::ElementKind;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

pub const SEPARATOR: char = '/';

/// Normalize a display name into a short ID: lowercase, hyphen separated.
///
/// Runs of characters that are not ASCII alphanumerics collapse into a single
/// `-`, and leading/trailing hyphens are dropped.
pub fn normalize_id(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch.to_ascii_lowercase());
        } else if !ch.is_ascii() && ch.is_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    out
}

/// Normalize a possibly qualified reference segment by segment.
pub fn normalize_reference(reference: &str) -> String {
    reference
        .split(SEPARATOR)
        .map(normalize_id)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct QualifiedId(String);

impl QualifiedId {
    pub fn system(system: &str) -> Self {
        Self(system.to_string())
    }

    pub fn container(system: &str, container: &str) -> Self {
        Self(format!("{}{}{}", system, SEPARATOR, container))
    }

    pub fn component(system: &str, container: &str, component: &str) -> Self {
        Self(format!(
            "{}{}{}{}{}",
            system, SEPARATOR, container, SEPARATOR, component
        ))
    }

    /// Parse a string that is already in qualified form.
    ///
    /// Returns `None` for empty segments or more than three levels.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let segments: Vec<&str> = raw.split(SEPARATOR).collect();
        if segments.len() > 3 || segments.iter().any(|s| s.trim().is_empty()) {
            return None;
        }
        Some(Self(raw.to_string()))
    }

    /// Qualified ID of a direct child of this element.
    pub fn child(&self, short_id: &str) -> Self {
        Self(format!("{}{}{}", self.0, SEPARATOR, short_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEPARATOR)
    }

    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Element kind implied by the path depth.
    pub fn implied_kind(&self) -> Option<ElementKind> {
        ElementKind::from_depth(self.depth())
    }

    /// The trailing, unqualified segment.
    pub fn short_id(&self) -> &str {
        match self.0.rfind(SEPARATOR) {
            Some(pos) => &self.0[pos + 1..],
            None => &self.0,
        }
    }

    pub fn parent(&self) -> Option<QualifiedId> {
        self.0
            .rfind(SEPARATOR)
            .map(|pos| QualifiedId(self.0[..pos].to_string()))
    }

    /// Whether `suffix` matches the trailing path segments of this ID.
    ///
    /// `backend/api/auth` ends with `auth`, `api/auth` and itself, but not `i/auth`.
    pub fn ends_with_path(&self, suffix: &str) -> bool {
        if suffix.is_empty() {
            return false;
        }
        if self.0 == suffix {
            return true;
        }
        self.0.len() > suffix.len()
            && self.0.ends_with(suffix)
            && self.0.as_bytes()[self.0.len() - suffix.len() - 1] == SEPARATOR as u8
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for QualifiedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for QualifiedId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for QualifiedId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<QualifiedId> for String {
    fn from(id: QualifiedId) -> Self {
        id.0
    }
}
