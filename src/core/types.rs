//! Common type definitions used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::errors::Error;

/// Extraction depth for structural parsing.
///
/// Deeper levels are strictly more expensive to extract; `File` only tracks
/// paths, `Line` tracks every interesting source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    File,
    Class,
    Method,
    Line,
}

impl Granularity {
    /// Whether components of the given kind are extracted at this depth
    pub fn includes(&self, kind: ComponentKind) -> bool {
        kind.depth() <= self.depth()
    }

    pub fn depth(&self) -> u8 {
        match self {
            Granularity::File => 0,
            Granularity::Class => 1,
            Granularity::Method => 2,
            Granularity::Line => 3,
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Granularity::File => "file",
            Granularity::Class => "class",
            Granularity::Method => "method",
            Granularity::Line => "line",
        })
    }
}

/// Kind of a structural component
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    File,
    Class,
    Method,
    Line,
}

impl ComponentKind {
    pub fn depth(&self) -> u8 {
        match self {
            ComponentKind::File => 0,
            ComponentKind::Class => 1,
            ComponentKind::Method => 2,
            ComponentKind::Line => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::File => "file",
            ComponentKind::Class => "class",
            ComponentKind::Method => "method",
            ComponentKind::Line => "line",
        }
    }
}

/// Canonical, rename-invariant identity of a component: the dotted
/// concatenation of ancestor names, e.g. `API.java.API.login(String,String)`.
///
/// Identity is independent of line ranges, so two parses of the same logical
/// entity at different positions compare equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Identity of a file root: its repository-relative path
    pub fn file(path: &str) -> Self {
        Identity(path.to_string())
    }

    /// Identity of a named child of this component
    pub fn child(&self, name: &str) -> Self {
        Identity(format!("{}.{}", self.0, name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `other` is this identity or lies underneath it
    pub fn is_prefix_of(&self, other: &Identity) -> bool {
        other.0 == self.0
            || (other.0.starts_with(&self.0) && other.0.as_bytes().get(self.0.len()) == Some(&b'.'))
    }

    /// Rewrite the ancestor prefix of this identity after a rename, if it
    /// lies under `old`
    pub fn reprefixed(&self, old: &Identity, new: &Identity) -> Option<Identity> {
        if self == old {
            return Some(new.clone());
        }
        self.0
            .strip_prefix(&old.0)
            .and_then(|rest| rest.strip_prefix('.'))
            .map(|rest| Identity(format!("{}.{}", new.0, rest)))
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Relative importance of each activity feature in the defect probability.
///
/// A valid triple is strictly positive and sums to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureWeights {
    pub revisions: f64,
    pub fixes: f64,
    pub authors: f64,
}

impl Default for FeatureWeights {
    fn default() -> Self {
        Self {
            revisions: 0.25,
            fixes: 0.5,
            authors: 0.25,
        }
    }
}

impl FeatureWeights {
    pub const SUM_TOLERANCE: f64 = 1e-5;

    pub fn new(revisions: f64, fixes: f64, authors: f64) -> Self {
        Self {
            revisions,
            fixes,
            authors,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.revisions > 0.0
            && self.fixes > 0.0
            && self.authors > 0.0
            && ((self.revisions + self.fixes + self.authors) - 1.0).abs() < Self::SUM_TOLERANCE
    }

    /// Reject invalid triples at the boundary; weights are never silently
    /// renormalized
    pub fn validate(&self) -> Result<(), Error> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(Error::configuration(format!(
                "feature weights must be strictly positive and sum to 1, got revisions={} fixes={} authors={}",
                self.revisions, self.fixes, self.authors
            )))
        }
    }
}
