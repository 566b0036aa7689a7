//! Commits, diffs, and the repository stream they form.
//!
//! Software evolution is modeled as a chronological sequence of commits,
//! each carrying the typed structural diffs extracted against its parents.

use std::hash::{Hash, Hasher};

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::core::component::Component;
use crate::core::errors::Error;
use crate::core::types::{ComponentKind, Identity};

/// Kind of change a diff records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiffKind {
    Added,
    Removed,
    Modified,
    Renamed,
}

/// A component reference carried by a diff: identity plus display name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentRef {
    pub identity: Identity,
    pub name: String,
}

impl ComponentRef {
    pub fn new(identity: Identity, name: impl Into<String>) -> Self {
        Self {
            identity,
            name: name.into(),
        }
    }
}

impl From<&Component> for ComponentRef {
    fn from(component: &Component) -> Self {
        Self {
            identity: component.identity.clone(),
            name: component.name.clone(),
        }
    }
}

/// One component's change between two snapshots.
///
/// `version_a` is present unless the component was added, `version_b` unless
/// it was removed. `parent` is the enclosing component identity at the new
/// version (none for file-level diffs). Equality and hashing use only the
/// identities, never display names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diff {
    pub level: ComponentKind,
    pub kind: DiffKind,
    pub version_a: Option<ComponentRef>,
    pub version_b: Option<ComponentRef>,
    pub parent: Option<Identity>,
}

impl Diff {
    pub fn added(level: ComponentKind, parent: Option<Identity>, version_b: ComponentRef) -> Self {
        Self {
            level,
            kind: DiffKind::Added,
            version_a: None,
            version_b: Some(version_b),
            parent,
        }
    }

    pub fn removed(level: ComponentKind, parent: Option<Identity>, version_a: ComponentRef) -> Self {
        Self {
            level,
            kind: DiffKind::Removed,
            version_a: Some(version_a),
            version_b: None,
            parent,
        }
    }

    pub fn modified(
        level: ComponentKind,
        parent: Option<Identity>,
        version_a: ComponentRef,
        version_b: ComponentRef,
    ) -> Self {
        Self {
            level,
            kind: DiffKind::Modified,
            version_a: Some(version_a),
            version_b: Some(version_b),
            parent,
        }
    }

    pub fn renamed(
        level: ComponentKind,
        parent: Option<Identity>,
        version_a: ComponentRef,
        version_b: ComponentRef,
    ) -> Self {
        Self {
            level,
            kind: DiffKind::Renamed,
            version_a: Some(version_a),
            version_b: Some(version_b),
            parent,
        }
    }

    fn identity_a(&self) -> Option<&Identity> {
        self.version_a.as_ref().map(|r| &r.identity)
    }

    fn identity_b(&self) -> Option<&Identity> {
        self.version_b.as_ref().map(|r| &r.identity)
    }
}

impl PartialEq for Diff {
    fn eq(&self, other: &Self) -> bool {
        self.level == other.level
            && self.kind == other.kind
            && self.identity_a() == other.identity_a()
            && self.identity_b() == other.identity_b()
            && self.parent == other.parent
    }
}

impl Eq for Diff {}

impl Hash for Diff {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.level.hash(state);
        self.kind.hash(state);
        self.identity_a().hash(state);
        self.identity_b().hash(state);
        self.parent.hash(state);
    }
}

static DEFAULT_FIX_PATTERN: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new("fix(e[ds])?|bugs?|defects?|patch|corrigidos?|close([sd])?|resolve([sd])?")
        .case_insensitive(true)
        .build()
        .unwrap()
});

/// Commit message pattern marking bug-fixing commits
#[derive(Debug, Clone)]
pub struct FixPattern(Regex);

impl Default for FixPattern {
    fn default() -> Self {
        Self(DEFAULT_FIX_PATTERN.clone())
    }
}

impl FixPattern {
    pub fn new(pattern: &str) -> Result<Self, Error> {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map(Self)
            .map_err(|e| Error::configuration(format!("invalid fix pattern {pattern:?}: {e}")))
    }

    pub fn matches(&self, message: &str) -> bool {
        self.0.is_match(message)
    }
}

/// A commit with its extracted structural diffs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    pub id: String,
    pub message: String,
    pub author: String,
    pub timestamp: i64,
    /// Ordered by granularity: File, then Class, then Method, then Line
    pub diffs: Vec<Diff>,
}

impl Commit {
    pub fn new(
        id: impl Into<String>,
        message: impl Into<String>,
        author: impl Into<String>,
        timestamp: i64,
        mut diffs: Vec<Diff>,
    ) -> Self {
        // Merge commits contribute one diff list per parent; duplicates
        // would double-count metrics
        let mut seen = std::collections::HashSet::new();
        diffs.retain(|d| seen.insert(d.clone()));
        // Lower levels are only meaningful once their parents were applied
        diffs.sort_by_key(|d| d.level.depth());
        Self {
            id: id.into(),
            message: message.into(),
            author: author.into(),
            timestamp,
            diffs,
        }
    }

    pub fn is_bug_fixing(&self, pattern: &FixPattern) -> bool {
        pattern.matches(&self.message)
    }
}

/// A chronological commit stream with its history bounds
#[derive(Debug, Clone)]
pub struct Repository {
    /// Oldest first
    pub commits: Vec<Commit>,
    pub begin_ts: i64,
    pub last_ts: i64,
}

impl Repository {
    pub fn new(commits: Vec<Commit>) -> Result<Self, Error> {
        let begin_ts = commits
            .first()
            .map(|c| c.timestamp)
            .ok_or_else(|| Error::extraction("repository has no commits"))?;
        let last_ts = commits.last().map(|c| c.timestamp).unwrap_or(begin_ts);
        Ok(Self {
            commits,
            begin_ts,
            last_ts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit_with_message(message: &str) -> Commit {
        Commit::new("c1", message, "author@example.com", 0, Vec::new())
    }

    #[test]
    fn bug_fixing_matches_keyword_family() {
        let pattern = FixPattern::default();
        for message in [
            "Fixed login bug",
            "fixes #42",
            "Bug in parser",
            "Patch for CVE",
            "Closes the race",
            "resolved deadlock",
            "Defects everywhere",
        ] {
            assert!(
                commit_with_message(message).is_bug_fixing(&pattern),
                "expected {message:?} to be bug-fixing"
            );
        }
        for message in ["Add feature", "Refactor parser", "Bump version"] {
            assert!(
                !commit_with_message(message).is_bug_fixing(&pattern),
                "expected {message:?} not to be bug-fixing"
            );
        }
    }

    #[test]
    fn custom_fix_pattern_overrides_default() {
        let pattern = FixPattern::new("hotfix").unwrap();
        assert!(commit_with_message("HOTFIX: prod down").is_bug_fixing(&pattern));
        assert!(!commit_with_message("Fixed a thing").is_bug_fixing(&pattern));
        assert!(FixPattern::new("(unclosed").is_err());
    }

    #[test]
    fn commit_orders_diffs_by_granularity() {
        let file = ComponentRef::new(Identity::file("A.java"), "A.java");
        let class = ComponentRef::new(Identity::file("A.java").child("A"), "A");
        let method = ComponentRef::new(Identity::file("A.java").child("A").child("m()"), "m()");
        let commit = Commit::new(
            "c1",
            "msg",
            "a",
            0,
            vec![
                Diff::added(
                    ComponentKind::Method,
                    Some(class.identity.clone()),
                    method.clone(),
                ),
                Diff::added(ComponentKind::File, None, file.clone()),
                Diff::added(
                    ComponentKind::Class,
                    Some(file.identity.clone()),
                    class.clone(),
                ),
            ],
        );
        let levels: Vec<ComponentKind> = commit.diffs.iter().map(|d| d.level).collect();
        assert_eq!(
            levels,
            vec![
                ComponentKind::File,
                ComponentKind::Class,
                ComponentKind::Method
            ]
        );
    }

    #[test]
    fn diff_equality_ignores_display_names() {
        let a = Diff::added(
            ComponentKind::Class,
            Some(Identity::file("A.java")),
            ComponentRef::new(Identity::file("A.java").child("A"), "A"),
        );
        let b = Diff::added(
            ComponentKind::Class,
            Some(Identity::file("A.java")),
            ComponentRef::new(Identity::file("A.java").child("A"), "renamed display"),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn repository_derives_history_bounds() {
        let commits = vec![
            Commit::new("c1", "one", "a", 100, Vec::new()),
            Commit::new("c2", "two", "a", 200, Vec::new()),
        ];
        let repo = Repository::new(commits).unwrap();
        assert_eq!(repo.begin_ts, 100);
        assert_eq!(repo.last_ts, 200);
        assert!(Repository::new(Vec::new()).is_err());
    }
}
