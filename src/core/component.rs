//! Structural components extracted from one parsed snapshot.
//!
//! A parse yields a single `File` root owning `Class`, `Method`, and `Line`
//! descendants. Line ranges are 1-based and inclusive, and every child's
//! range lies within its parent's.

use std::collections::HashSet;

use crate::core::types::{ComponentKind, Identity};

/// One node of a parsed component tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub kind: ComponentKind,
    pub name: String,
    pub identity: Identity,
    /// Non-owning back-reference to the enclosing component
    pub parent: Option<Identity>,
    pub start_line: usize,
    pub end_line: usize,
    pub children: Vec<Component>,
}

impl Component {
    /// The root of a parse: a file spanning the whole snapshot
    pub fn file(path: &str, end_line: usize) -> Self {
        Self {
            kind: ComponentKind::File,
            name: path.to_string(),
            identity: Identity::file(path),
            parent: None,
            start_line: 1,
            end_line,
            children: Vec::new(),
        }
    }

    /// A child component under the given parent identity
    pub fn child_of(
        parent: &Identity,
        kind: ComponentKind,
        name: String,
        start_line: usize,
        end_line: usize,
    ) -> Self {
        let identity = parent.child(&name);
        Self {
            kind,
            name,
            identity,
            parent: Some(parent.clone()),
            start_line,
            end_line,
            children: Vec::new(),
        }
    }

    /// Whether either endpoint of the given range falls inside this
    /// component's range (inclusive)
    pub fn range_hit(&self, start_line: usize, end_line: usize) -> bool {
        (self.start_line <= start_line && start_line <= self.end_line)
            || (self.start_line <= end_line && end_line <= self.end_line)
    }

    /// Identities of every sub-file component whose range overlaps the given
    /// line range
    pub fn components_hit(&self, start_line: usize, end_line: usize) -> HashSet<Identity> {
        let mut hits = HashSet::new();
        self.collect_hits(start_line, end_line, &mut hits);
        hits
    }

    fn collect_hits(&self, start_line: usize, end_line: usize, out: &mut HashSet<Identity>) {
        if self.kind != ComponentKind::File && self.range_hit(start_line, end_line) {
            out.insert(self.identity.clone());
        }
        for child in &self.children {
            child.collect_hits(start_line, end_line, out);
        }
    }

    /// All components of the given kind, in source order
    pub fn components_of(&self, kind: ComponentKind) -> Vec<&Component> {
        let mut out = Vec::new();
        self.collect_kind(kind, &mut out);
        out
    }

    fn collect_kind<'a>(&'a self, kind: ComponentKind, out: &mut Vec<&'a Component>) {
        if self.kind == kind {
            out.push(self);
        }
        for child in &self.children {
            child.collect_kind(kind, out);
        }
    }

    /// Every component below the file root, in source order
    pub fn descendants(&self) -> Vec<&Component> {
        let mut out = Vec::new();
        for child in &self.children {
            child.collect_descendants(&mut out);
        }
        out
    }

    fn collect_descendants<'a>(&'a self, out: &mut Vec<&'a Component>) {
        out.push(self);
        for child in &self.children {
            child.collect_descendants(out);
        }
    }
}
