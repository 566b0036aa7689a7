//! Persistent multi-granularity analytics folded from the commit stream.
//!
//! The tree parallels the component trees in shape but spans the whole
//! history: one `AnalyticsNode` per surviving component identity, mutated by
//! folding one commit's diffs at a time in strict granularity order. Nodes
//! survive renames with their metrics carried over and are pruned, subtree
//! and all, on removal.

pub mod risk;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use im::Vector;
use serde::Serialize;

use crate::core::repository::{Commit, ComponentRef, Diff, DiffKind, FixPattern, Repository};
use crate::core::types::{ComponentKind, FeatureWeights, Identity};
use risk::{decayed_weight_with_range, Metrics, DEFAULT_TIME_RANGE};

/// Everything the fold needs beyond the commit itself
#[derive(Debug, Clone)]
pub struct FoldContext {
    pub begin_ts: i64,
    pub last_ts: i64,
    pub time_range: f64,
    pub fix_pattern: FixPattern,
}

impl FoldContext {
    pub fn for_repository(repository: &Repository) -> Self {
        Self {
            begin_ts: repository.begin_ts,
            last_ts: repository.last_ts,
            time_range: DEFAULT_TIME_RANGE,
            fix_pattern: FixPattern::default(),
        }
    }

    pub fn with_fix_pattern(mut self, fix_pattern: FixPattern) -> Self {
        self.fix_pattern = fix_pattern;
        self
    }

    pub fn with_time_range(mut self, time_range: f64) -> Self {
        self.time_range = time_range;
        self
    }
}

/// Identities affected by folding one commit; consumed by the calibrator
#[derive(Debug, Default)]
pub struct FoldOutcome {
    /// Surviving components whose metrics were updated
    pub touched: Vec<Identity>,
    /// Identities that ceased to exist: removed subtrees and the prior
    /// identities of renamed subtrees
    pub retired: Vec<Identity>,
}

/// The persistent, cross-history counterpart of a component
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsNode {
    pub identity: Identity,
    pub name: String,
    pub kind: ComponentKind,
    pub metrics: Metrics,
    pub children: BTreeMap<Identity, AnalyticsNode>,
}

impl AnalyticsNode {
    fn new(identity: Identity, name: String, kind: ComponentKind) -> Self {
        Self {
            identity,
            name,
            kind,
            metrics: Metrics::default(),
            children: BTreeMap::new(),
        }
    }

    pub fn find(&self, identity: &Identity) -> Option<&AnalyticsNode> {
        if &self.identity == identity {
            return Some(self);
        }
        self.children
            .values()
            .find(|child| child.identity.is_prefix_of(identity))
            .and_then(|child| child.find(identity))
    }

    fn find_mut(&mut self, identity: &Identity) -> Option<&mut AnalyticsNode> {
        if &self.identity == identity {
            return Some(self);
        }
        self.children
            .values_mut()
            .find(|child| child.identity.is_prefix_of(identity))
            .and_then(|child| child.find_mut(identity))
    }

    /// Rewrite identities throughout the subtree after an ancestor rename
    fn reprefix(&mut self, old: &Identity, new: &Identity) {
        if let Some(identity) = self.identity.reprefixed(old, new) {
            self.identity = identity;
        }
        let children = std::mem::take(&mut self.children);
        self.children = children
            .into_iter()
            .map(|(_, mut child)| {
                child.reprefix(old, new);
                (child.identity.clone(), child)
            })
            .collect();
    }

    fn collect_identities(&self, out: &mut Vec<Identity>) {
        out.push(self.identity.clone());
        for child in self.children.values() {
            child.collect_identities(out);
        }
    }

    fn compute_defect_probabilities(&mut self, weights: &FeatureWeights) {
        self.metrics.defect_prob = self.metrics.defect_probability(weights);
        for child in self.children.values_mut() {
            child.compute_defect_probabilities(weights);
        }
    }

    fn report(&self, weights: &FeatureWeights) -> NodeReport {
        NodeReport {
            name: self.name.clone(),
            id: self.identity.to_string(),
            path: (self.kind == ComponentKind::File).then(|| self.identity.to_string()),
            kind: Some(self.kind.as_str()),
            prob: self.metrics.defect_probability(weights),
            revisions: self.metrics.revisions,
            fixes: self.metrics.fixes,
            authors: self.metrics.authors.len(),
            children: self.children.values().map(|c| c.report(weights)).collect(),
        }
    }
}

/// Analytics for the whole repository: repository-level metrics plus the
/// per-file analytics forest
#[derive(Debug, Clone, Default, Serialize)]
pub struct RepositoryAnalytics {
    pub metrics: Metrics,
    pub files: BTreeMap<Identity, AnalyticsNode>,
}

impl RepositoryAnalytics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn find(&self, identity: &Identity) -> Option<&AnalyticsNode> {
        self.files
            .values()
            .find(|file| file.identity.is_prefix_of(identity))
            .and_then(|file| file.find(identity))
    }

    fn find_mut(&mut self, identity: &Identity) -> Option<&mut AnalyticsNode> {
        self.files
            .values_mut()
            .find(|file| file.identity.is_prefix_of(identity))
            .and_then(|file| file.find_mut(identity))
    }

    /// Fold the whole commit stream, oldest first
    pub fn analyze(repository: &Repository, ctx: &FoldContext) -> Self {
        let mut analytics = Self::new();
        for commit in &repository.commits {
            analytics.apply(ctx, commit);
        }
        analytics
    }

    /// Fold one commit's diffs, in granularity order, into the tree
    pub fn apply(&mut self, ctx: &FoldContext, commit: &Commit) -> FoldOutcome {
        let mut outcome = FoldOutcome::default();
        let weight =
            decayed_weight_with_range(ctx.begin_ts, commit.timestamp, ctx.last_ts, ctx.time_range);
        let is_fix = commit.is_bug_fixing(&ctx.fix_pattern);

        // Repository granularity is touched by every commit
        self.metrics.update(weight, &commit.author, is_fix);

        for diff in &commit.diffs {
            self.apply_diff(diff, weight, &commit.author, is_fix, &mut outcome);
        }
        outcome
    }

    fn apply_diff(
        &mut self,
        diff: &Diff,
        weight: f64,
        author: &str,
        is_fix: bool,
        outcome: &mut FoldOutcome,
    ) {
        let siblings = if diff.level == ComponentKind::File {
            &mut self.files
        } else {
            let Some(parent_id) = diff.parent.as_ref() else {
                return;
            };
            match self.find_mut(parent_id) {
                Some(parent) => &mut parent.children,
                // Parent removed earlier in this same commit's granularity
                // order: no parent, no effect
                None => return,
            }
        };
        Self::fold_into(siblings, diff, weight, author, is_fix, outcome);
    }

    fn fold_into(
        siblings: &mut BTreeMap<Identity, AnalyticsNode>,
        diff: &Diff,
        weight: f64,
        author: &str,
        is_fix: bool,
        outcome: &mut FoldOutcome,
    ) {
        match diff.kind {
            // A Modified with no prior record is recorded like an Added, and
            // a duplicate Added reuses the existing node
            DiffKind::Added | DiffKind::Modified => {
                let Some(b) = diff.version_b.as_ref() else {
                    return;
                };
                let node = siblings.entry(b.identity.clone()).or_insert_with(|| {
                    AnalyticsNode::new(b.identity.clone(), display_name(diff.level, b), diff.level)
                });
                node.metrics.update(weight, author, is_fix);
                outcome.touched.push(b.identity.clone());
            }
            DiffKind::Renamed => {
                let (Some(a), Some(b)) = (diff.version_a.as_ref(), diff.version_b.as_ref()) else {
                    return;
                };
                let mut node = match siblings.remove(&a.identity) {
                    Some(mut node) => {
                        node.collect_identities(&mut outcome.retired);
                        node.reprefix(&a.identity, &b.identity);
                        node.name = display_name(diff.level, b);
                        node
                    }
                    // Prior identity unknown: start fresh under the new one
                    None => AnalyticsNode::new(
                        b.identity.clone(),
                        display_name(diff.level, b),
                        diff.level,
                    ),
                };
                node.metrics.update(weight, author, is_fix);
                outcome.touched.push(node.identity.clone());
                siblings.insert(node.identity.clone(), node);
            }
            // Deletion prunes the whole subtree and updates no metric
            DiffKind::Removed => {
                let Some(a) = diff.version_a.as_ref() else {
                    return;
                };
                if let Some(node) = siblings.remove(&a.identity) {
                    node.collect_identities(&mut outcome.retired);
                }
            }
        }
    }

    pub fn compute_defect_probabilities(&mut self, weights: &FeatureWeights) {
        self.metrics.defect_prob = self.metrics.defect_probability(weights);
        for file in self.files.values_mut() {
            file.compute_defect_probabilities(weights);
        }
    }

    /// Immutable view for reporting
    pub fn snapshot(&self, weights: &FeatureWeights, commits: usize) -> AnalyticsReport {
        AnalyticsReport {
            generated_at: Utc::now(),
            weights: *weights,
            commits,
            root: NodeReport {
                name: "root".to_string(),
                id: "root".to_string(),
                path: None,
                kind: None,
                prob: self.metrics.defect_probability(weights),
                revisions: self.metrics.revisions,
                fixes: self.metrics.fixes,
                authors: self.metrics.authors.len(),
                children: self.files.values().map(|f| f.report(weights)).collect(),
            },
        }
    }
}

fn display_name(level: ComponentKind, component: &ComponentRef) -> String {
    if level == ComponentKind::File {
        strip_path(&component.name).to_string()
    } else {
        component.name.clone()
    }
}

/// Only the file name of a path
pub fn strip_path(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Read-only snapshot of the analytics tree
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsReport {
    pub generated_at: DateTime<Utc>,
    pub weights: FeatureWeights,
    pub commits: usize,
    pub root: NodeReport,
}

/// One node of the report tree, children ordered by identity
#[derive(Debug, Clone, Serialize)]
pub struct NodeReport {
    pub name: String,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    pub prob: f64,
    pub revisions: u64,
    pub fixes: u64,
    pub authors: usize,
    pub children: Vector<NodeReport>,
}
