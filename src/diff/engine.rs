//! Structural diff engine: typed component diffs between two snapshots.
//!
//! Combines the line-level edit script with range-hit queries against the
//! two parsed trees, then runs identity set algebra per granularity level.
//! File-level diffs are the extractor's job (they are computed by path
//! alone), so this engine only emits Class, Method, and Line diffs.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::core::component::Component;
use crate::core::repository::{ComponentRef, Diff};
use crate::core::types::{ComponentKind, Granularity, Identity};
use crate::diff::edit_script::{edit_script, EditTag};
use crate::parsing::parser_for;

/// Diff two snapshots of one file at the requested granularity.
///
/// If either snapshot fails to parse the result is empty rather than an
/// error, so that file-level diffs remain usable. Both snapshots are keyed
/// under the surviving path (`path_b`) so identities line up across a
/// file rename.
pub fn structural_diff(
    granularity: Granularity,
    file_a: (&str, &str),
    file_b: (&str, &str),
) -> Vec<Diff> {
    if granularity == Granularity::File {
        return Vec::new();
    }
    let (path_a, source_a) = file_a;
    let (path_b, source_b) = file_b;

    let tree_a = match parse_snapshot(path_b, source_a, granularity) {
        Some(tree) => tree,
        None => {
            log::debug!("skipping structural diff: cannot parse {path_a}");
            return Vec::new();
        }
    };
    let tree_b = match parse_snapshot(path_b, source_b, granularity) {
        Some(tree) => tree,
        None => {
            log::debug!("skipping structural diff: cannot parse {path_b}");
            return Vec::new();
        }
    };

    // Components of each version hit by the changed line ranges
    let mut changed_a: HashSet<Identity> = HashSet::new();
    let mut changed_b: HashSet<Identity> = HashSet::new();
    for range in edit_script(source_a, source_b) {
        match range.tag {
            EditTag::Removed => {
                changed_a.extend(tree_a.components_hit(range.start_line, range.end_line));
            }
            EditTag::Added => {
                changed_b.extend(tree_b.components_hit(range.start_line, range.end_line));
            }
        }
    }

    let mut diffs = Vec::new();
    for level in [ComponentKind::Class, ComponentKind::Method, ComponentKind::Line] {
        if !granularity.includes(level) {
            continue;
        }
        diffs.extend(level_diffs(
            level, &tree_a, &tree_b, &changed_a, &changed_b,
        ));
    }
    diffs
}

fn parse_snapshot(path: &str, source: &str, granularity: Granularity) -> Option<Component> {
    parser_for(path)?.parse(path, source, granularity).ok()
}

/// Identity set algebra for one granularity level:
/// `added = Sb - Sa`, `removed = Sa - Sb`,
/// `modified = (changed_a ∪ changed_b) - added - removed`
fn level_diffs(
    level: ComponentKind,
    tree_a: &Component,
    tree_b: &Component,
    changed_a: &HashSet<Identity>,
    changed_b: &HashSet<Identity>,
) -> Vec<Diff> {
    let set_a: BTreeMap<Identity, &Component> = tree_a
        .components_of(level)
        .into_iter()
        .map(|c| (c.identity.clone(), c))
        .collect();
    let set_b: BTreeMap<Identity, &Component> = tree_b
        .components_of(level)
        .into_iter()
        .map(|c| (c.identity.clone(), c))
        .collect();

    let mut diffs = Vec::new();
    for (id, component) in &set_b {
        if !set_a.contains_key(id) {
            diffs.push(Diff::added(
                level,
                component.parent.clone(),
                ComponentRef::from(*component),
            ));
        }
    }
    for (id, component) in &set_a {
        if !set_b.contains_key(id) {
            diffs.push(Diff::removed(
                level,
                component.parent.clone(),
                ComponentRef::from(*component),
            ));
        }
    }
    let changed: BTreeSet<&Identity> = changed_a.iter().chain(changed_b.iter()).collect();
    for id in changed {
        // Components present in only one tree were already reported above
        let (Some(component_a), Some(component_b)) =
            (set_a.get(id).copied(), set_b.get(id).copied())
        else {
            continue;
        };
        // Survivors exist in both trees; parent comes from the new version
        diffs.push(Diff::modified(
            level,
            component_b.parent.clone(),
            ComponentRef::from(component_a),
            ComponentRef::from(component_b),
        ));
    }
    diffs
}
