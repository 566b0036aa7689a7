//! Git history extraction built on libgit2.
//!
//! Extracting one commit's diffs is a pure function of that commit's
//! snapshots, so commits are processed by a rayon worker pool with no shared
//! mutable state and re-sorted chronologically afterwards. `git2::Repository`
//! is not `Sync`, so each operation opens a fresh handle.

use std::path::{Path, PathBuf};

use git2::{Delta, DiffFindOptions, DiffOptions, ObjectType, Oid, Repository as GitRepository, Sort, TreeWalkMode, TreeWalkResult};
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressIterator};
use rayon::prelude::*;

use crate::core::errors::{Error, Result};
use crate::core::repository::{Commit, ComponentRef, Diff, Repository};
use crate::core::types::{ComponentKind, Granularity, Identity};
use crate::diff::structural_diff;
use crate::extraction::{Extractor, ExtractionOptions};
use crate::parsing::{can_parse, parser_for};

pub struct GitExtractor {
    repo_path: PathBuf,
}

impl GitExtractor {
    /// Open a repository, discovering the root from any subdirectory
    pub fn open(path: &Path) -> Result<Self> {
        let repo = GitRepository::discover(path).map_err(|e| {
            Error::extraction(format!("cannot open repository at {}: {e}", path.display()))
        })?;
        Ok(Self {
            repo_path: repo.path().to_path_buf(),
        })
    }

    fn open_repo(&self) -> Result<GitRepository> {
        GitRepository::open(&self.repo_path).map_err(|e| {
            Error::extraction(format!(
                "cannot reopen repository at {}: {e}",
                self.repo_path.display()
            ))
        })
    }

    /// Commit ids, newest first, truncated to `max_commits`
    fn commit_ids(&self, max_commits: Option<usize>) -> Result<Vec<String>> {
        let repo = self.open_repo()?;
        let mut revwalk = repo.revwalk()?;
        revwalk.push_head()?;
        revwalk.set_sorting(Sort::TIME)?;
        let mut ids = Vec::new();
        for oid in revwalk {
            ids.push(oid?.to_string());
            if max_commits.is_some_and(|max| ids.len() >= max) {
                break;
            }
        }
        Ok(ids)
    }

    /// Extract one commit, independently of every other commit.
    ///
    /// Returns `None` when no tracked file changed.
    fn extract_commit(&self, id: &str, options: &ExtractionOptions) -> Result<Option<Commit>> {
        let repo = self.open_repo()?;
        let oid = Oid::from_str(id)?;
        let commit = repo.find_commit(oid)?;
        let message = String::from_utf8_lossy(commit.message_bytes()).into_owned();
        let author = match commit.author().email() {
            Some(email) => email.to_string(),
            None => String::from_utf8_lossy(commit.author().email_bytes()).into_owned(),
        };
        let timestamp = commit.time().seconds();

        let mut diffs = Vec::new();
        if commit.parent_count() == 0 {
            diffs.extend(self.initial_commit_diffs(&repo, &commit, options)?);
        } else {
            let tree = commit.tree()?;
            for parent_index in 0..commit.parent_count() {
                let parent_tree = commit.parent(parent_index)?.tree()?;
                diffs.extend(self.parent_diffs(&repo, &parent_tree, &tree, options)?);
            }
        }

        if diffs.is_empty() {
            return Ok(None);
        }
        Ok(Some(Commit::new(id, message, author, timestamp, diffs)))
    }

    /// The first commit adds every retained blob in its tree
    fn initial_commit_diffs(
        &self,
        repo: &GitRepository,
        commit: &git2::Commit<'_>,
        options: &ExtractionOptions,
    ) -> Result<Vec<Diff>> {
        let tree = commit.tree()?;
        let mut blobs: Vec<(String, Oid)> = Vec::new();
        tree.walk(TreeWalkMode::PreOrder, |root, entry| {
            if entry.kind() == Some(ObjectType::Blob) {
                if let Some(name) = entry.name() {
                    blobs.push((format!("{root}{name}"), entry.id()));
                }
            }
            TreeWalkResult::Ok
        })?;

        let mut diffs = Vec::new();
        for (path, blob_id) in blobs {
            if options.retains(&path) {
                diffs.extend(self.added_file_diffs(repo, &path, blob_id, options));
            }
        }
        Ok(diffs)
    }

    /// Diffs of one commit against one of its parents
    fn parent_diffs(
        &self,
        repo: &GitRepository,
        tree_a: &git2::Tree<'_>,
        tree_b: &git2::Tree<'_>,
        options: &ExtractionOptions,
    ) -> Result<Vec<Diff>> {
        let mut diff_options = DiffOptions::new();
        let mut diff =
            repo.diff_tree_to_tree(Some(tree_a), Some(tree_b), Some(&mut diff_options))?;
        // File-level renames come from libgit2's similarity heuristic; the
        // structural engine never infers them
        let mut find_options = DiffFindOptions::new();
        find_options.renames(true);
        diff.find_similar(Some(&mut find_options))?;

        let mut diffs = Vec::new();
        for delta in diff.deltas() {
            let old_path = delta.old_file().path().and_then(Path::to_str);
            let new_path = delta.new_file().path().and_then(Path::to_str);
            match delta.status() {
                Delta::Added => {
                    if let Some(path) = new_path.filter(|p| options.retains(p)) {
                        diffs.extend(self.added_file_diffs(
                            repo,
                            path,
                            delta.new_file().id(),
                            options,
                        ));
                    }
                }
                Delta::Deleted => {
                    if let Some(path) = old_path.filter(|p| options.retains(p)) {
                        diffs.push(Diff::removed(
                            ComponentKind::File,
                            None,
                            ComponentRef::new(Identity::file(path), path),
                        ));
                    }
                }
                Delta::Modified | Delta::Renamed => {
                    let (Some(path_a), Some(path_b)) = (old_path, new_path) else {
                        continue;
                    };
                    if !options.retains(path_a) && !options.retains(path_b) {
                        continue;
                    }
                    diffs.extend(self.changed_file_diffs(
                        repo,
                        delta.status() == Delta::Renamed,
                        (path_a, delta.old_file().id()),
                        (path_b, delta.new_file().id()),
                        options,
                    ));
                }
                _ => {}
            }
        }
        Ok(diffs)
    }

    /// File-level Added plus one Added per parsed component
    fn added_file_diffs(
        &self,
        repo: &GitRepository,
        path: &str,
        blob_id: Oid,
        options: &ExtractionOptions,
    ) -> Vec<Diff> {
        let file = ComponentRef::new(Identity::file(path), path);
        let mut diffs = vec![Diff::added(ComponentKind::File, None, file)];
        if options.granularity == Granularity::File || !can_parse(path) {
            return diffs;
        }
        let Some(source) = self.blob_text(repo, blob_id) else {
            return diffs;
        };
        let Some(mut parser) = parser_for(path) else {
            return diffs;
        };
        match parser.parse(path, &source, options.granularity) {
            Ok(tree) => {
                for component in tree.descendants() {
                    diffs.push(Diff::added(
                        component.kind,
                        component.parent.clone(),
                        ComponentRef::from(component),
                    ));
                }
            }
            Err(e) => log::debug!("skipping components of new file {path}: {e}"),
        }
        diffs
    }

    /// File-level Modified or Renamed plus the structural diffs underneath
    fn changed_file_diffs(
        &self,
        repo: &GitRepository,
        renamed: bool,
        (path_a, blob_a): (&str, Oid),
        (path_b, blob_b): (&str, Oid),
        options: &ExtractionOptions,
    ) -> Vec<Diff> {
        let version_a = ComponentRef::new(Identity::file(path_a), path_a);
        let version_b = ComponentRef::new(Identity::file(path_b), path_b);
        let file_diff = if renamed {
            Diff::renamed(ComponentKind::File, None, version_a, version_b)
        } else {
            Diff::modified(ComponentKind::File, None, version_a, version_b)
        };
        let mut diffs = vec![file_diff];

        if options.granularity > Granularity::File && can_parse(path_a) && can_parse(path_b) {
            if let (Some(source_a), Some(source_b)) =
                (self.blob_text(repo, blob_a), self.blob_text(repo, blob_b))
            {
                diffs.extend(structural_diff(
                    options.granularity,
                    (path_a, &source_a),
                    (path_b, &source_b),
                ));
            }
        }
        diffs
    }

    fn blob_text(&self, repo: &GitRepository, id: Oid) -> Option<String> {
        let blob = repo.find_blob(id).ok()?;
        if blob.is_binary() {
            return None;
        }
        Some(String::from_utf8_lossy(blob.content()).into_owned())
    }
}

impl Extractor for GitExtractor {
    fn extract(&self, options: &ExtractionOptions) -> Result<Repository> {
        let ids = self.commit_ids(options.max_commits)?;
        if ids.is_empty() {
            return Err(Error::extraction("repository has no commits"));
        }
        log::info!("extracting {} commits", ids.len());
        let progress = ProgressBar::new(ids.len() as u64);

        let extract = |id: &String| match self.extract_commit(id, options) {
            Ok(commit) => commit,
            Err(e) => {
                log::warn!("skipping commit {id}: {e}");
                None
            }
        };
        let extracted: Vec<Option<Commit>> = if options.parallel {
            ids.par_iter().progress_with(progress).map(extract).collect()
        } else {
            ids.iter().progress_with(progress).map(extract).collect()
        };

        let mut commits: Vec<Commit> = extracted.into_iter().flatten().collect();
        // Results come back newest first; folding requires oldest first
        commits.reverse();
        commits.sort_by_key(|c| c.timestamp);
        if commits.is_empty() {
            return Err(Error::extraction(
                "no commits relevant to the analysis were found",
            ));
        }
        Repository::new(commits)
    }
}
