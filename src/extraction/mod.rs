//! Version-control extraction: turning repository history into a commit
//! stream with pre-extracted structural diffs

mod git;

pub use git::GitExtractor;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::errors::Result;
use crate::core::repository::Repository;
use crate::core::types::Granularity;

static CODE_FILE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\.(java|php|py|cpp|c|js|html|css|rb|h|scala|sbt|sh|sql|cs)$").unwrap()
});

/// Whether the path names a source file worth tracking at file granularity
pub fn is_code_file(path: &str) -> bool {
    CODE_FILE_RE.is_match(path)
}

/// Extraction tuning supplied by the caller
#[derive(Debug, Clone)]
pub struct ExtractionOptions {
    pub granularity: Granularity,
    /// Maximum number of commits, counted back from the most recent
    pub max_commits: Option<usize>,
    /// Paths matching this pattern are ignored entirely
    pub ignore: Option<Regex>,
    pub parallel: bool,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            granularity: Granularity::File,
            max_commits: None,
            ignore: None,
            parallel: true,
        }
    }
}

impl ExtractionOptions {
    /// Whether the path survives the code-file and ignore filters
    pub fn retains(&self, path: &str) -> bool {
        is_code_file(path)
            && !self
                .ignore
                .as_ref()
                .map(|re| re.is_match(path))
                .unwrap_or(false)
    }
}

/// A repository history source. Implementations own all blocking I/O; the
/// analytics core never reads a repository itself.
pub trait Extractor {
    fn extract(&self, options: &ExtractionOptions) -> Result<Repository>;
}
