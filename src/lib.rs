// Export modules for library usage
pub mod analytics;
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod diff;
pub mod extraction;
pub mod io;
pub mod learning;
pub mod parsing;

// Re-export commonly used types
pub use crate::analytics::{
    AnalyticsNode, AnalyticsReport, FoldContext, FoldOutcome, NodeReport, RepositoryAnalytics,
};
pub use crate::core::component::Component;
pub use crate::core::errors::{Error, Result};
pub use crate::core::repository::{
    Commit, ComponentRef, Diff, DiffKind, FixPattern, Repository,
};
pub use crate::core::types::{ComponentKind, FeatureWeights, Granularity, Identity};
pub use crate::diff::{edit_script, structural_diff, ChangedRange, EditTag};
pub use crate::extraction::{ExtractionOptions, Extractor, GitExtractor};
pub use crate::learning::{FeatureWeightLearner, LearnedWeights};
pub use crate::parsing::{can_parse, parser_for, JavaParser, SourceParser};
