//! The `analyze` command: extract, fold, report

use std::path::PathBuf;

use anyhow::Result;
use regex::Regex;

use crate::analytics::{FoldContext, RepositoryAnalytics};
use crate::config::FaultlineConfig;
use crate::core::errors::Error;
use crate::core::types::Granularity;
use crate::extraction::{ExtractionOptions, Extractor, GitExtractor};
use crate::io::{create_writer, OutputFormat};

pub struct AnalyzeOptions {
    pub path: PathBuf,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub commits: Option<usize>,
    pub granularity: Granularity,
    pub ignore: Option<String>,
    pub top: usize,
    pub serial: bool,
}

pub fn run(options: AnalyzeOptions) -> Result<()> {
    let config = FaultlineConfig::load(&options.path)?;
    let weights = config.feature_weights()?;
    let fix_pattern = config.fix_pattern()?;
    let time_range = config.time_range()?;
    let ignore = compile_ignore(options.ignore.as_deref().or(config.ignore.as_deref()))?;

    let extraction = ExtractionOptions {
        granularity: options.granularity,
        max_commits: options.commits.or(config.commits),
        ignore,
        parallel: !options.serial,
    };
    let extractor = GitExtractor::open(&options.path)?;
    let repository = extractor.extract(&extraction)?;

    log::info!("folding {} commits", repository.commits.len());
    let ctx = FoldContext::for_repository(&repository)
        .with_fix_pattern(fix_pattern)
        .with_time_range(time_range);
    let mut analytics = RepositoryAnalytics::analyze(&repository, &ctx);
    analytics.compute_defect_probabilities(&weights);

    let report = analytics.snapshot(&weights, repository.commits.len());
    let mut writer = create_writer(options.format, options.output.as_deref(), options.top)?;
    writer.write_report(&report)?;
    Ok(())
}

pub(crate) fn compile_ignore(pattern: Option<&str>) -> Result<Option<Regex>, Error> {
    match pattern {
        Some(pattern) => Regex::new(pattern)
            .map(Some)
            .map_err(|e| Error::configuration(format!("invalid ignore pattern {pattern:?}: {e}"))),
        None => Ok(None),
    }
}
