//! The `learn` command: extract, calibrate, report the learned weights

use std::path::PathBuf;

use anyhow::Result;
use colored::*;

use crate::analytics::FoldContext;
use crate::commands::analyze::compile_ignore;
use crate::config::FaultlineConfig;
use crate::core::errors::Error;
use crate::core::types::Granularity;
use crate::extraction::{ExtractionOptions, Extractor, GitExtractor};
use crate::learning::FeatureWeightLearner;

const MAX_BITS: u32 = 10;

pub struct LearnOptions {
    pub path: PathBuf,
    pub commits: Option<usize>,
    pub granularity: Granularity,
    pub bits: Option<u32>,
    pub generations: Option<u32>,
    pub ignore: Option<String>,
    pub serial: bool,
}

pub fn run(options: LearnOptions) -> Result<()> {
    let config = FaultlineConfig::load(&options.path)?;
    let fix_pattern = config.fix_pattern()?;
    let time_range = config.time_range()?;
    let ignore = compile_ignore(options.ignore.as_deref().or(config.ignore.as_deref()))?;

    let learning = config.learning();
    let bits = validate_bits(options.bits.or(learning.bits))?;
    let generations = options.generations.or(learning.generations);

    let extraction = ExtractionOptions {
        granularity: options.granularity,
        max_commits: options.commits.or(config.commits),
        ignore,
        parallel: !options.serial,
    };
    let extractor = GitExtractor::open(&options.path)?;
    let repository = extractor.extract(&extraction)?;

    let ctx = FoldContext::for_repository(&repository)
        .with_fix_pattern(fix_pattern)
        .with_time_range(time_range);
    let learner = FeatureWeightLearner::new(&repository, ctx)
        .with_bits(bits)
        .with_generations(generations);
    if learner.is_degenerate() {
        let advisory = Error::DegenerateHistory(
            "no bug-fixing commits in the analyzed range; learned weights are arbitrary".into(),
        );
        eprintln!("{}", format!("warning: {advisory}").yellow());
    }

    let learned = learner.learn();
    println!("{}", "Learned feature weights".bold());
    println!("  revisions:   {:.6}", learned.weights.revisions);
    println!("  fixes:       {:.6}", learned.weights.fixes);
    println!("  authors:     {:.6}", learned.weights.authors);
    println!("  fitness:     {:.6}", learned.fitness);
    println!("  bits:        {}", learned.bits);
    println!("  generations: {}", learned.generations);
    Ok(())
}

fn validate_bits(bits: Option<u32>) -> Result<Option<u32>, Error> {
    match bits {
        Some(bits) if (1..=MAX_BITS).contains(&bits) => Ok(Some(bits)),
        Some(bits) => Err(Error::configuration(format!(
            "bits precision must be within 1..={MAX_BITS}, got {bits}"
        ))),
        None => Ok(None),
    }
}
