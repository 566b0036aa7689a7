use anyhow::Result;
use clap::Parser;

use faultline::cli::{Cli, Commands};
use faultline::commands::analyze::{self, AnalyzeOptions};
use faultline::commands::learn::{self, LearnOptions};

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            path,
            format,
            output,
            commits,
            granularity,
            ignore,
            top,
            serial,
        } => analyze::run(AnalyzeOptions {
            path,
            format: format.into(),
            output,
            commits,
            granularity: granularity.into(),
            ignore,
            top,
            serial,
        }),
        Commands::Learn {
            path,
            commits,
            granularity,
            bits,
            generations,
            ignore,
            serial,
        } => learn::run(LearnOptions {
            path,
            commits,
            granularity: granularity.into(),
            bits,
            generations,
            ignore,
            serial,
        }),
    }
}
