use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::core::types::Granularity;
use crate::io::OutputFormat;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormatArg {
    Terminal,
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(format: OutputFormatArg) -> Self {
        match format {
            OutputFormatArg::Terminal => OutputFormat::Terminal,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum GranularityArg {
    File,
    Class,
    Method,
    Line,
}

impl From<GranularityArg> for Granularity {
    fn from(granularity: GranularityArg) -> Self {
        match granularity {
            GranularityArg::File => Granularity::File,
            GranularityArg::Class => Granularity::Class,
            GranularityArg::Method => Granularity::Method,
            GranularityArg::Line => Granularity::Line,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "faultline")]
#[command(about = "Defect probability predictions mined from git history", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a repository's history and report defect probabilities
    Analyze {
        /// Path to the repository on the local file system
        path: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormatArg,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Maximum number of commits, since the most recent, to analyze
        #[arg(long)]
        commits: Option<usize>,

        /// Extraction granularity
        #[arg(short, long, value_enum, default_value = "method")]
        granularity: GranularityArg,

        /// Regex of paths to ignore
        #[arg(long)]
        ignore: Option<String>,

        /// Number of top-risk components to print (terminal format)
        #[arg(long, default_value = "10")]
        top: usize,

        /// Extract commits on a single thread
        #[arg(long)]
        serial: bool,
    },

    /// Calibrate feature weights against the repository's own history
    Learn {
        /// Path to the repository on the local file system
        path: PathBuf,

        /// Maximum number of commits, since the most recent, to analyze
        #[arg(long)]
        commits: Option<usize>,

        /// Extraction granularity
        #[arg(short, long, value_enum, default_value = "file")]
        granularity: GranularityArg,

        /// Fixed-point bits of precision per feature weight
        #[arg(long)]
        bits: Option<u32>,

        /// Number of generations to evolve
        #[arg(long)]
        generations: Option<u32>,

        /// Regex of paths to ignore
        #[arg(long)]
        ignore: Option<String>,

        /// Extract commits on a single thread
        #[arg(long)]
        serial: bool,
    },
}
