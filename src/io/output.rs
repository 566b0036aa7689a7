//! Report writers for the analytics snapshot

use std::fs::File;
use std::io::Write;
use std::path::Path;

use colored::*;

use crate::analytics::{AnalyticsReport, NodeReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Terminal,
}

pub trait ReportWriter {
    fn write_report(&mut self, report: &AnalyticsReport) -> anyhow::Result<()>;
}

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> ReportWriter for JsonWriter<W> {
    fn write_report(&mut self, report: &AnalyticsReport) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        self.writer.write_all(json.as_bytes())?;
        writeln!(self.writer)?;
        Ok(())
    }
}

pub struct TerminalWriter<W: Write> {
    writer: W,
    top: usize,
}

impl<W: Write> TerminalWriter<W> {
    pub fn new(writer: W, top: usize) -> Self {
        Self { writer, top }
    }

    fn colored_probability(prob: f64) -> ColoredString {
        let rendered = format!("{prob:>6.3}");
        if prob >= 0.7 {
            rendered.red()
        } else if prob >= 0.4 {
            rendered.yellow()
        } else {
            rendered.green()
        }
    }
}

impl<W: Write> ReportWriter for TerminalWriter<W> {
    fn write_report(&mut self, report: &AnalyticsReport) -> anyhow::Result<()> {
        writeln!(self.writer, "{}", "Faultline Analysis".bold())?;
        writeln!(
            self.writer,
            "Generated: {}",
            report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(
            self.writer,
            "Commits: {}  Weights: revisions {:.3} / fixes {:.3} / authors {:.3}",
            report.commits,
            report.weights.revisions,
            report.weights.fixes,
            report.weights.authors
        )?;
        writeln!(self.writer)?;

        if report.root.children.is_empty() {
            writeln!(
                self.writer,
                "Couldn't find enough data to produce results."
            )?;
            return Ok(());
        }

        let mut components = Vec::new();
        for child in &report.root.children {
            flatten(child, &mut components);
        }
        components.sort_by(|a, b| b.prob.total_cmp(&a.prob));

        writeln!(
            self.writer,
            "{}",
            format!(
                "{:>6}  {:<6}  {:>9}  {:>5}  {:>7}  component",
                "prob", "kind", "revisions", "fixes", "authors"
            )
            .bold()
        )?;
        for node in components.iter().take(self.top) {
            writeln!(
                self.writer,
                "{}  {:<6}  {:>9}  {:>5}  {:>7}  {}",
                Self::colored_probability(node.prob),
                node.kind.unwrap_or(""),
                node.revisions,
                node.fixes,
                node.authors,
                node.id
            )?;
        }
        Ok(())
    }
}

fn flatten<'a>(node: &'a NodeReport, out: &mut Vec<&'a NodeReport>) {
    out.push(node);
    for child in &node.children {
        flatten(child, out);
    }
}

/// Create a writer for the chosen format, to stdout or a file
pub fn create_writer(
    format: OutputFormat,
    output: Option<&Path>,
    top: usize,
) -> anyhow::Result<Box<dyn ReportWriter>> {
    let writer: Box<dyn Write> = match output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(std::io::stdout()),
    };
    Ok(match format {
        OutputFormat::Json => Box::new(JsonWriter::new(writer)),
        OutputFormat::Terminal => Box::new(TerminalWriter::new(writer, top)),
    })
}
