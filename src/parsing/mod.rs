//! Structural parsers that turn source text into component trees

mod java;

pub use java::JavaParser;

use crate::core::component::Component;
use crate::core::errors::Result;
use crate::core::types::Granularity;

/// The extraction interface every structural grammar plugs into
pub trait SourceParser {
    /// Parse one snapshot into a component tree rooted at a single File.
    ///
    /// Parsing the same text twice yields identical trees: same identities,
    /// same ranges.
    fn parse(&mut self, path: &str, source: &str, granularity: Granularity) -> Result<Component>;
}

/// Whether a structural grammar is available for the given path
pub fn can_parse(path: &str) -> bool {
    path.ends_with(".java")
}

/// A parser for the given path, if its language is supported
pub fn parser_for(path: &str) -> Option<Box<dyn SourceParser>> {
    if !can_parse(path) {
        return None;
    }
    match JavaParser::new() {
        Ok(parser) => Some(Box::new(parser)),
        Err(e) => {
            log::warn!("cannot initialize parser for {path}: {e}");
            None
        }
    }
}
