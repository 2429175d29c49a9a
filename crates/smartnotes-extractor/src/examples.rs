//! Example phrase extraction
//!
//! Picks up the clause following an example marker ("for example",
//! "e.g.", "such as", "for instance") and lines labelled "Example:".

use regex::{Regex, RegexBuilder};
use smartnotes_core::{NotesError, Result};

const MARKERS: &[&str] = &[
    r"\b(?:for example|e\.g\.|such as|for instance)[,:]?\s+([^.!?]+)",
    r"\bexample:\s+([^.!?\n]+)",
];

/// Finds example clauses, case-insensitively
#[derive(Debug, Clone)]
pub struct ExampleExtractor {
    markers: Vec<Regex>,
}

impl ExampleExtractor {
    pub fn new() -> Result<Self> {
        let markers = MARKERS
            .iter()
            .map(|pattern| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| NotesError::invalid_catalog("examples", e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { markers })
    }

    /// Example clauses grouped by marker, each group in document order.
    /// A clause reached by two markers is reported once.
    pub fn extract(&self, text: &str) -> Vec<String> {
        let mut examples: Vec<String> = Vec::new();

        for marker in &self.markers {
            for caps in marker.captures_iter(text) {
                let Some(clause) = caps.get(1) else { continue };
                let clause = clause.as_str().trim();
                if !clause.is_empty() && !examples.iter().any(|e| e == clause) {
                    examples.push(clause.to_string());
                }
            }
        }

        examples
    }
}
