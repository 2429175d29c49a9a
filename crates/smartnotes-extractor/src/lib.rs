//! SmartNotes Extractor - Note structuring pipeline
//!
//! Turns free-form study notes into term/definition pairs using an ordered
//! catalog of surface patterns, then links the extracted terms with
//! trigger-phrase relations.
//!
//! Pipeline: catalog rules -> validator -> normalizer -> aggregator ->
//! relationship inference. See [`pipeline::NoteStructurer`].
//!
//! Alongside the terms, notes can be summarized with ranked key concepts,
//! example clauses, a note type and a word count.

use std::ops::Range;

use smartnotes_core::{DisplayCase, Relationship, Term};

/// Tentative extraction produced by a single catalog rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Term span, trimmed and whitespace-collapsed
    pub term: String,
    /// Definition span, trimmed
    pub definition: String,
    /// Tag of the producing rule
    pub rule: String,
    /// Position of the producing rule in the catalog (0 = highest)
    pub priority: usize,
    /// Byte range of the whole match in the document
    pub span: Range<usize>,
    /// Display casing requested by the rule
    pub display: DisplayCase,
}

impl Candidate {
    /// Display text for this candidate
    pub fn display_text(&self) -> String {
        match self.display {
            DisplayCase::AsWritten => self.term.clone(),
            DisplayCase::Title => normalize::title_case(&self.term),
        }
    }

    /// Promote to a finalized term
    pub fn into_term(self) -> Term {
        let text = self.display_text();
        Term::new(text, self.definition, self.rule)
    }
}

/// Trait for term extractors
pub trait TermExtractor: Send + Sync {
    fn extract_terms(&self, text: &str) -> Vec<Term>;
}

/// Trait for relation extractors
pub trait RelationExtractor: Send + Sync {
    fn extract_relations(&self, text: &str, terms: &[Term]) -> Vec<Relationship>;
}

pub mod aggregate;
pub mod catalog;
pub mod classify;
pub mod concepts;
pub mod examples;
pub mod metrics;
pub mod normalize;
pub mod pipeline;
pub mod relation;
pub mod validator;

pub use aggregate::TermSet;
pub use catalog::{CompiledRule, PatternCatalog};
pub use classify::{classify_note, word_count};
pub use concepts::{ConceptExtractor, DEFAULT_CONCEPT_LIMIT};
pub use examples::ExampleExtractor;
pub use metrics::{AggregateMetrics, ConceptMetrics, Evaluator, GoldTerm, TermMetrics};
pub use normalize::Normalizer;
pub use pipeline::NoteStructurer;
pub use relation::{Orientation, RelationInferencer, TriggerCatalog, TriggerDef, TriggerForm};
pub use validator::{Rejection, TermValidator};
