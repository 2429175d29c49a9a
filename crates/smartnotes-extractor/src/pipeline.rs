//! Note structuring pipeline
//!
//! Runs every catalog rule over a document, filters candidates through the
//! validator, deduplicates by normalized identity and finally links the
//! surviving terms. [`NoteStructurer::summarize`] adds the document-level
//! annotations: key concepts, examples, note type and word count.

use smartnotes_core::{Document, EngineConfig, NoteSummary, Result, StructuredNote, Term};

use crate::aggregate::TermSet;
use crate::catalog::PatternCatalog;
use crate::classify::{classify_note, word_count};
use crate::concepts::ConceptExtractor;
use crate::examples::ExampleExtractor;
use crate::normalize::Normalizer;
use crate::relation::{RelationInferencer, TriggerCatalog};
use crate::validator::TermValidator;
use crate::TermExtractor;

/// Immutable structuring engine, safe to share across threads
#[derive(Debug, Clone)]
pub struct NoteStructurer {
    catalog: PatternCatalog,
    validator: TermValidator,
    normalizer: Normalizer,
    inferencer: Option<RelationInferencer>,
    concepts: ConceptExtractor,
    examples: ExampleExtractor,
}

impl NoteStructurer {
    /// Build an engine from configuration.
    ///
    /// Fails only when a catalog entry or built-in pattern is invalid.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let catalog = PatternCatalog::from_config(config)?;
        let normalizer = Normalizer::from_lexicon(&config.lexicon);

        let inferencer = if config.relations {
            Some(RelationInferencer::new(
                TriggerCatalog::default_catalog()?,
                normalizer.clone(),
            ))
        } else {
            None
        };

        tracing::debug!(
            profile = %config.profile,
            rules = catalog.len(),
            relations = config.relations,
            "note structurer ready"
        );

        Ok(Self {
            catalog,
            validator: TermValidator::new(&config.lexicon),
            normalizer,
            inferencer,
            concepts: ConceptExtractor::new(&config.lexicon)?,
            examples: ExampleExtractor::new()?,
        })
    }

    /// Active pattern catalog
    pub fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    /// Whether relationship inference runs
    pub fn infers_relations(&self) -> bool {
        self.inferencer.is_some()
    }

    /// Validated, deduplicated terms in first-acceptance order
    pub fn terms(&self, text: &str) -> Vec<Term> {
        let mut set = TermSet::new(&self.normalizer);

        for candidate in self.catalog.candidates(text) {
            let rule = &self.catalog.rules()[candidate.priority];
            if let Err(reason) = self.validator.check(&candidate.term, rule.def()) {
                tracing::trace!(
                    rule = %candidate.rule,
                    term = %candidate.term,
                    %reason,
                    "candidate rejected"
                );
                continue;
            }
            set.offer(candidate);
        }

        set.into_terms()
    }

    /// Structure one document
    pub fn structure(&self, document: &Document) -> StructuredNote {
        if document.is_blank() {
            return StructuredNote::default();
        }

        let terms = self.terms(&document.text);
        let relationships = match &self.inferencer {
            Some(inferencer) => inferencer.infer(&document.text, &terms),
            None => Vec::new(),
        };

        tracing::debug!(
            document = %document.id,
            terms = terms.len(),
            relationships = relationships.len(),
            "document structured"
        );

        StructuredNote {
            terms,
            relationships,
        }
    }

    /// Structure raw text
    pub fn structure_text(&self, text: &str) -> StructuredNote {
        self.structure(&Document::new("", text))
    }

    /// Structure one document and annotate it with concepts, examples,
    /// note type and word count
    pub fn summarize(&self, document: &Document) -> NoteSummary {
        let note = self.structure(document);
        if document.is_blank() {
            return NoteSummary {
                note,
                ..Default::default()
            };
        }

        let text = &document.text;
        NoteSummary {
            note,
            concepts: self.concepts.extract(text),
            examples: self.examples.extract(text),
            note_type: Some(classify_note(text)),
            word_count: word_count(text),
        }
    }
}

impl TermExtractor for NoteStructurer {
    fn extract_terms(&self, text: &str) -> Vec<Term> {
        self.terms(text)
    }
}
