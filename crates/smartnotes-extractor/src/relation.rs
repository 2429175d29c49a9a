//! Relationship inference
//!
//! Links already-extracted terms using trigger phrases ("is part of",
//! "such as", "requires"). Runs line by line on lowercased text and only
//! emits edges whose endpoints resolve to terms in the note.

use std::collections::HashSet;

use regex::Regex;
use smartnotes_core::{NotesError, RelationKind, Relationship, Result, Term};

use crate::normalize::Normalizer;
use crate::RelationExtractor;

// ============================================================================
// Trigger definitions
// ============================================================================

/// Which captured span is the edge source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// First span -> second span
    Forward,
    /// Second span -> first span
    Reversed,
}

/// Shape of a trigger's captures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerForm {
    /// Two spans, oriented as given
    Binary(Orientation),
    /// One span naming an example; the target is a term mentioned
    /// earlier on the same line
    Enumeration,
}

impl TriggerForm {
    fn capture_groups(&self) -> usize {
        match self {
            Self::Binary(_) => 2,
            Self::Enumeration => 1,
        }
    }
}

/// A relation trigger as data
#[derive(Debug, Clone)]
pub struct TriggerDef {
    pub name: String,
    pub kind: RelationKind,
    pub pattern: String,
    pub form: TriggerForm,
    pub confidence: f32,
}

impl TriggerDef {
    pub fn new(
        name: impl Into<String>,
        kind: RelationKind,
        pattern: impl Into<String>,
        form: TriggerForm,
        confidence: f32,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            pattern: pattern.into(),
            form,
            confidence,
        }
    }
}

/// Built-in triggers in application order
pub fn default_triggers() -> Vec<TriggerDef> {
    use Orientation::*;
    use RelationKind::*;

    const SPAN: &str = r"(\w+(?:\s+\w+)*)";

    vec![
        TriggerDef::new(
            "example_of",
            ExampleOf,
            format!(r"{SPAN}\s+is\s+an?\s+example\s+of\s+{SPAN}"),
            TriggerForm::Binary(Forward),
            0.9,
        ),
        TriggerDef::new(
            "such_as",
            ExampleOf,
            format!(r"such\s+as\s+{SPAN}"),
            TriggerForm::Enumeration,
            0.7,
        ),
        TriggerDef::new(
            "part_of",
            PartOf,
            format!(r"{SPAN}\s+is\s+(?:a\s+)?part\s+of\s+(?:the\s+)?{SPAN}"),
            TriggerForm::Binary(Forward),
            0.9,
        ),
        TriggerDef::new(
            "consists_of",
            PartOf,
            format!(r"{SPAN}\s+consists?\s+of\s+{SPAN}"),
            TriggerForm::Binary(Reversed),
            0.8,
        ),
        // "X requires Y" and "X builds on Y" both put Y first
        TriggerDef::new(
            "requires",
            PrerequisiteOf,
            format!(r"{SPAN}\s+requires?\s+(?:understanding\s+of\s+)?{SPAN}"),
            TriggerForm::Binary(Reversed),
            0.8,
        ),
        TriggerDef::new(
            "builds_on",
            PrerequisiteOf,
            format!(r"{SPAN}\s+builds?\s+on\s+{SPAN}"),
            TriggerForm::Binary(Reversed),
            0.7,
        ),
    ]
}

// ============================================================================
// Catalog
// ============================================================================

#[derive(Debug, Clone)]
struct CompiledTrigger {
    def: TriggerDef,
    regex: Regex,
}

/// Ordered, validated set of relation triggers
#[derive(Debug, Clone)]
pub struct TriggerCatalog {
    triggers: Vec<CompiledTrigger>,
}

impl TriggerCatalog {
    /// Compile and validate trigger definitions.
    ///
    /// Confidence must lie in [0, 1] and be unique among triggers of the
    /// same kind.
    pub fn build(defs: Vec<TriggerDef>) -> Result<Self> {
        let mut names = HashSet::new();
        let mut scores: Vec<(RelationKind, f32)> = Vec::new();
        let mut triggers = Vec::with_capacity(defs.len());

        for def in defs {
            if def.name.trim().is_empty() {
                return Err(NotesError::invalid_catalog(
                    format!("#{}", triggers.len()),
                    "trigger name is empty",
                ));
            }
            if !names.insert(def.name.clone()) {
                return Err(NotesError::invalid_catalog(&def.name, "duplicate trigger name"));
            }
            if !(0.0..=1.0).contains(&def.confidence) {
                return Err(NotesError::invalid_catalog(
                    &def.name,
                    format!("confidence {} outside [0, 1]", def.confidence),
                ));
            }
            if scores
                .iter()
                .any(|(kind, score)| *kind == def.kind && *score == def.confidence)
            {
                return Err(NotesError::invalid_catalog(
                    &def.name,
                    format!("confidence {} already used for {}", def.confidence, def.kind),
                ));
            }
            scores.push((def.kind, def.confidence));

            let regex = Regex::new(&def.pattern)
                .map_err(|e| NotesError::invalid_catalog(&def.name, e.to_string()))?;

            let expected = def.form.capture_groups();
            if regex.captures_len() != expected + 1 {
                return Err(NotesError::invalid_catalog(
                    &def.name,
                    format!(
                        "pattern must have exactly {expected} capture groups, found {}",
                        regex.captures_len() - 1
                    ),
                ));
            }

            triggers.push(CompiledTrigger { def, regex });
        }

        tracing::debug!(triggers = triggers.len(), "trigger catalog built");
        Ok(Self { triggers })
    }

    /// The built-in trigger catalog
    pub fn default_catalog() -> Result<Self> {
        Self::build(default_triggers())
    }

    /// Trigger names in application order
    pub fn names(&self) -> Vec<&str> {
        self.triggers.iter().map(|t| t.def.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }
}

// ============================================================================
// Inferencer
// ============================================================================

/// Term with precomputed comparison keys
struct Endpoint<'t> {
    display: &'t str,
    lowered: String,
    identity: String,
}

/// Emits relationships between terms already present in a note
#[derive(Debug, Clone)]
pub struct RelationInferencer {
    catalog: TriggerCatalog,
    normalizer: Normalizer,
}

impl RelationInferencer {
    pub fn new(catalog: TriggerCatalog, normalizer: Normalizer) -> Self {
        Self {
            catalog,
            normalizer,
        }
    }

    /// Inferencer with built-in triggers and default lexicon
    pub fn with_defaults() -> Result<Self> {
        Ok(Self::new(TriggerCatalog::default_catalog()?, Normalizer::default()))
    }

    /// Triggers in use
    pub fn catalog(&self) -> &TriggerCatalog {
        &self.catalog
    }

    /// Relationships asserted by `text` between `terms`
    pub fn infer(&self, text: &str, terms: &[Term]) -> Vec<Relationship> {
        if terms.len() < 2 {
            return Vec::new();
        }

        let endpoints: Vec<Endpoint<'_>> = terms
            .iter()
            .map(|t| Endpoint {
                display: &t.text,
                lowered: t.text.to_lowercase(),
                identity: self.normalizer.identity(&t.text),
            })
            .collect();

        let mut relations = Vec::new();

        for line in text.lines() {
            let line = line.to_lowercase();
            for trigger in &self.catalog.triggers {
                if let Some(rel) = self.apply(trigger, &line, &endpoints) {
                    relations.push(rel);
                }
            }
        }

        relations
    }

    /// First match of one trigger on one lowercased line
    fn apply(
        &self,
        trigger: &CompiledTrigger,
        line: &str,
        endpoints: &[Endpoint<'_>],
    ) -> Option<Relationship> {
        let caps = trigger.regex.captures(line)?;

        let (source, target) = match trigger.def.form {
            TriggerForm::Binary(orientation) => {
                let first = self.resolve(caps.get(1)?.as_str(), endpoints)?;
                let second = self.resolve(caps.get(2)?.as_str(), endpoints)?;
                match orientation {
                    Orientation::Forward => (first, second),
                    Orientation::Reversed => (second, first),
                }
            }
            TriggerForm::Enumeration => {
                let example = self.resolve(caps.get(1)?.as_str(), endpoints)?;
                let before = &line[..caps.get(0)?.start()];
                let category = endpoints
                    .iter()
                    .enumerate()
                    .find(|(i, e)| *i != example && before.contains(e.lowered.as_str()))
                    .map(|(i, _)| i)?;
                (example, category)
            }
        };

        if source == target {
            tracing::trace!(trigger = %trigger.def.name, "self-edge dropped");
            return None;
        }

        Some(Relationship::new(
            endpoints[source].display,
            endpoints[target].display,
            trigger.def.kind,
            trigger.def.confidence,
        ))
    }

    /// Index of the term a captured span refers to
    fn resolve(&self, span: &str, endpoints: &[Endpoint<'_>]) -> Option<usize> {
        let span = span.trim();
        if span.is_empty() {
            return None;
        }

        let identity = self.normalizer.identity(span);
        endpoints
            .iter()
            .position(|e| e.identity == identity)
            .or_else(|| {
                endpoints
                    .iter()
                    .position(|e| e.lowered.contains(span) || span.contains(&e.lowered))
            })
    }
}

impl RelationExtractor for RelationInferencer {
    fn extract_relations(&self, text: &str, terms: &[Term]) -> Vec<Relationship> {
        self.infer(text, terms)
    }
}

// ============================================================================
// Tests
// ============================================================================
