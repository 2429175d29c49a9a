//! SmartNotes Core - Domain models, errors, and shared types
//!
//! This crate defines the core abstractions used throughout SmartNotes:
//! - Document and structured-note models (terms, relationships)
//! - Note summaries (concepts, examples, note type)
//! - Relation kinds
//! - Common error types
//! - Configuration management

pub mod config;

pub use config::{
    AppConfig, ConfigError, DisplayCase, EngineConfig, EnvOverrides, LexiconConfig,
    LoggingConfig, Profile, RuleDef, TermCase,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for SmartNotes operations
#[derive(Error, Debug)]
pub enum NotesError {
    #[error("Invalid catalog entry '{name}': {reason}")]
    InvalidCatalog { name: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl NotesError {
    /// Shorthand for a catalog construction failure
    pub fn invalid_catalog(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidCatalog {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NotesError>;

// ============================================================================
// Document Models
// ============================================================================

/// A single note to be structured.
///
/// The engine only ever borrows a document; it is never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Caller-assigned identifier (e.g. "bio_001")
    pub id: String,

    /// Raw note text
    pub text: String,
}

impl Document {
    /// Create a new document
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }

    /// Whether the document has no content worth scanning
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

// ============================================================================
// Extraction Output
// ============================================================================

/// A finalized term/definition pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    /// Display text (original casing, or title case for lowercase-term rules)
    #[serde(rename = "term")]
    pub text: String,

    /// Definition text
    pub definition: String,

    /// Tag of the rule that produced the surviving candidate
    #[serde(rename = "pattern")]
    pub rule: String,
}

impl Term {
    /// Create a new term
    pub fn new(
        text: impl Into<String>,
        definition: impl Into<String>,
        rule: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            definition: definition.into(),
            rule: rule.into(),
        }
    }
}

/// Closed set of relation kinds between terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationKind {
    /// Source is an example of target
    ExampleOf,
    /// Source is a part of target
    PartOf,
    /// Source must be understood before target
    PrerequisiteOf,
}

impl RelationKind {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExampleOf => "example-of",
            Self::PartOf => "part-of",
            Self::PrerequisiteOf => "prerequisite-of",
        }
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A directed edge between two extracted terms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Display text of the source term
    pub source: String,

    /// Display text of the target term
    pub target: String,

    /// Relation kind
    #[serde(rename = "type")]
    pub kind: RelationKind,

    /// Fixed per-trigger confidence (0.0 - 1.0)
    pub confidence: f32,
}

impl Relationship {
    /// Create a new relationship
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        kind: RelationKind,
        confidence: f32,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
            confidence,
        }
    }
}

/// Per-document output of the structuring pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredNote {
    /// Terms in first-acceptance order
    pub terms: Vec<Term>,

    /// Relationships between terms
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<Relationship>,
}

impl StructuredNote {
    /// True when nothing was extracted
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.relationships.is_empty()
    }
}

/// Coarse classification of what a note is mostly about
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteType {
    /// Steps, processes, how-to
    Procedural,
    /// Definitions, theories, principles
    Conceptual,
    /// Dates, data, statistics
    Factual,
    /// Comparisons and arguments
    Analytical,
    /// No indicator found
    #[default]
    General,
}

impl NoteType {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Procedural => "procedural",
            Self::Conceptual => "conceptual",
            Self::Factual => "factual",
            Self::Analytical => "analytical",
            Self::General => "general",
        }
    }
}

impl std::fmt::Display for NoteType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A structured note together with document-level annotations.
///
/// Serializes as the note's `terms`/`relationships` fields followed by the
/// summary fields, so consumers of [`StructuredNote`] can read it unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteSummary {
    #[serde(flatten)]
    pub note: StructuredNote,

    /// Key concepts, highest ranked first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub concepts: Vec<String>,

    /// Example phrases introduced by "for example", "such as" and similar
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_type: Option<NoteType>,

    /// Whitespace-separated words in the source text
    #[serde(default)]
    pub word_count: usize,
}

// ============================================================================
// Tests
// ============================================================================
