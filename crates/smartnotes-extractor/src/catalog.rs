//! Pattern Catalog module
//!
//! An ordered, immutable list of term/definition rules. Each rule is applied
//! independently over the whole note; a span may satisfy several rules and
//! produce several candidates. Rule order is the precedence order used by the
//! aggregator, so reordering rules changes output without touching any other
//! component.

use std::collections::HashSet;

use regex::{Regex, RegexBuilder};

use crate::normalize::collapse_whitespace;
use crate::Candidate;
use smartnotes_core::{EngineConfig, NotesError, Profile, Result, RuleDef};

// ============================================================================
// Built-in Rules
// ============================================================================

/// Words that make a two-word colon heading too generic ("Key points:")
const GENERIC_HEADING_WORDS: &[&str] = &["key", "main", "new", "old", "first", "last", "next"];

/// Keywords a formula-style term must mention
const FORMULA_KEYWORDS: &[&str] = &["term", "sum", "formula", "equation", "nth", "product"];

/// Rules tuned for science, math and literature notes, in priority order
pub fn general_rules() -> Vec<RuleDef> {
    vec![
        // "Photosynthesis is the process by which ..."
        RuleDef::new(
            "is_are",
            r"\b([A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)*)[ \t]+(?:is|are)[ \t]+(.+?)(?:\.|$)",
            10,
        ),
        RuleDef::new(
            "was_were",
            r"^[ \t]*([A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)*)[ \t]+(?:was|were)[ \t]+(.+?)(?:\.|$)",
            10,
        ),
        RuleDef::new(
            "colon",
            r"^[ \t]*([A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)*):[ \t]*(.+?)(?:\.|$)",
            10,
        ),
        RuleDef::new(
            "which",
            r"\b([A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)*),?[ \t]+which[ \t]+(?:is|are|was|were)[ \t]+(.+?)(?:\.|$)",
            10,
        ),
        RuleDef::new(
            "means",
            r"\b([A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)*)[ \t]+means[ \t]+(.+?)(?:\.|$)",
            10,
        ),
        RuleDef::new(
            "refers_to",
            r"\b([A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)*)[ \t]+refers[ \t]+to[ \t]+(.+?)(?:\.|$)",
            10,
        ),
        RuleDef::new(
            "known_as",
            r"\b([A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)*)[ \t]+(?:(?:is|are)[ \t]+)?(?:normally[ \t]+)?(?:known|called|acknowledged|recognized)[ \t]+as[ \t]+(.+?)(?:\.|$)",
            10,
        ),
        RuleDef::new(
            "consists_of",
            r"\b([A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)*)[ \t]+consists?[ \t]+of[ \t]+(.+?)(?:\.|$)",
            10,
        ),
        RuleDef::new(
            "contains",
            r"\b([A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)*)[ \t]+contains?[ \t]+(.+?)(?:\.|$)",
            10,
        ),
        // "The sum of the first n terms of an A.P. is given by Sn = ..."
        // The term may wrap onto the next line and may contain abbreviations.
        RuleDef::new(
            "given_by",
            r"(?s)\b([Tt]he\s+.{5,80}?)\s+is\s+given\s+by\s+([^.!?\n]+)",
            3,
        )
        .lowercase_terms()
        .with_required_keywords(FORMULA_KEYWORDS),
    ]
}

/// Rules tuned for history notes, in priority order
pub fn history_rules() -> Vec<RuleDef> {
    vec![
        RuleDef::new(
            "the_was_were",
            r"\bThe[ \t]+([A-Z][a-z]+(?:[ \t]+(?:of|the|and|in)[ \t]+[A-Z][a-z]+|[ \t]+[A-Z][a-z]+)*)[ \t]+(?:was|were)[ \t]+(.+?)(?:\.|Led by|Marked|Involved|$)",
            10,
        ),
        RuleDef::new(
            "the_colon",
            r"\bThe[ \t]+([A-Z][a-z]+(?:[- \t][A-Z][a-z]+)*):[ \t]*(.+?)(?:\.|Led by|Marked|Adopted|$)",
            15,
        ),
        RuleDef::new(
            "multiword_of",
            r"\b([A-Z][a-z]+(?:[ \t]+of[ \t]+(?:the[ \t]+)?[A-Z][a-z]+)+):[ \t]*(.+?)(?:\.|Led by|Adopted|$)",
            15,
        ),
        // Accepts digits and acronyms: "World War II:", "NATO:"
        RuleDef::new(
            "simple_colon",
            r"^[ \t]*([A-Z][A-Za-z0-9]+(?:[ \t]+[A-Z][A-Za-z0-9]+)*):[ \t]*(.+?)(?:\.|$)",
            15,
        ),
    ]
}

/// Rules for lowercase common-noun terms, in priority order
pub fn lowercase_rules() -> Vec<RuleDef> {
    vec![
        // "A derivative is ...", "An enzyme is ..."
        RuleDef::new(
            "a_an_is",
            r"\b[Aa]n?[ \t]+([a-z]+(?:[ \t]+[a-z]+)*?)[ \t]+(?:is|are)[ \t]+(.+?)(?:\.|$)",
            10,
        )
        .lowercase_terms()
        .title_case(),
        // "The mean is ...", "The chain rule is ..."
        RuleDef::new(
            "the_is_are",
            r"\bThe[ \t]+([A-Za-z][a-z]+(?:[ \t]+[a-z]+)*?)[ \t]+(?:is|are)[ \t]+(.+?)(?:\.|$)",
            10,
        )
        .lowercase_terms()
        .title_case(),
        // "Factory system: ..."
        RuleDef::new(
            "multiword_lower",
            r"^[ \t]*([A-Z][a-z]+[ \t]+[a-z]+):[ \t]*(.+?)(?:\.|$)",
            20,
        )
        .title_case()
        .with_min_term_len(8)
        .with_excluded_words(GENERIC_HEADING_WORDS),
        // "Rational numbers are ..."
        RuleDef::new(
            "multiword_cap_lower_are",
            r"^[ \t]*([A-Z][a-z]+[ \t]+[a-z]+(?:[ \t]+[a-z]+)*?)[ \t]+(?:is|are)[ \t]+(.+?)(?:\.|$)",
            15,
        )
        .title_case()
        .with_min_term_len(8),
    ]
}

/// Rule definitions for a profile, in priority order
pub fn profile_rules(profile: Profile) -> Vec<RuleDef> {
    match profile {
        Profile::Unified => general_rules()
            .into_iter()
            .chain(history_rules())
            .chain(lowercase_rules())
            .collect(),
        Profile::General => general_rules().into_iter().chain(lowercase_rules()).collect(),
        Profile::History => {
            let general = general_rules();
            let pick = |tag: &str| general.iter().find(|r| r.tag == tag).cloned();

            history_rules()
                .into_iter()
                .chain(pick("was_were"))
                .chain(pick("is_are"))
                .collect()
        }
    }
}

// ============================================================================
// Compiled Rules
// ============================================================================

/// A rule whose matcher has been built and checked
#[derive(Debug, Clone)]
pub struct CompiledRule {
    def: RuleDef,
    regex: Regex,
    priority: usize,
}

impl CompiledRule {
    /// Compile a rule definition at the given catalog position
    pub fn compile(def: RuleDef, priority: usize) -> Result<Self> {
        if def.tag.trim().is_empty() {
            return Err(NotesError::invalid_catalog(
                format!("#{priority}"),
                "rule tag is empty",
            ));
        }
        if def.min_definition_len == 0 {
            return Err(NotesError::invalid_catalog(
                &def.tag,
                "minimum definition length must be at least 1",
            ));
        }

        let regex = RegexBuilder::new(&def.pattern)
            .multi_line(true)
            .crlf(true)
            .build()
            .map_err(|e| NotesError::invalid_catalog(&def.tag, e.to_string()))?;

        // Group 0 is the whole match
        if regex.captures_len() != 3 {
            return Err(NotesError::invalid_catalog(
                &def.tag,
                format!(
                    "pattern must have exactly 2 capture groups (term, definition), found {}",
                    regex.captures_len() - 1
                ),
            ));
        }

        Ok(Self {
            def,
            regex,
            priority,
        })
    }

    /// Rule tag
    pub fn tag(&self) -> &str {
        &self.def.tag
    }

    /// Underlying definition
    pub fn def(&self) -> &RuleDef {
        &self.def
    }

    /// Position in the catalog (0 = highest priority)
    pub fn priority(&self) -> usize {
        self.priority
    }

    /// All candidates this rule proposes for `text`, in document order.
    ///
    /// Matches whose definition is shorter than the rule minimum are skipped.
    pub fn candidates<'a>(&'a self, text: &'a str) -> impl Iterator<Item = Candidate> + 'a {
        self.regex.captures_iter(text).filter_map(move |caps| {
            let whole = caps.get(0)?;
            let term = collapse_whitespace(caps.get(1)?.as_str());
            let definition = caps.get(2)?.as_str().trim();

            if definition.chars().count() < self.def.min_definition_len {
                tracing::trace!(
                    rule = %self.def.tag,
                    term = %term,
                    "definition below minimum length"
                );
                return None;
            }

            Some(Candidate {
                term,
                definition: definition.to_string(),
                rule: self.def.tag.clone(),
                priority: self.priority,
                span: whole.range(),
                display: self.def.display,
            })
        })
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Ordered collection of compiled rules
#[derive(Debug, Clone)]
pub struct PatternCatalog {
    rules: Vec<CompiledRule>,
}

impl PatternCatalog {
    /// Compile rule definitions in the given priority order.
    ///
    /// Fails on the first invalid definition or on a duplicated tag.
    pub fn build(defs: Vec<RuleDef>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut rules = Vec::with_capacity(defs.len());

        for (priority, def) in defs.into_iter().enumerate() {
            if !seen.insert(def.tag.clone()) {
                return Err(NotesError::invalid_catalog(&def.tag, "duplicate rule tag"));
            }
            rules.push(CompiledRule::compile(def, priority)?);
        }

        tracing::debug!(rules = rules.len(), "pattern catalog built");
        Ok(Self { rules })
    }

    /// Catalog for a built-in profile
    pub fn for_profile(profile: Profile) -> Result<Self> {
        Self::build(profile_rules(profile))
    }

    /// Catalog for an engine configuration: profile rules, then extra rules
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let mut defs = profile_rules(config.profile);
        defs.extend(config.extra_rules.iter().cloned());
        Self::build(defs)
    }

    /// Rules in priority order
    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    /// Rule tags in priority order
    pub fn tags(&self) -> Vec<&str> {
        self.rules.iter().map(CompiledRule::tag).collect()
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the catalog has no rules
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Every candidate for `text`, ordered by (rule priority, document offset)
    pub fn candidates<'a>(&'a self, text: &'a str) -> impl Iterator<Item = Candidate> + 'a {
        self.rules.iter().flat_map(move |rule| rule.candidates(text))
    }
}

// ============================================================================
// Tests
// ============================================================================
