//! Term validation
//!
//! Decides whether a raw term span is an acceptable concept label. The
//! decision depends only on the term text and the rule that produced it,
//! never on the definition.

use std::collections::HashSet;

use smartnotes_core::{LexiconConfig, RuleDef, TermCase};

/// Why a term was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Shorter than the rule's minimum term length
    TooShort,
    /// Is or contains a blacklisted word
    Blacklisted(String),
    /// Contains a copula, so the span swallowed part of a sentence
    Fragment(String),
    /// Single lowercase word under a rule expecting capitalized terms
    Lowercase,
    /// Starts with a generic quantifier ("most", "some")
    GenericLead(String),
    /// Rule requires a keyword the term does not mention
    MissingKeyword,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooShort => write!(f, "too short"),
            Self::Blacklisted(w) => write!(f, "blacklisted word '{w}'"),
            Self::Fragment(w) => write!(f, "contains copula '{w}'"),
            Self::Lowercase => write!(f, "lowercase single word"),
            Self::GenericLead(w) => write!(f, "generic lead word '{w}'"),
            Self::MissingKeyword => write!(f, "missing required keyword"),
        }
    }
}

/// Minimum term length applied regardless of rule settings
const MIN_TERM_LEN: usize = 3;

/// Predicate gate for raw term spans
#[derive(Debug, Clone)]
pub struct TermValidator {
    blacklist: HashSet<String>,
    generic_leads: HashSet<String>,
    copulas: HashSet<String>,
}

impl TermValidator {
    /// Create a validator from lexicon configuration
    pub fn new(lexicon: &LexiconConfig) -> Self {
        Self {
            blacklist: lowercase_set(&lexicon.blacklist),
            generic_leads: lowercase_set(&lexicon.generic_leads),
            copulas: lowercase_set(&lexicon.copulas),
        }
    }

    /// Check a term against the lexicon and the producing rule
    pub fn check(&self, term: &str, rule: &RuleDef) -> Result<(), Rejection> {
        let term = term.trim();

        if term.chars().count() < rule.min_term_len.max(MIN_TERM_LEN) {
            return Err(Rejection::TooShort);
        }

        let words = words(term);

        for word in &words {
            if self.blacklist.contains(word)
                || rule.excluded_words.iter().any(|w| w.eq_ignore_ascii_case(word))
            {
                return Err(Rejection::Blacklisted(word.clone()));
            }
            if self.copulas.contains(word) {
                return Err(Rejection::Fragment(word.clone()));
            }
        }

        if let Some(first) = words.first() {
            if self.generic_leads.contains(first) {
                return Err(Rejection::GenericLead(first.clone()));
            }
        }

        let single_word = term.split_whitespace().count() == 1;
        let capitalized = term.chars().next().is_some_and(char::is_uppercase);
        if single_word && !capitalized && rule.term_case == TermCase::Capitalized {
            return Err(Rejection::Lowercase);
        }

        if !rule.required_keywords.is_empty() {
            let lowered = term.to_lowercase();
            let mentions = rule
                .required_keywords
                .iter()
                .any(|k| lowered.contains(&k.to_lowercase()));
            if !mentions {
                return Err(Rejection::MissingKeyword);
            }
        }

        Ok(())
    }

    /// Whether the term passes validation
    pub fn accepts(&self, term: &str, rule: &RuleDef) -> bool {
        self.check(term, rule).is_ok()
    }
}

impl Default for TermValidator {
    fn default() -> Self {
        Self::new(&LexiconConfig::default())
    }
}

fn lowercase_set(words: &[String]) -> HashSet<String> {
    words.iter().map(|w| w.to_lowercase()).collect()
}

/// Lowercased alphanumeric words of a term
fn words(term: &str) -> Vec<String> {
    term.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule() -> RuleDef {
        RuleDef::new("is_are", r"(x) (y)", 10)
    }

    #[test]
    fn test_accepts_capitalized_concepts() {
        let v = TermValidator::default();
        assert!(v.accepts("Photosynthesis", &rule()));
        assert!(v.accepts("French Revolution", &rule()));
        assert!(v.accepts("The Bastille", &rule()));
    }

    #[test]
    fn test_rejects_short_terms() {
        let v = TermValidator::default();
        assert_eq!(v.check("Ox", &rule()), Err(Rejection::TooShort));
        assert_eq!(v.check("  Ab  ", &rule()), Err(Rejection::TooShort));
    }

    #[test]
    fn test_rule_minimum_term_length() {
        let v = TermValidator::default();
        let strict = rule().with_min_term_len(8);
        assert_eq!(v.check("Labor", &strict), Err(Rejection::TooShort));
        assert!(v.accepts("Labor unions", &strict));
    }

    #[test]
    fn test_rejects_pronouns_as_whole_words() {
        let v = TermValidator::default();
        assert_eq!(
            v.check("They", &rule()),
            Err(Rejection::Blacklisted("they".to_string()))
        );
        assert!(!v.accepts("This Process", &rule()));
        // Substrings of longer words are fine
        assert!(v.accepts("Theory", &rule()));
        assert!(v.accepts("Heredity", &rule()));
    }

    #[test]
    fn test_rejects_rule_excluded_words() {
        let v = TermValidator::default();
        let heading = rule().with_excluded_words(&["key"]);
        assert!(!v.accepts("Key points", &heading));
        assert!(v.accepts("Key points", &rule()));
    }

    #[test]
    fn test_rejects_copula_fragments() {
        let v = TermValidator::default();
        assert_eq!(
            v.check("Photosynthesis is a process", &rule()),
            Err(Rejection::Fragment("is".to_string()))
        );
    }

    #[test]
    fn test_rejects_generic_leads() {
        let v = TermValidator::default();
        assert_eq!(
            v.check("Most Cells", &rule()),
            Err(Rejection::GenericLead("most".to_string()))
        );
        assert!(!v.accepts("Some Plants", &rule()));
        assert!(v.accepts("Mostar Bridge", &rule()));
    }

    #[test]
    fn test_single_lowercase_word_depends_on_rule() {
        let v = TermValidator::default();
        assert_eq!(v.check("derivative", &rule()), Err(Rejection::Lowercase));
        assert!(v.accepts("derivative", &rule().lowercase_terms()));
        // Multi-word lowercase terms are not subject to the capitalization check
        assert!(v.accepts("chain rule", &rule()));
    }

    #[test]
    fn test_required_keywords() {
        let v = TermValidator::default();
        let formula = rule().lowercase_terms().with_required_keywords(&["sum", "term"]);
        assert!(v.accepts("The sum of the first n terms", &formula));
        assert_eq!(
            v.check("The colour of the sky", &formula),
            Err(Rejection::MissingKeyword)
        );
    }

    #[test]
    fn test_custom_lexicon() {
        let lexicon = LexiconConfig {
            blacklist: vec!["Bastille".to_string()],
            ..Default::default()
        };
        let v = TermValidator::new(&lexicon);
        assert!(!v.accepts("The Bastille", &rule()));
        assert!(v.accepts("They", &rule()));
    }

    #[test]
    fn test_rejection_display() {
        assert_eq!(Rejection::TooShort.to_string(), "too short");
        assert_eq!(
            Rejection::Blacklisted("it".into()).to_string(),
            "blacklisted word 'it'"
        );
    }
}
