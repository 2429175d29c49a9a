//! Term identity normalization
//!
//! Identity keys are used only for equality between terms; they are never
//! shown to callers.

use smartnotes_core::LexiconConfig;

/// Maps display text to a comparison key
#[derive(Debug, Clone)]
pub struct Normalizer {
    determiners: Vec<String>,
}

impl Normalizer {
    /// Create a normalizer stripping the given leading determiners
    pub fn new(determiners: &[String]) -> Self {
        Self {
            determiners: determiners.iter().map(|d| d.to_lowercase()).collect(),
        }
    }

    /// Create a normalizer from lexicon configuration
    pub fn from_lexicon(lexicon: &LexiconConfig) -> Self {
        Self::new(&lexicon.determiners)
    }

    /// Lowercase, then strip exactly one leading determiner.
    ///
    /// "The Bastille" and "Bastille" both map to "bastille".
    pub fn identity(&self, display: &str) -> String {
        let lowered = collapse_whitespace(display).to_lowercase();

        for det in &self.determiners {
            if let Some(rest) = lowered
                .strip_prefix(det.as_str())
                .and_then(|r| r.strip_prefix(' '))
            {
                return rest.to_string();
            }
        }

        lowered
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::from_lexicon(&LexiconConfig::default())
    }
}

/// Trim and collapse internal whitespace runs to single spaces
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Capitalize the first letter of every word and lowercase the rest
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
