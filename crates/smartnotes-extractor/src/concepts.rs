//! Key concept ranking
//!
//! Concepts come from three signals, scored so that the strongest signal
//! for a lowercase key wins:
//! - runs of two to five capitalized words inside one sentence (10.0)
//! - capitalized words of four or more letters (2.0 per occurrence)
//! - lowercase words of five or more letters seen at least three times
//!   (0.8 per occurrence)
//!
//! Ties keep first-seen order, so output is deterministic.

use std::collections::{HashMap, HashSet};

use regex::Regex;
use smartnotes_core::{LexiconConfig, NotesError, Result};

/// Concepts returned per note unless configured otherwise
pub const DEFAULT_CONCEPT_LIMIT: usize = 10;

const PHRASE_SCORE: f32 = 10.0;
const PROPER_WORD_WEIGHT: f32 = 2.0;
const FREQUENT_WORD_WEIGHT: f32 = 0.8;
const MIN_FREQUENT_OCCURRENCES: usize = 3;
const MIN_KEY_LEN: usize = 3;

/// Conjunctions that start a capitalized run without naming anything
const PHRASE_BREAKERS: &[&str] = &["but", "and", "or"];

/// Ranks the key concepts of a note
#[derive(Debug, Clone)]
pub struct ConceptExtractor {
    phrase: Regex,
    proper_word: Regex,
    common_word: Regex,
    stop_words: HashSet<String>,
    pronouns: HashSet<String>,
    leading: HashSet<String>,
    generic: Vec<String>,
    limit: usize,
}

impl ConceptExtractor {
    pub fn new(lexicon: &LexiconConfig) -> Result<Self> {
        let lowercase = |words: &[String]| -> HashSet<String> {
            words.iter().map(|w| w.to_lowercase()).collect()
        };

        let mut leading = lowercase(&lexicon.determiners);
        leading.extend(PHRASE_BREAKERS.iter().map(|w| w.to_string()));

        Ok(Self {
            phrase: compile(r"\b([A-Z][a-z]+(?:\s+[A-Z][a-z]+){1,4})\b")?,
            proper_word: compile(r"\b[A-Z][a-z]{3,}\b")?,
            common_word: compile(r"\b[a-z]{5,}\b")?,
            stop_words: lowercase(&lexicon.stop_words),
            pronouns: lowercase(&lexicon.blacklist),
            leading,
            generic: lexicon.generic_concepts.iter().map(|w| w.to_lowercase()).collect(),
            limit: DEFAULT_CONCEPT_LIMIT,
        })
    }

    /// Return at most `limit` concepts
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Ranked concepts, highest score first
    pub fn extract(&self, text: &str) -> Vec<String> {
        let mut ranking = Ranking::default();

        for sentence in text.split(['.', '!', '?']) {
            for m in self.phrase.find_iter(sentence) {
                let phrase = m.as_str().split_whitespace().collect::<Vec<_>>().join(" ");
                if self.is_phrase_concept(&phrase) {
                    ranking.offer(phrase, PHRASE_SCORE);
                }
            }
        }

        for (word, count) in count_in_order(self.proper_word.find_iter(text).map(|m| m.as_str())) {
            let lower = word.to_lowercase();
            if self.pronouns.contains(&lower) || self.stop_words.contains(&lower) {
                continue;
            }
            ranking.offer(word.to_string(), count as f32 * PROPER_WORD_WEIGHT);
        }

        let lowered = text.to_lowercase();
        let common = self
            .common_word
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .filter(|w| !self.stop_words.contains(*w));
        for (word, count) in count_in_order(common) {
            if count >= MIN_FREQUENT_OCCURRENCES {
                ranking.offer(capitalize(word), count as f32 * FREQUENT_WORD_WEIGHT);
            }
        }

        let concepts = ranking.into_ranked(self.limit);
        tracing::trace!(concepts = concepts.len(), "concepts ranked");
        concepts
    }

    fn is_phrase_concept(&self, phrase: &str) -> bool {
        let lower = phrase.to_lowercase();
        let starts_badly = lower
            .split(' ')
            .next()
            .is_some_and(|first| self.leading.contains(first));

        !starts_badly && !self.generic.iter().any(|g| lower.contains(g.as_str()))
    }
}

/// Best score per lowercase key, in first-seen order
#[derive(Default)]
struct Ranking {
    index: HashMap<String, usize>,
    entries: Vec<(String, f32)>,
}

impl Ranking {
    fn offer(&mut self, concept: String, score: f32) {
        let key = concept.trim().to_lowercase();
        if key.chars().count() < MIN_KEY_LEN {
            return;
        }

        match self.index.get(&key) {
            Some(&idx) => {
                if score > self.entries[idx].1 {
                    self.entries[idx] = (concept, score);
                }
            }
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push((concept, score));
            }
        }
    }

    fn into_ranked(mut self, limit: usize) -> Vec<String> {
        // stable, so equal scores keep first-seen order
        self.entries.sort_by(|a, b| b.1.total_cmp(&a.1));
        self.entries
            .into_iter()
            .take(limit)
            .map(|(concept, _)| concept)
            .collect()
    }
}

/// Occurrence counts, ordered by first occurrence
fn count_in_order<'t>(words: impl Iterator<Item = &'t str>) -> Vec<(&'t str, usize)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, usize)> = Vec::new();

    for word in words {
        match index.get(word) {
            Some(&idx) => counts[idx].1 += 1,
            None => {
                index.insert(word, counts.len());
                counts.push((word, 1));
            }
        }
    }
    counts
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| NotesError::invalid_catalog("concepts", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> ConceptExtractor {
        ConceptExtractor::new(&LexiconConfig::default()).unwrap()
    }

    #[test]
    fn test_capitalized_runs_rank_first() {
        let concepts = extractor()
            .extract("Charles Darwin proposed natural selection. Darwin travelled on the Beagle.");
        assert_eq!(concepts, vec!["Charles Darwin", "Darwin", "Charles", "Beagle"]);
    }

    #[test]
    fn test_single_words_scored_by_frequency() {
        let text = "The French Revolution began in 1789. Revolution spread across Europe. \
                    The revolution changed politics, and revolution inspired others.";
        // "The French Revolution" starts with a determiner and is not a phrase concept
        assert_eq!(extractor().extract(text), vec!["Revolution", "French", "Europe"]);
    }

    #[test]
    fn test_frequent_lowercase_words_need_three_occurrences() {
        let text = "enzymes speed reactions. enzymes lower activation energy. enzymes are proteins.";
        assert_eq!(extractor().extract(text), vec!["Enzymes"]);

        let twice = "enzymes speed reactions. enzymes are proteins.";
        assert!(extractor().extract(twice).is_empty());
    }

    #[test]
    fn test_stop_words_pronouns_and_generic_phrases_skipped() {
        let text = "Chapter Summary of the Book. They said This matters. There were Cells.";
        assert_eq!(extractor().extract(text), vec!["Cells"]);
    }

    #[test]
    fn test_phrases_do_not_cross_sentences() {
        let concepts = extractor().extract("Photosynthesis happens in Leaves. Chlorophyll absorbs light.");
        assert!(!concepts.iter().any(|c| c.contains(' ')));
        assert!(concepts.contains(&"Chlorophyll".to_string()));
    }

    #[test]
    fn test_limit() {
        let text = "Osmosis moves water. Diffusion moves particles. Mitosis divides cells. \
                    Meiosis makes gametes.";
        let limited = extractor().with_limit(2);
        assert_eq!(limited.limit(), 2);
        assert_eq!(limited.extract(text), vec!["Osmosis", "Diffusion"]);
        assert_eq!(extractor().extract(text).len(), 4);
    }

    #[test]
    fn test_empty_text() {
        assert!(extractor().extract("").is_empty());
        assert!(extractor().extract("   \n").is_empty());
    }

    #[test]
    fn test_count_in_order() {
        let counts = count_in_order(["b", "a", "b", "c", "b"].into_iter());
        assert_eq!(counts, vec![("b", 3), ("a", 1), ("c", 1)]);
    }
}
