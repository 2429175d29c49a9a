//! Quality Metrics module
//!
//! Scores extracted terms against annotated gold terms with precision,
//! recall and F1, scores ranked key concepts against gold concepts, and
//! aggregates both over a dataset.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use smartnotes_core::Term;

use crate::normalize::Normalizer;

// ============================================================================
// Term Metrics
// ============================================================================

/// Metrics for term extraction on one or more documents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TermMetrics {
    /// Predicted terms matched to a gold term
    pub true_positives: usize,
    /// Predicted terms with no gold counterpart
    pub false_positives: usize,
    /// Gold terms nothing matched
    pub false_negatives: usize,
}

impl TermMetrics {
    /// Calculate precision (TP / (TP + FP))
    pub fn precision(&self) -> f32 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    /// Calculate recall (TP / (TP + FN))
    pub fn recall(&self) -> f32 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    /// Calculate F1 score (2 * P * R / (P + R))
    pub fn f1_score(&self) -> f32 {
        harmonic_mean(self.precision(), self.recall())
    }

    pub fn predicted_total(&self) -> usize {
        self.true_positives + self.false_positives
    }

    pub fn gold_total(&self) -> usize {
        self.true_positives + self.false_negatives
    }
}

/// Metrics for key-concept extraction, top-K with relaxed matching
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConceptMetrics {
    /// Considered predictions that match some gold concept
    pub matched_predicted: usize,
    /// Gold concepts matched by some considered prediction
    pub matched_gold: usize,
    /// Predictions considered (at most K)
    pub predicted: usize,
    pub gold: usize,
}

impl ConceptMetrics {
    pub fn precision(&self) -> f32 {
        ratio(self.matched_predicted, self.predicted)
    }

    pub fn recall(&self) -> f32 {
        ratio(self.matched_gold, self.gold)
    }

    pub fn f1_score(&self) -> f32 {
        harmonic_mean(self.precision(), self.recall())
    }
}

fn harmonic_mean(p: f32, r: f32) -> f32 {
    if p + r == 0.0 {
        0.0
    } else {
        2.0 * p * r / (p + r)
    }
}

fn ratio(num: usize, den: usize) -> f32 {
    if den == 0 {
        0.0
    } else {
        num as f32 / den as f32
    }
}

// ============================================================================
// Gold Standard
// ============================================================================

/// An annotated term/definition pair
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct GoldTerm {
    pub term: String,
    #[serde(default)]
    pub definition: String,
}

impl GoldTerm {
    pub fn new(term: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            definition: definition.into(),
        }
    }
}

// ============================================================================
// Evaluator
// ============================================================================

/// Ranked concepts considered per note when scoring concepts
pub const CONCEPT_TOP_K: usize = 10;

/// Evaluator for term extraction quality
#[derive(Debug, Clone)]
pub struct Evaluator {
    /// Compare normalized identities instead of substrings
    strict: bool,
    normalizer: Normalizer,
}

impl Evaluator {
    /// Relaxed evaluator: a prediction matches a gold term when either
    /// contains the other, ignoring case
    pub fn new() -> Self {
        Self {
            strict: false,
            normalizer: Normalizer::default(),
        }
    }

    /// Require identical normalized identities
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Use a specific normalizer for identity comparison
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    fn terms_match(&self, predicted: &str, gold: &str) -> bool {
        if self.strict {
            self.normalizer.identity(predicted) == self.normalizer.identity(gold)
        } else {
            overlaps(predicted, gold)
        }
    }

    /// Score predicted terms against gold terms.
    ///
    /// Matching is greedy and one-to-one: each gold term is claimed by at
    /// most one prediction, in prediction order.
    pub fn evaluate_terms(&self, predicted: &[Term], gold: &[GoldTerm]) -> TermMetrics {
        let mut matched_gold: HashSet<usize> = HashSet::new();
        let mut true_positives = 0;

        for pred in predicted {
            let hit = gold
                .iter()
                .enumerate()
                .find(|(idx, g)| !matched_gold.contains(idx) && self.terms_match(&pred.text, &g.term));
            if let Some((idx, _)) = hit {
                matched_gold.insert(idx);
                true_positives += 1;
            }
        }

        TermMetrics {
            true_positives,
            false_positives: predicted.len() - true_positives,
            false_negatives: gold.len() - matched_gold.len(),
        }
    }

    /// Score the top [`CONCEPT_TOP_K`] ranked concepts against gold concepts.
    ///
    /// Matching is always relaxed (case-insensitive containment either way)
    /// and many-to-many: one prediction may cover several gold concepts.
    pub fn evaluate_concepts(&self, predicted: &[String], gold: &[String]) -> ConceptMetrics {
        let considered = &predicted[..predicted.len().min(CONCEPT_TOP_K)];

        ConceptMetrics {
            matched_predicted: considered
                .iter()
                .filter(|p| gold.iter().any(|g| overlaps(p, g)))
                .count(),
            matched_gold: gold
                .iter()
                .filter(|g| considered.iter().any(|p| overlaps(p, g)))
                .count(),
            predicted: considered.len(),
            gold: gold.len(),
        }
    }
}

/// Case-insensitive containment in either direction
fn overlaps(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    !a.is_empty() && !b.is_empty() && (a.contains(&b) || b.contains(&a))
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Aggregate Metrics
// ============================================================================

/// Aggregate metrics for a batch of evaluated documents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateMetrics {
    /// Summed counts over all documents
    pub totals: TermMetrics,
    pub num_documents: usize,
    /// Sum of per-document F1 scores
    #[serde(default)]
    f1_sum: f32,
    /// Accepted terms per rule tag
    pub pattern_usage: BTreeMap<String, usize>,
    /// Summed concept counts over documents with gold concepts
    #[serde(default)]
    pub concepts: ConceptMetrics,
    #[serde(default)]
    pub concept_documents: usize,
    #[serde(default)]
    concept_f1_sum: f32,
}

impl AggregateMetrics {
    /// Add one document's metrics and the terms it produced
    pub fn add_document(&mut self, metrics: &TermMetrics, predicted: &[Term]) {
        self.totals.true_positives += metrics.true_positives;
        self.totals.false_positives += metrics.false_positives;
        self.totals.false_negatives += metrics.false_negatives;
        self.f1_sum += metrics.f1_score();
        self.num_documents += 1;

        for term in predicted {
            *self.pattern_usage.entry(term.rule.clone()).or_default() += 1;
        }
    }

    /// Add one document's concept metrics
    pub fn add_concepts(&mut self, metrics: &ConceptMetrics) {
        self.concepts.matched_predicted += metrics.matched_predicted;
        self.concepts.matched_gold += metrics.matched_gold;
        self.concepts.predicted += metrics.predicted;
        self.concepts.gold += metrics.gold;
        self.concept_f1_sum += metrics.f1_score();
        self.concept_documents += 1;
    }

    /// Mean of per-document concept F1 scores
    pub fn concept_macro_f1(&self) -> f32 {
        if self.concept_documents == 0 {
            0.0
        } else {
            self.concept_f1_sum / self.concept_documents as f32
        }
    }

    /// Mean of per-document F1 scores
    pub fn macro_f1(&self) -> f32 {
        if self.num_documents == 0 {
            0.0
        } else {
            self.f1_sum / self.num_documents as f32
        }
    }

    /// Rule tags ordered by usage, most used first
    pub fn top_patterns(&self) -> Vec<(&str, usize)> {
        let mut usage: Vec<(&str, usize)> = self
            .pattern_usage
            .iter()
            .map(|(tag, count)| (tag.as_str(), *count))
            .collect();
        usage.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        usage
    }

    /// Print a summary report
    pub fn report(&self) -> String {
        let mut out = format!(
            "=== Extraction Quality Report ===\n\n\
             Documents evaluated: {}\n\n\
             Term Extraction (micro):\n\
               Precision: {:.1}%\n\
               Recall:    {:.1}%\n\
               F1 Score:  {:.1}%\n\
               Gold: {} | Predicted: {} | TP: {} | FP: {} | FN: {}\n\n\
             Macro F1: {:.1}%\n",
            self.num_documents,
            self.totals.precision() * 100.0,
            self.totals.recall() * 100.0,
            self.totals.f1_score() * 100.0,
            self.totals.gold_total(),
            self.totals.predicted_total(),
            self.totals.true_positives,
            self.totals.false_positives,
            self.totals.false_negatives,
            self.macro_f1() * 100.0,
        );

        if self.concept_documents > 0 {
            out.push_str(&format!(
                "\nConcepts (top {}, relaxed):\n\
                   Precision: {:.1}%\n\
                   Recall:    {:.1}%\n\
                   Mean F1:   {:.1}%\n\
                   Gold: {} | Considered: {} | Notes: {}\n",
                CONCEPT_TOP_K,
                self.concepts.precision() * 100.0,
                self.concepts.recall() * 100.0,
                self.concept_macro_f1() * 100.0,
                self.concepts.gold,
                self.concepts.predicted,
                self.concept_documents,
            ));
        }

        if !self.pattern_usage.is_empty() {
            out.push_str("\nPattern usage:\n");
            for (tag, count) in self.top_patterns() {
                out.push_str(&format!("  {tag:<24} {count}\n"));
            }
        }

        out
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn predicted(names: &[&str]) -> Vec<Term> {
        names
            .iter()
            .map(|n| Term::new(*n, "some definition", "is_are"))
            .collect()
    }

    fn gold(names: &[&str]) -> Vec<GoldTerm> {
        names.iter().map(|n| GoldTerm::new(*n, "")).collect()
    }

    #[test]
    fn test_term_metrics_precision() {
        let metrics = TermMetrics {
            true_positives: 8,
            false_positives: 2,
            false_negatives: 0,
        };

        assert!((metrics.precision() - 0.8).abs() < 0.001);
    }

    #[test]
    fn test_term_metrics_recall() {
        let metrics = TermMetrics {
            true_positives: 8,
            false_positives: 0,
            false_negatives: 2,
        };

        assert!((metrics.recall() - 0.8).abs() < 0.001);
    }

    #[test]
    fn test_term_metrics_f1() {
        let metrics = TermMetrics {
            true_positives: 80,
            false_positives: 20,
            false_negatives: 20,
        };

        // P = 0.8, R = 0.8, F1 = 0.8
        assert!((metrics.f1_score() - 0.8).abs() < 0.001);
    }

    #[test]
    fn test_empty_metrics_are_zero() {
        let metrics = TermMetrics::default();
        assert_eq!(metrics.precision(), 0.0);
        assert_eq!(metrics.recall(), 0.0);
        assert_eq!(metrics.f1_score(), 0.0);
    }

    #[test]
    fn test_evaluate_terms_perfect() {
        let metrics = Evaluator::new().evaluate_terms(
            &predicted(&["Photosynthesis", "Osmosis"]),
            &gold(&["photosynthesis", "osmosis"]),
        );

        assert_eq!(metrics.true_positives, 2);
        assert_eq!(metrics.false_positives, 0);
        assert_eq!(metrics.false_negatives, 0);
        assert!((metrics.f1_score() - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_relaxed_matching_uses_containment() {
        let metrics = Evaluator::new().evaluate_terms(
            &predicted(&["The Bastille", "French Revolution"]),
            &gold(&["Bastille", "The French Revolution of 1789"]),
        );
        assert_eq!(metrics.true_positives, 2);
    }

    #[test]
    fn test_strict_matching_uses_identity() {
        let evaluator = Evaluator::new().strict();
        let metrics = evaluator.evaluate_terms(
            &predicted(&["The Bastille", "French Revolution"]),
            &gold(&["Bastille", "The French Revolution of 1789"]),
        );
        assert_eq!(metrics.true_positives, 1);
        assert_eq!(metrics.false_positives, 1);
        assert_eq!(metrics.false_negatives, 1);
    }

    #[test]
    fn test_matching_is_one_to_one() {
        let metrics = Evaluator::new().evaluate_terms(
            &predicted(&["Cell", "Cell Membrane"]),
            &gold(&["Cell Membrane"]),
        );
        assert_eq!(metrics.true_positives, 1);
        assert_eq!(metrics.false_positives, 1);
        assert_eq!(metrics.false_negatives, 0);
    }

    #[test]
    fn test_evaluate_terms_partial() {
        let metrics = Evaluator::new().evaluate_terms(
            &predicted(&["Osmosis", "Mitochondria"]),
            &gold(&["Osmosis", "Diffusion"]),
        );

        assert_eq!(metrics.true_positives, 1);
        assert_eq!(metrics.false_positives, 1);
        assert_eq!(metrics.false_negatives, 1);
        assert!((metrics.precision() - 0.5).abs() < 0.001);
        assert!((metrics.recall() - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_aggregate_micro_and_macro() {
        let mut aggregate = AggregateMetrics::default();
        let perfect = TermMetrics {
            true_positives: 1,
            false_positives: 0,
            false_negatives: 0,
        };
        let miss = TermMetrics {
            true_positives: 0,
            false_positives: 0,
            false_negatives: 3,
        };

        aggregate.add_document(&perfect, &predicted(&["Osmosis"]));
        aggregate.add_document(&miss, &[]);

        assert_eq!(aggregate.num_documents, 2);
        assert!((aggregate.macro_f1() - 0.5).abs() < 0.001);
        assert!((aggregate.totals.recall() - 0.25).abs() < 0.001);
        assert!((aggregate.totals.precision() - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_pattern_usage() {
        let mut aggregate = AggregateMetrics::default();
        let terms = vec![
            Term::new("Osmosis", "movement of water", "is_are"),
            Term::new("Chlorophyll", "a green pigment", "colon"),
            Term::new("Diffusion", "movement of particles", "is_are"),
        ];
        aggregate.add_document(&TermMetrics::default(), &terms);

        assert_eq!(aggregate.top_patterns(), vec![("is_are", 2), ("colon", 1)]);
    }

    #[test]
    fn test_aggregate_metrics_report() {
        let mut aggregate = AggregateMetrics::default();
        aggregate.add_document(
            &TermMetrics {
                true_positives: 8,
                false_positives: 1,
                false_negatives: 1,
            },
            &predicted(&["Osmosis"]),
        );

        let report = aggregate.report();
        assert!(report.contains("Documents evaluated: 1"));
        assert!(report.contains("Term Extraction (micro):"));
        assert!(report.contains("Macro F1:"));
        assert!(report.contains("is_are"));
        assert!(!report.contains("Concepts"));
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_evaluate_concepts_relaxed() {
        let metrics = Evaluator::new().evaluate_concepts(
            &strings(&["Revolution", "Bastille", "Europe"]),
            &strings(&["French Revolution", "the bastille", "Napoleon"]),
        );

        assert_eq!(metrics.matched_predicted, 2);
        assert_eq!(metrics.matched_gold, 2);
        assert!((metrics.precision() - 2.0 / 3.0).abs() < 0.001);
        assert!((metrics.recall() - 2.0 / 3.0).abs() < 0.001);
    }

    #[test]
    fn test_evaluate_concepts_only_top_k() {
        let mut predicted: Vec<String> = (0..CONCEPT_TOP_K).map(|i| format!("Filler{i}")).collect();
        predicted.push("Osmosis".to_string());

        let metrics = Evaluator::new().evaluate_concepts(&predicted, &strings(&["osmosis"]));
        assert_eq!(metrics.predicted, CONCEPT_TOP_K);
        assert_eq!(metrics.matched_predicted, 0);
        assert_eq!(metrics.f1_score(), 0.0);
    }

    #[test]
    fn test_concept_recall_never_exceeds_one() {
        let metrics = Evaluator::new()
            .evaluate_concepts(&strings(&["Cell", "Cell Membrane"]), &strings(&["cell membrane"]));

        assert_eq!(metrics.matched_predicted, 2);
        assert_eq!(metrics.matched_gold, 1);
        assert!((metrics.recall() - 1.0).abs() < 0.001);
        assert!((metrics.precision() - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_concepts_in_report() {
        let mut aggregate = AggregateMetrics::default();
        aggregate.add_document(&TermMetrics::default(), &[]);
        aggregate.add_concepts(&ConceptMetrics {
            matched_predicted: 2,
            matched_gold: 1,
            predicted: 4,
            gold: 2,
        });
        aggregate.add_concepts(&ConceptMetrics::default());

        assert_eq!(aggregate.concept_documents, 2);
        assert!((aggregate.concepts.precision() - 0.5).abs() < 0.001);
        assert!((aggregate.concept_macro_f1() - 0.25).abs() < 0.001);

        let report = aggregate.report();
        assert!(report.contains("Concepts (top 10, relaxed):"));
        assert!(report.contains("Mean F1:   25.0%"));
        assert!(report.contains("Notes: 2"));
    }
}
