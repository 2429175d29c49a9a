//! Term aggregation
//!
//! Collects accepted candidates into the final term list. The first
//! candidate offered for an identity wins; later candidates with the same
//! identity are dropped regardless of their definition.

use std::collections::HashSet;

use smartnotes_core::Term;

use crate::normalize::Normalizer;
use crate::Candidate;

/// Deduplicating, order-preserving term collection
#[derive(Debug)]
pub struct TermSet<'a> {
    normalizer: &'a Normalizer,
    seen: HashSet<String>,
    terms: Vec<Term>,
}

impl<'a> TermSet<'a> {
    pub fn new(normalizer: &'a Normalizer) -> Self {
        Self {
            normalizer,
            seen: HashSet::new(),
            terms: Vec::new(),
        }
    }

    /// Offer a validated candidate. Returns false when its identity is taken.
    pub fn offer(&mut self, candidate: Candidate) -> bool {
        let term = candidate.into_term();
        let identity = self.normalizer.identity(&term.text);

        if !self.seen.insert(identity) {
            tracing::trace!(
                rule = %term.rule,
                term = %term.text,
                "identity already claimed"
            );
            return false;
        }

        self.terms.push(term);
        true
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Accepted terms in acceptance order
    pub fn into_terms(self) -> Vec<Term> {
        self.terms
    }
}
