//! Note type classification
//!
//! Each type has a list of indicator phrases. A type scores one point per
//! indicator found anywhere in the lowercased note; the highest score wins,
//! earlier types win ties, and a note with no indicators is `General`.

use smartnotes_core::NoteType;

const INDICATORS: &[(NoteType, &[&str])] = &[
    (
        NoteType::Procedural,
        &["step", "first", "second", "then", "next", "finally", "how to"],
    ),
    (
        NoteType::Conceptual,
        &["define", "concept", "theory", "principle", "means", "refers to"],
    ),
    (
        NoteType::Factual,
        &["fact", "data", "statistic", "number", "date", "year"],
    ),
    (
        NoteType::Analytical,
        &["compare", "contrast", "analyze", "however", "whereas", "although"],
    ),
];

/// Classify a note by its indicator phrases
pub fn classify_note(text: &str) -> NoteType {
    let lowered = text.to_lowercase();
    let mut best = (NoteType::General, 0);

    for (note_type, indicators) in INDICATORS {
        let score = indicators.iter().filter(|i| lowered.contains(**i)).count();
        if score > best.1 {
            best = (*note_type, score);
        }
    }

    best.0
}

/// Whitespace-separated word count
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_procedural() {
        assert_eq!(
            classify_note("First, heat the water. Then add salt. Finally stir."),
            NoteType::Procedural
        );
    }

    #[test]
    fn test_conceptual() {
        assert_eq!(
            classify_note("A theory refers to a principle that means something general."),
            NoteType::Conceptual
        );
    }

    #[test]
    fn test_factual() {
        assert_eq!(
            classify_note("In the year 1789 the data showed a famine."),
            NoteType::Factual
        );
    }

    #[test]
    fn test_analytical() {
        assert_eq!(
            classify_note("Compare mitosis with meiosis, whereas one makes gametes."),
            NoteType::Analytical
        );
    }

    #[test]
    fn test_ties_go_to_earlier_type() {
        assert_eq!(classify_note("Each step rests on a theory."), NoteType::Procedural);
    }

    #[test]
    fn test_no_indicators_is_general() {
        assert_eq!(classify_note("Plain words here."), NoteType::General);
        assert_eq!(classify_note(""), NoteType::General);
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("Osmosis is  the\nmovement of water."), 6);
        assert_eq!(word_count("   "), 0);
    }
}
