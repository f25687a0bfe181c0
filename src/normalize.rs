// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Text normalization and term analysis.
//!
//! Every string that enters an index — and every query that probes one —
//! passes through the same pipeline, because an index lookup is only as
//! good as the agreement between the two sides:
//!
//! 1. NFD normalize (decompose characters into base + combining marks)
//! 2. Filter out combining marks (category Mn = Mark, Nonspacing)
//! 3. Lowercase
//! 4. Collapse whitespace
//! 5. (terms only) split on non-alphanumeric boundaries and stem
//!
//! Steps 1-4 are [`normalize`]; the trigram index shingles its output
//! directly so fuzzy matching stays independent of stemming. Step 5 lives
//! in [`Analyzer`], whose stemmer is selected by `SearchConfig::language`.

use rust_stemmers::Stemmer;
use unicode_normalization::UnicodeNormalization;

use crate::config::StemLanguage;

/// Normalize a string for search: lowercase, strip diacritics, and collapse
/// whitespace.
///
/// This enables matching between ASCII and accented versions:
/// - "Café Crème" → "cafe creme"
/// - "naïve" → "naive"
/// - "Über" → "uber"
pub fn normalize(value: &str) -> String {
    value
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Check if a character is a combining mark (diacritic).
///
/// Combining marks have Unicode category "Mn" (Mark, Nonspacing).
/// Examples: ́ (acute), ̄ (macron), ̣ (dot below)
fn is_combining_mark(c: char) -> bool {
    matches!(c,
        '\u{0300}'..='\u{036F}' |  // Combining Diacritical Marks
        '\u{1DC0}'..='\u{1DFF}' |  // Combining Diacritical Marks Supplement
        '\u{20D0}'..='\u{20FF}' |  // Combining Diacritical Marks for Symbols
        '\u{FE20}'..='\u{FE2F}'    // Combining Half Marks
    )
}

/// Word boundary detection: checks if character is a word separator.
fn is_word_boundary(c: char) -> bool {
    !c.is_alphanumeric()
}

/// Split an already-normalized string into words.
pub(crate) fn words(normalized: &str) -> Vec<&str> {
    normalized
        .split(is_word_boundary)
        .filter(|w| !w.is_empty())
        .collect()
}

/// Normalizer + stemmer pair shared by indexing and query parsing.
///
/// The stemmer is stateless, so one `Analyzer` serves concurrent readers.
/// Swapping the language means the index and the analyzer would disagree on
/// term forms — that is why a language change goes through
/// `SearchCore::rebuild` rather than a setter.
pub struct Analyzer {
    stemmer: Option<Stemmer>,
}

impl Analyzer {
    pub fn new(language: StemLanguage) -> Self {
        Analyzer {
            stemmer: language.algorithm().map(Stemmer::create),
        }
    }

    /// Full pipeline: normalize, split, stem. Order-preserving, duplicates
    /// kept (term frequency is the caller's business).
    pub fn terms(&self, text: &str) -> Vec<String> {
        let normalized = normalize(text);
        words(&normalized)
            .into_iter()
            .map(|word| self.stem(word))
            .collect()
    }

    /// Stem a single already-normalized word.
    pub fn stem(&self, word: &str) -> String {
        match &self.stemmer {
            Some(stemmer) => stemmer.stem(word).to_string(),
            None => word.to_string(),
        }
    }
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("stemming", &self.stemmer.is_some())
            .finish()
    }
}
