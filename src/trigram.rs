// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The trigram index: typo-tolerant fallback matching.
//!
//! When the token index comes up short — "smartphon", "snekers", two words
//! run together — the query falls through to similarity over 3-character
//! shingles. Transpositions, missing letters, and concatenation errors all
//! leave most shingles intact, so Jaccard similarity over shingle sets
//! tolerates them without an edit-distance computation per candidate. The
//! shingle map prunes the candidate set first: only documents sharing at
//! least one shingle with the query are scored at all.
//!
//! Shingles are taken from the same normalized strings the token index
//! sees, but WITHOUT stemming — similarity should judge what the shopper
//! typed, not a stemmer's opinion of it.
//!
//! Strings shorter than 3 characters still produce shingles because both
//! sides are padded with boundary markers ("ab" → `␂␂a`, `␂ab`, `ab␂`).

use std::collections::{HashMap, HashSet};

use dashmap::DashMap;

use crate::config::SearchConfig;
use crate::normalize::words;
use crate::tokens::DocRegistry;
use crate::types::{DocId, IndexedDoc};

/// Sentinel padding character. Unit separator: never survives
/// normalization, so it cannot collide with document text.
const BOUNDARY: char = '\u{1F}';

/// Extract the boundary-padded 3-character shingle set of a normalized
/// string. Empty input yields the empty set.
pub(crate) fn shingles(normalized: &str) -> HashSet<String> {
    if normalized.is_empty() {
        return HashSet::new();
    }
    let padded: Vec<char> = std::iter::repeat(BOUNDARY)
        .take(2)
        .chain(normalized.chars())
        .chain(std::iter::once(BOUNDARY))
        .collect();
    padded.windows(3).map(|w| w.iter().collect()).collect()
}

/// Jaccard similarity: |A ∩ B| / |A ∪ B|. Zero when either side is empty.
pub(crate) fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let shared = small.iter().filter(|s| large.contains(*s)).count();
    let union = a.len() + b.len() - shared;
    shared as f64 / union as f64
}

/// Inverted shingle map over the eligible catalog.
#[derive(Debug, Default)]
pub(crate) struct TrigramIndex {
    shingles: DashMap<String, HashSet<DocId>>,
}

impl TrigramIndex {
    pub fn new() -> Self {
        TrigramIndex {
            shingles: DashMap::new(),
        }
    }

    /// Reconcile shingle entries for a new document version.
    pub fn insert(&self, new: &IndexedDoc, old: Option<&IndexedDoc>) {
        let id = new.id();
        if let Some(old) = old {
            let fresh: HashSet<&String> = new.all_shingles().collect();
            for shingle in old.all_shingles() {
                if !fresh.contains(shingle) {
                    self.drop_entry(shingle, id);
                }
            }
        }
        for shingle in new.all_shingles() {
            self.shingles.entry(shingle.clone()).or_default().insert(id);
        }
    }

    /// Remove every shingle entry of a document.
    pub fn remove(&self, doc: &IndexedDoc) {
        for shingle in doc.all_shingles() {
            self.drop_entry(shingle, doc.id());
        }
    }

    fn drop_entry(&self, shingle: &str, id: DocId) {
        if let Some(mut set) = self.shingles.get_mut(shingle) {
            set.remove(&id);
        }
        self.shingles.remove_if(shingle, |_, set| set.is_empty());
    }

    /// Number of distinct shingles indexed.
    pub fn shingle_count(&self) -> usize {
        self.shingles.len()
    }

    /// Fuzzy-match the normalized query string against the catalog.
    ///
    /// `word_level` selects the stricter variant for short single-word
    /// queries: the query is compared against each individual word of a
    /// field instead of the whole field string, under
    /// `word_fuzzy_threshold`. Whole-field similarity is noisy there — a
    /// three-letter query barely overlaps a forty-character name even when
    /// it nails one word of it.
    ///
    /// Returns weighted similarities; candidates below the applicable
    /// threshold are discarded.
    pub fn query(
        &self,
        registry: &DocRegistry,
        normalized_query: &str,
        word_level: bool,
        config: &SearchConfig,
    ) -> HashMap<DocId, f64> {
        let query_shingles = shingles(normalized_query);
        if query_shingles.is_empty() {
            return HashMap::new();
        }
        let threshold = if word_level {
            config.word_fuzzy_threshold
        } else {
            config.fuzzy_threshold
        };

        // Candidate generation: any shared shingle.
        let mut candidates: HashSet<DocId> = HashSet::new();
        for shingle in &query_shingles {
            if let Some(ids) = self.shingles.get(shingle) {
                candidates.extend(ids.iter());
            }
        }

        let mut scores: HashMap<DocId, f64> = HashMap::new();
        for id in candidates {
            let Some(doc) = registry.get(&id) else {
                continue;
            };
            let name_sim = if word_level {
                best_word_similarity(&query_shingles, &doc.name_norm)
            } else {
                jaccard(&query_shingles, &doc.name_shingles)
            };
            let desc_sim = if word_level {
                best_word_similarity(&query_shingles, &doc.description_norm)
            } else {
                jaccard(&query_shingles, &doc.description_shingles)
            };

            let score = (name_sim * config.weight_name).max(desc_sim * config.weight_description);
            if score >= threshold {
                scores.insert(id, score);
            }
        }
        scores
    }
}

/// Best similarity between the query and any single word of a field.
fn best_word_similarity(query_shingles: &HashSet<String>, field_norm: &str) -> f64 {
    words(field_norm)
        .into_iter()
        .map(|word| jaccard(query_shingles, &shingles(word)))
        .fold(0.0, f64::max)
}
