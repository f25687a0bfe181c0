// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The token index: exact/weighted term matching.
//!
//! Two structures cooperate here. The term map (`term → set of DocId`) is a
//! candidate generator and the source of live document frequencies for IDF.
//! The registry (`DocId → Arc<IndexedDoc>`, owned by the engine) holds the
//! per-document term statistics that scoring actually reads.
//!
//! That split is what makes per-document updates safe under concurrent
//! reads: replacing a document swaps one `Arc` in the registry, so a reader
//! scores against a single consistent version. The term map is only ever
//! consulted to find candidates; a stale candidate scores zero for terms
//! its current version no longer contains and simply drops out.
//!
//! # INVARIANTS
//!
//! 1. **FULL_REPLACEMENT**: indexing a document first reconciles every term
//!    set against the previous version — no stale partial postings survive
//!    an update.
//! 2. **LIVE_IDF**: document frequency is `terms[t].len()` at query time,
//!    never a cached statistic.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::warn;

use crate::config::{SearchConfig, TermMatching};
use crate::scoring::idf;
use crate::types::{DocId, IndexedDoc};

/// Registry of indexed projections, keyed by document id. Owned by the
/// engine's `IndexSet`; shared read-only with every index at query time.
pub(crate) type DocRegistry = DashMap<DocId, Arc<IndexedDoc>>;

/// Inverted term map over the eligible catalog.
#[derive(Debug, Default)]
pub(crate) struct TokenIndex {
    terms: DashMap<String, HashSet<DocId>>,
}

impl TokenIndex {
    pub fn new() -> Self {
        TokenIndex {
            terms: DashMap::new(),
        }
    }

    /// Reconcile the term map for a new (or updated) document version.
    ///
    /// `old` is the projection being replaced, if any; its terms that the
    /// new version dropped are cleaned out here.
    pub fn insert(&self, new: &IndexedDoc, old: Option<&IndexedDoc>) {
        let id = new.id();
        if let Some(old) = old {
            for term in old.terms.keys() {
                if !new.terms.contains_key(term) {
                    self.drop_posting(term, id);
                }
            }
        }
        for term in new.terms.keys() {
            self.terms.entry(term.clone()).or_default().insert(id);
        }
    }

    /// Remove every posting of a document.
    pub fn remove(&self, doc: &IndexedDoc) {
        for term in doc.terms.keys() {
            self.drop_posting(term, doc.id());
        }
    }

    fn drop_posting(&self, term: &str, id: DocId) {
        if let Some(mut set) = self.terms.get_mut(term) {
            set.remove(&id);
        }
        self.terms.remove_if(term, |_, set| set.is_empty());
    }

    /// Documents containing a term, right now.
    pub fn doc_freq(&self, term: &str) -> usize {
        self.terms.get(term).map_or(0, |set| set.len())
    }

    /// Number of distinct terms indexed.
    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// Score the catalog against the query terms.
    ///
    /// Ranked-OR: every document matching any term is returned, scored
    /// `Σ weight(field) × tf × idf(term)` over its matched terms.
    /// RequireAll keeps only documents matching every distinct term.
    /// The result is unordered; the planner sorts after filtering and
    /// personalization.
    pub fn query(
        &self,
        registry: &DocRegistry,
        query_terms: &[String],
        config: &SearchConfig,
    ) -> HashMap<DocId, f64> {
        let total_docs = registry.len();

        // Distinct terms: a repeated query word must not double its IDF.
        let distinct: Vec<&String> = {
            let mut seen = HashSet::new();
            query_terms.iter().filter(|t| seen.insert(t.as_str())).collect()
        };

        let mut scores: HashMap<DocId, f64> = HashMap::new();
        let mut matched_terms: HashMap<DocId, usize> = HashMap::new();

        for term in &distinct {
            let Some(candidates) = self.terms.get(term.as_str()) else {
                // Zero-match term: contributes nothing, excludes nothing
                // under ranked-OR. Under RequireAll it empties the result,
                // handled by the matched-term count below.
                continue;
            };
            let term_idf = idf(total_docs, candidates.len());

            for &id in candidates.iter() {
                let Some(doc) = registry.get(&id) else {
                    warn!(doc_id = id.get(), term = %term, "posting references unknown document, skipping");
                    continue;
                };
                // A stale candidate whose current version dropped the term.
                let Some(entry) = doc.terms.get(term.as_str()) else {
                    continue;
                };
                let weighted_tf = f64::from(entry.name_tf) * config.weight_name
                    + f64::from(entry.description_tf) * config.weight_description;
                *scores.entry(id).or_insert(0.0) += weighted_tf * term_idf;
                *matched_terms.entry(id).or_insert(0) += 1;
            }
        }

        if config.term_matching == TermMatching::RequireAll {
            let required = distinct.len();
            scores.retain(|id, _| matched_terms.get(id).copied().unwrap_or(0) == required);
        }

        scores
    }
}
