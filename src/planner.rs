// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The query planner: one request through the whole pipeline.
//!
//! Stages run in a fixed order:
//!
//! ```text
//! ParseQuery → ExactMatch → (FuzzyMatch) → ApplyFilters
//!            → AggregateFacets → Personalize → Paginate → Done
//! ```
//!
//! FuzzyMatch only runs when exact matching found fewer candidates than
//! the configured minimum (or the caller forced it). Facets are aggregated
//! under the self-exclude rule: the candidate set for facet F ignores F's
//! own filter, so a shopper who picked "black" still sees the other colors
//! with honest counts.
//!
//! # Deadlines
//!
//! A request may carry a time budget. It is checked at stage boundaries
//! only, and expiry is not an error: the response is always the output of a
//! PREFIX of completed stages with `truncated = true`. Concretely — expiry
//! before filters completes returns no hits; after filters, hits without
//! facets; after facets, hits and facets without personalization. What is
//! never returned is a facet map computed from one candidate set next to a
//! ranking computed from another.
//!
//! # Cursor fallback
//!
//! Cursors name the (sort key, id) pair of the last hit served. When that
//! exact pair is still present the next page starts right after it. When it
//! is gone (the document changed or left the index between pages), the
//! planner falls back to an ordering comparison against the pair, which
//! keeps pages duplicate-free and gap-free for every surviving document.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Instant;

use tracing::{debug, warn};

use crate::engine::IndexSet;
use crate::error::SearchError;
use crate::facets::price_bounds;
use crate::normalize::{normalize, words};
use crate::profile::{personal_boost, ProfileStore};
use crate::scoring::compare_ranked;
use crate::types::{
    DocId, FuzzyMode, Hit, PageCursor, QueryRequest, QueryResponse, SortOrder,
};

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy)]
enum Stage {
    ParseQuery,
    ExactMatch,
    FuzzyMatch,
    ApplyFilters,
    AggregateFacets,
    Personalize,
    Paginate,
}

/// Per-request time budget, checked at stage boundaries.
struct Deadline(Option<Instant>);

impl Deadline {
    fn expired(&self) -> bool {
        self.0.is_some_and(|at| Instant::now() >= at)
    }
}

/// One candidate carried from sorting into pagination.
struct Ranked {
    id: DocId,
    score: f64,
    version: u64,
    price: u64,
}

impl Ranked {
    /// The cursor key under the active sort order.
    fn sort_key(&self, sort: SortOrder) -> f64 {
        match sort {
            SortOrder::Relevance => self.score,
            SortOrder::PriceAsc | SortOrder::PriceDesc => self.price as f64,
            SortOrder::Newest => self.version as f64,
        }
    }
}

/// Run one query against a snapshot. Entry point for `SearchCore::query`.
pub(crate) fn execute(
    set: &IndexSet,
    profiles: &dyn ProfileStore,
    req: &QueryRequest,
) -> Result<QueryResponse, SearchError> {
    validate(req)?;
    let config = &set.config;
    let page_size = req.page_size.min(config.max_page_size);
    let deadline = Deadline(req.deadline.map(|budget| Instant::now() + budget));

    // --- ParseQuery ---------------------------------------------------------
    let normalized = normalize(&req.text);
    let query_words: Vec<String> = words(&normalized).into_iter().map(str::to_string).collect();
    let query_terms: Vec<String> = query_words.iter().map(|w| set.analyzer.stem(w)).collect();
    debug!(stage = ?Stage::ParseQuery, terms = query_terms.len());
    if deadline.expired() {
        return Ok(truncated_empty());
    }

    // --- ExactMatch ---------------------------------------------------------
    let mut scores: HashMap<DocId, f64> = if query_terms.is_empty() {
        // Browse mode: the whole eligible set, unranked.
        set.docs.iter().map(|entry| (*entry.key(), 0.0)).collect()
    } else {
        set.tokens.query(&set.docs, &query_terms, config)
    };
    debug!(stage = ?Stage::ExactMatch, candidates = scores.len());
    if deadline.expired() {
        return Ok(truncated_empty());
    }

    // --- FuzzyMatch ---------------------------------------------------------
    let want_fuzzy = !query_terms.is_empty()
        && match req.fuzzy {
            FuzzyMode::Never => false,
            FuzzyMode::Always => true,
            FuzzyMode::Auto => scores.len() < config.fuzzy_trigger(page_size),
        };
    if want_fuzzy {
        let word_level =
            query_words.len() == 1 && normalized.chars().count() <= config.word_fuzzy_max_len;
        let fuzzy = set.trigrams.query(&set.docs, &normalized, word_level, config);
        debug!(stage = ?Stage::FuzzyMatch, word_level, candidates = fuzzy.len());
        for (id, similarity) in fuzzy {
            // Exact scores win for documents found both ways.
            scores.entry(id).or_insert(similarity);
        }
        if deadline.expired() {
            return Ok(truncated_empty());
        }
    }

    // --- ApplyFilters -------------------------------------------------------
    let text_matches: HashSet<DocId> = scores.keys().copied().collect();

    // One match set per attribute filter, reused by the self-exclude pass.
    let filter_sets: Vec<(String, HashSet<DocId>)> = req
        .filters
        .iter()
        .map(|(attr, accepted)| (normalize(attr), set.facets.attribute_matches(attr, accepted)))
        .collect();

    let price_set: Option<HashSet<DocId>> = req.price_range.map(|(min, max)| {
        set.facets
            .price_candidates(min, max, config)
            .into_iter()
            .filter(|id| {
                set.docs
                    .get(id)
                    .is_some_and(|doc| doc.doc.price >= min && doc.doc.price <= max)
            })
            .collect()
    });

    let narrowed = |exclude: Option<&str>| -> HashSet<DocId> {
        let mut out = text_matches.clone();
        for (attr, matches) in &filter_sets {
            if Some(attr.as_str()) != exclude {
                out.retain(|id| matches.contains(id));
            }
        }
        if exclude != Some("price") {
            if let Some(price) = &price_set {
                out.retain(|id| price.contains(id));
            }
        }
        out
    };

    let full = narrowed(None);
    debug!(stage = ?Stage::ApplyFilters, candidates = full.len());
    if deadline.expired() {
        let (hits, next_cursor, total) = paginate(set, &full, &scores, req, page_size);
        return Ok(QueryResponse {
            hits,
            total_eligible: total,
            truncated: true,
            next_cursor,
            ..QueryResponse::default()
        });
    }

    // --- AggregateFacets ----------------------------------------------------
    let requested: Vec<String> = if req.facets.is_empty() {
        set.facets.attribute_names()
    } else {
        req.facets.iter().map(|f| normalize(f)).collect()
    };
    let mut facet_counts: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
    for facet in requested {
        let candidates = narrowed(Some(facet.as_str()));
        facet_counts.insert(facet.clone(), set.facets.counts(&facet, &candidates));
    }
    let price = price_bounds(&set.docs, &narrowed(Some("price")));
    debug!(stage = ?Stage::AggregateFacets, facets = facet_counts.len());
    if deadline.expired() {
        let (hits, next_cursor, total) = paginate(set, &full, &scores, req, page_size);
        return Ok(QueryResponse {
            hits,
            facets: facet_counts,
            price,
            total_eligible: total,
            truncated: true,
            next_cursor,
        });
    }

    // --- Personalize --------------------------------------------------------
    if let Some(profile) = req.user_id.as_deref().and_then(|uid| profiles.profile(uid)) {
        for id in &full {
            if let Some(doc) = set.docs.get(id) {
                let boost =
                    personal_boost(&profile, &doc, &query_words, config.personal_boost_ceiling);
                if boost > 0.0 {
                    if let Some(score) = scores.get_mut(id) {
                        *score += boost;
                    }
                }
            }
        }
        debug!(stage = ?Stage::Personalize, "profile applied");
    }

    // --- Paginate -----------------------------------------------------------
    let (hits, next_cursor, total_eligible) = paginate(set, &full, &scores, req, page_size);
    debug!(stage = ?Stage::Paginate, page = hits.len(), total_eligible);

    Ok(QueryResponse {
        hits,
        facets: facet_counts,
        price,
        total_eligible,
        truncated: false,
        next_cursor,
    })
}

/// Sort the filtered candidates, apply the cursor, cut one page.
fn paginate(
    set: &IndexSet,
    candidates: &HashSet<DocId>,
    scores: &HashMap<DocId, f64>,
    req: &QueryRequest,
    page_size: usize,
) -> (Vec<Hit>, Option<PageCursor>, usize) {
    let mut ranked: Vec<Ranked> = Vec::with_capacity(candidates.len());
    for id in candidates {
        let Some(doc) = set.docs.get(id) else {
            warn!(doc_id = id.get(), "candidate missing from registry, excluded");
            continue;
        };
        ranked.push(Ranked {
            id: *id,
            score: scores.get(id).copied().unwrap_or(0.0),
            version: doc.version(),
            price: doc.doc.price,
        });
    }

    match req.sort {
        SortOrder::Relevance => ranked.sort_by(|a, b| {
            compare_ranked((a.score, a.version, a.id), (b.score, b.version, b.id))
        }),
        SortOrder::PriceAsc => {
            ranked.sort_by(|a, b| a.price.cmp(&b.price).then_with(|| a.id.cmp(&b.id)));
        }
        SortOrder::PriceDesc => {
            ranked.sort_by(|a, b| b.price.cmp(&a.price).then_with(|| a.id.cmp(&b.id)));
        }
        SortOrder::Newest => {
            ranked.sort_by(|a, b| b.version.cmp(&a.version).then_with(|| a.id.cmp(&b.id)));
        }
    }

    let total = ranked.len();
    let start = match req.cursor {
        None => 0,
        Some(cursor) => resume_position(&ranked, cursor, req.sort),
    };

    let end = (start + page_size).min(total);
    let hits: Vec<Hit> = ranked[start..end]
        .iter()
        .map(|r| Hit { id: r.id, score: r.score })
        .collect();
    let next_cursor = if end < total {
        ranked.get(end - 1).map(|last| PageCursor {
            key_bits: last.sort_key(req.sort).to_bits(),
            version: last.version,
            id: last.id,
        })
    } else {
        None
    };

    (hits, next_cursor, total)
}

/// Index of the first element strictly after the cursor.
///
/// Exact (key, id) match wins; otherwise fall back to comparing against
/// the cursor in the active sort order — the cursor carries enough of the
/// sort key (value, recency, id) to reproduce every tie-break, so a cursor
/// whose document vanished still lands between the right neighbors.
fn resume_position(ranked: &[Ranked], cursor: PageCursor, sort: SortOrder) -> usize {
    if let Some(at) = ranked
        .iter()
        .position(|r| r.id == cursor.id && r.sort_key(sort).to_bits() == cursor.key_bits)
    {
        return at + 1;
    }

    let cursor_key = f64::from_bits(cursor.key_bits);
    let descending = matches!(
        sort,
        SortOrder::Relevance | SortOrder::PriceDesc | SortOrder::Newest
    );
    ranked.partition_point(|r| {
        let key = r.sort_key(sort);
        if key != cursor_key {
            return if descending { key > cursor_key } else { key < cursor_key };
        }
        match sort {
            // Equal score: recency descending, then id ascending.
            SortOrder::Relevance => {
                r.version > cursor.version
                    || (r.version == cursor.version && r.id <= cursor.id)
            }
            // Equal price / equal version: id ascending.
            _ => r.id <= cursor.id,
        }
    })
}

fn truncated_empty() -> QueryResponse {
    QueryResponse {
        truncated: true,
        ..QueryResponse::default()
    }
}

/// Reject malformed requests before any index work.
fn validate(req: &QueryRequest) -> Result<(), SearchError> {
    if req.page_size == 0 {
        return Err(SearchError::InvalidQuery(
            "page size must be positive".to_string(),
        ));
    }
    for (attr, accepted) in &req.filters {
        if attr.trim().is_empty() {
            return Err(SearchError::InvalidQuery(
                "filter attribute must not be empty".to_string(),
            ));
        }
        if accepted.is_empty() {
            return Err(SearchError::InvalidQuery(format!(
                "filter '{attr}' has no accepted values"
            )));
        }
    }
    if let Some((min, max)) = req.price_range {
        if min > max {
            return Err(SearchError::InvalidQuery(format!(
                "price range {min}..{max} is inverted"
            )));
        }
    }
    Ok(())
}
