// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The facet store: attribute postings and aggregation.
//!
//! Facets answer "what could I filter by, and what would I get": color →
//! {black: 12, red: 7}, size → {m: 9, l: 4}, price → slider bounds. The
//! store keeps presence-only posting sets per (attribute, value) — facets
//! need counts, not ranking — plus bucketed posting sets for price so range
//! filters can pre-narrow before touching per-document prices.
//!
//! Aggregation itself is driven by the planner, which applies the
//! self-exclude rule: counts for the color facet are computed against
//! candidates narrowed by every filter EXCEPT color. Without that rule a
//! shopper who picks "black" would see every other color vanish.
//!
//! # INVARIANTS
//!
//! - Posting sets only contain eligible documents; ingest reconciles them
//!   on every update, and removal strips a document from every set.
//! - All of this is derived state. `SearchCore::rebuild` reconstructs it
//!   from the document registry at any time.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use dashmap::DashMap;

use crate::config::SearchConfig;
use crate::normalize::normalize;
use crate::tokens::DocRegistry;
use crate::types::{DocId, IndexedDoc, PriceBounds};

/// Synthesized facet over `Document::in_stock`.
pub const FACET_AVAILABILITY: &str = "availability";

/// Attribute and price-bucket posting sets.
#[derive(Debug, Default)]
pub(crate) struct FacetIndex {
    /// attribute → value → documents carrying that value.
    attrs: DashMap<String, HashMap<String, HashSet<DocId>>>,
    /// price bucket index → documents priced within it.
    buckets: DashMap<usize, HashSet<DocId>>,
}

impl FacetIndex {
    pub fn new() -> Self {
        FacetIndex {
            attrs: DashMap::new(),
            buckets: DashMap::new(),
        }
    }

    /// Reconcile facet postings for a new document version.
    pub fn insert(&self, new: &IndexedDoc, old: Option<&IndexedDoc>, config: &SearchConfig) {
        let id = new.id();
        let new_pairs = new.facet_pairs();

        if let Some(old) = old {
            let fresh: HashSet<&(String, String)> = new_pairs.iter().collect();
            for pair in old.facet_pairs() {
                if !fresh.contains(&pair) {
                    self.drop_pair(&pair.0, &pair.1, id);
                }
            }
            let old_bucket = config.price_bucket(old.doc.price);
            let new_bucket = config.price_bucket(new.doc.price);
            if old_bucket != new_bucket {
                self.drop_bucket(old_bucket, id);
            }
        }

        for (attr, value) in &new_pairs {
            self.attrs
                .entry(attr.clone())
                .or_default()
                .entry(value.clone())
                .or_default()
                .insert(id);
        }
        self.buckets
            .entry(config.price_bucket(new.doc.price))
            .or_default()
            .insert(id);
    }

    /// Remove every facet posting of a document.
    pub fn remove(&self, doc: &IndexedDoc, config: &SearchConfig) {
        for (attr, value) in doc.facet_pairs() {
            self.drop_pair(&attr, &value, doc.id());
        }
        self.drop_bucket(config.price_bucket(doc.doc.price), doc.id());
    }

    fn drop_pair(&self, attr: &str, value: &str, id: DocId) {
        if let Some(mut values) = self.attrs.get_mut(attr) {
            if let Some(set) = values.get_mut(value) {
                set.remove(&id);
                if set.is_empty() {
                    values.remove(value);
                }
            }
        }
        self.attrs.remove_if(attr, |_, values| values.is_empty());
    }

    fn drop_bucket(&self, bucket: usize, id: DocId) {
        if let Some(mut set) = self.buckets.get_mut(&bucket) {
            set.remove(&id);
        }
        self.buckets.remove_if(&bucket, |_, set| set.is_empty());
    }

    /// Every attribute currently carrying at least one posting, sorted.
    pub fn attribute_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.attrs.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }

    /// Documents accepted by one attribute filter: the union over the
    /// accepted values' posting sets (OR within an attribute). Filter
    /// values arrive raw from the storefront and are normalized here so
    /// `Red` matches the indexed `red`.
    pub fn attribute_matches(
        &self,
        attribute: &str,
        accepted: &BTreeSet<String>,
    ) -> HashSet<DocId> {
        let mut matches = HashSet::new();
        let attr = normalize(attribute);
        if let Some(values) = self.attrs.get(&attr) {
            for value in accepted {
                if let Some(set) = values.get(&normalize(value)) {
                    matches.extend(set.iter().copied());
                }
            }
        }
        matches
    }

    /// Value counts for one attribute against a candidate set. Zero-count
    /// values are omitted; an empty candidate set yields an empty map.
    pub fn counts(&self, attribute: &str, candidates: &HashSet<DocId>) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        if candidates.is_empty() {
            return counts;
        }
        if let Some(values) = self.attrs.get(attribute) {
            for (value, set) in values.iter() {
                let count = if set.len() <= candidates.len() {
                    set.iter().filter(|id| candidates.contains(*id)).count()
                } else {
                    candidates.iter().filter(|id| set.contains(*id)).count()
                };
                if count > 0 {
                    counts.insert(value.clone(), count);
                }
            }
        }
        counts
    }

    /// Over-approximate candidates for a price range via bucket postings.
    /// Callers must still check each document's exact price — a bucket
    /// overlapping the range also contains prices outside it.
    pub fn price_candidates(&self, min: u64, max: u64, config: &SearchConfig) -> HashSet<DocId> {
        let lo = config.price_bucket(min);
        let hi = config.price_bucket(max);
        let mut out = HashSet::new();
        for bucket in lo..=hi {
            if let Some(set) = self.buckets.get(&bucket) {
                out.extend(set.iter().copied());
            }
        }
        out
    }
}

/// MIN/MAX price over a candidate set, for range-slider bounds. `None`
/// when the candidate set is empty.
pub(crate) fn price_bounds(
    registry: &DocRegistry,
    candidates: &HashSet<DocId>,
) -> Option<PriceBounds> {
    let mut bounds: Option<PriceBounds> = None;
    for id in candidates {
        if let Some(doc) = registry.get(id) {
            let price = doc.doc.price;
            bounds = Some(match bounds {
                None => PriceBounds { min: price, max: price },
                Some(b) => PriceBounds {
                    min: b.min.min(price),
                    max: b.max.max(price),
                },
            });
        }
    }
    bounds
}
