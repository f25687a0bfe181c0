// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Shopper preference profiles and the personalization boost.
//!
//! Profiles are owned by an external collaborator that recomputes them on
//! its own schedule from purchase and view events. The core reads one
//! profile per query (a JSON blob, tolerated missing or stale) and never
//! writes back.
//!
//! The boost is ADDITIVE and BOUNDED: each component contributes a fixed
//! share of the configured ceiling, and the total is clamped to it. A
//! profile nudges ordering between near-peers; it cannot promote a weak
//! textual match over a strong one. See the BOOST_BOUNDED invariant in
//! `scoring.rs`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::normalize::normalize;
use crate::types::IndexedDoc;

/// Attribute name carrying the brand of a product.
const ATTR_BRAND: &str = "brand";

/// Share of the ceiling granted per component.
const CATEGORY_SHARE: f64 = 0.5;
const BRAND_SHARE: f64 = 0.3;
const PATTERN_SHARE: f64 = 0.2;

/// A shopper's inferred preferences, as maintained by the profile
/// collaborator. Unknown fields in the blob are ignored; missing fields
/// default to empty, so a partial or older-schema profile still loads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreferenceProfile {
    /// Category ids, best-loved first.
    pub favorite_categories: Vec<String>,
    /// Brand names, best-loved first.
    pub favorite_brands: Vec<String>,
    /// Search term → frequency, recency-weighted by the collaborator.
    pub search_patterns: HashMap<String, u32>,
    /// Unix timestamp of the collaborator's last recomputation.
    pub last_calculated: u64,
}

impl PreferenceProfile {
    /// Parse the collaborator's JSON blob.
    pub fn from_json(blob: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(blob)
    }
}

/// Read access to the profile collaborator.
///
/// Implementations must not assume freshness and should return `None`
/// rather than blocking when a profile is unavailable — an unpersonalized
/// ranking beats a slow one.
pub trait ProfileStore: Send + Sync {
    fn profile(&self, user_id: &str) -> Option<PreferenceProfile>;
}

/// The null collaborator: nobody has a profile.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProfiles;

impl ProfileStore for NoProfiles {
    fn profile(&self, _user_id: &str) -> Option<PreferenceProfile> {
        None
    }
}

/// An in-memory profile table. Handy for tests and for callers that
/// snapshot profiles out of band.
#[derive(Debug, Default)]
pub struct StaticProfiles {
    profiles: HashMap<String, PreferenceProfile>,
}

impl StaticProfiles {
    pub fn new() -> Self {
        StaticProfiles::default()
    }

    pub fn set(&mut self, user_id: impl Into<String>, profile: PreferenceProfile) {
        self.profiles.insert(user_id.into(), profile);
    }
}

impl ProfileStore for StaticProfiles {
    fn profile(&self, user_id: &str) -> Option<PreferenceProfile> {
        self.profiles.get(user_id).cloned()
    }
}

/// Compute the additive boost for one candidate.
///
/// Components, each rank-discounted (`1 / (rank + 1)`) so a shopper's
/// first love counts more than their fifth:
/// - category: the document's category appears in `favorite_categories`
/// - brand: the document's `brand` attribute appears in `favorite_brands`
/// - patterns: fraction of the query's words the shopper has searched before
///
/// The sum is clamped to `ceiling`. No profile means no call — the planner
/// skips the stage entirely and boost is uniformly zero.
pub(crate) fn personal_boost(
    profile: &PreferenceProfile,
    doc: &IndexedDoc,
    query_words: &[String],
    ceiling: f64,
) -> f64 {
    let mut boost = 0.0;

    if let Some(rank) = profile
        .favorite_categories
        .iter()
        .position(|c| c == &doc.doc.category_id)
    {
        boost += ceiling * CATEGORY_SHARE / (rank as f64 + 1.0);
    }

    if let Some(rank) = brand_rank(profile, doc) {
        boost += ceiling * BRAND_SHARE / (rank as f64 + 1.0);
    }

    if !query_words.is_empty() && !profile.search_patterns.is_empty() {
        let known: Vec<String> = profile.search_patterns.keys().map(|k| normalize(k)).collect();
        let matched = query_words
            .iter()
            .filter(|w| known.iter().any(|k| k == *w))
            .count();
        boost += ceiling * PATTERN_SHARE * matched as f64 / query_words.len() as f64;
    }

    boost.min(ceiling)
}

fn brand_rank(profile: &PreferenceProfile, doc: &IndexedDoc) -> Option<usize> {
    let doc_brand = doc
        .doc
        .attributes
        .iter()
        .find(|(attr, _)| normalize(attr) == ATTR_BRAND)
        .map(|(_, value)| normalize(value))?;
    profile
        .favorite_brands
        .iter()
        .position(|b| normalize(b) == doc_brand)
}
