// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Tuning knobs for the search core.
//!
//! Everything a storefront operator might reasonably want to tune lives in
//! [`SearchConfig`]: field weights, fuzzy thresholds, the personalization
//! ceiling, stemming language, and price bucketing. The defaults are the
//! values the rest of this crate's scoring invariants are stated against —
//! see `scoring.rs` before changing `weight_name` or `personal_boost_ceiling`.

use serde::{Deserialize, Serialize};

/// Catalog language, selecting the Snowball stemmer applied to terms.
///
/// `Disabled` skips stemming entirely (terms are still normalized and
/// diacritic-stripped). Changing the language requires a wholesale rebuild
/// via `SearchCore::rebuild` — stemmed postings from two languages cannot
/// coexist in one index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StemLanguage {
    #[default]
    English,
    Dutch,
    French,
    German,
    Italian,
    Portuguese,
    Spanish,
    Swedish,
    /// Normalization only, no stemming.
    Disabled,
}

impl StemLanguage {
    pub(crate) fn algorithm(self) -> Option<rust_stemmers::Algorithm> {
        use rust_stemmers::Algorithm;
        match self {
            StemLanguage::English => Some(Algorithm::English),
            StemLanguage::Dutch => Some(Algorithm::Dutch),
            StemLanguage::French => Some(Algorithm::French),
            StemLanguage::German => Some(Algorithm::German),
            StemLanguage::Italian => Some(Algorithm::Italian),
            StemLanguage::Portuguese => Some(Algorithm::Portuguese),
            StemLanguage::Spanish => Some(Algorithm::Spanish),
            StemLanguage::Swedish => Some(Algorithm::Swedish),
            StemLanguage::Disabled => None,
        }
    }
}

/// How multiple query terms combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum TermMatching {
    /// Any term may match; matching more terms raises the score. The
    /// tolerant default — a query with one misspelled word still returns
    /// the documents the other words found.
    #[default]
    RankedOr,
    /// Boolean AND: only documents matching every query term are returned.
    RequireAll,
}

/// All tuning knobs, with defaults suitable for a catalog in the low millions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchConfig {
    /// Weight class A: the product name field.
    pub weight_name: f64,
    /// Weight class B: the description field.
    pub weight_description: f64,
    /// Minimum whole-field trigram similarity for a fuzzy candidate to survive.
    pub fuzzy_threshold: f64,
    /// Stricter threshold for the word-level fuzzy variant.
    pub word_fuzzy_threshold: f64,
    /// Single-word queries of at most this many characters use the
    /// word-level fuzzy variant (whole-field similarity is noisy for them).
    pub word_fuzzy_max_len: usize,
    /// Fall back to fuzzy matching when exact matching finds fewer
    /// candidates than this. `None` means "the requested page size".
    pub min_results_before_fuzzy: Option<usize>,
    /// Upper bound on the total additive personalization boost per document.
    pub personal_boost_ceiling: f64,
    /// AND vs ranked-OR across query terms.
    pub term_matching: TermMatching,
    /// Stemming language for term normalization.
    pub language: StemLanguage,
    /// Ascending upper bounds (exclusive, minor units) of the price buckets
    /// maintained in the facet store. Prices at or above the last bound
    /// share a final open-ended bucket.
    pub price_buckets: Vec<u64>,
    /// Hard cap on `page_size`; larger requests are clamped.
    pub max_page_size: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            weight_name: crate::scoring::WEIGHT_NAME,
            weight_description: crate::scoring::WEIGHT_DESCRIPTION,
            fuzzy_threshold: 0.3,
            word_fuzzy_threshold: 0.4,
            word_fuzzy_max_len: 8,
            min_results_before_fuzzy: None,
            personal_boost_ceiling: crate::scoring::DEFAULT_BOOST_CEILING,
            term_matching: TermMatching::default(),
            language: StemLanguage::default(),
            // $10 / $25 / $50 / $100 / $250 / $500 steps, in cents.
            price_buckets: vec![1_000, 2_500, 5_000, 10_000, 25_000, 50_000],
            max_page_size: 100,
        }
    }
}

impl SearchConfig {
    /// Effective fuzzy-fallback threshold for a request with `page_size`.
    pub(crate) fn fuzzy_trigger(&self, page_size: usize) -> usize {
        self.min_results_before_fuzzy.unwrap_or(page_size)
    }

    /// Bucket index for a price, per the configured bounds.
    pub(crate) fn price_bucket(&self, price: u64) -> usize {
        self.price_buckets
            .iter()
            .position(|&bound| price < bound)
            .unwrap_or(self.price_buckets.len())
    }
}
