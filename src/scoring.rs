// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Scoring constants and ordering for search results.
//!
//! # INVARIANTS (DO NOT VIOLATE)
//!
//! ## FIELD_WEIGHT_HIERARCHY
//! A name match outweighs a description match of equal term frequency:
//!
//! ```text
//! WEIGHT_NAME > WEIGHT_DESCRIPTION > 0
//! ```
//!
//! ## BOOST_BOUNDED
//! Personalization is additive and bounded. With the default ceiling, a
//! base-score gap of 90 or more can never be inverted by a preference
//! profile — a document scoring 100 stays above one scoring 10 for every
//! shopper. The const block below makes changing the default without
//! reading this comment a compile error.

use std::cmp::Ordering;

use crate::types::DocId;

/// Weight class A: the product name field.
pub const WEIGHT_NAME: f64 = 1.0;

/// Weight class B: the description field.
pub const WEIGHT_DESCRIPTION: f64 = 0.4;

/// Default ceiling on the total additive personalization boost.
pub const DEFAULT_BOOST_CEILING: f64 = 10.0;

// INVARIANT: FIELD_WEIGHT_HIERARCHY and BOOST_BOUNDED.
// The 100-vs-10 ordering property is stated against a gap of 90.
const _: () = {
    assert!(WEIGHT_NAME > WEIGHT_DESCRIPTION);
    assert!(WEIGHT_DESCRIPTION > 0.0);
    assert!(DEFAULT_BOOST_CEILING < 90.0);
};

/// Inverse document frequency with the +1 smoothing that keeps a term
/// present in every document from zeroing out entirely.
///
/// `idf = ln(1 + N / df)` where N is the count of eligible documents and
/// df the count containing the term. Computed from live index counts on
/// every query — never cached across rebuilds.
#[inline]
pub fn idf(total_docs: usize, doc_freq: usize) -> f64 {
    if doc_freq == 0 || total_docs == 0 {
        return 0.0;
    }
    (1.0 + total_docs as f64 / doc_freq as f64).ln()
}

/// Deterministic relevance ordering: score descending, then document
/// recency (version) descending, then document id ascending.
///
/// The id tie-break is what makes cursor pagination airtight: two hits
/// never compare equal.
#[inline]
pub fn compare_ranked(
    a: (f64, u64, DocId),
    b: (f64, u64, DocId),
) -> Ordering {
    b.0.partial_cmp(&a.0)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.1.cmp(&a.1))
        .then_with(|| a.2.cmp(&b.2))
}
