// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Trigram fallback behavior: typo tolerance, thresholds, trigger rules.
//!
//! Stemming is disabled in most of these fixtures so the exact path
//! genuinely misses and the trigram path is what gets exercised.

use super::common::{product, ready_core_with};
use vitrine::{DocId, FuzzyMode, QueryRequest, SearchConfig, StemLanguage};

fn unstemmed() -> SearchConfig {
    SearchConfig {
        language: StemLanguage::Disabled,
        ..SearchConfig::default()
    }
}

#[test]
fn test_misspelled_query_finds_product() {
    let core = ready_core_with(
        unstemmed(),
        vec![product(1, "Smartphone X"), product(2, "Garden Hose")],
    );

    // Exact token match for "smartphon" returns nothing; the trigram
    // fallback must find the phone at or above the 0.3 threshold.
    let mut req = QueryRequest::new("smartphon");
    req.fuzzy = FuzzyMode::Never;
    let exact = core.query(&req).unwrap();
    assert!(exact.hits.is_empty(), "precondition: no exact match");

    let res = core.query(&QueryRequest::new("smartphon")).unwrap();
    assert_eq!(res.hits.len(), 1);
    assert_eq!(res.hits[0].id, DocId(1));
    assert!(res.hits[0].score >= 0.3, "similarity {} below threshold", res.hits[0].score);
}

#[test]
fn test_transposed_letters_find_product() {
    let core = ready_core_with(unstemmed(), vec![product(1, "Wireless Headphones")]);

    let res = core.query(&QueryRequest::new("wireles headphoens")).unwrap();
    assert_eq!(res.hits.len(), 1);
}

#[test]
fn test_fuzzy_never_mode_stays_exact() {
    let core = ready_core_with(unstemmed(), vec![product(1, "Smartphone X")]);

    let mut req = QueryRequest::new("smartphon");
    req.fuzzy = FuzzyMode::Never;
    let res = core.query(&req).unwrap();
    assert!(res.hits.is_empty());
    assert!(!res.truncated);
}

#[test]
fn test_fuzzy_skipped_when_exact_is_sufficient() {
    // With min_results_before_fuzzy = 1, a single exact hit suppresses the
    // fallback: the typo'd sibling product must not ride along.
    let config = SearchConfig {
        min_results_before_fuzzy: Some(1),
        ..unstemmed()
    };
    let core = ready_core_with(
        config,
        vec![product(1, "Lantern"), product(2, "Lanterns Deluxe")],
    );

    let res = core.query(&QueryRequest::new("lantern")).unwrap();
    assert_eq!(res.hits.len(), 1);
    assert_eq!(res.hits[0].id, DocId(1));
}

#[test]
fn test_fuzzy_always_merges_with_exact() {
    let core = ready_core_with(
        unstemmed(),
        vec![product(1, "Lantern"), product(2, "Lanterns Deluxe")],
    );

    let mut req = QueryRequest::new("lantern");
    req.fuzzy = FuzzyMode::Always;
    let res = core.query(&req).unwrap();

    let ids: Vec<DocId> = res.hits.iter().map(|h| h.id).collect();
    assert!(ids.contains(&DocId(1)));
    assert!(ids.contains(&DocId(2)));
    // The exact hit keeps its token score and outranks the fuzzy one.
    assert_eq!(res.hits[0].id, DocId(1));
}

#[test]
fn test_unrelated_products_stay_below_threshold() {
    let core = ready_core_with(
        unstemmed(),
        vec![product(1, "Smartphone X"), product(2, "Sandalwood Soap")],
    );

    let res = core.query(&QueryRequest::new("smartphon")).unwrap();
    let ids: Vec<DocId> = res.hits.iter().map(|h| h.id).collect();
    assert!(!ids.contains(&DocId(2)));
}

#[test]
fn test_short_query_uses_word_level_similarity() {
    // "stant" against "Microphone Stand Pro": whole-field similarity is
    // diluted far below 0.3 by all the shingles of the long name, but the
    // word-level variant compares against "stand" alone and clears its
    // stricter 0.4 bar.
    let core = ready_core_with(unstemmed(), vec![product(1, "Microphone Stand Pro")]);

    let res = core.query(&QueryRequest::new("stant")).unwrap();
    assert_eq!(res.hits.len(), 1);
    assert_eq!(res.hits[0].id, DocId(1));
}

#[test]
fn test_two_character_query_still_shingles() {
    let core = ready_core_with(unstemmed(), vec![product(1, "XL Hoodie")]);

    // Exact match exists for "xl"; the point is that nothing panics on a
    // sub-trigram query and boundary padding keeps fuzzy viable.
    let res = core.query(&QueryRequest::new("xl")).unwrap();
    assert_eq!(res.hits.len(), 1);
}
