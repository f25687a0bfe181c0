// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Cursor pagination: no duplicates, no gaps, stable under ties and churn.

use std::collections::HashSet;

use super::common::{product, ready_core};
use vitrine::{DocId, Document, QueryRequest, SortOrder};

fn catalog(n: u64) -> Vec<Document> {
    (1..=n).map(|i| product(i, "Gadget")).collect()
}

/// Walk every page for a request, returning ids in served order.
fn collect_all_pages(core: &vitrine::SearchCore, base: &QueryRequest) -> Vec<DocId> {
    let mut out = Vec::new();
    let mut req = base.clone();
    loop {
        let res = core.query(&req).unwrap();
        out.extend(res.hits.iter().map(|h| h.id));
        match res.next_cursor {
            Some(cursor) => req = base.clone().after(cursor),
            None => break,
        }
    }
    out
}

#[test]
fn test_pages_partition_the_result_set() {
    let core = ready_core(catalog(47));
    let base = QueryRequest::new("gadget").with_page_size(10);

    let served = collect_all_pages(&core, &base);

    assert_eq!(served.len(), 47, "no gaps");
    let unique: HashSet<DocId> = served.iter().copied().collect();
    assert_eq!(unique.len(), 47, "no duplicates");
}

#[test]
fn test_page_two_disjoint_from_page_one() {
    let core = ready_core(catalog(30));
    let base = QueryRequest::new("gadget").with_page_size(10);

    let page1 = core.query(&base).unwrap();
    assert_eq!(page1.hits.len(), 10);
    let cursor = page1.next_cursor.expect("more pages");

    let page2 = core.query(&base.clone().after(cursor)).unwrap();
    assert_eq!(page2.hits.len(), 10);

    let ids1: HashSet<DocId> = page1.hits.iter().map(|h| h.id).collect();
    for hit in &page2.hits {
        assert!(!ids1.contains(&hit.id), "{} served twice", hit.id);
    }
}

#[test]
fn test_cursor_stable_across_identical_scores() {
    // Every document scores identically; only (version, id) order them.
    // The cursor must still partition cleanly.
    let mut docs = catalog(25);
    for doc in &mut docs {
        doc.version = 1; // force full ties
    }
    let core = ready_core(docs);
    let base = QueryRequest::new("gadget").with_page_size(7);

    let served = collect_all_pages(&core, &base);
    assert_eq!(served.len(), 25);
    let unique: HashSet<DocId> = served.iter().copied().collect();
    assert_eq!(unique.len(), 25);
}

#[test]
fn test_cursor_survives_document_removal_between_pages() {
    let core = ready_core(catalog(20));
    let base = QueryRequest::new("gadget").with_page_size(5);

    let page1 = core.query(&base).unwrap();
    let cursor = page1.next_cursor.unwrap();
    let served1: HashSet<DocId> = page1.hits.iter().map(|h| h.id).collect();

    // The cursor document itself leaves the catalog between requests.
    let last = page1.hits.last().unwrap().id;
    core.delete(last, 1_000);

    let page2 = core.query(&base.clone().after(cursor)).unwrap();
    for hit in &page2.hits {
        assert!(!served1.contains(&hit.id), "{} duplicated after churn", hit.id);
    }
    assert_eq!(page2.hits.len(), 5);
}

#[test]
fn test_last_page_has_no_cursor() {
    let core = ready_core(catalog(8));
    let base = QueryRequest::new("gadget").with_page_size(10);

    let res = core.query(&base).unwrap();
    assert_eq!(res.hits.len(), 8);
    assert!(res.next_cursor.is_none());
}

#[test]
fn test_exact_page_boundary() {
    let core = ready_core(catalog(20));
    let base = QueryRequest::new("gadget").with_page_size(10);

    let page1 = core.query(&base).unwrap();
    let cursor = page1.next_cursor.expect("second page exists");
    let page2 = core.query(&base.clone().after(cursor)).unwrap();

    assert_eq!(page2.hits.len(), 10);
    assert!(page2.next_cursor.is_none(), "nothing after an exact fit");
}

#[test]
fn test_page_size_clamped_to_config_max() {
    let core = ready_core(catalog(150));
    let res = core
        .query(&QueryRequest::new("gadget").with_page_size(10_000))
        .unwrap();
    assert_eq!(res.hits.len(), 100); // default max_page_size
}

#[test]
fn test_cursor_pagination_under_price_sort() {
    let mut docs = catalog(12);
    for (i, doc) in docs.iter_mut().enumerate() {
        doc.price = 500 * (i as u64 % 4 + 1); // plenty of price ties
    }
    let core = ready_core(docs);
    let mut base = QueryRequest::new("gadget").with_page_size(5);
    base.sort = SortOrder::PriceAsc;

    let served = collect_all_pages(&core, &base);
    assert_eq!(served.len(), 12);
    let unique: HashSet<DocId> = served.iter().copied().collect();
    assert_eq!(unique.len(), 12);
}
