// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Deadline handling: truncation is a flag, never an error, never a mix.

use std::time::Duration;

use super::common::{product, ready_core, with_attr};
use vitrine::QueryRequest;

#[test]
fn test_zero_deadline_returns_truncated_not_error() {
    let core = ready_core(vec![
        with_attr(product(1, "Red Sneaker"), "color", "Red"),
        with_attr(product(2, "Blue Sneaker"), "color", "Blue"),
    ]);

    let mut req = QueryRequest::new("sneaker");
    req.deadline = Some(Duration::ZERO);
    let res = core.query(&req).expect("timeout is not an error");

    assert!(res.truncated);
    // An expired budget before matching completed: empty, consistent output
    // — no hits from one stage next to facets from another.
    assert!(res.hits.is_empty());
    assert!(res.facets.is_empty());
    assert_eq!(res.price, None);
}

#[test]
fn test_generous_deadline_completes_normally() {
    let core = ready_core(vec![
        with_attr(product(1, "Red Sneaker"), "color", "Red"),
        with_attr(product(2, "Blue Sneaker"), "color", "Blue"),
    ]);

    let mut req = QueryRequest::new("sneaker");
    req.deadline = Some(Duration::from_secs(30));
    let res = core.query(&req).unwrap();

    assert!(!res.truncated);
    assert_eq!(res.hits.len(), 2);
    assert!(!res.facets.is_empty());
}

#[test]
fn test_no_deadline_never_truncates() {
    let core = ready_core(vec![product(1, "Sneaker")]);
    let res = core.query(&QueryRequest::new("sneaker")).unwrap();
    assert!(!res.truncated);
}
