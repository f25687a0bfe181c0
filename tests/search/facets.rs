// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Facet aggregation: self-exclusion, price bounds, empty result shape.

use super::common::{product, ready_core, sneaker_catalog, with_attr, with_price};
use vitrine::{DocId, PriceBounds, QueryRequest};

#[test]
fn test_sneaker_scenario_end_to_end() {
    // Catalog: {"Red Sneaker", $50, color=Red}, {"Blue Sneaker", $60,
    // color=Blue}. Query "sneaker" with filter color=Red returns exactly
    // the red sneaker, and the color facet still reports Red:1, Blue:1.
    let core = sneaker_catalog();

    let req = QueryRequest::new("sneaker").with_filter("color", "Red");
    let res = core.query(&req).unwrap();

    assert_eq!(res.hits.len(), 1);
    assert_eq!(res.hits[0].id, DocId(1));
    assert_eq!(res.total_eligible, 1);

    let color = res.facets.get("color").expect("color facet present");
    assert_eq!(color.get("red"), Some(&1));
    assert_eq!(color.get("blue"), Some(&1));
}

#[test]
fn test_self_exclusion_is_per_facet() {
    // Two filters active. Each facet must ignore its own filter and honor
    // the other's.
    let core = ready_core(vec![
        with_attr(with_attr(product(1, "Tee"), "color", "Black"), "size", "M"),
        with_attr(with_attr(product(2, "Tee"), "color", "Black"), "size", "L"),
        with_attr(with_attr(product(3, "Tee"), "color", "White"), "size", "M"),
    ]);

    let req = QueryRequest::new("tee")
        .with_filter("color", "Black")
        .with_filter("size", "M");
    let res = core.query(&req).unwrap();

    assert_eq!(res.hits.len(), 1);
    assert_eq!(res.hits[0].id, DocId(1));

    // Color facet: size=M still applies → docs 1 and 3.
    let color = res.facets.get("color").unwrap();
    assert_eq!(color.get("black"), Some(&1));
    assert_eq!(color.get("white"), Some(&1));

    // Size facet: color=Black still applies → docs 1 and 2.
    let size = res.facets.get("size").unwrap();
    assert_eq!(size.get("m"), Some(&1));
    assert_eq!(size.get("l"), Some(&1));
}

#[test]
fn test_values_within_attribute_union() {
    let core = ready_core(vec![
        with_attr(product(1, "Tee"), "color", "Black"),
        with_attr(product(2, "Tee"), "color", "White"),
        with_attr(product(3, "Tee"), "color", "Green"),
    ]);

    let req = QueryRequest::new("tee")
        .with_filter("color", "Black")
        .with_filter("color", "White");
    let res = core.query(&req).unwrap();
    assert_eq!(res.total_eligible, 2);
}

#[test]
fn test_price_bounds_for_range_slider() {
    let core = sneaker_catalog();

    let res = core.query(&QueryRequest::new("sneaker")).unwrap();
    assert_eq!(res.price, Some(PriceBounds { min: 5_000, max: 6_000 }));
}

#[test]
fn test_price_filter_self_excluded_from_bounds() {
    // A price filter narrows hits but must not narrow the slider bounds,
    // or the slider could never be widened again.
    let core = sneaker_catalog();

    let req = QueryRequest::new("sneaker").with_price_range(5_500, 7_000);
    let res = core.query(&req).unwrap();

    assert_eq!(res.hits.len(), 1);
    assert_eq!(res.hits[0].id, DocId(2));
    assert_eq!(res.price, Some(PriceBounds { min: 5_000, max: 6_000 }));
}

#[test]
fn test_price_filter_respects_attribute_filters() {
    let core = sneaker_catalog();

    // color=Red restricts the bounds computation (price is the excluded
    // facet, color is not).
    let req = QueryRequest::new("sneaker").with_filter("color", "Red");
    let res = core.query(&req).unwrap();
    assert_eq!(res.price, Some(PriceBounds { min: 5_000, max: 5_000 }));
}

#[test]
fn test_availability_facet_is_synthesized() {
    let mut out = product(2, "Red Sneaker");
    out.in_stock = false;
    let core = ready_core(vec![product(1, "Red Sneaker"), out]);

    let res = core.query(&QueryRequest::new("sneaker")).unwrap();
    let availability = res.facets.get("availability").unwrap();
    assert_eq!(availability.get("in-stock"), Some(&1));
    assert_eq!(availability.get("out-of-stock"), Some(&1));

    let req = QueryRequest::new("sneaker").with_filter("availability", "in-stock");
    let res = core.query(&req).unwrap();
    assert_eq!(res.hits.len(), 1);
    assert_eq!(res.hits[0].id, DocId(1));
}

#[test]
fn test_no_results_yields_empty_facets_not_error() {
    let core = sneaker_catalog();

    let res = core.query(&QueryRequest::new("tractor")).unwrap();
    assert!(res.hits.is_empty());
    assert_eq!(res.total_eligible, 0);
    assert!(res.facets.values().all(|counts| counts.is_empty()));
    assert_eq!(res.price, None);
    assert!(!res.truncated);
}

#[test]
fn test_requested_facets_limit_aggregation() {
    let core = ready_core(vec![
        with_attr(with_attr(product(1, "Tee"), "color", "Black"), "size", "M"),
    ]);

    let mut req = QueryRequest::new("tee");
    req.facets = vec!["color".to_string()];
    let res = core.query(&req).unwrap();

    assert!(res.facets.contains_key("color"));
    assert!(!res.facets.contains_key("size"));
}

#[test]
fn test_filter_values_are_case_insensitive() {
    let core = ready_core(vec![with_attr(product(1, "Tee"), "color", "Black")]);

    let req = QueryRequest::new("tee").with_filter("Color", "BLACK");
    let res = core.query(&req).unwrap();
    assert_eq!(res.hits.len(), 1);
}

#[test]
fn test_filtered_price_range_excludes_out_of_range() {
    let core = ready_core(vec![
        with_price(product(1, "Mug"), 800),
        with_price(product(2, "Mug"), 2_000),
        with_price(product(3, "Mug"), 30_000),
    ]);

    let req = QueryRequest::new("mug").with_price_range(700, 2_500);
    let res = core.query(&req).unwrap();

    let ids: Vec<DocId> = res.hits.iter().map(|h| h.id).collect();
    assert_eq!(res.total_eligible, 2);
    assert!(ids.contains(&DocId(1)));
    assert!(ids.contains(&DocId(2)));
}
