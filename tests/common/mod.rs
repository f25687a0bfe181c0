// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Shared fixtures for integration tests.

#![allow(dead_code)]

use vitrine::{
    ApprovalStatus, DocId, DocStatus, Document, SearchConfig, SearchCore,
};

/// A minimal eligible product. Version defaults to the id so recency
/// tie-breaks are deterministic in fixtures.
pub fn product(id: u64, name: &str) -> Document {
    Document {
        id: DocId(id),
        name: name.to_string(),
        description: String::new(),
        category_id: "general".to_string(),
        attributes: vec![],
        price: 1_000,
        in_stock: true,
        status: DocStatus::Active,
        approval: ApprovalStatus::Approved,
        version: id,
    }
}

pub fn with_description(mut doc: Document, description: &str) -> Document {
    doc.description = description.to_string();
    doc
}

pub fn with_attr(mut doc: Document, attr: &str, value: &str) -> Document {
    doc.attributes.push((attr.to_string(), value.to_string()));
    doc
}

pub fn with_price(mut doc: Document, price: u64) -> Document {
    doc.price = price;
    doc
}

pub fn with_category(mut doc: Document, category: &str) -> Document {
    doc.category_id = category.to_string();
    doc
}

/// A ready core seeded with the given documents under the default config.
pub fn ready_core(docs: Vec<Document>) -> SearchCore {
    ready_core_with(SearchConfig::default(), docs)
}

/// A ready core seeded with the given documents under a custom config.
pub fn ready_core_with(config: SearchConfig, docs: Vec<Document>) -> SearchCore {
    let core = SearchCore::new(config);
    for doc in docs {
        core.upsert(doc).expect("fixture document indexes");
    }
    core.mark_ready();
    core
}

/// The two-sneaker catalog from the storefront acceptance scenario.
pub fn sneaker_catalog() -> SearchCore {
    ready_core(vec![
        with_price(with_attr(product(1, "Red Sneaker"), "color", "Red"), 5_000),
        with_price(with_attr(product(2, "Blue Sneaker"), "color", "Blue"), 6_000),
    ])
}
