// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! In-memory product search for a marketplace storefront.
//!
//! This crate is the discovery core only: free text (possibly misspelled)
//! plus active filters in, a ranked and faceted page out, nudged by the
//! shopper's preference profile. The storefront around it — rendering,
//! checkout, admin, webhooks — feeds it catalog notifications and calls
//! [`SearchCore::query`]; nothing else crosses the seam.
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────────┐
//!   upsert/delete │  engine.rs   │ query
//!  ──────────────▶│ (SearchCore, │◀──────────────
//!                 │   IndexSet)  │
//!                 └──────┬───────┘
//!                        │ snapshot (Arc)
//!                 ┌──────▼───────┐
//!                 │  planner.rs  │ parse → exact → fuzzy → filter
//!                 └──┬───┬───┬───┘        → facets → boost → page
//!        ┌───────────┘   │   └───────────┐
//! ┌──────▼──────┐ ┌──────▼──────┐ ┌──────▼──────┐
//! │  tokens.rs  │ │ trigram.rs  │ │  facets.rs  │
//! │ (tf·idf,    │ │ (shingles,  │ │ (postings,  │
//! │  weighted)  │ │  Jaccard)   │ │ self-excl.) │
//! └─────────────┘ └─────────────┘ └─────────────┘
//! ```
//!
//! All three indexes are candidate generators over one shared registry of
//! immutable per-document projections; scoring reads the projection, so a
//! concurrent update is seen whole or not at all. `normalize.rs` feeds the
//! same normalization to both sides of every lookup, `profile.rs` supplies
//! the bounded personalization boost, and `scoring.rs` pins down the
//! constants the ranking invariants depend on.
//!
//! # Usage
//!
//! ```
//! use vitrine::{ApprovalStatus, DocStatus, Document, DocId, QueryRequest, SearchConfig, SearchCore};
//!
//! let core = SearchCore::new(SearchConfig::default());
//! core.upsert(Document {
//!     id: DocId(1),
//!     name: "Red Sneaker".to_string(),
//!     description: "Lightweight trail sneaker".to_string(),
//!     category_id: "shoes".to_string(),
//!     attributes: vec![("color".to_string(), "Red".to_string())],
//!     price: 5_000,
//!     in_stock: true,
//!     status: DocStatus::Active,
//!     approval: ApprovalStatus::Approved,
//!     version: 1,
//! }).unwrap();
//! core.mark_ready();
//!
//! let page = core.query(&QueryRequest::new("sneaker")).unwrap();
//! assert_eq!(page.hits[0].id, DocId(1));
//! ```

// Module declarations
mod config;
mod engine;
mod error;
mod facets;
mod normalize;
mod planner;
mod profile;
mod scoring;
mod tokens;
mod trigram;
mod types;

// Re-exports for public API
pub use config::{SearchConfig, StemLanguage, TermMatching};
pub use engine::SearchCore;
pub use error::{Result, SearchError};
pub use facets::FACET_AVAILABILITY;
pub use normalize::{normalize, Analyzer};
pub use profile::{NoProfiles, PreferenceProfile, ProfileStore, StaticProfiles};
pub use scoring::{idf, DEFAULT_BOOST_CEILING, WEIGHT_DESCRIPTION, WEIGHT_NAME};
pub use types::{
    ApprovalStatus, DocId, DocStatus, Document, FuzzyMode, Hit, IngestOutcome, PageCursor,
    PriceBounds, QueryRequest, QueryResponse, SortOrder,
};
