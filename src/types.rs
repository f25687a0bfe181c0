// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The building blocks of the product search core.
//!
//! These types define the seam between the storefront and the search core:
//! what the catalog hands us on ingest ([`Document`]), what a caller sends
//! per query ([`QueryRequest`]), and what comes back ([`QueryResponse`]).
//!
//! # Invariants (the stuff that breaks if you ignore it)
//!
//! - **Eligibility**: a document is searchable iff `status == Active` and
//!   `approval == Approved`. Ineligible documents are ABSENT from every
//!   index structure — they are removed on ingest, never filtered at query
//!   time. Anything else leaks drafts into storefront search.
//!
//! - **IndexedDoc**: the indexed projection of one document is immutable
//!   once built. Updates build a fresh projection and swap the `Arc` in a
//!   single registry insert, so an in-flight query scores a document
//!   against exactly one version of it — old or new, never a mix.
//!
//! - **Cursor**: pagination is keyed on the (score bits, document id) pair,
//!   not an integer offset. Offsets skip or duplicate under score ties and
//!   concurrent ingest; the pair does not.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::normalize::{normalize, Analyzer};
use crate::trigram::shingles;

// =============================================================================
// NEWTYPES
// =============================================================================

/// Type-safe catalog document identifier.
///
/// Prevents accidentally passing a term frequency or a version where a
/// document id is expected.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[repr(transparent)]
pub struct DocId(pub u64);

impl DocId {
    /// Get the underlying catalog key.
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for DocId {
    fn from(id: u64) -> Self {
        DocId(id)
    }
}

impl std::fmt::Display for DocId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// CATALOG DOCUMENT
// =============================================================================

/// Catalog lifecycle state. Only `Active` documents are searchable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocStatus {
    Active,
    Draft,
    Archived,
}

/// Marketplace moderation state. Only `Approved` documents are searchable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

/// One catalog item's searchable projection, as supplied by the catalog
/// store on every create/update notification.
///
/// `version` is the catalog's write timestamp: ingest is last-write-wins on
/// it, and ranking uses it as the recency tie-break.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocId,
    /// Weight class A.
    pub name: String,
    /// Weight class B.
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category_id: String,
    /// Ordered (name, value) pairs, e.g. `("color", "Black")`, `("size", "M")`.
    #[serde(default)]
    pub attributes: Vec<(String, String)>,
    /// Minor units (cents).
    pub price: u64,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
    pub status: DocStatus,
    pub approval: ApprovalStatus,
    pub version: u64,
}

fn default_in_stock() -> bool {
    true
}

impl Document {
    /// Searchable iff active AND approved. Everything else is removed from
    /// the indexes on ingest.
    #[inline]
    pub fn is_eligible(&self) -> bool {
        self.status == DocStatus::Active && self.approval == ApprovalStatus::Approved
    }

    /// Ingest validation. A document that fails here is not indexed at all.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.name.trim().is_empty() {
            return Err(SearchError::InvalidDocument {
                id: self.id,
                reason: "name must not be empty".to_string(),
            });
        }
        for (attr, _) in &self.attributes {
            if attr.trim().is_empty() {
                return Err(SearchError::InvalidDocument {
                    id: self.id,
                    reason: "attribute name must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }
}

// =============================================================================
// INDEXED PROJECTION
// =============================================================================

/// Term statistics for one document, split by field so weights can be
/// applied from the live config at query time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct TermEntry {
    pub name_tf: u32,
    pub description_tf: u32,
}

/// The immutable indexed form of one eligible document.
///
/// Everything a query needs to score this document lives here: stemmed term
/// frequencies per field, trigram shingle sets per field, and the source
/// document for attributes, price, and recency. Inverted structures (term →
/// doc set, shingle → doc set, facet value → doc set) are candidate
/// generators only; scoring always reads this one consistent snapshot.
#[derive(Debug)]
pub(crate) struct IndexedDoc {
    pub doc: Document,
    /// Normalized, stemmed term → per-field frequency.
    pub terms: HashMap<String, TermEntry>,
    /// Normalized (unstemmed) field strings — word-level fuzzy scoring
    /// re-shingles individual words from these.
    pub name_norm: String,
    pub description_norm: String,
    /// Boundary-padded trigram sets of the normalized field strings.
    pub name_shingles: HashSet<String>,
    pub description_shingles: HashSet<String>,
}

impl IndexedDoc {
    /// Build the projection. Assumes `doc.validate()` passed.
    pub fn project(doc: Document, analyzer: &Analyzer) -> Self {
        let mut terms: HashMap<String, TermEntry> = HashMap::new();
        for term in analyzer.terms(&doc.name) {
            terms.entry(term).or_default().name_tf += 1;
        }
        for term in analyzer.terms(&doc.description) {
            terms.entry(term).or_default().description_tf += 1;
        }

        let name_norm = normalize(&doc.name);
        let description_norm = normalize(&doc.description);
        let name_shingles = shingles(&name_norm);
        let description_shingles = shingles(&description_norm);

        IndexedDoc {
            doc,
            terms,
            name_norm,
            description_norm,
            name_shingles,
            description_shingles,
        }
    }

    #[inline]
    pub fn id(&self) -> DocId {
        self.doc.id
    }

    #[inline]
    pub fn version(&self) -> u64 {
        self.doc.version
    }

    /// Facetable (attribute, value) pairs: the catalog attributes plus the
    /// synthesized availability facet, all normalized so `Black` and
    /// `black` land in one bucket.
    pub fn facet_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .doc
            .attributes
            .iter()
            .map(|(attr, value)| (normalize(attr), normalize(value)))
            .collect();
        let availability = if self.doc.in_stock { "in-stock" } else { "out-of-stock" };
        pairs.push((
            crate::facets::FACET_AVAILABILITY.to_string(),
            availability.to_string(),
        ));
        pairs
    }

    /// All shingles this document contributes to the trigram index.
    pub fn all_shingles(&self) -> impl Iterator<Item = &String> {
        self.name_shingles.iter().chain(self.description_shingles.iter())
    }
}

// =============================================================================
// QUERY REQUEST
// =============================================================================

/// When to engage the trigram fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FuzzyMode {
    /// Fuzzy only when exact matching comes up short (the configured
    /// minimum, defaulting to the page size).
    #[default]
    Auto,
    /// Always run the trigram pass, merging with exact results.
    Always,
    /// Exact matching only.
    Never,
}

/// Result ordering. `Relevance` is the scored default; explicit sorts are
/// deterministic with a document-id tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    #[default]
    Relevance,
    PriceAsc,
    PriceDesc,
    Newest,
}

/// Opaque pagination cursor: the sort key and id of the last hit on the
/// previous page, plus its recency so resumption reproduces the relevance
/// tie-break exactly even when that document has churned away. Page 1 is
/// `cursor: None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageCursor {
    /// Bit pattern of the previous page's final sort-key value. Kept as
    /// bits so equality is exact across serialization.
    pub key_bits: u64,
    /// Document version of that hit (the relevance tie-break).
    pub version: u64,
    pub id: DocId,
}

/// One search query from the storefront.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryRequest {
    /// Free text, possibly misspelled. Empty means "browse": the eligible
    /// set narrowed only by filters.
    pub text: String,
    /// Active filters: attribute → accepted values (OR within an
    /// attribute, AND across attributes).
    pub filters: BTreeMap<String, BTreeSet<String>>,
    /// Inclusive price bounds, minor units.
    pub price_range: Option<(u64, u64)>,
    /// Facets to aggregate. Empty means every attribute known to the index.
    pub facets: Vec<String>,
    pub page_size: usize,
    pub cursor: Option<PageCursor>,
    /// Shopper identity for personalization; `None` ranks unpersonalized.
    pub user_id: Option<String>,
    pub fuzzy: FuzzyMode,
    pub sort: SortOrder,
    /// Per-request time budget, checked at stage boundaries.
    pub deadline: Option<Duration>,
}

impl Default for QueryRequest {
    fn default() -> Self {
        QueryRequest {
            text: String::new(),
            filters: BTreeMap::new(),
            price_range: None,
            facets: Vec::new(),
            page_size: 20,
            cursor: None,
            user_id: None,
            fuzzy: FuzzyMode::default(),
            sort: SortOrder::default(),
            deadline: None,
        }
    }
}

impl QueryRequest {
    /// A relevance-ranked query for `text` with default paging.
    pub fn new(text: impl Into<String>) -> Self {
        QueryRequest {
            text: text.into(),
            ..QueryRequest::default()
        }
    }

    /// Add an accepted value for an attribute filter.
    pub fn with_filter(mut self, attribute: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.entry(attribute.into()).or_default().insert(value.into());
        self
    }

    pub fn with_price_range(mut self, min: u64, max: u64) -> Self {
        self.price_range = Some((min, max));
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn after(mut self, cursor: PageCursor) -> Self {
        self.cursor = Some(cursor);
        self
    }
}

// =============================================================================
// QUERY RESPONSE
// =============================================================================

/// One ranked result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hit {
    pub id: DocId,
    /// Base relevance plus any personalization boost.
    pub score: f64,
}

/// Range-slider bounds for the price facet (minor units), computed over the
/// candidate set with the self-exclude rule applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBounds {
    pub min: u64,
    pub max: u64,
}

/// A ranked, faceted page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub hits: Vec<Hit>,
    /// Facet name → value → count, self-excluding per facet. Explicitly
    /// empty (not an error) when nothing matched.
    pub facets: BTreeMap<String, BTreeMap<String, usize>>,
    /// Price bounds over the (price-filter-excluded) candidate set.
    pub price: Option<PriceBounds>,
    /// Matching documents after filters, before pagination.
    pub total_eligible: usize,
    /// True when a deadline expired and later pipeline stages were skipped.
    pub truncated: bool,
    /// Present when more results follow this page.
    pub next_cursor: Option<PageCursor>,
}

// =============================================================================
// INGEST
// =============================================================================

/// What an ingest call did with a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IngestOutcome {
    /// Indexed (fresh or replacing an older version).
    Indexed,
    /// Removed from all indexes (delete, or upsert of an ineligible document).
    Removed,
    /// A newer version is already indexed; the write was ignored.
    Stale,
}
