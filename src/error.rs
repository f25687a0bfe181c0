// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy for the search core.
//!
//! The rule here is that nothing in this crate crashes the serving process.
//! Malformed input is rejected before it touches an index, a not-yet-built
//! index tells the caller to retry, and everything else degrades to smaller
//! or unpersonalized results. Deadline expiry is deliberately NOT an error:
//! the planner returns the best completed stage with `truncated = true`
//! (see `QueryResponse`), because a late answer is still an answer.

use crate::types::DocId;

/// Errors surfaced by ingest and query entry points.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// The query or filter set is malformed. Rejected before any index work.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A document failed ingest validation. The document is not indexed at
    /// all — there is no partial indexing of a malformed document.
    #[error("invalid document {id:?}: {reason}")]
    InvalidDocument { id: DocId, reason: String },

    /// The index has not finished its initial catalog sync. Callers may
    /// retry once `SearchCore::mark_ready` has been called.
    #[error("index is not ready")]
    NotReady,
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SearchError>;
