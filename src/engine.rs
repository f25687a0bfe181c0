// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The search core: index ownership, ingest, and the query entry point.
//!
//! # Snapshot discipline
//!
//! [`SearchCore`] owns a single [`IndexSet`] behind `RwLock<Arc<_>>`. A
//! query clones the `Arc` (a microsecond read lock) and then runs entirely
//! against that snapshot — reads never block each other, and no query ever
//! blocks on a rebuild. Ingest mutates the CURRENT set through its
//! concurrent maps: per document, a fresh immutable projection is built off
//! to the side and swapped in with one registry insert, then the candidate
//! sets are reconciled. A reader that interleaves sees the document's old
//! state or its new state, never a blend.
//!
//! Wholesale rebuilds (changing the stemming language) construct a fresh
//! `IndexSet` from the retained documents and swap the `Arc` once fully
//! built. Writers are gated out for the duration; readers are not.
//!
//! # Ingest semantics
//!
//! Last-write-wins on `Document::version`, including across deletes, so a
//! delayed stale update can never resurrect a removed product. Ineligible
//! documents (draft, archived, unapproved) are REMOVED on upsert — the
//! eligibility invariant lives here, not in query-time filtering. Batch
//! ingest isolates failures per document.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{info, instrument};

use crate::config::SearchConfig;
use crate::error::{Result, SearchError};
use crate::facets::FacetIndex;
use crate::normalize::Analyzer;
use crate::planner;
use crate::profile::{NoProfiles, ProfileStore};
use crate::tokens::{DocRegistry, TokenIndex};
use crate::trigram::TrigramIndex;
use crate::types::{DocId, Document, IndexedDoc, IngestOutcome, QueryRequest, QueryResponse};

/// One complete, internally consistent generation of the index.
pub(crate) struct IndexSet {
    /// Document id → immutable indexed projection. The scoring source of
    /// truth within the search core; the catalog store remains the source
    /// of truth for content.
    pub docs: DocRegistry,
    /// Highest version seen per document id, INCLUDING ineligible and
    /// deleted documents. This is what makes last-write-wins stick after
    /// a removal.
    pub versions: DashMap<DocId, u64>,
    pub tokens: TokenIndex,
    pub trigrams: TrigramIndex,
    pub facets: FacetIndex,
    pub analyzer: Analyzer,
    pub config: SearchConfig,
}

impl IndexSet {
    fn new(config: SearchConfig) -> Self {
        IndexSet {
            docs: DocRegistry::new(),
            versions: DashMap::new(),
            tokens: TokenIndex::new(),
            trigrams: TrigramIndex::new(),
            facets: FacetIndex::new(),
            analyzer: Analyzer::new(config.language),
            config,
        }
    }

    /// Apply one upsert. The version entry doubles as the per-document
    /// writer lock: concurrent upserts of the same id serialize here,
    /// while distinct ids proceed independently.
    fn upsert(&self, doc: Document) -> Result<IngestOutcome> {
        doc.validate()?;

        let mut version = self.versions.entry(doc.id).or_insert(0);
        if *version > doc.version {
            return Ok(IngestOutcome::Stale);
        }
        *version = doc.version;

        if !doc.is_eligible() {
            self.unindex(doc.id);
            return Ok(IngestOutcome::Removed);
        }

        let projected = Arc::new(IndexedDoc::project(doc, &self.analyzer));
        let old = self.docs.insert(projected.id(), Arc::clone(&projected));
        self.tokens.insert(&projected, old.as_deref());
        self.trigrams.insert(&projected, old.as_deref());
        self.facets.insert(&projected, old.as_deref(), &self.config);
        Ok(IngestOutcome::Indexed)
    }

    /// Apply one delete, honoring last-write-wins.
    fn delete(&self, id: DocId, version: u64) -> IngestOutcome {
        let mut latest = self.versions.entry(id).or_insert(0);
        if *latest > version {
            return IngestOutcome::Stale;
        }
        *latest = version;
        self.unindex(id);
        IngestOutcome::Removed
    }

    /// Strip a document from every index structure.
    fn unindex(&self, id: DocId) {
        if let Some((_, old)) = self.docs.remove(&id) {
            self.tokens.remove(&old);
            self.trigrams.remove(&old);
            self.facets.remove(&old, &self.config);
        }
    }
}

/// The search core serving one catalog.
///
/// Cheap to share: wrap it in an `Arc` and hand clones to the ingest
/// listener and every query handler.
pub struct SearchCore {
    inner: RwLock<Arc<IndexSet>>,
    /// Writers take this shared; a wholesale rebuild takes it exclusive.
    /// Queries never touch it.
    ingest_gate: RwLock<()>,
    profiles: Arc<dyn ProfileStore>,
    ready: AtomicBool,
}

impl SearchCore {
    /// A core with no profile collaborator: every ranking unpersonalized.
    pub fn new(config: SearchConfig) -> Self {
        SearchCore::with_profiles(config, Arc::new(NoProfiles))
    }

    pub fn with_profiles(config: SearchConfig, profiles: Arc<dyn ProfileStore>) -> Self {
        SearchCore {
            inner: RwLock::new(Arc::new(IndexSet::new(config))),
            ingest_gate: RwLock::new(()),
            profiles,
            ready: AtomicBool::new(false),
        }
    }

    /// Declare the initial catalog sync complete. Queries before this
    /// fail with [`SearchError::NotReady`].
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
        info!("search core ready");
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Eligible documents currently indexed.
    pub fn doc_count(&self) -> usize {
        self.inner.read().docs.len()
    }

    /// Ingest one create/update notification. Idempotent; last-write-wins
    /// on `version`.
    pub fn upsert(&self, doc: Document) -> Result<IngestOutcome> {
        let _gate = self.ingest_gate.read();
        let set = self.inner.read().clone();
        set.upsert(doc)
    }

    /// Ingest one delete notification. `version` is the catalog's deletion
    /// timestamp, so a stale concurrent update cannot resurrect the
    /// document.
    pub fn delete(&self, id: DocId, version: u64) -> IngestOutcome {
        let _gate = self.ingest_gate.read();
        let set = self.inner.read().clone();
        set.delete(id, version)
    }

    /// Ingest a batch, isolating failures: one malformed document reports
    /// its own error and the rest proceed.
    pub fn upsert_batch(&self, docs: Vec<Document>) -> Vec<(DocId, Result<IngestOutcome>)> {
        let _gate = self.ingest_gate.read();
        let set = self.inner.read().clone();

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            docs.into_par_iter()
                .map(|doc| (doc.id, set.upsert(doc)))
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            docs.into_iter().map(|doc| (doc.id, set.upsert(doc))).collect()
        }
    }

    /// Run one query against the current snapshot.
    #[instrument(skip_all, fields(query = %req.text, page_size = req.page_size))]
    pub fn query(&self, req: &QueryRequest) -> Result<QueryResponse> {
        if !self.is_ready() {
            return Err(SearchError::NotReady);
        }
        let snapshot = self.inner.read().clone();
        planner::execute(&snapshot, self.profiles.as_ref(), req)
    }

    /// Rebuild the whole index under a new configuration (typically a
    /// stemming language change) and swap it in atomically.
    ///
    /// Meant to run from a background task: queries keep serving the old
    /// generation until the new one is complete; only ingest is gated out
    /// for the duration. A partially rebuilt index is never observable.
    pub fn rebuild(&self, config: SearchConfig) {
        let _gate = self.ingest_gate.write();
        let current = self.inner.read().clone();

        let fresh = IndexSet::new(config);
        // Version watermarks first, so writes that were stale before the
        // rebuild stay stale after it.
        for entry in current.versions.iter() {
            fresh.versions.insert(*entry.key(), *entry.value());
        }
        let mut carried = 0usize;
        for entry in current.docs.iter() {
            let projected = Arc::new(IndexedDoc::project(
                entry.value().doc.clone(),
                &fresh.analyzer,
            ));
            fresh.tokens.insert(&projected, None);
            fresh.trigrams.insert(&projected, None);
            fresh.facets.insert(&projected, None, &fresh.config);
            fresh.docs.insert(projected.id(), projected);
            carried += 1;
        }

        info!(
            documents = carried,
            terms = fresh.tokens.term_count(),
            shingles = fresh.trigrams.shingle_count(),
            "index rebuilt, swapping in"
        );
        *self.inner.write() = Arc::new(fresh);
    }
}
