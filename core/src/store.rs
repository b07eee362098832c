//! Storage collaborator consumed by the search pipeline.

use crate::error::StoreResult;
use crate::{ScoredDocument, TermId};
use async_trait::async_trait;
use futures::future::try_join_all;
use std::collections::HashMap;
use time::OffsetDateTime;

/// Read-only view over terms, synonym edges, postings and document metadata.
///
/// Implementations must be cheap to share across concurrent requests; the
/// server holds a single `Arc<dyn IndexStore>` for its whole lifetime.
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Resolve term names to ids. Unknown names are skipped.
    async fn lookup_term_ids(&self, names: &[String]) -> StoreResult<Vec<TermId>>;

    /// Canonical term names registered for the surface string `term`.
    async fn synonyms_of(&self, term: &str) -> StoreResult<Vec<String>>;

    /// Synonyms for several surface strings at once. Terms without synonyms
    /// may be absent from the map.
    ///
    /// The default issues one `synonyms_of` per term concurrently and joins them.
    async fn synonyms_of_many(&self, terms: &[String]) -> StoreResult<HashMap<String, Vec<String>>> {
        let lookups = terms.iter().map(|term| async move {
            let synonyms = self.synonyms_of(term).await?;
            Ok::<_, crate::StoreError>((term.clone(), synonyms))
        });
        Ok(try_join_all(lookups).await?.into_iter().collect())
    }

    /// Per-document totals over the postings of `term_ids`, joined with
    /// document metadata. Order is unspecified.
    async fn aggregate_by_document(&self, term_ids: &[TermId]) -> StoreResult<Vec<ScoredDocument>>;

    /// Current time as seen by the store; doubles as a connectivity check.
    async fn now(&self) -> StoreResult<OffsetDateTime>;
}
