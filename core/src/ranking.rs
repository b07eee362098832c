use crate::error::StoreResult;
use crate::store::IndexStore;
use crate::{ScoredDocument, MAX_RESULTS};
use std::cmp::Ordering;

/// Ranking order: score desc, matched term count desc, date desc.
/// Document id asc keeps the order stable when all three tie.
pub fn compare(a: &ScoredDocument, b: &ScoredDocument) -> Ordering {
    b.total_score
        .cmp(&a.total_score)
        .then_with(|| b.matched_count.cmp(&a.matched_count))
        .then_with(|| b.document.date.cmp(&a.document.date))
        .then_with(|| a.document.id.cmp(&b.document.id))
}

/// Sort aggregates into ranking order and keep the top [`MAX_RESULTS`].
pub fn order_and_truncate(mut scored: Vec<ScoredDocument>) -> Vec<ScoredDocument> {
    scored.sort_by(compare);
    scored.truncate(MAX_RESULTS);
    scored
}

/// Score every document containing at least one expanded term.
pub async fn rank(expanded: &[String], store: &dyn IndexStore) -> StoreResult<Vec<ScoredDocument>> {
    let term_ids = store.lookup_term_ids(expanded).await?;
    if term_ids.is_empty() {
        return Ok(Vec::new());
    }
    let scored = store.aggregate_by_document(&term_ids).await?;
    let total_hits = scored.len();
    let ranked = order_and_truncate(scored);
    tracing::debug!(terms = term_ids.len(), total_hits, returned = ranked.len(), "ranked documents");
    Ok(ranked)
}
