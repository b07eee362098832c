use crate::error::StoreResult;
use crate::store::IndexStore;
use std::collections::HashSet;

/// Union of `terms` and all their synonyms, deduplicated, first-seen order.
///
/// Every input term is kept even when it has no synonyms. Synonyms are
/// appended after all original terms, walking the distinct inputs in order.
pub async fn expand(terms: &[String], store: &dyn IndexStore) -> StoreResult<Vec<String>> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut distinct: Vec<String> = Vec::new();
    for term in terms {
        if seen.insert(term.as_str()) {
            distinct.push(term.clone());
        }
    }
    if distinct.is_empty() {
        return Ok(Vec::new());
    }

    let synonyms = store.synonyms_of_many(&distinct).await?;

    let mut expanded = distinct.clone();
    let mut seen: HashSet<String> = distinct.iter().cloned().collect();
    for term in &distinct {
        for name in synonyms.get(term).into_iter().flatten() {
            if seen.insert(name.clone()) {
                expanded.push(name.clone());
            }
        }
    }
    tracing::debug!(input = distinct.len(), expanded = expanded.len(), "expanded query terms");
    Ok(expanded)
}
