//! Query orchestration: tokenize, expand, rank.

use crate::error::{SearchError, ValidationError};
use crate::expander::expand;
use crate::ranking::rank;
use crate::store::IndexStore;
use crate::tokenizer::tokenize;
use crate::ScoredDocument;
use std::sync::Arc;

/// Terminal, non-error outcome of a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Found {
        query: String,
        processed_terms: Vec<String>,
        results: Vec<ScoredDocument>,
    },
    NotFound {
        query: String,
        processed_terms: Vec<String>,
    },
}

impl SearchOutcome {
    pub fn processed_terms(&self) -> &[String] {
        match self {
            SearchOutcome::Found { processed_terms, .. } | SearchOutcome::NotFound { processed_terms, .. } => processed_terms,
        }
    }
}

#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn IndexStore>,
}

impl QueryService {
    pub fn new(store: Arc<dyn IndexStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn IndexStore> {
        &self.store
    }

    pub async fn search(&self, raw: Option<&str>) -> Result<SearchOutcome, SearchError> {
        let query = match raw {
            Some(q) if !q.trim().is_empty() => q,
            _ => return Err(ValidationError::MissingQuery.into()),
        };

        let terms = tokenize(query);
        let processed_terms = expand(&terms, self.store.as_ref()).await?;
        if processed_terms.is_empty() {
            return Err(ValidationError::NoMeaningfulTerms.into());
        }
        tracing::debug!(query, terms = ?processed_terms, "processed query");

        let results = rank(&processed_terms, self.store.as_ref()).await?;
        let query = query.to_string();
        if results.is_empty() {
            Ok(SearchOutcome::NotFound { query, processed_terms })
        } else {
            Ok(SearchOutcome::Found { query, processed_terms, results })
        }
    }
}
