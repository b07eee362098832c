use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use time::Date;

pub type TermId = i32;
pub type DocId = i32;

/// Results returned for a single query, after ranking.
pub const MAX_RESULTS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub id: TermId,
    pub name: String,
}

/// Maps a surface synonym string onto a canonical term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynonymEdge {
    pub synonym: String,
    pub term: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub term_id: TermId,
    pub doc_id: DocId,
    pub frequency: i32, // occurrences of the term in the document, >= 1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Document {
    pub id: DocId,
    pub url: String,
    pub title: String,
    pub author: String,
    pub date: Date,
}

/// Per-document aggregate over the postings of an expanded query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredDocument {
    pub document: Document,
    pub total_score: i64,
    /// Distinct term names that contributed, sorted ascending.
    pub matched_terms: Vec<String>,
    pub matched_count: usize,
}

/// Flat, serializable form of every relation the search pipeline reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub terms: Vec<Term>,
    pub synonyms: Vec<SynonymEdge>,
    pub postings: Vec<Posting>,
    pub documents: Vec<Document>,
}

/// Lookup structures built over an [`IndexSnapshot`].
#[derive(Default)]
pub struct InvertedIndex {
    pub dictionary: HashMap<String, TermId>,
    pub term_names: HashMap<TermId, String>,
    pub synonyms: HashMap<String, Vec<String>>, // surface -> canonical names, insertion order
    pub postings: HashMap<TermId, Vec<(DocId, i32)>>,
    pub docs: HashMap<DocId, Document>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }
}
