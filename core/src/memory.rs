//! In-process [`IndexStore`] backed by an [`InvertedIndex`].

use crate::error::{StoreError, StoreResult};
use crate::store::IndexStore;
use crate::{DocId, Document, IndexSnapshot, InvertedIndex, Posting, ScoredDocument, SynonymEdge, Term, TermId};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use time::OffsetDateTime;

#[derive(Default)]
pub struct MemoryStore {
    index: RwLock<InvertedIndex>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    /// Build a store from a snapshot, enforcing the posting invariants.
    pub fn from_snapshot(snapshot: IndexSnapshot) -> StoreResult<Self> {
        let store = Self::new();
        {
            let mut index = store.index.write();
            for term in snapshot.terms {
                if index.term_names.contains_key(&term.id) {
                    return Err(StoreError::Snapshot(format!("duplicate term id {}", term.id)));
                }
                if index.dictionary.insert(term.name.clone(), term.id).is_some() {
                    return Err(StoreError::Snapshot(format!("duplicate term {:?}", term.name)));
                }
                index.term_names.insert(term.id, term.name);
            }
            for doc in snapshot.documents {
                index.docs.insert(doc.id, doc);
            }
        }
        for edge in snapshot.synonyms {
            store
                .insert_synonym(&edge.synonym, &edge.term)
                .map_err(|e| StoreError::Snapshot(e.to_string()))?;
        }
        for p in snapshot.postings {
            store.insert_posting(p.term_id, p.doc_id, p.frequency)?;
        }
        Ok(store)
    }

    /// Flatten the store back into its relations, ordered by id.
    pub fn snapshot(&self) -> IndexSnapshot {
        let index = self.index.read();
        let mut terms: Vec<Term> = index
            .term_names
            .iter()
            .map(|(&id, name)| Term { id, name: name.clone() })
            .collect();
        terms.sort_by_key(|t| t.id);

        let mut synonyms: Vec<SynonymEdge> = index
            .synonyms
            .iter()
            .flat_map(|(synonym, names)| {
                names.iter().map(move |term| SynonymEdge { synonym: synonym.clone(), term: term.clone() })
            })
            .collect();
        synonyms.sort_by(|a, b| a.synonym.cmp(&b.synonym));

        let mut postings: Vec<Posting> = index
            .postings
            .iter()
            .flat_map(|(&term_id, list)| {
                list.iter().map(move |&(doc_id, frequency)| Posting { term_id, doc_id, frequency })
            })
            .collect();
        postings.sort_by_key(|p| (p.term_id, p.doc_id));

        let mut documents: Vec<Document> = index.docs.values().cloned().collect();
        documents.sort_by_key(|d| d.id);

        IndexSnapshot { terms, synonyms, postings, documents }
    }

    /// Id of `name`, registering it if unseen.
    pub fn insert_term(&self, name: &str) -> TermId {
        let mut index = self.index.write();
        if let Some(&id) = index.dictionary.get(name) {
            return id;
        }
        let id = index.term_names.keys().max().map_or(1, |max| max + 1);
        index.dictionary.insert(name.to_string(), id);
        index.term_names.insert(id, name.to_string());
        id
    }

    /// Register `synonym` as a surface form of the canonical term `term`,
    /// which must already be a registered term.
    pub fn insert_synonym(&self, synonym: &str, term: &str) -> StoreResult<()> {
        let mut index = self.index.write();
        if !index.dictionary.contains_key(term) {
            return Err(StoreError::UnknownTerm(term.to_string()));
        }
        let names = index.synonyms.entry(synonym.to_string()).or_default();
        if !names.iter().any(|n| n == term) {
            names.push(term.to_string());
        }
        Ok(())
    }

    pub fn insert_document(&self, doc: Document) {
        self.index.write().docs.insert(doc.id, doc);
    }

    /// Record `frequency` occurrences of `term_id` in `doc_id`.
    pub fn insert_posting(&self, term_id: TermId, doc_id: DocId, frequency: i32) -> StoreResult<()> {
        if frequency < 1 {
            return Err(StoreError::InvalidPosting(format!("frequency {frequency} for term {term_id} in doc {doc_id}")));
        }
        let mut index = self.index.write();
        let list = index.postings.entry(term_id).or_default();
        if list.iter().any(|&(d, _)| d == doc_id) {
            return Err(StoreError::InvalidPosting(format!("duplicate posting for term {term_id} in doc {doc_id}")));
        }
        list.push((doc_id, frequency));
        Ok(())
    }

    pub fn num_docs(&self) -> usize { self.index.read().docs.len() }
}

#[derive(Default)]
struct Accumulator {
    total_score: i64,
    matched: BTreeSet<String>,
}

#[async_trait]
impl IndexStore for MemoryStore {
    async fn lookup_term_ids(&self, names: &[String]) -> StoreResult<Vec<TermId>> {
        let index = self.index.read();
        let mut ids: Vec<TermId> = names.iter().filter_map(|n| index.dictionary.get(n).copied()).collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    async fn synonyms_of(&self, term: &str) -> StoreResult<Vec<String>> {
        Ok(self.index.read().synonyms.get(term).cloned().unwrap_or_default())
    }

    async fn aggregate_by_document(&self, term_ids: &[TermId]) -> StoreResult<Vec<ScoredDocument>> {
        let index = self.index.read();
        let mut per_doc: HashMap<DocId, Accumulator> = HashMap::new();
        for tid in term_ids {
            let (Some(name), Some(list)) = (index.term_names.get(tid), index.postings.get(tid)) else { continue };
            for &(doc_id, frequency) in list {
                let acc = per_doc.entry(doc_id).or_default();
                acc.total_score += i64::from(frequency);
                acc.matched.insert(name.clone());
            }
        }
        // Postings pointing at unknown documents are dropped, like an inner join.
        Ok(per_doc
            .into_iter()
            .filter_map(|(doc_id, acc)| {
                let document = index.docs.get(&doc_id)?.clone();
                let matched_terms: Vec<String> = acc.matched.into_iter().collect();
                Some(ScoredDocument { document, total_score: acc.total_score, matched_count: matched_terms.len(), matched_terms })
            })
            .collect())
    }

    async fn now(&self) -> StoreResult<OffsetDateTime> {
        Ok(OffsetDateTime::now_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn doc(id: DocId) -> Document {
        Document { id, url: format!("https://example.org/{id}"), title: format!("Doc {id}"), author: "anon".into(), date: date!(2024 - 01 - 01) }
    }

    #[test]
    fn rejects_bad_postings() {
        let store = MemoryStore::new();
        let t = store.insert_term("rust");
        store.insert_document(doc(1));
        assert!(store.insert_posting(t, 1, 0).is_err());
        store.insert_posting(t, 1, 2).unwrap();
        assert!(store.insert_posting(t, 1, 3).is_err());
    }

    #[test]
    fn insert_term_is_idempotent() {
        let store = MemoryStore::new();
        let a = store.insert_term("cat");
        let b = store.insert_term("dog");
        assert_ne!(a, b);
        assert_eq!(store.insert_term("cat"), a);
    }

    #[tokio::test]
    async fn aggregates_score_and_distinct_terms() {
        let store = MemoryStore::new();
        let cat = store.insert_term("cat");
        let feline = store.insert_term("feline");
        store.insert_document(doc(1));
        store.insert_document(doc(2));
        store.insert_posting(cat, 1, 3).unwrap();
        store.insert_posting(feline, 1, 2).unwrap();
        store.insert_posting(cat, 2, 1).unwrap();
        store.insert_posting(cat, 99, 5).unwrap(); // no such document

        let mut scored = store.aggregate_by_document(&[cat, feline]).await.unwrap();
        scored.sort_by_key(|s| s.document.id);
        assert_eq!(scored.len(), 2);
        assert_eq!(scored[0].total_score, 5);
        assert_eq!(scored[0].matched_terms, vec!["cat", "feline"]);
        assert_eq!(scored[0].matched_count, 2);
        assert_eq!(scored[1].total_score, 1);
        assert_eq!(scored[1].matched_count, 1);
    }

    #[test]
    fn synonym_must_point_at_a_term() {
        let store = MemoryStore::new();
        store.insert_term("cat");
        assert!(matches!(store.insert_synonym("kitty", "feline"), Err(StoreError::UnknownTerm(t)) if t == "feline"));
        store.insert_synonym("kitty", "cat").unwrap();
    }

    #[test]
    fn snapshot_rejects_shared_term_id() {
        let snapshot = IndexSnapshot {
            terms: vec![Term { id: 1, name: "cat".into() }, Term { id: 1, name: "dog".into() }],
            ..Default::default()
        };
        assert!(matches!(MemoryStore::from_snapshot(snapshot), Err(StoreError::Snapshot(_))));
    }

    #[test]
    fn snapshot_rejects_dangling_synonym() {
        let snapshot = IndexSnapshot {
            terms: vec![Term { id: 1, name: "cat".into() }],
            synonyms: vec![SynonymEdge { synonym: "kitty".into(), term: "feline".into() }],
            ..Default::default()
        };
        assert!(matches!(MemoryStore::from_snapshot(snapshot), Err(StoreError::Snapshot(_))));
    }

    #[test]
    fn snapshot_rebuilds_same_store() {
        let store = MemoryStore::new();
        let t = store.insert_term("cat");
        store.insert_synonym("kitty", "cat").unwrap();
        store.insert_document(doc(4));
        store.insert_posting(t, 4, 1).unwrap();

        let snap = store.snapshot();
        let rebuilt = MemoryStore::from_snapshot(snap.clone()).unwrap();
        assert_eq!(rebuilt.snapshot(), snap);
        assert_eq!(rebuilt.num_docs(), 1);
    }
}
