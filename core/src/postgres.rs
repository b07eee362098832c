//! [`IndexStore`] over the relational index in PostgreSQL.
//!
//! Reads four relations and never writes:
//! `terms(id, name)`, `synonyms(name, term_id)`,
//! `has(term_id, document_id, frequency)` and
//! `documents(id, url, title, author, date)`.

use crate::error::StoreResult;
use crate::store::IndexStore;
use crate::{Document, ScoredDocument, TermId};
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};
use std::collections::HashMap;
use std::str::FromStr;
use time::OffsetDateTime;

#[derive(Debug, sqlx::FromRow)]
struct AggregateRow {
    #[sqlx(flatten)]
    document: Document,
    total_score: i64,
    matched_terms: Vec<String>,
    matched_count: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct SynonymRow {
    synonym: String,
    term: String,
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `database_url`. See [`connect_options`] for TLS.
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options(database_url)?)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Wait for checked-out connections to return, then close the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Parse `database_url`, requiring TLS with a verified certificate and host
/// unless `sslmode` is set in the URL or through `PGSSLMODE`.
pub fn connect_options(database_url: &str) -> StoreResult<PgConnectOptions> {
    let options = PgConnectOptions::from_str(database_url)?;
    let explicit = database_url.contains("sslmode=") || std::env::var_os("PGSSLMODE").is_some();
    if explicit {
        Ok(options)
    } else {
        Ok(options.ssl_mode(PgSslMode::VerifyFull))
    }
}

#[async_trait]
impl IndexStore for PgStore {
    async fn lookup_term_ids(&self, names: &[String]) -> StoreResult<Vec<TermId>> {
        let ids = sqlx::query_scalar::<_, TermId>("SELECT id FROM terms WHERE name = ANY($1) ORDER BY id")
            .bind(names)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    async fn synonyms_of(&self, term: &str) -> StoreResult<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(
            "\
SELECT t.name
FROM synonyms s
JOIN terms t ON t.id = s.term_id
WHERE s.name = $1
ORDER BY t.name",
        )
        .bind(term)
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    async fn synonyms_of_many(&self, terms: &[String]) -> StoreResult<HashMap<String, Vec<String>>> {
        let rows = sqlx::query_as::<_, SynonymRow>(
            "\
SELECT s.name AS synonym, t.name AS term
FROM synonyms s
JOIN terms t ON t.id = s.term_id
WHERE s.name = ANY($1)
ORDER BY s.name, t.name",
        )
        .bind(terms)
        .fetch_all(&self.pool)
        .await?;

        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for row in rows {
            map.entry(row.synonym).or_default().push(row.term);
        }
        Ok(map)
    }

    async fn aggregate_by_document(&self, term_ids: &[TermId]) -> StoreResult<Vec<ScoredDocument>> {
        let rows = sqlx::query_as::<_, AggregateRow>(
            "\
SELECT
	d.id,
	d.url,
	d.title,
	d.author,
	d.date,
	SUM(h.frequency)::BIGINT AS total_score,
	ARRAY_AGG(DISTINCT t.name ORDER BY t.name) AS matched_terms,
	COUNT(DISTINCT t.id)::BIGINT AS matched_count
FROM has h
JOIN terms t ON t.id = h.term_id
JOIN documents d ON d.id = h.document_id
WHERE h.term_id = ANY($1)
GROUP BY d.id, d.url, d.title, d.author, d.date",
        )
        .bind(term_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ScoredDocument {
                document: row.document,
                total_score: row.total_score,
                matched_terms: row.matched_terms,
                matched_count: row.matched_count as usize,
            })
            .collect())
    }

    async fn now(&self) -> StoreResult<OffsetDateTime> {
        let now = sqlx::query_scalar::<_, OffsetDateTime>("SELECT NOW()")
            .fetch_one(&self.pool)
            .await?;
        Ok(now)
    }
}
