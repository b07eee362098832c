use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Parser};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use synsearch_core::persist::{load_snapshot, SnapshotPaths};
use synsearch_core::{IndexStore, MemoryStore, PgStore};

#[derive(Parser, Debug)]
#[command(name = "synsearch-server", about = "Keyword search with synonym expansion")]
#[command(group(ArgGroup::new("backend").required(true).multiple(true).args(["database_url", "snapshot"])))]
pub struct Args {
    /// PostgreSQL connection string for the term-frequency index
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
    /// Serve from a snapshot directory instead of PostgreSQL
    #[arg(long, env = "SNAPSHOT_DIR")]
    pub snapshot: Option<PathBuf>,
    /// Host to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,
    /// Port to bind
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,
    /// Size of the PostgreSQL connection pool
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 5)]
    pub max_connections: u32,
}

impl Args {
    pub fn addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port).parse()?;
        Ok(addr)
    }

    /// A snapshot directory wins over a database URL when both are set.
    pub fn backend(&self) -> Result<Backend> {
        match (&self.database_url, &self.snapshot) {
            (_, Some(dir)) => Ok(Backend::Snapshot(dir.clone())),
            (Some(url), None) => Ok(Backend::Postgres { url: url.clone(), max_connections: self.max_connections }),
            (None, None) => bail!("either --database-url or --snapshot is required"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Backend {
    Postgres { url: String, max_connections: u32 },
    Snapshot(PathBuf),
}

/// Storage handle held for the life of the process.
pub struct Store {
    pub index: Arc<dyn IndexStore>,
    pg: Option<PgStore>,
}

impl Store {
    pub async fn open(backend: &Backend) -> Result<Self> {
        match backend {
            Backend::Postgres { url, max_connections } => {
                let pg = PgStore::connect(url, *max_connections)
                    .await
                    .context("connecting to postgres")?;
                tracing::info!(max_connections, "postgres pool ready");
                Ok(Self { index: Arc::new(pg.clone()), pg: Some(pg) })
            }
            Backend::Snapshot(dir) => {
                let snapshot = load_snapshot(&SnapshotPaths::new(dir))
                    .with_context(|| format!("loading snapshot from {}", dir.display()))?;
                let memory = MemoryStore::from_snapshot(snapshot)?;
                tracing::info!(num_docs = memory.num_docs(), dir = %dir.display(), "serving from snapshot");
                Ok(Self { index: Arc::new(memory), pg: None })
            }
        }
    }

    /// Release pooled connections. No-op for the in-memory backend.
    pub async fn close(&self) {
        if let Some(pg) = &self.pg {
            pg.close().await;
            tracing::info!("postgres pool closed");
        }
    }
}
