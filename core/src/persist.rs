use crate::{Document, IndexSnapshot, Posting, SynonymEdge, Term};
use anyhow::{bail, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub num_terms: u32,
    pub created_at: String,
    pub version: u32,
}

pub struct SnapshotPaths {
    pub root: PathBuf,
}

impl SnapshotPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn terms(&self) -> PathBuf { self.root.join("terms.bin") }
    fn synonyms(&self) -> PathBuf { self.root.join("synonyms.bin") }
    fn postings(&self) -> PathBuf { self.root.join("postings.bin") }
    fn docs(&self) -> PathBuf { self.root.join("docs.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

fn save_bin<T: Serialize>(path: PathBuf, value: &T) -> Result<()> {
    let mut f = File::create(path)?;
    let bytes = bincode::serialize(value)?;
    f.write_all(&bytes)?;
    Ok(())
}

fn load_bin<T: DeserializeOwned>(path: PathBuf) -> Result<T> {
    let mut f = File::open(path)?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    Ok(bincode::deserialize(&buf)?)
}

pub fn save_meta(paths: &SnapshotPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &SnapshotPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

/// Write every relation of `snapshot` under `paths.root`, plus a meta file.
pub fn save_snapshot(paths: &SnapshotPaths, snapshot: &IndexSnapshot) -> Result<()> {
    create_dir_all(&paths.root)?;
    save_bin(paths.terms(), &snapshot.terms)?;
    save_bin(paths.synonyms(), &snapshot.synonyms)?;
    save_bin(paths.postings(), &snapshot.postings)?;
    save_bin(paths.docs(), &snapshot.documents)?;
    let meta = MetaFile {
        num_docs: snapshot.documents.len() as u32,
        num_terms: snapshot.terms.len() as u32,
        created_at: OffsetDateTime::now_utc().format(&Rfc3339)?,
        version: SNAPSHOT_VERSION,
    };
    save_meta(paths, &meta)
}

/// Read a snapshot written by [`save_snapshot`]. Rejects other format versions.
pub fn load_snapshot(paths: &SnapshotPaths) -> Result<IndexSnapshot> {
    let meta = load_meta(paths)?;
    if meta.version != SNAPSHOT_VERSION {
        bail!("unsupported snapshot version {} (expected {SNAPSHOT_VERSION})", meta.version);
    }
    let terms: Vec<Term> = load_bin(paths.terms())?;
    let synonyms: Vec<SynonymEdge> = load_bin(paths.synonyms())?;
    let postings: Vec<Posting> = load_bin(paths.postings())?;
    let documents: Vec<Document> = load_bin(paths.docs())?;
    if documents.len() as u32 != meta.num_docs {
        bail!("snapshot meta lists {} docs but docs.bin holds {}", meta.num_docs, documents.len());
    }
    tracing::info!(num_docs = meta.num_docs, num_terms = meta.num_terms, created_at = %meta.created_at, "loaded snapshot");
    Ok(IndexSnapshot { terms, synonyms, postings, documents })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn rejects_unknown_version() {
        let dir = tempfile::tempdir().unwrap();
        let paths = SnapshotPaths::new(dir.path());
        save_snapshot(&paths, &IndexSnapshot::default()).unwrap();
        save_meta(&paths, &MetaFile { num_docs: 0, num_terms: 0, created_at: String::new(), version: 99 }).unwrap();
        assert!(load_snapshot(&paths).is_err());
    }

    #[test]
    fn dates_survive_bincode() {
        let dir = tempfile::tempdir().unwrap();
        let paths = SnapshotPaths::new(dir.path());
        let snapshot = IndexSnapshot {
            documents: vec![Document { id: 1, url: "u".into(), title: "t".into(), author: "a".into(), date: date!(2021 - 03 - 04) }],
            ..Default::default()
        };
        save_snapshot(&paths, &snapshot).unwrap();
        assert_eq!(load_snapshot(&paths).unwrap(), snapshot);
        let created_at = load_meta(&paths).unwrap().created_at;
        assert!(OffsetDateTime::parse(&created_at, &Rfc3339).is_ok());
    }
}
