//! JSON / JSONL backed catalog partition.
//!
//! Files are re-read on every call, so a rebuild picks up edits made on disk.

use crate::error::{EngineError, Result};
use crate::fallback::scan_records;
use crate::index::{Record, RecordId, SourceType};
use crate::source::{PrimaryCatalog, SecondarySource};
use async_trait::async_trait;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Deserialize)]
struct InputRecord {
    id: RecordId,
    title: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    genres: Vec<String>,
    #[serde(default)]
    purchase_links: Vec<String>,
}

impl InputRecord {
    fn into_record(self, source_type: SourceType) -> Record {
        Record {
            id: self.id,
            title: self.title,
            author: self.author,
            genres: self.genres,
            source_type,
            purchase_links: self.purchase_links,
        }
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> EngineError + '_ {
    move |err| EngineError::Io { path: path.to_path_buf(), err }
}

fn parse_err(path: &Path, e: serde_json::Error) -> EngineError {
    EngineError::Parse { path: path.to_path_buf(), message: e.to_string() }
}

/// Catalog files under `path`: the file itself, or every `.json`/`.jsonl` below a directory
/// in file name order.
pub fn catalog_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(EngineError::Io {
            path: path.to_path_buf(),
            err: std::io::Error::new(std::io::ErrorKind::NotFound, "catalog path not found"),
        });
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry.map_err(|e| EngineError::Io {
            path: path.to_path_buf(),
            err: e.into(),
        })?;
        let p = entry.path();
        if p.is_file() && matches!(p.extension().and_then(|s| s.to_str()), Some("json" | "jsonl")) {
            files.push(p.to_path_buf());
        }
    }
    Ok(files)
}

/// Load every record under `path`, tagging each with `source_type`.
pub fn load_records(path: &Path, source_type: SourceType) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    for file in catalog_files(path)? {
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(&file, source_type, &mut records)?;
        } else {
            read_json(&file, source_type, &mut records)?;
        }
    }
    tracing::debug!(path = %path.display(), %source_type, records = records.len(), "catalog loaded");
    Ok(records)
}

fn read_jsonl(file: &Path, source_type: SourceType, out: &mut Vec<Record>) -> Result<()> {
    let reader = BufReader::new(File::open(file).map_err(io_err(file))?);
    for line in reader.lines() {
        let line = line.map_err(io_err(file))?;
        if line.trim().is_empty() { continue; }
        let input: InputRecord = serde_json::from_str(&line).map_err(|e| parse_err(file, e))?;
        out.push(input.into_record(source_type));
    }
    Ok(())
}

fn read_json(file: &Path, source_type: SourceType, out: &mut Vec<Record>) -> Result<()> {
    let reader = BufReader::new(File::open(file).map_err(io_err(file))?);
    let json: serde_json::Value = serde_json::from_reader(reader).map_err(|e| parse_err(file, e))?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                let input: InputRecord = serde_json::from_value(v).map_err(|e| parse_err(file, e))?;
                out.push(input.into_record(source_type));
            }
        }
        serde_json::Value::Object(_) => {
            let input: InputRecord = serde_json::from_value(json).map_err(|e| parse_err(file, e))?;
            out.push(input.into_record(source_type));
        }
        _ => tracing::warn!(file = %file.display(), "ignoring catalog file that is neither array nor object"),
    }
    Ok(())
}

/// One catalog partition stored as JSON / JSONL files.
#[derive(Debug, Clone)]
pub struct FileCatalog {
    root: PathBuf,
    source_type: SourceType,
}

impl FileCatalog {
    pub fn new<P: AsRef<Path>>(root: P, source_type: SourceType) -> Self {
        Self { root: root.as_ref().to_path_buf(), source_type }
    }

    async fn load(&self) -> anyhow::Result<Vec<Record>> {
        let root = self.root.clone();
        let source_type = self.source_type;
        let records = tokio::task::spawn_blocking(move || load_records(&root, source_type)).await??;
        Ok(records)
    }
}

#[async_trait]
impl PrimaryCatalog for FileCatalog {
    async fn fetch_primary_catalog(&self, max_count: usize) -> anyhow::Result<Vec<Record>> {
        let mut records = self.load().await?;
        records.truncate(max_count);
        Ok(records)
    }
}

#[async_trait]
impl SecondarySource for FileCatalog {
    async fn search_substring(&self, pattern: &str, limit: usize) -> anyhow::Result<Vec<Record>> {
        let records = self.load().await?;
        Ok(scan_records(&records, pattern, limit).into_iter().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn loads_json_and_jsonl_in_name_order() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("a.jsonl"),
            "{\"id\":1,\"title\":\"Dragon Sky\",\"author\":\"An\",\"genres\":[\"fantasy\"]}\n\n{\"id\":\"x-2\",\"title\":\"Dragon Moon\"}\n",
        )
        .unwrap();
        fs::write(dir.path().join("b.json"), r#"[{"id":3,"title":"Sea Glass","author":"Mai"}]"#).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let records = load_records(dir.path(), SourceType::Licensed).unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "x-2", "3"]);
        assert!(records.iter().all(|r| r.source_type == SourceType::Licensed));
        assert_eq!(records[1].author, "");
    }

    #[test]
    fn malformed_line_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("bad.jsonl");
        fs::write(&file, "{not json}\n").unwrap();
        let err = load_records(&file, SourceType::Primary).unwrap_err();
        assert!(matches!(err, EngineError::Parse { .. }));
    }

    #[test]
    fn missing_path_is_an_io_error() {
        let dir = tempdir().unwrap();
        let err = load_records(&dir.path().join("absent"), SourceType::Primary).unwrap_err();
        assert!(matches!(err, EngineError::Io { .. }));
    }

    #[tokio::test]
    async fn file_catalog_serves_both_roles() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("c.json"), r#"[{"id":1,"title":"Night Market"},{"id":2,"title":"Day Market"}]"#).unwrap();
        let catalog = FileCatalog::new(dir.path(), SourceType::Ebook);
        assert_eq!(catalog.fetch_primary_catalog(1).await.unwrap().len(), 1);
        let hits = catalog.search_substring("night", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].source_type, SourceType::Ebook);
    }
}
