//! Per-day log files under per-year directories.
//!
//! # Responsibilities
//! - Map a report's local date to `<root>/<year>/<YYYY-MM-DD><suffix>`
//! - Create year directories lazily
//! - Append one complete line per report
//! - Read every log file back as a snapshot
//!
//! # Design Decisions
//! - Appends to the same file are serialized through a per-path async mutex,
//!   so line integrity never depends on OS append semantics
//! - Each line is written with a single `write_all` of the full buffer
//! - Files are never truncated, rewritten or removed

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use dashmap::DashMap;
use serde::Serialize;
use thiserror::Error;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::config::LogStoreConfig;
use crate::logstore::report::ErrorReport;

/// File name → full text content.
pub type LogSnapshot = BTreeMap<String, String>;

/// Filesystem failure while writing or reading logs.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to append to {}: {source}", path.display())]
    Append { path: PathBuf, source: io::Error },

    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
}

/// Where a report was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredEntry {
    pub file: String,
    pub path: PathBuf,
}

/// Append-only store rooted at a single directory.
#[derive(Debug)]
pub struct LogStore {
    root: PathBuf,
    suffix: String,
    /// One writer lock per day file.
    locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl LogStore {
    /// Create a store. Nothing is touched on disk until the first append.
    pub fn new(root: impl Into<PathBuf>, suffix: impl Into<String>) -> Self {
        let root = root.into();
        let root = std::path::absolute(&root).unwrap_or(root);
        Self {
            root,
            suffix: suffix.into(),
            locks: DashMap::new(),
        }
    }

    pub fn from_config(config: &LogStoreConfig) -> Self {
        Self::new(&config.root_dir, config.file_suffix.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `YYYY-MM-DD<suffix>` for the given local date.
    pub fn file_name(&self, date: NaiveDate) -> String {
        format!("{}{}", date.format("%Y-%m-%d"), self.suffix)
    }

    pub fn year_dir(&self, year: i32) -> PathBuf {
        self.root.join(year.to_string())
    }

    /// Full path of the file a report stamped `timestamp` belongs to.
    pub fn file_path(&self, timestamp: &NaiveDateTime) -> PathBuf {
        self.year_dir(timestamp.year())
            .join(self.file_name(timestamp.date()))
    }

    /// Append one report line, creating the year directory and file as needed.
    pub async fn append(&self, report: &ErrorReport) -> Result<StoredEntry, StoreError> {
        let dir = self.year_dir(report.timestamp.year());
        fs::create_dir_all(&dir)
            .await
            .map_err(|source| StoreError::CreateDir {
                path: dir.clone(),
                source,
            })?;

        let file = self.file_name(report.timestamp.date());
        let path = dir.join(&file);
        let line = format_line(report);

        let lock = self.locks.entry(path.clone()).or_default().value().clone();
        let guard = lock.lock().await;
        let written = write_line(&path, line.as_bytes()).await;
        drop(guard);
        drop(lock);
        // Only the map's own handle left: no writer is queued on this file.
        self.locks.remove_if(&path, |_, lock| Arc::strong_count(lock) == 1);

        written.map_err(|source| StoreError::Append {
            path: path.clone(),
            source,
        })?;

        tracing::debug!(path = %path.display(), bytes = line.len(), "Appended report");
        Ok(StoredEntry { file, path })
    }

    /// Read every `<root>/<year>/*.txt` file, not only those this store
    /// wrote, so hand-placed notes in a year directory show up too.
    ///
    /// A missing root yields an empty snapshot; any other read failure
    /// aborts the whole snapshot.
    pub async fn snapshot(&self) -> Result<LogSnapshot, StoreError> {
        let mut logs = LogSnapshot::new();

        let mut years = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(logs),
            Err(source) => return Err(self.read_error(&self.root, source)),
        };

        while let Some(year) = years
            .next_entry()
            .await
            .map_err(|source| self.read_error(&self.root, source))?
        {
            let year_path = year.path();
            let metadata = fs::metadata(&year_path)
                .await
                .map_err(|source| self.read_error(&year_path, source))?;
            if !metadata.is_dir() {
                continue;
            }

            let mut files = fs::read_dir(&year_path)
                .await
                .map_err(|source| self.read_error(&year_path, source))?;

            while let Some(file) = files
                .next_entry()
                .await
                .map_err(|source| self.read_error(&year_path, source))?
            {
                let file_path = file.path();
                if file_path.extension().and_then(|ext| ext.to_str()) != Some("txt") {
                    continue;
                }
                let name = file.file_name().to_string_lossy().into_owned();
                let content = fs::read_to_string(&file_path)
                    .await
                    .map_err(|source| self.read_error(&file_path, source))?;
                logs.insert(name, content);
            }
        }

        Ok(logs)
    }

    fn read_error(&self, path: &Path, source: io::Error) -> StoreError {
        StoreError::Read {
            path: path.to_path_buf(),
            source,
        }
    }
}

async fn write_line(path: &Path, line: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(line).await?;
    file.flush().await
}

/// `HH:MM:SS - [<context>] <error>\n`.
///
/// Line breaks inside the report are flattened to spaces.
pub fn format_line(report: &ErrorReport) -> String {
    format!(
        "{} - [{}] {}\n",
        report.timestamp.format("%H:%M:%S"),
        single_line(&report.context),
        single_line(&report.error)
    )
}

fn single_line(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn at(raw: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    fn store(dir: &TempDir) -> LogStore {
        LogStore::new(dir.path().join("logs"), " ErrLog.txt")
    }

    #[test]
    fn test_paths_and_names() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let ts = at("2024-03-05T07:08:09");

        assert_eq!(store.file_name(ts.date()), "2024-03-05 ErrLog.txt");
        assert_eq!(
            store.file_path(&ts),
            dir.path().join("logs").join("2024").join("2024-03-05 ErrLog.txt")
        );
    }

    #[test]
    fn test_format_line() {
        let report = ErrorReport::new("HTTP error! status: 500", "fetching films", at("2024-03-05T07:08:09"));
        assert_eq!(
            format_line(&report),
            "07:08:09 - [fetching films] HTTP error! status: 500\n"
        );

        let multiline = ErrorReport::new("line one\nline two\r\nline three", "ctx", at("2024-03-05T23:00:00"));
        assert_eq!(
            format_line(&multiline),
            "23:00:00 - [ctx] line one line two line three\n"
        );
    }

    #[tokio::test]
    async fn test_append_creates_directories_and_appends() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let first = store
            .append(&ErrorReport::new("boom", "people", at("2024-03-05T07:08:09")))
            .await
            .unwrap();
        store
            .append(&ErrorReport::new("bang", "planets", at("2024-03-05T07:08:10")))
            .await
            .unwrap();

        assert_eq!(first.file, "2024-03-05 ErrLog.txt");
        let content = std::fs::read_to_string(&first.path).unwrap();
        assert_eq!(
            content,
            "07:08:09 - [people] boom\n07:08:10 - [planets] bang\n"
        );
        assert!(store.locks.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_appends_keep_every_line() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(store(&dir));

        let mut handles = Vec::new();
        for i in 0..64 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let error = format!("failure number {i} {}", "x".repeat(512));
                store
                    .append(&ErrorReport::new(error, "load", at("2024-06-01T12:00:00")))
                    .await
                    .unwrap()
            }));
        }
        let mut path = None;
        for handle in handles {
            path = Some(handle.await.unwrap().path);
        }

        let content = std::fs::read_to_string(path.unwrap()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 64);
        for i in 0..64 {
            let expected = format!("12:00:00 - [load] failure number {i} {}", "x".repeat(512));
            assert_eq!(lines.iter().filter(|l| **l == expected).count(), 1);
        }
        assert!(store.locks.is_empty());
    }

    #[tokio::test]
    async fn test_year_boundary_uses_two_directories() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let a = store
            .append(&ErrorReport::new("a", "c", at("2024-12-31T23:59:59")))
            .await
            .unwrap();
        let b = store
            .append(&ErrorReport::new("b", "c", at("2025-01-01T00:00:01")))
            .await
            .unwrap();

        assert!(a.path.starts_with(dir.path().join("logs").join("2024")));
        assert!(b.path.starts_with(dir.path().join("logs").join("2025")));
    }

    #[tokio::test]
    async fn test_snapshot_without_root_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert!(store.snapshot().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_groups_by_file() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store
            .append(&ErrorReport::new("a", "one", at("2024-12-31T10:00:00")))
            .await
            .unwrap();
        store
            .append(&ErrorReport::new("b", "two", at("2025-01-02T11:00:00")))
            .await
            .unwrap();
        store
            .append(&ErrorReport::new("c", "three", at("2025-01-02T11:30:00")))
            .await
            .unwrap();

        // Stray entries that are not log files.
        std::fs::write(dir.path().join("logs").join("README"), "x").unwrap();
        std::fs::write(dir.path().join("logs").join("2025").join("notes.md"), "x").unwrap();
        // Any text file in a year directory is part of the snapshot.
        std::fs::write(dir.path().join("logs").join("2025").join("imported.txt"), "old\n").unwrap();

        let logs = store.snapshot().await.unwrap();
        assert_eq!(logs.len(), 3);
        assert_eq!(logs["imported.txt"], "old\n");
        assert_eq!(logs["2024-12-31 ErrLog.txt"], "10:00:00 - [one] a\n");
        assert_eq!(
            logs["2025-01-02 ErrLog.txt"],
            "11:00:00 - [two] b\n11:30:00 - [three] c\n"
        );
    }

    #[tokio::test]
    async fn test_append_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        // The root is a regular file, so the year directory cannot be created.
        let root = dir.path().join("logs");
        std::fs::write(&root, "not a directory").unwrap();
        let store = LogStore::new(&root, " ErrLog.txt");

        let err = store
            .append(&ErrorReport::new("a", "c", at("2024-01-01T00:00:00")))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::CreateDir { .. }));
        assert!(err.to_string().contains("2024"));
    }

    #[tokio::test]
    async fn test_snapshot_failure_aborts() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let year = dir.path().join("logs").join("2024");
        std::fs::create_dir_all(&year).unwrap();
        // Invalid UTF-8 cannot be returned as text.
        std::fs::write(year.join("2024-01-01 ErrLog.txt"), [0xff, 0xfe, 0x00]).unwrap();

        assert!(matches!(
            store.snapshot().await,
            Err(StoreError::Read { .. })
        ));
    }
}
