//! Ingestion pipeline: uploaded files → records → knowledge store.
//!
//! Documents (PDF, DOCX, text) go through text extraction and then the
//! field extractor, producing one record each. Datasets (CSV, JSON) produce
//! one record per row. Directories are walked with the configured
//! include/exclude globs.
//!
//! Each upload is appended as a unit: if any of its records is rejected by
//! the store's schema, the store is rolled back to its state before that
//! upload.

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use query_desk_core::{Record, RecordStore, StoreError};

use crate::config::{Config, IngestConfig};
use crate::dataset::{load_dataset, DatasetFormat};
use crate::extract::{content_type_for, extract_document};
use crate::persist::{load_store, save_store};

/// One file's worth of records, ready to append.
#[derive(Debug, Clone)]
pub enum Upload {
    Document { path: PathBuf, record: Record },
    Dataset { path: PathBuf, records: Vec<Record> },
}

impl Upload {
    pub fn path(&self) -> &Path {
        match self {
            Upload::Document { path, .. } | Upload::Dataset { path, .. } => path,
        }
    }

    pub fn records(&self) -> &[Record] {
        match self {
            Upload::Document { record, .. } => std::slice::from_ref(record),
            Upload::Dataset { records, .. } => records,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub documents: usize,
    pub rows: usize,
}

pub fn is_supported(path: &Path) -> bool {
    DatasetFormat::for_path(path).is_some() || content_type_for(path).is_some()
}

/// Expand `paths` into the files to ingest, in a stable order.
///
/// Files named directly must be a supported type. Directories are walked
/// and filtered by the ingest globs, then sorted.
pub fn scan_paths(config: &IngestConfig, paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let include_set = build_globset(&config.include_globs)?;
    let exclude_set = build_globset(&config.exclude_globs)?;

    let mut files = Vec::new();
    for root in paths {
        if !root.exists() {
            bail!("Path does not exist: {}", root.display());
        }
        if root.is_file() {
            if !is_supported(root) {
                bail!("Unsupported file type: {}", root.display());
            }
            files.push(root.clone());
            continue;
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(root).follow_links(config.follow_symlinks) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let relative = path.strip_prefix(root).unwrap_or(path);
            let rel_str = relative.to_string_lossy();
            if exclude_set.is_match(rel_str.as_ref()) || !include_set.is_match(rel_str.as_ref()) {
                continue;
            }
            if is_supported(path) {
                found.push(path.to_path_buf());
            }
        }
        found.sort();
        files.extend(found);
    }
    Ok(files)
}

/// Read one file into an [`Upload`].
///
/// Document text that cannot be extracted is logged and treated as empty,
/// which yields the sentinel record.
pub fn read_upload(path: &Path) -> Result<Upload> {
    if DatasetFormat::for_path(path).is_some() {
        let records = load_dataset(path)?;
        return Ok(Upload::Dataset {
            path: path.to_path_buf(),
            records,
        });
    }

    Ok(Upload::Document {
        path: path.to_path_buf(),
        record: extract_document(path)?,
    })
}

/// Append every record of `upload`, rolling back on a schema mismatch.
pub fn append_upload(store: &dyn RecordStore, upload: &Upload) -> Result<(), StoreError> {
    let before = store.all();
    for record in upload.records() {
        if let Err(e) = store.append(record.clone()) {
            store.reload(before)?;
            return Err(e);
        }
    }
    Ok(())
}

/// Append all uploads, stopping at the first rejected one.
pub fn ingest_uploads(store: &dyn RecordStore, uploads: &[Upload]) -> Result<IngestReport> {
    let mut report = IngestReport::default();
    for upload in uploads {
        append_upload(store, upload)
            .with_context(|| format!("Cannot ingest {}", upload.path().display()))?;
        match upload {
            Upload::Document { .. } => report.documents += 1,
            Upload::Dataset { records, .. } => report.rows += records.len(),
        }
        tracing::info!(path = %upload.path().display(), records = upload.records().len(), "ingested");
    }
    Ok(report)
}

/// `qdesk ingest`: ingest files and directories into the store file.
pub fn run_ingest(config: &Config, paths: &[PathBuf], dry_run: bool) -> Result<()> {
    let files = scan_paths(&config.ingest, paths)?;
    let uploads = files
        .iter()
        .map(|p| read_upload(p))
        .collect::<Result<Vec<_>>>()?;

    if dry_run {
        let documents = uploads
            .iter()
            .filter(|u| matches!(u, Upload::Document { .. }))
            .count();
        let rows: usize = uploads
            .iter()
            .filter_map(|u| match u {
                Upload::Dataset { records, .. } => Some(records.len()),
                Upload::Document { .. } => None,
            })
            .sum();
        println!("ingest (dry-run)");
        println!("  files found: {}", files.len());
        println!("  documents: {}", documents);
        println!("  dataset rows: {}", rows);
        return Ok(());
    }

    let store = load_store(config)?;
    let report = ingest_uploads(&store, &uploads)?;
    save_store(&config.store.path, &store)?;

    println!("ingest");
    println!("  documents: {}", report.documents);
    println!("  dataset rows: {}", report.rows);
    println!("  records in store: {}", store.len());
    println!("ok");
    Ok(())
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use query_desk_core::InMemoryStore;
    use std::fs;

    fn qa(q: &str, a: &str) -> Record {
        Record::new().with("Question", q).with("Response", a)
    }

    #[test]
    fn directories_are_filtered_and_sorted() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("b.txt"), "b").unwrap();
        fs::write(root.join("a.csv"), "x\n1\n").unwrap();
        fs::write(root.join("sub/c.md"), "c").unwrap();
        fs::write(root.join("skip.bin"), "?").unwrap();
        fs::write(root.join("sub/ignored.txt"), "i").unwrap();

        let cfg = IngestConfig {
            exclude_globs: vec!["**/ignored.txt".to_string()],
            ..IngestConfig::default()
        };
        let files = scan_paths(&cfg, &[root.to_path_buf()]).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["a.csv", "b.txt", "sub/c.md"]);
    }

    #[test]
    fn unsupported_file_named_directly_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("blob.bin");
        fs::write(&path, "x").unwrap();
        assert!(scan_paths(&IngestConfig::default(), &[path]).is_err());
    }

    #[test]
    fn text_document_becomes_extracted_record() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cv.txt");
        fs::write(&path, "Grace Hopper\ngrace@navy.example.mil\nCompiler pioneer").unwrap();
        let upload = read_upload(&path).unwrap();
        let record = &upload.records()[0];
        assert_eq!(record.get("name"), Some("Grace Hopper"));
        assert_eq!(record.get("contact"), Some("grace@navy.example.mil"));
    }

    #[test]
    fn broken_document_becomes_sentinel_record() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.pdf");
        fs::write(&path, "not a pdf").unwrap();
        let upload = read_upload(&path).unwrap();
        assert_eq!(
            upload.records()[0],
            query_desk_core::extract::sentinel_record()
        );
    }

    #[test]
    fn rejected_upload_rolls_back() {
        let store = InMemoryStore::new();
        store.append(qa("fever", "rest")).unwrap();
        let before = store.all();

        let upload = Upload::Dataset {
            path: PathBuf::from("mixed.json"),
            records: vec![qa("cold", "fluids"), Record::new().with("Mood", "sad")],
        };
        assert!(append_upload(&store, &upload).is_err());
        assert_eq!(store.all(), before);
    }

    #[test]
    fn rejected_first_upload_clears_inferred_schema() {
        let store = InMemoryStore::new();
        let upload = Upload::Dataset {
            path: PathBuf::from("mixed.json"),
            records: vec![qa("cold", "fluids"), Record::new().with("Mood", "sad")],
        };
        assert!(append_upload(&store, &upload).is_err());
        assert!(store.is_empty());
        assert_eq!(store.columns(), None);
    }

    #[test]
    fn report_counts_documents_and_rows() {
        let store = InMemoryStore::new();
        let uploads = vec![Upload::Dataset {
            path: PathBuf::from("rows.csv"),
            records: vec![qa("a", "1"), qa("b", "2")],
        }];
        let report = ingest_uploads(&store, &uploads).unwrap();
        assert_eq!(report, IngestReport { documents: 0, rows: 2 });
        assert_eq!(store.len(), 2);
    }
}
