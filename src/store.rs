//! Document store client
//!
//! Collections are JSON-lines files of flat documents under a root directory
//! addressed by a connection string (`file://<root>` or a bare path). The
//! connection string is threaded in from the binary, which reads it from
//! [`STORE_URL_ENV`].

use crate::error::{PhishGuardError, Result};
use serde_json::{Map, Value};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use tracing::info;

/// Environment variable carrying the store connection string
pub const STORE_URL_ENV: &str = "PHISHGUARD_STORE_URL";

/// One flat JSON document
pub type Document = Map<String, Value>;

/// File-backed document store client
#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    /// Open a store from a connection string
    pub fn connect(url: &str) -> Result<Self> {
        let path = url.strip_prefix("file://").unwrap_or(url);
        if path.is_empty() {
            return Err(PhishGuardError::Store(
                "empty store connection string".to_string(),
            ));
        }
        Ok(Self {
            root: PathBuf::from(path),
        })
    }

    fn collection_path(&self, database: &str, collection: &str) -> PathBuf {
        self.root.join(database).join(format!("{collection}.jsonl"))
    }

    /// Fetch every document in a collection
    pub fn fetch_all(&self, database: &str, collection: &str) -> Result<Vec<Document>> {
        let path = self.collection_path(database, collection);
        let file = fs::File::open(&path).map_err(|e| {
            PhishGuardError::Store(format!("cannot open collection {}: {e}", path.display()))
        })?;

        let mut documents = Vec::new();
        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| PhishGuardError::Store(e.to_string()))?;
            if line.trim().is_empty() {
                continue;
            }
            let doc: Document = serde_json::from_str(&line).map_err(|e| {
                PhishGuardError::Store(format!(
                    "malformed document at {}:{}: {e}",
                    path.display(),
                    line_no + 1
                ))
            })?;
            documents.push(doc);
        }

        info!(
            database,
            collection,
            count = documents.len(),
            "fetched documents"
        );
        Ok(documents)
    }

    /// Append documents to a collection, returning how many were written
    pub fn insert_many(
        &self,
        database: &str,
        collection: &str,
        documents: &[Document],
    ) -> Result<usize> {
        let path = self.collection_path(database, collection);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| PhishGuardError::Store(format!("cannot create {database}: {e}")))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                PhishGuardError::Store(format!("cannot open collection {}: {e}", path.display()))
            })?;

        for doc in documents {
            let line = serde_json::to_string(doc)?;
            writeln!(file, "{line}").map_err(|e| PhishGuardError::Store(e.to_string()))?;
        }

        info!(
            database,
            collection,
            count = documents.len(),
            "inserted documents"
        );
        Ok(documents.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn doc(pairs: &[(&str, Value)]) -> Document {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_insert_then_fetch() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::connect(dir.path().to_str().unwrap()).unwrap();

        let docs = vec![
            doc(&[("a", json!(1)), ("b", json!(-1))]),
            doc(&[("a", json!(0)), ("b", json!(1))]),
        ];
        let written = store.insert_many("db", "coll", &docs).unwrap();
        assert_eq!(written, 2);

        let fetched = store.fetch_all("db", "coll").unwrap();
        assert_eq!(fetched.len(), 2);
        assert_eq!(fetched[0]["a"], json!(1));
    }

    #[test]
    fn test_insert_appends() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::connect(dir.path().to_str().unwrap()).unwrap();

        let docs = vec![doc(&[("a", json!(1))])];
        store.insert_many("db", "coll", &docs).unwrap();
        store.insert_many("db", "coll", &docs).unwrap();

        assert_eq!(store.fetch_all("db", "coll").unwrap().len(), 2);
    }

    #[test]
    fn test_fetch_missing_collection_is_store_error() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::connect(dir.path().to_str().unwrap()).unwrap();

        let err = store.fetch_all("db", "nope").unwrap_err();
        assert!(matches!(err, PhishGuardError::Store(_)));
    }

    #[test]
    fn test_file_url_prefix() {
        let dir = TempDir::new().unwrap();
        let url = format!("file://{}", dir.path().display());
        let store = DocumentStore::connect(&url).unwrap();
        store.insert_many("db", "c", &[doc(&[("x", json!(1))])]).unwrap();
        assert_eq!(store.fetch_all("db", "c").unwrap().len(), 1);
    }

    #[test]
    fn test_empty_url_rejected() {
        assert!(DocumentStore::connect("").is_err());
        assert!(DocumentStore::connect("file://").is_err());
    }
}
