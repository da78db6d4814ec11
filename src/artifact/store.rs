//! Blob storage collaborator.

use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};

use crate::error::ForecastError;

/// Read access to the storage holding artifacts and configuration documents.
pub trait BlobStore {
    /// Reads an object as UTF-8 text. Returns `Ok(None)` if it does not exist.
    fn read_object(&self, location: &str, key: &str) -> Result<Option<String>, ForecastError>;

    /// Size of an object in bytes.
    fn object_size(&self, location: &str, key: &str) -> Result<u64, ForecastError>;

    /// Number of records in a delimited object.
    fn record_count(&self, location: &str, key: &str) -> Result<u64, ForecastError>;
}

/// A [`BlobStore`] backed by a local directory tree.
///
/// Each location is a subdirectory of `root`; keys are relative paths in it.
#[derive(Clone, Debug)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, location: &str, key: &str) -> PathBuf {
        self.root.join(location).join(key)
    }
}

impl BlobStore for FsBlobStore {
    fn read_object(&self, location: &str, key: &str) -> Result<Option<String>, ForecastError> {
        match std::fs::read_to_string(self.path(location, key)) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(ForecastError::Io(err)),
        }
    }

    fn object_size(&self, location: &str, key: &str) -> Result<u64, ForecastError> {
        let metadata = std::fs::metadata(self.path(location, key))?;
        Ok(metadata.len())
    }

    fn record_count(&self, location: &str, key: &str) -> Result<u64, ForecastError> {
        let path = self.path(location, key);
        let file = File::open(&path)?;

        // artifacts carry no header row
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(BufReader::new(file));

        let mut count = 0u64;
        let mut record = csv::ByteRecord::new();
        loop {
            match reader.read_byte_record(&mut record) {
                Ok(true) => count += 1,
                Ok(false) => break,
                Err(source) => return Err(ForecastError::ArtifactRead { path, source }),
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_records_and_bytes() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let dir = temp.path().join("bucket");
        std::fs::create_dir_all(&dir).unwrap();
        let body = "item_1,2020-01-01,3\nitem_2,2020-01-01,4\nitem_1,2020-01-02,5\n";
        std::fs::write(dir.join("Demand.csv"), body).unwrap();

        let store = FsBlobStore::new(temp.path());
        assert_eq!(store.record_count("bucket", "Demand.csv").unwrap(), 3);
        assert_eq!(
            store.object_size("bucket", "Demand.csv").unwrap(),
            body.len() as u64
        );
    }

    #[test]
    fn missing_object_reads_as_none() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let store = FsBlobStore::new(temp.path());
        assert!(store.read_object("bucket", "absent.yaml").unwrap().is_none());
        assert!(store.record_count("bucket", "absent.csv").is_err());
    }
}
