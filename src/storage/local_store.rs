//! Local disk storage implementation
//!
//! Entry bytes are staged under the temp path while an upload is in flight
//! and renamed into the base path on finalize, together with a JSON metadata
//! sidecar. Only entries with a sidecar are resolvable, so a reader can
//! never observe a half-written entry.

use crate::config::StorageConfig;
use crate::storage::{Storage, StorageEntry};
use actix_web::error::ErrorInternalServerError;
use actix_web::Error;
use chrono::Utc;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

fn ensure_directory(path: &str) -> PathBuf {
    let path = PathBuf::from(path);
    if !path.exists() {
        fs::create_dir_all(&path).expect("Failed to create storage directory");
    }
    path
}

/// Metadata persisted next to an entry's data file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct EntryMeta {
    filename: String,
    content_type: String,
    etag: String,
}

/// Local disk storage backend
pub struct LocalDiskStore {
    base_path: PathBuf,
    temp_path: PathBuf,
    sequence: AtomicU64,
}

impl LocalDiskStore {
    pub fn new(config: Option<&StorageConfig>) -> Self {
        let (base, temp) = match config {
            Some(cfg) => (cfg.base_path.clone(), cfg.temp_path.clone()),
            None => ("storage".to_string(), "temp".to_string()),
        };
        let base_path = ensure_directory(&base);
        let temp_path = ensure_directory(&temp);
        info!("Using local disk storage with base_path: {}, temp_path: {}",
              base_path.display(), temp_path.display());
        Self {
            base_path,
            temp_path,
            sequence: AtomicU64::new(0),
        }
    }

    /// Derive a fresh id from the current time and a process-local sequence
    fn next_id(&self) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let stamp = Utc::now().timestamp_millis();
        let digest = md5::compute(format!("{}-{}", stamp, seq));
        hex::encode(&digest.0[..8])
    }

    fn staged_path(&self, id: &str) -> PathBuf {
        self.temp_path.join(format!("{}.bin", id))
    }

    fn data_path(&self, id: &str) -> PathBuf {
        self.base_path.join(format!("{}.bin", id))
    }

    fn meta_path(&self, id: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", id))
    }
}

impl Storage for LocalDiskStore {
    fn create_entry(&self) -> Result<Box<dyn StorageEntry>, Error> {
        let id = self.next_id();
        info!("Allocated entry {}", id);
        Ok(Box::new(LocalDiskEntry {
            staged_path: self.staged_path(&id),
            data_path: self.data_path(&id),
            meta_path: self.meta_path(&id),
            meta_temp_path: self.temp_path.join(format!("{}.json", id)),
            id,
            meta: EntryMeta::default(),
        }))
    }

    fn load_entry(&self, id: &str) -> Result<Option<Box<dyn StorageEntry>>, Error> {
        // Ids are hex strings; anything else can only be a probe and must
        // never reach the filesystem as a path component.
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            warn!("Rejected lookup of malformed id {:?}", id);
            return Ok(None);
        }
        let meta_path = self.meta_path(id);
        let content = match fs::read_to_string(&meta_path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ErrorInternalServerError(e)),
        };
        let meta: EntryMeta = serde_json::from_str(&content)
            .map_err(ErrorInternalServerError)?;
        Ok(Some(Box::new(LocalDiskEntry {
            staged_path: self.staged_path(id),
            data_path: self.data_path(id),
            meta_temp_path: self.temp_path.join(format!("{}.json", id)),
            meta_path,
            id: id.to_string(),
            meta,
        })))
    }
}

/// One entry on the local disk backend
struct LocalDiskEntry {
    id: String,
    staged_path: PathBuf,
    data_path: PathBuf,
    meta_path: PathBuf,
    meta_temp_path: PathBuf,
    meta: EntryMeta,
}

impl LocalDiskEntry {
    /// Stream the staged file through MD5 to derive the etag
    fn compute_etag(&self) -> io::Result<String> {
        let mut file = File::open(&self.staged_path)?;
        let mut context = md5::Context::new();
        let mut buffer = [0u8; 8192];
        loop {
            let n = file.read(&mut buffer)?;
            if n == 0 {
                break;
            }
            context.consume(&buffer[..n]);
        }
        Ok(format!("\"{}\"", hex::encode(context.compute().0)))
    }
}

impl StorageEntry for LocalDiskEntry {
    fn id(&self) -> &str {
        &self.id
    }

    fn save(&mut self) -> Result<(), Error> {
        File::create(&self.staged_path).map_err(ErrorInternalServerError)?;
        Ok(())
    }

    fn set_filename(&mut self, filename: &str) {
        self.meta.filename = filename.to_string();
    }

    fn set_content_type(&mut self, content_type: &str) {
        self.meta.content_type = content_type.to_string();
    }

    fn filename(&self) -> &str {
        &self.meta.filename
    }

    fn content_type(&self) -> &str {
        &self.meta.content_type
    }

    fn etag(&self) -> &str {
        &self.meta.etag
    }

    fn open_writer(&mut self) -> Result<Box<dyn Write + Send>, Error> {
        let file = OpenOptions::new()
            .append(true)
            .open(&self.staged_path)
            .map_err(ErrorInternalServerError)?;
        Ok(Box::new(file))
    }

    fn open_reader(&self) -> Result<Box<dyn Read + Send>, Error> {
        let file = File::open(&self.data_path).map_err(ErrorInternalServerError)?;
        Ok(Box::new(file))
    }

    fn finalize(&mut self) -> Result<(), Error> {
        self.meta.etag = self.compute_etag().map_err(ErrorInternalServerError)?;
        // Data lands first, the sidecar last: the entry only becomes
        // resolvable once both are in place.
        fs::rename(&self.staged_path, &self.data_path)
            .map_err(ErrorInternalServerError)?;
        let content = serde_json::to_string(&self.meta)
            .map_err(ErrorInternalServerError)?;
        fs::write(&self.meta_temp_path, content).map_err(ErrorInternalServerError)?;
        fs::rename(&self.meta_temp_path, &self.meta_path)
            .map_err(ErrorInternalServerError)?;
        info!("Finalized entry {} ({} / {})", self.id, self.meta.filename, self.meta.content_type);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> LocalDiskStore {
        let config = StorageConfig {
            backend: crate::config::StorageBackend::LocalDisk,
            base_path: dir.path().join("storage").to_string_lossy().to_string(),
            temp_path: dir.path().join("temp").to_string_lossy().to_string(),
        };
        LocalDiskStore::new(Some(&config))
    }

    fn upload(store: &LocalDiskStore, filename: &str, content_type: &str, data: &[u8]) -> String {
        let mut entry = store.create_entry().unwrap();
        entry.save().unwrap();
        entry.set_filename(filename);
        entry.set_content_type(content_type);
        {
            let mut writer = entry.open_writer().unwrap();
            writer.write_all(data).unwrap();
        }
        entry.finalize().unwrap();
        entry.id().to_string()
    }

    #[test]
    fn test_local_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let id = upload(&store, "photo.png", "image/png", b"png bytes");

        let entry = store.load_entry(&id).unwrap().expect("entry should resolve");
        assert_eq!(entry.filename(), "photo.png");
        assert_eq!(entry.content_type(), "image/png");
        assert!(!entry.etag().is_empty());

        let mut body = Vec::new();
        entry.open_reader().unwrap().read_to_end(&mut body).unwrap();
        assert_eq!(body, b"png bytes");
    }

    #[test]
    fn test_unfinalized_entry_is_not_resolvable() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let mut entry = store.create_entry().unwrap();
        entry.save().unwrap();
        entry.set_filename("partial.bin");
        {
            let mut writer = entry.open_writer().unwrap();
            writer.write_all(b"half written").unwrap();
        }
        // No finalize: the id must not resolve
        assert!(store.load_entry(entry.id()).unwrap().is_none());
    }

    #[test]
    fn test_etag_is_stable_across_loads() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let id = upload(&store, "notes.txt", "text/plain", b"same bytes");

        let first = store.load_entry(&id).unwrap().unwrap().etag().to_string();
        let second = store.load_entry(&id).unwrap().unwrap().etag().to_string();
        assert_eq!(first, second);
        assert!(first.starts_with('"') && first.ends_with('"'));
    }

    #[test]
    fn test_unknown_and_malformed_ids() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        assert!(store.load_entry("0123456789abcdef").unwrap().is_none());
        assert!(store.load_entry("").unwrap().is_none());
        assert!(store.load_entry("../escape").unwrap().is_none());
    }

    #[test]
    fn test_fresh_ids_are_unique() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let a = store.create_entry().unwrap();
        let b = store.create_entry().unwrap();
        assert_ne!(a.id(), b.id());
    }
}
