//! Mock implementation of the Storage trait for testing

use crate::storage::{Storage, StorageEntry};
use actix_web::error::ErrorInternalServerError;
use actix_web::Error;
use log::info;
use std::collections::HashMap;
use std::io::{self, Cursor, Read, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone)]
struct StoredObject {
    data: Vec<u8>,
    filename: String,
    content_type: String,
    etag: String,
}

/// In-memory storage backend. Entries become visible in the shared map only
/// on finalize, matching the visibility guarantee of the disk backend.
pub struct MockStore {
    objects: Arc<Mutex<HashMap<String, StoredObject>>>,
    sequence: AtomicU64,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            objects: Arc::new(Mutex::new(HashMap::new())),
            sequence: AtomicU64::new(0),
        }
    }

    /// Get the number of finalized objects in the store
    pub fn object_count(&self) -> usize {
        let objects = self.objects.lock().unwrap();
        objects.len()
    }

    /// Check whether a finalized object exists for an id
    pub fn object_exists(&self, id: &str) -> bool {
        let objects = self.objects.lock().unwrap();
        objects.contains_key(id)
    }

    /// Clear all data from the store
    pub fn clear(&self) {
        let mut objects = self.objects.lock().unwrap();
        objects.clear();
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MockStore {
    fn create_entry(&self) -> Result<Box<dyn StorageEntry>, Error> {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let id = format!("mock{:012x}", seq);
        info!("Mock: allocated entry {}", id);
        Ok(Box::new(MockEntry {
            id,
            filename: String::new(),
            content_type: String::new(),
            etag: String::new(),
            staged: Arc::new(Mutex::new(Vec::new())),
            finalized_data: None,
            objects: Arc::clone(&self.objects),
        }))
    }

    fn load_entry(&self, id: &str) -> Result<Option<Box<dyn StorageEntry>>, Error> {
        let objects = self.objects.lock().unwrap();
        let stored = match objects.get(id) {
            Some(stored) => stored.clone(),
            None => return Ok(None),
        };
        Ok(Some(Box::new(MockEntry {
            id: id.to_string(),
            filename: stored.filename,
            content_type: stored.content_type,
            etag: stored.etag,
            staged: Arc::new(Mutex::new(Vec::new())),
            finalized_data: Some(Arc::new(stored.data)),
            objects: Arc::clone(&self.objects),
        })))
    }
}

struct MockEntry {
    id: String,
    filename: String,
    content_type: String,
    etag: String,
    staged: Arc<Mutex<Vec<u8>>>,
    finalized_data: Option<Arc<Vec<u8>>>,
    objects: Arc<Mutex<HashMap<String, StoredObject>>>,
}

/// Write sink appending into an entry's staging buffer
struct MockWriter {
    staged: Arc<Mutex<Vec<u8>>>,
}

impl Write for MockWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut staged = self.staged.lock().unwrap();
        staged.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl StorageEntry for MockEntry {
    fn id(&self) -> &str {
        &self.id
    }

    fn save(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn set_filename(&mut self, filename: &str) {
        self.filename = filename.to_string();
    }

    fn set_content_type(&mut self, content_type: &str) {
        self.content_type = content_type.to_string();
    }

    fn filename(&self) -> &str {
        &self.filename
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn etag(&self) -> &str {
        &self.etag
    }

    fn open_writer(&mut self) -> Result<Box<dyn Write + Send>, Error> {
        Ok(Box::new(MockWriter {
            staged: Arc::clone(&self.staged),
        }))
    }

    fn open_reader(&self) -> Result<Box<dyn Read + Send>, Error> {
        let data = self
            .finalized_data
            .as_ref()
            .ok_or_else(|| ErrorInternalServerError("entry is not finalized"))?;
        Ok(Box::new(Cursor::new(data.as_ref().clone())))
    }

    fn finalize(&mut self) -> Result<(), Error> {
        let data = self.staged.lock().unwrap().clone();
        self.etag = format!("\"{}\"", hex::encode(md5::compute(&data).0));
        let mut objects = self.objects.lock().unwrap();
        objects.insert(
            self.id.clone(),
            StoredObject {
                data: data.clone(),
                filename: self.filename.clone(),
                content_type: self.content_type.clone(),
                etag: self.etag.clone(),
            },
        );
        self.finalized_data = Some(Arc::new(data));
        info!("Mock: finalized entry {} ({} bytes)", self.id, self.finalized_data.as_ref().unwrap().len());
        Ok(())
    }
}
