//! Storage Layer Abstraction
//!
//! This module provides an abstraction over file storage backends,
//! allowing the system to use different storage implementations (local
//! disk, object stores, etc.) without affecting the request handlers.

pub mod local_store;
pub mod mock_store;

use actix_web::Error;
use std::io::{Read, Write};

/// Trait defining the storage backend interface
pub trait Storage: Send + Sync {
    /// Allocate a new entry with a fresh id. The entry is writable but not
    /// yet resolvable through `load_entry`.
    fn create_entry(&self) -> Result<Box<dyn StorageEntry>, Error>;

    /// Look up a finalized entry by id. Returns `Ok(None)` when the id is
    /// unknown; entries that were never finalized are unknown.
    fn load_entry(&self, id: &str) -> Result<Option<Box<dyn StorageEntry>>, Error>;
}

/// A handle representing one stored file plus its metadata.
///
/// Lifecycle: created (via `Storage::create_entry`) -> `save` -> bytes
/// written through `open_writer` -> `finalize` -> readable via
/// `Storage::load_entry` and `open_reader`. Filename and content type are
/// fixed by the single uploaded part and do not change after finalization.
pub trait StorageEntry: Send {
    /// Opaque stable identifier assigned at creation time
    fn id(&self) -> &str;

    /// Persist the initial (empty) state of the entry
    fn save(&mut self) -> Result<(), Error>;

    fn set_filename(&mut self, filename: &str);

    fn set_content_type(&mut self, content_type: &str);

    fn filename(&self) -> &str;

    fn content_type(&self) -> &str;

    /// Cache-validation token, stable once the entry is finalized.
    /// Empty until finalization.
    fn etag(&self) -> &str;

    /// Exclusive byte sink appending to the entry's underlying bytes
    fn open_writer(&mut self) -> Result<Box<dyn Write + Send>, Error>;

    /// Independent byte source over the entry's finalized bytes
    fn open_reader(&self) -> Result<Box<dyn Read + Send>, Error>;

    /// Commit the entry: derive its etag and make it resolvable by id
    fn finalize(&mut self) -> Result<(), Error>;
}
