//! Upload and download request handling
//!
//! The two handlers in this module turn a multipart POST into a finalized
//! storage entry and serve finalized entries back with conditional-GET and
//! content-disposition semantics. They depend only on the storage traits,
//! never on each other.

pub mod disposition;
pub mod handlers;
pub mod naming;
pub mod stream;

use actix_web::error::{ErrorBadRequest, ErrorInternalServerError};
use actix_web::Error;
use log::{error, warn};
use std::fmt::Display;

/// Operator-facing fault: log the detail, hand the client a generic 500.
/// A fault is terminal for the current request only.
pub(crate) fn storage_fault(context: &str, err: impl Display) -> Error {
    error!("{}: {}", context, err);
    ErrorInternalServerError("500 an internal error occurred")
}

/// Client-facing rejection, not reported as a fault
pub(crate) fn bad_request(context: &str) -> Error {
    warn!("Rejected request: {}", context);
    ErrorBadRequest("400 bad request")
}

/// Carries the entry id in the logging MDC for the rest of the handler.
/// Dropping the scope removes the key, so records of later requests on the
/// same worker thread never log under a stale id.
pub(crate) struct MdcEntryScope;

impl MdcEntryScope {
    pub fn set(id: &str) -> Self {
        log_mdc::insert("entry", id);
        MdcEntryScope
    }
}

impl Drop for MdcEntryScope {
    fn drop(&mut self) {
        log_mdc::remove("entry");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mdc_entry_scope_removes_key_on_drop() {
        {
            let _scope = MdcEntryScope::set("abc123");
            let value = log_mdc::get("entry", |v| v.map(|s| s.to_string()));
            assert_eq!(value.as_deref(), Some("abc123"));
        }
        let value = log_mdc::get("entry", |v| v.map(|s| s.to_string()));
        assert_eq!(value, None);
    }
}
