//! Application State Management
//!
//! This module provides the application state that contains the storage
//! backend and configuration shared by the handlers, following the
//! dependency injection pattern.

use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponseBuilder};
use log::info;

use crate::config::{AppConfig, StorageBackend};
use crate::storage::{local_store::LocalDiskStore, mock_store::MockStore, Storage};

/// Optional capability invoked for every response a handler constructs,
/// e.g. to set CORS headers
pub type RequestHook = Arc<dyn Fn(&HttpRequest, &mut HttpResponseBuilder) + Send + Sync>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub config: AppConfig,
    pub request_hook: Option<RequestHook>,
}

impl AppState {
    /// Create a new application state configured from YAML config
    pub fn new() -> Self {
        let config = AppConfig::load().expect("Failed to load configuration");
        Self::from_config(config)
    }

    /// Create application state from configuration
    pub fn from_config(config: AppConfig) -> Self {
        let storage: Arc<dyn Storage> = match config.storage.backend {
            StorageBackend::LocalDisk => {
                Arc::new(LocalDiskStore::new(Some(&config.storage)))
            }
            StorageBackend::Mock => {
                info!("Using mock storage backend");
                Arc::new(MockStore::new())
            }
        };

        Self {
            storage,
            config,
            request_hook: None,
        }
    }

    /// Create application state for testing with the mock backend
    pub fn new_for_testing() -> Self {
        let mut config = AppConfig::default();
        config.storage.backend = StorageBackend::Mock;
        config.share.protocol_host = "http://localhost:9710/".to_string();

        Self {
            storage: Arc::new(MockStore::new()),
            config,
            request_hook: None,
        }
    }

    /// Inject a per-request hook
    pub fn with_request_hook(mut self, hook: RequestHook) -> Self {
        self.request_hook = Some(hook);
        self
    }

    /// Invoke the injected hook, if any, on a response under construction
    pub fn apply_request_hook(&self, req: &HttpRequest, builder: &mut HttpResponseBuilder) {
        if let Some(hook) = &self.request_hook {
            hook(req, builder);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_testing_state_uses_mock_backend() {
        let state = AppState::new_for_testing();
        assert_eq!(state.config.storage.backend, StorageBackend::Mock);
        assert!(state.request_hook.is_none());
    }

    #[test]
    fn test_with_request_hook() {
        let state = AppState::new_for_testing()
            .with_request_hook(Arc::new(|_req, _builder| {}));
        assert!(state.request_hook.is_some());
    }
}
