//! # Backend State
//!
//! The backend the counter talks to, chosen once at startup.

use std::ops::Deref;
use std::sync::Arc;

use tracing::info;

use vetpos_backend::{BackendApi, BackendResult, HttpBackend, HttpBackendConfig, InMemoryBackend};

use super::ConfigState;

/// Shared handle to the backend.
#[derive(Clone)]
pub struct BackendState {
    api: Arc<dyn BackendApi>,
}

impl BackendState {
    pub fn new(api: Arc<dyn BackendApi>) -> Self {
        BackendState { api }
    }

    /// HTTP backend from config, or the in-memory demo backend when
    /// `offline` is set.
    pub fn from_config(config: &ConfigState) -> BackendResult<Self> {
        if config.offline {
            info!("Offline mode: using in-memory demo backend");
            return Ok(BackendState::new(Arc::new(InMemoryBackend::with_demo_data())));
        }

        info!(url = %config.backend_url, "Using HTTP backend");
        let http = HttpBackend::new(HttpBackendConfig::new(
            config.backend_url.clone(),
            config.request_timeout(),
        ))?;
        Ok(BackendState::new(Arc::new(http)))
    }
}

impl Deref for BackendState {
    type Target = dyn BackendApi;

    fn deref(&self) -> &Self::Target {
        self.api.as_ref()
    }
}

impl std::fmt::Debug for BackendState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendState").finish_non_exhaustive()
    }
}
