//! Memapps - client-side application management for a memory service
//!
//! This crate provides the "apps" layer of the memory dashboard:
//! - Typed client for the `/api/v1/apps` endpoints
//! - Shared state store with per-slice loading/error tracking
//! - Create-application dialog controller
//! - Source-application badges
//!
//! # Usage
//!
//! ```ignore
//! use memapps::{Config, Core};
//!
//! let config = Config::from_file("~/.memapps/config.toml")?;
//! let core = Core::new(config)?;
//! let listing = core.api().fetch_apps(Default::default()).await?;
//! ```

pub mod api;
pub mod badge;
pub mod config;
pub mod dialog;
pub mod error;
pub mod models;
pub mod notify;
pub mod store;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use api::AppsApi;
pub use config::Config;
pub use error::{CoreError, Result};
pub use store::AppsStore;

use dialog::CreateAppDialog;
use notify::Notifier;
use std::sync::Arc;

/// Wires the store, the API client and configuration together
pub struct Core {
    /// Configuration
    pub config: Config,

    store: Arc<AppsStore>,
    api: Arc<AppsApi>,
}

impl Core {
    /// Create a new Core backed by HTTP
    pub fn new(config: Config) -> Result<Self> {
        let store = Arc::new(AppsStore::new());
        let api = AppsApi::from_config(&config, store.clone())?;
        tracing::debug!(
            "Core ready (api {}, user {})",
            config.api.base(),
            config.user.user_id
        );
        Ok(Core {
            config,
            store,
            api: Arc::new(api),
        })
    }

    /// Create a Core around an existing client and store
    pub fn with_parts(config: Config, store: Arc<AppsStore>, api: Arc<AppsApi>) -> Self {
        Core { config, store, api }
    }

    pub fn store(&self) -> &Arc<AppsStore> {
        &self.store
    }

    pub fn api(&self) -> &Arc<AppsApi> {
        &self.api
    }

    /// A fresh create dialog that refreshes nothing by itself
    pub fn dialog(&self, notifier: Arc<dyn Notifier>) -> CreateAppDialog {
        CreateAppDialog::new(notifier)
    }
}
