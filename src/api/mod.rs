//! Apps API client for Memapps
//!
//! Wraps the `/api/v1/apps` endpoints. Every fetch dispatches a loading
//! transition into the store before the call and a success or error
//! transition after it; every operation also returns a typed `Result`.

mod http;
mod requests;
mod transport;

pub use http::HttpTransport;
pub use requests::{RequestTracker, Ticket};
pub use transport::{extract_detail, ApiRequest, Method, Transport};

use crate::config::Config;
use crate::error::{CoreError, Result};
use crate::models::{
    AccessedMemory, App, AppDetails, AppMemory, AppStatusUpdate, AppsListing, AppsPage,
    CreateAppRequest, FetchAppsParams, MemoriesPage, PageRequest, Paged,
};
use crate::store::{SliceKind, StorePort};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

const APPS_PATH: &str = "/api/v1/apps/";

/// Client for application management
pub struct AppsApi {
    transport: Arc<dyn Transport>,
    store: Arc<dyn StorePort>,
    user_id: String,
    requests: RequestTracker,
}

impl AppsApi {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn StorePort>,
        user_id: impl Into<String>,
    ) -> Self {
        AppsApi {
            transport,
            store,
            user_id: user_id.into(),
            requests: RequestTracker::new(),
        }
    }

    /// Build an HTTP-backed client from configuration
    pub fn from_config(config: &Config, store: Arc<dyn StorePort>) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config.api)?;
        Ok(Self::new(Arc::new(transport), store, config.user.user_id.clone()))
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Requests currently outstanding, one per slice at most
    pub fn in_flight(&self) -> usize {
        self.requests.in_flight()
    }

    /// List applications; replaces the apps slice
    pub async fn fetch_apps(&self, params: FetchAppsParams) -> Result<AppsListing> {
        tracing::debug!(
            "Fetching apps (page {}, size {}, sort {} {})",
            params.page,
            params.page_size,
            params.sort_by,
            params.sort_direction
        );
        let request = ApiRequest::get(APPS_PATH).with_query_pairs(params.to_query(&self.user_id));

        let page: AppsPage = self
            .tracked(
                SliceKind::Apps,
                request,
                "Failed to fetch apps",
                |store| store.set_apps_loading(),
                |store, page: &AppsPage| store.set_apps_success(page.apps.clone()),
                |store, message| store.set_apps_error(message),
            )
            .await?;

        Ok(AppsListing {
            apps: page.apps,
            total: page.total,
        })
    }

    /// Fetch one application's extended record; replaces the selected-app slice
    pub async fn fetch_app_details(&self, app_id: &str) -> Result<AppDetails> {
        let request =
            ApiRequest::get(app_path(app_id, "")?).with_query("user_id", &self.user_id);

        self.tracked(
            SliceKind::SelectedApp,
            request,
            "Failed to fetch app details",
            |store| store.set_selected_app_loading(),
            |store, details: &AppDetails| store.set_selected_app_details(details.clone()),
            |store, message| store.set_selected_app_error(message),
        )
        .await
    }

    /// Fetch one page of the memories an application created
    pub async fn fetch_app_memories(
        &self,
        app_id: &str,
        page: PageRequest,
    ) -> Result<Paged<AppMemory>> {
        let request = self.memories_request(app_id, "/memories", page)?;

        let page: MemoriesPage<AppMemory> = self
            .tracked(
                SliceKind::CreatedMemories,
                request,
                "Failed to fetch app memories",
                |store| store.set_created_memories_loading(),
                |store, page: &MemoriesPage<AppMemory>| {
                    store.set_created_memories_success(page.clone().into())
                },
                |store, message| store.set_created_memories_error(message),
            )
            .await?;

        Ok(page.into())
    }

    /// Fetch one page of the memories an application read
    pub async fn fetch_app_accessed_memories(
        &self,
        app_id: &str,
        page: PageRequest,
    ) -> Result<Paged<AccessedMemory>> {
        let request = self.memories_request(app_id, "/accessed", page)?;

        let page: MemoriesPage<AccessedMemory> = self
            .tracked(
                SliceKind::AccessedMemories,
                request,
                "Failed to fetch accessed memories",
                |store| store.set_accessed_memories_loading(),
                |store, page: &MemoriesPage<AccessedMemory>| {
                    store.set_accessed_memories_success(page.clone().into())
                },
                |store, message| store.set_accessed_memories_error(message),
            )
            .await?;

        Ok(page.into())
    }

    /// Change an application's active flag
    ///
    /// Returns the raw response body. No slice is updated; refresh explicitly
    /// if a view shows the flag.
    pub async fn update_app_details(&self, app_id: &str, update: AppStatusUpdate) -> Result<Value> {
        let request =
            ApiRequest::put(app_path(app_id, "")?).with_query("is_active", update.is_active);

        match self.transport.send(request).await {
            Ok(body) => {
                tracing::info!("Set app {} active = {}", app_id, update.is_active);
                Ok(body)
            }
            Err(e) => {
                tracing::warn!("Failed to update app details for {}: {}", app_id, e);
                Err(e)
            }
        }
    }

    /// Register a new application, then refresh the apps list
    ///
    /// A failed refresh is logged and left in the apps slice; the created
    /// record is still returned.
    pub async fn create_app(&self, app: CreateAppRequest) -> Result<App> {
        let request = ApiRequest::post(APPS_PATH)
            .with_query("user_id", &self.user_id)
            .with_json(serde_json::to_value(&app)?);

        let created: App = match self.fetch(request).await {
            Ok(created) => created,
            Err(e) => {
                tracing::warn!("Failed to create app \"{}\": {}", app.name, e);
                return Err(e);
            }
        };
        tracing::info!("Created app {} ({})", created.name, created.id);

        match self.fetch_apps(FetchAppsParams::default()).await {
            Ok(_) => {}
            Err(CoreError::Superseded) => {
                tracing::debug!("Apps refresh after create superseded by a newer fetch")
            }
            Err(e) => tracing::warn!("Apps refresh after create failed: {}", e),
        }

        Ok(created)
    }

    fn memories_request(&self, app_id: &str, suffix: &str, page: PageRequest) -> Result<ApiRequest> {
        Ok(ApiRequest::get(app_path(app_id, suffix)?)
            .with_query("user_id", &self.user_id)
            .with_query("page", page.page)
            .with_query("page_size", page.page_size))
    }

    async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let body = self.transport.send(request).await?;
        serde_json::from_value(body).map_err(|e| CoreError::Decode(e.to_string()))
    }

    /// Issue a request that owns `key`'s slice
    ///
    /// Superseded requests resolve to `CoreError::Superseded` and leave the
    /// slice to the newer request.
    async fn tracked<T: DeserializeOwned>(
        &self,
        key: SliceKind,
        request: ApiRequest,
        fallback: &str,
        on_loading: impl FnOnce(&dyn StorePort),
        on_success: impl FnOnce(&dyn StorePort, &T),
        on_error: impl FnOnce(&dyn StorePort, String),
    ) -> Result<T> {
        let store = self.store.as_ref();
        let ticket = self.requests.begin(key, || on_loading(store));

        let Some(outcome) = ticket.run(self.fetch::<T>(request)).await else {
            tracing::debug!("{:?} request superseded", key);
            return Err(CoreError::Superseded);
        };

        match outcome {
            Ok(value) => self
                .requests
                .complete(&ticket, || on_success(store, &value))
                .map(|_| value)
                .ok_or(CoreError::Superseded),
            Err(e) => {
                let message = e.user_message(fallback);
                tracing::warn!("{}: {}", fallback, message);
                match self.requests.complete(&ticket, || on_error(store, message)) {
                    Some(()) => Err(e),
                    None => Err(CoreError::Superseded),
                }
            }
        }
    }
}

/// Path of one application, rejecting ids that would escape the segment
fn app_path(app_id: &str, suffix: &str) -> Result<String> {
    let id = app_id.trim();
    if id.is_empty() {
        return Err(CoreError::Validation("App id is required".to_string()));
    }
    if id.contains(&['/', '?', '#'][..]) {
        return Err(CoreError::Validation(format!("Invalid app id: {}", id)));
    }
    Ok(format!("{}{}{}", APPS_PATH, id, suffix))
}
