//! Shared application state
//!
//! Four independent slices, each carrying `loading`, `error` and `data`.
//! The API layer writes through the [`StorePort`] trait so tests and embedders
//! can substitute their own sink; [`AppsStore`] is the in-memory implementation
//! and broadcasts one [`StoreEvent`] per transition for subscribed views.

use crate::models::{AccessedMemory, App, AppDetails, AppMemory, Paged};
use serde::Serialize;
use std::sync::{PoisonError, RwLock};
use tokio::sync::broadcast;

/// Request/loading state of one slice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slice<T> {
    pub loading: bool,
    pub error: Option<String>,
    pub data: Option<T>,
}

impl<T> Default for Slice<T> {
    fn default() -> Self {
        Slice {
            loading: false,
            error: None,
            data: None,
        }
    }
}

impl<T> Slice<T> {
    /// Request issued; previous data stays visible
    pub fn start(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub fn succeed(&mut self, data: T) {
        self.loading = false;
        self.error = None;
        self.data = Some(data);
    }

    /// Request failed; previous data stays visible
    pub fn fail(&mut self, message: String) {
        self.loading = false;
        self.error = Some(message);
    }
}

/// Snapshot of every slice
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AppsState {
    pub apps: Slice<Vec<App>>,
    pub selected_app: Slice<AppDetails>,
    pub created_memories: Slice<Paged<AppMemory>>,
    pub accessed_memories: Slice<Paged<AccessedMemory>>,
}

impl AppsState {
    /// Busy flag for views; derived rather than tracked separately
    pub fn any_loading(&self) -> bool {
        self.apps.loading
            || self.selected_app.loading
            || self.created_memories.loading
            || self.accessed_memories.loading
    }

    /// First error found, in slice order
    pub fn first_error(&self) -> Option<&str> {
        self.apps
            .error
            .as_deref()
            .or(self.selected_app.error.as_deref())
            .or(self.created_memories.error.as_deref())
            .or(self.accessed_memories.error.as_deref())
    }
}

/// Which slice a transition touched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SliceKind {
    Apps,
    SelectedApp,
    CreatedMemories,
    AccessedMemories,
}

/// Transition kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Loading,
    Success,
    Error,
}

/// Change notification broadcast to subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreEvent {
    pub slice: SliceKind,
    pub phase: Phase,
}

/// State-update port the API layer dispatches into
pub trait StorePort: Send + Sync {
    fn set_apps_loading(&self);
    fn set_apps_success(&self, apps: Vec<App>);
    fn set_apps_error(&self, message: String);

    fn set_selected_app_loading(&self);
    fn set_selected_app_details(&self, details: AppDetails);
    fn set_selected_app_error(&self, message: String);

    fn set_created_memories_loading(&self);
    fn set_created_memories_success(&self, page: Paged<AppMemory>);
    fn set_created_memories_error(&self, message: String);

    fn set_accessed_memories_loading(&self);
    fn set_accessed_memories_success(&self, page: Paged<AccessedMemory>);
    fn set_accessed_memories_error(&self, message: String);
}

/// In-memory store with change broadcast
pub struct AppsStore {
    state: RwLock<AppsState>,
    event_tx: broadcast::Sender<StoreEvent>,
}

impl Default for AppsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AppsStore {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(256);
        AppsStore {
            state: RwLock::new(AppsState::default()),
            event_tx,
        }
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> AppsState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Receive one event per transition from now on
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.event_tx.subscribe()
    }

    fn update(&self, slice: SliceKind, phase: Phase, f: impl FnOnce(&mut AppsState)) {
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            f(&mut state);
        }
        tracing::trace!("store: {:?} -> {:?}", slice, phase);
        // No subscribers is fine
        let _ = self.event_tx.send(StoreEvent { slice, phase });
    }
}

impl StorePort for AppsStore {
    fn set_apps_loading(&self) {
        self.update(SliceKind::Apps, Phase::Loading, |s| s.apps.start());
    }

    fn set_apps_success(&self, apps: Vec<App>) {
        self.update(SliceKind::Apps, Phase::Success, |s| s.apps.succeed(apps));
    }

    fn set_apps_error(&self, message: String) {
        self.update(SliceKind::Apps, Phase::Error, |s| s.apps.fail(message));
    }

    fn set_selected_app_loading(&self) {
        self.update(SliceKind::SelectedApp, Phase::Loading, |s| {
            s.selected_app.start()
        });
    }

    fn set_selected_app_details(&self, details: AppDetails) {
        self.update(SliceKind::SelectedApp, Phase::Success, |s| {
            s.selected_app.succeed(details)
        });
    }

    fn set_selected_app_error(&self, message: String) {
        self.update(SliceKind::SelectedApp, Phase::Error, |s| {
            s.selected_app.fail(message)
        });
    }

    fn set_created_memories_loading(&self) {
        self.update(SliceKind::CreatedMemories, Phase::Loading, |s| {
            s.created_memories.start()
        });
    }

    fn set_created_memories_success(&self, page: Paged<AppMemory>) {
        self.update(SliceKind::CreatedMemories, Phase::Success, |s| {
            s.created_memories.succeed(page)
        });
    }

    fn set_created_memories_error(&self, message: String) {
        self.update(SliceKind::CreatedMemories, Phase::Error, |s| {
            s.created_memories.fail(message)
        });
    }

    fn set_accessed_memories_loading(&self) {
        self.update(SliceKind::AccessedMemories, Phase::Loading, |s| {
            s.accessed_memories.start()
        });
    }

    fn set_accessed_memories_success(&self, page: Paged<AccessedMemory>) {
        self.update(SliceKind::AccessedMemories, Phase::Success, |s| {
            s.accessed_memories.succeed(page)
        });
    }

    fn set_accessed_memories_error(&self, message: String) {
        self.update(SliceKind::AccessedMemories, Phase::Error, |s| {
            s.accessed_memories.fail(message)
        });
    }
}
