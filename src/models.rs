//! Application and memory records exchanged with the memory service

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A registered application (client, agent or tool that reads/writes memories)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct App {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, alias = "metadata_")]
    pub metadata: Map<String, Value>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Server computed
    #[serde(default)]
    pub total_memories_created: u64,
    /// Server computed
    #[serde(default)]
    pub total_memories_accessed: u64,
}

fn default_active() -> bool {
    true
}

/// Extended record returned by the single-app endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppDetails {
    pub is_active: bool,
    #[serde(default)]
    pub total_memories_created: u64,
    #[serde(default)]
    pub total_memories_accessed: u64,
    #[serde(default)]
    pub first_accessed: Option<String>,
    #[serde(default)]
    pub last_accessed: Option<String>,
    /// Fields this layer does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A memory created by an application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppMemory {
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub metadata_: Option<Value>,
    /// Fields this layer does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A memory read by an application, with how often it was read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessedMemory {
    pub memory: AppMemory,
    #[serde(default)]
    pub access_count: u64,
}

/// One cached page of a collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
}

impl<T> Paged<T> {
    /// Number of pages for a page size, zero when the collection is empty
    pub fn page_count(&self, page_size: u32) -> u64 {
        if self.total == 0 || page_size == 0 {
            0
        } else {
            self.total.div_ceil(page_size as u64)
        }
    }
}

/// Apps returned to the caller of a list fetch
#[derive(Debug, Clone, PartialEq)]
pub struct AppsListing {
    pub apps: Vec<App>,
    pub total: u64,
}

/// Wire envelope of `GET /api/v1/apps/`
#[derive(Debug, Clone, Deserialize)]
pub struct AppsPage {
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub apps: Vec<App>,
}

/// Wire envelope of the per-app memory listings
#[derive(Debug, Clone, Deserialize)]
pub struct MemoriesPage<T> {
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub memories: Vec<T>,
}

impl<T> From<MemoriesPage<T>> for Paged<T> {
    fn from(page: MemoriesPage<T>) -> Self {
        Paged {
            items: page.memories,
            total: page.total,
            page: page.page,
        }
    }
}

/// Sort key for the apps listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    Name,
    /// Number of memories created
    Memories,
    /// Number of distinct memories accessed
    MemoriesAccessed,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Name => "name",
            SortBy::Memories => "memories",
            SortBy::MemoriesAccessed => "memories_accessed",
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Filters, sort and page for the apps listing
#[derive(Debug, Clone, PartialEq)]
pub struct FetchAppsParams {
    /// Case-insensitive name substring
    pub name: Option<String>,
    pub is_active: Option<bool>,
    pub sort_by: SortBy,
    pub sort_direction: SortDirection,
    /// 1-based
    pub page: u32,
    pub page_size: u32,
}

impl Default for FetchAppsParams {
    fn default() -> Self {
        FetchAppsParams {
            name: None,
            is_active: None,
            sort_by: SortBy::default(),
            sort_direction: SortDirection::default(),
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl FetchAppsParams {
    /// Query pairs in the order the listing endpoint documents them
    pub fn to_query(&self, user_id: &str) -> Vec<(String, String)> {
        let mut query = vec![
            ("user_id".to_string(), user_id.to_string()),
            ("page".to_string(), self.page.to_string()),
            ("page_size".to_string(), self.page_size.to_string()),
        ];
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            query.push(("name".to_string(), name.to_string()));
        }
        if let Some(active) = self.is_active {
            query.push(("is_active".to_string(), active.to_string()));
        }
        query.push(("sort_by".to_string(), self.sort_by.to_string()));
        query.push(("sort_direction".to_string(), self.sort_direction.to_string()));
        query
    }
}

/// Page selection for the per-app memory listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        PageRequest { page, page_size }
    }
}

/// Body of `POST /api/v1/apps/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAppRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

/// Active-flag change sent with `PUT /api/v1/apps/{id}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppStatusUpdate {
    pub is_active: bool,
}

/// Parse a server timestamp, with or without an offset
///
/// The service emits naive ISO timestamps for some columns; those are read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
