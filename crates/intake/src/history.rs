//! Memories history
//!
//! Paged listing of stored memories plus the small presentation helpers the
//! console uses: relative timestamps and keyword-based memory kinds.

use crate::api::InsightsApi;
use chrono::{DateTime, Utc};
use pulse_common::errors::{AppError, Result};
use pulse_common::SessionStore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Page sizes the history view offers
pub const PAGE_SIZES: [u32; 4] = [5, 10, 15, 25];

pub const DEFAULT_TITLE: &str = "Untitled Memory";
pub const DEFAULT_SUMMARY: &str = "No summary available";

/// One page of `GET /api/memories`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MemoryPage {
    #[serde(default, deserialize_with = "lenient_items")]
    pub memories: Vec<Memory>,

    #[serde(default, deserialize_with = "lenient")]
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Memory {
    pub id: Option<serde_json::Value>,

    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub summary: Option<String>,

    /// Expected to be an RFC 3339 string; anything else renders as unknown
    pub created_at: Option<serde_json::Value>,

    /// Fields this client does not interpret
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Memory {
    pub fn title(&self) -> &str {
        self.title.as_deref().filter(|t| !t.is_empty()).unwrap_or(DEFAULT_TITLE)
    }

    pub fn summary(&self) -> &str {
        self.summary.as_deref().filter(|s| !s.is_empty()).unwrap_or(DEFAULT_SUMMARY)
    }

    pub fn kind(&self) -> MemoryKind {
        MemoryKind::classify(self.title(), self.summary())
    }

    pub fn relative_time(&self, now: DateTime<Utc>) -> String {
        match self.created_at.as_ref().and_then(|ts| ts.as_str()) {
            Some(ts) => format_relative(ts, now),
            None => UNKNOWN_TIME.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Pagination {
    #[serde(default, deserialize_with = "lenient")]
    pub total_count: u64,

    #[serde(default = "first_page", deserialize_with = "lenient_page")]
    pub page: u32,

    #[serde(default = "first_page", deserialize_with = "lenient_page")]
    pub total_pages: u32,

    #[serde(default, deserialize_with = "lenient")]
    pub has_next: bool,

    #[serde(default, deserialize_with = "lenient")]
    pub has_prev: bool,
}

fn first_page() -> u32 {
    1
}

/// Null or a value of the wrong type falls back to the default
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Entries that are not memory objects are skipped
fn lenient_items<'de, D>(deserializer: D) -> std::result::Result<Vec<Memory>, D::Error>
where
    D: Deserializer<'de>,
{
    let items: Vec<serde_json::Value> = lenient(deserializer)?;
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

/// Page numbers start at 1
fn lenient_page<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let page: u32 = lenient(deserializer)?;
    Ok(page.max(first_page()))
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            total_count: 0,
            page: first_page(),
            total_pages: first_page(),
            has_next: false,
            has_prev: false,
        }
    }
}

impl Pagination {
    pub fn next_page(&self) -> Option<u32> {
        self.has_next.then(|| self.page.saturating_add(1))
    }

    pub fn prev_page(&self) -> Option<u32> {
        (self.has_prev && self.page > 1).then(|| self.page - 1)
    }
}

/// Coarse category of a memory, derived from its text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryKind {
    Meeting,
    Email,
    Document,
    Conversation,
    Decision,
    Note,
    General,
}

impl MemoryKind {
    const KEYWORDS: [(&'static str, MemoryKind); 6] = [
        ("meeting", MemoryKind::Meeting),
        ("email", MemoryKind::Email),
        ("document", MemoryKind::Document),
        ("conversation", MemoryKind::Conversation),
        ("decision", MemoryKind::Decision),
        ("note", MemoryKind::Note),
    ];

    /// First keyword found in title or summary wins
    pub fn classify(title: &str, summary: &str) -> Self {
        let text = format!("{} {}", title, summary).to_lowercase();
        Self::KEYWORDS
            .iter()
            .find(|(keyword, _)| text.contains(keyword))
            .map(|(_, kind)| *kind)
            .unwrap_or(MemoryKind::General)
    }

    pub fn label(&self) -> &'static str {
        match self {
            MemoryKind::Meeting => "Meeting",
            MemoryKind::Email => "Email",
            MemoryKind::Document => "Document",
            MemoryKind::Conversation => "Conversation",
            MemoryKind::Decision => "Decision",
            MemoryKind::Note => "Note",
            MemoryKind::General => "General",
        }
    }
}

impl fmt::Display for MemoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

const UNKNOWN_TIME: &str = "Unknown time";

/// Render an ISO-8601 timestamp relative to `now`
pub fn format_relative(timestamp: &str, now: DateTime<Utc>) -> String {
    let parsed = match DateTime::parse_from_rfc3339(timestamp.trim()) {
        Ok(ts) => ts.with_timezone(&Utc),
        Err(_) => return UNKNOWN_TIME.to_string(),
    };

    let seconds = (now - parsed).num_seconds();
    if seconds < 60 {
        return "Just now".to_string();
    }

    let (count, unit) = if seconds < 3_600 {
        (seconds / 60, "minute")
    } else if seconds < 86_400 {
        (seconds / 3_600, "hour")
    } else {
        (seconds / 86_400, "day")
    };

    if count == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", count, unit)
    }
}

/// Client for the memories listing
#[derive(Clone)]
pub struct HistoryClient {
    api: InsightsApi,
}

impl HistoryClient {
    pub fn new(api: InsightsApi) -> Self {
        Self { api }
    }

    /// Fetch one page; `page` is clamped to 1 and `page_size` must be offered
    pub async fn list_memories(&self, session: &SessionStore, page: u32, page_size: u32) -> Result<MemoryPage> {
        let org_id = session.require_identity()?.organization_id();
        if !PAGE_SIZES.contains(&page_size) {
            return Err(AppError::validation(
                "page_size",
                format!("page size must be one of {:?}", PAGE_SIZES),
            ));
        }
        let page = page.max(1);

        let result = self.api.list_memories(org_id, page, page_size).await?;
        tracing::debug!(
            page,
            page_size,
            returned = result.memories.len(),
            total = result.pagination.total_count,
            "Memories listed"
        );
        Ok(result)
    }
}
