//! Shared Data Transfer Objects (DTOs) for API handlers.
//!
//! List endpoints all return the same envelope: `{ "data": [...], "meta":
//! { "total", "page", "limit", "totalPages" } }`.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Pagination metadata for list responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    /// Total number of items across all pages
    pub total: i64,
    /// Current page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub limit: u32,
    /// Total number of pages
    pub total_pages: u32,
}

impl PageMeta {
    pub fn new(total: i64, page: u32, limit: u32) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            ((total as f64) / (limit as f64)).ceil() as u32
        };
        Self {
            total,
            page,
            limit,
            total_pages,
        }
    }
}

/// Standard list envelope.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: i64, page: u32, limit: u32) -> Self {
        Self {
            data,
            meta: PageMeta::new(total, page, limit),
        }
    }
}

/// Query parameters for paginated list requests.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ListQuery {
    /// Requested page number (default: 1)
    pub page: Option<u32>,
    /// Requested items per page (capped per endpoint)
    pub limit: Option<u32>,
    /// Optional search term
    pub search: Option<String>,
}

impl ListQuery {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Limit with an endpoint-specific default and cap.
    pub fn limit(&self, default: u32, max: u32) -> u32 {
        self.limit.unwrap_or(default).clamp(1, max)
    }

    /// Trimmed, non-empty search term.
    pub fn search(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
