//! Cursor pagination over content source results
//!
//! A listing starts from one page of results and grows by following the
//! opaque `next_page` URL of the last page fetched. The state is an explicit
//! `{items, cursor}` pair; [`PaginationState::apply_page`] is the only
//! transition, and [`PaginationState::load_more`] is the fetch that feeds it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::content::Document;
use crate::prismic::SourceResult;

/// One page of query results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,

    /// Where the following page is fetched from; `None` on the last page
    #[serde(default)]
    pub next_page: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_results_size: Option<u32>,
}

impl<T> Page<T> {
    pub fn new(results: Vec<T>, next_page: Option<&str>) -> Self {
        Self {
            results,
            next_page: next_page.map(str::to_string),
            page: None,
            total_pages: None,
            total_results_size: None,
        }
    }
}

/// Page of post documents
pub type PostPagination = Page<Document>;

/// Fetches the page behind a cursor with a plain GET
#[async_trait]
pub trait PageSource<T>: Send + Sync {
    async fn fetch_page(&self, cursor: &str) -> SourceResult<Page<T>>;
}

/// Accumulated results and the cursor of the next page
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationState<T> {
    pub items: Vec<T>,
    pub cursor: Option<String>,
}

impl<T> Default for PaginationState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            cursor: None,
        }
    }
}

impl<T> PaginationState<T> {
    /// Seed the state from the first page
    pub fn new(initial: Page<T>) -> Self {
        Self::default().apply_page(initial)
    }

    /// Append a page's results in order and take over its cursor.
    ///
    /// Results are never de-duplicated or re-sorted.
    pub fn apply_page(mut self, page: Page<T>) -> Self {
        self.items.extend(page.results);
        self.cursor = page.next_page.filter(|cursor| !cursor.is_empty());
        self
    }

    /// Whether another page can be loaded
    pub fn has_more(&self) -> bool {
        self.cursor.is_some()
    }

    /// Fetch the next page, if any, and append it.
    ///
    /// Returns the number of results appended. Without a cursor this is a
    /// no-op. A failed fetch leaves the state untouched.
    pub async fn load_more<S>(&mut self, source: &S) -> SourceResult<usize>
    where
        S: PageSource<T> + ?Sized,
    {
        let Some(cursor) = self.cursor.as_deref() else {
            return Ok(0);
        };

        tracing::debug!("Loading page {}", cursor);
        let page = source.fetch_page(cursor).await?;
        let fetched = page.results.len();

        let state = std::mem::take(self);
        *self = state.apply_page(page);
        Ok(fetched)
    }

    /// Follow cursors until the last page. Stops early if a cursor repeats.
    pub async fn drain<S>(&mut self, source: &S) -> SourceResult<usize>
    where
        S: PageSource<T> + ?Sized,
    {
        let mut seen = HashSet::new();
        let mut total = 0;

        while let Some(cursor) = self.cursor.clone() {
            if !seen.insert(cursor.clone()) {
                tracing::warn!("Pagination cursor repeated, stopping: {}", cursor);
                self.cursor = None;
                break;
            }
            total += self.load_more(source).await?;
        }

        Ok(total)
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}
