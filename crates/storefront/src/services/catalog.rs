//! Catalog browsing.
//!
//! [`CatalogBrowser`] loads the whole catalog once and pages through it
//! locally. [`ProductFeed`] is the incremental alternative that fetches
//! one page per [`ProductFeed::load_more`] call.

use std::collections::HashSet;

use shopease_core::CatalogEntry;
use tracing::{info, instrument, warn};

use crate::shopify::{CatalogGateway, ShopifyError};

/// Products requested per round trip when loading the full catalog.
pub const FETCH_BATCH: i64 = 50;

/// Products requested per [`ProductFeed::load_more`] call.
pub const FEED_BATCH: i64 = 12;

/// Default products per client-side page.
pub const DEFAULT_PAGE_SIZE: usize = 12;

/// Shown when the catalog cannot be loaded.
pub const LOAD_FAILED: &str = "Failed to load products. Please try again later.";

/// Fetch every product, following cursors until the last page.
///
/// Entries are accumulated in arrival order; a repeated id keeps its first
/// occurrence.
///
/// # Errors
///
/// Returns the first gateway error. Partial results are discarded.
#[instrument(skip(gateway))]
pub async fn fetch_all<G: CatalogGateway>(gateway: &G) -> Result<Vec<CatalogEntry>, ShopifyError> {
    let mut entries = Vec::new();
    let mut seen = HashSet::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = gateway.fetch_products(FETCH_BATCH, cursor.take()).await?;
        let has_next = page.has_next_page();
        cursor = page.page_info.end_cursor;

        entries.extend(
            page.entries
                .into_iter()
                .filter(|entry| seen.insert(entry.id.clone())),
        );

        if !has_next {
            break;
        }
        if cursor.is_none() {
            warn!("Catalog page reports more results but no cursor, stopping");
            break;
        }
    }

    info!(count = entries.len(), "Loaded catalog");
    Ok(entries)
}

/// Result of loading the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogState {
    Loaded(Vec<CatalogEntry>),
    /// User-facing failure message.
    Failed(String),
}

/// Full catalog with client-side pagination.
///
/// Pages are 1-based. Changing page never fetches.
#[derive(Debug, Clone)]
pub struct CatalogBrowser {
    state: CatalogState,
    page_size: usize,
    current_page: usize,
}

impl CatalogBrowser {
    /// Load the whole catalog.
    pub async fn load<G: CatalogGateway>(gateway: &G, page_size: usize) -> Self {
        let state = match fetch_all(gateway).await {
            Ok(entries) => CatalogState::Loaded(entries),
            Err(e) => {
                tracing::error!(error = %e, "Failed to load catalog");
                CatalogState::Failed(LOAD_FAILED.to_string())
            }
        };
        Self::new(state, page_size)
    }

    /// Browse an already loaded list.
    #[must_use]
    pub fn from_entries(entries: Vec<CatalogEntry>, page_size: usize) -> Self {
        Self::new(CatalogState::Loaded(entries), page_size)
    }

    fn new(state: CatalogState, page_size: usize) -> Self {
        Self {
            state,
            page_size: page_size.max(1),
            current_page: 1,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &CatalogState {
        &self.state
    }

    /// All loaded entries (empty after a failure).
    #[must_use]
    pub fn entries(&self) -> &[CatalogEntry] {
        match &self.state {
            CatalogState::Loaded(entries) => entries,
            CatalogState::Failed(_) => &[],
        }
    }

    /// Failure message, if loading failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match &self.state {
            CatalogState::Failed(message) => Some(message),
            CatalogState::Loaded(_) => None,
        }
    }

    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    #[must_use]
    pub const fn current_page(&self) -> usize {
        self.current_page
    }

    /// `ceil(len / page_size)`; zero for an empty catalog.
    #[must_use]
    pub fn total_pages(&self) -> usize {
        self.entries().len().div_ceil(self.page_size)
    }

    /// Entries on page `n` (1-based). Out of range pages are empty.
    #[must_use]
    pub fn page(&self, n: usize) -> &[CatalogEntry] {
        let entries = self.entries();
        let start = n.saturating_sub(1).saturating_mul(self.page_size);
        if n == 0 || start >= entries.len() {
            return &[];
        }
        let end = (start + self.page_size).min(entries.len());
        entries.get(start..end).unwrap_or_default()
    }

    /// Entries on the current page.
    #[must_use]
    pub fn current(&self) -> &[CatalogEntry] {
        self.page(self.current_page)
    }

    /// Jump to page `n`, clamped to `[1, total_pages]`.
    pub fn set_page(&mut self, n: usize) -> usize {
        self.current_page = n.clamp(1, self.total_pages().max(1));
        self.current_page
    }

    pub fn next_page(&mut self) -> usize {
        self.set_page(self.current_page + 1)
    }

    pub fn prev_page(&mut self) -> usize {
        self.set_page(self.current_page.saturating_sub(1))
    }
}

/// Incremental product feed for "load more" style browsing.
///
/// `load_more` takes `&mut self`, so a second fetch cannot start while one
/// is in flight.
pub struct ProductFeed<G> {
    gateway: G,
    entries: Vec<CatalogEntry>,
    cursor: Option<String>,
    has_more: bool,
    error: Option<String>,
}

impl<G: CatalogGateway> ProductFeed<G> {
    #[must_use]
    pub const fn new(gateway: G) -> Self {
        Self {
            gateway,
            entries: Vec::new(),
            cursor: None,
            has_more: true,
            error: None,
        }
    }

    /// Fetch the next page if there is one. Returns how many entries were
    /// appended.
    #[instrument(skip(self))]
    pub async fn load_more(&mut self) -> usize {
        if !self.has_more {
            return 0;
        }

        match self
            .gateway
            .fetch_products(FEED_BATCH, self.cursor.clone())
            .await
        {
            Ok(page) => {
                let added = page.entries.len();
                self.has_more = page.page_info.has_next_page && page.page_info.end_cursor.is_some();
                self.cursor = page.page_info.end_cursor;
                self.entries.extend(page.entries);
                self.error = None;
                added
            }
            Err(e) => {
                warn!(error = %e, "Failed to load more products");
                self.error = Some(e.to_string());
                0
            }
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.has_more
    }

    /// Error from the most recent fetch, cleared by the next success.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
