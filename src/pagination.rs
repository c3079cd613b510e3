/// List view pagination: the committed query, debounced search/filter
/// resets, and the last loaded page.
///
/// Page changes commit at once. Search text and status filter changes are
/// held back until the debounce window has passed, then commit together with
/// a reset to the first page. A page change made during the window does not
/// cancel the pending reset.
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

use crate::debounce::Debouncer;
use crate::error::ApiError;
use crate::models::short_url::ShortUrlStatus;
use crate::models::Page;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// What the list view is currently showing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Zero-based page index.
    pub page: u32,
    pub query: String,
    pub status: Option<ShortUrlStatus>,
}

#[derive(Debug, Clone, Default)]
struct Draft {
    query: String,
    status: Option<ShortUrlStatus>,
}

pub struct ListQueryController {
    committed: Arc<watch::Sender<ListQuery>>,
    draft: Mutex<Draft>,
    debouncer: Debouncer,
}

impl ListQueryController {
    pub fn new(debounce: Duration) -> Self {
        let (committed, _) = watch::channel(ListQuery::default());
        Self {
            committed: Arc::new(committed),
            draft: Mutex::new(Draft::default()),
            debouncer: Debouncer::new(debounce),
        }
    }

    pub fn current(&self) -> ListQuery {
        self.committed.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListQuery> {
        self.committed.subscribe()
    }

    /// Commit a page change immediately.
    pub fn set_page(&self, page: u32) {
        self.committed.send_if_modified(|q| {
            let changed = q.page != page;
            q.page = page;
            changed
        });
    }

    /// Update the search text; commits after the debounce window.
    pub fn set_query(&self, query: impl Into<String>) {
        let query = query.into();
        self.update_draft(|d| d.query = query);
    }

    /// Update the status filter; commits after the debounce window.
    pub fn set_status(&self, status: Option<ShortUrlStatus>) {
        self.update_draft(|d| d.status = status);
    }

    pub fn has_pending_reset(&self) -> bool {
        self.debouncer.is_pending()
    }

    fn update_draft(&self, f: impl FnOnce(&mut Draft)) {
        let draft = {
            let mut draft = self.draft.lock().unwrap_or_else(|e| e.into_inner());
            f(&mut draft);
            draft.clone()
        };

        let committed = self.committed.clone();
        self.debouncer.schedule(async move {
            tracing::debug!("Search settled on '{}', resetting to first page", draft.query);
            committed.send_modify(|q| {
                q.query = draft.query;
                q.status = draft.status;
                q.page = 0;
            });
        });
    }
}

/// "Showing 91 - 95 of 95 results" for a zero-based `page`.
pub fn showing_label(total_elements: u64, page_size: u32, page: u32) -> String {
    if total_elements == 0 {
        return "Showing 0 - 0 of 0 results".to_string();
    }
    let size = u64::from(page_size.max(1));
    let start = (u64::from(page) * size + 1).min(total_elements);
    let end = ((u64::from(page) + 1) * size).min(total_elements);
    format!(
        "Showing {} - {} of {} results",
        start, end, total_elements
    )
}

/// The last successfully loaded page plus a dismissible error.
#[derive(Debug, Clone)]
pub struct PagedList<T> {
    items: Vec<T>,
    total_elements: u64,
    total_pages: u32,
    page: u32,
    size: u32,
    error: Option<String>,
}

impl<T> Default for PagedList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total_elements: 0,
            total_pages: 0,
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            error: None,
        }
    }
}

impl<T> PagedList<T> {
    /// Take a fetch result. On failure the previous page stays visible.
    pub fn apply(&mut self, result: Result<Page<T>, ApiError>) {
        match result {
            Ok(page) => {
                self.total_elements = page.total_elements;
                self.total_pages = page.total_pages;
                self.page = page.number;
                if page.size > 0 {
                    self.size = page.size;
                }
                self.items = page.content.into_vec();
                self.error = None;
            }
            Err(e) => {
                tracing::warn!("Failed to load page: {}", e);
                self.error = Some(e.to_string());
            }
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn total_elements(&self) -> u64 {
        self.total_elements
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn showing_label(&self) -> String {
        showing_label(self.total_elements, self.size, self.page)
    }
}
