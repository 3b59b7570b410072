//! Remote collection controller.
//!
//! Owns page, filter and sort state for one resource and the items of the
//! latest settled page. Every state change produces a [`FetchTicket`]
//! stamped with a sequence number; completions are applied only when they
//! carry the most recently issued number, so a slow response for an
//! abandoned request can never overwrite a newer one.

use crate::error::ConsoleError;
use crate::page::{PageRequest, PageResult, SortDirection};
use crate::source::CollectionSource;

#[derive(Debug, Clone, PartialEq)]
pub enum CollectionStatus {
    Idle,
    Loading,
    Loaded,
    Error(ConsoleError),
}

/// A fetch the caller must issue for the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub seq: u64,
    pub request: PageRequest,
}

impl FetchTicket {
    /// Run the fetch against `source`. The outcome goes back through
    /// [`RemoteCollectionController::complete`].
    pub async fn run<S: CollectionSource + ?Sized>(self, source: &S) -> FetchOutcome<S::Item> {
        let result = source.fetch_page(&self.request).await;
        FetchOutcome {
            seq: self.seq,
            result,
        }
    }
}

/// Settled fetch, tagged with the ticket's sequence number.
#[derive(Debug)]
pub struct FetchOutcome<T> {
    pub seq: u64,
    pub result: Result<PageResult<T>, ConsoleError>,
}

#[derive(Debug, Clone)]
pub struct RemoteCollectionController<T> {
    request: PageRequest,
    items: Vec<T>,
    total_items: u64,
    total_pages: u32,
    status: CollectionStatus,
    latest_seq: u64,
}

impl<T> RemoteCollectionController<T> {
    pub fn new(initial: PageRequest) -> Self {
        Self {
            request: initial,
            items: Vec::new(),
            total_items: 0,
            total_pages: 0,
            status: CollectionStatus::Idle,
            latest_seq: 0,
        }
    }

    pub fn request(&self) -> &PageRequest {
        &self.request
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn total_items(&self) -> u64 {
        self.total_items
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn status(&self) -> &CollectionStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == CollectionStatus::Loading
    }

    pub fn error(&self) -> Option<&ConsoleError> {
        match &self.status {
            CollectionStatus::Error(err) => Some(err),
            _ => None,
        }
    }

    /// Sequence number of the most recently issued fetch.
    pub fn latest_seq(&self) -> u64 {
        self.latest_seq
    }

    /// Merge a filter. Blank values clear the key. Always returns to page 1.
    pub fn set_filter(&mut self, key: impl Into<String>, value: impl AsRef<str>) -> FetchTicket {
        let key = key.into();
        let value = value.as_ref().trim();
        if value.is_empty() {
            self.request.filters.remove(&key);
        } else {
            self.request.filters.insert(key, value.to_string());
        }
        self.request.page_number = 1;
        self.issue()
    }

    pub fn clear_filters(&mut self) -> FetchTicket {
        self.request.filters.clear();
        self.request.page_number = 1;
        self.issue()
    }

    /// Replace the sort. The current page is kept.
    pub fn set_sort(&mut self, field: impl Into<String>, direction: SortDirection) -> FetchTicket {
        self.request.sort_field = field.into();
        self.request.sort_direction = direction;
        self.issue()
    }

    /// Move to page `n`, clamped to `[1, total_pages]`.
    pub fn set_page(&mut self, n: u32) -> FetchTicket {
        let last = self.total_pages.max(1);
        self.request.page_number = n.clamp(1, last);
        self.issue()
    }

    pub fn next_page(&mut self) -> FetchTicket {
        self.set_page(self.request.page_number.saturating_add(1))
    }

    pub fn previous_page(&mut self) -> FetchTicket {
        self.set_page(self.request.page_number.saturating_sub(1))
    }

    /// Change the page size and return to page 1.
    pub fn set_page_size(&mut self, n: u32) -> FetchTicket {
        self.request.page_size = n.max(1);
        self.request.page_number = 1;
        self.issue()
    }

    /// Re-issue the fetch for the current state.
    pub fn refresh(&mut self) -> FetchTicket {
        self.issue()
    }

    pub fn is_current(&self, seq: u64) -> bool {
        seq == self.latest_seq
    }

    /// Apply a settled fetch. Returns `false` when the outcome was stale and
    /// therefore discarded.
    pub fn complete(&mut self, seq: u64, result: Result<PageResult<T>, ConsoleError>) -> bool {
        if !self.is_current(seq) {
            tracing::debug!(seq, latest = self.latest_seq, "discarding superseded page response");
            return false;
        }
        match result {
            Ok(page) => {
                self.items = page.items;
                self.total_items = page.total_items;
                self.total_pages = page.total_pages;
                self.status = CollectionStatus::Loaded;
            }
            Err(err) => {
                // Previous items stay visible beneath the error.
                self.status = CollectionStatus::Error(err);
            }
        }
        true
    }

    /// Apply a [`FetchOutcome`].
    pub fn apply(&mut self, outcome: FetchOutcome<T>) -> bool {
        self.complete(outcome.seq, outcome.result)
    }

    /// Pull the current page back into `[1, total_pages]` after the
    /// collection shrank beneath it, e.g. when the last record on the final
    /// page was deleted. Returns the follow-up fetch for the clamped page.
    pub fn realign(&mut self) -> Option<FetchTicket> {
        if self.status != CollectionStatus::Loaded
            || self.total_pages == 0
            || self.request.page_number <= self.total_pages
        {
            return None;
        }
        tracing::debug!(
            page = self.request.page_number,
            total_pages = self.total_pages,
            "current page past the end; moving to last page"
        );
        self.request.page_number = self.total_pages;
        Some(self.issue())
    }

    /// Issue `ticket` against `source` and apply the result in place,
    /// following up when the settled page fell outside the collection.
    pub async fn load<S>(&mut self, source: &S, ticket: FetchTicket) -> bool
    where
        S: CollectionSource<Item = T> + ?Sized,
    {
        let outcome = ticket.run(source).await;
        if !self.apply(outcome) {
            return false;
        }
        if let Some(follow_up) = self.realign() {
            let outcome = follow_up.run(source).await;
            return self.apply(outcome);
        }
        true
    }

    fn issue(&mut self) -> FetchTicket {
        self.latest_seq += 1;
        self.status = CollectionStatus::Loading;
        FetchTicket {
            seq: self.latest_seq,
            request: self.request.clone(),
        }
    }
}
