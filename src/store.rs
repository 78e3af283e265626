//! The current page of records held by one view.

use serde::Serialize;

use crate::error::Error;
use crate::filter::PAGE_SIZE;
use crate::types::Page;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewStatus {
    Loading,
    Ready,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationState {
    pub count: u64,
    pub has_next: bool,
    pub has_previous: bool,
    pub page: u32,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            count: 0,
            has_next: false,
            has_previous: false,
            page: 1,
        }
    }
}

impl PaginationState {
    pub fn total_pages(&self) -> u64 {
        self.count.div_ceil(PAGE_SIZE)
    }

    /// 1-based `(first, last)` row numbers shown on the current page.
    pub fn showing(&self) -> Option<(u64, u64)> {
        if self.count == 0 {
            return None;
        }
        let first = (u64::from(self.page) - 1) * PAGE_SIZE + 1;
        if first > self.count {
            return None;
        }
        Some((first, (u64::from(self.page) * PAGE_SIZE).min(self.count)))
    }
}

/// Issued by [`RecordStore::begin_fetch`]; only the newest ticket may land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
    page: u32,
}

impl FetchTicket {
    pub fn page(&self) -> u32 {
        self.page
    }
}

#[derive(Debug)]
pub enum FetchOutcome {
    Applied,
    /// A newer request was issued after this one; the response was dropped.
    Stale,
    /// The displayed records were left untouched.
    Failed(Error),
}

#[derive(Debug, Clone)]
pub struct RecordStore<T> {
    records: Vec<T>,
    pagination: PaginationState,
    status: ViewStatus,
    issued: u64,
    loaded: bool,
}

impl<T> Default for RecordStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RecordStore<T> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            pagination: PaginationState::default(),
            status: ViewStatus::Loading,
            issued: 0,
            loaded: false,
        }
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn pagination(&self) -> &PaginationState {
        &self.pagination
    }

    pub fn status(&self) -> ViewStatus {
        self.status
    }

    /// True once any fetch has completed, successfully or not.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn begin_fetch(&mut self, page: u32) -> FetchTicket {
        self.issued += 1;
        self.status = ViewStatus::Loading;
        FetchTicket {
            seq: self.issued,
            page: page.max(1),
        }
    }

    pub fn complete(&mut self, ticket: FetchTicket, result: crate::Result<Page<T>>) -> FetchOutcome {
        if ticket.seq != self.issued {
            tracing::debug!(
                ticket = ticket.seq,
                newest = self.issued,
                "dropping stale response"
            );
            return FetchOutcome::Stale;
        }

        self.status = ViewStatus::Ready;
        self.loaded = true;
        match result {
            Ok(page) => {
                self.pagination = PaginationState {
                    count: page.count,
                    has_next: page.has_next,
                    has_previous: page.has_previous,
                    page: ticket.page,
                };
                self.records = page.results;
                FetchOutcome::Applied
            }
            Err(err) => FetchOutcome::Failed(err),
        }
    }

    /// Drops everything, as when the view is closed.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(results: Vec<u32>, count: u64, has_next: bool) -> crate::Result<Page<u32>> {
        Ok(Page {
            results,
            count,
            has_next,
            has_previous: false,
        })
    }

    #[test]
    fn first_fetch_moves_from_loading_to_ready() {
        let mut store = RecordStore::<u32>::new();
        assert_eq!(store.status(), ViewStatus::Loading);
        assert!(!store.is_loaded());

        let t = store.begin_fetch(1);
        assert!(matches!(
            store.complete(t, page(vec![1, 2], 2, false)),
            FetchOutcome::Applied
        ));
        assert_eq!(store.status(), ViewStatus::Ready);
        assert_eq!(store.records(), &[1, 2]);
    }

    #[test]
    fn failure_keeps_previous_page() {
        let mut store = RecordStore::<u32>::new();
        let t = store.begin_fetch(2);
        store.complete(t, page(vec![7, 8], 45, true));

        let t = store.begin_fetch(3);
        assert_eq!(store.status(), ViewStatus::Loading);
        let outcome = store.complete(t, Err(Error::Network("boom".into())));
        assert!(matches!(outcome, FetchOutcome::Failed(_)));
        assert_eq!(store.status(), ViewStatus::Ready);
        assert_eq!(store.records(), &[7, 8]);
        assert_eq!(store.pagination().page, 2);
        assert_eq!(store.pagination().count, 45);
    }

    #[test]
    fn out_of_order_responses_do_not_overwrite_newer_ones() {
        let mut store = RecordStore::<u32>::new();
        let older = store.begin_fetch(1);
        let newer = store.begin_fetch(2);

        assert!(matches!(
            store.complete(newer, page(vec![2], 30, false)),
            FetchOutcome::Applied
        ));
        assert!(matches!(
            store.complete(older, page(vec![1], 30, true)),
            FetchOutcome::Stale
        ));
        assert_eq!(store.records(), &[2]);
        assert_eq!(store.pagination().page, 2);
    }

    #[test]
    fn pagination_math() {
        let p = PaginationState {
            count: 45,
            has_next: true,
            has_previous: true,
            page: 3,
        };
        assert_eq!(p.total_pages(), 3);
        assert_eq!(p.showing(), Some((41, 45)));

        let empty = PaginationState::default();
        assert_eq!(empty.total_pages(), 0);
        assert_eq!(empty.showing(), None);
    }
}
