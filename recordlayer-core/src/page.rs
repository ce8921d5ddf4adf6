//! Pagination over filtered record reads.

use serde::{Deserialize, Serialize};

/// A single page of results plus the navigation metadata around it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total number of matching items across all pages.
    pub count: u64,
    pub next_page: Option<usize>,
    pub previous_page: Option<usize>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            count: 0,
            next_page: None,
            previous_page: None,
        }
    }
}

impl<T> Page<T> {
    /// Converts the items while keeping the navigation metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            count: self.count,
            next_page: self.next_page,
            previous_page: self.previous_page,
        }
    }
}

/// Which page to read and how large pages are. Pages are 1-indexed; a page number of
/// zero is treated as the first page.
///
/// ```ignore
/// let params = PaginationParams::new(3, 20);
/// assert_eq!(params.offset(), 40);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationParams {
    pub page: usize,
    pub per_page: usize,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self { page: 1, per_page: 20 }
    }
}

impl PaginationParams {
    pub fn new(page: usize, per_page: usize) -> Self {
        Self { page, per_page }
    }

    /// Number of items to skip to reach this page.
    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }

    /// Wraps one page of items read at [`offset`](Self::offset) out of `count` in total.
    pub fn page_of<T>(&self, items: Vec<T>, count: u64) -> Page<T> {
        let page = self.page.max(1);
        let seen = (page as u64).saturating_mul(self.per_page as u64);

        Page {
            items,
            count,
            next_page: (self.per_page > 0 && seen < count)
                .then(|| page.checked_add(1))
                .flatten(),
            previous_page: (page > 1).then(|| page - 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn middle_page_links_both_ways() {
        let params = PaginationParams::new(2, 10);
        let page = params.page_of(vec![0; 10], 35);

        assert_eq!(params.offset(), 10);
        assert_eq!(page.next_page, Some(3));
        assert_eq!(page.previous_page, Some(1));
    }

    #[test]
    fn last_page_has_no_next() {
        let page = PaginationParams::new(4, 10).page_of(vec![0; 5], 35);

        assert_eq!(page.next_page, None);
        assert_eq!(page.previous_page, Some(3));
    }

    #[test]
    fn page_zero_reads_first_page() {
        let params = PaginationParams::new(0, 10);

        assert_eq!(params.offset(), 0);
        assert_eq!(params.page_of(Vec::<u8>::new(), 0).previous_page, None);
    }

    #[test]
    fn huge_page_number_does_not_overflow() {
        let params = PaginationParams::new(usize::MAX / 2, 4);

        assert_eq!(params.offset(), usize::MAX);

        let page = params.page_of(Vec::<u8>::new(), 10);

        assert_eq!(page.next_page, None);
        assert_eq!(page.previous_page, Some(usize::MAX / 2 - 1));
    }
}
