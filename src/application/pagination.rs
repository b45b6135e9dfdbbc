//! Offset pagination over ordered feeds.
//!
//! Pages are 1-indexed. Anything that does not parse to a positive integer
//! resolves to the first page, and a page past the end is simply empty.

use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// A resolved, always-positive page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageNumber(u32);

impl PageNumber {
    pub const FIRST: PageNumber = PageNumber(1);

    pub fn new(value: u32) -> Self {
        if value == 0 { Self::FIRST } else { Self(value) }
    }

    /// Resolve the raw `page` query value.
    pub fn parse(raw: Option<&str>) -> Self {
        raw.and_then(|value| value.trim().parse::<i64>().ok())
            .filter(|value| *value > 0)
            .map(|value| Self(u32::try_from(value).unwrap_or(u32::MAX)))
            .unwrap_or(Self::FIRST)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for PageNumber {
    fn default() -> Self {
        Self::FIRST
    }
}

/// LIMIT/OFFSET pair for the database path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub limit: u32,
    pub offset: u64,
}

impl PageWindow {
    pub fn new(page: PageNumber, page_size: u32) -> Self {
        let limit = page_size.max(1);
        Self {
            limit,
            offset: u64::from(page.get() - 1) * u64::from(limit),
        }
    }

    /// The page this window was built for.
    pub fn page(&self) -> PageNumber {
        let index = self.offset / u64::from(self.limit.max(1));
        PageNumber::new(u32::try_from(index.saturating_add(1)).unwrap_or(u32::MAX))
    }

    pub fn offset_usize(&self) -> usize {
        usize::try_from(self.offset).unwrap_or(usize::MAX)
    }

    pub fn limit_usize(&self) -> usize {
        usize::try_from(self.limit).unwrap_or(usize::MAX)
    }
}

/// Slice `[(n-1)*size, n*size)` of an ordered list, clamped to its bounds.
pub fn paginate<T>(items: &[T], page: PageNumber, page_size: u32) -> &[T] {
    let window = PageWindow::new(page, page_size);
    let start = window.offset_usize().min(items.len());
    let end = start.saturating_add(window.limit_usize()).min(items.len());
    &items[start..end]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub page_number: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PageInfo {
    pub fn new(page: PageNumber, page_size: u32, total_items: u64) -> Self {
        let size = u64::from(page_size.max(1));
        let pages = total_items.div_ceil(size).max(1);
        let total_pages = u32::try_from(pages).unwrap_or(u32::MAX);
        let page_number = page.get();
        Self {
            page_number,
            total_pages,
            total_items,
            has_next: page_number < total_pages,
            has_prev: page_number > 1,
        }
    }
}

/// One page of an ordered feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub info: PageInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thirteen_items_split_ten_three_zero() {
        let items: Vec<u32> = (1..=13).collect();

        assert_eq!(paginate(&items, PageNumber::new(1), 10).len(), 10);
        assert_eq!(paginate(&items, PageNumber::new(2), 10), &[11, 12, 13]);
        assert!(paginate(&items, PageNumber::new(3), 10).is_empty());
    }

    #[test]
    fn window_remembers_its_page() {
        for n in [1, 2, 7] {
            let window = PageWindow::new(PageNumber::new(n), 10);
            assert_eq!(window.page(), PageNumber::new(n));
        }
    }

    #[test]
    fn odd_page_values_resolve_to_first_page() {
        for raw in [None, Some(""), Some("0"), Some("-4"), Some("two"), Some("1.5")] {
            assert_eq!(PageNumber::parse(raw), PageNumber::FIRST, "{raw:?}");
        }
        assert_eq!(PageNumber::parse(Some(" 3 ")).get(), 3);
    }

    #[test]
    fn huge_page_number_is_empty_not_a_panic() {
        let items = [1, 2, 3];
        assert!(paginate(&items, PageNumber::parse(Some("99999999999")), 10).is_empty());
    }

    #[test]
    fn window_matches_slice_bounds() {
        let window = PageWindow::new(PageNumber::new(3), 10);
        assert_eq!(window, PageWindow { limit: 10, offset: 20 });
    }

    #[test]
    fn page_info_counts_at_least_one_page() {
        let empty = PageInfo::new(PageNumber::FIRST, 10, 0);
        assert_eq!(empty.total_pages, 1);
        assert!(!empty.has_next);
        assert!(!empty.has_prev);

        let second = PageInfo::new(PageNumber::new(2), 10, 13);
        assert_eq!(second.total_pages, 2);
        assert!(!second.has_next);
        assert!(second.has_prev);

        let beyond = PageInfo::new(PageNumber::new(5), 10, 13);
        assert_eq!(beyond.page_number, 5);
        assert!(!beyond.has_next);
    }
}
