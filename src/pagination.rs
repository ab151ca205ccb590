use std::fmt;
use std::ops::Range;

use tracing::trace;

/// Page sizes offered by the "Rows per page" selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageSize {
    Five,
    #[default]
    Ten,
    Twenty,
    Fifty,
}

impl PageSize {
    pub const ALL: [PageSize; 4] = [PageSize::Five, PageSize::Ten, PageSize::Twenty, PageSize::Fifty];

    pub fn rows(self) -> usize {
        match self {
            PageSize::Five => 5,
            PageSize::Ten => 10,
            PageSize::Twenty => 20,
            PageSize::Fifty => 50,
        }
    }

    pub fn from_rows(rows: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.rows() == rows)
    }

    /// Next size in the selector, wrapping around after 50.
    pub fn cycle(self) -> Self {
        match self {
            PageSize::Five => PageSize::Ten,
            PageSize::Ten => PageSize::Twenty,
            PageSize::Twenty => PageSize::Fifty,
            PageSize::Fifty => PageSize::Five,
        }
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rows())
    }
}

/// Page state of the transaction table. Pages are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pager {
    page_size: PageSize,
    current_page: usize,
}

impl Default for Pager {
    fn default() -> Self {
        Self::new(PageSize::default())
    }
}

impl Pager {
    pub fn new(page_size: PageSize) -> Self {
        Self {
            page_size,
            current_page: 1,
        }
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// `ceil(n / size)`, where an empty result still counts as one (empty) page.
    pub fn total_pages(&self, nrows: usize) -> usize {
        std::cmp::max(1, nrows.div_ceil(self.page_size.rows()))
    }

    /// Row positions of the current page within a filtered result of `nrows`.
    pub fn range(&self, nrows: usize) -> Range<usize> {
        let size = self.page_size.rows();
        let begin = std::cmp::min((self.current_page - 1) * size, nrows);
        let end = std::cmp::min(self.current_page * size, nrows);
        begin..end
    }

    pub fn page<'a, T>(&self, rows: &'a [T]) -> &'a [T] {
        &rows[self.range(rows.len())]
    }

    pub fn can_first(&self) -> bool {
        self.current_page > 1
    }

    pub fn can_prev(&self) -> bool {
        self.current_page > 1
    }

    pub fn can_next(&self, nrows: usize) -> bool {
        self.current_page < self.total_pages(nrows)
    }

    pub fn can_last(&self, nrows: usize) -> bool {
        self.current_page < self.total_pages(nrows)
    }

    pub fn first(&mut self) {
        self.current_page = 1;
    }

    pub fn prev(&mut self, nrows: usize) {
        self.goto(self.current_page.saturating_sub(1), nrows);
    }

    pub fn next(&mut self, nrows: usize) {
        self.goto(self.current_page + 1, nrows);
    }

    pub fn last(&mut self, nrows: usize) {
        self.current_page = self.total_pages(nrows);
    }

    /// Jump to a page, clamped to `[1, total_pages]`.
    pub fn goto(&mut self, page: usize, nrows: usize) {
        self.current_page = page.clamp(1, self.total_pages(nrows));
    }

    /// Called whenever the filtered result changes.
    pub fn reset(&mut self) {
        self.current_page = 1;
    }

    /// Changes the page size and keeps the current page inside the new page count.
    pub fn set_page_size(&mut self, page_size: PageSize, nrows: usize) {
        self.page_size = page_size;
        let total = self.total_pages(nrows);
        if self.current_page > total {
            trace!("Clamping page {} to {} after page size change", self.current_page, total);
            self.current_page = total;
        }
    }
}
