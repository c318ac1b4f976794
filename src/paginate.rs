//! Fixed-size pagination over filtered result rows.

/// Default rows per page in the result tables.
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// How many numbered buttons the control strip renders at most.
const WINDOW: usize = 5;

/// A view over one page of a filtered sequence. `page_number` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub page_number: usize,
    pub total_pages: usize,
}

/// Slice `items` into the requested page.
///
/// Callers keep `page` within `[1, total_pages]`; the control strip only
/// ever emits valid page numbers, so out-of-range values clamp rather
/// than panic.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> Page<'_, T> {
    let page_size = page_size.max(1);
    let total_pages = items.len().div_ceil(page_size).max(1);
    let page = page.clamp(1, total_pages);
    let start = (page - 1) * page_size;
    let end = (start + page_size).min(items.len());
    Page {
        items: &items[start..end.max(start)],
        page_number: page,
        total_pages,
    }
}

/// Navigation strip state: a window of numbered buttons centered on the
/// current page, with prev/next and ellipsis markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageControls {
    pub numbers: Vec<usize>,
    pub has_prev: bool,
    pub has_next: bool,
    pub leading_ellipsis: bool,
    pub trailing_ellipsis: bool,
}

impl PageControls {
    /// Build the strip for `current` of `total` pages.
    ///
    /// The window holds at most five numbers, centered on the current page
    /// and expanding toward whichever edge has room near a boundary.
    pub fn build(current: usize, total: usize) -> PageControls {
        let total = total.max(1);
        let current = current.clamp(1, total);

        let start = current.saturating_sub(WINDOW / 2).max(1);
        let end = (start + WINDOW - 1).min(total);
        let start = end.saturating_sub(WINDOW - 1).max(1);

        PageControls {
            numbers: (start..=end).collect(),
            has_prev: current > 1,
            has_next: current < total,
            leading_ellipsis: start > 1,
            trailing_ellipsis: end < total,
        }
    }
}
