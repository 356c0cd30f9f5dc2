//! Fixed-size pagination over the sorted feed.

/// Posts shown per page.
pub const PAGE_SIZE: usize = 20;

pub const PREVIOUS_LABEL: &str = "Anterior";
pub const NEXT_LABEL: &str = "Siguiente";

/// State of the prev/next controls for the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageControls {
    pub current: usize,
    pub total_pages: usize,
    pub prev_disabled: bool,
    pub next_disabled: bool,
    /// `"Página {current} de {total_pages}"`.
    pub label: String,
}

/// Number of pages needed for `total` items.  A zero page size yields zero
/// pages.
pub fn total_pages(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

/// The items on 1-based `page`.  Pages outside the collection, including
/// page 0, are empty rather than an error.
pub fn page_slice<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    let Some(start) = page.checked_sub(1).and_then(|p| p.checked_mul(page_size)) else {
        return &[];
    };
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// Controls for `current_page`, or `None` when everything fits on one page.
pub fn controls_for(total: usize, page_size: usize, current_page: usize) -> Option<PageControls> {
    let pages = total_pages(total, page_size);
    if pages <= 1 {
        return None;
    }
    Some(PageControls {
        current: current_page,
        total_pages: pages,
        prev_disabled: current_page <= 1,
        next_disabled: current_page >= pages,
        label: format!("Página {current_page} de {pages}"),
    })
}
