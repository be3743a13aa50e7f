//! Page number windowing for the task list pager
//!
//! Produces the sequence of page buttons to render: always the first and
//! last page, the neighbours of the current page, and ellipsis markers for
//! the gaps in between.

use crate::config::DEFAULT_MAX_VISIBLE_PAGES;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "page")]
pub enum PageItem {
    Page(u32),
    Ellipsis,
}

/// Window with the default number of visible pages
pub fn window_default(page: u32, total_pages: u32) -> Vec<PageItem> {
    window(page, total_pages, DEFAULT_MAX_VISIBLE_PAGES)
}

/// Compute the page buttons for `page` out of `total_pages`.
///
/// Out-of-range pages are not rejected; they simply produce a window
/// without a middle section.
pub fn window(page: u32, total_pages: u32, max_visible: u32) -> Vec<PageItem> {
    if total_pages <= max_visible.saturating_add(2) {
        return (1..=total_pages).map(PageItem::Page).collect();
    }

    let mut items = vec![PageItem::Page(1)];

    if page > 3 {
        items.push(PageItem::Ellipsis);
    }

    let start = page.saturating_sub(1).max(2);
    let end = page.saturating_add(1).min(total_pages - 1);
    items.extend((start..=end).map(PageItem::Page));

    if page < total_pages - 2 {
        items.push(PageItem::Ellipsis);
    }

    items.push(PageItem::Page(total_pages));
    items
}

pub fn has_previous(page: u32) -> bool {
    page > 1
}

pub fn has_next(page: u32, total_pages: u32) -> bool {
    page < total_pages
}
