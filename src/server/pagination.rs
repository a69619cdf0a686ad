use std::ops::Range;

pub const QUESTIONS_PER_PAGE: usize = 10;

/// Index range of 1-based `page` over `total` items, clipped on the last page.
/// `None` when the page starts at or past the end.
pub fn page_bounds(page: usize, total: usize) -> Option<Range<usize>> {
    let start = page.checked_sub(1)?.saturating_mul(QUESTIONS_PER_PAGE);
    if start >= total {
        return None;
    }
    Some(start..total.min(start + QUESTIONS_PER_PAGE))
}

pub fn paginate<T>(items: &[T], page: usize) -> Option<&[T]> {
    page_bounds(page, items.len()).map(|range| &items[range])
}
