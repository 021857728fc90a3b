//! Page arithmetic shared by the list endpoints.
//!
//! List responses carry the same envelope everywhere:
//! `{"<entity>": [...], "total": n, "pages": n, "current_page": n}`.

const MAX_PER_PAGE: i64 = 100;

/// Normalizes raw query values into a usable (page, per_page) pair.
pub fn page_window(page: Option<i64>, per_page: Option<i64>, default_per_page: i64) -> (i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(default_per_page).clamp(1, MAX_PER_PAGE);
    (page, per_page)
}

pub fn offset_for(page: i64, per_page: i64) -> i64 {
    (page - 1) * per_page
}

/// Total page count for `total` records at `per_page` per page.
pub fn page_count(total: i64, per_page: i64) -> i64 {
    if total == 0 {
        0
    } else {
        (total + per_page - 1) / per_page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_query_is_empty() {
        assert_eq!(page_window(None, None, 20), (1, 20));
        assert_eq!(page_window(None, None, 10), (1, 10));
    }

    #[test]
    fn page_and_size_are_clamped() {
        assert_eq!(page_window(Some(0), Some(-5), 20), (1, 1));
        assert_eq!(page_window(Some(3), Some(500), 20), (3, 100));
    }

    #[test]
    fn page_count_is_consistent_with_total() {
        assert_eq!(page_count(0, 10), 0);
        assert_eq!(page_count(1, 10), 1);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
        assert_eq!(page_count(95, 20), 5);
    }

    #[test]
    fn offsets_step_by_page_size() {
        assert_eq!(offset_for(1, 20), 0);
        assert_eq!(offset_for(3, 10), 20);
    }
}
