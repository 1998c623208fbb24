use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 100;

/// A bounded slice of a larger result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

/// Slice an already-fetched result set. `limit` is clamped to
/// `1..=MAX_LIMIT`; an offset past the end yields an empty page.
pub fn paginate<T>(items: Vec<T>, limit: usize, offset: usize) -> Page<T> {
    let limit = limit.clamp(1, MAX_LIMIT);
    let total = items.len();
    let items = items.into_iter().skip(offset).take(limit).collect();
    Page {
        items,
        total,
        limit,
        offset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page() {
        let page = paginate((1..=25).collect(), 10, 0);
        assert_eq!(page.items, (1..=10).collect::<Vec<_>>());
        assert_eq!(page.total, 25);
        assert_eq!(page.limit, 10);
        assert_eq!(page.offset, 0);
    }

    #[test]
    fn last_partial_page() {
        let page = paginate((1..=25).collect(), 10, 20);
        assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
        assert_eq!(page.total, 25);
    }

    #[test]
    fn offset_past_end_is_empty() {
        let page = paginate(vec![1, 2, 3], 10, 50);
        assert!(page.items.is_empty());
        assert_eq!(page.total, 3);
    }

    #[test]
    fn limit_is_clamped() {
        assert_eq!(paginate(vec![1, 2, 3], 0, 0).items, vec![1]);
        let big = paginate((0..500).collect::<Vec<_>>(), 1000, 0);
        assert_eq!(big.limit, MAX_LIMIT);
        assert_eq!(big.items.len(), MAX_LIMIT);
    }
}
