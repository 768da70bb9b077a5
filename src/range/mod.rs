//! Range Query Engine
//!
//! Returns the contiguous sub-slice of a time-ordered sequence that falls
//! inside an inclusive `[start, end]` window.
//!
//! ```text
//! ts:      1   3   5   7   9        window [2, 8]
//!              ^lower      ^upper   →  [3, 5, 7]
//! ```
//!
//! Both bounds are found with a binary search, so a query costs
//! O(log n) and the result borrows from the input. Input must already be
//! sorted ascending by the same timestamp this engine reads; nothing here
//! sorts.
//!
//! A missing timestamp reads as epoch 0 and therefore sorts first. The
//! target timeline orders missing starts last instead; the two conventions
//! are independent.

pub mod error;
pub mod window;

pub use error::{RangeError, RangeResult};
pub use window::TimeWindow;

use crate::stac::CatalogItem;

/// Anything with an epoch-millisecond timestamp to range over
pub trait Timestamped {
    fn timestamp_millis(&self) -> Option<i64>;
}

impl Timestamped for CatalogItem {
    fn timestamp_millis(&self) -> Option<i64> {
        self.start_millis()
    }
}

impl<T: Timestamped + ?Sized> Timestamped for &T {
    fn timestamp_millis(&self) -> Option<i64> {
        (**self).timestamp_millis()
    }
}

#[inline]
fn key<T: Timestamped>(item: &T) -> i64 {
    item.timestamp_millis().unwrap_or(0)
}

/// Index of the first element with timestamp >= `start`
///
/// Equals `items.len()` when every element is earlier.
pub fn lower_bound<T: Timestamped>(items: &[T], start: i64) -> usize {
    items.partition_point(|item| key(item) < start)
}

/// Index of the last element with timestamp <= `end`
///
/// `None` when every element is later.
pub fn upper_bound<T: Timestamped>(items: &[T], end: i64) -> Option<usize> {
    items.partition_point(|item| key(item) <= end).checked_sub(1)
}

/// Elements whose timestamp lies in `[start, end]`
pub fn filter_by_range<T: Timestamped>(items: &[T], start: i64, end: i64) -> &[T] {
    let lower = lower_bound(items, start);
    match upper_bound(items, end) {
        Some(upper) if lower <= upper => &items[lower..=upper],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Obs(Option<i64>);

    impl Timestamped for Obs {
        fn timestamp_millis(&self) -> Option<i64> {
            self.0
        }
    }

    fn series(ts: &[i64]) -> Vec<Obs> {
        ts.iter().map(|&t| Obs(Some(t))).collect()
    }

    fn stamps(items: &[Obs]) -> Vec<i64> {
        items.iter().map(|o| o.0.unwrap_or(0)).collect()
    }

    #[test]
    fn test_inclusive_window() {
        let items = series(&[1, 3, 5, 7, 9]);
        assert_eq!(stamps(filter_by_range(&items, 2, 8)), vec![3, 5, 7]);
        assert_eq!(stamps(filter_by_range(&items, 3, 7)), vec![3, 5, 7]);
        assert_eq!(stamps(filter_by_range(&items, 0, 100)), vec![1, 3, 5, 7, 9]);
    }

    #[test]
    fn test_empty_results() {
        let items = series(&[1, 3, 5, 7, 9]);
        assert!(filter_by_range(&items, 10, 20).is_empty());
        assert!(filter_by_range(&items, -5, 0).is_empty());
        assert!(filter_by_range(&items, 4, 4).is_empty());
        // inverted window
        assert!(filter_by_range(&items, 8, 2).is_empty());
        assert!(filter_by_range::<Obs>(&[], 0, 10).is_empty());
    }

    #[test]
    fn test_bounds() {
        let items = series(&[1, 3, 3, 5]);
        assert_eq!(lower_bound(&items, 3), 1);
        assert_eq!(upper_bound(&items, 3), Some(2));
        assert_eq!(lower_bound(&items, 6), 4);
        assert_eq!(upper_bound(&items, 0), None);
    }

    #[test]
    fn test_result_borrows_input() {
        let items = series(&[1, 3, 5]);
        let slice = filter_by_range(&items, 3, 5);
        assert!(std::ptr::eq(&slice[0], &items[1]));
    }

    #[test]
    fn test_missing_timestamp_is_epoch_zero() {
        let items = vec![Obs(None), Obs(Some(5)), Obs(Some(10))];
        assert_eq!(filter_by_range(&items, 0, 5).len(), 2);
        assert_eq!(filter_by_range(&items, 1, 10).len(), 2);
    }

    #[test]
    fn test_matches_linear_scan() {
        let ts: Vec<i64> = (0..200).map(|i| (i * 7) % 50 + i).collect::<Vec<_>>();
        let mut sorted = ts.clone();
        sorted.sort();
        let items = series(&sorted);

        for (start, end) in [(0, 30), (17, 17), (40, 120), (200, 300), (-1, 1000)] {
            let expected: Vec<i64> = sorted.iter().copied().filter(|t| *t >= start && *t <= end).collect();
            assert_eq!(stamps(filter_by_range(&items, start, end)), expected);
        }
    }
}
