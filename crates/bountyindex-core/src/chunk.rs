//! Block-range tiling under the log source's per-query range cap.

/// Tile `[from, to]` (inclusive) into consecutive, non-overlapping windows of
/// at most `max_range` blocks.
///
/// The windows cover the interval exactly, in ascending order; the count is
/// `ceil((to - from + 1) / max_range)`. Returns no windows when `from > to`.
pub fn block_windows(from: u64, to: u64, max_range: u64) -> Vec<(u64, u64)> {
    assert!(max_range > 0, "max_range must be positive");
    let mut windows = Vec::new();
    let mut start = from;
    while start <= to {
        let end = start.saturating_add(max_range - 1).min(to);
        windows.push((start, end));
        if end == u64::MAX {
            break;
        }
        start = end + 1;
    }
    windows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_window_when_range_fits() {
        assert_eq!(block_windows(101, 200, 10_000), vec![(101, 200)]);
    }

    #[test]
    fn exact_three_window_tiling() {
        let windows = block_windows(101, 25_100, 10_000);
        assert_eq!(
            windows,
            vec![(101, 10_100), (10_101, 20_100), (20_101, 25_100)]
        );
    }

    #[test]
    fn empty_when_from_exceeds_to() {
        assert!(block_windows(201, 200, 10_000).is_empty());
    }

    #[test]
    fn single_block_interval() {
        assert_eq!(block_windows(5, 5, 10_000), vec![(5, 5)]);
    }

    #[test]
    fn tiling_is_contiguous_and_exact() {
        for (from, to, range) in [(0, 99, 7), (1, 1_000, 13), (42, 42, 1), (10, 35, 5)] {
            let windows = block_windows(from, to, range);
            let expected_count = ((to - from + 1) + range - 1) / range;
            assert_eq!(windows.len() as u64, expected_count);

            assert_eq!(windows.first().unwrap().0, from);
            assert_eq!(windows.last().unwrap().1, to);
            for w in &windows {
                assert!(w.0 <= w.1);
                assert!(w.1 - w.0 + 1 <= range);
            }
            for pair in windows.windows(2) {
                assert_eq!(pair[1].0, pair[0].1 + 1);
            }
        }
    }
}
