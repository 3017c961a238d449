//! Scroll window over the flattened tree.

use std::ops::Range;

/// Compute the scroll offset and the visible range of lines.
///
/// The offset only moves when the selected line enters the `edge_padding`
/// band at either edge of the window, so repeated renders with the
/// selection in the middle do not jump. Padding is capped at
/// `(height - 1) / 2` so the selected line always stays inside the window.
/// Returns an empty range when there is nothing to show.
pub fn window(
    line_count: usize,
    selected: usize,
    height: usize,
    edge_padding: usize,
    previous_offset: usize,
) -> (usize, Range<usize>) {
    if height == 0 || line_count == 0 {
        return (0, 0..0);
    }

    let n = line_count as i64;
    let h = height as i64;
    let s = selected.min(line_count - 1) as i64;
    let pad = edge_padding.min((height - 1) / 2) as i64;
    let mut offset = previous_offset as i64;

    if s + 1 > h + offset - pad {
        offset = (s + 1 - h + pad).min(n - h).max(0);
    } else if s < pad + offset {
        offset = (s - pad).max(0);
    }
    // The list may have shrunk since the previous offset was stored.
    let offset = offset.clamp(0, (n - h).max(0)) as usize;

    (offset, offset..(offset + height).min(line_count))
}

/// Per-view scroll state: the offset persisted between renders.
#[derive(Debug, Clone, Default)]
pub struct Viewport {
    offset: usize,
    pub edge_padding: usize,
}

impl Viewport {
    pub fn new(edge_padding: usize) -> Self {
        Self {
            offset: 0,
            edge_padding,
        }
    }

    /// Update the stored offset for this frame and return the visible range.
    pub fn scroll(&mut self, line_count: usize, selected: usize, height: usize) -> Range<usize> {
        let (offset, range) = window(line_count, selected, height, self.edge_padding, self.offset);
        self.offset = offset;
        range
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn everything_fits() {
        assert_eq!(window(5, 4, 10, 3, 0), (0, 0..5));
    }

    #[test]
    fn empty_inputs_give_empty_range() {
        assert_eq!(window(0, 0, 10, 3, 4), (0, 0..0));
        assert_eq!(window(10, 3, 0, 3, 4), (0, 0..0));
    }

    #[test]
    fn scrolls_down_to_keep_bottom_padding() {
        // Row 7 of a 10-line window with padding 3 is inside the band.
        assert_eq!(window(100, 7, 10, 3, 0), (1, 1..11));
        assert_eq!(window(100, 6, 10, 3, 0), (0, 0..10));
    }

    #[test]
    fn scrolls_up_to_keep_top_padding() {
        assert_eq!(window(100, 20, 10, 3, 20), (17, 17..27));
    }

    #[test]
    fn does_not_scroll_past_the_end() {
        assert_eq!(window(100, 99, 10, 3, 0), (90, 90..100));
        assert_eq!(window(100, 98, 10, 3, 85), (90, 90..100));
    }

    #[test]
    fn offset_clamped_when_list_shrinks() {
        let (offset, range) = window(12, 11, 10, 3, 50);
        assert_eq!(offset, 2);
        assert_eq!(range, 2..12);
    }

    #[test]
    fn large_padding_is_capped() {
        // Uncapped, rule 1 would push the selection out of the window.
        let (offset, range) = window(100, 0, 4, 10, 0);
        assert!(range.contains(&0));
        assert_eq!(offset, 0);
        let (offset, range) = window(100, 50, 4, 10, 0);
        assert!(range.contains(&50));
        assert_eq!(offset, 48);
    }

    #[test]
    fn stable_while_selection_in_band() {
        let mut offset = 0;
        for selected in 0..40 {
            offset = window(40, selected, 10, 2, offset).0;
        }
        assert_eq!(offset, 30);
        for selected in [32, 33, 35, 37] {
            let (next, _) = window(40, selected, 10, 2, offset);
            assert_eq!(next, offset, "moved at {selected}");
        }
    }

    #[test]
    fn correctness_over_many_inputs() {
        for n in 1..30 {
            for height in 1..12 {
                for pad in 0..6 {
                    let mut offset = 0;
                    for selected in (0..n).chain((0..n).rev()).chain([n / 2, 0, n - 1]) {
                        let (next, range) = window(n, selected, height, pad, offset);
                        assert!(next <= n.saturating_sub(height));
                        assert!(range.contains(&selected));
                        assert_eq!(range.start, next);
                        assert_eq!(range.len(), height.min(n));

                        if selected >= offset + pad && selected + pad < offset + height {
                            assert_eq!(next, offset);
                        }
                        offset = next;
                    }
                }
            }
        }
    }

    #[test]
    fn viewport_persists_offset() {
        let mut viewport = Viewport::new(2);
        assert_eq!(viewport.scroll(50, 20, 10), 13..23);
        assert_eq!(viewport.offset, 13);
        assert_eq!(viewport.scroll(50, 18, 10), 13..23);
        assert_eq!(viewport.scroll(50, 0, 10), 0..10);
    }
}
