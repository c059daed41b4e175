use super::regions::BoundaryRect;

/// Composite difference: geometric size mismatch blended with pixel content
/// difference. All values are percentages kept unrounded; presentation
/// rounding happens in [`round2`].
#[derive(Debug, Clone, Copy)]
pub struct Score {
    pub area_diff: f64,
    pub content_diff: f64,
    pub composite: f64,
}

/// Round to two decimals for presentation. Verdicts and offset search
/// compare unrounded values.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Pixel area covered by at least one rectangle. Overlaps count once:
/// the rectangles are cut along every distinct edge coordinate and each
/// resulting cell is tallied at most once.
fn union_area(rects: &[BoundaryRect]) -> u64 {
    if rects.is_empty() {
        return 0;
    }

    let mut xs: Vec<u32> = rects.iter().flat_map(|r| [r.left, r.right]).collect();
    let mut ys: Vec<u32> = rects.iter().flat_map(|r| [r.top, r.bottom]).collect();
    xs.sort_unstable();
    xs.dedup();
    ys.sort_unstable();
    ys.dedup();

    let mut area = 0u64;
    for xw in xs.windows(2) {
        for yw in ys.windows(2) {
            let covered = rects
                .iter()
                .any(|r| xw[0] >= r.left && xw[1] <= r.right && yw[0] >= r.top && yw[1] <= r.bottom);
            if covered {
                area += (xw[1] - xw[0]) as u64 * (yw[1] - yw[0]) as u64;
            }
        }
    }
    area
}

/// Blend the differ's aggregate content distance with the area claimed by
/// size-mismatch regions. Content difference is scaled down by the size
/// share, since that part of the canvas cannot also register content
/// difference. A zero-area canvas scores zero across the board.
pub fn score(aggregate: f64, size_regions: &[BoundaryRect], canvas: (u32, u32)) -> Score {
    let canvas_area = canvas.0 as u64 * canvas.1 as u64;
    if canvas_area == 0 {
        return Score {
            area_diff: 0.0,
            content_diff: 0.0,
            composite: 0.0,
        };
    }

    let area_diff = (100.0 * union_area(size_regions) as f64 / canvas_area as f64).min(100.0);
    let content_diff = aggregate * (100.0 - area_diff) / 100.0;

    Score {
        area_diff,
        content_diff,
        composite: content_diff + area_diff,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_difference_scores_zero() {
        let s = score(0.0, &[], (100, 100));
        assert_eq!(s.composite, 0.0);
        assert_eq!(s.area_diff, 0.0);
        assert_eq!(s.content_diff, 0.0);
    }

    #[test]
    fn size_strip_share_of_canvas() {
        // 20x100 strip on a 120x100 canvas: 16.67% after rounding.
        let strip = BoundaryRect::size(100, 0, 120, 100);
        let s = score(0.0, &[strip], (120, 100));
        assert!((s.area_diff - 100.0 * 2000.0 / 12000.0).abs() < 1e-9);
        assert_eq!(round2(s.composite), 16.67);
    }

    #[test]
    fn content_is_scaled_by_remaining_canvas() {
        let strip = BoundaryRect::size(0, 0, 50, 100);
        let s = score(10.0, &[strip], (100, 100));
        assert!((s.area_diff - 50.0).abs() < 1e-9);
        assert!((s.content_diff - 5.0).abs() < 1e-9);
        assert!((s.composite - 55.0).abs() < 1e-9);
    }

    #[test]
    fn overlapping_size_regions_count_once() {
        let a = BoundaryRect::size(0, 0, 60, 100);
        let b = BoundaryRect::size(40, 0, 100, 100);
        let s = score(0.0, &[a, b], (100, 100));
        // Union covers the whole canvas, not 120%.
        assert!((s.area_diff - 100.0).abs() < 1e-9);
    }

    #[test]
    fn duplicate_regions_count_once() {
        let a = BoundaryRect::size(10, 10, 30, 30);
        let s = score(0.0, &[a, a, a], (100, 100));
        assert!((s.area_diff - 4.0).abs() < 1e-9);
    }

    #[test]
    fn area_diff_never_exceeds_hundred() {
        let a = BoundaryRect::size(0, 0, 100, 100);
        let b = BoundaryRect::size(0, 0, 100, 100);
        let s = score(100.0, &[a, b], (100, 100));
        assert!(s.area_diff <= 100.0);
        assert!(s.composite <= 200.0);
    }

    #[test]
    fn zero_area_canvas_scores_zero() {
        let s = score(50.0, &[], (0, 100));
        assert_eq!(s.composite, 0.0);
    }

    #[test]
    fn round2_is_presentation_only() {
        assert_eq!(round2(16.666_666), 16.67);
        assert_eq!(round2(0.004), 0.0);
        assert_eq!(round2(0.005), 0.01);
    }
}
