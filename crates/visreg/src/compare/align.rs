use image::RgbaImage;
use tracing::debug;

use super::differ::{self, Offset};
use super::raster;

/// Reduction factor for the coarse search phase. Tuning constant, not a
/// correctness property: the refinement window below absorbs the
/// quantization it introduces.
const COARSE_SCALE: u32 = 20;

/// Find the reference placement that minimizes the aggregate pixel
/// distance against the candidate.
///
/// Runs the exhaustive grid search twice: first on copies downscaled by
/// `COARSE_SCALE` to locate an approximate offset cheaply, then at full
/// resolution over a small window around the upscaled coarse result.
/// Ties go to the first offset in row-major scan order (dx outer, dy
/// inner, ascending); the scan is sequential, so the tie-break holds
/// regardless of how callers schedule comparisons.
pub fn best_offset(candidate: &RgbaImage, reference: &RgbaImage) -> Offset {
    let cap = (
        candidate.width().abs_diff(reference.width()) as i32,
        candidate.height().abs_diff(reference.height()) as i32,
    );
    if cap == (0, 0) {
        return Offset::ZERO;
    }

    let min_dim = candidate
        .width()
        .min(candidate.height())
        .min(reference.width())
        .min(reference.height());
    if min_dim < COARSE_SCALE {
        // Too small to downscale meaningfully; one full-resolution pass.
        return search(candidate, reference, (0, 0), cap);
    }

    let candidate_small = raster::downscale(candidate, COARSE_SCALE);
    let reference_small = raster::downscale(reference, COARSE_SCALE);
    let coarse_cap = (
        candidate_small.width().abs_diff(reference_small.width()) as i32,
        candidate_small.height().abs_diff(reference_small.height()) as i32,
    );
    let coarse = search(&candidate_small, &reference_small, (0, 0), coarse_cap);

    // Full-resolution window around the upscaled coarse offset, half the
    // scale factor to each side, clamped to the search cap.
    let half = (COARSE_SCALE / 2) as i32;
    let base = (coarse.dx * COARSE_SCALE as i32, coarse.dy * COARSE_SCALE as i32);
    let start = (
        (base.0 - half).clamp(0, cap.0),
        (base.1 - half).clamp(0, cap.1),
    );
    let window_cap = (
        (base.0 + half).clamp(start.0, cap.0),
        (base.1 + half).clamp(start.1, cap.1),
    );

    let refined = search(candidate, reference, start, window_cap);
    debug!(
        dx = refined.dx,
        dy = refined.dy,
        "alignment search converged"
    );
    refined
}

/// Exhaustive scan of `dx ∈ [start.0, cap.0]`, `dy ∈ [start.1, cap.1]`.
/// Strictly-less-than keeps the first minimum encountered.
fn search(
    candidate: &RgbaImage,
    reference: &RgbaImage,
    start: (i32, i32),
    cap: (i32, i32),
) -> Offset {
    let mut best = Offset::new(start.0, start.1);
    let mut best_distance = f64::INFINITY;

    for dx in start.0..=cap.0 {
        for dy in start.1..=cap.1 {
            let offset = Offset::new(dx, dy);
            // An offset that leaves no overlap has nothing to compare and
            // must not score as a perfect match.
            if differ::overlap(candidate, reference, offset).is_none() {
                continue;
            }
            let distance = differ::aggregate(candidate, reference, offset);
            if distance < best_distance {
                best_distance = distance;
                best = offset;
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn white(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255]))
    }

    fn with_square(mut img: RgbaImage, x0: u32, y0: u32, size: u32) -> RgbaImage {
        for y in y0..y0 + size {
            for x in x0..x0 + size {
                img.put_pixel(x, y, Rgba([0, 0, 0, 255]));
            }
        }
        img
    }

    #[test]
    fn equal_dimensions_skip_the_search() {
        let a = white(40, 40);
        let b = with_square(white(40, 40), 5, 5, 10);
        assert_eq!(best_offset(&a, &b), Offset::ZERO);
    }

    #[test]
    fn recovers_translation_of_identical_content() {
        // Same square, shifted (10, 8) in a larger candidate canvas.
        let reference = with_square(white(100, 80), 30, 20, 12);
        let candidate = with_square(white(110, 88), 40, 28, 12);
        assert_eq!(best_offset(&candidate, &reference), Offset::new(10, 8));
    }

    #[test]
    fn small_images_use_one_full_pass() {
        let reference = with_square(white(12, 12), 2, 2, 3);
        let candidate = with_square(white(15, 14), 5, 4, 3);
        assert_eq!(best_offset(&candidate, &reference), Offset::new(3, 2));
    }

    #[test]
    fn flat_images_tie_break_to_first_offset() {
        // Every offset scores identically; row-major first wins.
        let candidate = white(30, 24);
        let reference = white(26, 21);
        assert_eq!(best_offset(&candidate, &reference), Offset::ZERO);
    }
}
