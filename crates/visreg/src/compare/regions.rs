use std::collections::HashMap;
use std::collections::hash_map::Entry;

use super::differ::{DifferenceMask, Offset};

/// What a difference region represents: changed pixels, or canvas area only
/// one of the two images covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    Content,
    Size,
}

/// Axis-aligned difference region in canvas coordinates, right/bottom
/// exclusive. Degenerate rectangles (zero width or height) are filtered
/// before leaving this module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryRect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub kind: RegionKind,
}

impl BoundaryRect {
    pub fn content(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
            kind: RegionKind::Content,
        }
    }

    pub fn size(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
            kind: RegionKind::Size,
        }
    }

    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    pub fn is_degenerate(&self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }

    /// Overlapping, or adjacent along an edge or corner. With exclusive
    /// right/bottom bounds, equality on a coordinate means the boxes touch.
    fn touches(&self, other: &BoundaryRect) -> bool {
        self.left <= other.right
            && other.left <= self.right
            && self.top <= other.bottom
            && other.top <= self.bottom
    }

    fn union(&self, other: &BoundaryRect) -> BoundaryRect {
        BoundaryRect {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
            kind: self.kind,
        }
    }
}

struct UnionFind {
    parent: Vec<u32>,
}

impl UnionFind {
    fn new() -> Self {
        Self { parent: Vec::new() }
    }

    fn push(&mut self) -> u32 {
        let id = self.parent.len() as u32;
        self.parent.push(id);
        id
    }

    fn find(&mut self, mut id: u32) -> u32 {
        while self.parent[id as usize] != id {
            let grand = self.parent[self.parent[id as usize] as usize];
            self.parent[id as usize] = grand;
            id = grand;
        }
        id
    }

    fn union(&mut self, a: u32, b: u32) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[rb as usize] = ra;
        }
    }
}

/// Group marked mask cells into a minimal set of bounding rectangles.
///
/// Two passes: connected-component labeling (union-find, 8-connectivity)
/// with per-component bounding boxes, then repeated merging of boxes that
/// overlap or touch until no pair does. The second pass is what makes the
/// output highlight contiguous areas of change rather than scattered
/// specks: components whose boxes meet collapse into one region even when
/// their pixels never touch.
///
/// Output order follows the first scanned pixel of each surviving region,
/// so a given mask always produces the same list.
pub fn merge_mask(mask: &DifferenceMask) -> Vec<BoundaryRect> {
    let (w, h) = (mask.width(), mask.height());
    let mut slots: Vec<u32> = vec![u32::MAX; w as usize * h as usize];
    let mut uf = UnionFind::new();

    for y in 0..h {
        for x in 0..w {
            if !mask.is_marked(x, y) {
                continue;
            }
            let idx = (y * w + x) as usize;
            let slot = uf.push();
            slots[idx] = slot;

            // Earlier neighbors in scan order: left, up-left, up, up-right.
            let mut join = |nx: i64, ny: i64| {
                if nx >= 0 && ny >= 0 && nx < w as i64 {
                    let nslot = slots[(ny as u32 * w + nx as u32) as usize];
                    if nslot != u32::MAX {
                        uf.union(nslot, slot);
                    }
                }
            };
            join(x as i64 - 1, y as i64);
            join(x as i64 - 1, y as i64 - 1);
            join(x as i64, y as i64 - 1);
            join(x as i64 + 1, y as i64 - 1);
        }
    }

    // Per-component bounding boxes, ordered by first scanned pixel.
    let mut order: Vec<u32> = Vec::new();
    let mut boxes: HashMap<u32, BoundaryRect> = HashMap::new();
    for y in 0..h {
        for x in 0..w {
            let slot = slots[(y * w + x) as usize];
            if slot == u32::MAX {
                continue;
            }
            let root = uf.find(slot);
            let cell = BoundaryRect::content(x, y, x + 1, y + 1);
            match boxes.entry(root) {
                Entry::Occupied(mut e) => {
                    let merged = e.get().union(&cell);
                    e.insert(merged);
                }
                Entry::Vacant(e) => {
                    order.push(root);
                    e.insert(cell);
                }
            }
        }
    }

    let mut rects: Vec<BoundaryRect> = order.into_iter().map(|root| boxes[&root]).collect();

    // Merge boxes that overlap or touch, to a fixed point.
    let mut merged = true;
    while merged {
        merged = false;
        let mut i = 0;
        while i < rects.len() {
            let mut j = i + 1;
            while j < rects.len() {
                if rects[i].touches(&rects[j]) {
                    rects[i] = rects[i].union(&rects[j]);
                    rects.remove(j);
                    merged = true;
                } else {
                    j += 1;
                }
            }
            i += 1;
        }
    }

    rects.retain(|r| !r.is_degenerate());
    rects
}

/// Canvas area covered by only one of the two images: the complement of the
/// overlap rectangle, tiled as up to four strips (left, right, top, bottom)
/// that never overlap each other. Degenerate strips are dropped.
pub fn size_regions(
    candidate: (u32, u32),
    reference: (u32, u32),
    offset: Offset,
) -> Vec<BoundaryRect> {
    let canvas_w = candidate.0.max(reference.0);
    let canvas_h = candidate.1.max(reference.1);
    if canvas_w == 0 || canvas_h == 0 {
        return Vec::new();
    }

    let clamp_x = |v: i64| v.clamp(0, canvas_w as i64) as u32;
    let clamp_y = |v: i64| v.clamp(0, canvas_h as i64) as u32;

    let x0 = clamp_x((offset.dx as i64).max(0));
    let y0 = clamp_y((offset.dy as i64).max(0));
    let x1 = clamp_x((offset.dx as i64 + reference.0 as i64).min(candidate.0 as i64));
    let y1 = clamp_y((offset.dy as i64 + reference.1 as i64).min(candidate.1 as i64));

    if x1 <= x0 || y1 <= y0 {
        // No overlap at all: the whole canvas is a size mismatch.
        return vec![BoundaryRect::size(0, 0, canvas_w, canvas_h)];
    }

    let strips = [
        BoundaryRect::size(0, 0, x0, canvas_h),
        BoundaryRect::size(x1, 0, canvas_w, canvas_h),
        BoundaryRect::size(x0, 0, x1, y0),
        BoundaryRect::size(x0, y1, x1, canvas_h),
    ];

    strips.into_iter().filter(|r| !r.is_degenerate()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::differ::{self, Offset};
    use image::{Rgba, RgbaImage};

    fn mask_from(candidate: &RgbaImage, reference: &RgbaImage) -> DifferenceMask {
        differ::difference(candidate, reference, Offset::ZERO).mask
    }

    fn with_square(mut img: RgbaImage, x0: u32, y0: u32, size: u32) -> RgbaImage {
        for y in y0..y0 + size {
            for x in x0..x0 + size {
                img.put_pixel(x, y, Rgba([0, 0, 0, 255]));
            }
        }
        img
    }

    fn white(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255]))
    }

    #[test]
    fn single_cluster_single_rect() {
        let mask = mask_from(&with_square(white(50, 50), 10, 12, 5), &white(50, 50));
        let rects = merge_mask(&mask);
        assert_eq!(rects, vec![BoundaryRect::content(10, 12, 15, 17)]);
    }

    #[test]
    fn separated_clusters_stay_separate() {
        let img = with_square(with_square(white(60, 60), 2, 2, 4), 40, 40, 4);
        let rects = merge_mask(&mask_from(&img, &white(60, 60)));
        assert_eq!(
            rects,
            vec![
                BoundaryRect::content(2, 2, 6, 6),
                BoundaryRect::content(40, 40, 44, 44),
            ]
        );
    }

    #[test]
    fn diagonal_neighbors_join() {
        // Two pixels sharing only a corner form one component.
        let mut img = white(10, 10);
        img.put_pixel(3, 3, Rgba([0, 0, 0, 255]));
        img.put_pixel(4, 4, Rgba([0, 0, 0, 255]));
        let rects = merge_mask(&mask_from(&img, &white(10, 10)));
        assert_eq!(rects, vec![BoundaryRect::content(3, 3, 5, 5)]);
    }

    #[test]
    fn touching_bounding_boxes_collapse() {
        // An L-shaped component whose bounding box reaches a lone pixel its
        // own pixels never touch: the boxes are edge-adjacent, so the two
        // components must still collapse into one region.
        let mut img = white(20, 20);
        for (x, y) in [(2, 2), (2, 3), (2, 4), (3, 4)] {
            img.put_pixel(x, y, Rgba([0, 0, 0, 255]));
        }
        img.put_pixel(4, 2, Rgba([0, 0, 0, 255]));
        let rects = merge_mask(&mask_from(&img, &white(20, 20)));
        assert_eq!(rects, vec![BoundaryRect::content(2, 2, 5, 5)]);
    }

    #[test]
    fn every_marked_cell_is_covered() {
        let img = with_square(with_square(white(40, 40), 3, 3, 6), 20, 9, 4);
        let mask = mask_from(&img, &white(40, 40));
        let rects = merge_mask(&mask);
        for y in 0..mask.height() {
            for x in 0..mask.width() {
                if mask.is_marked(x, y) {
                    assert!(
                        rects
                            .iter()
                            .any(|r| x >= r.left && x < r.right && y >= r.top && y < r.bottom),
                        "uncovered cell at ({x},{y})"
                    );
                }
            }
        }
    }

    #[test]
    fn empty_mask_yields_no_rects() {
        let mask = mask_from(&white(30, 30), &white(30, 30));
        assert!(merge_mask(&mask).is_empty());
    }

    #[test]
    fn merge_is_deterministic() {
        let img = with_square(with_square(white(40, 40), 3, 3, 6), 11, 3, 6);
        let mask = mask_from(&img, &white(40, 40));
        assert_eq!(merge_mask(&mask), merge_mask(&mask));
    }

    #[test]
    fn wider_candidate_yields_right_strip() {
        let rects = size_regions((120, 100), (100, 100), Offset::ZERO);
        assert_eq!(rects, vec![BoundaryRect::size(100, 0, 120, 100)]);
    }

    #[test]
    fn taller_reference_yields_bottom_strip() {
        let rects = size_regions((80, 50), (80, 70), Offset::ZERO);
        assert_eq!(rects, vec![BoundaryRect::size(0, 50, 80, 70)]);
    }

    #[test]
    fn equal_dimensions_yield_no_size_regions() {
        assert!(size_regions((64, 64), (64, 64), Offset::ZERO).is_empty());
    }

    #[test]
    fn offset_exposes_side_strips() {
        // Reference 10x10 shifted (2,0) inside a 12x10 candidate: a 2px
        // strip on the left is uncovered, nothing on the right.
        let rects = size_regions((12, 10), (10, 10), Offset::new(2, 0));
        assert_eq!(rects, vec![BoundaryRect::size(0, 0, 2, 10)]);
    }

    #[test]
    fn strips_never_overlap() {
        let rects = size_regions((120, 90), (100, 100), Offset::new(5, 3));
        let total: u64 = rects.iter().map(|r| r.area()).sum();
        // Union area equals the plain sum exactly when strips are disjoint.
        let mut cells = std::collections::HashSet::new();
        for r in &rects {
            for y in r.top..r.bottom {
                for x in r.left..r.right {
                    assert!(cells.insert((x, y)), "strips overlap at ({x},{y})");
                }
            }
        }
        assert_eq!(total, cells.len() as u64);
    }

    #[test]
    fn zero_area_canvas_is_harmless() {
        assert!(size_regions((0, 0), (0, 0), Offset::ZERO).is_empty());
    }
}
