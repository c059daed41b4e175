use image::{Rgba, RgbaImage};

use super::differ::Offset;
use super::regions::{BoundaryRect, RegionKind};

/// Overlay fill colors, one per region kind, with alpha.
#[derive(Debug, Clone, Copy)]
pub struct OverlayColors {
    pub content: Rgba<u8>,
    pub size: Rgba<u8>,
}

impl Default for OverlayColors {
    fn default() -> Self {
        Self {
            content: Rgba([0xEE, 0x00, 0x00, 0xC7]),
            size: Rgba([0x88, 0x88, 0x88, 0x66]),
        }
    }
}

/// Parse an `RRGGBB` or `RRGGBBAA` hex color. Missing alpha means opaque.
pub fn parse_color(s: &str) -> Result<Rgba<u8>, String> {
    if !s.is_ascii() || (s.len() != 6 && s.len() != 8) {
        return Err(format!("expected RRGGBB or RRGGBBAA hex color, got '{s}'"));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&s[i..i + 2], 16).map_err(|_| format!("invalid hex color '{s}'"))
    };
    let a = if s.len() == 8 { channel(6)? } else { 0xFF };
    Ok(Rgba([channel(0)?, channel(2)?, channel(4)?, a]))
}

/// Ghosting passes: both images at high opacity, then both again faint, so
/// misaligned or differing content shows through as a double exposure. The
/// ratios are an aesthetic choice carried over from the original overlays.
const GHOST_PASSES: [(Layer, f32); 4] = [
    (Layer::Candidate, 0.8),
    (Layer::Reference, 0.8),
    (Layer::Candidate, 0.4),
    (Layer::Reference, 0.1),
];

#[derive(Clone, Copy)]
enum Layer {
    Candidate,
    Reference,
}

/// Compose the annotated diff artifact: white canvas sized to the larger
/// of the two inputs, ghost-blended images (reference shifted by the
/// offset), then a translucent fill over every difference region.
pub fn render(
    candidate: &RgbaImage,
    reference: &RgbaImage,
    offset: Offset,
    regions: &[BoundaryRect],
    colors: &OverlayColors,
) -> RgbaImage {
    let w = candidate.width().max(reference.width());
    let h = candidate.height().max(reference.height());
    let mut canvas = RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255]));

    for (layer, opacity) in GHOST_PASSES {
        match layer {
            Layer::Candidate => blend_image(&mut canvas, candidate, (0, 0), opacity),
            Layer::Reference => blend_image(
                &mut canvas,
                reference,
                (offset.dx as i64, offset.dy as i64),
                opacity,
            ),
        }
    }

    for region in regions {
        let color = match region.kind {
            RegionKind::Content => colors.content,
            RegionKind::Size => colors.size,
        };
        fill_rect(&mut canvas, region, color);
    }

    canvas
}

/// Source-over blend of `src` onto the canvas at `at`, with an extra
/// uniform opacity factor. Pixels falling outside the canvas are clipped.
fn blend_image(canvas: &mut RgbaImage, src: &RgbaImage, at: (i64, i64), opacity: f32) {
    for (sx, sy, px) in src.enumerate_pixels() {
        let cx = sx as i64 + at.0;
        let cy = sy as i64 + at.1;
        if cx < 0 || cy < 0 || cx >= canvas.width() as i64 || cy >= canvas.height() as i64 {
            continue;
        }
        let alpha = px[3] as f32 / 255.0 * opacity;
        blend_px(canvas.get_pixel_mut(cx as u32, cy as u32), *px, alpha);
    }
}

fn fill_rect(canvas: &mut RgbaImage, rect: &BoundaryRect, color: Rgba<u8>) {
    let alpha = color[3] as f32 / 255.0;
    let right = rect.right.min(canvas.width());
    let bottom = rect.bottom.min(canvas.height());
    for y in rect.top..bottom {
        for x in rect.left..right {
            blend_px(canvas.get_pixel_mut(x, y), color, alpha);
        }
    }
}

fn blend_px(dst: &mut Rgba<u8>, src: Rgba<u8>, alpha: f32) {
    for c in 0..3 {
        let blended = src[c] as f32 * alpha + dst[c] as f32 * (1.0 - alpha);
        dst[c] = blended.round() as u8;
    }
    dst[3] = 255;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32, px: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba(px))
    }

    #[test]
    fn parses_hex_colors() {
        assert_eq!(
            parse_color("EE0000C7").unwrap(),
            Rgba([0xEE, 0x00, 0x00, 0xC7])
        );
        assert_eq!(parse_color("112233").unwrap(), Rgba([0x11, 0x22, 0x33, 0xFF]));
        assert!(parse_color("12345").is_err());
        assert!(parse_color("GG0000AA").is_err());
    }

    #[test]
    fn canvas_spans_both_inputs() {
        let candidate = solid(10, 20, [0, 0, 0, 255]);
        let reference = solid(20, 10, [0, 0, 0, 255]);
        let out = render(
            &candidate,
            &reference,
            Offset::ZERO,
            &[],
            &OverlayColors::default(),
        );
        assert_eq!(out.dimensions(), (20, 20));
        // The bottom-right quadrant is covered by neither image.
        assert_eq!(out.get_pixel(15, 15), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn overlay_tints_region_pixels() {
        let candidate = solid(30, 30, [200, 200, 200, 255]);
        let reference = solid(30, 30, [200, 200, 200, 255]);
        let region = BoundaryRect::content(5, 5, 15, 15);
        let out = render(
            &candidate,
            &reference,
            Offset::ZERO,
            &[region],
            &OverlayColors::default(),
        );
        let inside = out.get_pixel(10, 10);
        let outside = out.get_pixel(25, 25);
        // Red overlay pushes the red channel up and green down.
        assert!(inside[0] > outside[0]);
        assert!(inside[1] < outside[1]);
    }

    #[test]
    fn size_and_content_overlays_are_distinct() {
        let candidate = solid(40, 20, [255, 255, 255, 255]);
        let reference = solid(40, 20, [255, 255, 255, 255]);
        let out = render(
            &candidate,
            &reference,
            Offset::ZERO,
            &[
                BoundaryRect::content(0, 0, 10, 20),
                BoundaryRect::size(30, 0, 40, 20),
            ],
            &OverlayColors::default(),
        );
        assert_ne!(out.get_pixel(5, 10), out.get_pixel(35, 10));
    }

    #[test]
    fn reference_is_drawn_at_offset() {
        let candidate = solid(20, 20, [255, 255, 255, 255]);
        let reference = solid(10, 10, [0, 0, 0, 255]);
        let out = render(
            &candidate,
            &reference,
            Offset::new(10, 10),
            &[],
            &OverlayColors::default(),
        );
        // Reference ghost darkens only the shifted quadrant.
        assert!(out.get_pixel(15, 15)[0] < out.get_pixel(5, 5)[0]);
    }

    #[test]
    fn rendering_is_deterministic() {
        let candidate = solid(25, 25, [10, 120, 240, 255]);
        let reference = solid(20, 25, [240, 120, 10, 255]);
        let regions = [BoundaryRect::content(2, 2, 9, 9)];
        let colors = OverlayColors::default();
        let a = render(&candidate, &reference, Offset::ZERO, &regions, &colors);
        let b = render(&candidate, &reference, Offset::ZERO, &regions, &colors);
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn regions_clip_to_canvas() {
        let candidate = solid(10, 10, [255, 255, 255, 255]);
        let reference = solid(10, 10, [255, 255, 255, 255]);
        let region = BoundaryRect::size(5, 5, 50, 50);
        // Must not panic on out-of-canvas coordinates.
        let out = render(
            &candidate,
            &reference,
            Offset::ZERO,
            &[region],
            &OverlayColors::default(),
        );
        assert_eq!(out.dimensions(), (10, 10));
    }
}
