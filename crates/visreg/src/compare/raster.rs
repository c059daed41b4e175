use image::RgbaImage;
use image::imageops::{self, FilterType};

/// Decode a still raster image (PNG or anything else `image` recognizes)
/// into an owned RGBA8 buffer.
pub fn decode(bytes: &[u8]) -> Result<RgbaImage, image::ImageError> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

/// Encode an RGBA buffer as PNG bytes.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)?;
    Ok(buf)
}

/// Downscale by an integer factor (coarse alignment phase). Dimensions are
/// floored but never drop below 1px.
pub fn downscale(img: &RgbaImage, factor: u32) -> RgbaImage {
    let w = (img.width() / factor).max(1);
    let h = (img.height() / factor).max(1);
    imageops::resize(img, w, h, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode(b"not a png").is_err());
    }

    #[test]
    fn png_round_trip() {
        let img = RgbaImage::from_pixel(8, 4, Rgba([10, 20, 30, 255]));
        let png = encode_png(&img).unwrap();
        let back = decode(&png).unwrap();
        assert_eq!(back.dimensions(), (8, 4));
        assert_eq!(back.get_pixel(3, 2), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn downscale_floors_dimensions() {
        let img = RgbaImage::new(110, 90);
        let small = downscale(&img, 20);
        assert_eq!(small.dimensions(), (5, 4));
    }

    #[test]
    fn downscale_never_reaches_zero() {
        let img = RgbaImage::new(10, 10);
        let small = downscale(&img, 20);
        assert_eq!(small.dimensions(), (1, 1));
    }
}
