//! Image decoding, thumbnails and JPEG re-encoding
//!
//! Everything here delegates to the `image` crate. Transparent pixels are
//! composited onto white before anything is encoded, since neither the
//! thumbnails nor the PDF pages carry an alpha channel.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use tracing::debug;

use crate::error::{Error, Result};
use crate::format::is_image_file;

/// Thumbnails are cropped to at most this many times their width in height
pub const THUMBNAIL_MAX_ASPECT: f32 = 1.6;

/// Default thumbnail width used by the grid cards
pub const THUMBNAIL_WIDTH: u32 = 160;

/// A small RGBA preview of an image
#[derive(Debug, Clone, PartialEq)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA8 pixels, `width * height * 4` bytes
    pub pixels: Vec<u8>,
}

/// Result of checking an image file at add-time
#[derive(Debug, Clone)]
pub struct ProbedImage {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub thumbnail: Option<Thumbnail>,
}

/// Validate and decode an image, optionally building a thumbnail
///
/// Rejects unsupported extensions before touching the file, so a renamed
/// text file never reaches the decoder.
pub fn probe(path: &Path, thumbnail_width: Option<u32>) -> Result<ProbedImage> {
    if !is_image_file(path) {
        return Err(Error::UnsupportedFormat(path.to_path_buf()));
    }
    let image = decode(path)?;
    let (width, height) = image.dimensions();
    let thumbnail = thumbnail_width.map(|w| thumbnail(&image, w));

    debug!("Probed {} ({}x{})", path.display(), width, height);

    Ok(ProbedImage {
        path: path.to_path_buf(),
        width,
        height,
        thumbnail,
    })
}

/// Decode an image file, mapping decoder failures to [`Error::ImageLoad`]
pub fn decode(path: &Path) -> Result<DynamicImage> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }
    image::open(path).map_err(|e| Error::ImageLoad {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Decode an image and composite any transparency onto white
pub fn load_flattened(path: &Path) -> Result<RgbImage> {
    Ok(flatten_onto_white(&decode(path)?))
}

/// Convert to RGB, blending transparent pixels against a white background
pub fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    RgbImage::from_fn(width, height, |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha)) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

/// Encode RGB pixels as a baseline JPEG
///
/// `quality` is clamped to 1..=100.
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        encoder.encode_image(image)?;
    }
    Ok(buffer.into_inner())
}

/// Scale an image to a fixed width for the grid cards
///
/// Tall pages (webtoon strips) keep only their top part so every card stays
/// roughly the same height.
pub fn thumbnail(image: &DynamicImage, width: u32) -> Thumbnail {
    let width = width.max(1);
    let (orig_w, orig_h) = image.dimensions();
    let scale = width as f32 / orig_w.max(1) as f32;
    let scaled_h = ((orig_h as f32 * scale) as u32).max(1);
    let max_h = ((width as f32 * THUMBNAIL_MAX_ASPECT) as u32).max(1);

    // Crop the source to the visible top part before scaling, so a very long
    // strip never gets resized in full
    let resized = if scaled_h > max_h {
        let visible_h = ((max_h as f32 / scale).ceil() as u32).clamp(1, orig_h.max(1));
        image
            .crop_imm(0, 0, orig_w, visible_h)
            .resize_exact(width, max_h, FilterType::Lanczos3)
    } else {
        image.resize_exact(width, scaled_h, FilterType::Lanczos3)
    };

    let rgb = flatten_onto_white(&resized);
    let (w, h) = rgb.dimensions();
    let pixels = rgb
        .pixels()
        .flat_map(|p| [p.0[0], p.0[1], p.0[2], 255])
        .collect();

    Thumbnail {
        width: w,
        height: h,
        pixels,
    }
}
