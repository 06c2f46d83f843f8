// src/engine/pipeline.rs
//
// Conditional downsampling: thumbnail-style fit into a bounding box.
// Never upsizes, never crops.

use crate::error::TranscodeError;
use fast_image_resize::{self as fir, ImageBufferError, MulDiv, PixelType, ResizeOptions};
use image::{imageops::FilterType, DynamicImage, RgbImage, RgbaImage};
use std::fmt;

type PipelineResult<T> = std::result::Result<T, TranscodeError>;

/// Maximum output box for one batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bounds {
    max_width: u32,
    max_height: u32,
}

impl Bounds {
    pub fn new(max_width: u32, max_height: u32) -> PipelineResult<Self> {
        if max_width == 0 || max_height == 0 {
            return Err(TranscodeError::invalid_argument(
                "bounds",
                format!("{max_width}x{max_height}"),
                "both bounds must be positive",
            ));
        }
        Ok(Self {
            max_width,
            max_height,
        })
    }

    pub fn max_width(&self) -> u32 {
        self.max_width
    }

    pub fn max_height(&self) -> u32 {
        self.max_height
    }

    pub fn contains(&self, width: u32, height: u32) -> bool {
        width <= self.max_width && height <= self.max_height
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.max_width, self.max_height)
    }
}

/// Target dimensions for an image that must shrink to fit `bounds`, or `None`
/// if it already fits.
///
/// The limiting side lands exactly on its bound; the other side is scaled by
/// the same ratio and rounded, never below 1.
pub fn fit_within(orig_w: u32, orig_h: u32, bounds: Bounds) -> Option<(u32, u32)> {
    if bounds.contains(orig_w, orig_h) || orig_w == 0 || orig_h == 0 {
        return None;
    }
    let (w, h) = (bounds.max_width, bounds.max_height);
    let orig_ratio = orig_w as f64 / orig_h as f64;
    let target_ratio = w as f64 / h as f64;

    let dims = if orig_ratio > target_ratio {
        // Wider than the box → width is the limiting side
        let ratio = w as f64 / orig_w as f64;
        (w, ((orig_h as f64 * ratio).round() as u32).clamp(1, h))
    } else {
        // Taller (or same shape) → height is the limiting side
        let ratio = h as f64 / orig_h as f64;
        (((orig_w as f64 * ratio).round() as u32).clamp(1, w), h)
    };
    Some(dims)
}

/// Downsample `img` to fit `bounds` if it exceeds them; otherwise hand it back
/// untouched.
pub fn fit_to_bounds(img: DynamicImage, bounds: Bounds) -> PipelineResult<DynamicImage> {
    match fit_within(img.width(), img.height(), bounds) {
        None => Ok(img),
        Some((dst_w, dst_h)) => downsample(img, dst_w, dst_h),
    }
}

fn default_resize_options() -> ResizeOptions {
    ResizeOptions::new().resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::Lanczos3))
}

/// Lanczos3 resize of an owned image. RGB and RGBA buffers are handed to
/// fast_image_resize without copying; other layouts are widened first.
pub fn downsample(img: DynamicImage, dst_width: u32, dst_height: u32) -> PipelineResult<DynamicImage> {
    let src_width = img.width();
    let src_height = img.height();
    let resize_err = |message: String| {
        TranscodeError::internal_panic(format!(
            "resize {src_width}x{src_height} -> {dst_width}x{dst_height} failed: {message}"
        ))
    };

    if src_width == 0 || src_height == 0 || dst_width == 0 || dst_height == 0 {
        return Err(resize_err("invalid dimensions".to_string()));
    }

    let (pixel_type, src_pixels): (PixelType, Vec<u8>) = match img {
        DynamicImage::ImageRgb8(rgb) => (PixelType::U8x3, rgb.into_raw()),
        DynamicImage::ImageRgba8(rgba) => (PixelType::U8x4, rgba.into_raw()),
        other if other.color().has_alpha() => (PixelType::U8x4, other.to_rgba8().into_raw()),
        other => (PixelType::U8x3, other.to_rgb8().into_raw()),
    };

    resize_pixels(
        src_width,
        src_height,
        src_pixels,
        pixel_type,
        dst_width,
        dst_height,
    )
    .map_err(resize_err)
}

fn resize_pixels(
    src_width: u32,
    src_height: u32,
    mut src_pixels: Vec<u8>,
    pixel_type: PixelType,
    dst_width: u32,
    dst_height: u32,
) -> std::result::Result<DynamicImage, String> {
    let required_bytes = (src_width as usize)
        .checked_mul(src_height as usize)
        .and_then(|n| n.checked_mul(pixel_type.size()))
        .ok_or_else(|| "image buffer size overflow during resize".to_string())?;

    if src_pixels.len() < required_bytes {
        return Err(format!(
            "source buffer too small: expected {required_bytes} bytes, got {}",
            src_pixels.len()
        ));
    }

    let options = default_resize_options();
    let primary = match fir::images::Image::from_slice_u8(
        src_width,
        src_height,
        src_pixels.as_mut_slice(),
        pixel_type,
    ) {
        Ok(src_image) => resize_with_source_image(src_image, pixel_type, dst_width, dst_height, &options),
        Err(ImageBufferError::InvalidBufferAlignment) => {
            let mut aligned = fir::images::Image::new(src_width, src_height, pixel_type);
            aligned
                .buffer_mut()
                .copy_from_slice(&src_pixels[..required_bytes]);
            resize_with_source_image(aligned, pixel_type, dst_width, dst_height, &options)
        }
        Err(other) => Err(format!("fir source image error: {other:?}")),
    };

    match primary {
        Ok(img) => Ok(img),
        Err(err) => {
            tracing::debug!(error = %err, "fast resize failed, using image crate");
            resize_with_image_crate(
                &src_pixels,
                src_width,
                src_height,
                pixel_type,
                dst_width,
                dst_height,
            )
            .map_err(|fallback| format!("{err}; image crate fallback failed: {fallback}"))
        }
    }
}

fn resize_with_source_image(
    mut src_image: fir::images::Image<'_>,
    pixel_type: PixelType,
    dst_width: u32,
    dst_height: u32,
    options: &ResizeOptions,
) -> std::result::Result<DynamicImage, String> {
    let mut dst_image = fir::images::Image::new(dst_width, dst_height, pixel_type);

    // Alpha must be premultiplied or transparent pixels bleed color into edges
    let premultiply = pixel_type == PixelType::U8x4;
    let mul_div = MulDiv::default();
    if premultiply {
        mul_div
            .multiply_alpha_inplace(&mut src_image)
            .map_err(|e| format!("failed to premultiply alpha: {e}"))?;
    }

    let mut resizer = fir::Resizer::new();
    resizer
        .resize(&src_image, &mut dst_image, options)
        .map_err(|e| format!("fir resize error: {e:?}"))?;

    if premultiply {
        mul_div
            .divide_alpha_inplace(&mut dst_image)
            .map_err(|e| format!("failed to unpremultiply alpha: {e}"))?;
    }

    let dst_pixels = dst_image.into_vec();
    match pixel_type {
        PixelType::U8x3 => RgbImage::from_raw(dst_width, dst_height, dst_pixels)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(|| "failed to create rgb image from resized data".to_string()),
        PixelType::U8x4 => RgbaImage::from_raw(dst_width, dst_height, dst_pixels)
            .map(DynamicImage::ImageRgba8)
            .ok_or_else(|| "failed to create rgba image from resized data".to_string()),
        _ => Err("unsupported pixel type after resize".to_string()),
    }
}

fn resize_with_image_crate(
    src_pixels: &[u8],
    src_width: u32,
    src_height: u32,
    pixel_type: PixelType,
    dst_width: u32,
    dst_height: u32,
) -> std::result::Result<DynamicImage, String> {
    let filter = FilterType::Lanczos3;
    match pixel_type {
        PixelType::U8x3 => {
            let rgb = RgbImage::from_raw(src_width, src_height, src_pixels.to_vec())
                .ok_or_else(|| "failed to build rgb image for fallback resize".to_string())?;
            Ok(DynamicImage::ImageRgb8(image::imageops::resize(
                &rgb, dst_width, dst_height, filter,
            )))
        }
        PixelType::U8x4 => {
            let rgba = RgbaImage::from_raw(src_width, src_height, src_pixels.to_vec())
                .ok_or_else(|| "failed to build rgba image for fallback resize".to_string())?;
            Ok(DynamicImage::ImageRgba8(image::imageops::resize(
                &rgba, dst_width, dst_height, filter,
            )))
        }
        _ => Err("fallback resize supports only U8x3/U8x4 pixel types".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Luma};

    fn bounds(w: u32, h: u32) -> Bounds {
        Bounds::new(w, h).unwrap()
    }

    fn create_test_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }))
    }

    #[test]
    fn test_zero_bounds_rejected() {
        assert!(Bounds::new(0, 10).is_err());
        assert!(Bounds::new(10, 0).is_err());
    }

    #[test]
    fn test_fitting_image_is_untouched() {
        assert_eq!(fit_within(800, 600, bounds(1920, 1080)), None);
        assert_eq!(fit_within(1920, 1080, bounds(1920, 1080)), None);
    }

    #[test]
    fn test_landscape_limited_by_height() {
        // 3:2 is narrower than 16:9, so height is the limiting side
        assert_eq!(fit_within(3000, 2000, bounds(1920, 1080)), Some((1620, 1080)));
    }

    #[test]
    fn test_panorama_limited_by_width() {
        assert_eq!(fit_within(4000, 1000, bounds(1920, 1080)), Some((1920, 480)));
    }

    #[test]
    fn test_only_one_side_exceeds() {
        assert_eq!(fit_within(2000, 500, bounds(1920, 1080)), Some((1920, 480)));
        assert_eq!(fit_within(500, 2000, bounds(1920, 1080)), Some((270, 1080)));
    }

    #[test]
    fn test_extreme_aspect_never_zero() {
        assert_eq!(fit_within(10_000, 1, bounds(100, 100)), Some((100, 1)));
        assert_eq!(fit_within(1, 10_000, bounds(100, 100)), Some((1, 100)));
    }

    #[test]
    fn test_same_aspect_ratio_hits_both_bounds() {
        assert_eq!(fit_within(3840, 2160, bounds(1920, 1080)), Some((1920, 1080)));
    }

    #[test]
    fn test_fit_to_bounds_resizes_rgb() {
        let img = create_test_image(300, 200);
        let out = fit_to_bounds(img, bounds(150, 150)).unwrap();
        assert_eq!(out.dimensions(), (150, 100));
    }

    #[test]
    fn test_fit_to_bounds_passthrough_keeps_pixels() {
        let img = create_test_image(40, 30);
        let before = img.to_rgb8().into_raw();
        let out = fit_to_bounds(img, bounds(100, 100)).unwrap();
        assert_eq!(out.to_rgb8().into_raw(), before);
    }

    #[test]
    fn test_downsample_rgba_keeps_alpha() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(64, 64, image::Rgba([255, 0, 0, 128])));
        let out = downsample(img, 16, 16).unwrap();
        assert_eq!(out.dimensions(), (16, 16));
        assert!(out.color().has_alpha());
        let px = out.to_rgba8().get_pixel(8, 8).0;
        assert!((px[3] as i32 - 128).abs() <= 1);
    }

    #[test]
    fn test_downsample_widens_grayscale() {
        let img = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(50, 50, Luma([90])));
        let out = downsample(img, 10, 10).unwrap();
        assert_eq!(out.dimensions(), (10, 10));
        assert!(!out.color().has_alpha());
    }

    #[test]
    fn test_image_crate_fallback_resizes() {
        let pixels = vec![200u8; 8 * 8 * 3];
        let out = resize_with_image_crate(&pixels, 8, 8, PixelType::U8x3, 4, 2).unwrap();
        assert_eq!(out.dimensions(), (4, 2));
    }
}
