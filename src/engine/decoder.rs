// src/engine/decoder.rs
//
// Decoder operations: generic format-sniffing decode (JPEG, PNG, WebP) and
// the dedicated HEIC/HEIF path.

use crate::engine::common::run_with_panic_policy;
use crate::engine::media::MediaType;
use crate::error::TranscodeError;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;

use crate::engine::{MAX_DIMENSION, MAX_PIXELS};

type DecoderResult<T> = std::result::Result<T, TranscodeError>;

/// Detect input format using magic bytes. Returns None if unknown.
pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
    image::guess_format(bytes).ok()
}

/// Decode with the image crate, sniffing the container from magic bytes.
/// The declared type only chose this path; the bytes decide the format.
pub fn decode_generic(data: &[u8]) -> DecoderResult<DynamicImage> {
    run_with_panic_policy("decode:image", || {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| TranscodeError::decode_failed(format!("failed to read header: {e}")))?;
        if reader.format().is_none() {
            return Err(TranscodeError::decode_failed("unrecognized image data"));
        }
        reader
            .decode()
            .map_err(|e| TranscodeError::decode_failed(e.to_string()))
    })
}

/// Decode the primary image of a HEIC/HEIF container through libheif.
#[cfg(feature = "heif")]
pub fn decode_heif(data: &[u8]) -> DecoderResult<DynamicImage> {
    use image::{RgbImage, RgbaImage};
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

    run_with_panic_policy("decode:heif", || {
        let heif_err = |e: libheif_rs::HeifError| {
            TranscodeError::decode_failed(format!("couldn't decode HEIC: {e}"))
        };

        let lib_heif = LibHeif::new();
        let ctx = HeifContext::read_from_bytes(data).map_err(heif_err)?;
        let handle = ctx.primary_image_handle().map_err(heif_err)?;
        check_dimensions(handle.width(), handle.height())?;

        let has_alpha = handle.has_alpha_channel();
        let chroma = if has_alpha {
            RgbChroma::Rgba
        } else {
            RgbChroma::Rgb
        };
        let image = lib_heif
            .decode(&handle, ColorSpace::Rgb(chroma), None)
            .map_err(heif_err)?;

        let planes = image.planes();
        let plane = planes
            .interleaved
            .ok_or_else(|| TranscodeError::decode_failed("heif: missing interleaved plane"))?;

        let (width, height) = (plane.width, plane.height);
        let channels = if has_alpha { 4 } else { 3 };
        let row_len = width as usize * channels;

        // libheif pads rows; copy out the visible part of each
        let mut pixels = Vec::with_capacity(row_len * height as usize);
        for row in plane.data.chunks(plane.stride).take(height as usize) {
            let visible = row.get(..row_len).ok_or_else(|| {
                TranscodeError::decode_failed("heif: plane row shorter than image width")
            })?;
            pixels.extend_from_slice(visible);
        }

        let img = if has_alpha {
            RgbaImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgba8)
        } else {
            RgbImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgb8)
        };
        img.ok_or_else(|| TranscodeError::decode_failed("heif: failed to build image buffer"))
    })
}

#[cfg(not(feature = "heif"))]
pub fn decode_heif(_data: &[u8]) -> DecoderResult<DynamicImage> {
    Err(TranscodeError::decode_failed(
        "couldn't decode HEIC: HEIC/HEIF support is not enabled in this build",
    ))
}

/// Unified decode entrypoint:
/// - HEIC/HEIF declared types go to libheif
/// - everything else is sniffed and decoded by the image crate
/// - dimensions are checked from the header before any pixel allocation
pub fn decode_image(bytes: &[u8], media_type: MediaType) -> DecoderResult<DynamicImage> {
    if bytes.is_empty() {
        return Err(TranscodeError::decode_failed("empty upload"));
    }
    let img = if media_type.is_heif() {
        decode_heif(bytes)?
    } else {
        ensure_dimensions_safe(bytes)?;
        decode_generic(bytes)?
    };
    check_dimensions(img.width(), img.height())?;
    Ok(img)
}

/// Check if image dimensions are within safe limits.
/// Returns an error if the image is too large (potential decompression bomb).
pub fn check_dimensions(width: u32, height: u32) -> DecoderResult<()> {
    if width == 0 || height == 0 {
        return Err(TranscodeError::decode_failed(format!(
            "image has zero dimension ({width}x{height})"
        )));
    }
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(TranscodeError::dimension_exceeds_limit(
            width.max(height),
            MAX_DIMENSION,
        ));
    }
    let pixels = width as u64 * height as u64;
    if pixels > MAX_PIXELS {
        return Err(TranscodeError::pixel_count_exceeds_limit(pixels, MAX_PIXELS));
    }
    Ok(())
}

/// Inspect encoded bytes and ensure the image dimensions are safe before decoding.
/// Unreadable headers are left for the decoder to report.
pub fn ensure_dimensions_safe(bytes: &[u8]) -> DecoderResult<()> {
    let cursor = Cursor::new(bytes);
    if let Ok(reader) = ImageReader::new(cursor).with_guessed_format() {
        if let Ok((width, height)) = reader.into_dimensions() {
            return check_dimensions(width, height);
        }
    }
    Ok(())
}
