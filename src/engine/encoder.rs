// src/engine/encoder.rs
//
// Encoder operations: lossy WebP via libwebp at the fixed output quality

use crate::engine::common::run_with_panic_policy;
use crate::engine::WEBP_QUALITY;
use crate::error::TranscodeError;
use image::DynamicImage;
use std::borrow::Cow;

type EncoderResult<T> = std::result::Result<T, TranscodeError>;

/// Largest width or height libwebp can encode
pub const WEBP_MAX_DIMENSION: u32 = 16383;

// libwebp tuning for the fixed output quality. Mid-strength spatial noise
// shaping and a light deblocking filter; method 4 is libwebp's default
// speed/size trade-off.
const WEBP_METHOD: i32 = 4;
const WEBP_PASS: i32 = 1;
const WEBP_SNS_STRENGTH: i32 = 70;
const WEBP_FILTER_STRENGTH: i32 = 20;
const WEBP_FILTER_SHARPNESS: i32 = 0;

/// Encode to lossy WebP at [`WEBP_QUALITY`]. Images with an alpha channel
/// keep it.
///
/// Output is deterministic for identical pixels: libwebp runs single-threaded
/// with a fixed configuration.
pub fn encode_webp(img: &DynamicImage) -> EncoderResult<Vec<u8>> {
    run_with_panic_policy("encode:webp", || {
        let (w, h) = (img.width(), img.height());
        if w == 0 || h == 0 {
            return Err(TranscodeError::encode_failed(
                "webp",
                "width or height is zero",
            ));
        }
        if w > WEBP_MAX_DIMENSION || h > WEBP_MAX_DIMENSION {
            return Err(TranscodeError::encode_failed(
                "webp",
                format!("{w}x{h} exceeds the WebP limit of {WEBP_MAX_DIMENSION}px per side"),
            ));
        }

        let mut config = webp::WebPConfig::new()
            .map_err(|_| TranscodeError::encode_failed("webp", "failed to create WebPConfig"))?;
        config.lossless = 0;
        config.quality = f32::from(WEBP_QUALITY);
        config.method = WEBP_METHOD;
        config.pass = WEBP_PASS;
        config.sns_strength = WEBP_SNS_STRENGTH;
        config.autofilter = 1;
        config.filter_strength = WEBP_FILTER_STRENGTH;
        config.filter_sharpness = WEBP_FILTER_SHARPNESS;

        let mem = if img.color().has_alpha() {
            let rgba: Cow<'_, image::RgbaImage> = match img {
                DynamicImage::ImageRgba8(rgba) => Cow::Borrowed(rgba),
                _ => Cow::Owned(img.to_rgba8()),
            };
            webp::Encoder::from_rgba(rgba.as_raw(), w, h).encode_advanced(&config)
        } else {
            let rgb: Cow<'_, image::RgbImage> = match img {
                DynamicImage::ImageRgb8(rgb) => Cow::Borrowed(rgb),
                _ => Cow::Owned(img.to_rgb8()),
            };
            webp::Encoder::from_rgb(rgb.as_raw(), w, h).encode_advanced(&config)
        }
        .map_err(|e| TranscodeError::encode_failed("webp", format!("{e:?}")))?;

        Ok(mem.to_vec())
    })
}
