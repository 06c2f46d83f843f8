// src/engine.rs
//
// The core of webp-batch. A batch pipeline that:
// 1. Tags every upload with its submission index
// 2. Transcodes items in parallel on a fixed-size worker pool
// 3. Reassembles results in submission order, failing on the first bad item
//
// This file is a facade over the modules in engine/

// =============================================================================
// SECURITY LIMITS
// =============================================================================

/// Maximum allowed image dimension (width or height).
/// Images larger than 32768x32768 are rejected to prevent decompression bombs.
pub const MAX_DIMENSION: u32 = 32768;

/// Maximum allowed total pixels (width * height).
/// 100 megapixels = 400MB uncompressed RGBA. Beyond this is likely malicious.
pub const MAX_PIXELS: u64 = 100_000_000;

// =============================================================================
// DEFAULTS
// =============================================================================

/// Fixed lossy WebP quality for every output
pub const WEBP_QUALITY: u8 = 80;

pub const DEFAULT_MAX_WIDTH: u32 = 2560;
pub const DEFAULT_MAX_HEIGHT: u32 = 1440;

pub const DEFAULT_WORKERS: usize = 4;

/// Upper bound on the worker pool size
pub const MAX_WORKERS: usize = 64;

// =============================================================================
// MODULE DECOMPOSITION
// =============================================================================

mod api;
mod batch;
mod codec;
mod common;
mod decoder;
mod encoder;
mod io;
mod media;
mod pipeline;
mod pool;
mod storage;

pub use api::{transcode_batch, Transcoder};
pub use batch::{
    assemble, dispatch, BatchState, Images, Job, ResultCollector, ResultSet, TranscodeResult,
};
pub use codec::{Codec, ImageCodec, ImageInfo};
pub use decoder::{check_dimensions, decode_image, detect_format};
pub use encoder::{encode_webp, WEBP_MAX_DIMENSION};
pub use io::{Source, SourceBytes, Upload};
pub use media::MediaType;
pub use pipeline::{downsample, fit_to_bounds, fit_within, Bounds};
pub use pool::WorkerPool;
pub use storage::{TempStorage, OUTPUT_EXTENSION};
