// lib.rs
//
// webp-batch: concurrent batch transcoder for uploaded images
//
// Design goals:
// - Every upload ends up as a lossy WebP inside a bounding box
// - Fixed worker count, independent of batch size
// - Results in submission order, whatever order the workers finish in
// - One bad item fails the batch; the rest of the work is not rolled back
//
// HEIC/HEIF uploads are accepted by content type in every build, but only
// decode with the `heif` cargo feature (libheif). Without it they fail as
// decode errors, and the HEIC decode and batch tests only run with
// `cargo test --features heif`.

pub mod config;
pub mod engine;
pub mod error;

pub use config::TranscodeConfig;
pub use engine::{Bounds, Codec, ImageCodec, ImageInfo, Images, TempStorage, Transcoder, Upload};
pub use error::{BatchError, ErrorBody, ErrorCategory, ErrorKind, Result, TranscodeError};

/// Library version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Content types accepted for upload. Parameters and letter case are ignored.
pub fn supported_content_types() -> &'static [&'static str] {
    engine::MediaType::ACCEPTED
}

/// The single output format
pub fn output_format() -> &'static str {
    engine::OUTPUT_EXTENSION
}
