// src/engine/codec.rs
//
// The per-item transcode: validate → decode → fit → encode → persist.
// Stateless apart from the injected storage handle, so one codec is shared by
// every worker without locking.

use crate::engine::decoder::decode_image;
use crate::engine::encoder::encode_webp;
use crate::engine::io::Upload;
use crate::engine::media::MediaType;
use crate::engine::pipeline::{fit_to_bounds, Bounds};
use crate::engine::storage::{TempStorage, OUTPUT_EXTENSION};
use crate::error::TranscodeError;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use uuid::Uuid;

/// Result of one successful transcode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInfo {
    /// Byte size of the upload as submitted
    pub original_size: u64,
    /// Byte size of the encoded output on disk
    #[serde(rename = "webpSize")]
    pub encoded_size: u64,
    /// Generated output name inside the temporary storage area
    pub filename: String,
    /// Output pixel dimensions
    pub width: u32,
    pub height: u32,
}

/// Something that turns one upload into one stored output.
///
/// The worker pool only knows this trait; `ImageCodec` is the real thing.
pub trait Codec: Send + Sync {
    fn transcode(&self, upload: &Upload, bounds: Bounds) -> Result<ImageInfo, TranscodeError>;
}

#[derive(Clone, Debug)]
pub struct ImageCodec {
    storage: TempStorage,
}

impl ImageCodec {
    pub fn new(storage: TempStorage) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &TempStorage {
        &self.storage
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

impl Codec for ImageCodec {
    #[tracing::instrument(level = "debug", skip_all, fields(file = upload.name()))]
    fn transcode(&self, upload: &Upload, bounds: Bounds) -> Result<ImageInfo, TranscodeError> {
        let start = Instant::now();
        let name = upload.name();

        // 1. Validate declared type before touching the bytes
        let media_type = MediaType::parse(upload.content_type())?;
        tracing::debug!(file = name, %media_type, "type validated");

        // 2. Decode
        let stage = Instant::now();
        let bytes = upload.open()?;
        let img = decode_image(&bytes, media_type)?;
        drop(bytes);
        let (src_w, src_h) = (img.width(), img.height());
        tracing::debug!(file = name, width = src_w, height = src_h, ms = elapsed_ms(stage), "decoded");

        // 3. Downsample only if it does not fit
        let stage = Instant::now();
        let img = fit_to_bounds(img, bounds)?;
        let (width, height) = (img.width(), img.height());
        if (width, height) != (src_w, src_h) {
            tracing::debug!(file = name, width, height, %bounds, ms = elapsed_ms(stage), "resized");
        }

        // 4. Encode (in memory; nothing touches disk until it succeeds)
        let stage = Instant::now();
        let encoded = encode_webp(&img)?;
        drop(img);
        tracing::debug!(file = name, bytes = encoded.len(), ms = elapsed_ms(stage), "encoded");

        // 5. Persist under a fresh unique name
        let filename = format!("{}.{}", Uuid::new_v4(), OUTPUT_EXTENSION);
        let encoded_size = self.storage.persist(&filename, &encoded)?;

        tracing::debug!(
            file = name,
            output = %filename,
            original_size = upload.size(),
            encoded_size,
            total_ms = elapsed_ms(start),
            "transcoded"
        );

        Ok(ImageInfo {
            original_size: upload.size(),
            encoded_size,
            filename,
            width,
            height,
        })
    }
}
