// src/engine/api.rs
//
// Transcoder: the public entry point that ties configuration, temporary
// storage, the codec and the worker pool together.

use crate::config::TranscodeConfig;
use crate::engine::batch::{assemble, dispatch, BatchState, Images};
use crate::engine::codec::{Codec, ImageCodec};
use crate::engine::io::Upload;
use crate::engine::pipeline::Bounds;
use crate::engine::pool::WorkerPool;
use crate::engine::storage::TempStorage;
use crate::error::{BatchError, Result};
use std::path::PathBuf;
use std::time::Instant;

/// Run one batch through `pool` with `codec`.
///
/// Dispatch → parallel transcode → collect by index → assemble. Either every
/// item succeeded and the outputs come back in submission order, or the
/// earliest failing item is reported. Outputs written for the other items
/// stay in temporary storage either way.
#[tracing::instrument(
    level = "debug",
    skip_all,
    fields(items = uploads.len(), workers = pool.size(), bounds = %bounds)
)]
pub fn transcode_batch<C>(
    pool: &WorkerPool,
    codec: &C,
    uploads: Vec<Upload>,
    bounds: Bounds,
) -> std::result::Result<Images, BatchError>
where
    C: Codec + ?Sized,
{
    let start = Instant::now();
    let jobs = dispatch(uploads)?;
    let count = jobs.len();
    let workers = pool.size();
    tracing::debug!(state = %BatchState::Dispatched, count, workers, %bounds, "batch");

    tracing::debug!(state = %BatchState::Processing, count, "batch");
    let results = pool.run(codec, jobs, bounds);
    let failures = results.failures();
    tracing::debug!(state = %BatchState::Collected, count, failures, "batch");

    let elapsed = start.elapsed();
    let outcome = assemble(results);
    match &outcome {
        Ok(_) => {
            let secs = elapsed.as_secs_f64();
            let rate = if secs > 0.0 { count as f64 / secs } else { 0.0 };
            tracing::info!(
                state = %BatchState::Succeeded,
                count,
                workers,
                elapsed_ms = secs * 1000.0,
                files_per_sec = rate,
                "batch transcoded"
            );
        }
        Err(err) => {
            tracing::warn!(
                state = %BatchState::Failed,
                count,
                failures,
                index = err.index(),
                error = %err,
                "batch failed"
            );
        }
    }
    outcome
}

/// Long-lived batch transcoder.
///
/// Built once from a [`TranscodeConfig`]; the worker threads and the storage
/// area are reused by every batch.
#[derive(Debug)]
pub struct Transcoder {
    codec: ImageCodec,
    pool: WorkerPool,
    bounds: Bounds,
}

impl Transcoder {
    /// Validate the config, create the storage area and start the workers.
    pub fn from_config(config: &TranscodeConfig) -> Result<Self> {
        config.validate()?;
        let bounds = config.bounds()?;
        let storage = TempStorage::new(&config.temp_root);
        storage.ensure()?;
        let pool = WorkerPool::new(config.workers)?;
        tracing::info!(
            temp_root = %storage.root().display(),
            workers = config.workers,
            %bounds,
            "transcoder ready"
        );
        Ok(Self {
            codec: ImageCodec::new(storage),
            pool,
            bounds,
        })
    }

    /// Transcode a batch using the configured bounds.
    pub fn process_batch(&self, uploads: Vec<Upload>) -> std::result::Result<Images, BatchError> {
        self.process_batch_with_bounds(uploads, self.bounds)
    }

    /// Transcode a batch with per-batch bounds.
    pub fn process_batch_with_bounds(
        &self,
        uploads: Vec<Upload>,
        bounds: Bounds,
    ) -> std::result::Result<Images, BatchError> {
        transcode_batch(&self.pool, &self.codec, uploads, bounds)
    }

    /// Delete one output by name.
    pub fn delete_output(&self, filename: &str) -> Result<()> {
        self.storage().remove(filename)?;
        tracing::debug!(filename, "output deleted");
        Ok(())
    }

    /// Remove everything in the storage area. Must not run concurrently with a
    /// batch.
    pub fn cleanup(&self) -> Result<usize> {
        self.storage().sweep()
    }

    /// Outputs currently in the storage area, sorted by name.
    pub fn list_outputs(&self) -> Result<Vec<PathBuf>> {
        self.storage().list_outputs()
    }

    pub fn storage(&self) -> &TempStorage {
        self.codec.storage()
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }
}
