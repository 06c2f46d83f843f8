// src/engine/pool.rs
//
// Fixed-size worker pool for batch transcoding.
//
// The pool owns a dedicated rayon thread pool built once with exactly `size`
// threads. Each batch gets a fresh pair of bounded channels sized to the batch:
// a job queue the workers pull from and a result channel they push to. The
// rayon scope is the completion barrier; once it returns every worker has
// sent its last result and the result channel can be drained without waiting.
//
// Sizing both channels to the batch means neither the dispatcher nor a worker
// ever blocks on a full channel, even with a single thread.

use crate::engine::batch::{Job, ResultCollector, ResultSet, TranscodeResult};
use crate::engine::codec::Codec;
use crate::engine::common::run_with_panic_policy;
use crate::engine::pipeline::Bounds;
use crate::engine::MAX_WORKERS;
use crate::error::TranscodeError;
use rayon::ThreadPool;

type PoolResult<T> = std::result::Result<T, TranscodeError>;

pub struct WorkerPool {
    pool: ThreadPool,
    size: usize,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool").field("size", &self.size).finish()
    }
}

impl WorkerPool {
    pub fn new(size: usize) -> PoolResult<Self> {
        if size == 0 || size > MAX_WORKERS {
            return Err(TranscodeError::invalid_argument(
                "workers",
                size.to_string(),
                format!("must be between 1 and {MAX_WORKERS}"),
            ));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(size)
            .thread_name(|i| format!("transcode-worker-{i}"))
            .build()
            .map_err(|e| TranscodeError::internal_panic(format!("failed to build worker pool: {e}")))?;
        tracing::debug!(size, "worker pool started");
        Ok(Self { pool, size })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Run every job through `codec` and return the results slotted by index.
    ///
    /// Exactly one result is produced per job. A codec error or panic becomes
    /// that job's result; it never stops the other workers.
    pub fn run<C>(&self, codec: &C, jobs: Vec<Job>, bounds: Bounds) -> ResultSet
    where
        C: Codec + ?Sized,
    {
        let total = jobs.len();
        let (job_tx, job_rx) = flume::bounded::<Job>(total.max(1));
        let (result_tx, result_rx) = flume::bounded::<TranscodeResult>(total.max(1));

        self.pool.scope(|s| {
            for worker in 0..self.size {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                s.spawn(move |_| work(worker, codec, bounds, job_rx, result_tx));
            }

            // Dispatcher: feed the queue, then close it so idle workers exit
            for job in jobs {
                if job_tx.send(job).is_err() {
                    tracing::error!("job queue closed before dispatch finished");
                    break;
                }
            }
            drop(job_tx);
        });

        // All workers have returned; only our sender is left
        drop(result_tx);
        let mut collector = ResultCollector::new(total);
        for result in result_rx.try_iter() {
            collector.insert(result);
        }
        if !collector.is_complete() {
            tracing::error!(
                expected = total,
                received = collector.filled(),
                "workers returned fewer results than jobs"
            );
        }
        collector.finish()
    }
}

fn work<C>(
    worker: usize,
    codec: &C,
    bounds: Bounds,
    jobs: flume::Receiver<Job>,
    results: flume::Sender<TranscodeResult>,
) where
    C: Codec + ?Sized,
{
    let mut handled = 0usize;
    for Job { index, upload } in jobs.iter() {
        let outcome = run_with_panic_policy("worker", || codec.transcode(&upload, bounds));
        if let Err(e) = &outcome {
            tracing::warn!(worker, index, file = upload.name(), error = %e, "item failed");
        }
        let result = TranscodeResult {
            index,
            name: upload.name().to_string(),
            outcome,
        };
        if results.send(result).is_err() {
            tracing::error!(worker, index, "result channel closed; dropping result");
            break;
        }
        handled += 1;
    }
    tracing::trace!(worker, handled, "worker finished");
}
