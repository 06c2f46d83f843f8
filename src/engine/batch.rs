// src/engine/batch.rs
//
// Batch bookkeeping around the worker pool: turning uploads into indexed jobs,
// slotting results back by index, and folding the slots into one outcome.

use crate::engine::codec::ImageInfo;
use crate::engine::io::Upload;
use crate::error::{BatchError, TranscodeError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One unit of work: an upload tagged with its submission index.
#[derive(Debug)]
pub struct Job {
    pub index: usize,
    pub upload: Upload,
}

/// Tag every upload with its position. An empty batch is rejected here,
/// before any worker sees it.
pub fn dispatch(uploads: Vec<Upload>) -> Result<Vec<Job>, BatchError> {
    if uploads.is_empty() {
        return Err(BatchError::EmptyBatch);
    }
    Ok(uploads
        .into_iter()
        .enumerate()
        .map(|(index, upload)| Job { index, upload })
        .collect())
}

/// What a worker sends back for one job. Failure is a normal outcome.
#[derive(Debug)]
pub struct TranscodeResult {
    pub index: usize,
    pub name: String,
    pub outcome: Result<ImageInfo, TranscodeError>,
}

impl TranscodeResult {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Lifecycle of a batch, logged as it advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Dispatched,
    Processing,
    Collected,
    Succeeded,
    Failed,
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BatchState::Dispatched => "dispatched",
            BatchState::Processing => "processing",
            BatchState::Collected => "collected",
            BatchState::Succeeded => "succeeded",
            BatchState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Fixed-size slot array indexed by job index.
///
/// Results arrive in completion order; each lands in the slot of its own
/// index, so the final order is submission order no matter who finished first.
#[derive(Debug)]
pub struct ResultCollector {
    slots: Vec<Option<TranscodeResult>>,
    filled: usize,
}

impl ResultCollector {
    pub fn new(total: usize) -> Self {
        let mut slots = Vec::with_capacity(total);
        slots.resize_with(total, || None);
        Self { slots, filled: 0 }
    }

    pub fn total(&self) -> usize {
        self.slots.len()
    }

    pub fn filled(&self) -> usize {
        self.filled
    }

    pub fn is_complete(&self) -> bool {
        self.filled == self.slots.len()
    }

    /// Store a result in its slot. Returns false (and drops the result) if the
    /// index is out of range or the slot is already taken.
    pub fn insert(&mut self, result: TranscodeResult) -> bool {
        let index = result.index;
        let total = self.slots.len();
        match self.slots.get_mut(index) {
            Some(slot) if slot.is_none() => {
                *slot = Some(result);
                self.filled += 1;
                true
            }
            Some(_) => {
                tracing::error!(index, "duplicate result for job; keeping the first");
                false
            }
            None => {
                tracing::error!(index, total, "result index out of range");
                false
            }
        }
    }

    pub fn finish(self) -> ResultSet {
        ResultSet { slots: self.slots }
    }
}

/// The collected, index-ordered results of a batch. Empty slots mean a worker
/// never reported for that job.
#[derive(Debug)]
pub struct ResultSet {
    slots: Vec<Option<TranscodeResult>>,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TranscodeResult> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn failures(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| !matches!(slot, Some(r) if r.is_ok()))
            .count()
    }
}

/// Ordered list of successful transcodes, as returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Images {
    pub images: Vec<ImageInfo>,
}

impl Images {
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ImageInfo> {
        self.images.iter()
    }

    /// `{"images": [...]}`
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl IntoIterator for Images {
    type Item = ImageInfo;
    type IntoIter = std::vec::IntoIter<ImageInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.images.into_iter()
    }
}

/// Fold a result set into the batch outcome.
///
/// Scanning in index order, the first failure wins and becomes the batch
/// error. Outputs already written for other items are left where they are.
pub fn assemble(results: ResultSet) -> Result<Images, BatchError> {
    if results.is_empty() {
        return Err(BatchError::EmptyBatch);
    }
    let mut images = Vec::with_capacity(results.len());
    for (index, slot) in results.slots.into_iter().enumerate() {
        match slot {
            Some(TranscodeResult {
                outcome: Ok(info), ..
            }) => images.push(info),
            Some(TranscodeResult {
                name,
                outcome: Err(source),
                ..
            }) => return Err(BatchError::ItemFailed { index, name, source }),
            None => {
                return Err(BatchError::ItemFailed {
                    index,
                    name: String::new(),
                    source: TranscodeError::internal_panic(format!(
                        "no result reported for job {index}"
                    )),
                })
            }
        }
    }
    Ok(Images { images })
}
