// src/engine/common.rs
//
// Common utilities shared across engine modules.
// Provides the panic policy and the engine Result alias.

use crate::error::TranscodeError;
use std::panic::{catch_unwind, AssertUnwindSafe};

pub type EngineResult<T> = std::result::Result<T, TranscodeError>;

/// Run a codec call, converting a panic into an error for the given stage.
///
/// Codec crates occasionally panic on hostile input. A panic must never take
/// down a worker, so it is reported like any other per-item failure.
pub fn run_with_panic_policy<T, F>(stage: &'static str, f: F) -> EngineResult<T>
where
    F: FnOnce() -> EngineResult<T>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let detail = panic_message(payload.as_ref());
            tracing::warn!(stage, detail = %detail, "codec panicked");
            Err(if stage.starts_with("decode") {
                TranscodeError::decode_failed(format!("{stage} panicked: {detail}"))
            } else if stage.starts_with("encode") {
                TranscodeError::encode_failed("webp", format!("{stage} panicked: {detail}"))
            } else {
                TranscodeError::internal_panic(format!("{stage} panicked: {detail}"))
            })
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
