// src/config.rs
//
// Process-level configuration. Read once at startup; the worker count and the
// temporary storage root do not change for the lifetime of a Transcoder.

use crate::engine::{Bounds, DEFAULT_MAX_HEIGHT, DEFAULT_MAX_WIDTH, DEFAULT_WORKERS, MAX_WORKERS};
use crate::error::{Result, TranscodeError};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

pub enum EnvKey {
    TempRoot,
    MaxWidth,
    MaxHeight,
    Workers,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::TempRoot => "TEMP_ROOT",
            EnvKey::MaxWidth => "TRANSCODE_MAX_WIDTH",
            EnvKey::MaxHeight => "TRANSCODE_MAX_HEIGHT",
            EnvKey::Workers => "TRANSCODE_WORKERS",
        }
    }
}

fn get(key: &EnvKey) -> Option<String> {
    env::var(key.as_str()).ok().filter(|v| !v.trim().is_empty())
}

/// Unset keys use the default; a set key that does not parse is an error
/// rather than a silent fallback.
fn get_parsed<T: FromStr>(key: EnvKey, default: T) -> Result<T> {
    match get(&key) {
        Some(raw) => raw.trim().parse::<T>().map_err(|_| {
            TranscodeError::invalid_argument(key.as_str(), raw, "expected a positive integer")
        }),
        None => Ok(default),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranscodeConfig {
    /// Shared temporary storage area for encoded outputs
    pub temp_root: PathBuf,
    /// Default bounding box applied when a batch does not bring its own
    pub max_width: u32,
    pub max_height: u32,
    /// Fixed worker pool size
    pub workers: usize,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            temp_root: env::temp_dir().join("webp-batch"),
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
            workers: DEFAULT_WORKERS,
        }
    }
}

impl TranscodeConfig {
    pub fn new(temp_root: impl Into<PathBuf>) -> Self {
        Self {
            temp_root: temp_root.into(),
            ..Self::default()
        }
    }

    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            temp_root: get(&EnvKey::TempRoot)
                .map(PathBuf::from)
                .unwrap_or(defaults.temp_root),
            max_width: get_parsed(EnvKey::MaxWidth, defaults.max_width)?,
            max_height: get_parsed(EnvKey::MaxHeight, defaults.max_height)?,
            workers: get_parsed(EnvKey::Workers, defaults.workers)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_bounds(mut self, max_width: u32, max_height: u32) -> Self {
        self.max_width = max_width;
        self.max_height = max_height;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn validate(&self) -> Result<()> {
        Bounds::new(self.max_width, self.max_height)?;
        if self.workers == 0 || self.workers > MAX_WORKERS {
            return Err(TranscodeError::invalid_argument(
                "workers",
                self.workers.to_string(),
                format!("must be between 1 and {MAX_WORKERS}"),
            ));
        }
        Ok(())
    }

    pub fn bounds(&self) -> Result<Bounds> {
        Bounds::new(self.max_width, self.max_height)
    }
}
