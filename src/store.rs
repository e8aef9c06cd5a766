//! Rotating raw-frame store.
//!
//! Every decoded frame is written to `img{slot:05}.jpg`, where the slot comes
//! from a `RollingCounter`. Once the counter wraps, older slots are overwritten,
//! so the directory never holds more than `limit` frames from this store.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::counter::RollingCounter;
use crate::frame::Frame;

pub const DEFAULT_RAW_DIR: &str = "images";
pub const DEFAULT_RAW_LIMIT: usize = 10;

#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub dir: PathBuf,
    pub limit: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_RAW_DIR),
            limit: DEFAULT_RAW_LIMIT,
        }
    }
}

pub struct RecentFrameStore {
    dir: PathBuf,
    counter: RollingCounter,
}

impl RecentFrameStore {
    pub fn new(cfg: StoreConfig) -> Result<Self> {
        let counter = RollingCounter::new(cfg.limit)?;
        fs::create_dir_all(&cfg.dir)
            .with_context(|| format!("create raw frame dir {}", cfg.dir.display()))?;
        Ok(Self {
            dir: cfg.dir,
            counter,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Slot the next `save` will write to.
    pub fn next_slot(&self) -> usize {
        self.counter.value()
    }

    pub fn slot_path(&self, slot: usize) -> PathBuf {
        self.dir.join(format!("img{:05}.jpg", slot))
    }

    /// Write `frame` into the current slot and advance the counter.
    ///
    /// The counter advances even when the write fails.
    pub fn save(&mut self, frame: &Frame) -> Result<PathBuf> {
        let path = self.slot_path(self.counter.value());
        let written = frame.write_jpeg(&path);
        self.counter.increment();
        written?;
        log::debug!("raw frame stored at {}", path.display());
        Ok(path)
    }
}
