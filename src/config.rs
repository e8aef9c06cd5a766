use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::archive::{ArchiveConfig, DEFAULT_ARCHIVE_DIR};
use crate::store::{StoreConfig, DEFAULT_RAW_DIR, DEFAULT_RAW_LIMIT};

#[derive(Debug, Deserialize, Default)]
struct SentinelConfigFile {
    raw: Option<RawConfigFile>,
    archive: Option<ArchiveConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct RawConfigFile {
    dir: Option<PathBuf>,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct ArchiveConfigFile {
    dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct SentinelConfig {
    pub raw_dir: PathBuf,
    pub raw_limit: usize,
    pub archive_dir: PathBuf,
}

impl SentinelConfig {
    /// Defaults, then the file named by `MOTION_CONFIG`, then env overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("MOTION_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: SentinelConfigFile) -> Self {
        let raw = file.raw.unwrap_or_default();
        Self {
            raw_dir: raw.dir.unwrap_or_else(|| PathBuf::from(DEFAULT_RAW_DIR)),
            raw_limit: raw.limit.unwrap_or(DEFAULT_RAW_LIMIT),
            archive_dir: file
                .archive
                .and_then(|archive| archive.dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ARCHIVE_DIR)),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(dir) = std::env::var("MOTION_RAW_DIR") {
            if !dir.trim().is_empty() {
                self.raw_dir = PathBuf::from(dir);
            }
        }
        if let Ok(limit) = std::env::var("MOTION_RAW_LIMIT") {
            self.raw_limit = limit
                .trim()
                .parse()
                .map_err(|_| anyhow!("MOTION_RAW_LIMIT must be a positive integer"))?;
        }
        if let Ok(dir) = std::env::var("MOTION_ARCHIVE_DIR") {
            if !dir.trim().is_empty() {
                self.archive_dir = PathBuf::from(dir);
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.raw_limit == 0 {
            return Err(anyhow!("raw frame limit must be greater than zero"));
        }
        if self.raw_dir.as_os_str().is_empty() {
            return Err(anyhow!("raw frame dir must not be empty"));
        }
        if self.archive_dir.as_os_str().is_empty() {
            return Err(anyhow!("archive dir must not be empty"));
        }
        Ok(())
    }

    pub fn store(&self) -> StoreConfig {
        StoreConfig {
            dir: self.raw_dir.clone(),
            limit: self.raw_limit,
        }
    }

    pub fn archive(&self) -> ArchiveConfig {
        ArchiveConfig {
            dir: self.archive_dir.clone(),
        }
    }
}

fn read_config_file(path: &Path) -> Result<SentinelConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let cfg = if is_toml {
        toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}
