//! motiond - feed image files through one motion detection session
//!
//! Each input is processed in order (directories expand to their image files,
//! sorted by name). One JSON response per input is printed to stdout:
//! `{"status":"SUCCESS","detections":[{"x":..,"y":..,"width":..,"height":..}]}`.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};

use motion_sentinel::config::SentinelConfig;
use motion_sentinel::ImageProcessingSession;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Image files or directories of images, processed in order.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// Rotating raw frame directory (overrides config).
    #[arg(long)]
    raw_dir: Option<PathBuf>,
    /// Number of rotating raw frame slots (overrides config).
    #[arg(long)]
    raw_limit: Option<usize>,
    /// Detection archive directory (overrides config).
    #[arg(long)]
    archive_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut cfg = SentinelConfig::load()?;
    if let Some(dir) = args.raw_dir {
        cfg.raw_dir = dir;
    }
    if let Some(limit) = args.raw_limit {
        cfg.raw_limit = limit;
    }
    if let Some(dir) = args.archive_dir {
        cfg.archive_dir = dir;
    }
    cfg.validate()?;

    let frames = expand_inputs(&args.inputs)?;
    if frames.is_empty() {
        return Err(anyhow!("no image files found in inputs"));
    }

    let mut session = ImageProcessingSession::open(cfg.store(), cfg.archive())?;
    log::info!(
        "motiond processing {} frame(s); raw={} (limit {}), archive={}",
        frames.len(),
        cfg.raw_dir.display(),
        cfg.raw_limit,
        cfg.archive_dir.display()
    );

    let mut motion_frames = 0u64;
    for path in &frames {
        let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
        let response = match session.process(&bytes) {
            Ok(report) => {
                for diag in &report.diagnostics {
                    log::warn!("{}: {}", path.display(), diag);
                }
                if let Some(event) = &report.archived {
                    log::info!("{}: evidence stored as {}", path.display(), event.stem);
                }
                report.response
            }
            Err(e) => {
                log::warn!("{}: rejected: {}", path.display(), e);
                motion_sentinel::ProcessResponse::rejected()
            }
        };
        if response.has_motion() {
            motion_frames += 1;
        }
        println!("{}", response.to_json()?);
    }

    log::info!(
        "done: {} frame(s), {} with motion",
        session.frames_processed(),
        motion_frames
    );
    Ok(())
}

fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut entries = fs::read_dir(input)
                .with_context(|| format!("read dir {}", input.display()))?
                .map(|entry| entry.map(|e| e.path()))
                .collect::<Result<Vec<_>, _>>()?;
            entries.retain(|p| is_image(p));
            entries.sort();
            out.extend(entries);
        } else {
            out.push(input.clone());
        }
    }
    Ok(out)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}
