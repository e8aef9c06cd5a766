//! Detection evidence archive.
//!
//! When motion is confirmed the archive writes three JPEGs named by a
//! second-resolution local timestamp:
//!
//! - `{ts}_current.jpg`: the frame as received
//! - `{ts}_prev.jpg`: the frame before it (skipped when there is none)
//! - `{ts}_motion.jpg`: the current frame with every region outlined
//!
//! Two detections inside the same second share a stem; the later one
//! overwrites the earlier (logged as a warning). Writes are independent:
//! a failed write does not undo the others.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use std::fs;
use std::path::{Path, PathBuf};

use crate::detect::{DetectionResult, Region};
use crate::frame::Frame;

pub const DEFAULT_ARCHIVE_DIR: &str = "detections";

/// Outline color for motion regions.
pub const ACCENT: Rgb<u8> = Rgb([0, 255, 0]);
/// Outline thickness in pixels.
///
/// The stroke is drawn inward from the region edge rather than centered on
/// it, so the outline never covers pixels outside the reported region.
pub const OUTLINE_THICKNESS: u32 = 2;

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Clone, Debug)]
pub struct ArchiveConfig {
    pub dir: PathBuf,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_ARCHIVE_DIR),
        }
    }
}

/// Files written for one detection event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchivedEvent {
    pub stem: String,
    pub current: PathBuf,
    pub previous: Option<PathBuf>,
    pub motion: PathBuf,
}

/// Persists evidence for confirmed detections.
///
/// Callers invoke `archive` only with a non-empty result.
pub trait EvidenceArchive {
    fn archive(
        &mut self,
        result: &DetectionResult,
        current: &Frame,
        previous: Option<&Frame>,
    ) -> Result<ArchivedEvent>;
}

/// Filesystem archive rooted at a fixed directory.
pub struct FrameArchiver {
    root: PathBuf,
}

impl FrameArchiver {
    pub fn new(cfg: ArchiveConfig) -> Result<Self> {
        fs::create_dir_all(&cfg.dir)
            .with_context(|| format!("create archive dir {}", cfg.dir.display()))?;
        Ok(Self { root: cfg.dir })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Archive with an explicit event time.
    pub fn archive_at(
        &mut self,
        result: &DetectionResult,
        current: &Frame,
        previous: Option<&Frame>,
        at: DateTime<Local>,
    ) -> Result<ArchivedEvent> {
        let stem = at.format(TIMESTAMP_FORMAT).to_string();
        let event = ArchivedEvent {
            current: self.root.join(format!("{}_current.jpg", stem)),
            previous: previous.map(|_| self.root.join(format!("{}_prev.jpg", stem))),
            motion: self.root.join(format!("{}_motion.jpg", stem)),
            stem,
        };

        if event.motion.exists() {
            log::warn!(
                "archive stem {} already used this second; overwriting",
                event.stem
            );
        }

        let annotated = Frame::Color(annotate(current, result.regions()));

        let mut outcomes = vec![current.write_jpeg(&event.current)];
        match (previous, &event.previous) {
            (Some(frame), Some(path)) => outcomes.push(frame.write_jpeg(path)),
            _ => log::debug!("no previous frame for {}; skipping _prev", event.stem),
        }
        outcomes.push(annotated.write_jpeg(&event.motion));

        let mut first_err = None;
        for err in outcomes.into_iter().filter_map(Result::err) {
            log::error!("archive write failed: {}", err);
            if first_err.is_none() {
                first_err = Some(err);
            }
        }
        if let Some(err) = first_err {
            return Err(err);
        }

        log::info!(
            "archived {} region(s) as {}",
            result.len(),
            self.root.join(&event.stem).display()
        );
        Ok(event)
    }
}

impl EvidenceArchive for FrameArchiver {
    fn archive(
        &mut self,
        result: &DetectionResult,
        current: &Frame,
        previous: Option<&Frame>,
    ) -> Result<ArchivedEvent> {
        self.archive_at(result, current, previous, Local::now())
    }
}

/// RGB copy of `frame` with each region outlined in `ACCENT`.
pub fn annotate(frame: &Frame, regions: impl IntoIterator<Item = Region>) -> RgbImage {
    let mut canvas = frame.to_rgb();
    for region in regions {
        for inset in 0..OUTLINE_THICKNESS {
            let Some(w) = region.width.checked_sub(2 * inset).filter(|w| *w > 0) else {
                break;
            };
            let Some(h) = region.height.checked_sub(2 * inset).filter(|h| *h > 0) else {
                break;
            };
            let rect = Rect::at((region.x + inset) as i32, (region.y + inset) as i32).of_size(w, h);
            draw_hollow_rect_mut(&mut canvas, rect, ACCENT);
        }
    }
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::Detection;
    use crate::{ErrorKind, ProcessingError};
    use chrono::TimeZone;
    use image::{GrayImage, Luma};

    fn result_with(region: Region) -> DetectionResult {
        DetectionResult::new(vec![Detection {
            region,
            contour_area: 1500.0,
        }])
    }

    fn gray(value: u8) -> Frame {
        Frame::Gray(GrayImage::from_pixel(64, 48, Luma([value])))
    }

    fn fixed_time() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 3, 9, 7, 5, 1)
            .single()
            .expect("unambiguous local time")
    }

    #[test]
    fn annotate_draws_two_pixel_outline() {
        let img = annotate(&gray(10), [Region::new(10, 8, 20, 12)]);
        assert_eq!(*img.get_pixel(10, 8), ACCENT);
        assert_eq!(*img.get_pixel(11, 9), ACCENT);
        assert_eq!(*img.get_pixel(29, 19), ACCENT);
        assert_eq!(*img.get_pixel(28, 18), ACCENT);
        assert_eq!(*img.get_pixel(12, 10), Rgb([10, 10, 10]));
        assert_eq!(*img.get_pixel(9, 8), Rgb([10, 10, 10]));
    }

    #[test]
    fn annotate_stays_inside_region_box() {
        let background = Rgb([10, 10, 10]);
        let img = annotate(&gray(10), [Region::new(10, 8, 20, 12)]);
        for x in 9..=30 {
            assert_eq!(*img.get_pixel(x, 7), background);
            assert_eq!(*img.get_pixel(x, 20), background);
        }
        for y in 7..=20 {
            assert_eq!(*img.get_pixel(9, y), background);
            assert_eq!(*img.get_pixel(30, y), background);
        }
    }

    #[test]
    fn annotate_handles_one_pixel_regions() {
        let img = annotate(&gray(0), [Region::new(3, 3, 1, 1)]);
        assert_eq!(*img.get_pixel(3, 3), ACCENT);
    }

    #[test]
    fn writes_timestamped_triplet() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let mut archiver = FrameArchiver::new(ArchiveConfig {
            dir: temp_dir.path().join("archive"),
        })?;
        let event = archiver.archive_at(
            &result_with(Region::new(5, 5, 20, 20)),
            &gray(200),
            Some(&gray(20)),
            fixed_time(),
        )?;

        assert_eq!(event.stem, "20240309_070501");
        assert!(event.current.ends_with("20240309_070501_current.jpg"));
        assert!(event.motion.ends_with("20240309_070501_motion.jpg"));
        for path in [&event.current, event.previous.as_ref().unwrap(), &event.motion] {
            assert!(path.is_file(), "{} missing", path.display());
        }
        Ok(())
    }

    #[test]
    fn missing_previous_frame_is_skipped() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let mut archiver = FrameArchiver::new(ArchiveConfig {
            dir: temp_dir.path().to_path_buf(),
        })?;
        let event = archiver.archive_at(
            &result_with(Region::new(0, 0, 8, 8)),
            &gray(200),
            None,
            fixed_time(),
        )?;
        assert_eq!(event.previous, None);
        assert_eq!(fs::read_dir(archiver.root())?.count(), 2);
        Ok(())
    }

    #[test]
    fn same_second_collision_overwrites() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let mut archiver = FrameArchiver::new(ArchiveConfig {
            dir: temp_dir.path().to_path_buf(),
        })?;
        let result = result_with(Region::new(0, 0, 8, 8));
        let first = archiver.archive_at(&result, &gray(200), Some(&gray(1)), fixed_time())?;
        let second = archiver.archive_at(&result, &gray(100), Some(&gray(2)), fixed_time())?;
        assert_eq!(first, second);
        assert_eq!(fs::read_dir(archiver.root())?.count(), 3);
        Ok(())
    }

    #[test]
    fn write_failure_is_archive_write_failed() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let dir = temp_dir.path().join("gone");
        let mut archiver = FrameArchiver::new(ArchiveConfig { dir: dir.clone() })?;
        fs::remove_dir_all(&dir)?;

        let err = archiver
            .archive(&result_with(Region::new(0, 0, 8, 8)), &gray(200), None)
            .unwrap_err();
        assert_eq!(
            ProcessingError::kind_of(&err),
            Some(ErrorKind::ArchiveWriteFailed)
        );
        Ok(())
    }
}
