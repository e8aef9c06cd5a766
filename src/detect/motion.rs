//! Background-subtraction motion detector.
//!
//! The detector keeps a running average of past grayscale frames. Each new frame
//! is blended into that average, compared against it, thresholded, and traced
//! into contours; contours inside the area band become motion regions.
//!
//! The first frame a detector sees only seeds the background, so it never
//! reports motion. Every later call mutates the background, which makes
//! `detect` neither idempotent nor reorderable.

use anyhow::Result;
use image::{GrayImage, Luma};

use crate::detect::backend::FrameDetector;
use crate::detect::contours::{bounding_region, external_contours, polygon_area};
use crate::detect::result::{Detection, DetectionResult};
use crate::frame::Frame;
use crate::{ErrorKind, ProcessingError};

/// Weight of the newest frame in the background running average.
pub const SMOOTHING_WEIGHT: f32 = 0.5;
/// Differences strictly above this become foreground.
pub const DIFF_THRESHOLD: u8 = 3;
/// Foreground value in the binary difference image.
pub const MAXVAL: u8 = 255;
/// Contours at or below this area are noise.
pub const AREA_MIN: f64 = 1000.0;
/// Contours at or above this area are lighting shifts or camera movement.
pub const AREA_MAX: f64 = 10000.0;

/// Single-precision grayscale running average.
#[derive(Clone, Debug)]
struct BackgroundModel {
    width: u32,
    height: u32,
    values: Vec<f32>,
}

impl BackgroundModel {
    fn seed(gray: &GrayImage) -> Self {
        Self {
            width: gray.width(),
            height: gray.height(),
            values: gray.as_raw().iter().map(|&v| v as f32).collect(),
        }
    }

    fn accumulate(&mut self, gray: &GrayImage, alpha: f32) {
        for (bg, &px) in self.values.iter_mut().zip(gray.as_raw()) {
            *bg = *bg * (1.0 - alpha) + px as f32 * alpha;
        }
    }

    /// Binary image of pixels that differ from the rounded background by more
    /// than `threshold`. Background halves round to the nearest even level.
    fn foreground_mask(&self, gray: &GrayImage, threshold: u8) -> GrayImage {
        let mut mask = GrayImage::new(self.width, self.height);
        for ((out, &px), &bg) in mask
            .pixels_mut()
            .zip(gray.as_raw())
            .zip(self.values.iter())
        {
            let reference = bg.round_ties_even().clamp(0.0, 255.0) as u8;
            let diff = px.abs_diff(reference);
            *out = Luma([if diff > threshold { MAXVAL } else { 0 }]);
        }
        mask
    }
}

/// Stateful motion detector. One instance per camera stream.
#[derive(Debug, Default)]
pub struct MotionDetector {
    background: Option<BackgroundModel>,
}

impl MotionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once a baseline frame has been absorbed.
    pub fn is_initialized(&self) -> bool {
        self.background.is_some()
    }

    /// Forget the background; the next frame becomes the new baseline.
    pub fn reset(&mut self) {
        self.background = None;
    }

    /// Compare `frame` with the background and report motion regions.
    ///
    /// Must be called at most once per logical frame, in arrival order.
    pub fn detect(&mut self, frame: &Frame) -> Result<DetectionResult> {
        if frame.is_empty() {
            return Err(ProcessingError::new(
                ErrorKind::InvalidFrame,
                format!("frame is {}x{}", frame.width(), frame.height()),
            )
            .into());
        }
        let gray = frame.to_gray();

        let Some(background) = self.background.as_mut() else {
            log::debug!(
                "motion detector seeded with {}x{} baseline",
                gray.width(),
                gray.height()
            );
            self.background = Some(BackgroundModel::seed(&gray));
            return Ok(DetectionResult::empty());
        };

        if (background.width, background.height) != gray.dimensions() {
            return Err(ProcessingError::new(
                ErrorKind::InvalidFrame,
                format!(
                    "frame is {}x{} but background is {}x{}",
                    gray.width(),
                    gray.height(),
                    background.width,
                    background.height
                ),
            )
            .into());
        }

        background.accumulate(&gray, SMOOTHING_WEIGHT);
        let mask = background.foreground_mask(&gray, DIFF_THRESHOLD);

        let contours = external_contours(&mask);
        if contours.is_empty() {
            log::debug!("no foreground contours");
            return Ok(DetectionResult::empty());
        }

        let detections: Vec<Detection> = contours
            .iter()
            .filter_map(|points| {
                let area = polygon_area(points);
                if area <= AREA_MIN || area >= AREA_MAX {
                    return None;
                }
                bounding_region(points).map(|region| Detection {
                    region,
                    contour_area: area,
                })
            })
            .collect();

        log::debug!(
            "{} contours, {} inside area band",
            contours.len(),
            detections.len()
        );
        Ok(DetectionResult::new(detections))
    }
}

impl FrameDetector for MotionDetector {
    fn name(&self) -> &'static str {
        "background-subtraction"
    }

    fn detect(&mut self, frame: &Frame) -> Result<DetectionResult> {
        MotionDetector::detect(self, frame)
    }
}
