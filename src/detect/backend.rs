use anyhow::Result;

use crate::detect::result::DetectionResult;
use crate::frame::Frame;

/// Detector seam used by `ImageProcessingSession`.
///
/// Detectors are stateful: `detect` may update internal models, so it must be
/// called at most once per logical frame, in arrival order.
pub trait FrameDetector {
    /// Detector identifier (for logs).
    fn name(&self) -> &'static str;

    /// Run detection on a frame.
    fn detect(&mut self, frame: &Frame) -> Result<DetectionResult>;
}
