mod backend;
mod contours;
pub mod motion;
mod result;

pub use backend::FrameDetector;
pub use motion::{MotionDetector, AREA_MAX, AREA_MIN};
pub use result::{Detection, DetectionResult, Region};
