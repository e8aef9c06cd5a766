//! Motion Sentinel
//!
//! This crate implements the core of a camera motion detector: successive frames
//! are compared against a smoothed background, bright difference regions are
//! traced into contours, and contours of a plausible size are reported as
//! motion regions.
//!
//! # Architecture
//!
//! Each camera stream owns one `ImageProcessingSession`, which runs every frame
//! through the same forward-only pipeline:
//!
//! 1. **Decode**: encoded bytes become a `Frame` (or the input is rejected).
//! 2. **Rotate**: the raw frame is written into a bounded set of slots.
//! 3. **Detect**: `MotionDetector` compares it with the background model.
//! 4. **Archive**: on motion, current/previous/annotated frames are persisted.
//! 5. **Advance**: the frame becomes the session's previous frame.
//!
//! State is never rolled back: an archive failure is reported next to the
//! detection result instead of replacing it.
//!
//! # Module Structure
//!
//! - `frame`: decoded frames (color or grayscale)
//! - `counter`: rolling slot counter
//! - `detect`: background model, contour extraction, detection results
//! - `store`: rotating raw-frame directory
//! - `archive`: detection evidence writer
//! - `session`: per-stream orchestration and response payloads
//! - `config`: file + environment configuration

pub mod archive;
pub mod config;
pub mod counter;
pub mod detect;
pub mod frame;
pub mod session;
pub mod store;

pub use archive::{ArchiveConfig, ArchivedEvent, EvidenceArchive, FrameArchiver};
pub use counter::RollingCounter;
pub use detect::{
    Detection, DetectionResult, FrameDetector, MotionDetector, Region, AREA_MAX, AREA_MIN,
};
pub use frame::Frame;
pub use session::{ImageProcessingSession, ProcessReport, ProcessResponse, RegionRecord, Status};
pub use store::{RecentFrameStore, StoreConfig};

// -------------------- Processing errors --------------------

/// Failure classes surfaced by the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or absent image payload. Nothing was mutated.
    Decode,
    /// Empty frame or dimension change. The background model is untouched.
    InvalidFrame,
    /// Persisting a frame to disk failed.
    ArchiveWriteFailed,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Decode => "DECODE_ERROR",
            ErrorKind::InvalidFrame => "INVALID_FRAME",
            ErrorKind::ArchiveWriteFailed => "ARCHIVE_WRITE_FAILED",
        }
    }
}

/// Typed pipeline error. Travels inside `anyhow::Error`; classify with
/// `err.downcast_ref::<ProcessingError>()`.
#[derive(Clone, Debug)]
pub struct ProcessingError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ProcessingError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Kind of `err` if it carries a `ProcessingError`.
    pub fn kind_of(err: &anyhow::Error) -> Option<ErrorKind> {
        err.downcast_ref::<ProcessingError>().map(|e| e.kind)
    }
}

impl std::fmt::Display for ProcessingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.code(), self.message)
    }
}
impl std::error::Error for ProcessingError {}
