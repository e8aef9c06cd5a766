//! Per-stream processing session.
//!
//! A session owns everything that carries state between frames: the detector's
//! background model, the raw-frame rotation counter, and the previous frame.
//! Concurrent camera streams each need their own session; `process` takes
//! `&mut self`, so sharing one across threads requires external locking.

use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

use crate::archive::{ArchiveConfig, ArchivedEvent, EvidenceArchive, FrameArchiver};
use crate::detect::{DetectionResult, FrameDetector, MotionDetector, Region};
use crate::frame::Frame;
use crate::store::{RecentFrameStore, StoreConfig};
use crate::{ErrorKind, ProcessingError};

/// Whether the input itself was accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Success,
    Failure,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RegionRecord {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl From<Region> for RegionRecord {
    fn from(region: Region) -> Self {
        Self {
            x: region.x,
            y: region.y,
            width: region.width,
            height: region.height,
        }
    }
}

/// Fixed-shape reply handed to the transport layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProcessResponse {
    pub status: Status,
    /// Ordered as detected. Empty means no motion.
    pub detections: Vec<RegionRecord>,
}

impl ProcessResponse {
    pub fn accepted(result: &DetectionResult) -> Self {
        Self {
            status: Status::Success,
            detections: result.regions().map(RegionRecord::from).collect(),
        }
    }

    /// Reply for an input that was rejected before detection.
    pub fn rejected() -> Self {
        Self {
            status: Status::Failure,
            detections: Vec::new(),
        }
    }

    pub fn has_motion(&self) -> bool {
        !self.detections.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Everything one `process` call produced.
#[derive(Debug)]
pub struct ProcessReport {
    pub response: ProcessResponse,
    /// Rotating slot the raw frame was written to, if the write succeeded.
    pub raw_frame: Option<PathBuf>,
    /// Evidence written for this frame, if motion was archived.
    pub archived: Option<ArchivedEvent>,
    /// Persistence failures that did not stop the pipeline.
    pub diagnostics: Vec<ProcessingError>,
}

pub struct ImageProcessingSession<D = MotionDetector, A = FrameArchiver> {
    detector: D,
    store: RecentFrameStore,
    archive: A,
    previous: Option<Frame>,
    frames_processed: u64,
}

impl ImageProcessingSession {
    /// Session with the default motion detector and filesystem archive.
    pub fn open(store: StoreConfig, archive: ArchiveConfig) -> Result<Self> {
        Ok(Self::new(
            MotionDetector::new(),
            RecentFrameStore::new(store)?,
            FrameArchiver::new(archive)?,
        ))
    }
}

impl<D: FrameDetector, A: EvidenceArchive> ImageProcessingSession<D, A> {
    pub fn new(detector: D, store: RecentFrameStore, archive: A) -> Self {
        Self {
            detector,
            store,
            archive,
            previous: None,
            frames_processed: 0,
        }
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    pub fn archive(&self) -> &A {
        &self.archive
    }

    pub fn store(&self) -> &RecentFrameStore {
        &self.store
    }

    pub fn previous_frame(&self) -> Option<&Frame> {
        self.previous.as_ref()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Run one encoded frame through decode → rotate → detect → archive → advance.
    ///
    /// Returns `Err` only when the input is rejected (`DecodeError`) or the
    /// detector refuses the frame (`InvalidFrame`). Write failures are reported
    /// in `ProcessReport::diagnostics` and never undo detection state.
    pub fn process(&mut self, encoded: &[u8]) -> Result<ProcessReport> {
        let frame = Frame::decode(encoded)?;
        let mut diagnostics = Vec::new();

        let raw_frame = match self.store.save(&frame) {
            Ok(path) => Some(path),
            Err(e) => {
                log::warn!("raw frame rotation failed: {}", e);
                diagnostics.push(into_diagnostic(e));
                None
            }
        };

        let result = self.detector.detect(&frame)?;

        let archived = if result.is_empty() {
            None
        } else {
            log::info!(
                "{} detected {} region(s) in {}x{} frame",
                self.detector.name(),
                result.len(),
                frame.width(),
                frame.height()
            );
            match self
                .archive
                .archive(&result, &frame, self.previous.as_ref())
            {
                Ok(event) => Some(event),
                Err(e) => {
                    log::warn!("detection archive failed: {}", e);
                    diagnostics.push(into_diagnostic(e));
                    None
                }
            }
        };

        self.previous = Some(frame);
        self.frames_processed += 1;

        Ok(ProcessReport {
            response: ProcessResponse::accepted(&result),
            raw_frame,
            archived,
            diagnostics,
        })
    }

    /// Map a possibly-missing payload straight onto the transport reply.
    pub fn respond(&mut self, payload: Option<&[u8]>) -> ProcessResponse {
        let Some(bytes) = payload else {
            log::warn!("request carried no image payload");
            return ProcessResponse::rejected();
        };
        match self.process(bytes) {
            Ok(report) => report.response,
            Err(e) => {
                log::warn!("frame rejected: {}", e);
                ProcessResponse::rejected()
            }
        }
    }
}

fn into_diagnostic(err: anyhow::Error) -> ProcessingError {
    match err.downcast::<ProcessingError>() {
        Ok(e) => e,
        Err(other) => ProcessingError::new(ErrorKind::ArchiveWriteFailed, format!("{:#}", other)),
    }
}
