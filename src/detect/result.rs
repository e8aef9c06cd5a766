/// Axis-aligned rectangle in frame pixel coordinates.
///
/// Invariant (for regions produced by the detector): `width > 0`, `height > 0`,
/// and the rectangle lies fully inside the frame it was detected in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn fits_within(&self, frame_width: u32, frame_height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && self.right() <= frame_width
            && self.bottom() <= frame_height
    }
}

/// One motion region plus the enclosed area of the contour it came from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    pub region: Region,
    pub contour_area: f64,
}

/// Result of one `detect` call. Empty means "no motion".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetectionResult {
    /// In contour discovery order.
    detections: Vec<Detection>,
}

impl DetectionResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    pub fn regions(&self) -> impl Iterator<Item = Region> + '_ {
        self.detections.iter().map(|d| d.region)
    }
}
