//! Decoded camera frames.
//!
//! - `Frame`: a color (RGB) or grayscale pixel grid, immutable once decoded.
//! - `Frame::decode`: the single entry point from encoded bytes (JPEG/PNG).
//! - `Frame::write_jpeg`: the single exit point back to disk.
//!
//! Codec work is delegated to the `image` crate; this module only decides how
//! a decoded buffer maps onto the two pixel layouts the detector understands.

use anyhow::Result;
use image::{DynamicImage, GrayImage, ImageFormat, Luma, RgbImage};
use std::borrow::Cow;
use std::path::Path;

use crate::{ErrorKind, ProcessingError};

/// A decoded frame. Width and height are fixed for the frame's lifetime.
#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    Color(RgbImage),
    Gray(GrayImage),
}

impl Frame {
    /// Decode an encoded image payload.
    ///
    /// Single-channel inputs stay grayscale; everything else is normalized to RGB.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(ProcessingError::new(ErrorKind::Decode, "empty image payload").into());
        }
        let decoded = image::load_from_memory(bytes).map_err(|e| {
            ProcessingError::new(ErrorKind::Decode, format!("malformed image payload: {}", e))
        })?;
        let frame = match decoded {
            DynamicImage::ImageLuma8(gray) => Frame::Gray(gray),
            other => Frame::Color(other.to_rgb8()),
        };
        if frame.is_empty() {
            return Err(ProcessingError::new(ErrorKind::Decode, "decoded image has no pixels").into());
        }
        Ok(frame)
    }

    pub fn width(&self) -> u32 {
        match self {
            Frame::Color(img) => img.width(),
            Frame::Gray(img) => img.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            Frame::Color(img) => img.height(),
            Frame::Gray(img) => img.height(),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Grayscale view. Borrows when the frame is already grayscale.
    ///
    /// Color frames use BT.601 luma (0.299 R + 0.587 G + 0.114 B, rounded).
    pub fn to_gray(&self) -> Cow<'_, GrayImage> {
        match self {
            Frame::Gray(img) => Cow::Borrowed(img),
            Frame::Color(img) => Cow::Owned(GrayImage::from_fn(img.width(), img.height(), |x, y| {
                Luma([bt601_luma(img.get_pixel(x, y).0)])
            })),
        }
    }

    /// Owned RGB copy, used when drawing colored annotations.
    pub fn to_rgb(&self) -> RgbImage {
        match self {
            Frame::Color(img) => img.clone(),
            Frame::Gray(img) => DynamicImage::ImageLuma8(img.clone()).to_rgb8(),
        }
    }

    /// Encode as JPEG at `path`. Failures are `ArchiveWriteFailed`.
    pub fn write_jpeg(&self, path: &Path) -> Result<()> {
        let written = match self {
            Frame::Color(img) => img.save_with_format(path, ImageFormat::Jpeg),
            Frame::Gray(img) => img.save_with_format(path, ImageFormat::Jpeg),
        };
        written.map_err(|e| {
            ProcessingError::new(
                ErrorKind::ArchiveWriteFailed,
                format!("failed to write {}: {}", path.display(), e),
            )
            .into()
        })
    }
}

/// Fixed-point BT.601 luma with 14 fractional bits, rounded to nearest.
fn bt601_luma([r, g, b]: [u8; 3]) -> u8 {
    const R: u32 = 4899;
    const G: u32 = 9617;
    const B: u32 = 1868;
    const HALF: u32 = 1 << 13;
    ((r as u32 * R + g as u32 * G + b as u32 * B + HALF) >> 14) as u8
}

impl From<RgbImage> for Frame {
    fn from(img: RgbImage) -> Self {
        Frame::Color(img)
    }
}

impl From<GrayImage> for Frame {
    fn from(img: GrayImage) -> Self {
        Frame::Gray(img)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::io::Cursor;

    fn encode_png(img: &DynamicImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).expect("encode png");
        out.into_inner()
    }

    #[test]
    fn decode_keeps_grayscale_layout() -> Result<()> {
        let gray = GrayImage::from_pixel(4, 3, Luma([17]));
        let frame = Frame::decode(&encode_png(&DynamicImage::ImageLuma8(gray.clone())))?;
        assert_eq!(frame, Frame::Gray(gray));
        Ok(())
    }

    #[test]
    fn decode_normalizes_color_to_rgb() -> Result<()> {
        let rgb = RgbImage::from_pixel(5, 2, Rgb([10, 20, 30]));
        let frame = Frame::decode(&encode_png(&DynamicImage::ImageRgb8(rgb)))?;
        assert!(matches!(frame, Frame::Color(_)));
        assert_eq!(frame.dimensions(), (5, 2));
        Ok(())
    }

    #[test]
    fn decode_rejects_empty_and_garbage() {
        for payload in [&b""[..], &b"not an image"[..]] {
            let err = Frame::decode(payload).unwrap_err();
            let kind = err.downcast_ref::<ProcessingError>().map(|e| e.kind);
            assert_eq!(kind, Some(ErrorKind::Decode));
        }
    }

    #[test]
    fn gray_view_of_uniform_color_is_uniform() {
        let frame = Frame::Color(RgbImage::from_pixel(3, 3, Rgb([200, 200, 200])));
        let gray = frame.to_gray();
        assert!(gray.pixels().all(|p| p.0[0] == 200));
    }

    #[test]
    fn gray_view_uses_bt601_weights() {
        assert_eq!(bt601_luma([255, 255, 255]), 255);
        assert_eq!(bt601_luma([0, 0, 70]), 8);
        assert_eq!(bt601_luma([255, 0, 0]), 76);
        assert_eq!(bt601_luma([0, 255, 0]), 150);
        assert_eq!(bt601_luma([0, 0, 255]), 29);

        let frame = Frame::Color(RgbImage::from_pixel(2, 2, Rgb([0, 0, 70])));
        assert!(frame.to_gray().pixels().all(|p| p.0[0] == 8));
    }
}
