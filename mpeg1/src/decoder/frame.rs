//! Output frames

use crate::error::Error;
use crate::traits::FrameTarget;
use crate::types::FrameType;

/// Pixel layouts a frame target can declare.
///
/// Only planar 4:2:0 can be decoded into; the other layouts exist so that
/// callers holding other kinds of frames get a clean rejection.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    /// Planar Y, Cb, Cr with chroma halved in both directions.
    Yuv420p,

    /// Planar Y, Cb, Cr with chroma halved horizontally.
    Yuv422p,

    /// Planar Y, Cb, Cr at full resolution.
    Yuv444p,

    /// Packed 8-bit RGB.
    Rgb24,
}

/// A self-allocated planar 4:2:0 frame.
#[derive(Clone, Debug)]
pub struct YuvFrame {
    width: usize,
    height: usize,
    planes: [Vec<u8>; 3],
    strides: [usize; 3],
}

impl YuvFrame {
    /// Allocate a black frame with tightly packed rows.
    pub fn new(width: usize, height: usize) -> Self {
        let chroma_width = (width + 1) / 2;
        let chroma_height = (height + 1) / 2;

        Self {
            width,
            height,
            planes: [
                vec![0; width * height],
                vec![0; chroma_width * chroma_height],
                vec![0; chroma_width * chroma_height],
            ],
            strides: [width, chroma_width, chroma_width],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn luma(&self) -> &[u8] {
        &self.planes[0]
    }

    pub fn chroma_b(&self) -> &[u8] {
        &self.planes[1]
    }

    pub fn chroma_r(&self) -> &[u8] {
        &self.planes[2]
    }

    /// Row stride of a plane, in bytes.
    pub fn stride(&self, plane: usize) -> usize {
        self.strides.get(plane).copied().unwrap_or(0)
    }
}

impl FrameTarget for YuvFrame {
    fn pixel_format(&self) -> PixelFormat {
        PixelFormat::Yuv420p
    }

    fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn plane_count(&self) -> usize {
        self.planes.len()
    }

    fn plane_mut(&mut self, index: usize) -> Option<(&mut [u8], usize)> {
        let stride = *self.strides.get(index)?;
        let plane = self.planes.get_mut(index)?;

        Some((plane.as_mut_slice(), stride))
    }
}

/// What happened while decoding one picture.
#[derive(Debug)]
pub struct DecodedFrame {
    pub frame_type: FrameType,

    pub temporal_reference: u16,

    /// Macroblock addresses covered by the picture's slices, skipped
    /// macroblocks included.
    pub macroblocks_decoded: usize,

    /// Macroblocks in a complete picture of this sequence.
    pub macroblocks_expected: usize,

    /// The error that stopped macroblock decoding early, if any. The picture
    /// is still output, with whatever was decoded before the error.
    pub truncated_by: Option<Error>,
}

impl DecodedFrame {
    /// Whether every macroblock of the picture was decoded.
    pub fn is_complete(&self) -> bool {
        self.truncated_by.is_none() && self.macroblocks_decoded >= self.macroblocks_expected
    }
}
