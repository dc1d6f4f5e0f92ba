//! Traits

use crate::decoder::PixelFormat;
use num_traits::{CheckedShl, CheckedShr, One, Zero};
use std::cmp::Eq;
use std::ops::{BitAnd, BitOr, Not};

/// Integer types that bits can be read into.
pub trait BitReadable:
    Copy
    + CheckedShl
    + CheckedShr
    + BitOr<Self, Output = Self>
    + BitAnd<Self, Output = Self>
    + Not<Output = Self>
    + Eq
    + Zero
    + One
    + From<u8>
{
}

impl<T> BitReadable for T where
    T: Copy
        + CheckedShl
        + CheckedShr
        + BitOr<Self, Output = Self>
        + BitAnd<Self, Output = Self>
        + Not<Output = Self>
        + Eq
        + Zero
        + One
        + From<u8>
{
}

/// A caller-allocated frame that decoded pictures are written into.
///
/// The decoder never allocates or resizes the target. It only checks that the
/// declared format and dimensions match the stream and then writes rows of
/// samples through the plane accessors.
pub trait FrameTarget {
    /// The pixel layout of the frame.
    fn pixel_format(&self) -> PixelFormat;

    /// The frame size in luma samples.
    fn dimensions(&self) -> (usize, usize);

    /// Number of planes the frame carries.
    fn plane_count(&self) -> usize;

    /// Borrow one plane as a sample slice together with its stride in bytes.
    ///
    /// Plane 0 is luma, 1 is Cb and 2 is Cr.
    fn plane_mut(&mut self, index: usize) -> Option<(&mut [u8], usize)>;
}
