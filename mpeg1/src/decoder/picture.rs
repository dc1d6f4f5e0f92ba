//! Decoded picture type

use crate::error::{Error, Result};
use crate::types::{BlockKind, MotionVector, PictureHeader, SequenceHeader};

/// Number of luma samples in a macroblock.
pub const LUMA_SAMPLES_PER_MACROBLOCK: usize = 256;

/// Number of samples in each chroma block of a macroblock.
pub const CHROMA_SAMPLES_PER_MACROBLOCK: usize = 64;

fn zeroed_plane(samples: usize) -> Result<Vec<u8>> {
    let mut plane = Vec::new();
    plane
        .try_reserve_exact(samples)
        .map_err(|_| Error::OutOfMemory)?;
    plane.resize(samples, 0);

    Ok(plane)
}

/// A decoded picture.
///
/// Samples are stored tiled by macroblock: each macroblock owns four
/// consecutive 8x8 luma blocks (top left, top right, bottom left, bottom
/// right) and one 8x8 block in each chroma plane, in macroblock address
/// order. Blocks are row-major.
#[derive(Clone, Debug)]
pub struct Picture {
    /// The header of the picture that was decoded.
    header: PictureHeader,

    /// Size of the picture in samples.
    width: u16,
    height: u16,

    /// Size of the picture in macroblocks.
    mb_width: usize,
    mb_height: usize,

    luma: Vec<u8>,
    chroma_b: Vec<u8>,
    chroma_r: Vec<u8>,

    /// Per-macroblock forward and backward vectors. Uncoded or skipped
    /// macroblocks keep a zero vector.
    forward_vectors: Vec<MotionVector>,
    backward_vectors: Vec<MotionVector>,
}

impl Picture {
    /// Allocate a black picture sized for a given sequence.
    pub fn new(sequence: &SequenceHeader, header: PictureHeader) -> Result<Self> {
        let mb_count = sequence.mb_count();

        let mut forward_vectors = Vec::new();
        forward_vectors
            .try_reserve_exact(mb_count)
            .map_err(|_| Error::OutOfMemory)?;
        forward_vectors.resize(mb_count, MotionVector::zero());
        let backward_vectors = forward_vectors.clone();

        Ok(Self {
            header,
            width: sequence.width,
            height: sequence.height,
            mb_width: sequence.mb_width,
            mb_height: sequence.mb_height,
            luma: zeroed_plane(mb_count * LUMA_SAMPLES_PER_MACROBLOCK)?,
            chroma_b: zeroed_plane(mb_count * CHROMA_SAMPLES_PER_MACROBLOCK)?,
            chroma_r: zeroed_plane(mb_count * CHROMA_SAMPLES_PER_MACROBLOCK)?,
            forward_vectors,
            backward_vectors,
        })
    }

    /// Get the header this picture was decoded with.
    pub fn as_header(&self) -> &PictureHeader {
        &self.header
    }

    /// The picture size in luma samples.
    pub fn dimensions(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    pub fn mb_width(&self) -> usize {
        self.mb_width
    }

    pub fn mb_height(&self) -> usize {
        self.mb_height
    }

    pub fn mb_count(&self) -> usize {
        self.mb_width * self.mb_height
    }

    /// Get the tiled luma data for this picture.
    pub fn as_luma(&self) -> &[u8] {
        &self.luma
    }

    /// Get the tiled chroma-B data for this picture.
    pub fn as_chroma_b(&self) -> &[u8] {
        &self.chroma_b
    }

    /// Get the tiled chroma-R data for this picture.
    pub fn as_chroma_r(&self) -> &[u8] {
        &self.chroma_r
    }

    /// All three tiled planes, mutably.
    pub fn planes_mut(&mut self) -> [&mut [u8]; 3] {
        [
            self.luma.as_mut_slice(),
            self.chroma_b.as_mut_slice(),
            self.chroma_r.as_mut_slice(),
        ]
    }

    fn block_range(mb_index: usize, kind: BlockKind) -> std::ops::Range<usize> {
        let start = match kind {
            BlockKind::Luma(n) => mb_index * LUMA_SAMPLES_PER_MACROBLOCK + n as usize * 64,
            BlockKind::ChromaB | BlockKind::ChromaR => mb_index * CHROMA_SAMPLES_PER_MACROBLOCK,
        };

        start..start + 64
    }

    fn plane_of(&self, kind: BlockKind) -> &[u8] {
        match kind {
            BlockKind::Luma(_) => &self.luma,
            BlockKind::ChromaB => &self.chroma_b,
            BlockKind::ChromaR => &self.chroma_r,
        }
    }

    /// The 64 samples of one block of a macroblock.
    ///
    /// Yields `None` if the macroblock does not exist in this picture.
    pub fn block(&self, mb_index: usize, kind: BlockKind) -> Option<&[u8]> {
        self.plane_of(kind).get(Self::block_range(mb_index, kind))
    }

    /// The 64 samples of one block of a macroblock, mutably.
    pub fn block_mut(&mut self, mb_index: usize, kind: BlockKind) -> Option<&mut [u8]> {
        let range = Self::block_range(mb_index, kind);
        let plane = match kind {
            BlockKind::Luma(_) => &mut self.luma,
            BlockKind::ChromaB => &mut self.chroma_b,
            BlockKind::ChromaR => &mut self.chroma_r,
        };

        plane.get_mut(range)
    }

    /// Read a luma sample by its position in the picture.
    pub fn luma_at(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.mb_width * 16 || y >= self.mb_height * 16 {
            return None;
        }

        let mb_index = (y / 16) * self.mb_width + x / 16;
        let block = ((y % 16) / 8) * 2 + (x % 16) / 8;

        self.block(mb_index, BlockKind::Luma(block as u8))
            .map(|b| b[(y % 8) * 8 + x % 8])
    }

    pub fn forward_vectors(&self) -> &[MotionVector] {
        &self.forward_vectors
    }

    pub fn backward_vectors(&self) -> &[MotionVector] {
        &self.backward_vectors
    }

    /// Record the vectors a macroblock was coded with.
    pub fn set_vectors(
        &mut self,
        mb_index: usize,
        forward: MotionVector,
        backward: MotionVector,
    ) -> Result<()> {
        match (
            self.forward_vectors.get_mut(mb_index),
            self.backward_vectors.get_mut(mb_index),
        ) {
            (Some(f), Some(b)) => {
                *f = forward;
                *b = backward;
                Ok(())
            }
            _ => Err(Error::InvalidArgument),
        }
    }
}
