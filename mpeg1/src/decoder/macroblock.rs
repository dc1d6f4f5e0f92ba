//! Macroblock decoding

use crate::decoder::cpu::{
    dequantize_intra, dequantize_non_intra, inverse_rle, mv_decode, mv_raw, InverseDct,
};
use crate::decoder::picture::Picture;
use crate::decoder::types::DecoderOption;
use crate::error::{Error, Result};
use crate::parser::{
    decode_block, decode_intra_dc, decode_macroblock_end, decode_macroblock_header, BitReader,
    CodeTables,
};
use crate::types::{
    BlockKind, FrameType, MacroblockHeader, MotionVector, RunLevel, SliceHeader,
    DC_PREDICTOR_RESET,
};
use std::cmp::{max, min};
use std::io::Read;

/// Decoding state carried from one macroblock of a slice to the next.
#[derive(Clone, Debug)]
pub struct SliceCursor {
    /// The slice header, whose quantizer scale and DC predictors are updated
    /// as macroblocks are decoded.
    pub header: SliceHeader,

    /// Address of the previous macroblock. Starts one before the first
    /// macroblock of the slice's row.
    previous_address: isize,

    /// Whether no macroblock of this slice has been decoded yet.
    at_slice_start: bool,

    forward_predictor: MotionVector,
    backward_predictor: MotionVector,
}

impl SliceCursor {
    pub fn new(header: SliceHeader, mb_width: usize) -> Self {
        let previous_address = (header.row * mb_width) as isize - 1;

        Self {
            header,
            previous_address,
            at_slice_start: true,
            forward_predictor: MotionVector::zero(),
            backward_predictor: MotionVector::zero(),
        }
    }

    /// The address of the last decoded macroblock, if any.
    pub fn last_address(&self) -> Option<usize> {
        if self.at_slice_start {
            None
        } else {
            Some(self.previous_address as usize)
        }
    }

    pub fn reset_motion_predictors(&mut self) {
        self.forward_predictor = MotionVector::zero();
        self.backward_predictor = MotionVector::zero();
    }
}

/// Decodes macroblocks into a picture.
///
/// Holds everything that stays fixed for the macroblocks of a picture.
pub struct MacroblockDecoder<'a> {
    tables: &'a CodeTables,
    idct: &'a InverseDct,
    intra_quant_matrix: &'a [u8; 64],
    non_intra_quant_matrix: &'a [u8; 64],
    decoder_options: DecoderOption,

    /// Scratch space for one block's run-levels.
    run_levels: Vec<RunLevel>,
}

impl<'a> MacroblockDecoder<'a> {
    pub fn new(
        tables: &'a CodeTables,
        idct: &'a InverseDct,
        intra_quant_matrix: &'a [u8; 64],
        non_intra_quant_matrix: &'a [u8; 64],
        decoder_options: DecoderOption,
    ) -> Self {
        Self {
            tables,
            idct,
            intra_quant_matrix,
            non_intra_quant_matrix,
            decoder_options,
            run_levels: Vec::with_capacity(64),
        }
    }

    /// Record the macroblock's motion vectors in the picture.
    fn store_vectors(
        &self,
        picture: &mut Picture,
        cursor: &mut SliceCursor,
        header: &MacroblockHeader,
        address: usize,
    ) -> Result<()> {
        let frame_type = picture.as_header().frame_type;

        if !self
            .decoder_options
            .contains(DecoderOption::MOTION_VECTOR_RECONSTRUCTION)
        {
            let forward = header.forward.map(mv_raw).unwrap_or_default();
            let backward = header.backward.map(mv_raw).unwrap_or_default();

            return picture.set_vectors(address, forward, backward);
        }

        if header.is_intra() || (frame_type == FrameType::P && header.address_increment > 1) {
            cursor.reset_motion_predictors();
        }

        let forward = match (header.forward, picture.as_header().forward) {
            (Some(code), Some(range)) => mv_decode(code, range, &mut cursor.forward_predictor),
            _ => {
                if frame_type == FrameType::P {
                    cursor.forward_predictor = MotionVector::zero();
                }

                MotionVector::zero()
            }
        };

        let backward = match (header.backward, picture.as_header().backward) {
            (Some(code), Some(range)) => mv_decode(code, range, &mut cursor.backward_predictor),
            _ => MotionVector::zero(),
        };

        picture.set_vectors(address, forward, backward)
    }

    /// Decode one block and write its samples into the picture.
    fn decode_coded_block<R>(
        &mut self,
        reader: &mut BitReader<R>,
        picture: &mut Picture,
        cursor: &mut SliceCursor,
        header: &MacroblockHeader,
        address: usize,
        kind: BlockKind,
    ) -> Result<()>
    where
        R: Read,
    {
        let frame_type = picture.as_header().frame_type;
        let is_intra = header.is_intra();

        let dc = if is_intra {
            decode_intra_dc(reader, self.tables, kind)?
        } else {
            0
        };

        if frame_type == FrameType::D {
            return Ok(());
        }

        self.run_levels.clear();
        decode_block(reader, self.tables, !is_intra, &mut self.run_levels)?;

        let coefficients = if is_intra {
            let mut levels = inverse_rle(1, &self.run_levels)?;
            levels[0] = dc;

            let mut coefficients =
                dequantize_intra(&levels, self.intra_quant_matrix, header.quantizer_scale);

            if frame_type == FrameType::I {
                let predictor = &mut cursor.header.dc_predictors[kind.component()];
                coefficients[0] += *predictor;
                *predictor = coefficients[0];
            }

            coefficients
        } else {
            let levels = inverse_rle(0, &self.run_levels)?;

            dequantize_non_intra(&levels, self.non_intra_quant_matrix, header.quantizer_scale)
        };

        let samples = self.idct.inverse(&coefficients);
        let block = picture
            .block_mut(address, kind)
            .ok_or(Error::InvalidData("macroblock address out of range"))?;

        for (target, sample) in block.iter_mut().zip(samples.iter()) {
            *target = min(255, max(0, *sample)) as u8;
        }

        Ok(())
    }

    /// Attempts to decode the next macroblock of a slice into `picture`.
    ///
    /// Yields the number of macroblock addresses the macroblock moved the
    /// slice forward by, which counts skipped macroblocks but not the gap
    /// before the first macroblock of a slice.
    pub fn decode<R>(
        &mut self,
        reader: &mut BitReader<R>,
        picture: &mut Picture,
        cursor: &mut SliceCursor,
    ) -> Result<usize>
    where
        R: Read,
    {
        let header = decode_macroblock_header(
            reader,
            self.tables,
            picture.as_header(),
            &mut cursor.header,
        )?;

        let address = cursor.previous_address + header.address_increment as isize;
        if address < 0 || address as usize >= picture.mb_count() {
            return Err(Error::InvalidData("macroblock address out of range"));
        }
        let address = address as usize;

        if header.address_increment != 1 {
            cursor.header.reset_dc_predictors(DC_PREDICTOR_RESET);
        }

        self.store_vectors(picture, cursor, &header, address)?;

        for (index, kind) in BlockKind::ALL.iter().enumerate() {
            if header.codes_block(index) {
                self.decode_coded_block(reader, picture, cursor, &header, address, *kind)?;
            }
        }

        if picture.as_header().frame_type == FrameType::D {
            decode_macroblock_end(reader)?;
        }

        let covered = if cursor.at_slice_start {
            1
        } else {
            header.address_increment
        };

        cursor.previous_address = address as isize;
        cursor.at_slice_start = false;

        Ok(covered)
    }
}
