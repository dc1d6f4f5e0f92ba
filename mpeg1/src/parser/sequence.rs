//! Sequence-layer decoder

use crate::decoder::{DecoderOption, ZIGZAG};
use crate::error::{Error, Result};
use crate::parser::reader::BitReader;
use crate::types::{Ratio, SequenceHeader, SEQUENCE_HEADER_CODE};
use log::{debug, warn};
use std::io::Read;

/// ISO/IEC 11172-2 2.4.3.2 `pel_aspect_ratio`, in ten-thousandths.
///
/// Codes 0 and 15 are forbidden and reserved, respectively.
const PEL_ASPECT_RATIO: [u32; 16] = [
    0, 10000, 6735, 7031, 7615, 8055, 8437, 8935, 9157, 9815, 10255, 10695, 10950, 11575, 12015, 0,
];

/// ISO/IEC 11172-2 2.4.3.2 `picture_rate`, as numerator and denominator.
const PICTURE_RATE: [(u32, u32); 16] = [
    (0, 0),
    (24000, 1001),
    (24, 1),
    (25, 1),
    (30000, 1001),
    (30, 1),
    (50, 1),
    (60000, 1001),
    (60, 1),
    (0, 0),
    (0, 0),
    (0, 0),
    (0, 0),
    (0, 0),
    (0, 0),
    (0, 0),
];

/// Look up a pel aspect ratio code.
pub fn aspect_ratio_from_code(code: u8) -> Ratio {
    Ratio::reduced(PEL_ASPECT_RATIO[(code & 0xF) as usize], 10000)
}

/// Look up a picture rate code.
pub fn frame_rate_from_code(code: u8) -> Ratio {
    let (num, den) = PICTURE_RATE[(code & 0xF) as usize];
    Ratio::reduced(num, den)
}

/// Read a quantizer matrix, which is sent in zig-zag order, into natural
/// order.
fn decode_quant_matrix<R>(reader: &mut BitReader<R>) -> Result<[u8; 64]>
where
    R: Read,
{
    let mut matrix = [0; 64];

    for &position in ZIGZAG.iter() {
        let value = reader.read_u8()?;
        if value == 0 {
            return Err(Error::InvalidData("zero quantizer matrix entry"));
        }

        matrix[position] = value;
    }

    Ok(matrix)
}

/// Read the matrix that follows a quantizer matrix flag, if the decoder was
/// configured to load it.
///
/// Without `DecoderOption::LOAD_QUANT_MATRICES` the matrix bits are left in
/// the stream and will be misread as the fields that follow them.
fn decode_optional_quant_matrix<R>(
    reader: &mut BitReader<R>,
    decoder_options: DecoderOption,
    present: bool,
    which: &str,
) -> Result<Option<[u8; 64]>>
where
    R: Read,
{
    if !present {
        return Ok(None);
    }

    if decoder_options.contains(DecoderOption::LOAD_QUANT_MATRICES) {
        Ok(Some(decode_quant_matrix(reader)?))
    } else {
        warn!(
            "stream carries a custom {} quantizer matrix but matrix loading is disabled",
            which
        );
        Ok(None)
    }
}

/// Attempts to read a sequence header from the bitstream.
///
/// The reader must be positioned at the sequence header start code.
pub fn decode_sequence_header<R>(
    reader: &mut BitReader<R>,
    decoder_options: DecoderOption,
) -> Result<SequenceHeader>
where
    R: Read,
{
    let start_code: u32 = reader.read_bits(32)?;
    if start_code != SEQUENCE_HEADER_CODE {
        return Err(Error::InvalidData("expected a sequence header"));
    }

    let width: u16 = reader.read_bits(12)?;
    let height: u16 = reader.read_bits(12)?;
    if width == 0 || height == 0 {
        return Err(Error::InvalidData("zero picture size"));
    }

    let aspect_ratio_code: u8 = reader.read_bits(4)?;
    let frame_rate_code: u8 = reader.read_bits(4)?;
    let bit_rate = reader.read_bits::<u32>(18)? * 400;
    reader.skip_bits(1)?; //marker
    let vbv_buffer_size: u16 = reader.read_bits(10)?;
    let constrained_parameters = reader.read_flag()?;

    let has_intra_quant_matrix = reader.read_flag()?;
    let intra_quant_matrix =
        decode_optional_quant_matrix(reader, decoder_options, has_intra_quant_matrix, "intra")?;

    let has_non_intra_quant_matrix = reader.read_flag()?;
    let non_intra_quant_matrix = decode_optional_quant_matrix(
        reader,
        decoder_options,
        has_non_intra_quant_matrix,
        "non-intra",
    )?;

    let header = SequenceHeader {
        width,
        height,
        mb_width: (width as usize + 15) / 16,
        mb_height: (height as usize + 15) / 16,
        aspect_ratio_code,
        aspect_ratio: aspect_ratio_from_code(aspect_ratio_code),
        frame_rate_code,
        frame_rate: frame_rate_from_code(frame_rate_code),
        bit_rate,
        vbv_buffer_size,
        constrained_parameters,
        has_intra_quant_matrix,
        has_non_intra_quant_matrix,
        intra_quant_matrix,
        non_intra_quant_matrix,
    };

    debug!(
        "sequence {}x{} ({}x{} macroblocks) at {:.3} fps, {} bit/s",
        header.width,
        header.height,
        header.mb_width,
        header.mb_height,
        header.frames_per_second(),
        header.bit_rate
    );

    Ok(header)
}
