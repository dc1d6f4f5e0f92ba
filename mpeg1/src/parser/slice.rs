//! Slice header

use crate::error::{Error, Result};
use crate::parser::picture::decode_extra_information;
use crate::parser::reader::BitReader;
use crate::types::{is_slice_start_code, SliceHeader};
use log::trace;
use std::io::Read;

/// Attempts to read a slice header from the bitstream.
///
/// The reader must be positioned at a slice start code, whose low byte
/// carries the macroblock row plus one. The returned slice starts out with
/// every DC predictor at zero.
pub fn decode_slice_header<R>(reader: &mut BitReader<R>) -> Result<SliceHeader>
where
    R: Read,
{
    let start_code: u32 = reader.read_bits(32)?;
    if !is_slice_start_code(start_code) {
        return Err(Error::InvalidData("expected a slice start code"));
    }

    let row = (start_code & 0xFF) as usize - 1;
    let quantizer_scale = reader.read_bits(5)?;
    let extra = decode_extra_information(reader)?;

    trace!("slice at row {} with quantizer {}", row, quantizer_scale);

    Ok(SliceHeader {
        row,
        quantizer_scale,
        dc_predictors: [0; 3],
        extra,
    })
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::parser::reader::BitReader;
    use crate::parser::slice::decode_slice_header;

    #[test]
    #[allow(clippy::inconsistent_digit_grouping)]
    fn slice_row_and_quantizer() {
        let bit_pattern = vec![0x00, 0x00, 0x01, 0x0F, 0b01000_0_11];
        let mut reader = BitReader::from_bytes(&bit_pattern[..]);
        let slice = decode_slice_header(&mut reader).unwrap();

        assert_eq!(14, slice.row);
        assert_eq!(8, slice.quantizer_scale);
        assert_eq!([0, 0, 0], slice.dc_predictors);
        assert!(slice.extra.is_empty());

        // the first macroblock starts right after the terminating flag
        assert_eq!(2, reader.remaining_bits());
    }

    #[test]
    #[allow(clippy::inconsistent_digit_grouping)]
    fn slice_extra_information() {
        let bit_pattern = vec![0x00, 0x00, 0x01, 0x01, 0b00001_1_11, 0b1111_11_0_0];
        let mut reader = BitReader::from_bytes(&bit_pattern[..]);
        let slice = decode_slice_header(&mut reader).unwrap();

        assert_eq!(0, slice.row);
        assert_eq!(1, slice.quantizer_scale);
        assert_eq!(vec![0xFF], slice.extra);
        assert_eq!(1, reader.remaining_bits());
    }

    #[test]
    fn not_a_slice() {
        let bit_pattern = vec![0x00, 0x00, 0x01, 0xB0, 0x00];
        let mut reader = BitReader::from_bytes(&bit_pattern[..]);

        assert!(matches!(
            decode_slice_header(&mut reader).unwrap_err(),
            Error::InvalidData(_)
        ));
    }
}
