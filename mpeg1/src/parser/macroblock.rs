//! Macroblock header parsing

use crate::error::{Error, Result};
use crate::parser::reader::BitReader;
use crate::parser::vlc::{code, CodeTables, PrefixCode};
use crate::types::{
    FrameType, MacroblockFlags, MacroblockHeader, MotionCode, MotionVectorCode, MotionVectorRange,
    PictureHeader, SliceHeader,
};
use log::trace;
use std::io::Read;

/// ISO/IEC 11172-2 Table B.1, `macroblock_address_increment`.
///
/// Stuffing and escape are not part of the tree; they are recognized by
/// peeking before the increment is decoded.
pub const MACROBLOCK_ADDRESS_INCREMENT: &[PrefixCode<u8>] = &[
    code(0b1, 1, 1),
    code(0b011, 3, 2),
    code(0b010, 3, 3),
    code(0b0011, 4, 4),
    code(0b0010, 4, 5),
    code(0b0001_1, 5, 6),
    code(0b0001_0, 5, 7),
    code(0b0000_111, 7, 8),
    code(0b0000_110, 7, 9),
    code(0b0000_1011, 8, 10),
    code(0b0000_1010, 8, 11),
    code(0b0000_1001, 8, 12),
    code(0b0000_1000, 8, 13),
    code(0b0000_0111, 8, 14),
    code(0b0000_0110, 8, 15),
    code(0b0000_0101_11, 10, 16),
    code(0b0000_0101_10, 10, 17),
    code(0b0000_0101_01, 10, 18),
    code(0b0000_0101_00, 10, 19),
    code(0b0000_0100_11, 10, 20),
    code(0b0000_0100_10, 10, 21),
    code(0b0000_0100_011, 11, 22),
    code(0b0000_0100_010, 11, 23),
    code(0b0000_0100_001, 11, 24),
    code(0b0000_0100_000, 11, 25),
    code(0b0000_0011_111, 11, 26),
    code(0b0000_0011_110, 11, 27),
    code(0b0000_0011_101, 11, 28),
    code(0b0000_0011_100, 11, 29),
    code(0b0000_0011_011, 11, 30),
    code(0b0000_0011_010, 11, 31),
    code(0b0000_0011_001, 11, 32),
    code(0b0000_0011_000, 11, 33),
];

/// Bits an encoder may insert before a macroblock to pad out the bit rate.
const MACROBLOCK_STUFFING: u16 = 0b0000_0001_111;

/// Adds 33 to the following address increment.
const MACROBLOCK_ESCAPE: u16 = 0b0000_0001_000;

/// ISO/IEC 11172-2 Table B.2a, `macroblock_type` in I pictures.
pub const MACROBLOCK_TYPE_I: &[PrefixCode<u8>] = &[code(0b1, 1, 0x10), code(0b01, 2, 0x11)];

/// ISO/IEC 11172-2 Table B.2b, `macroblock_type` in P pictures.
pub const MACROBLOCK_TYPE_P: &[PrefixCode<u8>] = &[
    code(0b1, 1, 0x0A),
    code(0b01, 2, 0x08),
    code(0b001, 3, 0x02),
    code(0b0001_1, 5, 0x10),
    code(0b0001_0, 5, 0x0B),
    code(0b0000_1, 5, 0x09),
    code(0b0000_01, 6, 0x11),
];

/// ISO/IEC 11172-2 Table B.2c, `macroblock_type` in B pictures.
pub const MACROBLOCK_TYPE_B: &[PrefixCode<u8>] = &[
    code(0b10, 2, 0x06),
    code(0b11, 2, 0x0E),
    code(0b010, 3, 0x04),
    code(0b011, 3, 0x0C),
    code(0b0010, 4, 0x02),
    code(0b0011, 4, 0x0A),
    code(0b0001_1, 5, 0x10),
    code(0b0001_0, 5, 0x0F),
    code(0b0000_11, 6, 0x0B),
    code(0b0000_10, 6, 0x0D),
    code(0b0000_01, 6, 0x11),
];

/// ISO/IEC 11172-2 Table B.2d, `macroblock_type` in D pictures.
pub const MACROBLOCK_TYPE_D: &[PrefixCode<u8>] = &[code(0b1, 1, 0x10)];

/// ISO/IEC 11172-2 Table B.3, `coded_block_pattern`.
pub const CODED_BLOCK_PATTERN: &[PrefixCode<u8>] = &[
    code(0b111, 3, 60),
    code(0b1101, 4, 4),
    code(0b1100, 4, 8),
    code(0b1011, 4, 16),
    code(0b1010, 4, 32),
    code(0b1001_1, 5, 12),
    code(0b1001_0, 5, 48),
    code(0b1000_1, 5, 20),
    code(0b1000_0, 5, 40),
    code(0b0111_1, 5, 28),
    code(0b0111_0, 5, 44),
    code(0b0110_1, 5, 52),
    code(0b0110_0, 5, 56),
    code(0b0101_1, 5, 1),
    code(0b0101_0, 5, 61),
    code(0b0100_1, 5, 2),
    code(0b0100_0, 5, 62),
    code(0b0011_11, 6, 24),
    code(0b0011_10, 6, 36),
    code(0b0011_01, 6, 3),
    code(0b0011_00, 6, 63),
    code(0b0010_111, 7, 5),
    code(0b0010_110, 7, 9),
    code(0b0010_101, 7, 17),
    code(0b0010_100, 7, 33),
    code(0b0010_011, 7, 6),
    code(0b0010_010, 7, 10),
    code(0b0010_001, 7, 18),
    code(0b0010_000, 7, 34),
    code(0b0001_1111, 8, 7),
    code(0b0001_1110, 8, 11),
    code(0b0001_1101, 8, 19),
    code(0b0001_1100, 8, 35),
    code(0b0001_1011, 8, 13),
    code(0b0001_1010, 8, 49),
    code(0b0001_1001, 8, 21),
    code(0b0001_1000, 8, 41),
    code(0b0001_0111, 8, 14),
    code(0b0001_0110, 8, 50),
    code(0b0001_0101, 8, 22),
    code(0b0001_0100, 8, 42),
    code(0b0001_0011, 8, 15),
    code(0b0001_0010, 8, 51),
    code(0b0001_0001, 8, 23),
    code(0b0001_0000, 8, 43),
    code(0b0000_1111, 8, 25),
    code(0b0000_1110, 8, 37),
    code(0b0000_1101, 8, 26),
    code(0b0000_1100, 8, 38),
    code(0b0000_1011, 8, 29),
    code(0b0000_1010, 8, 45),
    code(0b0000_1001, 8, 53),
    code(0b0000_1000, 8, 57),
    code(0b0000_0111, 8, 30),
    code(0b0000_0110, 8, 46),
    code(0b0000_0101, 8, 54),
    code(0b0000_0100, 8, 58),
    code(0b0000_0011_1, 9, 31),
    code(0b0000_0011_0, 9, 47),
    code(0b0000_0010_1, 9, 55),
    code(0b0000_0010_0, 9, 59),
    code(0b0000_0001_1, 9, 27),
    code(0b0000_0001_0, 9, 39),
];

/// ISO/IEC 11172-2 Table B.4, `motion_horizontal_code` and
/// `motion_vertical_code`.
pub const MOTION_CODE: &[PrefixCode<i8>] = &[
    code(0b1, 1, 0),
    code(0b010, 3, 1),
    code(0b011, 3, -1),
    code(0b0010, 4, 2),
    code(0b0011, 4, -2),
    code(0b0001_0, 5, 3),
    code(0b0001_1, 5, -3),
    code(0b0000_110, 7, 4),
    code(0b0000_111, 7, -4),
    code(0b0000_1010, 8, 5),
    code(0b0000_1011, 8, -5),
    code(0b0000_1000, 8, 6),
    code(0b0000_1001, 8, -6),
    code(0b0000_0110, 8, 7),
    code(0b0000_0111, 8, -7),
    code(0b0000_0101_10, 10, 8),
    code(0b0000_0101_11, 10, -8),
    code(0b0000_0101_00, 10, 9),
    code(0b0000_0101_01, 10, -9),
    code(0b0000_0100_10, 10, 10),
    code(0b0000_0100_11, 10, -10),
    code(0b0000_0100_010, 11, 11),
    code(0b0000_0100_011, 11, -11),
    code(0b0000_0100_000, 11, 12),
    code(0b0000_0100_001, 11, -12),
    code(0b0000_0011_110, 11, 13),
    code(0b0000_0011_111, 11, -13),
    code(0b0000_0011_100, 11, 14),
    code(0b0000_0011_101, 11, -14),
    code(0b0000_0011_010, 11, 15),
    code(0b0000_0011_011, 11, -15),
    code(0b0000_0011_000, 11, 16),
    code(0b0000_0011_001, 11, -16),
];

/// Decode a macroblock address increment, including any leading stuffing
/// and escapes.
fn decode_address_increment<R>(reader: &mut BitReader<R>, tables: &CodeTables) -> Result<usize>
where
    R: Read,
{
    let mut escapes = 0;

    loop {
        match reader.peek_bits::<u16>(11)? {
            MACROBLOCK_STUFFING => reader.skip_bits(11)?,
            MACROBLOCK_ESCAPE => {
                reader.skip_bits(11)?;
                escapes += 1;
            }
            _ => break,
        }
    }

    let (increment, _) = tables.address_increment.decode_one(reader)?;

    Ok(increment as usize + 33 * escapes)
}

/// Decode one component of a motion vector.
fn decode_motion_code<R>(
    reader: &mut BitReader<R>,
    tables: &CodeTables,
    range: MotionVectorRange,
) -> Result<MotionCode>
where
    R: Read,
{
    let (code, _) = tables.motion_code.decode_one(reader)?;
    let residual = if range.f_code != 1 && code != 0 {
        reader.read_bits(range.r_size())?
    } else {
        0
    };

    Ok(MotionCode { code, residual })
}

/// Decode a horizontal and vertical motion code pair.
fn decode_motion_vector<R>(
    reader: &mut BitReader<R>,
    tables: &CodeTables,
    range: Option<MotionVectorRange>,
) -> Result<MotionVectorCode>
where
    R: Read,
{
    let range = range.ok_or(Error::InvalidData("motion vector without f_code"))?;
    if range.f_code == 0 {
        return Err(Error::InvalidData("forbidden f_code"));
    }

    let horizontal = decode_motion_code(reader, tables, range)?;
    let vertical = decode_motion_code(reader, tables, range)?;

    Ok(MotionVectorCode {
        horizontal,
        vertical,
    })
}

/// Attempts to read a macroblock header from the bitstream.
///
/// Everything up to, but not including, the first block is consumed. If the
/// macroblock overrides the quantizer scale, the new scale is also written
/// back to `slice` so that it stays in force for later macroblocks.
pub fn decode_macroblock_header<R>(
    reader: &mut BitReader<R>,
    tables: &CodeTables,
    picture: &PictureHeader,
    slice: &mut SliceHeader,
) -> Result<MacroblockHeader>
where
    R: Read,
{
    let address_increment = decode_address_increment(reader, tables)?;

    let (mb_type, _) = tables
        .macroblock_type(picture.frame_type)
        .decode_one(reader)?;
    let flags = MacroblockFlags::from_bits_truncate(mb_type);

    if picture.frame_type == FrameType::I && address_increment != 1 {
        return Err(Error::InvalidData("skipped macroblock in I picture"));
    }

    if flags.contains(MacroblockFlags::QUANT) {
        slice.quantizer_scale = reader.read_bits(5)?;
    }

    let forward = if flags.contains(MacroblockFlags::MOTION_FORWARD) {
        Some(decode_motion_vector(reader, tables, picture.forward)?)
    } else {
        None
    };

    let backward = if flags.contains(MacroblockFlags::MOTION_BACKWARD) {
        Some(decode_motion_vector(reader, tables, picture.backward)?)
    } else {
        None
    };

    let coded_block_pattern = if flags.contains(MacroblockFlags::PATTERN) {
        tables.coded_block_pattern.decode_one(reader)?.0
    } else if flags.contains(MacroblockFlags::INTRA) {
        0x3F
    } else {
        0
    };

    trace!(
        "macroblock +{} {:?} cbp {:06b} q {}",
        address_increment,
        flags,
        coded_block_pattern,
        slice.quantizer_scale
    );

    Ok(MacroblockHeader {
        address_increment,
        flags,
        quantizer_scale: slice.quantizer_scale,
        coded_block_pattern,
        forward,
        backward,
    })
}

/// Read the `end_of_macroblock` bit that closes every D picture macroblock.
pub fn decode_macroblock_end<R>(reader: &mut BitReader<R>) -> Result<()>
where
    R: Read,
{
    if reader.read_flag()? {
        Ok(())
    } else {
        Err(Error::InvalidData("missing end of macroblock marker"))
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::parser::macroblock::{
        decode_address_increment, decode_macroblock_end, decode_macroblock_header,
    };
    use crate::parser::reader::BitReader;
    use crate::parser::vlc::CodeTables;
    use crate::types::{
        FrameType, MacroblockFlags, MotionCode, MotionVectorCode, MotionVectorRange,
        PictureHeader, SliceHeader,
    };

    fn picture(frame_type: FrameType, f_code: u8) -> PictureHeader {
        let range = MotionVectorRange {
            full_pel: false,
            f_code,
        };

        PictureHeader {
            temporal_reference: 0,
            frame_type,
            vbv_delay: 0xFFFF,
            forward: if frame_type.is_predicted() {
                Some(range)
            } else {
                None
            },
            backward: if frame_type == FrameType::B {
                Some(range)
            } else {
                None
            },
            extra: Vec::new(),
        }
    }

    fn slice(quantizer_scale: u8) -> SliceHeader {
        SliceHeader {
            row: 0,
            quantizer_scale,
            dc_predictors: [0; 3],
            extra: Vec::new(),
        }
    }

    #[test]
    #[allow(clippy::inconsistent_digit_grouping)]
    fn address_increment_with_stuffing_and_escape() {
        let tables = CodeTables::new().unwrap();
        let bit_pattern = vec![
            0b0000_0001,
            0b1110_0000,
            0b0010_0001,
            0b1100_0000,
            0b1100_0000,
        ];
        let mut reader = BitReader::from_bytes(&bit_pattern[..]);

        assert_eq!(35, decode_address_increment(&mut reader, &tables).unwrap());
        assert_eq!(1, decode_address_increment(&mut reader, &tables).unwrap());
        assert_eq!(33, decode_address_increment(&mut reader, &tables).unwrap());
    }

    #[test]
    #[allow(clippy::inconsistent_digit_grouping)]
    fn predicted_macroblock_header() {
        let tables = CodeTables::new().unwrap();
        let bit_pattern = vec![0b1101_0111, 0b1100_0000];
        let mut reader = BitReader::from_bytes(&bit_pattern[..]);
        let mut slice = slice(4);

        let header =
            decode_macroblock_header(&mut reader, &tables, &picture(FrameType::P, 2), &mut slice)
                .unwrap();

        assert_eq!(1, header.address_increment);
        assert_eq!(
            MacroblockFlags::PATTERN | MacroblockFlags::MOTION_FORWARD,
            header.flags
        );
        assert_eq!(
            Some(MotionVectorCode {
                horizontal: MotionCode {
                    code: 1,
                    residual: 1
                },
                vertical: MotionCode {
                    code: 0,
                    residual: 0
                },
            }),
            header.forward
        );
        assert_eq!(None, header.backward);
        assert_eq!(60, header.coded_block_pattern);
        assert_eq!(4, header.quantizer_scale);
        assert_eq!(6, reader.remaining_bits());
    }

    #[test]
    #[allow(clippy::inconsistent_digit_grouping)]
    fn intra_macroblock_quantizer_and_skips() {
        let tables = CodeTables::new().unwrap();
        let bit_pattern = vec![0b1010_0111, 0b0111_0000, 0b0000_0000];
        let mut reader = BitReader::from_bytes(&bit_pattern[..]);
        let picture = picture(FrameType::I, 0);
        let mut slice = slice(4);

        let header = decode_macroblock_header(&mut reader, &tables, &picture, &mut slice).unwrap();

        assert!(header.is_intra());
        assert!(header.flags.contains(MacroblockFlags::QUANT));
        assert_eq!(7, header.quantizer_scale);
        assert_eq!(7, slice.quantizer_scale);
        assert_eq!(0x3F, header.coded_block_pattern);

        assert!(matches!(
            decode_macroblock_header(&mut reader, &tables, &picture, &mut slice).unwrap_err(),
            Error::InvalidData(_)
        ));
    }

    #[test]
    fn macroblock_end_marker() {
        let bit_pattern = vec![0b1000_0000];
        let mut reader = BitReader::from_bytes(&bit_pattern[..]);

        decode_macroblock_end(&mut reader).unwrap();
        assert!(matches!(
            decode_macroblock_end(&mut reader).unwrap_err(),
            Error::InvalidData(_)
        ));
    }

    #[test]
    fn motion_code_table() {
        let tables = CodeTables::new().unwrap();
        let bit_pattern = vec![0b0000_0011, 0b0010_0011, 0b1000_0000];
        let mut reader = BitReader::from_bytes(&bit_pattern[..]);

        assert_eq!(-16, tables.motion_code.decode_one(&mut reader).unwrap().0);
        assert_eq!(-3, tables.motion_code.decode_one(&mut reader).unwrap().0);
        assert_eq!(0, tables.motion_code.decode_one(&mut reader).unwrap().0);
    }
}
