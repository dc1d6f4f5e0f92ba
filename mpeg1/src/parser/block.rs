//! Block layer parsing

use crate::error::{Error, Result};
use crate::parser::reader::BitReader;
use crate::parser::vlc::{code, CodeTables, PrefixCode};
use crate::types::{BlockKind, RunLevel};
use std::io::Read;

/// ISO/IEC 11172-2 Table B.5a, `dct_dc_size_luminance`.
pub const DCT_DC_SIZE_LUMA: &[PrefixCode<u8>] = &[
    code(0b100, 3, 0),
    code(0b00, 2, 1),
    code(0b01, 2, 2),
    code(0b101, 3, 3),
    code(0b110, 3, 4),
    code(0b1110, 4, 5),
    code(0b1111_0, 5, 6),
    code(0b1111_10, 6, 7),
    code(0b1111_110, 7, 8),
];

/// ISO/IEC 11172-2 Table B.5b, `dct_dc_size_chrominance`.
pub const DCT_DC_SIZE_CHROMA: &[PrefixCode<u8>] = &[
    code(0b00, 2, 0),
    code(0b01, 2, 1),
    code(0b10, 2, 2),
    code(0b110, 3, 3),
    code(0b1110, 4, 4),
    code(0b1111_0, 5, 5),
    code(0b1111_10, 6, 6),
    code(0b1111_110, 7, 7),
    code(0b1111_1110, 8, 8),
];

/// A symbol of the transform coefficient table.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CoefficientCode {
    /// A run and level coded with fixed-length fields follow.
    Escape,

    /// A run and level coded by the table.
    RunLevel(RunLevel),
}

/// The end-of-block code. It is not in the coefficient tree because the
/// first coefficient of a non-intra block reuses its bits.
const END_OF_BLOCK: u8 = 0b10;

/// The escape code of the coefficient table.
const ESCAPE: u32 = 0b0000_01;

/// ISO/IEC 11172-2 Table B.5c, `dct_coeff_first` and `dct_coeff_next`.
///
/// Each row is `(code, length, run, level)` without the trailing sign bit.
/// The first row's one-bit-shorter variant for the first coefficient is not
/// listed; the coefficient parser handles it directly.
const RUN_LEVEL: [(u32, u32, u8, u8); 111] = [
    (0b11, 2, 0, 1),
    (0b011, 3, 1, 1),
    (0b0100, 4, 0, 2),
    (0b0101, 4, 2, 1),
    (0b0010_1, 5, 0, 3),
    (0b0011_1, 5, 3, 1),
    (0b0011_0, 5, 4, 1),
    (0b0001_10, 6, 1, 2),
    (0b0001_11, 6, 5, 1),
    (0b0001_01, 6, 6, 1),
    (0b0001_00, 6, 7, 1),
    (0b0000_110, 7, 0, 4),
    (0b0000_100, 7, 2, 2),
    (0b0000_111, 7, 8, 1),
    (0b0000_101, 7, 9, 1),
    (0b0010_0110, 8, 0, 5),
    (0b0010_0001, 8, 0, 6),
    (0b0010_0101, 8, 1, 3),
    (0b0010_0100, 8, 3, 2),
    (0b0010_0111, 8, 10, 1),
    (0b0010_0011, 8, 11, 1),
    (0b0010_0010, 8, 12, 1),
    (0b0010_0000, 8, 13, 1),
    (0b0000_0010_10, 10, 0, 7),
    (0b0000_0011_00, 10, 1, 4),
    (0b0000_0010_11, 10, 2, 3),
    (0b0000_0011_11, 10, 4, 2),
    (0b0000_0010_01, 10, 5, 2),
    (0b0000_0011_10, 10, 14, 1),
    (0b0000_0011_01, 10, 15, 1),
    (0b0000_0010_00, 10, 16, 1),
    (0b0000_0001_1101, 12, 0, 8),
    (0b0000_0001_1000, 12, 0, 9),
    (0b0000_0001_0011, 12, 0, 10),
    (0b0000_0001_0000, 12, 0, 11),
    (0b0000_0001_1011, 12, 1, 5),
    (0b0000_0001_0100, 12, 2, 4),
    (0b0000_0001_1100, 12, 3, 3),
    (0b0000_0001_0010, 12, 4, 3),
    (0b0000_0001_1110, 12, 6, 2),
    (0b0000_0001_0101, 12, 7, 2),
    (0b0000_0001_0001, 12, 8, 2),
    (0b0000_0001_1111, 12, 17, 1),
    (0b0000_0001_1010, 12, 18, 1),
    (0b0000_0001_1001, 12, 19, 1),
    (0b0000_0001_0111, 12, 20, 1),
    (0b0000_0001_0110, 12, 21, 1),
    (0b0000_0000_1101_0, 13, 0, 12),
    (0b0000_0000_1100_1, 13, 0, 13),
    (0b0000_0000_1100_0, 13, 0, 14),
    (0b0000_0000_1011_1, 13, 0, 15),
    (0b0000_0000_1011_0, 13, 1, 6),
    (0b0000_0000_1010_1, 13, 1, 7),
    (0b0000_0000_1010_0, 13, 2, 5),
    (0b0000_0000_1001_1, 13, 3, 4),
    (0b0000_0000_1001_0, 13, 5, 3),
    (0b0000_0000_1000_1, 13, 9, 2),
    (0b0000_0000_1000_0, 13, 10, 2),
    (0b0000_0000_1111_1, 13, 22, 1),
    (0b0000_0000_1111_0, 13, 23, 1),
    (0b0000_0000_1110_1, 13, 24, 1),
    (0b0000_0000_1110_0, 13, 25, 1),
    (0b0000_0000_1101_1, 13, 26, 1),
    (0b0000_0000_0111_11, 14, 0, 16),
    (0b0000_0000_0111_10, 14, 0, 17),
    (0b0000_0000_0111_01, 14, 0, 18),
    (0b0000_0000_0111_00, 14, 0, 19),
    (0b0000_0000_0110_11, 14, 0, 20),
    (0b0000_0000_0110_10, 14, 0, 21),
    (0b0000_0000_0110_01, 14, 0, 22),
    (0b0000_0000_0110_00, 14, 0, 23),
    (0b0000_0000_0101_11, 14, 0, 24),
    (0b0000_0000_0101_10, 14, 0, 25),
    (0b0000_0000_0101_01, 14, 0, 26),
    (0b0000_0000_0101_00, 14, 0, 27),
    (0b0000_0000_0100_11, 14, 0, 28),
    (0b0000_0000_0100_10, 14, 0, 29),
    (0b0000_0000_0100_01, 14, 0, 30),
    (0b0000_0000_0100_00, 14, 0, 31),
    (0b0000_0000_0011_000, 15, 0, 32),
    (0b0000_0000_0010_111, 15, 0, 33),
    (0b0000_0000_0010_110, 15, 0, 34),
    (0b0000_0000_0010_101, 15, 0, 35),
    (0b0000_0000_0010_100, 15, 0, 36),
    (0b0000_0000_0010_011, 15, 0, 37),
    (0b0000_0000_0010_010, 15, 0, 38),
    (0b0000_0000_0010_001, 15, 0, 39),
    (0b0000_0000_0010_000, 15, 0, 40),
    (0b0000_0000_0011_111, 15, 1, 8),
    (0b0000_0000_0011_110, 15, 1, 9),
    (0b0000_0000_0011_101, 15, 1, 10),
    (0b0000_0000_0011_100, 15, 1, 11),
    (0b0000_0000_0011_011, 15, 1, 12),
    (0b0000_0000_0011_010, 15, 1, 13),
    (0b0000_0000_0011_001, 15, 1, 14),
    (0b0000_0000_0001_0011, 16, 1, 15),
    (0b0000_0000_0001_0010, 16, 1, 16),
    (0b0000_0000_0001_0001, 16, 1, 17),
    (0b0000_0000_0001_0000, 16, 1, 18),
    (0b0000_0000_0001_0100, 16, 6, 3),
    (0b0000_0000_0001_1010, 16, 11, 2),
    (0b0000_0000_0001_1001, 16, 12, 2),
    (0b0000_0000_0001_1000, 16, 13, 2),
    (0b0000_0000_0001_0111, 16, 14, 2),
    (0b0000_0000_0001_0110, 16, 15, 2),
    (0b0000_0000_0001_0101, 16, 16, 2),
    (0b0000_0000_0001_1111, 16, 27, 1),
    (0b0000_0000_0001_1110, 16, 28, 1),
    (0b0000_0000_0001_1101, 16, 29, 1),
    (0b0000_0000_0001_1100, 16, 30, 1),
    (0b0000_0000_0001_1011, 16, 31, 1),
];

lazy_static! {
    /// The coefficient table with sign bits appended and the escape code
    /// added, ready to be built into a tree.
    pub static ref DCT_COEFFICIENTS: Vec<PrefixCode<CoefficientCode>> = {
        let mut codes = Vec::with_capacity(RUN_LEVEL.len() * 2 + 1);

        for &(bits, length, run, level) in RUN_LEVEL.iter() {
            for &sign in &[0, 1] {
                let level = if sign == 0 {
                    level as i16
                } else {
                    -(level as i16)
                };

                codes.push(code(
                    bits << 1 | sign,
                    length + 1,
                    CoefficientCode::RunLevel(RunLevel { run, level }),
                ));
            }
        }

        codes.push(code(ESCAPE, 6, CoefficientCode::Escape));

        codes
    };
}

/// Read the differential DC coefficient of an intra block.
///
/// The size of the difference is coded with the luma or chroma table, and the
/// difference itself follows as a `size`-bit number whose top bit being clear
/// marks a negative value.
pub fn decode_intra_dc<R>(
    reader: &mut BitReader<R>,
    tables: &CodeTables,
    kind: BlockKind,
) -> Result<i16>
where
    R: Read,
{
    let size_table = if kind.is_luma() {
        &tables.dc_size_luma
    } else {
        &tables.dc_size_chroma
    };

    let (size, _) = size_table.decode_one(reader)?;
    if size == 0 {
        return Ok(0);
    }

    let diff: i16 = reader.read_bits(size as u32)?;
    if diff & (1 << (size - 1)) == 0 {
        Ok(diff + 1 - (1 << size))
    } else {
        Ok(diff)
    }
}

/// Read an escape-coded run and level.
fn decode_escape<R>(reader: &mut BitReader<R>) -> Result<RunLevel>
where
    R: Read,
{
    let run: u8 = reader.read_bits(6)?;
    let level = match reader.read_signed_bits::<i16>(8)? {
        0 => reader.read_bits::<i16>(8)?,
        -128 => reader.read_bits::<i16>(8)? - 256,
        level => level,
    };

    Ok(RunLevel { run, level })
}

/// Attempts to read the run-level coded coefficients of one block.
///
/// `includes_dc` selects whether the first coefficient is the block's DC
/// term, which is the case for all non-intra blocks. The first coefficient
/// then uses the short `1s` code for a level of one, so `10` only means end
/// of block from the second coefficient on. The end-of-block code is consumed.
pub fn decode_block<R>(
    reader: &mut BitReader<R>,
    tables: &CodeTables,
    includes_dc: bool,
    run_levels: &mut Vec<RunLevel>,
) -> Result<()>
where
    R: Read,
{
    let mut is_first = includes_dc;

    loop {
        if !is_first && reader.peek_bits::<u8>(2)? == END_OF_BLOCK {
            break;
        }

        let run_level = if is_first && reader.peek_bits::<u8>(1)? == 1 {
            let bits: u8 = reader.read_bits(2)?;
            RunLevel {
                run: 0,
                level: if bits & 1 == 0 { 1 } else { -1 },
            }
        } else {
            match tables.coefficients.decode_one(reader)?.0 {
                CoefficientCode::RunLevel(run_level) => run_level,
                CoefficientCode::Escape => decode_escape(reader)?,
            }
        };

        if run_levels.len() >= 64 {
            return Err(Error::InvalidData("too many coefficients in block"));
        }

        run_levels.push(run_level);
        is_first = false;
    }

    reader.skip_bits(2)?;

    Ok(())
}
