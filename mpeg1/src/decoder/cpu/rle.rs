//! Block run decompression

use crate::error::{Error, Result};
use crate::types::RunLevel;

/// Natural (row-major, `x + y*8`) position of each coefficient in zig-zag
/// scan order.
pub const ZIGZAG: [usize; 64] = [
    0, 1, 8, 16, 9, 2, 3, 10, 17, 24, 32, 25, 18, 11, 4, 5, 12, 19, 26, 33, 40, 48, 41, 34, 27,
    20, 13, 6, 7, 14, 21, 28, 35, 42, 49, 56, 57, 50, 43, 36, 29, 22, 15, 23, 30, 37, 44, 51, 58,
    59, 52, 45, 38, 31, 39, 46, 53, 60, 61, 54, 47, 55, 62, 63,
];

/// Inverse and un-zig-zag the run-length encoding on a block.
///
/// `run_levels` are placed in scan order starting at `first_index`, which is
/// 1 for intra blocks whose DC term is coded separately and 0 otherwise. The
/// returned block is in natural order; every position not reached by a run
/// or level is zero.
pub fn inverse_rle(first_index: usize, run_levels: &[RunLevel]) -> Result<[i16; 64]> {
    let mut levels = [0; 64];
    let mut scan_index = first_index;

    for run_level in run_levels {
        scan_index += run_level.run as usize;

        let position = ZIGZAG
            .get(scan_index)
            .ok_or(Error::InvalidData("coefficient run past end of block"))?;

        levels[*position] = run_level.level;
        scan_index += 1;
    }

    Ok(levels)
}

#[cfg(test)]
mod tests {
    use crate::decoder::cpu::rle::{inverse_rle, ZIGZAG};
    use crate::error::Error;
    use crate::types::RunLevel;

    #[test]
    fn zigzag_is_a_permutation() {
        let mut seen = [false; 64];
        for &position in ZIGZAG.iter() {
            assert!(!seen[position]);
            seen[position] = true;
        }

        assert_eq!(0, ZIGZAG[0]);
        assert_eq!(63, ZIGZAG[63]);
    }

    #[test]
    fn runs_fill_with_zeroes() {
        let levels = inverse_rle(
            1,
            &[
                RunLevel { run: 0, level: 5 },
                RunLevel { run: 2, level: -3 },
                RunLevel { run: 0, level: 1 },
            ],
        )
        .unwrap();

        // scan positions 1, 4 and 5
        assert_eq!(5, levels[1]);
        assert_eq!(-3, levels[9]);
        assert_eq!(1, levels[2]);
        assert_eq!(3, levels.iter().filter(|l| **l != 0).count());
    }

    #[test]
    fn non_intra_block_starts_at_dc() {
        let levels = inverse_rle(0, &[RunLevel { run: 0, level: -1 }]).unwrap();

        assert_eq!(-1, levels[0]);
        assert!(levels[1..].iter().all(|l| *l == 0));
    }

    #[test]
    fn last_position_is_reachable() {
        let levels = inverse_rle(1, &[RunLevel { run: 62, level: 9 }]).unwrap();

        assert_eq!(9, levels[63]);
    }

    #[test]
    fn run_past_end_of_block() {
        assert!(matches!(
            inverse_rle(1, &[RunLevel { run: 63, level: 9 }]).unwrap_err(),
            Error::InvalidData(_)
        ));
    }
}
