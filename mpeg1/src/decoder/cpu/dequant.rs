//! Coefficient reconstruction

use std::cmp::{max, min};

/// ISO/IEC 11172-2 2.4.3.2 default intra quantizer matrix, in natural order.
pub const DEFAULT_INTRA_QUANT_MATRIX: [u8; 64] = [
    8, 16, 19, 22, 26, 27, 29, 34, //
    16, 16, 22, 24, 27, 29, 34, 37, //
    19, 22, 26, 27, 29, 34, 34, 38, //
    22, 22, 26, 27, 29, 34, 37, 40, //
    22, 26, 27, 29, 32, 35, 40, 48, //
    26, 27, 29, 32, 35, 40, 48, 58, //
    26, 27, 29, 34, 38, 46, 56, 69, //
    27, 29, 35, 38, 46, 56, 69, 83,
];

/// The default non-intra quantizer matrix is flat.
pub const DEFAULT_NON_INTRA_QUANT_MATRIX: [u8; 64] = [16; 64];

fn sign(value: i16) -> i32 {
    (value as i32).signum()
}

/// Make an even coefficient odd by moving it toward zero, then clamp it to
/// the range an IDCT input may take.
fn oddify_and_clamp(coefficient: i32, level: i16) -> i32 {
    let coefficient = if coefficient & 1 == 0 {
        coefficient - sign(level)
    } else {
        coefficient
    };

    min(2047, max(-2048, coefficient))
}

/// Reconstruct the coefficients of an intra block.
///
/// The DC term is not scaled by the quantizer; it is the DC level times 8.
pub fn dequantize_intra(levels: &[i16; 64], matrix: &[u8; 64], scale: u8) -> [i32; 64] {
    let mut coefficients = [0; 64];

    for ((coefficient, &level), &weight) in coefficients.iter_mut().zip(levels).zip(matrix) {
        let value = (2 * level as i32 * scale as i32 * weight as i32) / 16;
        *coefficient = oddify_and_clamp(value, level);
    }

    coefficients[0] = levels[0] as i32 * 8;

    coefficients
}

/// Reconstruct the coefficients of a non-intra block.
///
/// Zero levels stay zero; the DC term is treated like any other.
pub fn dequantize_non_intra(levels: &[i16; 64], matrix: &[u8; 64], scale: u8) -> [i32; 64] {
    let mut coefficients = [0; 64];

    for ((coefficient, &level), &weight) in coefficients.iter_mut().zip(levels).zip(matrix) {
        if level == 0 {
            continue;
        }

        let value = ((2 * level as i32 + sign(level)) * scale as i32 * weight as i32) / 16;
        *coefficient = oddify_and_clamp(value, level);
    }

    coefficients
}
