//! Inverse discrete cosine transform

use std::f64::consts::{FRAC_1_SQRT_2, PI};

/// A separable 8x8 type-III DCT, with its type-II counterpart.
///
/// Blocks are in row-major (x + y*8) order in both domains, with the
/// horizontal frequency along x. Spatial samples are centred on 128.
#[derive(Clone, Debug)]
pub struct InverseDct {
    /// `cos[a][b]` is `cos((2a + 1) * b * pi / 16)`.
    cos: [[f64; 8]; 8],

    /// Normalization factor of each frequency.
    c: [f64; 8],
}

impl InverseDct {
    pub fn new() -> Self {
        let mut cos = [[0.0; 8]; 8];
        let mut c = [1.0; 8];

        for (a, row) in cos.iter_mut().enumerate() {
            for (b, value) in row.iter_mut().enumerate() {
                *value = (((2 * a + 1) * b) as f64 * PI / 16.0).cos();
            }
        }

        c[0] = FRAC_1_SQRT_2;

        Self { cos, c }
    }

    /// Transform a block of dequantized coefficients into samples.
    ///
    /// Samples are truncated toward zero and are not clamped, so they may
    /// fall outside of `0..=255`.
    pub fn inverse(&self, coefficients: &[i32; 64]) -> [i32; 64] {
        let mut samples = [0; 64];

        for i in 0..8 {
            for j in 0..8 {
                let mut sum = 0.0;

                for x in 0..8 {
                    for y in 0..8 {
                        sum += self.c[x]
                            * self.c[y]
                            * coefficients[y * 8 + x] as f64
                            * self.cos[i][x]
                            * self.cos[j][y];
                    }
                }

                sum *= 0.25;
                sum += 128.0;

                samples[j * 8 + i] = sum as i32;
            }
        }

        samples
    }

    /// Transform a block of samples into unquantized coefficients.
    pub fn forward(&self, samples: &[u8; 64]) -> [f64; 64] {
        let mut coefficients = [0.0; 64];

        for i in 0..8 {
            for j in 0..8 {
                let mut sum = 0.0;

                for x in 0..8 {
                    for y in 0..8 {
                        sum += (samples[y * 8 + x] as f64 - 128.0)
                            * self.cos[x][i]
                            * self.cos[y][j];
                    }
                }

                coefficients[j * 8 + i] = sum * self.c[i] * self.c[j] * 0.25;
            }
        }

        coefficients
    }
}

impl Default for InverseDct {
    fn default() -> Self {
        Self::new()
    }
}
