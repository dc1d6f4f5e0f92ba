//! Decoder primitives implemented on the CPU

mod dequant;
mod gather;
mod idct;
mod mvd_pred;
mod rle;
mod scatter;

pub use dequant::{
    dequantize_intra, dequantize_non_intra, DEFAULT_INTRA_QUANT_MATRIX,
    DEFAULT_NON_INTRA_QUANT_MATRIX,
};
pub use gather::gather;
pub use idct::InverseDct;
pub use mvd_pred::{mv_decode, mv_raw};
pub use rle::{inverse_rle, ZIGZAG};
pub use scatter::{scatter, validate_target};
