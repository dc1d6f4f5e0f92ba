//! MPEG-1 video decoder.

mod assembler;
mod cpu;
mod frame;
mod macroblock;
mod picture;
mod state;
mod types;

pub use cpu::{InverseDct, DEFAULT_INTRA_QUANT_MATRIX, DEFAULT_NON_INTRA_QUANT_MATRIX, ZIGZAG};
pub use frame::{DecodedFrame, PixelFormat, YuvFrame};
pub use macroblock::{MacroblockDecoder, SliceCursor};
pub use picture::Picture;
pub use state::DecoderContext;
pub use types::DecoderOption;
