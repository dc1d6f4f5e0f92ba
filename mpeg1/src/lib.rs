//! Pure-rust MPEG-1 video decoder

#[macro_use]
extern crate bitflags;

#[macro_use]
extern crate lazy_static;

mod decoder;
mod error;
mod parser;
mod traits;
mod types;

pub use decoder::{
    DecodedFrame, DecoderContext, DecoderOption, InverseDct, MacroblockDecoder, Picture,
    PixelFormat, SliceCursor, YuvFrame, DEFAULT_INTRA_QUANT_MATRIX,
    DEFAULT_NON_INTRA_QUANT_MATRIX, ZIGZAG,
};
pub use error::{Error, Result};
pub use parser::{
    aspect_ratio_from_code, code, decode_block, decode_group_header, decode_intra_dc,
    decode_macroblock_end, decode_macroblock_header, decode_picture_header,
    decode_sequence_header, decode_slice_header, frame_rate_from_code, BitReader, CodeTables,
    CoefficientCode, PrefixCode, PrefixCodeTree, DEFAULT_CAPACITY,
};
pub use traits::{BitReadable, FrameTarget};
pub use types::{
    is_slice_start_code, BlockKind, FrameType, GroupHeader, MacroblockFlags, MacroblockHeader,
    MotionCode, MotionVector, MotionVectorCode, MotionVectorRange, PictureHeader, Ratio,
    RunLevel, SequenceHeader, SliceHeader, DC_PREDICTOR_RESET, EXTENSION_START_CODE,
    GROUP_START_CODE, PICTURE_START_CODE, SEQUENCE_END_CODE, SEQUENCE_ERROR_CODE,
    SEQUENCE_HEADER_CODE, SLICE_START_CODE_FIRST, SLICE_START_CODE_LAST, USER_DATA_START_CODE,
};
