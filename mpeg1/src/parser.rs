//! MPEG-1 video bitstream parser functions.

mod block;
mod gob;
mod macroblock;
mod picture;
mod reader;
mod sequence;
mod slice;
mod vlc;

pub use block::{decode_block, decode_intra_dc, CoefficientCode};
pub use gob::decode_group_header;
pub use macroblock::{decode_macroblock_end, decode_macroblock_header};
pub use picture::decode_picture_header;
pub use reader::{BitReader, DEFAULT_CAPACITY};
pub use sequence::{aspect_ratio_from_code, decode_sequence_header, frame_rate_from_code};
pub use slice::decode_slice_header;
pub use vlc::{code, CodeTables, PrefixCode, PrefixCodeTree};
