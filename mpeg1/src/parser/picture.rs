//! Picture-layer decoder

use crate::error::{Error, Result};
use crate::parser::reader::BitReader;
use crate::types::{FrameType, MotionVectorRange, PictureHeader, PICTURE_START_CODE};
use log::debug;
use std::io::Read;

/// Read a run of flagged bytes: while the next flag bit is set, one byte of
/// extra information follows it.
///
/// The clear flag bit that ends the run is consumed too.
pub(crate) fn decode_extra_information<R>(reader: &mut BitReader<R>) -> Result<Vec<u8>>
where
    R: Read,
{
    let mut data = Vec::new();

    while reader.read_flag()? {
        data.push(reader.read_u8()?);
    }

    Ok(data)
}

fn decode_motion_vector_range<R>(reader: &mut BitReader<R>) -> Result<MotionVectorRange>
where
    R: Read,
{
    let full_pel = reader.read_flag()?;
    let f_code = reader.read_bits(3)?;

    Ok(MotionVectorRange { full_pel, f_code })
}

/// Attempts to read a picture header from the bitstream.
///
/// The reader must be positioned at the picture start code. The header is
/// consumed up to the following byte boundary, where the first slice start
/// code is expected.
pub fn decode_picture_header<R>(reader: &mut BitReader<R>) -> Result<PictureHeader>
where
    R: Read,
{
    let start_code: u32 = reader.read_bits(32)?;
    if start_code != PICTURE_START_CODE {
        return Err(Error::InvalidData("expected a picture header"));
    }

    let temporal_reference = reader.read_bits(10)?;
    let frame_type = FrameType::from_code(reader.read_bits(3)?)
        .ok_or(Error::InvalidData("invalid picture coding type"))?;
    let vbv_delay = reader.read_bits(16)?;

    let forward = if frame_type.is_predicted() {
        Some(decode_motion_vector_range(reader)?)
    } else {
        None
    };

    let backward = if frame_type == FrameType::B {
        Some(decode_motion_vector_range(reader)?)
    } else {
        None
    };

    let extra = decode_extra_information(reader)?;
    reader.align_to_byte()?;

    debug!(
        "picture {} {:?}, forward {:?}, backward {:?}",
        temporal_reference, frame_type, forward, backward
    );

    Ok(PictureHeader {
        temporal_reference,
        frame_type,
        vbv_delay,
        forward,
        backward,
        extra,
    })
}
