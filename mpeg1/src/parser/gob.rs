//! Group of pictures

use crate::error::{Error, Result};
use crate::parser::reader::BitReader;
use crate::types::{GroupHeader, GROUP_START_CODE};
use log::debug;
use std::io::Read;

/// Attempts to read a group of pictures header from the bitstream.
///
/// The reader must be positioned at the group start code. The header is
/// consumed up to the following byte boundary.
pub fn decode_group_header<R>(reader: &mut BitReader<R>) -> Result<GroupHeader>
where
    R: Read,
{
    let start_code: u32 = reader.read_bits(32)?;
    if start_code != GROUP_START_CODE {
        return Err(Error::InvalidData("expected a group of pictures header"));
    }

    let drop_frame = reader.read_flag()?;
    let hours = reader.read_bits(5)?;
    let minutes = reader.read_bits(6)?;
    reader.skip_bits(1)?; //marker
    let seconds = reader.read_bits(6)?;
    let pictures = reader.read_bits(6)?;
    let closed = reader.read_flag()?;
    let broken = reader.read_flag()?;
    reader.skip_bits(5)?;

    debug!(
        "group at {:02}:{:02}:{:02}.{:02}{}{}",
        hours,
        minutes,
        seconds,
        pictures,
        if closed { " closed" } else { "" },
        if broken { " broken" } else { "" }
    );

    Ok(GroupHeader {
        drop_frame,
        hours,
        minutes,
        seconds,
        pictures,
        closed,
        broken,
    })
}
