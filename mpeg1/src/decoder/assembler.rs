//! Picture assembly from slices

use crate::decoder::macroblock::{MacroblockDecoder, SliceCursor};
use crate::decoder::picture::Picture;
use crate::error::{Error, Result};
use crate::parser::{decode_picture_header, decode_slice_header, BitReader};
use crate::types::{is_slice_start_code, SequenceHeader};
use log::{trace, warn};
use std::io::Read;

/// A picture fresh out of the slice loop.
#[derive(Debug)]
pub struct AssembledPicture {
    pub picture: Picture,

    /// Macroblock addresses covered by the decoded slices.
    pub macroblocks_decoded: usize,

    /// The error that stopped macroblock decoding early, if any.
    pub truncated_by: Option<Error>,
}

/// Whether the slice has more macroblocks, judged by the next 23 bits not
/// all being zero.
///
/// Running out of data counts as the end of the slice.
fn slice_continues<R>(reader: &mut BitReader<R>) -> Result<bool>
where
    R: Read,
{
    match reader.peek_bits::<u32>(23) {
        Ok(bits) => Ok(bits != 0),
        Err(e) if e.is_exhaustion() => Ok(false),
        Err(e) => Err(e),
    }
}

/// Find the start code after a slice and report whether it opens another
/// slice of the same picture.
fn next_slice_follows<R>(reader: &mut BitReader<R>) -> Result<bool>
where
    R: Read,
{
    match reader.next_start_code() {
        Ok(code) => Ok(is_slice_start_code(code)),
        Err(e) if e.is_exhaustion() => Ok(false),
        Err(e) => Err(e),
    }
}

/// Attempts to decode a picture header and all slices that follow it.
///
/// The reader must be positioned at the picture start code. Decoding stops
/// at the first start code after a slice that is not another slice, which
/// is left unconsumed.
///
/// Header errors are returned as-is. A macroblock that fails to decode
/// instead ends the picture early: the picture is yielded with the error in
/// `truncated_by` and whatever was decoded before it.
pub fn decode_picture<R>(
    reader: &mut BitReader<R>,
    sequence: &SequenceHeader,
    macroblock_decoder: &mut MacroblockDecoder,
) -> Result<AssembledPicture>
where
    R: Read,
{
    let header = decode_picture_header(reader)?;
    let mut picture = Picture::new(sequence, header)?;
    let mut macroblocks_decoded = 0;
    let mut truncated_by = None;

    'slices: loop {
        let slice = decode_slice_header(reader)?;
        if slice.row >= picture.mb_height() {
            return Err(Error::InvalidData("slice starts below the picture"));
        }

        let mut cursor = SliceCursor::new(slice, picture.mb_width());

        loop {
            match macroblock_decoder.decode(reader, &mut picture, &mut cursor) {
                Ok(covered) => macroblocks_decoded += covered,
                Err(e) => {
                    warn!(
                        "picture {} stopped after {} of {} macroblocks: {}",
                        picture.as_header().temporal_reference,
                        macroblocks_decoded,
                        picture.mb_count(),
                        e
                    );
                    truncated_by = Some(e);
                    break 'slices;
                }
            }

            if !slice_continues(reader)? {
                break;
            }
        }

        trace!(
            "slice at row {} ended after macroblock {:?}",
            cursor.header.row,
            cursor.last_address()
        );

        if !next_slice_follows(reader)? {
            break;
        }
    }

    Ok(AssembledPicture {
        picture,
        macroblocks_decoded,
        truncated_by,
    })
}
