//! Error type

use std::io;
use thiserror::Error;

/// All errors raised while reading or decoding an MPEG-1 video stream.
#[derive(Error, Debug)]
pub enum Error {
    /// A caller passed an argument outside of the accepted range, such as a
    /// bit count of zero or more than 32.
    #[error("invalid argument")]
    InvalidArgument,

    /// The bitstream contains structurally invalid content.
    #[error("invalid bitstream data: {0}")]
    InvalidData(&'static str),

    #[error("out of memory")]
    OutOfMemory,

    /// Not enough bits are buffered and there is no byte source to refill
    /// from. Supplying more data and retrying is valid.
    #[error("need more input")]
    NeedMoreInput,

    /// The byte source is exhausted and cannot satisfy the request.
    #[error("end of stream")]
    EndOfStream,

    /// The internal buffer has no room left for a refill.
    #[error("bit buffer overflow")]
    BufferOverflow,

    /// The operation is not valid in the current state of the reader or
    /// decoder.
    #[error("operation not allowed")]
    NotAllowed,

    #[error("not implemented")]
    NotImplemented,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Whether this error only signals that the bitstream ran out, as opposed
    /// to the bitstream being wrong.
    pub fn is_exhaustion(&self) -> bool {
        matches!(self, Error::NeedMoreInput | Error::EndOfStream)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
