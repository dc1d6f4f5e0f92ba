//! Internal reader adapter for reading MPEG-1 video bitstreams.

use crate::error::{Error, Result};
use crate::traits::BitReadable;
use std::cmp::{max, min};
use std::io::{self, Read};

/// Default size of the internal buffer of a source-backed reader.
pub const DEFAULT_CAPACITY: usize = 1 << 20;

/// The smallest buffer a reader will be created with. Anything smaller could
/// fill up with less than 32 unread bits before compaction kicks in.
const MIN_CAPACITY: usize = 16;

/// A reader that allows decoding an MPEG-1 video bitstream.
///
/// The reader keeps a bounded buffer of bytes and a bit-granular read cursor
/// into it. Bytes come either from the caller through `write`, or from a
/// backing byte source of known length, which is pulled from whenever a read
/// needs more bits than are buffered.
pub struct BitReader<R = io::Empty>
where
    R: Read,
{
    /// The data source to refill from, if any.
    source: Option<R>,

    /// How many bytes the source still has to offer.
    source_remaining: u64,

    /// Internal buffer of bitstream data. Its length is the write offset.
    buffer: Vec<u8>,

    /// The most bytes `buffer` may hold.
    capacity: usize,

    /// How many bits of the buffer have already been read.
    bits_read: usize,
}

impl BitReader<io::Empty> {
    /// Create an empty reader with no backing source.
    ///
    /// Data has to be supplied with `write`. Reads past the written data fail
    /// with `Error::NeedMoreInput`.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            source: None,
            source_remaining: 0,
            buffer: Vec::new(),
            capacity: max(capacity, MIN_CAPACITY),
            bits_read: 0,
        }
    }

    /// Create a reader over a copy of an in-memory bitstream.
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut reader = Self::with_capacity(data.len());
        reader.buffer.extend_from_slice(data);

        reader
    }
}

impl<R> BitReader<R>
where
    R: Read,
{
    /// Wrap a byte source of `source_len` bytes in a reader.
    pub fn from_source(source: R, source_len: u64) -> Self {
        Self::from_source_with_capacity(source, source_len, DEFAULT_CAPACITY)
    }

    /// Wrap a byte source in a reader whose buffer holds at most `capacity`
    /// bytes.
    pub fn from_source_with_capacity(source: R, source_len: u64, capacity: usize) -> Self {
        Self {
            source: Some(source),
            source_remaining: source_len,
            buffer: Vec::new(),
            capacity: max(capacity, MIN_CAPACITY),
            bits_read: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether this reader can refill itself from a byte source.
    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    /// The number of bits that can be read without touching the source.
    pub fn buffered_bits(&self) -> usize {
        (self.buffer.len() * 8).saturating_sub(self.bits_read)
    }

    /// The number of bits left in the stream, buffered or not.
    pub fn remaining_bits(&self) -> u64 {
        self.buffered_bits() as u64 + self.source_remaining * 8
    }

    /// Discard already-read bytes from the front of the buffer.
    fn compact(&mut self) {
        self.buffer.drain(0..self.bits_read / 8);
        self.bits_read %= 8;
    }

    /// Append caller-supplied bytes to the buffer.
    ///
    /// Consumed bytes are compacted away first. If the data still does not
    /// fit, nothing is written and `Error::BufferOverflow` is returned.
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        if self.buffer.len() + data.len() > self.capacity {
            self.compact();
        }

        if self.buffer.len() + data.len() > self.capacity {
            return Err(Error::BufferOverflow);
        }

        self.buffer.extend_from_slice(data);

        Ok(())
    }

    /// Pull more bytes from the byte source into the buffer.
    ///
    /// If more than half of the buffer has been consumed it is compacted
    /// first. At most the free capacity or the remainder of the source is
    /// read, whichever is smaller.
    fn refill(&mut self) -> Result<()> {
        if self.source.is_none() {
            return Err(Error::NotAllowed);
        }

        if self.bits_read / 8 > self.capacity / 2 {
            self.compact();
        }

        if self.source_remaining == 0 {
            return Err(Error::EndOfStream);
        }

        let free = self.capacity - self.buffer.len();
        let to_read = min(free as u64, self.source_remaining) as usize;
        if to_read == 0 {
            return Err(Error::BufferOverflow);
        }

        let start = self.buffer.len();
        self.buffer.resize(start + to_read, 0);

        let outcome = loop {
            let source = match self.source.as_mut() {
                Some(source) => source,
                None => break Err(Error::NotAllowed),
            };

            match source.read(&mut self.buffer[start..]) {
                Ok(0) => {
                    self.source_remaining = 0;
                    break Err(Error::EndOfStream);
                }
                Ok(n) => break Ok(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => break Err(e.into()),
            }
        };

        match outcome {
            Ok(n) => {
                self.buffer.truncate(start + n);
                self.source_remaining -= n as u64;
                Ok(())
            }
            Err(e) => {
                self.buffer.truncate(start);
                Err(e)
            }
        }
    }

    /// Ensure that at least a certain number of additional bits can be read
    /// from the internal buffer.
    fn ensure_bits(&mut self, bits_needed: u32) -> Result<()> {
        while self.buffered_bits() < bits_needed as usize {
            if self.source.is_none() {
                return Err(Error::NeedMoreInput);
            }

            self.refill()?;
        }

        Ok(())
    }

    /// The error to report when the stream ended in the middle of a code.
    pub(crate) fn shortfall_error(&self) -> Error {
        if self.source.is_some() {
            Error::EndOfStream
        } else {
            Error::NeedMoreInput
        }
    }

    /// Copy an arbitrary number of bits from the stream out into a type.
    ///
    /// The bits are returned most significant bit first, zero-extended into
    /// the least significant bits of the result. Between 1 and 32 bits may be
    /// requested, and never more than the width of `T`; anything else yields
    /// `Error::InvalidArgument`.
    ///
    /// This function does not remove bits from the buffer. Repeated calls to
    /// `peek_bits` return the same bits. If not enough bits are available the
    /// read position is left untouched.
    pub fn peek_bits<T: BitReadable>(&mut self, mut bits_needed: u32) -> Result<T> {
        if bits_needed == 0 || bits_needed > 32 {
            return Err(Error::InvalidArgument);
        }

        if (T::zero().checked_shl(bits_needed - 1)).is_none() {
            return Err(Error::InvalidArgument);
        }

        self.ensure_bits(bits_needed)?;

        let mut accum = T::zero();
        let bytes_read = self.bits_read / 8;
        let mut bits_read = self.bits_read % 8;
        for byte in self.buffer.iter().skip(bytes_read) {
            if bits_needed == 0 {
                break;
            }

            let byte = byte << bits_read;
            let bits_in_byte = 8u32.saturating_sub(bits_read as u32);

            let bits_to_shift_in = min(bits_in_byte, bits_needed);
            let incoming: T = byte.checked_shr(8 - bits_to_shift_in).unwrap_or(0).into();

            if let Some(rem) = accum.checked_shl(bits_to_shift_in) {
                accum = rem | incoming;
            } else {
                accum = incoming;
            }

            bits_read = 0;
            bits_needed = bits_needed.saturating_sub(bits_to_shift_in);
        }

        debug_assert_eq!(0, bits_needed, "accumulator should have been filled");

        Ok(accum)
    }

    /// Skip forward a certain number of bits in the stream buffer.
    ///
    /// If more bits are requested to be skipped than exist within the buffer,
    /// then they will be read in. If that fails, no skipping takes place.
    pub fn skip_bits(&mut self, bits_to_skip: u32) -> Result<()> {
        self.ensure_bits(bits_to_skip)?;

        self.bits_read += bits_to_skip as usize;

        Ok(())
    }

    /// Move an arbitrary number of bits from the stream out into a type.
    ///
    /// This is `peek_bits` followed by `skip_bits` of the same length.
    pub fn read_bits<T: BitReadable>(&mut self, bits_needed: u32) -> Result<T> {
        let r = self.peek_bits(bits_needed)?;
        self.skip_bits(bits_needed)?;

        Ok(r)
    }

    /// Copy an arbitrary number of bits from the stream out into a type,
    /// applying sign extension to the result.
    ///
    /// This may be used with signed types directly, or unsigned types that you
    /// later coerce to the signed equivalent.
    pub fn peek_signed_bits<T: BitReadable>(&mut self, bits_needed: u32) -> Result<T> {
        let val: T = self.peek_bits(bits_needed)?;
        let sign_bit = val.checked_shr(bits_needed - 1).unwrap_or_else(T::zero) & T::one();

        if !sign_bit.is_zero() {
            let sign_extension = (!T::zero()).checked_shl(bits_needed);

            Ok(val | sign_extension.unwrap_or_else(T::zero))
        } else {
            Ok(val)
        }
    }

    /// Move an arbitrary number of bits from the stream out into a type,
    /// applying sign extension to the result.
    pub fn read_signed_bits<T: BitReadable>(&mut self, bits_needed: u32) -> Result<T> {
        let r = self.peek_signed_bits(bits_needed)?;
        self.skip_bits(bits_needed)?;

        Ok(r)
    }

    /// Read a `u8` from the bitstream.
    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_bits(8)
    }

    /// Read a single bit as a flag.
    pub fn read_flag(&mut self) -> Result<bool> {
        Ok(self.read_bits::<u8>(1)? == 1)
    }

    /// Peek up to `max_bits` bits, settling for fewer if the stream ends.
    ///
    /// Returns the bits, right-aligned, and how many were peeked. Fails only
    /// if not a single bit is available.
    pub fn peek_available(&mut self, max_bits: u32) -> Result<(u32, u32)> {
        match self.ensure_bits(max_bits) {
            Ok(()) => {}
            Err(e) if e.is_exhaustion() => {}
            Err(e) => return Err(e),
        }

        let count = min(max_bits as usize, self.buffered_bits()) as u32;
        if count == 0 {
            return Err(self.shortfall_error());
        }

        Ok((self.peek_bits(count)?, count))
    }

    /// Determine how many bits we need to skip forward to realign the stream
    /// pointer with the next byte boundary.
    fn realignment_bits(&self) -> u32 {
        (8 - (self.bits_read % 8) as u32) % 8
    }

    pub fn is_byte_aligned(&self) -> bool {
        self.bits_read % 8 == 0
    }

    /// Skip forward to the next byte boundary.
    pub fn align_to_byte(&mut self) -> Result<()> {
        let bits = self.realignment_bits();
        if bits > 0 {
            self.skip_bits(bits)?;
        }

        Ok(())
    }

    /// Advance to the next start code.
    ///
    /// The stream is first aligned to a byte boundary and then advanced a
    /// byte at a time until the next 32 bits form a `0x000001xx` start code.
    /// The start code itself is not consumed; its value is returned.
    pub fn next_start_code(&mut self) -> Result<u32> {
        self.align_to_byte()?;

        loop {
            let bits: u32 = self.peek_bits(32)?;
            if bits >> 8 == 1 {
                return Ok(bits);
            }

            self.skip_bits(8)?;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::parser::reader::BitReader;

    #[test]
    fn read_unaligned_bits() {
        let data = [0xFF, 0x72, 0x1C, 0x1F];
        let mut reader = BitReader::from_bytes(&data[..]);

        assert_eq!(0x07, reader.read_bits(3).unwrap());
        assert_eq!(0x3E, reader.read_bits(6).unwrap());
        assert_eq!(0x721C1F, reader.read_bits(23).unwrap());
        assert!(matches!(
            reader.read_bits::<u8>(1).unwrap_err(),
            Error::NeedMoreInput
        ));
    }

    #[test]
    fn grouped_reads_match_whole_read() {
        let data = [0xDE, 0xAD, 0xBE, 0xEF, 0x01, 0x23, 0x45, 0x67];
        let mut whole = BitReader::from_bytes(&data[..]);
        let high: u32 = whole.read_bits(32).unwrap();
        let low: u32 = whole.read_bits(32).unwrap();
        let expected = (high as u64) << 32 | low as u64;

        let mut reader = BitReader::from_bytes(&data[..]);
        let mut accum = 0u64;
        for group in &[3, 5, 10, 1, 13, 7, 17, 8] {
            let bits: u32 = reader.read_bits(*group).unwrap();
            accum = accum << group | bits as u64;
        }

        assert_eq!(expected, accum);
        assert_eq!(0, reader.remaining_bits());
    }

    #[test]
    fn peek_then_skip_matches_read() {
        let data = [0x9A, 0xBC, 0xDE];
        let mut peeking = BitReader::from_bytes(&data[..]);
        let mut reading = BitReader::from_bytes(&data[..]);

        for group in &[5, 11, 8] {
            let peeked: u32 = peeking.peek_bits(*group).unwrap();
            peeking.skip_bits(*group).unwrap();

            assert_eq!(peeked, reading.read_bits::<u32>(*group).unwrap());
        }
    }

    #[test]
    fn short_read_keeps_cursor() {
        let data = [0xA5];
        let mut reader = BitReader::from_bytes(&data[..]);

        assert_eq!(0x5, reader.read_bits::<u8>(3).unwrap());
        assert!(matches!(
            reader.read_bits::<u8>(6).unwrap_err(),
            Error::NeedMoreInput
        ));
        assert_eq!(0x05, reader.read_bits::<u8>(5).unwrap());
    }

    #[test]
    fn invalid_bit_counts() {
        let data = [0x00, 0x00, 0x00, 0x00, 0x00];
        let mut reader = BitReader::from_bytes(&data[..]);

        assert!(matches!(
            reader.peek_bits::<u32>(0).unwrap_err(),
            Error::InvalidArgument
        ));
        assert!(matches!(
            reader.peek_bits::<u64>(33).unwrap_err(),
            Error::InvalidArgument
        ));
        assert!(matches!(
            reader.peek_bits::<u8>(9).unwrap_err(),
            Error::InvalidArgument
        ));
    }

    #[test]
    fn read_signed_bits_directly() {
        let data = [0xFF, 0x40, 0x72, 0x1C, 0x1F];
        let mut reader = BitReader::from_bytes(&data[..]);

        assert_eq!(-1, reader.read_signed_bits::<i16>(3).unwrap());
        assert_eq!(-2, reader.read_signed_bits::<i16>(6).unwrap());
        assert_eq!(-0x80, reader.read_signed_bits::<i16>(8).unwrap());
        assert_eq!(-0xDE3E1, reader.read_signed_bits::<i32>(23).unwrap());
    }

    #[test]
    fn refill_from_source() {
        let data: Vec<u8> = (0..40).collect();
        let mut reader = BitReader::from_source_with_capacity(&data[..], data.len() as u64, 16);

        for expected in 0..40u8 {
            assert_eq!(expected, reader.read_u8().unwrap());
        }

        assert!(matches!(
            reader.read_bits::<u8>(1).unwrap_err(),
            Error::EndOfStream
        ));
    }

    #[test]
    fn refill_across_unaligned_reads() {
        let data = [0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0, 0x11, 0x22];
        let mut reader = BitReader::from_source_with_capacity(&data[..], data.len() as u64, 16);

        assert_eq!(0x1, reader.read_bits::<u8>(4).unwrap());
        assert_eq!(0x2345678, reader.read_bits::<u32>(28).unwrap());
        assert_eq!(0x9ABCDEF0, reader.read_bits::<u32>(32).unwrap());
        assert_eq!(0x1122, reader.read_bits::<u16>(16).unwrap());
        assert_eq!(0, reader.remaining_bits());
    }

    #[test]
    fn write_until_overflow() {
        let mut reader = BitReader::with_capacity(16);

        reader.write(&[0x00, 0x00, 0x01, 0xB3]).unwrap();
        reader.write(&[0xAA; 12]).unwrap();
        assert!(matches!(
            reader.write(&[0xEE]).unwrap_err(),
            Error::BufferOverflow
        ));

        assert_eq!(0x1B3, reader.read_bits::<u32>(32).unwrap());
        reader.write(&[0xEE]).unwrap();
        for _ in 0..12 {
            assert_eq!(0xAA, reader.read_u8().unwrap());
        }
        assert_eq!(0xEE, reader.read_u8().unwrap());
    }

    #[test]
    fn align_to_byte() {
        let data = [0xFF, 0x0F];
        let mut reader = BitReader::from_bytes(&data[..]);

        reader.align_to_byte().unwrap();
        assert!(reader.is_byte_aligned());

        reader.skip_bits(3).unwrap();
        assert!(!reader.is_byte_aligned());

        reader.align_to_byte().unwrap();
        assert_eq!(0x0F, reader.read_u8().unwrap());
    }

    #[test]
    fn next_start_code_skips_garbage() {
        let data = [0xFF, 0x13, 0x00, 0x00, 0x00, 0x01, 0xB8, 0x42];
        let mut reader = BitReader::from_bytes(&data[..]);

        reader.skip_bits(2).unwrap();

        assert_eq!(0x1B8, reader.next_start_code().unwrap());
        assert_eq!(0x1B8, reader.read_bits::<u32>(32).unwrap());
        assert_eq!(0x42, reader.read_u8().unwrap());
    }

    #[test]
    fn peek_available_settles_for_less() {
        let data = [0xC3, 0x81];
        let mut reader = BitReader::from_bytes(&data[..]);

        reader.skip_bits(4).unwrap();
        assert_eq!((0x381, 12), reader.peek_available(32).unwrap());

        reader.skip_bits(12).unwrap();
        assert!(matches!(
            reader.peek_available(32).unwrap_err(),
            Error::NeedMoreInput
        ));
    }
}
