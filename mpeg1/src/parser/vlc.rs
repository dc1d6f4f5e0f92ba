//! Variable-length-code tables

use crate::error::{Error, Result};
use crate::parser::block::{CoefficientCode, DCT_COEFFICIENTS, DCT_DC_SIZE_CHROMA, DCT_DC_SIZE_LUMA};
use crate::parser::macroblock::{
    CODED_BLOCK_PATTERN, MACROBLOCK_ADDRESS_INCREMENT, MACROBLOCK_TYPE_B, MACROBLOCK_TYPE_D,
    MACROBLOCK_TYPE_I, MACROBLOCK_TYPE_P, MOTION_CODE,
};
use crate::parser::reader::BitReader;
use crate::types::FrameType;
use std::io::Read;

/// One row of a prefix code table.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PrefixCode<T> {
    /// The code, right-aligned.
    pub code: u32,

    /// How many bits of `code` are significant. A length of zero terminates
    /// a table.
    pub length: u32,

    /// The symbol the code stands for.
    pub symbol: T,
}

/// Shorthand for writing prefix code tables.
pub const fn code<T>(code: u32, length: u32, symbol: T) -> PrefixCode<T> {
    PrefixCode {
        code,
        length,
        symbol,
    }
}

/// A single entry in a prefix code tree.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Entry<T> {
    /// This entry represents a successful parse.
    End(T),

    /// This entry represents a fork in the tree.
    ///
    /// The fork provides the entry index to continue at when the next bit is
    /// zero (left) or one (right). Branches that no code passes through are
    /// `None`.
    Fork(Option<usize>, Option<usize>),
}

/// A binary tree mapping prefix codes to symbols.
///
/// Entries are stored in a flat arena with the root at index zero. The tree
/// never holds a code that is a prefix of another, so every symbol can be
/// found by walking it one bit at a time.
#[derive(Clone, Debug)]
pub struct PrefixCodeTree<T = u8> {
    entries: Vec<Entry<T>>,
}

impl<T: Copy> Default for PrefixCodeTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy> PrefixCodeTree<T> {
    /// Construct a tree with no codes in it.
    pub fn new() -> Self {
        Self {
            entries: vec![Entry::Fork(None, None)],
        }
    }

    /// Construct a tree from a code table.
    ///
    /// Construction stops at the end of the slice or at the first row with a
    /// zero length, whichever comes first.
    pub fn from_codes(codes: &[PrefixCode<T>]) -> Result<Self> {
        let mut tree = Self::new();

        for row in codes.iter().take_while(|row| row.length != 0) {
            tree.add(row.symbol, row.code, row.length)?;
        }

        Ok(tree)
    }

    /// The number of symbols in the tree.
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, Entry::End(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add a code to the tree.
    ///
    /// The low `length` bits of `code` are walked from the most significant
    /// one down, creating forks as needed. Lengths outside of `1..=32`, codes
    /// wider than `length`, and codes that collide with or prefix an existing
    /// code all yield `Error::InvalidArgument`.
    pub fn add(&mut self, symbol: T, code: u32, length: u32) -> Result<()> {
        if length == 0 || length > 32 {
            return Err(Error::InvalidArgument);
        }

        if length < 32 && code >> length != 0 {
            return Err(Error::InvalidArgument);
        }

        let mut index = 0;
        for depth in (0..length).rev() {
            let bit = (code >> depth) & 1;
            let is_last = depth == 0;

            let child = match self.entries.get(index) {
                Some(Entry::Fork(zero, one)) => {
                    if bit == 0 {
                        *zero
                    } else {
                        *one
                    }
                }
                _ => return Err(Error::InvalidArgument),
            };

            match child {
                Some(_) if is_last => return Err(Error::InvalidArgument),
                Some(next) => index = next,
                None => {
                    let new_index = self.entries.len();
                    self.entries.push(if is_last {
                        Entry::End(symbol)
                    } else {
                        Entry::Fork(None, None)
                    });

                    if let Some(Entry::Fork(zero, one)) = self.entries.get_mut(index) {
                        if bit == 0 {
                            *zero = Some(new_index);
                        } else {
                            *one = Some(new_index);
                        }
                    }

                    index = new_index;
                }
            }
        }

        Ok(())
    }

    /// Decode a single symbol.
    ///
    /// Up to 32 bits are peeked and the tree is walked until a symbol is
    /// reached, at which point exactly the code's bits are consumed. Yields
    /// the symbol and the length of its code.
    ///
    /// Bits that match no code yield `Error::InvalidData`. If the stream ends
    /// in the middle of a code, the reader's `NeedMoreInput` or `EndOfStream`
    /// is returned and nothing is consumed.
    pub fn decode_one<R: Read>(&self, reader: &mut BitReader<R>) -> Result<(T, u32)> {
        let (bits, count) = reader.peek_available(32)?;
        let mut index = 0;

        for depth in 0..count {
            let bit = (bits >> (count - 1 - depth)) & 1;
            let next = match self.entries.get(index) {
                Some(Entry::Fork(zero, one)) => {
                    if bit == 0 {
                        *zero
                    } else {
                        *one
                    }
                }
                _ => None,
            };

            index = next.ok_or(Error::InvalidData("unknown variable-length code"))?;

            if let Some(Entry::End(symbol)) = self.entries.get(index) {
                let length = depth + 1;
                reader.skip_bits(length)?;

                return Ok((*symbol, length));
            }
        }

        if count < 32 {
            Err(reader.shortfall_error())
        } else {
            Err(Error::InvalidData("unknown variable-length code"))
        }
    }

    /// Decode consecutive symbols into `out`.
    ///
    /// Decoding stops after `limit` symbols, or never if `limit` is `None`.
    /// Running out of bitstream is a clean stop rather than an error, so this
    /// yields however many complete symbols were available.
    pub fn decode_many<R: Read>(
        &self,
        reader: &mut BitReader<R>,
        limit: Option<usize>,
        out: &mut Vec<T>,
    ) -> Result<usize> {
        let mut decoded = 0;

        while limit.map_or(true, |limit| decoded < limit) {
            match self.decode_one(reader) {
                Ok((symbol, _)) => {
                    out.push(symbol);
                    decoded += 1;
                }
                Err(e) if e.is_exhaustion() => break,
                Err(e) => return Err(e),
            }
        }

        Ok(decoded)
    }
}

/// Every code tree needed to decode a stream.
///
/// These are built once per decoder and only read afterwards.
pub struct CodeTables {
    pub address_increment: PrefixCodeTree<u8>,
    pub macroblock_type_i: PrefixCodeTree<u8>,
    pub macroblock_type_p: PrefixCodeTree<u8>,
    pub macroblock_type_b: PrefixCodeTree<u8>,
    pub macroblock_type_d: PrefixCodeTree<u8>,
    pub coded_block_pattern: PrefixCodeTree<u8>,
    pub motion_code: PrefixCodeTree<i8>,
    pub dc_size_luma: PrefixCodeTree<u8>,
    pub dc_size_chroma: PrefixCodeTree<u8>,
    pub coefficients: PrefixCodeTree<CoefficientCode>,
}

impl CodeTables {
    pub fn new() -> Result<Self> {
        Ok(Self {
            address_increment: PrefixCodeTree::from_codes(MACROBLOCK_ADDRESS_INCREMENT)?,
            macroblock_type_i: PrefixCodeTree::from_codes(MACROBLOCK_TYPE_I)?,
            macroblock_type_p: PrefixCodeTree::from_codes(MACROBLOCK_TYPE_P)?,
            macroblock_type_b: PrefixCodeTree::from_codes(MACROBLOCK_TYPE_B)?,
            macroblock_type_d: PrefixCodeTree::from_codes(MACROBLOCK_TYPE_D)?,
            coded_block_pattern: PrefixCodeTree::from_codes(CODED_BLOCK_PATTERN)?,
            motion_code: PrefixCodeTree::from_codes(MOTION_CODE)?,
            dc_size_luma: PrefixCodeTree::from_codes(DCT_DC_SIZE_LUMA)?,
            dc_size_chroma: PrefixCodeTree::from_codes(DCT_DC_SIZE_CHROMA)?,
            coefficients: PrefixCodeTree::from_codes(&DCT_COEFFICIENTS)?,
        })
    }

    /// The macroblock type tree for a given kind of picture.
    pub fn macroblock_type(&self, frame_type: FrameType) -> &PrefixCodeTree<u8> {
        match frame_type {
            FrameType::I => &self.macroblock_type_i,
            FrameType::P => &self.macroblock_type_p,
            FrameType::B => &self.macroblock_type_b,
            FrameType::D => &self.macroblock_type_d,
        }
    }
}
