//! MPEG-1 decoder core

use crate::decoder::assembler::decode_picture;
use crate::decoder::cpu::{
    gather, scatter, validate_target, InverseDct, DEFAULT_INTRA_QUANT_MATRIX,
    DEFAULT_NON_INTRA_QUANT_MATRIX,
};
use crate::decoder::frame::DecodedFrame;
use crate::decoder::macroblock::MacroblockDecoder;
use crate::decoder::picture::Picture;
use crate::decoder::types::DecoderOption;
use crate::error::{Error, Result};
use crate::parser::{decode_group_header, decode_sequence_header, BitReader, CodeTables};
use crate::traits::FrameTarget;
use crate::types::{
    is_slice_start_code, GroupHeader, SequenceHeader, GROUP_START_CODE, PICTURE_START_CODE,
    SEQUENCE_END_CODE, SEQUENCE_HEADER_CODE,
};
use log::{debug, trace, warn};
use std::io::{self, Read};

/// All state necessary to decode a successive series of MPEG-1 pictures.
pub struct DecoderContext<R = io::Empty>
where
    R: Read,
{
    /// The bitstream being decoded.
    reader: BitReader<R>,

    /// External decoder options enabled on this decoder.
    decoder_options: DecoderOption,

    tables: CodeTables,

    idct: InverseDct,

    /// Quantizer matrices in force, in natural order.
    intra_quant_matrix: [u8; 64],
    non_intra_quant_matrix: [u8; 64],

    /// The sequence header in force, once one has been read.
    sequence: Option<SequenceHeader>,

    /// The most recent group of pictures header.
    group: Option<GroupHeader>,

    /// The two most recently decoded I or P pictures.
    last_reference: Option<Picture>,
    penultimate_reference: Option<Picture>,
}

impl<R> DecoderContext<R>
where
    R: Read,
{
    /// Construct a new `DecoderContext` over a bitstream.
    ///
    /// The stream is read up to its first picture, so that the sequence
    /// header is available straight away. A stream that does not yet hold
    /// that much data is not an error; the headers are picked up by the
    /// first decode instead.
    pub fn new(reader: BitReader<R>, decoder_options: DecoderOption) -> Result<Self> {
        let mut context = Self {
            reader,
            decoder_options,
            tables: CodeTables::new()?,
            idct: InverseDct::new(),
            intra_quant_matrix: DEFAULT_INTRA_QUANT_MATRIX,
            non_intra_quant_matrix: DEFAULT_NON_INTRA_QUANT_MATRIX,
            sequence: None,
            group: None,
            last_reference: None,
            penultimate_reference: None,
        };

        match context.prime() {
            Ok(()) => {}
            Err(e) if e.is_exhaustion() => debug!("stream too short to prime decoder: {}", e),
            Err(e) => return Err(e),
        }

        Ok(context)
    }

    pub fn decoder_options(&self) -> DecoderOption {
        self.decoder_options
    }

    /// Get the sequence header in force.
    pub fn sequence_header(&self) -> Option<&SequenceHeader> {
        self.sequence.as_ref()
    }

    /// Get the most recent group of pictures header.
    pub fn group_header(&self) -> Option<&GroupHeader> {
        self.group.as_ref()
    }

    /// Get the last I or P picture decoded in the bitstream.
    ///
    /// If `None`, then no reference pictures have yet to be decoded.
    pub fn last_reference(&self) -> Option<&Picture> {
        self.last_reference.as_ref()
    }

    /// Get the reference picture decoded before the last one.
    pub fn penultimate_reference(&self) -> Option<&Picture> {
        self.penultimate_reference.as_ref()
    }

    /// Access the underlying reader, to supply more data to a memory-backed
    /// reader or to inspect its position.
    pub fn reader_mut(&mut self) -> &mut BitReader<R> {
        &mut self.reader
    }

    /// Skip to the next start code without consuming it.
    ///
    /// This is the resynchronization primitive for corrupt streams.
    pub fn next_start_code(&mut self) -> Result<u32> {
        self.reader.next_start_code()
    }

    /// Read headers until the next picture start code.
    ///
    /// Does nothing if the reader is already at a picture.
    pub fn prime(&mut self) -> Result<()> {
        loop {
            let start_code = self.reader.next_start_code()?;

            match start_code {
                SEQUENCE_HEADER_CODE => {
                    let header = decode_sequence_header(&mut self.reader, self.decoder_options)?;
                    self.apply_sequence_header(header);
                }
                GROUP_START_CODE => {
                    self.group = Some(decode_group_header(&mut self.reader)?);
                }
                PICTURE_START_CODE if self.sequence.is_some() => return Ok(()),
                SEQUENCE_END_CODE => {
                    self.reader.skip_bits(32)?;
                    debug!("sequence end");
                    return Err(Error::EndOfStream);
                }
                code if is_slice_start_code(code) || code == PICTURE_START_CODE => {
                    trace!("skipping start code {:#010x} outside of a picture", code);
                    self.reader.skip_bits(32)?;
                }
                code => {
                    warn!("skipping start code {:#010x}", code);
                    self.reader.skip_bits(32)?;
                }
            }
        }
    }

    /// Put a new sequence header in force.
    ///
    /// Quantizer matrices the header does not carry revert to the defaults.
    /// Reference pictures of a different size are dropped.
    fn apply_sequence_header(&mut self, header: SequenceHeader) {
        self.intra_quant_matrix = header
            .intra_quant_matrix
            .unwrap_or(DEFAULT_INTRA_QUANT_MATRIX);
        self.non_intra_quant_matrix = header
            .non_intra_quant_matrix
            .unwrap_or(DEFAULT_NON_INTRA_QUANT_MATRIX);

        let resized = self
            .sequence
            .as_ref()
            .map_or(false, |s| (s.width, s.height) != (header.width, header.height));
        if resized {
            debug!("picture size changed, dropping reference pictures");
            self.last_reference = None;
            self.penultimate_reference = None;
        }

        self.sequence = Some(header);
    }

    /// Decode and predict the next picture.
    fn decode_next_picture(&mut self) -> Result<(DecodedFrame, Picture)> {
        self.prime()?;

        let sequence = self.sequence.as_ref().ok_or(Error::NotAllowed)?;
        let mut macroblock_decoder = MacroblockDecoder::new(
            &self.tables,
            &self.idct,
            &self.intra_quant_matrix,
            &self.non_intra_quant_matrix,
            self.decoder_options,
        );

        let assembled = decode_picture(&mut self.reader, sequence, &mut macroblock_decoder)?;
        let mut picture = assembled.picture;
        let frame_type = picture.as_header().frame_type;

        if frame_type.is_predicted() {
            match &self.last_reference {
                Some(reference) => gather(reference, &mut picture)?,
                None => warn!(
                    "{:?} picture {} has no reference picture to predict from",
                    frame_type,
                    picture.as_header().temporal_reference
                ),
            }
        }

        let frame = DecodedFrame {
            frame_type,
            temporal_reference: picture.as_header().temporal_reference,
            macroblocks_decoded: assembled.macroblocks_decoded,
            macroblocks_expected: picture.mb_count(),
            truncated_by: assembled.truncated_by,
        };

        debug!(
            "decoded {:?} picture {} ({} of {} macroblocks)",
            frame.frame_type,
            frame.temporal_reference,
            frame.macroblocks_decoded,
            frame.macroblocks_expected
        );

        Ok((frame, picture))
    }

    /// Keep a decoded picture if later pictures may predict from it.
    fn retain(&mut self, picture: Picture) {
        if picture.as_header().frame_type.is_reference() {
            self.penultimate_reference = self.last_reference.take();
            self.last_reference = Some(picture);
        }
    }

    /// Decode the next picture in the bitstream into a frame.
    ///
    /// The frame must be planar 4:2:0 with three planes and exactly the size
    /// of the sequence; otherwise this fails with `Error::InvalidArgument`
    /// before anything is read from the stream.
    ///
    /// A picture whose macroblocks stop decoding partway through is still
    /// written out and yielded; the returned `DecodedFrame` says how much of
    /// it was decoded. Reaching the end of the sequence yields
    /// `Error::EndOfStream`.
    pub fn decode_next<T>(&mut self, target: &mut T) -> Result<DecodedFrame>
    where
        T: FrameTarget + ?Sized,
    {
        self.prime()?;

        let sequence = self.sequence.as_ref().ok_or(Error::NotAllowed)?;
        validate_target(target, sequence.width as usize, sequence.height as usize)?;

        let (frame, picture) = self.decode_next_picture()?;
        scatter(&picture, target)?;
        self.retain(picture);

        Ok(frame)
    }

    /// Decode the next picture in the bitstream without writing it out.
    ///
    /// I and P pictures remain reachable through `last_reference`.
    pub fn decode_next_picture_only(&mut self) -> Result<DecodedFrame> {
        let (frame, picture) = self.decode_next_picture()?;
        self.retain(picture);

        Ok(frame)
    }
}
