//! End-to-end decoding of small synthetic elementary streams.

use mpeg1_rs::{
    BitReader, DecoderContext, DecoderOption, Error, FrameType, YuvFrame, EXTENSION_START_CODE,
    GROUP_START_CODE, PICTURE_START_CODE, SEQUENCE_END_CODE, SEQUENCE_HEADER_CODE,
    SLICE_START_CODE_FIRST, USER_DATA_START_CODE,
};
use std::io::Cursor;

/// `dct_dc_size_luminance` codes by size.
const LUMA_DC_SIZE: [(u32, u32); 9] = [
    (0b100, 3),
    (0b00, 2),
    (0b01, 2),
    (0b101, 3),
    (0b110, 3),
    (0b1110, 4),
    (0b1111_0, 5),
    (0b1111_10, 6),
    (0b1111_110, 7),
];

/// `dct_dc_size_chrominance` codes by size.
const CHROMA_DC_SIZE: [(u32, u32); 9] = [
    (0b00, 2),
    (0b01, 2),
    (0b10, 2),
    (0b110, 3),
    (0b1110, 4),
    (0b1111_0, 5),
    (0b1111_10, 6),
    (0b1111_110, 7),
    (0b1111_1110, 8),
];

/// Packs fields MSB-first into bytes.
#[derive(Default)]
struct BitWriter {
    data: Vec<u8>,
    used_bits: u32,
}

impl BitWriter {
    fn put(&mut self, value: u32, count: u32) {
        for i in (0..count).rev() {
            if self.used_bits == 0 {
                self.data.push(0);
            }

            let bit = ((value >> i) & 1) as u8;
            if let Some(last) = self.data.last_mut() {
                *last |= bit << (7 - self.used_bits);
            }

            self.used_bits = (self.used_bits + 1) % 8;
        }
    }

    fn align(&mut self) {
        self.used_bits = 0;
    }

    fn start_code(&mut self, code: u32) {
        self.align();
        self.put(code, 32);
    }

    fn bytes(&mut self, bytes: &[u8]) {
        self.align();
        self.data.extend_from_slice(bytes);
    }

    fn byte_len(&self) -> usize {
        self.data.len()
    }

    fn finish(mut self) -> Vec<u8> {
        self.align();
        self.data
    }

    fn sequence_header(&mut self, width: u32, height: u32) {
        self.start_code(SEQUENCE_HEADER_CODE);
        self.put(width, 12);
        self.put(height, 12);
        self.put(1, 4); // square pels
        self.put(3, 4); // 25 fps
        self.put(1, 18);
        self.put(1, 1);
        self.put(1, 10);
        self.put(0, 1);
        self.put(0, 1);
        self.put(0, 1);
    }

    fn group_header(&mut self) {
        self.start_code(GROUP_START_CODE);
        self.put(0, 1);
        self.put(0, 5);
        self.put(0, 6);
        self.put(1, 1);
        self.put(0, 6);
        self.put(0, 6);
        self.put(1, 1); // closed
        self.put(0, 1);
        self.put(0, 5);
    }

    fn picture_header(&mut self, temporal_reference: u32, frame_type: FrameType) {
        self.start_code(PICTURE_START_CODE);
        self.put(temporal_reference, 10);
        self.put(
            match frame_type {
                FrameType::I => 1,
                FrameType::P => 2,
                FrameType::B => 3,
                FrameType::D => 4,
            },
            3,
        );
        self.put(0xFFFF, 16);

        if frame_type == FrameType::P || frame_type == FrameType::B {
            self.put(0, 1);
            self.put(1, 3);
        }

        if frame_type == FrameType::B {
            self.put(0, 1);
            self.put(1, 3);
        }

        self.put(0, 1);
        self.align();
    }

    fn slice_header(&mut self, row: u32, quantizer_scale: u32) {
        self.start_code(SLICE_START_CODE_FIRST + row);
        self.put(quantizer_scale, 5);
        self.put(0, 1);
    }

    fn intra_dc(&mut self, luma: bool, diff: i32) {
        let size = 32 - diff.unsigned_abs().leading_zeros();
        let (code, length) = if luma {
            LUMA_DC_SIZE[size as usize]
        } else {
            CHROMA_DC_SIZE[size as usize]
        };

        self.put(code, length);
        if size > 0 {
            let bits = if diff > 0 {
                diff
            } else {
                diff + (1 << size) - 1
            };
            self.put(bits as u32, size);
        }
    }

    /// An I picture macroblock right after the previous one, with no AC
    /// coefficients.
    fn intra_macroblock(&mut self, luma_dc_diffs: [i32; 4]) {
        self.put(0b1, 1); // address increment 1
        self.put(0b1, 1); // intra

        for diff in luma_dc_diffs.iter() {
            self.intra_dc(true, *diff);
            self.put(0b10, 2);
        }

        for _ in 0..2 {
            self.intra_dc(false, 0);
            self.put(0b10, 2);
        }
    }

    /// A D picture macroblock right after the previous one.
    fn dc_macroblock(&mut self) {
        self.put(0b1, 1);
        self.put(0b1, 1);

        for _ in 0..4 {
            self.intra_dc(true, 0);
        }

        for _ in 0..2 {
            self.intra_dc(false, 0);
        }

        self.put(0b1, 1); // end of macroblock
    }
}

fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Luma sample at a position of a tightly packed frame.
fn luma(frame: &YuvFrame, x: usize, y: usize) -> u8 {
    frame.luma()[y * frame.stride(0) + x]
}

/// A 32x32 sequence whose first picture is intra coded with different DC
/// levels per macroblock.
fn intra_stream() -> BitWriter {
    let mut w = BitWriter::default();
    w.sequence_header(32, 32);
    w.group_header();
    w.picture_header(0, FrameType::I);

    w.slice_header(0, 8);
    w.intra_macroblock([2, 0, 0, 0]);
    w.intra_macroblock([-2, 0, 0, 0]);

    w.slice_header(1, 8);
    w.intra_macroblock([0, 0, 0, 0]);
    w.intra_macroblock([1, 0, 0, 0]);

    w
}

fn append_predicted_picture(w: &mut BitWriter) {
    w.picture_header(1, FrameType::P);
    w.slice_header(0, 8);

    // coded residual in the first luma block, DC level 1
    w.put(0b1, 1);
    w.put(0b01, 2);
    w.put(0b1010, 4);
    w.put(0b10, 2);
    w.put(0b10, 2);

    // skip two macroblocks, then a forward predicted one with a zero vector
    w.put(0b010, 3);
    w.put(0b001, 3);
    w.put(0b1, 1);
    w.put(0b1, 1);
}

fn check_intra_picture(frame: &YuvFrame) {
    // DC differences of +2 and -2 are 16 apart after reconstruction
    assert_eq!(130, luma(frame, 0, 0));
    assert_eq!(130, luma(frame, 15, 15));
    assert_eq!(128, luma(frame, 16, 0));
    assert_eq!(128, luma(frame, 31, 15));

    // the DC predictor starts from zero again in the second slice
    assert_eq!(128, luma(frame, 0, 16));
    assert_eq!(129, luma(frame, 16, 16));
    assert_eq!(129, luma(frame, 31, 31));

    assert!(frame.chroma_b().iter().all(|s| *s == 128));
    assert!(frame.chroma_r().iter().all(|s| *s == 128));
}

#[test]
fn intra_then_predicted_picture() {
    init_test_logging();

    let mut w = intra_stream();
    append_predicted_picture(&mut w);
    w.start_code(SEQUENCE_END_CODE);
    let data = w.finish();

    let mut context =
        DecoderContext::new(BitReader::from_bytes(&data), DecoderOption::empty()).unwrap();
    let mut frame = YuvFrame::new(32, 32);

    let intra = context.decode_next(&mut frame).unwrap();
    assert_eq!(FrameType::I, intra.frame_type);
    assert!(intra.is_complete());
    check_intra_picture(&frame);

    let predicted = context.decode_next(&mut frame).unwrap();
    assert_eq!(FrameType::P, predicted.frame_type);
    assert_eq!(1, predicted.temporal_reference);
    assert_eq!(4, predicted.macroblocks_decoded);
    assert!(predicted.is_complete());

    // the residual block is centred on 128 as well, and wraps when added
    assert_eq!(((130 + 130) % 256) as u8, luma(&frame, 0, 0));
    assert_eq!(130, luma(&frame, 8, 0));
    assert_eq!(128, luma(&frame, 16, 0));
    assert_eq!(129, luma(&frame, 16, 16));

    assert_eq!(
        FrameType::I,
        context
            .penultimate_reference()
            .unwrap()
            .as_header()
            .frame_type
    );
    assert_eq!(
        FrameType::P,
        context.last_reference().unwrap().as_header().frame_type
    );

    assert!(matches!(
        context.decode_next(&mut frame).unwrap_err(),
        Error::EndOfStream
    ));
}

#[test]
fn dc_picture_is_not_kept() {
    init_test_logging();

    let mut w = intra_stream();
    w.picture_header(1, FrameType::D);
    for row in 0..2 {
        w.slice_header(row, 8);
        w.dc_macroblock();
        w.dc_macroblock();
    }
    w.start_code(SEQUENCE_END_CODE);
    let data = w.finish();

    let mut context =
        DecoderContext::new(BitReader::from_bytes(&data), DecoderOption::empty()).unwrap();
    let mut frame = YuvFrame::new(32, 32);

    context.decode_next(&mut frame).unwrap();
    let dc = context.decode_next(&mut frame).unwrap();

    assert_eq!(FrameType::D, dc.frame_type);
    assert_eq!(4, dc.macroblocks_decoded);
    assert!(frame.luma().iter().all(|s| *s == 0));
    assert_eq!(
        FrameType::I,
        context.last_reference().unwrap().as_header().frame_type
    );
    assert!(context.penultimate_reference().is_none());
}

#[test]
fn truncated_picture_is_still_output() {
    init_test_logging();

    let mut w = BitWriter::default();
    w.sequence_header(32, 32);
    w.picture_header(0, FrameType::I);
    w.slice_header(0, 8);
    w.intra_macroblock([2, 0, 0, 0]);
    w.intra_macroblock([-2, 0, 0, 0]);
    w.align();
    let cut = w.byte_len() + 5;
    w.slice_header(1, 8);
    w.intra_macroblock([0, 0, 0, 0]);
    w.intra_macroblock([1, 0, 0, 0]);

    let mut data = w.finish();
    data.truncate(cut);

    let mut context =
        DecoderContext::new(BitReader::from_bytes(&data), DecoderOption::empty()).unwrap();
    let mut frame = YuvFrame::new(32, 32);

    let decoded = context.decode_next(&mut frame).unwrap();
    assert_eq!(2, decoded.macroblocks_decoded);
    assert_eq!(4, decoded.macroblocks_expected);
    assert!(!decoded.is_complete());
    assert!(matches!(decoded.truncated_by, Some(Error::NeedMoreInput)));

    assert_eq!(130, luma(&frame, 0, 0));
    assert_eq!(128, luma(&frame, 16, 0));
    assert_eq!(0, luma(&frame, 0, 16));
}

#[test]
fn user_data_and_extensions_are_skipped() {
    init_test_logging();

    let mut w = BitWriter::default();
    w.sequence_header(32, 32);
    w.start_code(EXTENSION_START_CODE);
    w.bytes(&[0x14, 0x8A]);
    w.group_header();
    w.start_code(USER_DATA_START_CODE);
    w.bytes(b"synthetic");
    w.picture_header(0, FrameType::I);
    w.slice_header(0, 8);
    w.intra_macroblock([2, 0, 0, 0]);
    w.intra_macroblock([-2, 0, 0, 0]);
    w.slice_header(1, 8);
    w.intra_macroblock([0, 0, 0, 0]);
    w.intra_macroblock([1, 0, 0, 0]);
    w.start_code(SEQUENCE_END_CODE);
    let data = w.finish();

    let mut context =
        DecoderContext::new(BitReader::from_bytes(&data), DecoderOption::empty()).unwrap();
    assert!(context.group_header().unwrap().closed);

    let mut frame = YuvFrame::new(32, 32);
    assert!(context.decode_next(&mut frame).unwrap().is_complete());
    check_intra_picture(&frame);
}

#[test]
fn decode_from_small_source_buffer() {
    init_test_logging();

    let mut w = intra_stream();
    append_predicted_picture(&mut w);
    w.start_code(SEQUENCE_END_CODE);
    let data = w.finish();
    let len = data.len() as u64;

    let reader = BitReader::from_source_with_capacity(Cursor::new(data), len, 16);
    let mut context = DecoderContext::new(reader, DecoderOption::empty()).unwrap();
    assert_eq!(2, context.sequence_header().unwrap().mb_width);

    let mut frame = YuvFrame::new(32, 32);
    context.decode_next(&mut frame).unwrap();
    check_intra_picture(&frame);

    let predicted = context.decode_next(&mut frame).unwrap();
    assert_eq!(FrameType::P, predicted.frame_type);
    assert_eq!(4, luma(&frame, 0, 0));

    assert!(matches!(
        context.decode_next(&mut frame).unwrap_err(),
        Error::EndOfStream
    ));
}

#[test]
fn predicted_picture_without_reference() {
    init_test_logging();

    let mut w = BitWriter::default();
    w.sequence_header(32, 32);
    append_predicted_picture(&mut w);
    w.start_code(SEQUENCE_END_CODE);
    let data = w.finish();

    let mut context =
        DecoderContext::new(BitReader::from_bytes(&data), DecoderOption::empty()).unwrap();
    let mut frame = YuvFrame::new(32, 32);

    let predicted = context.decode_next(&mut frame).unwrap();
    assert_eq!(FrameType::P, predicted.frame_type);
    assert_eq!(130, luma(&frame, 0, 0));
    assert_eq!(0, luma(&frame, 8, 0));
}
