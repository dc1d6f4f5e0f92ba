//! Parsed MPEG-1 video bitstream types

/// Start code of a picture header.
pub const PICTURE_START_CODE: u32 = 0x0000_0100;

/// First slice start code. The low byte of a slice start code is the slice's
/// vertical position plus one.
pub const SLICE_START_CODE_FIRST: u32 = 0x0000_0101;

/// Last slice start code.
pub const SLICE_START_CODE_LAST: u32 = 0x0000_01AF;

pub const USER_DATA_START_CODE: u32 = 0x0000_01B2;
pub const SEQUENCE_HEADER_CODE: u32 = 0x0000_01B3;
pub const SEQUENCE_ERROR_CODE: u32 = 0x0000_01B4;
pub const EXTENSION_START_CODE: u32 = 0x0000_01B5;
pub const SEQUENCE_END_CODE: u32 = 0x0000_01B7;
pub const GROUP_START_CODE: u32 = 0x0000_01B8;

/// Determine if a 32-bit value is a slice start code.
pub fn is_slice_start_code(code: u32) -> bool {
    (SLICE_START_CODE_FIRST..=SLICE_START_CODE_LAST).contains(&code)
}

/// A rational number, always stored in lowest terms.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Ratio {
    pub num: u32,
    pub den: u32,
}

impl Ratio {
    /// Construct a ratio, reducing it by the greatest common divisor.
    ///
    /// A zero denominator yields `0/1`, which is also how reserved table
    /// entries are represented.
    pub fn reduced(num: u32, den: u32) -> Self {
        if den == 0 || num == 0 {
            return Ratio { num: 0, den: 1 };
        }

        let (mut a, mut b) = (num, den);
        while b != 0 {
            let t = a % b;
            a = b;
            b = t;
        }

        Ratio {
            num: num / a,
            den: den / a,
        }
    }

    /// The ratio as a floating point number.
    pub fn as_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }
}

/// ISO/IEC 11172-2 2.4.2.3 Sequence header
///
/// The sequence header carries the picture dimensions and the stream-wide
/// coding parameters. It is decoded once at the start of the stream and may
/// be repeated before any group of pictures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequenceHeader {
    /// Width of the displayable picture, in luma samples.
    pub width: u16,

    /// Height of the displayable picture, in luma samples.
    pub height: u16,

    /// Width of the picture in macroblocks, rounded up.
    pub mb_width: usize,

    /// Height of the picture in macroblocks, rounded up.
    pub mb_height: usize,

    /// The 4-bit pel aspect ratio code.
    pub aspect_ratio_code: u8,

    /// Pel aspect ratio (height/width of a pel) looked up from the code.
    pub aspect_ratio: Ratio,

    /// The 4-bit picture rate code.
    pub frame_rate_code: u8,

    /// Pictures per second looked up from the code.
    pub frame_rate: Ratio,

    /// Bit rate in bits per second. The stream stores it in units of 400.
    pub bit_rate: u32,

    /// Video buffering verifier buffer size, in units of 16 kbit.
    pub vbv_buffer_size: u16,

    pub constrained_parameters: bool,

    /// Whether the stream signals a custom intra quantizer matrix.
    pub has_intra_quant_matrix: bool,

    /// Whether the stream signals a custom non-intra quantizer matrix.
    pub has_non_intra_quant_matrix: bool,

    /// The custom intra matrix in natural order, if it was loaded.
    pub intra_quant_matrix: Option<[u8; 64]>,

    /// The custom non-intra matrix in natural order, if it was loaded.
    pub non_intra_quant_matrix: Option<[u8; 64]>,
}

impl SequenceHeader {
    /// The number of macroblocks in each picture.
    pub fn mb_count(&self) -> usize {
        self.mb_width * self.mb_height
    }

    /// Pictures per second, or zero for a reserved rate code.
    pub fn frames_per_second(&self) -> f64 {
        self.frame_rate.as_f64()
    }
}

/// ISO/IEC 11172-2 2.4.2.4 Group of pictures header
///
/// Only the time code and the closed/broken flags are carried.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupHeader {
    pub drop_frame: bool,
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
    pub pictures: u8,

    /// No picture in this group references a picture of the previous group.
    pub closed: bool,

    /// The first B pictures of this group cannot be decoded correctly because
    /// the reference picture they need is missing.
    pub broken: bool,
}

/// The coding type of a picture.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrameType {
    /// Intra-coded picture.
    I,

    /// Forward-predicted picture.
    P,

    /// Bidirectionally-predicted picture.
    B,

    /// DC-only intra picture.
    D,
}

impl FrameType {
    /// Convert the 3-bit `picture_coding_type` field.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::I),
            2 => Some(Self::P),
            3 => Some(Self::B),
            4 => Some(Self::D),
            _ => None,
        }
    }

    /// Whether pictures of this type are kept to predict later pictures.
    pub fn is_reference(self) -> bool {
        matches!(self, Self::I | Self::P)
    }

    /// Whether pictures of this type are reconstructed on top of a reference.
    pub fn is_predicted(self) -> bool {
        matches!(self, Self::P | Self::B)
    }
}

/// The full-pel flag and f_code for one motion vector direction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MotionVectorRange {
    /// Vectors are in integer pel units rather than half-pel units.
    pub full_pel: bool,

    /// The 3-bit f_code. Valid codes are 1 through 7.
    pub f_code: u8,
}

impl MotionVectorRange {
    /// Number of residual bits that follow a non-zero motion code.
    pub fn r_size(self) -> u32 {
        self.f_code.saturating_sub(1) as u32
    }

    /// The motion vector scale factor.
    pub fn f(self) -> i16 {
        1 << self.r_size()
    }
}

/// ISO/IEC 11172-2 2.4.2.5 Picture header
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PictureHeader {
    /// Display order of the picture, modulo 1024.
    pub temporal_reference: u16,

    pub frame_type: FrameType,

    pub vbv_delay: u16,

    /// Forward vector parameters. Present for P and B pictures only.
    pub forward: Option<MotionVectorRange>,

    /// Backward vector parameters. Present for B pictures only.
    pub backward: Option<MotionVectorRange>,

    /// Bytes of extra picture information.
    pub extra: Vec<u8>,
}

/// The value DC predictors are reset to when macroblocks are skipped.
pub const DC_PREDICTOR_RESET: i32 = 1024;

/// ISO/IEC 11172-2 2.4.2.6 Slice header, plus the decoding state carried
/// across the macroblocks of the slice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SliceHeader {
    /// The macroblock row this slice starts in.
    pub row: usize,

    /// Quantizer scale in force. Macroblocks may override it, and an override
    /// sticks for the rest of the slice.
    pub quantizer_scale: u8,

    /// DC predictors for luma, Cb and Cr, in that order.
    pub dc_predictors: [i32; 3],

    /// Bytes of extra slice information.
    pub extra: Vec<u8>,
}

impl SliceHeader {
    /// Reset all three DC predictors to the same value.
    pub fn reset_dc_predictors(&mut self, value: i32) {
        self.dc_predictors = [value; 3];
    }
}

bitflags! {
    /// The five coding flags of ISO/IEC 11172-2 2.4.3.6 `macroblock_type`.
    ///
    /// The macroblock type tables yield these bits directly.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct MacroblockFlags: u8 {
        const QUANT = 0x01;
        const MOTION_FORWARD = 0x02;
        const MOTION_BACKWARD = 0x04;
        const PATTERN = 0x08;
        const INTRA = 0x10;
    }
}

/// One component of a coded motion vector, prior to reconstruction.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MotionCode {
    /// The variable-length coded `motion_code`, in `-16..=16`.
    pub code: i8,

    /// The fixed-length `motion_r` residual. Only present when the code is
    /// non-zero and the f_code is above 1.
    pub residual: u8,
}

/// A coded motion vector as it appears in the macroblock header.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MotionVectorCode {
    pub horizontal: MotionCode,
    pub vertical: MotionCode,
}

/// A motion vector consisting of horizontal and vertical components.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MotionVector {
    pub horizontal: i16,
    pub vertical: i16,
}

impl MotionVector {
    pub fn zero() -> Self {
        Self::default()
    }
}

/// ISO/IEC 11172-2 2.4.2.7 Macroblock layer, minus the blocks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MacroblockHeader {
    /// Distance from the previous macroblock address, escapes included.
    pub address_increment: usize,

    pub flags: MacroblockFlags,

    /// The quantizer scale this macroblock is coded with.
    pub quantizer_scale: u8,

    /// Which of the six blocks are coded. Bit 5 is the first luma block and
    /// bit 0 is the Cr block.
    pub coded_block_pattern: u8,

    pub forward: Option<MotionVectorCode>,

    pub backward: Option<MotionVectorCode>,
}

impl MacroblockHeader {
    pub fn is_intra(&self) -> bool {
        self.flags.contains(MacroblockFlags::INTRA)
    }

    /// Whether the block at `index` (0-5) is coded.
    pub fn codes_block(&self, index: usize) -> bool {
        index < 6 && self.coded_block_pattern & (1 << (5 - index)) != 0
    }
}

/// A zero run followed by a non-zero level.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RunLevel {
    /// The number of zero coefficients preceding this one.
    pub run: u8,

    /// The value at the end of the current run.
    pub level: i16,
}

/// The six blocks of a macroblock, in bitstream order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BlockKind {
    /// One of the four luma blocks, numbered in raster order.
    Luma(u8),
    ChromaB,
    ChromaR,
}

impl BlockKind {
    /// All blocks in the order they are coded.
    pub const ALL: [BlockKind; 6] = [
        BlockKind::Luma(0),
        BlockKind::Luma(1),
        BlockKind::Luma(2),
        BlockKind::Luma(3),
        BlockKind::ChromaB,
        BlockKind::ChromaR,
    ];

    pub fn is_luma(self) -> bool {
        matches!(self, BlockKind::Luma(_))
    }

    /// Index of the DC predictor this block uses.
    pub fn component(self) -> usize {
        match self {
            BlockKind::Luma(_) => 0,
            BlockKind::ChromaB => 1,
            BlockKind::ChromaR => 2,
        }
    }
}
