//! Motion vector reconstruction

use crate::types::{MotionCode, MotionVector, MotionVectorCode, MotionVectorRange};

/// Reconstruct one component of a motion vector from its code and the
/// previous vector's component, as in ISO/IEC 11172-2 2.4.4.2.
///
/// `previous` is updated with the new component in coded units. The returned
/// component is in half-pel units.
fn reconstruct_component(code: MotionCode, range: MotionVectorRange, previous: &mut i16) -> i16 {
    let f = range.f();

    let complement = if f == 1 || code.code == 0 {
        0
    } else {
        f - 1 - code.residual as i16
    };

    let mut little = code.code as i16 * f;
    let big = if little == 0 {
        0
    } else if little > 0 {
        little -= complement;
        little - 32 * f
    } else {
        little += complement;
        little + 32 * f
    };

    let candidate = *previous + little;
    let component = if (-16 * f..16 * f).contains(&candidate) {
        candidate
    } else {
        *previous + big
    };

    *previous = component;

    if range.full_pel {
        component << 1
    } else {
        component
    }
}

/// Reconstruct a motion vector against its predictor.
pub fn mv_decode(
    code: MotionVectorCode,
    range: MotionVectorRange,
    predictor: &mut MotionVector,
) -> MotionVector {
    MotionVector {
        horizontal: reconstruct_component(code.horizontal, range, &mut predictor.horizontal),
        vertical: reconstruct_component(code.vertical, range, &mut predictor.vertical),
    }
}

/// The motion codes of a vector taken as-is, without a predictor or range.
pub fn mv_raw(code: MotionVectorCode) -> MotionVector {
    MotionVector {
        horizontal: code.horizontal.code as i16,
        vertical: code.vertical.code as i16,
    }
}
