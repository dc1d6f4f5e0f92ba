//! Reference picture prediction

use crate::decoder::picture::Picture;
use crate::error::{Error, Result};

/// Add the samples of a reference picture onto a predicted picture.
///
/// This is conditional replenishment: the residual already decoded into
/// `new_picture` is added to the co-located reference sample, wrapping at
/// 8 bits. Motion vectors are not applied. Both pictures must have the same
/// size.
pub fn gather(reference_picture: &Picture, new_picture: &mut Picture) -> Result<()> {
    if reference_picture.dimensions() != new_picture.dimensions() {
        return Err(Error::InvalidArgument);
    }

    let reference_planes = [
        reference_picture.as_luma(),
        reference_picture.as_chroma_b(),
        reference_picture.as_chroma_r(),
    ];

    for (plane, reference_plane) in new_picture
        .planes_mut()
        .iter_mut()
        .zip(reference_planes.iter())
    {
        for (sample, reference_sample) in plane.iter_mut().zip(reference_plane.iter()) {
            *sample = sample.wrapping_add(*reference_sample);
        }
    }

    Ok(())
}
