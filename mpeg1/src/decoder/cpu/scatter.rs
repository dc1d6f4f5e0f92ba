//! Decoded picture output

use crate::decoder::frame::PixelFormat;
use crate::decoder::picture::Picture;
use crate::error::{Error, Result};
use crate::traits::FrameTarget;
use crate::types::BlockKind;

/// Scatter an individual block into a pixel data array.
///
/// Pixel data is row-major with `samples_per_row` bytes per row; block data
/// is row-major 8x8. Samples that fall outside of `plane_size` are dropped.
fn scatter_block(
    pixel_data: &mut [u8],
    samples_per_row: usize,
    plane_size: (usize, usize),
    pos: (usize, usize),
    block_data: &[u8],
) {
    for (v, y) in (pos.1..pos.1 + 8).enumerate() {
        if y >= plane_size.1 {
            break;
        }

        for (u, x) in (pos.0..pos.0 + 8).enumerate() {
            if x >= plane_size.0 {
                break;
            }

            if let Some(pixel) = pixel_data.get_mut(x + y * samples_per_row) {
                *pixel = block_data[u + v * 8];
            }
        }
    }
}

/// Check that a frame can receive pictures of the given size.
pub fn validate_target<T>(target: &T, width: usize, height: usize) -> Result<()>
where
    T: FrameTarget + ?Sized,
{
    if target.pixel_format() != PixelFormat::Yuv420p
        || target.plane_count() != 3
        || target.dimensions() != (width, height)
    {
        return Err(Error::InvalidArgument);
    }

    Ok(())
}

/// Copy a tiled picture into a frame's row-major planes.
pub fn scatter<T>(picture: &Picture, target: &mut T) -> Result<()>
where
    T: FrameTarget + ?Sized,
{
    let (width, height) = picture.dimensions();
    let luma_size = (width as usize, height as usize);
    let chroma_size = ((luma_size.0 + 1) / 2, (luma_size.1 + 1) / 2);
    let mb_width = picture.mb_width();

    for (plane_index, plane_size) in [luma_size, chroma_size, chroma_size].iter().enumerate() {
        let (pixel_data, samples_per_row) =
            target.plane_mut(plane_index).ok_or(Error::InvalidArgument)?;

        for mb_index in 0..picture.mb_count() {
            let pos = ((mb_index % mb_width) * 16, (mb_index / mb_width) * 16);

            for kind in BlockKind::ALL.iter().copied() {
                let block_pos = match (plane_index, kind) {
                    (0, BlockKind::Luma(n)) => {
                        (pos.0 + (n as usize % 2) * 8, pos.1 + (n as usize / 2) * 8)
                    }
                    (1, BlockKind::ChromaB) | (2, BlockKind::ChromaR) => (pos.0 / 2, pos.1 / 2),
                    _ => continue,
                };

                let block_data = picture
                    .block(mb_index, kind)
                    .ok_or(Error::InvalidArgument)?;

                scatter_block(
                    pixel_data,
                    samples_per_row,
                    *plane_size,
                    block_pos,
                    block_data,
                );
            }
        }
    }

    Ok(())
}
