//! RGBA to planar I420 (YUV 4:2:0)

use image::RgbaImage;

use crate::error::ConvertError;

/// Size in bytes of an I420 frame: `ceil(1.5 * width * height)`
pub fn i420_len(width: u32, height: u32) -> usize {
    (width as usize * height as usize * 3).div_ceil(2)
}

/// Convert RGBA into I420 planes written to `out`
///
/// Layout is the full-resolution Y plane followed by the quarter-resolution U
/// and V planes. Uses BT.601 limited-range coefficients; chroma is the average
/// of each 2x2 block. Both dimensions must be even.
pub fn rgba_to_i420(rgba: &RgbaImage, out: &mut [u8]) -> Result<(), ConvertError> {
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 || width % 2 != 0 || height % 2 != 0 {
        return Err(ConvertError::InvalidDimensions { width, height });
    }

    let expected = i420_len(width, height);
    if out.len() != expected {
        return Err(ConvertError::OutputSize {
            expected,
            actual: out.len(),
        });
    }

    let w = width as usize;
    let h = height as usize;
    let y_size = w * h;
    let uv_size = (w / 2) * (h / 2);

    let (y_plane, uv_planes) = out.split_at_mut(y_size);
    let (u_plane, v_plane) = uv_planes.split_at_mut(uv_size);
    let src = rgba.as_raw();

    for y in 0..h {
        for x in 0..w {
            let idx = (y * w + x) * 4;
            let (r, g, b) = (src[idx] as i32, src[idx + 1] as i32, src[idx + 2] as i32);
            y_plane[y * w + x] = luma(r, g, b);
        }
    }

    for cy in 0..h / 2 {
        for cx in 0..w / 2 {
            let (mut r, mut g, mut b) = (0i32, 0i32, 0i32);
            for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                let idx = ((cy * 2 + dy) * w + cx * 2 + dx) * 4;
                r += src[idx] as i32;
                g += src[idx + 1] as i32;
                b += src[idx + 2] as i32;
            }
            let (r, g, b) = ((r + 2) >> 2, (g + 2) >> 2, (b + 2) >> 2);

            let uv_idx = cy * (w / 2) + cx;
            u_plane[uv_idx] = (((-38 * r - 74 * g + 112 * b + 128) >> 8) + 128).clamp(0, 255) as u8;
            v_plane[uv_idx] = (((112 * r - 94 * g - 18 * b + 128) >> 8) + 128).clamp(0, 255) as u8;
        }
    }

    Ok(())
}

fn luma(r: i32, g: i32, b: i32) -> u8 {
    (((66 * r + 129 * g + 25 * b + 128) >> 8) + 16).clamp(0, 255) as u8
}
