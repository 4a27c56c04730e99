use crate::error::PreprocessError;
use common::span;
use ndarray::{Array, IxDyn};

/// Flat offset of pixel `(x, y)` in channel `c` of a `[1, 3, size, size]` tensor.
#[inline]
pub fn chw_index(c: usize, x: usize, y: usize, size: usize) -> usize {
    c * size * size + y * size + x
}

/// Convert a letterboxed `size`×`size` RGB8 canvas into the planar float input
/// the detector expects: shape `[1, 3, size, size]`, each byte divided by 255.
pub fn build_tensor(letterboxed: &[u8], size: u32) -> Result<Array<f32, IxDyn>, PreprocessError> {
    let _s = span!("build_tensor");

    let side = size as usize;
    let spatial = side * side;

    if letterboxed.len() != spatial * 3 {
        return Err(PreprocessError::Encoding(format!(
            "expected {}x{}x3 = {} bytes, got {}",
            size,
            size,
            spatial * 3,
            letterboxed.len()
        )));
    }

    let mut output = vec![0.0f32; 3 * spatial];

    for (i, px) in letterboxed.chunks_exact(3).enumerate() {
        output[i] = px[0] as f32 / 255.0;
        output[i + spatial] = px[1] as f32 / 255.0;
        output[i + 2 * spatial] = px[2] as f32 / 255.0;
    }

    Ok(Array::from_shape_vec(IxDyn(&[1, 3, side, side]), output)?)
}
