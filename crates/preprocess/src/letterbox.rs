use crate::config::LETTERBOX_FILL;
use crate::error::PreprocessError;
use common::span;
use fast_image_resize::{
    FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer,
    images::{Image, ImageRef},
};
use schema::Rect;

/// Aspect-preserving fit of an `orig_width`×`orig_height` image into a
/// `target_size`×`target_size` canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterboxParams {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    pub target_size: u32,
    pub resized_width: u32,
    pub resized_height: u32,
    pub orig_width: u32,
    pub orig_height: u32,
}

impl LetterboxParams {
    pub fn compute(width: u32, height: u32, target_size: u32) -> Result<Self, PreprocessError> {
        if width == 0 || height == 0 {
            return Err(PreprocessError::InvalidImage(format!(
                "image has zero dimension ({}x{})",
                width, height
            )));
        }
        if target_size == 0 {
            return Err(PreprocessError::InvalidImage(
                "target size must be positive".to_string(),
            ));
        }

        let target = target_size as f32;
        let scale = (target / width as f32).min(target / height as f32);

        // A 1x5000 strip still has to paint at least one column.
        let resized_width = ((width as f32 * scale).round() as u32).clamp(1, target_size);
        let resized_height = ((height as f32 * scale).round() as u32).clamp(1, target_size);

        let pad_x = (target_size - resized_width) / 2;
        let pad_y = (target_size - resized_height) / 2;

        Ok(Self {
            scale,
            pad_x: pad_x as f32,
            pad_y: pad_y as f32,
            target_size,
            resized_width,
            resized_height,
            orig_width: width,
            orig_height: height,
        })
    }

    /// Original-image pixel to model-input pixel.
    pub fn to_model(&self, x: f32, y: f32) -> (f32, f32) {
        (x * self.scale + self.pad_x, y * self.scale + self.pad_y)
    }

    /// Model-input pixel to original-image pixel; exact inverse of [`Self::to_model`].
    pub fn to_original(&self, x: f32, y: f32) -> (f32, f32) {
        ((x - self.pad_x) / self.scale, (y - self.pad_y) / self.scale)
    }

    pub fn rect_to_model(&self, rect: &Rect) -> Rect {
        let (x1, y1) = self.to_model(rect.x1, rect.y1);
        let (x2, y2) = self.to_model(rect.x2, rect.y2);
        Rect::new(x1, y1, x2, y2)
    }

    pub fn rect_to_original(&self, rect: &Rect) -> Rect {
        let (x1, y1) = self.to_original(rect.x1, rect.y1);
        let (x2, y2) = self.to_original(rect.x2, rect.y2);
        Rect::new(x1, y1, x2, y2)
    }
}

/// Resize interleaved RGB8 `pixels` by `params` and paste them, centered, into a
/// square canvas filled with [`LETTERBOX_FILL`]. Returns `T*T*3` bytes.
pub fn letterbox(
    pixels: &[u8],
    width: u32,
    height: u32,
    params: &LetterboxParams,
) -> Result<Vec<u8>, PreprocessError> {
    let _s = span!("letterbox");

    let expected_size = width as usize * height as usize * 3;
    if pixels.len() != expected_size {
        return Err(PreprocessError::InvalidImage(format!(
            "buffer size mismatch: expected {} bytes for {}x{} RGB, got {}",
            expected_size,
            width,
            height,
            pixels.len()
        )));
    }
    if (width, height) != (params.orig_width, params.orig_height) {
        return Err(PreprocessError::InvalidImage(format!(
            "letterbox params computed for {}x{}, image is {}x{}",
            params.orig_width, params.orig_height, width, height
        )));
    }

    let src = ImageRef::new(width, height, pixels, PixelType::U8x3)?;
    let mut resized = Image::new(params.resized_width, params.resized_height, PixelType::U8x3);

    Resizer::new().resize(
        &src,
        &mut resized,
        &ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear)),
    )?;

    let size = params.target_size as usize;
    let mut canvas = vec![LETTERBOX_FILL; size * size * 3];

    let row_bytes = params.resized_width as usize * 3;
    let pad_x = params.pad_x as usize;
    let pad_y = params.pad_y as usize;
    let resized_data = resized.buffer();

    for (y, src_row) in resized_data.chunks_exact(row_bytes).enumerate() {
        let dst_row = ((y + pad_y) * size + pad_x) * 3;
        canvas[dst_row..dst_row + row_bytes].copy_from_slice(src_row);
    }

    tracing::trace!(
        width,
        height,
        resized_width = params.resized_width,
        resized_height = params.resized_height,
        pad_x = params.pad_x,
        pad_y = params.pad_y,
        "Letterboxed frame"
    );

    Ok(canvas)
}
