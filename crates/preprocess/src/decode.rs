use crate::error::PreprocessError;
use common::span_debug;

/// Interleaved RGB8 frame, row-major.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl From<image::RgbImage> for DecodedImage {
    fn from(rgb: image::RgbImage) -> Self {
        let (width, height) = rgb.dimensions();
        Self {
            width,
            height,
            data: rgb.into_raw(),
        }
    }
}

/// Decode any raster format the `image` crate was built with into RGB8.
pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, PreprocessError> {
    let _s = span_debug!("decode_image");

    if bytes.is_empty() {
        return Err(PreprocessError::InvalidImage("empty image buffer".to_string()));
    }

    let img = image::load_from_memory(bytes)
        .map_err(|e| PreprocessError::InvalidImage(format!("decode failed: {}", e)))?;
    let decoded = DecodedImage::from(img.to_rgb8());

    if decoded.width == 0 || decoded.height == 0 {
        return Err(PreprocessError::InvalidImage(format!(
            "image has zero dimension ({}x{})",
            decoded.width, decoded.height
        )));
    }

    tracing::debug!(
        width = decoded.width,
        height = decoded.height,
        "Decoded image"
    );
    Ok(decoded)
}
