use crate::config::DEFAULT_INPUT_SIZE;
use crate::decode::DecodedImage;
use crate::error::PreprocessError;
use crate::letterbox::{LetterboxParams, letterbox};
use crate::tensor::build_tensor;
use crate::{Preprocess, PreprocessResult};
use common::span;

/// Letterbox + CHW encoding on the CPU. Holds no per-frame state, so one
/// instance can serve concurrent requests.
#[derive(Debug, Clone, Copy)]
pub struct CpuPreProcessor {
    pub input_size: u32,
}

impl CpuPreProcessor {
    pub fn new(input_size: u32) -> Self {
        Self { input_size }
    }

    pub fn preprocess_image(&self, image: &DecodedImage) -> Result<PreprocessResult, PreprocessError> {
        self.preprocess(&image.data, image.width, image.height)
    }
}

impl Default for CpuPreProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT_SIZE)
    }
}

impl Preprocess for CpuPreProcessor {
    fn preprocess(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> Result<PreprocessResult, PreprocessError> {
        let _s = span!("preprocess_frame");

        tracing::trace!(
            width,
            height,
            pixel_bytes = pixels.len(),
            "Preprocessing frame dimensions"
        );

        let params = LetterboxParams::compute(width, height, self.input_size)?;
        let canvas = letterbox(pixels, width, height, &params)?;
        let tensor = build_tensor(&canvas, self.input_size)?;

        Ok(PreprocessResult { tensor, params })
    }

    fn input_size(&self) -> u32 {
        self.input_size
    }
}
