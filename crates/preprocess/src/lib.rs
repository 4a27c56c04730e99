pub mod config;
pub mod cpu;
pub mod decode;
pub mod error;
pub mod letterbox;
pub mod tensor;

use ndarray::{Array, IxDyn};

pub use config::{DEFAULT_INPUT_SIZE, LETTERBOX_FILL};
pub use cpu::CpuPreProcessor;
pub use decode::{DecodedImage, decode_image};
pub use error::PreprocessError;
pub use letterbox::{LetterboxParams, letterbox};
pub use tensor::{build_tensor, chw_index};

/// Model input together with the letterbox geometry needed to map detections
/// back onto the original frame.
#[derive(Debug)]
pub struct PreprocessResult {
    /// `[1, 3, T, T]` CHW tensor, values in `[0, 1]`
    pub tensor: Array<f32, IxDyn>,
    pub params: LetterboxParams,
}

/// Trait for image preprocessing implementations
pub trait Preprocess {
    /// Letterbox and encode interleaved RGB8 `pixels` of size `width`×`height`.
    fn preprocess(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> Result<PreprocessResult, PreprocessError>;

    /// Side length of the square model input.
    fn input_size(&self) -> u32;
}
