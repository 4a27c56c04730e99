use thiserror::Error;

#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Tensor encoding failed: {0}")]
    Encoding(String),

    #[error("Image buffer error: {0}")]
    ImageBuffer(#[from] fast_image_resize::ImageBufferError),

    #[error("Resize failed: {0}")]
    Resize(#[from] fast_image_resize::ResizeError),

    #[error("Tensor shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}
