use crate::config::InferenceConfig;
use crate::error::InferenceError;
use ndarray::{Array, IxDyn};
use schema::RAW_DETECTION_STRIDE;

#[cfg(feature = "ort-backend")]
pub mod ort;

/// The detector behind the pipeline: takes a `[1, 3, T, T]` CHW tensor and
/// returns rows of `x1, y1, x2, y2, confidence, class_id` in model pixels.
///
/// Implementations are shared read-only across concurrent requests.
pub trait InferenceBackend: Send + Sync {
    fn load_model(config: &InferenceConfig) -> anyhow::Result<Self>
    where
        Self: Sized;

    fn infer(&self, images: &Array<f32, IxDyn>) -> anyhow::Result<InferenceOutput>;
}

/// Raw detector output, flattened in row-major order.
#[derive(Debug, Clone, Default)]
pub struct InferenceOutput {
    pub detections: Vec<f32>, // [1, N, 6] xyxy + conf + cls, model-space pixels
    pub shape: Vec<usize>,
}

impl InferenceOutput {
    pub fn from_flat(detections: Vec<f32>) -> Self {
        let shape = vec![detections.len()];
        Self { detections, shape }
    }

    /// The flat detection rows, once the reported shape agrees with the
    /// buffer and, for a batched tensor, its last axis is one detection row.
    pub fn rows(&self) -> Result<&[f32], InferenceError> {
        let expected: usize = self.shape.iter().product();
        if expected != self.detections.len() {
            return Err(InferenceError::MalformedOutput(format!(
                "shape {:?} does not match {} values",
                self.shape,
                self.detections.len()
            )));
        }

        if self.shape.len() > 1 && self.shape.last() != Some(&RAW_DETECTION_STRIDE) {
            return Err(InferenceError::MalformedOutput(format!(
                "expected rows of {} values, got shape {:?}",
                RAW_DETECTION_STRIDE, self.shape
            )));
        }

        Ok(&self.detections)
    }
}
