use crate::config::InferenceConfig;
use crate::error::InferenceError;
use preprocess::LetterboxParams;
use schema::{Detection, RAW_DETECTION_STRIDE, RawDetection};

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;
pub const DEFAULT_VEHICLE_CLASS_ID: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostProcessor {
    pub confidence_threshold: f32,
    pub vehicle_class_id: u32,
}

impl Default for PostProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_VEHICLE_CLASS_ID)
    }
}

impl PostProcessor {
    pub fn new(confidence_threshold: f32, vehicle_class_id: u32) -> Self {
        Self {
            confidence_threshold,
            vehicle_class_id,
        }
    }

    pub fn from_config(config: &InferenceConfig) -> Self {
        Self::new(config.confidence_threshold, config.vehicle_class_id)
    }

    /// Turn the detector's flat `[x1, y1, x2, y2, confidence, class_id]` rows
    /// into vehicle detections in original-image pixels.
    ///
    /// Rows below the confidence threshold or of another class are dropped.
    /// Survivors keep their input order; there is no NMS.
    #[tracing::instrument(skip(self, raw, params), fields(rows = raw.len() / RAW_DETECTION_STRIDE))]
    pub fn parse_detections(
        &self,
        raw: &[f32],
        params: &LetterboxParams,
        orig_width: u32,
        orig_height: u32,
    ) -> Result<Vec<Detection>, InferenceError> {
        if raw.len() % RAW_DETECTION_STRIDE != 0 {
            return Err(InferenceError::MalformedOutput(format!(
                "output length {} is not a multiple of {}",
                raw.len(),
                RAW_DETECTION_STRIDE
            )));
        }

        let vehicle_class = self.vehicle_class_id as f32;
        let (max_x, max_y) = (orig_width as f32, orig_height as f32);
        let mut detections = Vec::new();

        for (row, chunk) in raw.chunks_exact(RAW_DETECTION_STRIDE).enumerate() {
            let chunk: &[f32; RAW_DETECTION_STRIDE] = chunk.try_into().map_err(|_| {
                InferenceError::MalformedOutput(format!("detection row {} is truncated", row))
            })?;
            let det = RawDetection::from_row(chunk);

            // NaN confidence compares false here and falls through to the finite check.
            if det.confidence < self.confidence_threshold {
                continue;
            }
            if det.class_id != vehicle_class {
                continue;
            }

            let rect = params.rect_to_original(&det.rect);
            if !rect.is_finite() || !det.confidence.is_finite() {
                return Err(InferenceError::MalformedOutput(format!(
                    "non-finite values in detection row {}",
                    row
                )));
            }

            detections.push(Detection::vehicle(
                rect.clamp_to(max_x, max_y),
                det.confidence,
            ));
        }

        tracing::debug!(kept = detections.len(), "Decoded vehicle detections");

        Ok(detections)
    }
}
