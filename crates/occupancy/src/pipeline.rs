use crate::assembler::{OccupancyResult, assemble};
use crate::error::OccupancyError;
use crate::matcher::{OccupancyMatcher, OverlapThresholds};
use common::span;
use image::RgbImage;
use inference::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_VEHICLE_CLASS_ID, InferenceBackend, InferenceConfig,
    InferenceError, ModelHandle, PostProcessor,
};
use preprocess::{
    CpuPreProcessor, DEFAULT_INPUT_SIZE, Preprocess, PreprocessResult, decode_image,
};
use schema::{Detection, ParkingSlot};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    pub target_size: u32,
    pub confidence_threshold: f32,
    pub vehicle_class_id: u32,
    pub thresholds: OverlapThresholds,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_size: DEFAULT_INPUT_SIZE,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            vehicle_class_id: DEFAULT_VEHICLE_CLASS_ID,
            thresholds: OverlapThresholds::default(),
        }
    }
}

impl From<&InferenceConfig> for PipelineConfig {
    fn from(config: &InferenceConfig) -> Self {
        Self {
            target_size: config.input_size,
            confidence_threshold: config.confidence_threshold,
            vehicle_class_id: config.vehicle_class_id,
            thresholds: OverlapThresholds::default(),
        }
    }
}

/// Frame in, slot occupancy out.
///
/// Holds no per-request state: every call allocates its own tensor and
/// detection list, and the model handle is only read. Share it behind an
/// `Arc` to serve concurrent frames.
pub struct OccupancyPipeline<B> {
    model: Arc<ModelHandle<B>>,
    preprocessor: CpuPreProcessor,
    postprocessor: PostProcessor,
    matcher: OccupancyMatcher,
}

impl<B: InferenceBackend> OccupancyPipeline<B> {
    pub fn new(model: Arc<ModelHandle<B>>, config: PipelineConfig) -> Self {
        Self {
            model,
            preprocessor: CpuPreProcessor::new(config.target_size),
            postprocessor: PostProcessor::new(config.confidence_threshold, config.vehicle_class_id),
            matcher: OccupancyMatcher::new(config.thresholds),
        }
    }

    pub fn model(&self) -> &ModelHandle<B> {
        &self.model
    }

    /// Decode `image_bytes` and compute which of the active `slots` hold a
    /// vehicle.
    pub fn compute_occupancy(
        &self,
        image_bytes: &[u8],
        slots: &[ParkingSlot],
    ) -> Result<OccupancyResult, OccupancyError> {
        let active = active_slots(slots)?;
        let backend = self.model.backend()?;

        let image = decode_image(image_bytes)?;
        let prepared = self.preprocessor.preprocess_image(&image)?;
        self.run(backend, prepared, image.width, image.height, &active)
    }

    /// Same as [`Self::compute_occupancy`] for a frame that is already decoded.
    pub fn compute_from_rgb(
        &self,
        image: &RgbImage,
        slots: &[ParkingSlot],
    ) -> Result<OccupancyResult, OccupancyError> {
        let active = active_slots(slots)?;
        let backend = self.model.backend()?;

        let (width, height) = image.dimensions();
        let prepared = self.preprocessor.preprocess(image.as_raw(), width, height)?;
        self.run(backend, prepared, width, height, &active)
    }

    /// Run the detector and decoder only; detections are in original-image pixels.
    pub fn detect(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<Detection>, OccupancyError> {
        let backend = self.model.backend()?;
        let prepared = self.preprocessor.preprocess(pixels, width, height)?;
        self.detect_with(backend, prepared, width, height)
    }

    fn detect_with(
        &self,
        backend: &B,
        prepared: PreprocessResult,
        width: u32,
        height: u32,
    ) -> Result<Vec<Detection>, OccupancyError> {
        let output = {
            let _s = span!("inference");
            backend
                .infer(&prepared.tensor)
                .map_err(InferenceError::Backend)?
        };

        let detections = {
            let _s = span!("postprocess");
            self.postprocessor
                .parse_detections(output.rows()?, &prepared.params, width, height)?
        };

        Ok(detections)
    }

    fn run(
        &self,
        backend: &B,
        prepared: PreprocessResult,
        width: u32,
        height: u32,
        slots: &[&ParkingSlot],
    ) -> Result<OccupancyResult, OccupancyError> {
        let detections = self.detect_with(backend, prepared, width, height)?;

        let occupied = {
            let _s = span!("match_slots");
            self.matcher.occupied_labels(slots.iter().copied(), &detections)
        };
        let result = assemble(slots.iter().map(|s| s.label.as_str()), &occupied);

        tracing::debug!(
            width,
            height,
            detections = detections.len(),
            occupied = result.occupied.len(),
            total = result.total,
            "Computed occupancy"
        );

        Ok(result)
    }
}

fn active_slots(slots: &[ParkingSlot]) -> Result<Vec<&ParkingSlot>, OccupancyError> {
    let active: Vec<&ParkingSlot> = slots.iter().filter(|s| s.active).collect();
    if active.is_empty() {
        return Err(OccupancyError::NoSlotsConfigured);
    }
    Ok(active)
}
