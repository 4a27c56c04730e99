use super::{InferenceBackend, InferenceOutput};
use crate::config::{ExecutionProvider, InferenceConfig};
use ndarray::{Array, IxDyn};
use ort::{
    session::{Session, builder::GraphOptimizationLevel},
    value::TensorRef,
};
use std::sync::Mutex;

/// ONNX Runtime backend for an NMS-exported detector (`[1, 300, 6]` output).
pub struct OrtBackend {
    // ort needs `&mut Session` to run; requests share the backend through `&self`.
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
}

impl OrtBackend {
    /// Load model with specified execution provider
    pub fn load_model_with_provider(
        config: &InferenceConfig,
        provider: ExecutionProvider,
    ) -> anyhow::Result<Self> {
        // Initialize ORT environment (idempotent)
        let _ = ort::init().commit();

        let mut builder = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(config.intra_threads)?;

        match provider {
            ExecutionProvider::Cuda => {
                tracing::info!("Initializing ONNX Runtime with CUDA execution provider");
                builder = builder.with_execution_providers([
                    ort::execution_providers::CUDAExecutionProvider::default()
                        .with_device_id(0)
                        .build()
                        .error_on_failure(),
                ])?;
            }
            ExecutionProvider::Cpu => {
                tracing::info!("Initializing ONNX Runtime with CPU execution provider");
            }
        }

        let session = builder.commit_from_file(&config.model_path)?;

        tracing::info!(
            model_path = %config.model_path,
            input = %config.input_name,
            output = %config.output_name,
            "Model loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name: config.input_name.clone(),
            output_name: config.output_name.clone(),
        })
    }
}

impl InferenceBackend for OrtBackend {
    fn load_model(config: &InferenceConfig) -> anyhow::Result<Self> {
        Self::load_model_with_provider(config, config.execution_provider)
    }

    fn infer(&self, images: &Array<f32, IxDyn>) -> anyhow::Result<InferenceOutput> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("ONNX session lock poisoned"))?;

        let outputs = session.run(ort::inputs![
            self.input_name.as_str() => TensorRef::from_array_view(images.view())?
        ])?;

        let raw = outputs[self.output_name.as_str()].try_extract_array::<f32>()?;

        Ok(InferenceOutput {
            shape: raw.shape().to_vec(),
            detections: raw.iter().copied().collect(),
        })
    }
}
