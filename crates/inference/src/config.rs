use crate::postprocessing::{DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_VEHICLE_CLASS_ID};
use common::{env_or, env_string};
use preprocess::DEFAULT_INPUT_SIZE;

pub use common::Environment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionProvider {
    Cpu,
    Cuda,
}

impl ExecutionProvider {
    fn from_str_lossy(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "cuda" | "gpu" => ExecutionProvider::Cuda,
            _ => ExecutionProvider::Cpu,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub environment: Environment,
    pub model_path: String,
    pub input_name: String,
    pub output_name: String,
    pub input_size: u32,
    pub confidence_threshold: f32,
    pub vehicle_class_id: u32,
    pub execution_provider: ExecutionProvider,
    pub intra_threads: usize,
}

impl InferenceConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> anyhow::Result<Self> {
        let environment = Environment::from_env();

        let model_path = env_string("MODEL_PATH", "best.onnx");
        let input_name = env_string("MODEL_INPUT_NAME", "images");
        let output_name = env_string("MODEL_OUTPUT_NAME", "output0");

        let input_size = env_or("INPUT_SIZE", DEFAULT_INPUT_SIZE);
        if input_size == 0 {
            anyhow::bail!("INPUT_SIZE must be positive");
        }

        let confidence_threshold = env_or("CONFIDENCE_THRESHOLD", DEFAULT_CONFIDENCE_THRESHOLD);
        let vehicle_class_id = env_or("VEHICLE_CLASS_ID", DEFAULT_VEHICLE_CLASS_ID);
        let execution_provider =
            ExecutionProvider::from_str_lossy(&env_string("EXECUTION_PROVIDER", "cpu"));
        let intra_threads = env_or("INTRA_THREADS", 4usize);

        Ok(Self {
            environment,
            model_path,
            input_name,
            output_name,
            input_size,
            confidence_threshold,
            vehicle_class_id,
            execution_provider,
            intra_threads,
        })
    }

    /// Default configuration for tests
    pub fn test_default() -> Self {
        Self {
            environment: Environment::Development,
            model_path: "/models/best.onnx".to_string(),
            input_name: "images".to_string(),
            output_name: "output0".to_string(),
            input_size: DEFAULT_INPUT_SIZE,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            vehicle_class_id: DEFAULT_VEHICLE_CLASS_ID,
            execution_provider: ExecutionProvider::Cpu,
            intra_threads: 1,
        }
    }
}
