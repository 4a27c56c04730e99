use crate::pipeline::PipelineConfig;
use common::{env_or, env_string};
use inference::InferenceConfig;
use std::env;
use std::path::PathBuf;

pub use common::Environment;

#[derive(Debug, Clone)]
pub struct OccupancyConfig {
    pub inference: InferenceConfig,
    pub slot_store_path: PathBuf,
    pub history_path: PathBuf,
    pub request_timeout_ms: u64,
    pub otel_endpoint: Option<String>,
}

impl OccupancyConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> anyhow::Result<Self> {
        let inference = InferenceConfig::from_env()?;

        let slot_store_path = PathBuf::from(env_string("SLOT_STORE_PATH", "parking_slots.json"));
        let history_path = PathBuf::from(env_string("HISTORY_PATH", "detection_history.jsonl"));
        let request_timeout_ms = env_or("REQUEST_TIMEOUT_MS", 30_000u64);

        let otel_endpoint = env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .filter(|s| !s.trim().is_empty());

        Ok(Self {
            inference,
            slot_store_path,
            history_path,
            request_timeout_ms,
            otel_endpoint,
        })
    }

    pub fn environment(&self) -> Environment {
        self.inference.environment
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::from(&self.inference)
    }
}
