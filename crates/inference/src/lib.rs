pub mod backend;
pub mod config;
pub mod error;
pub mod handle;
pub mod postprocessing;

// Re-export commonly used types for convenience
pub use backend::{InferenceBackend, InferenceOutput};
pub use config::{ExecutionProvider, InferenceConfig};
pub use error::InferenceError;
pub use handle::{ModelHandle, ModelStatus};
pub use postprocessing::{DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_VEHICLE_CLASS_ID, PostProcessor};
