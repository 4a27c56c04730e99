use inference::InferenceError;
use preprocess::PreprocessError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OccupancyError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Inference failed: {0}")]
    InferenceFailed(#[source] anyhow::Error),

    #[error("Malformed model output: {0}")]
    MalformedOutput(String),

    #[error("No active parking slots configured for this lot")]
    NoSlotsConfigured,

    #[error("Failed to persist detection result: {0}")]
    PersistenceFailure(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Coarse category of an [`OccupancyError`] for callers that branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidImage,
    ModelUnavailable,
    InferenceFailed,
    MalformedOutput,
    NoSlotsConfigured,
    PersistenceFailure,
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidImage => "invalid_image",
            ErrorKind::ModelUnavailable => "model_unavailable",
            ErrorKind::InferenceFailed => "inference_failed",
            ErrorKind::MalformedOutput => "malformed_output",
            ErrorKind::NoSlotsConfigured => "no_slots_configured",
            ErrorKind::PersistenceFailure => "persistence_failure",
            ErrorKind::Storage => "storage",
        }
    }
}

impl OccupancyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OccupancyError::InvalidImage(_) => ErrorKind::InvalidImage,
            OccupancyError::ModelUnavailable(_) => ErrorKind::ModelUnavailable,
            OccupancyError::InferenceFailed(_) => ErrorKind::InferenceFailed,
            OccupancyError::MalformedOutput(_) => ErrorKind::MalformedOutput,
            OccupancyError::NoSlotsConfigured => ErrorKind::NoSlotsConfigured,
            OccupancyError::PersistenceFailure(_) => ErrorKind::PersistenceFailure,
            OccupancyError::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl From<PreprocessError> for OccupancyError {
    fn from(err: PreprocessError) -> Self {
        match err {
            PreprocessError::InvalidImage(reason) => OccupancyError::InvalidImage(reason),
            // The frame decoded but could not be turned into a model input.
            other => OccupancyError::InvalidImage(other.to_string()),
        }
    }
}

impl From<InferenceError> for OccupancyError {
    fn from(err: InferenceError) -> Self {
        match err {
            InferenceError::NotReady => {
                OccupancyError::ModelUnavailable("model is still loading".to_string())
            }
            InferenceError::LoadFailed(reason) => OccupancyError::ModelUnavailable(reason),
            InferenceError::Backend(source) => OccupancyError::InferenceFailed(source),
            InferenceError::MalformedOutput(reason) => OccupancyError::MalformedOutput(reason),
        }
    }
}
