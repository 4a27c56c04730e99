use thiserror::Error;

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Model is still loading")]
    NotReady,

    #[error("Model failed to load: {0}")]
    LoadFailed(String),

    #[error("Inference backend error: {0}")]
    Backend(#[source] anyhow::Error),

    #[error("Malformed model output: {0}")]
    MalformedOutput(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_formatting() {
        assert_eq!(InferenceError::NotReady.to_string(), "Model is still loading");
        assert_eq!(
            InferenceError::LoadFailed("best.onnx not found".to_string()).to_string(),
            "Model failed to load: best.onnx not found"
        );
        assert_eq!(
            InferenceError::MalformedOutput("len 7".to_string()).to_string(),
            "Malformed model output: len 7"
        );
    }
}
