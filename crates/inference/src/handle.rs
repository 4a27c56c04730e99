use crate::error::InferenceError;
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelStatus {
    Loading,
    Ready,
    Failed(String),
}

/// Write-once slot for the detector.
///
/// Starts out `Loading`, is completed exactly once with either a backend or a
/// load error, and is read-only afterwards. Requests that arrive before the
/// model is ready see [`InferenceError::NotReady`]; a failed load is reported
/// as [`InferenceError::LoadFailed`].
pub struct ModelHandle<B> {
    state: OnceLock<Result<B, String>>,
}

impl<B> ModelHandle<B> {
    pub fn loading() -> Self {
        Self {
            state: OnceLock::new(),
        }
    }

    pub fn ready(backend: B) -> Self {
        Self {
            state: OnceLock::from(Ok(backend)),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            state: OnceLock::from(Err(reason.into())),
        }
    }

    /// Record the outcome of a load. Returns `false` if the handle was already
    /// completed; the first outcome wins.
    pub fn complete(&self, outcome: anyhow::Result<B>) -> bool {
        let outcome = outcome.map_err(|e| format!("{:#}", e));
        self.state.set(outcome).is_ok()
    }

    pub fn status(&self) -> ModelStatus {
        match self.state.get() {
            None => ModelStatus::Loading,
            Some(Ok(_)) => ModelStatus::Ready,
            Some(Err(reason)) => ModelStatus::Failed(reason.clone()),
        }
    }

    pub fn backend(&self) -> Result<&B, InferenceError> {
        match self.state.get() {
            None => Err(InferenceError::NotReady),
            Some(Ok(backend)) => Ok(backend),
            Some(Err(reason)) => Err(InferenceError::LoadFailed(reason.clone())),
        }
    }
}

impl<B: Send + Sync + 'static> ModelHandle<B> {
    /// Start loading on a background thread and hand back a handle that is
    /// `Loading` until the loader returns. Joining the returned thread waits
    /// for the outcome.
    pub fn spawn_load<F>(loader: F) -> (Arc<Self>, JoinHandle<()>)
    where
        F: FnOnce() -> anyhow::Result<B> + Send + 'static,
    {
        let handle = Arc::new(Self::loading());
        let target = Arc::clone(&handle);

        let loader_thread = thread::spawn(move || {
            tracing::info!("Loading inference model");
            let outcome = loader();
            match &outcome {
                Ok(_) => tracing::info!("Model loaded successfully"),
                Err(e) => tracing::error!(error = %e, "Model failed to load"),
            }
            target.complete(outcome);
        });

        (handle, loader_thread)
    }
}
