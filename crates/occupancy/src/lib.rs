pub mod assembler;
pub mod config;
pub mod error;
pub mod matcher;
pub mod pipeline;
pub mod service;
pub mod store;

// Re-export commonly used types for convenience
pub use assembler::{OccupancyResult, assemble, compare_labels};
pub use config::OccupancyConfig;
pub use error::{ErrorKind, OccupancyError};
pub use matcher::{
    OccupancyMatcher, OverlapDecision, OverlapThresholds, STRONG_ACCEPT_PCT, STRONG_REJECT_PCT,
    slot_occupied_by,
};
pub use pipeline::{OccupancyPipeline, PipelineConfig};
pub use service::{OccupancyReport, OccupancyService};
pub use store::{DEFAULT_LOT_ID, DetectionRecord, LatestDetection, LotId, latest_with_layout};
