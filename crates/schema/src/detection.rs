use crate::rect::Rect;
use serde::{Deserialize, Serialize};

/// Number of `f32` values the detector emits per box: x1, y1, x2, y2,
/// confidence, class id.
pub const RAW_DETECTION_STRIDE: usize = 6;

pub const VEHICLE_LABEL: &str = "vehicle";

/// One detector output row, still in model-input pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawDetection {
    pub rect: Rect,
    pub confidence: f32,
    pub class_id: f32,
}

impl RawDetection {
    pub fn from_row(row: &[f32; RAW_DETECTION_STRIDE]) -> Self {
        let [x1, y1, x2, y2, confidence, class_id] = *row;
        Self {
            rect: Rect::new(x1, y1, x2, y2),
            confidence,
            class_id,
        }
    }
}

/// A detection mapped back into original-image pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(flatten)]
    pub rect: Rect,
    pub confidence: f32,
    pub label: String,
}

impl Detection {
    pub fn vehicle(rect: Rect, confidence: f32) -> Self {
        Self {
            rect,
            confidence,
            label: VEHICLE_LABEL.to_string(),
        }
    }
}
