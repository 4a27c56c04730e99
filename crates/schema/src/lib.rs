//! Shared data model for the occupancy pipeline: rectangles, parking slots and
//! detections, in either original-image or model-input pixel space.

pub mod detection;
pub mod rect;
pub mod slot;

pub use detection::{Detection, RAW_DETECTION_STRIDE, RawDetection, VEHICLE_LABEL};
pub use rect::Rect;
pub use slot::ParkingSlot;
