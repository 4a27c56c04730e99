pub mod json;
pub mod memory;

use crate::assembler::{OccupancyResult, compare_labels};
use crate::error::OccupancyError;
use chrono::{DateTime, Utc};
use schema::ParkingSlot;
use serde::{Deserialize, Serialize};

pub use json::{JsonSlotStore, JsonlHistory};
pub use memory::MemoryStore;

pub type LotId = u32;

/// Lot used when a caller does not name one.
pub const DEFAULT_LOT_ID: LotId = 1;

/// Where slot layouts come from.
pub trait SlotSource: Send + Sync {
    /// Active slots of `lot_id`, ordered by label.
    fn fetch_slots(&self, lot_id: LotId) -> Result<Vec<ParkingSlot>, OccupancyError>;
}

/// Where computed results go. A failure here never invalidates the result.
pub trait ResultSink: Send + Sync {
    fn persist_result(
        &self,
        lot_id: LotId,
        result: &OccupancyResult,
        image_path: Option<&str>,
    ) -> Result<(), OccupancyError>;
}

pub trait SlotRegistry: SlotSource {
    /// Insert or replace slots by `(lot_id, label)`. Returns how many were written.
    fn register_slots(&self, lot_id: LotId, slots: &[ParkingSlot]) -> Result<usize, OccupancyError>;

    /// Remove every slot of `lot_id`. Returns how many were removed.
    fn delete_slots(&self, lot_id: LotId) -> Result<usize, OccupancyError>;
}

pub trait DetectionHistory: ResultSink {
    fn latest_result(&self, lot_id: LotId) -> Result<Option<DetectionRecord>, OccupancyError>;
}

/// One entry of the detection log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub lot_id: LotId,
    pub occupied: Vec<String>,
    pub available: Vec<String>,
    pub total_occupied: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl DetectionRecord {
    pub fn new(lot_id: LotId, result: &OccupancyResult, image_path: Option<&str>) -> Self {
        Self {
            lot_id,
            occupied: result.occupied.clone(),
            available: result.available.clone(),
            total_occupied: result.occupied.len(),
            image_path: image_path.map(str::to_string),
            created_at: Utc::now(),
        }
    }
}

/// Most recent detection of a lot alongside the layout it is drawn on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestDetection {
    #[serde(flatten)]
    pub record: DetectionRecord,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub layout: Vec<ParkingSlot>,
}

/// `None` when the lot has never been processed. A lot whose slots were
/// cleared since still reports its last record, with an empty layout.
pub fn latest_with_layout<H, S>(
    history: &H,
    slots: &S,
    lot_id: LotId,
) -> Result<Option<LatestDetection>, OccupancyError>
where
    H: DetectionHistory + ?Sized,
    S: SlotSource + ?Sized,
{
    let Some(record) = history.latest_result(lot_id)? else {
        return Ok(None);
    };
    let layout = slots.fetch_slots(lot_id)?;
    Ok(Some(LatestDetection { record, layout }))
}

/// Upsert `incoming` into `existing` by label, keeping first-seen positions.
fn upsert_slots(existing: &mut Vec<ParkingSlot>, incoming: &[ParkingSlot]) {
    for slot in incoming {
        match existing.iter_mut().find(|s| s.label == slot.label) {
            Some(current) => *current = slot.clone(),
            None => existing.push(slot.clone()),
        }
    }
}

fn active_sorted(slots: &[ParkingSlot]) -> Vec<ParkingSlot> {
    let mut active: Vec<ParkingSlot> = slots.iter().filter(|s| s.active).cloned().collect();
    active.sort_by(|a, b| compare_labels(&a.label, &b.label));
    active
}
