use super::{
    DetectionHistory, DetectionRecord, LotId, ResultSink, SlotRegistry, SlotSource, active_sorted,
    upsert_slots,
};
use crate::assembler::OccupancyResult;
use crate::error::OccupancyError;
use schema::ParkingSlot;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// In-process slot registry and detection history.
#[derive(Default)]
pub struct MemoryStore {
    slots: Mutex<BTreeMap<LotId, Vec<ParkingSlot>>>,
    history: Mutex<Vec<DetectionRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slots(lot_id: LotId, slots: Vec<ParkingSlot>) -> Self {
        Self {
            slots: Mutex::new(BTreeMap::from([(lot_id, slots)])),
            history: Mutex::default(),
        }
    }

    /// Every persisted record, oldest first.
    pub fn records(&self) -> Vec<DetectionRecord> {
        self.history.lock().map(|h| h.clone()).unwrap_or_default()
    }
}

fn poisoned(what: &str) -> OccupancyError {
    OccupancyError::Storage(format!("{} lock poisoned", what))
}

impl SlotSource for MemoryStore {
    fn fetch_slots(&self, lot_id: LotId) -> Result<Vec<ParkingSlot>, OccupancyError> {
        let map = self.slots.lock().map_err(|_| poisoned("slot"))?;
        Ok(map.get(&lot_id).map(|s| active_sorted(s)).unwrap_or_default())
    }
}

impl SlotRegistry for MemoryStore {
    fn register_slots(&self, lot_id: LotId, slots: &[ParkingSlot]) -> Result<usize, OccupancyError> {
        let mut map = self.slots.lock().map_err(|_| poisoned("slot"))?;
        upsert_slots(map.entry(lot_id).or_default(), slots);
        Ok(slots.len())
    }

    fn delete_slots(&self, lot_id: LotId) -> Result<usize, OccupancyError> {
        let mut map = self.slots.lock().map_err(|_| poisoned("slot"))?;
        Ok(map.remove(&lot_id).map(|s| s.len()).unwrap_or(0))
    }
}

impl ResultSink for MemoryStore {
    fn persist_result(
        &self,
        lot_id: LotId,
        result: &OccupancyResult,
        image_path: Option<&str>,
    ) -> Result<(), OccupancyError> {
        let mut history = self
            .history
            .lock()
            .map_err(|_| OccupancyError::PersistenceFailure("history lock poisoned".to_string()))?;
        history.push(DetectionRecord::new(lot_id, result, image_path));
        Ok(())
    }
}

impl DetectionHistory for MemoryStore {
    fn latest_result(&self, lot_id: LotId) -> Result<Option<DetectionRecord>, OccupancyError> {
        let history = self.history.lock().map_err(|_| poisoned("history"))?;
        Ok(history.iter().rev().find(|r| r.lot_id == lot_id).cloned())
    }
}
