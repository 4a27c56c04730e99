use super::{
    DetectionHistory, DetectionRecord, LotId, ResultSink, SlotRegistry, SlotSource, active_sorted,
    upsert_slots,
};
use crate::assembler::OccupancyResult;
use crate::error::OccupancyError;
use schema::ParkingSlot;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

type Layout = BTreeMap<LotId, Vec<ParkingSlot>>;

fn storage_err(context: &str, path: &Path, err: impl std::fmt::Display) -> OccupancyError {
    OccupancyError::Storage(format!("{} {}: {}", context, path.display(), err))
}

/// Slot layouts for every lot in one JSON file, `{"<lot id>": [slot, ...]}`.
///
/// A missing file is an empty layout. Writes go to a sibling temp file that
/// is renamed over the original.
pub struct JsonSlotStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonSlotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>, OccupancyError> {
        self.lock
            .lock()
            .map_err(|_| OccupancyError::Storage("slot store lock poisoned".to_string()))
    }

    fn read_layout(&self) -> Result<Layout, OccupancyError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Layout::new()),
            Err(e) => return Err(storage_err("failed to read", &self.path, e)),
        };
        if raw.trim().is_empty() {
            return Ok(Layout::new());
        }
        serde_json::from_str(&raw).map_err(|e| storage_err("failed to parse", &self.path, e))
    }

    fn write_layout(&self, layout: &Layout) -> Result<(), OccupancyError> {
        let json = serde_json::to_string_pretty(layout)
            .map_err(|e| storage_err("failed to serialize", &self.path, e))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, json).map_err(|e| storage_err("failed to write", &tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| storage_err("failed to replace", &self.path, e))
    }
}

impl SlotSource for JsonSlotStore {
    fn fetch_slots(&self, lot_id: LotId) -> Result<Vec<ParkingSlot>, OccupancyError> {
        let _guard = self.guard()?;
        let layout = self.read_layout()?;
        Ok(layout.get(&lot_id).map(|s| active_sorted(s)).unwrap_or_default())
    }
}

impl SlotRegistry for JsonSlotStore {
    fn register_slots(&self, lot_id: LotId, slots: &[ParkingSlot]) -> Result<usize, OccupancyError> {
        let _guard = self.guard()?;
        let mut layout = self.read_layout()?;
        upsert_slots(layout.entry(lot_id).or_default(), slots);
        self.write_layout(&layout)?;

        tracing::info!(lot_id, count = slots.len(), path = %self.path.display(), "Registered slots");
        Ok(slots.len())
    }

    fn delete_slots(&self, lot_id: LotId) -> Result<usize, OccupancyError> {
        let _guard = self.guard()?;
        let mut layout = self.read_layout()?;
        let removed = layout.remove(&lot_id).map(|s| s.len()).unwrap_or(0);
        if removed > 0 {
            self.write_layout(&layout)?;
        }

        tracing::info!(lot_id, removed, "Deleted slots");
        Ok(removed)
    }
}

/// Append-only detection log, one JSON record per line.
pub struct JsonlHistory {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonlHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, record: &DetectionRecord) -> io::Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())
    }
}

impl ResultSink for JsonlHistory {
    fn persist_result(
        &self,
        lot_id: LotId,
        result: &OccupancyResult,
        image_path: Option<&str>,
    ) -> Result<(), OccupancyError> {
        let record = DetectionRecord::new(lot_id, result, image_path);

        let _guard = self
            .lock
            .lock()
            .map_err(|_| OccupancyError::PersistenceFailure("history lock poisoned".to_string()))?;
        self.append(&record).map_err(|e| {
            OccupancyError::PersistenceFailure(format!("{}: {}", self.path.display(), e))
        })
    }
}

impl DetectionHistory for JsonlHistory {
    fn latest_result(&self, lot_id: LotId) -> Result<Option<DetectionRecord>, OccupancyError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage_err("failed to read", &self.path, e)),
        };

        let mut latest = None;
        for (line_no, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<DetectionRecord>(line) {
                Ok(record) if record.lot_id == lot_id => latest = Some(record),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(line = line_no + 1, error = %e, "Skipping unreadable history line")
                }
            }
        }

        Ok(latest)
    }
}
