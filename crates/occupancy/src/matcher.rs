use schema::{Detection, ParkingSlot, Rect};
use std::collections::BTreeSet;

/// Coverage of the slot (percent of slot area) above which a detection
/// occupies it outright.
pub const STRONG_ACCEPT_PCT: f32 = 50.0;

/// Coverage below which a detection never occupies the slot.
pub const STRONG_REJECT_PCT: f32 = 35.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlapThresholds {
    pub strong_accept_pct: f32,
    pub strong_reject_pct: f32,
}

impl Default for OverlapThresholds {
    fn default() -> Self {
        Self {
            strong_accept_pct: STRONG_ACCEPT_PCT,
            strong_reject_pct: STRONG_REJECT_PCT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapDecision {
    Occupied,
    Free,
    /// Ambiguous coverage; occupied only if the detection's center lies
    /// strictly inside the slot.
    CenterTieBreak,
}

impl OverlapDecision {
    pub fn classify(pct: f32, thresholds: &OverlapThresholds) -> Self {
        if pct > thresholds.strong_accept_pct {
            OverlapDecision::Occupied
        } else if pct < thresholds.strong_reject_pct {
            OverlapDecision::Free
        } else {
            OverlapDecision::CenterTieBreak
        }
    }
}

/// Percentage of `slot`'s area covered by `detection`.
///
/// `None` when the rectangles do not intersect or the slot has no positive
/// area. The denominator is the slot, so the measure is not symmetric.
pub fn coverage_pct(slot: &Rect, detection: &Rect) -> Option<f32> {
    let slot_area = slot.area();
    if slot_area <= 0.0 {
        return None;
    }

    let overlap = slot.intersection(detection)?;
    Some(overlap.area() * 100.0 / slot_area)
}

pub fn slot_occupied_by(slot: &Rect, detection: &Rect, thresholds: &OverlapThresholds) -> bool {
    let Some(pct) = coverage_pct(slot, detection) else {
        return false;
    };

    match OverlapDecision::classify(pct, thresholds) {
        OverlapDecision::Occupied => true,
        OverlapDecision::Free => false,
        OverlapDecision::CenterTieBreak => {
            let (cx, cy) = detection.center();
            slot.contains_point_strict(cx, cy)
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OccupancyMatcher {
    pub thresholds: OverlapThresholds,
}

impl OccupancyMatcher {
    pub fn new(thresholds: OverlapThresholds) -> Self {
        Self { thresholds }
    }

    /// Labels of every slot occupied by at least one detection. Each slot
    /// stops at the first detection that qualifies.
    pub fn occupied_labels<'a, I>(&self, slots: I, detections: &[Detection]) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a ParkingSlot>,
    {
        let mut occupied = BTreeSet::new();

        for slot in slots {
            if occupied.contains(&slot.label) {
                continue;
            }

            let hit = detections
                .iter()
                .find(|det| slot_occupied_by(&slot.rect, &det.rect, &self.thresholds));

            if let Some(det) = hit {
                tracing::trace!(
                    label = %slot.label,
                    confidence = det.confidence,
                    "Slot occupied"
                );
                occupied.insert(slot.label.clone());
            }
        }

        occupied
    }
}
