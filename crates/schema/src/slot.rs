use crate::rect::Rect;
use serde::{Deserialize, Deserializer, Serialize};

/// One physical parking space: an opaque label and its rectangle in
/// original-image pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkingSlot {
    #[serde(deserialize_with = "label_from_str_or_number")]
    pub label: String,
    #[serde(flatten)]
    pub rect: Rect,
    #[serde(rename = "is_active", default = "default_active")]
    pub active: bool,
}

impl ParkingSlot {
    pub fn new(label: impl Into<String>, rect: Rect) -> Self {
        Self {
            label: label.into(),
            rect,
            active: true,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

fn default_active() -> bool {
    true
}

/// Layout files in the wild store labels either as `"12"` or as `12`.
fn label_from_str_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Label {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Label::deserialize(deserializer)? {
        Label::Text(s) => s,
        Label::Int(n) => n.to_string(),
        Label::Float(f) => f.to_string(),
    })
}
