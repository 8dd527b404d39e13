//! Formatting style settings
//!
//! A flat key-value record consumed by the downstream formatter, never
//! interpreted here. The compatibility layer exists so rule tables do not
//! fight this record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque formatter settings, forwarded unchanged
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleSettings(pub Map<String, Value>);

impl StyleSettings {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}
