//! Typed cell values of an aggregate row

use serde::{Deserialize, Serialize};

use crate::registry::StorageType;

/// One column value as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    UInt(u64),
    Float(f64),
    /// Raw JSON text, parsed lazily by whoever needs the structure
    Json(String),
}

impl StatValue {
    /// Integer view; floats are truncated, negative and non-finite values read as 0
    pub fn as_u64(&self) -> u64 {
        match self {
            StatValue::UInt(v) => *v,
            StatValue::Float(v) if v.is_finite() && *v > 0.0 => *v as u64,
            StatValue::Float(_) => 0,
            StatValue::Json(s) => s.trim().parse().unwrap_or(0),
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            StatValue::UInt(v) => *v as f64,
            StatValue::Float(v) if v.is_finite() => *v,
            StatValue::Float(_) => 0.0,
            StatValue::Json(s) => s.trim().parse().unwrap_or(0.0),
        }
    }

    pub fn as_json_str(&self) -> Option<&str> {
        match self {
            StatValue::Json(s) => Some(s),
            _ => None,
        }
    }

    /// Re-type a value to the storage type of its column
    pub fn coerce(self, storage: StorageType) -> StatValue {
        match storage {
            StorageType::UnsignedInteger => StatValue::UInt(self.as_u64()),
            StorageType::Float => StatValue::Float(self.as_f64()),
            StorageType::Json => match self {
                StatValue::Json(s) => StatValue::Json(s),
                _ => StatValue::Json("{}".to_string()),
            },
        }
    }

    /// Sum of two values of the same storage type
    pub fn saturating_add(&self, other: &StatValue, storage: StorageType) -> StatValue {
        match storage {
            StorageType::Float => StatValue::Float(self.as_f64() + other.as_f64()),
            _ => StatValue::UInt(self.as_u64().saturating_add(other.as_u64())),
        }
    }

    /// Numeric JSON representation, JSON columns parsed into structures
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            StatValue::UInt(v) => serde_json::Value::from(*v),
            StatValue::Float(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or_else(|| serde_json::Value::from(0)),
            StatValue::Json(s) => match serde_json::from_str::<serde_json::Value>(s) {
                Ok(v) if v.is_object() => v,
                _ => serde_json::Value::Object(serde_json::Map::new()),
            },
        }
    }
}
