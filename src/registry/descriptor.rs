//! Column descriptors: one entry per trackable statistic

use serde::Serialize;

use crate::types::StatValue;

/// Physical storage type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageType {
    UnsignedInteger,
    Float,
    /// JSON text blob
    Json,
}

impl StorageType {
    /// SQLite column affinity for this storage type
    pub fn sql_type(&self) -> &'static str {
        match self {
            StorageType::UnsignedInteger => "INTEGER",
            StorageType::Float => "REAL",
            StorageType::Json => "TEXT",
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, StorageType::Json)
    }
}

/// How the dashboard renders a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayFormat {
    Integer,
    Decimal,
    /// Seconds rendered as HH:MM:SS
    Duration,
    Json,
}

/// Value assumed when no prior row exists
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DefaultValue {
    UInt(u64),
    Float(f64),
    Json(&'static str),
}

impl DefaultValue {
    pub fn storage(&self) -> StorageType {
        match self {
            DefaultValue::UInt(_) => StorageType::UnsignedInteger,
            DefaultValue::Float(_) => StorageType::Float,
            DefaultValue::Json(_) => StorageType::Json,
        }
    }

    pub fn to_value(&self) -> StatValue {
        match *self {
            DefaultValue::UInt(v) => StatValue::UInt(v),
            DefaultValue::Float(v) => StatValue::Float(v),
            DefaultValue::Json(v) => StatValue::Json(v.to_string()),
        }
    }
}

/// Tag for columns computed by the merge engine instead of summed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Derivation {
    /// `numerator` when `denominator` is zero, else the quotient rounded to 2 places
    Ratio {
        numerator: &'static str,
        denominator: &'static str,
    },
    /// Weighted sum over every column with a nonzero `points_weight`
    Points,
    /// Per-weapon kill counts stored as a JSON object
    WeaponTally,
}

/// Immutable description of one stat column
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatColumnDescriptor {
    /// Storage column identifier (unique)
    pub column: &'static str,
    /// Inbound event that increments this column, none for derived columns
    pub source_event: Option<&'static str>,
    pub storage: StorageType,
    pub default: DefaultValue,
    pub label: &'static str,
    pub sortable: bool,
    /// Summed when merging deltas into baselines and when rolling up clans
    pub aggregatable: bool,
    pub points_weight: u64,
    pub display: DisplayFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derived: Option<Derivation>,
    /// Events for this column also feed the weapon tally
    #[serde(skip_serializing_if = "is_false")]
    pub tracks_weapons: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl StatColumnDescriptor {
    /// A sortable, aggregatable integer counter fed by `event`
    pub const fn counter(
        column: &'static str,
        event: &'static str,
        label: &'static str,
    ) -> Self {
        Self {
            column,
            source_event: Some(event),
            storage: StorageType::UnsignedInteger,
            default: DefaultValue::UInt(0),
            label,
            sortable: true,
            aggregatable: true,
            points_weight: 0,
            display: DisplayFormat::Integer,
            derived: None,
            tracks_weapons: false,
        }
    }

    /// A column computed from other columns
    pub const fn derived(
        column: &'static str,
        derivation: Derivation,
        default: DefaultValue,
        label: &'static str,
        display: DisplayFormat,
    ) -> Self {
        let storage = match default {
            DefaultValue::UInt(_) => StorageType::UnsignedInteger,
            DefaultValue::Float(_) => StorageType::Float,
            DefaultValue::Json(_) => StorageType::Json,
        };
        Self {
            column,
            source_event: None,
            storage,
            default,
            label,
            sortable: !matches!(storage, StorageType::Json),
            aggregatable: false,
            points_weight: 0,
            display,
            derived: Some(derivation),
            tracks_weapons: false,
        }
    }

    pub const fn weight(self, points_weight: u64) -> Self {
        Self {
            points_weight,
            ..self
        }
    }

    pub const fn with_display(self, display: DisplayFormat) -> Self {
        Self { display, ..self }
    }

    /// A column no event touches; merges keep whatever value is stored
    pub const fn retained(column: &'static str, default: DefaultValue, label: &'static str) -> Self {
        let (storage, display) = match default {
            DefaultValue::UInt(_) => (StorageType::UnsignedInteger, DisplayFormat::Integer),
            DefaultValue::Float(_) => (StorageType::Float, DisplayFormat::Decimal),
            DefaultValue::Json(_) => (StorageType::Json, DisplayFormat::Json),
        };
        Self {
            column,
            source_event: None,
            storage,
            default,
            label,
            sortable: false,
            aggregatable: false,
            points_weight: 0,
            display,
            derived: None,
            tracks_weapons: false,
        }
    }

    pub const fn weapons(self) -> Self {
        Self {
            tracks_weapons: true,
            ..self
        }
    }

    pub fn is_derived(&self) -> bool {
        self.derived.is_some()
    }
}
