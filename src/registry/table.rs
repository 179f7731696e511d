//! The stat registry and the views derived from it

use std::collections::{BTreeSet, HashMap};

use thiserror::Error;

use super::columns::STANDARD_COLUMNS;
use super::descriptor::{Derivation, DisplayFormat, StatColumnDescriptor, StorageType};

/// Row fields owned by the store, never usable as stat columns
pub const RESERVED_COLUMNS: &[&str] = &["server_id", "player_id", "name", "clan", "updated_at"];

/// Errors raised while building a registry
#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("duplicate column '{0}'")]
    DuplicateColumn(&'static str),

    #[error("invalid column identifier '{0}'")]
    InvalidIdentifier(&'static str),

    #[error("column '{0}' is reserved by the row layout")]
    ReservedColumn(&'static str),

    #[error("invalid event name '{0}'")]
    InvalidEvent(&'static str),

    #[error("event '{event}' is already mapped to column '{existing}'")]
    DuplicateEvent {
        event: &'static str,
        existing: &'static str,
    },

    #[error("default value of column '{0}' does not match its storage type")]
    DefaultMismatch(&'static str),

    #[error("column '{column}' references unknown or non-numeric column '{operand}'")]
    UnknownOperand {
        column: &'static str,
        operand: &'static str,
    },

    #[error("column '{0}' cannot carry a points weight")]
    InvalidWeight(&'static str),

    #[error("column '{0}' cannot be aggregatable")]
    InvalidAggregation(&'static str),

    #[error("more than one column uses derivation {0}")]
    DuplicateDerivation(&'static str),

    #[error("more than one column tracks weapon kills")]
    MultipleWeaponColumns,
}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Immutable column table plus the lookups every other component uses
#[derive(Debug, Clone)]
pub struct StatRegistry {
    columns: Vec<StatColumnDescriptor>,
    by_column: HashMap<&'static str, usize>,
    event_columns: HashMap<&'static str, &'static str>,
    legal_events: BTreeSet<&'static str>,
    sortable: BTreeSet<&'static str>,
    point_columns: Vec<(&'static str, u64)>,
    aggregatable: Vec<&'static str>,
    weapon_column: Option<&'static str>,
    weapon_tally_column: Option<&'static str>,
}

impl StatRegistry {
    /// Registry over the standard column table
    pub fn standard() -> RegistryResult<Self> {
        Self::new(STANDARD_COLUMNS)
    }

    /// Build a registry, validating the table and computing the derived views
    pub fn new(columns: &[StatColumnDescriptor]) -> RegistryResult<Self> {
        let mut by_column = HashMap::new();
        let mut event_columns = HashMap::new();
        let mut legal_events = BTreeSet::new();
        let mut sortable = BTreeSet::new();
        let mut point_columns = Vec::new();
        let mut aggregatable = Vec::new();
        let mut weapon_column = None;
        let mut weapon_tally_column = None;
        let mut has_points = false;

        for (index, desc) in columns.iter().enumerate() {
            if !is_identifier(desc.column) {
                return Err(RegistryError::InvalidIdentifier(desc.column));
            }
            if RESERVED_COLUMNS.contains(&desc.column) {
                return Err(RegistryError::ReservedColumn(desc.column));
            }
            if by_column.insert(desc.column, index).is_some() {
                return Err(RegistryError::DuplicateColumn(desc.column));
            }
            if desc.default.storage() != desc.storage {
                return Err(RegistryError::DefaultMismatch(desc.column));
            }
            if desc.aggregatable && (desc.is_derived() || !desc.storage.is_numeric()) {
                return Err(RegistryError::InvalidAggregation(desc.column));
            }
            if desc.points_weight > 0
                && (!desc.aggregatable || desc.storage != StorageType::UnsignedInteger)
            {
                return Err(RegistryError::InvalidWeight(desc.column));
            }

            if let Some(event) = desc.source_event {
                // Inbound names are matched lower-cased and trimmed
                if !is_identifier(event) {
                    return Err(RegistryError::InvalidEvent(event));
                }
                if let Some(existing) = event_columns.insert(event, desc.column) {
                    return Err(RegistryError::DuplicateEvent { event, existing });
                }
                legal_events.insert(event);
            }
            if desc.sortable && desc.storage.is_numeric() {
                sortable.insert(desc.column);
            }
            if desc.points_weight > 0 {
                point_columns.push((desc.column, desc.points_weight));
            }
            if desc.aggregatable {
                aggregatable.push(desc.column);
            }
            if desc.tracks_weapons {
                if weapon_column.replace(desc.column).is_some() {
                    return Err(RegistryError::MultipleWeaponColumns);
                }
            }
            match desc.derived {
                Some(Derivation::Points) => {
                    if std::mem::replace(&mut has_points, true) {
                        return Err(RegistryError::DuplicateDerivation("points"));
                    }
                }
                Some(Derivation::WeaponTally) => {
                    if desc.storage != StorageType::Json {
                        return Err(RegistryError::DefaultMismatch(desc.column));
                    }
                    if weapon_tally_column.replace(desc.column).is_some() {
                        return Err(RegistryError::DuplicateDerivation("weapon_tally"));
                    }
                }
                _ => {}
            }
        }

        // Ratio operands may appear anywhere in the table, so check them last
        for desc in columns {
            if let Some(Derivation::Ratio {
                numerator,
                denominator,
            }) = desc.derived
            {
                for operand in [numerator, denominator] {
                    let numeric = by_column
                        .get(operand)
                        .map(|&i| columns[i].storage.is_numeric() && !columns[i].is_derived())
                        .unwrap_or(false);
                    if !numeric {
                        return Err(RegistryError::UnknownOperand {
                            column: desc.column,
                            operand,
                        });
                    }
                }
            }
        }

        Ok(Self {
            columns: columns.to_vec(),
            by_column,
            event_columns,
            legal_events,
            sortable,
            point_columns,
            aggregatable,
            weapon_column,
            weapon_tally_column,
        })
    }

    /// All descriptors in registration order
    pub fn columns(&self) -> &[StatColumnDescriptor] {
        &self.columns
    }

    pub fn descriptor(&self, column: &str) -> Option<&StatColumnDescriptor> {
        self.by_column.get(column).map(|&i| &self.columns[i])
    }

    /// Target column of an inbound event name
    pub fn column_for_event(&self, event: &str) -> Option<&'static str> {
        self.event_columns.get(event).copied()
    }

    /// Registered event name and its target column
    pub fn resolve_event(&self, event: &str) -> Option<(&'static str, &'static str)> {
        self.event_columns
            .get_key_value(event)
            .map(|(event, column)| (*event, *column))
    }

    pub fn is_legal_event(&self, event: &str) -> bool {
        self.legal_events.contains(event)
    }

    pub fn legal_events(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.legal_events.iter().copied()
    }

    pub fn is_sortable(&self, column: &str) -> bool {
        self.sortable.contains(column)
    }

    pub fn sortable_columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.sortable.iter().copied()
    }

    /// Columns contributing to the points score, with their weights
    pub fn point_columns(&self) -> &[(&'static str, u64)] {
        &self.point_columns
    }

    /// Columns summed on merge
    pub fn aggregatable_columns(&self) -> &[&'static str] {
        &self.aggregatable
    }

    pub fn is_aggregatable(&self, column: &str) -> bool {
        self.descriptor(column).map(|d| d.aggregatable).unwrap_or(false)
    }

    /// The column whose events also carry a weapon name
    pub fn weapon_column(&self) -> Option<&'static str> {
        self.weapon_column
    }

    /// The JSON column holding the per-weapon tally
    pub fn weapon_tally_column(&self) -> Option<&'static str> {
        self.weapon_tally_column
    }

    pub fn duration_columns(&self) -> impl Iterator<Item = &StatColumnDescriptor> + '_ {
        self.columns
            .iter()
            .filter(|d| d.display == DisplayFormat::Duration)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    name.len() <= 64 && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::descriptor::{DefaultValue, StatColumnDescriptor as C};

    #[test]
    fn test_standard_registry_views() {
        let registry = StatRegistry::standard().unwrap();

        assert_eq!(registry.column_for_event("kill"), Some("kills"));
        assert_eq!(registry.column_for_event("tc_destroyed"), Some("tcs_destroyed"));
        assert!(registry.is_legal_event("death"));
        assert!(!registry.is_legal_event("kills"));
        assert!(registry.is_sortable("kdr"));
        assert!(registry.is_sortable("points"));
        assert!(!registry.is_sortable("weapon_kills"));
        assert_eq!(registry.weapon_column(), Some("kills"));
        assert_eq!(registry.weapon_tally_column(), Some("weapon_kills"));
        assert!(registry.point_columns().contains(&("kills", 1)));
        assert!(registry.point_columns().contains(&("tcs_destroyed", 5)));
        assert!(!registry.aggregatable_columns().contains(&"kdr"));
    }

    #[test]
    fn test_views_track_every_descriptor() {
        let registry = StatRegistry::standard().unwrap();

        let events: Vec<_> = registry.legal_events().collect();
        let expected = STANDARD_COLUMNS
            .iter()
            .filter(|d| d.source_event.is_some())
            .count();
        assert_eq!(events.len(), expected);

        for desc in registry.columns() {
            if let Some(event) = desc.source_event {
                assert_eq!(registry.column_for_event(event), Some(desc.column));
            }
        }
    }

    #[test]
    fn test_appended_descriptor_is_picked_up() {
        let mut columns = STANDARD_COLUMNS.to_vec();
        columns.push(C::counter("doors_breached", "door_breached", "Doors Breached").weight(2));
        let registry = StatRegistry::new(&columns).unwrap();

        assert_eq!(registry.column_for_event("door_breached"), Some("doors_breached"));
        assert!(registry.is_sortable("doors_breached"));
        assert!(registry.point_columns().contains(&("doors_breached", 2)));
    }

    #[test]
    fn test_rejects_duplicate_column() {
        let columns = [C::counter("kills", "kill", "Kills"), C::counter("kills", "kill2", "Kills")];
        assert_eq!(
            StatRegistry::new(&columns).unwrap_err(),
            RegistryError::DuplicateColumn("kills")
        );
    }

    #[test]
    fn test_rejects_duplicate_event() {
        let columns = [C::counter("kills", "kill", "Kills"), C::counter("frags", "kill", "Frags")];
        assert!(matches!(
            StatRegistry::new(&columns),
            Err(RegistryError::DuplicateEvent { event: "kill", .. })
        ));
    }

    #[test]
    fn test_rejects_bad_identifier_and_reserved_names() {
        let columns = [C::counter("Kills", "kill", "Kills")];
        assert!(matches!(
            StatRegistry::new(&columns),
            Err(RegistryError::InvalidIdentifier("Kills"))
        ));

        let columns = [C::counter("name", "rename", "Name")];
        assert!(matches!(
            StatRegistry::new(&columns),
            Err(RegistryError::ReservedColumn("name"))
        ));
    }

    #[test]
    fn test_rejects_bad_event_name() {
        let mut columns = STANDARD_COLUMNS.to_vec();
        columns.push(C::counter("frags", "Frag", "Frags"));
        assert_eq!(
            StatRegistry::new(&columns).unwrap_err(),
            RegistryError::InvalidEvent("Frag")
        );

        let columns = [C::counter("frags", " frag", "Frags")];
        assert_eq!(
            StatRegistry::new(&columns).unwrap_err(),
            RegistryError::InvalidEvent(" frag")
        );
    }

    #[test]
    fn test_rejects_unknown_ratio_operand() {
        let columns = [
            C::counter("kills", "kill", "Kills"),
            C::derived(
                "kdr",
                Derivation::Ratio {
                    numerator: "kills",
                    denominator: "deaths",
                },
                DefaultValue::Float(0.0),
                "KDR",
                DisplayFormat::Decimal,
            ),
        ];
        assert!(matches!(
            StatRegistry::new(&columns),
            Err(RegistryError::UnknownOperand { operand: "deaths", .. })
        ));
    }

    #[test]
    fn test_rejects_weight_on_non_counter() {
        let columns = [C::retained("rank", DefaultValue::UInt(0), "Rank").weight(3)];
        assert!(matches!(
            StatRegistry::new(&columns),
            Err(RegistryError::InvalidWeight("rank"))
        ));
    }
}
