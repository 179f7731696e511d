//! Stat column registry
//!
//! A single immutable table of column descriptors. Legal event names,
//! sortable columns, aggregation membership and the points formula are all
//! derived from it once at startup; adding a stat means appending one
//! descriptor to [`STANDARD_COLUMNS`].

mod columns;
mod descriptor;
mod table;

pub use columns::STANDARD_COLUMNS;
pub use descriptor::{
    DefaultValue, Derivation, DisplayFormat, StatColumnDescriptor, StorageType,
};
pub use table::{RegistryError, RegistryResult, StatRegistry, RESERVED_COLUMNS};
