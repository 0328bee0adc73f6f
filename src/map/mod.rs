//! Mapping tables and value coercion.
//!
//! The pass is driven by four versioned tables: per-kind channel allow
//! lists, effect-name maps (primary and preview vocabulary), the destination
//! input value-kind table, and per-variant channel maps. [`Mappings`] bundles
//! them with a compiled-in default and an optional JSON override path.

mod coerce;
mod tables;

pub use coerce::*;
pub use tables::*;
