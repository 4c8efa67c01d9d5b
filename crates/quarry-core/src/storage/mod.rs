//! Canonical record storage and snapshot import/export.
//!
//! - [`RecordStore`] is the sole source of truth for which records exist and
//!   what they contain. Indices are derived from it and never the other way
//!   round.
//! - [`Snapshot`] is the serializable form of a store's contents. The engine
//!   defines no file layout; callers decide where snapshot JSON lives.

mod record_store;
mod snapshot;

pub use record_store::RecordStore;
pub use snapshot::{Snapshot, CURRENT_SCHEMA_VERSION};
