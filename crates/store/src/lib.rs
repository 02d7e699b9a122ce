//! Document store adapters for Cambio.
//!
//! This crate provides:
//! - `MemoryStore`, a concurrent in-process `DocumentStore`
//! - Ledger snapshot files that seed a store and export its contents

pub mod memory;
pub mod snapshot;

pub use memory::MemoryStore;
pub use snapshot::{SnapshotError, SnapshotFile};
