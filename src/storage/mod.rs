//! Persistent storage for routes, notes, cache and pagination settings
//!
//! Each logical document is stored as one JSON file in the data directory.
//! Documents are always written whole; there is no partial update and no
//! schema versioning.

mod store;

pub use store::{StorageError, StorageStats, Store, StoreKey};
