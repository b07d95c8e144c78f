//! Expiring key-value cache layered on the document store
//!
//! Entries carry their write time and time-to-live. Expiry is only checked
//! when an entry is read: a stale entry is removed at that point, so entries
//! that are never read again stay in the stored map until an explicit
//! `purge_expired` sweep.

mod ttl;

pub use ttl::{CacheEntry, TtlCache};
