//! Ledger storage: the `LedgerStore` seam and its backends.

pub mod in_memory;
pub mod sqlite;
pub mod r#trait;

pub use in_memory::InMemoryLedgerStore;
pub use r#trait::{EntityRef, LedgerSnapshot, LedgerStore, StoreError, StoreOptions, StoreResult};
pub use sqlite::SqliteLedgerStore;

use chrono::{DateTime, SubsecRound, Utc};

/// Creation timestamp for new movements.
///
/// Truncated to microseconds so every backend round-trips it unchanged.
pub(crate) fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
