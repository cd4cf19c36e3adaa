//! Record store seam for the license ledger.
//!
//! The ledger only needs four row-level capabilities. Anything that can provide
//! them (a SQLite file, an in-memory map, a spreadsheet) can back it.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::models::License;

/// Row-level access to license records.
///
/// No method offers compare-and-swap: callers doing read-modify-write through
/// `lookup` then `update` can race with each other.
pub trait RecordStore: Send + Sync {
    /// Fetch a license by key.
    fn lookup(&self, key: &str) -> Result<Option<License>>;

    /// Insert a new license. Fails if the key already exists.
    fn create(&self, license: &License) -> Result<()>;

    /// Insert several licenses atomically. If any insert fails, none are kept.
    fn create_batch(&self, licenses: &[License]) -> Result<()>;

    /// Persist the mutable state of an existing license.
    /// Fails with `AppError::NotFound` if the key does not exist.
    fn update(&self, license: &License) -> Result<()>;

    /// Every license, in creation order.
    fn list(&self) -> Result<Vec<License>>;
}
