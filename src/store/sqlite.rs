use crate::db::{DbPool, queries};
use crate::error::{AppError, Result};
use crate::models::License;

use super::RecordStore;

/// Record store backed by the `licencias` table.
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    /// The pool's schema must already be initialized with `db::init_db`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl RecordStore for SqliteStore {
    fn lookup(&self, key: &str) -> Result<Option<License>> {
        let conn = self.pool.get()?;
        queries::get_license_by_key(&conn, key)
    }

    fn create(&self, license: &License) -> Result<()> {
        let conn = self.pool.get()?;
        queries::create_license(&conn, license)
    }

    fn create_batch(&self, licenses: &[License]) -> Result<()> {
        let mut conn = self.pool.get()?;
        queries::create_licenses(&mut conn, licenses)
    }

    fn update(&self, license: &License) -> Result<()> {
        let conn = self.pool.get()?;
        if queries::update_license_state(&conn, license)? {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("License {}", license.key)))
        }
    }

    fn list(&self) -> Result<Vec<License>> {
        let conn = self.pool.get()?;
        queries::list_licenses(&conn)
    }
}
