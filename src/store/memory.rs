use std::sync::{Mutex, MutexGuard};

use crate::error::{AppError, Result};
use crate::models::License;

use super::RecordStore;

/// In-process record store. Keeps insertion order so `list` matches the SQLite store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<License>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn rows(&self) -> Result<MutexGuard<'_, Vec<License>>> {
        self.rows
            .lock()
            .map_err(|_| AppError::StoreUnavailable("memory store lock poisoned".into()))
    }
}

impl RecordStore for MemoryStore {
    fn lookup(&self, key: &str) -> Result<Option<License>> {
        Ok(self.rows()?.iter().find(|l| l.key == key).cloned())
    }

    fn create(&self, license: &License) -> Result<()> {
        let mut rows = self.rows()?;
        if rows.iter().any(|l| l.key == license.key) {
            return Err(AppError::Conflict(format!("License {} already exists", license.key)));
        }
        rows.push(license.clone());
        Ok(())
    }

    fn create_batch(&self, licenses: &[License]) -> Result<()> {
        let mut rows = self.rows()?;
        for (i, license) in licenses.iter().enumerate() {
            let duplicate = rows.iter().any(|l| l.key == license.key)
                || licenses[..i].iter().any(|l| l.key == license.key);
            if duplicate {
                return Err(AppError::Conflict(format!("License {} already exists", license.key)));
            }
        }
        rows.extend_from_slice(licenses);
        Ok(())
    }

    fn update(&self, license: &License) -> Result<()> {
        let mut rows = self.rows()?;
        let row = rows
            .iter_mut()
            .find(|l| l.key == license.key)
            .ok_or_else(|| AppError::NotFound(format!("License {}", license.key)))?;

        // Provenance is immutable after issue
        row.status = license.status;
        row.bound_fingerprint = license.bound_fingerprint.clone();
        row.last_checked_at = license.last_checked_at;
        row.usage_count = license.usage_count;
        Ok(())
    }

    fn list(&self) -> Result<Vec<License>> {
        Ok(self.rows()?.clone())
    }
}
