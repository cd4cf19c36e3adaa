//! License ledger: the rules for issuing, binding and releasing license keys.
//!
//! A license is bound to the first store hash that validates it. The same hash
//! may validate again any number of times. A *different* hash seen while a
//! binding exists invalidates the license for good (one-strike anti-sharing).
//! Only an explicit release clears the binding, and it also lifts an invalidation.
//!
//! Binding is first-committer-wins with no lock: two different stores
//! validating the same unbound key at the same moment can both read it as
//! unbound, and which write survives depends on the store.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use strum::AsRefStr;

use crate::error::{AppError, Result};
use crate::keygen::KeyGenerator;
use crate::models::{License, LicenseStatus, Provenance};
use crate::store::RecordStore;
use crate::util::today;

/// Status every newly issued license starts in.
pub const INITIAL_STATUS: LicenseStatus = LicenseStatus::New;

/// How many candidates the generator gets per key before issuance gives up.
pub const MAX_KEY_ATTEMPTS: usize = 1000;

/// Why a bind was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BindReason {
    /// No license with this key exists.
    NotFound,
    /// The license was invalidated earlier.
    AlreadyInvalid,
    /// The license is bound to another store; it has now been invalidated.
    ConflictingBinding,
    /// Key or store hash was empty.
    MissingParameter,
}

impl BindReason {
    /// Customer-facing message shown by the theme.
    pub fn message(&self) -> &'static str {
        match self {
            BindReason::NotFound => "Licencia no encontrada",
            BindReason::AlreadyInvalid => "Licencia inválida",
            BindReason::ConflictingBinding => "Licencia ya está en uso en otra tienda",
            BindReason::MissingParameter => "Faltan parámetros requeridos",
        }
    }
}

/// Result of a bind attempt. `reason` is set exactly when `valid` is false.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindOutcome {
    pub valid: bool,
    pub reason: Option<BindReason>,
}

impl BindOutcome {
    fn accepted() -> Self {
        Self { valid: true, reason: None }
    }

    fn rejected(reason: BindReason) -> Self {
        Self { valid: false, reason: Some(reason) }
    }
}

/// Result of a release. `cleared` is false only when the key does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReleaseOutcome {
    pub cleared: bool,
}

pub struct LicenseLedger {
    store: Arc<dyn RecordStore>,
    keygen: Arc<dyn KeyGenerator>,
    clock: fn() -> NaiveDate,
}

impl LicenseLedger {
    pub fn new(store: Arc<dyn RecordStore>, keygen: Arc<dyn KeyGenerator>) -> Self {
        Self {
            store,
            keygen,
            clock: today,
        }
    }

    /// Replace the date source used for `last_checked_at` / `created_at`.
    pub fn with_clock(mut self, clock: fn() -> NaiveDate) -> Self {
        self.clock = clock;
        self
    }

    /// Validate `key` from the store identified by `fingerprint`, binding it if unbound.
    pub fn bind(&self, key: &str, fingerprint: &str) -> Result<BindOutcome> {
        if key.is_empty() || fingerprint.is_empty() {
            return Ok(BindOutcome::rejected(BindReason::MissingParameter));
        }

        let Some(mut license) = self.store.lookup(key)? else {
            tracing::debug!(key, "Bind refused: license not found");
            return Ok(BindOutcome::rejected(BindReason::NotFound));
        };

        if license.status == LicenseStatus::Invalid {
            tracing::debug!(key, "Bind refused: license already invalid");
            return Ok(BindOutcome::rejected(BindReason::AlreadyInvalid));
        }

        let now = (self.clock)();
        let conflicting = license.is_bound()
            && license.bound_fingerprint.as_deref() != Some(fingerprint);

        if conflicting {
            // The old hash is kept on the row for audit
            license.status = LicenseStatus::Invalid;
            license.last_checked_at = now;
            self.store.update(&license)?;

            tracing::warn!(
                key,
                bound = license.bound_fingerprint.as_deref().unwrap_or_default(),
                attempted = fingerprint,
                "License seen on a second store, invalidated"
            );
            return Ok(BindOutcome::rejected(BindReason::ConflictingBinding));
        }

        license.bound_fingerprint = Some(fingerprint.to_string());
        license.status = LicenseStatus::Active;
        license.last_checked_at = now;
        self.store.update(&license)?;

        tracing::debug!(key, fingerprint, "License validated");
        Ok(BindOutcome::accepted())
    }

    /// Clear the binding of `key` so another store can claim it.
    ///
    /// Administrative override: always reactivates, even an invalidated license.
    pub fn release(&self, key: &str) -> Result<ReleaseOutcome> {
        let Some(mut license) = self.store.lookup(key)? else {
            return Ok(ReleaseOutcome { cleared: false });
        };

        let previous = license.status;
        license.bound_fingerprint = None;
        license.status = LicenseStatus::Active;
        license.usage_count += 1;
        license.last_checked_at = (self.clock)();
        self.store.update(&license)?;

        tracing::info!(
            key,
            previous_status = previous.as_ref(),
            usage_count = license.usage_count,
            "License released"
        );
        Ok(ReleaseOutcome { cleared: true })
    }

    /// Issue `count` new unbound licenses sharing the same provenance.
    ///
    /// Returns the keys in creation order. Either every record is created or none is.
    pub fn issue(&self, count: usize, provenance: &Provenance) -> Result<Vec<String>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let mut taken: HashSet<String> = self.store.list()?.into_iter().map(|l| l.key).collect();

        let mut keys = Vec::new();
        for _ in 0..count {
            let key = self.fresh_key(&taken)?;
            taken.insert(key.clone());
            keys.push(key);
        }

        let now = (self.clock)();
        let licenses: Vec<License> = keys
            .iter()
            .enumerate()
            .map(|(i, key)| {
                License::issued(
                    key.clone(),
                    INITIAL_STATUS,
                    Some(format!("{}/{}", i + 1, count)),
                    provenance.clone(),
                    now,
                )
            })
            .collect();

        // All or nothing: a retried webhook must not find half a batch
        self.store.create_batch(&licenses)?;

        tracing::info!(
            order = %provenance.order_reference,
            count,
            "Issued licenses"
        );
        Ok(keys)
    }

    fn fresh_key(&self, taken: &HashSet<String>) -> Result<String> {
        for _ in 0..MAX_KEY_ATTEMPTS {
            let candidate = self.keygen.generate();
            if !taken.contains(&candidate) {
                return Ok(candidate);
            }
        }
        Err(AppError::Internal(format!(
            "No unused license key after {} attempts",
            MAX_KEY_ATTEMPTS
        )))
    }
}
