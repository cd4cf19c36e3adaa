use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

/// Lifecycle state of a license key.
///
/// Persisted with the spreadsheet's Spanish spellings. `inválida` is the
/// spelling older rows were written with and is accepted on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
pub enum LicenseStatus {
    /// Issued, never bound to a store.
    #[serde(rename = "nueva")]
    #[strum(serialize = "nueva")]
    New,
    /// Bound to at most one store and usable.
    #[serde(rename = "activa")]
    #[strum(serialize = "activa")]
    Active,
    /// Seen on a second store; terminal until released.
    #[serde(rename = "invalida")]
    #[strum(to_string = "invalida", serialize = "inválida")]
    Invalid,
}

/// One row of the license ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    /// `LIC-XXXX-XXXX-XXXX`
    pub key: String,
    pub status: LicenseStatus,
    /// Hash of the store the license is bound to (None = unbound)
    pub bound_fingerprint: Option<String>,
    pub last_checked_at: NaiveDate,
    pub created_at: NaiveDate,
    /// Number of times the license has been released back to unbound
    pub usage_count: i64,
    /// Position inside the issuance batch, e.g. "2/3"
    pub license_number: Option<String>,
    #[serde(flatten)]
    pub provenance: Provenance,
}

impl License {
    /// A freshly issued, unbound record.
    pub fn issued(
        key: String,
        status: LicenseStatus,
        license_number: Option<String>,
        provenance: Provenance,
        today: NaiveDate,
    ) -> Self {
        Self {
            key,
            status,
            bound_fingerprint: None,
            last_checked_at: today,
            created_at: today,
            usage_count: 0,
            license_number,
            provenance,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.bound_fingerprint
            .as_deref()
            .is_some_and(|fingerprint| !fingerprint.is_empty())
    }
}

/// Purchase metadata stamped on every license of an order. Never changes after issue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Shopify order number, or the order id when no number was sent
    pub order_reference: String,
    pub customer_email: String,
    pub customer_name: String,
    /// Order total as sent by Shopify (decimal string)
    pub order_total: String,
    pub currency: String,
}
