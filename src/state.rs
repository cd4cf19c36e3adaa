use std::sync::Arc;

use crate::ledger::LicenseLedger;
use crate::shopify::ProductCatalog;

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<LicenseLedger>,
    pub catalog: Arc<ProductCatalog>,
    /// Currency stamped on licenses when the order doesn't carry one
    pub default_currency: String,
    pub max_licenses_per_order: u32,
}
