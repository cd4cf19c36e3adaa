//! Silkify license service
//!
//! Issues license keys for paid Shopify orders of the Silkify theme and binds
//! each key to the single store it is installed on.

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod keygen;
pub mod ledger;
pub mod models;
pub mod shopify;
pub mod state;
pub mod store;
pub mod util;
