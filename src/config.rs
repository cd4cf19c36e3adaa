use std::env;

use crate::shopify::ProductCatalog;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub dev_mode: bool,
    /// Which order line items count as the theme
    pub catalog: ProductCatalog,
    /// Currency recorded when the order webhook omits one
    pub default_currency: String,
    pub cors_max_age_secs: u64,
    /// Orders asking for more licenses than this are refused
    pub max_licenses_per_order: u32,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("LICENSE_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let defaults = ProductCatalog::default();

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_env("PORT", 3000),
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "licencias.db".to_string()),
            dev_mode,
            catalog: ProductCatalog {
                sku: env::var("THEME_SKU").unwrap_or(defaults.sku),
                title: env::var("THEME_TITLE").unwrap_or(defaults.title),
            },
            default_currency: env::var("DEFAULT_CURRENCY").unwrap_or_else(|_| "EUR".to_string()),
            cors_max_age_secs: parse_env("CORS_MAX_AGE_SECS", 86400),
            max_licenses_per_order: parse_env("MAX_LICENSES_PER_ORDER", 100),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
