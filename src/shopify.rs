//! Shopify order webhook payload and theme license counting.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::Provenance;

/// "3 licencias", "5 Licenses", "1 licencia"...
static LICENSES_IN_TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*(licencias?|licenses?)").expect("valid license-count regex")
});

/// Shopify sends order ids and numbers as JSON numbers, test tools often as strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderRef {
    Number(i64),
    Text(String),
}

impl fmt::Display for OrderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderRef::Number(n) => write!(f, "{}", n),
            OrderRef::Text(s) => f.write_str(s),
        }
    }
}

/// The subset of the `orders/paid` webhook body the issuer reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderWebhook {
    #[serde(default)]
    pub id: Option<OrderRef>,
    #[serde(default)]
    pub order_number: Option<OrderRef>,
    #[serde(default)]
    pub customer: Option<Customer>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub total_price: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Customer {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl Customer {
    /// "First Last", trimmed. Empty when neither part was sent.
    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        )
        .trim()
        .to_string()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub price: Option<String>,
}

impl OrderWebhook {
    /// Order number when present, otherwise the order id.
    pub fn reference(&self) -> Option<String> {
        self.order_number
            .as_ref()
            .or(self.id.as_ref())
            .map(ToString::to_string)
    }

    /// Provenance stamped on every license issued for this order.
    pub fn provenance(&self, default_currency: &str) -> Provenance {
        let customer = self.customer.clone().unwrap_or_default();
        Provenance {
            order_reference: self.reference().unwrap_or_default(),
            customer_email: customer.email.clone().unwrap_or_default(),
            customer_name: customer.full_name(),
            order_total: self.total_price.clone().unwrap_or_default(),
            currency: self
                .currency
                .clone()
                .unwrap_or_else(|| default_currency.to_string()),
        }
    }
}

/// Identifies which line items are the theme product.
#[derive(Debug, Clone)]
pub struct ProductCatalog {
    /// Exact SKU match
    pub sku: String,
    /// Substring match on the line item title
    pub title: String,
}

impl Default for ProductCatalog {
    fn default() -> Self {
        Self {
            sku: "SilkifyTheme".to_string(),
            title: "Silkify Theme".to_string(),
        }
    }
}

impl ProductCatalog {
    pub fn is_theme_item(&self, item: &LineItem) -> bool {
        item.sku.as_deref() == Some(self.sku.as_str())
            || item
                .title
                .as_deref()
                .is_some_and(|t| t.contains(&self.title))
    }

    /// Licenses bought by one line item, or 0 if it isn't the theme.
    ///
    /// Bundles carry the count in the title ("Silkify Theme - 3 Licencias"),
    /// which is multiplied by the quantity ordered.
    pub fn licenses_for_item(&self, item: &LineItem) -> u32 {
        if !self.is_theme_item(item) {
            return 0;
        }

        let quantity = item.quantity.filter(|q| *q > 0).unwrap_or(1);

        let per_unit = item
            .title
            .as_deref()
            .and_then(|t| LICENSES_IN_TITLE_RE.captures(t))
            .and_then(|c| c[1].parse::<u32>().ok());

        match per_unit {
            Some(n) => n.saturating_mul(quantity),
            None => quantity,
        }
    }

    /// Total theme licenses bought by an order.
    pub fn licenses_for_order(&self, order: &OrderWebhook) -> u32 {
        order
            .line_items
            .iter()
            .map(|item| {
                let count = self.licenses_for_item(item);
                if count > 0 {
                    tracing::debug!(
                        title = item.title.as_deref().unwrap_or_default(),
                        count,
                        "Theme line item detected"
                    );
                }
                count
            })
            .fold(0u32, u32::saturating_add)
    }
}

/// Sample order used by the dev-mode webhook test endpoint.
pub fn sample_order() -> OrderWebhook {
    OrderWebhook {
        id: Some(OrderRef::Number(12345)),
        order_number: Some(OrderRef::Text("TEST-001".to_string())),
        customer: Some(Customer {
            email: Some("cliente@example.com".to_string()),
            first_name: Some("Juan".to_string()),
            last_name: Some("Pérez".to_string()),
        }),
        line_items: vec![LineItem {
            title: Some("Silkify Theme - 3 Licencias".to_string()),
            sku: Some("SilkifyTheme".to_string()),
            quantity: Some(1),
            price: Some("89.97".to_string()),
        }],
        total_price: Some("89.97".to_string()),
        currency: Some("EUR".to_string()),
    }
}
