use super::text;
use super::validation::non_negative;
use console_core::filter::matches_any;
use console_core::numeric::{lenient, lenient_option};
use console_core::store::Resource;
use console_core::{Identified, RecordId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Billable service from the service catalog.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Service {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default, deserialize_with = "text::deserialize")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "text::deserialize")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "text::deserialize")]
    pub category: Option<String>,
    #[serde(with = "lenient", default)]
    pub price: Decimal,
    #[serde(with = "lenient_option", default)]
    pub tax_rate: Option<Decimal>,
    #[serde(default, deserialize_with = "text::flag")]
    pub is_active: Option<bool>,
}

impl Identified for Service {
    fn record_id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }
}

impl Resource for Service {
    const NAME: &'static str = "service";
    const PATH: &'static str = "/services";

    fn matches(&self, term: &str) -> bool {
        matches_any(
            term,
            [
                self.name.as_deref().unwrap_or(""),
                self.description.as_deref().unwrap_or(""),
                self.category.as_deref().unwrap_or(""),
            ],
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceInput {
    #[validate(length(min = 1, message = "Service name is required"))]
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    #[validate(custom(function = "non_negative"))]
    #[serde(serialize_with = "lenient::serialize")]
    pub price: Decimal,
    pub is_active: bool,
}

/// Stock product.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Product {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default, deserialize_with = "text::deserialize")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "text::deserialize")]
    pub sku: Option<String>,
    #[serde(default, deserialize_with = "text::deserialize")]
    pub description: Option<String>,
    #[serde(with = "lenient", default)]
    pub unit_price: Decimal,
    #[serde(with = "lenient", default)]
    pub stock_quantity: Decimal,
}

impl Identified for Product {
    fn record_id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }
}

impl Resource for Product {
    const NAME: &'static str = "product";
    const PATH: &'static str = "/products";

    fn matches(&self, term: &str) -> bool {
        matches_any(
            term,
            [
                self.name.as_deref().unwrap_or(""),
                self.sku.as_deref().unwrap_or(""),
                self.description.as_deref().unwrap_or(""),
            ],
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[serde(rename_all = "PascalCase")]
pub struct ProductInput {
    #[validate(length(min = 1, message = "Product name is required"))]
    pub name: String,
    pub sku: Option<String>,
    pub description: Option<String>,
    #[validate(custom(function = "non_negative"))]
    #[serde(serialize_with = "lenient::serialize")]
    pub unit_price: Decimal,
    #[validate(custom(function = "non_negative"))]
    #[serde(serialize_with = "lenient::serialize")]
    pub stock_quantity: Decimal,
}
