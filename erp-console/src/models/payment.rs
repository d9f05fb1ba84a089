use super::text;
use super::validation::positive;
use chrono::NaiveDate;
use console_core::filter::matches_any;
use console_core::numeric::{lenient, lenient_date};
use console_core::store::Resource;
use console_core::{Identified, RecordId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Payment received against an invoice.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Payment {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub invoice_id: Option<RecordId>,
    #[serde(with = "lenient", default)]
    pub amount: Decimal,
    #[serde(with = "lenient_date", default)]
    pub payment_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "text::deserialize")]
    pub payment_method: Option<String>,
    #[serde(default, deserialize_with = "text::deserialize")]
    pub reference: Option<String>,
}

impl Identified for Payment {
    fn record_id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }
}

impl Resource for Payment {
    const NAME: &'static str = "payment";
    const PATH: &'static str = "/payments";

    fn matches(&self, term: &str) -> bool {
        matches_any(
            term,
            [
                self.payment_method.as_deref().unwrap_or(""),
                self.reference.as_deref().unwrap_or(""),
            ],
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[serde(rename_all = "PascalCase")]
pub struct PaymentInput {
    pub invoice_id: RecordId,
    #[validate(custom(function = "positive"))]
    #[serde(serialize_with = "lenient::serialize")]
    pub amount: Decimal,
    #[validate(required(message = "Payment date is required"))]
    pub payment_date: Option<NaiveDate>,
    #[validate(length(min = 1, message = "Payment method is required"))]
    pub payment_method: String,
    pub reference: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn input_requires_positive_amount_and_date() {
        let input = PaymentInput {
            invoice_id: RecordId::Int(1),
            amount: Decimal::ZERO,
            payment_date: None,
            payment_method: "Cash".to_string(),
            reference: None,
        };
        let errors = input.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("amount"));
        assert!(fields.contains_key("payment_date"));
    }

    #[test]
    fn input_serializes_pascal_case() {
        let input = PaymentInput {
            invoice_id: RecordId::Int(9),
            amount: Decimal::new(5000, 2),
            payment_date: NaiveDate::from_ymd_opt(2024, 6, 1),
            payment_method: "Bank Transfer".to_string(),
            reference: Some("TX-1".to_string()),
        };
        let body = serde_json::to_value(&input).unwrap();
        assert_eq!(body["InvoiceId"], json!(9));
        assert_eq!(body["PaymentDate"], json!("2024-06-01"));
        assert_eq!(body["PaymentMethod"], json!("Bank Transfer"));
    }
}
