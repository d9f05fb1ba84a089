//! Invoice model for erp-console.

use crate::services::totals::{reconcile_balance, BalanceView, LineItemInput};
use chrono::NaiveDate;
use console_core::envelope;
use console_core::filter::matches_any;
use console_core::numeric::{lenient, lenient_date, lenient_option};
use console_core::store::Resource;
use console_core::{Identified, RecordId};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::str::FromStr;
use thiserror::Error;

/// Invoice lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Sent,
    Paid,
    Overdue,
    Voided,
    Partial,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 6] = [
        InvoiceStatus::Draft,
        InvoiceStatus::Sent,
        InvoiceStatus::Paid,
        InvoiceStatus::Overdue,
        InvoiceStatus::Voided,
        InvoiceStatus::Partial,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "Draft",
            InvoiceStatus::Sent => "Sent",
            InvoiceStatus::Paid => "Paid",
            InvoiceStatus::Overdue => "Overdue",
            InvoiceStatus::Voided => "Voided",
            InvoiceStatus::Partial => "Partial",
        }
    }

    /// Case-insensitive, accepting the spellings seen across endpoints.
    /// Unknown values fall back to `Draft`.
    pub fn from_string(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }

    fn from_ordinal(n: u64) -> Self {
        Self::ALL
            .get(n as usize)
            .copied()
            .unwrap_or(InvoiceStatus::Draft)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown invoice status '{0}' (expected Draft, Sent, Paid, Overdue, Voided or Partial)")]
pub struct UnknownStatus(pub String);

impl FromStr for InvoiceStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace([' ', '_', '-'], "").as_str() {
            "draft" => Ok(InvoiceStatus::Draft),
            "sent" | "issued" => Ok(InvoiceStatus::Sent),
            "paid" => Ok(InvoiceStatus::Paid),
            "overdue" => Ok(InvoiceStatus::Overdue),
            "voided" | "void" | "cancelled" => Ok(InvoiceStatus::Voided),
            "partial" | "partiallypaid" => Ok(InvoiceStatus::Partial),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

impl Serialize for InvoiceStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for InvoiceStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => InvoiceStatus::from_string(&s),
            Value::Number(n) => n
                .as_u64()
                .map(InvoiceStatus::from_ordinal)
                .unwrap_or_default(),
            _ => InvoiceStatus::Draft,
        })
    }
}

/// How an item discount is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    #[default]
    Percentage,
    Fixed,
}

impl DiscountType {
    pub fn from_string(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" | "amount" | "flat" => DiscountType::Fixed,
            _ => DiscountType::Percentage,
        }
    }
}

impl<'de> Deserialize<'de> for DiscountType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => DiscountType::from_string(&s),
            Value::Number(n) if n.as_u64() == Some(1) => DiscountType::Fixed,
            _ => DiscountType::Percentage,
        })
    }
}

/// What a line item bills for. Exactly one of product or service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum ItemRef {
    Product(RecordId),
    Service(RecordId),
}

impl ItemRef {
    pub fn product_id(&self) -> Option<&RecordId> {
        match self {
            ItemRef::Product(id) => Some(id),
            ItemRef::Service(_) => None,
        }
    }

    pub fn service_id(&self) -> Option<&RecordId> {
        match self {
            ItemRef::Service(id) => Some(id),
            ItemRef::Product(_) => None,
        }
    }
}

/// Line item on an invoice.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvoiceItem {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub product_id: Option<RecordId>,
    #[serde(default)]
    pub service_id: Option<RecordId>,
    #[serde(default, deserialize_with = "crate::models::text::deserialize")]
    pub description: Option<String>,
    #[serde(with = "lenient", default)]
    pub quantity: Decimal,
    #[serde(with = "lenient", default)]
    pub unit_price: Decimal,
    #[serde(with = "lenient", default)]
    pub discount: Decimal,
    #[serde(default)]
    pub discount_type: DiscountType,
    #[serde(with = "lenient", default)]
    pub tax_rate: Decimal,
    #[serde(with = "lenient_option", default)]
    pub line_total: Option<Decimal>,
}

impl InvoiceItem {
    /// Product wins if the server sent both ids.
    pub fn item_ref(&self) -> Option<ItemRef> {
        match (&self.product_id, &self.service_id) {
            (Some(id), _) => Some(ItemRef::Product(id.clone())),
            (None, Some(id)) => Some(ItemRef::Service(id.clone())),
            (None, None) => None,
        }
    }

    pub fn to_input(&self) -> LineItemInput {
        LineItemInput {
            quantity: self.quantity,
            unit_price: self.unit_price,
            discount: self.discount,
            discount_type: self.discount_type,
            tax_rate: self.tax_rate,
        }
    }
}

/// Invoice as returned by the API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Invoice {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default, deserialize_with = "crate::models::text::deserialize")]
    pub invoice_number: Option<String>,
    #[serde(default)]
    pub client_id: Option<RecordId>,
    #[serde(default, deserialize_with = "crate::models::text::deserialize")]
    pub client_name: Option<String>,
    /// Embedded client object or plain name, depending on the endpoint.
    #[serde(default, deserialize_with = "crate::models::text::deserialize")]
    pub client: Option<String>,
    #[serde(with = "lenient_date", default)]
    pub invoice_date: Option<NaiveDate>,
    #[serde(with = "lenient_date", default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: InvoiceStatus,
    #[serde(with = "lenient_option", default)]
    pub sub_total: Option<Decimal>,
    #[serde(with = "lenient_option", default, alias = "Subtotal")]
    pub subtotal_amount: Option<Decimal>,
    #[serde(with = "lenient", default)]
    pub tax_amount: Decimal,
    #[serde(with = "lenient", default)]
    pub discount_amount: Decimal,
    #[serde(with = "lenient", default)]
    pub shipping_amount: Decimal,
    #[serde(with = "lenient", default)]
    pub total_amount: Decimal,
    #[serde(with = "lenient", default)]
    pub paid_amount: Decimal,
    #[serde(with = "lenient_option", default)]
    pub balance_amount: Option<Decimal>,
    #[serde(default, deserialize_with = "crate::models::text::deserialize")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "envelope::list")]
    pub items: Vec<InvoiceItem>,
    #[serde(default, deserialize_with = "envelope::list")]
    pub invoice_items: Vec<InvoiceItem>,
}

impl Invoice {
    /// `SubTotal` or `SubtotalAmount`, whichever the endpoint sent.
    pub fn subtotal(&self) -> Decimal {
        self.sub_total
            .or(self.subtotal_amount)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn client_label(&self) -> Option<&str> {
        self.client_name.as_deref().or(self.client.as_deref())
    }

    /// Server balance when present, otherwise total minus paid.
    pub fn balance(&self) -> BalanceView {
        reconcile_balance(self.total_amount, self.paid_amount, self.balance_amount)
    }

    /// Status to show on `today`. The server's status stays authoritative;
    /// this only surfaces overdue and partially paid invoices it has not
    /// re-labelled yet.
    pub fn display_status(&self, today: NaiveDate) -> InvoiceStatus {
        if matches!(self.status, InvoiceStatus::Voided | InvoiceStatus::Draft) {
            return self.status;
        }

        let balance = self.balance().balance;
        if balance <= Decimal::ZERO && self.total_amount > Decimal::ZERO {
            return InvoiceStatus::Paid;
        }
        if self.due_date.is_some_and(|due| due < today) {
            return InvoiceStatus::Overdue;
        }
        if self.paid_amount > Decimal::ZERO {
            return InvoiceStatus::Partial;
        }
        self.status
    }

    /// Line items from `Items` or `InvoiceItems`.
    pub fn line_items(&self) -> &[InvoiceItem] {
        if self.items.is_empty() {
            &self.invoice_items
        } else {
            &self.items
        }
    }

    pub fn line_inputs(&self) -> Vec<LineItemInput> {
        self.line_items().iter().map(InvoiceItem::to_input).collect()
    }
}

impl Identified for Invoice {
    fn record_id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }
}

impl Resource for Invoice {
    const NAME: &'static str = "invoice";
    const PATH: &'static str = "/invoices";

    fn matches(&self, term: &str) -> bool {
        matches_any(
            term,
            [
                self.invoice_number.as_deref().unwrap_or(""),
                self.client_label().unwrap_or(""),
                self.status.as_str(),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use console_core::envelope::decode_record;
    use serde_json::json;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn status_parses_names_and_ordinals() {
        assert_eq!(InvoiceStatus::from_string("PAID"), InvoiceStatus::Paid);
        assert_eq!(InvoiceStatus::from_string("Partially Paid"), InvoiceStatus::Partial);
        assert_eq!(InvoiceStatus::from_string("void"), InvoiceStatus::Voided);
        assert_eq!(InvoiceStatus::from_string("something"), InvoiceStatus::Draft);
    }

    #[test]
    fn strict_status_parse_rejects_unknown_names() {
        assert_eq!("overdue".parse(), Ok(InvoiceStatus::Overdue));
        assert_eq!("Draft".parse(), Ok(InvoiceStatus::Draft));
        assert_eq!(
            "bogus".parse::<InvoiceStatus>(),
            Err(UnknownStatus("bogus".to_string()))
        );

        let status: InvoiceStatus = serde_json::from_value(json!(3)).unwrap();
        assert_eq!(status, InvoiceStatus::Overdue);
    }

    #[test]
    fn decodes_camel_case_invoice_with_wrapped_items() {
        let body = json!({
            "success": true,
            "data": {
                "id": 12,
                "invoiceNumber": "INV-0012",
                "clientId": 4,
                "client": { "id": 4, "name": "Acme Ltd" },
                "invoiceDate": "2024-05-01T00:00:00",
                "dueDate": "2024-05-31",
                "status": "Sent",
                "subtotalAmount": "200.00",
                "taxAmount": 27,
                "discountAmount": 20,
                "shippingAmount": null,
                "totalAmount": 207,
                "paidAmount": 7,
                "invoiceItems": { "$values": [
                    { "id": 1, "serviceId": 9, "quantity": "2", "unitPrice": 100,
                      "discount": 10, "discountType": "Percentage", "taxRate": 15 }
                ]}
            }
        });

        let invoice: Invoice = decode_record(&body).unwrap();

        assert_eq!(invoice.id, Some(RecordId::Int(12)));
        assert_eq!(invoice.invoice_number.as_deref(), Some("INV-0012"));
        assert_eq!(invoice.client_label(), Some("Acme Ltd"));
        assert_eq!(invoice.invoice_date, NaiveDate::from_ymd_opt(2024, 5, 1));
        assert_eq!(invoice.subtotal(), dec("200"));
        assert_eq!(invoice.shipping_amount, Decimal::ZERO);
        assert_eq!(invoice.balance_amount, None);
        let items = invoice.line_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item_ref(), Some(ItemRef::Service(RecordId::Int(9))));
        assert_eq!(items[0].quantity, dec("2"));
        assert_eq!(invoice.balance().balance, dec("200"));
    }

    fn invoice(status: InvoiceStatus, total: &str, paid: &str, due: Option<NaiveDate>) -> Invoice {
        Invoice {
            id: Some(RecordId::Int(1)),
            invoice_number: Some("INV-1".to_string()),
            client_id: None,
            client_name: None,
            client: None,
            invoice_date: None,
            due_date: due,
            status,
            sub_total: Some(dec(total)),
            subtotal_amount: None,
            tax_amount: Decimal::ZERO,
            discount_amount: Decimal::ZERO,
            shipping_amount: Decimal::ZERO,
            total_amount: dec(total),
            paid_amount: dec(paid),
            balance_amount: None,
            notes: None,
            items: Vec::new(),
            invoice_items: Vec::new(),
        }
    }

    #[test]
    fn display_status_flags_overdue_and_partial() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let past = NaiveDate::from_ymd_opt(2024, 6, 1);
        let future = NaiveDate::from_ymd_opt(2024, 7, 1);

        assert_eq!(
            invoice(InvoiceStatus::Sent, "100", "0", past).display_status(today),
            InvoiceStatus::Overdue
        );
        assert_eq!(
            invoice(InvoiceStatus::Sent, "100", "40", future).display_status(today),
            InvoiceStatus::Partial
        );
        assert_eq!(
            invoice(InvoiceStatus::Sent, "100", "100", past).display_status(today),
            InvoiceStatus::Paid
        );
        assert_eq!(
            invoice(InvoiceStatus::Voided, "100", "0", past).display_status(today),
            InvoiceStatus::Voided
        );
        assert_eq!(
            invoice(InvoiceStatus::Sent, "100", "0", future).display_status(today),
            InvoiceStatus::Sent
        );
    }

    #[test]
    fn search_matches_number_and_client() {
        let mut inv = invoice(InvoiceStatus::Sent, "10", "0", None);
        inv.client_name = Some("Globex".to_string());
        assert!(inv.matches("inv-1"));
        assert!(inv.matches("glob"));
        assert!(!inv.matches("acme"));
    }
}
