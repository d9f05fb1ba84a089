//! Editable invoice draft.
//!
//! A draft owns its line items until it is submitted as one payload. Every
//! setter takes raw form text and recomputes totals before returning, so
//! [`InvoiceDraft::totals`] is always consistent with the fields.

use super::totals::{calculate_totals, line_breakdown, Adjustments, InvoiceTotals, LineItemInput};
use crate::models::{
    non_negative, percentage, positive, DiscountType, Invoice, InvoiceStatus, ItemRef, Product,
    Service,
};
use chrono::NaiveDate;
use console_core::numeric::{self, lenient, parse_amount};
use console_core::{AppError, Identified, RecordId};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use validator::{Validate, ValidationError};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("Item {index} does not exist (draft has {len} items)")]
    ItemOutOfRange { index: usize, len: usize },

    #[error("{0} has no id and cannot be referenced")]
    MissingId(&'static str),
}

impl From<DraftError> for AppError {
    fn from(err: DraftError) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
pub struct DraftItem {
    #[validate(required(message = "Choose a product or service"))]
    pub item_ref: Option<ItemRef>,
    pub description: Option<String>,
    #[validate(custom(function = "positive"))]
    pub quantity: Decimal,
    #[validate(custom(function = "non_negative"))]
    pub unit_price: Decimal,
    #[validate(custom(function = "non_negative"))]
    pub discount: Decimal,
    pub discount_type: DiscountType,
    #[validate(custom(function = "percentage"))]
    pub tax_rate: Decimal,
}

impl Default for DraftItem {
    fn default() -> Self {
        Self {
            item_ref: None,
            description: None,
            quantity: Decimal::ONE,
            unit_price: Decimal::ZERO,
            discount: Decimal::ZERO,
            discount_type: DiscountType::Percentage,
            tax_rate: Decimal::ZERO,
        }
    }
}

impl DraftItem {
    pub fn input(&self) -> LineItemInput {
        LineItemInput {
            quantity: self.quantity,
            unit_price: self.unit_price,
            discount: self.discount,
            discount_type: self.discount_type,
            tax_rate: self.tax_rate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Validate)]
#[validate(schema(function = "validate_dates", skip_on_field_errors = false))]
pub struct InvoiceDraft {
    pub id: Option<RecordId>,
    #[validate(required(message = "Client is required"))]
    pub client_id: Option<RecordId>,
    pub invoice_number: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub status: InvoiceStatus,
    pub notes: Option<String>,
    #[validate(length(min = 1, message = "Add at least one item"), nested)]
    items: Vec<DraftItem>,
    adjustments: Adjustments,
    totals: InvoiceTotals,
}

fn validate_dates(draft: &InvoiceDraft) -> Result<(), ValidationError> {
    match (draft.invoice_date, draft.due_date) {
        (Some(issued), Some(due)) if due < issued => {
            let mut err = ValidationError::new("due_date");
            err.message = Some("Due date cannot be before the invoice date".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

impl InvoiceDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load an existing invoice for editing.
    ///
    /// The server's `DiscountAmount` covers item discounts and the
    /// invoice-level discount together; the invoice-level part is whatever
    /// the items do not account for.
    pub fn from_invoice(invoice: &Invoice) -> Self {
        let items: Vec<DraftItem> = invoice
            .line_items()
            .iter()
            .map(|item| DraftItem {
                item_ref: item.item_ref(),
                description: item.description.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                discount: item.discount,
                discount_type: item.discount_type,
                tax_rate: item.tax_rate,
            })
            .collect();

        let item_discounts: Decimal = items
            .iter()
            .map(|item| line_breakdown(&item.input()).discount)
            .fold(Decimal::ZERO, Decimal::saturating_add);

        let mut draft = Self {
            id: invoice.id.clone(),
            client_id: invoice.client_id.clone(),
            invoice_number: invoice.invoice_number.clone(),
            invoice_date: invoice.invoice_date,
            due_date: invoice.due_date,
            status: invoice.status,
            notes: invoice.notes.clone(),
            items,
            adjustments: Adjustments {
                invoice_discount_amount: numeric::non_negative(
                    invoice.discount_amount.saturating_sub(item_discounts),
                ),
                shipping_amount: invoice.shipping_amount,
            },
            totals: InvoiceTotals::default(),
        };
        draft.recalculate();
        draft
    }

    pub fn items(&self) -> &[DraftItem] {
        &self.items
    }

    pub fn adjustments(&self) -> Adjustments {
        self.adjustments
    }

    pub fn totals(&self) -> InvoiceTotals {
        self.totals
    }

    /// Append a blank item and return its index.
    pub fn add_item(&mut self) -> usize {
        self.items.push(DraftItem::default());
        self.recalculate();
        self.items.len() - 1
    }

    pub fn remove_item(&mut self, index: usize) -> Result<DraftItem, DraftError> {
        self.check_index(index)?;
        let removed = self.items.remove(index);
        self.recalculate();
        Ok(removed)
    }

    pub fn set_item_ref(&mut self, index: usize, item_ref: ItemRef) -> Result<(), DraftError> {
        self.edit(index, |item| item.item_ref = Some(item_ref))
    }

    /// Reference a catalog service and take over its price and tax rate.
    pub fn select_service(&mut self, index: usize, service: &Service) -> Result<(), DraftError> {
        let id = service
            .record_id()
            .cloned()
            .ok_or(DraftError::MissingId("Service"))?;
        self.edit(index, |item| {
            item.item_ref = Some(ItemRef::Service(id));
            item.unit_price = service.price;
            if let Some(rate) = service.tax_rate {
                item.tax_rate = rate;
            }
            if item.description.is_none() {
                item.description = service.name.clone();
            }
        })
    }

    pub fn select_product(&mut self, index: usize, product: &Product) -> Result<(), DraftError> {
        let id = product
            .record_id()
            .cloned()
            .ok_or(DraftError::MissingId("Product"))?;
        self.edit(index, |item| {
            item.item_ref = Some(ItemRef::Product(id));
            item.unit_price = product.unit_price;
            if item.description.is_none() {
                item.description = product.name.clone();
            }
        })
    }

    pub fn set_description(&mut self, index: usize, text: &str) -> Result<(), DraftError> {
        let text = text.trim();
        self.edit(index, |item| {
            item.description = (!text.is_empty()).then(|| text.to_string());
        })
    }

    pub fn set_quantity(&mut self, index: usize, raw: &str) -> Result<(), DraftError> {
        self.edit(index, |item| item.quantity = parse_amount(raw))
    }

    pub fn set_unit_price(&mut self, index: usize, raw: &str) -> Result<(), DraftError> {
        self.edit(index, |item| item.unit_price = parse_amount(raw))
    }

    pub fn set_discount(&mut self, index: usize, raw: &str) -> Result<(), DraftError> {
        self.edit(index, |item| item.discount = parse_amount(raw))
    }

    pub fn set_discount_type(
        &mut self,
        index: usize,
        discount_type: DiscountType,
    ) -> Result<(), DraftError> {
        self.edit(index, |item| item.discount_type = discount_type)
    }

    pub fn set_tax_rate(&mut self, index: usize, raw: &str) -> Result<(), DraftError> {
        self.edit(index, |item| item.tax_rate = parse_amount(raw))
    }

    pub fn set_invoice_discount(&mut self, raw: &str) {
        self.adjustments.invoice_discount_amount = parse_amount(raw);
        self.recalculate();
    }

    pub fn set_shipping(&mut self, raw: &str) {
        self.adjustments.shipping_amount = parse_amount(raw);
        self.recalculate();
    }

    /// Validate and build the create/update body.
    pub fn to_payload(&self) -> Result<InvoicePayload, AppError> {
        self.validate()?;

        let client_id = self
            .client_id
            .clone()
            .ok_or_else(|| AppError::InternalError(anyhow::anyhow!("Client is required")))?;

        let items = self
            .items
            .iter()
            .map(|item| {
                let line = line_breakdown(&item.input());
                InvoiceItemPayload {
                    product_id: item.item_ref.as_ref().and_then(ItemRef::product_id).cloned(),
                    service_id: item.item_ref.as_ref().and_then(ItemRef::service_id).cloned(),
                    description: item.description.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    discount: item.discount,
                    discount_type: item.discount_type,
                    tax_rate: item.tax_rate,
                    line_total: line.line_total(),
                }
            })
            .collect();

        let totals = self.totals;
        Ok(InvoicePayload {
            id: self.id.clone(),
            client_id,
            invoice_number: self.invoice_number.clone(),
            invoice_date: self.invoice_date,
            due_date: self.due_date,
            status: self.status,
            notes: self.notes.clone(),
            sub_total: totals.subtotal,
            tax_amount: totals.total_tax,
            discount_amount: totals
                .total_discount
                .saturating_add(numeric::non_negative(self.adjustments.invoice_discount_amount)),
            shipping_amount: numeric::non_negative(self.adjustments.shipping_amount),
            total_amount: totals.grand_total,
            items,
        })
    }

    fn edit(&mut self, index: usize, f: impl FnOnce(&mut DraftItem)) -> Result<(), DraftError> {
        self.check_index(index)?;
        f(&mut self.items[index]);
        self.recalculate();
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<(), DraftError> {
        if index < self.items.len() {
            Ok(())
        } else {
            Err(DraftError::ItemOutOfRange {
                index,
                len: self.items.len(),
            })
        }
    }

    fn recalculate(&mut self) {
        let inputs: Vec<LineItemInput> = self.items.iter().map(DraftItem::input).collect();
        self.totals = calculate_totals(&inputs, &self.adjustments);
    }
}

/// Create/update body for `/invoices`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvoicePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub client_id: RecordId,
    pub invoice_number: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub status: InvoiceStatus,
    pub notes: Option<String>,
    #[serde(serialize_with = "lenient::serialize")]
    pub sub_total: Decimal,
    #[serde(serialize_with = "lenient::serialize")]
    pub tax_amount: Decimal,
    #[serde(serialize_with = "lenient::serialize")]
    pub discount_amount: Decimal,
    #[serde(serialize_with = "lenient::serialize")]
    pub shipping_amount: Decimal,
    #[serde(serialize_with = "lenient::serialize")]
    pub total_amount: Decimal,
    pub items: Vec<InvoiceItemPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvoiceItemPayload {
    pub product_id: Option<RecordId>,
    pub service_id: Option<RecordId>,
    pub description: Option<String>,
    #[serde(serialize_with = "lenient::serialize")]
    pub quantity: Decimal,
    #[serde(serialize_with = "lenient::serialize")]
    pub unit_price: Decimal,
    #[serde(serialize_with = "lenient::serialize")]
    pub discount: Decimal,
    pub discount_type: DiscountType,
    #[serde(serialize_with = "lenient::serialize")]
    pub tax_rate: Decimal,
    #[serde(serialize_with = "lenient::serialize")]
    pub line_total: Decimal,
}
