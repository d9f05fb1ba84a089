//! Invoice totals.
//!
//! Everything here is a pure function of its inputs. The draft editor calls
//! [`calculate_totals`] after every single-field edit, so results must not
//! depend on call order or on previous results. Sums are exact decimals;
//! rounding is applied only through [`InvoiceTotals::rounded`]. Arithmetic
//! saturates at [`Decimal::MAX`] instead of overflowing.

use crate::models::DiscountType;
use console_core::numeric::{non_negative, parse_amount, to_display};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One line as the calculator sees it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemInput {
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub discount_type: DiscountType,
    pub tax_rate: Decimal,
}

impl LineItemInput {
    /// Build from raw form text. Anything that does not start with a number
    /// counts as 0.
    pub fn from_form(
        quantity: &str,
        unit_price: &str,
        discount: &str,
        discount_type: DiscountType,
        tax_rate: &str,
    ) -> Self {
        Self {
            quantity: parse_amount(quantity),
            unit_price: parse_amount(unit_price),
            discount: parse_amount(discount),
            discount_type,
            tax_rate: parse_amount(tax_rate),
        }
    }
}

/// Per-line intermediate amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineBreakdown {
    pub line_amount: Decimal,
    pub discount: Decimal,
    pub taxable: Decimal,
    pub tax: Decimal,
}

impl LineBreakdown {
    /// Taxable amount plus tax, the value sent as an item's `LineTotal`.
    pub fn line_total(&self) -> Decimal {
        self.taxable.saturating_add(self.tax)
    }
}

pub fn line_breakdown(item: &LineItemInput) -> LineBreakdown {
    let quantity = non_negative(item.quantity);
    let unit_price = non_negative(item.unit_price);
    let discount = non_negative(item.discount);
    let tax_rate = non_negative(item.tax_rate).min(Decimal::ONE_HUNDRED);

    let line_amount = quantity.saturating_mul(unit_price);
    let discount = match item.discount_type {
        DiscountType::Percentage => line_amount.saturating_mul(discount / Decimal::ONE_HUNDRED),
        DiscountType::Fixed => discount,
    };
    let taxable = non_negative(line_amount.saturating_sub(discount));
    let tax = taxable.saturating_mul(tax_rate / Decimal::ONE_HUNDRED);

    LineBreakdown {
        line_amount,
        discount,
        taxable,
        tax,
    }
}

/// Invoice-level amounts applied after the item sums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Adjustments {
    pub invoice_discount_amount: Decimal,
    pub shipping_amount: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    pub total_discount: Decimal,
    pub total_tax: Decimal,
    pub grand_total: Decimal,
}

impl InvoiceTotals {
    /// Two-decimal copy for display.
    pub fn rounded(&self) -> Self {
        Self {
            subtotal: to_display(self.subtotal),
            total_discount: to_display(self.total_discount),
            total_tax: to_display(self.total_tax),
            grand_total: to_display(self.grand_total),
        }
    }
}

pub fn calculate_totals(items: &[LineItemInput], adjustments: &Adjustments) -> InvoiceTotals {
    let (subtotal, total_discount, total_tax) = items.iter().map(line_breakdown).fold(
        (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
        |(subtotal, discount, tax), line| {
            (
                subtotal.saturating_add(line.line_amount),
                discount.saturating_add(line.discount),
                tax.saturating_add(line.tax),
            )
        },
    );

    let grand_total = non_negative(
        subtotal
            .saturating_sub(total_discount)
            .saturating_add(total_tax)
            .saturating_add(non_negative(adjustments.shipping_amount))
            .saturating_sub(non_negative(adjustments.invoice_discount_amount)),
    );

    InvoiceTotals {
        subtotal,
        total_discount,
        total_tax,
        grand_total,
    }
}

/// How a subtotal is derived from line items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubtotalBasis {
    /// `Σ quantity × unit price`, before discount and tax.
    #[default]
    PreTax,
    /// `Σ LineTotal`, after item discount and tax.
    LineTotal,
}

impl SubtotalBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubtotalBasis::PreTax => "pre-tax",
            SubtotalBasis::LineTotal => "line-total",
        }
    }
}

pub fn subtotal(items: &[LineItemInput], basis: SubtotalBasis) -> Decimal {
    items
        .iter()
        .map(line_breakdown)
        .map(|line| match basis {
            SubtotalBasis::PreTax => line.line_amount,
            SubtotalBasis::LineTotal => line.line_total(),
        })
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Paid/balance pair as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceView {
    pub total: Decimal,
    pub paid: Decimal,
    /// Outstanding amount, never below zero.
    pub balance: Decimal,
    /// True when the balance was computed locally rather than sent.
    pub derived: bool,
}

/// The server's balance wins when it sent one.
pub fn reconcile_balance(total: Decimal, paid: Decimal, server: Option<Decimal>) -> BalanceView {
    let (raw, derived) = match server {
        Some(balance) => (balance, false),
        None => (total.saturating_sub(paid), true),
    };
    BalanceView {
        total,
        paid,
        balance: non_negative(raw),
        derived,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn form_text_coerces_like_parse_float() {
        let item = LineItemInput::from_form("3abc", "", "x", DiscountType::Fixed, "12.5%");
        assert_eq!(item.quantity, dec("3"));
        assert_eq!(item.unit_price, Decimal::ZERO);
        assert_eq!(item.discount, Decimal::ZERO);
        assert_eq!(item.tax_rate, dec("12.5"));
    }

    #[test]
    fn negative_inputs_are_clamped() {
        let item = LineItemInput {
            quantity: dec("-2"),
            unit_price: dec("10"),
            discount: dec("-5"),
            discount_type: DiscountType::Fixed,
            tax_rate: dec("150"),
        };
        let line = line_breakdown(&item);
        assert_eq!(line.line_amount, Decimal::ZERO);
        assert_eq!(line.discount, Decimal::ZERO);
        assert_eq!(line.tax, Decimal::ZERO);
    }

    #[test]
    fn subtotal_bases_differ_by_discount_and_tax() {
        let items = [LineItemInput {
            quantity: dec("2"),
            unit_price: dec("100"),
            discount: dec("10"),
            discount_type: DiscountType::Percentage,
            tax_rate: dec("15"),
        }];
        assert_eq!(subtotal(&items, SubtotalBasis::PreTax), dec("200"));
        assert_eq!(subtotal(&items, SubtotalBasis::LineTotal), dec("207"));
    }

    #[test]
    fn rounding_only_at_display() {
        let items = [LineItemInput {
            quantity: dec("3"),
            unit_price: dec("0.335"),
            discount: Decimal::ZERO,
            discount_type: DiscountType::Percentage,
            tax_rate: dec("7"),
        }];
        let totals = calculate_totals(&items, &Adjustments::default());
        assert_eq!(totals.subtotal, dec("1.005"));
        assert_eq!(totals.rounded().subtotal, dec("1.01"));
    }

    #[test]
    fn oversized_amounts_saturate() {
        let huge = LineItemInput::from_form(
            "99999999999999999999",
            "99999999999999999999",
            "10",
            DiscountType::Percentage,
            "15",
        );
        let line = line_breakdown(&huge);
        assert_eq!(line.line_amount, Decimal::MAX);

        let totals = calculate_totals(
            &[huge, huge],
            &Adjustments {
                invoice_discount_amount: Decimal::ZERO,
                shipping_amount: Decimal::MAX,
            },
        );
        assert_eq!(totals.subtotal, Decimal::MAX);
        assert_eq!(totals.grand_total, Decimal::MAX);
        assert_eq!(subtotal(&[huge, huge], SubtotalBasis::LineTotal), Decimal::MAX);
        assert_eq!(reconcile_balance(Decimal::MIN, Decimal::MAX, None).balance, Decimal::ZERO);
    }

    #[test]
    fn server_balance_is_authoritative() {
        let view = reconcile_balance(dec("100"), dec("30"), Some(dec("50")));
        assert_eq!(view.balance, dec("50"));
        assert!(!view.derived);

        let view = reconcile_balance(dec("100"), dec("130"), None);
        assert_eq!(view.balance, Decimal::ZERO);
        assert!(view.derived);
    }
}
