use super::totals::{calculate_totals, subtotal, Adjustments, InvoiceTotals, SubtotalBasis};
use crate::models::Invoice;
use console_core::RecordId;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

/// Largest difference still treated as equal.
pub const TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditFinding {
    /// The server subtotal matches neither basis.
    SubtotalMismatch {
        server: Decimal,
        pre_tax: Decimal,
        line_total: Decimal,
    },
    /// The server subtotal follows `Σ LineTotal` rather than the pre-tax sum.
    LineTotalSubtotal { server: Decimal },
    /// `TotalAmount ≠ SubTotal + TaxAmount − DiscountAmount + ShippingAmount`.
    HeaderInconsistent { expected: Decimal, actual: Decimal },
    /// `BalanceAmount ≠ TotalAmount − PaidAmount`.
    BalanceInconsistent { expected: Decimal, actual: Decimal },
}

impl fmt::Display for AuditFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditFinding::SubtotalMismatch {
                server,
                pre_tax,
                line_total,
            } => write!(
                f,
                "subtotal {server} matches neither items pre-tax ({pre_tax}) nor line totals ({line_total})"
            ),
            AuditFinding::LineTotalSubtotal { server } => {
                write!(f, "subtotal {server} is the sum of line totals, not the pre-tax sum")
            }
            AuditFinding::HeaderInconsistent { expected, actual } => {
                write!(f, "total {actual} differs from header arithmetic {expected}")
            }
            AuditFinding::BalanceInconsistent { expected, actual } => {
                write!(f, "balance {actual} differs from total minus paid {expected}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceAudit {
    pub id: Option<RecordId>,
    pub invoice_number: Option<String>,
    /// Which basis the server subtotal follows, if any.
    #[serde(skip)]
    pub basis: Option<SubtotalBasis>,
    /// Totals recomputed from the line items.
    pub recomputed: InvoiceTotals,
    pub findings: Vec<AuditFinding>,
}

impl InvoiceAudit {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

fn close(a: Decimal, b: Decimal) -> bool {
    a.saturating_sub(b).abs() <= TOLERANCE
}

/// Recompute an invoice from its items and compare with the server's header.
///
/// Invoices without items only get the header and balance checks.
pub fn audit_invoice(invoice: &Invoice) -> InvoiceAudit {
    let inputs = invoice.line_inputs();
    let recomputed = calculate_totals(
        &inputs,
        &Adjustments {
            invoice_discount_amount: Decimal::ZERO,
            shipping_amount: invoice.shipping_amount,
        },
    );
    let server_subtotal = invoice.subtotal();
    let mut findings = Vec::new();

    let basis = if inputs.is_empty() {
        None
    } else {
        let pre_tax = subtotal(&inputs, SubtotalBasis::PreTax);
        let line_total = subtotal(&inputs, SubtotalBasis::LineTotal);
        if close(server_subtotal, pre_tax) {
            Some(SubtotalBasis::PreTax)
        } else if close(server_subtotal, line_total) {
            findings.push(AuditFinding::LineTotalSubtotal {
                server: server_subtotal,
            });
            Some(SubtotalBasis::LineTotal)
        } else {
            findings.push(AuditFinding::SubtotalMismatch {
                server: server_subtotal,
                pre_tax,
                line_total,
            });
            None
        }
    };

    let expected_total = server_subtotal
        .saturating_add(invoice.tax_amount)
        .saturating_sub(invoice.discount_amount)
        .saturating_add(invoice.shipping_amount);
    if !close(expected_total, invoice.total_amount) {
        findings.push(AuditFinding::HeaderInconsistent {
            expected: expected_total,
            actual: invoice.total_amount,
        });
    }

    if let Some(actual) = invoice.balance_amount {
        let expected = invoice.total_amount.saturating_sub(invoice.paid_amount);
        if !close(expected, actual) {
            findings.push(AuditFinding::BalanceInconsistent { expected, actual });
        }
    }

    if !findings.is_empty() {
        tracing::debug!(
            invoice = ?invoice.invoice_number,
            findings = findings.len(),
            "Invoice audit found inconsistencies"
        );
    }

    InvoiceAudit {
        id: invoice.id.clone(),
        invoice_number: invoice.invoice_number.clone(),
        basis,
        recomputed,
        findings,
    }
}
