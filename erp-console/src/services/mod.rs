//! Invoice computations. Nothing in here performs I/O.

pub mod audit;
pub mod draft;
pub mod totals;

pub use audit::{audit_invoice, AuditFinding, InvoiceAudit};
pub use draft::{DraftError, DraftItem, InvoiceDraft, InvoiceItemPayload, InvoicePayload};
pub use totals::{
    calculate_totals, line_breakdown, reconcile_balance, subtotal, Adjustments, BalanceView,
    InvoiceTotals, LineBreakdown, LineItemInput, SubtotalBasis,
};
