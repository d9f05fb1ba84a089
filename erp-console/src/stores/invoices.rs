use crate::models::{Invoice, InvoiceStatus, Payment, PaymentInput};
use crate::services::InvoiceDraft;
use chrono::NaiveDate;
use console_core::envelope::decode_record;
use console_core::http::{ApiRequest, Transport};
use console_core::inflight::InFlightRegistry;
use console_core::store::{CollectionStore, Resource};
use console_core::{AppError, Identified};
use rust_decimal::Decimal;
use serde::Serialize;
use std::ops::Deref;
use std::sync::Arc;
use validator::Validate;

/// Invoice store: the generic collection operations plus status filtering,
/// draft submission and payments.
pub struct InvoiceStore {
    collection: CollectionStore<Invoice>,
}

/// Figures for the current page, derived from server amounts only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSummary {
    pub count: usize,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub outstanding: Decimal,
    pub overdue: usize,
}

/// Outcome of an accepted payment.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentReceipt {
    pub payment: Payment,
    /// The reloaded invoice, or `None` when the reload failed.
    pub invoice: Option<Invoice>,
}

impl InvoiceStore {
    pub fn new(transport: Arc<dyn Transport>, page_size: u32, inflight: InFlightRegistry) -> Self {
        Self {
            collection: CollectionStore::with_inflight(transport, page_size, inflight),
        }
    }

    /// Filter by status (server side). `None` shows every status.
    pub async fn set_status_filter(&self, status: Option<InvoiceStatus>) -> Result<(), AppError> {
        self.collection
            .set_filter("status", status.map(|s| s.as_str().to_string()))
            .await
    }

    /// Validate the draft locally, then create it.
    pub async fn create_from_draft(&self, draft: &InvoiceDraft) -> Result<Invoice, AppError> {
        let payload = draft.to_payload()?;
        self.collection.create(&payload).await
    }

    pub async fn update_from_draft(&self, draft: &InvoiceDraft) -> Result<Invoice, AppError> {
        let id = draft.id.clone().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!("Only a saved invoice can be updated"))
        })?;
        let payload = draft.to_payload()?;
        self.collection.update(&id, &payload).await
    }

    /// Record a payment, then reload the invoice so the server's paid
    /// amount, balance and status replace the local copy.
    ///
    /// Once the server has accepted the payment this never returns `Err`.
    /// A failed reload leaves `invoice` empty and the reload error in state.
    #[tracing::instrument(skip(self, input), fields(invoice_id = %input.invoice_id))]
    pub async fn record_payment(&self, input: &PaymentInput) -> Result<PaymentReceipt, AppError> {
        input.validate()?;
        let _permit = self
            .collection
            .inflight()
            .acquire("payment.create", Some(&input.invoice_id))?;
        self.collection.begin();

        let result = async {
            let request = ApiRequest::post(Payment::PATH).json(input)?;
            let body = self.collection.transport().send(request).await?;
            Ok::<_, AppError>(decode_record::<Payment>(&body).ok())
        }
        .await;

        let payment = match result {
            Ok(payment) => payment,
            Err(e) => return Err(self.collection.record_failure("payment", e)),
        };

        // Some endpoints answer with only {Success, Message}.
        let payment = payment
            .filter(|p| p.record_id().is_some())
            .unwrap_or_else(|| Payment {
                id: None,
                invoice_id: Some(input.invoice_id.clone()),
                amount: input.amount,
                payment_date: input.payment_date,
                payment_method: Some(input.payment_method.clone()),
                reference: input.reference.clone(),
            });

        let invoice = match self.collection.load(&input.invoice_id).await {
            Ok(invoice) => {
                tracing::info!(
                    amount = %input.amount,
                    balance = %invoice.balance().balance,
                    "Payment recorded"
                );
                Some(invoice)
            }
            Err(e) => {
                tracing::warn!(
                    amount = %input.amount,
                    error = %e,
                    "Payment recorded but the invoice could not be reloaded"
                );
                None
            }
        };

        Ok(PaymentReceipt { payment, invoice })
    }

    pub fn summary(&self, today: NaiveDate) -> InvoiceSummary {
        let invoices = self.collection.snapshot().collection.items;
        invoices
            .iter()
            .fold(InvoiceSummary::default(), |mut summary, invoice| {
                let balance = invoice.balance();
                summary.count += 1;
                summary.total_amount = summary.total_amount.saturating_add(balance.total);
                summary.paid_amount = summary.paid_amount.saturating_add(balance.paid);
                summary.outstanding = summary.outstanding.saturating_add(balance.balance);
                if invoice.display_status(today) == InvoiceStatus::Overdue {
                    summary.overdue += 1;
                }
                summary
            })
    }
}

impl Deref for InvoiceStore {
    type Target = CollectionStore<Invoice>;

    fn deref(&self) -> &Self::Target {
        &self.collection
    }
}
