use crate::models::SalaryComponent;
use console_core::http::Transport;
use console_core::inflight::InFlightRegistry;
use console_core::store::CollectionStore;
use console_core::{AppError, RecordId};
use rust_decimal::Decimal;
use std::ops::Deref;
use std::sync::Arc;

const EMPLOYEE_FILTER: &str = "employeeId";

/// Salary components, listed one employee at a time.
pub struct SalaryComponentStore {
    collection: CollectionStore<SalaryComponent>,
}

impl SalaryComponentStore {
    pub fn new(transport: Arc<dyn Transport>, page_size: u32, inflight: InFlightRegistry) -> Self {
        Self {
            collection: CollectionStore::with_inflight(transport, page_size, inflight),
        }
    }

    pub async fn for_employee(&self, employee_id: &RecordId) -> Result<(), AppError> {
        self.collection
            .set_filter(EMPLOYEE_FILTER, Some(employee_id.as_key()))
            .await
    }

    pub fn employee(&self) -> Option<String> {
        self.collection.query().filters.get(EMPLOYEE_FILTER).cloned()
    }

    /// Base salary adjusted by every loaded component.
    pub fn net_salary(&self, base_salary: Decimal) -> Decimal {
        self.collection
            .snapshot()
            .collection
            .items
            .iter()
            .map(|component| component.effective_amount(base_salary))
            .fold(base_salary, Decimal::saturating_add)
    }
}

impl Deref for SalaryComponentStore {
    type Target = CollectionStore<SalaryComponent>;

    fn deref(&self) -> &Self::Target {
        &self.collection
    }
}
