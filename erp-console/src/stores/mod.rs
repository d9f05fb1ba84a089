//! Application stores, one per bounded context.
//!
//! [`ConsoleState`] is built once at start-up and handed to whatever renders
//! the data. All stores share one transport and one in-flight registry.

mod invoices;
mod salary;

pub use invoices::{InvoiceStore, InvoiceSummary, PaymentReceipt};
pub use salary::SalaryComponentStore;

use crate::models::{Client, Employee, Payment, Product, Service};
use console_core::config::Settings;
use console_core::http::{ApiClient, Transport};
use console_core::inflight::InFlightRegistry;
use console_core::store::CollectionStore;
use console_core::AppError;
use std::sync::Arc;

pub type ClientStore = CollectionStore<Client>;
pub type ServiceStore = CollectionStore<Service>;
pub type ProductStore = CollectionStore<Product>;
pub type EmployeeStore = CollectionStore<Employee>;
pub type PaymentStore = CollectionStore<Payment>;

#[derive(Clone)]
pub struct ConsoleState {
    pub inflight: InFlightRegistry,
    pub invoices: Arc<InvoiceStore>,
    pub clients: Arc<ClientStore>,
    pub services: Arc<ServiceStore>,
    pub products: Arc<ProductStore>,
    pub employees: Arc<EmployeeStore>,
    pub salary_components: Arc<SalaryComponentStore>,
    pub payments: Arc<PaymentStore>,
}

impl ConsoleState {
    pub fn new(transport: Arc<dyn Transport>, page_size: u32) -> Self {
        let inflight = InFlightRegistry::new();

        Self {
            invoices: Arc::new(InvoiceStore::new(
                Arc::clone(&transport),
                page_size,
                inflight.clone(),
            )),
            clients: Arc::new(CollectionStore::with_inflight(
                Arc::clone(&transport),
                page_size,
                inflight.clone(),
            )),
            services: Arc::new(CollectionStore::with_inflight(
                Arc::clone(&transport),
                page_size,
                inflight.clone(),
            )),
            products: Arc::new(CollectionStore::with_inflight(
                Arc::clone(&transport),
                page_size,
                inflight.clone(),
            )),
            employees: Arc::new(CollectionStore::with_inflight(
                Arc::clone(&transport),
                page_size,
                inflight.clone(),
            )),
            salary_components: Arc::new(SalaryComponentStore::new(
                Arc::clone(&transport),
                page_size,
                inflight.clone(),
            )),
            payments: Arc::new(CollectionStore::with_inflight(
                transport,
                page_size,
                inflight.clone(),
            )),
            inflight,
        }
    }

    /// Build stores on top of a reqwest [`ApiClient`] configured from `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self, AppError> {
        let client = ApiClient::new(settings.api.clone())?;
        tracing::info!(base_url = %client.base_url(), "API client configured");
        Ok(Self::new(Arc::new(client), settings.api.page_size))
    }
}
