//! Domain models for erp-console.

mod catalog;
mod client;
mod employee;
mod invoice;
mod payment;
pub(crate) mod text;
mod validation;

pub use catalog::{Product, ProductInput, Service, ServiceInput};
pub use client::{Client, ClientInput};
pub use employee::{ComponentType, Employee, EmployeeInput, SalaryComponent, SalaryComponentInput};
pub use invoice::{DiscountType, Invoice, InvoiceItem, InvoiceStatus, ItemRef, UnknownStatus};
pub use payment::{Payment, PaymentInput};
pub use validation::{non_negative, percentage, positive};
