#![allow(dead_code)]

use console_core::config::ApiSettings;
use console_core::http::ApiClient;
use erp_console::ConsoleState;
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::MockServer;

pub const PAGE_SIZE: u32 = 10;

pub struct TestApp {
    pub server: MockServer,
    pub client: Arc<ApiClient>,
    pub state: ConsoleState,
}

impl TestApp {
    /// Stores wired to a fresh mock ERP backend.
    pub async fn spawn() -> Self {
        let server = MockServer::start().await;

        let mut settings = ApiSettings::new(format!("{}/api", server.uri()));
        settings.page_size = PAGE_SIZE;
        let client = Arc::new(ApiClient::new(settings).expect("Failed to build API client"));
        let state = ConsoleState::new(client.clone(), PAGE_SIZE);

        Self {
            server,
            client,
            state,
        }
    }
}

/// An invoice as the backend returns it, PascalCase with one service item.
pub fn invoice_json(id: i64, number: &str) -> Value {
    json!({
        "Id": id,
        "InvoiceNumber": number,
        "ClientId": 1,
        "ClientName": "Acme Ltd",
        "InvoiceDate": "2024-05-01T00:00:00",
        "DueDate": "2024-05-31T00:00:00",
        "Status": "Sent",
        "SubTotal": 200,
        "TaxAmount": 27,
        "DiscountAmount": 20,
        "ShippingAmount": 0,
        "TotalAmount": 207,
        "PaidAmount": 0,
        "BalanceAmount": 207,
        "Items": [
            { "Id": id * 10, "ServiceId": 3, "Description": "Consulting", "Quantity": 2,
              "UnitPrice": 100, "Discount": 10, "DiscountType": "percentage", "TaxRate": 15,
              "LineTotal": 207 }
        ]
    })
}

/// A list response in the `Data.$values` + `Paginations` shape.
pub fn page_json(items: Vec<Value>, page: u32, total_items: u64) -> Value {
    let total_pages = total_items.div_ceil(u64::from(PAGE_SIZE));
    json!({
        "Success": true,
        "Data": { "$values": items },
        "Paginations": {
            "CurrentPage": page,
            "TotalPages": total_pages,
            "TotalItems": total_items,
            "PageSize": PAGE_SIZE
        }
    })
}
