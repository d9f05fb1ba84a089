use super::text;
use console_core::filter::matches_any;
use console_core::store::Resource;
use console_core::{Identified, RecordId};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Billed customer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Client {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default, deserialize_with = "text::deserialize")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "text::deserialize")]
    pub company_name: Option<String>,
    #[serde(default, deserialize_with = "text::deserialize")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "text::deserialize")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "text::deserialize")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "text::deserialize")]
    pub tax_number: Option<String>,
}

impl Client {
    pub fn display_name(&self) -> &str {
        self.company_name
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("")
    }
}

impl Identified for Client {
    fn record_id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }
}

impl Resource for Client {
    const NAME: &'static str = "client";
    const PATH: &'static str = "/clients";

    fn matches(&self, term: &str) -> bool {
        matches_any(
            term,
            [
                self.name.as_deref().unwrap_or(""),
                self.company_name.as_deref().unwrap_or(""),
                self.email.as_deref().unwrap_or(""),
                self.phone.as_deref().unwrap_or(""),
            ],
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[serde(rename_all = "PascalCase")]
pub struct ClientInput {
    #[validate(length(min = 1, message = "Client name is required"))]
    pub name: String,
    pub company_name: Option<String>,
    #[validate(email(message = "Email address is invalid"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub tax_number: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use console_core::envelope::decode_record;
    use serde_json::json;

    #[test]
    fn display_name_prefers_company() {
        let client: Client = decode_record(&json!({
            "Data": { "Id": 5, "Name": "Jane Roe", "CompanyName": "Roe & Co" }
        }))
        .unwrap();
        assert_eq!(client.display_name(), "Roe & Co");
        assert!(client.matches("jane"));
    }

    #[test]
    fn input_validates_email_and_name() {
        let input = ClientInput {
            name: String::new(),
            company_name: None,
            email: Some("not-an-email".to_string()),
            phone: None,
            address: None,
            tax_number: None,
        };
        let errors = input.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));
    }
}
