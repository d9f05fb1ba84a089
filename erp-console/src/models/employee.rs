use super::text;
use super::validation::{non_negative, percentage};
use chrono::NaiveDate;
use console_core::filter::matches_any;
use console_core::numeric::{lenient, lenient_date};
use console_core::store::Resource;
use console_core::{Identified, RecordId};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Employee {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default, deserialize_with = "text::deserialize")]
    pub employee_code: Option<String>,
    #[serde(default, deserialize_with = "text::deserialize")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "text::deserialize")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "text::deserialize")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "text::deserialize")]
    pub department: Option<String>,
    #[serde(default, deserialize_with = "text::deserialize")]
    pub position: Option<String>,
    #[serde(with = "lenient_date", default)]
    pub hire_date: Option<NaiveDate>,
    #[serde(with = "lenient", default)]
    pub base_salary: Decimal,
    #[serde(default, deserialize_with = "text::flag")]
    pub is_active: Option<bool>,
}

impl Employee {
    pub fn full_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Identified for Employee {
    fn record_id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }
}

impl Resource for Employee {
    const NAME: &'static str = "employee";
    const PATH: &'static str = "/employees";

    fn matches(&self, term: &str) -> bool {
        let name = self.full_name();
        matches_any(
            term,
            [
                name.as_str(),
                self.employee_code.as_deref().unwrap_or(""),
                self.email.as_deref().unwrap_or(""),
                self.department.as_deref().unwrap_or(""),
                self.position.as_deref().unwrap_or(""),
            ],
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[serde(rename_all = "PascalCase")]
pub struct EmployeeInput {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[validate(email(message = "Email address is invalid"))]
    pub email: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub hire_date: Option<NaiveDate>,
    #[validate(custom(function = "non_negative"))]
    #[serde(serialize_with = "lenient::serialize")]
    pub base_salary: Decimal,
}

/// Whether a salary component adds to or deducts from pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ComponentType {
    #[default]
    Allowance,
    Deduction,
}

impl<'de> Deserialize<'de> for ComponentType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let deduction = match &value {
            Value::String(s) => s.trim().eq_ignore_ascii_case("deduction"),
            Value::Number(n) => n.as_u64() == Some(1),
            _ => false,
        };
        Ok(if deduction {
            ComponentType::Deduction
        } else {
            ComponentType::Allowance
        })
    }
}

/// A recurring pay element attached to one employee.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SalaryComponent {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub employee_id: Option<RecordId>,
    #[serde(default, deserialize_with = "text::deserialize")]
    pub name: Option<String>,
    #[serde(default)]
    pub component_type: ComponentType,
    #[serde(with = "lenient", default)]
    pub amount: Decimal,
    #[serde(default, deserialize_with = "text::flag")]
    pub is_percentage: Option<bool>,
}

impl SalaryComponent {
    /// Signed monthly effect against `base_salary`.
    pub fn effective_amount(&self, base_salary: Decimal) -> Decimal {
        let amount = if self.is_percentage.unwrap_or(false) {
            base_salary.saturating_mul(self.amount / Decimal::ONE_HUNDRED)
        } else {
            self.amount
        };
        match self.component_type {
            ComponentType::Allowance => amount,
            ComponentType::Deduction => -amount,
        }
    }
}

impl Identified for SalaryComponent {
    fn record_id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }
}

impl Resource for SalaryComponent {
    const NAME: &'static str = "salary_component";
    const PATH: &'static str = "/SalaryComponent";

    fn matches(&self, term: &str) -> bool {
        matches_any(term, [self.name.as_deref().unwrap_or("")])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[serde(rename_all = "PascalCase")]
#[validate(schema(function = "validate_component_amount", skip_on_field_errors = true))]
pub struct SalaryComponentInput {
    pub employee_id: RecordId,
    #[validate(length(min = 1, message = "Component name is required"))]
    pub name: String,
    pub component_type: ComponentType,
    #[validate(custom(function = "non_negative"))]
    #[serde(serialize_with = "lenient::serialize")]
    pub amount: Decimal,
    pub is_percentage: bool,
}

fn validate_component_amount(
    input: &SalaryComponentInput,
) -> Result<(), validator::ValidationError> {
    if input.is_percentage {
        percentage(&input.amount)
    } else {
        Ok(())
    }
}
