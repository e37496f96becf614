// src/models/finance.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::{decimal::validate_amount, period::Period};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_method", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Pix,
    Transfer,
    Check,
    Deposit,
    Other,
}

impl PaymentMethod {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Dinheiro",
            PaymentMethod::Pix => "PIX",
            PaymentMethod::Transfer => "Transferência",
            PaymentMethod::Check => "Cheque",
            PaymentMethod::Deposit => "Depósito",
            PaymentMethod::Other => "Outro",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub payment_date: NaiveDate,
    #[validate(custom(function = "validate_amount"))]
    #[schema(value_type = String, example = "12.34")]
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub memo: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub payment: Payment,
    pub customer_name: String,
    #[serde(skip)]
    #[schema(ignore)]
    pub total_count: i64,
    #[serde(skip)]
    #[schema(ignore)]
    pub period_amount: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    pub customer_id: Uuid,
    pub payment_date: NaiveDate,
    #[schema(value_type = String, example = "12.34")]
    pub amount: Decimal,
    #[serde(default)]
    pub method: PaymentMethod,
    #[validate(length(max = 500))]
    pub memo: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PaymentFilter {
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub customer_id: Option<Uuid>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentList {
    pub period: Period,
    pub items: Vec<PaymentView>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    #[schema(value_type = String)]
    pub total_amount: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_defaults_to_cash() {
        let payload: PaymentPayload = serde_json::from_str(
            r#"{"customerId":"6f1c1f0e-1b51-4a44-9a55-7d4b3cf3f1a1","paymentDate":"2025-01-31","amount":"12.34"}"#,
        )
        .unwrap();
        assert_eq!(payload.method, PaymentMethod::Cash);
        assert_eq!(payload.amount, Decimal::new(1234, 2));
    }

    #[test]
    fn amount_must_fit_the_money_column() {
        let payload = |amount: &str| -> PaymentPayload {
            serde_json::from_str(&format!(
                r#"{{"customerId":"6f1c1f0e-1b51-4a44-9a55-7d4b3cf3f1a1","paymentDate":"2025-01-31","amount":"{amount}"}}"#
            ))
            .unwrap()
        };
        assert!(payload("9999999999999.99").validate().is_ok());
        let errors = payload("10000000000000").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("amount"));
    }
}
