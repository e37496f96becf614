// src/models/registry.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::decimal::{money, validate_min_price},
    models::delivery::FreightMode,
    services::totals,
};

// =============================================================================
//  CLIENTES
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    #[schema(example = "SERRARIA BOA VISTA")]
    pub name: String,
    #[schema(example = "12.345.678/0001-90")]
    pub tax_id: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPayload {
    #[validate(length(min = 1, max = 100, message = "O nome deve ter entre 1 e 100 caracteres."))]
    #[schema(example = "Serraria Boa Vista")]
    pub name: String,
    #[validate(length(max = 18))]
    pub tax_id: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    pub address: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Situação do cliente pelo sinal do saldo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BalanceStatus {
    /// Saldo negativo: o cliente deve.
    Debtor,
    /// Saldo positivo: o cliente tem crédito.
    Creditor,
    Settled,
}

impl BalanceStatus {
    pub fn from_balance(balance: Decimal) -> Self {
        if balance.is_zero() {
            BalanceStatus::Settled
        } else if balance.is_sign_negative() {
            BalanceStatus::Debtor
        } else {
            BalanceStatus::Creditor
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BalanceStatus::Debtor => "DEVEDOR",
            BalanceStatus::Creditor => "CREDOR",
            BalanceStatus::Settled => "QUITADO",
        }
    }
}

/// Totais de um cliente: `balance = total_payments - total_sales`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSummary {
    #[schema(value_type = String, example = "20.00")]
    pub total_sales: Decimal,
    #[schema(value_type = String, example = "5.00")]
    pub total_payments: Decimal,
    #[schema(value_type = String, example = "-15.00")]
    pub balance: Decimal,
    pub status: BalanceStatus,
}

impl BalanceSummary {
    /// Monta o resumo a partir das somas; os três valores saem com 2 casas.
    pub fn from_totals(total_payments: Decimal, total_sales: Decimal) -> Self {
        let total_payments = money(total_payments);
        let total_sales = money(total_sales);
        let balance = totals::balance(total_payments, total_sales);
        Self { total_sales, total_payments, balance, status: BalanceStatus::from_balance(balance) }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetail {
    #[serde(flatten)]
    pub customer: Customer,
    #[serde(flatten)]
    pub balance: BalanceSummary,
}

/// Linha da listagem com saldo calculado no SQL.
#[derive(Debug, Clone, FromRow)]
pub struct CustomerBalanceRow {
    pub id: Uuid,
    pub name: String,
    pub tax_id: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub total_sales: Decimal,
    pub total_payments: Decimal,
    pub balance: Decimal,
    pub total_count: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerBalance {
    pub id: Uuid,
    pub name: String,
    pub tax_id: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    #[serde(flatten)]
    pub summary: BalanceSummary,
}

impl From<CustomerBalanceRow> for CustomerBalance {
    fn from(row: CustomerBalanceRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            tax_id: row.tax_id,
            phone: row.phone,
            is_active: row.is_active,
            summary: BalanceSummary::from_totals(row.total_payments, row.total_sales),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum BalanceFilter {
    #[default]
    All,
    Negative,
    Positive,
    Zero,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum CustomerSort {
    #[default]
    Name,
    Balance,
    BalanceDesc,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CustomerFilter {
    /// Busca por nome, telefone ou CPF/CNPJ
    pub search: Option<String>,
    #[serde(default)]
    #[param(inline)]
    pub balance_filter: BalanceFilter,
    #[serde(default)]
    #[param(inline)]
    pub sort: CustomerSort,
    pub active: Option<bool>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

// =============================================================================
//  TIPOS DE MADEIRA
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WoodType {
    pub id: Uuid,
    #[schema(example = "EUCALIPTO")]
    pub name: String,
    #[schema(value_type = String, example = "180.00")]
    pub normal_price: Decimal,
    #[schema(value_type = String, example = "150.00")]
    pub freight_price: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl WoodType {
    /// Preço por m³ conforme a modalidade do romaneio.
    pub fn price_for(&self, mode: FreightMode) -> Decimal {
        match mode {
            FreightMode::Normal => self.normal_price,
            FreightMode::WithFreight => self.freight_price,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WoodTypePayload {
    #[validate(length(min = 1, max = 100, message = "O nome deve ter entre 1 e 100 caracteres."))]
    #[schema(example = "Eucalipto")]
    pub name: String,
    #[validate(custom(function = "validate_min_price"))]
    #[schema(value_type = String, example = "180.00")]
    pub normal_price: Decimal,
    #[validate(custom(function = "validate_min_price"))]
    #[schema(value_type = String, example = "150.00")]
    pub freight_price: Decimal,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Regra de ordem entre os dois preços de uma madeira.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WoodPriceRule {
    /// Preço com frete precisa ser menor que o normal.
    #[default]
    FreightBelowNormal,
    Unchecked,
}

impl WoodPriceRule {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "freight_below_normal" => Some(Self::FreightBelowNormal),
            "unchecked" => Some(Self::Unchecked),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FreightBelowNormal => "freight_below_normal",
            Self::Unchecked => "unchecked",
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PriceQuery {
    #[param(inline)]
    pub freight_mode: FreightMode,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PriceResponse {
    pub wood_type_id: Uuid,
    pub freight_mode: FreightMode,
    #[schema(value_type = String, example = "150.00")]
    pub unit_price: Decimal,
}

// =============================================================================
//  MOTORISTAS
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub id: Uuid,
    #[schema(example = "JOSÉ DA SILVA")]
    pub name: String,
    pub tax_id: Option<String>,
    pub phone: Option<String>,
    #[schema(example = "ABC1D23")]
    pub plate: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DriverPayload {
    #[validate(length(min = 1, max = 100, message = "O nome deve ter entre 1 e 100 caracteres."))]
    pub name: String,
    #[validate(length(max = 14))]
    pub tax_id: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[validate(length(max = 10))]
    pub plate: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Filtro comum de madeiras e motoristas.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct RegistryFilter {
    pub search: Option<String>,
    pub active: Option<bool>,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pinus() -> WoodType {
        WoodType {
            id: Uuid::new_v4(),
            name: "PINUS".into(),
            normal_price: dec!(180.00),
            freight_price: dec!(150.00),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn price_follows_freight_mode() {
        let wood = pinus();
        assert_eq!(wood.price_for(FreightMode::Normal), dec!(180.00));
        assert_eq!(wood.price_for(FreightMode::WithFreight), dec!(150.00));
    }

    #[test]
    fn balance_status_from_sign() {
        assert_eq!(BalanceStatus::from_balance(dec!(-15.00)), BalanceStatus::Debtor);
        assert_eq!(BalanceStatus::from_balance(dec!(10.00)), BalanceStatus::Creditor);
        assert_eq!(BalanceStatus::from_balance(dec!(0.00)), BalanceStatus::Settled);
    }

    #[test]
    fn summary_has_fixed_scale_for_customers_without_movements() {
        let summary = BalanceSummary::from_totals(dec!(0), dec!(0));
        let json = serde_json::to_value(summary).unwrap();
        assert_eq!(json["totalSales"], "0.00");
        assert_eq!(json["totalPayments"], "0.00");
        assert_eq!(json["balance"], "0.00");
        assert_eq!(summary.status, BalanceStatus::Settled);
    }

    #[test]
    fn listing_row_and_single_customer_agree() {
        let row = CustomerBalanceRow {
            id: Uuid::new_v4(),
            name: "ANA".into(),
            tax_id: None,
            phone: None,
            is_active: true,
            total_sales: dec!(20),
            total_payments: dec!(5.0),
            balance: dec!(-15),
            total_count: 1,
        };
        let listed = CustomerBalance::from(row).summary;
        let single = BalanceSummary::from_totals(dec!(5.00), dec!(20.00));
        assert_eq!(listed, single);
        assert_eq!(listed.balance.to_string(), "-15.00");
        assert_eq!(listed.total_sales.to_string(), "20.00");
    }

    #[test]
    fn price_rule_parsing() {
        assert_eq!(WoodPriceRule::parse("UNCHECKED"), Some(WoodPriceRule::Unchecked));
        assert_eq!(
            WoodPriceRule::parse(" freight_below_normal "),
            Some(WoodPriceRule::FreightBelowNormal)
        );
        assert_eq!(WoodPriceRule::parse("normal_below_freight"), None);
    }

    #[test]
    fn payload_rejects_prices_below_one_cent() {
        let payload = WoodTypePayload {
            name: "Pinus".into(),
            normal_price: dec!(0.00),
            freight_price: dec!(10.00),
            is_active: true,
        };
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("normal_price"));
    }

    #[test]
    fn payload_rejects_prices_wider_than_the_column() {
        let payload = WoodTypePayload {
            name: "Pinus".into(),
            normal_price: dec!(100000000.00),
            freight_price: dec!(99999999.99),
            is_active: true,
        };
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("normal_price"));
        assert!(!errors.field_errors().contains_key("freight_price"));
    }

    #[test]
    fn filter_query_uses_camel_case() {
        let filter: CustomerFilter =
            serde_json::from_str(r#"{"balanceFilter":"negative","sort":"balanceDesc"}"#).unwrap();
        assert_eq!(filter.balance_filter, BalanceFilter::Negative);
        assert_eq!(filter.sort, CustomerSort::BalanceDesc);
    }
}
