// src/models/reports.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    common::period::Period,
    models::{
        delivery::{FreightMode, WeighingMode},
        registry::CustomerBalance,
    },
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    pub fn sql(&self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}

// =============================================================================
//  FICHA DE ROMANEIOS
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum NotesSort {
    #[default]
    Date,
    Number,
    Customer,
    M3,
    Total,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct NotesReportQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub customer_id: Option<Uuid>,
    /// Número exato do romaneio
    pub number: Option<String>,
    /// Romaneios com pelo menos um item desta madeira
    pub wood_type_id: Option<Uuid>,
    #[serde(default)]
    #[param(inline)]
    pub sort: NotesSort,
    #[serde(default)]
    #[param(inline)]
    pub dir: SortDir,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotesReportRow {
    pub id: Uuid,
    pub number: String,
    pub note_date: NaiveDate,
    pub customer_name: String,
    pub driver_name: Option<String>,
    pub freight_mode: FreightMode,
    pub weighing_mode: WeighingMode,
    #[schema(value_type = String)]
    pub total_volume: Decimal,
    #[schema(value_type = String)]
    pub gross_value: Decimal,
    #[schema(value_type = String)]
    pub net_value: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotesReport {
    pub period: Period,
    pub rows: Vec<NotesReportRow>,
    #[schema(value_type = String)]
    pub total_volume: Decimal,
    #[schema(value_type = String)]
    pub total_gross: Decimal,
    #[schema(value_type = String)]
    pub total_net: Decimal,
}

// =============================================================================
//  FICHA DE MADEIRAS (uma linha por item)
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum WoodSort {
    #[default]
    Date,
    Number,
    Wood,
    Mode,
    UnitPrice,
    M3,
    Total,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct WoodReportQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub customer_id: Option<Uuid>,
    pub number: Option<String>,
    #[param(inline)]
    pub freight_mode: Option<FreightMode>,
    pub wood_type_id: Option<Uuid>,
    #[serde(default)]
    #[param(inline)]
    pub sort: WoodSort,
    #[serde(default)]
    #[param(inline)]
    pub dir: SortDir,
}

/// Um item de romaneio com o contexto do cabeçalho.
/// Também é a linha do CSV da ficha de romaneios.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemReportRow {
    pub item_id: Uuid,
    pub note_id: Uuid,
    pub number: String,
    pub note_date: NaiveDate,
    pub customer_name: String,
    pub driver_name: Option<String>,
    pub wood_type_name: String,
    pub freight_mode: FreightMode,
    pub weighing_mode: WeighingMode,
    #[schema(value_type = String)]
    pub unit_price: Decimal,
    #[schema(value_type = String)]
    pub quantity: Decimal,
    #[schema(value_type = String)]
    pub subtotal: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WoodReport {
    pub period: Period,
    pub rows: Vec<ItemReportRow>,
    #[schema(value_type = String)]
    pub total_volume: Decimal,
    #[schema(value_type = String)]
    pub total_value: Decimal,
}

// =============================================================================
//  FLUXO FINANCEIRO
// =============================================================================

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CashFlowQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub customer_id: Option<Uuid>,
    pub number: Option<String>,
    pub wood_type_id: Option<Uuid>,
}

impl CashFlowQuery {
    /// Filtros de romaneio restringem também os pagamentos aos clientes encontrados.
    pub fn has_note_filters(&self) -> bool {
        self.number.as_deref().is_some_and(|n| !n.trim().is_empty()) || self.wood_type_id.is_some()
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct SaleMovementRow {
    pub note_date: NaiveDate,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub number: String,
    pub total_volume: Decimal,
    pub net_value: Decimal,
}

#[derive(Debug, Clone, FromRow)]
pub struct PaymentMovementRow {
    pub payment_date: NaiveDate,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementKind {
    Sale,
    Payment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowMovement {
    pub date: NaiveDate,
    pub kind: MovementKind,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub note_number: Option<String>,
    #[schema(value_type = Option<String>)]
    pub volume: Option<Decimal>,
    /// Valor da venda (debita o cliente)
    #[schema(value_type = Option<String>)]
    pub debit: Option<Decimal>,
    /// Valor do pagamento (credita o cliente)
    #[schema(value_type = Option<String>)]
    pub credit: Option<Decimal>,
    /// Saldo do cliente no período, após esta movimentação
    #[schema(value_type = String)]
    pub running_balance: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowReport {
    pub period: Period,
    pub movements: Vec<CashFlowMovement>,
    #[schema(value_type = String)]
    pub total_sales: Decimal,
    #[schema(value_type = String)]
    pub total_payments: Decimal,
    #[schema(value_type = String)]
    pub period_balance: Decimal,
}

// =============================================================================
//  DASHBOARD
// =============================================================================

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PeriodQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Default, FromRow)]
pub struct PeriodTotalsRow {
    pub note_count: i64,
    pub total_volume: Decimal,
    pub total_net: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerAmount {
    pub customer_id: Uuid,
    pub customer_name: String,
    #[schema(value_type = String)]
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WoodVolume {
    pub wood_type_id: Uuid,
    pub wood_type_name: String,
    #[schema(value_type = String)]
    pub total_volume: Decimal,
    #[schema(value_type = String)]
    pub total_value: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub period: Period,
    pub note_count: i64,
    #[schema(value_type = String)]
    pub total_volume: Decimal,
    #[schema(value_type = String)]
    pub total_net: Decimal,
    /// Soma (em módulo) dos saldos negativos
    #[schema(value_type = String)]
    pub total_receivable: Decimal,
    pub top_debtors: Vec<CustomerBalance>,
    pub top_buyers: Vec<CustomerAmount>,
    pub top_woods: Vec<WoodVolume>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_filters_detection() {
        let mut q = CashFlowQuery::default();
        assert!(!q.has_note_filters());
        q.number = Some("   ".into());
        assert!(!q.has_note_filters());
        q.number = Some("12".into());
        assert!(q.has_note_filters());
    }
}
