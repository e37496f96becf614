// src/models/delivery.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::{
    decimal::{validate_measure, validate_price, validate_volume},
    period::Period,
};

// --- Enums ---

/// Modalidade de preço do romaneio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "freight_mode", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FreightMode {
    #[default]
    Normal,
    WithFreight,
}

impl FreightMode {
    pub fn label(&self) -> &'static str {
        match self {
            FreightMode::Normal => "NORMAL",
            FreightMode::WithFreight => "COM FRETE",
        }
    }
}

/// Como a quantidade dos itens é obtida: informada (SIMPLE) ou somada das toras (DETAILED).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "weighing_mode", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeighingMode {
    #[default]
    Simple,
    Detailed,
}

impl WeighingMode {
    pub fn label(&self) -> &'static str {
        match self {
            WeighingMode::Simple => "SIMPLES",
            WeighingMode::Detailed => "DETALHADO",
        }
    }
}

// --- Linhas do banco ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryNote {
    pub id: Uuid,
    #[schema(example = "1024")]
    pub number: String,
    pub note_date: NaiveDate,
    pub customer_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub freight_mode: FreightMode,
    pub weighing_mode: WeighingMode,
    #[schema(value_type = String, example = "2.000")]
    pub total_volume: Decimal,
    #[schema(value_type = String, example = "20.00")]
    pub gross_value: Decimal,
    #[schema(value_type = String, example = "20.00")]
    pub net_value: Decimal,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoteItem {
    pub id: Uuid,
    pub note_id: Uuid,
    pub wood_type_id: Uuid,
    #[schema(value_type = String, example = "10.00")]
    pub unit_price: Decimal,
    #[schema(value_type = String, example = "2.000")]
    pub quantity: Decimal,
    #[schema(value_type = String, example = "20.00")]
    pub subtotal: Decimal,
}

/// Tora ("unidade") de um item DETALHADO.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogUnit {
    pub id: Uuid,
    pub item_id: Uuid,
    #[schema(value_type = Option<String>, example = "4.00")]
    pub length: Option<Decimal>,
    #[schema(value_type = Option<String>, example = "30.00")]
    pub rodo: Option<Decimal>,
    #[schema(value_type = String, example = "0.00")]
    pub deduction_1: Decimal,
    #[schema(value_type = String, example = "0.00")]
    pub deduction_2: Decimal,
    #[schema(value_type = String, example = "0.225")]
    pub quantity: Decimal,
}

/// Item com o contexto do romaneio, usado no recálculo.
#[derive(Debug, Clone, FromRow)]
pub struct ItemContext {
    pub id: Uuid,
    pub note_id: Uuid,
    pub wood_type_id: Uuid,
    pub unit_price: Decimal,
    pub quantity: Decimal,
    pub freight_mode: FreightMode,
    pub weighing_mode: WeighingMode,
}

// --- Domínio resolvido ---

/// Tora já validada, com a quantidade final (informada ou pela fórmula).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLog {
    pub length: Option<Decimal>,
    pub rodo: Option<Decimal>,
    pub deduction_1: Decimal,
    pub deduction_2: Decimal,
    pub quantity: Decimal,
}

impl From<&LogUnit> for ResolvedLog {
    fn from(log: &LogUnit) -> Self {
        Self {
            length: log.length,
            rodo: log.rodo,
            deduction_1: log.deduction_1,
            deduction_2: log.deduction_2,
            quantity: log.quantity,
        }
    }
}

/// De onde vem a quantidade de um item.
/// Um item DETALHADO não guarda quantidade própria: ela é sempre a soma das toras.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Measure {
    Simple(Decimal),
    Detailed(Vec<ResolvedLog>),
}

impl Measure {
    pub fn mode(&self) -> WeighingMode {
        match self {
            Measure::Simple(_) => WeighingMode::Simple,
            Measure::Detailed(_) => WeighingMode::Detailed,
        }
    }
}

// --- Payloads ---

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogPayload {
    #[validate(custom(function = "validate_measure"))]
    #[schema(value_type = Option<String>, example = "4.00")]
    pub length: Option<Decimal>,
    #[validate(custom(function = "validate_measure"))]
    #[schema(value_type = Option<String>, example = "30.00")]
    pub rodo: Option<Decimal>,
    #[serde(rename = "deduction1")]
    #[validate(custom(function = "validate_measure"))]
    #[schema(value_type = Option<String>, example = "0.00")]
    pub deduction_1: Option<Decimal>,
    #[serde(rename = "deduction2")]
    #[validate(custom(function = "validate_measure"))]
    #[schema(value_type = Option<String>, example = "0.00")]
    pub deduction_2: Option<Decimal>,
    /// Quantidade manual; se ausente ou zero, é calculada pela fórmula.
    #[validate(custom(function = "validate_volume"))]
    #[schema(value_type = Option<String>)]
    pub quantity: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemPayload {
    pub wood_type_id: Uuid,
    /// Ausente ou zero: usa o preço da madeira na modalidade do romaneio.
    #[validate(custom(function = "validate_price"))]
    #[schema(value_type = Option<String>, example = "10.00")]
    pub unit_price: Option<Decimal>,
    /// Só no modo SIMPLES. Ausente ou zero vira 0.001.
    #[validate(custom(function = "validate_volume"))]
    #[schema(value_type = Option<String>, example = "2.000")]
    pub quantity: Option<Decimal>,
    #[serde(default)]
    #[validate(nested)]
    pub logs: Vec<LogPayload>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotePayload {
    #[validate(length(min = 1, max = 20, message = "O número deve ter entre 1 e 20 caracteres."))]
    #[schema(example = "1024")]
    pub number: String,
    pub note_date: NaiveDate,
    pub customer_id: Uuid,
    pub driver_id: Option<Uuid>,
    #[serde(default)]
    pub freight_mode: FreightMode,
    #[serde(default)]
    pub weighing_mode: WeighingMode,
    #[validate(nested)]
    pub items: Vec<ItemPayload>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNotePayload {
    #[validate(length(min = 1, max = 20, message = "O número deve ter entre 1 e 20 caracteres."))]
    pub number: String,
    pub note_date: NaiveDate,
    pub customer_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub freight_mode: FreightMode,
    pub weighing_mode: WeighingMode,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemPayload {
    pub wood_type_id: Uuid,
    #[validate(custom(function = "validate_price"))]
    #[schema(value_type = Option<String>)]
    pub unit_price: Option<Decimal>,
    /// Ignorada em itens DETALHADOS.
    #[validate(custom(function = "validate_volume"))]
    #[schema(value_type = Option<String>)]
    pub quantity: Option<Decimal>,
}

// --- Respostas ---

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemDetail {
    #[serde(flatten)]
    pub item: NoteItem,
    pub wood_type_name: String,
    pub logs: Vec<LogUnit>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoteDetail {
    #[serde(flatten)]
    pub note: DeliveryNote,
    pub customer_name: String,
    pub driver_name: Option<String>,
    pub items: Vec<ItemDetail>,
}

/// Cabeçalho com nomes, usado no detalhe e no PDF.
#[derive(Debug, Clone, FromRow)]
pub struct NoteHeaderRow {
    #[sqlx(flatten)]
    pub note: DeliveryNote,
    pub customer_name: String,
    pub driver_name: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ItemRow {
    #[sqlx(flatten)]
    pub item: NoteItem,
    pub wood_type_name: String,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoteSummary {
    pub id: Uuid,
    pub number: String,
    pub note_date: NaiveDate,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub driver_name: Option<String>,
    pub freight_mode: FreightMode,
    pub weighing_mode: WeighingMode,
    #[schema(value_type = String)]
    pub total_volume: Decimal,
    #[schema(value_type = String)]
    pub net_value: Decimal,
    #[serde(skip)]
    #[schema(ignore)]
    pub total_count: i64,
    #[serde(skip)]
    #[schema(ignore)]
    pub period_volume: Decimal,
    #[serde(skip)]
    #[schema(ignore)]
    pub period_value: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoteList {
    pub period: Period,
    pub items: Vec<NoteSummary>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    #[schema(value_type = String)]
    pub total_volume: Decimal,
    #[schema(value_type = String)]
    pub total_value: Decimal,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct NoteFilter {
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub customer_id: Option<Uuid>,
    /// Parte do número do romaneio
    pub number: Option<String>,
    #[param(inline)]
    pub weighing_mode: Option<WeighingMode>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
