// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::{common::i18n::I18nStore, middleware::i18n::Locale};

// ---
// Regras de negócio
// ---
/// Violações das regras de domínio (romaneio, itens, unidades, pagamentos, cadastros).
/// Cada variante tem uma chave estável usada na tradução.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RuleViolation {
    #[error("O valor do pagamento deve ser positivo.")]
    PaymentAmountNotPositive,

    #[error("A data do pagamento não pode ser no futuro.")]
    PaymentDateInFuture,

    #[error("O valor unitário deve ser de pelo menos R$ 0,01.")]
    UnitPriceTooLow,

    #[error("Informe a quantidade (m³) do item.")]
    QuantityNegative,

    #[error("A quantidade da unidade deve ser maior que zero.")]
    LogQuantityNotPositive,

    #[error("O comprimento deve ser maior que zero.")]
    LengthNotPositive,

    #[error("O rôdo deve ser maior que zero.")]
    RodoNotPositive,

    #[error("Os descontos não podem ser negativos.")]
    DeductionNegative,

    #[error("Não é permitido repetir o mesmo Tipo de Madeira no mesmo romaneio.")]
    DuplicateWoodType,

    #[error("O romaneio precisa ter pelo menos um item.")]
    NoteWithoutItems,

    #[error("No modo DETALHADO, cada tipo de madeira deve ter pelo menos uma unidade.")]
    DetailedItemWithoutLogs,

    #[error("Unidades só podem ser lançadas em romaneios DETALHADOS.")]
    LogsRequireDetailedMode,

    #[error("A modalidade não pode ser alterada em um romaneio que já possui itens.")]
    WeighingModeLocked,

    #[error("Os preços devem ser de pelo menos R$ 0,01.")]
    WoodPriceTooLow,

    #[error("O preço COM FRETE deve ser menor que o preço NORMAL.")]
    FreightPriceNotBelowNormal,

    #[error("Cliente inativo.")]
    InactiveCustomer,

    #[error("Tipo de madeira inativo.")]
    InactiveWoodType,

    #[error("Motorista inativo.")]
    InactiveDriver,

    #[error("Valor acima do limite permitido.")]
    ValueOutOfRange,
}

impl RuleViolation {
    pub fn key(&self) -> &'static str {
        match self {
            Self::PaymentAmountNotPositive => "rule.payment_amount_not_positive",
            Self::PaymentDateInFuture => "rule.payment_date_in_future",
            Self::UnitPriceTooLow => "rule.unit_price_too_low",
            Self::QuantityNegative => "rule.quantity_negative",
            Self::LogQuantityNotPositive => "rule.log_quantity_not_positive",
            Self::LengthNotPositive => "rule.length_not_positive",
            Self::RodoNotPositive => "rule.rodo_not_positive",
            Self::DeductionNegative => "rule.deduction_negative",
            Self::DuplicateWoodType => "rule.duplicate_wood_type",
            Self::NoteWithoutItems => "rule.note_without_items",
            Self::DetailedItemWithoutLogs => "rule.detailed_item_without_logs",
            Self::LogsRequireDetailedMode => "rule.logs_require_detailed_mode",
            Self::WeighingModeLocked => "rule.weighing_mode_locked",
            Self::WoodPriceTooLow => "rule.wood_price_too_low",
            Self::FreightPriceNotBelowNormal => "rule.freight_price_not_below_normal",
            Self::InactiveCustomer => "rule.inactive_customer",
            Self::InactiveWoodType => "rule.inactive_wood_type",
            Self::InactiveDriver => "rule.inactive_driver",
            Self::ValueOutOfRange => "rule.value_out_of_range",
        }
    }
}

// ---
// Erro da aplicação
// ---
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("{0}")]
    BusinessRule(#[from] RuleViolation),

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    #[error("Registro duplicado: {0}")]
    UniqueConstraintViolation(String),

    #[error("Exclusão bloqueada: {0}")]
    DeleteProtected(String),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Acesso negado")]
    Forbidden,

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),
}

/// A rejeição HTTP que os handlers devolvem (já traduzida).
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub code: Option<&'static str>,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({ "error": self.error });
        if let Some(code) = self.code {
            body["code"] = json!(code);
        }
        if let Some(details) = self.details {
            body["details"] = details;
        }
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::BusinessRule(_) => StatusCode::BAD_REQUEST,
            AppError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            AppError::UniqueConstraintViolation(_)
            | AppError::DeleteProtected(_)
            | AppError::EmailAlreadyExists => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converte para a resposta HTTP no idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let lang = locale.0.as_str();
        let status = self.status();

        match self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| match &e.message {
                            Some(m) => m.to_string(),
                            None => store.translate(lang, &format!("field.{}", e.code)),
                        })
                        .collect();
                    details.insert(field.to_string(), json!(messages));
                }
                ApiError {
                    status,
                    error: store.translate(lang, "error.validation"),
                    code: Some("error.validation"),
                    details: Some(Value::Object(details)),
                }
            }
            AppError::BusinessRule(rule) => ApiError {
                status,
                error: store.translate(lang, rule.key()),
                code: Some(rule.key()),
                details: None,
            },
            AppError::ResourceNotFound(what) => ApiError {
                status,
                error: format!("{}: {}", store.translate(lang, "error.not_found"), what),
                code: Some("error.not_found"),
                details: None,
            },
            AppError::UniqueConstraintViolation(what) => ApiError {
                status,
                error: format!("{}: {}", store.translate(lang, "error.duplicate"), what),
                code: Some("error.duplicate"),
                details: None,
            },
            AppError::DeleteProtected(what) => ApiError {
                status,
                error: format!("{}: {}", store.translate(lang, "error.delete_protected"), what),
                code: Some("error.delete_protected"),
                details: None,
            },
            AppError::EmailAlreadyExists => simple(status, store, lang, "error.email_exists"),
            AppError::InvalidCredentials => simple(status, store, lang, "error.invalid_credentials"),
            AppError::InvalidToken => simple(status, store, lang, "error.invalid_token"),
            AppError::Forbidden => simple(status, store, lang, "error.forbidden"),
            // Todo o resto vira 500 e o detalhe só vai para o log
            e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                simple(status, store, lang, "error.internal")
            }
        }
    }
}

fn simple(status: StatusCode, store: &I18nStore, lang: &str, key: &'static str) -> ApiError {
    ApiError { status, error: store.translate(lang, key), code: Some(key), details: None }
}

// Usado pelo middleware de auth e pelos extratores, que não têm o Locale em mãos.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default(), &I18nStore::new()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt() -> Locale {
        Locale("pt".into())
    }

    #[test]
    fn business_rules_are_bad_requests_with_a_code() {
        let err = AppError::from(RuleViolation::PaymentDateInFuture);
        let api = err.to_api_error(&pt(), &I18nStore::new());
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.code, Some("rule.payment_date_in_future"));
        assert_eq!(api.error, "A data do pagamento não pode ser no futuro.");
    }

    #[test]
    fn english_locale_is_translated() {
        let err = AppError::from(RuleViolation::DuplicateWoodType);
        let api = err.to_api_error(&Locale("en".into()), &I18nStore::new());
        assert_eq!(api.error, "The same wood type cannot appear twice in one delivery note.");
    }

    #[test]
    fn status_mapping() {
        assert_eq!(AppError::DeleteProtected("cliente".into()).status(), StatusCode::CONFLICT);
        assert_eq!(AppError::ResourceNotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::FontNotFound("./fonts".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn every_rule_has_a_portuguese_translation() {
        let store = I18nStore::new();
        let rules = [
            RuleViolation::PaymentAmountNotPositive,
            RuleViolation::PaymentDateInFuture,
            RuleViolation::UnitPriceTooLow,
            RuleViolation::QuantityNegative,
            RuleViolation::LogQuantityNotPositive,
            RuleViolation::LengthNotPositive,
            RuleViolation::RodoNotPositive,
            RuleViolation::DeductionNegative,
            RuleViolation::DuplicateWoodType,
            RuleViolation::NoteWithoutItems,
            RuleViolation::DetailedItemWithoutLogs,
            RuleViolation::LogsRequireDetailedMode,
            RuleViolation::WeighingModeLocked,
            RuleViolation::WoodPriceTooLow,
            RuleViolation::FreightPriceNotBelowNormal,
            RuleViolation::InactiveCustomer,
            RuleViolation::InactiveWoodType,
            RuleViolation::InactiveDriver,
            RuleViolation::ValueOutOfRange,
        ];
        for rule in rules {
            assert_eq!(store.translate("pt", rule.key()), rule.to_string(), "{}", rule.key());
            assert_ne!(store.translate("en", rule.key()), rule.key());
        }
    }
}
