// src/handlers/payments.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::finance::{PaymentFilter, PaymentList, PaymentPayload, PaymentView},
};

// POST /api/payments
#[utoipa::path(
    post,
    path = "/api/payments",
    tag = "Pagamentos",
    request_body = PaymentPayload,
    responses(
        (status = 201, description = "Pagamento registrado", body = PaymentView),
        (status = 400, description = "Valor não positivo ou data futura")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_payment(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<PaymentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let payment = app_state
        .payment_service
        .create_payment(payload, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(payment)))
}

// GET /api/payments
#[utoipa::path(
    get,
    path = "/api/payments",
    tag = "Pagamentos",
    params(PaymentFilter),
    responses((status = 200, description = "Pagamentos do período", body = PaymentList)),
    security(("api_jwt" = []))
)]
pub async fn list_payments(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Query(filter): Query<PaymentFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let payments = app_state
        .payment_service
        .list_payments(&filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(payments))
}

// GET /api/payments/{id}
#[utoipa::path(
    get,
    path = "/api/payments/{id}",
    tag = "Pagamentos",
    params(("id" = Uuid, Path, description = "ID do pagamento")),
    responses(
        (status = 200, description = "Pagamento", body = PaymentView),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_payment(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let payment = app_state
        .payment_service
        .get_payment(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(payment))
}

// PUT /api/payments/{id}
#[utoipa::path(
    put,
    path = "/api/payments/{id}",
    tag = "Pagamentos",
    params(("id" = Uuid, Path, description = "ID do pagamento")),
    request_body = PaymentPayload,
    responses((status = 200, description = "Pagamento atualizado", body = PaymentView)),
    security(("api_jwt" = []))
)]
pub async fn update_payment(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<PaymentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let payment = app_state
        .payment_service
        .update_payment(id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(payment))
}

// DELETE /api/payments/{id}
#[utoipa::path(
    delete,
    path = "/api/payments/{id}",
    tag = "Pagamentos",
    params(("id" = Uuid, Path, description = "ID do pagamento")),
    responses((status = 204, description = "Pagamento excluído")),
    security(("api_jwt" = []))
)]
pub async fn delete_payment(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .payment_service
        .delete_payment(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
