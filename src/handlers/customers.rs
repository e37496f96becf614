// src/handlers/customers.rs

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
    models::{
        page::Page,
        registry::{Customer, CustomerBalance, CustomerDetail, CustomerFilter, CustomerPayload},
    },
};

// POST /api/customers
#[utoipa::path(
    post,
    path = "/api/customers",
    tag = "Clientes",
    request_body = CustomerPayload,
    responses(
        (status = 201, description = "Cliente cadastrado", body = Customer),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "Nome já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Json(payload): Json<CustomerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let customer = app_state
        .registry_service
        .create_customer(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(customer)))
}

// GET /api/customers
#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "Clientes",
    params(CustomerFilter),
    responses((status = 200, description = "Clientes com saldo", body = Page<CustomerBalance>)),
    security(("api_jwt" = []))
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Query(filter): Query<CustomerFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let page = app_state
        .registry_service
        .list_customers(&filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(page))
}

// GET /api/customers/{id}
#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    tag = "Clientes",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente com saldo atual", body = CustomerDetail),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = app_state
        .registry_service
        .get_customer(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(customer))
}

// PUT /api/customers/{id}
#[utoipa::path(
    put,
    path = "/api/customers/{id}",
    tag = "Clientes",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    request_body = CustomerPayload,
    responses(
        (status = 200, description = "Cliente atualizado", body = Customer),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CustomerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let customer = app_state
        .registry_service
        .update_customer(id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(customer))
}

// DELETE /api/customers/{id}
#[utoipa::path(
    delete,
    path = "/api/customers/{id}",
    tag = "Clientes",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 204, description = "Cliente excluído"),
        (status = 409, description = "Cliente possui romaneios ou pagamentos")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .registry_service
        .delete_customer(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
