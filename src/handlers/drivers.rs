// src/handlers/drivers.rs

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
    models::registry::{Driver, DriverPayload, RegistryFilter},
};

#[utoipa::path(
    post,
    path = "/api/drivers",
    tag = "Motoristas",
    request_body = DriverPayload,
    responses((status = 201, description = "Motorista cadastrado", body = Driver)),
    security(("api_jwt" = []))
)]
pub async fn create_driver(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Json(payload): Json<DriverPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let driver = app_state
        .registry_service
        .create_driver(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(driver)))
}

#[utoipa::path(
    get,
    path = "/api/drivers",
    tag = "Motoristas",
    params(RegistryFilter),
    responses((status = 200, description = "Motoristas", body = Vec<Driver>)),
    security(("api_jwt" = []))
)]
pub async fn list_drivers(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Query(filter): Query<RegistryFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let drivers = app_state
        .registry_service
        .list_drivers(&filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(drivers))
}

#[utoipa::path(
    get,
    path = "/api/drivers/{id}",
    tag = "Motoristas",
    params(("id" = Uuid, Path, description = "ID do motorista")),
    responses(
        (status = 200, description = "Motorista", body = Driver),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_driver(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let driver = app_state
        .registry_service
        .get_driver(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(driver))
}

#[utoipa::path(
    put,
    path = "/api/drivers/{id}",
    tag = "Motoristas",
    params(("id" = Uuid, Path, description = "ID do motorista")),
    request_body = DriverPayload,
    responses((status = 200, description = "Motorista atualizado", body = Driver)),
    security(("api_jwt" = []))
)]
pub async fn update_driver(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<DriverPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let driver = app_state
        .registry_service
        .update_driver(id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(driver))
}

// Romaneios do motorista ficam sem motorista (ON DELETE SET NULL)
#[utoipa::path(
    delete,
    path = "/api/drivers/{id}",
    tag = "Motoristas",
    params(("id" = Uuid, Path, description = "ID do motorista")),
    responses((status = 204, description = "Excluído")),
    security(("api_jwt" = []))
)]
pub async fn delete_driver(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .registry_service
        .delete_driver(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
