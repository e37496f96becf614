// src/handlers/wood_types.rs

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
    models::registry::{PriceQuery, PriceResponse, RegistryFilter, WoodType, WoodTypePayload},
};

// POST /api/wood-types
#[utoipa::path(
    post,
    path = "/api/wood-types",
    tag = "Madeiras",
    request_body = WoodTypePayload,
    responses(
        (status = 201, description = "Tipo de madeira cadastrado", body = WoodType),
        (status = 400, description = "Preços inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_wood_type(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Json(payload): Json<WoodTypePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let wood = app_state
        .registry_service
        .create_wood_type(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(wood)))
}

// GET /api/wood-types
#[utoipa::path(
    get,
    path = "/api/wood-types",
    tag = "Madeiras",
    params(RegistryFilter),
    responses((status = 200, description = "Tipos de madeira", body = Vec<WoodType>)),
    security(("api_jwt" = []))
)]
pub async fn list_wood_types(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Query(filter): Query<RegistryFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let woods = app_state
        .registry_service
        .list_wood_types(&filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(woods))
}

// GET /api/wood-types/{id}
#[utoipa::path(
    get,
    path = "/api/wood-types/{id}",
    tag = "Madeiras",
    params(("id" = Uuid, Path, description = "ID do tipo de madeira")),
    responses(
        (status = 200, description = "Tipo de madeira", body = WoodType),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_wood_type(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let wood = app_state
        .registry_service
        .get_wood_type(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(wood))
}

// PUT /api/wood-types/{id}
#[utoipa::path(
    put,
    path = "/api/wood-types/{id}",
    tag = "Madeiras",
    params(("id" = Uuid, Path, description = "ID do tipo de madeira")),
    request_body = WoodTypePayload,
    responses((status = 200, description = "Tipo de madeira atualizado", body = WoodType)),
    security(("api_jwt" = []))
)]
pub async fn update_wood_type(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<WoodTypePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let wood = app_state
        .registry_service
        .update_wood_type(id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(wood))
}

// DELETE /api/wood-types/{id}
#[utoipa::path(
    delete,
    path = "/api/wood-types/{id}",
    tag = "Madeiras",
    params(("id" = Uuid, Path, description = "ID do tipo de madeira")),
    responses(
        (status = 204, description = "Excluído"),
        (status = 409, description = "Madeira usada em romaneios")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_wood_type(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .registry_service
        .delete_wood_type(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/wood-types/{id}/price?freightMode=
#[utoipa::path(
    get,
    path = "/api/wood-types/{id}/price",
    tag = "Madeiras",
    params(("id" = Uuid, Path, description = "ID do tipo de madeira"), PriceQuery),
    responses((status = 200, description = "Preço de tabela na modalidade", body = PriceResponse)),
    security(("api_jwt" = []))
)]
pub async fn get_price(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Query(query): Query<PriceQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let price = app_state
        .registry_service
        .price(id, query.freight_mode)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(price))
}
