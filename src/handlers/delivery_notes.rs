// src/handlers/delivery_notes.rs

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
    models::delivery::{
        CreateNotePayload, ItemPayload, LogPayload, NoteDetail, NoteFilter, NoteList, UpdateItemPayload,
        UpdateNotePayload,
    },
};

// =============================================================================
//  ROMANEIO
// =============================================================================

// POST /api/delivery-notes
#[utoipa::path(
    post,
    path = "/api/delivery-notes",
    tag = "Romaneios",
    request_body = CreateNotePayload,
    responses(
        (status = 201, description = "Romaneio criado com itens e totais", body = NoteDetail),
        (status = 400, description = "Regra de negócio violada"),
        (status = 409, description = "Número de romaneio já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_note(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<CreateNotePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let note = app_state
        .delivery_service
        .create_note(payload, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(note)))
}

// GET /api/delivery-notes
#[utoipa::path(
    get,
    path = "/api/delivery-notes",
    tag = "Romaneios",
    params(NoteFilter),
    responses((status = 200, description = "Romaneios do período", body = NoteList)),
    security(("api_jwt" = []))
)]
pub async fn list_notes(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Query(filter): Query<NoteFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let notes = app_state
        .delivery_service
        .list_notes(&filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(notes))
}

// GET /api/delivery-notes/{id}
#[utoipa::path(
    get,
    path = "/api/delivery-notes/{id}",
    tag = "Romaneios",
    params(("id" = Uuid, Path, description = "ID do romaneio")),
    responses(
        (status = 200, description = "Romaneio com itens e toras", body = NoteDetail),
        (status = 404, description = "Romaneio não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_note(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let note = app_state
        .delivery_service
        .get_note(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(note))
}

// PUT /api/delivery-notes/{id}
#[utoipa::path(
    put,
    path = "/api/delivery-notes/{id}",
    tag = "Romaneios",
    params(("id" = Uuid, Path, description = "ID do romaneio")),
    request_body = UpdateNotePayload,
    responses(
        (status = 200, description = "Cabeçalho atualizado", body = NoteDetail),
        (status = 400, description = "Modalidade travada por itens existentes")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_note(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateNotePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let note = app_state
        .delivery_service
        .update_note_header(id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(note))
}

// DELETE /api/delivery-notes/{id}
#[utoipa::path(
    delete,
    path = "/api/delivery-notes/{id}",
    tag = "Romaneios",
    params(("id" = Uuid, Path, description = "ID do romaneio")),
    responses((status = 204, description = "Romaneio, itens e toras excluídos")),
    security(("api_jwt" = []))
)]
pub async fn delete_note(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .delivery_service
        .delete_note(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  ITENS
// =============================================================================

// POST /api/delivery-notes/{id}/items
#[utoipa::path(
    post,
    path = "/api/delivery-notes/{id}/items",
    tag = "Romaneios",
    params(("id" = Uuid, Path, description = "ID do romaneio")),
    request_body = ItemPayload,
    responses(
        (status = 201, description = "Item adicionado; totais recalculados", body = NoteDetail),
        (status = 400, description = "Madeira repetida ou medida inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_item(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(note_id): Path<Uuid>,
    Json(payload): Json<ItemPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let note = app_state
        .delivery_service
        .add_item(note_id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(note)))
}

// PUT /api/delivery-notes/items/{item_id}
#[utoipa::path(
    put,
    path = "/api/delivery-notes/items/{item_id}",
    tag = "Romaneios",
    params(("item_id" = Uuid, Path, description = "ID do item")),
    request_body = UpdateItemPayload,
    responses((status = 200, description = "Item atualizado; totais recalculados", body = NoteDetail)),
    security(("api_jwt" = []))
)]
pub async fn update_item(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<UpdateItemPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let note = app_state
        .delivery_service
        .update_item(item_id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(note))
}

// DELETE /api/delivery-notes/items/{item_id}
#[utoipa::path(
    delete,
    path = "/api/delivery-notes/items/{item_id}",
    tag = "Romaneios",
    params(("item_id" = Uuid, Path, description = "ID do item")),
    responses(
        (status = 200, description = "Item removido; totais recalculados", body = NoteDetail),
        (status = 400, description = "O romaneio ficaria sem itens")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_item(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(item_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let note = app_state
        .delivery_service
        .delete_item(item_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(note))
}

// =============================================================================
//  TORAS
// =============================================================================

// POST /api/delivery-notes/items/{item_id}/logs
#[utoipa::path(
    post,
    path = "/api/delivery-notes/items/{item_id}/logs",
    tag = "Romaneios",
    params(("item_id" = Uuid, Path, description = "ID do item")),
    request_body = LogPayload,
    responses(
        (status = 201, description = "Tora adicionada; item e romaneio recalculados", body = NoteDetail),
        (status = 400, description = "Romaneio não é DETALHADO ou medida inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_log(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<LogPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let note = app_state
        .delivery_service
        .add_log(item_id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(note)))
}

// PUT /api/delivery-notes/logs/{log_id}
#[utoipa::path(
    put,
    path = "/api/delivery-notes/logs/{log_id}",
    tag = "Romaneios",
    params(("log_id" = Uuid, Path, description = "ID da tora")),
    request_body = LogPayload,
    responses((status = 200, description = "Tora atualizada", body = NoteDetail)),
    security(("api_jwt" = []))
)]
pub async fn update_log(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(log_id): Path<Uuid>,
    Json(payload): Json<LogPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let note = app_state
        .delivery_service
        .update_log(log_id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(note))
}

// DELETE /api/delivery-notes/logs/{log_id}
#[utoipa::path(
    delete,
    path = "/api/delivery-notes/logs/{log_id}",
    tag = "Romaneios",
    params(("log_id" = Uuid, Path, description = "ID da tora")),
    responses(
        (status = 200, description = "Tora removida", body = NoteDetail),
        (status = 400, description = "O item ficaria sem toras")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_log(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(log_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let note = app_state
        .delivery_service
        .delete_log(log_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(note))
}
