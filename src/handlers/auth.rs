// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, staff::RequireStaff},
    models::auth::{AuthResponse, CreateUserPayload, LoginUserPayload, User},
};

// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginUserPayload,
    responses(
        (status = 200, description = "Token JWT", body = AuthResponse),
        (status = 401, description = "Credenciais inválidas")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<LoginUserPayload>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let token = app_state
        .auth_service
        .login_user(&payload.email, &payload.password)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(AuthResponse { token }))
}

// Handler da rota protegida /me
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Auth",
    responses((status = 200, description = "Usuário autenticado", body = User)),
    security(("api_jwt" = []))
)]
pub async fn get_me(AuthenticatedUser(user): AuthenticatedUser) -> Json<User> {
    Json(user)
}

// GET /api/users
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Auth",
    responses(
        (status = 200, description = "Usuários do sistema", body = Vec<User>),
        (status = 403, description = "Somente administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    locale: Locale,
    _staff: RequireStaff,
) -> Result<impl IntoResponse, ApiError> {
    let users = app_state
        .auth_service
        .list_users()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(users))
}

// POST /api/users
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Auth",
    request_body = CreateUserPayload,
    responses(
        (status = 201, description = "Operador criado", body = User),
        (status = 403, description = "Somente administradores"),
        (status = 409, description = "E-mail já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_user(
    State(app_state): State<AppState>,
    locale: Locale,
    RequireStaff(staff): RequireStaff,
    Json(payload): Json<CreateUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let user = app_state
        .auth_service
        .create_user(&payload.email, &payload.password, payload.full_name, payload.is_staff)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tracing::info!("Usuário {} criado por {}", user.email, staff.0.email);
    Ok((StatusCode::CREATED, Json(user)))
}
