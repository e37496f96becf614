// src/middleware/staff.rs

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{common::error::AppError, middleware::auth::AuthenticatedUser};

/// Guardião das rotas de administração: só usuários `is_staff`.
pub struct RequireStaff(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireStaff
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;
        if !user.0.is_staff {
            tracing::warn!("Acesso de administração negado para {}", user.0.email);
            return Err(AppError::Forbidden);
        }
        Ok(RequireStaff(user))
    }
}
