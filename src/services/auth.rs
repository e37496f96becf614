// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    common::{db_utils::blank_to_none, error::AppError},
    db::UserRepository,
    models::auth::{Claims, User},
};

const TOKEN_TTL_DAYS: i64 = 7;

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String) -> Self {
        Self { user_repo, jwt_secret }
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<String, AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AppError::InvalidCredentials);
        }

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!("🔑 Login de {}", user.email);
        self.create_token(user.id)
    }

    /// Token válido de um usuário ativo.
    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = self.decode_claims(token)?;
        self.user_repo
            .find_by_id(claims.sub)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AppError::InvalidToken)
    }

    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        full_name: Option<String>,
        is_staff: bool,
    ) -> Result<User, AppError> {
        let hashed_password = hash_password(password).await?;
        let full_name = blank_to_none(full_name);

        let user = self
            .user_repo
            .create_user(self.user_repo.pool(), email, &hashed_password, full_name.as_deref(), is_staff)
            .await?;

        tracing::info!("👤 Usuário criado: {} (staff: {})", user.email, user.is_staff);
        Ok(user)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.user_repo.list().await
    }

    /// Cria o primeiro usuário (staff) quando a tabela está vazia.
    pub async fn bootstrap_admin(&self, email: &str, password: &str) -> Result<Option<User>, AppError> {
        if self.user_repo.count().await? > 0 {
            return Ok(None);
        }
        let user = self.create_user(email, password, Some("Administrador".into()), true).await?;
        Ok(Some(user))
    }

    fn decode_claims(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;
        Ok(token_data.claims)
    }

    fn create_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(TOKEN_TTL_DAYS);

        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

async fn hash_password(password: &str) -> Result<String, AppError> {
    let password_clone = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn service(secret: &str) -> AuthService {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/madeireira_test")
            .unwrap();
        AuthService::new(UserRepository::new(pool), secret.to_string())
    }

    #[tokio::test]
    async fn token_carries_the_user_id() {
        let svc = service("segredo-de-teste");
        let user_id = Uuid::new_v4();
        let token = svc.create_token(user_id).unwrap();
        let claims = svc.decode_claims(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert!(claims.exp > claims.iat);
    }

    #[tokio::test]
    async fn token_from_another_secret_is_rejected() {
        let token = service("outro-segredo").create_token(Uuid::new_v4()).unwrap();
        let err = service("segredo-de-teste").decode_claims(&token).unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let err = service("segredo-de-teste").decode_claims("abc.def.ghi").unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }
}
